//! Tests for database initialization: automatic creation, idempotent
//! re-open, schema completeness, and the vote uniqueness constraint.

use arbourne_common::db::init::{init_database, init_memory_database};

#[tokio::test]
async fn database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arbourne.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "database file was not created");
}

#[tokio::test]
async fn database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("arbourne.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());
    drop(pool1);

    // Second open must succeed and leave the schema intact
    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "failed to reopen: {:?}", pool2.err());
}

#[tokio::test]
async fn all_tables_present() {
    let pool = init_memory_database().await.unwrap();

    for table in [
        "users",
        "sessions",
        "user_events",
        "albums",
        "votes",
        "comments",
        "schema_version",
    ] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }
}

#[tokio::test]
async fn duplicate_vote_insert_rejected_by_constraint() {
    let pool = init_memory_database().await.unwrap();

    sqlx::query(
        "INSERT INTO albums (id, release_group_mbid, title, artist, vote_count, created_at)
         VALUES ('a1', 'mbid-1', 'Kind of Blue', 'Miles Davis', 1, datetime('now'))",
    )
    .execute(&pool)
    .await
    .unwrap();

    let insert = "INSERT INTO votes (id, album_id, voter_hash, created_at)
                  VALUES (?, 'a1', 'voter-x', datetime('now'))";
    sqlx::query(insert).bind("v1").execute(&pool).await.unwrap();

    let second = sqlx::query(insert).bind("v2").execute(&pool).await;
    let err = arbourne_common::Error::from(second.unwrap_err());
    assert!(err.is_unique_violation(), "expected unique violation, got {}", err);
}
