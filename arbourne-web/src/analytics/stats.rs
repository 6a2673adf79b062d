//! Site-wide traffic stats for the admin dashboard

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use arbourne_common::events::EventType;
use arbourne_common::Result;

use super::leads::sql_type_list;

const TOP_PAGES: i64 = 20;
const TOP_PRODUCTS: i64 = 20;
const TOP_COUNTRIES: i64 = 10;

/// A labelled count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Aggregate site stats over a lookback window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStats {
    pub total_events: i64,
    pub unique_sessions: i64,
    pub known_users: i64,
    pub event_breakdown: Vec<LabelCount>,
    pub top_countries: Vec<LabelCount>,
}

/// Top pages and top products over a lookback window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStats {
    pub top_pages: Vec<LabelCount>,
    pub top_products: Vec<LabelCount>,
}

/// Compute aggregate counts for events at or after `cutoff`.
pub async fn compute_site_stats(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<SiteStats> {
    let total_events: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_events WHERE timestamp >= ?")
            .bind(cutoff)
            .fetch_one(pool)
            .await?;

    let unique_sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT session_id) FROM user_events WHERE timestamp >= ?")
            .bind(cutoff)
            .fetch_one(pool)
            .await?;

    let known_users: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT user_id) FROM user_events WHERE user_id IS NOT NULL AND timestamp >= ?",
    )
    .bind(cutoff)
    .fetch_one(pool)
    .await?;

    let event_breakdown: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT event_type, COUNT(*) AS n
        FROM user_events
        WHERE timestamp >= ?
        GROUP BY event_type
        ORDER BY n DESC
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let top_countries: Vec<(String, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT u.country, COUNT(DISTINCT u.id) AS n
        FROM user_events e
        JOIN users u ON u.id = e.user_id
        WHERE e.timestamp >= ? AND u.country IS NOT NULL
        GROUP BY u.country
        ORDER BY n DESC
        LIMIT {TOP_COUNTRIES}
        "#
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(SiteStats {
        total_events,
        unique_sessions,
        known_users,
        event_breakdown: into_label_counts(event_breakdown),
        top_countries: into_label_counts(top_countries),
    })
}

/// Compute top pages (by page view) and top products (by interest events)
/// for events at or after `cutoff`.
pub async fn compute_page_stats(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<PageStats> {
    let top_pages: Vec<(String, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT path, COUNT(*) AS n
        FROM user_events
        WHERE event_type = 'PAGE_VIEW' AND timestamp >= ?
        GROUP BY path
        ORDER BY n DESC
        LIMIT {TOP_PAGES}
        "#
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let interest = sql_type_list(&EventType::INTEREST);
    let top_products: Vec<(String, i64)> = sqlx::query_as(&format!(
        r#"
        SELECT json_extract(event_data, '$.productHandle') AS handle, COUNT(*) AS n
        FROM user_events
        WHERE event_type IN ({interest}) AND timestamp >= ? AND handle IS NOT NULL
        GROUP BY handle
        ORDER BY n DESC
        LIMIT {TOP_PRODUCTS}
        "#
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(PageStats {
        top_pages: into_label_counts(top_pages),
        top_products: into_label_counts(top_products),
    })
}

fn into_label_counts(rows: Vec<(String, i64)>) -> Vec<LabelCount> {
    rows.into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbourne_common::db::init::init_memory_database;
    use chrono::Duration;
    use uuid::Uuid;

    async fn seed(pool: &SqlitePool) {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (id, email, display_name, country, created_at)
             VALUES ('u1', 'u1@example.com', 'U1', 'GB', ?), ('u2', 'u2@example.com', 'U2', 'NO', ?)",
        )
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .unwrap();

        let events: Vec<(Option<&str>, EventType, Option<&str>, &str, &str)> = vec![
            (Some("u1"), EventType::PageView, None, "/", "s1"),
            (Some("u1"), EventType::PageView, None, "/speakers", "s1"),
            (Some("u2"), EventType::PageView, None, "/speakers", "s2"),
            (None, EventType::PageView, None, "/speakers", "s3"),
            (
                Some("u2"),
                EventType::ProductView,
                Some(r#"{"productHandle":"reference-8"}"#),
                "/speakers/reference-8",
                "s2",
            ),
        ];
        for (user_id, event_type, data, path, session) in events {
            sqlx::query(
                "INSERT INTO user_events (id, user_id, event_type, event_data, path, session_id, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(user_id)
            .bind(event_type.as_str())
            .bind(data)
            .bind(path)
            .bind(session)
            .bind(now)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn site_stats_counts() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let stats = compute_site_stats(&pool, Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.unique_sessions, 3);
        assert_eq!(stats.known_users, 2);

        let page_views = stats
            .event_breakdown
            .iter()
            .find(|c| c.label == "PAGE_VIEW")
            .unwrap();
        assert_eq!(page_views.count, 4);

        assert_eq!(stats.top_countries.len(), 2);
    }

    #[tokio::test]
    async fn page_stats_rankings() {
        let pool = init_memory_database().await.unwrap();
        seed(&pool).await;

        let stats = compute_page_stats(&pool, Utc::now() - Duration::days(7))
            .await
            .unwrap();
        assert_eq!(stats.top_pages[0].label, "/speakers");
        assert_eq!(stats.top_pages[0].count, 3);
        assert_eq!(stats.top_products.len(), 1);
        assert_eq!(stats.top_products[0].label, "reference-8");
    }

    #[tokio::test]
    async fn empty_window_is_all_zeroes() {
        let pool = init_memory_database().await.unwrap();
        let stats = compute_site_stats(&pool, Utc::now()).await.unwrap();
        assert_eq!(stats.total_events, 0);
        assert!(stats.event_breakdown.is_empty());
    }
}
