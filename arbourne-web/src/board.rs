//! Recommendation board: albums, votes, comments
//!
//! Community "recommend an album" feature. An album's lifetime:
//!
//! - first vote for a release group MBID looks the album up on MusicBrainz,
//!   fetches cover art, and creates the row with one vote and the voter's
//!   comment (mandatory, 20 chars minimum);
//! - further votes are one per distinct voter, duplicates answered with a
//!   conflict; every vote carries a comment;
//! - a featured album (featured_at set by the editorial process) is closed
//!   to voting for 30 days;
//! - after 30 days featured, the next vote re-opens the album: featured_at
//!   cleared, vote count reset to 1, all prior votes deleted. Comments are
//!   preserved across the reset; votes are not.
//!
//! The duplicate-vote race is handled twice: an upfront existence check for
//! the friendly path, and the UNIQUE(album_id, voter_hash) index as the
//! backstop, translated into the same conflict answer.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use arbourne_common::db::models::{Album, Comment};
use arbourne_common::session::voter_hash;
use arbourne_common::{Error, Result};

use crate::clients::MetadataProvider;

/// Days an album stays closed after being featured
pub const FEATURED_WINDOW_DAYS: i64 = 30;

/// Minimum length of the comment accompanying a vote
pub const MIN_VOTE_COMMENT_CHARS: usize = 20;

/// Comment length bounds for the comments endpoint
pub const MIN_COMMENT_CHARS: usize = 10;
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Sort order for comment listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSort {
    Newest,
    /// Most direct replies first; there is no like count, reply volume is
    /// the only popularity signal
    Popular,
}

impl CommentSort {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "newest" => Ok(Self::Newest),
            "popular" => Ok(Self::Popular),
            other => Err(Error::InvalidInput(format!(
                "Unknown sort: {} (expected newest or popular)",
                other
            ))),
        }
    }
}

/// A top-level comment with its replies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
    pub replies: Vec<CommentReply>,
}

/// A single-level reply
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
}

/// Submit a vote for a release group, creating the album on first vote.
///
/// Returns the album as it stands after the vote.
pub async fn submit_vote(
    pool: &SqlitePool,
    metadata: &dyn MetadataProvider,
    user_id: &str,
    release_group_mbid: &str,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Album> {
    if comment.chars().count() < MIN_VOTE_COMMENT_CHARS {
        return Err(Error::InvalidInput(format!(
            "Please say a little more about why ({} characters minimum)",
            MIN_VOTE_COMMENT_CHARS
        )));
    }
    if release_group_mbid.trim().is_empty() {
        return Err(Error::InvalidInput(
            "musicBrainzReleaseGroupId is required".to_string(),
        ));
    }

    let voter = voter_hash(user_id);

    let existing: Option<Album> =
        sqlx::query_as("SELECT * FROM albums WHERE release_group_mbid = ?")
            .bind(release_group_mbid)
            .fetch_optional(pool)
            .await?;

    match existing {
        None => {
            match create_album_with_vote(pool, metadata, user_id, release_group_mbid, &voter, comment, now)
                .await
            {
                Err(e) if e.is_unique_violation() => {
                    // Lost the creation race; the album exists now
                    let album: Album =
                        sqlx::query_as("SELECT * FROM albums WHERE release_group_mbid = ?")
                            .bind(release_group_mbid)
                            .fetch_one(pool)
                            .await?;
                    vote_on_existing(pool, user_id, &album, &voter, comment, now).await
                }
                other => other,
            }
        }
        Some(album) => vote_on_existing(pool, user_id, &album, &voter, comment, now).await,
    }
}

/// First vote: resolve metadata upstream and create the album
async fn create_album_with_vote(
    pool: &SqlitePool,
    metadata: &dyn MetadataProvider,
    user_id: &str,
    release_group_mbid: &str,
    voter: &str,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Album> {
    let info = metadata
        .lookup_release_group(release_group_mbid)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Unknown album: {}", release_group_mbid)))?;

    // Missing cover art is a non-critical side effect: log and carry on
    let cover_url = match metadata.lookup_cover_url(release_group_mbid).await {
        Ok(url) => url,
        Err(e) => {
            warn!(mbid = %release_group_mbid, "cover art lookup failed: {}", e);
            None
        }
    };

    let album_id = Uuid::new_v4().to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO albums (id, release_group_mbid, title, artist, cover_url, vote_count, created_at)
        VALUES (?, ?, ?, ?, ?, 1, ?)
        "#,
    )
    .bind(&album_id)
    .bind(release_group_mbid)
    .bind(&info.title)
    .bind(&info.artist)
    .bind(&cover_url)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    insert_vote(&mut tx, &album_id, voter, now).await?;
    insert_comment_row(&mut tx, &album_id, user_id, None, comment, now).await?;

    tx.commit().await?;

    info!(album_id = %album_id, title = %info.title, "album created from first vote");

    fetch_album(pool, &album_id).await
}

/// Vote on an album that already exists, honoring the featured window
async fn vote_on_existing(
    pool: &SqlitePool,
    user_id: &str,
    album: &Album,
    voter: &str,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Album> {
    if let Some(featured_at) = album.featured_at {
        if featured_at > now - Duration::days(FEATURED_WINDOW_DAYS) {
            return Err(Error::Conflict(
                "This album is currently featured; voting re-opens later".to_string(),
            ));
        }
        // Featured long enough: re-open for discussion. Votes reset,
        // comments stay.
        return reopen_with_vote(pool, user_id, album, voter, comment, now).await;
    }

    let already_voted: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM votes WHERE album_id = ? AND voter_hash = ?)",
    )
    .bind(&album.id)
    .bind(voter)
    .fetch_one(pool)
    .await?;

    if already_voted {
        return Err(Error::Conflict(
            "You have already voted for this album".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let result = insert_vote(&mut tx, &album.id, voter, now).await;
    if let Err(e) = result {
        // Constraint backstop for the check-then-insert race
        if e.is_unique_violation() {
            return Err(Error::Conflict(
                "You have already voted for this album".to_string(),
            ));
        }
        return Err(e);
    }

    sqlx::query("UPDATE albums SET vote_count = vote_count + 1 WHERE id = ?")
        .bind(&album.id)
        .execute(&mut *tx)
        .await?;

    insert_comment_row(&mut tx, &album.id, user_id, None, comment, now).await?;

    tx.commit().await?;

    fetch_album(pool, &album.id).await
}

/// Reset a stale featured album on its next vote: clear featured_at, drop
/// all prior votes, count restarts at 1. One all-or-nothing transaction.
async fn reopen_with_vote(
    pool: &SqlitePool,
    user_id: &str,
    album: &Album,
    voter: &str,
    comment: &str,
    now: DateTime<Utc>,
) -> Result<Album> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM votes WHERE album_id = ?")
        .bind(&album.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE albums SET featured_at = NULL, vote_count = 1 WHERE id = ?")
        .bind(&album.id)
        .execute(&mut *tx)
        .await?;

    insert_vote(&mut tx, &album.id, voter, now).await?;
    insert_comment_row(&mut tx, &album.id, user_id, None, comment, now).await?;

    tx.commit().await?;

    info!(album_id = %album.id, "album re-opened for discussion after featured window");

    fetch_album(pool, &album.id).await
}

async fn insert_vote(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    album_id: &str,
    voter: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO votes (id, album_id, voter_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(album_id)
        .bind(voter)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_comment_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    album_id: &str,
    user_id: &str,
    parent_id: Option<&str>,
    content: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO comments (id, album_id, user_id, parent_id, content, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(album_id)
    .bind(user_id)
    .bind(parent_id)
    .bind(content)
    .bind(now)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn fetch_album(pool: &SqlitePool, album_id: &str) -> Result<Album> {
    let album: Album = sqlx::query_as("SELECT * FROM albums WHERE id = ?")
        .bind(album_id)
        .fetch_one(pool)
        .await?;
    Ok(album)
}

/// All albums, featured first, then by vote count
pub async fn list_albums(pool: &SqlitePool) -> Result<Vec<Album>> {
    let albums: Vec<Album> = sqlx::query_as(
        r#"
        SELECT * FROM albums
        ORDER BY (featured_at IS NOT NULL) DESC, vote_count DESC, created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(albums)
}

/// Add a comment to an album (top-level or a single-level reply)
pub async fn add_comment(
    pool: &SqlitePool,
    album_id: &str,
    user_id: &str,
    parent_id: Option<&str>,
    content: &str,
    now: DateTime<Utc>,
) -> Result<Comment> {
    let chars = content.chars().count();
    if chars < MIN_COMMENT_CHARS || chars > MAX_COMMENT_CHARS {
        return Err(Error::InvalidInput(format!(
            "Comment must be between {} and {} characters",
            MIN_COMMENT_CHARS, MAX_COMMENT_CHARS
        )));
    }

    let album_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM albums WHERE id = ?)")
        .bind(album_id)
        .fetch_one(pool)
        .await?;
    if !album_exists {
        return Err(Error::NotFound(format!("Unknown album: {}", album_id)));
    }

    if let Some(parent) = parent_id {
        let parent_row: Option<(String, Option<String>)> =
            sqlx::query_as("SELECT album_id, parent_id FROM comments WHERE id = ?")
                .bind(parent)
                .fetch_optional(pool)
                .await?;

        match parent_row {
            None => {
                return Err(Error::NotFound(format!("Unknown parent comment: {}", parent)));
            }
            Some((parent_album, _)) if parent_album != album_id => {
                return Err(Error::NotFound(format!("Unknown parent comment: {}", parent)));
            }
            Some((_, Some(_))) => {
                // One level of replies only
                return Err(Error::InvalidInput(
                    "Replies to replies are not supported".to_string(),
                ));
            }
            Some(_) => {}
        }
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO comments (id, album_id, user_id, parent_id, content, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(album_id)
    .bind(user_id)
    .bind(parent_id)
    .bind(content)
    .bind(now)
    .execute(pool)
    .await?;

    let comment: Comment = sqlx::query_as("SELECT * FROM comments WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await?;
    Ok(comment)
}

/// Comments for an album as threads: top-level in the requested order, each
/// with its replies oldest-first.
pub async fn list_comments(
    pool: &SqlitePool,
    album_id: &str,
    sort: CommentSort,
) -> Result<Vec<CommentThread>> {
    let album_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM albums WHERE id = ?)")
        .bind(album_id)
        .fetch_one(pool)
        .await?;
    if !album_exists {
        return Err(Error::NotFound(format!("Unknown album: {}", album_id)));
    }

    let order = match sort {
        CommentSort::Newest => "c.created_at DESC",
        CommentSort::Popular => "reply_count DESC, c.created_at DESC",
    };

    let top_level: Vec<(Comment, String, i64)> = sqlx::query_as::<_, TopLevelRow>(&format!(
        r#"
        SELECT c.id, c.album_id, c.user_id, c.parent_id, c.content, c.created_at,
               u.display_name,
               (SELECT COUNT(*) FROM comments r WHERE r.parent_id = c.id) AS reply_count
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.album_id = ? AND c.parent_id IS NULL
        ORDER BY {order}
        "#
    ))
    .bind(album_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(TopLevelRow::into_parts)
    .collect();

    let replies: Vec<(Comment, String)> = sqlx::query_as::<_, ReplyRow>(
        r#"
        SELECT c.id, c.album_id, c.user_id, c.parent_id, c.content, c.created_at,
               u.display_name
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.album_id = ? AND c.parent_id IS NOT NULL
        ORDER BY c.created_at
        "#,
    )
    .bind(album_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(ReplyRow::into_parts)
    .collect();

    let mut threads: Vec<CommentThread> = top_level
        .into_iter()
        .map(|(comment, author, _)| CommentThread {
            comment,
            author,
            replies: Vec::new(),
        })
        .collect();

    for (reply, author) in replies {
        let Some(parent) = reply.parent_id.clone() else {
            continue;
        };
        if let Some(thread) = threads.iter_mut().find(|t| t.comment.id == parent) {
            thread.replies.push(CommentReply {
                comment: reply,
                author,
            });
        }
    }

    Ok(threads)
}

#[derive(sqlx::FromRow)]
struct TopLevelRow {
    id: String,
    album_id: String,
    user_id: String,
    parent_id: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
    display_name: String,
    reply_count: i64,
}

impl TopLevelRow {
    fn into_parts(self) -> (Comment, String, i64) {
        (
            Comment {
                id: self.id,
                album_id: self.album_id,
                user_id: self.user_id,
                parent_id: self.parent_id,
                content: self.content,
                created_at: self.created_at,
            },
            self.display_name,
            self.reply_count,
        )
    }
}

#[derive(sqlx::FromRow)]
struct ReplyRow {
    id: String,
    album_id: String,
    user_id: String,
    parent_id: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
    display_name: String,
}

impl ReplyRow {
    fn into_parts(self) -> (Comment, String) {
        (
            Comment {
                id: self.id,
                album_id: self.album_id,
                user_id: self.user_id,
                parent_id: self.parent_id,
                content: self.content,
                created_at: self.created_at,
            },
            self.display_name,
        )
    }
}
