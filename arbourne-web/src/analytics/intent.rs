//! Per-user intent aggregator
//!
//! Shapes a single user's activity into independent grouped views. Each
//! view is its own query over the event table; they run sequentially and
//! share no transaction, so the result sets may be mutually inconsistent by
//! a few events. That is accepted for an internal dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use arbourne_common::events::EventType;
use arbourne_common::{Error, Result};

use super::leads::sql_type_list;

const TOP_PATHS: i64 = 10;
const RECENT_CTA_CLICKS: i64 = 20;

/// A visited path with its view count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathVisits {
    pub path: String,
    pub count: i64,
    pub last_visit: DateTime<Utc>,
}

/// Product view/revisit tallies
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActivity {
    pub product_handle: String,
    pub views: i64,
    pub revisits: i64,
}

/// One step of the cart/checkout trace
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceStep {
    pub event_type: String,
    pub product_handle: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A tallied identifier (video id, document name, form type)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub key: String,
    pub count: i64,
}

/// A recent CTA click
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CtaClick {
    pub cta_name: Option<String>,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything the dashboard shows about one user's intent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIntent {
    pub user_id: String,
    pub top_paths: Vec<PathVisits>,
    pub products: Vec<ProductActivity>,
    pub commerce_trace: Vec<CommerceStep>,
    pub video_plays: Vec<Tally>,
    pub brochure_downloads: Vec<Tally>,
    pub enquiry_starts: i64,
    pub enquiry_submits: i64,
    pub recent_cta_clicks: Vec<CtaClick>,
}

/// Compute the intent views for one user over events at or after `cutoff`.
pub async fn compute_user_intent(
    pool: &SqlitePool,
    user_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<UserIntent> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(Error::NotFound(format!("Unknown user: {}", user_id)));
    }

    let top_paths: Vec<(String, i64, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT path, COUNT(*) AS n, MAX(timestamp)
        FROM user_events
        WHERE user_id = ? AND event_type = 'PAGE_VIEW' AND timestamp >= ?
        GROUP BY path
        ORDER BY n DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .bind(TOP_PATHS)
    .fetch_all(pool)
    .await?;

    let products: Vec<(String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT json_extract(event_data, '$.productHandle') AS handle,
               SUM(CASE WHEN event_type = 'PRODUCT_VIEW' THEN 1 ELSE 0 END),
               SUM(CASE WHEN event_type = 'PRODUCT_REVISIT' THEN 1 ELSE 0 END)
        FROM user_events
        WHERE user_id = ?
          AND event_type IN ('PRODUCT_VIEW', 'PRODUCT_REVISIT')
          AND timestamp >= ?
          AND handle IS NOT NULL
        GROUP BY handle
        ORDER BY COUNT(*) DESC
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let commerce = sql_type_list(&[EventType::AddToCart, EventType::BeginCheckout]);
    let commerce_trace: Vec<(String, Option<String>, DateTime<Utc>)> = sqlx::query_as(&format!(
        r#"
        SELECT event_type, json_extract(event_data, '$.productHandle'), timestamp
        FROM user_events
        WHERE user_id = ? AND event_type IN ({commerce}) AND timestamp >= ?
        ORDER BY timestamp
        "#
    ))
    .bind(user_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let video_plays = tally(
        pool,
        user_id,
        cutoff,
        "VIDEO_PLAY",
        "$.videoId",
    )
    .await?;

    let brochure_downloads = tally(
        pool,
        user_id,
        cutoff,
        "DOWNLOAD_BROCHURE",
        "$.document",
    )
    .await?;

    let enquiry_starts = count_type(pool, user_id, cutoff, "ENQUIRY_START").await?;
    let enquiry_submits = count_type(pool, user_id, cutoff, "ENQUIRY_SUBMIT").await?;

    let recent_cta_clicks: Vec<(Option<String>, String, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT json_extract(event_data, '$.ctaName'), path, timestamp
        FROM user_events
        WHERE user_id = ? AND event_type = 'CTA_CLICK' AND timestamp >= ?
        ORDER BY timestamp DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(cutoff)
    .bind(RECENT_CTA_CLICKS)
    .fetch_all(pool)
    .await?;

    Ok(UserIntent {
        user_id: user_id.to_string(),
        top_paths: top_paths
            .into_iter()
            .map(|(path, count, last_visit)| PathVisits {
                path,
                count,
                last_visit,
            })
            .collect(),
        products: products
            .into_iter()
            .map(|(product_handle, views, revisits)| ProductActivity {
                product_handle,
                views,
                revisits,
            })
            .collect(),
        commerce_trace: commerce_trace
            .into_iter()
            .map(|(event_type, product_handle, timestamp)| CommerceStep {
                event_type,
                product_handle,
                timestamp,
            })
            .collect(),
        video_plays,
        brochure_downloads,
        enquiry_starts,
        enquiry_submits,
        recent_cta_clicks: recent_cta_clicks
            .into_iter()
            .map(|(cta_name, path, timestamp)| CtaClick {
                cta_name,
                path,
                timestamp,
            })
            .collect(),
    })
}

/// Grouped count of one event type keyed by a JSON payload field
async fn tally(
    pool: &SqlitePool,
    user_id: &str,
    cutoff: DateTime<Utc>,
    event_type: &str,
    json_path: &str,
) -> Result<Vec<Tally>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT COALESCE(json_extract(event_data, ?), '(unknown)') AS key, COUNT(*) AS n
        FROM user_events
        WHERE user_id = ? AND event_type = ? AND timestamp >= ?
        GROUP BY key
        ORDER BY n DESC
        "#,
    )
    .bind(json_path)
    .bind(user_id)
    .bind(event_type)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(key, count)| Tally { key, count }).collect())
}

async fn count_type(
    pool: &SqlitePool,
    user_id: &str,
    cutoff: DateTime<Utc>,
    event_type: &str,
) -> Result<i64> {
    let n: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_events WHERE user_id = ? AND event_type = ? AND timestamp >= ?",
    )
    .bind(user_id)
    .bind(event_type)
    .bind(cutoff)
    .fetch_one(pool)
    .await?;
    Ok(n)
}
