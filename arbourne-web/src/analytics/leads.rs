//! Lead scoring aggregator
//!
//! Ranks known users by lead score over a lookback window. Score is a pure
//! function of the event log: Σ(count × fixed point value) over qualifying
//! event types. Recomputed on every read.
//!
//! Tie order between equal scores is unspecified and not guaranteed stable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use arbourne_common::events::EventType;
use arbourne_common::Result;

/// Maximum number of leads returned
const MAX_LEADS: usize = 50;

/// Number of top interest products attached per lead
const TOP_INTERESTS: i64 = 3;

/// Per-event-type score contribution
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub count: i64,
    /// count × the type's fixed point value
    pub points: i64,
}

/// A product a lead has shown interest in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInterest {
    pub product_handle: String,
    pub count: i64,
}

/// One ranked lead
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub total_score: i64,
    pub breakdown: Vec<ScoreBreakdown>,
    pub top_interests: Vec<ProductInterest>,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Quote a static event-type list for an SQL IN clause
pub(crate) fn sql_type_list(types: &[EventType]) -> String {
    types
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compute the ranked lead list for events at or after `cutoff`.
///
/// Queries run sequentially; any failure aborts the whole aggregation with
/// no partial results.
pub async fn compute_leads(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<Vec<Lead>> {
    let qualifying = sql_type_list(&EventType::QUALIFYING);
    let interest = sql_type_list(&EventType::INTEREST);

    // Users with at least one qualifying event in the window
    let candidates: Vec<(String, String, String)> = sqlx::query_as(&format!(
        r#"
        SELECT DISTINCT u.id, u.email, u.display_name
        FROM user_events e
        JOIN users u ON u.id = e.user_id
        WHERE e.event_type IN ({qualifying})
          AND e.timestamp >= ?
        "#
    ))
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let mut leads = Vec::with_capacity(candidates.len());

    for (user_id, email, display_name) in candidates {
        // Qualifying events grouped by type
        let counts: Vec<(String, i64)> = sqlx::query_as(&format!(
            r#"
            SELECT event_type, COUNT(*)
            FROM user_events
            WHERE user_id = ?
              AND event_type IN ({qualifying})
              AND timestamp >= ?
            GROUP BY event_type
            "#
        ))
        .bind(&user_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        let mut breakdown = Vec::with_capacity(counts.len());
        let mut total_score = 0;
        for (type_str, count) in counts {
            let Some(event_type) = EventType::parse(&type_str) else {
                continue;
            };
            let points = count * event_type.points();
            total_score += points;
            breakdown.push(ScoreBreakdown {
                event_type,
                count,
                points,
            });
        }

        // Top interest products by event count
        let top_interests: Vec<(String, i64)> = sqlx::query_as(&format!(
            r#"
            SELECT json_extract(event_data, '$.productHandle') AS handle, COUNT(*) AS n
            FROM user_events
            WHERE user_id = ?
              AND event_type IN ({interest})
              AND timestamp >= ?
              AND handle IS NOT NULL
            GROUP BY handle
            ORDER BY n DESC
            LIMIT {TOP_INTERESTS}
            "#
        ))
        .bind(&user_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

        // Most recent event of any type
        let last_activity: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(timestamp) FROM user_events WHERE user_id = ?",
        )
        .bind(&user_id)
        .fetch_one(pool)
        .await?;

        leads.push(Lead {
            user_id,
            email,
            display_name,
            total_score,
            breakdown,
            top_interests: top_interests
                .into_iter()
                .map(|(product_handle, count)| ProductInterest {
                    product_handle,
                    count,
                })
                .collect(),
            last_activity,
        });
    }

    leads.retain(|lead| lead.total_score > 0);
    leads.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    leads.truncate(MAX_LEADS);

    Ok(leads)
}
