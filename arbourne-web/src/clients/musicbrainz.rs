//! MusicBrainz client
//!
//! Resolves release group MBIDs to title and artist for the recommendation
//! board. Respects the MusicBrainz rate limit (1 request/second) and keeps a
//! TTL cache of lookups so repeat votes for the same album stay off the
//! network.
//!
//! # API Reference
//! - Endpoint: https://musicbrainz.org/ws/2/release-group/{mbid}
//! - Documentation: https://musicbrainz.org/doc/MusicBrainz_API
//! - Rate Limit: 1 request/second (MusicBrainz Terms of Service)

use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use arbourne_common::cache::TtlCache;
use arbourne_common::{Error, Result};

use super::ReleaseGroupInfo;

/// MusicBrainz API base URL
const MUSICBRAINZ_API_URL: &str = "https://musicbrainz.org/ws/2";

/// Default timeout for MusicBrainz API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Rate limit: 1 request per second (MusicBrainz TOS)
const RATE_LIMIT_INTERVAL: Duration = Duration::from_millis(1000);

/// How long a successful lookup stays cached
const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// User-Agent header (required by MusicBrainz)
const USER_AGENT: &str = "ArbourneAudio/0.1.0 (https://arbourne.audio)";

/// MusicBrainz release group client with rate limiting and caching
pub struct MusicBrainzClient {
    http_client: Client,
    /// Rate limiter (last request time)
    rate_limiter: Mutex<Option<Instant>>,
    /// Cache keyed by MBID; a hit skips the rate limiter entirely
    cache: TtlCache<String, Option<ReleaseGroupInfo>>,
}

impl MusicBrainzClient {
    /// Create new MusicBrainz client
    pub fn new() -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Self {
            http_client: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .default_headers(headers)
                .build()
                .expect("Failed to create HTTP client"),
            rate_limiter: Mutex::new(None),
            cache: TtlCache::new(CACHE_TTL),
        }
    }

    /// Enforce rate limit (1 request/second)
    async fn enforce_rate_limit(&self) {
        let mut last_request = self.rate_limiter.lock().await;

        if let Some(last_time) = *last_request {
            let elapsed = last_time.elapsed();
            if elapsed < RATE_LIMIT_INTERVAL {
                let sleep_duration = RATE_LIMIT_INTERVAL - elapsed;
                debug!(
                    sleep_ms = sleep_duration.as_millis(),
                    "Rate limiting: sleeping before MusicBrainz request"
                );
                sleep(sleep_duration).await;
            }
        }

        *last_request = Some(Instant::now());
    }

    /// Look up a release group by MBID
    ///
    /// Returns `None` when MusicBrainz does not know the MBID.
    pub async fn lookup_release_group(&self, mbid: &str) -> Result<Option<ReleaseGroupInfo>> {
        if let Some(cached) = self.cache.get(mbid).await {
            debug!(mbid = %mbid, "MusicBrainz cache hit");
            return Ok(cached);
        }

        self.enforce_rate_limit().await;

        let url = format!(
            "{}/release-group/{}?inc=artists&fmt=json",
            MUSICBRAINZ_API_URL, mbid
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("MusicBrainz request failed: {}", e)))?;

        if response.status().as_u16() == 404 {
            self.cache.insert(mbid.to_string(), None).await;
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "MusicBrainz returned error {}: {}",
                status, body
            )));
        }

        let release_group: ReleaseGroupResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse MusicBrainz response: {}", e)))?;

        let info = ReleaseGroupInfo {
            mbid: release_group.id,
            title: release_group.title,
            artist: join_artist_credit(&release_group.artist_credit),
        };

        debug!(mbid = %mbid, title = %info.title, artist = %info.artist, "MusicBrainz lookup complete");

        self.cache.insert(mbid.to_string(), Some(info.clone())).await;
        Ok(Some(info))
    }
}

impl Default for MusicBrainzClient {
    fn default() -> Self {
        Self::new()
    }
}

fn join_artist_credit(credit: &Option<Vec<ArtistCredit>>) -> String {
    match credit {
        Some(credits) if !credits.is_empty() => credits
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        _ => "Unknown Artist".to_string(),
    }
}

// ============================================================================
// MusicBrainz API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReleaseGroupResponse {
    id: String,
    title: String,
    #[serde(rename = "artist-credit")]
    artist_credit: Option<Vec<ArtistCredit>>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: String,
}
