//! Cover Art Archive client
//!
//! Fetches the front cover for a release group. Missing art is common and
//! never fatal: an album without a cover is still an album.
//!
//! # API Reference
//! - Endpoint: https://coverartarchive.org/release-group/{mbid}
//! - Documentation: https://musicbrainz.org/doc/Cover_Art_Archive/API

use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use arbourne_common::cache::TtlCache;
use arbourne_common::{Error, Result};

const COVERART_API_URL: &str = "https://coverartarchive.org";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const USER_AGENT: &str = "ArbourneAudio/0.1.0 (https://arbourne.audio)";

/// Cover Art Archive client with a TTL cache over lookups
pub struct CoverArtClient {
    http_client: Client,
    cache: TtlCache<String, Option<String>>,
}

impl CoverArtClient {
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
            cache: TtlCache::new(CACHE_TTL),
        }
    }

    /// URL of the front cover thumbnail, or `None` when no art exists.
    pub async fn front_cover_url(&self, mbid: &str) -> Result<Option<String>> {
        if let Some(cached) = self.cache.get(mbid).await {
            debug!(mbid = %mbid, "Cover Art Archive cache hit");
            return Ok(cached);
        }

        let url = format!("{}/release-group/{}", COVERART_API_URL, mbid);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Cover Art Archive request failed: {}", e)))?;

        // 404 means no art has been uploaded for this release group
        if response.status().as_u16() == 404 {
            self.cache.insert(mbid.to_string(), None).await;
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Cover Art Archive returned error {}",
                response.status()
            )));
        }

        let listing: CoverListing = response.json().await.map_err(|e| {
            Error::Upstream(format!("Failed to parse Cover Art Archive response: {}", e))
        })?;

        let cover = pick_front_cover(&listing);
        self.cache.insert(mbid.to_string(), cover.clone()).await;
        Ok(cover)
    }
}

impl Default for CoverArtClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefer the image marked as front; fall back to the first image.
/// Thumbnails beat full-size scans for a board grid.
fn pick_front_cover(listing: &CoverListing) -> Option<String> {
    let image = listing
        .images
        .iter()
        .find(|img| img.front)
        .or_else(|| listing.images.first())?;

    image
        .thumbnails
        .as_ref()
        .and_then(|t| t.small.clone().or_else(|| t.large.clone()))
        .or_else(|| Some(image.image.clone()))
}

// ============================================================================
// Cover Art Archive Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoverListing {
    images: Vec<CoverImage>,
}

#[derive(Debug, Deserialize)]
struct CoverImage {
    #[serde(default)]
    front: bool,
    image: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    small: Option<String>,
    large: Option<String>,
}
