//! Upstream music metadata clients
//!
//! The board only needs two lookups: a MusicBrainz release group (title and
//! artist) and its front cover from the Cover Art Archive. Both sit behind
//! one trait so the board logic can be exercised without the network.

use async_trait::async_trait;

use arbourne_common::Result;

pub mod coverart;
pub mod musicbrainz;

pub use coverart::CoverArtClient;
pub use musicbrainz::MusicBrainzClient;

/// Metadata for a MusicBrainz release group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseGroupInfo {
    pub mbid: String,
    pub title: String,
    pub artist: String,
}

/// Upstream lookups needed by the recommendation board
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Resolve a release group MBID. `None` means the MBID is unknown
    /// upstream.
    async fn lookup_release_group(&self, mbid: &str) -> Result<Option<ReleaseGroupInfo>>;

    /// Front cover URL for a release group. `None` means no art exists;
    /// that is not an error.
    async fn lookup_cover_url(&self, mbid: &str) -> Result<Option<String>>;
}

/// Production provider: MusicBrainz for metadata, Cover Art Archive for art.
pub struct UpstreamMetadata {
    musicbrainz: MusicBrainzClient,
    coverart: CoverArtClient,
}

impl UpstreamMetadata {
    pub fn new() -> Self {
        Self {
            musicbrainz: MusicBrainzClient::new(),
            coverart: CoverArtClient::new(),
        }
    }
}

impl Default for UpstreamMetadata {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataProvider for UpstreamMetadata {
    async fn lookup_release_group(&self, mbid: &str) -> Result<Option<ReleaseGroupInfo>> {
        self.musicbrainz.lookup_release_group(mbid).await
    }

    async fn lookup_cover_url(&self, mbid: &str) -> Result<Option<String>> {
        self.coverart.front_cover_url(mbid).await
    }
}
