//! Tracked interaction events and the lead-scoring table
//!
//! Every tracked interaction on the site is one of a closed set of event
//! types. A fixed subset carries lead-scoring points; the rest are recorded
//! for traffic analytics only and score zero.
//!
//! Event payloads are a tagged union keyed by event type: each type has a
//! known payload shape, and ingestion rejects a payload whose fields do not
//! belong to its type.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Closed set of tracked interaction types.
///
/// Stored in `user_events.event_type` as the SCREAMING_SNAKE_CASE string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PageView,
    CtaClick,
    VideoPlay,
    DownloadBrochure,
    DownloadPlan,
    FormSubmit,
    ProductView,
    AddToCart,
    BeginCheckout,
    TrustYourEarsVote,
    EnquiryStart,
    EnquirySubmit,
    ProductRevisit,
    BlogDeepRead,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [EventType; 14] = [
        EventType::PageView,
        EventType::CtaClick,
        EventType::VideoPlay,
        EventType::DownloadBrochure,
        EventType::DownloadPlan,
        EventType::FormSubmit,
        EventType::ProductView,
        EventType::AddToCart,
        EventType::BeginCheckout,
        EventType::TrustYourEarsVote,
        EventType::EnquiryStart,
        EventType::EnquirySubmit,
        EventType::ProductRevisit,
        EventType::BlogDeepRead,
    ];

    /// Event types that carry lead-scoring points.
    pub const QUALIFYING: [EventType; 6] = [
        EventType::EnquirySubmit,
        EventType::BeginCheckout,
        EventType::EnquiryStart,
        EventType::ProductRevisit,
        EventType::DownloadBrochure,
        EventType::BlogDeepRead,
    ];

    /// Event types counted as product interest signals.
    pub const INTEREST: [EventType; 3] = [
        EventType::ProductView,
        EventType::AddToCart,
        EventType::BeginCheckout,
    ];

    /// Fixed lead-scoring point value. Zero for non-qualifying types.
    pub fn points(self) -> i64 {
        match self {
            EventType::EnquirySubmit => 10,
            EventType::BeginCheckout => 6,
            EventType::EnquiryStart => 5,
            EventType::ProductRevisit => 3,
            EventType::DownloadBrochure => 2,
            EventType::BlogDeepRead => 1,
            _ => 0,
        }
    }

    /// Database / wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::PageView => "PAGE_VIEW",
            EventType::CtaClick => "CTA_CLICK",
            EventType::VideoPlay => "VIDEO_PLAY",
            EventType::DownloadBrochure => "DOWNLOAD_BROCHURE",
            EventType::DownloadPlan => "DOWNLOAD_PLAN",
            EventType::FormSubmit => "FORM_SUBMIT",
            EventType::ProductView => "PRODUCT_VIEW",
            EventType::AddToCart => "ADD_TO_CART",
            EventType::BeginCheckout => "BEGIN_CHECKOUT",
            EventType::TrustYourEarsVote => "TRUST_YOUR_EARS_VOTE",
            EventType::EnquiryStart => "ENQUIRY_START",
            EventType::EnquirySubmit => "ENQUIRY_SUBMIT",
            EventType::ProductRevisit => "PRODUCT_REVISIT",
            EventType::BlogDeepRead => "BLOG_DEEP_READ",
        }
    }

    /// Parse the database / wire representation.
    pub fn parse(s: &str) -> Option<EventType> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload attached to a product-related event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductData {
    pub product_handle: Option<String>,
    pub variant: Option<String>,
}

/// Payload attached to a CTA click.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CtaData {
    pub cta_name: Option<String>,
    pub cta_target: Option<String>,
}

/// Payload attached to a form or enquiry event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormData {
    pub form_type: Option<String>,
}

/// Payload attached to a video play.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VideoData {
    pub video_id: Option<String>,
    pub position_seconds: Option<f64>,
}

/// Payload attached to a brochure or plan download.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DownloadData {
    pub document: Option<String>,
}

/// Payload attached to a blog deep-read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArticleData {
    pub article_slug: Option<String>,
    pub read_seconds: Option<f64>,
}

/// Structured event payload, tagged by the owning [`EventType`].
///
/// Replaces a freeform catch-all JSON blob: every event type maps to exactly
/// one variant, and unknown fields are rejected at ingestion time.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Product(ProductData),
    Cta(CtaData),
    Form(FormData),
    Video(VideoData),
    Download(DownloadData),
    Article(ArticleData),
    /// PAGE_VIEW and TRUST_YOUR_EARS_VOTE carry no payload.
    Empty,
}

impl EventPayload {
    /// Validate and parse a raw JSON payload against its event type.
    ///
    /// A missing payload is valid for every type (all payload fields are
    /// optional). A payload whose fields do not belong to the event type's
    /// variant is rejected with [`Error::InvalidInput`].
    pub fn parse(event_type: EventType, raw: Option<&serde_json::Value>) -> Result<EventPayload> {
        let Some(value) = raw else {
            return Ok(EventPayload::Empty);
        };
        if value.is_null() {
            return Ok(EventPayload::Empty);
        }

        let mismatch = |e: serde_json::Error| {
            Error::InvalidInput(format!(
                "eventData does not match event type {}: {}",
                event_type, e
            ))
        };

        match event_type {
            EventType::ProductView
            | EventType::AddToCart
            | EventType::BeginCheckout
            | EventType::ProductRevisit => {
                let data: ProductData =
                    serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Product(data))
            }
            EventType::CtaClick => {
                let data: CtaData = serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Cta(data))
            }
            EventType::FormSubmit | EventType::EnquiryStart | EventType::EnquirySubmit => {
                let data: FormData = serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Form(data))
            }
            EventType::VideoPlay => {
                let data: VideoData = serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Video(data))
            }
            EventType::DownloadBrochure | EventType::DownloadPlan => {
                let data: DownloadData =
                    serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Download(data))
            }
            EventType::BlogDeepRead => {
                let data: ArticleData =
                    serde_json::from_value(value.clone()).map_err(mismatch)?;
                Ok(EventPayload::Article(data))
            }
            EventType::PageView | EventType::TrustYourEarsVote => {
                // No payload defined; anything but an empty object is a mismatch
                match value.as_object() {
                    Some(map) if map.is_empty() => Ok(EventPayload::Empty),
                    _ => Err(Error::InvalidInput(format!(
                        "event type {} does not accept eventData",
                        event_type
                    ))),
                }
            }
        }
    }

    /// Serialize for storage in `user_events.event_data`.
    ///
    /// Returns `None` for the empty payload so the column stays NULL.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            EventPayload::Empty => None,
            other => serde_json::to_value(other).ok(),
        }
    }
}
