use chrono::{DateTime, Local};

/// Placeholder stored in `Listing::posted_text` when the detail page shows no time phrase.
pub const UNKNOWN_POSTED_TEXT: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Absolute listing URL, also the dedup key.
    pub id: String,
    pub title: String,
    pub posted_text: String,
    pub observed_at: DateTime<Local>,
}

impl Listing {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        posted_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            posted_text: posted_text.into(),
            observed_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Unknown,
}

/// A link found on a rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}
