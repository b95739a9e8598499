use std::collections::HashSet;
use std::sync::LazyLock;
use std::vec;

use log::{info, warn};
use regex::Regex;

use crate::browser::{BrowserSession, DetailTab, ORIGIN};
use crate::error::{BrowserError, ExtractionError};
use crate::models::{Anchor, Listing, UNKNOWN_POSTED_TEXT};
use crate::parser;
use crate::poll::Shutdown;

pub const ITEM_LINK_FRAGMENT: &str = "/marketplace/item/";

static TIME_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(posted|updated|listed|just now|minute|hour|day|week|month|year|second|now)")
        .expect("time phrase pattern")
});

/// Listings of one search page, read lazily: each call to `next` visits one detail page.
///
/// Listings whose detail page can't be read are logged and skipped. With a
/// [`Shutdown`] attached, the stream ends before the next detail page once
/// shutdown is requested.
pub struct ListingStream<'a, B: BrowserSession + ?Sized> {
    session: &'a mut B,
    pending: vec::IntoIter<Anchor>,
    shutdown: Option<&'a Shutdown>,
}

impl<'a, B: BrowserSession + ?Sized> ListingStream<'a, B> {
    /// Load the search page in the primary context and collect its listing links.
    pub fn open(session: &'a mut B, search_url: &str) -> Result<Self, BrowserError> {
        session.navigate(search_url)?;

        let mut seen = HashSet::new();
        let anchors: Vec<Anchor> = session
            .anchors_containing(ITEM_LINK_FRAGMENT)?
            .into_iter()
            .map(|anchor| Anchor {
                href: parser::canonical_url(&parser::resolve_url(&anchor.href, ORIGIN)),
                text: anchor.text,
            })
            .filter(|anchor| seen.insert(anchor.href.clone()))
            .collect();

        info!("Found {} listing links", anchors.len());
        Ok(Self {
            session,
            pending: anchors.into_iter(),
            shutdown: None,
        })
    }

    pub fn until(mut self, shutdown: &'a Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    fn read_listing(&mut self, anchor: Anchor) -> Result<Listing, ExtractionError> {
        let title = parser::title_line(&anchor.text);
        let url = anchor.href;
        let failed = |source| ExtractionError {
            url: url.clone(),
            source,
        };

        let mut tab = DetailTab::open(&mut *self.session).map_err(failed)?;
        tab.navigate(&url).map_err(failed)?;

        let posted_text = match tab.texts_matching(&TIME_PHRASE) {
            Ok(texts) => texts
                .into_iter()
                .next()
                .unwrap_or_else(|| UNKNOWN_POSTED_TEXT.to_string()),
            Err(e) => {
                warn!("Error extracting posted time for {}: {}", url, e);
                UNKNOWN_POSTED_TEXT.to_string()
            }
        };
        drop(tab);

        Ok(Listing::new(url, title, posted_text))
    }
}

impl<B: BrowserSession + ?Sized> Iterator for ListingStream<'_, B> {
    type Item = Listing;

    fn next(&mut self) -> Option<Listing> {
        loop {
            if self.shutdown.is_some_and(Shutdown::is_requested) {
                return None;
            }
            let anchor = self.pending.next()?;
            match self.read_listing(anchor) {
                Ok(listing) => return Some(listing),
                Err(e) => warn!("Error reading listing: {}", e),
            }
        }
    }
}

/// Read every listing of a search page at once.
pub fn extract_listings<B: BrowserSession + ?Sized>(
    session: &mut B,
    search_url: &str,
) -> Result<Vec<Listing>, BrowserError> {
    Ok(ListingStream::open(session, search_url)?.collect())
}
