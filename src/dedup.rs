use std::collections::HashSet;

use crate::age;
use crate::models::{Freshness, Listing};

/// Ids of listings already notified during this run.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DedupFilter {
    threshold_minutes: u64,
}

impl DedupFilter {
    pub fn new(threshold_minutes: u64) -> Self {
        Self { threshold_minutes }
    }

    pub fn freshness(&self, listing: &Listing) -> Freshness {
        age::classify(&listing.posted_text, self.threshold_minutes)
    }

    /// Whether a notification should go out for `listing`: fresh and not yet seen.
    pub fn evaluate(&self, listing: &Listing, seen: &SeenSet) -> bool {
        self.freshness(listing) == Freshness::Fresh && !seen.contains(&listing.id)
    }
}
