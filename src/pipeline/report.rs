//! Counters describing one ingestion cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-subscription counters, summed into the cycle report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleTally {
    /// Items returned by the search source
    pub candidates: usize,
    /// Listings stored for the first time
    pub inserted: usize,
    /// Items skipped because their external id was already stored
    pub already_known: usize,
    /// Items abandoned on an error; retried next cycle when not stored
    pub listing_failures: usize,
    pub delivered: usize,
    pub transient_failures: usize,
    pub deactivated_recipients: usize,
    /// Stored listings not sent because the owner is missing or inactive
    pub skipped_recipients: usize,
}

impl CycleTally {
    fn absorb(&mut self, other: &CycleTally) {
        self.candidates += other.candidates;
        self.inserted += other.inserted;
        self.already_known += other.already_known;
        self.listing_failures += other.listing_failures;
        self.delivered += other.delivered;
        self.transient_failures += other.transient_failures;
        self.deactivated_recipients += other.deactivated_recipients;
        self.skipped_recipients += other.skipped_recipients;
    }
}

/// Outcome of one full pass over the active subscriptions.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Active subscriptions at the start of the cycle
    pub subscriptions: usize,
    /// Subscriptions skipped on a subscription-level error
    pub failed_subscriptions: usize,
    #[serde(flatten)]
    pub totals: CycleTally,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            subscriptions: 0,
            failed_subscriptions: 0,
            totals: CycleTally::default(),
        }
    }

    pub fn absorb(&mut self, tally: &CycleTally) {
        self.totals.absorb(tally);
    }

    /// Whether anything went wrong that a later cycle has to make up for.
    pub fn has_failures(&self) -> bool {
        self.failed_subscriptions > 0
            || self.totals.listing_failures > 0
            || self.totals.transient_failures > 0
    }

    /// One-line summary for the log.
    pub fn summary(&self) -> String {
        format!(
            "{} subscriptions ({} failed), {} candidates, {} new, {} known, {} delivered, \
             {} transient failures, {} listing failures, {} recipients deactivated",
            self.subscriptions,
            self.failed_subscriptions,
            self.totals.candidates,
            self.totals.inserted,
            self.totals.already_known,
            self.totals.delivered,
            self.totals.transient_failures,
            self.totals.listing_failures,
            self.totals.deactivated_recipients,
        )
    }
}
