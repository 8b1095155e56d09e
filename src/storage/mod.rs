//! Durable state behind the ingestion cycle.
//!
//! Three relations back the cycle:
//!
//! ```text
//! recipients     (id, delivery_address, active)
//! subscriptions  (id, recipient_id, keywords, location_filter,
//!                 experience_filter, min_salary, active)
//! listings       (id, external_id UNIQUE, title, organization,
//!                 salary_display, url, published_at)
//! ```
//!
//! The unique constraint on `listings.external_id` is the only schema rule the
//! cycle depends on: it makes `persist_if_new` safe when two cycles overlap.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Listing, RawListing, Recipient, RecipientId, Subscription};

// Re-export for convenience
pub use sqlite::SqliteStore;

/// Outcome of an insert-if-absent attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The listing was new and is now committed
    Inserted(Listing),
    /// A row with the same external id already exists; nothing was written
    AlreadyExists,
}

impl PersistOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, PersistOutcome::Inserted(_))
    }
}

/// Append-only store of every listing seen so far.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Normalise `raw` and insert it unless its external id is already stored.
    ///
    /// The insert is a single atomic statement guarded by the unique
    /// constraint, so concurrent callers can never both get `Inserted`.
    /// `now` is the fallback publication time.
    async fn persist_if_new(&self, raw: &RawListing, now: DateTime<Utc>)
    -> Result<PersistOutcome>;
}

/// Recipients addressed by the cycle.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn get(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Mark a recipient permanently unreachable. Idempotent.
    async fn set_inactive(&self, id: RecipientId) -> Result<()>;
}

/// Standing search criteria.
#[async_trait]
pub trait SubscriptionRegistry: Send + Sync {
    /// Every subscription with `active = true`, in id order.
    async fn list_active(&self) -> Result<Vec<Subscription>>;
}
