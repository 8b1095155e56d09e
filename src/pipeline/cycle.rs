// src/pipeline/cycle.rs

//! The ingestion cycle: search, dedupe, notify.
//!
//! One call to [`IngestionCycle::run`] walks every active subscription once.
//! Failures are contained at two levels:
//!
//! - a listing that cannot be stored or delivered is logged and skipped
//! - a subscription whose criteria are malformed or whose search times out
//!   is logged and the cycle moves on
//!
//! Only failing to read the subscription set itself aborts the cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{CycleConfig, Listing, RawListing, Subscription};
use crate::pipeline::render::render_notification;
use crate::pipeline::report::{CycleReport, CycleTally};
use crate::services::{DeliveryOutcome, NotificationPort, SearchPort};
use crate::storage::{
    ListingStore, PersistOutcome, RecipientDirectory, SqliteStore, SubscriptionRegistry,
};

/// Collaborators the cycle talks to.
#[derive(Clone)]
pub struct CyclePorts {
    pub subscriptions: Arc<dyn SubscriptionRegistry>,
    pub recipients: Arc<dyn RecipientDirectory>,
    pub listings: Arc<dyn ListingStore>,
    pub search: Arc<dyn SearchPort>,
    pub notifier: Arc<dyn NotificationPort>,
}

impl CyclePorts {
    /// Back all three storage ports with one SQLite store.
    pub fn with_store(
        store: SqliteStore,
        search: Arc<dyn SearchPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            subscriptions: store.clone(),
            recipients: store.clone(),
            listings: store,
            search,
            notifier,
        }
    }
}

/// Runs one pass over the active subscriptions per call.
pub struct IngestionCycle {
    ports: CyclePorts,
    policy: CycleConfig,
    page_size: usize,
}

impl IngestionCycle {
    pub fn new(ports: CyclePorts, policy: CycleConfig, page_size: usize) -> Self {
        Self {
            ports,
            policy,
            page_size: page_size.max(1),
        }
    }

    /// Process every active subscription once.
    ///
    /// `now` stamps the report and stands in for unparseable publication
    /// times.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let subscriptions = self.ports.subscriptions.list_active().await?;
        let mut report = CycleReport::new(now);
        report.subscriptions = subscriptions.len();

        log::info!("Checking {} active subscriptions", subscriptions.len());

        let concurrency = self.policy.max_concurrent.max(1);
        let mut results = stream::iter(&subscriptions)
            .map(|subscription| async move {
                let result = self.process_subscription(subscription, now).await;
                (subscription, result)
            })
            .buffer_unordered(concurrency);

        while let Some((subscription, result)) = results.next().await {
            match result {
                Ok(tally) => report.absorb(&tally),
                Err(e) => {
                    report.failed_subscriptions += 1;
                    log::error!(
                        "Skipping subscription {} (recipient {}, query {:?}): {}",
                        subscription.id,
                        subscription.recipient_id,
                        subscription.keywords,
                        e
                    );
                }
            }
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    async fn process_subscription(
        &self,
        subscription: &Subscription,
        now: DateTime<Utc>,
    ) -> Result<CycleTally> {
        subscription.validate()?;

        let page = tokio::time::timeout(
            self.policy.search_timeout(),
            self.ports.search.search(subscription, self.page_size, 0),
        )
        .await
        .map_err(|_| AppError::SearchTimeout(self.policy.search_timeout_secs))?;

        let cap = self.policy.max_new_per_subscription;
        let mut tally = CycleTally {
            candidates: page.items.len(),
            ..CycleTally::default()
        };

        for raw in &page.items {
            if tally.inserted >= cap {
                log::info!(
                    "Subscription {} reached {} new listings, deferring the rest",
                    subscription.id,
                    cap
                );
                break;
            }

            if let Err(e) = self.process_listing(subscription, raw, now, &mut tally).await {
                tally.listing_failures += 1;
                log::error!(
                    "Failed to process listing {} for subscription {}: {}",
                    raw.external_id().as_deref().unwrap_or("<no id>"),
                    subscription.id,
                    e
                );
            }
        }

        Ok(tally)
    }

    async fn process_listing(
        &self,
        subscription: &Subscription,
        raw: &RawListing,
        now: DateTime<Utc>,
        tally: &mut CycleTally,
    ) -> Result<()> {
        let listing = match self.ports.listings.persist_if_new(raw, now).await? {
            PersistOutcome::AlreadyExists => {
                tally.already_known += 1;
                return Ok(());
            }
            PersistOutcome::Inserted(listing) => listing,
        };
        tally.inserted += 1;

        let result = self.notify(subscription, &listing, raw, tally).await;

        let delay = self.policy.send_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        result
    }

    async fn notify(
        &self,
        subscription: &Subscription,
        listing: &Listing,
        raw: &RawListing,
        tally: &mut CycleTally,
    ) -> Result<()> {
        let recipient = match self.ports.recipients.get(subscription.recipient_id).await? {
            Some(recipient) if recipient.active => recipient,
            Some(_) => {
                log::debug!(
                    "Recipient {} is inactive, not sending listing {}",
                    subscription.recipient_id,
                    listing.external_id
                );
                tally.skipped_recipients += 1;
                return Ok(());
            }
            None => {
                log::warn!(
                    "Recipient {} of subscription {} not found",
                    subscription.recipient_id,
                    subscription.id
                );
                tally.skipped_recipients += 1;
                return Ok(());
            }
        };

        let message = render_notification(listing, raw);
        match self
            .ports
            .notifier
            .deliver(&recipient.delivery_address, &message)
            .await
        {
            DeliveryOutcome::Delivered => {
                tally.delivered += 1;
                log::info!(
                    "Sent listing {} to recipient {}",
                    listing.external_id,
                    recipient.id
                );
            }
            DeliveryOutcome::PermanentlyUndeliverable { reason } => {
                log::warn!(
                    "Recipient {} is unreachable ({}), deactivating",
                    recipient.id,
                    reason
                );
                self.ports.recipients.set_inactive(recipient.id).await?;
                tally.deactivated_recipients += 1;
            }
            DeliveryOutcome::TransientFailure { reason } => {
                tally.transient_failures += 1;
                log::warn!(
                    "Could not send listing {} to recipient {}: {}",
                    listing.external_id,
                    recipient.id,
                    reason
                );
            }
        }

        Ok(())
    }
}
