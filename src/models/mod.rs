// src/models/mod.rs

//! Domain models for the notifier.

mod config;
mod listing;
mod subscription;

// Re-export all public types
pub use config::{
    Config, CycleConfig, DatabaseConfig, LoggingConfig, SearchConfig, TelegramConfig,
};
pub use listing::{
    Listing, MAX_TITLE_LEN, Named, RawListing, RawSalary, TIMESTAMP_FORMAT, currency_symbol,
    normalize_published_at, render_salary,
};
pub use subscription::{NewSubscription, Recipient, RecipientId, Subscription, SubscriptionId};
