//! SQLite storage implementation.
//!
//! One pool backs all three relations. Every call borrows its own pooled
//! connection, so concurrent subscription tasks never share a session.
//!
//! ## Storage Layout
//!
//! ```text
//! {database}
//! ├── recipients      delivery_address UNIQUE
//! ├── subscriptions   -> recipients.id
//! └── listings        external_id UNIQUE
//! ```

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::{AppError, Result};
use crate::models::{
    DatabaseConfig, Listing, NewSubscription, RawListing, Recipient, RecipientId, Subscription,
    TIMESTAMP_FORMAT,
};
use crate::storage::{ListingStore, PersistOutcome, RecipientDirectory, SubscriptionRegistry};

/// SQLite-backed store for listings, recipients and subscriptions.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Row counts per relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub recipients: i64,
    pub active_recipients: i64,
    pub subscriptions: i64,
    pub active_subscriptions: i64,
    pub listings: i64,
}

impl SqliteStore {
    /// Open (creating if missing) the database described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Create an in-memory store (for testing).
    ///
    /// Limited to a single connection that never expires, since every SQLite
    /// memory connection is a separate database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Create the schema if it does not exist yet.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recipients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                delivery_address TEXT NOT NULL UNIQUE,
                active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipient_id INTEGER NOT NULL REFERENCES recipients(id),
                keywords TEXT NOT NULL,
                location_filter TEXT,
                experience_filter TEXT,
                min_salary INTEGER,
                active INTEGER NOT NULL DEFAULT 1
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                organization TEXT NOT NULL,
                salary_display TEXT NOT NULL,
                url TEXT NOT NULL,
                published_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_subscriptions_active ON subscriptions(active)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register a delivery address, reactivating it if it was deactivated.
    pub async fn register_recipient(&self, delivery_address: &str) -> Result<Recipient> {
        let address = delivery_address.trim();
        if address.is_empty() {
            return Err(AppError::validation("delivery address is empty"));
        }

        let recipient = sqlx::query_as::<_, Recipient>(
            r#"
            INSERT INTO recipients (delivery_address, active) VALUES (?, 1)
            ON CONFLICT(delivery_address) DO UPDATE SET active = 1
            RETURNING id, delivery_address, active
            "#,
        )
        .bind(address)
        .fetch_one(&self.pool)
        .await?;

        Ok(recipient)
    }

    /// Add an active subscription owned by `recipient_id`.
    pub async fn add_subscription(
        &self,
        recipient_id: RecipientId,
        new: &NewSubscription,
    ) -> Result<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions
                (recipient_id, keywords, location_filter, experience_filter, min_salary, active)
            VALUES (?, ?, ?, ?, ?, 1)
            RETURNING id, recipient_id, keywords, location_filter, experience_filter,
                      min_salary, active
            "#,
        )
        .bind(recipient_id)
        .bind(new.keywords.trim())
        .bind(new.location_filter.as_deref())
        .bind(new.experience_filter.as_deref())
        .bind(new.min_salary)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// Look up a stored listing by its external id.
    pub async fn find_listing(&self, external_id: &str) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT external_id, title, organization, salary_display, url, published_at
            FROM listings WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ListingRow::into_listing).transpose()
    }

    /// Row counts for status output.
    pub async fn counts(&self) -> Result<StoreCounts> {
        let count = |sql: &'static str| {
            sqlx::query_scalar::<sqlx::Sqlite, i64>(sql).fetch_one(&self.pool)
        };

        Ok(StoreCounts {
            recipients: count("SELECT COUNT(*) FROM recipients").await?,
            active_recipients: count("SELECT COUNT(*) FROM recipients WHERE active = 1").await?,
            subscriptions: count("SELECT COUNT(*) FROM subscriptions").await?,
            active_subscriptions: count("SELECT COUNT(*) FROM subscriptions WHERE active = 1")
                .await?,
            listings: count("SELECT COUNT(*) FROM listings").await?,
        })
    }
}

#[derive(Debug, FromRow)]
struct ListingRow {
    external_id: String,
    title: String,
    organization: String,
    salary_display: String,
    url: String,
    published_at: String,
}

impl ListingRow {
    fn into_listing(self) -> Result<Listing> {
        let published_at = NaiveDateTime::parse_from_str(&self.published_at, TIMESTAMP_FORMAT)
            .map_err(|e| {
                AppError::validation(format!(
                    "stored published_at {:?} is invalid: {}",
                    self.published_at, e
                ))
            })?;

        Ok(Listing {
            external_id: self.external_id,
            title: self.title,
            organization: self.organization,
            salary_display: self.salary_display,
            url: self.url,
            published_at,
        })
    }
}

#[async_trait]
impl ListingStore for SqliteStore {
    async fn persist_if_new(
        &self,
        raw: &RawListing,
        now: DateTime<Utc>,
    ) -> Result<PersistOutcome> {
        let listing = Listing::from_raw(raw, now)?;

        // Dropping `tx` on an early return rolls it back.
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO listings
                (external_id, title, organization, salary_display, url, published_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(&listing.external_id)
        .bind(&listing.title)
        .bind(&listing.organization)
        .bind(&listing.salary_display)
        .bind(&listing.url)
        .bind(listing.published_at_text())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            log::debug!("Listing {} already exists", listing.external_id);
            return Ok(PersistOutcome::AlreadyExists);
        }

        tx.commit().await?;
        log::info!("Saved new listing {}: {}", listing.external_id, listing.title);
        Ok(PersistOutcome::Inserted(listing))
    }
}

#[async_trait]
impl RecipientDirectory for SqliteStore {
    async fn get(&self, id: RecipientId) -> Result<Option<Recipient>> {
        let recipient = sqlx::query_as::<_, Recipient>(
            "SELECT id, delivery_address, active FROM recipients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(recipient)
    }

    async fn set_inactive(&self, id: RecipientId) -> Result<()> {
        sqlx::query("UPDATE recipients SET active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRegistry for SqliteStore {
    async fn list_active(&self) -> Result<Vec<Subscription>> {
        let subscriptions = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, recipient_id, keywords, location_filter, experience_filter,
                   min_salary, active
            FROM subscriptions
            WHERE active = 1
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscriptions)
    }
}
