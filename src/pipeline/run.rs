// src/pipeline/run.rs

//! Wiring a configured cycle from [`Config`].

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::cycle::{CyclePorts, IngestionCycle};
use crate::pipeline::report::CycleReport;
use crate::services::{HhClient, TelegramNotifier};
use crate::storage::SqliteStore;

/// Build the production cycle: SQLite storage, hh.ru search, Telegram delivery.
pub async fn build_cycle(config: &Config) -> Result<IngestionCycle> {
    let store = SqliteStore::connect(&config.database).await?;
    let search = Arc::new(HhClient::new(&config.search)?);
    let notifier = Arc::new(TelegramNotifier::new(&config.telegram)?);

    let ports = CyclePorts::with_store(store, search, notifier);
    Ok(IngestionCycle::new(
        ports,
        config.cycle.clone(),
        config.search.per_page,
    ))
}

/// Run a single cycle and log its summary.
pub async fn run_cycle(cycle: &IngestionCycle) -> Result<CycleReport> {
    log::info!("Starting vacancy check");

    let report = cycle.run(Utc::now()).await?;
    let elapsed = report.finished_at - report.started_at;

    if report.has_failures() {
        log::warn!(
            "Vacancy check finished in {}s with failures: {}",
            elapsed.num_seconds(),
            report.summary()
        );
    } else {
        log::info!(
            "Vacancy check finished in {}s: {}",
            elapsed.num_seconds(),
            report.summary()
        );
    }

    Ok(report)
}
