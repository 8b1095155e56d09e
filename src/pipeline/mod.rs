//! Pipeline entry points for the ingestion cycle.
//!
//! - `IngestionCycle`: search, dedupe and notify for every active subscription
//! - `build_cycle` / `run_cycle`: production wiring and one logged run

pub mod cycle;
pub mod render;
pub mod report;
pub mod run;

pub use cycle::{CyclePorts, IngestionCycle};
pub use render::render_notification;
pub use report::{CycleReport, CycleTally};
pub use run::{build_cycle, run_cycle};
