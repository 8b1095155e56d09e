//! External collaborators of the ingestion cycle.
//!
//! - Vacancy search (`SearchPort`, `HhClient`)
//! - Message delivery (`NotificationPort`, `TelegramNotifier`)
//! - City to area id lookup (`resolve_area`)

pub mod areas;
pub mod notify;
pub mod search;

pub use areas::resolve_area;
pub use notify::{DeliveryOutcome, NotificationPort, TelegramNotifier, classify_failure};
pub use search::{HhClient, SearchPage, SearchPort};
