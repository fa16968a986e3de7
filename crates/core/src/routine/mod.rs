//! The posting routine: one prioritized pass per invocation.
//!
//! The runner has no internal scheduler; an external trigger (cron, HTTP)
//! invokes one pass at a time. User-dropped files post first, then freshly
//! fetched content, then previously downloaded files that were never posted.

mod config;
mod runner;
mod types;

pub use config::{DelayRange, RoutineConfig};
pub use runner::RoutineRunner;
pub use types::{RoutineError, RoutineReport, RoutineStatus};
