//! Bias Scan
//!
//! Finds intervals of trials in which a subject, regardless of the stimulus,
//! keeps answering with one target action, and summarises how many trials
//! fall into such intervals per cohort and window length.

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod report;
pub mod roster;
pub mod sweep;

pub use config::SweepConfig;
pub use error::ScanError;
pub use loader::{CsvTrialSource, LoadError, TrialSource};
pub use roster::{Cohort, Roster, SubjectId};
pub use sweep::{SweepReport, SweepSettings, build_pool, run_sweep};
