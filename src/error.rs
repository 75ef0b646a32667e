use crate::loader::LoadError;
use crate::roster::{RosterError, SubjectId};
use biasscan_core::InvalidWindowSpec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid window spec: {0}")]
    InvalidWindowSpec(#[from] InvalidWindowSpec),

    #[error("failed to load subject {subject} of cohort `{cohort}`: {source}")]
    SequenceLoadFailure {
        cohort: String,
        subject: SubjectId,
        #[source]
        source: LoadError,
    },

    #[error("roster error: {0}")]
    Roster(#[from] RosterError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
