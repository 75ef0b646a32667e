use thiserror::Error;

/// Rejected before any scan begins
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidWindowSpec {
    #[error("window length tau must be at least 1")]
    ZeroTau,

    #[error("target action `{action}` is not in the response alphabet [{alphabet}]")]
    UnknownTarget { action: String, alphabet: String },
}
