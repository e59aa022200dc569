//! Error types shared by the normalizer, the projector and the HTTP clients.

use thiserror::Error;

/// A UI selection that cannot be turned into a request. No request is sent when this is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no ticker selected")]
    NoTickers,

    #[error("ticker symbols must be non-empty")]
    EmptyTicker,

    #[error("ticker {0} selected more than once")]
    DuplicateTicker(String),

    #[error("too many tickers selected: {selected} (maximum is {max})")]
    TooManyTickers { selected: usize, max: usize },

    #[error("unknown model type: {0}")]
    UnknownModelType(String),

    #[error("unknown prediction horizon: {0}")]
    UnknownHorizon(String),

    #[error("invalid quarter {0:?}, expected YYYY-Qn")]
    InvalidQuarter(String),

    #[error("quarter range needs both a start and an end quarter")]
    IncompleteQuarterRange,

    #[error("quarter range start {start} is after end {end}")]
    InvertedQuarterRange { start: String, end: String },

    #[error("sequence length must be 1..=12 (got {0})")]
    SequenceOutOfRange(u32),

    #[error("threshold must be 0.1..=1.0 or 10..=100 percent (got {0})")]
    ThresholdOutOfRange(String),
}

/// Failure of a single call to an external service.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Connection, DNS, TLS or body read failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// Non-200 response. The body is never parsed.
    #[error("API request failed with status code: {status}")]
    RequestFailed { status: u16 },

    /// 200 response whose body is not JSON.
    #[error("response is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
