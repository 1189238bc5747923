//! Error taxonomy for fetching, extraction, storage and feed serving.
//!
//! Failures are split by who has to care about them:
//!
//! | Error | Raised by | Handling |
//! |-------|-----------|----------|
//! | [`TransportError`] | page fetcher | logged; refresh yields no items |
//! | [`ExtractionError`] | extraction pipeline | logged; refresh yields no items |
//! | [`StoreError`] | document store | propagated |
//! | [`FeedError`] | cache and service layer | surfaced to the caller |
//!
//! Missing titles, links or dates on individual articles are not errors at
//! all; they are resolved by the fallbacks in [`crate::extract::fields`].

use thiserror::Error;

/// Fetching the source page failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    Status(u16),
    #[error("could not read response body: {0}")]
    Body(String),
}

/// A pipeline run could not produce a list of candidate elements.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

/// The document store failed to read or write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored document is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid document id `{0}`")]
    InvalidId(String),
}

/// Caller-facing failures of the feed service.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed source `{0}` not found")]
    NotFound(String),
    #[error("could not generate feed content for `{0}`: no articles extracted")]
    EmptyResult(String),
    #[error("could not generate feed content: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to render feed: {0}")]
    Render(#[from] std::io::Error),
}

impl From<ExtractionError> for FeedError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Transport(t) => FeedError::Transport(t),
            ExtractionError::InvalidSelector(s) => FeedError::InvalidSelector(s),
        }
    }
}

impl FeedError {
    /// HTTP-style status code for this failure.
    ///
    /// Empty results and fetch failures share 500, matching the
    /// "could not generate feed content" response of the service.
    pub fn status_code(&self) -> u16 {
        match self {
            FeedError::NotFound(_) => 404,
            FeedError::InvalidSelector(_) => 422,
            FeedError::EmptyResult(_)
            | FeedError::Transport(_)
            | FeedError::Store(_)
            | FeedError::Render(_) => 500,
        }
    }

    /// `true` for the "missing resource" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::NotFound(_))
    }
}
