// ============================================================================
// Error Handling
// ============================================================================

/// Failures that end a feed request. Each one is rendered into the
/// `{"error": ...}` body by the endpoint layer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Network failure or a non-2xx status from the feed.
    #[error("Failed to fetch data: {0}")]
    Transport(String),

    /// The body was not well-formed XML.
    #[error("XML Parsing error: {0}")]
    Parse(String),

    /// The feed answered with its own `<Error>` document.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// A single `<prediction>` element that could not be turned into a record.
/// Never leaves the normalizer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementError {
    #[error("epochTime {0} is outside the representable date range")]
    EpochOutOfRange(i64),
}

pub type Result<T> = std::result::Result<T, FeedError>;
