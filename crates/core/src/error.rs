use thiserror::Error;

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for evaluation operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A corpus root, manifest or ground-truth file could not be loaded.
    /// Always fatal for the whole run.
    #[error("Corpus load error in {path}: {message}")]
    CorpusLoad { path: String, message: String },

    /// A query id requested for single-query evaluation does not exist
    #[error("Query not found: {0}")]
    QueryNotFound(String),

    /// Errors raised by an evaluation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A pipeline call exceeded its deadline
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Evidence manifest errors (missing artifact or required field)
    #[error("Evidence manifest error: {0}")]
    Evidence(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a corpus load error
    pub fn corpus(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorpusLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a pipeline error
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Creates a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates an evidence manifest error
    pub fn evidence(msg: impl Into<String>) -> Self {
        Self::Evidence(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_error_message_names_path() {
        let err = Error::corpus("/tmp/corpus/repos/a", "missing manifest.json");
        assert_eq!(
            err.to_string(),
            "Corpus load error in /tmp/corpus/repos/a: missing manifest.json"
        );
    }

    #[test]
    fn test_timeout_error_message() {
        let err = Error::timeout("retrieve", 250);
        assert_eq!(err.to_string(), "retrieve timed out after 250ms");
    }

    #[test]
    fn test_result_ext_wraps_source() {
        let raw: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = raw.context("reading ground truth").unwrap_err();
        assert!(err.to_string().starts_with("reading ground truth: "));
    }
}
