//! Error types for Giphy API calls.
//!
//! Every failure a request can hit is represented here and is delivered through
//! the completion handler's error channel. Nothing in the dispatch path panics
//! past the worker boundary.

use http::{HeaderMap, StatusCode};

/// The main error type for Giphy API calls.
///
/// # Examples
///
/// ```no_run
/// use giphy_core::{completion_channel, Error, GiphyClient, MultipleGifsResponse};
/// use giphy_core::{MediaType, SearchOptions};
///
/// # async fn example() -> Result<(), Error> {
/// let client = GiphyClient::new("my-api-key")?;
/// let (handler, rx) = completion_channel::<MultipleGifsResponse>();
/// client.search(MediaType::Gif, "cats", SearchOptions::default(), handler);
///
/// match rx.await.map_err(|_| Error::Cancelled)? {
///     Ok(response) => println!("{} results", response.data.data.len()),
///     Err(Error::HttpError { status, raw_response, .. }) => {
///         eprintln!("HTTP error {}: {}", status, raw_response);
///     }
///     Err(Error::DeserializationFailed { raw_response, serde_error, .. }) => {
///         eprintln!("Unexpected payload: {} ({})", raw_response, serde_error);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A network-level error occurred (connection refused, DNS, TLS, ...).
    ///
    /// A worker that faults before producing an outcome is reported here too.
    #[error("Network error: {0}")]
    Network(String),

    /// The transport gave up waiting for the server.
    #[error("Request timed out")]
    Timeout,

    /// The server returned a non-2xx HTTP status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The response body could not be decoded into the requested shape.
    ///
    /// Both the raw body and the serde message are kept for debugging.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The task was cancelled before the request completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Invalid configuration was provided, or the task could not be scheduled.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided or produced.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification of an [`Error`].
///
/// This is what the task state machine records for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connectivity failures and timeouts.
    Transport,
    /// Non-2xx responses.
    HttpStatus,
    /// Malformed or unexpected JSON.
    Decode,
    /// The task was cancelled.
    Cancelled,
    /// Local misconfiguration.
    Configuration,
}

impl Error {
    /// Returns the kind of this error.
    ///
    /// ```
    /// use giphy_core::{Error, ErrorKind};
    ///
    /// assert_eq!(Error::Timeout.kind(), ErrorKind::Transport);
    /// assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) | Error::Timeout => ErrorKind::Transport,
            Error::HttpError { .. } => ErrorKind::HttpStatus,
            Error::DeserializationFailed { .. } => ErrorKind::Decode,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::ConfigurationError(_) | Error::InvalidUrl(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this error came from cancelling the task.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Network(err.to_string())
        }
    }
}

/// A specialized `Result` type for Giphy API calls.
pub type Result<T> = std::result::Result<T, Error>;
