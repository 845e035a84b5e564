//! Response wrapper that preserves both decoded data and raw response details.
//!
//! The [`Response`] type wraps the decoded Giphy payload along with metadata
//! about the HTTP exchange, so handlers can look at timing, headers, and the
//! raw body without a second request.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A successful, decoded HTTP response.
///
/// # Type Parameters
///
/// * `T` - The decoded response shape, e.g. [`crate::GifResponse`]
///
/// # Examples
///
/// ```no_run
/// use giphy_core::{completion_channel, GifResponse, GiphyClient};
///
/// # async fn example() -> Result<(), giphy_core::Error> {
/// let client = GiphyClient::new("my-api-key")?;
/// let (handler, rx) = completion_channel::<GifResponse>();
/// client.gif_by_id("feqkVgjJpYtjy", handler);
///
/// if let Ok(Ok(response)) = rx.await {
///     println!("Status: {}", response.status);
///     println!("Request took {:?}", response.latency);
///     if let Some(gif) = &response.data.data {
///         println!("Title: {}", gif.title);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The Giphy payload, e.g. a [`crate::MultipleGifsResponse`].
    pub data: T,

    /// Body text exactly as Giphy sent it, kept for logging and debugging.
    pub raw_body: String,

    /// Always a 2xx; anything else is delivered as [`crate::Error::HttpError`].
    pub status: StatusCode,

    /// Headers from Giphy, including any rate-limit headers.
    pub headers: HeaderMap,

    /// Time from sending the request until the body was received.
    pub latency: Duration,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
        }
    }

    /// Converts the payload into another shape. Status, headers, body and
    /// latency carry over untouched, which is how random results reach a
    /// single-GIF handler.
    ///
    /// ```
    /// # use giphy_core::{GifResponse, Meta, Response};
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let body = r#"{"data":[],"meta":{"status":200,"msg":"OK","response_id":"r1"}}"#;
    /// let payload: GifResponse = serde_json::from_str(body).unwrap();
    /// let response = Response::new(
    ///     payload,
    ///     body.to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(80),
    /// );
    ///
    /// let meta: Response<Meta> = response.map(|gif| gif.meta);
    /// assert_eq!(meta.data.response_id, "r1");
    /// assert_eq!(meta.latency, Duration::from_millis(80));
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
        }
    }

    /// Looks up a header Giphy returned. `None` when it is absent or not
    /// valid UTF-8.
    ///
    /// ```
    /// # use giphy_core::Response;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("x-ratelimit-remaining", HeaderValue::from_static("41"));
    ///
    /// let response = Response::new((), String::new(), StatusCode::OK, headers, Duration::ZERO);
    /// assert_eq!(response.header("X-RateLimit-Remaining"), Some("41"));
    /// assert_eq!(response.header("retry-after"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

impl<T> AsRef<T> for Response<T> {
    fn as_ref(&self) -> &T {
        &self.data
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
