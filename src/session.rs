//! Network session: turns request metadata into a lazy, typed request handle.
//!
//! The socket work itself is behind the [`Transport`] trait. [`HttpTransport`]
//! is the `reqwest`-backed default; tests plug in their own implementation.
//! Whatever the transport, a prepared request resolves to a
//! `Result<Response<T>>`: transport failures, non-2xx statuses and decode
//! failures all come back as `Err`.

use crate::{metadata::RequestMetadata, task::ApiTask, Error, Response, Result};
use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use url::Url;

/// A fully resolved HTTP request, ready for a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Option<Duration>,
}

/// A raw HTTP response as returned by a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Performs the actual HTTP exchange.
///
/// Implementations report connectivity problems as [`Error::Network`] or
/// [`Error::Timeout`] and return every response they receive, whatever its
/// status; status checking and decoding happen in the session.
///
/// ```
/// use async_trait::async_trait;
/// use giphy_core::session::{Transport, TransportRequest, TransportResponse};
/// use http::{HeaderMap, StatusCode};
///
/// struct Canned(&'static str);
///
/// #[async_trait]
/// impl Transport for Canned {
///     async fn execute(&self, _request: TransportRequest) -> giphy_core::Result<TransportResponse> {
///         Ok(TransportResponse {
///             status: StatusCode::OK,
///             headers: HeaderMap::new(),
///             body: self.0.to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// The default transport, backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built (e.g. the TLS
    /// backend fails to initialise).
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

type ResponseFuture<T> = Pin<Box<dyn Future<Output = Result<Response<T>>> + Send + 'static>>;

/// Produces independent, typed request handles.
///
/// The session holds no per-request state; the transport it shares is only
/// read. Cloning is cheap.
#[derive(Clone)]
pub struct NetworkSession {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

impl NetworkSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            timeout: None,
            runtime: None,
        }
    }

    /// Sets a per-request transport timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pins spawned tasks to the given runtime instead of the caller's.
    pub fn with_runtime(mut self, runtime: Option<Handle>) -> Self {
        self.runtime = runtime;
        self
    }

    /// Prepares a request that decodes into `T`.
    ///
    /// Nothing is sent until the handle is started, either with
    /// [`RequestHandle::send`] or through an [`ApiTask`].
    pub fn prepare<T>(&self, base_url: &Url, metadata: RequestMetadata) -> RequestHandle<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = metadata.url(base_url);
        let transport = Arc::clone(&self.transport);
        let timeout = self.timeout;
        let method = metadata.method.clone();
        let path = metadata.path();
        let log_path = path.clone();

        let future = async move {
            let url = url?;

            tracing::debug!(
                method = %metadata.method,
                url = %redact_api_key(&url),
                "Executing HTTP request"
            );

            let request = TransportRequest {
                method: metadata.method.clone(),
                url,
                headers: metadata.headers,
                timeout,
            };

            let start_time = Instant::now();
            let raw = transport.execute(request).await.map_err(|e| {
                tracing::warn!(
                    error = %e,
                    method = %metadata.method,
                    path = %log_path,
                    "Request failed"
                );
                e
            })?;

            parse_response::<T>(raw, start_time.elapsed())
        };

        RequestHandle {
            method,
            path,
            future: Box::pin(future),
            runtime: self.runtime.clone(),
        }
    }
}

impl fmt::Debug for NetworkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkSession")
            .field("timeout", &self.timeout)
            .field("runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

/// Checks the status and decodes the body into `T`.
fn parse_response<T>(raw: TransportResponse, latency: Duration) -> Result<Response<T>>
where
    T: DeserializeOwned,
{
    let TransportResponse {
        status,
        headers,
        body,
    } = raw;

    tracing::info!(
        status = status.as_u16(),
        latency_ms = latency.as_millis(),
        "Received HTTP response"
    );

    if !status.is_success() {
        if status.is_client_error() {
            tracing::error!(
                status = status.as_u16(),
                response = %body,
                "Client error (4xx)"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                response = %body,
                "Server error (5xx)"
            );
        }

        return Err(Error::HttpError {
            status,
            raw_response: body,
            headers,
        });
    }

    match serde_json::from_str::<T>(&body) {
        Ok(data) => Ok(Response::new(data, body, status, headers, latency)),
        Err(e) => {
            tracing::error!(
                error = %e,
                raw_response = %body,
                "Failed to deserialize response"
            );

            Err(Error::DeserializationFailed {
                raw_response: body,
                serde_error: e.to_string(),
                status,
            })
        }
    }
}

fn redact_api_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "api_key" { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect();

    if !pairs.is_empty() {
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }
    redacted
}

/// One prepared, not-yet-started request.
///
/// Await it directly with [`send`](Self::send), or hand it to an
/// [`ApiTask`] with [`execute_async`](Self::execute_async) for callback
/// delivery. Either way it is consumed; handles are never reused.
pub struct RequestHandle<T> {
    method: Method,
    path: String,
    future: ResponseFuture<T>,
    runtime: Option<Handle>,
}

impl<T> RequestHandle<T>
where
    T: Send + 'static,
{
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Runs the request on the current task and returns its outcome.
    pub async fn send(self) -> Result<Response<T>> {
        self.future.await
    }

    /// Starts the request on a worker and delivers its outcome to `handler`.
    ///
    /// See [`ApiTask`] for the delivery guarantees.
    pub fn execute_async<F>(self, handler: F) -> ApiTask
    where
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        let task = ApiTask::new(self, handler);
        task.start();
        task
    }

    pub(crate) fn into_parts(self) -> (ResponseFuture<T>, Option<Handle>) {
        (self.future, self.runtime)
    }
}

impl<T> fmt::Debug for RequestHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
