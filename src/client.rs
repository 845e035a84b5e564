//! The Giphy client and its builder.
//!
//! [`GiphyClient`] exposes one method per endpoint. Each method builds the
//! endpoint's parameters, prepares a typed request through the
//! [`NetworkSession`], and dispatches it as an [`ApiTask`] that reports back
//! through the supplied completion handler.

use crate::{
    adapter::adapt,
    metadata::{Endpoint, MediaType, RequestMetadata},
    params::{join_ids, QueryParams, RandomOptions, SearchOptions, TranslateOptions, TrendingOptions},
    session::{HttpTransport, NetworkSession, RequestHandle, Transport},
    task::ApiTask,
    ApiResponse, Error, GifResponse, MultipleGifsResponse, RandomGifResponse, Response, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

/// Base URL of the public Giphy v1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.giphy.com/v1";

/// A client for the Giphy search API.
///
/// Cheap to clone; clones share configuration and the transport's connection
/// pool. Every endpoint method returns immediately with an [`ApiTask`]; the
/// handler is called later, exactly once.
///
/// # Examples
///
/// ```no_run
/// use giphy_core::{GiphyClient, MediaType, SearchOptions};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), giphy_core::Error> {
/// let client = GiphyClient::builder()
///     .api_key("my-api-key")
///     .timeout(Duration::from_secs(10))
///     .build()?;
///
/// let task = client.search(
///     MediaType::Gif,
///     "cats",
///     SearchOptions::default().limit(5).rating("g"),
///     |result| match result {
///         Ok(response) => {
///             for gif in &response.data.data {
///                 println!("{} {}", gif.id, gif.title);
///             }
///         }
///         Err(e) => eprintln!("search failed: {}", e),
///     },
/// );
///
/// task.finished().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GiphyClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api_key: String,
    base_url: Url,
    default_headers: HeaderMap,
    session: NetworkSession,
}

impl GiphyClient {
    /// Creates a client with default settings for the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the default HTTP transport cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::builder().api_key(api_key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn session(&self) -> &NetworkSession {
        &self.inner.session
    }

    /// Searches GIFs or stickers for `query`.
    ///
    /// Sends `GET /{type}/search` with `q` and any supplied options.
    pub fn search<F>(
        &self,
        media: MediaType,
        query: impl Into<String>,
        options: SearchOptions,
        handler: F,
    ) -> ApiTask
    where
        F: FnOnce(Result<Response<MultipleGifsResponse>>) + Send + 'static,
    {
        let mut params = self.params();
        params.insert("q", query);
        options.apply(&mut params);

        self.prepare::<MultipleGifsResponse>(&Endpoint::Search(media), params)
            .execute_async(handler)
    }

    /// Fetches what is trending right now.
    ///
    /// Sends `GET /{type}/trending`.
    pub fn trending<F>(&self, media: MediaType, options: TrendingOptions, handler: F) -> ApiTask
    where
        F: FnOnce(Result<Response<MultipleGifsResponse>>) + Send + 'static,
    {
        let mut params = self.params();
        options.apply(&mut params);

        self.prepare::<MultipleGifsResponse>(&Endpoint::Trending(media), params)
            .execute_async(handler)
    }

    /// Translates a term into a single GIF or sticker.
    ///
    /// Sends `GET /{type}/translate` with `s`.
    pub fn translate<F>(
        &self,
        media: MediaType,
        term: impl Into<String>,
        options: TranslateOptions,
        handler: F,
    ) -> ApiTask
    where
        F: FnOnce(Result<Response<GifResponse>>) + Send + 'static,
    {
        let mut params = self.params();
        params.insert("s", term);
        options.apply(&mut params);

        self.prepare::<GifResponse>(&Endpoint::Translate(media), params)
            .execute_async(handler)
    }

    /// Picks a random GIF or sticker for `tag`.
    ///
    /// Sends `GET /{type}/random` with `tag`. The endpoint answers with a
    /// [`RandomGifResponse`], which is converted to a [`GifResponse`] before
    /// `handler` sees it.
    pub fn random<F>(
        &self,
        media: MediaType,
        tag: impl Into<String>,
        options: RandomOptions,
        handler: F,
    ) -> ApiTask
    where
        F: FnOnce(Result<Response<GifResponse>>) + Send + 'static,
    {
        let mut params = self.params();
        params.insert("tag", tag);
        options.apply(&mut params);

        self.prepare::<RandomGifResponse>(&Endpoint::Random(media), params)
            .execute_async(adapt::<RandomGifResponse, GifResponse, _>(handler))
    }

    /// Looks up a single GIF by id.
    ///
    /// Sends `GET /gifs/{id}`. The id is percent-encoded as a single path
    /// segment; an empty id, `.` or `..` fails with
    /// [`Error::ConfigurationError`] before anything is sent.
    pub fn gif_by_id<F>(&self, id: impl Into<String>, handler: F) -> ApiTask
    where
        F: FnOnce(Result<Response<GifResponse>>) + Send + 'static,
    {
        let params = self.params();

        self.prepare::<GifResponse>(&Endpoint::GifById(id.into()), params)
            .execute_async(handler)
    }

    /// Looks up several GIFs at once.
    ///
    /// Sends `GET /gifs` with the ids comma-joined in the given order.
    pub fn gif_by_ids<S, F>(&self, ids: &[S], handler: F) -> ApiTask
    where
        S: AsRef<str>,
        F: FnOnce(Result<Response<MultipleGifsResponse>>) + Send + 'static,
    {
        let mut params = self.params();
        params.insert("ids", join_ids(ids));

        self.prepare::<MultipleGifsResponse>(&Endpoint::GifsByIds, params)
            .execute_async(handler)
    }

    /// Prepares, but does not start, a request for `endpoint`.
    ///
    /// Useful for awaiting a request inline with [`RequestHandle::send`].
    pub fn prepare<T>(&self, endpoint: &Endpoint, params: QueryParams) -> RequestHandle<T>
    where
        T: ApiResponse,
    {
        let mut metadata = RequestMetadata::for_endpoint(endpoint, params);
        metadata.headers = self.inner.default_headers.clone();

        tracing::debug!(
            endpoint = endpoint.name(),
            path = %metadata.path(),
            params = metadata.query_params.len(),
            "Preparing request"
        );

        self.inner.session.prepare(&self.inner.base_url, metadata)
    }

    /// A fresh parameter set carrying the API key.
    fn params(&self) -> QueryParams {
        QueryParams::new(self.inner.api_key.as_str())
    }
}

impl fmt::Debug for GiphyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GiphyClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`GiphyClient`].
///
/// # Examples
///
/// ```
/// use giphy_core::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), giphy_core::Error> {
/// let client = ClientBuilder::new()
///     .api_key("my-api-key")
///     .base_url("https://api.giphy.com/v1")?
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// assert_eq!(client.base_url().as_str(), "https://api.giphy.com/v1");
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    runtime: Option<Handle>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            transport: None,
            runtime: None,
        }
    }

    /// Sets the API key sent as `api_key` on every request. Required.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Overrides the base URL (defaults to [`DEFAULT_BASE_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the transport-level request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Runs request tasks on `runtime` instead of the caller's runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the configured [`GiphyClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if no API key was provided or the default transport
    /// cannot be created.
    pub fn build(self) -> Result<GiphyClient> {
        let api_key = self
            .api_key
            .ok_or_else(|| Error::ConfigurationError("API key is required".to_string()))?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new()?),
        };

        let session = NetworkSession::new(transport)
            .with_timeout(self.timeout)
            .with_runtime(self.runtime);

        Ok(GiphyClient {
            inner: Arc::new(ClientInner {
                api_key,
                base_url,
                default_headers: self.default_headers,
                session,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
