//! Endpoint descriptors and per-request metadata.

use crate::params::QueryParams;
use http::{HeaderMap, Method};
use std::fmt;
use url::Url;

/// Which Giphy catalogue an endpoint targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    #[default]
    Gif,
    Sticker,
}

impl MediaType {
    /// The path segment Giphy uses for this catalogue.
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            MediaType::Gif => "gifs",
            MediaType::Sticker => "stickers",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// One logical Giphy API operation.
///
/// ```
/// use giphy_core::metadata::{Endpoint, MediaType};
///
/// assert_eq!(Endpoint::Search(MediaType::Gif).path(), "/gifs/search");
/// assert_eq!(Endpoint::Random(MediaType::Sticker).path(), "/stickers/random");
/// assert_eq!(Endpoint::GifById("abc".into()).path(), "/gifs/abc");
/// assert_eq!(Endpoint::GifsByIds.path(), "/gifs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Search(MediaType),
    Trending(MediaType),
    Translate(MediaType),
    Random(MediaType),
    GifById(String),
    GifsByIds,
}

impl Endpoint {
    /// The path segments, relative to the client's base URL.
    ///
    /// A caller-supplied id is always exactly one segment; it is never split
    /// on `/`.
    pub fn segments(&self) -> Vec<String> {
        let media = |media: &MediaType, action: &str| {
            vec![media.as_path_segment().to_string(), action.to_string()]
        };
        match self {
            Endpoint::Search(m) => media(m, "search"),
            Endpoint::Trending(m) => media(m, "trending"),
            Endpoint::Translate(m) => media(m, "translate"),
            Endpoint::Random(m) => media(m, "random"),
            Endpoint::GifById(id) => vec![MediaType::Gif.to_string(), id.clone()],
            Endpoint::GifsByIds => vec![MediaType::Gif.to_string()],
        }
    }

    /// The request path for display and logging.
    pub fn path(&self) -> String {
        format!("/{}", self.segments().join("/"))
    }

    /// Every Giphy read endpoint is a GET.
    pub fn method(&self) -> Method {
        Method::GET
    }

    /// A short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Search(_) => "search",
            Endpoint::Trending(_) => "trending",
            Endpoint::Translate(_) => "translate",
            Endpoint::Random(_) => "random",
            Endpoint::GifById(_) => "gif_by_id",
            Endpoint::GifsByIds => "gif_by_ids",
        }
    }
}

/// Metadata for an individual HTTP request.
///
/// Contains everything needed to make a single request: method, path
/// segments, headers and query parameters. Built fresh for every call.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// The HTTP method.
    pub method: Method,

    /// Path segments appended to the base URL, unencoded.
    pub segments: Vec<String>,

    /// Headers sent with this request.
    pub headers: HeaderMap,

    /// Query parameters for this request.
    pub query_params: QueryParams,
}

impl RequestMetadata {
    /// Creates metadata for `path`, split on `/` into segments.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            headers: HeaderMap::new(),
            query_params: QueryParams::empty(),
        }
    }

    /// Creates metadata for an endpoint with its parameter set.
    pub fn for_endpoint(endpoint: &Endpoint, params: QueryParams) -> Self {
        Self {
            method: endpoint.method(),
            segments: endpoint.segments(),
            headers: HeaderMap::new(),
            query_params: params,
        }
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key, value);
        self
    }

    /// The request path for display and logging.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Resolves the full request URL against `base_url`.
    ///
    /// Segments are appended to whatever path `base_url` already has, each
    /// percent-encoded on its own, so a base of `https://api.giphy.com/v1`
    /// and segments `["gifs", "search"]` give
    /// `https://api.giphy.com/v1/gifs/search`.
    ///
    /// ```
    /// use giphy_core::metadata::RequestMetadata;
    /// use http::Method;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://api.giphy.com/v1/").unwrap();
    /// let url = RequestMetadata::new(Method::GET, "/gifs/search")
    ///     .with_query_param("q", "cats & dogs")
    ///     .url(&base)
    ///     .unwrap();
    /// assert_eq!(url.as_str(), "https://api.giphy.com/v1/gifs/search?q=cats+%26+dogs");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ConfigurationError`] if the base URL cannot
    /// carry a path, or a segment is empty, `.` or `..`.
    pub fn url(&self, base_url: &Url) -> crate::Result<Url> {
        if let Some(segment) = self
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(crate::Error::ConfigurationError(format!(
                "Invalid path segment: {:?}",
                segment
            )));
        }

        let mut url = base_url.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| {
                crate::Error::ConfigurationError(format!(
                    "Base URL cannot carry a path: {}",
                    base_url
                ))
            })?
            .pop_if_empty()
            .extend(&self.segments);

        if !self.query_params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.query_params.iter() {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}
