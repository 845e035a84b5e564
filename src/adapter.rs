//! Shape adaptation between what an endpoint sends and what callers receive.
//!
//! Some endpoints decode into an envelope that differs from the type the
//! caller's handler expects (`random` sends a [`RandomGifResponse`] but callers
//! get a [`GifResponse`]). [`adapt`] wraps the caller's handler so the
//! dispatch core never needs to know about the conversion.
//!
//! [`RandomGifResponse`]: crate::RandomGifResponse
//! [`GifResponse`]: crate::GifResponse

use crate::{Response, Result};

/// Wraps `handler` so it can receive outcomes decoded as `S`.
///
/// Successful responses are converted with `S: Into<T>` (headers, status and
/// raw body are kept). Errors are forwarded as they are.
///
/// ```
/// use giphy_core::adapter::adapt;
/// use giphy_core::{Error, GifResponse, RandomGifResponse, Response};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let handler = adapt::<RandomGifResponse, GifResponse, _>(move |result| {
///     tx.send(result).unwrap();
/// });
///
/// handler(Err(Error::Timeout));
/// assert_eq!(rx.recv().unwrap().unwrap_err(), Error::Timeout);
/// ```
pub fn adapt<S, T, F>(handler: F) -> impl FnOnce(Result<Response<S>>) + Send + 'static
where
    S: Into<T> + Send + 'static,
    T: Send + 'static,
    F: FnOnce(Result<Response<T>>) + Send + 'static,
{
    move |result: Result<Response<S>>| handler(project(result))
}

/// Converts a successful outcome, leaving errors untouched.
pub fn project<S, T>(result: Result<Response<S>>) -> Result<Response<T>>
where
    S: Into<T>,
{
    result.map(|response| response.map(Into::into))
}
