//! # giphy-core - an async client core for the Giphy API
//!
//! Every endpoint method builds its query parameters, prepares a typed request
//! and runs it on a tokio worker. The outcome reaches the caller through a
//! completion handler that is called exactly once, with either a decoded
//! response or an [`Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use giphy_core::{completion_channel, GiphyClient, MediaType, MultipleGifsResponse, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), giphy_core::Error> {
//!     let client = GiphyClient::new("my-api-key")?;
//!
//!     // Callback style
//!     client.search(MediaType::Gif, "cats", SearchOptions::default().limit(5), |result| {
//!         match result {
//!             Ok(response) => println!("found {}", response.data.data.len()),
//!             Err(e) => eprintln!("search failed: {}", e),
//!         }
//!     });
//!
//!     // Await style
//!     let (handler, rx) = completion_channel::<MultipleGifsResponse>();
//!     client.gif_by_ids(&["feqkVgjJpYtjy", "7rzbxdu0ZEXLy"], handler);
//!     match rx.await {
//!         Ok(Ok(response)) => println!("took {:?}", response.latency),
//!         Ok(Err(e)) => eprintln!("lookup failed: {}", e),
//!         Err(_) => eprintln!("handler dropped"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Typed endpoints** - each endpoint decodes into a fixed response shape
//! - **Exactly-once completion** - cancellation races resolve to one outcome
//! - **Pluggable transport** - `reqwest` by default, anything behind [`session::Transport`]
//! - **Structured logging** - request and response events through `tracing`
//! - **Raw response access** - status, headers, latency and body on every success
//!
//! ## Cancellation
//!
//! ```no_run
//! use giphy_core::{GiphyClient, MediaType, RandomOptions};
//!
//! # async fn example() -> Result<(), giphy_core::Error> {
//! let client = GiphyClient::new("my-api-key")?;
//! let task = client.random(MediaType::Sticker, "happy", RandomOptions::default().rating("pg"), |result| {
//!     if let Err(e) = result {
//!         assert!(e.is_cancelled());
//!     }
//! });
//! task.cancel();
//! # Ok(())
//! # }
//! ```

pub mod adapter;
mod client;
mod error;
pub mod metadata;
mod models;
pub mod params;
mod response;
pub mod session;
mod task;

pub use client::{ClientBuilder, GiphyClient, DEFAULT_BASE_URL};
pub use error::{Error, ErrorKind, Result};
pub use metadata::{Endpoint, MediaType};
pub use models::{
    ApiResponse, GenericResponse, Gif, GifResponse, Image, Images, Meta, MultipleGifsResponse,
    Pagination, RandomGif, RandomGifResponse,
};
pub use params::{QueryParams, RandomOptions, SearchOptions, TranslateOptions, TrendingOptions};
pub use response::Response;
pub use session::{NetworkSession, RequestHandle};
pub use task::{completion_channel, ApiTask, CompletionHandler, TaskState};
