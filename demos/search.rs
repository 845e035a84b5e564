//! Searches Giphy and prints the results, using both delivery styles.
//!
//! This example shows how to:
//! - Create a client from an API key
//! - Receive results through a completion handler
//! - Await a result through `completion_channel`
//! - Cancel an in-flight request
//!
//! Run with: `GIPHY_API_KEY=... cargo run --example search -- cats`

use giphy_core::{
    completion_channel, Error, GifResponse, GiphyClient, MediaType, RandomOptions, SearchOptions,
    TaskState,
};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter("giphy_core=debug,search=info")
        .init();

    let api_key = std::env::var("GIPHY_API_KEY")
        .map_err(|_| Error::ConfigurationError("GIPHY_API_KEY is not set".to_string()))?;
    let query = std::env::args().nth(1).unwrap_or_else(|| "cats".to_string());

    let client = GiphyClient::new(api_key)?;

    println!("=== Search (callback) ===");
    let task = client.search(
        MediaType::Gif,
        query.clone(),
        SearchOptions::default().limit(5).rating("g"),
        |result| match result {
            Ok(response) => {
                for gif in &response.data.data {
                    println!("{:<20} {}", gif.id, gif.title);
                }
                println!("Request latency: {:?}", response.latency);
            }
            Err(e) => eprintln!("Search failed: {}", e),
        },
    );
    task.finished().await;
    println!();

    println!("=== Random sticker (awaited) ===");
    let (handler, rx) = completion_channel::<GifResponse>();
    client.random(MediaType::Sticker, query.clone(), RandomOptions::default(), handler);
    match rx.await.map_err(|_| Error::Cancelled)? {
        Ok(response) => match &response.data.data {
            Some(gif) => println!("Random sticker: {} ({})", gif.id, gif.url),
            None => println!("No sticker found for {:?}", query),
        },
        Err(e) => eprintln!("Random failed: {}", e),
    }
    println!();

    println!("=== Cancellation ===");
    let task = client.gif_by_id("feqkVgjJpYtjy", |result| {
        if let Err(e) = result {
            println!("Handler saw: {}", e);
        }
    });
    let cancelled = task.cancel();
    println!("Cancelled before completion: {}", cancelled);
    assert!(!cancelled || task.state() != TaskState::Succeeded);

    Ok(())
}
