//! Dispatch-core tests against an in-process fake transport.

use async_trait::async_trait;
use giphy_core::session::{Transport, TransportRequest, TransportResponse};
use giphy_core::{
    completion_channel, ApiTask, Endpoint, Error, ErrorKind, GifResponse, GiphyClient, MediaType,
    MultipleGifsResponse, QueryParams, RandomOptions, Response, SearchOptions, TaskState,
    TranslateOptions, TrendingOptions,
};
use http::{HeaderMap, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

const GIF_BODY: &str =
    r#"{"data":{"type":"gif","id":"abc","title":"Cat"},"meta":{"status":200,"msg":"OK","response_id":"r"}}"#;
const MULTI_BODY: &str =
    r#"{"data":[{"id":"a"},{"id":"b"}],"pagination":{"total_count":2,"count":2,"offset":0},"meta":{"status":200,"msg":"OK"}}"#;
const RANDOM_BODY: &str =
    r#"{"data":{"type":"gif","id":"rnd","image_original_url":"https://media/rnd.gif"},"meta":{"status":200,"msg":"OK"}}"#;

/// Records every request and answers with a canned response.
///
/// With a gate, each call blocks until the test adds a permit.
#[derive(Clone)]
struct FakeTransport {
    requests: Arc<Mutex<Vec<TransportRequest>>>,
    entered: Arc<Notify>,
    gate: Option<Arc<Semaphore>>,
    status: StatusCode,
    body: &'static str,
    explode: bool,
}

impl FakeTransport {
    fn new(body: &'static str) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            entered: Arc::new(Notify::new()),
            gate: None,
            status: StatusCode::OK,
            body,
            explode: false,
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    fn gated(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    fn exploding(mut self) -> Self {
        self.explode = true;
        self
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_query(&self) -> Vec<(String, String)> {
        let requests = self.requests.lock().unwrap();
        let request = requests.last().expect("no request was sent");
        request.url.query_pairs().into_owned().collect()
    }

    fn last_path(&self) -> String {
        let requests = self.requests.lock().unwrap();
        requests.last().expect("no request was sent").url.path().to_string()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: TransportRequest) -> giphy_core::Result<TransportResponse> {
        self.requests.lock().unwrap().push(request);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.map_err(|e| Error::Network(e.to_string()))?;
        }

        if self.explode {
            panic!("transport exploded");
        }

        Ok(TransportResponse {
            status: self.status,
            headers: HeaderMap::new(),
            body: self.body.to_string(),
        })
    }
}

fn client_with(transport: &FakeTransport) -> GiphyClient {
    GiphyClient::builder()
        .api_key("test-key")
        .transport(transport.clone())
        .build()
        .unwrap()
}

/// A handler that counts invocations and keeps the last outcome.
fn recording_handler<T: Send + 'static>() -> (
    impl FnOnce(giphy_core::Result<Response<T>>) + Send + 'static,
    Arc<AtomicUsize>,
    Arc<Mutex<Option<giphy_core::Result<Response<T>>>>>,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let outcome = Arc::new(Mutex::new(None));
    let handler = {
        let calls = Arc::clone(&calls);
        let outcome = Arc::clone(&outcome);
        move |result: giphy_core::Result<Response<T>>| {
            calls.fetch_add(1, Ordering::SeqCst);
            *outcome.lock().unwrap() = Some(result);
        }
    };
    (handler, calls, outcome)
}

fn keys(query: &[(String, String)]) -> Vec<&str> {
    query.iter().map(|(k, _)| k.as_str()).collect()
}

#[tokio::test]
async fn test_search_builds_expected_request() {
    let transport = FakeTransport::new(MULTI_BODY);
    let client = client_with(&transport);

    let (handler, rx) = completion_channel::<MultipleGifsResponse>();
    client.search(MediaType::Gif, "cats", SearchOptions::default().limit(5), handler);
    rx.await.unwrap().unwrap();

    assert_eq!(transport.last_path(), "/v1/gifs/search");
    let query = transport.last_query();
    assert_eq!(
        query,
        [
            ("api_key".to_string(), "test-key".to_string()),
            ("q".to_string(), "cats".to_string()),
            ("limit".to_string(), "5".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_every_endpoint_sends_api_key_first() {
    let multi = FakeTransport::new(MULTI_BODY);
    let single = FakeTransport::new(GIF_BODY);
    let random = FakeTransport::new(RANDOM_BODY);

    let (h, rx) = completion_channel::<MultipleGifsResponse>();
    client_with(&multi).trending(MediaType::Sticker, TrendingOptions::default(), h);
    rx.await.unwrap().unwrap();
    assert_eq!(multi.last_path(), "/v1/stickers/trending");
    assert_eq!(keys(&multi.last_query()), ["api_key"]);

    let (h, rx) = completion_channel::<MultipleGifsResponse>();
    client_with(&multi).gif_by_ids(&["x", "y", "z"], h);
    rx.await.unwrap().unwrap();
    assert_eq!(multi.last_path(), "/v1/gifs");
    assert_eq!(keys(&multi.last_query()), ["api_key", "ids"]);
    assert_eq!(multi.last_query()[1].1, "x,y,z");

    let (h, rx) = completion_channel::<GifResponse>();
    client_with(&single).translate(
        MediaType::Gif,
        "hello",
        TranslateOptions::default().rating("g").lang("en"),
        h,
    );
    rx.await.unwrap().unwrap();
    assert_eq!(single.last_path(), "/v1/gifs/translate");
    assert_eq!(keys(&single.last_query()), ["api_key", "s", "rating", "lang"]);

    let (h, rx) = completion_channel::<GifResponse>();
    client_with(&single).gif_by_id("abc", h);
    rx.await.unwrap().unwrap();
    assert_eq!(single.last_path(), "/v1/gifs/abc");
    assert_eq!(keys(&single.last_query()), ["api_key"]);

    let (h, rx) = completion_channel::<GifResponse>();
    client_with(&random).random(MediaType::Sticker, "happy", RandomOptions::default(), h);
    rx.await.unwrap().unwrap();
    assert_eq!(random.last_path(), "/v1/stickers/random");
    assert_eq!(keys(&random.last_query()), ["api_key", "tag"]);
}

#[tokio::test]
async fn test_random_handler_receives_projected_shape() {
    let transport = FakeTransport::new(RANDOM_BODY);
    let client = client_with(&transport);

    let (handler, rx) = completion_channel::<GifResponse>();
    client.random(MediaType::Gif, "cats", RandomOptions::default().rating("pg"), handler);

    let response = rx.await.unwrap().unwrap();
    let gif = response.data.data.clone().unwrap();
    assert_eq!(gif.id, "rnd");
    assert_eq!(
        gif.images.original.unwrap().url.as_deref(),
        Some("https://media/rnd.gif")
    );
    assert_eq!(response.raw_body, RANDOM_BODY);
}

#[tokio::test]
async fn test_random_error_is_forwarded_without_conversion() {
    let transport = FakeTransport::new("unavailable").with_status(StatusCode::SERVICE_UNAVAILABLE);
    let client = client_with(&transport);

    let (handler, rx) = completion_channel::<GifResponse>();
    client.random(MediaType::Gif, "cats", RandomOptions::default(), handler);

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        Error::HttpError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            raw_response: "unavailable".to_string(),
            headers: HeaderMap::new(),
        }
    );
}

#[tokio::test]
async fn test_handler_runs_exactly_once_on_success() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let (handler, calls, outcome) = recording_handler::<GifResponse>();
    let task = client.gif_by_id("abc", handler);

    assert_eq!(task.finished().await, TaskState::Succeeded);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let outcome = outcome.lock().unwrap().take().unwrap();
    assert_eq!(outcome.unwrap().data.data.unwrap().id, "abc");
    assert!(!task.cancel());
    assert_eq!(task.state(), TaskState::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_cancel_in_flight_suppresses_late_success() {
    let (transport, gate) = FakeTransport::new(GIF_BODY).gated();
    let client = client_with(&transport);

    let (handler, calls, outcome) = recording_handler::<GifResponse>();
    let task = client.gif_by_id("abc", handler);

    transport.entered.notified().await;
    assert_eq!(task.state(), TaskState::Running);

    assert!(task.cancel());
    assert!(!task.cancel());
    assert_eq!(task.state(), TaskState::Failed(ErrorKind::Cancelled));

    gate.add_permits(1);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let outcome = outcome.lock().unwrap().take().unwrap();
    assert!(outcome.unwrap_err().is_cancelled());
    assert_eq!(task.finished().await, TaskState::Failed(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_cancel_before_start_never_touches_transport() {
    let transport = FakeTransport::new(MULTI_BODY);
    let client = client_with(&transport);

    let mut params = QueryParams::new("test-key");
    params.insert("q", "dogs");
    let request = client.prepare::<MultipleGifsResponse>(&Endpoint::Search(MediaType::Gif), params);

    let (handler, calls, outcome) = recording_handler::<MultipleGifsResponse>();
    let task = ApiTask::new(request, handler);
    assert_eq!(task.state(), TaskState::Pending);

    assert!(task.cancel());
    task.start();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(transport.calls(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcome.lock().unwrap().take().unwrap().unwrap_err(),
        Error::Cancelled
    );
    assert_eq!(task.state(), TaskState::Failed(ErrorKind::Cancelled));
}

#[tokio::test]
async fn test_prepared_request_is_lazy() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let request = client.prepare::<GifResponse>(&Endpoint::GifById("abc".into()), QueryParams::new("k"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.calls(), 0);
    assert_eq!(request.path(), "/gifs/abc");

    let response = request.send().await.unwrap();
    assert_eq!(transport.calls(), 1);
    assert_eq!(response.data.data.unwrap().title, "Cat");
}

#[tokio::test]
async fn test_gif_id_is_sent_as_one_encoded_segment() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let (h, rx) = completion_channel::<GifResponse>();
    client.gif_by_id("../stickers/trending", h);
    rx.await.unwrap().unwrap();
    assert_eq!(transport.last_path(), "/v1/gifs/..%2Fstickers%2Ftrending");

    let (h, rx) = completion_channel::<GifResponse>();
    client.gif_by_id("a/b", h);
    rx.await.unwrap().unwrap();
    assert_eq!(transport.last_path(), "/v1/gifs/a%2Fb");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_dot_gif_id_fails_without_a_request() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let (handler, calls, outcome) = recording_handler::<GifResponse>();
    let task = client.gif_by_id("..", handler);

    assert_eq!(task.finished().await, TaskState::Failed(ErrorKind::Configuration));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let err = outcome.lock().unwrap().take().unwrap().unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_racing_completion_delivers_one_outcome() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    for _ in 0..200 {
        let (handler, calls, outcome) = recording_handler::<GifResponse>();
        let task = client.gif_by_id("abc", handler);
        tokio::task::yield_now().await;
        let cancelled = task.cancel();

        let state = task.finished().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let outcome = outcome.lock().unwrap().take().unwrap();
        if cancelled {
            assert_eq!(state, TaskState::Failed(ErrorKind::Cancelled));
            assert!(outcome.unwrap_err().is_cancelled());
        } else {
            assert_eq!(state, TaskState::Succeeded);
            assert!(outcome.is_ok());
        }
    }
}

#[tokio::test]
async fn test_worker_panic_is_delivered_as_transport_error() {
    let transport = FakeTransport::new(GIF_BODY).exploding();
    let client = client_with(&transport);

    let (handler, rx) = completion_channel::<GifResponse>();
    let task = client.gif_by_id("abc", handler);

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(task.finished().await, TaskState::Failed(ErrorKind::Transport));
}

#[tokio::test]
async fn test_panicking_handler_still_finishes_task() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let task = client.gif_by_id("abc", |_| panic!("handler bug"));

    assert_eq!(task.finished().await, TaskState::Succeeded);
}

#[tokio::test]
async fn test_empty_result_is_success() {
    let transport = FakeTransport::new(r#"{"data":[],"meta":{"status":200,"msg":"OK"}}"#);
    let client = client_with(&transport);

    let (handler, rx) = completion_channel::<GifResponse>();
    client.translate(MediaType::Gif, "zzzz", TranslateOptions::default(), handler);

    let response = rx.await.unwrap().unwrap();
    assert!(response.data.data.is_none());
}

#[test]
fn test_dispatch_without_runtime_reports_configuration_error() {
    let transport = FakeTransport::new(GIF_BODY);
    let client = client_with(&transport);

    let (handler, calls, outcome) = recording_handler::<GifResponse>();
    let task = client.gif_by_id("abc", handler);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.calls(), 0);
    let err = outcome.lock().unwrap().take().unwrap().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(task.state(), TaskState::Failed(ErrorKind::Configuration));
}

#[test]
fn test_explicit_runtime_runs_tasks_off_the_caller() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let transport = FakeTransport::new(GIF_BODY);
    let client = GiphyClient::builder()
        .api_key("test-key")
        .transport(transport.clone())
        .runtime(runtime.handle().clone())
        .build()
        .unwrap();

    let caller = std::thread::current().id();
    let (tx, rx) = std::sync::mpsc::channel();
    client.gif_by_id("abc", move |result| {
        tx.send((std::thread::current().id(), result.is_ok())).unwrap();
    });

    let (handler_thread, ok) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(ok);
    assert_ne!(handler_thread, caller);
}
