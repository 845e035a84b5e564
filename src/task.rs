//! Asynchronous dispatch with exactly-once completion delivery.
//!
//! An [`ApiTask`] owns one prepared request and one completion handler. The
//! request runs as a tokio task; whichever of {the worker finishing, a call to
//! [`ApiTask::cancel`]} claims the handler first delivers its outcome, and the
//! other side's outcome is dropped.
//!
//! # Handler context
//!
//! * Success and failure outcomes are delivered on a worker thread of the
//!   runtime the task was spawned on.
//! * A cancellation is delivered synchronously on the thread that called
//!   [`ApiTask::cancel`].
//! * If no runtime is available when the task starts, the
//!   [`Error::ConfigurationError`] is delivered on the thread that called
//!   [`ApiTask::start`].
//!
//! Handlers may therefore run concurrently with the code that issued the
//! request and must synchronise any state they share with it.

use crate::{session::RequestHandle, Error, ErrorKind, Response, Result};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;

/// A boxed completion handler for responses decoded into `T`.
pub type CompletionHandler<T> = Box<dyn FnOnce(Result<Response<T>>) + Send + 'static>;

/// Lifecycle of an [`ApiTask`].
///
/// `Pending` → `Running` → `Succeeded` | `Failed`. Both terminal states are
/// final; a cancelled task ends in `Failed(ErrorKind::Cancelled)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed(ErrorKind),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed(_))
    }
}

trait TaskControl: Send + Sync {
    fn start(self: Arc<Self>);
    fn cancel(&self) -> bool;
    fn subscribe(&self) -> watch::Receiver<TaskState>;
}

struct TaskInner<T> {
    handler: Mutex<Option<CompletionHandler<T>>>,
    request: Mutex<Option<RequestHandle<T>>>,
    abort: Mutex<Option<AbortHandle>>,
    state: watch::Sender<TaskState>,
    label: String,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> TaskInner<T>
where
    T: Send + 'static,
{
    fn claim(&self) -> Option<CompletionHandler<T>> {
        lock(&self.handler).take()
    }

    /// Delivers `result` if nobody has claimed the handler yet.
    fn deliver(&self, result: Result<Response<T>>) -> bool {
        match self.claim() {
            Some(handler) => {
                self.complete(handler, result);
                true
            }
            None => {
                tracing::debug!(
                    request = %self.label,
                    outcome_ok = result.is_ok(),
                    "Dropping outcome of already completed task"
                );
                false
            }
        }
    }

    fn complete(&self, handler: CompletionHandler<T>, result: Result<Response<T>>) {
        let state = match &result {
            Ok(_) => TaskState::Succeeded,
            Err(e) => TaskState::Failed(e.kind()),
        };

        if panic::catch_unwind(AssertUnwindSafe(move || handler(result))).is_err() {
            tracing::error!(request = %self.label, "Completion handler panicked");
        }

        self.state.send_replace(state);
    }
}

impl<T> TaskControl for TaskInner<T>
where
    T: Send + 'static,
{
    fn start(self: Arc<Self>) {
        let Some(request) = lock(&self.request).take() else {
            return;
        };
        let (future, runtime) = request.into_parts();

        let runtime = match runtime.map(Ok).unwrap_or_else(Handle::try_current) {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(request = %self.label, error = %e, "No tokio runtime to run request on");
                self.deliver(Err(Error::ConfigurationError(format!(
                    "No tokio runtime available: {}",
                    e
                ))));
                return;
            }
        };

        self.state.send_if_modified(|state| {
            if *state == TaskState::Pending {
                *state = TaskState::Running;
                true
            } else {
                false
            }
        });

        let worker = runtime.spawn(future);
        *lock(&self.abort) = Some(worker.abort_handle());
        if lock(&self.handler).is_none() {
            // Cancelled while we were spawning.
            worker.abort();
        }

        let inner = Arc::clone(&self);
        runtime.spawn(async move {
            let result = match worker.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => Err(Error::Cancelled),
                Err(e) => {
                    tracing::error!(request = %inner.label, error = %e, "Request worker panicked");
                    Err(Error::Network(format!("Request worker failed: {}", e)))
                }
            };
            inner.deliver(result);
        });
    }

    fn cancel(&self) -> bool {
        let Some(handler) = self.claim() else {
            return false;
        };

        lock(&self.request).take();
        if let Some(abort) = lock(&self.abort).take() {
            abort.abort();
        }

        tracing::debug!(request = %self.label, "Request cancelled");
        self.complete(handler, Err(Error::Cancelled));
        true
    }

    fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.subscribe()
    }
}

/// A dispatched request with a single completion handler.
///
/// The handler is invoked exactly once with either the decoded response or
/// an error, never both and never neither (as long as the task is started or
/// cancelled). See the [module docs](self) for which thread it runs on.
///
/// Clones refer to the same task, so one can be handed to another thread to
/// cancel it.
///
/// # Examples
///
/// ```no_run
/// use giphy_core::{GiphyClient, MediaType, TaskState, TrendingOptions};
///
/// # async fn example() -> Result<(), giphy_core::Error> {
/// let client = GiphyClient::new("my-api-key")?;
/// let task = client.trending(MediaType::Gif, TrendingOptions::default(), |result| {
///     match result {
///         Ok(response) => println!("{} trending", response.data.data.len()),
///         Err(e) => eprintln!("trending failed: {}", e),
///     }
/// });
///
/// if task.cancel() {
///     assert_eq!(task.state(), TaskState::Failed(giphy_core::ErrorKind::Cancelled));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiTask {
    inner: Arc<dyn TaskControl>,
    label: Arc<str>,
}

impl ApiTask {
    /// Binds a request to its handler without starting it.
    pub fn new<T, F>(request: RequestHandle<T>, handler: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce(Result<Response<T>>) + Send + 'static,
    {
        let label = format!("{} {}", request.method(), request.path());
        let (state, _) = watch::channel(TaskState::Pending);
        let inner = TaskInner {
            handler: Mutex::new(Some(Box::new(handler) as CompletionHandler<T>)),
            request: Mutex::new(Some(request)),
            abort: Mutex::new(None),
            state,
            label: label.clone(),
        };

        Self {
            inner: Arc::new(inner),
            label: label.into(),
        }
    }

    /// Starts the request. Calling it again, or after a cancel, does nothing.
    pub fn start(&self) {
        Arc::clone(&self.inner).start();
    }

    /// Cancels the task if it has not completed yet.
    ///
    /// Returns `true` if this call delivered [`Error::Cancelled`] to the
    /// handler; no success can be delivered afterwards. Returns `false` if the
    /// outcome had already been claimed, in which case nothing changes.
    pub fn cancel(&self) -> bool {
        self.inner.cancel()
    }

    pub fn state(&self) -> TaskState {
        *self.inner.subscribe().borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Waits until the handler has returned and yields the terminal state.
    ///
    /// A task that is never started or cancelled never finishes.
    pub async fn finished(&self) -> TaskState {
        let mut rx = self.inner.subscribe();
        let terminal = rx.wait_for(TaskState::is_terminal).await.map(|state| *state);
        terminal.unwrap_or_else(|_| {
            tracing::debug!(request = %self.label, "Task state channel closed");
            self.state()
        })
    }
}

impl fmt::Debug for ApiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTask")
            .field("request", &self.label)
            .field("state", &self.state())
            .finish()
    }
}

/// Returns a completion handler paired with a receiver for its outcome.
///
/// Handy for awaiting a callback-based endpoint:
///
/// ```no_run
/// use giphy_core::{completion_channel, GiphyClient, MultipleGifsResponse};
///
/// # async fn example() -> Result<(), giphy_core::Error> {
/// let client = GiphyClient::new("my-api-key")?;
/// let (handler, rx) = completion_channel::<MultipleGifsResponse>();
/// client.gif_by_ids(&["feqkVgjJpYtjy", "7rzbxdu0ZEXLy"], handler);
/// let gifs = rx.await.map_err(|_| giphy_core::Error::Cancelled)??;
/// println!("{}", gifs.data.data.len());
/// # Ok(())
/// # }
/// ```
pub fn completion_channel<T>() -> (
    impl FnOnce(Result<Response<T>>) + Send + 'static,
    oneshot::Receiver<Result<Response<T>>>,
)
where
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let handler = move |result: Result<Response<T>>| {
        let _ = tx.send(result);
    };
    (handler, rx)
}
