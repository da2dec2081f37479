//! Eventual Values
//!
//! A settle-once promise that can carry continuations (callback style) and be
//! awaited (future style), the deferred controller built on top of it, and the
//! providers used by conversions to create both.

mod deferred;
mod provider;

pub use deferred::Deferred;
pub use provider::{
    DeferredProvider, Executor, InlinePromiseProvider, PromiseProvider, StandardDeferredProvider,
    TokioPromiseProvider,
};

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use tracing::{debug, warn};

/// Final state of a promise: `Ok(value)` when fulfilled, `Err(reason)` when rejected.
pub type Settlement = Result<Value, Value>;

type Continuation = Box<dyn FnOnce(Settlement) + Send>;

enum State {
    Pending {
        continuations: Vec<Continuation>,
        wakers: Vec<Waker>,
    },
    Settled(Settlement),
}

/// An eventually-resolving value.
///
/// Clones share the same underlying state. Settlement happens at most once;
/// continuations attached after that run immediately on the caller's thread.
#[derive(Clone)]
pub struct Promise {
    state: Arc<Mutex<State>>,
}

impl Promise {
    /// Create a pending promise together with the handle that settles it
    pub fn pending() -> (Promise, Settler) {
        let promise = Promise {
            state: Arc::new(Mutex::new(State::Pending {
                continuations: Vec::new(),
                wakers: Vec::new(),
            })),
        };
        let settler = Settler { promise: promise.clone() };
        (promise, settler)
    }

    pub fn resolved(value: Value) -> Promise {
        let (promise, settler) = Promise::pending();
        settler.resolve(value);
        promise
    }

    pub fn rejected(reason: Value) -> Promise {
        let (promise, settler) = Promise::pending();
        settler.reject(reason);
        promise
    }

    /// Drive a Rust future to completion and expose its output as a promise.
    ///
    /// The future is spawned on the current Tokio runtime. Outside a runtime it
    /// is driven to completion on the calling thread by a temporary
    /// current-thread runtime, so Tokio timers and IO still work. If that
    /// runtime cannot be started the promise is rejected.
    pub fn from_future<F>(future: F) -> Promise
    where
        F: Future<Output = Settlement> + Send + 'static,
    {
        let (promise, settler) = Promise::pending();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    settler.settle(future.await);
                });
            }
            Err(_) => match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    debug!("No Tokio runtime available, driving future on a temporary one");
                    settler.settle(runtime.block_on(future));
                }
                Err(e) => {
                    warn!("Failed to start a runtime for future: {}", e);
                    settler.reject(Value::String(format!("no runtime to drive future: {}", e)));
                }
            },
        }
        promise
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current settlement, if any
    pub fn peek(&self) -> Option<Settlement> {
        match &*self.lock() {
            State::Pending { .. } => None,
            State::Settled(outcome) => Some(outcome.clone()),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    fn settle(&self, outcome: Settlement) -> bool {
        let mut state = self.lock();
        if let State::Settled(_) = *state {
            return false;
        }
        let previous = std::mem::replace(&mut *state, State::Settled(outcome.clone()));
        drop(state);

        if let State::Pending { continuations, wakers } = previous {
            for continuation in continuations {
                continuation(outcome.clone());
            }
            for waker in wakers {
                waker.wake();
            }
        }
        true
    }

    fn subscribe(&self, continuation: Continuation) {
        let settled = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending { continuations, .. } => {
                    continuations.push(continuation);
                    return;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };
        continuation(settled);
    }

    /// Attach success and failure continuations (two-argument `then`).
    ///
    /// Takes `self` by value so it is picked over `FutureExt::then`; clone the
    /// promise to keep a handle.
    pub fn then<S, F>(self, on_success: S, on_failure: F) -> Promise
    where
        S: FnOnce(Value) + Send + 'static,
        F: FnOnce(Value) + Send + 'static,
    {
        self.subscribe(Box::new(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(reason) => on_failure(reason),
        }));
        self
    }

    /// Attach a success-only continuation; chain [`Promise::fail`] for failures
    pub fn on_success<S>(self, on_success: S) -> Promise
    where
        S: FnOnce(Value) + Send + 'static,
    {
        self.subscribe(Box::new(move |outcome| {
            if let Ok(value) = outcome {
                on_success(value);
            }
        }));
        self
    }

    /// Attach a failure-only continuation
    pub fn fail<F>(self, on_failure: F) -> Promise
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.subscribe(Box::new(move |outcome| {
            if let Err(reason) = outcome {
                on_failure(reason);
            }
        }));
        self
    }
}

impl Future for Promise {
    type Output = Settlement;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.lock();
        match &mut *state {
            State::Settled(outcome) => Poll::Ready(outcome.clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.peek() {
            None => write!(f, "Promise(pending)"),
            Some(Ok(value)) => write!(f, "Promise(fulfilled: {})", value),
            Some(Err(reason)) => write!(f, "Promise(rejected: {})", reason),
        }
    }
}

/// Write side of a [`Promise`]
#[derive(Clone, Debug)]
pub struct Settler {
    promise: Promise,
}

impl Settler {
    /// Fulfill the promise. Returns false if it was already settled.
    pub fn resolve(&self, value: Value) -> bool {
        self.promise.settle(Ok(value))
    }

    /// Reject the promise. Returns false if it was already settled.
    pub fn reject(&self, reason: Value) -> bool {
        self.promise.settle(Err(reason))
    }

    pub fn settle(&self, outcome: Settlement) -> bool {
        self.promise.settle(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_settles_only_once() {
        let (promise, settler) = Promise::pending();
        assert!(promise.peek().is_none());
        assert!(settler.resolve(json!(1)));
        assert!(!settler.reject(json!("late")));
        assert!(!settler.resolve(json!(2)));
        assert_eq!(promise.peek(), Some(Ok(json!(1))));
    }

    #[test]
    fn test_continuations_run_on_settlement() {
        let (promise, settler) = Promise::pending();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        promise.then(move |v| s.lock().unwrap().push(v), |_| panic!("not rejected"));
        assert!(seen.lock().unwrap().is_empty());

        settler.resolve(json!("done"));
        assert_eq!(*seen.lock().unwrap(), vec![json!("done")]);
    }

    #[test]
    fn test_late_continuation_runs_immediately() {
        let promise = Promise::rejected(json!("boom"));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        promise
            .on_success(|_| panic!("not fulfilled"))
            .fail(move |reason| {
                assert_eq!(reason, json!("boom"));
                h.fetch_add(1, Ordering::SeqCst);
            });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_settled_promise_is_ready_future() {
        let promise = Promise::resolved(json!({"k": 1}));
        assert_eq!(promise.now_or_never(), Some(Ok(json!({"k": 1}))));

        let (pending, _settler) = Promise::pending();
        assert!(pending.now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_await_wakes_on_settlement() {
        let (promise, settler) = Promise::pending();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            settler.reject(json!(false));
        });
        assert_eq!(promise.await, Err(json!(false)));
    }

    #[tokio::test]
    async fn test_from_future_on_runtime() {
        let promise = Promise::from_future(async { Ok(json!(42)) });
        assert_eq!(promise.await, Ok(json!(42)));
    }

    #[test]
    fn test_from_future_without_runtime_blocks() {
        let promise = Promise::from_future(async { Err(json!("no runtime")) });
        assert_eq!(promise.peek(), Some(Err(json!("no runtime"))));
    }

    #[test]
    fn test_from_future_without_runtime_supports_tokio_timers() {
        let promise = Promise::from_future(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            Ok(json!("late"))
        });
        assert_eq!(promise.peek(), Some(Ok(json!("late"))));
    }

    #[test]
    fn test_two_argument_then_with_future_ext_in_scope() {
        let (promise, settler) = Promise::pending();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (ok, err) = (seen.clone(), seen.clone());

        let chained = promise
            .clone()
            .then(move |v| ok.lock().unwrap().push(v), move |r| err.lock().unwrap().push(r));
        settler.reject(json!("nope"));

        assert_eq!(*seen.lock().unwrap(), vec![json!("nope")]);
        assert_eq!(chained.now_or_never(), Some(Err(json!("nope"))));
        assert!(promise.is_settled());
    }

    #[test]
    fn test_debug_reports_state() {
        assert_eq!(format!("{:?}", Promise::resolved(json!(1))), "Promise(fulfilled: 1)");
        let (pending, _s) = Promise::pending();
        assert_eq!(format!("{:?}", pending), "Promise(pending)");
    }
}
