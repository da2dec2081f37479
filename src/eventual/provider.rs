//! Promise and deferred providers
//!
//! Conversions targeting the promise or deferred paradigm obtain their eventual
//! values from these providers, which can be swapped per conversion or per
//! process.

use tracing::warn;

use super::{Deferred, Promise, Settler};

/// Body of a promise: receives the settler and eventually resolves or rejects it
pub type Executor = Box<dyn FnOnce(Settler) + Send + 'static>;

/// Builds promises from an executor
pub trait PromiseProvider: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self, executor: Executor) -> Promise;
}

/// Builds deferred controllers
pub trait DeferredProvider: Send + Sync {
    fn name(&self) -> &str;

    fn defer(&self) -> Deferred;
}

/// Runs the executor synchronously, before `create` returns
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePromiseProvider;

impl PromiseProvider for InlinePromiseProvider {
    fn name(&self) -> &str {
        "inline"
    }

    fn create(&self, executor: Executor) -> Promise {
        let (promise, settler) = Promise::pending();
        executor(settler);
        promise
    }
}

/// Runs the executor on a Tokio task.
///
/// Falls back to running inline when called outside a runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPromiseProvider;

impl PromiseProvider for TokioPromiseProvider {
    fn name(&self) -> &str {
        "tokio"
    }

    fn create(&self, executor: Executor) -> Promise {
        let (promise, settler) = Promise::pending();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    executor(settler);
                });
            }
            Err(_) => {
                warn!("TokioPromiseProvider used outside a runtime, running executor inline");
                executor(settler);
            }
        }
        promise
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDeferredProvider;

impl DeferredProvider for StandardDeferredProvider {
    fn name(&self) -> &str {
        "standard"
    }

    fn defer(&self) -> Deferred {
        Deferred::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_provider_runs_executor_immediately() {
        let promise = InlinePromiseProvider.create(Box::new(|settler| {
            settler.resolve(json!("now"));
        }));
        assert_eq!(promise.peek(), Some(Ok(json!("now"))));
    }

    #[tokio::test]
    async fn test_tokio_provider_spawns_executor() {
        let promise = TokioPromiseProvider.create(Box::new(|settler| {
            settler.reject(json!("spawned"));
        }));
        assert_eq!(promise.await, Err(json!("spawned")));
    }

    #[test]
    fn test_tokio_provider_without_runtime_runs_inline() {
        let promise = TokioPromiseProvider.create(Box::new(|settler| {
            settler.resolve(json!(7));
        }));
        assert_eq!(promise.peek(), Some(Ok(json!(7))));
    }

    #[test]
    fn test_provider_names() {
        assert_eq!(InlinePromiseProvider.name(), "inline");
        assert_eq!(TokioPromiseProvider.name(), "tokio");
        assert_eq!(StandardDeferredProvider.name(), "standard");
        assert!(!StandardDeferredProvider.defer().promise().is_settled());
    }
}
