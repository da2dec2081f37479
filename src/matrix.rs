//! Conversion Strategy Matrix
//!
//! Every ordered pair of distinct paradigms is a [`ConversionEntry`]. A wrapper
//! built from an entry parses its own arguments with the target parser, calls
//! the original function the way the source paradigm expects, and relays the
//! source's completion into the target's completion channel.
//!
//! The relay is split in two halves. A [`Sink`] is the target side: the pair
//! of handlers that report success and failure to the wrapper's caller. A
//! [`Driver`] is the source side: it invokes the original function and feeds
//! its completion into a sink.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::callable::{is_truthy, Arg, Callable, Handler, Outcome, Scope};
use crate::engines::Engines;
use crate::error::{ConversionError, Result};
use crate::eventual::{Deferred, DeferredProvider, PromiseProvider, Settler};
use crate::paradigm::{Paradigm, PARADIGMS};
use crate::signature::{self, ArgumentSignature};

/// Failure value reported when a promise or deferred source returns nothing to wait on
pub const NO_EVENTUAL_VALUE: &str = "source returned no eventual value";

/// One cell of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionEntry {
    source: Paradigm,
    target: Paradigm,
}

impl ConversionEntry {
    pub fn new(source: Paradigm, target: Paradigm) -> Result<Self> {
        if source == target {
            return Err(ConversionError::SameParadigm(source));
        }
        Ok(Self { source, target })
    }

    /// All 20 entries, source-major in canonical paradigm order
    pub fn all() -> Vec<ConversionEntry> {
        PARADIGMS
            .iter()
            .flat_map(|&source| {
                PARADIGMS
                    .iter()
                    .filter(move |&&target| target != source)
                    .map(move |&target| ConversionEntry { source, target })
            })
            .collect()
    }

    pub fn source(&self) -> Paradigm {
        self.source
    }

    pub fn target(&self) -> Paradigm {
        self.target
    }

    /// Build the wrapper around `original`.
    ///
    /// `parser` is the argument parser of the target paradigm.
    pub fn build<P>(
        &self,
        parser: P,
        original: Callable,
        scope: Scope,
        promises: Arc<dyn PromiseProvider>,
        deferreds: Arc<dyn DeferredProvider>,
    ) -> Callable
    where
        P: Fn(Vec<Arg>) -> ArgumentSignature + Send + Sync + 'static,
    {
        let source = self.source;
        let target = self.target;

        Callable::new(move |_, args| {
            let ArgumentSignature { rest, callback, errback } = parser(args);
            let driver = Driver {
                original: original.clone(),
                scope: scope.clone(),
                source,
            };

            match target {
                Paradigm::Classical | Paradigm::Baroque => {
                    driver.drive(rest, Sink::split(target, callback, errback));
                    Outcome::Done
                }
                Paradigm::Modern => {
                    driver.drive(rest, Sink::combined(callback));
                    Outcome::Done
                }
                Paradigm::Promise => {
                    let promise = promises.create(Box::new(move |settler| {
                        driver.drive(rest, Sink::settler(settler));
                    }));
                    Outcome::Promise(promise)
                }
                Paradigm::Deferred => {
                    let deferred = deferreds.defer();
                    driver.drive(rest, Sink::deferred(&deferred));
                    Outcome::Promise(deferred.promise())
                }
            }
        })
    }
}

/// Build a wrapper converting `original` from `source` to `target`.
///
/// For promise targets the injected `provider` takes precedence over the
/// engines' default. Deferred targets always use the engines' deferred
/// provider and ignore `provider`.
pub fn make(
    original: Callable,
    scope: Scope,
    source: Paradigm,
    target: Paradigm,
    engines: &Engines,
    provider: Option<Arc<dyn PromiseProvider>>,
) -> Result<Callable> {
    let entry = ConversionEntry::new(source, target)?;
    let promises = engines.promise_for(provider);
    let deferreds = engines.deferred.clone();

    if target.is_eventual() {
        debug!(
            "Building {} -> {} wrapper (promise engine: {}, deferred engine: {})",
            source,
            target,
            promises.name(),
            deferreds.name()
        );
    } else {
        debug!("Building {} -> {} wrapper", source, target);
    }

    Ok(entry.build(
        move |args| signature::parse(target, args),
        original,
        scope,
        promises,
        deferreds,
    ))
}

fn first(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Null)
}

/// Target-side completion channel
#[derive(Clone, Debug)]
struct Sink {
    on_success: Handler,
    on_failure: Handler,
}

impl Sink {
    /// Separate success and failure handlers. Callback-based sources receive
    /// these handlers as-is.
    fn split(target: Paradigm, callback: Option<Handler>, errback: Option<Handler>) -> Self {
        Sink {
            on_success: callback.unwrap_or_else(|| missing_handler(target, "success")),
            on_failure: errback.unwrap_or_else(|| missing_handler(target, "failure")),
        }
    }

    /// A single `(error, result)` handler. Falsy failures are reported as `true`.
    fn combined(callback: Option<Handler>) -> Self {
        let callback = callback.unwrap_or_else(|| missing_handler(Paradigm::Modern, "combined"));
        let on_failure = {
            let callback = callback.clone();
            Handler::new(move |args| {
                let error = first(args);
                let error = if is_truthy(&error) { error } else { Value::Bool(true) };
                callback.call(vec![error, Value::Null]);
            })
        };
        let on_success = Handler::new(move |args| callback.call(vec![Value::Null, first(args)]));
        Sink { on_success, on_failure }
    }

    fn settler(settler: Settler) -> Self {
        let rejecter = settler.clone();
        Sink {
            on_success: Handler::new(move |args| {
                settler.resolve(first(args));
            }),
            on_failure: Handler::new(move |args| {
                rejecter.reject(first(args));
            }),
        }
    }

    fn deferred(deferred: &Deferred) -> Self {
        let resolver = deferred.clone();
        let rejecter = deferred.clone();
        Sink {
            on_success: Handler::new(move |args| {
                resolver.resolve(first(args));
            }),
            on_failure: Handler::new(move |args| {
                rejecter.reject(first(args));
            }),
        }
    }
}

fn missing_handler(target: Paradigm, role: &str) -> Handler {
    warn!(
        "{} wrapper called without a {} handler; that completion will be dropped",
        target, role
    );
    Handler::noop()
}

/// Source-side invocation of the original function
struct Driver {
    original: Callable,
    scope: Scope,
    source: Paradigm,
}

impl Driver {
    fn drive(self, mut args: Vec<Arg>, sink: Sink) {
        let Sink { on_success, on_failure } = sink;

        match self.source {
            Paradigm::Classical => {
                args.push(Arg::Handler(on_success));
                args.push(Arg::Handler(on_failure));
                self.original.invoke(&self.scope, args);
            }
            Paradigm::Baroque => {
                args.push(Arg::Handler(on_failure));
                args.push(Arg::Handler(on_success));
                self.original.invoke(&self.scope, args);
            }
            Paradigm::Modern => {
                args.push(Arg::handler(move |params| {
                    let mut params = params.into_iter();
                    let error = params.next().unwrap_or(Value::Null);
                    let result = params.next().unwrap_or(Value::Null);
                    if is_truthy(&error) {
                        on_failure.call(vec![error]);
                    } else {
                        on_success.call(vec![result]);
                    }
                }));
                self.original.invoke(&self.scope, args);
            }
            Paradigm::Promise => match self.original.invoke(&self.scope, args).into_promise() {
                Some(promise) => {
                    promise.then(
                        move |value| on_success.call(vec![value]),
                        move |reason| on_failure.call(vec![reason]),
                    );
                }
                None => Self::no_eventual_value(self.source, &on_failure),
            },
            Paradigm::Deferred => match self.original.invoke(&self.scope, args).into_promise() {
                Some(promise) => {
                    promise
                        .on_success(move |value| on_success.call(vec![value]))
                        .fail(move |reason| on_failure.call(vec![reason]));
                }
                None => Self::no_eventual_value(self.source, &on_failure),
            },
        }
    }

    fn no_eventual_value(source: Paradigm, on_failure: &Handler) {
        warn!("{} source returned no eventual value", source);
        on_failure.call(vec![Value::String(NO_EVENTUAL_VALUE.to_string())]);
    }
}
