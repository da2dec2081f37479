//! Dynamic Call Model
//!
//! Functions taking part in a conversion receive a positional list of
//! arguments where each slot is either plain data or a completion handler.
//! Keeping the two apart in [`Arg`] is what lets the signature parsers count
//! handler-shaped arguments without guessing.

use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::eventual::{Promise, Settlement};

/// JavaScript-style truthiness of a data value.
///
/// `null`, `false`, `0`, and `""` are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

type HandlerFn = dyn Fn(Vec<Value>) + Send + Sync;

/// A completion handler receiving positional values
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
    noop: bool,
}

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            noop: false,
        }
    }

    /// Handler that ignores its arguments
    pub fn noop() -> Self {
        Self {
            inner: Arc::new(|_| {}),
            noop: true,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.noop
    }

    pub fn call(&self, args: Vec<Value>) {
        (self.inner)(args)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.noop {
            write!(f, "Handler(noop)")
        } else {
            write!(f, "Handler")
        }
    }
}

/// One positional argument of a call
#[derive(Clone, Debug)]
pub enum Arg {
    Value(Value),
    Handler(Handler),
}

impl Arg {
    pub fn value(value: impl Into<Value>) -> Self {
        Arg::Value(value.into())
    }

    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) + Send + Sync + 'static,
    {
        Arg::Handler(Handler::new(f))
    }

    pub fn is_handler(&self) -> bool {
        matches!(self, Arg::Handler(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Handler(_) => None,
        }
    }

    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Arg::Handler(h) => Some(h),
            Arg::Value(_) => None,
        }
    }

    pub fn into_handler(self) -> Option<Handler> {
        match self {
            Arg::Handler(h) => Some(h),
            Arg::Value(_) => None,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<Handler> for Arg {
    fn from(handler: Handler) -> Self {
        Arg::Handler(handler)
    }
}

/// The receiver a function is invoked with (its `this` binding)
#[derive(Clone, Default)]
pub struct Scope(Option<Arc<dyn Any + Send + Sync>>);

impl Scope {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Scope(Some(Arc::new(value)))
    }

    /// The empty receiver
    pub fn unbound() -> Self {
        Scope(None)
    }

    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref()?.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_bound() {
            write!(f, "Scope(bound)")
        } else {
            write!(f, "Scope(unbound)")
        }
    }
}

/// What a call hands back to its caller
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Completion is reported through handlers
    Done,
    /// Completion is reported through the returned eventual value
    Promise(Promise),
}

impl Outcome {
    pub fn into_promise(self) -> Option<Promise> {
        match self {
            Outcome::Promise(p) => Some(p),
            Outcome::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }
}

type CallableFn = dyn Fn(&Scope, Vec<Arg>) -> Outcome + Send + Sync;

/// A function of any paradigm, original or converted
#[derive(Clone)]
pub struct Callable {
    inner: Arc<CallableFn>,
}

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Scope, Vec<Arg>) -> Outcome + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Promise-paradigm function backed by a native async closure
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&Scope, Vec<Arg>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Settlement> + Send + 'static,
    {
        Callable::new(move |scope, args| Outcome::Promise(Promise::from_future(f(scope, args))))
    }

    pub fn invoke(&self, scope: &Scope, args: Vec<Arg>) -> Outcome {
        (self.inner)(scope, args)
    }

    /// Invoke with the unbound scope
    pub fn call(&self, args: Vec<Arg>) -> Outcome {
        self.invoke(&Scope::unbound(), args)
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(!is_truthy(&falsy), "{} should be falsy", falsy);
        }
        for truthy in [json!(true), json!(1), json!("0"), json!([]), json!({})] {
            assert!(is_truthy(&truthy), "{} should be truthy", truthy);
        }
    }

    #[test]
    fn test_handler_receives_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let handler = Handler::new(move |args| s.lock().unwrap().extend(args));
        handler.call(vec![json!(1), json!("two")]);
        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!("two")]);
        assert!(!handler.is_noop());
        assert!(Handler::noop().is_noop());
    }

    #[test]
    fn test_arg_classification() {
        let data = Arg::value("x");
        let cb = Arg::handler(|_| {});
        assert!(!data.is_handler());
        assert_eq!(data.as_value(), Some(&json!("x")));
        assert!(cb.is_handler());
        assert!(cb.clone().into_handler().is_some());
        assert!(data.into_handler().is_none());
    }

    #[test]
    fn test_scope_downcast() {
        struct Db {
            name: &'static str,
        }
        let scope = Scope::new(Db { name: "main" });
        assert!(scope.is_bound());
        assert_eq!(scope.downcast_ref::<Db>().map(|d| d.name), Some("main"));
        assert!(scope.downcast_ref::<String>().is_none());
        assert!(!Scope::unbound().is_bound());
    }

    #[test]
    fn test_callable_sees_scope() {
        let f = Callable::new(|scope, args| {
            let prefix = scope.downcast_ref::<String>().cloned().unwrap_or_default();
            if let Some(Arg::Handler(cb)) = args.last() {
                cb.call(vec![json!(format!("{}{}", prefix, args.len()))]);
            }
            Outcome::Done
        });

        let seen = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let outcome = f.invoke(
            &Scope::new("n=".to_string()),
            vec![Arg::value(1), Arg::handler(move |a| *s.lock().unwrap() = a.first().cloned())],
        );
        assert!(outcome.is_done());
        assert_eq!(*seen.lock().unwrap(), Some(json!("n=2")));
    }

    #[tokio::test]
    async fn test_from_async_returns_promise() {
        let f = Callable::from_async(|_, args| {
            let n = args.len();
            async move { Ok(json!(n)) }
        });
        let promise = f.call(vec![Arg::value(1), Arg::value(2)]).into_promise().unwrap();
        assert_eq!(promise.await, Ok(json!(2)));
    }
}
