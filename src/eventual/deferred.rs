use serde_json::Value;

use super::{Promise, Settler};

/// Explicit resolve/reject controller paired with its promise
#[derive(Clone, Debug)]
pub struct Deferred {
    settler: Settler,
    promise: Promise,
}

impl Deferred {
    pub fn new() -> Self {
        let (promise, settler) = Promise::pending();
        Self { settler, promise }
    }

    pub fn resolve(&self, value: Value) -> bool {
        self.settler.resolve(value)
    }

    pub fn reject(&self, reason: Value) -> bool {
        self.settler.reject(reason)
    }

    /// The eventual value controlled by this deferred
    pub fn promise(&self) -> Promise {
        self.promise.clone()
    }
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deferred_controls_its_promise() {
        let deferred = Deferred::new();
        let promise = deferred.promise();
        assert!(!promise.is_settled());

        deferred.reject(json!("nope"));
        assert_eq!(promise.peek(), Some(Err(json!("nope"))));
        assert!(!deferred.resolve(json!("too late")));
    }
}
