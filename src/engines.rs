//! Engine Context
//!
//! The promise and deferred providers a conversion uses when its target is an
//! eventual-value paradigm. Conversions carry an explicit [`Engines`] value or
//! fall back to the process-wide one, which can be installed once at start-up.

use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::config::{PromiseEngine, ShiftConfig};
use crate::error::{ConversionError, Result};
use crate::eventual::{
    DeferredProvider, InlinePromiseProvider, PromiseProvider, StandardDeferredProvider,
    TokioPromiseProvider,
};

/// Default providers for promise and deferred targets
#[derive(Clone)]
pub struct Engines {
    pub promise: Arc<dyn PromiseProvider>,
    pub deferred: Arc<dyn DeferredProvider>,
}

static INSTALLED: OnceLock<Engines> = OnceLock::new();

lazy_static::lazy_static! {
    /// Built-in engines used when nothing was installed
    static ref SYSTEM_ENGINES: Engines = Engines::system();
}

impl Engines {
    pub fn new(promise: Arc<dyn PromiseProvider>, deferred: Arc<dyn DeferredProvider>) -> Self {
        Self { promise, deferred }
    }

    /// Inline promises and standard deferreds
    pub fn system() -> Self {
        Self::new(Arc::new(InlinePromiseProvider), Arc::new(StandardDeferredProvider))
    }

    pub fn from_config(config: &ShiftConfig) -> Self {
        let promise: Arc<dyn PromiseProvider> = match config.promise_engine {
            PromiseEngine::Inline => Arc::new(InlinePromiseProvider),
            PromiseEngine::Tokio => Arc::new(TokioPromiseProvider),
        };
        Self::system().with_promise(promise)
    }

    pub fn with_promise(mut self, promise: Arc<dyn PromiseProvider>) -> Self {
        self.promise = promise;
        self
    }

    /// Install the process-wide engines. Only the first call succeeds.
    pub fn install(engines: Engines) -> Result<()> {
        let summary = format!("{:?}", engines);
        INSTALLED
            .set(engines)
            .map_err(|_| ConversionError::EnginesAlreadyInstalled)?;
        info!("Installed process-wide engines: {}", summary);
        Ok(())
    }

    /// Installed engines, or the system defaults
    pub fn global() -> Engines {
        INSTALLED.get().unwrap_or(&*SYSTEM_ENGINES).clone()
    }

    /// Provider for a promise target: the injected one wins over the default
    pub(crate) fn promise_for(
        &self,
        injected: Option<Arc<dyn PromiseProvider>>,
    ) -> Arc<dyn PromiseProvider> {
        injected.unwrap_or_else(|| self.promise.clone())
    }
}

impl Default for Engines {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Engines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engines")
            .field("promise", &self.promise.name())
            .field("deferred", &self.deferred.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_engines() {
        let engines = Engines::system();
        assert_eq!(engines.promise.name(), "inline");
        assert_eq!(engines.deferred.name(), "standard");
    }

    #[test]
    fn test_from_config_selects_promise_engine() {
        let config = ShiftConfig {
            promise_engine: PromiseEngine::Tokio,
            ..Default::default()
        };
        let engines = Engines::from_config(&config);
        assert_eq!(engines.promise.name(), "tokio");
        assert_eq!(engines.deferred.name(), "standard");
    }

    #[test]
    fn test_injected_provider_wins() {
        let engines = Engines::system();
        assert_eq!(engines.promise_for(None).name(), "inline");
        let injected: Arc<dyn PromiseProvider> = Arc::new(TokioPromiseProvider);
        assert_eq!(engines.promise_for(Some(injected)).name(), "tokio");
    }

    #[test]
    fn test_debug_lists_provider_names() {
        let rendered = format!("{:?}", Engines::system());
        assert_eq!(rendered, "Engines { promise: \"inline\", deferred: \"standard\" }");
    }
}
