//! Public Conversion API
//!
//! ```ignore
//! let read = convert(legacy_read, Scope::unbound())?
//!     .from("classical")?
//!     .to("promise", None)?
//!     .into_function();
//! ```

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::callable::{Callable, Scope};
use crate::engines::Engines;
use crate::error::{ConversionError, Result};
use crate::eventual::PromiseProvider;
use crate::matrix;
use crate::paradigm::Paradigm;

/// Anything that can be handed to [`convert`]
#[derive(Clone, Debug)]
pub enum Member {
    Function(Callable),
    Mapping(BTreeMap<String, Member>),
    Value(Value),
}

impl Member {
    fn describe(&self) -> &'static str {
        match self {
            Member::Function(_) => "function",
            Member::Mapping(_) => "mapping",
            Member::Value(Value::Null) => "null",
            Member::Value(Value::Bool(_)) => "boolean",
            Member::Value(Value::Number(_)) => "number",
            Member::Value(Value::String(_)) => "string",
            Member::Value(Value::Array(_)) => "array",
            Member::Value(Value::Object(_)) => "object",
        }
    }
}

impl From<Callable> for Member {
    fn from(f: Callable) -> Self {
        Member::Function(f)
    }
}

impl From<Value> for Member {
    fn from(v: Value) -> Self {
        Member::Value(v)
    }
}

impl From<BTreeMap<String, Member>> for Member {
    fn from(map: BTreeMap<String, Member>) -> Self {
        Member::Mapping(map)
    }
}

/// Result of a conversion: one wrapper, or one wrapper per callable entry
#[derive(Clone, Debug)]
pub enum Converted {
    Function(Callable),
    Mapping(BTreeMap<String, Callable>),
}

impl Converted {
    pub fn function(&self) -> Option<&Callable> {
        match self {
            Converted::Function(f) => Some(f),
            Converted::Mapping(_) => None,
        }
    }

    pub fn into_function(self) -> Option<Callable> {
        match self {
            Converted::Function(f) => Some(f),
            Converted::Mapping(_) => None,
        }
    }

    pub fn mapping(&self) -> Option<&BTreeMap<String, Callable>> {
        match self {
            Converted::Mapping(m) => Some(m),
            Converted::Function(_) => None,
        }
    }

    /// Converted entry of a mapping by key
    pub fn get(&self, key: &str) -> Option<&Callable> {
        self.mapping()?.get(key)
    }
}

#[derive(Clone)]
enum Target {
    Function(Callable),
    Mapping(Vec<(String, Callable)>),
}

/// A validated conversion target awaiting its source paradigm
#[derive(Clone)]
pub struct Conversion {
    target: Target,
    scope: Scope,
    engines: Option<Engines>,
}

/// Start a conversion of a function or a mapping of functions.
///
/// Fails with [`ConversionError::InvalidTarget`] unless `target` is a
/// function, a mapping, or a JSON object (a mapping without functions).
pub fn convert(target: impl Into<Member>, scope: Scope) -> Result<Conversion> {
    let target = match target.into() {
        Member::Function(f) => Target::Function(f),
        Member::Mapping(entries) => Target::Mapping(
            entries
                .into_iter()
                .filter_map(|(key, member)| match member {
                    Member::Function(f) => Some((key, f)),
                    _ => None,
                })
                .collect(),
        ),
        Member::Value(Value::Object(_)) => Target::Mapping(Vec::new()),
        other => return Err(ConversionError::InvalidTarget(other.describe().to_string())),
    };

    Ok(Conversion {
        target,
        scope,
        engines: None,
    })
}

impl Conversion {
    /// Use these engines instead of the process-wide ones
    pub fn with_engines(mut self, engines: Engines) -> Self {
        self.engines = Some(engines);
        self
    }

    /// Declare the source paradigm by name
    pub fn from(self, paradigm: &str) -> Result<FromParadigm> {
        let source = paradigm.parse::<Paradigm>()?;
        Ok(self.from_paradigm(source))
    }

    pub fn from_paradigm(self, source: Paradigm) -> FromParadigm {
        FromParadigm {
            conversion: self,
            source,
        }
    }
}

/// A conversion with a known source paradigm
#[derive(Clone)]
pub struct FromParadigm {
    conversion: Conversion,
    source: Paradigm,
}

impl FromParadigm {
    pub fn source(&self) -> Paradigm {
        self.source
    }

    /// Declare the target paradigm by name and build the wrapper(s).
    ///
    /// `provider` is used for promise targets only; deferred targets always
    /// use the default deferred provider.
    pub fn to(&self, paradigm: &str, provider: Option<Arc<dyn PromiseProvider>>) -> Result<Converted> {
        let target = paradigm.parse::<Paradigm>()?;
        self.to_paradigm(target, provider)
    }

    #[tracing::instrument(skip(self, target, provider), fields(from = %self.source, to = %target))]
    pub fn to_paradigm(
        &self,
        target: Paradigm,
        provider: Option<Arc<dyn PromiseProvider>>,
    ) -> Result<Converted> {
        if target == self.source {
            return Err(ConversionError::SameParadigm(target));
        }

        let engines = self.conversion.engines.clone().unwrap_or_else(Engines::global);
        let scope = &self.conversion.scope;
        let source = self.source;

        match &self.conversion.target {
            Target::Function(f) => {
                let wrapped = matrix::make(f.clone(), scope.clone(), source, target, &engines, provider)?;
                Ok(Converted::Function(wrapped))
            }
            Target::Mapping(entries) => {
                let mut shifted = BTreeMap::new();
                for (key, f) in entries {
                    let wrapped = matrix::make(
                        f.clone(),
                        scope.clone(),
                        source,
                        target,
                        &engines,
                        provider.clone(),
                    )?;
                    shifted.insert(key.clone(), wrapped);
                }
                debug!("Converted {} mapping entries", shifted.len());
                Ok(Converted::Mapping(shifted))
            }
        }
    }
}
