//! Asynchronous calling conventions
//!
//! The closed set of paradigms a function can be converted from and to.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConversionError;

/// A named asynchronous calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Paradigm {
    /// `(...args, on_ok, on_err)`
    Classical,
    /// `(...args, on_err, on_ok)`
    Baroque,
    /// `(...args, |err, result| ..)`
    Modern,
    /// Returns an eventual value
    Promise,
    /// Returns the eventual value of a resolve/reject controller
    Deferred,
}

/// Every recognized paradigm, in canonical order.
pub const PARADIGMS: [Paradigm; 5] = [
    Paradigm::Classical,
    Paradigm::Baroque,
    Paradigm::Modern,
    Paradigm::Promise,
    Paradigm::Deferred,
];

/// Names accepted by [`Paradigm::from_str`], in the same order as [`PARADIGMS`].
pub const PARADIGM_NAMES: [&str; 5] = ["classical", "baroque", "modern", "promise", "deferred"];

impl Paradigm {
    pub fn name(&self) -> &'static str {
        match self {
            Paradigm::Classical => "classical",
            Paradigm::Baroque => "baroque",
            Paradigm::Modern => "modern",
            Paradigm::Promise => "promise",
            Paradigm::Deferred => "deferred",
        }
    }

    /// Whether functions of this paradigm take completion handlers as trailing arguments
    pub fn uses_handlers(&self) -> bool {
        matches!(self, Paradigm::Classical | Paradigm::Baroque | Paradigm::Modern)
    }

    /// Whether functions of this paradigm return an eventual value
    pub fn is_eventual(&self) -> bool {
        !self.uses_handlers()
    }
}

impl FromStr for Paradigm {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PARADIGMS
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConversionError::UnknownParadigm(s.to_string()))
    }
}

impl std::fmt::Display for Paradigm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
