//! Error types for paradigm conversion

use thiserror::Error;

use crate::paradigm::Paradigm;

/// Errors raised while building a conversion.
///
/// Failures of a wrapped function at call time never show up here: they are
/// routed into the target paradigm's own failure channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("first argument must be a function or a mapping, got {0}")]
    InvalidTarget(String),

    #[error("unknown paradigm ({0})")]
    UnknownParadigm(String),

    #[error("trying to shift a function to the same paradigm ({0})")]
    SameParadigm(Paradigm),

    #[error("process-wide engines were already installed")]
    EnginesAlreadyInstalled,

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
