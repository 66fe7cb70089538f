use crate::{
    config::ConfigError,
    db::{op::OpError, scanner::ScanError, statement::StatementError},
    traits::EntityError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// EngineError
///
/// Error produced by the execution engine or one of its row iterators.
/// Carried through untouched so callers can downcast to the engine's own
/// error type.
///

pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// Error
///
/// Top-level error returned by every fallible table, op and scan call.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(EngineError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Op(#[from] OpError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Statement(#[from] StatementError),
}

impl Error {
    /// Wrap an engine failure without altering it.
    pub fn engine(err: impl Into<EngineError>) -> Self {
        Self::Engine(err.into())
    }

    /// True for a single-record read that matched zero rows.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Scan(ScanError::NoRows { .. }))
    }

    /// Borrow the engine's original error, if this is one.
    #[must_use]
    pub fn engine_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Engine(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) | Self::Entity(_) | Self::Op(_) | Self::Statement(_) => {
                ErrorClass::InvalidInput
            }
            Self::Engine(_) => ErrorClass::Engine,
            Self::Scan(ScanError::NoRows { .. }) => ErrorClass::NotFound,
            Self::Scan(ScanError::Decode { .. }) => ErrorClass::Decode,
        }
    }
}

///
/// ErrorClass
///
/// Coarse classification for callers that branch on failure kind.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Decode,
    Engine,
    InvalidInput,
    NotFound,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Decode => "decode",
            Self::Engine => "engine",
            Self::InvalidInput => "invalid_input",
            Self::NotFound => "not_found",
        };
        write!(f, "{label}")
    }
}
