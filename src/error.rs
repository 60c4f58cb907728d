use std::fmt::{self, Debug, Formatter};

use thiserror::Error;

/// A structured error carried by a panic payload.
pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a function cannot be memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum WrapError {
    #[error("not a function")]
    NotCallable,
    #[error("target function must accept at least 1 argument")]
    MissingParameters,
    #[error("target function must return at least 1 value")]
    MissingReturns,
}

/// A function that [`wrap`](crate::wrap) refused to memoize.
///
/// Hands the original function back so that the caller can keep using it
/// uncached.
#[derive(Error)]
#[error("{kind}")]
pub struct Rejected<F> {
    /// The function, unchanged.
    pub func: F,
    /// The reason for the rejection.
    pub kind: WrapError,
}

impl<F> Debug for Rejected<F> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Rejected").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// An argument could not be turned into a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("unsupported key type: {type_name}")]
    Unsupported { type_name: &'static str },
}

/// A structured panic that escaped a memoized function.
///
/// The original error stays available as the [`source`](std::error::Error::source).
#[derive(Debug, Error)]
#[error("panic in memoized function")]
pub struct StubError {
    #[source]
    source: DynError,
}

impl StubError {
    pub(crate) fn new(source: DynError) -> Self {
        Self { source }
    }

    /// The error the memoized function panicked with.
    pub fn into_source(self) -> DynError {
        self.source
    }
}
