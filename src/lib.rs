//! Memoizing function proxies.
//!
//! [`wrap`] turns a function into a proxy that remembers the result of every
//! distinct argument tuple it was called with. Results live in a [`Trie`] with
//! one level per argument, which makes it possible to invalidate all calls
//! sharing a leading set of arguments through the [`CacheControl`] handle.
//!
//! ```
//! use std::cell::Cell;
//!
//! let calls = Cell::new(0);
//! let (area, cache) = memotrie::wrap(|w: u32, h: u32| {
//!     calls.set(calls.get() + 1);
//!     w * h
//! })
//! .unwrap();
//!
//! assert_eq!(area.call((3, 4)), 12);
//! assert_eq!(area.call((3, 4)), 12);
//! assert_eq!(calls.get(), 1);
//!
//! // Forget everything that was computed with a width of three.
//! cache.remove((3,));
//! assert_eq!(area.call((3, 4)), 12);
//! assert_eq!(calls.get(), 2);
//! ```
//!
//! Arguments are turned into cache keys through the [`Normalize`] trait.
//! Types without a stable notion of equality, like hash maps, fail loudly
//! instead of silently bypassing the cache.

mod error;
mod function;
mod key;
mod memoize;
mod trie;
mod value;

#[cfg(feature = "testing")]
mod testing;

pub use crate::error::{DynError, KeyError, Rejected, StubError, WrapError};
pub use crate::function::{Arguments, Function, Signature};
pub use crate::key::{Key, Normalize, Rest};
pub use crate::memoize::{raise, wrap, CacheControl, Memoized};
pub use crate::trie::Trie;
pub use crate::value::{DynFunc, Value};

#[cfg(feature = "macros")]
pub use memotrie_macros::memoize;

/// These are implementation details. Do not rely on them!
#[doc(hidden)]
pub mod internal {
    pub use crate::memoize::{cached, Cache};

    #[cfg(feature = "testing")]
    pub use crate::testing::last_was_hit;
}
