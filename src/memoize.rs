use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, LazyLock, Weak};

use parking_lot::Mutex;

use crate::error::{DynError, KeyError, Rejected, StubError, WrapError};
use crate::function::{Arguments, Function, Signature};
use crate::trie::Trie;

/// Memoize a function.
///
/// Returns a proxy that calls `func` at most once per distinct argument tuple,
/// together with a handle to the proxy's cache. If `func` cannot be memoized,
/// it is handed back unchanged inside the [`Rejected`] error.
///
/// ```
/// let (square, cache) = memotrie::wrap(|x: u64| x * x).unwrap();
/// assert_eq!(square.call((12,)), 144);
/// assert_eq!(square.call((12,)), 144);
/// assert_eq!(cache.len(), 1);
/// ```
#[allow(clippy::type_complexity)]
pub fn wrap<F, A>(func: F) -> Result<(Memoized<F, A>, CacheControl<F::Output>), Rejected<F>>
where
    F: Function<A>,
    A: Arguments,
    F::Output: Clone,
{
    let kind = match func.signature() {
        None => WrapError::NotCallable,
        Some(signature) if signature.params == 0 => WrapError::MissingParameters,
        Some(signature) if signature.returns == 0 => WrapError::MissingReturns,
        Some(signature) => {
            let slot = Arc::new(Mutex::new(Trie::new()));
            let cache = CacheControl::new(&slot);
            return Ok((Memoized { func, slot, signature, args: PhantomData }, cache));
        }
    };

    Err(Rejected { func, kind })
}

/// A memoizing proxy for a function.
///
/// Calls with an argument tuple that was seen before return a clone of the
/// stored result without calling the function. The cache is guarded by a
/// lock that is released while the function runs, so the function may call
/// its own proxy recursively.
pub struct Memoized<F, A>
where
    F: Function<A>,
{
    func: F,
    slot: Arc<Mutex<Trie<F::Output>>>,
    signature: Signature,
    args: PhantomData<fn(A)>,
}

impl<F, A> Memoized<F, A>
where
    F: Function<A>,
    A: Arguments,
    F::Output: Clone,
{
    /// Call the function or return the result of an earlier identical call.
    ///
    /// Panics with a [`KeyError`] payload if an argument cannot be used as a
    /// cache key.
    pub fn call(&self, args: A) -> F::Output {
        match self.try_call(args) {
            Ok(output) => output,
            Err(err) => panic::panic_any(err),
        }
    }

    /// Like [`call`](Self::call), but reports unusable arguments as an error.
    pub fn try_call(&self, args: A) -> Result<F::Output, KeyError> {
        memoized(&self.slot, args, |args| self.func.invoke(args))
    }
}

impl<F, A> Memoized<F, A>
where
    F: Function<A>,
{
    /// The call shape of the wrapped function.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// A handle to this proxy's cache.
    pub fn cache(&self) -> CacheControl<F::Output> {
        CacheControl::new(&self.slot)
    }

    /// Discard the cache and return the wrapped function.
    pub fn into_inner(self) -> F {
        self.func
    }
}

impl<F, A> Debug for Memoized<F, A>
where
    F: Function<A>,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("signature", &self.signature)
            .field("cached", &self.slot.lock().len())
            .finish_non_exhaustive()
    }
}

/// Controls the cache of a memoized function.
///
/// The handle does not keep the cache alive. Once the proxy is dropped, all
/// operations do nothing.
pub struct CacheControl<R> {
    slot: Weak<Mutex<Trie<R>>>,
}

impl<R> CacheControl<R> {
    fn new(slot: &Arc<Mutex<Trie<R>>>) -> Self {
        Self { slot: Arc::downgrade(slot) }
    }

    /// Drop all memoized results.
    pub fn clear(&self) {
        if let Some(slot) = self.slot.upgrade() {
            slot.lock().clear();
            tracing::debug!("cleared memoization cache");
        }
    }

    /// Drop the results of all calls whose arguments start with `prefix`.
    ///
    /// The prefix is a tuple of raw arguments, e.g. `(1, "x")`. Prefixes that
    /// were never used or are longer than the function's arity are ignored.
    /// Panics with a [`KeyError`] payload if an argument cannot be used as a
    /// cache key.
    pub fn remove<P: Arguments>(&self, prefix: P) {
        if let Err(err) = self.try_remove(prefix) {
            panic::panic_any(err);
        }
    }

    /// Like [`remove`](Self::remove), but reports unusable arguments as an
    /// error.
    pub fn try_remove<P: Arguments>(&self, prefix: P) -> Result<(), KeyError> {
        let keys = prefix.keys()?;
        if let Some(slot) = self.slot.upgrade() {
            slot.lock().remove(&keys);
            tracing::debug!(positions = keys.len(), "removed memoized prefix");
        }
        Ok(())
    }

    /// The number of memoized results.
    pub fn len(&self) -> usize {
        self.slot.upgrade().map_or(0, |slot| slot.lock().len())
    }

    /// Whether there are no memoized results.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R> Clone for CacheControl<R> {
    fn clone(&self) -> Self {
        Self { slot: self.slot.clone() }
    }
}

impl<R> Debug for CacheControl<R> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad("CacheControl(..)")
    }
}

/// The cache of a function memoized with the attribute macro.
pub struct Cache<R>(LazyLock<Arc<Mutex<Trie<R>>>>);

impl<R> Cache<R> {
    /// Create an empty cache.
    pub const fn new() -> Self {
        Self(LazyLock::new(Self::init as fn() -> _))
    }

    fn init() -> Arc<Mutex<Trie<R>>> {
        Arc::new(Mutex::new(Trie::new()))
    }

    /// A handle to the cache.
    pub fn control(&self) -> CacheControl<R> {
        CacheControl::new(&self.0)
    }
}

impl<R> Default for Cache<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes a function with the given arguments, trying to use a cached
/// result for it. Used by the attribute macro.
pub fn cached<A, R, F>(cache: &Cache<R>, args: A, func: F) -> R
where
    A: Arguments,
    R: Clone,
    F: FnOnce(A) -> R,
{
    match memoized(&cache.0, args, func) {
        Ok(output) => output,
        Err(err) => panic::panic_any(err),
    }
}

/// Panic with a structured error.
///
/// When this happens inside a memoized function, the proxy re-raises the error
/// wrapped in a [`StubError`].
pub fn raise<E>(err: E) -> !
where
    E: std::error::Error + Send + Sync + 'static,
{
    panic::panic_any(DynError::from(err))
}

/// Look up the arguments in the cache and call `func` on a miss.
fn memoized<A, R, F>(slot: &Mutex<Trie<R>>, args: A, func: F) -> Result<R, KeyError>
where
    A: Arguments,
    R: Clone,
    F: FnOnce(A) -> R,
{
    let keys = args.keys()?;

    // The lock must not be held while `func` runs: it may call back into the
    // same cache.
    let hit = slot.lock().lookup(&keys);
    if let Some(output) = hit {
        tracing::trace!(positions = keys.len(), "memoized call hit");

        #[cfg(feature = "testing")]
        crate::testing::register_hit();

        return Ok(output);
    }

    let output = invoke(func, args);
    slot.lock().store(&keys, output.clone());
    tracing::trace!(positions = keys.len(), "memoized call miss");

    #[cfg(feature = "testing")]
    crate::testing::register_miss();

    Ok(output)
}

/// Call `func`, annotating structured panics that escape it.
fn invoke<A, R, F>(func: F, args: A) -> R
where
    F: FnOnce(A) -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(|| func(args))) {
        Ok(output) => output,
        Err(payload) => panic::resume_unwind(annotate(payload)),
    }
}

/// Wrap structured error payloads in a [`StubError`]. Anything else passes
/// through untouched.
fn annotate(payload: Box<dyn Any + Send>) -> Box<dyn Any + Send> {
    match payload.downcast::<DynError>() {
        Ok(source) => Box::new(StubError::new(*source)),
        Err(payload) => payload,
    }
}
