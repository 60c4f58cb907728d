use std::cell::Cell;

thread_local! {
    /// The outcome of the last memoized call on this thread, `true` for a hit.
    static LAST_WAS_HIT: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Whether the last memoized call on this thread was served from the cache.
///
/// Panics if no memoized call happened on this thread yet.
pub fn last_was_hit() -> bool {
    LAST_WAS_HIT
        .get()
        .expect("no memoized call happened on this thread")
}

pub(crate) fn register_hit() {
    LAST_WAS_HIT.set(Some(true));
}

pub(crate) fn register_miss() {
    LAST_WAS_HIT.set(Some(false));
}
