extern crate proc_macro;

macro_rules! bail {
    ($item:expr, $fmt:literal $($tts:tt)*) => {
        return Err(Error::new_spanned(
            &$item,
            format!(concat!("memotrie: ", $fmt) $($tts)*)
        ))
    }
}

mod memoize;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_quote, Error, Result};

/// Memoize a function.
///
/// The function keeps its signature. Every distinct tuple of arguments is
/// computed once and then served from a cache that lives as long as the
/// program. The macro also generates a `<name>_cache()` function returning
/// the cache's `CacheControl`, which allows clearing it or removing all
/// results for a prefix of the arguments.
///
/// ```ignore
/// #[memoize]
/// fn fib(n: u64) -> u64 {
///     if n < 2 { n } else { fib(n - 1) + fib(n - 2) }
/// }
///
/// fib(80);
/// fib_cache().remove((80,));
/// ```
///
/// Only free functions with at least one parameter and a return value are
/// supported. The cache and the control function are emitted next to the
/// function, so the attribute cannot be used inside an `impl` block. A
/// function that mentions `Self` is rejected for that reason. Arguments must implement `Normalize` and the return type must be
/// `Clone + Send + 'static`.
#[proc_macro_attribute]
pub fn memoize(_: TokenStream, stream: TokenStream) -> TokenStream {
    let func = syn::parse_macro_input!(stream as syn::ItemFn);
    memoize::expand(func)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
