use std::any::TypeId;

use crate::error::KeyError;
use crate::key::{Key, Normalize};

/// The call shape of a memoizable function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    /// The number of declared parameters. A variadic parameter counts once.
    pub params: usize,
    /// Whether the function takes trailing variadic arguments.
    pub variadic: bool,
    /// The number of returned values. A `()` return counts as zero.
    pub returns: usize,
}

/// The argument tuple of a call.
///
/// This is implemented for tuples up to length twelve whose elements are
/// [`Normalize`], and for the argument lists of dynamic functions.
pub trait Arguments {
    /// Normalize the arguments into one key per tuple position.
    fn keys(&self) -> Result<Vec<Key>, KeyError>;
}

/// Something that can be called with arguments of type `Args`.
///
/// This is implemented for closures, function items and function pointers
/// taking up to twelve parameters, and for dynamic [`Value`](crate::Value)s.
pub trait Function<Args> {
    /// The returned value.
    type Output;

    /// The call shape or `None` if the value cannot be called at all.
    fn signature(&self) -> Option<Signature>;

    /// Call the function.
    fn invoke(&self, args: Args) -> Self::Output;
}

/// Count the values returned by a function with output type `T`.
fn returns<T: 'static>() -> usize {
    if TypeId::of::<T>() == TypeId::of::<()>() { 0 } else { 1 }
}

macro_rules! function {
    ($($param:ident $idx:tt),*) => {
        #[allow(unused_mut)]
        impl<$($param: Normalize),*> Arguments for ($($param,)*) {
            fn keys(&self) -> Result<Vec<Key>, KeyError> {
                let mut keys = Vec::new();
                $(self.$idx.flatten(&mut keys)?;)*
                Ok(keys)
            }
        }

        #[allow(unused_variables)]
        impl<Func, Out, $($param),*> Function<($($param,)*)> for Func
        where
            Func: Fn($($param),*) -> Out,
            Out: 'static,
            $($param: Normalize,)*
        {
            type Output = Out;

            fn signature(&self) -> Option<Signature> {
                let params: &[usize] = &[$($idx),*];
                Some(Signature {
                    params: params.len(),
                    variadic: false $(|| $param::VARIADIC)*,
                    returns: returns::<Out>(),
                })
            }

            fn invoke(&self, args: ($($param,)*)) -> Out {
                self($(args.$idx),*)
            }
        }
    };
}

function! {}
function! { A 0 }
function! { A 0, B 1 }
function! { A 0, B 1, C 2 }
function! { A 0, B 1, C 2, D 3 }
function! { A 0, B 1, C 2, D 3, E 4 }
function! { A 0, B 1, C 2, D 3, E 4, F 5 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10 }
function! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11 }
