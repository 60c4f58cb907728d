use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::KeyError;

/// A normalized argument, usable as one level of a cache key.
///
/// Integers compare by value across widths and signedness, so `1u32` and
/// `1i64` produce the same key. Only dynamic unsigned values use `Uint`. Variable-length sequences (`Vec<T>`, `[T]`),
/// fixed-length arrays and tuples each have their own variant: a slice and a
/// tuple holding the same elements never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Unit,
    Bool(bool),
    Int(i128),
    /// An unsigned integer too large for `Int`.
    U128(u128),
    /// An unsigned dynamic integer. Dynamic values carry their signedness, so
    /// it never equals an `Int` key.
    Uint(u64),
    /// The bit pattern of an `f64`, with `-0.0` folded onto `0.0`.
    Float(u64),
    Char(char),
    Str(Box<str>),
    Option(Option<Box<Key>>),
    /// A variable-length sequence.
    Seq(Box<[Key]>),
    /// A fixed-length array.
    Array(Box<[Key]>),
    Tuple(Box<[Key]>),
}

impl Key {
    /// The key of a floating point number.
    pub fn float(value: f64) -> Self {
        let value = if value == 0.0 { 0.0 } else { value };
        Self::Float(value.to_bits())
    }

    /// The key of an unsigned integer.
    pub fn unsigned(value: u128) -> Self {
        i128::try_from(value).map_or(Self::U128(value), Self::Int)
    }
}

/// Converts an argument into a [`Key`].
///
/// Implemented for primitives, strings, sequences, arrays, options and
/// tuples up to length twelve. Maps and sets implement it too, but always
/// fail with [`KeyError::Unsupported`]: they have no stable element order to
/// key on.
pub trait Normalize {
    /// Whether the value occupies a variable number of tuple positions.
    const VARIADIC: bool = false;

    /// Normalize the value into a single key.
    fn normalize(&self) -> Result<Key, KeyError>;

    /// Push the keys of all tuple positions this value occupies.
    fn flatten(&self, keys: &mut Vec<Key>) -> Result<(), KeyError> {
        keys.push(self.normalize()?);
        Ok(())
    }
}

impl Normalize for Key {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(self.clone())
    }
}

impl Normalize for () {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::Unit)
    }
}

impl Normalize for bool {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::Bool(*self))
    }
}

impl Normalize for char {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::Char(*self))
    }
}

impl Normalize for f32 {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::float(f64::from(*self)))
    }
}

impl Normalize for f64 {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::float(*self))
    }
}

macro_rules! signed {
    ($($ty:ty),*) => {$(
        impl Normalize for $ty {
            fn normalize(&self) -> Result<Key, KeyError> {
                Ok(Key::Int(*self as i128))
            }
        }
    )*};
}

macro_rules! unsigned {
    ($($ty:ty),*) => {$(
        impl Normalize for $ty {
            fn normalize(&self) -> Result<Key, KeyError> {
                Ok(Key::unsigned(*self as u128))
            }
        }
    )*};
}

signed!(i8, i16, i32, i64, i128, isize);
unsigned!(u8, u16, u32, u64, u128, usize);

impl Normalize for str {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(Key::Str(self.into()))
    }
}

impl Normalize for String {
    fn normalize(&self) -> Result<Key, KeyError> {
        self.as_str().normalize()
    }
}

impl<T: Normalize + ?Sized> Normalize for &T {
    const VARIADIC: bool = T::VARIADIC;

    fn normalize(&self) -> Result<Key, KeyError> {
        T::normalize(self)
    }

    fn flatten(&self, keys: &mut Vec<Key>) -> Result<(), KeyError> {
        T::flatten(self, keys)
    }
}

macro_rules! pointer {
    ($($ptr:ident),*) => {$(
        impl<T: Normalize + ?Sized> Normalize for $ptr<T> {
            fn normalize(&self) -> Result<Key, KeyError> {
                T::normalize(self)
            }
        }
    )*};
}

pointer!(Box, Rc, Arc);

impl<T: Normalize> Normalize for Option<T> {
    fn normalize(&self) -> Result<Key, KeyError> {
        let inner = self.as_ref().map(T::normalize).transpose()?;
        Ok(Key::Option(inner.map(Box::new)))
    }
}

/// Normalize every element of a sequence.
fn elements<'a, T, I>(items: I) -> Result<Box<[Key]>, KeyError>
where
    T: Normalize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(T::normalize).collect()
}

impl<T: Normalize> Normalize for [T] {
    fn normalize(&self) -> Result<Key, KeyError> {
        elements(self).map(Key::Seq)
    }
}

impl<T: Normalize> Normalize for Vec<T> {
    fn normalize(&self) -> Result<Key, KeyError> {
        self.as_slice().normalize()
    }
}

impl<T: Normalize, const N: usize> Normalize for [T; N] {
    fn normalize(&self) -> Result<Key, KeyError> {
        elements(self).map(Key::Array)
    }
}

macro_rules! unsupported {
    ($($ty:ident<$($param:ident),*>),*) => {$(
        impl<$($param),*> Normalize for $ty<$($param),*> {
            fn normalize(&self) -> Result<Key, KeyError> {
                Err(KeyError::Unsupported { type_name: type_name::<Self>() })
            }
        }
    )*};
}

unsupported!(HashMap<K, V, S>, HashSet<T, S>, BTreeMap<K, V>, BTreeSet<T>);

macro_rules! tuple {
    ($($param:ident $idx:tt),*) => {
        impl<$($param: Normalize),*> Normalize for ($($param,)*) {
            fn normalize(&self) -> Result<Key, KeyError> {
                Ok(Key::Tuple(Box::new([$(self.$idx.normalize()?),*])))
            }
        }
    };
}

tuple! { A 0 }
tuple! { A 0, B 1 }
tuple! { A 0, B 1, C 2 }
tuple! { A 0, B 1, C 2, D 3 }
tuple! { A 0, B 1, C 2, D 3, E 4 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10 }
tuple! { A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7, I 8, J 9, K 10, L 11 }

/// Trailing variadic arguments.
///
/// Every element occupies its own tuple position, so calls that differ only in
/// the number of trailing arguments are cached separately. A plain `Vec<T>`
/// argument, in contrast, is a single position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Rest<T>(pub Vec<T>);

impl<T> Deref for Rest<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for Rest<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for Rest<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: Normalize> Normalize for Rest<T> {
    const VARIADIC: bool = true;

    fn normalize(&self) -> Result<Key, KeyError> {
        self.0.normalize()
    }

    fn flatten(&self, keys: &mut Vec<Key>) -> Result<(), KeyError> {
        for item in &self.0 {
            keys.push(item.normalize()?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_compare_by_value() {
        assert_eq!(1u32.normalize(), 1i64.normalize());
        assert_eq!(u128::MAX.normalize(), Ok(Key::U128(u128::MAX)));
        assert_ne!((-1i8).normalize(), 255u8.normalize());
    }

    #[test]
    fn test_sequence_kinds_are_distinct() {
        let seq = vec![1, 2, 3].normalize().unwrap();
        let array = [1, 2, 3].normalize().unwrap();
        let tuple = (1, 2, 3).normalize().unwrap();
        assert_ne!(seq, array);
        assert_ne!(seq, tuple);
        assert_ne!(array, tuple);
        assert_eq!(seq, [1, 2, 3][..].normalize().unwrap());
    }

    #[test]
    fn test_floats() {
        assert_eq!(0.0f64.normalize(), (-0.0f64).normalize());
        assert_eq!(f64::NAN.normalize(), f64::NAN.normalize());
        assert_eq!(1.5f32.normalize(), 1.5f64.normalize());
    }

    #[test]
    fn test_unsupported() {
        let map: HashMap<String, i32> = HashMap::new();
        match map.normalize() {
            Err(KeyError::Unsupported { type_name }) => assert!(type_name.contains("HashMap")),
            other => panic!("expected an error, got {other:?}"),
        }
        assert!(vec![BTreeSet::<u8>::new()].normalize().is_err());
    }

    #[test]
    fn test_rest_flattens() {
        let mut keys = vec![];
        Rest(vec![1, 2]).flatten(&mut keys).unwrap();
        assert_eq!(keys, [Key::Int(1), Key::Int(2)]);

        let mut keys = vec![];
        vec![1, 2].flatten(&mut keys).unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[quickcheck_macros::quickcheck]
    fn test_idempotent(items: Vec<(i32, String, Option<u64>)>) -> bool {
        let key = items.normalize().unwrap();
        key.normalize().unwrap() == key
    }

    #[quickcheck_macros::quickcheck]
    fn test_equal_values_equal_keys(a: Vec<u16>, b: Vec<u16>) -> bool {
        (a == b) == (a.normalize() == b.normalize())
    }
}
