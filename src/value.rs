use std::collections::BTreeMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::KeyError;
use crate::function::{Arguments, Function, Signature};
use crate::key::{Key, Normalize};

/// A dynamically typed value.
///
/// Used for functions whose parameters are not known statically. `List` is a
/// variable-length sequence and `Tuple` a fixed-length one; they produce
/// distinct keys even with equal elements. Likewise, `Int(1)` and `Uint(1)`
/// are different keys. `Map` and `Func` values cannot be used as keys.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Char(char),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Func(DynFunc),
}

impl Value {
    /// A short name for the kind of value.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Char(_) => "char",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Func(_) => "func",
        }
    }
}

impl Normalize for Value {
    fn normalize(&self) -> Result<Key, KeyError> {
        Ok(match self {
            Self::Unit => Key::Unit,
            Self::Bool(v) => Key::Bool(*v),
            Self::Int(v) => Key::Int((*v).into()),
            Self::Uint(v) => Key::Uint(*v),
            Self::Float(v) => Key::float(*v),
            Self::Char(v) => Key::Char(*v),
            Self::Str(v) => Key::Str(v.as_str().into()),
            Self::List(items) => return items.normalize(),
            Self::Tuple(items) => {
                Key::Tuple(items.iter().map(Value::normalize).collect::<Result<_, _>>()?)
            }
            Self::Map(_) | Self::Func(_) => {
                return Err(KeyError::Unsupported { type_name: self.kind() });
            }
        })
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<DynFunc> for Value {
    fn from(func: DynFunc) -> Self {
        Self::Func(func)
    }
}

/// The arguments of a dynamic call, one tuple position each.
impl Arguments for Vec<Value> {
    fn keys(&self) -> Result<Vec<Key>, KeyError> {
        self.iter().map(Value::normalize).collect()
    }
}

type Body = dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync;

/// A function over dynamic values with a declared call shape.
#[derive(Clone)]
pub struct DynFunc {
    signature: Signature,
    body: Arc<Body>,
}

impl DynFunc {
    /// A function taking exactly `params` arguments and returning `returns`
    /// values.
    pub fn new<F>(params: usize, returns: usize, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        Self {
            signature: Signature { params, variadic: false, returns },
            body: Arc::new(body),
        }
    }

    /// A function taking `fixed` arguments followed by any number of variadic
    /// ones.
    ///
    /// The variadic parameter counts as a declared parameter.
    pub fn variadic<F>(fixed: usize, returns: usize, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    {
        Self {
            signature: Signature { params: fixed + 1, variadic: true, returns },
            body: Arc::new(body),
        }
    }

    /// The declared call shape.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Call the function.
    ///
    /// Panics if the number of arguments does not fit the signature, or if the
    /// body returns a different number of values than declared.
    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        let Signature { params, variadic, returns } = self.signature;
        let fixed = if variadic { params - 1 } else { params };
        if args.len() < fixed || (!variadic && args.len() > fixed) {
            panic!("function takes {fixed} arguments, but {} were supplied", args.len());
        }

        let output = (self.body)(args);
        if output.len() != returns {
            panic!("function returns {returns} values, but {} were produced", output.len());
        }
        output
    }
}

impl Debug for DynFunc {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DynFunc").field("signature", &self.signature).finish_non_exhaustive()
    }
}

impl PartialEq for DynFunc {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl Function<Vec<Value>> for DynFunc {
    type Output = Vec<Value>;

    fn signature(&self) -> Option<Signature> {
        Some(self.signature)
    }

    fn invoke(&self, args: Vec<Value>) -> Vec<Value> {
        self.call(args)
    }
}

impl Function<Vec<Value>> for Value {
    type Output = Vec<Value>;

    fn signature(&self) -> Option<Signature> {
        match self {
            Self::Func(func) => Some(func.signature),
            _ => None,
        }
    }

    fn invoke(&self, args: Vec<Value>) -> Vec<Value> {
        match self {
            Self::Func(func) => func.call(args),
            other => panic!("cannot call a value of kind {}", other.kind()),
        }
    }
}
