use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use memotrie::{wrap, DynFunc, KeyError, Value, WrapError};

/// An identity function over one dynamic argument that counts its calls.
fn identity(calls: &Arc<AtomicUsize>) -> Value {
    let calls = Arc::clone(calls);
    Value::Func(DynFunc::new(1, 1, move |args| {
        calls.fetch_add(1, Ordering::SeqCst);
        args
    }))
}

#[test]
fn test_list_vs_tuple() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (m, cache) = wrap(identity(&calls)).unwrap();

    let list = Value::List(vec![1i64.into(), 2i64.into(), 3i64.into()]);
    let tuple = Value::Tuple(vec![1i64.into(), 2i64.into(), 3i64.into()]);

    assert_eq!(m.call(vec![list.clone()]), [list.clone()]);
    assert_eq!(m.call(vec![tuple.clone()]), [tuple.clone()]);
    assert_eq!(m.call(vec![list.clone()]), [list]);
    assert_eq!(m.call(vec![tuple.clone()]), [tuple]);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_unsupported_values() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (m, _) = wrap(identity(&calls)).unwrap();

    let map = Value::Map(BTreeMap::from([("a".to_string(), Value::Int(1))]));
    assert_eq!(
        m.try_call(vec![map]),
        Err(KeyError::Unsupported { type_name: "map" }),
    );

    let func = identity(&calls);
    let payload = catch_unwind(AssertUnwindSafe(|| m.call(vec![func]))).unwrap_err();
    let err = payload.downcast::<KeyError>().unwrap();
    assert_eq!(err.to_string(), "unsupported key type: func");

    // Nested inside a sequence, too.
    let nested = Value::List(vec![Value::Map(BTreeMap::new())]);
    assert!(m.try_call(vec![nested]).is_err());

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_signed_vs_unsigned() {
    let calls = Arc::new(AtomicUsize::new(0));
    let (m, cache) = wrap(identity(&calls)).unwrap();

    assert_eq!(m.call(vec![Value::Int(1)]), [Value::Int(1)]);
    assert_eq!(m.call(vec![Value::Uint(1)]), [Value::Uint(1)]);
    assert_eq!(m.call(vec![Value::Int(1)]), [Value::Int(1)]);
    assert_eq!(m.call(vec![Value::Uint(1)]), [Value::Uint(1)]);

    // Nested inside a sequence, too.
    let signed = Value::List(vec![Value::Int(2)]);
    let unsigned = Value::List(vec![Value::Uint(2)]);
    assert_eq!(m.call(vec![signed.clone()]), [signed]);
    assert_eq!(m.call(vec![unsigned.clone()]), [unsigned]);

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(cache.len(), 4);
}

#[test]
fn test_variadic() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let sum = DynFunc::variadic(0, 1, move |args| {
        counter.fetch_add(1, Ordering::SeqCst);
        let total = args
            .iter()
            .map(|arg| match arg {
                Value::Int(v) => *v,
                _ => 0,
            })
            .sum::<i64>();
        vec![Value::Int(total)]
    });

    let (m, cache) = wrap(sum).unwrap();
    assert!(m.signature().variadic);

    for i in 0..1000 {
        let args: Vec<Value> = (0..=i % 3).map(Value::Int).collect();
        m.call(args);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Same flattened values, same entry.
    assert_eq!(m.call(vec![0i64.into(), 1i64.into()]), [Value::Int(1)]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    cache.remove((0, 1));
    m.call(vec![0i64.into()]);
    m.call(vec![0i64.into(), 1i64.into(), 2i64.into()]);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_multiple_returns() {
    let swap = DynFunc::new(2, 2, |args| args.into_iter().rev().collect());
    let (m, _) = wrap(Value::Func(swap)).unwrap();
    assert_eq!(
        m.call(vec!["a".into(), 2.5.into()]),
        [Value::Float(2.5), Value::Str("a".into())],
    );
}

#[test]
fn test_wrong_arity() {
    let (m, cache) = wrap(DynFunc::new(2, 1, |args| args)).unwrap();
    let payload = catch_unwind(AssertUnwindSafe(|| m.call(vec![true.into()]))).unwrap_err();
    let message = payload.downcast::<String>().unwrap();
    assert_eq!(*message, "function takes 2 arguments, but 1 were supplied");
    assert!(cache.is_empty());
}

#[test]
fn test_wrong_return_count() {
    let (m, cache) = wrap(DynFunc::new(1, 2, |_| vec![])).unwrap();
    let payload = catch_unwind(AssertUnwindSafe(|| m.call(vec![true.into()]))).unwrap_err();
    let message = payload.downcast::<String>().unwrap();
    assert_eq!(*message, "function returns 2 values, but 0 were produced");
    assert!(cache.is_empty());
}

#[test]
fn test_bad_funcs() {
    let not_a_func = Value::Str("not a func".into());
    let Err(rejected) = wrap(not_a_func.clone()) else { panic!("wrapped a string") };
    assert_eq!(rejected.kind, WrapError::NotCallable);
    assert_eq!(rejected.func, not_a_func);

    let no_args = Value::Func(DynFunc::new(0, 1, |_| vec![true.into()]));
    let Err(rejected) = wrap(no_args) else { panic!("wrapped a nullary function") };
    assert_eq!(rejected.kind, WrapError::MissingParameters);

    let no_returns = DynFunc::new(1, 0, |_| vec![]);
    let Err(rejected) = wrap(no_returns) else { panic!("wrapped a function without output") };
    assert_eq!(rejected.kind, WrapError::MissingReturns);
}
