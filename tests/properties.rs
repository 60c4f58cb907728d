use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use memotrie::{wrap, Key, Normalize};
use quickcheck_macros::quickcheck;

/// The function runs exactly once per distinct argument tuple.
#[quickcheck]
fn test_at_most_once(calls: Vec<(u8, u8)>) -> bool {
    let seen = RefCell::new(Vec::new());
    let (m, _) = wrap(|a: u8, b: u8| {
        seen.borrow_mut().push((a, b));
        u16::from(a) * u16::from(b)
    })
    .unwrap();

    for &(a, b) in &calls {
        if m.call((a, b)) != u16::from(a) * u16::from(b) {
            return false;
        }
    }

    let distinct: HashSet<_> = calls.iter().collect();
    let seen = seen.borrow();
    seen.len() == distinct.len() && seen.iter().all(|pair| distinct.contains(pair))
}

/// Removing a prefix only recomputes the tuples that start with it.
#[quickcheck]
fn test_remove_isolated(calls: Vec<(u8, u8)>, prefix: u8) -> bool {
    let counts = RefCell::new(HashMap::<(u8, u8), usize>::new());
    let (m, cache) = wrap(|a: u8, b: u8| {
        *counts.borrow_mut().entry((a, b)).or_default() += 1;
        a ^ b
    })
    .unwrap();

    for &(a, b) in &calls {
        m.call((a, b));
    }
    cache.remove((prefix,));
    for &(a, b) in &calls {
        m.call((a, b));
    }

    counts.borrow().iter().all(|(&(a, _), &count)| {
        let expected = if a == prefix { 2 } else { 1 };
        count == expected
    })
}

/// Normalizing a key again changes nothing.
#[quickcheck]
fn test_normalize_idempotent(nested: Vec<Vec<i64>>, label: Option<String>) -> bool {
    let keys = [nested.normalize().unwrap(), label.normalize().unwrap()];
    keys.iter().all(|key| key.normalize().as_ref() == Ok(key))
}

/// Equal values normalize to equal keys and different ones to different keys.
#[quickcheck]
fn test_normalize_injective(a: (u32, String), b: (u32, String)) -> bool {
    let (ka, kb): (Key, Key) = (a.normalize().unwrap(), b.normalize().unwrap());
    (a == b) == (ka == kb)
}
