//! Module implement fully-persistent tree, slower but thread safe.

use std::sync::Arc as Ref;

#[path = "./tree.rs"]
mod tree;

#[path = "./set.rs"]
mod set;

pub use self::set::{OSet, SetIter};
pub use self::tree::{Iter, OMap};

impl<K, V> OMap<K, V> {
    /// Return whether this instance is thread-safe.
    pub fn is_thread_safe(&self) -> bool {
        true
    }
}

impl<T> OSet<T> {
    /// Return whether this instance is thread-safe.
    pub fn is_thread_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "arc_test.rs"]
mod arc_test;
