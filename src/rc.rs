//! Module implement fully-persistent tree, faster but not thread safe.

use std::rc::Rc as Ref;

#[path = "./tree.rs"]
mod tree;

#[path = "./set.rs"]
mod set;

pub use self::set::{OSet, SetIter};
pub use self::tree::{Iter, OMap};

impl<K, V> OMap<K, V> {
    /// Return whether this instance is thread-safe.
    pub fn is_thread_safe(&self) -> bool {
        false
    }
}

impl<T> OSet<T> {
    /// Return whether this instance is thread-safe.
    pub fn is_thread_safe(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[path = "rc_test.rs"]
mod rc_test;
