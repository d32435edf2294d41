use std::{borrow::Borrow, fmt, iter::FromIterator};

use super::*;
use crate::{Result, Stats};

/// Fully persistent ordered-set, each value is a key in [OMap] with
/// no payload.
///
/// ```
/// use prbt::OSet;
///
/// let s: OSet<u8> = (1..=7).collect();
/// assert_eq!(s.iter().collect::<Vec<u8>>(), vec![1, 2, 3, 4, 5, 6, 7]);
///
/// let t = s.insert(4);
/// assert!(t.ptr_eq(&s));
/// ```
pub struct OSet<T> {
    index: OMap<T, ()>,
}

impl<T> Clone for OSet<T> {
    fn clone(&self) -> Self {
        OSet {
            index: self.index.clone(),
        }
    }
}

impl<T> Default for OSet<T> {
    fn default() -> Self {
        OSet::empty()
    }
}

impl<T> OSet<T> {
    /// Create an empty set.
    pub fn empty() -> OSet<T> {
        OSet { index: OMap::new() }
    }

    /// Same as [OSet::empty].
    pub fn new() -> OSet<T> {
        OSet::empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Refer to [OMap::ptr_eq].
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.index.ptr_eq(&other.index)
    }

    /// Return whether value is present in this version.
    pub fn member<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.contains_key(value)
    }

    /// Return a new version containing value. If value is already a
    /// member, the returned version is `self`, sharing the same root.
    pub fn insert(&self, value: T) -> Self
    where
        T: Ord + Clone,
    {
        if self.member(&value) {
            self.clone()
        } else {
            OSet {
                index: self.index.set(value, ()),
            }
        }
    }

    /// Return a new version without value. If value is not a member,
    /// the returned version is `self`, sharing the same root.
    pub fn delete<Q>(&self, value: &Q) -> Self
    where
        T: Clone + Borrow<Q>,
        Q: Ord + ?Sized,
    {
        OSet {
            index: self.index.remove(value),
        }
    }

    /// Refer to [OMap::validate].
    pub fn validate(&self) -> Result<Stats>
    where
        T: Ord + fmt::Debug,
    {
        self.index.validate()
    }

    /// Return an iterator over all values, in sort order.
    pub fn iter(&self) -> SetIter<'_, T> {
        SetIter {
            iter: self.index.iter(),
        }
    }
}

impl<T> fmt::Debug for OSet<T>
where
    T: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T> PartialEq for OSet<T>
where
    T: Clone + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> FromIterator<T> for OSet<T>
where
    T: Ord + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(OSet::empty(), |s, value| s.insert(value))
    }
}

/// Iterator over values of [OSet], in sort order.
pub struct SetIter<'a, T> {
    iter: Iter<'a, T, ()>,
}

impl<'a, T> Iterator for SetIter<'a, T>
where
    T: Clone,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|(value, _)| value)
    }
}

#[cfg(test)]
#[path = "set_test.rs"]
mod set_test;
