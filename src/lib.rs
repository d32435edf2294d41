//! Package implement Persistent Red-Black tree, as ordered-map and ordered-set.
//!
//! Quoting from [Wikipedia][pds]:
//!
//! > A data structure is *partially persistent* if all versions can be
//! > accessed but only the newest version can be modified. The data
//! > structure is *fully persistent* if every version can be both accessed
//! > and modified.
//!
//! Types in this package are fully persistent. Every write operation leaves
//! the old version untouched and returns a new version, the new version
//! re-allocates only the path from root to the modified node and shares
//! all other sub-trees with the old version.
//!
//! Following types implement the tree for specific use cases:
//!
//! * [rc::OMap] and [rc::OSet], sub-trees are shared using [std::rc::Rc],
//!   faster but not thread safe.
//! * [arc::OMap] and [arc::OSet], sub-trees are shared using
//!   [std::sync::Arc], a version can be shared across threads.
//!
//! Balancing follows the classic [red-black][wiki-rb] rules:
//!
//! - No red node has a red child.
//! - Every path from root to leaf has the same number of black nodes.
//! - Root is always black.
//!
//! Insert repairs red-red violations on the way up with a single four-case
//! rotation. Delete repairs black-height deficits on the way up using
//! [double-black and negative-black][might] shades.
//!
//! Set operations:
//!
//! ```
//! use prbt::OSet;
//!
//! let s1: OSet<u32> = OSet::empty();
//! let s2 = s1.insert(10).insert(20).insert(30);
//! let s3 = s2.delete(&20);
//!
//! assert!(s1.is_empty());
//! assert_eq!(s2.len(), 3);
//! assert!(s2.member(&20));
//! assert!(!s3.member(&20));
//! assert!(s3.member(&10) && s3.member(&30));
//! s3.validate().unwrap();
//! ```
//!
//! Map operations:
//!
//! ```
//! use prbt::OMap;
//!
//! let index: OMap<String, String> = OMap::new();
//! let index = index.set("key1".to_string(), "value1".to_string());
//! let index = index.set("key2".to_string(), "value2".to_string());
//! assert_eq!(index.len(), 2);
//!
//! assert_eq!(index.get("key1"), Some("value1".to_string()));
//!
//! let older = index.clone();
//! let index = index.remove("key1");
//! assert_eq!(index.get("key1"), None);
//! assert_eq!(older.get("key1"), Some("value1".to_string()));
//! ```
//!
//! [wiki-rb]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
//! [pds]: https://en.wikipedia.org/wiki/Persistent_data_structure
//! [might]: https://matt.might.net/articles/red-black-delete/

use std::{error, fmt, result};

// Short form to compose Error values.
//
// ```ignore
// use crate::Error;
// err_at!(Fatal, msg: "bad argument {}", arg);
// ```
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
}

pub mod arc;
pub mod rc;

pub use rc::{OMap, OSet};

/// Error variants that are returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the
/// error location.
pub enum Error {
    /// Tree does not hold one of the red-black invariants.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, msg) => write!(f, "{} Fatal: {}", p, msg),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}

/// Type alias for Result return type, used by this package.
pub type Result<T> = result::Result<T, Error>;

/// Shape of a tree, as measured by `validate()`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Number of entries in the tree.
    pub n_count: usize,
    /// Number of black nodes from root to any leaf.
    pub blacks: usize,
    /// Number of nodes on the longest path from root to leaf.
    pub height: usize,
}
