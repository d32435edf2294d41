use log::{debug, warn};

use std::{
    borrow::Borrow,
    cmp::{self, Ord, Ordering},
    fmt,
    iter::FromIterator,
};

use super::*;
use crate::{Error, Result, Stats};

// IMPORTANT: this file is compiled once per flavour, `Ref` is either
// std::rc::Rc or std::sync::Arc depending on the parent module.

/// Fully persistent ordered-map using [red-black][rb] tree.
///
/// Refer package level documentation for brief description.
///
/// [rb]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
pub struct OMap<K, V> {
    root: Tree<K, V>,
    n_count: usize, // number of entries in the tree.
}

impl<K, V> Clone for OMap<K, V> {
    fn clone(&self) -> Self {
        OMap {
            root: self.root.clone(),
            n_count: self.n_count,
        }
    }
}

impl<K, V> Default for OMap<K, V> {
    fn default() -> Self {
        OMap::new()
    }
}

impl<K, V> OMap<K, V> {
    pub fn new() -> OMap<K, V> {
        OMap {
            root: Tree::Leaf,
            n_count: Default::default(),
        }
    }
}

impl<K, V> OMap<K, V> {
    /// Return number of entries in index.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_count
    }

    /// Check whether this index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n_count == 0
    }

    /// Return whether both versions share the same root node. Versions
    /// returned by a no-op write share their root with the original.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Tree::Node(a), Tree::Node(b)) => Ref::ptr_eq(a, b),
            (Tree::Leaf, Tree::Leaf) => true,
            (_, _) => false,
        }
    }

    #[allow(dead_code)]
    #[cfg(test)]
    pub fn pretty_print(&self)
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        if let Some(n) = self.root.as_node() {
            n.pretty_print("".to_string())
        }
    }
}

impl<K, V> OMap<K, V> {
    /// Set value for key. If there is an existing entry for key,
    /// the new version carries the new value.
    pub fn set(&self, key: K, value: V) -> Self
    where
        K: Ord + Clone,
        V: Clone,
    {
        let (mut root, is_old) = Self::do_set(&self.root, key, value);

        root.set_black();

        OMap {
            root: root.into(),
            n_count: if is_old {
                self.n_count
            } else {
                self.n_count + 1
            },
        }
    }

    /// Remove key from this instance. If key is not present, then remove
    /// is a no-op and the returned version shares its root with `self`.
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Clone + Borrow<Q>,
        V: Clone,
        Q: Ord + ?Sized,
    {
        match Self::do_remove(&self.root, key) {
            Some(root) => OMap {
                root: root.blacken(),
                n_count: self.n_count - 1,
            },
            None => self.clone(),
        }
    }

    /// Validate tree with following rules:
    ///
    /// * Keys are in sorted order, with no duplicates.
    /// * From root to any leaf, no consecutive reds allowed in its path.
    /// * Number of blacks should be same under left child and right child.
    /// * Root is black.
    /// * No node carries a transient color left behind by delete.
    pub fn validate(&self) -> Result<Stats>
    where
        K: Ord + fmt::Debug,
    {
        let res = self.do_validate();
        match &res {
            Ok(stats) => debug!("validate {:?}", stats),
            Err(err) => warn!("validate {}", err),
        }
        res
    }

    fn do_validate(&self) -> Result<Stats>
    where
        K: Ord + fmt::Debug,
    {
        if let Some(root) = self.root.as_node() {
            if !root.is_black() {
                return err_at!(Fatal, msg: "root {:?} is {:?}", root.key, root.color);
            }
        }

        let (n_count, blacks, height) =
            Self::validate_tree(&self.root, false, None, None, 0)?;
        if n_count != self.n_count {
            return err_at!(Fatal, msg: "mismatch in count {} != {}", n_count, self.n_count);
        }

        Ok(Stats {
            n_count,
            blacks,
            height,
        })
    }
}

impl<K, V> OMap<K, V> {
    /// Get value for key.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        V: Clone,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node| node.value.clone())
    }

    /// Return whether key is present in this version.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Return an iterator over all entries in this instance.
    ///
    /// ```
    /// use prbt::OMap;
    ///
    /// let index: OMap<String,String> = OMap::new();
    /// let index = index.set("key2".to_string(), "value2".to_string());
    /// let index = index.set("key1".to_string(), "value1".to_string());
    ///
    /// for (i, (key, value)) in index.iter().enumerate() {
    ///     let refkey = format!("key{}", i+1);
    ///     let refval = format!("value{}", i+1);
    ///     assert_eq!(refkey, key);
    ///     assert_eq!(refval, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut paths = Vec::default();
        build_iter(self.root.as_node(), &mut paths);
        Iter { paths }
    }

    fn find<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self.root.as_node();
        while let Some(nref) = node {
            node = match nref.key.borrow().cmp(key) {
                Ordering::Less => nref.right.as_node(),
                Ordering::Greater => nref.left.as_node(),
                Ordering::Equal => return Some(nref),
            };
        }
        None
    }
}

impl<K, V> OMap<K, V> {
    // Never returns a leaf, a red node may come back with a red child which
    // the caller's balance() shall fix.
    fn do_set(tree: &Tree<K, V>, key: K, value: V) -> (Node<K, V>, bool)
    where
        K: Ord + Clone,
        V: Clone,
    {
        let node = match tree {
            Tree::Node(node) => node,
            Tree::Leaf => {
                let node = Node::new(Color::Red, Tree::Leaf, (key, value), Tree::Leaf);
                return (node, false);
            }
            Tree::DoubleLeaf => {
                panic!("do_set(): double-black leaf in settled tree, call the programmer")
            }
        };

        match node.key.cmp(&key) {
            Ordering::Greater => {
                let (left, is_old) = Self::do_set(&node.left, key, value);
                let entry = node.to_entry();
                let node = balance(node.color, left.into(), entry, node.right.clone());
                (node, is_old)
            }
            Ordering::Less => {
                let (right, is_old) = Self::do_set(&node.right, key, value);
                let entry = node.to_entry();
                let node = balance(node.color, node.left.clone(), entry, right.into());
                (node, is_old)
            }
            Ordering::Equal => {
                let entry = (node.key.clone(), value);
                let (left, right) = (node.left.clone(), node.right.clone());
                (Node::new(node.color, left, entry, right), true)
            }
        }
    }

    // Return None if key is not found, in which case nothing is rebuilt.
    fn do_remove<Q>(tree: &Tree<K, V>, key: &Q) -> Option<Tree<K, V>>
    where
        K: Clone + Borrow<Q>,
        V: Clone,
        Q: Ord + ?Sized,
    {
        let node = match tree {
            Tree::Node(node) => node,
            Tree::Leaf => return None,
            Tree::DoubleLeaf => {
                panic!("do_remove(): double-black leaf in settled tree, call the programmer")
            }
        };

        match node.key.borrow().cmp(key) {
            Ordering::Greater => {
                let left = Self::do_remove(&node.left, key)?;
                let entry = node.to_entry();
                Some(bubble(node.color, left, entry, node.right.clone()).into())
            }
            Ordering::Less => {
                let right = Self::do_remove(&node.right, key)?;
                let entry = node.to_entry();
                Some(bubble(node.color, node.left.clone(), entry, right).into())
            }
            Ordering::Equal => Some(splice(node)),
        }
    }

    // Return (n_count, blacks, height) for the sub-tree.
    fn validate_tree<'a>(
        tree: &'a Tree<K, V>,
        fromred: bool,
        low: Option<&'a K>,
        high: Option<&'a K>,
        n_count: usize,
    ) -> Result<(usize, usize, usize)>
    where
        K: Ord + fmt::Debug,
    {
        let node = match tree {
            Tree::Node(node) => node,
            Tree::Leaf => return Ok((n_count, 0, 0)),
            Tree::DoubleLeaf => return err_at!(Fatal, msg: "double-black leaf"),
        };

        let red = match node.color {
            Color::Red => true,
            Color::Black => false,
            color => return err_at!(Fatal, msg: "color {:?} key:{:?}", color, node.key),
        };
        if fromred && red {
            return err_at!(Fatal, msg: "consecutive reds key:{:?}", node.key);
        }

        match low {
            Some(low) if node.key.le(low) => {
                return err_at!(Fatal, msg: "sort key:{:?} low:{:?}", node.key, low);
            }
            _ => (),
        }
        match high {
            Some(high) if node.key.ge(high) => {
                return err_at!(Fatal, msg: "sort key:{:?} high:{:?}", node.key, high);
            }
            _ => (),
        }

        let key = Some(&node.key);
        let (n_count, lb, lh) = Self::validate_tree(&node.left, red, low, key, n_count + 1)?;
        let (n_count, rb, rh) = Self::validate_tree(&node.right, red, key, high, n_count)?;
        if lb != rb {
            return err_at!(Fatal, msg: "unbalanced blacks {} {} key:{:?}", lb, rb, node.key);
        }

        let blacks = if red { lb } else { lb + 1 };
        Ok((n_count, blacks, cmp::max(lh, rh) + 1))
    }
}

impl<K, V> fmt::Debug for OMap<K, V>
where
    K: Clone + fmt::Debug,
    V: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> PartialEq for OMap<K, V>
where
    K: Clone + PartialEq,
    V: Clone + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V> FromIterator<(K, V)> for OMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(OMap::new(), |index, (key, value)| index.set(key, value))
    }
}

/// Shade of a node. Settled trees are only painted `Red` and `Black`, the
/// other two shades exist while delete walks back up to the root.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Color {
    Red,
    Black,
    DoubleBlack,
    NegativeBlack,
}

impl Color {
    fn blacker(self) -> Color {
        match self {
            Color::NegativeBlack => Color::Red,
            Color::Red => Color::Black,
            Color::Black => Color::DoubleBlack,
            Color::DoubleBlack => panic!("blacker(): double-black, call the programmer"),
        }
    }

    fn redder(self) -> Color {
        match self {
            Color::DoubleBlack => Color::Black,
            Color::Black => Color::Red,
            Color::Red => Color::NegativeBlack,
            Color::NegativeBlack => panic!("redder(): negative-black, call the programmer"),
        }
    }
}

/// Link to a sub-tree.
enum Tree<K, V> {
    Leaf,
    // black-height of two, left behind by removing a childless black node.
    DoubleLeaf,
    Node(Ref<Node<K, V>>),
}

// derive(Clone) would need K: Clone and V: Clone.
impl<K, V> Clone for Tree<K, V> {
    fn clone(&self) -> Self {
        match self {
            Tree::Leaf => Tree::Leaf,
            Tree::DoubleLeaf => Tree::DoubleLeaf,
            Tree::Node(node) => Tree::Node(Ref::clone(node)),
        }
    }
}

impl<K, V> From<Node<K, V>> for Tree<K, V> {
    fn from(node: Node<K, V>) -> Tree<K, V> {
        Tree::Node(Ref::new(node))
    }
}

impl<K, V> Tree<K, V> {
    #[inline]
    fn as_node(&self) -> Option<&Node<K, V>> {
        match self {
            Tree::Node(node) => Some(&**node),
            Tree::Leaf | Tree::DoubleLeaf => None,
        }
    }

    #[inline]
    fn as_colored(&self, color: Color) -> Option<&Node<K, V>> {
        self.as_node().filter(|node| node.color == color)
    }

    #[inline]
    fn as_red(&self) -> Option<&Node<K, V>> {
        self.as_colored(Color::Red)
    }

    fn is_double_black(&self) -> bool {
        match self {
            Tree::DoubleLeaf => true,
            Tree::Node(node) => node.color == Color::DoubleBlack,
            Tree::Leaf => false,
        }
    }

    fn redder(self) -> Tree<K, V>
    where
        K: Clone,
        V: Clone,
    {
        match self {
            Tree::DoubleLeaf => Tree::Leaf,
            Tree::Node(node) => node.repaint(node.color.redder()).into(),
            Tree::Leaf => panic!("redder(): black leaf, call the programmer"),
        }
    }

    // Discharge a double-black root, or a red one, to black.
    fn blacken(self) -> Tree<K, V>
    where
        K: Clone,
        V: Clone,
    {
        match self {
            Tree::Leaf | Tree::DoubleLeaf => Tree::Leaf,
            Tree::Node(node) if node.is_black() => Tree::Node(node),
            Tree::Node(node) => node.repaint(Color::Black).into(),
        }
    }
}

//--------- rebalancing routines ----------------

// Any of the four red-red shapes below a black node, or below a
// double-black node, are rewritten to the same shape:
//
//              (top)
//                y
//              /   \
//            (b)   (b)
//            x       z
//           / \     / \
//          a   b   c   d
//
// Black becomes red and double-black becomes black, so the black-height
// seen from above is unchanged.
fn rotate<K, V>(
    top: Color,
    [a, b, c, d]: [Tree<K, V>; 4],
    [x, y, z]: [(K, V); 3],
) -> Node<K, V> {
    let left = Node::new(Color::Black, a, x, b);
    let right = Node::new(Color::Black, c, z, d);
    Node::new(top, left.into(), y, right.into())
}

fn balance<K, V>(color: Color, left: Tree<K, V>, entry: (K, V), right: Tree<K, V>) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    let top = match color {
        Color::Black => Color::Red,
        Color::DoubleBlack => Color::Black,
        Color::Red | Color::NegativeBlack => return Node::new(color, left, entry, right),
    };

    if let Some(l) = left.as_red() {
        if let Some(ll) = l.left.as_red() {
            let subtrees = [ll.left.clone(), ll.right.clone(), l.right.clone(), right];
            return rotate(top, subtrees, [ll.to_entry(), l.to_entry(), entry]);
        }
        if let Some(lr) = l.right.as_red() {
            let subtrees = [l.left.clone(), lr.left.clone(), lr.right.clone(), right];
            return rotate(top, subtrees, [l.to_entry(), lr.to_entry(), entry]);
        }
    }
    if let Some(r) = right.as_red() {
        if let Some(rl) = r.left.as_red() {
            let subtrees = [left, rl.left.clone(), rl.right.clone(), r.right.clone()];
            return rotate(top, subtrees, [entry, rl.to_entry(), r.to_entry()]);
        }
        if let Some(rr) = r.right.as_red() {
            let subtrees = [left, r.left.clone(), rr.left.clone(), rr.right.clone()];
            return rotate(top, subtrees, [entry, r.to_entry(), rr.to_entry()]);
        }
    }

    if color == Color::DoubleBlack {
        //          (bb)                           (b)
        //           x                              y
        //          / \                           /   \
        //         a  (nb)                      (b)   balance(b)
        //              z            =>         x         z
        //             / \                     / \       / \
        //           (b)  (b)                 a   b     c  (r)
        //            y    d                                d
        //           / \
        //          b   c
        if let Some(z) = right.as_colored(Color::NegativeBlack) {
            let y = z.left.as_colored(Color::Black);
            let d = z.right.as_colored(Color::Black);
            if let (Some(y), Some(d)) = (y, d) {
                let x = Node::new(Color::Black, left, entry, y.left.clone());
                let d: Tree<K, V> = d.repaint(Color::Red).into();
                let z = balance(Color::Black, y.right.clone(), z.to_entry(), d);
                return Node::new(Color::Black, x.into(), y.to_entry(), z.into());
            }
        }
        // mirror of the above.
        if let Some(x) = left.as_colored(Color::NegativeBlack) {
            let a = x.left.as_colored(Color::Black);
            let y = x.right.as_colored(Color::Black);
            if let (Some(a), Some(y)) = (a, y) {
                let a: Tree<K, V> = a.repaint(Color::Red).into();
                let x = balance(Color::Black, a, x.to_entry(), y.left.clone());
                let z = Node::new(Color::Black, y.right.clone(), entry, right);
                return Node::new(Color::Black, x.into(), y.to_entry(), z.into());
            }
        }
    }

    Node::new(color, left, entry, right)
}

// If either child is double-black, push the extra black up into this node
// and let balance() resolve it, or carry it further up.
fn bubble<K, V>(color: Color, left: Tree<K, V>, entry: (K, V), right: Tree<K, V>) -> Node<K, V>
where
    K: Clone,
    V: Clone,
{
    if left.is_double_black() || right.is_double_black() {
        balance(color.blacker(), left.redder(), entry, right.redder())
    } else {
        balance(color, left, entry, right)
    }
}

// Remove `node` itself, return the sub-tree that takes its place. Only
// place where a double-black leaf is created.
fn splice<K, V>(node: &Node<K, V>) -> Tree<K, V>
where
    K: Clone,
    V: Clone,
{
    match (node.color, &node.left, &node.right) {
        (Color::Red, Tree::Leaf, Tree::Leaf) => Tree::Leaf,
        (Color::Black, Tree::Leaf, Tree::Leaf) => Tree::DoubleLeaf,
        (Color::Black, Tree::Leaf, Tree::Node(child))
        | (Color::Black, Tree::Node(child), Tree::Leaf)
            if child.color == Color::Red =>
        {
            child.repaint(Color::Black).into()
        }
        (color, left, Tree::Node(right)) => {
            // move in-order successor into this position.
            let (right, entry) = remove_min(right);
            bubble(color, left.clone(), entry, right).into()
        }
        (color, _, _) => panic!("splice(): malformed {:?} node, call the programmer", color),
    }
}

// Remove the left-most entry under `node`, return the remaining sub-tree
// along with the removed entry.
fn remove_min<K, V>(node: &Node<K, V>) -> (Tree<K, V>, (K, V))
where
    K: Clone,
    V: Clone,
{
    match &node.left {
        Tree::Leaf => (splice(node), node.to_entry()),
        Tree::Node(left) => {
            let (left, min_entry) = remove_min(left);
            let entry = node.to_entry();
            let tree: Tree<K, V> = bubble(node.color, left, entry, node.right.clone()).into();
            (tree, min_entry)
        }
        Tree::DoubleLeaf => panic!("remove_min(): double-black leaf, call the programmer"),
    }
}

/// Iterator over entries of [OMap], in sort order of keys.
pub struct Iter<'a, K, V> {
    paths: Vec<&'a Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.paths.pop()?;
        build_iter(node.right.as_node(), &mut self.paths);
        Some(node.to_entry())
    }
}

fn build_iter<'a, K, V>(node: Option<&'a Node<K, V>>, paths: &mut Vec<&'a Node<K, V>>) {
    if let Some(node) = node {
        paths.push(node);
        build_iter(node.left.as_node(), paths)
    }
}

/// Node corresponds to a single entry in tree.
#[derive(Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    left: Tree<K, V>,  // store: left child
    right: Tree<K, V>, // store: right child
}

impl<K, V> Node<K, V> {
    fn new(color: Color, left: Tree<K, V>, (key, value): (K, V), right: Tree<K, V>) -> Self {
        Node {
            key,
            value,
            color,
            left,
            right,
        }
    }

    #[inline]
    fn to_entry(&self) -> (K, V)
    where
        K: Clone,
        V: Clone,
    {
        (self.key.clone(), self.value.clone())
    }

    fn repaint(&self, color: Color) -> Node<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut node = self.clone();
        node.color = color;
        node
    }

    #[inline]
    fn set_black(&mut self) {
        self.color = Color::Black
    }

    #[inline]
    fn is_black(&self) -> bool {
        self.color == Color::Black
    }

    #[allow(dead_code)]
    #[cfg(test)]
    fn pretty_print(&self, mut prefix: String)
    where
        K: fmt::Debug,
        V: fmt::Debug,
    {
        match self.color {
            Color::Black => println!("{}(b)<{:?},{:?}>", prefix, self.key, self.value),
            Color::Red => println!("{}(r)<{:?},{:?}>", prefix, self.key, self.value),
            color => println!("{}({:?})<{:?},{:?}>", prefix, color, self.key, self.value),
        }
        prefix.push_str("  ");
        if let Some(l) = self.left.as_node() {
            l.pretty_print(prefix.clone())
        }
        if let Some(r) = self.right.as_node() {
            r.pretty_print(prefix)
        }
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
