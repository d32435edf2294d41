use rand::{prelude::random, rngs::SmallRng, seq::SliceRandom, SeedableRng};

use super::*;

use std::{collections::HashSet, fmt};

fn leaf() -> Tree<u32, ()> {
    Tree::Leaf
}

fn paint(color: Color, left: Tree<u32, ()>, key: u32, right: Tree<u32, ()>) -> Tree<u32, ()> {
    Node::new(color, left, (key, ()), right).into()
}

fn red(left: Tree<u32, ()>, key: u32, right: Tree<u32, ()>) -> Tree<u32, ()> {
    paint(Color::Red, left, key, right)
}

fn black(left: Tree<u32, ()>, key: u32, right: Tree<u32, ()>) -> Tree<u32, ()> {
    paint(Color::Black, left, key, right)
}

// (color key left right), leaf as `.` and double-black leaf as `..`
fn describe<K: fmt::Debug, V>(tree: &Tree<K, V>) -> String {
    match tree {
        Tree::Leaf => ".".to_string(),
        Tree::DoubleLeaf => "..".to_string(),
        Tree::Node(node) => {
            let color = match node.color {
                Color::Red => "R",
                Color::Black => "B",
                Color::DoubleBlack => "BB",
                Color::NegativeBlack => "NB",
            };
            let (left, right) = (describe(&node.left), describe(&node.right));
            format!("({} {:?} {} {})", color, node.key, left, right)
        }
    }
}

fn settle(node: Node<u32, ()>) -> String {
    describe(&Tree::from(node))
}

fn collect_ptrs<K, V>(tree: &Tree<K, V>, ptrs: &mut HashSet<usize>) {
    if let Tree::Node(node) = tree {
        ptrs.insert(&**node as *const Node<K, V> as usize);
        collect_ptrs(&node.left, ptrs);
        collect_ptrs(&node.right, ptrs);
    }
}

fn new_nodes<K, V>(old: &OMap<K, V>, new: &OMap<K, V>) -> usize {
    let (mut a, mut b) = (HashSet::new(), HashSet::new());
    collect_ptrs(&old.root, &mut a);
    collect_ptrs(&new.root, &mut b);
    b.difference(&a).count()
}

fn height_bound(n: usize) -> f64 {
    2.0 * ((n + 1) as f64).log2()
}

#[test]
fn test_balance_red_shapes() {
    let shapes = vec![
        // left-left
        (red(red(leaf(), 1, leaf()), 2, leaf()), 3, leaf()),
        // left-right
        (red(leaf(), 1, red(leaf(), 2, leaf())), 3, leaf()),
    ];
    for (left, key, right) in shapes.into_iter() {
        let node = balance(Color::Black, left, (key, ()), right);
        assert_eq!(settle(node), "(R 2 (B 1 . .) (B 3 . .))");
    }

    let shapes = vec![
        // right-left
        (leaf(), 1, red(red(leaf(), 2, leaf()), 3, leaf())),
        // right-right
        (leaf(), 1, red(leaf(), 2, red(leaf(), 3, leaf()))),
    ];
    for (left, key, right) in shapes.into_iter() {
        let node = balance(Color::Black, left, (key, ()), right);
        assert_eq!(settle(node), "(R 2 (B 1 . .) (B 3 . .))");
    }
}

#[test]
fn test_balance_double_black_shapes() {
    let shapes = vec![
        (red(red(leaf(), 1, leaf()), 2, leaf()), 3, leaf()),
        (red(leaf(), 1, red(leaf(), 2, leaf())), 3, leaf()),
        (leaf(), 1, red(red(leaf(), 2, leaf()), 3, leaf())),
        (leaf(), 1, red(leaf(), 2, red(leaf(), 3, leaf()))),
    ];
    for (left, key, right) in shapes.into_iter() {
        let node = balance(Color::DoubleBlack, left, (key, ()), right);
        assert_eq!(settle(node), "(B 2 (B 1 . .) (B 3 . .))");
    }
}

#[test]
fn test_balance_subtrees_in_order() {
    // a, b, c, d are black sub-trees, they must land left to right.
    let (a, b) = (black(leaf(), 10, leaf()), black(leaf(), 30, leaf()));
    let (c, d) = (black(leaf(), 50, leaf()), black(leaf(), 70, leaf()));
    let left = red(red(a, 20, b), 40, c);
    let node = balance(Color::Black, left, (60, ()), d);
    assert_eq!(
        settle(node),
        "(R 40 (B 20 (B 10 . .) (B 30 . .)) (B 60 (B 50 . .) (B 70 . .)))"
    );
}

#[test]
fn test_balance_passthrough() {
    let node = balance(
        Color::Black,
        red(leaf(), 1, leaf()),
        (2, ()),
        red(leaf(), 3, leaf()),
    );
    assert_eq!(settle(node), "(B 2 (R 1 . .) (R 3 . .))");

    // red parent is left for the grand-parent to fix.
    let node = balance(Color::Red, red(leaf(), 1, leaf()), (2, ()), leaf());
    assert_eq!(settle(node), "(R 2 (R 1 . .) .)");

    let node = balance(Color::DoubleBlack, leaf(), (1, ()), black(leaf(), 2, leaf()));
    assert_eq!(settle(node), "(BB 1 . (B 2 . .))");
}

#[test]
fn test_balance_negative_black() {
    let nb = paint(
        Color::NegativeBlack,
        black(leaf(), 3, leaf()),
        5,
        black(leaf(), 7, leaf()),
    );
    let node = balance(Color::DoubleBlack, leaf(), (1, ()), nb);
    assert_eq!(settle(node), "(B 3 (B 1 . .) (B 5 . (R 7 . .)))");

    let nb = paint(
        Color::NegativeBlack,
        black(leaf(), 1, leaf()),
        3,
        black(leaf(), 5, leaf()),
    );
    let node = balance(Color::DoubleBlack, nb, (7, ()), leaf());
    assert_eq!(settle(node), "(B 5 (B 3 (R 1 . .) .) (B 7 . .))");

    // negative-black under a plain black node is not a rebalancing shape.
    let nb = paint(
        Color::NegativeBlack,
        black(leaf(), 3, leaf()),
        5,
        black(leaf(), 7, leaf()),
    );
    let node = balance(Color::Black, leaf(), (1, ()), nb);
    assert_eq!(settle(node), "(B 1 . (NB 5 (B 3 . .) (B 7 . .)))");
}

#[test]
fn test_bubble() {
    let node = bubble(Color::Black, Tree::DoubleLeaf, (10, ()), black(leaf(), 20, leaf()));
    assert_eq!(settle(node.clone()), "(BB 10 . (R 20 . .))");

    let tree = Tree::from(node).blacken();
    assert_eq!(describe(&tree), "(B 10 . (R 20 . .))");

    let node = bubble(Color::Red, Tree::DoubleLeaf, (10, ()), black(leaf(), 20, leaf()));
    assert_eq!(settle(node), "(B 10 . (R 20 . .))");

    // no double-black child, same as balance.
    let node = bubble(Color::Black, leaf(), (10, ()), red(leaf(), 20, leaf()));
    assert_eq!(settle(node), "(B 10 . (R 20 . .))");
}

#[test]
fn test_shades() {
    assert_eq!(Color::NegativeBlack.blacker(), Color::Red);
    assert_eq!(Color::Red.blacker(), Color::Black);
    assert_eq!(Color::Black.blacker(), Color::DoubleBlack);
    assert_eq!(Color::DoubleBlack.redder(), Color::Black);
    assert_eq!(Color::Black.redder(), Color::Red);
    assert_eq!(Color::Red.redder(), Color::NegativeBlack);
}

#[test]
#[should_panic]
fn test_shades_too_black() {
    Color::DoubleBlack.blacker();
}

#[test]
#[should_panic]
fn test_shades_too_red() {
    Color::NegativeBlack.redder();
}

#[test]
fn test_ascending_seven() {
    let index: OMap<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    index.validate().unwrap();
    assert_eq!(
        describe(&index.root),
        "(B 4 (B 2 (B 1 . .) (B 3 . .)) (B 6 (B 5 . .) (B 7 . .)))"
    );

    let stats = index.validate().unwrap();
    assert_eq!(stats.n_count, 7);
    assert_eq!(stats.blacks, 3);
    assert_eq!(stats.height, 3);
}

#[test]
fn test_insert_steps() {
    let index: OMap<u32, ()> = OMap::new();
    let index = index.set(1, ());
    assert_eq!(describe(&index.root), "(B 1 . .)");
    let index = index.set(2, ());
    assert_eq!(describe(&index.root), "(B 1 . (R 2 . .))");
    let index = index.set(3, ());
    assert_eq!(describe(&index.root), "(B 2 (B 1 . .) (B 3 . .))");
    let index = index.set(5, ()).set(4, ());
    assert_eq!(
        describe(&index.root),
        "(B 2 (B 1 . .) (R 4 (B 3 . .) (B 5 . .)))"
    );
    index.validate().unwrap();
}

#[test]
fn test_delete_middle() {
    let index: OMap<u32, ()> = vec![10, 20, 30].into_iter().map(|k| (k, ())).collect();
    assert_eq!(describe(&index.root), "(B 20 (B 10 . .) (B 30 . .))");

    let index = index.remove(&20);
    assert_eq!(describe(&index.root), "(B 30 (R 10 . .) .)");
    assert!(index.contains_key(&10));
    assert!(index.contains_key(&30));
    assert!(!index.contains_key(&20));
    assert_eq!(index.len(), 2);
    index.validate().unwrap();
}

#[test]
fn test_delete_shapes() {
    // red leaf.
    let index: OMap<u32, ()> = vec![1, 2].into_iter().map(|k| (k, ())).collect();
    let index = index.remove(&2);
    assert_eq!(describe(&index.root), "(B 1 . .)");

    // black node with a single red child.
    let index: OMap<u32, ()> = vec![1, 2].into_iter().map(|k| (k, ())).collect();
    let index = index.remove(&1);
    assert_eq!(describe(&index.root), "(B 2 . .)");

    // last entry.
    let index = index.remove(&2);
    assert_eq!(describe(&index.root), ".");
    assert!(index.is_empty());
    index.validate().unwrap();

    // black leaf with black sibling, deficit carried to the root.
    let index: OMap<u32, ()> = (1..=7).map(|k| (k, ())).collect();
    let index = index.remove(&1);
    assert_eq!(
        describe(&index.root),
        "(B 4 (B 2 . (R 3 . .)) (R 6 (B 5 . .) (B 7 . .)))"
    );
    index.validate().unwrap();
    let index = index.remove(&2);
    assert_eq!(
        describe(&index.root),
        "(B 4 (B 3 . .) (R 6 (B 5 . .) (B 7 . .)))"
    );
    index.validate().unwrap();
    // double-black leaf with a red sibling, resolved through negative-black.
    let index = index.remove(&3);
    assert_eq!(describe(&index.root), "(B 5 (B 4 . .) (B 6 . (R 7 . .)))");
    index.validate().unwrap();
}

#[test]
fn test_delete_orders() {
    let seed: u64 = random();
    println!("test_delete_orders {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let n = 512_u32;
    let full: OMap<u32, u32> = (0..n).map(|k| (k, k * 10)).collect();
    full.validate().unwrap();

    let ascending: Vec<u32> = (0..n).collect();
    let descending: Vec<u32> = (0..n).rev().collect();
    let mut shuffled: Vec<u32> = (0..n).collect();
    shuffled.shuffle(&mut rng);

    for keys in vec![ascending, descending, shuffled].into_iter() {
        let mut index = full.clone();
        for (i, key) in keys.iter().enumerate() {
            index = index.remove(key);
            let stats = index.validate().unwrap();
            assert_eq!(stats.n_count, (n as usize) - i - 1);
            assert!(!index.contains_key(key));
        }
        assert!(index.is_empty());
        assert_eq!(describe(&index.root), ".");
    }
    // every version above was derived from `full`, which is untouched.
    assert_eq!(full.len(), n as usize);
    full.validate().unwrap();
}

fn permutations(n: u32) -> Vec<Vec<u32>> {
    if n == 0 {
        return vec![vec![]];
    }
    let mut perms = vec![];
    for perm in permutations(n - 1).into_iter() {
        for i in 0..=perm.len() {
            let mut p = perm.clone();
            p.insert(i, n);
            perms.push(p);
        }
    }
    perms
}

#[test]
fn test_all_insert_orders() {
    for n in 1..=6_u32 {
        for perm in permutations(n).into_iter() {
            let mut index: OMap<u32, ()> = OMap::new();
            for key in perm.iter() {
                index = index.set(*key, ());
                index.validate().unwrap();
            }

            // delete each key, and a couple of absent ones, from the full tree.
            for key in 0..=(n + 1) {
                let version = index.remove(&key);
                let stats = version.validate().unwrap();
                match key {
                    0 => assert!(version.ptr_eq(&index)),
                    k if k > n => assert!(version.ptr_eq(&index)),
                    _ => assert_eq!(stats.n_count, (n as usize) - 1, "{:?} {}", perm, key),
                }
                assert!(!version.contains_key(&key));
            }

            // empty it in insertion order.
            let mut version = index.clone();
            for key in perm.iter() {
                version = version.remove(key);
                version.validate().unwrap();
            }
            assert!(version.is_empty());
            assert_eq!(index.len(), n as usize);
        }
    }
}

#[test]
fn test_height_bound() {
    let seed: u64 = random();
    println!("test_height_bound {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    for n in vec![1_usize, 2, 3, 10, 100, 1000, 4095].into_iter() {
        let index: OMap<usize, ()> = (0..n).map(|k| (k, ())).collect();
        let stats = index.validate().unwrap();
        assert!(stats.height as f64 <= height_bound(n), "{} {:?}", n, stats);

        let mut keys: Vec<usize> = (0..n).collect();
        keys.shuffle(&mut rng);
        let index: OMap<usize, ()> = keys.into_iter().map(|k| (k, ())).collect();
        let stats = index.validate().unwrap();
        assert!(stats.height as f64 <= height_bound(n), "{} {:?}", n, stats);
    }
}

#[test]
fn test_structural_sharing() {
    let old: OMap<u32, u32> = (0..500).map(|k| (k * 2, k)).collect();
    let before: Vec<(u32, u32)> = old.iter().collect();
    let height = old.validate().unwrap().height;

    let new = old.set(501, 0);
    new.validate().unwrap();
    assert!(new_nodes(&old, &new) <= 3 * (height + 1));

    let new = old.set(500, 0);
    assert_eq!(new.len(), old.len());
    assert!(new_nodes(&old, &new) <= 3 * (height + 1));

    for key in vec![0, 500, 998].into_iter() {
        let new = old.remove(&key);
        new.validate().unwrap();
        assert!(new_nodes(&old, &new) <= 8 * (height + 1));
    }

    let after: Vec<(u32, u32)> = old.iter().collect();
    assert_eq!(before, after);
    old.validate().unwrap();
}

#[test]
fn test_no_op_shares_root() {
    let index: OMap<u32, u32> = (0..100).map(|k| (k, k)).collect();
    let same = index.remove(&1000);
    assert!(same.ptr_eq(&index));
    assert_eq!(same.len(), index.len());

    let other = index.set(0, 0);
    assert!(!other.ptr_eq(&index));
    assert_eq!(other, index);

    let empty: OMap<u32, u32> = OMap::new();
    assert!(empty.remove(&1).ptr_eq(&empty));
}

#[test]
fn test_validate_rejects() {
    let broken = vec![
        // red-red.
        (black(leaf(), 1, red(leaf(), 2, red(leaf(), 3, leaf()))), 3),
        // unequal black-height.
        (black(black(leaf(), 1, leaf()), 2, leaf()), 2),
        // children out of order.
        (black(red(leaf(), 3, leaf()), 2, red(leaf(), 1, leaf())), 3),
        // grand-child out of order.
        (
            black(
                black(leaf(), 2, red(leaf(), 7, leaf())),
                5,
                black(leaf(), 8, leaf()),
            ),
            4,
        ),
        // duplicate key.
        (black(red(leaf(), 1, leaf()), 1, leaf()), 2),
        // red root.
        (red(leaf(), 1, leaf()), 1),
        // count mismatch.
        (black(leaf(), 1, leaf()), 2),
        // transient shades.
        (paint(Color::DoubleBlack, leaf(), 1, leaf()), 1),
        (black(paint(Color::NegativeBlack, leaf(), 1, leaf()), 2, leaf()), 2),
        (black(Tree::DoubleLeaf, 1, leaf()), 1),
        (Tree::DoubleLeaf, 0),
    ];

    for (root, n_count) in broken.into_iter() {
        let repr = describe(&root);
        let index = OMap { root, n_count };
        match index.validate() {
            Err(Error::Fatal(_, _)) => (),
            Ok(stats) => panic!("{} validated {:?}", repr, stats),
        }
    }
}

#[test]
fn test_set_replace() {
    let v1: OMap<u32, &str> = OMap::new();
    let v1 = v1.set(1, "one").set(2, "two");
    let v2 = v1.set(1, "uno");
    assert_eq!(v2.len(), 2);
    assert_eq!(v2.get(&1), Some("uno"));
    assert_eq!(v1.get(&1), Some("one"));
    v2.validate().unwrap();
}

#[test]
#[should_panic]
fn test_insert_into_broken_tree() {
    let index = OMap {
        root: black(Tree::DoubleLeaf, 5, leaf()),
        n_count: 1,
    };
    index.set(1, ());
}
