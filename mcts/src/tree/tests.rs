use engine::{Player, StateRecord};

use super::*;

fn record(state: u32, t: usize) -> StateRecord<u32, u8> {
    StateRecord {
        state,
        last_action: None,
        done: false,
        reward: 0.0,
        player: Player::Agent,
        t,
    }
}

/// root -> {1 -> {3, 4}, 2}
fn make_tree() -> (Tree<u32, u8>, Vec<NodeId>) {
    let mut tree = Tree::new(vec![1, 2], record(0, 0));
    let root = tree.root();
    let a = tree.insert(root, 1, vec![3, 4], record(1, 1)).unwrap();
    let b = tree.insert(root, 2, vec![], record(2, 1)).unwrap();
    let c = tree.insert(a, 3, vec![], record(3, 2)).unwrap();
    let d = tree.insert(a, 4, vec![], record(4, 2)).unwrap();

    (tree, vec![root, a, b, c, d])
}

#[test]
fn test_root_is_id_zero() {
    let tree = Tree::new(vec![1u8], record(0, 0));

    assert_eq!(tree.root().as_u32(), 0);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.root_node().parent(), None);
}

#[test]
fn test_insert_links_parent_and_child() {
    let (tree, ids) = make_tree();

    assert_eq!(tree.len(), 5);
    assert_eq!(tree.child(ids[0], &1), Some(ids[1]));
    assert_eq!(tree.node(ids[3]).parent(), Some(ids[1]));
    assert_eq!(tree.node(ids[3]).action(), Some(&3));
    assert!(tree.root_node().is_fully_expanded());
    assert_eq!(
        ids.iter().map(|id| id.as_u32()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4]
    );
}

#[test]
fn test_insert_rejects_used_or_unknown_action() {
    let (mut tree, ids) = make_tree();

    assert!(tree.insert(ids[0], 1, vec![], record(9, 1)).is_err());
    assert!(tree.insert(ids[0], 7, vec![], record(9, 1)).is_err());
    assert!(tree.insert(NodeId::from_u32(99), 1, vec![], record(9, 1)).is_err());
}

#[test]
fn test_delete_subtree_collapses_parent_edge() {
    let (mut tree, ids) = make_tree();

    tree.delete_subtree(ids[1]);

    assert_eq!(tree.len(), 2);
    assert!(!tree.contains(ids[3]));
    assert!(!tree.contains(ids[4]));
    assert_eq!(tree.child(ids[0], &1), None);
    assert!(tree.root_node().edges().is_available(&1));
}

#[test]
fn test_delete_subtree_twice_is_harmless() {
    let (mut tree, ids) = make_tree();

    tree.delete_subtree(ids[3]);
    tree.delete_subtree(ids[3]);
    tree.delete_subtree(ids[1]);

    assert_eq!(tree.len(), 2);
}

#[test]
#[should_panic]
fn test_delete_root_panics() {
    let (mut tree, ids) = make_tree();

    tree.delete_subtree(ids[0]);
}

#[test]
fn test_keep_subtree() {
    let (mut tree, ids) = make_tree();

    tree.keep_subtree(ids[1]);

    assert_eq!(tree.root(), ids[1]);
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.root_node().parent(), None);
    assert!(!tree.contains(ids[0]));
    assert!(!tree.contains(ids[2]));
    assert!(tree.contains(ids[3]));
}

#[test]
#[should_panic]
fn test_keep_subtree_of_grandchild_panics() {
    let (mut tree, ids) = make_tree();

    tree.keep_subtree(ids[3]);
}

#[test]
fn test_best_child_prefers_visits_then_score() {
    let (mut tree, ids) = make_tree();

    tree.get_mut(ids[1]).unwrap().update(0.0);
    tree.get_mut(ids[1]).unwrap().update(0.0);
    tree.get_mut(ids[2]).unwrap().update(1.0);

    assert_eq!(tree.best_child(ids[0], 0), Some(ids[1]));

    tree.get_mut(ids[3]).unwrap().update(-1.0);
    tree.get_mut(ids[4]).unwrap().update(0.5);

    assert_eq!(tree.ranked_children(ids[1], 0), vec![ids[4], ids[3]]);
}

#[test]
fn test_best_child_tie_break_is_stable_per_salt() {
    let mut tree = Tree::new((0..8).collect(), record(0, 0));
    let root = tree.root();
    for action in 0..8 {
        tree.insert(root, action, vec![], record(action as u32 + 1, 1))
            .unwrap();
    }

    for salt in 0..16 {
        assert_eq!(tree.best_child(root, salt), tree.best_child(root, salt));
    }

    let picks = (0..64)
        .filter_map(|salt| tree.best_child(root, salt))
        .unique()
        .count();

    assert!(picks > 1, "ties should not always resolve to the same child");
}

#[test]
fn test_best_child_of_leaf_is_none() {
    let (tree, ids) = make_tree();

    assert_eq!(tree.best_child(ids[2], 0), None);
}
