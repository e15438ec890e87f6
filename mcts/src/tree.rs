use anyhow::{anyhow, ensure, Result};
use engine::StateRecord;
use itertools::Itertools;
use rand::prelude::{SeedableRng, SliceRandom, StdRng};

use super::{Node, NodeArena, NodeId};

#[cfg(test)]
mod tests;

pub struct Tree<S, A> {
    arena: NodeArena<Node<S, A>>,
    root: NodeId,
}

impl<S, A: Clone + PartialEq> Tree<S, A> {
    pub fn new(legal_actions: Vec<A>, record: StateRecord<S, A>) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.push(|id| Node::new(id, None, None, legal_actions, record));

        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node<S, A> {
        &self.arena[self.root]
    }

    pub(crate) fn root_node_mut(&mut self) -> &mut Node<S, A> {
        &mut self.arena[self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node<S, A>> {
        self.arena.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<S, A>> {
        self.arena.get_mut(id)
    }

    pub fn node(&self, id: NodeId) -> &Node<S, A> {
        &self.arena[id]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn child(&self, id: NodeId, action: &A) -> Option<NodeId> {
        self.arena.get(id).and_then(|n| n.edges().child(action))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (&A, NodeId)> {
        self.arena[id].edges().children()
    }

    /// Adds the node reached by playing `action` from `parent`.
    pub fn insert(
        &mut self,
        parent: NodeId,
        action: A,
        legal_actions: Vec<A>,
        record: StateRecord<S, A>,
    ) -> Result<NodeId> {
        let parent_node = self
            .arena
            .get(parent)
            .ok_or_else(|| anyhow!("Parent {} is not in the tree", parent))?;

        ensure!(
            parent_node.edges().is_available(&action),
            "Action is not available at node {}",
            parent
        );

        let child = self.arena.push(|id| {
            Node::new(id, Some(parent), Some(action.clone()), legal_actions, record)
        });

        self.arena[parent].edges_mut().set_expanded(&action, child)?;

        Ok(child)
    }

    /// Removes `id` and all of its descendants. The parent's edge becomes unexpanded again.
    pub fn delete_subtree(&mut self, id: NodeId) {
        assert_ne!(id, self.root, "The root cannot be deleted");

        if let Some(parent) = self.arena.get(id).and_then(|n| n.parent()) {
            if let Some(parent) = self.arena.get_mut(parent) {
                parent.edges_mut().collapse(id);
            }
        }

        self.remove_descendants(id);
    }

    /// Makes `id`, a child of the root, the new root and discards everything else.
    pub fn keep_subtree(&mut self, id: NodeId) {
        let old_root = self.root;

        assert!(
            self.arena[old_root].edges().key_of(id).is_some(),
            "Node {} is not a child of the root",
            id
        );

        let siblings = self
            .children(old_root)
            .map(|(_, child)| child)
            .filter(|child| *child != id)
            .collect_vec();

        for sibling in siblings {
            self.remove_descendants(sibling);
        }

        self.arena.remove(old_root);
        self.arena[id].clear_parent();
        self.root = id;

        debug_assert_eq!(self.arena.len(), self.subtree_size(id));
    }

    /// Children of `id` from best to worst: most visits, then highest score. Remaining ties are
    /// broken by a shuffle seeded with `salt`, so the same salt always gives the same order.
    pub fn ranked_children(&self, id: NodeId, salt: u64) -> Vec<NodeId> {
        let mut children = self.children(id).map(|(_, child)| child).collect_vec();
        children.shuffle(&mut StdRng::seed_from_u64(salt));

        children
            .into_iter()
            .sorted_by(|a, b| {
                let (a, b) = (&self.arena[*a], &self.arena[*b]);
                b.visits()
                    .cmp(&a.visits())
                    .then_with(|| b.score().total_cmp(&a.score()))
            })
            .collect()
    }

    pub fn best_child(&self, id: NodeId, salt: u64) -> Option<NodeId> {
        self.ranked_children(id, salt).into_iter().next()
    }

    pub fn subtree_size(&self, id: NodeId) -> usize {
        let mut size = 0;
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            if let Some(node) = self.arena.get(id) {
                size += 1;
                stack.extend(node.edges().children().map(|(_, child)| child));
            }
        }

        size
    }

    fn remove_descendants(&mut self, id: NodeId) {
        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            if let Some(node) = self.arena.remove(id) {
                stack.extend(node.edges().children().map(|(_, child)| child));
            }
        }
    }
}
