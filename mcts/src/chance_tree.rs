use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{anyhow, ensure, Result};
use common::{div_or_zero, TranspositionHash};
use engine::StateRecord;
use itertools::Itertools;
use rand::prelude::{SeedableRng, SliceRandom, StdRng};

use super::{ChanceNode, ChanceTreeNode, ChoiceNode, NodeArena, NodeId, TranspositionKey};


/// A search graph of alternating choice and chance nodes.
///
/// Choice nodes are unique per `TranspositionKey`; a choice node reached through several chance
/// nodes lists all of them as parents. The root of a new tree is always a choice node.
pub struct ChanceTree<S, A> {
    arena: NodeArena<ChanceTreeNode<S, A>>,
    root: NodeId,
    transpositions: HashMap<TranspositionKey, NodeId>,
}

impl<S, A> ChanceTree<S, A>
where
    S: Clone + PartialEq + TranspositionHash,
    A: Clone + PartialEq,
{
    pub fn new(legal_actions: Vec<A>, record: StateRecord<S, A>) -> Self {
        let key = TranspositionKey::new(&record.state, record.t);
        let mut arena = NodeArena::new();
        let root = arena.push(|id| {
            ChanceTreeNode::Choice(ChoiceNode::new(id, None, legal_actions, record, key))
        });

        Self {
            arena,
            root,
            transpositions: [(key, root)].into_iter().collect(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &ChanceTreeNode<S, A> {
        &self.arena[self.root]
    }

    pub fn get(&self, id: NodeId) -> Option<&ChanceTreeNode<S, A>> {
        self.arena.get(id)
    }

    pub fn node(&self, id: NodeId) -> &ChanceTreeNode<S, A> {
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

    pub fn transposition_count(&self) -> usize {
        self.transpositions.len()
    }

    pub fn choice(&self, id: NodeId) -> &ChoiceNode<S, A> {
        self.arena[id]
            .as_choice()
            .unwrap_or_else(|| panic!("Node {} is not a choice node", id))
    }

    pub fn chance(&self, id: NodeId) -> &ChanceNode<S, A> {
        self.arena[id]
            .as_chance()
            .unwrap_or_else(|| panic!("Node {} is not a chance node", id))
    }

    pub(crate) fn choice_mut(&mut self, id: NodeId) -> &mut ChoiceNode<S, A> {
        self.arena[id]
            .as_choice_mut()
            .unwrap_or_else(|| panic!("Node {} is not a choice node", id))
    }

    pub fn find_choice(&self, key: &TranspositionKey) -> Option<NodeId> {
        self.transpositions.get(key).copied()
    }

    pub fn insert_chance(&mut self, parent: NodeId, action: A, outcomes: Vec<S>) -> Result<NodeId> {
        let parent_node = match self.arena.get(parent) {
            Some(ChanceTreeNode::Choice(node)) => node,
            Some(ChanceTreeNode::Chance(_)) => {
                panic!("Chance node {} cannot be the parent of a chance node", parent)
            }
            None => return Err(anyhow!("Parent {} is not in the tree", parent)),
        };

        ensure!(
            parent_node.edges().is_available(&action),
            "Action is not available at node {}",
            parent
        );

        let child = self.arena.push(|id| {
            ChanceTreeNode::Chance(ChanceNode::new(id, parent, action.clone(), outcomes))
        });

        self.choice_mut(parent).edges_mut().set_expanded(&action, child)?;

        Ok(child)
    }

    pub fn insert_choice(
        &mut self,
        parent: NodeId,
        outcome: S,
        legal_actions: Vec<A>,
        record: StateRecord<S, A>,
    ) -> Result<NodeId> {
        self.ensure_outcome_available(parent, &outcome)?;

        let key = TranspositionKey::new(&record.state, record.t);
        ensure!(
            !self.transpositions.contains_key(&key),
            "A choice node for {:?} already exists",
            key
        );

        let child = self.arena.push(|id| {
            ChanceTreeNode::Choice(ChoiceNode::new(id, Some(parent), legal_actions, record, key))
        });

        self.chance_mut(parent)
            .outcomes_mut()
            .set_expanded(&outcome, child)?;
        self.transpositions.insert(key, child);

        Ok(child)
    }

    /// Links an existing choice node as the `outcome` child of another chance node.
    pub fn attach_choice(&mut self, parent: NodeId, outcome: &S, choice: NodeId) -> Result<()> {
        self.ensure_outcome_available(parent, outcome)?;

        match self.arena.get_mut(choice) {
            Some(ChanceTreeNode::Choice(node)) => node.add_parent(parent),
            Some(ChanceTreeNode::Chance(_)) => {
                panic!("Chance node {} cannot be the child of a chance node", choice)
            }
            None => return Err(anyhow!("Node {} is not in the tree", choice)),
        }

        self.chance_mut(parent)
            .outcomes_mut()
            .set_expanded(outcome, choice)
    }

    /// Removes `id` and every node only reachable through it.
    pub fn delete_subtree(&mut self, id: NodeId) {
        assert_ne!(id, self.root, "The root cannot be deleted");

        let parents = match self.arena.get(id) {
            Some(node) => node.parent_ids(),
            None => return,
        };

        for parent in parents {
            match self.arena.get_mut(parent) {
                Some(ChanceTreeNode::Choice(node)) => {
                    node.edges_mut().collapse(id);
                }
                Some(ChanceTreeNode::Chance(node)) => {
                    node.collapse(id);
                }
                None => {}
            }
        }

        let mut stack = vec![id];

        while let Some(id) = stack.pop() {
            let node = match self.arena.remove(id) {
                Some(node) => node,
                None => continue,
            };

            if let ChanceTreeNode::Choice(choice) = &node {
                if self.transpositions.get(&choice.key()) == Some(&id) {
                    self.transpositions.remove(&choice.key());
                }
            }

            for child in node.child_ids() {
                match self.arena.get_mut(child) {
                    Some(ChanceTreeNode::Choice(choice)) => {
                        choice.remove_parent(id);
                        if choice.parents().is_empty() {
                            stack.push(child);
                        }
                    }
                    Some(ChanceTreeNode::Chance(_)) => stack.push(child),
                    None => {}
                }
            }
        }
    }

    /// Makes `id`, a child of the root, the new root and discards every node it cannot reach.
    pub fn keep_subtree(&mut self, id: NodeId) {
        assert!(
            self.arena[self.root].child_ids().contains(&id),
            "Node {} is not a child of the root",
            id
        );

        let reachable = self.reachable_from(id);

        self.arena.retain(|node| reachable.contains(&node));
        self.transpositions.retain(|_, node| reachable.contains(node));

        for (node_id, node) in self.arena.iter_mut() {
            match node {
                ChanceTreeNode::Choice(choice) => {
                    choice.retain_parents(|parent| reachable.contains(parent))
                }
                ChanceTreeNode::Chance(chance) if node_id == id => chance.clear_parent(),
                ChanceTreeNode::Chance(_) => {}
            }
        }

        self.root = id;

        debug_assert_eq!(self.arena.len(), reachable.len());
    }

    pub fn visits(&self, id: NodeId) -> u32 {
        match &self.arena[id] {
            ChanceTreeNode::Choice(node) => node.visits(),
            ChanceTreeNode::Chance(node) => node.visits(),
        }
    }

    pub fn score(&self, id: NodeId) -> f32 {
        match &self.arena[id] {
            ChanceTreeNode::Choice(node) => node.score(),
            ChanceTreeNode::Chance(node) => node.score(),
        }
    }

    pub fn mean_score(&self, id: NodeId) -> f32 {
        div_or_zero(self.score(id), self.visits(id) as f32)
    }

    pub fn ranked_children(&self, id: NodeId, salt: u64) -> Vec<NodeId> {
        let mut children = self.arena[id].child_ids();
        children.shuffle(&mut StdRng::seed_from_u64(salt));

        children
            .into_iter()
            .sorted_by(|a, b| {
                self.visits(*b)
                    .cmp(&self.visits(*a))
                    .then_with(|| self.score(*b).total_cmp(&self.score(*a)))
            })
            .collect()
    }

    pub fn best_child(&self, id: NodeId, salt: u64) -> Option<NodeId> {
        self.ranked_children(id, salt).into_iter().next()
    }

    pub(crate) fn chance_mut(&mut self, id: NodeId) -> &mut ChanceNode<S, A> {
        self.arena[id]
            .as_chance_mut()
            .unwrap_or_else(|| panic!("Node {} is not a chance node", id))
    }

    fn ensure_outcome_available(&self, parent: NodeId, outcome: &S) -> Result<()> {
        let parent_node = match self.arena.get(parent) {
            Some(ChanceTreeNode::Chance(node)) => node,
            Some(ChanceTreeNode::Choice(_)) => {
                panic!("Choice node {} cannot be the parent of a choice node", parent)
            }
            None => return Err(anyhow!("Parent {} is not in the tree", parent)),
        };

        ensure!(
            parent_node.outcomes().is_available(outcome),
            "Outcome is not an unexpanded outcome of chance node {}",
            parent
        );

        Ok(())
    }

    fn reachable_from(&self, id: NodeId) -> HashSet<NodeId> {
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(id);

        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id) {
                continue;
            }

            if let Some(node) = self.arena.get(id) {
                queue.extend(node.child_ids());
            }
        }

        reachable
    }
}
