use std::collections::HashMap;

use common::{div_or_zero, TranspositionHash};
use engine::{Feature, StateRecord};

use super::{EdgeStore, NodeId};

/// Identifies a decision point independently of the path that reached it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TranspositionKey {
    pub hash: u64,
    pub t: usize,
}

impl TranspositionKey {
    pub fn new<S: TranspositionHash>(state: &S, t: usize) -> Self {
        Self {
            hash: state.transposition_hash(),
            t,
        }
    }
}

/// A decision point. Keeps statistics and may be shared by several chance parents.
#[derive(Debug)]
pub struct ChoiceNode<S, A> {
    id: NodeId,
    parents: Vec<NodeId>,
    edges: EdgeStore<A>,
    visits: u32,
    score: f32,
    record: StateRecord<S, A>,
    key: TranspositionKey,
    features: Vec<Feature>,
}

impl<S, A: Clone + PartialEq> ChoiceNode<S, A> {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        legal_actions: Vec<A>,
        record: StateRecord<S, A>,
        key: TranspositionKey,
    ) -> Self {
        Self {
            id,
            parents: parent.into_iter().collect(),
            edges: EdgeStore::new(legal_actions),
            visits: 0,
            score: 0.0,
            record,
            key,
            features: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub fn edges(&self) -> &EdgeStore<A> {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut EdgeStore<A> {
        &mut self.edges
    }

    pub fn visits(&self) -> u32 {
        self.visits
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn mean_score(&self) -> f32 {
        div_or_zero(self.score, self.visits as f32)
    }

    pub fn record(&self) -> &StateRecord<S, A> {
        &self.record
    }

    pub fn state(&self) -> &S {
        &self.record.state
    }

    pub fn t(&self) -> usize {
        self.record.t
    }

    pub fn key(&self) -> TranspositionKey {
        self.key
    }

    pub fn is_terminal(&self) -> bool {
        self.record.done
    }

    pub fn game_reward(&self) -> f32 {
        self.record.reward
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn is_leaf(&self) -> bool {
        self.edges.is_leaf()
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.edges.is_fully_expanded()
    }

    pub(crate) fn update(&mut self, visits: u32, value: f32) {
        self.visits += visits;
        self.score += value;
    }

    pub(crate) fn add_parent(&mut self, parent: NodeId) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    pub(crate) fn remove_parent(&mut self, parent: NodeId) {
        self.parents.retain(|p| *p != parent);
    }

    pub(crate) fn retain_parents(&mut self, keep: impl FnMut(&NodeId) -> bool) {
        self.parents.retain(keep);
    }

    pub(crate) fn set_features(&mut self, features: Vec<Feature>) {
        self.features = features;
    }
}

/// What reached a chance node through one of its outcome edges.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct OutcomeStats {
    pub visits: u32,
    pub score: f32,
}

/// The random transition following an action.
///
/// Has no statistics of its own. Its visits and score are the sums of what passed through each
/// outcome edge, which equal the outcome child's own statistics unless that child is shared with
/// another chance node.
#[derive(Debug)]
pub struct ChanceNode<S, A> {
    id: NodeId,
    parent: Option<NodeId>,
    action: A,
    outcomes: EdgeStore<S>,
    through: HashMap<NodeId, OutcomeStats>,
}

impl<S: Clone + PartialEq, A> ChanceNode<S, A> {
    pub(crate) fn new(id: NodeId, parent: NodeId, action: A, outcomes: Vec<S>) -> Self {
        Self {
            id,
            parent: Some(parent),
            action,
            outcomes: EdgeStore::new(outcomes),
            through: HashMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn outcomes(&self) -> &EdgeStore<S> {
        &self.outcomes
    }

    pub(crate) fn outcomes_mut(&mut self) -> &mut EdgeStore<S> {
        &mut self.outcomes
    }

    pub fn outcome_stats(&self, child: NodeId) -> OutcomeStats {
        self.through.get(&child).copied().unwrap_or_default()
    }

    pub fn visits(&self) -> u32 {
        self.through.values().map(|stats| stats.visits).sum()
    }

    pub fn score(&self) -> f32 {
        self.through.values().map(|stats| stats.score).sum()
    }

    /// The visit-weighted average of the outcome edges' mean scores.
    pub fn mean_score(&self) -> f32 {
        div_or_zero(self.score(), self.visits() as f32)
    }

    pub(crate) fn update(&mut self, child: NodeId, visits: u32, value: f32) {
        let stats = self.through.entry(child).or_default();
        stats.visits += visits;
        stats.score += value;
    }

    /// Collapses the edge to `child` back to unexpanded, dropping what passed through it.
    pub(crate) fn collapse(&mut self, child: NodeId) -> bool {
        self.through.remove(&child);
        self.outcomes.collapse(child)
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
    }
}

#[derive(Debug)]
pub enum ChanceTreeNode<S, A> {
    Choice(ChoiceNode<S, A>),
    Chance(ChanceNode<S, A>),
}

impl<S: Clone + PartialEq, A: Clone + PartialEq> ChanceTreeNode<S, A> {
    pub fn id(&self) -> NodeId {
        match self {
            ChanceTreeNode::Choice(node) => node.id(),
            ChanceTreeNode::Chance(node) => node.id(),
        }
    }

    pub fn is_chance(&self) -> bool {
        matches!(self, ChanceTreeNode::Chance(_))
    }

    pub fn as_choice(&self) -> Option<&ChoiceNode<S, A>> {
        match self {
            ChanceTreeNode::Choice(node) => Some(node),
            ChanceTreeNode::Chance(_) => None,
        }
    }

    pub fn as_chance(&self) -> Option<&ChanceNode<S, A>> {
        match self {
            ChanceTreeNode::Chance(node) => Some(node),
            ChanceTreeNode::Choice(_) => None,
        }
    }

    pub(crate) fn as_choice_mut(&mut self) -> Option<&mut ChoiceNode<S, A>> {
        match self {
            ChanceTreeNode::Choice(node) => Some(node),
            ChanceTreeNode::Chance(_) => None,
        }
    }

    pub(crate) fn as_chance_mut(&mut self) -> Option<&mut ChanceNode<S, A>> {
        match self {
            ChanceTreeNode::Chance(node) => Some(node),
            ChanceTreeNode::Choice(_) => None,
        }
    }

    pub fn child_ids(&self) -> Vec<NodeId> {
        match self {
            ChanceTreeNode::Choice(node) => node.edges().children().map(|(_, c)| c).collect(),
            ChanceTreeNode::Chance(node) => node.outcomes().children().map(|(_, c)| c).collect(),
        }
    }

    pub fn parent_ids(&self) -> Vec<NodeId> {
        match self {
            ChanceTreeNode::Choice(node) => node.parents().to_vec(),
            ChanceTreeNode::Chance(node) => node.parent().into_iter().collect(),
        }
    }
}
