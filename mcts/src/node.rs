use anyhow::{bail, Result};
use common::div_or_zero;
use engine::{Feature, Player, StateRecord};
use rand::Rng;

use super::{EdgeStore, NodeId};


/// A node of the adversarial / single-agent search tree.
///
/// The record is the model snapshot taken right after the node's action was applied and is
/// never modified afterwards.
#[derive(Debug)]
pub struct Node<S, A> {
    id: NodeId,
    parent: Option<NodeId>,
    action: Option<A>,
    edges: EdgeStore<A>,
    visits: u32,
    score: f32,
    record: StateRecord<S, A>,
    features: Vec<Feature>,
}

impl<S, A: Clone + PartialEq> Node<S, A> {
    pub(crate) fn new(
        id: NodeId,
        parent: Option<NodeId>,
        action: Option<A>,
        legal_actions: Vec<A>,
        record: StateRecord<S, A>,
    ) -> Self {
        Self {
            id,
            parent,
            action,
            edges: EdgeStore::new(legal_actions),
            visits: 0,
            score: 0.0,
            record,
            features: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
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

    pub fn player(&self) -> Player {
        self.record.player
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

    pub fn random_untried_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<A> {
        self.edges.random_available(rng).cloned()
    }

    /// Consumes `action` without creating a child, for a root that was never expanded.
    pub fn ply(&mut self, action: &A) -> Result<()> {
        match self.edges.remove(action) {
            Some(_) => Ok(()),
            None => bail!("Action is not legal at node {}", self.id),
        }
    }

    pub(crate) fn update(&mut self, value: f32) {
        self.visits += 1;
        self.score += value;
    }

    pub(crate) fn set_features(&mut self, features: Vec<Feature>) {
        self.features = features;
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
    }
}
