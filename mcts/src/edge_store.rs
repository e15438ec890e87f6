use anyhow::{anyhow, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use super::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EdgeState {
    Unexpanded,
    Expanded(NodeId),
}

#[derive(Clone, Debug)]
pub struct Edge<K> {
    key: K,
    state: EdgeState,
}

impl<K> Edge<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn state(&self) -> EdgeState {
        self.state
    }

    pub fn child(&self) -> Option<NodeId> {
        match self.state {
            EdgeState::Expanded(id) => Some(id),
            EdgeState::Unexpanded => None,
        }
    }
}

/// Outgoing edges of a node, keyed by action (or by outcome state for chance nodes).
///
/// A key is in `available` exactly while its edge is unexpanded.
#[derive(Clone, Debug)]
pub struct EdgeStore<K> {
    edges: Vec<Edge<K>>,
    available: Vec<K>,
}

impl<K: Clone + PartialEq> EdgeStore<K> {
    pub fn new(keys: Vec<K>) -> Self {
        let edges = keys
            .iter()
            .map(|key| Edge {
                key: key.clone(),
                state: EdgeState::Unexpanded,
            })
            .collect();

        Self {
            edges,
            available: keys,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge<K>> {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.edges.iter().any(|e| &e.key == key)
    }

    pub fn child(&self, key: &K) -> Option<NodeId> {
        self.edges
            .iter()
            .find(|e| &e.key == key)
            .and_then(|e| e.child())
    }

    pub fn key_of(&self, child: NodeId) -> Option<&K> {
        self.edges
            .iter()
            .find(|e| e.state == EdgeState::Expanded(child))
            .map(|e| &e.key)
    }

    pub fn children(&self) -> impl Iterator<Item = (&K, NodeId)> {
        self.edges
            .iter()
            .filter_map(|e| e.child().map(|child| (&e.key, child)))
    }

    pub fn available(&self) -> &[K] {
        &self.available
    }

    pub fn is_available(&self, key: &K) -> bool {
        self.available.contains(key)
    }

    /// True when no edge leads to a realized child.
    pub fn is_leaf(&self) -> bool {
        self.edges.iter().all(|e| e.state == EdgeState::Unexpanded)
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.available.is_empty()
    }

    pub fn random_available<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&K> {
        self.available.choose(rng)
    }

    pub fn set_expanded(&mut self, key: &K, child: NodeId) -> Result<()> {
        let idx = self
            .available
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| anyhow!("Edge is not available for expansion"))?;

        self.available.swap_remove(idx);

        let edge = self
            .edges
            .iter_mut()
            .find(|e| &e.key == key)
            .ok_or_else(|| anyhow!("Available key has no edge"))?;

        edge.state = EdgeState::Expanded(child);

        Ok(())
    }

    /// Drops an edge entirely. Returns the state it was in.
    pub fn remove(&mut self, key: &K) -> Option<EdgeState> {
        let idx = self.edges.iter().position(|e| &e.key == key)?;
        let edge = self.edges.remove(idx);
        self.available.retain(|k| k != key);
        Some(edge.state)
    }

    /// Turns the edge leading to `child` back into an unexpanded edge.
    pub fn collapse(&mut self, child: NodeId) -> bool {
        match self
            .edges
            .iter_mut()
            .find(|e| e.state == EdgeState::Expanded(child))
        {
            Some(edge) => {
                edge.state = EdgeState::Unexpanded;
                self.available.push(edge.key.clone());
                true
            }
            None => false,
        }
    }
}
