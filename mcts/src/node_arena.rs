use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::ops::{Index, IndexMut};

#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn from_u32(i: u32) -> Self {
        Self(i)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns every node of a tree, keyed by id.
///
/// Ids are handed out in increasing order and never reused, so a stale id can only miss.
pub struct NodeArena<T> {
    nodes: HashMap<NodeId, T>,
    next_id: u32,
}

impl<T> NodeArena<T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn push(&mut self, make_node: impl FnOnce(NodeId) -> T) -> NodeId {
        let id = NodeId::from_u32(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, make_node(id));
        id
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(&id)
    }

    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        self.nodes.remove(&id)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.nodes.retain(|id, _| keep(*id));
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut T)> {
        self.nodes.iter_mut().map(|(id, node)| (*id, node))
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("Node {} is not in the tree", id))
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        self.nodes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("Node {} is not in the tree", id))
    }
}
