//! Slot arena holding the nodes of one tree.
//!
//! Nodes refer to each other through [`NodeId`] indices instead of pointers,
//! so parent and sibling links never own anything. Removed slots go on a
//! free list and are reused by the next allocation.

use crate::types::NodeId;
use std::ops::{Index, IndexMut};

/// Index-addressed node storage with slot reuse
#[derive(Debug, Clone)]
pub struct NodeArena<T> {
    /// Node slots; `None` marks a freed slot
    slots: Vec<Option<T>>,
    /// Free list of slot indices
    free_slots: Vec<usize>,
    /// Number of occupied slots
    live: usize,
}

/// Id for slot `pos`; slots past `u32::MAX` have no id
fn slot_id(pos: usize) -> NodeId {
    match u32::try_from(pos) {
        Ok(raw) => NodeId::new(raw),
        Err(_) => panic!("arena slot {pos} exceeds the node id range"),
    }
}

impl<T> Default for NodeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NodeArena<T> {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            live: 0,
        }
    }

    /// Store a node and return its id
    ///
    /// # Panics
    ///
    /// Panics if the arena already holds `u32::MAX + 1` slots.
    pub fn alloc(&mut self, node: T) -> NodeId {
        if let Some(pos) = self.free_slots.pop() {
            self.slots[pos] = Some(node);
            self.live += 1;
            return slot_id(pos);
        }
        let id = slot_id(self.slots.len());
        self.slots.push(Some(node));
        self.live += 1;
        id
    }

    /// Take a node out of the arena, freeing its slot
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node.
    pub fn remove(&mut self, id: NodeId) -> T {
        match self.slots.get_mut(id.index()).and_then(Option::take) {
            Some(node) => {
                self.free_slots.push(id.index());
                self.live -= 1;
                node
            }
            None => panic!("node {id} is not live"),
        }
    }

    /// Get a node, or `None` if the slot is free or out of range
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Get a node mutably, or `None` if the slot is free or out of range
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drop every node and reset the free list
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_slots.clear();
        self.live = 0;
    }
}

impl<T> Index<NodeId> for NodeArena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(node) => node,
            None => panic!("node {id} is not live"),
        }
    }
}

impl<T> IndexMut<NodeId> for NodeArena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("node {id} is not live"),
        }
    }
}
