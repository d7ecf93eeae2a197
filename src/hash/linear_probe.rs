//! Linear probing with tombstone deletion.
//!
//! The slot table length is always a power of two, so the home slot is the
//! low bits of the hash. Deleted slots become tombstones: probing walks past
//! them and insertion reuses the first one it meets. Tombstones count toward
//! the load factor, which keeps at least a quarter of the table `Empty` and
//! guarantees every probe sequence ends.

use crate::error::{Result, TreeError};
use crate::store::KvStore;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};
use std::mem;
use tracing::trace;

/// Smallest slot table the map will allocate
pub const MIN_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(K, V),
    Tombstone,
}

/// Where a probe for a key ended
enum Probe {
    /// The key lives in this slot
    Found(usize),
    /// The key is absent; this is the slot an insert should use
    Vacant(usize),
}

/// A hash map using open addressing with linear probing
#[derive(Debug, Clone)]
pub struct LinearProbingMap<K, V, S = RandomState> {
    slots: Vec<Slot<K, V>>,
    /// Occupied slots
    len: usize,
    /// Tombstone slots
    tombstones: usize,
    hash_builder: S,
}

impl<K: Hash + Eq, V> LinearProbingMap<K, V> {
    /// Create a map with the minimum capacity
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    /// Create a map with room for at least `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K: Hash + Eq, V> Default for LinearProbingMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LinearProbingMap<K, V, S> {
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        Self {
            slots: empty_slots(capacity),
            len: 0,
            tombstones: 0,
            hash_builder,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn home(&self, key: &K) -> usize {
        (self.hash_builder.hash_one(key) as usize) & (self.slots.len() - 1)
    }

    fn probe(&self, key: &K) -> Probe {
        let mask = self.slots.len() - 1;
        let mut idx = self.home(key);
        let mut first_tombstone = None;

        loop {
            match &self.slots[idx] {
                Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
                Slot::Occupied(k, _) if k == key => return Probe::Found(idx),
                Slot::Occupied(..) => {}
                Slot::Tombstone => {
                    first_tombstone.get_or_insert(idx);
                }
            }
            idx = (idx + 1) & mask;
        }
    }

    /// Whether one more slot can be consumed without passing 3/4 load
    fn has_room(&self) -> bool {
        (self.len + self.tombstones + 1) * 4 <= self.slots.len() * 3
    }

    /// Rebuild the table, dropping tombstones and doubling when live entries
    /// fill more than half of it
    fn resize(&mut self) {
        let capacity = if (self.len + 1) * 2 > self.slots.len() {
            self.slots.len() * 2
        } else {
            self.slots.len()
        };
        trace!(from = self.slots.len(), to = capacity, tombstones = self.tombstones, "hash resize");

        let old = mem::replace(&mut self.slots, empty_slots(capacity));
        self.tombstones = 0;
        let mask = capacity - 1;
        for slot in old {
            if let Slot::Occupied(key, value) = slot {
                let mut idx = self.home(&key);
                while !matches!(self.slots[idx], Slot::Empty) {
                    idx = (idx + 1) & mask;
                }
                self.slots[idx] = Slot::Occupied(key, value);
            }
        }
    }

    /// Insert or overwrite a pair, returning the previous value
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let idx = match self.probe(&key) {
            Probe::Found(idx) => {
                if let Slot::Occupied(_, old) = &mut self.slots[idx] {
                    return Some(mem::replace(old, value));
                }
                unreachable!("probe found a slot that is not occupied");
            }
            Probe::Vacant(idx) if matches!(self.slots[idx], Slot::Tombstone) => {
                self.tombstones -= 1;
                idx
            }
            Probe::Vacant(idx) if self.has_room() => idx,
            Probe::Vacant(_) => {
                self.resize();
                match self.probe(&key) {
                    Probe::Vacant(idx) => idx,
                    Probe::Found(_) => unreachable!("absent key appeared during resize"),
                }
            }
        };

        self.slots[idx] = Slot::Occupied(key, value);
        self.len += 1;
        None
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match self.probe(key) {
            Probe::Found(idx) => match &self.slots[idx] {
                Slot::Occupied(_, value) => Some(value),
                _ => None,
            },
            Probe::Vacant(_) => None,
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Look up a key, reporting a miss as [`TreeError::KeyNotFound`]
    pub fn search(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(TreeError::KeyNotFound)
    }

    /// Remove a key and leave a tombstone in its slot
    pub fn delete(&mut self, key: &K) -> Result<V> {
        let Probe::Found(idx) = self.probe(key) else {
            return Err(TreeError::KeyNotFound);
        };
        match mem::replace(&mut self.slots[idx], Slot::Tombstone) {
            Slot::Occupied(_, value) => {
                self.len -= 1;
                self.tombstones += 1;
                Ok(value)
            }
            _ => unreachable!("probe found a slot that is not occupied"),
        }
    }

    /// Iterate over the pairs in slot order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || Slot::Empty);
    slots
}

/// Iterator over a [`LinearProbingMap`] in unspecified order
pub struct Iter<'a, K, V> {
    slots: std::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(key, value) = slot {
                self.remaining -= 1;
                return Some((key, value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> KvStore<K, V> for LinearProbingMap<K, V, S> {
    fn insert(&mut self, key: K, value: V) {
        LinearProbingMap::insert(self, key, value);
    }

    fn search(&self, key: &K) -> Result<&V> {
        LinearProbingMap::search(self, key)
    }

    fn delete(&mut self, key: &K) -> Result<V> {
        LinearProbingMap::delete(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
