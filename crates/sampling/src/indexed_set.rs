//! Set with dense positions for O(1) removal and uniform random pops.

use crate::IndexedSetError;
use rand::Rng;
use std::collections::HashMap;
use std::hash::Hash;

/// A set whose members also occupy the dense positions `0..len`.
///
/// Removal swaps the removed item with the last one and fixes the moved
/// item's position, so add, remove and random pop are all O(1) on average.
/// Positions of remaining items change on removal.
#[derive(Debug, Clone)]
pub struct IndexedSet<T> {
    /// Members in position order.
    items: Vec<T>,
    /// Reverse index: member -> position in `items`.
    positions: HashMap<T, usize>,
}

impl<T> Default for IndexedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> IndexedSet<T> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item. Fails if it is already a member.
    pub fn insert(&mut self, item: T) -> Result<(), IndexedSetError> {
        if self.positions.contains_key(&item) {
            return Err(IndexedSetError::Duplicate);
        }
        self.positions.insert(item.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Remove an item. Fails if it is not a member.
    pub fn remove(&mut self, item: &T) -> Result<(), IndexedSetError> {
        if self.try_remove(item) {
            Ok(())
        } else {
            Err(IndexedSetError::NotFound)
        }
    }

    /// Remove an item if present, returning whether it was a member.
    pub fn try_remove(&mut self, item: &T) -> bool {
        let Some(position) = self.positions.remove(item) else {
            return false;
        };

        self.items.swap_remove(position);
        // The former last item now sits at `position`
        if let Some(moved) = self.items.get(position) {
            if let Some(slot) = self.positions.get_mut(moved) {
                *slot = position;
            }
        }
        true
    }

    /// Remove and return the item at `position`.
    pub fn pop_index(&mut self, position: usize) -> Option<T> {
        let item = self.items.get(position)?.clone();
        self.try_remove(&item);
        Some(item)
    }

    /// Remove and return a uniformly random item.
    pub fn pop_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let position = rng.gen_range(0..self.items.len());
        self.pop_index(position)
    }

    /// Get the item at `position`.
    pub fn get(&self, position: usize) -> Option<&T> {
        self.items.get(position)
    }

    /// Get the current position of `item`.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.positions.get(item).copied()
    }

    /// Check membership.
    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Iterate over members in position order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.items.clear();
        self.positions.clear();
    }

    /// Remove and return every member, in position order.
    pub fn drain(&mut self) -> Vec<T> {
        self.positions.clear();
        std::mem::take(&mut self.items)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
