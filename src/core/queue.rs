//! # Recency Queue
//!
//! An ordered list where every entry is unique under an equality function.
//! Index 0 is the most recently touched entry.
//!
//! ```text
//! add_first(C):  [A, B, C, D]  →  [C, A, B, D]
//! add_first(E):  [C, A, B, D]  →  [E, C, A, B, D]
//! remove_last(): [E, C, A, B, D]  →  [E, C, A, B]
//! ```
//!
//! The queue never trims itself. Callers enforce a bound once they have
//! placed everything, evicting from the back.

use std::fmt;

pub struct RecencyQueue<T> {
    items: Vec<T>,
    equals: fn(&T, &T) -> bool,
}

impl<T: PartialEq> RecencyQueue<T> {
    pub fn new() -> Self {
        Self::with_equality(Vec::new(), <T as PartialEq>::eq)
    }

    /// Hydrates a queue from persisted entries. Later duplicates are dropped.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self::with_equality(items, <T as PartialEq>::eq)
    }
}

impl<T: PartialEq> Default for RecencyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecencyQueue<T> {
    pub fn with_equality(items: Vec<T>, equals: fn(&T, &T) -> bool) -> Self {
        let mut unique: Vec<T> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|kept| equals(kept, &item)) {
                unique.push(item);
            }
        }
        Self {
            items: unique,
            equals,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.position(|candidate| (self.equals)(candidate, item))
    }

    pub fn position(&self, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        self.items.iter().position(predicate)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Moves `item` to the front, replacing any equal entry.
    pub fn add_first(&mut self, item: T) {
        self.remove(&item);
        self.items.insert(0, item);
    }

    pub fn remove_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn remove(&mut self, item: &T) -> Option<T> {
        let index = self.index_of(item)?;
        Some(self.items.remove(index))
    }

    pub fn remove_where(&mut self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        let index = self.position(predicate)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: Clone> RecencyQueue<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}

impl<T: Clone> Clone for RecencyQueue<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            equals: self.equals,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for RecencyQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.iter()).finish()
    }
}
