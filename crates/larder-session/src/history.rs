//! Bounded message history.

use std::collections::VecDeque;
use std::collections::vec_deque;

use serde::{Serialize, Serializer};

/// An ordered sequence with a maximum length that drops its oldest
/// elements once full.
///
/// Unlike a batch-trimming buffer, this drops exactly one element per push
/// past the cap, so the retained elements are always the most recent
/// `max_len` in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedHistory<T> {
    inner: VecDeque<T>,
    max_len: usize,
}

impl<T> BoundedHistory<T> {
    /// Create an empty history holding at most `max_len` elements.
    ///
    /// # Panics
    /// Panics if `max_len` is 0.
    pub fn new(max_len: usize) -> Self {
        assert!(max_len > 0, "max_len must be greater than 0");
        Self {
            inner: VecDeque::new(),
            max_len,
        }
    }

    /// Create from a Vec, keeping only the last `max_len` items.
    ///
    /// # Panics
    /// Panics if `max_len` is 0.
    pub fn from_vec(items: Vec<T>, max_len: usize) -> Self {
        let mut history = Self::new(max_len);
        let skip = items.len().saturating_sub(max_len);
        history.inner.extend(items.into_iter().skip(skip));
        history
    }

    /// Append an element, returning the one dropped to stay within bounds.
    pub fn push(&mut self, item: T) -> Option<T> {
        let dropped = if self.inner.len() >= self.max_len {
            self.inner.pop_front()
        } else {
            None
        };
        self.inner.push_back(item);
        dropped
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn last(&self) -> Option<&T> {
        self.inner.back()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.inner.iter()
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// The most recent `limit` elements, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<T> {
        let skip = self.inner.len().saturating_sub(limit);
        self.inner.iter().skip(skip).cloned().collect()
    }
}

impl<'a, T> IntoIterator for &'a BoundedHistory<T> {
    type Item = &'a T;
    type IntoIter = vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<T: Serialize> Serialize for BoundedHistory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.inner.iter())
    }
}
