//! Persistent append-only list.
//!
//! Appending returns a new list that shares every existing node with the
//! receiver, so builders can hand out new versions in O(1) without ever
//! mutating a list another builder still holds.

use std::fmt;
use std::sync::Arc;

struct Node<T> {
    value: T,
    prev: Option<Arc<Node<T>>>,
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        // Unlink iteratively so long lists do not recurse on drop.
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            match Arc::try_unwrap(node) {
                Ok(mut node) => prev = node.prev.take(),
                Err(_) => break,
            }
        }
    }
}

/// Immutable list; `push` shares the prefix with the receiver.
pub struct PersistentList<T> {
    tail: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> PersistentList<T> {
    pub fn new() -> Self {
        Self { tail: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// New list with `value` appended.
    #[must_use]
    pub fn push(&self, value: T) -> Self {
        Self {
            tail: Some(Arc::new(Node {
                value,
                prev: self.tail.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Elements in insertion order.
    pub fn to_vec(&self) -> Vec<&T> {
        let mut items = Vec::with_capacity(self.len);
        let mut cursor = self.tail.as_deref();
        while let Some(node) = cursor {
            items.push(&node.value);
            cursor = node.prev.as_deref();
        }
        items.reverse();
        items
    }

    /// Whether both lists are the same version (same shared tail).
    #[cfg(test)]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.tail, &other.tail) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Default for PersistentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PersistentList<T> {
    fn clone(&self) -> Self {
        Self {
            tail: self.tail.clone(),
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

impl<T> FromIterator<T> for PersistentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(PersistentList::new(), |list, value| list.push(value))
    }
}
