//! The immutable output wrapper over a finished serialization.
//!
//! A `SerializedTrie` shares the builder's buffer by reference (`Arc`), so
//! producing it copies nothing and it stays valid — and safely readable from
//! any number of threads — after the builder is cleared or rebuilt. The
//! written region runs from `start` to the end of the backing array; its
//! first element is the root node, and every other node is reachable from
//! there by following non-negative forward deltas.

use std::sync::Arc;

use crate::kernels::TrieUnits;

/// A self-contained serialized trie block.
#[derive(Debug, Clone)]
pub struct SerializedTrie<U: TrieUnits> {
    buf: Arc<Vec<U>>,
    start: usize,
}

impl<U: TrieUnits> SerializedTrie<U> {
    pub(crate) fn from_arena_parts(buf: Vec<U>, start: usize) -> Self {
        Self {
            buf: Arc::new(buf),
            start,
        }
    }

    /// Wraps an externally produced element block (for example one read back
    /// from storage). The block must start at its root node.
    pub fn from_elements(elements: Vec<U>) -> Self {
        Self {
            buf: Arc::new(elements),
            start: 0,
        }
    }

    /// The serialized elements, root first.
    #[inline]
    pub fn as_slice(&self) -> &[U] {
        &self.buf[self.start..]
    }

    /// The serialized length in elements.
    pub fn len(&self) -> usize {
        self.buf.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw block as bytes, for storage or transport.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }
}

/// The outcome of walking a sequence through a serialized trie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieResult {
    /// The sequence is not in the trie and no continuation of it is.
    NoMatch,
    /// The sequence is a proper prefix of stored sequences but carries no
    /// value of its own.
    NoValue,
    /// The sequence carries a value and longer stored sequences continue
    /// past it.
    Intermediate(i32),
    /// The sequence carries a value and nothing continues past it.
    Final(i32),
}

impl TrieResult {
    /// The stored value, if the walked sequence carries one.
    pub fn value(self) -> Option<i32> {
        match self {
            TrieResult::Intermediate(value) | TrieResult::Final(value) => Some(value),
            TrieResult::NoMatch | TrieResult::NoValue => None,
        }
    }
}
