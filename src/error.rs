//! This module defines the single, unified error type for the entire packtrie
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrieError {
    // =========================================================================
    // === High-Level, Semantic Errors (the builder's domain taxonomy)
    // =========================================================================
    /// The caller added a sequence that is already present in the current
    /// (unbuilt) entry set. The store is left unchanged.
    #[error("duplicate key: a sequence of {0} element(s) was already added in this build generation")]
    DuplicateKey(usize),

    /// `build` was invoked with zero entries. A trie must contain at least
    /// one mapping.
    #[error("cannot build an empty trie: no entries were added since the last clear")]
    EmptyTrie,

    /// `add` was invoked after a build without an intervening `clear`. The
    /// entry set is frozen once the first build has produced a buffer.
    #[error("builder is frozen: call clear() before adding entries after a build")]
    BuilderFrozen,

    // =========================================================================
    // === Low-Level Serialization Errors
    // =========================================================================
    /// A value or jump distance fell outside the encodable range for the
    /// active trie variant. Surfaced during serialization.
    #[error("value {0} is outside the encodable range for this trie variant")]
    ValueOutOfRange(i64),

    /// An invariant was broken inside the builder or serializer.
    #[error("internal logic error (this is a bug): {0}")]
    Internal(String),
}
