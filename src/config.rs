//! The single source of truth for all packtrie build configuration.
//!
//! This module defines the `BuildMode` knob that callers pass to `build`, and
//! the `TriePolicy` struct that parameterizes the one generic build algorithm
//! for each element width. A policy is a set of compile-time constants carried
//! by the element type; keeping it as a plain struct (rather than a trait
//! object) lets the core algorithm be written once and instantiated for both
//! the byte-oriented and the 16-bit-unit-oriented variants.

use serde::{Deserialize, Serialize};

//==================================================================================
// I. Build Mode
//==================================================================================

/// Defines the trade-off between build speed and final serialized size.
///
/// This enum is the primary input to `build`. It guides the node registry
/// without the caller needing to know the specifics of subtree deduplication.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Prioritizes build speed over output size. Nodes are serialized with
    /// minimal reuse passes; structurally identical subtrees may be emitted
    /// more than once.
    Fast,

    /// Prioritizes the smallest possible serialized form at the cost of build
    /// time. Every node is registered in a hash-consing table so that
    /// structurally identical subtrees are serialized exactly once.
    #[default]
    Small,
}

//==================================================================================
// II. Per-Variant Policy
//==================================================================================

/// The per-element-width constants that parameterize the generic builder and
/// serializer. Each trie variant carries one of these as an associated
/// constant on its element type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriePolicy {
    /// The node-type tag at which linear-match leads begin. Leads below this
    /// value are branch nodes; leads in
    /// `min_linear_match..min_linear_match + max_linear_match_length` are
    /// linear-match nodes of run length 1 and up.
    pub min_linear_match: u32,

    /// The longest run a single linear-match node may carry. Longer runs are
    /// chunked into a chain of maximal linear-match nodes.
    pub max_linear_match_length: usize,

    /// The largest branch fan-out serialized as a flat linear-scan list.
    /// Above this, the serializer emits a recursive binary split so that
    /// reader-side dispatch stays logarithmic.
    pub max_branch_linear_sub_node_length: usize,

    /// Whether linear-match and branch nodes can carry a value directly in
    /// their head. When false, a value landing on a match node is expressed
    /// as an explicit intermediate-value node in front of it. This is the key
    /// behavioral difference between the byte and 16-bit variants.
    pub match_nodes_can_have_values: bool,
}
