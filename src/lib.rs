//! This file is the root of the `packtrie` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`builder`,
//!     `kernels`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the public API surface: the two builder variants, their
//!     readers, the serialized block wrapper, and the configuration and
//!     error types.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod config;
pub mod error;

mod arena;
mod builder;
mod bytes_trie;
mod graph;
mod kernels;
mod output;
mod units_trie;

#[cfg(test)]
mod roundtrip_tests;

//==================================================================================
// 2. Public API
//==================================================================================
pub use bytes_trie::{BytesTrie, BytesTrieBuilder};
pub use config::{BuildMode, TriePolicy};
pub use error::TrieError;
pub use kernels::TrieUnits;
pub use output::{SerializedTrie, TrieResult};
pub use units_trie::{UnitsTrie, UnitsTrieBuilder};
