//! Pure, stateless serialization kernels for the trie's compact encodings.
//!
//! Each element width has its own kernel module carrying the contract
//! constants (tier boundaries for value and delta encodings, node-type tag
//! space) and the write/read/skip primitives over that element type. The
//! constants are a fixed writer/reader contract: the value, delta, and
//! node-type tag spaces are disjoint by construction, and the readers in
//! `bytes_trie` / `units_trie` consume exactly what these kernels emit.
//!
//! The `TrieUnits` trait is the policy seam: one generic build algorithm in
//! `builder` is instantiated per element width, with all variant-specific
//! behavior confined to the associated `POLICY` constant and the write hooks.

use core::fmt::Debug;
use core::hash::Hash;

use num_traits::{PrimInt, Unsigned};

use crate::arena::TailArena;
use crate::config::TriePolicy;
use crate::error::TrieError;

pub mod byte_units;
pub mod wide_units;

mod sealed {
    /// The element alphabet is fixed: bytes and 16-bit units.
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
}

/// An element type the generic trie core can be instantiated over.
///
/// Implemented for `u8` (byte-oriented tries) and `u16` (16-bit-unit-oriented
/// tries). The bounds mirror the integer-kernel bounds used elsewhere in the
/// crate: elements are small unsigned integers that hash, order, and cast
/// losslessly into the lead-element bit arithmetic.
pub trait TrieUnits:
    sealed::Sealed
    + PrimInt
    + Unsigned
    + Hash
    + Debug
    + Default
    + bytemuck::Pod
    + Send
    + Sync
    + 'static
{
    /// The policy knobs for this element width.
    const POLICY: TriePolicy;
}

/// One entry slot of a serialized branch list: either the child's final value
/// inlined into the branch, or a jump distance to the child node.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BranchSlot {
    FinalValue(i32),
    Jump(usize),
}

/// The variant-specific write hooks the serializer drives. Kept separate from
/// `TrieUnits` so the public trait stays a pure marker + policy carrier.
pub(crate) trait UnitWrite: TrieUnits {
    /// Emits a final-value node.
    fn write_final_value(arena: &mut TailArena<Self>, value: i32) -> Result<(), TrieError>;

    /// Emits a standalone intermediate-value node (only used by variants
    /// whose policy forbids values on match nodes).
    fn write_intermediate_value(arena: &mut TailArena<Self>, value: i32) -> Result<(), TrieError>;

    /// Emits a linear-match head for a run of `run_length` elements, with an
    /// attached value where the policy allows one.
    fn write_linear_head(
        arena: &mut TailArena<Self>,
        run_length: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError>;

    /// Emits a branch head for `fan_out` distinct next elements, with an
    /// attached value where the policy allows one.
    fn write_branch_head(
        arena: &mut TailArena<Self>,
        fan_out: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError>;

    /// Emits one branch list entry slot (inline final value or jump).
    fn write_branch_slot(arena: &mut TailArena<Self>, slot: BranchSlot) -> Result<(), TrieError>;

    /// Emits a compact jump delta (split-branch less-than jumps and
    /// match-node continuation links).
    fn write_delta(arena: &mut TailArena<Self>, delta: usize) -> Result<(), TrieError>;
}
