//! The 16-bit-unit trie variant: builder and reader over `u16` elements.
//!
//! Sequences are arbitrary `u16` runs; `add_str` accepts Rust strings and
//! re-widens them to UTF-16 code units through a transient, call-scoped
//! buffer. Unlike the byte variant, this variant's policy lets match nodes
//! carry values directly in their lead unit, so a value landing mid-sequence
//! costs no standalone node.

use crate::builder::TrieBuilderCore;
use crate::config::BuildMode;
use crate::error::TrieError;
use crate::kernels::wide_units;
use crate::output::{SerializedTrie, TrieResult};

//==================================================================================
// 1. Builder
//==================================================================================

/// Builds a compact, serialized trie over 16-bit units.
#[derive(Debug)]
pub struct UnitsTrieBuilder {
    core: TrieBuilderCore<u16>,
}

impl UnitsTrieBuilder {
    pub fn new() -> Self {
        Self {
            core: TrieBuilderCore::new(),
        }
    }

    /// Appends one (sequence, value) pair. The empty sequence is permitted
    /// and maps the root itself. Fails with `DuplicateKey` on a repeated
    /// sequence, leaving the store unchanged.
    pub fn add(
        &mut self,
        sequence: impl AsRef<[u16]>,
        value: i32,
    ) -> Result<&mut Self, TrieError> {
        self.core.add(sequence.as_ref(), value)?;
        Ok(self)
    }

    /// Appends a string key, re-widened to UTF-16 code units.
    pub fn add_str(&mut self, sequence: &str, value: i32) -> Result<&mut Self, TrieError> {
        let units: Vec<u16> = sequence.encode_utf16().collect();
        self.core.add(&units, value)?;
        Ok(self)
    }

    /// Builds the trie and returns a reader over it. Fails with `EmptyTrie`
    /// if no entries were added since the last `clear`.
    pub fn build(&mut self, mode: BuildMode) -> Result<UnitsTrie, TrieError> {
        Ok(UnitsTrie::new(self.core.build(mode)?))
    }

    /// Builds the trie and returns the raw serialized block of units.
    pub fn build_serialized(&mut self, mode: BuildMode) -> Result<SerializedTrie<u16>, TrieError> {
        self.core.build(mode)
    }

    /// Discards all entries and detaches from the current buffer; previously
    /// returned tries and blocks remain valid.
    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self
    }
}

impl Default for UnitsTrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================
// 2. Reader
//==================================================================================

/// An immutable 16-bit-unit trie. Cheap to clone and safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct UnitsTrie {
    block: SerializedTrie<u16>,
}

impl UnitsTrie {
    /// Wraps a serialized block whose first element is the root node.
    pub fn new(block: SerializedTrie<u16>) -> Self {
        Self { block }
    }

    /// The underlying serialized block.
    pub fn block(&self) -> &SerializedTrie<u16> {
        &self.block
    }

    /// Walks a full sequence from the root.
    pub fn lookup(&self, sequence: impl AsRef<[u16]>) -> TrieResult {
        walk(self.block.as_slice(), sequence.as_ref())
    }

    /// Walks a string key, re-widened to UTF-16 code units.
    pub fn lookup_str(&self, sequence: &str) -> TrieResult {
        let units: Vec<u16> = sequence.encode_utf16().collect();
        walk(self.block.as_slice(), &units)
    }

    /// The value stored for a sequence, if any.
    pub fn get(&self, sequence: impl AsRef<[u16]>) -> Option<i32> {
        self.lookup(sequence).value()
    }

    /// The value stored for a string key, if any.
    pub fn get_str(&self, sequence: &str) -> Option<i32> {
        self.lookup_str(sequence).value()
    }
}

/// The state-machine walk over a serialized unit trie.
fn walk(buf: &[u16], sequence: &[u16]) -> TrieResult {
    let mut pos = 0usize;
    let mut i = 0usize;
    loop {
        if i == sequence.len() {
            return value_at(buf, pos);
        }
        let lead = buf[pos];
        if wide_units::is_final_lead(lead) {
            // A stored sequence ends here, but input remains.
            return TrieResult::NoMatch;
        }
        let node_type = u32::from(lead & wide_units::TYPE_MASK);
        pos += 1;
        if wide_units::has_value_flag(lead) {
            // The attached value is irrelevant mid-walk.
            pos = wide_units::skip_value(buf, pos);
        }
        if node_type >= wide_units::MIN_LINEAR_MATCH {
            let run = (node_type - wide_units::MIN_LINEAR_MATCH) as usize + 1;
            for k in 0..run {
                if i == sequence.len() {
                    // Input ended inside the run: a strict prefix, no value.
                    return TrieResult::NoValue;
                }
                if sequence[i] != buf[pos + k] {
                    return TrieResult::NoMatch;
                }
                i += 1;
            }
            let (delta, next) = wide_units::read_delta(buf, pos + run);
            pos = next + delta;
        } else {
            let mut fan_out = node_type as usize;
            if fan_out == 0 {
                fan_out = usize::from(buf[pos]);
                pos += 1;
            }
            fan_out += 1;
            let input = sequence[i];
            i += 1;
            match branch_next(buf, pos, fan_out, input, i == sequence.len()) {
                BranchStep::Continue(next_pos) => pos = next_pos,
                BranchStep::Done(result) => return result,
            }
        }
    }
}

enum BranchStep {
    Continue(usize),
    Done(TrieResult),
}

/// Dispatches one input unit through a branch: binary splits down to the
/// flat list, then a linear scan of (key, slot) entries.
fn branch_next(
    buf: &[u16],
    mut pos: usize,
    mut fan_out: usize,
    input: u16,
    input_exhausted: bool,
) -> BranchStep {
    while fan_out > wide_units::MAX_BRANCH_LINEAR_SUB_NODE_LENGTH {
        let pivot = buf[pos];
        pos += 1;
        if input < pivot {
            fan_out >>= 1;
            let (delta, next) = wide_units::read_delta(buf, pos);
            pos = next + delta;
        } else {
            fan_out -= fan_out >> 1;
            pos = wide_units::skip_delta(buf, pos);
        }
    }
    for _ in 0..fan_out {
        let key = buf[pos];
        pos += 1;
        if key == input {
            let slot_lead = buf[pos];
            let (slot, next) = wide_units::read_value(buf, pos);
            if wide_units::is_final_lead(slot_lead) {
                return BranchStep::Done(if input_exhausted {
                    TrieResult::Final(slot)
                } else {
                    TrieResult::NoMatch
                });
            }
            // Non-final slot: the value is the jump distance to the child.
            return BranchStep::Continue(next + slot as usize);
        }
        pos = wide_units::skip_value(buf, pos);
    }
    BranchStep::Done(TrieResult::NoMatch)
}

/// Classifies the node at `pos` as seen by a walk whose input is exhausted.
fn value_at(buf: &[u16], pos: usize) -> TrieResult {
    let lead = buf[pos];
    if wide_units::is_final_lead(lead) {
        let (value, _) = wide_units::read_value(buf, pos);
        TrieResult::Final(value)
    } else if wide_units::has_value_flag(lead) {
        let (value, _) = wide_units::read_value(buf, pos + 1);
        TrieResult::Intermediate(value)
    } else {
        TrieResult::NoValue
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
