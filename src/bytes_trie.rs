//! The byte-oriented trie variant: builder and reader over `u8` elements.
//!
//! The builder is a thin public surface over the generic core; everything
//! variant-specific is carried by the `u8` kernel policy. The reader consumes
//! the exact layout the byte kernels emit — any conforming reader can do the
//! same, since a serialized block is self-contained: the root node sits at
//! the start of the written region and all other nodes are reached through
//! non-negative forward deltas.

use crate::builder::TrieBuilderCore;
use crate::config::BuildMode;
use crate::error::TrieError;
use crate::kernels::byte_units;
use crate::output::{SerializedTrie, TrieResult};

//==================================================================================
// 1. Builder
//==================================================================================

/// Builds a compact, serialized byte trie from (byte-sequence, value) pairs.
#[derive(Debug)]
pub struct BytesTrieBuilder {
    core: TrieBuilderCore<u8>,
}

impl BytesTrieBuilder {
    pub fn new() -> Self {
        Self {
            core: TrieBuilderCore::new(),
        }
    }

    /// Appends one (sequence, value) pair. The empty sequence is permitted
    /// and maps the root itself. Fails with `DuplicateKey` if the sequence
    /// was already added in this build generation, leaving the store
    /// unchanged.
    pub fn add(
        &mut self,
        sequence: impl AsRef<[u8]>,
        value: i32,
    ) -> Result<&mut Self, TrieError> {
        self.core.add(sequence.as_ref(), value)?;
        Ok(self)
    }

    /// Builds the trie and returns a reader over it. Fails with `EmptyTrie`
    /// if no entries were added since the last `clear`. Repeated calls
    /// return readers over the already-produced buffer.
    pub fn build(&mut self, mode: BuildMode) -> Result<BytesTrie, TrieError> {
        Ok(BytesTrie::new(self.core.build(mode)?))
    }

    /// Builds the trie and returns the raw serialized block. The block
    /// aliases the builder's buffer (shared, immutable) until `clear`.
    pub fn build_serialized(&mut self, mode: BuildMode) -> Result<SerializedTrie<u8>, TrieError> {
        self.core.build(mode)
    }

    /// Discards all entries and detaches from the current buffer; previously
    /// returned tries and blocks remain valid.
    pub fn clear(&mut self) -> &mut Self {
        self.core.clear();
        self
    }
}

impl Default for BytesTrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//==================================================================================
// 2. Reader
//==================================================================================

/// An immutable byte trie. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone)]
pub struct BytesTrie {
    block: SerializedTrie<u8>,
}

impl BytesTrie {
    /// Wraps a serialized block whose first element is the root node.
    pub fn new(block: SerializedTrie<u8>) -> Self {
        Self { block }
    }

    /// The underlying serialized block.
    pub fn block(&self) -> &SerializedTrie<u8> {
        &self.block
    }

    /// Walks a full sequence from the root.
    pub fn lookup(&self, sequence: impl AsRef<[u8]>) -> TrieResult {
        walk(self.block.as_slice(), sequence.as_ref())
    }

    /// The value stored for a sequence, if any.
    pub fn get(&self, sequence: impl AsRef<[u8]>) -> Option<i32> {
        self.lookup(sequence).value()
    }
}

/// The state-machine walk over a serialized byte trie.
fn walk(buf: &[u8], sequence: &[u8]) -> TrieResult {
    let mut pos = 0usize;
    let mut i = 0usize;
    loop {
        if i == sequence.len() {
            return value_at(buf, pos);
        }
        let lead = buf[pos];
        if byte_units::is_value_lead(lead) {
            if byte_units::is_final_lead(lead) {
                // A stored sequence ends here, but input remains.
                return TrieResult::NoMatch;
            }
            // Intermediate value: step over it and follow the continuation.
            let after = byte_units::skip_value(buf, pos);
            let (delta, next) = byte_units::read_delta(buf, after);
            pos = next + delta;
        } else if u32::from(lead) >= byte_units::MIN_LINEAR_MATCH {
            let run = (u32::from(lead) - byte_units::MIN_LINEAR_MATCH) as usize + 1;
            pos += 1;
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
            let (delta, next) = byte_units::read_delta(buf, pos + run);
            pos = next + delta;
        } else {
            let mut fan_out = usize::from(lead);
            pos += 1;
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

/// Dispatches one input element through a branch: binary splits down to the
/// flat list, then a linear scan of (key, slot) entries.
fn branch_next(
    buf: &[u8],
    mut pos: usize,
    mut fan_out: usize,
    input: u8,
    input_exhausted: bool,
) -> BranchStep {
    while fan_out > byte_units::MAX_BRANCH_LINEAR_SUB_NODE_LENGTH {
        let pivot = buf[pos];
        pos += 1;
        if input < pivot {
            fan_out >>= 1;
            let (delta, next) = byte_units::read_delta(buf, pos);
            pos = next + delta;
        } else {
            fan_out -= fan_out >> 1;
            pos = byte_units::skip_delta(buf, pos);
        }
    }
    for _ in 0..fan_out {
        let key = buf[pos];
        pos += 1;
        if key == input {
            let slot_lead = buf[pos];
            let (slot, next) = byte_units::read_value(buf, pos);
            if byte_units::is_final_lead(slot_lead) {
                return BranchStep::Done(if input_exhausted {
                    TrieResult::Final(slot)
                } else {
                    TrieResult::NoMatch
                });
            }
            // Non-final slot: the value is the jump distance to the child.
            return BranchStep::Continue(next + slot as usize);
        }
        pos = byte_units::skip_value(buf, pos);
    }
    BranchStep::Done(TrieResult::NoMatch)
}

/// Classifies the node at `pos` as seen by a walk whose input is exhausted.
fn value_at(buf: &[u8], pos: usize) -> TrieResult {
    let lead = buf[pos];
    if byte_units::is_value_lead(lead) {
        let (value, _) = byte_units::read_value(buf, pos);
        if byte_units::is_final_lead(lead) {
            TrieResult::Final(value)
        } else {
            TrieResult::Intermediate(value)
        }
    } else {
        TrieResult::NoValue
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn build(pairs: &[(&[u8], i32)], mode: BuildMode) -> BytesTrie {
        let mut builder = BytesTrieBuilder::new();
        for &(sequence, value) in pairs {
            builder.add(sequence, value).unwrap();
        }
        builder.build(mode).unwrap()
    }

    #[test]
    fn test_prefix_chain_resolves_each_depth() {
        let trie = build(&[(b"a", 1), (b"ab", 2), (b"abc", 3)], BuildMode::Small);
        // "a" carries a value and longer sequences continue past it.
        assert_eq!(trie.lookup(b"a"), TrieResult::Intermediate(1));
        assert_eq!(trie.lookup(b"ab"), TrieResult::Intermediate(2));
        assert_eq!(trie.lookup(b"abc"), TrieResult::Final(3));
        assert_eq!(trie.lookup(b"b"), TrieResult::NoMatch);
        assert_eq!(trie.lookup(b"abcd"), TrieResult::NoMatch);
        assert_eq!(trie.lookup(b""), TrieResult::NoValue);
    }

    #[test]
    fn test_mid_sequence_value_on_branch() {
        let trie = build(&[(b"cat", 10), (b"car", 20), (b"cart", 30)], BuildMode::Small);
        assert_eq!(trie.get(b"cat"), Some(10));
        assert_eq!(trie.lookup(b"car"), TrieResult::Intermediate(20));
        assert_eq!(trie.get(b"cart"), Some(30));
        assert_eq!(trie.get(b"ca"), None);
        assert_eq!(trie.get(b"c"), None);
        assert_eq!(trie.get(b"cab"), None);
    }

    #[test]
    fn test_empty_sequence_maps_the_root() {
        let trie = build(&[(b"", 42), (b"x", 7)], BuildMode::Small);
        assert_eq!(trie.lookup(b""), TrieResult::Intermediate(42));
        assert_eq!(trie.lookup(b"x"), TrieResult::Final(7));
    }

    #[test]
    fn test_single_empty_sequence_is_a_final_root() {
        let trie = build(&[(b"", -9)], BuildMode::Small);
        assert_eq!(trie.lookup(b""), TrieResult::Final(-9));
        assert_eq!(trie.lookup(b"a"), TrieResult::NoMatch);
    }

    #[test]
    fn test_duplicate_add_preserves_original_value() {
        let mut builder = BytesTrieBuilder::new();
        builder.add(b"key", 1).unwrap();
        let err = builder.add(b"key", 2).unwrap_err();
        assert_eq!(err, TrieError::DuplicateKey(3));
        // The store still holds only the original mapping.
        let trie = builder.build(BuildMode::Small).unwrap();
        assert_eq!(trie.get(b"key"), Some(1));
    }

    #[test]
    fn test_empty_build_fails_before_allocation() {
        let mut builder = BytesTrieBuilder::new();
        assert_eq!(
            builder.build(BuildMode::Fast).unwrap_err(),
            TrieError::EmptyTrie
        );
    }

    #[test]
    fn test_clear_then_rebuild_matches_first_build() {
        let pairs: &[(&[u8], i32)] = &[(b"alpha", 1), (b"beta", 2), (b"betas", 3)];
        let mut builder = BytesTrieBuilder::new();
        for &(sequence, value) in pairs {
            builder.add(sequence, value).unwrap();
        }
        let first = builder.build(BuildMode::Small).unwrap();

        builder.clear();
        for &(sequence, value) in pairs {
            builder.add(sequence, value).unwrap();
        }
        let second = builder.build(BuildMode::Small).unwrap();

        for &(sequence, value) in pairs {
            assert_eq!(first.get(sequence), Some(value));
            assert_eq!(second.get(sequence), Some(value));
        }
        // The first trie still works after the rebuild detached its buffer.
        assert_eq!(first.get(b"gamma"), None);
    }

    #[test]
    fn test_shared_suffix_serializes_once_in_small_mode() {
        let shared: &[(&[u8], i32)] = &[(b"xyz", 5), (b"wyz", 5)];
        let distinct: &[(&[u8], i32)] = &[(b"xyz", 5), (b"wyq", 7)];

        let shared_len = build(shared, BuildMode::Small).block().len();
        let distinct_len = build(distinct, BuildMode::Small).block().len();
        assert!(
            shared_len < distinct_len,
            "shared suffix should serialize once ({shared_len} vs {distinct_len})"
        );

        // Fast mode re-emits the suffix, so Small must not be larger.
        let fast_len = build(shared, BuildMode::Fast).block().len();
        assert!(shared_len <= fast_len);
    }

    #[test]
    fn test_wide_branch_uses_binary_split_dispatch() {
        // 26 distinct first bytes forces split sub-nodes (fan-out > 5).
        let mut builder = BytesTrieBuilder::new();
        for (index, first) in (b'a'..=b'z').enumerate() {
            builder.add([first, b'!'], index as i32).unwrap();
        }
        let trie = builder.build(BuildMode::Small).unwrap();
        for (index, first) in (b'a'..=b'z').enumerate() {
            assert_eq!(trie.get([first, b'!']), Some(index as i32));
            assert_eq!(trie.get([first]), None);
        }
        assert_eq!(trie.get(b"A!"), None);
    }

    #[test]
    fn test_extended_fan_out_header() {
        // Fan-out 40 exceeds the inline length tag (15) and needs the
        // extended-length byte.
        let mut builder = BytesTrieBuilder::new();
        for first in 0u8..40 {
            builder.add([first], i32::from(first) * 3).unwrap();
        }
        let trie = builder.build(BuildMode::Small).unwrap();
        for first in 0u8..40 {
            assert_eq!(trie.get([first]), Some(i32::from(first) * 3));
        }
        assert_eq!(trie.get([200u8]), None);
    }

    #[test]
    fn test_extreme_values_roundtrip() {
        let trie = build(
            &[
                (b"min", i32::MIN),
                (b"max", i32::MAX),
                (b"neg", -1),
                (b"mid", 0x0012_3456),
            ],
            BuildMode::Small,
        );
        assert_eq!(trie.get(b"min"), Some(i32::MIN));
        assert_eq!(trie.get(b"max"), Some(i32::MAX));
        assert_eq!(trie.get(b"neg"), Some(-1));
        assert_eq!(trie.get(b"mid"), Some(0x0012_3456));
    }

    #[test]
    fn test_long_keys_cross_linear_chunk_boundary() {
        let long_a = [b'a'; 50];
        let mut long_b = [b'a'; 50];
        long_b[49] = b'b';
        let trie = build(&[(&long_a, 1), (&long_b, 2)], BuildMode::Small);
        assert_eq!(trie.get(long_a), Some(1));
        assert_eq!(trie.get(long_b), Some(2));
        assert_eq!(trie.get(&long_a[..49]), None);
        assert_eq!(trie.lookup(&long_a[..16]), TrieResult::NoValue);
    }
}
