//! This module contains the pure, stateless kernels and contract constants
//! for the byte-oriented trie encoding (element = `u8`).
//!
//! The tier boundaries below are a fixed writer/reader contract. Three
//! disjoint spaces share the lead byte:
//!
//! - `0x00..=0x0f` — branch-node tags (fan-out minus one, `0` = extended).
//! - `0x10..=0x1f` — linear-match tags (run length 1..=16).
//! - `0x20..=0xff` — value items; bit 0 is the is-final flag and the
//!   remaining seven bits select the tier (0..=4 spill bytes, big-endian).
//!
//! Jump deltas use a separate lead table occupying the full byte range; they
//! never appear where a node lead is expected, so the spaces cannot collide.

use crate::arena::TailArena;
use crate::config::TriePolicy;
use crate::error::TrieError;
use crate::kernels::{BranchSlot, TrieUnits, UnitWrite};

//==================================================================================
// 1. Contract Constants
//==================================================================================

pub(crate) const MAX_BRANCH_LINEAR_SUB_NODE_LENGTH: usize = 5;
pub(crate) const MIN_LINEAR_MATCH: u32 = 0x10;
pub(crate) const MAX_LINEAR_MATCH_LENGTH: usize = 0x10;
pub(crate) const MIN_VALUE_LEAD: u32 = 0x20;
pub(crate) const VALUE_IS_FINAL: u8 = 0x01;

// Compact value tiers, selected by `lead >> 1`.
const MIN_ONE_BYTE_VALUE_LEAD: i32 = 0x10;
const MAX_ONE_BYTE_VALUE: i32 = 0x40;
const MIN_TWO_BYTE_VALUE_LEAD: i32 = MIN_ONE_BYTE_VALUE_LEAD + MAX_ONE_BYTE_VALUE + 1; // 0x51
const MIN_THREE_BYTE_VALUE_LEAD: i32 = 0x6c;
const MAX_TWO_BYTE_VALUE: i32 = ((MIN_THREE_BYTE_VALUE_LEAD - MIN_TWO_BYTE_VALUE_LEAD) << 8) - 1; // 0x1aff
const FOUR_BYTE_VALUE_LEAD: i32 = 0x7e;
const MAX_THREE_BYTE_VALUE: i32 = ((FOUR_BYTE_VALUE_LEAD - MIN_THREE_BYTE_VALUE_LEAD) << 16) - 1; // 0x11_ffff
const FIVE_BYTE_VALUE_LEAD: i32 = 0x7f;
const MAX_FOUR_BYTE_VALUE: i32 = 0x00ff_ffff;

// Compact delta tiers, selected by the lead byte itself.
const MAX_ONE_BYTE_DELTA: usize = 0xbf;
const MIN_TWO_BYTE_DELTA_LEAD: usize = MAX_ONE_BYTE_DELTA + 1; // 0xc0
const MIN_THREE_BYTE_DELTA_LEAD: usize = 0xf0;
const MAX_TWO_BYTE_DELTA: usize = ((MIN_THREE_BYTE_DELTA_LEAD - MIN_TWO_BYTE_DELTA_LEAD) << 8) - 1; // 0x2fff
const FOUR_BYTE_DELTA_LEAD: usize = 0xfe;
const MAX_THREE_BYTE_DELTA: usize = ((FOUR_BYTE_DELTA_LEAD - MIN_THREE_BYTE_DELTA_LEAD) << 16) - 1; // 0xd_ffff
const FIVE_BYTE_DELTA_LEAD: usize = 0xff;
const MAX_FOUR_BYTE_DELTA: usize = 0x00ff_ffff;

//==================================================================================
// 2. Write Kernels
//==================================================================================

/// Encodes a 32-bit value with the is-final flag in bit 0 of the lead byte.
/// Spill bytes are big-endian. The full `i32` range is representable.
pub(crate) fn write_value(arena: &mut TailArena<u8>, value: i32, is_final: bool) {
    let final_bit = if is_final { VALUE_IS_FINAL } else { 0 };
    if (0..=MAX_ONE_BYTE_VALUE).contains(&value) {
        arena.push((((MIN_ONE_BYTE_VALUE_LEAD + value) << 1) as u8) | final_bit);
    } else if (0..=MAX_TWO_BYTE_VALUE).contains(&value) {
        arena.push(value as u8);
        arena.push((((MIN_TWO_BYTE_VALUE_LEAD + (value >> 8)) << 1) as u8) | final_bit);
    } else if (0..=MAX_THREE_BYTE_VALUE).contains(&value) {
        arena.push(value as u8);
        arena.push((value >> 8) as u8);
        arena.push((((MIN_THREE_BYTE_VALUE_LEAD + (value >> 16)) << 1) as u8) | final_bit);
    } else if (0..=MAX_FOUR_BYTE_VALUE).contains(&value) {
        arena.push(value as u8);
        arena.push((value >> 8) as u8);
        arena.push((value >> 16) as u8);
        arena.push(((FOUR_BYTE_VALUE_LEAD << 1) as u8) | final_bit);
    } else {
        arena.push(value as u8);
        arena.push((value >> 8) as u8);
        arena.push((value >> 16) as u8);
        arena.push((value >> 24) as u8);
        arena.push(((FIVE_BYTE_VALUE_LEAD << 1) as u8) | final_bit);
    }
}

/// Encodes a non-negative jump distance. Distances above `i32::MAX` are not
/// representable and fail with `ValueOutOfRange`.
pub(crate) fn write_delta(arena: &mut TailArena<u8>, delta: usize) -> Result<(), TrieError> {
    if delta <= MAX_ONE_BYTE_DELTA {
        arena.push(delta as u8);
    } else if delta <= MAX_TWO_BYTE_DELTA {
        arena.push(delta as u8);
        arena.push((MIN_TWO_BYTE_DELTA_LEAD + (delta >> 8)) as u8);
    } else if delta <= MAX_THREE_BYTE_DELTA {
        arena.push(delta as u8);
        arena.push((delta >> 8) as u8);
        arena.push((MIN_THREE_BYTE_DELTA_LEAD + (delta >> 16)) as u8);
    } else if delta <= MAX_FOUR_BYTE_DELTA {
        arena.push(delta as u8);
        arena.push((delta >> 8) as u8);
        arena.push((delta >> 16) as u8);
        arena.push(FOUR_BYTE_DELTA_LEAD as u8);
    } else if delta <= i32::MAX as usize {
        arena.push(delta as u8);
        arena.push((delta >> 8) as u8);
        arena.push((delta >> 16) as u8);
        arena.push((delta >> 24) as u8);
        arena.push(FIVE_BYTE_DELTA_LEAD as u8);
    } else {
        return Err(TrieError::ValueOutOfRange(delta as i64));
    }
    Ok(())
}

//==================================================================================
// 3. Read Kernels (shared by the reader and by the kernel tests)
//==================================================================================

/// True if the byte at a node position is a value item (final or
/// intermediate) rather than a branch or linear-match tag.
#[inline]
pub(crate) fn is_value_lead(lead: u8) -> bool {
    u32::from(lead) >= MIN_VALUE_LEAD
}

#[inline]
pub(crate) fn is_final_lead(lead: u8) -> bool {
    lead & VALUE_IS_FINAL != 0
}

/// Decodes a value item at `pos`. Returns the value and the position just
/// past it.
pub(crate) fn read_value(buf: &[u8], pos: usize) -> (i32, usize) {
    let lead = i32::from(buf[pos] >> 1);
    let p = pos + 1;
    if lead < MIN_TWO_BYTE_VALUE_LEAD {
        (lead - MIN_ONE_BYTE_VALUE_LEAD, p)
    } else if lead < MIN_THREE_BYTE_VALUE_LEAD {
        (
            ((lead - MIN_TWO_BYTE_VALUE_LEAD) << 8) | i32::from(buf[p]),
            p + 1,
        )
    } else if lead < FOUR_BYTE_VALUE_LEAD {
        (
            ((lead - MIN_THREE_BYTE_VALUE_LEAD) << 16)
                | (i32::from(buf[p]) << 8)
                | i32::from(buf[p + 1]),
            p + 2,
        )
    } else if lead == FOUR_BYTE_VALUE_LEAD {
        (
            (i32::from(buf[p]) << 16) | (i32::from(buf[p + 1]) << 8) | i32::from(buf[p + 2]),
            p + 3,
        )
    } else {
        let raw = (u32::from(buf[p]) << 24)
            | (u32::from(buf[p + 1]) << 16)
            | (u32::from(buf[p + 2]) << 8)
            | u32::from(buf[p + 3]);
        (raw as i32, p + 4)
    }
}

/// Advances past a value item without decoding it.
pub(crate) fn skip_value(buf: &[u8], pos: usize) -> usize {
    let lead = i32::from(buf[pos] >> 1);
    if lead < MIN_TWO_BYTE_VALUE_LEAD {
        pos + 1
    } else if lead < MIN_THREE_BYTE_VALUE_LEAD {
        pos + 2
    } else if lead < FOUR_BYTE_VALUE_LEAD {
        pos + 3
    } else if lead == FOUR_BYTE_VALUE_LEAD {
        pos + 4
    } else {
        pos + 5
    }
}

/// Decodes a jump delta at `pos`. Returns the delta and the position just
/// past it; the jump target is that position plus the delta.
pub(crate) fn read_delta(buf: &[u8], pos: usize) -> (usize, usize) {
    let lead = usize::from(buf[pos]);
    let p = pos + 1;
    if lead < MIN_TWO_BYTE_DELTA_LEAD {
        (lead, p)
    } else if lead < MIN_THREE_BYTE_DELTA_LEAD {
        (
            ((lead - MIN_TWO_BYTE_DELTA_LEAD) << 8) | usize::from(buf[p]),
            p + 1,
        )
    } else if lead < FOUR_BYTE_DELTA_LEAD {
        (
            ((lead - MIN_THREE_BYTE_DELTA_LEAD) << 16)
                | (usize::from(buf[p]) << 8)
                | usize::from(buf[p + 1]),
            p + 2,
        )
    } else if lead == FOUR_BYTE_DELTA_LEAD {
        (
            (usize::from(buf[p]) << 16) | (usize::from(buf[p + 1]) << 8) | usize::from(buf[p + 2]),
            p + 3,
        )
    } else {
        (
            (usize::from(buf[p]) << 24)
                | (usize::from(buf[p + 1]) << 16)
                | (usize::from(buf[p + 2]) << 8)
                | usize::from(buf[p + 3]),
            p + 4,
        )
    }
}

/// Advances past a jump delta without decoding it.
pub(crate) fn skip_delta(buf: &[u8], pos: usize) -> usize {
    let lead = usize::from(buf[pos]);
    if lead < MIN_TWO_BYTE_DELTA_LEAD {
        pos + 1
    } else if lead < MIN_THREE_BYTE_DELTA_LEAD {
        pos + 2
    } else if lead < FOUR_BYTE_DELTA_LEAD {
        pos + 3
    } else if lead == FOUR_BYTE_DELTA_LEAD {
        pos + 4
    } else {
        pos + 5
    }
}

//==================================================================================
// 4. Trait Wiring
//==================================================================================

impl TrieUnits for u8 {
    const POLICY: TriePolicy = TriePolicy {
        min_linear_match: MIN_LINEAR_MATCH,
        max_linear_match_length: MAX_LINEAR_MATCH_LENGTH,
        max_branch_linear_sub_node_length: MAX_BRANCH_LINEAR_SUB_NODE_LENGTH,
        match_nodes_can_have_values: false,
    };
}

impl UnitWrite for u8 {
    fn write_final_value(arena: &mut TailArena<u8>, value: i32) -> Result<(), TrieError> {
        write_value(arena, value, true);
        Ok(())
    }

    fn write_intermediate_value(arena: &mut TailArena<u8>, value: i32) -> Result<(), TrieError> {
        write_value(arena, value, false);
        Ok(())
    }

    fn write_linear_head(
        arena: &mut TailArena<u8>,
        run_length: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError> {
        if value.is_some() {
            return Err(TrieError::Internal(
                "byte tries express match-node values as intermediate-value nodes".into(),
            ));
        }
        debug_assert!((1..=MAX_LINEAR_MATCH_LENGTH).contains(&run_length));
        arena.push((MIN_LINEAR_MATCH as usize + run_length - 1) as u8);
        Ok(())
    }

    fn write_branch_head(
        arena: &mut TailArena<u8>,
        fan_out: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError> {
        if value.is_some() {
            return Err(TrieError::Internal(
                "byte tries express match-node values as intermediate-value nodes".into(),
            ));
        }
        debug_assert!((2..=256).contains(&fan_out));
        if fan_out - 1 < MIN_LINEAR_MATCH as usize {
            arena.push((fan_out - 1) as u8);
        } else {
            arena.push((fan_out - 1) as u8);
            arena.push(0);
        }
        Ok(())
    }

    fn write_branch_slot(arena: &mut TailArena<u8>, slot: BranchSlot) -> Result<(), TrieError> {
        match slot {
            BranchSlot::FinalValue(value) => {
                write_value(arena, value, true);
                Ok(())
            }
            BranchSlot::Jump(delta) => {
                if delta > i32::MAX as usize {
                    return Err(TrieError::ValueOutOfRange(delta as i64));
                }
                write_value(arena, delta as i32, false);
                Ok(())
            }
        }
    }

    fn write_delta(arena: &mut TailArena<u8>, delta: usize) -> Result<(), TrieError> {
        write_delta(arena, delta)
    }
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
