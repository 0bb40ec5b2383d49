//! This module contains the pure, stateless kernels and contract constants
//! for the 16-bit-unit trie encoding (element = `u16`).
//!
//! The lead unit packs three fields:
//!
//! - bit 15 — final-value flag; a set bit makes the whole unit a final-value
//!   item (tiers below).
//! - bit 14 — has-value flag on match-node leads; the attached value follows
//!   the lead as a non-final value item. This variant's policy allows match
//!   nodes to carry values directly, so no standalone intermediate-value
//!   nodes exist in its serialized form.
//! - bits 0..=13 — the node type: branch tags below `0x30` (fan-out minus
//!   one, `0` = extended length unit), linear-match tags `0x30..=0x3f`
//!   (run length 1..=16).
//!
//! Value items and jump deltas spill big-endian into at most two extra units,
//! covering the full `i32` range.

use crate::arena::TailArena;
use crate::config::TriePolicy;
use crate::error::TrieError;
use crate::kernels::{BranchSlot, TrieUnits, UnitWrite};

//==================================================================================
// 1. Contract Constants
//==================================================================================

pub(crate) const MAX_BRANCH_LINEAR_SUB_NODE_LENGTH: usize = 5;
pub(crate) const MIN_LINEAR_MATCH: u32 = 0x30;
pub(crate) const MAX_LINEAR_MATCH_LENGTH: usize = 0x10;
pub(crate) const FINAL_FLAG: u16 = 0x8000;
pub(crate) const HAS_VALUE_FLAG: u16 = 0x4000;
pub(crate) const TYPE_MASK: u16 = 0x3fff;

// Value tiers, selected by the low 15 bits of the lead unit.
const MAX_ONE_UNIT_VALUE: i32 = 0x3fff;
const MIN_TWO_UNIT_VALUE_LEAD: i32 = 0x4000;
const THREE_UNIT_VALUE_LEAD: i32 = 0x7fff;
const MAX_TWO_UNIT_VALUE: i32 =
    ((THREE_UNIT_VALUE_LEAD - 1 - MIN_TWO_UNIT_VALUE_LEAD) << 16) | 0xffff; // 0x3ffe_ffff

// Delta tiers, selected by the full lead unit.
const MAX_ONE_UNIT_DELTA: usize = 0xefff;
const MIN_TWO_UNIT_DELTA_LEAD: usize = 0xf000;
const THREE_UNIT_DELTA_LEAD: usize = 0xffff;
const MAX_TWO_UNIT_DELTA: usize =
    ((THREE_UNIT_DELTA_LEAD - 1 - MIN_TWO_UNIT_DELTA_LEAD) << 16) | 0xffff; // 0x0ffe_ffff

//==================================================================================
// 2. Write Kernels
//==================================================================================

/// Encodes a 32-bit value item. `flags` carries the final bit (or nothing,
/// for non-final items); spill units are big-endian.
pub(crate) fn write_value(arena: &mut TailArena<u16>, value: i32, flags: u16) {
    if (0..=MAX_ONE_UNIT_VALUE).contains(&value) {
        arena.push(flags | value as u16);
    } else if (0..=MAX_TWO_UNIT_VALUE).contains(&value) {
        arena.push(value as u16);
        arena.push(flags | (MIN_TWO_UNIT_VALUE_LEAD + (value >> 16)) as u16);
    } else {
        arena.push(value as u16);
        arena.push((value >> 16) as u16);
        arena.push(flags | THREE_UNIT_VALUE_LEAD as u16);
    }
}

/// Encodes a non-negative jump distance. Distances above `i32::MAX` are not
/// representable and fail with `ValueOutOfRange`.
pub(crate) fn write_delta(arena: &mut TailArena<u16>, delta: usize) -> Result<(), TrieError> {
    if delta <= MAX_ONE_UNIT_DELTA {
        arena.push(delta as u16);
    } else if delta <= MAX_TWO_UNIT_DELTA {
        arena.push(delta as u16);
        arena.push((MIN_TWO_UNIT_DELTA_LEAD + (delta >> 16)) as u16);
    } else if delta <= i32::MAX as usize {
        arena.push(delta as u16);
        arena.push((delta >> 16) as u16);
        arena.push(THREE_UNIT_DELTA_LEAD as u16);
    } else {
        return Err(TrieError::ValueOutOfRange(delta as i64));
    }
    Ok(())
}

//==================================================================================
// 3. Read Kernels
//==================================================================================

#[inline]
pub(crate) fn is_final_lead(lead: u16) -> bool {
    lead & FINAL_FLAG != 0
}

#[inline]
pub(crate) fn has_value_flag(lead: u16) -> bool {
    lead & HAS_VALUE_FLAG != 0
}

/// Decodes a value item at `pos` (final or not; bit 15 of the lead is
/// ignored here). Returns the value and the position just past it.
pub(crate) fn read_value(buf: &[u16], pos: usize) -> (i32, usize) {
    let lead = i32::from(buf[pos] & !FINAL_FLAG);
    let p = pos + 1;
    if lead <= MAX_ONE_UNIT_VALUE {
        (lead, p)
    } else if lead < THREE_UNIT_VALUE_LEAD {
        (
            ((lead - MIN_TWO_UNIT_VALUE_LEAD) << 16) | i32::from(buf[p]),
            p + 1,
        )
    } else {
        let raw = (u32::from(buf[p]) << 16) | u32::from(buf[p + 1]);
        (raw as i32, p + 2)
    }
}

/// Advances past a value item without decoding it.
pub(crate) fn skip_value(buf: &[u16], pos: usize) -> usize {
    let lead = i32::from(buf[pos] & !FINAL_FLAG);
    if lead <= MAX_ONE_UNIT_VALUE {
        pos + 1
    } else if lead < THREE_UNIT_VALUE_LEAD {
        pos + 2
    } else {
        pos + 3
    }
}

/// Decodes a jump delta at `pos`. Returns the delta and the position just
/// past it; the jump target is that position plus the delta.
pub(crate) fn read_delta(buf: &[u16], pos: usize) -> (usize, usize) {
    let lead = usize::from(buf[pos]);
    let p = pos + 1;
    if lead <= MAX_ONE_UNIT_DELTA {
        (lead, p)
    } else if lead < THREE_UNIT_DELTA_LEAD {
        (
            ((lead - MIN_TWO_UNIT_DELTA_LEAD) << 16) | usize::from(buf[p]),
            p + 1,
        )
    } else {
        (
            (usize::from(buf[p]) << 16) | usize::from(buf[p + 1]),
            p + 2,
        )
    }
}

/// Advances past a jump delta without decoding it.
pub(crate) fn skip_delta(buf: &[u16], pos: usize) -> usize {
    let lead = usize::from(buf[pos]);
    if lead <= MAX_ONE_UNIT_DELTA {
        pos + 1
    } else if lead < THREE_UNIT_DELTA_LEAD {
        pos + 2
    } else {
        pos + 3
    }
}

//==================================================================================
// 4. Trait Wiring
//==================================================================================

impl TrieUnits for u16 {
    const POLICY: TriePolicy = TriePolicy {
        min_linear_match: MIN_LINEAR_MATCH,
        max_linear_match_length: MAX_LINEAR_MATCH_LENGTH,
        max_branch_linear_sub_node_length: MAX_BRANCH_LINEAR_SUB_NODE_LENGTH,
        match_nodes_can_have_values: true,
    };
}

impl UnitWrite for u16 {
    fn write_final_value(arena: &mut TailArena<u16>, value: i32) -> Result<(), TrieError> {
        write_value(arena, value, FINAL_FLAG);
        Ok(())
    }

    fn write_intermediate_value(_arena: &mut TailArena<u16>, _value: i32) -> Result<(), TrieError> {
        Err(TrieError::Internal(
            "16-bit tries carry match-node values in the lead unit, not as standalone nodes"
                .into(),
        ))
    }

    fn write_linear_head(
        arena: &mut TailArena<u16>,
        run_length: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError> {
        debug_assert!((1..=MAX_LINEAR_MATCH_LENGTH).contains(&run_length));
        let mut lead = (MIN_LINEAR_MATCH as usize + run_length - 1) as u16;
        if let Some(value) = value {
            write_value(arena, value, 0);
            lead |= HAS_VALUE_FLAG;
        }
        arena.push(lead);
        Ok(())
    }

    fn write_branch_head(
        arena: &mut TailArena<u16>,
        fan_out: usize,
        value: Option<i32>,
    ) -> Result<(), TrieError> {
        debug_assert!((2..=0x1_0000).contains(&fan_out));
        let mut lead = if fan_out - 1 < MIN_LINEAR_MATCH as usize {
            (fan_out - 1) as u16
        } else {
            arena.push((fan_out - 1) as u16);
            0
        };
        if let Some(value) = value {
            write_value(arena, value, 0);
            lead |= HAS_VALUE_FLAG;
        }
        arena.push(lead);
        Ok(())
    }

    fn write_branch_slot(arena: &mut TailArena<u16>, slot: BranchSlot) -> Result<(), TrieError> {
        match slot {
            BranchSlot::FinalValue(value) => {
                write_value(arena, value, FINAL_FLAG);
                Ok(())
            }
            BranchSlot::Jump(delta) => {
                if delta > i32::MAX as usize {
                    return Err(TrieError::ValueOutOfRange(delta as i64));
                }
                write_value(arena, delta as i32, 0);
                Ok(())
            }
        }
    }

    fn write_delta(arena: &mut TailArena<u16>, delta: usize) -> Result<(), TrieError> {
        write_delta(arena, delta)
    }
}

//==================================================================================
// 5. Unit Tests
//==================================================================================
