//! The generic trie build core shared by both public variants.
//!
//! A `TrieBuilderCore` owns the entry store and orchestrates one build:
//! sort the entries, construct the node graph by recursive divide-and-conquer
//! over the sorted range, then serialize the graph post-order (children
//! before parents) into a backward-growing arena so every reference is a
//! non-negative forward delta. All variant-specific behavior — tier
//! constants, lead-element packing, whether match nodes may carry values —
//! lives behind the `UnitWrite` hooks and the element type's `POLICY`.

use hashbrown::HashMap;
use log::debug;

use crate::arena::TailArena;
use crate::config::BuildMode;
use crate::error::TrieError;
use crate::graph::{Node, NodeGraph, NodeId};
use crate::kernels::{BranchSlot, UnitWrite};
use crate::output::SerializedTrie;

//==================================================================================
// 1. Entry Store + Build Orchestration
//==================================================================================

#[derive(Debug)]
pub(crate) struct TrieBuilderCore<U: UnitWrite> {
    entries: HashMap<Box<[U]>, i32>,
    built: Option<SerializedTrie<U>>,
}

impl<U: UnitWrite> TrieBuilderCore<U> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            built: None,
        }
    }

    /// Appends one (sequence, value) pair. Rejects duplicates of the current
    /// build generation without mutating the store.
    pub(crate) fn add(&mut self, sequence: &[U], value: i32) -> Result<(), TrieError> {
        if self.built.is_some() {
            return Err(TrieError::BuilderFrozen);
        }
        if self.entries.contains_key(sequence) {
            return Err(TrieError::DuplicateKey(sequence.len()));
        }
        self.entries.insert(sequence.into(), value);
        Ok(())
    }

    /// Builds (or returns the already-built) serialized form. Repeated calls
    /// after a successful build alias the first build's buffer; the mode of
    /// the first build wins until `clear`.
    pub(crate) fn build(&mut self, mode: BuildMode) -> Result<SerializedTrie<U>, TrieError> {
        if let Some(block) = &self.built {
            return Ok(block.clone());
        }
        if self.entries.is_empty() {
            return Err(TrieError::EmptyTrie);
        }

        let mut sorted: Vec<(&[U], i32)> = self
            .entries
            .iter()
            .map(|(sequence, &value)| (&**sequence, value))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let mut graph = NodeGraph::new(mode);
        let root = make_node(&mut graph, &sorted, 0);

        let mut serializer = Serializer {
            graph: &graph,
            offsets: vec![None; graph.len()],
            arena: TailArena::new(),
        };
        serializer.write_node(root)?;

        let written = serializer.arena.written();
        debug!(
            "built trie: mode={:?} entries={} nodes={} shared={} serialized_len={}",
            mode,
            sorted.len(),
            graph.len(),
            graph.shared(),
            written,
        );

        let (buf, start) = serializer.arena.into_parts();
        let block = SerializedTrie::from_arena_parts(buf, start);
        self.built = Some(block.clone());
        Ok(block)
    }

    /// Discards all entries, detaches the built buffer (previously returned
    /// wrappers stay valid), and reopens the store.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.built = None;
    }

    #[cfg(test)]
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

//==================================================================================
// 2. Node Graph Construction
//==================================================================================

/// Builds the node for a non-empty sorted range of entries that all share a
/// common prefix of `depth` elements, consuming everything past that prefix.
fn make_node<U: UnitWrite>(
    graph: &mut NodeGraph<U>,
    entries: &[(&[U], i32)],
    depth: usize,
) -> NodeId {
    debug_assert!(!entries.is_empty());

    // A sequence ending exactly here sorts first in the range; its value
    // belongs to this node.
    let mut entries = entries;
    let mut value = None;
    if entries[0].0.len() == depth {
        let own_value = entries[0].1;
        entries = &entries[1..];
        if entries.is_empty() {
            return graph.intern(Node::Final { value: own_value });
        }
        value = Some(own_value);
    }

    // Everything left is longer than `depth`. Count the run of elements the
    // whole range agrees on; since the range is sorted, agreement between
    // its first and last sequence covers every sequence in between.
    let first = entries[0].0;
    let last = entries[entries.len() - 1].0;
    let max_probe = first.len().min(last.len()) - depth;
    let mut common = 0usize;
    while common < max_probe && first[depth + common] == last[depth + common] {
        common += 1;
    }

    // A value is carried by the match node itself where the policy allows
    // it, and wrapped in an explicit intermediate-value node otherwise.
    let mut carried = None;
    let mut wrapped = None;
    if let Some(v) = value {
        if U::POLICY.match_nodes_can_have_values {
            carried = Some(v);
        } else {
            wrapped = Some(v);
        }
    }

    let node = if common > 0 {
        // Linear run. Chunk runs longer than the policy maximum into a chain
        // of maximal nodes, deepest chunk first.
        let max_run = U::POLICY.max_linear_match_length;
        let mut next = make_node(graph, entries, depth + common);
        let mut remaining = common;
        while remaining > max_run {
            let chunk = depth + remaining - max_run;
            next = graph.intern(Node::Linear {
                elements: first[chunk..chunk + max_run].into(),
                value: None,
                next,
            });
            remaining -= max_run;
        }
        Node::Linear {
            elements: first[depth..depth + remaining].into(),
            value: carried,
            next,
        }
    } else {
        // Branch: one child per distinct next element.
        let mut branch = Vec::new();
        let mut rest = entries;
        while !rest.is_empty() {
            let element = rest[0].0[depth];
            let group_len = rest
                .iter()
                .take_while(|(sequence, _)| sequence[depth] == element)
                .count();
            let child = make_node(graph, &rest[..group_len], depth + 1);
            branch.push((element, child));
            rest = &rest[group_len..];
        }
        Node::Branch {
            entries: branch.into_boxed_slice(),
            value: carried,
        }
    };

    let id = graph.intern(node);
    match wrapped {
        Some(v) => graph.intern(Node::Intermediate { value: v, next: id }),
        None => id,
    }
}

//==================================================================================
// 3. Post-Order Serialization
//==================================================================================

struct Serializer<'g, U: UnitWrite> {
    graph: &'g NodeGraph<U>,
    /// Offset (distance from the buffer end to the node's first element) of
    /// every node already emitted.
    offsets: Vec<Option<usize>>,
    arena: TailArena<U>,
}

impl<U: UnitWrite> Serializer<'_, U> {
    /// Emits a node (and, first, everything it references) unless it has
    /// already been emitted, and returns its offset.
    fn write_node(&mut self, id: NodeId) -> Result<usize, TrieError> {
        if let Some(offset) = self.offsets[id.index()] {
            return Ok(offset);
        }
        let graph = self.graph;
        match graph.node(id) {
            Node::Final { value } => {
                U::write_final_value(&mut self.arena, *value)?;
            }
            Node::Intermediate { value, next } => {
                let target = self.write_node(*next)?;
                let delta = self.arena.written() - target;
                U::write_delta(&mut self.arena, delta)?;
                U::write_intermediate_value(&mut self.arena, *value)?;
            }
            Node::Linear {
                elements,
                value,
                next,
            } => {
                let target = self.write_node(*next)?;
                let delta = self.arena.written() - target;
                U::write_delta(&mut self.arena, delta)?;
                self.arena.push_run(elements);
                U::write_linear_head(&mut self.arena, elements.len(), *value)?;
            }
            Node::Branch { entries, value } => {
                // Children first, so the branch entries can reference them by
                // delta. Final-value children are inlined into their entry
                // slot instead.
                for (_, child) in entries.iter().rev() {
                    if !matches!(graph.node(*child), Node::Final { .. }) {
                        self.write_node(*child)?;
                    }
                }
                self.write_branch_sub(entries)?;
                U::write_branch_head(&mut self.arena, entries.len(), *value)?;
            }
        }
        let offset = self.arena.written();
        self.offsets[id.index()] = Some(offset);
        Ok(offset)
    }

    /// Emits the dispatch structure of a branch: a flat linear-scan list at
    /// or below the policy fan-out threshold, a binary split above it. The
    /// greater-or-equal half follows the split head inline; the less-than
    /// half is reached by delta.
    fn write_branch_sub(&mut self, entries: &[(U, NodeId)]) -> Result<(), TrieError> {
        if entries.len() > U::POLICY.max_branch_linear_sub_node_length {
            let mid = entries.len() / 2;
            self.write_branch_sub(&entries[..mid])?;
            let less_than = self.arena.written();
            self.write_branch_sub(&entries[mid..])?;
            let delta = self.arena.written() - less_than;
            U::write_delta(&mut self.arena, delta)?;
            self.arena.push(entries[mid].0);
        } else {
            for (element, child) in entries.iter().rev() {
                let slot = match self.graph.node(*child) {
                    Node::Final { value } => BranchSlot::FinalValue(*value),
                    _ => {
                        let target = self.offsets[child.index()].ok_or_else(|| {
                            TrieError::Internal(
                                "branch child was not serialized before its parent".into(),
                            )
                        })?;
                        BranchSlot::Jump(self.arena.written() - target)
                    }
                };
                U::write_branch_slot(&mut self.arena, slot)?;
                self.arena.push(*element);
            }
        }
        Ok(())
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted_entries<'a>(pairs: &'a [(&'a [u8], i32)]) -> Vec<(&'a [u8], i32)> {
        let mut sorted = pairs.to_vec();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        sorted
    }

    #[test]
    fn test_shared_prefix_produces_branch_with_wrapped_value() {
        // {"cat", "car", "cart"}: a linear run over "ca", then a branch on
        // 'r'/'t', with "car" itself carrying a value mid-sequence. The byte
        // policy forbids values on match nodes, so "car"'s value shows up as
        // an intermediate-value node in front of the 't' subtree's parent.
        let pairs: [(&[u8], i32); 3] = [(b"cat", 10), (b"car", 20), (b"cart", 30)];
        let entries = sorted_entries(&pairs);
        let mut graph = NodeGraph::<u8>::new(BuildMode::Small);
        let root = make_node(&mut graph, &entries, 0);

        let Node::Linear {
            elements,
            value,
            next,
        } = graph.node(root)
        else {
            panic!("expected a linear root, got {:?}", graph.node(root));
        };
        assert_eq!(&elements[..], b"ca");
        assert_eq!(*value, None);

        let Node::Branch { entries: kids, .. } = graph.node(*next) else {
            panic!("expected a branch after the shared prefix");
        };
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0].0, b'r');
        assert_eq!(kids[1].0, b't');

        // The 'r' child holds 20 and continues toward "cart".
        let Node::Intermediate { value, next } = graph.node(kids[0].1) else {
            panic!("expected the mid-sequence value to be wrapped");
        };
        assert_eq!(*value, 20);
        assert!(matches!(graph.node(*next), Node::Linear { .. } | Node::Final { .. }));
    }

    #[test]
    fn test_long_run_is_chunked_to_policy_maximum() {
        let key = [7u8; 40];
        let entries = vec![(&key[..], 1)];
        let mut graph = NodeGraph::<u8>::new(BuildMode::Small);
        let root = make_node(&mut graph, &entries, 0);

        let mut run_lengths = Vec::new();
        let mut id = root;
        loop {
            match graph.node(id) {
                Node::Linear { elements, next, .. } => {
                    run_lengths.push(elements.len());
                    id = *next;
                }
                Node::Final { value } => {
                    assert_eq!(*value, 1);
                    break;
                }
                other => panic!("unexpected node {other:?}"),
            }
        }
        assert_eq!(run_lengths, vec![8, 16, 16]);
    }

    #[test]
    fn test_identical_suffix_subtrees_are_interned_once() {
        let pairs: [(&[u8], i32); 2] = [(b"xyz", 5), (b"wyz", 5)];
        let entries = sorted_entries(&pairs);
        let mut graph = NodeGraph::<u8>::new(BuildMode::Small);
        let root = make_node(&mut graph, &entries, 0);

        let Node::Branch { entries: kids, .. } = graph.node(root) else {
            panic!("expected a branch root");
        };
        assert_eq!(kids[0].1, kids[1].1, "both children should share one subtree");
    }

    #[test]
    fn test_build_is_idempotent_and_clear_detaches() {
        let mut core = TrieBuilderCore::<u8>::new();
        core.add(b"ab", 1).unwrap();
        let first = core.build(BuildMode::Small).unwrap();
        let second = core.build(BuildMode::Fast).unwrap();
        assert_eq!(first.as_slice(), second.as_slice());

        core.clear();
        assert_eq!(core.entry_count(), 0);
        core.add(b"ab", 2).unwrap();
        let third = core.build(BuildMode::Small).unwrap();
        // The first build's block is untouched by the rebuild.
        assert_ne!(first.as_slice(), third.as_slice());
    }

    #[test]
    fn test_add_after_build_is_frozen() {
        let mut core = TrieBuilderCore::<u8>::new();
        core.add(b"a", 1).unwrap();
        core.build(BuildMode::Small).unwrap();
        assert_eq!(core.add(b"b", 2), Err(TrieError::BuilderFrozen));
    }

    #[test]
    fn test_empty_build_is_rejected() {
        let mut core = TrieBuilderCore::<u8>::new();
        assert_eq!(
            core.build(BuildMode::Small).unwrap_err(),
            TrieError::EmptyTrie
        );
    }
}
