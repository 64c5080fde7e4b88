//! A join (beta) node incrementally maintains the set of sequences
//! formed by combining matches from its two upstream sources under a
//! fixed list of equality bindings.  Insertion is push-from-new-side,
//! pull-from-other-side: when one input gains a match, the node scans
//! the opposite source's current content, so the cost of one new fact
//! is proportional to the matching opposite-side content, not to the
//! whole network's history.
//!
//! The node indexes every (tuple position, component position, value)
//! triple of every stored sequence.  Only the duplicate check probes
//! this index; the join scan itself stays linear, which is correct
//! and adequate while bindings are few.  Narrowing the scan by the
//! first binding's key would be a semantics-preserving improvement.

use super::node::{Action, InputSlot, MatchSource, NodeId, Target};
use crate::error::WiringError;
use crate::ground::Sequence;
use crate::matching::Binding;
use std::collections::HashMap;
use tracing::trace;

/// The derived-sequence store for one binary join.
pub struct JoinNode {
    /// Upstream sources, wired slot 0 then slot 1 and fixed once
    /// matching traffic begins.
    sources: Vec<NodeId>,
    bindings: Vec<Binding>,
    /// Derived sequences, in derivation order.
    sequences: Vec<Sequence>,
    /// (tuple position, component position, value) -> indices into
    /// `sequences` of the sequences holding `value` there.
    index: HashMap<(usize, usize, String), Vec<usize>>,
    targets: Vec<Target>,
    actions: Vec<Action>,
}

impl JoinNode {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            bindings: Vec::new(),
            sequences: Vec::new(),
            index: HashMap::new(),
            targets: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Wires the next upstream source: the first call fills slot 0,
    /// the second slot 1.
    ///
    /// # Errors
    ///
    /// Returns `Err` when both slots are already wired.
    pub fn add_source(&mut self, source: NodeId) -> Result<(), WiringError> {
        if self.sources.len() >= 2 {
            return Err(WiringError::TooManySources);
        }

        self.sources.push(source);
        Ok(())
    }

    /// Returns the source wired at `slot`, if any.
    #[must_use]
    pub fn source(&self, slot: InputSlot) -> Option<NodeId> {
        self.sources.get(slot.index()).copied()
    }

    /// Appends an equality constraint; all bindings must hold for a
    /// candidate pair to be combined.
    pub fn add_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Registers a downstream subscriber.  Already-derived sequences
    /// are not replayed to it.
    pub fn add_target(&mut self, node: NodeId, slot: InputSlot) {
        self.targets.push(Target { node, slot });
    }

    /// Registers a callback invoked once per newly derived sequence.
    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    #[must_use]
    pub(crate) fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub(crate) fn run_actions(&mut self, sequence: &Sequence) {
        for action in &mut self.actions {
            action(sequence);
        }
    }

    /// Returns true iff every binding holds for the oriented pair:
    /// `left` must come from the slot-0 side and `right` from the
    /// slot-1 side, regardless of which side is new.
    #[must_use]
    pub fn bindings_hold(&self, left: &Sequence, right: &Sequence) -> bool {
        self.bindings.iter().all(|b| b.holds(left, right))
    }

    /// The same bucketed duplicate check as the selection node, but
    /// probing the (first tuple, first component, value) bucket.  A
    /// sequence whose leading tuple is nullary falls back to scanning
    /// the whole store.
    fn contains(&self, sequence: &Sequence) -> bool {
        let first = sequence.get(0).and_then(|tuple| tuple.get(0));
        match first {
            Some(value) => self
                .index
                .get(&(0, 0, value.to_string()))
                .map_or(false, |bucket| {
                    bucket.iter().any(|&i| self.sequences[i] == *sequence)
                }),
            None => self.sequences.iter().any(|stored| stored == sequence),
        }
    }

    /// Stores `sequence` unless a value-equal one was already
    /// derived.  Returns whether it was newly added; a duplicate has
    /// no side effects.
    pub fn insert(&mut self, sequence: Sequence) -> bool {
        if self.contains(&sequence) {
            trace!(sequence = %sequence, "duplicate sequence rejected");
            return false;
        }

        let slot = self.sequences.len();
        for (tuple_position, tuple) in sequence.tuples().iter().enumerate() {
            for (position, value) in tuple.components().iter().enumerate() {
                self.index
                    .entry((tuple_position, position, value.clone()))
                    .or_default()
                    .push(slot);
            }
        }
        trace!(sequence = %sequence, "derived sequence");
        self.sequences.push(sequence);
        true
    }
}

impl Default for JoinNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchSource for JoinNode {
    fn for_each_match(&self, f: &mut dyn FnMut(&Sequence)) {
        for sequence in &self.sequences {
            f(sequence);
        }
    }
}

#[cfg(test)]
fn seq(tuples: &[&[&str]]) -> Sequence {
    use crate::ground::Tuple;
    use std::rc::Rc;

    Sequence::new(tuples.iter().map(|t| Rc::new(Tuple::from_slice(t))))
}

#[test]
fn source_wiring() {
    let mut node = JoinNode::new();
    assert_eq!(node.source(InputSlot::Left), None);

    node.add_source(NodeId(0)).expect("ok");
    node.add_source(NodeId(1)).expect("ok");
    assert_eq!(node.source(InputSlot::Left), Some(NodeId(0)));
    assert_eq!(node.source(InputSlot::Right), Some(NodeId(1)));

    assert_eq!(node.add_source(NodeId(2)), Err(WiringError::TooManySources));
}

#[test]
fn bindings_all_anded() {
    let mut node = JoinNode::new();
    node.add_binding(Binding::new(0, 1, 0, 0));
    node.add_binding(Binding::new(0, 0, 0, 1));

    // First binding holds, second does not.
    assert!(!node.bindings_hold(&seq(&[&["a", "b"]]), &seq(&[&["b", "c"]])));
    // Both hold.
    assert!(node.bindings_hold(&seq(&[&["a", "b"]]), &seq(&[&["b", "a"]])));
}

#[test]
fn insert_rejects_duplicates() {
    let mut node = JoinNode::new();

    assert!(node.insert(seq(&[&["a", "b"], &["b", "c"]])));
    assert!(!node.insert(seq(&[&["a", "b"], &["b", "c"]])));
    assert_eq!(node.len(), 1);

    // Shares the (0, 0, "a") bucket but differs later on.
    assert!(node.insert(seq(&[&["a", "b"], &["b", "d"]])));
    assert_eq!(node.len(), 2);
}

#[test]
fn insert_dedups_nullary_leading_tuple() {
    let mut node = JoinNode::new();

    assert!(node.insert(seq(&[&[], &["a"]])));
    assert!(!node.insert(seq(&[&[], &["a"]])));
    assert!(node.insert(seq(&[&[], &["b"]])));
    assert_eq!(node.len(), 2);
}

#[test]
fn matches_in_derivation_order() {
    let mut node = JoinNode::new();
    node.insert(seq(&[&["a", "b"], &["b", "c"]]));
    node.insert(seq(&[&["x", "y"], &["y", "z"]]));

    let mut seqs = Vec::new();
    node.for_each_match(&mut |s| seqs.push(s.clone()));
    assert_eq!(
        seqs,
        vec![
            seq(&[&["a", "b"], &["b", "c"]]),
            seq(&[&["x", "y"], &["y", "z"]]),
        ]
    );
}
