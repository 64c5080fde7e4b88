//! A selection (alpha) node is the single source of truth for all
//! tuples asserted under one predicate signature.  It deduplicates on
//! insert, maintains an equality index from (component position,
//! value) to the tuples holding that value there, and records which
//! downstream join inputs and action callbacks to notify for each new
//! tuple.  The store is monotonic: there is no retraction path
//! anywhere in the network.

use super::node::{Action, InputSlot, MatchSource, NodeId, Target};
use crate::ground::{Sequence, Tuple};
use crate::matching::Signature;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// The store and index for one predicate signature.
pub struct SelectionNode {
    signature: Signature,
    /// Stored tuples, in insertion order.
    tuples: Vec<Rc<Tuple>>,
    /// (component position, value) -> indices into `tuples` of the
    /// tuples holding `value` at that position.
    index: HashMap<(usize, String), Vec<usize>>,
    targets: Vec<Target>,
    actions: Vec<Action>,
}

impl SelectionNode {
    #[must_use]
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            tuples: Vec::new(),
            index: HashMap::new(),
            targets: Vec::new(),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the stored tuples, in insertion order.
    #[must_use]
    pub fn tuples(&self) -> &[Rc<Tuple>] {
        &self.tuples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Registers a downstream subscriber.  Already-stored tuples are
    /// not replayed to it.
    pub fn add_target(&mut self, node: NodeId, slot: InputSlot) {
        self.targets.push(Target { node, slot });
    }

    /// Registers a callback invoked once per newly added tuple.
    /// Already-stored tuples do not trigger it.
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

    /// Returns true iff a value-equal tuple is already stored.  The
    /// check probes the index bucket for (position 0, first
    /// component) and scans only that bucket for full equality.
    /// Nullary tuples have no component 0; the store holds at most
    /// one of them, so a scan of the whole store stays cheap.
    fn contains(&self, tuple: &Tuple) -> bool {
        match tuple.get(0) {
            Some(first) => self
                .index
                .get(&(0, first.to_string()))
                .map_or(false, |bucket| {
                    bucket.iter().any(|&i| *self.tuples[i] == *tuple)
                }),
            None => self.tuples.iter().any(|stored| **stored == *tuple),
        }
    }

    /// Stores `tuple` unless a value-equal one is already present.
    /// Returns the fresh singleton sequence on success, for the
    /// caller to fan out to targets and actions; returns `None` (with
    /// no side effects) on a duplicate.
    pub fn insert(&mut self, tuple: Tuple) -> Option<Sequence> {
        if self.contains(&tuple) {
            trace!(signature = %self.signature, tuple = %tuple, "duplicate tuple rejected");
            return None;
        }

        let tuple = Rc::new(tuple);
        let slot = self.tuples.len();
        for (position, value) in tuple.components().iter().enumerate() {
            self.index
                .entry((position, value.clone()))
                .or_default()
                .push(slot);
        }
        self.tuples.push(tuple.clone());
        trace!(signature = %self.signature, tuple = %tuple, "stored tuple");

        Some(Sequence::singleton(tuple))
    }
}

impl MatchSource for SelectionNode {
    fn for_each_match(&self, f: &mut dyn FnMut(&Sequence)) {
        for tuple in &self.tuples {
            f(&Sequence::singleton(tuple.clone()));
        }
    }
}

#[cfg(test)]
fn collect_matches(node: &SelectionNode) -> Vec<Sequence> {
    let mut out = Vec::new();
    node.for_each_match(&mut |seq| out.push(seq.clone()));
    out
}

#[test]
fn insert_happy_path() {
    let mut node = SelectionNode::new(Signature::new("parent", 2));
    assert!(node.is_empty());

    let seq = node.insert(Tuple::from_slice(&["alice", "bob"])).expect("new");
    assert_eq!(seq, Sequence::singleton(Rc::new(Tuple::from_slice(&["alice", "bob"]))));
    assert_eq!(node.len(), 1);
    assert_eq!(node.signature(), &Signature::new("parent", 2));
}

#[test]
fn insert_rejects_duplicates() {
    let mut node = SelectionNode::new(Signature::new("parent", 2));

    assert!(node.insert(Tuple::from_slice(&["alice", "bob"])).is_some());
    assert!(node.insert(Tuple::from_slice(&["alice", "bob"])).is_none());
    assert_eq!(node.len(), 1);

    // Same first component, different tuple: the bucket probe must
    // still scan for full equality.
    assert!(node.insert(Tuple::from_slice(&["alice", "carol"])).is_some());
    assert_eq!(node.len(), 2);
}

#[test]
fn insert_dedups_nullary_tuples() {
    let mut node = SelectionNode::new(Signature::new("goal", 0));

    assert!(node.insert(Tuple::from_slice(&[])).is_some());
    assert!(node.insert(Tuple::from_slice(&[])).is_none());
    assert_eq!(node.len(), 1);
}

#[test]
fn matches_in_insertion_order() {
    let mut node = SelectionNode::new(Signature::new("parent", 2));
    node.insert(Tuple::from_slice(&["alice", "bob"])).expect("new");
    node.insert(Tuple::from_slice(&["bob", "carol"])).expect("new");

    let seqs = collect_matches(&node);
    assert_eq!(seqs.len(), 2);
    assert_eq!(seqs[0].tuple(0), &Tuple::from_slice(&["alice", "bob"]));
    assert_eq!(seqs[1].tuple(0), &Tuple::from_slice(&["bob", "carol"]));

    // Restartable: a second enumeration sees the same content.
    assert_eq!(collect_matches(&node), seqs);
}
