//! A binding is one equality constraint across the two sides of a
//! join: component `left_component` of the tuple at `left_tuple` in
//! the slot-0-side sequence must equal component `right_component` of
//! the tuple at `right_tuple` in the slot-1-side sequence.  A join
//! node carries an ordered list of bindings and combines a candidate
//! pair only when all of them hold.
//!
//! The left/right orientation always refers to input slots, never to
//! which side triggered a notification: callers orient the candidate
//! pair before evaluating bindings.

use crate::ground::Sequence;

/// An equality constraint between a component position in the
/// slot-0-side sequence and one in the slot-1-side sequence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Binding {
    pub left_tuple: usize,
    pub left_component: usize,
    pub right_tuple: usize,
    pub right_component: usize,
}

impl Binding {
    #[must_use]
    pub fn new(
        left_tuple: usize,
        left_component: usize,
        right_tuple: usize,
        right_component: usize,
    ) -> Self {
        Self {
            left_tuple,
            left_component,
            right_tuple,
            right_component,
        }
    }

    /// Returns true iff the constrained components are equal.  `left`
    /// must be the slot-0-side sequence and `right` the slot-1-side
    /// one.
    ///
    /// # Panics
    ///
    /// Panics when a position exceeds the sequence it refers to; a
    /// binding that points past its inputs is a wiring contract
    /// violation.
    #[inline]
    #[must_use]
    pub fn holds(&self, left: &Sequence, right: &Sequence) -> bool {
        left.tuple(self.left_tuple).component(self.left_component)
            == right.tuple(self.right_tuple).component(self.right_component)
    }
}

#[cfg(test)]
fn seq(tuples: &[&[&str]]) -> Sequence {
    use crate::ground::Tuple;
    use std::rc::Rc;

    Sequence::new(tuples.iter().map(|t| Rc::new(Tuple::from_slice(t))))
}

#[test]
fn holds_happy_path() {
    // The grandparent constraint: the child of the slot-0 fact is the
    // parent of the slot-1 fact.
    let binding = Binding::new(0, 1, 0, 0);

    let left = seq(&[&["alice", "bob"]]);
    let right = seq(&[&["bob", "carol"]]);
    assert!(binding.holds(&left, &right));
}

#[test]
fn holds_mismatch() {
    let binding = Binding::new(0, 1, 0, 0);

    let left = seq(&[&["alice", "bob"]]);
    let right = seq(&[&["carol", "dave"]]);
    assert!(!binding.holds(&left, &right));
}

#[test]
fn holds_reaches_into_longer_sequences() {
    let binding = Binding::new(1, 0, 0, 1);

    let left = seq(&[&["x", "y"], &["bob", "carol"]]);
    let right = seq(&[&["ed", "bob"]]);
    assert!(binding.holds(&left, &right));
}

#[test]
#[should_panic]
fn out_of_range_position_panics() {
    let binding = Binding::new(1, 0, 0, 0);

    let left = seq(&[&["alice", "bob"]]);
    let right = seq(&[&["bob", "carol"]]);
    let _ = binding.holds(&left, &right);
}
