//! A sequence is one (partial or complete) match: an immutable,
//! ordered list of tuple references.  A sequence of length 1 wraps a
//! single freshly asserted tuple; longer sequences are only ever
//! produced by join nodes, by appending one side's tuples after the
//! other's.  The append must build a fresh sequence without touching
//! either input: the inputs are stored in upstream nodes and may be
//! shared by any number of other in-flight join attempts.

use super::Tuple;
use std::fmt;
use std::rc::Rc;

/// An ordered list of shared tuple references.  Value equality is
/// element-wise tuple equality.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Sequence {
    tuples: Box<[Rc<Tuple>]>,
}

impl Sequence {
    #[must_use]
    pub fn new<I: IntoIterator<Item = Rc<Tuple>>>(tuples: I) -> Self {
        Self {
            tuples: tuples.into_iter().collect(),
        }
    }

    /// Wraps one freshly asserted tuple.
    #[must_use]
    pub fn singleton(tuple: Rc<Tuple>) -> Self {
        Self {
            tuples: vec![tuple].into_boxed_slice(),
        }
    }

    /// Returns the tuple at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.len()`; like
    /// [`Tuple::component`](super::Tuple::component), an out-of-range
    /// position is a wiring contract violation and fails fast.
    #[inline]
    #[must_use]
    pub fn tuple(&self, index: usize) -> &Tuple {
        &self.tuples[index]
    }

    /// Returns the tuple at `index`, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rc<Tuple>> {
        self.tuples.get(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn tuples(&self) -> &[Rc<Tuple>] {
        &self.tuples
    }

    /// Returns a new sequence holding `self`'s tuples followed by
    /// `other`'s.  Neither input is mutated; only the `Rc` pointers
    /// are copied.
    #[must_use]
    pub fn appending(&self, other: &Sequence) -> Sequence {
        Self {
            tuples: self
                .tuples
                .iter()
                .chain(other.tuples.iter())
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tuple) in self.tuples.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", tuple)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
fn seq(tuples: &[&[&str]]) -> Sequence {
    Sequence::new(tuples.iter().map(|t| Rc::new(Tuple::from_slice(t))))
}

#[test]
fn construct() {
    let single = Sequence::singleton(Rc::new(Tuple::from_slice(&["a", "b"])));
    assert_eq!(single.len(), 1);
    assert!(!single.is_empty());
    assert_eq!(single.tuple(0), &Tuple::from_slice(&["a", "b"]));
    assert_eq!(single, seq(&[&["a", "b"]]));
}

#[test]
fn eq_is_elementwise() {
    assert_eq!(
        seq(&[&["a", "b"], &["c"]]),
        seq(&[&["a", "b"], &["c"]])
    );
    // Order matters.
    assert_ne!(
        seq(&[&["a", "b"], &["c"]]),
        seq(&[&["c"], &["a", "b"]])
    );
    // Prefix of a longer sequence.
    assert_ne!(seq(&[&["a", "b"]]), seq(&[&["a", "b"], &["c"]]));
}

#[test]
fn appending_is_pure() {
    let left = seq(&[&["a", "b"]]);
    let right = seq(&[&["b", "c"]]);

    let combined = left.appending(&right);
    assert_eq!(combined, seq(&[&["a", "b"], &["b", "c"]]));

    // Both inputs survive untouched and can be reused.
    assert_eq!(left, seq(&[&["a", "b"]]));
    assert_eq!(right, seq(&[&["b", "c"]]));
    let combined2 = left.appending(&right);
    assert_eq!(combined, combined2);
}

#[test]
fn appending_shares_tuples() {
    let tuple = Rc::new(Tuple::from_slice(&["a", "b"]));
    let left = Sequence::singleton(tuple.clone());
    let right = Sequence::singleton(tuple.clone());

    let combined = left.appending(&right);
    assert!(Rc::ptr_eq(combined.get(0).expect("ok"), &tuple));
    assert!(Rc::ptr_eq(combined.get(1).expect("ok"), &tuple));
}

#[test]
fn get_in_and_out_of_range() {
    let s = seq(&[&["a"]]);
    assert!(s.get(0).is_some());
    assert!(s.get(1).is_none());
}

#[test]
#[should_panic]
fn tuple_out_of_range_panics() {
    let s = seq(&[&["a"]]);
    let _ = s.tuple(1);
}

#[test]
fn render() {
    assert_eq!(
        seq(&[&["alice", "bob"], &["bob", "carol"]]).to_string(),
        "[(alice,bob),(bob,carol)]"
    );
    assert_eq!(seq(&[]).to_string(), "[]");
}
