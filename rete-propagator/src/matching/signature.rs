//! A signature identifies one store of facts: all tuples asserted
//! under the same predicate name and arity land in the same selection
//! node.  Tracking the arity in the signature (rather than per tuple)
//! is what guarantees that every tuple in one store has the same
//! shape, without any per-assertion check.

use std::fmt;

/// A predicate name plus arity, e.g. `parent/2`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Signature {
    pub name: String,
    pub arity: usize,
}

impl Signature {
    #[must_use]
    pub fn new(name: &str, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

#[test]
fn render() {
    assert_eq!(Signature::new("parent", 2).to_string(), "parent/2");
    assert_eq!(Signature::new("goal", 0).to_string(), "goal/0");
}

#[test]
fn eq_covers_name_and_arity() {
    assert_eq!(Signature::new("parent", 2), Signature::new("parent", 2));
    assert_ne!(Signature::new("parent", 2), Signature::new("parent", 3));
    assert_ne!(Signature::new("parent", 2), Signature::new("child", 2));
}
