//! A tuple is one fact instance: an immutable, fixed-arity record of
//! string components.  The arity is fixed at construction, and value
//! equality is component-wise.  Tuples are owned by the selection
//! node that stored them and referenced (never copied) by every
//! sequence that includes them, so we implement them as boxed slices
//! behind `Rc` pointers; cloning the pointer is the only clone that
//! should happen in inner loops.

use std::fmt;

/// An ordered, fixed-arity list of string components.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Tuple {
    comps: Box<[String]>,
}

impl Tuple {
    #[must_use]
    pub fn new<I, S>(comps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            comps: comps.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn from_slice(comps: &[&str]) -> Self {
        Self::new(comps.iter().copied())
    }

    /// Returns the component at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index >= self.arity()`.  An out-of-range position
    /// can only come from a misconfigured binding, which is a wiring
    /// contract violation, not a data error; we fail fast.
    #[inline]
    #[must_use]
    pub fn component(&self, index: usize) -> &str {
        &self.comps[index]
    }

    /// Returns the component at `index`, or `None` when out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.comps.get(index).map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.comps.len()
    }

    #[inline]
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.comps
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, comp) in self.comps.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", comp)?;
        }
        write!(f, ")")
    }
}

#[test]
fn construct() {
    let from_iter = Tuple::new(vec!["alice".to_string(), "bob".to_string()]);
    let from_slice = Tuple::from_slice(&["alice", "bob"]);

    assert_eq!(from_iter, from_slice);
    assert_eq!(from_iter.arity(), 2);
    assert_eq!(from_iter.component(0), "alice");
    assert_eq!(from_iter.component(1), "bob");
    assert_eq!(from_iter.components(), &["alice".to_string(), "bob".to_string()]);
}

#[test]
fn eq_is_componentwise() {
    assert_eq!(
        Tuple::from_slice(&["a", "b"]),
        Tuple::from_slice(&["a", "b"])
    );
    assert_ne!(
        Tuple::from_slice(&["a", "b"]),
        Tuple::from_slice(&["b", "a"])
    );
    // Same prefix, different arity.
    assert_ne!(
        Tuple::from_slice(&["a", "b"]),
        Tuple::from_slice(&["a", "b", "c"])
    );
    // Nullary tuples are equal to each other.
    assert_eq!(Tuple::from_slice(&[]), Tuple::from_slice(&[]));
}

#[test]
fn get_in_and_out_of_range() {
    let t = Tuple::from_slice(&["x"]);
    assert_eq!(t.get(0), Some("x"));
    assert_eq!(t.get(1), None);
}

#[test]
#[should_panic]
fn component_out_of_range_panics() {
    let t = Tuple::from_slice(&["x"]);
    let _ = t.component(1);
}

#[test]
fn render() {
    assert_eq!(Tuple::from_slice(&["a", "b", "c"]).to_string(), "(a,b,c)");
    assert_eq!(Tuple::from_slice(&["solo"]).to_string(), "(solo)");
    assert_eq!(Tuple::from_slice(&[]).to_string(), "()");
}
