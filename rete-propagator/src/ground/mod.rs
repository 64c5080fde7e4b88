//! The match network starts with a store of known facts, and
//! incrementally derives combinations of facts as new ones are
//! asserted.  Facts are ground tuples of opaque string components,
//! and partial or complete matches are ordered lists of such tuples.
//! These two value types constitute the bulk of what every node
//! stores and forwards, so they must be cheap to share and compare:
//! tuples live behind reference-counted pointers, and sequences only
//! hold references to tuples owned by their selection node.

mod sequence;
mod tuple;

pub use sequence::Sequence;
pub use tuple::Tuple;
