//! The two node kinds of the match network, and the arena plumbing
//! that connects them.  A selection (alpha) node owns every tuple
//! asserted under one predicate signature; a join (beta) node owns
//! the sequences derived by combining two upstream match sets under
//! equality bindings.  Both expose the same one-method enumeration
//! capability, [`MatchSource`], which is what lets a join read either
//! kind of node as an input.
//!
//! Nodes never talk to each other directly: the
//! [`Network`](crate::Network) owns the arena and drives all
//! notification traffic, so each node only needs to record ids.

mod alpha;
mod beta;
mod node;

pub use alpha::SelectionNode;
pub use beta::JoinNode;
pub use node::Action;
pub use node::InputSlot;
pub use node::MatchSource;
pub use node::Node;
pub use node::NodeId;
pub use node::Target;
