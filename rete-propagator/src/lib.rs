//! An incremental pattern-matching (Rete-style) network: the runtime
//! core of a forward-chaining rule engine.  Facts are asserted as
//! ground tuples under a predicate signature; the network maintains,
//! without full re-scans, the set of fact combinations that jointly
//! satisfy the equality bindings of each join, and invokes registered
//! callbacks whenever a combination first becomes valid.
//!
//! The store is monotonic: assertion is the only mutation primitive,
//! and there is no retraction path.  Rule parsing, callback
//! semantics, and hosting all live outside this crate; the boundary
//! is the [`Network`] wiring and assertion interface.

pub mod error;
pub mod ground;
pub mod matching;
pub mod network;
mod propagate;

pub use error::WiringError;
pub use ground::{Sequence, Tuple};
pub use matching::{Binding, Signature};
pub use network::{InputSlot, JoinNode, MatchSource, NodeId, SelectionNode};
pub use propagate::Network;
