//! Error types for network wiring.  The taxonomy is deliberately
//! narrow: duplicate assertions are reported as boolean no-ops, not
//! errors, and out-of-range binding positions fail fast as contract
//! violations.  What remains is misuse of the wiring operations
//! themselves.

use crate::network::NodeId;

/// Errors arising from invalid network-wiring operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum WiringError {
    /// The id does not name a node in this network.
    #[error("unknown {0}")]
    UnknownNode(NodeId),

    /// The operation requires a join node, but the id names a
    /// selection node.
    #[error("{0} is not a join node")]
    NotAJoinNode(NodeId),

    /// A join node has exactly two sources, fixed at wiring time.
    #[error("join node already has two sources")]
    TooManySources,
}
