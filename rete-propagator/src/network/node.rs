//! The network is a fixed-topology DAG: join nodes reference their
//! two upstream sources, and every node records which downstream join
//! inputs to notify when it gains a new match.  Rather than a
//! pointer graph, nodes live in an arena owned by the
//! [`Network`](crate::Network) and address each other through stable
//! [`NodeId`] handles; each node owns its storage and index, and
//! holds only ids for its sources and targets.

use super::{JoinNode, SelectionNode};
use crate::ground::Sequence;
use std::fmt;

/// A stable handle into the network's node arena.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// One of a join node's two inputs: `Left` is slot 0, `Right` is
/// slot 1.  The slot-0 side always contributes the leading tuples of
/// a combined sequence.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum InputSlot {
    Left,
    Right,
}

impl InputSlot {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            InputSlot::Left => 0,
            InputSlot::Right => 1,
        }
    }

    /// Returns the opposite slot.
    #[inline]
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            InputSlot::Left => InputSlot::Right,
            InputSlot::Right => InputSlot::Left,
        }
    }
}

impl fmt::Display for InputSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.index())
    }
}

/// A downstream subscription: notify `node` on `slot` whenever the
/// subscribed source gains a new match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Target {
    pub node: NodeId,
    pub slot: InputSlot,
}

/// An action callback, invoked once per newly gained match on the
/// node it is registered with.
pub type Action = Box<dyn FnMut(&Sequence)>;

/// The one capability selection and join nodes share: lazily
/// enumerate the matches currently stored, in insertion (derivation)
/// order.  The enumeration is finite and restartable, and always
/// reflects current content.
pub trait MatchSource {
    fn for_each_match(&self, f: &mut dyn FnMut(&Sequence));
}

/// An arena entry: either a selection (alpha) node or a join (beta)
/// node.
pub enum Node {
    Selection(SelectionNode),
    Join(JoinNode),
}

impl Node {
    #[must_use]
    pub fn as_join(&self) -> Option<&JoinNode> {
        match self {
            Node::Join(join) => Some(join),
            Node::Selection(_) => None,
        }
    }

    #[must_use]
    pub fn as_join_mut(&mut self) -> Option<&mut JoinNode> {
        match self {
            Node::Join(join) => Some(join),
            Node::Selection(_) => None,
        }
    }

    #[must_use]
    pub(crate) fn targets(&self) -> &[Target] {
        match self {
            Node::Selection(alpha) => alpha.targets(),
            Node::Join(join) => join.targets(),
        }
    }

    pub(crate) fn add_target(&mut self, target: Target) {
        match self {
            Node::Selection(alpha) => alpha.add_target(target.node, target.slot),
            Node::Join(join) => join.add_target(target.node, target.slot),
        }
    }

    pub(crate) fn add_action(&mut self, action: Action) {
        match self {
            Node::Selection(alpha) => alpha.add_action(action),
            Node::Join(join) => join.add_action(action),
        }
    }

    /// Invokes every registered action with `sequence`, in
    /// registration order.
    pub(crate) fn run_actions(&mut self, sequence: &Sequence) {
        match self {
            Node::Selection(alpha) => alpha.run_actions(sequence),
            Node::Join(join) => join.run_actions(sequence),
        }
    }
}

impl MatchSource for Node {
    fn for_each_match(&self, f: &mut dyn FnMut(&Sequence)) {
        match self {
            Node::Selection(alpha) => alpha.for_each_match(f),
            Node::Join(join) => join.for_each_match(f),
        }
    }
}

#[test]
fn slot_arithmetic() {
    assert_eq!(InputSlot::Left.index(), 0);
    assert_eq!(InputSlot::Right.index(), 1);
    assert_eq!(InputSlot::Left.other(), InputSlot::Right);
    assert_eq!(InputSlot::Right.other(), InputSlot::Left);
    assert_eq!(InputSlot::Left.to_string(), "slot 0");
}

#[test]
fn node_id_render() {
    assert_eq!(NodeId(3).to_string(), "node #3");
}
