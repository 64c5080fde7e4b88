//! Propagation is the core of our match engine: the [`Network`] owns
//! every node, routes each newly asserted fact to the selection node
//! for its predicate signature, and drives the incremental join
//! fan-out to its fixpoint before the assertion returns.  The caller
//! of [`Network::assert_fact`] therefore always observes the
//! complete, consistent set of derived matches; there is no window
//! where a reader could see a partially propagated state.
//!
//! The network is wired first and fed second: create selection nodes
//! (or let `assert_fact` create them), create join nodes, wire
//! sources, bindings, targets, and actions, and only then start
//! asserting facts.  Targets and actions registered late are not
//! replayed already-stored matches.
//!
//! Fan-out uses an explicit worklist rather than recursing through
//! the node graph, so propagation depth is bounded by the queue, not
//! the call stack.  Per-node processing stays atomic and action
//! callbacks run in registration order per node, so the observable
//! ordering guarantees match the recursive formulation.
//!
//! Everything is single-threaded and synchronous.  A concurrent
//! adaptation would need to serialize all mutation per node and let
//! each notification scan a consistent snapshot of its opposite
//! source; the wiring-order DAG makes a fixed lock order sufficient.

use crate::error::WiringError;
use crate::ground::{Sequence, Tuple};
use crate::matching::{Binding, Signature};
use crate::network::{InputSlot, JoinNode, MatchSource, Node, NodeId, SelectionNode, Target};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use tracing::trace;

/// A pending delivery of one new sequence to one join input.
struct Notification {
    join: NodeId,
    slot: InputSlot,
    sequence: Sequence,
}

/// The node arena plus the predicate-signature registry; the single
/// entry point for fact assertion.
pub struct Network {
    nodes: Vec<Node>,
    /// Signature -> selection node.  Ordered so that rendering and
    /// iteration are deterministic.
    alphas: BTreeMap<Signature, NodeId>,
}

impl Network {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            alphas: BTreeMap::new(),
        }
    }

    /// Returns the selection node for `signature`, creating and
    /// registering an empty one on first use.
    pub fn selection_node(&mut self, signature: Signature) -> NodeId {
        if let Some(&id) = self.alphas.get(&signature) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::Selection(SelectionNode::new(signature.clone())));
        self.alphas.insert(signature, id);
        id
    }

    /// Registers an externally constructed selection node under its
    /// own signature, superseding any previous registration for that
    /// signature.  Useful when a node is pre-wired with actions
    /// before being attached.
    pub fn add_selection_node(&mut self, node: SelectionNode) -> NodeId {
        let signature = node.signature().clone();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Selection(node));
        self.alphas.insert(signature, id);
        id
    }

    /// Creates an unwired join node.  Wire exactly two sources (slot
    /// 0 then slot 1), the bindings, and the matching targets before
    /// asserting facts that reach it.
    pub fn join_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Join(JoinNode::new()));
        id
    }

    /// Wires `source` as the next input of `join`: the first call
    /// fills slot 0, the second slot 1.
    ///
    /// # Errors
    ///
    /// Returns `Err` when either id is unknown, `join` is not a join
    /// node, or both slots are already wired.
    pub fn add_source(&mut self, join: NodeId, source: NodeId) -> Result<(), WiringError> {
        self.check(source)?;
        self.join_mut(join)?.add_source(source)
    }

    /// Appends an equality constraint to `join`.
    ///
    /// # Errors
    ///
    /// Returns `Err` when `join` is unknown or not a join node.
    pub fn add_binding(&mut self, join: NodeId, binding: Binding) -> Result<(), WiringError> {
        self.join_mut(join)?.add_binding(binding);
        Ok(())
    }

    /// Subscribes `join`'s input `slot` to `source`'s new matches.
    /// Already-stored matches are not replayed.
    ///
    /// # Errors
    ///
    /// Returns `Err` when either id is unknown or `join` is not a
    /// join node.
    pub fn add_target(
        &mut self,
        source: NodeId,
        join: NodeId,
        slot: InputSlot,
    ) -> Result<(), WiringError> {
        self.join_mut(join)?;
        self.check(source)?;
        self.nodes[source.0].add_target(Target { node: join, slot });
        Ok(())
    }

    /// Registers a callback on any node, invoked once per match the
    /// node gains after registration, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `Err` when `node` is unknown.
    pub fn add_action<F>(&mut self, node: NodeId, action: F) -> Result<(), WiringError>
    where
        F: FnMut(&Sequence) + 'static,
    {
        self.check(node)?;
        self.nodes[node.0].add_action(Box::new(action));
        Ok(())
    }

    /// Asserts one fact.  The signature is `predicate` plus the
    /// component count, so all tuples routed to one selection node
    /// share the same arity by construction.  Returns whether the
    /// fact was newly stored; a duplicate is a no-op and triggers no
    /// propagation.  On a new fact, all downstream joins and actions
    /// have run to their fixpoint by the time this returns.
    pub fn assert_fact<I, S>(&mut self, predicate: &str, components: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tuple = Tuple::new(components);
        let signature = Signature::new(predicate, tuple.arity());
        trace!(%signature, %tuple, "asserting fact");

        let id = self.selection_node(signature);
        match self.selection_mut(id).insert(tuple) {
            None => false,
            Some(sequence) => {
                let mut worklist = VecDeque::new();
                self.fan_out(id, &sequence, &mut worklist);
                while let Some(notification) = worklist.pop_front() {
                    self.deliver(&notification, &mut worklist);
                }
                true
            }
        }
    }

    /// Enumerates `node`'s current matches, in insertion (derivation)
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `Err` when `node` is unknown.
    pub fn for_each_match(
        &self,
        node: NodeId,
        f: &mut dyn FnMut(&Sequence),
    ) -> Result<(), WiringError> {
        self.check(node)?;
        self.nodes[node.0].for_each_match(f);
        Ok(())
    }

    /// Collects `node`'s current matches.
    ///
    /// # Errors
    ///
    /// Returns `Err` when `node` is unknown.
    pub fn matches<Ret: std::iter::FromIterator<Sequence>>(
        &self,
        node: NodeId,
    ) -> Result<Ret, WiringError> {
        let mut out = Vec::new();
        self.for_each_match(node, &mut |sequence| out.push(sequence.clone()))?;
        Ok(out.into_iter().collect())
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn check(&self, id: NodeId) -> Result<(), WiringError> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(WiringError::UnknownNode(id))
        }
    }

    fn join_mut(&mut self, id: NodeId) -> Result<&mut JoinNode, WiringError> {
        self.check(id)?;
        self.nodes[id.0]
            .as_join_mut()
            .ok_or(WiringError::NotAJoinNode(id))
    }

    fn selection_mut(&mut self, id: NodeId) -> &mut SelectionNode {
        match &mut self.nodes[id.0] {
            Node::Selection(alpha) => alpha,
            Node::Join(_) => unreachable!("the signature registry only maps to selection nodes"),
        }
    }

    /// Enqueues one notification per target of `id`, then runs `id`'s
    /// actions with the new `sequence`.
    fn fan_out(&mut self, id: NodeId, sequence: &Sequence, worklist: &mut VecDeque<Notification>) {
        let node = &mut self.nodes[id.0];
        for target in node.targets() {
            worklist.push_back(Notification {
                join: target.node,
                slot: target.slot,
                sequence: sequence.clone(),
            });
        }
        node.run_actions(sequence);
    }

    /// Delivers one new sequence to one join input: pull the opposite
    /// source's current matches, keep the candidate pairs whose
    /// bindings all hold, combine each with the slot-0 side first,
    /// and store the combinations that are not duplicates.  Gathering
    /// precedes insertion, so the scan reads a consistent snapshot of
    /// the opposite source even when a join reads its own output.
    fn deliver(&mut self, notification: &Notification, worklist: &mut VecDeque<Notification>) {
        let combined: Vec<Sequence> = {
            let join = self.nodes[notification.join.0]
                .as_join()
                .expect("targets only ever point at join inputs");
            let other = join
                .source(notification.slot.other())
                .expect("join node sources must be wired before facts are asserted");

            let mut out = Vec::new();
            self.nodes[other.0].for_each_match(&mut |candidate| {
                let (left, right) = match notification.slot {
                    InputSlot::Left => (&notification.sequence, candidate),
                    InputSlot::Right => (candidate, &notification.sequence),
                };
                if join.bindings_hold(left, right) {
                    // Slot 0 contributes first, regardless of which
                    // side triggered this notification.
                    out.push(left.appending(right));
                }
            });
            out
        };

        for sequence in combined {
            let join = self.nodes[notification.join.0]
                .as_join_mut()
                .expect("checked above");
            if join.insert(sequence.clone()) {
                self.fan_out(notification.join, &sequence, worklist);
            }
        }
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Network {
    /// Renders each signature followed by its stored tuples, one per
    /// line, in signature order.  Pure: builds the string for the
    /// caller instead of printing anywhere.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (signature, id) in &self.alphas {
            writeln!(f, "{}", signature)?;
            if let Node::Selection(alpha) = &self.nodes[id.0] {
                for tuple in alpha.tuples() {
                    writeln!(f, " {}", tuple)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground::Tuple;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seq(tuples: &[&[&str]]) -> Sequence {
        Sequence::new(tuples.iter().map(|t| Rc::new(Tuple::from_slice(t))))
    }

    /// Wires the grandparent pattern: `parent/2` joined to itself,
    /// with the slot-0 fact's child equal to the slot-1 fact's
    /// parent.  Returns the join node.
    fn wire_grandparent(network: &mut Network) -> NodeId {
        let parent = network.selection_node(Signature::new("parent", 2));
        let join = network.join_node();

        network.add_source(join, parent).expect("ok");
        network.add_source(join, parent).expect("ok");
        network.add_binding(join, Binding::new(0, 1, 0, 0)).expect("ok");
        network.add_target(parent, join, InputSlot::Left).expect("ok");
        network.add_target(parent, join, InputSlot::Right).expect("ok");
        join
    }

    #[test]
    fn selection_node_get_or_create_is_idempotent() {
        let mut network = Network::new();

        let first = network.selection_node(Signature::new("parent", 2));
        let again = network.selection_node(Signature::new("parent", 2));
        assert_eq!(first, again);

        // A different arity is a different signature, hence node.
        let other = network.selection_node(Signature::new("parent", 3));
        assert_ne!(first, other);
    }

    #[test]
    fn grandparent_scenario() {
        let mut network = Network::new();
        let join = wire_grandparent(&mut network);

        let derived = Rc::new(RefCell::new(Vec::new()));
        let sink = derived.clone();
        network
            .add_action(join, move |sequence: &Sequence| {
                sink.borrow_mut().push(sequence.clone());
            })
            .expect("ok");

        assert!(network.assert_fact("parent", vec!["alice", "bob"]));
        assert!(network.assert_fact("parent", vec!["bob", "carol"]));

        let expected = seq(&[&["alice", "bob"], &["bob", "carol"]]);
        assert_eq!(
            network.matches::<Vec<_>>(join).expect("ok"),
            vec![expected.clone()]
        );
        assert_eq!(*derived.borrow(), vec![expected]);

        // Re-asserting is a no-op: no new storage, no new callback.
        assert!(!network.assert_fact("parent", vec!["alice", "bob"]));
        assert_eq!(network.matches::<Vec<_>>(join).expect("ok").len(), 1);
        assert_eq!(derived.borrow().len(), 1);
    }

    #[test]
    fn assertion_is_idempotent_at_the_selection_node() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));

        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        network
            .add_action(parent, move |_: &Sequence| *sink.borrow_mut() += 1)
            .expect("ok");

        assert!(network.assert_fact("parent", vec!["alice", "bob"]));
        assert!(!network.assert_fact("parent", vec!["alice", "bob"]));

        assert_eq!(*calls.borrow(), 1);
        assert_eq!(network.matches::<Vec<_>>(parent).expect("ok").len(), 1);
    }

    #[test]
    fn join_content_is_order_independent() {
        let facts: [&[&str]; 4] = [
            &["alice", "bob"],
            &["bob", "carol"],
            &["carol", "dave"],
            &["eve", "alice"],
        ];

        let run = |order: &[usize]| -> Vec<Sequence> {
            let mut network = Network::new();
            let join = wire_grandparent(&mut network);
            for &i in order {
                assert!(network.assert_fact("parent", facts[i].iter().copied()));
            }
            let mut matches: Vec<Sequence> = network.matches(join).expect("ok");
            matches.sort();
            matches
        };

        let forward = run(&[0, 1, 2, 3]);
        let backward = run(&[3, 2, 1, 0]);
        let shuffled = run(&[2, 0, 3, 1]);

        assert_eq!(forward.len(), 3);
        assert_eq!(forward, backward);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn append_order_is_fixed_by_slot() {
        let mut network = Network::new();
        let person = network.selection_node(Signature::new("person", 1));
        let city = network.selection_node(Signature::new("lives", 2));
        let join = network.join_node();

        network.add_source(join, person).expect("ok");
        network.add_source(join, city).expect("ok");
        network.add_binding(join, Binding::new(0, 0, 0, 0)).expect("ok");
        network.add_target(person, join, InputSlot::Left).expect("ok");
        network.add_target(city, join, InputSlot::Right).expect("ok");

        // Trigger once from the slot-1 side (person already stored)
        // and once from the slot-0 side (city already stored).
        network.assert_fact("person", vec!["alice"]);
        network.assert_fact("lives", vec!["alice", "paris"]);
        network.assert_fact("lives", vec!["bob", "oslo"]);
        network.assert_fact("person", vec!["bob"]);

        let matches: Vec<Sequence> = network.matches(join).expect("ok");
        assert_eq!(matches.len(), 2);
        for sequence in &matches {
            // The slot-0 (person) tuple always leads.
            assert_eq!(sequence.tuple(0).arity(), 1);
            assert_eq!(sequence.tuple(1).arity(), 2);
        }
    }

    #[test]
    fn late_targets_see_no_replay_but_join_new_facts() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));

        // This fact is stored before any join is wired.
        network.assert_fact("parent", vec!["alice", "bob"]);

        let join = network.join_node();
        network.add_source(join, parent).expect("ok");
        network.add_source(join, parent).expect("ok");
        network.add_binding(join, Binding::new(0, 1, 0, 0)).expect("ok");
        network.add_target(parent, join, InputSlot::Left).expect("ok");
        network.add_target(parent, join, InputSlot::Right).expect("ok");

        // No retroactive notification for the pre-existing fact.
        assert!(network.matches::<Vec<_>>(join).expect("ok").is_empty());

        // A new fact still joins against the pre-existing content,
        // because notification pulls the opposite side's full store.
        network.assert_fact("parent", vec!["bob", "carol"]);
        assert_eq!(
            network.matches::<Vec<_>>(join).expect("ok"),
            vec![seq(&[&["alice", "bob"], &["bob", "carol"]])]
        );
    }

    #[test]
    fn late_actions_are_not_replayed() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));

        network.assert_fact("parent", vec!["alice", "bob"]);

        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        network
            .add_action(parent, move |_: &Sequence| *sink.borrow_mut() += 1)
            .expect("ok");

        assert_eq!(*calls.borrow(), 0);
        network.assert_fact("parent", vec!["bob", "carol"]);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn join_feeding_join_reaches_fixpoint() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));
        let grandparent = wire_grandparent(&mut network);

        // Chain the grandparent join with a third parent fact.
        let great = network.join_node();
        network.add_source(great, grandparent).expect("ok");
        network.add_source(great, parent).expect("ok");
        network.add_binding(great, Binding::new(1, 1, 0, 0)).expect("ok");
        network
            .add_target(grandparent, great, InputSlot::Left)
            .expect("ok");
        network.add_target(parent, great, InputSlot::Right).expect("ok");

        network.assert_fact("parent", vec!["alice", "bob"]);
        network.assert_fact("parent", vec!["bob", "carol"]);
        network.assert_fact("parent", vec!["carol", "dave"]);

        let mut grandparents: Vec<Sequence> = network.matches(grandparent).expect("ok");
        grandparents.sort();
        assert_eq!(
            grandparents,
            vec![
                seq(&[&["alice", "bob"], &["bob", "carol"]]),
                seq(&[&["bob", "carol"], &["carol", "dave"]]),
            ]
        );

        assert_eq!(
            network.matches::<Vec<_>>(great).expect("ok"),
            vec![seq(&[
                &["alice", "bob"],
                &["bob", "carol"],
                &["carol", "dave"],
            ])]
        );
    }

    #[test]
    fn actions_run_in_registration_order() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));

        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"].iter().copied() {
            let sink = log.clone();
            network
                .add_action(parent, move |_: &Sequence| {
                    sink.borrow_mut().push(tag);
                })
                .expect("ok");
        }

        network.assert_fact("parent", vec!["alice", "bob"]);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn pre_wired_selection_node_can_be_attached() {
        let mut network = Network::new();

        let calls = Rc::new(RefCell::new(0));
        let sink = calls.clone();
        let mut node = SelectionNode::new(Signature::new("parent", 2));
        node.add_action(Box::new(move |_: &Sequence| *sink.borrow_mut() += 1));

        let id = network.add_selection_node(node);
        assert_eq!(network.selection_node(Signature::new("parent", 2)), id);

        network.assert_fact("parent", vec!["alice", "bob"]);
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn add_selection_node_supersedes_existing_registration() {
        let mut network = Network::new();
        let original = network.selection_node(Signature::new("parent", 2));

        let replacement = network.add_selection_node(SelectionNode::new(Signature::new("parent", 2)));
        assert_ne!(original, replacement);
        assert_eq!(
            network.selection_node(Signature::new("parent", 2)),
            replacement
        );
    }

    #[test]
    fn wiring_errors() {
        let mut network = Network::new();
        let parent = network.selection_node(Signature::new("parent", 2));
        let join = network.join_node();
        let bogus = NodeId(17);

        assert_eq!(
            network.add_source(join, bogus),
            Err(WiringError::UnknownNode(bogus))
        );
        assert_eq!(
            network.add_source(parent, parent),
            Err(WiringError::NotAJoinNode(parent))
        );
        assert_eq!(
            network.add_binding(parent, Binding::new(0, 0, 0, 0)),
            Err(WiringError::NotAJoinNode(parent))
        );
        assert_eq!(
            network.add_target(parent, bogus, InputSlot::Left),
            Err(WiringError::UnknownNode(bogus))
        );
        assert!(network.add_action(bogus, |_: &Sequence| ()).is_err());

        network.add_source(join, parent).expect("ok");
        network.add_source(join, parent).expect("ok");
        assert_eq!(
            network.add_source(join, parent),
            Err(WiringError::TooManySources)
        );
    }

    #[test]
    fn render_is_pure_and_deterministic() {
        let mut network = Network::new();
        network.assert_fact("parent", vec!["alice", "bob"]);
        network.assert_fact("parent", vec!["bob", "carol"]);
        network.assert_fact("goal", Vec::<String>::new());

        assert_eq!(
            network.to_string(),
            "goal/0\n ()\nparent/2\n (alice,bob)\n (bob,carol)\n"
        );
        // Rendering twice yields the same string: no state is
        // consumed and nothing is printed.
        assert_eq!(network.to_string(), network.to_string());
    }

    #[test]
    fn matches_on_unknown_node_errors() {
        let network = Network::new();
        assert_eq!(
            network.matches::<Vec<_>>(NodeId(0)),
            Err(WiringError::UnknownNode(NodeId(0)))
        );
    }
}
