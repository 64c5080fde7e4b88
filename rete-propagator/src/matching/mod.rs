//! The match network evaluates rules of the form $$p(x, y) \wedge
//! q(y, z) \wedge ... => ...$$ by routing each asserted fact to the
//! store for its predicate, and joining stores pairwise under
//! equality constraints.  This module defines the static, data-free
//! half of that machinery: the signature that names a store
//! (predicate name plus arity), and the binding that ties a component
//! position on one side of a join to a component position on the
//! other.  The usual split between static shape and dynamic data
//! applies: signatures and bindings are fixed when the network is
//! wired, long before any fact traverses it.

mod binding;
mod signature;

pub use binding::Binding;
pub use signature::Signature;
