//! Physics-facing presence tracking
//!
//! Turns the noisy per-step contact stream of a physics engine into stable
//! transitions: [`ContactSet`] deduplicates contacts per zone, and
//! [`PresenceAggregator`] folds them into entity-level enter/exit events.
//! Collision detection itself stays with the host; see [`host`] for the
//! capabilities it has to provide.

pub mod contact_set;
pub mod host;
pub mod presence;

#[cfg(test)]
mod tests;

pub use contact_set::{ContactSet, FlushReport};
pub use host::{AlwaysValid, ContactListener, ContactValidity, OwnerResolver};
pub use presence::{PresenceAggregator, PresenceDiagnostics};
