//! # Presence Engine
//!
//! Turns per-physics-step trigger contacts into stable, entity-level
//! "entered" / "exited" transitions.
//!
//! ## Features
//!
//! - **Contact reconciliation**: any number of begin/persist reports per tick
//!   collapse into one `added` and one `removed` per contact
//! - **Entity aggregation**: contacts are reference-counted per owning
//!   entity, so a hand touching with five fingers enters once
//! - **Destroyed-handle recovery**: contacts whose objects vanish between
//!   ticks are swept instead of leaking
//! - **Scoped subscriptions**: every listener registration returns a token
//!   that unregisters on drop
//!
//! ## Quick Start
//!
//! ```rust
//! use presence_engine::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let world = Rc::new(RefCell::new(World::new()));
//! let (hand, fingers) = {
//!     let mut world = world.borrow_mut();
//!     let hand = world.spawn("hand", Tags::TRACKED | Tags::HAND);
//!     let fingers: Vec<_> = (0..2)
//!         .map(|_| world.attach_collider(hand).unwrap())
//!         .collect();
//!     (hand, fingers)
//! };
//!
//! let mut zone = ContactSet::new(Rc::clone(&world));
//! let presence = PresenceAggregator::new(&zone, TaggedOwners::new(Rc::clone(&world), Tags::HAND));
//!
//! // Physics step: both fingers touch the zone
//! zone.report_contact(fingers[0]);
//! zone.report_contact(fingers[1]);
//! zone.flush();
//!
//! assert_eq!(presence.count(), 1);
//! assert_eq!(presence.ref_count(&hand), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod physics;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, DiagnosticsConfig, PresenceConfig, ZoneConfig},
        ecs::{Collider, Entity, Tags, TaggedOwners, World, WorldError},
        events::{EventSource, Subscription},
        physics::{
            AlwaysValid, ContactListener, ContactSet, ContactValidity, FlushReport, OwnerResolver,
            PresenceAggregator, PresenceDiagnostics,
        },
    };
}
