//! Entity hierarchy and colliders
//!
//! A minimal world that owns the objects contact handles point at. It is the
//! reference host for [`physics`](crate::physics).

pub mod entity;
pub mod world;

pub use entity::{Collider, Entity, Tags};
pub use world::{TaggedOwners, World, WorldError};
