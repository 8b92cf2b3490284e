//! Entity and collider identifiers

use slotmap::new_key_type;

new_key_type! {
    /// Entity identifier
    ///
    /// Generational: once the entity is despawned this key never becomes
    /// valid again, even if its slot is reused.
    pub struct Entity;

    /// Collider identifier, the contact handle reported by the physics step
    pub struct Collider;
}

bitflags::bitflags! {
    /// Tags used to pick which ancestor owns a collider
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Tags: u32 {
        /// Generic "count me" marker
        const TRACKED = 1 << 0;
        /// A tracked hand
        const HAND = 1 << 1;
        /// Grabbable or throwable prop
        const PROP = 1 << 2;
        /// Player body
        const PLAYER = 1 << 3;
    }
}
