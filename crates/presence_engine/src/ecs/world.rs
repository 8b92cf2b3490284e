//! World owning entities, their hierarchy, and their colliders
//!
//! This is the reference host for presence tracking: it hands out contact
//! handles ([`Collider`]) and answers the validity and owner questions the
//! presence engine asks. Despawning an entity takes its children and all of
//! their colliders with it, which is exactly the "handle silently dies
//! between ticks" case the engine has to survive.

use super::{Collider, Entity, Tags};
use crate::physics::host::{ContactValidity, OwnerResolver};
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

/// Errors raised by [`World`] mutation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// Entity was despawned or never existed
    #[error("Unknown entity: {0:?}")]
    UnknownEntity(Entity),

    /// Collider was destroyed or never existed
    #[error("Unknown collider: {0:?}")]
    UnknownCollider(Collider),
}

#[derive(Debug)]
struct EntityRecord {
    name: String,
    tags: Tags,
    parent: Option<Entity>,
    children: Vec<Entity>,
    colliders: Vec<Collider>,
}

#[derive(Debug)]
struct ColliderRecord {
    body: Entity,
}

/// ECS world containing entities and the colliders attached to them
#[derive(Debug, Default)]
pub struct World {
    entities: SlotMap<Entity, EntityRecord>,
    colliders: SlotMap<Collider, ColliderRecord>,
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root entity
    pub fn spawn(&mut self, name: impl Into<String>, tags: Tags) -> Entity {
        self.entities.insert(EntityRecord {
            name: name.into(),
            tags,
            parent: None,
            children: Vec::new(),
            colliders: Vec::new(),
        })
    }

    /// Create an entity parented to `parent`
    pub fn spawn_child(
        &mut self,
        parent: Entity,
        name: impl Into<String>,
        tags: Tags,
    ) -> Result<Entity, WorldError> {
        if !self.entities.contains_key(parent) {
            return Err(WorldError::UnknownEntity(parent));
        }

        let child = self.spawn(name, tags);
        self.entities[child].parent = Some(parent);
        self.entities[parent].children.push(child);
        Ok(child)
    }

    /// Attach a new collider to `entity`
    pub fn attach_collider(&mut self, entity: Entity) -> Result<Collider, WorldError> {
        let record = self
            .entities
            .get_mut(entity)
            .ok_or(WorldError::UnknownEntity(entity))?;
        let collider = self.colliders.insert(ColliderRecord { body: entity });
        record.colliders.push(collider);
        Ok(collider)
    }

    /// Destroy a single collider
    pub fn destroy_collider(&mut self, collider: Collider) -> Result<(), WorldError> {
        let record = self
            .colliders
            .remove(collider)
            .ok_or(WorldError::UnknownCollider(collider))?;
        if let Some(body) = self.entities.get_mut(record.body) {
            body.colliders.retain(|&c| c != collider);
        }
        Ok(())
    }

    /// Destroy an entity, its descendants, and every collider they carry
    ///
    /// Returns the number of entities removed.
    pub fn despawn(&mut self, entity: Entity) -> Result<usize, WorldError> {
        let parent = self
            .entities
            .get(entity)
            .ok_or(WorldError::UnknownEntity(entity))?
            .parent;
        if let Some(parent) = parent.and_then(|p| self.entities.get_mut(p)) {
            parent.children.retain(|&c| c != entity);
        }

        let mut removed = 0;
        let mut stack = vec![entity];
        while let Some(next) = stack.pop() {
            if let Some(record) = self.entities.remove(next) {
                for collider in record.colliders {
                    self.colliders.remove(collider);
                }
                stack.extend(record.children);
                removed += 1;
            }
        }

        log::debug!("Despawned {} entities", removed);
        Ok(removed)
    }

    /// True until the entity is despawned
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// True until the collider (or its body) is destroyed
    pub fn is_collider_alive(&self, collider: Collider) -> bool {
        self.colliders.contains_key(collider)
    }

    /// Entity the collider is attached to
    pub fn body_of(&self, collider: Collider) -> Option<Entity> {
        self.colliders.get(collider).map(|c| c.body)
    }

    /// Parent of `entity`, if it has one
    pub fn parent_of(&self, entity: Entity) -> Option<Entity> {
        self.entities.get(entity)?.parent
    }

    /// Debug name of `entity`
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.entities.get(entity).map(|e| e.name.as_str())
    }

    /// Tags carried by `entity`
    pub fn tags(&self, entity: Entity) -> Option<Tags> {
        self.entities.get(entity).map(|e| e.tags)
    }

    /// Colliders attached directly to `entity`
    pub fn colliders_of(&self, entity: Entity) -> &[Collider] {
        self.entities
            .get(entity)
            .map(|e| e.colliders.as_slice())
            .unwrap_or(&[])
    }

    /// First entity carrying all of `tags`, starting at the collider's body
    /// and walking up through its parents
    pub fn find_in_parents(&self, collider: Collider, tags: Tags) -> Option<Entity> {
        let mut cursor = self.body_of(collider);
        while let Some(entity) = cursor {
            let record = self.entities.get(entity)?;
            if record.tags.contains(tags) {
                return Some(entity);
            }
            cursor = record.parent;
        }
        None
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl ContactValidity<Collider> for World {
    fn is_contact_valid(&self, handle: &Collider) -> bool {
        self.is_collider_alive(*handle)
    }
}

/// Owner resolution against a shared [`World`]: a collider belongs to the
/// nearest ancestor (itself included) carrying `tags`
#[derive(Debug, Clone)]
pub struct TaggedOwners {
    world: Rc<RefCell<World>>,
    tags: Tags,
}

impl TaggedOwners {
    /// Resolve owners carrying all of `tags`
    pub fn new(world: Rc<RefCell<World>>, tags: Tags) -> Self {
        Self { world, tags }
    }

    /// Tags an owner must carry
    pub fn tags(&self) -> Tags {
        self.tags
    }
}

impl ContactValidity<Collider> for TaggedOwners {
    fn is_contact_valid(&self, handle: &Collider) -> bool {
        self.world.borrow().is_collider_alive(*handle)
    }
}

impl OwnerResolver<Collider> for TaggedOwners {
    type Owner = Entity;

    fn resolve_owner(&self, handle: &Collider) -> Option<Entity> {
        self.world.borrow().find_in_parents(*handle, self.tags)
    }

    fn is_owner_valid(&self, owner: &Entity) -> bool {
        self.world.borrow().is_alive(*owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_with_fingers(world: &mut World, fingers: usize) -> (Entity, Vec<Collider>) {
        let hand = world.spawn("hand", Tags::TRACKED | Tags::HAND);
        let colliders = (0..fingers)
            .map(|i| {
                let finger = world.spawn_child(hand, format!("finger{i}"), Tags::empty()).unwrap();
                world.attach_collider(finger).unwrap()
            })
            .collect();
        (hand, colliders)
    }

    #[test]
    fn test_spawn_and_hierarchy() {
        let mut world = World::new();
        let root = world.spawn("root", Tags::TRACKED);
        let child = world.spawn_child(root, "child", Tags::empty()).unwrap();

        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.parent_of(child), Some(root));
        assert_eq!(world.name(child), Some("child"));
        assert_eq!(world.tags(root), Some(Tags::TRACKED));
    }

    #[test]
    fn test_spawn_child_of_dead_parent_fails() {
        let mut world = World::new();
        let root = world.spawn("root", Tags::empty());
        world.despawn(root).unwrap();

        assert_eq!(
            world.spawn_child(root, "orphan", Tags::empty()),
            Err(WorldError::UnknownEntity(root))
        );
    }

    #[test]
    fn test_find_in_parents_walks_up() {
        let mut world = World::new();
        let (hand, colliders) = hand_with_fingers(&mut world, 3);

        for collider in colliders {
            assert_eq!(world.find_in_parents(collider, Tags::HAND), Some(hand));
            assert_eq!(world.find_in_parents(collider, Tags::PROP), None);
        }
    }

    #[test]
    fn test_find_in_parents_includes_body() {
        let mut world = World::new();
        let ball = world.spawn("ball", Tags::TRACKED | Tags::PROP);
        let collider = world.attach_collider(ball).unwrap();

        assert_eq!(world.find_in_parents(collider, Tags::PROP), Some(ball));
    }

    #[test]
    fn test_despawn_is_recursive() {
        let mut world = World::new();
        let (hand, colliders) = hand_with_fingers(&mut world, 4);
        let bystander = world.spawn("bystander", Tags::empty());

        assert_eq!(world.despawn(hand), Ok(5));

        assert!(!world.is_alive(hand));
        assert!(world.is_alive(bystander));
        assert!(colliders.iter().all(|&c| !world.is_collider_alive(c)));
        assert_eq!(world.collider_count(), 0);
        assert_eq!(world.despawn(hand), Err(WorldError::UnknownEntity(hand)));
    }

    #[test]
    fn test_despawn_child_detaches_from_parent() {
        let mut world = World::new();
        let root = world.spawn("root", Tags::empty());
        let child = world.spawn_child(root, "child", Tags::empty()).unwrap();

        world.despawn(child).unwrap();

        assert!(world.is_alive(root));
        assert_eq!(world.despawn(root), Ok(1));
    }

    #[test]
    fn test_destroy_collider_keeps_body() {
        let mut world = World::new();
        let body = world.spawn("body", Tags::TRACKED);
        let a = world.attach_collider(body).unwrap();
        let b = world.attach_collider(body).unwrap();

        world.destroy_collider(a).unwrap();

        assert!(world.is_alive(body));
        assert!(!world.is_collider_alive(a));
        assert_eq!(world.colliders_of(body), &[b]);
        assert_eq!(world.destroy_collider(a), Err(WorldError::UnknownCollider(a)));
    }

    #[test]
    fn test_stale_keys_stay_invalid_after_slot_reuse() {
        let mut world = World::new();
        let first = world.spawn("first", Tags::empty());
        world.despawn(first).unwrap();
        let second = world.spawn("second", Tags::empty());

        assert_ne!(first, second);
        assert!(!world.is_alive(first));
        assert!(world.is_alive(second));
    }

    #[test]
    fn test_tagged_owners_resolves_through_shared_world() {
        let world = Rc::new(RefCell::new(World::new()));
        let (hand, colliders) = hand_with_fingers(&mut world.borrow_mut(), 2);
        let owners = TaggedOwners::new(Rc::clone(&world), Tags::HAND);
        assert_eq!(owners.tags(), Tags::HAND);

        assert_eq!(owners.resolve_owner(&colliders[0]), Some(hand));
        assert!(owners.is_contact_valid(&colliders[1]));

        world.borrow_mut().despawn(hand).unwrap();

        assert_eq!(owners.resolve_owner(&colliders[0]), None);
        assert!(!owners.is_contact_valid(&colliders[1]));
        assert!(!owners.is_owner_valid(&hand));
    }
}
