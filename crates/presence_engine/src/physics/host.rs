//! Capabilities supplied by the host physics environment
//!
//! The presence engine never allocates or destroys contact handles. It only
//! asks the host whether a handle (or the entity owning it) is still alive,
//! and which entity a handle belongs to.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

/// Identity-validity check for contact handles
///
/// A handle becomes permanently invalid when the host destroys the object
/// behind it, usually between ticks and without any removal notification.
pub trait ContactValidity<H> {
    /// Returns false once the handle's underlying object has been destroyed
    fn is_contact_valid(&self, handle: &H) -> bool;
}

/// Resolves a contact handle to the logical entity that owns it
pub trait OwnerResolver<H> {
    /// Logical entity type. Many handles may resolve to the same owner.
    type Owner: Copy + Eq + Hash;

    /// Owning entity of `handle`, or `None` if it belongs to nothing trackable
    fn resolve_owner(&self, handle: &H) -> Option<Self::Owner>;

    /// Returns false once the owner itself has been destroyed
    fn is_owner_valid(&self, owner: &Self::Owner) -> bool;
}

/// Callbacks raised by an external physics step
///
/// Both begin and persist notifications mean "observed this tick";
/// `on_tick_end` is called once per fixed simulation step.
pub trait ContactListener<H> {
    /// A contact started this tick
    fn on_contact_begin(&mut self, handle: H);

    /// A contact that already existed is still touching
    fn on_contact_persist(&mut self, handle: H);

    /// The simulation step is over
    fn on_tick_end(&mut self);
}

/// Validity capability for hosts whose handles never dangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlwaysValid;

impl<H> ContactValidity<H> for AlwaysValid {
    fn is_contact_valid(&self, _handle: &H) -> bool {
        true
    }
}

impl<H, T: ContactValidity<H> + ?Sized> ContactValidity<H> for &T {
    fn is_contact_valid(&self, handle: &H) -> bool {
        (**self).is_contact_valid(handle)
    }
}

impl<H, T: ContactValidity<H> + ?Sized> ContactValidity<H> for Rc<T> {
    fn is_contact_valid(&self, handle: &H) -> bool {
        (**self).is_contact_valid(handle)
    }
}

impl<H, T: ContactValidity<H>> ContactValidity<H> for RefCell<T> {
    fn is_contact_valid(&self, handle: &H) -> bool {
        self.borrow().is_contact_valid(handle)
    }
}

impl<H, T: OwnerResolver<H> + ?Sized> OwnerResolver<H> for &T {
    type Owner = T::Owner;

    fn resolve_owner(&self, handle: &H) -> Option<Self::Owner> {
        (**self).resolve_owner(handle)
    }

    fn is_owner_valid(&self, owner: &Self::Owner) -> bool {
        (**self).is_owner_valid(owner)
    }
}

impl<H, T: OwnerResolver<H> + ?Sized> OwnerResolver<H> for Rc<T> {
    type Owner = T::Owner;

    fn resolve_owner(&self, handle: &H) -> Option<Self::Owner> {
        (**self).resolve_owner(handle)
    }

    fn is_owner_valid(&self, owner: &Self::Owner) -> bool {
        (**self).is_owner_valid(owner)
    }
}

impl<H, T: OwnerResolver<H>> OwnerResolver<H> for RefCell<T> {
    type Owner = T::Owner;

    fn resolve_owner(&self, handle: &H) -> Option<Self::Owner> {
        self.borrow().resolve_owner(handle)
    }

    fn is_owner_valid(&self, owner: &Self::Owner) -> bool {
        self.borrow().is_owner_valid(owner)
    }
}
