//! Entity-level presence on top of a [`ContactSet`]
//!
//! A single logical entity (a hand, a body, a prop) usually touches a zone
//! with several colliders at once. The aggregator resolves every contact
//! handle to its owning entity and reference-counts contacts per entity, so
//! consumers see one `entity_added` when the first contact arrives and one
//! `entity_removed` when the last one leaves.
//!
//! ## Destroyed handles
//!
//! A handle whose underlying object was destroyed can no longer be resolved
//! to an owner. When such a handle is removed the aggregator sweeps its
//! whole mapping instead, dropping every entity that is itself no longer
//! valid. Swept entities are reported through `entity_swept`, not
//! `entity_removed`, followed by a single `changed` for the sweep.

use crate::config::DiagnosticsConfig;
use crate::events::{EventSource, Subscription};
use crate::physics::contact_set::ContactSet;
use crate::physics::host::{ContactValidity, OwnerResolver};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Counters for cases the aggregator ignores or recovers from
///
/// Maintained unconditionally. They never influence which events fire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresenceDiagnostics {
    /// Added contacts that resolved to no entity
    pub unresolved_additions: u64,
    /// Removed contacts that resolved to no entity
    pub unresolved_removals: u64,
    /// Removed contacts whose entity was not being tracked
    pub unknown_removals: u64,
    /// Destroyed-handle sweeps performed
    pub sweeps: u64,
    /// Entities dropped by sweeps
    pub swept_entities: u64,
}

struct Shared<O, R> {
    zone: String,
    host: R,
    log_unresolved: bool,

    /// Every entry has a count of at least one
    counts: RefCell<HashMap<O, usize>>,
    diagnostics: Cell<PresenceDiagnostics>,

    entity_added: EventSource<O>,
    entity_removed: EventSource<O>,
    entity_swept: EventSource<O>,
    changed: EventSource<()>,
}

impl<O, R> Shared<O, R>
where
    O: Copy + Eq + Hash + 'static,
{
    fn bump(&self, update: impl FnOnce(&mut PresenceDiagnostics)) {
        let mut diagnostics = self.diagnostics.get();
        update(&mut diagnostics);
        self.diagnostics.set(diagnostics);
    }

    fn handle_added<H>(&self, handle: &H)
    where
        R: OwnerResolver<H, Owner = O>,
    {
        let Some(owner) = self.host.resolve_owner(handle) else {
            self.bump(|d| d.unresolved_additions += 1);
            if self.log_unresolved {
                log::debug!("{}: added contact has no owner", self.zone);
            }
            return;
        };

        let prior = {
            let mut counts = self.counts.borrow_mut();
            let count = counts.entry(owner).or_insert(0);
            *count += 1;
            *count - 1
        };

        if prior == 0 {
            self.entity_added.emit(&owner);
        }
        self.changed.emit(&());
    }

    fn handle_removed<H>(&self, handle: &H)
    where
        R: OwnerResolver<H, Owner = O> + ContactValidity<H>,
    {
        if !self.host.is_contact_valid(handle) {
            self.sweep::<H>();
            return;
        }

        let Some(owner) = self.host.resolve_owner(handle) else {
            self.bump(|d| d.unresolved_removals += 1);
            if self.log_unresolved {
                log::debug!("{}: removed contact has no owner", self.zone);
            }
            return;
        };

        let remaining = {
            let mut counts = self.counts.borrow_mut();
            let remaining = counts.get_mut(&owner).map(|count| {
                *count -= 1;
                *count
            });
            if remaining == Some(0) {
                counts.remove(&owner);
            }
            remaining
        };

        match remaining {
            None => {
                self.bump(|d| d.unknown_removals += 1);
                if self.log_unresolved {
                    log::debug!("{}: removed contact belongs to an untracked entity", self.zone);
                }
            }
            Some(0) => {
                self.entity_removed.emit(&owner);
                self.changed.emit(&());
            }
            Some(_) => self.changed.emit(&()),
        }
    }

    /// Drop every entity whose own reference is no longer valid
    fn sweep<H>(&self)
    where
        R: OwnerResolver<H, Owner = O>,
    {
        let swept: Vec<O> = {
            let mut counts = self.counts.borrow_mut();
            let dead: Vec<O> = counts
                .keys()
                .filter(|owner| !self.host.is_owner_valid(owner))
                .copied()
                .collect();
            for owner in &dead {
                counts.remove(owner);
            }
            dead
        };

        self.bump(|d| {
            d.sweeps += 1;
            d.swept_entities += swept.len() as u64;
        });
        log::debug!(
            "{}: destroyed contact removed, swept {} entities",
            self.zone,
            swept.len()
        );

        for owner in &swept {
            self.entity_swept.emit(owner);
        }
        self.changed.emit(&());
    }
}

/// Reference-counted, entity-level view of a [`ContactSet`]
///
/// Listens to the set's `added`/`removed` events for as long as it is alive
/// and not disposed.
pub struct PresenceAggregator<O, R> {
    shared: Rc<Shared<O, R>>,
    subscriptions: Option<(Subscription, Subscription)>,
}

impl<O, R> PresenceAggregator<O, R>
where
    O: Copy + Eq + Hash + 'static,
    R: 'static,
{
    /// Start tracking entities on `zone`, resolving owners through `host`
    pub fn new<H, V>(zone: &ContactSet<H, V>, host: R) -> Self
    where
        H: Copy + Eq + Hash + 'static,
        V: ContactValidity<H>,
        R: OwnerResolver<H, Owner = O> + ContactValidity<H>,
    {
        Self::with_config(zone, host, &DiagnosticsConfig::default())
    }

    /// Start tracking with explicit diagnostics settings
    pub fn with_config<H, V>(zone: &ContactSet<H, V>, host: R, config: &DiagnosticsConfig) -> Self
    where
        H: Copy + Eq + Hash + 'static,
        V: ContactValidity<H>,
        R: OwnerResolver<H, Owner = O> + ContactValidity<H>,
    {
        let shared = Rc::new(Shared {
            zone: zone.name().to_string(),
            host,
            log_unresolved: config.log_unresolved,
            counts: RefCell::new(HashMap::new()),
            diagnostics: Cell::new(PresenceDiagnostics::default()),
            entity_added: EventSource::new(),
            entity_removed: EventSource::new(),
            entity_swept: EventSource::new(),
            changed: EventSource::new(),
        });

        let on_added = Rc::downgrade(&shared);
        let added = zone.on_added(move |handle: &H| {
            if let Some(shared) = on_added.upgrade() {
                shared.handle_added(handle);
            }
        });

        let on_removed = Rc::downgrade(&shared);
        let removed = zone.on_removed(move |handle: &H| {
            if let Some(shared) = on_removed.upgrade() {
                shared.handle_removed(handle);
            }
        });

        Self {
            shared,
            subscriptions: Some((added, removed)),
        }
    }

    /// Number of entities currently present
    pub fn count(&self) -> usize {
        self.shared.counts.borrow().len()
    }

    /// True if `entity` is currently present
    pub fn contains(&self, entity: &O) -> bool {
        self.shared.counts.borrow().contains_key(entity)
    }

    /// Number of tracked contacts attributed to `entity` (0 when absent)
    pub fn ref_count(&self, entity: &O) -> usize {
        self.shared.counts.borrow().get(entity).copied().unwrap_or(0)
    }

    /// Snapshot of the entities currently present, in no particular order
    pub fn entities(&self) -> Vec<O> {
        self.shared.counts.borrow().keys().copied().collect()
    }

    /// Ignored and recovered cases seen so far
    pub fn diagnostics(&self) -> PresenceDiagnostics {
        self.shared.diagnostics.get()
    }

    /// Stop listening to the contact set
    ///
    /// The entity mapping is left as it is. Calling this twice is harmless.
    pub fn dispose(&mut self) {
        if self.subscriptions.take().is_some() {
            log::trace!("{}: presence aggregator disposed", self.shared.zone);
        }
    }

    /// True after [`dispose`](Self::dispose)
    pub fn is_disposed(&self) -> bool {
        self.subscriptions.is_none()
    }

    /// Event fired when an entity's first contact arrives
    pub fn entity_added(&self) -> &EventSource<O> {
        &self.shared.entity_added
    }

    /// Event fired when an entity's last contact leaves
    pub fn entity_removed(&self) -> &EventSource<O> {
        &self.shared.entity_removed
    }

    /// Event fired for each entity dropped by a destroyed-handle sweep
    pub fn entity_swept(&self) -> &EventSource<O> {
        &self.shared.entity_swept
    }

    /// Event fired after every change to the mapping
    pub fn changed(&self) -> &EventSource<()> {
        &self.shared.changed
    }

    /// Subscribe to `entity_added`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_entity_added<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&O) + 'static,
    {
        self.shared.entity_added.subscribe(handler)
    }

    /// Subscribe to `entity_removed`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_entity_removed<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&O) + 'static,
    {
        self.shared.entity_removed.subscribe(handler)
    }

    /// Subscribe to `entity_swept`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_entity_swept<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&O) + 'static,
    {
        self.shared.entity_swept.subscribe(handler)
    }

    /// Subscribe to `changed`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_changed<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut() + 'static,
    {
        self.shared.changed.subscribe(move |()| handler())
    }
}
