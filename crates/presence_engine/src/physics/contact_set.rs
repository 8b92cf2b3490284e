//! Per-tick contact reconciliation for a single zone
//!
//! The physics step reports every contact it sees during a tick, as often as
//! it likes. Once per tick the host calls [`ContactSet::flush`], which
//! compares this tick's observations against the set confirmed at the last
//! flush and fires exactly one `added` or `removed` event per transition.
//!
//! # Re-entrancy
//!
//! Handlers of `added`/`removed` must not call `report_contact` or `flush`
//! on the set that is notifying them. The borrow checker rejects this for a
//! plainly owned set; hosts that share the set behind interior mutability
//! are responsible for not doing it.

use crate::config::ZoneConfig;
use crate::events::{EventSource, Subscription};
use crate::physics::host::{AlwaysValid, ContactListener, ContactValidity};
use std::collections::HashSet;
use std::hash::Hash;

/// Summary of one [`ContactSet::flush`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Handles that newly appeared
    pub added: usize,
    /// Handles that disappeared
    pub removed: usize,
    /// New handles dropped because they were destroyed before the flush
    pub skipped_invalid: usize,
}

impl FlushReport {
    /// True if the flush emitted nothing
    pub fn is_quiet(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Double-buffered set of contact handles touching one zone
pub struct ContactSet<H, V = AlwaysValid> {
    name: String,
    validity: V,

    /// Handles observed since the last flush
    current: HashSet<H>,

    /// Handles confirmed present as of the last flush
    previous: Vec<H>,

    added: EventSource<H>,
    removed: EventSource<H>,
}

impl<H> ContactSet<H>
where
    H: Copy + Eq + Hash + 'static,
{
    /// Contact set for hosts whose handles are never destroyed
    pub fn unchecked() -> Self {
        Self::new(AlwaysValid)
    }
}

impl<H, V> ContactSet<H, V>
where
    H: Copy + Eq + Hash + 'static,
    V: ContactValidity<H>,
{
    /// Create a contact set with default settings
    pub fn new(validity: V) -> Self {
        Self::with_config(validity, &ZoneConfig::default())
    }

    /// Create a contact set from a zone configuration
    pub fn with_config(validity: V, config: &ZoneConfig) -> Self {
        Self {
            name: config.name.clone(),
            validity,
            current: HashSet::with_capacity(config.initial_capacity),
            previous: Vec::with_capacity(config.initial_capacity),
            added: EventSource::new(),
            removed: EventSource::new(),
        }
    }

    /// Zone label from the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record that `handle` touched the zone during this tick
    ///
    /// Idempotent within a tick. Nothing is emitted until the next flush.
    pub fn report_contact(&mut self, handle: H) {
        self.current.insert(handle);
    }

    /// Reconcile this tick's reports against the confirmed set
    ///
    /// All `removed` events of a flush are emitted before any `added` event.
    pub fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();

        // Reverse traversal keeps indices stable while removing
        for i in (0..self.previous.len()).rev() {
            if !self.current.contains(&self.previous[i]) {
                let handle = self.previous.remove(i);
                log::trace!("{}: contact removed", self.name);
                self.removed.emit(&handle);
                report.removed += 1;
            }
        }

        for handle in &self.previous {
            self.current.remove(handle);
        }

        // Draining clears `current` whether or not anything is left in it
        for handle in self.current.drain() {
            if !self.validity.is_contact_valid(&handle) {
                report.skipped_invalid += 1;
                continue;
            }

            self.previous.push(handle);
            log::trace!("{}: contact added", self.name);
            self.added.emit(&handle);
            report.added += 1;
        }

        if !report.is_quiet() || report.skipped_invalid > 0 {
            log::trace!(
                "{}: flush +{} -{} (skipped {} destroyed), {} present",
                self.name,
                report.added,
                report.removed,
                report.skipped_invalid,
                self.previous.len()
            );
        }

        report
    }

    /// True if `handle` was confirmed present by the last flush
    pub fn contains(&self, handle: &H) -> bool {
        self.previous.contains(handle)
    }

    /// Number of handles confirmed present by the last flush
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// True if no handle is confirmed present
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    /// Handles confirmed present by the last flush
    pub fn present(&self) -> impl Iterator<Item = &H> {
        self.previous.iter()
    }

    /// Number of distinct handles reported since the last flush
    pub fn pending(&self) -> usize {
        self.current.len()
    }

    /// Event fired once when a handle starts touching the zone
    pub fn added(&self) -> &EventSource<H> {
        &self.added
    }

    /// Event fired once when a handle stops touching the zone
    pub fn removed(&self) -> &EventSource<H> {
        &self.removed
    }

    /// Subscribe to `added`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_added<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&H) + 'static,
    {
        self.added.subscribe(handler)
    }

    /// Subscribe to `removed`
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn on_removed<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&H) + 'static,
    {
        self.removed.subscribe(handler)
    }
}

impl<H, V> ContactListener<H> for ContactSet<H, V>
where
    H: Copy + Eq + Hash + 'static,
    V: ContactValidity<H>,
{
    fn on_contact_begin(&mut self, handle: H) {
        self.report_contact(handle);
    }

    fn on_contact_persist(&mut self, handle: H) {
        self.report_contact(handle);
    }

    fn on_tick_end(&mut self) {
        self.flush();
    }
}
