//! Trigger zone demo
//!
//! Simulates two tracked hands, five finger colliders each, drifting in and
//! out of a single trigger zone. The "physics step" is a seeded random walk:
//! each tick every finger may start or stop touching the zone. Halfway
//! through, the left hand is despawned while it is touching, which exercises
//! the destroyed-handle sweep.
//!
//! Usage: `zone_demo [config.toml|config.ron]`

use presence_engine::foundation::logging;
use presence_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::rc::Rc;

const SEED: u64 = 0x5EED;
const TICKS: u32 = 40;
const DESPAWN_TICK: u32 = 20;
const FINGERS_PER_HAND: usize = 5;

/// Chance per tick that a finger flips between touching and not touching
const FLIP_CHANCE: f64 = 0.25;

struct Finger {
    collider: Collider,
    touching: bool,
}

struct Hand {
    entity: Entity,
    fingers: Vec<Finger>,
}

struct ZoneDemo {
    world: Rc<RefCell<World>>,
    zone: ContactSet<Collider, Rc<RefCell<World>>>,
    presence: PresenceAggregator<Entity, TaggedOwners>,
    hands: Vec<Hand>,
    rng: StdRng,
    _subscriptions: Vec<Subscription>,
}

impl ZoneDemo {
    fn new(config: &PresenceConfig) -> Result<Self, WorldError> {
        let world = Rc::new(RefCell::new(World::new()));
        let hands = ["left", "right"]
            .into_iter()
            .map(|side| spawn_hand(&mut world.borrow_mut(), side))
            .collect::<Result<Vec<_>, _>>()?;

        let zone = ContactSet::with_config(Rc::clone(&world), &config.zone);
        let owners = TaggedOwners::new(Rc::clone(&world), Tags::HAND);
        log::info!("Tracking owners tagged {:?} on '{}'", owners.tags(), zone.name());
        let presence = PresenceAggregator::with_config(&zone, owners, &config.diagnostics);

        let mut subscriptions = Vec::new();
        let names = Rc::clone(&world);
        subscriptions.push(presence.on_entity_added(move |hand| {
            log::info!("{} hand entered", names.borrow().name(*hand).unwrap_or("?"));
        }));
        let names = Rc::clone(&world);
        subscriptions.push(presence.on_entity_removed(move |hand| {
            log::info!("{} hand exited", names.borrow().name(*hand).unwrap_or("?"));
        }));
        subscriptions.push(presence.on_entity_swept(|hand| {
            log::info!("destroyed hand {:?} dropped from zone", hand);
        }));

        Ok(Self {
            world,
            zone,
            presence,
            hands,
            rng: StdRng::seed_from_u64(SEED),
            _subscriptions: subscriptions,
        })
    }

    /// One fixed simulation step
    fn step(&mut self, tick: u32) -> Result<(), WorldError> {
        if tick == DESPAWN_TICK {
            let left = self.hands.remove(0);
            log::info!("tick {}: despawning left hand", tick);
            self.world.borrow_mut().despawn(left.entity)?;
        }

        for hand in &mut self.hands {
            for finger in &mut hand.fingers {
                let was_touching = finger.touching;
                if self.rng.gen_bool(FLIP_CHANCE) {
                    finger.touching = !finger.touching;
                }

                match (was_touching, finger.touching) {
                    (false, true) => self.zone.on_contact_begin(finger.collider),
                    (true, true) => self.zone.on_contact_persist(finger.collider),
                    _ => {}
                }
            }
        }

        let report = self.zone.flush();
        if !report.is_quiet() {
            log::info!(
                "tick {}: +{} -{} contacts, {} hands present",
                tick,
                report.added,
                report.removed,
                self.presence.count()
            );
        }
        Ok(())
    }
}

fn spawn_hand(world: &mut World, side: &str) -> Result<Hand, WorldError> {
    let entity = world.spawn(side, Tags::TRACKED | Tags::HAND);
    let fingers = (0..FINGERS_PER_HAND)
        .map(|i| {
            let finger = world.spawn_child(entity, format!("{side}-finger{i}"), Tags::empty())?;
            Ok(Finger {
                collider: world.attach_collider(finger)?,
                touching: false,
            })
        })
        .collect::<Result<Vec<_>, WorldError>>()?;
    Ok(Hand { entity, fingers })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_default("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading config from {}", path);
            PresenceConfig::load_from_file(&path)?
        }
        None => PresenceConfig::default(),
    };

    log::info!("Starting trigger zone demo on '{}'", config.zone.name);
    let mut demo = ZoneDemo::new(&config)?;
    for tick in 0..TICKS {
        demo.step(tick)?;
    }

    let diagnostics = demo.presence.diagnostics();
    log::info!(
        "Done: {} hands present, {} sweeps ({} entities swept), {} unresolved contacts",
        demo.presence.count(),
        diagnostics.sweeps,
        diagnostics.swept_entities,
        diagnostics.unresolved_additions
    );
    Ok(())
}
