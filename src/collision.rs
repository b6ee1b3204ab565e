//! Category-filtered contact detection and resolution.
//!
//! Every participating entity carries a [`PhysicsBody`] (what it is, and what it wants to hear
//! about) and a [`Collider`] box. `detect_contacts` turns box overlaps into [`ContactBegan`]
//! events, firing once when a pair starts touching. `resolve_contacts` maps each event to a
//! [`ContactOutcome`] and applies it.

use std::collections::HashSet;
use std::ops::BitOr;

use bevy::prelude::*;

use crate::config::GameConfig;
use crate::score::ScoreTracker;
use crate::state::{session_running, GameSet, GameState, LifecycleAction};

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveContacts>()
            .add_event::<ContactBegan>()
            .add_systems(
                Update,
                (detect_contacts, resolve_contacts)
                    .chain()
                    .in_set(GameSet::Contacts)
                    .run_if(session_running),
            )
            .add_systems(OnExit(GameState::Playing), clear_active_contacts);
    }
}

/// Bit-flag tag classifying an entity's role. Participants carry exactly one of the non-empty
/// tags; `NONE` marks a body that is temporarily out of play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CategoryMask(u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    pub const CHARACTER: Self = Self(0b1);
    pub const ENEMY: Self = Self(0b10);
    pub const COLLECTIBLE: Self = Self(0b100);

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for CategoryMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub category: CategoryMask,
    pub contact_test: CategoryMask,
}

impl PhysicsBody {
    pub fn character() -> Self {
        Self {
            category: CategoryMask::CHARACTER,
            contact_test: CategoryMask::ENEMY | CategoryMask::COLLECTIBLE,
        }
    }

    pub const fn enemy() -> Self {
        Self {
            category: CategoryMask::ENEMY,
            contact_test: CategoryMask::CHARACTER,
        }
    }

    pub const fn collectible() -> Self {
        Self {
            category: CategoryMask::COLLECTIBLE,
            contact_test: CategoryMask::CHARACTER,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            category: CategoryMask::NONE,
            contact_test: CategoryMask::NONE,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.category != CategoryMask::NONE
    }

    /// Either side asking about the other is enough for a contact to be reported.
    pub fn reports_contact_with(&self, other: &PhysicsBody) -> bool {
        self.contact_test.intersects(other.category) || other.contact_test.intersects(self.category)
    }
}

#[derive(Component, Copy, Clone, Debug)]
pub struct Collider {
    pub half_extents: Vec2,
}

impl Collider {
    pub fn from_size(size: Vec2) -> Self {
        Self {
            half_extents: size * 0.5,
        }
    }

    pub fn overlaps(&self, position: Vec2, other: &Collider, other_position: Vec2) -> bool {
        let delta = (position - other_position).abs();
        let reach = self.half_extents + other.half_extents;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Two bodies began touching. Categories are captured at detection time, since a body may be
/// disabled or despawned before the event is read.
#[derive(Event, Debug, Clone, Copy)]
pub struct ContactBegan {
    pub a: Entity,
    pub b: Entity,
    pub category_a: CategoryMask,
    pub category_b: CategoryMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSide {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Lethal,
    Pickup { collectible: ContactSide },
    Ignored,
}

/// Unordered lookup over the two categories.
pub fn resolve_contact(a: CategoryMask, b: CategoryMask) -> ContactOutcome {
    use CategoryMask as C;

    match (a, b) {
        (C::CHARACTER, C::ENEMY) | (C::ENEMY, C::CHARACTER) => ContactOutcome::Lethal,
        (C::CHARACTER, C::COLLECTIBLE) => ContactOutcome::Pickup {
            collectible: ContactSide::B,
        },
        (C::COLLECTIBLE, C::CHARACTER) => ContactOutcome::Pickup {
            collectible: ContactSide::A,
        },
        _ => ContactOutcome::Ignored,
    }
}

/// Pairs currently touching, keyed with the lower entity first.
#[derive(Resource, Default, Debug)]
pub struct ActiveContacts(HashSet<(Entity, Entity)>);

#[cfg(test)]
impl ActiveContacts {
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

fn pair_key(a: Entity, b: Entity) -> (Entity, Entity) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn detect_contacts(
    bodies: Query<(Entity, &Transform, &Collider, &PhysicsBody)>,
    mut active: ResMut<ActiveContacts>,
    mut contacts: EventWriter<ContactBegan>,
) {
    let mut touching = HashSet::with_capacity(active.0.len());

    for [(a, ta, ca, ba), (b, tb, cb, bb)] in bodies.iter_combinations::<2>() {
        if !ba.is_enabled() || !bb.is_enabled() || !ba.reports_contact_with(bb) {
            continue;
        }

        if !ca.overlaps(ta.translation.truncate(), cb, tb.translation.truncate()) {
            continue;
        }

        let key = pair_key(a, b);
        if !active.0.contains(&key) {
            contacts.send(ContactBegan {
                a,
                b,
                category_a: ba.category,
                category_b: bb.category,
            });
        }
        touching.insert(key);
    }

    active.0 = touching;
}

fn resolve_contacts(
    mut commands: Commands,
    mut contacts: EventReader<ContactBegan>,
    mut score: ResMut<ScoreTracker>,
    mut actions: EventWriter<LifecycleAction>,
    bodies: Query<&PhysicsBody>,
    config: Res<GameConfig>,
) {
    let mut consumed = HashSet::new();

    for contact in contacts.read() {
        match resolve_contact(contact.category_a, contact.category_b) {
            ContactOutcome::Lethal => {
                info!("Character hit an enemy at score {}", score.displayed());
                actions.send(LifecycleAction::LethalContact);
            }
            ContactOutcome::Pickup { collectible } => {
                let entity = match collectible {
                    ContactSide::A => contact.a,
                    ContactSide::B => contact.b,
                };

                if bodies.get(entity).is_err() || !consumed.insert(entity) {
                    continue;
                }

                commands.entity(entity).despawn_recursive();
                score.award_bonus(config.score.pickup_units);
                info!("Collectible picked up, score now {}", score.displayed());
            }
            ContactOutcome::Ignored => {}
        }
    }
}

fn clear_active_contacts(mut active: ResMut<ActiveContacts>) {
    active.0.clear();
}
