//! Enemy and collectible spawning.
//!
//! [`SpawnController`] owns the timing and the weighted kind roll; it holds its own seeded
//! `ChaCha8Rng`, so a fixed seed replays the same spawn sequence. The systems below turn its
//! decisions into scrolling entities and clean them up once they leave the playfield.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::collision::{Collider, PhysicsBody};
use crate::config::{GameConfig, SpawnConfig};
use crate::sprites::{FrameAnimation, SpriteHandles};
use crate::state::{session_running, GameSet, GameState, SessionClock};

pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SpawnController>() {
            let config = app
                .world()
                .get_resource::<GameConfig>()
                .map(|cfg| cfg.spawn.clone())
                .unwrap_or_default();
            app.insert_resource(SpawnController::new(&config));
        }

        app.add_systems(OnEnter(GameState::Playing), reset_spawner)
            .add_systems(OnExit(GameState::Playing), despawn_scrollers)
            .add_systems(
                Update,
                (
                    scroll_entities.in_set(GameSet::Movement),
                    spawn_entities.in_set(GameSet::Effects),
                )
                    .run_if(session_running),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Enemy,
    Collectible,
}

#[derive(Resource, Debug)]
pub struct SpawnController {
    last_spawn: f64,
    interval: f64,
    config: SpawnConfig,
    rng: ChaCha8Rng,
}

impl SpawnController {
    /// Seeds from `config.seed`, or from OS entropy when unset.
    pub fn new(config: &SpawnConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &SpawnConfig, rng: ChaCha8Rng) -> Self {
        Self {
            last_spawn: 0.0,
            interval: config.initial_interval,
            config: config.clone(),
            rng,
        }
    }

    pub fn last_spawn(&self) -> f64 {
        self.last_spawn
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Fresh timer for a new session. The rng keeps its stream.
    pub fn reset(&mut self) {
        self.last_spawn = 0.0;
        self.interval = self.config.initial_interval;
    }

    /// Emits at most one spawn per call, once more than `interval` has passed since the last one.
    pub fn tick(&mut self, now: f64) -> Option<SpawnKind> {
        if now - self.last_spawn <= self.interval {
            return None;
        }

        self.last_spawn = now;
        self.interval = self
            .rng
            .gen_range(self.config.interval_min..self.config.interval_max);

        let roll = self.rng.gen_range(0..=self.config.roll_max);
        if roll < self.config.collectible_threshold {
            Some(SpawnKind::Enemy)
        } else {
            Some(SpawnKind::Collectible)
        }
    }

    /// Coin flip used to pick between the two enemy skins.
    pub fn pick_skin(&mut self) -> usize {
        usize::from(self.rng.gen_bool(0.5))
    }
}

#[derive(Component)]
pub struct Enemy;

#[derive(Component)]
pub struct Collectible;

/// Constant-velocity horizontal motion; the entity is despawned once `x` drops below `exit_x`.
#[derive(Component, Debug, Clone, Copy)]
pub struct Scroller {
    pub velocity: f32,
    pub exit_x: f32,
}

/// Start and exit positions for a spawned entity of the given size: just past the right edge,
/// level with the character, leaving once fully past the left edge.
pub fn spawn_lane(config: &GameConfig, size: Vec2) -> (Vec3, f32) {
    let playfield = config.playfield();
    let x = playfield.x * 0.5 + config.spawn.offscreen_margin + size.x * 0.5;
    let y = -playfield.y * 0.5 + playfield.y * config.character.y_fraction;
    let exit_x = -playfield.x * 0.5 - size.x * 0.5;
    (Vec3::new(x, y, 2.0), exit_x)
}

fn spawn_entities(
    mut commands: Commands,
    clock: Res<SessionClock>,
    mut controller: ResMut<SpawnController>,
    handles: Res<SpriteHandles>,
    config: Res<GameConfig>,
) {
    let Some(kind) = controller.tick(clock.now()) else {
        return;
    };

    let size = config.character.scaled_size();
    let (position, exit_x) = spawn_lane(&config, size);
    let scroller = Scroller {
        velocity: -config.spawn.scroll_speed,
        exit_x,
    };

    debug!(
        "Spawning {:?} at t={:.2}, next in {:.2}s",
        kind,
        clock.now(),
        controller.interval()
    );

    match kind {
        SpawnKind::Enemy => {
            let skin = controller.pick_skin();
            let frames = handles.enemy_skins[skin].clone();
            let animation = FrameAnimation::new(frames, config.character.enemy_frame_secs);
            commands.spawn((
                Name::new("Enemy"),
                Enemy,
                SpriteBundle {
                    texture: animation.current(),
                    sprite: Sprite {
                        custom_size: Some(size),
                        ..default()
                    },
                    transform: Transform::from_translation(position),
                    ..default()
                },
                animation,
                scroller,
                Collider::from_size(size),
                PhysicsBody::enemy(),
            ));
        }
        SpawnKind::Collectible => {
            commands.spawn((
                Name::new("Collectible"),
                Collectible,
                SpriteBundle {
                    texture: handles.collectible.clone(),
                    sprite: Sprite {
                        custom_size: Some(size),
                        ..default()
                    },
                    transform: Transform::from_translation(position),
                    ..default()
                },
                scroller,
                Collider::from_size(size),
                PhysicsBody::collectible(),
            ));
        }
    }
}

fn scroll_entities(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut Transform, &Scroller)>,
) {
    let dt = time.delta_seconds();

    for (entity, mut transform, scroller) in &mut query {
        transform.translation.x += scroller.velocity * dt;
        if transform.translation.x < scroller.exit_x {
            commands.entity(entity).despawn_recursive();
        }
    }
}

fn reset_spawner(mut controller: ResMut<SpawnController>) {
    controller.reset();
}

fn despawn_scrollers(mut commands: Commands, query: Query<Entity, With<Scroller>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
