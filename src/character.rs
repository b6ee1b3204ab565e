//! The ghost the player protects. It never moves: it sits at a fixed fraction of the playfield,
//! runs its two-frame cycle, and carries the only body that reports contacts with enemies and
//! flowers. Spawned when a session starts and removed when it ends.

use bevy::prelude::*;

use crate::collision::{Collider, PhysicsBody};
use crate::config::GameConfig;
use crate::sprites::{FrameAnimation, SpriteHandles};
use crate::state::GameState;

pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_character)
            .add_systems(OnExit(GameState::Playing), despawn_character);
    }
}

/// Marker used by input gating and contact tests to find the player-controlled entity.
#[derive(Component)]
pub struct Character;

/// Fixed screen anchor, measured from the bottom-left corner of the playfield.
pub fn character_position(config: &GameConfig) -> Vec3 {
    let playfield = config.playfield();
    let anchor = Vec2::new(
        playfield.x * config.character.x_fraction,
        playfield.y * config.character.y_fraction,
    );
    (anchor - playfield * 0.5).extend(2.0)
}

fn spawn_character(mut commands: Commands, handles: Res<SpriteHandles>, config: Res<GameConfig>) {
    let size = config.character.scaled_size();
    let animation = FrameAnimation::new(
        handles.character_run.clone(),
        config.character.run_frame_secs,
    );

    commands.spawn((
        Name::new("Character"),
        Character,
        SpriteBundle {
            texture: animation.current(),
            sprite: Sprite {
                custom_size: Some(size),
                ..default()
            },
            transform: Transform::from_translation(character_position(&config)),
            ..default()
        },
        animation,
        Collider::from_size(size),
        PhysicsBody::character(),
    ));
}

fn despawn_character(mut commands: Commands, query: Query<Entity, With<Character>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
