//! Endless scrolling backdrop: a row of screen-sized tiles moving left a fixed distance each tick,
//! with any tile that leaves on the left re-queued behind the last one.

use bevy::prelude::*;

use crate::config::GameConfig;
use crate::sprites::SpriteHandles;
use crate::state::{session_running, GameSet, GameState};

pub struct BackgroundPlugin;

impl Plugin for BackgroundPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(GameState::Playing), spawn_background)
            .add_systems(OnExit(GameState::Playing), despawn_background)
            .add_systems(
                Update,
                scroll_background
                    .in_set(GameSet::Movement)
                    .run_if(session_running),
            );
    }
}

#[derive(Component)]
pub struct BackgroundTile;

/// New centre x for a tile of `width` after one tick. Tiles are centred at `i * width` at rest, so
/// a tile is fully off the left edge once its centre passes `-width`.
pub fn scroll_tile(x: f32, width: f32, tiles: usize, speed: f32) -> f32 {
    let moved = x - speed;
    if moved < -width {
        moved + width * tiles as f32
    } else {
        moved
    }
}

fn spawn_background(mut commands: Commands, handles: Res<SpriteHandles>, config: Res<GameConfig>) {
    let size = config.playfield();
    for i in 0..config.background.tiles {
        commands.spawn((
            Name::new("BackgroundTile"),
            BackgroundTile,
            SpriteBundle {
                texture: handles.background.clone(),
                sprite: Sprite {
                    custom_size: Some(size),
                    ..default()
                },
                transform: Transform::from_xyz(i as f32 * size.x, 0.0, 0.0),
                ..default()
            },
        ));
    }
}

fn scroll_background(
    config: Res<GameConfig>,
    mut tiles: Query<&mut Transform, With<BackgroundTile>>,
) {
    let width = config.playfield().x;
    for mut transform in &mut tiles {
        transform.translation.x = scroll_tile(
            transform.translation.x,
            width,
            config.background.tiles,
            config.background.speed_per_tick,
        );
    }
}

fn despawn_background(mut commands: Commands, query: Query<Entity, With<BackgroundTile>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}
