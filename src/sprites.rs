//! Texture preloading and flip-book animation.
//!
//! `SpriteHandles` loads every ghost, granny, flower and portrait texture once at startup and
//! holds on to them, so spawning an enemy never waits on a load.

use bevy::prelude::*;

use crate::state::session_running;

const CARD_FRAMES: usize = 18;

/// Registers the handle cache, queues the texture loads, and drives frame animation for both
/// world sprites and UI images.
pub struct SpritesPlugin;

impl Plugin for SpritesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteHandles>()
            .add_systems(Startup, load_sprite_handles)
            .add_systems(
                Update,
                (
                    animate_sprites.run_if(session_running),
                    animate_ui_images,
                ),
            );
    }
}

/// Every texture the game draws. Handles default to the placeholder image until
/// `load_sprite_handles` runs, which keeps headless tests free of an `AssetServer`.
#[derive(Resource, Default, Clone)]
pub struct SpriteHandles {
    pub character_run: Vec<Handle<Image>>,
    /// Two enemy skins, each a two-frame run cycle.
    pub enemy_skins: [Vec<Handle<Image>>; 2],
    pub collectible: Handle<Image>,
    pub background: Handle<Image>,
    pub menu_background: Handle<Image>,
    pub mascot_moods: Vec<Handle<Image>>,
    pub game_over_card: Vec<Handle<Image>>,
}

fn load_sprite_handles(asset_server: Res<AssetServer>, mut handles: ResMut<SpriteHandles>) {
    let load = |name: &str| -> Handle<Image> { asset_server.load(format!("textures/{name}.png")) };

    handles.character_run = vec![load("ghost1"), load("ghost2")];
    handles.enemy_skins = [
        vec![load("granny1"), load("granny2")],
        vec![load("gran1"), load("gran2")],
    ];
    handles.collectible = load("flower");
    handles.background = load("background");
    handles.menu_background = load("blue_background");
    handles.mascot_moods = ["teus_angry", "teus_happy", "teus_worried"]
        .into_iter()
        .map(load)
        .collect();
    handles.game_over_card = (0..CARD_FRAMES)
        .map(|i| load(&format!("teus_card{i}")))
        .collect();

    info!("Queued sprite textures. Add the PNGs under assets/textures/ to replace placeholders.");
}

/// Looping flip-book over a fixed frame list.
#[derive(Component, Debug, Clone)]
pub struct FrameAnimation {
    frames: Vec<Handle<Image>>,
    timer: Timer,
    index: usize,
}

impl FrameAnimation {
    pub fn new(frames: Vec<Handle<Image>>, seconds_per_frame: f32) -> Self {
        Self {
            frames,
            timer: Timer::from_seconds(seconds_per_frame, TimerMode::Repeating),
            index: 0,
        }
    }

    pub fn current(&self) -> Handle<Image> {
        self.frames.get(self.index).cloned().unwrap_or_default()
    }

    /// Advances the timer and returns the new frame when it changed.
    pub fn advance(&mut self, delta: std::time::Duration) -> Option<Handle<Image>> {
        if self.frames.len() < 2 {
            return None;
        }

        self.timer.tick(delta);
        let steps = self.timer.times_finished_this_tick() as usize;
        if steps == 0 {
            return None;
        }

        self.index = (self.index + steps) % self.frames.len();
        Some(self.current())
    }
}

fn animate_sprites(time: Res<Time>, mut query: Query<(&mut FrameAnimation, &mut Handle<Image>)>) {
    for (mut animation, mut texture) in &mut query {
        if let Some(frame) = animation.advance(time.delta()) {
            *texture = frame;
        }
    }
}

fn animate_ui_images(time: Res<Time>, mut query: Query<(&mut FrameAnimation, &mut UiImage)>) {
    for (mut animation, mut image) in &mut query {
        if let Some(frame) = animation.advance(time.delta()) {
            image.texture = frame;
        }
    }
}
