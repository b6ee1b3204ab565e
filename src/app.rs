//! Plugin composition for Run, Teus, Run!
//!
//! `TeusRunPlugin` glues together all domain-specific plugins and sets up system ordering. It is
//! split in two: `GameplayPlugin` holds everything that runs without a window or asset server
//! (state machine, scoring, spawning, contacts, input gating), and the presentation plugins add
//! textures, backdrop and UI on top.

use bevy::prelude::*;

use crate::background::BackgroundPlugin;
use crate::character::CharacterPlugin;
use crate::collision::CollisionPlugin;
use crate::config::GameConfig;
use crate::input::InputGatePlugin;
use crate::score::ScorePlugin;
use crate::spawn::SpawnPlugin;
use crate::sprites::{SpriteHandles, SpritesPlugin};
use crate::state::{
    apply_lifecycle_actions, lifecycle_hotkeys, reset_session_clock, tick_session_clock, GameSet,
    GameState, LifecycleAction, SessionClock,
};
use crate::ui::UiPlugin;

/// Bundles every plugin into a single unit that can be added to the Bevy `App`.
pub struct TeusRunPlugin;

impl Plugin for TeusRunPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((GameplayPlugin, SpritesPlugin, BackgroundPlugin, UiPlugin))
            .add_systems(Startup, setup_camera)
            .add_systems(Update, lifecycle_hotkeys.before(GameSet::Input));
    }
}

/// Headless core of the game.
pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        // Resources the sub-plugins read while building.
        app.init_resource::<GameConfig>()
            .init_resource::<SpriteHandles>()
            .init_resource::<SessionClock>()
            .init_state::<GameState>()
            .add_event::<LifecycleAction>();

        app.add_plugins((
            ScorePlugin,     // Running score + best-score persistence.
            SpawnPlugin,     // Timed enemy/collectible spawns and scrolling.
            CharacterPlugin, // The ghost the player protects.
            CollisionPlugin, // Contact detection and outcomes.
            InputGatePlugin, // Tap debounce + fade window.
        ))
        // Input → Movement → Contacts → Effects, only while Playing. Lifecycle
        // actions are applied last so every system in the frame saw the same state.
        .configure_sets(
            Update,
            (
                GameSet::Input,
                GameSet::Movement,
                GameSet::Contacts,
                GameSet::Effects,
            )
                .chain()
                .run_if(in_state(GameState::Playing)),
        )
        .add_systems(OnEnter(GameState::Playing), reset_session_clock)
        .add_systems(OnExit(GameState::Playing), reset_session_clock)
        .add_systems(
            Update,
            (
                tick_session_clock
                    .before(GameSet::Input)
                    .run_if(in_state(GameState::Playing)),
                apply_lifecycle_actions.after(GameSet::Effects),
            ),
        );
    }
}

/// Spawns the single fixed 2D camera. The playfield is centred on the world origin.
fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("MainCamera"), Camera2dBundle::default()));
}

/// Despawns every entity tagged with `T`, children included. Used on state exit.
pub fn despawn_tagged<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::character::Character;
    use crate::collision::{Collider, PhysicsBody};
    use crate::config::ScoreConfig;
    use crate::score::ScoreTracker;
    use crate::spawn::{Collectible, Scroller};
    use crate::store::{KeyValueStore, MemoryStore, StoreError};
    use bevy::input::InputPlugin;
    use bevy::state::app::StatesPlugin;

    /// Memory store the test keeps a handle to after the tracker takes ownership.
    #[derive(Clone, Default)]
    struct SharedStore(Arc<Mutex<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get_integer(&self, key: &str) -> Result<Option<i64>, StoreError> {
            self.0.lock().unwrap().get_integer(key)
        }

        fn set_integer(&mut self, key: &str, value: i64) -> Result<(), StoreError> {
            self.0.lock().unwrap().set_integer(key, value)
        }
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin, InputPlugin))
            .insert_resource(ScoreTracker::in_memory(&ScoreConfig::default()))
            .add_plugins(GameplayPlugin);
        app.update();
        app
    }

    fn state(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    fn send(app: &mut App, action: LifecycleAction) {
        app.world_mut().send_event(action);
        app.update();
        app.update();
    }

    #[test]
    fn starts_in_main_menu() {
        let app = app();
        assert_eq!(state(&app), GameState::MainMenu);
    }

    #[test]
    fn score_only_ticks_while_playing() {
        let mut app = app();
        for _ in 0..3 {
            app.update();
        }
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), 0);

        send(&mut app, LifecycleAction::Start);
        let before = app.world().resource::<ScoreTracker>().displayed();
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), before + 5);
    }

    #[test]
    fn frozen_session_stops_ticking() {
        let mut app = app();
        send(&mut app, LifecycleAction::Start);

        app.world_mut().resource_mut::<SessionClock>().set_frozen(true);
        let before = app.world().resource::<ScoreTracker>().displayed();
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), before);
    }

    #[test]
    fn restart_begins_a_fresh_session() {
        let mut app = app();
        send(&mut app, LifecycleAction::Start);
        for _ in 0..10 {
            app.update();
        }
        app.world_mut().resource_mut::<ScoreTracker>().award_bonus(10);

        send(&mut app, LifecycleAction::LethalContact);
        assert_eq!(state(&app), GameState::GameOver);
        let final_score = app.world().resource::<ScoreTracker>().displayed();
        assert!(final_score > 1000);
        app.update();
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), final_score);

        // The OnEnter(Playing) reset runs during the transition frame; one tick follows it.
        send(&mut app, LifecycleAction::Restart);
        assert_eq!(state(&app), GameState::Playing);
        let score = app.world().resource::<ScoreTracker>();
        assert!(score.displayed() <= 1);
        assert_eq!(score.bonus(), 0);
        assert_eq!(score.best(), final_score);
    }

    #[test]
    fn game_over_then_menu() {
        let mut app = app();
        send(&mut app, LifecycleAction::Start);
        send(&mut app, LifecycleAction::LethalContact);
        send(&mut app, LifecycleAction::ReturnToMenu);
        assert_eq!(state(&app), GameState::MainMenu);

        let mut scrollers = app.world_mut().query_filtered::<Entity, With<Scroller>>();
        assert_eq!(scrollers.iter(app.world()).count(), 0);
    }

    #[test]
    fn start_is_ignored_mid_session() {
        let mut app = app();
        send(&mut app, LifecycleAction::Start);
        for _ in 0..3 {
            app.update();
        }
        let before = app.world().resource::<ScoreTracker>().displayed();
        send(&mut app, LifecycleAction::Start);
        assert_eq!(state(&app), GameState::Playing);
        assert!(app.world().resource::<ScoreTracker>().displayed() > before);
    }

    #[test]
    fn ticks_pickup_and_lethal_contact_persist_the_record() {
        let store = SharedStore::default();
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin, InputPlugin))
            .insert_resource(ScoreTracker::new(
                Box::new(store.clone()),
                &ScoreConfig::default(),
            ))
            .add_plugins(GameplayPlugin);
        app.update();
        send(&mut app, LifecycleAction::Start);
        assert_eq!(state(&app), GameState::Playing);

        app.world_mut().resource_mut::<ScoreTracker>().reset();
        for _ in 0..5 {
            app.update();
        }
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), 5);

        let mut characters = app
            .world_mut()
            .query_filtered::<&Transform, With<Character>>();
        let position = characters.single(app.world()).translation;
        app.world_mut().spawn((
            Collectible,
            Transform::from_translation(position),
            Collider::from_size(Vec2::splat(40.0)),
            PhysicsBody::collectible(),
        ));
        app.update();
        // Pickup and the tick of the same frame.
        assert_eq!(app.world().resource::<ScoreTracker>().displayed(), 1006);

        send(&mut app, LifecycleAction::LethalContact);
        assert_eq!(state(&app), GameState::GameOver);

        let score = app.world().resource::<ScoreTracker>();
        assert_eq!(score.bonus(), 1000);
        assert!(score.survival() >= 6);
        assert_eq!(score.displayed(), 1000 + score.survival());
        assert_eq!(score.best(), score.displayed());
        let persisted = store.get_integer("HighScore").unwrap();
        assert_eq!(persisted, Some(score.displayed() as i64));
    }
}
