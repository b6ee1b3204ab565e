//! Game lifecycle: menu, running session and game-over card, plus the session clock that drives
//! spawn timing and the tap fade window.
//!
//! Every transition goes through [`next_state`], a pure lookup over the current state and the
//! requested [`LifecycleAction`]. Systems never write `NextState<GameState>` directly; they send a
//! `LifecycleAction` event and `apply_lifecycle_actions` decides whether it is legal.

use bevy::input::keyboard::KeyCode;
use bevy::prelude::*;

/// Which screen is up: menu, a running session, or the game-over card.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum GameState {
    #[default]
    MainMenu,
    Playing,
    GameOver,
}

/// Per-frame order while Playing: taps, scrolling, contacts, then score and spawns.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Movement,
    Contacts,
    Effects,
}

/// Requests that may move the lifecycle. User actions come from the UI (buttons or hotkeys);
/// `LethalContact` is produced by the contact resolver.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Start,
    Restart,
    ReturnToMenu,
    LethalContact,
}

/// Transition table. Returns `None` when the action has no effect in `current`.
pub fn next_state(current: GameState, action: LifecycleAction) -> Option<GameState> {
    match (current, action) {
        (GameState::MainMenu, LifecycleAction::Start) => Some(GameState::Playing),
        (GameState::Playing, LifecycleAction::LethalContact) => Some(GameState::GameOver),
        (GameState::GameOver, LifecycleAction::Restart) => Some(GameState::Playing),
        (GameState::GameOver, LifecycleAction::ReturnToMenu) => Some(GameState::MainMenu),
        _ => None,
    }
}

/// Seconds of active play in the current session. Only advances while `Playing` and not frozen,
/// so spawn timing and input gating never see time spent paused or in menus.
#[derive(Resource, Debug, Default)]
pub struct SessionClock {
    elapsed: f64,
    frozen: bool,
}

impl SessionClock {
    pub fn now(&self) -> f64 {
        self.elapsed
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn advance(&mut self, delta: f64) {
        if !self.frozen {
            self.elapsed += delta;
        }
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.frozen = false;
    }
}

/// Run condition for systems that must stop while the session is paused.
pub fn session_running(clock: Res<SessionClock>) -> bool {
    !clock.is_frozen()
}

/// Applies queued lifecycle actions in arrival order. Several actions can land in one frame (two
/// lethal contacts, say); the local `current` makes sure only the first legal one transitions.
pub fn apply_lifecycle_actions(
    mut actions: EventReader<LifecycleAction>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let mut current = *state.get();

    for action in actions.read() {
        let Some(target) = next_state(current, *action) else {
            debug!("Ignoring {:?} while in {:?}", action, current);
            continue;
        };

        info!("Lifecycle: {:?} -> {:?} ({:?})", current, target, action);
        next.set(target);
        current = target;
    }
}

pub fn tick_session_clock(time: Res<Time>, mut clock: ResMut<SessionClock>) {
    clock.advance(time.delta_seconds_f64());
}

pub fn reset_session_clock(mut clock: ResMut<SessionClock>) {
    clock.reset();
}

/// Keyboard shortcuts mirroring the on-screen buttons, plus ESC to freeze/unfreeze a running
/// session.
pub fn lifecycle_hotkeys(
    keyboard: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut clock: ResMut<SessionClock>,
    mut actions: EventWriter<LifecycleAction>,
) {
    match state.get() {
        GameState::MainMenu => {
            if keyboard.just_pressed(KeyCode::Enter) {
                actions.send(LifecycleAction::Start);
            }
        }
        GameState::Playing => {
            if keyboard.just_pressed(KeyCode::Escape) {
                let frozen = !clock.is_frozen();
                clock.set_frozen(frozen);
                info!("Session {}", if frozen { "paused" } else { "resumed" });
            }
        }
        GameState::GameOver => {
            if keyboard.just_pressed(KeyCode::KeyR) || keyboard.just_pressed(KeyCode::Enter) {
                actions.send(LifecycleAction::Restart);
            } else if keyboard.just_pressed(KeyCode::KeyM)
                || keyboard.just_pressed(KeyCode::Escape)
            {
                actions.send(LifecycleAction::ReturnToMenu);
            }
        }
    }
}
