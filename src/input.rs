//! Tap handling with a debounce window.
//!
//! A tap makes the character fade out and back in, and while that plays the character's body is
//! out of play (enemies pass straight through). The gate stays closed for the whole fade: taps
//! arriving before it completes are dropped, not queued.

use bevy::prelude::*;

use crate::character::Character;
use crate::collision::PhysicsBody;
use crate::config::{GameConfig, InputConfig};
use crate::state::{session_running, GameSet, GameState, SessionClock};

pub struct InputGatePlugin;

impl Plugin for InputGatePlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<GameConfig>()
            .map(|cfg| cfg.input.clone())
            .unwrap_or_default();

        app.insert_resource(InputGate::new(&config))
            .add_systems(OnEnter(GameState::Playing), cancel_fade)
            .add_systems(
                Update,
                (
                    (finish_fade, read_taps).chain().in_set(GameSet::Input),
                    apply_fade_alpha.in_set(GameSet::Effects),
                )
                    .run_if(session_running),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FadeWindow {
    started_at: f64,
}

#[derive(Resource, Debug)]
pub struct InputGate {
    enabled: bool,
    window: Option<FadeWindow>,
    fade_out: f64,
    fade_in: f64,
    faded_alpha: f32,
}

impl InputGate {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            enabled: true,
            window: None,
            fade_out: config.fade_out_secs,
            fade_in: config.fade_in_secs,
            faded_alpha: config.faded_alpha,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn duration(&self) -> f64 {
        self.fade_out + self.fade_in
    }

    /// Accepts the tap and opens a fade window if the gate is open. Returns whether the tap was
    /// accepted.
    pub fn try_accept(&mut self, now: f64) -> bool {
        if !self.enabled {
            return false;
        }

        self.enabled = false;
        self.window = Some(FadeWindow { started_at: now });
        true
    }

    /// Closes the fade window once it has run its full length. Returns `true` exactly once per
    /// window, on the call that reopened the gate.
    pub fn poll(&mut self, now: f64) -> bool {
        let Some(window) = self.window else {
            return false;
        };

        if now - window.started_at < self.duration() {
            return false;
        }

        self.window = None;
        self.enabled = true;
        true
    }

    /// Drops any running window and reopens the gate immediately.
    pub fn cancel(&mut self) {
        self.window = None;
        self.enabled = true;
    }

    /// Character opacity at `now`: a quick fade down to `faded_alpha`, then a slower fade back.
    pub fn alpha(&self, now: f64) -> f32 {
        let Some(window) = self.window else {
            return 1.0;
        };

        let t = (now - window.started_at).max(0.0);
        let low = self.faded_alpha;
        if t < self.fade_out {
            let progress = (t / self.fade_out) as f32;
            1.0 + (low - 1.0) * progress
        } else if t < self.duration() {
            let progress = ((t - self.fade_out) / self.fade_in) as f32;
            low + (1.0 - low) * progress
        } else {
            1.0
        }
    }
}

fn tapped(
    touches: &Touches,
    mouse: &ButtonInput<MouseButton>,
    keyboard: &ButtonInput<KeyCode>,
) -> bool {
    touches.any_just_pressed()
        || mouse.just_pressed(MouseButton::Left)
        || keyboard.just_pressed(KeyCode::Space)
}

fn read_taps(
    touches: Res<Touches>,
    mouse: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    clock: Res<SessionClock>,
    mut gate: ResMut<InputGate>,
    mut bodies: Query<&mut PhysicsBody, With<Character>>,
) {
    if !tapped(&touches, &mouse, &keyboard) {
        return;
    }

    if !gate.try_accept(clock.now()) {
        debug!("Tap ignored, fade still running");
        return;
    }

    for mut body in &mut bodies {
        *body = PhysicsBody::disabled();
    }
}

fn finish_fade(
    clock: Res<SessionClock>,
    mut gate: ResMut<InputGate>,
    mut bodies: Query<&mut PhysicsBody, With<Character>>,
) {
    if !gate.poll(clock.now()) {
        return;
    }

    for mut body in &mut bodies {
        *body = PhysicsBody::character();
    }
}

fn apply_fade_alpha(
    clock: Res<SessionClock>,
    gate: Res<InputGate>,
    mut sprites: Query<&mut Sprite, With<Character>>,
) {
    let alpha = gate.alpha(clock.now());
    for mut sprite in &mut sprites {
        sprite.color = Color::srgba(1.0, 1.0, 1.0, alpha);
    }
}

fn cancel_fade(mut gate: ResMut<InputGate>) {
    gate.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> InputGate {
        InputGate::new(&InputConfig::default())
    }

    #[test]
    fn taps_inside_the_window_are_dropped() {
        let mut gate = gate();
        assert!(gate.try_accept(0.0));
        assert!(!gate.try_accept(0.5));

        assert!(!gate.poll(1.0));
        assert!(!gate.try_accept(1.1));

        assert!(gate.poll(1.2));
        assert!(gate.try_accept(1.3));
    }

    #[test]
    fn gate_stays_closed_until_the_completion_fires() {
        let mut gate = gate();
        assert!(gate.try_accept(0.0));
        // Time has passed but nothing has polled the window closed yet.
        assert!(!gate.try_accept(5.0));
        assert!(gate.poll(5.0));
        assert!(!gate.poll(5.1));
        assert!(gate.is_enabled());
    }

    #[test]
    fn cancel_reopens_immediately() {
        let mut gate = gate();
        gate.try_accept(0.0);
        gate.cancel();
        assert!(gate.is_enabled());
        assert!(!gate.poll(2.0));
        assert!(gate.try_accept(0.1));
    }

    #[test]
    fn alpha_dips_then_recovers() {
        let mut gate = gate();
        assert_eq!(gate.alpha(0.0), 1.0);

        gate.try_accept(10.0);
        assert!((gate.alpha(10.0) - 1.0).abs() < 1e-6);
        assert!((gate.alpha(10.1) - 0.6).abs() < 1e-4);
        assert!((gate.alpha(10.2) - 0.2).abs() < 1e-4);
        assert!((gate.alpha(10.7) - 0.6).abs() < 1e-4);
        assert_eq!(gate.alpha(11.5), 1.0);
    }
}
