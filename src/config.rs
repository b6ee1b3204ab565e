//! Runtime-tweakable game tuning, read from `assets/config/game.ron` at startup.
//!
//! Every section carries `#[serde(default)]`, so a config file only needs the values it wants to
//! override. A missing or malformed file is never fatal: the defaults below reproduce the shipped
//! game exactly.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Run, Teus, Run!".to_owned(),
            width: 844.0,
            height: 390.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    /// Interval before the first spawn of a session.
    pub initial_interval: f64,
    /// Half-open range `[min, max)` the next interval is drawn from.
    pub interval_min: f64,
    pub interval_max: f64,
    /// Kind roll is uniform over `0..=roll_max`; rolls at or above the threshold are collectibles.
    pub roll_max: u32,
    pub collectible_threshold: u32,
    /// Horizontal speed of spawned entities, world units per second.
    pub scroll_speed: f32,
    pub offscreen_margin: f32,
    /// Fixed seed for reproducible runs; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            initial_interval: 2.0,
            interval_min: 1.0,
            interval_max: 3.5,
            roll_max: 10,
            collectible_threshold: 9,
            scroll_speed: 500.0,
            offscreen_margin: 50.0,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    pub pickup_units: u64,
    pub points_per_unit: u64,
    pub high_score_key: String,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            pickup_units: 10,
            points_per_unit: 100,
            high_score_key: "HighScore".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub fade_out_secs: f64,
    pub fade_in_secs: f64,
    pub faded_alpha: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            fade_out_secs: 0.2,
            fade_in_secs: 1.0,
            faded_alpha: 0.2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BackgroundConfig {
    pub tiles: usize,
    /// Distance moved per simulation tick, not per second.
    pub speed_per_tick: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            tiles: 3,
            speed_per_tick: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CharacterConfig {
    pub sprite_size: f32,
    pub scale: f32,
    pub run_frame_secs: f32,
    pub enemy_frame_secs: f32,
    /// Position of the character as a fraction of the playfield, measured from bottom-left.
    pub x_fraction: f32,
    pub y_fraction: f32,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            sprite_size: 96.0,
            scale: 0.5,
            run_frame_secs: 0.10,
            enemy_frame_secs: 0.20,
            x_fraction: 0.2,
            y_fraction: 0.25,
        }
    }
}

impl CharacterConfig {
    pub fn scaled_size(&self) -> Vec2 {
        Vec2::splat(self.sprite_size * self.scale)
    }
}

#[derive(Debug, Deserialize, Resource, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub spawn: SpawnConfig,
    pub score: ScoreConfig,
    pub input: InputConfig,
    pub background: BackgroundConfig,
    pub character: CharacterConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(&path)?;
        Ok(ron::from_str(&data)?)
    }

    /// Falls back to defaults when the file cannot be read or parsed; the error is returned so the
    /// caller can log it once logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// World-space size of the visible playfield. The camera is centred on the origin.
    pub fn playfield(&self) -> Vec2 {
        Vec2::new(self.window.width, self.window.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg: GameConfig = ron::from_str("(spawn: (seed: Some(7), scroll_speed: 320.0))").unwrap();
        assert_eq!(cfg.spawn.seed, Some(7));
        assert_eq!(cfg.spawn.scroll_speed, 320.0);
        assert_eq!(cfg.spawn.interval_min, 1.0);
        assert_eq!(cfg.score, ScoreConfig::default());
    }

    #[test]
    fn defaults_match_the_shipped_tuning() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.score.pickup_units * cfg.score.points_per_unit, 1000);
        assert_eq!(cfg.score.high_score_key, "HighScore");
        assert!((cfg.input.fade_out_secs + cfg.input.fade_in_secs - 1.2).abs() < 1e-9);
        assert_eq!(cfg.character.scaled_size(), Vec2::splat(48.0));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let (cfg, err) = GameConfig::load_or_default("does/not/exist.ron");
        assert_eq!(cfg, GameConfig::default());
        assert!(matches!(err, Some(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.ron");
        fs::write(&path, "(spawn: (roll_max: \"ten\"))").unwrap();

        let (cfg, err) = GameConfig::load_or_default(&path);
        assert_eq!(cfg, GameConfig::default());
        assert!(matches!(err, Some(ConfigError::Parse(_))));
    }

    #[test]
    fn shipped_config_file_parses() {
        let cfg = GameConfig::load_from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config/game.ron"))
            .expect("shipped config should parse");
        assert_eq!(cfg.spawn.collectible_threshold, 9);
    }
}
