//! Application entry point: loads the tuning file, configures the window, and hands control to
//! the `TeusRunPlugin` defined in `app.rs`.

mod app;
mod background;
mod character;
mod collision;
mod config;
mod input;
mod score;
mod spawn;
mod sprites;
mod state;
mod store;
mod ui;

use app::TeusRunPlugin;
use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::render::texture::ImagePlugin;
use bevy::window::{Window, WindowResolution};
use config::{GameConfig, DEFAULT_CONFIG_PATH};

fn main() {
    // Browsers swallow Rust panics unless they are routed to the console.
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    console_error_panic_hook::set_once();

    // Logging is not up until the app runs, so a config problem is reported from a startup
    // system below.
    let (config, config_error) = GameConfig::load_or_default(DEFAULT_CONFIG_PATH);

    let primary_window = Window {
        title: config.window.title.clone(),
        resolution: WindowResolution::new(config.window.width, config.window.height),
        resizable: false,
        canvas: cfg!(all(target_arch = "wasm32", feature = "web"))
            .then(|| "#bevy-canvas".to_owned()),
        ..default()
    };

    // Nearest-neighbour sampling keeps the pixel-art sprites crisp.
    let mut default_plugins = DefaultPlugins
        .set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        })
        .set(ImagePlugin::default_nearest());

    #[cfg(not(target_arch = "wasm32"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(true),
            ..default()
        });
    }

    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        default_plugins = default_plugins.set(AssetPlugin {
            file_path: "assets".to_owned(),
            watch_for_changes_override: Some(false),
            ..default()
        });
    }

    let config_message = config_error.map(|e| e.to_string());

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)))
        .insert_resource(config)
        .add_plugins(default_plugins)
        .add_plugins(TeusRunPlugin)
        .add_systems(Startup, move || match &config_message {
            Some(message) => warn!(
                "Using default tuning, could not load {}: {}",
                DEFAULT_CONFIG_PATH, message
            ),
            None => info!("Loaded tuning from {}", DEFAULT_CONFIG_PATH),
        })
        .run();
}
