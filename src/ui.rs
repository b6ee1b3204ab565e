//! Screen UI: main menu, in-game HUD, game-over card and the pause overlay.
//!
//! The menu shows the stored best score and the HUD follows the running score. Buttons never
//! change state themselves, they emit `LifecycleAction`s for the lifecycle table to accept or drop.

use bevy::prelude::*;

use crate::app::despawn_tagged;
use crate::score::{load_best_score, ScoreTracker};
use crate::sprites::{FrameAnimation, SpriteHandles};
use crate::state::{GameSet, GameState, LifecycleAction, SessionClock};

const TEXT_COLOR: Color = Color::srgb(0.95, 0.95, 0.95);
const BUTTON_IDLE: Color = Color::srgb(0.15, 0.35, 0.85);
const BUTTON_HOVER: Color = Color::srgb(0.25, 0.45, 0.95);
const BUTTON_PRESSED: Color = Color::srgb(0.1, 0.25, 0.65);
const MENU_BACKDROP: Color = Color::srgb(0.08, 0.16, 0.38);

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameState::MainMenu),
            spawn_main_menu.after(load_best_score),
        )
            .add_systems(OnExit(GameState::MainMenu), despawn_tagged::<MainMenuScreen>)
            .add_systems(OnEnter(GameState::Playing), spawn_hud)
            .add_systems(
                OnExit(GameState::Playing),
                (despawn_tagged::<Hud>, despawn_tagged::<PauseOverlay>),
            )
            .add_systems(OnEnter(GameState::GameOver), spawn_game_over)
            .add_systems(OnExit(GameState::GameOver), despawn_tagged::<GameOverScreen>)
            .add_systems(Update, handle_buttons)
            .add_systems(
                Update,
                (update_score_label, sync_pause_overlay)
                    .after(GameSet::Effects)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

#[derive(Component)]
struct MainMenuScreen;

#[derive(Component)]
struct Hud;

#[derive(Component)]
struct ScoreLabel;

#[derive(Component)]
struct GameOverScreen;

#[derive(Component)]
struct PauseOverlay;

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
enum MenuButton {
    Start,
    Restart,
    Menu,
}

impl MenuButton {
    fn label(self) -> &'static str {
        match self {
            MenuButton::Start => "Start",
            MenuButton::Restart => "Restart",
            MenuButton::Menu => "Menu",
        }
    }

    fn action(self) -> LifecycleAction {
        match self {
            MenuButton::Start => LifecycleAction::Start,
            MenuButton::Restart => LifecycleAction::Restart,
            MenuButton::Menu => LifecycleAction::ReturnToMenu,
        }
    }
}

fn text(value: impl Into<String>, font_size: f32) -> TextBundle {
    TextBundle::from_section(
        value,
        TextStyle {
            font_size,
            color: TEXT_COLOR,
            ..default()
        },
    )
}

fn full_screen(style: Style) -> Style {
    Style {
        width: Val::Percent(100.0),
        height: Val::Percent(100.0),
        ..style
    }
}

fn spawn_button(parent: &mut ChildBuilder, button: MenuButton) {
    parent
        .spawn((
            button,
            ButtonBundle {
                style: Style {
                    padding: UiRect::axes(Val::Px(24.0), Val::Px(12.0)),
                    margin: UiRect::all(Val::Px(8.0)),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                background_color: BackgroundColor(BUTTON_IDLE),
                border_radius: BorderRadius::all(Val::Px(10.0)),
                ..default()
            },
        ))
        .with_children(|button_parent| {
            button_parent.spawn(text(button.label(), 24.0));
        });
}

/// Title, best score and a cycling mascot portrait. The best score is read when the menu opens.
fn spawn_main_menu(mut commands: Commands, score: Res<ScoreTracker>, handles: Res<SpriteHandles>) {
    commands
        .spawn((
            MainMenuScreen,
            Name::new("MainMenu"),
            NodeBundle {
                background_color: BackgroundColor(MENU_BACKDROP),
                style: full_screen(Style {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                }),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(text(format!("Best: {}", score.best()), 24.0).with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Px(20.0),
                left: Val::Px(20.0),
                ..default()
            }));

            let moods = FrameAnimation::new(handles.mascot_moods.clone(), 3.0);
            parent.spawn((
                ImageBundle {
                    image: UiImage::new(moods.current()),
                    style: Style {
                        width: Val::Vw(20.0),
                        height: Val::Vw(20.0),
                        ..default()
                    },
                    ..default()
                },
                moods,
            ));

            parent.spawn(text("Run, Teus, Run!", 48.0));

            parent
                .spawn(NodeBundle {
                    style: Style {
                        position_type: PositionType::Absolute,
                        bottom: Val::Px(20.0),
                        right: Val::Px(20.0),
                        ..default()
                    },
                    ..default()
                })
                .with_children(|corner| spawn_button(corner, MenuButton::Start));
        });
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Hud,
            Name::new("Hud"),
            NodeBundle {
                style: full_screen(Style {
                    padding: UiRect::all(Val::Px(20.0)),
                    ..default()
                }),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((ScoreLabel, text("Score: 0", 30.0)));
        });
}

fn update_score_label(score: Res<ScoreTracker>, mut labels: Query<&mut Text, With<ScoreLabel>>) {
    if !score.is_changed() {
        return;
    }

    for mut label in &mut labels {
        label.sections[0].value = format!("Score: {}", score.displayed());
    }
}

fn spawn_game_over(mut commands: Commands, score: Res<ScoreTracker>, handles: Res<SpriteHandles>) {
    commands
        .spawn((
            GameOverScreen,
            Name::new("GameOver"),
            NodeBundle {
                background_color: BackgroundColor(MENU_BACKDROP),
                style: full_screen(Style {
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::Center,
                    ..default()
                }),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn(text("Game Over", 48.0));
            parent.spawn(text(format!("Score: {}", score.displayed()), 28.0));

            let card = FrameAnimation::new(handles.game_over_card.clone(), 0.1);
            parent.spawn((
                ImageBundle {
                    image: UiImage::new(card.current()),
                    style: Style {
                        width: Val::Vw(20.0),
                        height: Val::Vw(20.0),
                        margin: UiRect::bottom(Val::Px(12.0)),
                        ..default()
                    },
                    ..default()
                },
                card,
            ));

            parent
                .spawn(NodeBundle {
                    style: Style {
                        flex_direction: FlexDirection::Row,
                        ..default()
                    },
                    ..default()
                })
                .with_children(|row| {
                    spawn_button(row, MenuButton::Restart);
                    spawn_button(row, MenuButton::Menu);
                });
        });
}

/// Shows or hides the "Paused" overlay to match the session clock's freeze flag.
fn sync_pause_overlay(
    mut commands: Commands,
    clock: Res<SessionClock>,
    overlays: Query<Entity, With<PauseOverlay>>,
) {
    if !clock.is_changed() {
        return;
    }

    let shown = !overlays.is_empty();
    if clock.is_frozen() && !shown {
        commands
            .spawn((
                PauseOverlay,
                Name::new("PauseOverlay"),
                NodeBundle {
                    background_color: BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
                    style: full_screen(Style {
                        align_items: AlignItems::Center,
                        justify_content: JustifyContent::Center,
                        ..default()
                    }),
                    z_index: ZIndex::Global(10),
                    ..default()
                },
            ))
            .with_children(|parent| {
                parent.spawn(text("Paused\nPress ESC to resume", 36.0));
            });
    } else if !clock.is_frozen() && shown {
        for entity in &overlays {
            commands.entity(entity).despawn_recursive();
        }
    }
}

fn handle_buttons(
    mut buttons: Query<(&Interaction, &MenuButton, &mut BackgroundColor), Changed<Interaction>>,
    mut actions: EventWriter<LifecycleAction>,
) {
    for (interaction, button, mut color) in &mut buttons {
        match interaction {
            Interaction::Pressed => {
                *color = BackgroundColor(BUTTON_PRESSED);
                actions.send(button.action());
            }
            Interaction::Hovered => *color = BackgroundColor(BUTTON_HOVER),
            Interaction::None => *color = BackgroundColor(BUTTON_IDLE),
        }
    }
}
