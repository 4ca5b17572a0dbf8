//! Feed Niko - pick a food, watch Niko eat it, collect the points.
//!
//! Built with Bevy 0.18 and bevy_egui. Foods are discovered from a folder per
//! food under `Foods/`, and the running score is kept in `userdata/user.dat`.

use bevy::prelude::*;
use bevy::window::EnabledButtons;
use bevy_egui::EguiPlugin;

mod catalog;
mod error;
mod input;
mod progress;
mod sequencer;
mod session;
mod settings;
mod stage;
mod ui;

use settings::AppSettings;

fn main() {
    let (settings, settings_source) = AppSettings::load();

    App::new()
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Feed Niko".into(),
                    resolution: (settings.window_width, settings.window_height).into(),
                    resizable: false,
                    enabled_buttons: EnabledButtons { maximize: false, ..default() },
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        .insert_resource(ClearColor(Color::srgb(0.93, 0.93, 0.93)))
        .insert_resource(settings)
        .insert_resource(settings_source)
        .add_plugins(EguiPlugin::default())
        .add_plugins((
            catalog::CatalogPlugin,
            session::FeedPlugin,
            stage::StagePlugin,
            input::InputPlugin,
            ui::UiPlugin,
        ))
        .add_systems(Startup, AppSettings::report)
        .run();
}
