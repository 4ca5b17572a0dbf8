//! UI systems using bevy_egui.
//!
//! Provides the feeding controls, the food info window, transient notices and
//! the feed failure notice. UI components emit events rather than driving the
//! feed directly.

mod controls;
mod dialogs;

use bevy::prelude::*;
use bevy_egui::EguiPrimaryContextPass;

pub use dialogs::{InfoRequest, InfoWindow, Notice};

pub struct UiPlugin;
impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<InfoWindow>()
            .init_resource::<Notice>()
            .add_observer(InfoRequest::on_trigger)
            .add_systems(Update, Notice::tick)
            .add_systems(EguiPrimaryContextPass, (
                controls::controls_system,
                InfoWindow::update.run_if(InfoWindow::is_open),
                dialogs::failure_notice_system.run_if(dialogs::failure_pending),
            ).chain())
            ;
    }
}
