//! Keyboard shortcuts for feeding.

use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::session::FeedRequest;
use crate::ui::InfoRequest;

pub struct InputPlugin;
impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app
            .add_systems(Update, handle_input)
            ;
    }
}

fn handle_input(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut contexts: EguiContexts,
) {
    if contexts.ctx_mut().is_ok_and(|ctx| ctx.wants_keyboard_input()) {
        return;
    }

    // Enter: feed the selected food
    if keyboard.just_pressed(KeyCode::Enter) || keyboard.just_pressed(KeyCode::NumpadEnter) {
        commands.trigger(FeedRequest);
    }

    // I: toggle food info
    if keyboard.just_pressed(KeyCode::KeyI) {
        commands.trigger(InfoRequest);
    }
}
