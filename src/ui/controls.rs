//! Feeding controls: food selector, info button, feed button and score.
//!
//! Emits `FeedRequest`/`InfoRequest` rather than driving the feed itself.

use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::catalog::{FoodCatalog, Selection};
use crate::session::{FeedRequest, FeedSession};
use crate::stage::Stage;
use super::dialogs::{InfoRequest, Notice};

const FEED_BUTTON_HEIGHT: f32 = 28.0;
const SCORE_FONT_SIZE: f32 = 18.0;

/// The feed button is live for a known, feedable selection while nothing is running.
pub fn can_feed(selection: &Selection, catalog: &FoodCatalog, input_enabled: bool) -> bool {
    input_enabled && selection.0.as_deref()
        .and_then(|name| catalog.get(name))
        .is_some_and(|record| record.is_feedable())
}

pub fn controls_system(
    mut commands: Commands,
    mut contexts: EguiContexts,
    mut selection: ResMut<Selection>,
    catalog: Res<FoodCatalog>,
    session: Res<FeedSession>,
    stage: Res<Stage>,
    notice: Res<Notice>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let selected_text = selection.0.clone().unwrap_or_default();
            egui::ComboBox::from_id_salt("food_selector")
                .selected_text(selected_text)
                .width(ui.available_width() - 32.0)
                .show_ui(ui, |ui| {
                    for name in catalog.sorted_names() {
                        let is_selected = selection.0.as_deref() == Some(name);
                        if ui.selectable_label(is_selected, name).clicked() && !is_selected {
                            selection.0 = Some(name.to_string());
                        }
                    }
                });

            if ui.button("ℹ").on_hover_text("Food info").clicked() {
                commands.trigger(InfoRequest);
            }
        });

        if let Some(text) = notice.text() {
            ui.colored_label(egui::Color32::from_rgb(220, 170, 90), text);
        }

        ui.add_space(4.0);
        let enabled = can_feed(&selection, &catalog, stage.input_enabled && !session.is_busy());
        let button = egui::Button::new("Feed!")
            .min_size(egui::vec2(ui.available_width(), FEED_BUTTON_HEIGHT));
        if ui.add_enabled(enabled, button).clicked() {
            commands.trigger(FeedRequest);
        }

        ui.add_space(6.0);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(stage.score.to_string())
                .size(SCORE_FONT_SIZE)
                .strong());
        });
        ui.add_space(6.0);
    });
}
