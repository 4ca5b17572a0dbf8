//! Food info window, transient notices and the feed failure notice.

use std::time::Duration;

use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};

use crate::catalog::{FoodCatalog, Selection};
use crate::stage::Stage;

const NOTICE_DURATION: Duration = Duration::from_secs(3);
pub const NO_SELECTION_NOTICE: &str = "Select a food first";
pub const NO_DATA_NOTICE: &str = "No data for the selected food";

// ============================================================================
// Info window
// ============================================================================

/// Food whose details are open, if any.
#[derive(Resource, Default)]
pub struct InfoWindow {
    pub food: Option<String>,
}
impl InfoWindow {
    pub fn is_open(window: Res<InfoWindow>) -> bool {
        window.food.is_some()
    }

    /// Picks the food to describe, or the notice to show instead.
    pub fn resolve(selection: &Selection, catalog: &FoodCatalog) -> Result<String, &'static str> {
        let name = selection.0.as_deref().ok_or(NO_SELECTION_NOTICE)?;
        if !catalog.contains(name) {
            return Err(NO_DATA_NOTICE);
        }
        Ok(name.to_string())
    }

    pub fn update(
        mut contexts: EguiContexts,
        mut window: ResMut<InfoWindow>,
        catalog: Res<FoodCatalog>,
    ) {
        let Ok(ctx) = contexts.ctx_mut() else { return };
        let Some(name) = window.food.clone() else { return };
        let Some(record) = catalog.get(&name) else {
            window.food = None;
            return;
        };

        let mut open = true;
        egui::Window::new("Food info")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .show(ctx, |ui| {
                ui.strong(&name);
                ui.add_space(6.0);
                egui::Grid::new("food_info").num_columns(2).show(ui, |ui| {
                    ui.label("Flavor level:");
                    ui.label(&record.flavor_level);
                    ui.end_row();
                    ui.label("Type:");
                    ui.label(record.kind_label());
                    ui.end_row();
                    ui.label("Points:");
                    ui.label(record.points.to_string());
                    ui.end_row();
                });
            });
        if !open {
            window.food = None;
        }
    }
}

/// Show details of the selected food, or close them if already open.
#[derive(Event)]
pub struct InfoRequest;
impl InfoRequest {
    pub fn on_trigger(
        _trigger: On<InfoRequest>,
        selection: Res<Selection>,
        catalog: Res<FoodCatalog>,
        mut window: ResMut<InfoWindow>,
        mut notice: ResMut<Notice>,
    ) {
        if window.food.is_some() {
            window.food = None;
            return;
        }
        match InfoWindow::resolve(&selection, &catalog) {
            Ok(name) => window.food = Some(name),
            Err(text) => notice.show(text),
        }
    }
}

// ============================================================================
// Notices
// ============================================================================

/// Short message that disappears on its own.
#[derive(Resource, Default)]
pub struct Notice {
    text: Option<&'static str>,
    timer: Timer,
}
impl Notice {
    pub fn show(&mut self, text: &'static str) {
        self.text = Some(text);
        self.timer = Timer::new(NOTICE_DURATION, TimerMode::Once);
    }

    pub fn text(&self) -> Option<&'static str> {
        self.text
    }

    pub fn advance(&mut self, delta: Duration) {
        if self.text.is_none() { return; }
        self.timer.tick(delta);
        if self.timer.just_finished() {
            self.text = None;
        }
    }

    pub fn tick(time: Res<Time>, mut notice: ResMut<Notice>) {
        if notice.text.is_some() {
            notice.advance(time.delta());
        }
    }
}

// ============================================================================
// Failure notice
// ============================================================================

pub fn failure_pending(stage: Res<Stage>) -> bool {
    stage.failure_notice
}

pub fn failure_notice_system(mut contexts: EguiContexts, mut stage: ResMut<Stage>) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::Window::new("Feeding failed")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Something went wrong while feeding.");
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    stage.failure_notice = false;
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_expires_after_three_seconds() {
        let mut notice = Notice::default();
        notice.show(NO_SELECTION_NOTICE);

        notice.advance(Duration::from_millis(2999));
        assert_eq!(notice.text(), Some(NO_SELECTION_NOTICE));

        notice.advance(Duration::from_millis(1));
        assert_eq!(notice.text(), None);
    }

    #[test]
    fn showing_again_restarts_the_countdown() {
        let mut notice = Notice::default();
        notice.show(NO_SELECTION_NOTICE);
        notice.advance(Duration::from_secs(2));

        notice.show(NO_DATA_NOTICE);
        notice.advance(Duration::from_secs(2));

        assert_eq!(notice.text(), Some(NO_DATA_NOTICE));
    }

    #[test]
    fn resolve_reports_missing_selection_and_unknown_food() {
        let catalog = FoodCatalog::default();

        assert_eq!(InfoWindow::resolve(&Selection(None), &catalog), Err(NO_SELECTION_NOTICE));
        assert_eq!(
            InfoWindow::resolve(&Selection(Some("pie".to_string())), &catalog),
            Err(NO_DATA_NOTICE),
        );
    }

    #[test]
    fn resolve_finds_catalog_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("pie");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join(crate::catalog::METADATA_FILE), r#"{"Points for eating": 6}"#).unwrap();
        std::fs::write(folder.join(crate::catalog::IMAGE_FILE), b"").unwrap();
        let catalog = crate::catalog::load_catalog(dir.path()).unwrap();

        assert_eq!(
            InfoWindow::resolve(&Selection(Some("pie".to_string())), &catalog),
            Ok("pie".to_string()),
        );
    }
}
