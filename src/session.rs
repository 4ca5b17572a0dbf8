//! Feed session: the player's progress, where it is stored, and the sequencer
//! that changes it. One session per window, held as a resource.

use std::time::Duration;

use bevy::log::{debug, error, info, warn};
use bevy::prelude::*;

use crate::catalog::{FoodCatalog, FoodRecord, Selection};
use crate::error::FeedError;
use crate::progress::{PlayerProgress, ProgressStore};
use crate::sequencer::{FeedCue, FeedSequencer, FeedStep};
use crate::settings::AppSettings;
use crate::stage::{Stage, StageSounds};

pub struct FeedPlugin;
impl Plugin for FeedPlugin {
    fn build(&self, app: &mut App) {
        let settings = app.world().get_resource::<AppSettings>().cloned().unwrap_or_default();
        let session = FeedSession::open(ProgressStore::new(settings.score_file));
        let stage = Stage::new(session.total_points());

        app
            .insert_resource(session)
            .insert_resource(stage)
            .add_observer(FeedRequest::on_trigger)
            .add_systems(Update, FeedSession::tick_system)
            ;
    }
}

#[derive(Resource, Debug)]
pub struct FeedSession {
    progress: PlayerProgress,
    store: ProgressStore,
    sequencer: FeedSequencer,
}

impl FeedSession {
    /// Starts from the stored score, or zero when it cannot be read.
    pub fn open(store: ProgressStore) -> Self {
        let progress = store.load().unwrap_or_else(|e| {
            warn!("{}; starting from zero", e);
            PlayerProgress::default()
        });
        info!("Current score: {} ({:?})", progress.total_points, store.path());
        Self::with_progress(store, progress)
    }

    pub fn with_progress(store: ProgressStore, progress: PlayerProgress) -> Self {
        Self { progress, store, sequencer: FeedSequencer::default() }
    }

    pub fn total_points(&self) -> i64 {
        self.progress.total_points
    }

    pub fn is_busy(&self) -> bool {
        self.sequencer.is_busy()
    }

    pub fn sequencer(&self) -> &FeedSequencer {
        &self.sequencer
    }

    /// Starts feeding `food`. The new total arrives as `FeedCue::ShowScore`
    /// once the sequence settles.
    pub fn feed(&mut self, food: &str, record: &FoodRecord) -> Result<Vec<FeedCue>, FeedError> {
        self.sequencer.start(food, record)
    }

    /// Advances the running feed by `delta`. Settling adds the points, saves
    /// them and always returns the sequencer to Idle, whether or not the save
    /// succeeded. A failed save is not rolled back.
    pub fn tick(&mut self, delta: Duration) -> Vec<FeedCue> {
        let mut cues = Vec::new();
        for step in self.sequencer.tick(delta) {
            match step {
                FeedStep::Resolve(outcome) => cues.push(FeedCue::ShowOutcome(outcome)),
                FeedStep::Settle { points } => {
                    let total = self.progress.add_points(points);
                    if let Err(e) = self.store.save(&self.progress).map_err(FeedError::from) {
                        error!("{}", e);
                        cues.push(FeedCue::Failed);
                    }
                    cues.push(FeedCue::ShowScore(total));
                    cues.extend(self.settle());
                }
            }
        }
        cues
    }

    fn settle(&mut self) -> [FeedCue; 2] {
        self.sequencer.finish();
        [FeedCue::ShowIdle, FeedCue::SetInputEnabled(true)]
    }

    fn tick_system(
        time: Res<Time>,
        mut commands: Commands,
        mut session: ResMut<FeedSession>,
        mut stage: ResMut<Stage>,
        sounds: Res<StageSounds>,
    ) {
        if !session.is_busy() { return; }
        let cues = session.tick(time.delta());
        if !cues.is_empty() {
            present(cues, &mut commands, &mut stage, &sounds);
        }
    }
}

/// Applies cues to the stage and starts any sounds they ask for.
fn present(cues: Vec<FeedCue>, commands: &mut Commands, stage: &mut Stage, sounds: &StageSounds) {
    for cue in cues {
        if let Some(sound) = stage.apply(cue) {
            sounds.play(commands, sound);
        }
    }
}

/// Feed the currently selected food. Emitted by the feed button and the
/// keyboard shortcut.
#[derive(Event)]
pub struct FeedRequest;
impl FeedRequest {
    fn on_trigger(
        _trigger: On<FeedRequest>,
        mut commands: Commands,
        selection: Res<Selection>,
        catalog: Res<FoodCatalog>,
        mut session: ResMut<FeedSession>,
        mut stage: ResMut<Stage>,
        sounds: Res<StageSounds>,
    ) {
        let Some(name) = selection.0.as_deref() else {
            debug!("Feed requested with nothing selected");
            return;
        };
        let Some(record) = catalog.get(name) else {
            debug!("Feed requested for unknown food '{}'", name);
            return;
        };
        if !record.is_feedable() {
            debug!("'{}' is worth {} points and cannot be fed", name, record.points);
            return;
        }

        match session.feed(name, record) {
            Ok(cues) => {
                info!("Feeding '{}'", name);
                present(cues, &mut commands, &mut stage, &sounds);
            }
            Err(e) => {
                let sequencer = session.sequencer();
                debug!(
                    "Ignoring feed request for '{}': {} ({:?} '{}')",
                    name, e, sequencer.phase(), sequencer.food().unwrap_or_default(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::{FeedPhase, Outcome, Sound};
    use crate::stage::Picture;

    fn record(points: i64) -> FoodRecord {
        FoodRecord { points, ..FoodRecord::default() }
    }

    fn session_in(dir: &tempfile::TempDir, start: i64) -> FeedSession {
        let store = ProgressStore::new(dir.path().join("userdata").join("user.dat"));
        store.save(&PlayerProgress { total_points: start }).unwrap();
        FeedSession::open(store)
    }

    #[test]
    fn successful_feed_adds_points_persists_and_restores_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session_in(&dir, 30);
        let mut stage = Stage::new(session.total_points());

        let mut sounds = Vec::new();
        let mut cues = session.feed("cake", &record(7)).unwrap();
        cues.extend(session.tick(Duration::from_millis(1000)));
        assert_eq!(session.sequencer().phase(), FeedPhase::Resolved);
        cues.extend(session.tick(Duration::from_millis(1000)));
        for cue in cues {
            sounds.extend(stage.apply(cue));
        }

        assert_eq!(sounds, vec![Sound::Eating]);
        assert_eq!(session.total_points(), 37);
        assert_eq!(stage.score, 37);
        assert_eq!(stage.picture, Picture::Idle);
        assert!(stage.input_enabled);
        assert!(!session.is_busy());

        let reloaded = ProgressStore::new(dir.path().join("userdata").join("user.dat")).load().unwrap();
        assert_eq!(reloaded.total_points, 37);
    }

    #[test]
    fn stage_shows_food_then_outcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session_in(&dir, 0);
        let mut stage = Stage::new(0);

        for cue in session.feed("soup", &record(5)).unwrap() {
            stage.apply(cue);
        }
        assert_eq!(stage.picture, Picture::Food("soup".to_string()));
        assert!(!stage.input_enabled);

        for cue in session.tick(Duration::from_millis(1000)) {
            stage.apply(cue);
        }
        assert_eq!(stage.picture, Picture::Outcome(Outcome::Bad));
        assert_eq!(stage.score, 0);
    }

    #[test]
    fn feeding_while_busy_has_no_effect() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session_in(&dir, 3);

        session.feed("bun", &record(5)).unwrap();
        assert!(matches!(session.feed("cake", &record(9)), Err(FeedError::Busy)));

        let cues = session.tick(Duration::from_secs(2));
        assert!(cues.contains(&FeedCue::ShowOutcome(Outcome::Bad)));
        assert_eq!(session.total_points(), 8);
    }

    #[test]
    fn negative_points_are_subtracted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = session_in(&dir, 10);

        session.feed("mud", &record(-3)).unwrap();
        let cues = session.tick(Duration::from_secs(2));

        assert!(cues.contains(&FeedCue::ShowOutcome(Outcome::VeryBad)));
        assert_eq!(session.total_points(), 7);
    }

    #[test]
    fn failed_save_reports_once_and_still_returns_to_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory where the score file should be makes the rename fail.
        let blocked = dir.path().join("user.dat");
        std::fs::create_dir_all(blocked.join("occupied")).unwrap();
        let mut session = FeedSession::with_progress(ProgressStore::new(blocked.clone()), PlayerProgress { total_points: 4 });

        session.feed("bun", &record(5)).unwrap();
        let cues = session.tick(Duration::from_secs(2));

        assert_eq!(cues.iter().filter(|c| **c == FeedCue::Failed).count(), 1);
        assert!(cues.ends_with(&[FeedCue::ShowScore(9), FeedCue::ShowIdle, FeedCue::SetInputEnabled(true)]));
        assert_eq!(session.total_points(), 9);
        assert!(!session.is_busy());

        let mut stage = Stage::new(4);
        for cue in cues {
            stage.apply(cue);
        }
        assert!(stage.failure_notice);
        assert!(stage.input_enabled);
        assert_eq!(stage.picture, Picture::Idle);
    }

    fn app_with_foods(dir: &tempfile::TempDir, foods: &[(&str, i64)], selected: &str) -> App {
        let root = dir.path().join("Foods");
        for (name, points) in foods {
            let folder = root.join(name);
            std::fs::create_dir_all(&folder).unwrap();
            std::fs::write(folder.join(crate::catalog::METADATA_FILE), format!(r#"{{"Points for eating": {}}}"#, points)).unwrap();
            std::fs::write(folder.join(crate::catalog::IMAGE_FILE), b"").unwrap();
        }
        let catalog = crate::catalog::load_catalog(&root).unwrap();

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(catalog)
            .insert_resource(Selection(Some(selected.to_string())))
            .insert_resource(session_in(dir, 0))
            .insert_resource(Stage::new(0))
            .init_resource::<StageSounds>()
            .add_observer(FeedRequest::on_trigger);
        app
    }

    #[test]
    fn feed_request_ignores_foods_above_ten_points() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_foods(&dir, &[("feast", 11)], "feast");

        app.world_mut().trigger(FeedRequest);

        assert!(!app.world().resource::<FeedSession>().is_busy());
        assert!(app.world().resource::<Stage>().input_enabled);
    }

    #[test]
    fn feed_request_ignores_unknown_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_foods(&dir, &[("bun", 5)], "ghost");

        app.world_mut().trigger(FeedRequest);

        assert!(!app.world().resource::<FeedSession>().is_busy());
    }

    #[test]
    fn feed_request_starts_a_feedable_food() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut app = app_with_foods(&dir, &[("bun", 5)], "bun");

        app.world_mut().trigger(FeedRequest);

        assert!(app.world().resource::<FeedSession>().is_busy());
        let stage = app.world().resource::<Stage>();
        assert_eq!(stage.picture, Picture::Food("bun".to_string()));
        assert!(!stage.input_enabled);
    }

    #[test]
    fn unreadable_store_opens_at_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = FeedSession::open(ProgressStore::new(dir.path()));
        assert_eq!(session.total_points(), 0);
    }
}
