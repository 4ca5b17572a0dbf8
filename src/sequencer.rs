//! Timed feed sequence.
//!
//! Idle -> Eating -> Resolved -> Settling -> Idle. The sequencer never reads a
//! clock: it only moves when `tick` is handed an elapsed duration, so a frame
//! delta and a synthetic test duration drive it the same way.

use std::time::Duration;

use bevy::time::{Timer, TimerMode};

use crate::catalog::FoodRecord;
use crate::error::FeedError;

/// How long the food is shown before the outcome.
pub const EATING_DELAY: Duration = Duration::from_millis(1000);
/// How long the outcome is shown before points are added.
pub const RESOLVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedPhase {
    #[default]
    Idle,
    Eating,
    Resolved,
    Settling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Good,
    Bad,
    VeryBad,
}
impl Outcome {
    /// 7..=10 is good, 4..=6 is bad, everything else (negative and >10 included)
    /// is very bad. Values are not range-checked.
    pub fn classify(points: i64) -> Self {
        match points {
            7..=10 => Self::Good,
            4..=6 => Self::Bad,
            _ => Self::VeryBad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Drink,
    Eating,
}
impl Sound {
    pub fn for_record(record: &FoodRecord) -> Self {
        if record.is_drink { Self::Drink } else { Self::Eating }
    }
}

/// Presentation instructions produced by a feed, in the order they apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCue {
    SetInputEnabled(bool),
    PlaySound(Sound),
    ShowFood(String),
    ShowOutcome(Outcome),
    ShowScore(i64),
    ShowIdle,
    /// Something went wrong; show the generic notice.
    Failed,
}

/// A transition that came due during `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStep {
    Resolve(Outcome),
    Settle { points: i64 },
}

#[derive(Debug, Clone)]
struct PendingFeed {
    food: String,
    points: i64,
}

#[derive(Debug, Default)]
pub struct FeedSequencer {
    phase: FeedPhase,
    timer: Timer,
    pending: Option<PendingFeed>,
}

impl FeedSequencer {
    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != FeedPhase::Idle
    }

    /// Food currently being fed, if any.
    pub fn food(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.food.as_str())
    }

    /// Begins eating `food`. Rejected without side effects while another feed runs.
    pub fn start(&mut self, food: &str, record: &FoodRecord) -> Result<Vec<FeedCue>, FeedError> {
        if self.is_busy() {
            return Err(FeedError::Busy);
        }

        self.pending = Some(PendingFeed { food: food.to_string(), points: record.points });
        self.phase = FeedPhase::Eating;
        self.timer = Timer::new(EATING_DELAY, TimerMode::Once);

        Ok(vec![
            FeedCue::SetInputEnabled(false),
            FeedCue::PlaySound(Sound::for_record(record)),
            FeedCue::ShowFood(food.to_string()),
        ])
    }

    /// Advances by `delta` and returns every transition that came due, oldest
    /// first. Time left over after one delay carries into the next.
    pub fn tick(&mut self, delta: Duration) -> Vec<FeedStep> {
        let mut steps = Vec::new();
        let mut remaining = delta;

        while matches!(self.phase, FeedPhase::Eating | FeedPhase::Resolved) {
            let left = self.timer.remaining();
            if remaining < left {
                self.timer.tick(remaining);
                break;
            }
            remaining -= left;

            let Some(points) = self.pending.as_ref().map(|p| p.points) else {
                self.finish();
                break;
            };
            if self.phase == FeedPhase::Eating {
                self.phase = FeedPhase::Resolved;
                self.timer = Timer::new(RESOLVE_DELAY, TimerMode::Once);
                steps.push(FeedStep::Resolve(Outcome::classify(points)));
            } else {
                self.phase = FeedPhase::Settling;
                steps.push(FeedStep::Settle { points });
            }
        }

        steps
    }

    /// Returns to Idle from any phase.
    pub fn finish(&mut self) {
        self.phase = FeedPhase::Idle;
        self.pending = None;
        self.timer = Timer::default();
    }
}
