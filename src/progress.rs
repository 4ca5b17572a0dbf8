//! Player score persistence.
//!
//! The score record is stored as JSON passed through base64. The encoding only
//! keeps the number from being edited by accident; anyone can reverse it.
//! Reading is as lenient as food metadata: whitespace anywhere in the text is
//! ignored and `TotalPoints` may be an integral float or a numeric string.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bevy::log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::points_from_value;
use crate::error::ProgressError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerProgress {
    #[serde(rename = "TotalPoints", deserialize_with = "lenient_points")]
    pub total_points: i64,
}

fn lenient_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    points_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("TotalPoints is not a whole number: {}", value)))
}

impl PlayerProgress {
    /// Adds (or, for negative values, subtracts) points, saturating at the bounds.
    pub fn add_points(&mut self, points: i64) -> i64 {
        self.total_points = self.total_points.saturating_add(points);
        self.total_points
    }
}

pub fn encode(progress: &PlayerProgress) -> Result<String, ProgressError> {
    let json = serde_json::to_string(progress)?;
    Ok(STANDARD.encode(json))
}

pub fn decode(text: &str) -> Result<PlayerProgress, ProgressError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Reads and writes one score file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or damaged file yields a zero score. Only failures to access
    /// the file at all are returned.
    pub fn load(&self) -> Result<PlayerProgress, ProgressError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No score file at {:?}, starting from zero", self.path);
                return Ok(PlayerProgress::default());
            }
            // Non-UTF-8 bytes cannot be base64 either.
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!("Score file {:?} is not text, starting from zero", self.path);
                return Ok(PlayerProgress::default());
            }
            Err(source) => return Err(self.io_error(source)),
        };

        match decode(&text) {
            Ok(progress) => {
                debug!("Loaded score {} from {:?}", progress.total_points, self.path);
                Ok(progress)
            }
            Err(e) if e.is_malformed() => {
                warn!("Ignoring damaged score file {:?}: {}", self.path, e);
                Ok(PlayerProgress::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Writes through a sibling temp file and a rename, so the file is either
    /// the old or the new score.
    pub fn save(&self, progress: &PlayerProgress) -> Result<(), ProgressError> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }

        let content = encode(progress)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved score {} to {:?}", progress.total_points, self.path);
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ProgressError {
        ProgressError::Io { path: self.path.clone(), source }
    }
}
