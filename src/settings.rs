//! Optional settings file in RON format.
//!
//! Read once at launch from the user's config directory. Every field has a
//! default, so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

const SETTINGS_FILE: &str = "settings.ron";
const APP_DIR: &str = "feed-niko";

#[derive(Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Catalog root, one folder per food.
    pub foods_dir: PathBuf,
    pub score_file: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            foods_dir: PathBuf::from("Foods"),
            score_file: Path::new("userdata").join("user.dat"),
            window_width: 260,
            window_height: 330,
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// `Ok(None)` when there is no file at `path`.
    pub fn read(path: &Path) -> Result<Option<Self>, SettingsError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content).map(Some)
    }

    /// Logs where the settings came from and the paths in effect. Runs at
    /// Startup, since nothing is logged before the app is built.
    pub fn report(settings: Res<AppSettings>, source: Res<SettingsSource>) {
        match source.as_ref() {
            SettingsSource::NoConfigDir => warn!("Could not determine config directory, using default settings"),
            SettingsSource::Absent(path) => debug!("No settings file at {:?}", path),
            SettingsSource::File(path) => info!("Loaded settings from {:?}", path),
            SettingsSource::Rejected(path, e) => warn!("{} ({:?}), using default settings", e, path),
        }
        info!("Foods from {:?}, score in {:?}", settings.foods_dir, settings.score_file);
    }

    /// Settings from the config directory, or defaults when absent or unreadable.
    pub fn load() -> (Self, SettingsSource) {
        Self::load_from(Self::config_path())
    }

    pub fn load_from(path: Option<PathBuf>) -> (Self, SettingsSource) {
        let Some(path) = path else {
            return (Self::default(), SettingsSource::NoConfigDir);
        };
        match Self::read(&path) {
            Ok(Some(settings)) => (settings, SettingsSource::File(path)),
            Ok(None) => (Self::default(), SettingsSource::Absent(path)),
            Err(e) => (Self::default(), SettingsSource::Rejected(path, e)),
        }
    }
}

/// Where `AppSettings` came from.
#[derive(Resource, Debug)]
pub enum SettingsSource {
    NoConfigDir,
    Absent(PathBuf),
    File(PathBuf),
    Rejected(PathBuf, SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = AppSettings::from_ron(r#"(foods_dir: "/srv/foods", window_width: 400)"#).unwrap();

        assert_eq!(settings.foods_dir, PathBuf::from("/srv/foods"));
        assert_eq!(settings.window_width, 400);
        assert_eq!(settings.score_file, Path::new("userdata").join("user.dat"));
        assert_eq!(settings.window_height, 330);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = AppSettings::from_ron("(window_width: \"wide\")").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn read_distinguishes_missing_from_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);

        assert_eq!(AppSettings::read(&path).unwrap(), None);

        let written = ron::ser::to_string_pretty(&AppSettings::default(), ron::ser::PrettyConfig::default()).unwrap();
        std::fs::write(&path, written).unwrap();
        assert_eq!(AppSettings::read(&path).unwrap(), Some(AppSettings::default()));
    }

    #[test]
    fn malformed_file_falls_back_and_keeps_the_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "(window_width: ").unwrap();

        let (settings, source) = AppSettings::load_from(Some(path.clone()));

        assert_eq!(settings, AppSettings::default());
        assert!(matches!(&source, SettingsSource::Rejected(p, SettingsError::Parse(_)) if *p == path));
    }

    #[test]
    fn malformed_file_is_reported_at_startup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "not ron").unwrap();
        let (settings, source) = AppSettings::load_from(Some(path));

        let mut app = App::new();
        app.insert_resource(settings)
            .insert_resource(source)
            .add_systems(Startup, AppSettings::report);
        app.update();

        assert!(matches!(app.world().resource::<SettingsSource>(), SettingsSource::Rejected(..)));
    }

    #[test]
    fn absent_file_and_missing_config_dir_use_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");

        let (settings, source) = AppSettings::load_from(Some(dir.path().join(SETTINGS_FILE)));
        assert_eq!(settings, AppSettings::default());
        assert!(matches!(source, SettingsSource::Absent(_)));

        let (settings, source) = AppSettings::load_from(None);
        assert_eq!(settings, AppSettings::default());
        assert!(matches!(source, SettingsSource::NoConfigDir));
    }
}
