//! Food catalog discovered from a folder-per-food layout.
//!
//! Each immediate subdirectory of the catalog root is one food, keyed by its
//! directory name, and must contain `data.json` and `image.png`. Folders missing
//! either file, or with unreadable metadata, are skipped without aborting the scan.

use std::fs;
use std::path::{Path, PathBuf};

use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use serde_json::{Map, Value};

use crate::error::{CatalogError, MetadataError};
use crate::settings::AppSettings;

pub struct CatalogPlugin;
impl Plugin for CatalogPlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<FoodCatalog>()
            .init_resource::<Selection>()
            .add_systems(Startup, FoodCatalog::load_on_startup)
            ;
    }
}

pub const METADATA_FILE: &str = "data.json";
pub const IMAGE_FILE: &str = "image.png";

const DEFAULT_FLAVOR_LEVEL: &str = "0/10";
const FLAVOR_KEY: &str = "Flavor level";
const DRINK_KEY: &str = "Drink";
const POINTS_KEY: &str = "Points for eating";

/// Foods worth more than this cannot be picked for feeding from the window.
pub const MAX_FEEDABLE_POINTS: i64 = 10;

// ============================================================================
// FoodRecord
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoodRecord {
    /// Free-form display text such as "7/10".
    pub flavor_level: String,
    pub is_drink: bool,
    pub points: i64,
}

impl Default for FoodRecord {
    fn default() -> Self {
        Self {
            flavor_level: DEFAULT_FLAVOR_LEVEL.to_string(),
            is_drink: false,
            points: 0,
        }
    }
}

impl FoodRecord {
    /// Parses a metadata document. Every field is optional; a field that is
    /// absent or of an unusable type keeps its default. Only a document that is
    /// not a JSON object at all is rejected. A leading byte order mark is ignored.
    pub fn from_json(text: &str) -> Result<Self, MetadataError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let Value::Object(fields) = serde_json::from_str::<Value>(text)? else {
            return Err(MetadataError::NotAnObject);
        };
        Ok(Self::from_fields(&fields))
    }

    fn from_fields(fields: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            flavor_level: fields.get(FLAVOR_KEY)
                .and_then(flavor_from_value)
                .unwrap_or(defaults.flavor_level),
            is_drink: fields.get(DRINK_KEY)
                .and_then(drink_from_value)
                .unwrap_or(defaults.is_drink),
            points: fields.get(POINTS_KEY)
                .and_then(points_from_value)
                .unwrap_or(defaults.points),
        }
    }

    pub fn is_feedable(&self) -> bool {
        self.points <= MAX_FEEDABLE_POINTS
    }

    pub fn kind_label(&self) -> &'static str {
        if self.is_drink { "Drink" } else { "Food" }
    }
}

fn flavor_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn drink_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    }
}

pub(crate) fn points_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ============================================================================
// FoodCatalog
// ============================================================================

/// Foods by name, in directory enumeration order.
#[derive(Resource, Default, Debug)]
pub struct FoodCatalog {
    root: PathBuf,
    entries: Vec<(String, FoodRecord)>,
}
impl FoodCatalog {
    pub fn get(&self, name: &str) -> Option<&FoodRecord> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, record)| record)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FoodRecord)> {
        self.entries.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Names in enumeration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Names in alphabetical order, for display.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        names
    }

    pub fn image_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join(IMAGE_FILE)
    }

    fn insert(&mut self, name: String, record: FoodRecord) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = record,
            None => self.entries.push((name, record)),
        }
    }

    fn load_on_startup(
        mut commands: Commands,
        settings: Res<AppSettings>,
    ) {
        let root = &settings.foods_dir;
        let catalog = load_catalog(root).unwrap_or_else(|e| {
            warn!("{}; continuing with an empty catalog", e);
            FoodCatalog { root: root.clone(), entries: Vec::new() }
        });

        if catalog.is_empty() {
            info!("No foods in {:?}; add folders holding {} and {}", root, METADATA_FILE, IMAGE_FILE);
        }
        for (name, record) in catalog.iter() {
            debug!("'{}': {} points, {}", name, record.points, record.kind_label());
        }

        let selection = Selection(catalog.sorted_names().first().map(|name| name.to_string()));
        commands.insert_resource(selection);
        commands.insert_resource(catalog);
    }
}

/// Name of the food picked in the dropdown.
#[derive(Resource, Default, Debug, Clone, PartialEq, Eq)]
pub struct Selection(pub Option<String>);

// ============================================================================
// Loading
// ============================================================================

/// Scans `root` for food folders. A missing root is created and yields an
/// empty catalog.
pub fn load_catalog(root: &Path) -> Result<FoodCatalog, CatalogError> {
    let io_err = |source: std::io::Error| CatalogError::Io { path: root.to_path_buf(), source };
    let mut catalog = FoodCatalog { root: root.to_path_buf(), entries: Vec::new() };

    if !root.exists() {
        fs::create_dir_all(root).map_err(io_err)?;
        info!("Created empty food catalog at {:?}", root);
        return Ok(catalog);
    }

    for entry in fs::read_dir(root).map_err(io_err)?.flatten() {
        let folder = entry.path();
        if !folder.is_dir() {
            continue;
        }
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!("Skipping {:?}: folder name is not valid UTF-8", raw);
                continue;
            }
        };
        match load_entry(&folder) {
            Ok(Some(record)) => catalog.insert(name, record),
            Ok(None) => debug!("Skipping '{}': needs both {} and {}", name, METADATA_FILE, IMAGE_FILE),
            Err(e) => warn!("Skipping '{}': {}", name, e),
        }
    }

    info!("Loaded {} foods from {:?}", catalog.len(), root);
    Ok(catalog)
}

/// `Ok(None)` when the folder lacks one of its two files.
fn load_entry(folder: &Path) -> Result<Option<FoodRecord>, MetadataError> {
    let metadata_path = folder.join(METADATA_FILE);
    if !metadata_path.is_file() || !folder.join(IMAGE_FILE).is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(&metadata_path)?;
    FoodRecord::from_json(&text).map(Some)
}
