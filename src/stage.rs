//! The picture of Niko and the sounds that go with it.
//!
//! `Stage` is what the window should currently show. Bundled images that are
//! missing from `assets/` are replaced by generated placeholders with a caption,
//! and missing sounds are simply not played.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use bevy::asset::RenderAssetUsages;
use bevy::image::{CompressedImageFormats, ImageSampler, ImageType};
use bevy::log::{debug, info, warn};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::catalog::FoodCatalog;
use crate::sequencer::{FeedCue, Outcome, Sound};

pub struct StagePlugin;
impl Plugin for StagePlugin {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<FoodImages>()
            .add_systems(Startup, (StageAssets::load, spawn_picture).chain())
            .add_systems(PostUpdate, sync_picture.run_if(resource_changed::<Stage>))
            ;
    }
}

const ASSETS_DIR: &str = "assets";
const PLACEHOLDER_SIZE: u32 = 100;
pub const PICTURE_SIZE: f32 = 140.0;
/// Vertical offset that keeps the picture above the control panel.
const PICTURE_OFFSET_Y: f32 = 70.0;

// ============================================================================
// Stage state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Picture {
    #[default]
    Idle,
    Food(String),
    Outcome(Outcome),
}

#[derive(Resource, Debug)]
pub struct Stage {
    pub picture: Picture,
    pub score: i64,
    pub input_enabled: bool,
    /// Set by a failed feed until the user dismisses the notice.
    pub failure_notice: bool,
}

impl Stage {
    pub fn new(score: i64) -> Self {
        Self {
            picture: Picture::Idle,
            score,
            input_enabled: true,
            failure_notice: false,
        }
    }

    /// Applies one cue. Sounds are returned for the caller to play.
    pub fn apply(&mut self, cue: FeedCue) -> Option<Sound> {
        match cue {
            FeedCue::SetInputEnabled(enabled) => self.input_enabled = enabled,
            FeedCue::PlaySound(sound) => return Some(sound),
            FeedCue::ShowFood(name) => self.picture = Picture::Food(name),
            FeedCue::ShowOutcome(outcome) => self.picture = Picture::Outcome(outcome),
            FeedCue::ShowScore(score) => self.score = score,
            FeedCue::ShowIdle => self.picture = Picture::Idle,
            FeedCue::Failed => self.failure_notice = true,
        }
        None
    }
}

// ============================================================================
// Assets
// ============================================================================

/// An image ready for the picture sprite. Placeholders carry a caption.
#[derive(Clone, Debug)]
pub struct StageImage {
    pub handle: Handle<Image>,
    pub caption: Option<String>,
}

#[derive(Resource)]
pub struct StageAssets {
    idle: StageImage,
    good: StageImage,
    bad: StageImage,
    very_bad: StageImage,
}
impl StageAssets {
    pub fn image_for(&self, outcome: Outcome) -> &StageImage {
        match outcome {
            Outcome::Good => &self.good,
            Outcome::Bad => &self.bad,
            Outcome::VeryBad => &self.very_bad,
        }
    }

    pub fn idle(&self) -> &StageImage {
        &self.idle
    }

    fn load(
        mut commands: Commands,
        asset_server: Res<AssetServer>,
        mut images: ResMut<Assets<Image>>,
    ) {
        let mut bundled = |file: &str, caption: &str, color: [u8; 4]| {
            let path = format!("images/{}", file);
            if bundled_asset_exists(&path) {
                StageImage { handle: asset_server.load(path), caption: None }
            } else {
                debug!("Bundled image {} not found, using a placeholder", path);
                StageImage {
                    handle: images.add(placeholder_image(color)),
                    caption: Some(caption.to_string()),
                }
            }
        };

        commands.insert_resource(StageAssets {
            idle: bundled("niko.png", "Niko", [250, 230, 160, 255]),
            good: bundled("eat.png", "Eating", [180, 230, 170, 255]),
            bad: bundled("eat_bad.png", "Eating, badly", [240, 200, 150, 255]),
            very_bad: bundled("eat_very_bad.png", "Eating, very badly", [240, 160, 160, 255]),
        });

        let sound = |file: &str| {
            let path = format!("sounds/{}", file);
            bundled_asset_exists(&path).then(|| asset_server.load(path))
        };
        let sounds = StageSounds {
            drink: sound("drink.wav"),
            eating: sound("eating.wav"),
        };
        info!(
            "Stage sounds: drink {}, eating {}",
            if sounds.drink.is_some() { "loaded" } else { "missing" },
            if sounds.eating.is_some() { "loaded" } else { "missing" },
        );
        commands.insert_resource(sounds);
    }
}

#[derive(Resource, Default)]
pub struct StageSounds {
    drink: Option<Handle<AudioSource>>,
    eating: Option<Handle<AudioSource>>,
}
impl StageSounds {
    /// Plays `sound` once if its clip was bundled.
    pub fn play(&self, commands: &mut Commands, sound: Sound) {
        let handle = match sound {
            Sound::Drink => &self.drink,
            Sound::Eating => &self.eating,
        };
        if let Some(handle) = handle {
            commands.spawn((AudioPlayer::new(handle.clone()), PlaybackSettings::DESPAWN));
        }
    }
}

/// Decoded food images, one per catalog entry, created on first use.
#[derive(Resource, Default)]
pub struct FoodImages(HashMap<String, StageImage>);
impl FoodImages {
    pub fn get_or_load(
        &mut self,
        name: &str,
        catalog: &FoodCatalog,
        images: &mut Assets<Image>,
    ) -> StageImage {
        self.0.entry(name.to_string())
            .or_insert_with(|| {
                let path = catalog.image_path(name);
                match decode_png(&path) {
                    Ok(image) => StageImage { handle: images.add(image), caption: None },
                    Err(e) => {
                        warn!("Could not show {:?}: {}", path, e);
                        StageImage {
                            handle: images.add(placeholder_image([220, 220, 220, 255])),
                            caption: Some(name.to_string()),
                        }
                    }
                }
            })
            .clone()
    }
}

fn bundled_asset_exists(relative: &str) -> bool {
    Path::new(ASSETS_DIR).join(relative).is_file()
}

fn decode_png(path: &Path) -> Result<Image, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    Image::from_buffer(
        &bytes,
        ImageType::Extension("png"),
        CompressedImageFormats::NONE,
        true,
        ImageSampler::Default,
        RenderAssetUsages::default(),
    ).map_err(|e| e.to_string())
}

/// Solid square with a one pixel black border.
pub fn placeholder_image(color: [u8; 4]) -> Image {
    let size = Extent3d { width: PLACEHOLDER_SIZE, height: PLACEHOLDER_SIZE, depth_or_array_layers: 1 };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &color,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    if let Some(data) = image.data.as_mut() {
        let last = PLACEHOLDER_SIZE - 1;
        for y in 0..PLACEHOLDER_SIZE {
            for x in 0..PLACEHOLDER_SIZE {
                if x == 0 || y == 0 || x == last || y == last {
                    let offset = ((y * PLACEHOLDER_SIZE + x) * 4) as usize;
                    data[offset..offset + 4].copy_from_slice(&[0, 0, 0, 255]);
                }
            }
        }
    }
    image
}

// ============================================================================
// Picture entity
// ============================================================================

#[derive(Component)]
pub struct NikoPicture;

#[derive(Component)]
pub struct PictureCaption;

fn spawn_picture(mut commands: Commands, assets: Res<StageAssets>) {
    commands.spawn(Camera2d);

    let idle = assets.idle();
    commands
        .spawn((
            NikoPicture,
            Sprite {
                image: idle.handle.clone(),
                custom_size: Some(Vec2::splat(PICTURE_SIZE)),
                ..default()
            },
            Transform::from_xyz(0.0, PICTURE_OFFSET_Y, 0.0),
        ))
        .with_children(|parent| {
            parent.spawn((
                PictureCaption,
                Text2d::new(idle.caption.clone().unwrap_or_default()),
                TextFont { font_size: 14.0, ..default() },
                TextColor(Color::BLACK),
                Transform::from_xyz(0.0, 0.0, 1.0),
            ));
        });
}

fn sync_picture(
    stage: Res<Stage>,
    assets: Res<StageAssets>,
    catalog: Res<FoodCatalog>,
    mut food_images: ResMut<FoodImages>,
    mut images: ResMut<Assets<Image>>,
    mut sprite: Single<&mut Sprite, With<NikoPicture>>,
    mut caption: Single<&mut Text2d, With<PictureCaption>>,
) {
    let shown = match &stage.picture {
        Picture::Idle => assets.idle().clone(),
        Picture::Outcome(outcome) => assets.image_for(*outcome).clone(),
        Picture::Food(name) => food_images.get_or_load(name, &catalog, &mut images),
    };
    if sprite.image != shown.handle {
        sprite.image = shown.handle;
    }
    let text = shown.caption.unwrap_or_default();
    if caption.0 != text {
        caption.0 = text;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_tracks_picture_score_and_input() {
        let mut stage = Stage::new(5);

        assert_eq!(stage.apply(FeedCue::SetInputEnabled(false)), None);
        assert_eq!(stage.apply(FeedCue::PlaySound(Sound::Drink)), Some(Sound::Drink));
        stage.apply(FeedCue::ShowFood("milk".to_string()));
        assert_eq!(stage.picture, Picture::Food("milk".to_string()));
        assert!(!stage.input_enabled);

        stage.apply(FeedCue::ShowOutcome(Outcome::Good));
        stage.apply(FeedCue::ShowScore(12));
        stage.apply(FeedCue::ShowIdle);
        stage.apply(FeedCue::SetInputEnabled(true));

        assert_eq!(stage.picture, Picture::Idle);
        assert_eq!(stage.score, 12);
        assert!(stage.input_enabled);
        assert!(!stage.failure_notice);
    }

    #[test]
    fn placeholder_has_black_border_and_filled_centre() {
        let image = placeholder_image([10, 20, 30, 255]);
        let data = image.data.as_ref().unwrap();

        assert_eq!(data.len(), (PLACEHOLDER_SIZE * PLACEHOLDER_SIZE * 4) as usize);
        assert_eq!(&data[0..4], &[0, 0, 0, 255]);
        let centre = (((PLACEHOLDER_SIZE / 2) * PLACEHOLDER_SIZE + PLACEHOLDER_SIZE / 2) * 4) as usize;
        assert_eq!(&data[centre..centre + 4], &[10, 20, 30, 255]);
    }

    #[test]
    fn unreadable_food_image_becomes_a_captioned_placeholder() {
        let catalog = FoodCatalog::default();
        let mut images = Assets::<Image>::default();
        let mut food_images = FoodImages::default();

        let first = food_images.get_or_load("ghost", &catalog, &mut images);
        let second = food_images.get_or_load("ghost", &catalog, &mut images);

        assert_eq!(first.caption.as_deref(), Some("ghost"));
        assert_eq!(first.handle, second.handle);
        assert_eq!(images.len(), 1);
    }
}
