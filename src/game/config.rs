// Site configuration parsing from portfolio.toml
//
// Every field has a default, so an empty file (or no file at all) yields the
// stock island. Modal entries given here replace or extend the built-in ones.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use super::clock::TickMode;
use super::modal::{ModalCatalog, ModalEntry, default_catalog};

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "PORTFOLIO_CONFIG";
/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_PATH: &str = "portfolio.toml";

/// Character physics
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub capsule_radius: f32,
    /// Height of the capsule's upper end point above the feet
    pub capsule_height: f32,
    /// Upward velocity of a hop
    pub jump_height: f32,
    /// Horizontal velocity added per held direction
    pub move_speed: f32,
    /// Seconds simulated per tick
    pub step: f32,
    /// Falling below this height respawns the character
    pub fall_threshold: f32,
    /// Fraction of the remaining heading turned per tick
    pub rotation_damping: f32,
    /// Rescale diagonal hops to `move_speed` instead of `move_speed * sqrt(2)`
    pub normalize_diagonal: bool,
    pub tick: TickMode,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 30.0,
            capsule_radius: 0.35,
            capsule_height: 1.0,
            jump_height: 11.0,
            move_speed: 7.0,
            step: 0.035,
            fall_threshold: -20.0,
            rotation_damping: 0.4,
            normalize_diagonal: false,
            tick: TickMode::PerFrame,
        }
    }
}

/// Desktop follow camera and headset view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub offset: Vec3,
    pub fov_degrees: f32,
    pub headset_eye_height: f32,
    pub headset_fov_degrees: f32,
    /// Radians of head turn per pixel of mouse motion while emulating a headset
    pub headset_look_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            offset: Vec3::new(-13.0, 39.0, -67.0),
            fov_degrees: 75.0,
            headset_eye_height: 1.2,
            headset_fov_degrees: 90.0,
            headset_look_sensitivity: 0.004,
        }
    }
}

/// Scene asset and the node names gameplay binds to
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub path: PathBuf,
    pub character_node: String,
    pub collider_node: String,
    /// Every pickable node, in no particular order
    pub interactive: Vec<String>,
    /// Interactive nodes that bounce rather than open the modal
    pub creatures: Vec<String>,
    /// Creatures whose bounce scales relative to their authored scale
    pub relative_bounce: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Portfolio.glb"),
            character_node: "Character".to_string(),
            collider_node: "Ground_Collider".to_string(),
            interactive: names(&[
                "Project_1",
                "Project_2",
                "Project_3",
                "Picnic",
                "Squirtle",
                "Chicken",
                "Pikachu",
                "Bulbasaur",
                "Charmander",
                "Snorlax",
                "Chest",
            ]),
            creatures: names(&["Bulbasaur", "Chicken", "Pikachu", "Charmander", "Squirtle", "Snorlax"]),
            relative_bounce: names(&["Snorlax"]),
        }
    }
}

/// Where sound cue files live
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub asset_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("."),
        }
    }
}

/// Site configuration from portfolio.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub audio: AudioConfig,
    /// Modal overrides keyed by prop name
    pub modal: BTreeMap<String, ModalEntry>,
}

impl SiteConfig {
    /// Load site configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `$PORTFOLIO_CONFIG` if set, else `./portfolio.toml` if it exists, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return Self::from_file(local);
        }
        log::info!("no {} found, using built-in configuration", DEFAULT_CONFIG_PATH);
        Ok(Self::default())
    }

    /// Built-in modal content with this config's entries layered on top.
    pub fn modal_catalog(&self) -> ModalCatalog {
        let mut catalog = default_catalog();
        catalog.extend(self.modal.iter().map(|(k, v)| (k.clone(), v.clone())));
        catalog
    }

    pub fn is_creature(&self, name: &str) -> bool {
        self.scene.creatures.iter().any(|c| c == name)
    }

    pub fn bounces_relative(&self, name: &str) -> bool {
        self.scene.relative_bounce.iter().any(|c| c == name)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.physics.gravity, 30.0);
        assert_eq!(config.scene.interactive.len(), 11);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
            [physics]
            move_speed = 5.0
            normalize_diagonal = true

            [physics.tick]
            mode = "fixed_rate"
            hz = 120.0

            [camera]
            offset = [0.0, 20.0, -30.0]

            [audio]
            asset_dir = "public"
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.physics.move_speed, 5.0);
        assert!(config.physics.normalize_diagonal);
        assert_eq!(config.physics.jump_height, 11.0);
        assert_eq!(config.physics.tick, TickMode::FixedRate { hz: 120.0 });
        assert_eq!(config.camera.offset, Vec3::new(0.0, 20.0, -30.0));
        assert_eq!(config.camera.fov_degrees, 75.0);
        assert_eq!(config.audio.asset_dir, PathBuf::from("public"));
        assert_eq!(SiteConfig::default().audio.asset_dir, PathBuf::from("."));
    }

    #[test]
    fn modal_overrides_layer_over_builtins() {
        let toml = r#"
            [modal.Chest]
            title = "About"
            body = "Hello"

            [modal.Sign]
            title = "Sign"
            body = "Read me"
            link = "https://example.org/"
        "#;
        let config: SiteConfig = toml::from_str(toml).unwrap();
        let catalog = config.modal_catalog();
        assert_eq!(catalog["Chest"].title, "About");
        assert_eq!(catalog["Sign"].link.as_deref(), Some("https://example.org/"));
        assert!(catalog.contains_key("Project_1"));
    }

    #[test]
    fn creature_lookup() {
        let config = SiteConfig::default();
        assert!(config.is_creature("Pikachu"));
        assert!(!config.is_creature("Chest"));
        assert!(config.bounces_relative("Snorlax"));
        assert!(!config.bounces_relative("Pikachu"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = std::env::temp_dir().join("portfolio_island_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[physics\ngravity = ").unwrap();

        let err = SiteConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
