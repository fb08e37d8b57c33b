use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    fs, io,
    path::{Path, PathBuf},
};

use glam::{Mat4, Quat, Vec3};
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "skinview.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(toml::de::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Failed to read config: {}", err),
            ConfigError::Parse(err) => write!(f, "Bad config: {}", err),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Parse(value)
    }
}

/// Viewer settings, read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub model: ModelConfig,
    pub terrain: TerrainConfig,
    pub boxes: Vec<BoxConfig>,
    pub light: LightConfig,
    pub fog: FogConfig,
    pub camera: CameraConfig,
    /// Upper bound of the animation time step, in seconds
    pub max_frame_delta: f32,
    pub shadow_map_size: u32,
    pub clear_color: [f32; 3],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            terrain: TerrainConfig::default(),
            boxes: vec![BoxConfig::default()],
            light: LightConfig::default(),
            fog: FogConfig::default(),
            camera: CameraConfig::default(),
            max_frame_delta: 0.1,
            shadow_map_size: 2048,
            clear_color: [0.7, 0.7, 0.7],
        }
    }
}

impl ViewerConfig {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load the given file, or `skinview.toml` when no path is given. Any
    /// failure falls back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !path.exists() {
                    info!("No config file found, using defaults");
                    return Self::default();
                }
                path
            }
        };

        match Self::from_path(&path) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(err) => {
                warn!("{}, using defaults", err);
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: Option<PathBuf>,
    pub translation: [f32; 3],
    pub scale: f32,
    /// Rotation around the Y axis, in degrees
    pub rotation_y: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: None,
            translation: [50.0, 0.0, -50.0],
            scale: 10.0,
            rotation_y: 0.0,
        }
    }
}

impl ModelConfig {
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.scale),
            Quat::from_rotation_y(self.rotation_y.to_radians()),
            Vec3::from_array(self.translation),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub texture: Option<PathBuf>,
    pub tile_size: f32,
    pub load_distance: i32,
    pub render_distance: i32,
    /// Frames between two eviction passes
    pub cleanup_interval: u64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            texture: None,
            tile_size: 250.0,
            load_distance: 3,
            render_distance: 2,
            cleanup_interval: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub color: [f32; 4],
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            position: [20.0, 0.0, -40.0],
            scale: [5.0, 5.0, 5.0],
            color: [0.8, 0.3, 0.2, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Direction the light travels in
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub ambient: f32,
    /// Half width of the shadow volume around the camera
    pub shadow_extent: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [-0.5, -1.0, -0.3],
            color: [1.0, 1.0, 0.95],
            ambient: 0.3,
            shadow_extent: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub color: [f32; 3],
    pub start: f32,
    pub end: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            color: [0.7, 0.7, 0.7],
            start: 200.0,
            end: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Movement speed in units per millisecond
    pub speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [50.0, 50.0, 20.0],
            yaw: -90.0,
            pitch: -35.0,
            fov: 60.0,
            znear: 0.1,
            zfar: 1000.0,
            speed: 0.05,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_file_is_default() {
        let config = ViewerConfig::parse("").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = ViewerConfig::parse(
            r#"
            max_frame_delta = 0.05

            [model]
            path = "assets/character.glb"
            scale = 2.0

            [terrain]
            tile_size = 100.0

            [[boxes]]
            position = [1.0, 0.0, 1.0]

            [[boxes]]
            color = [0.0, 1.0, 0.0, 1.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.max_frame_delta, 0.05);
        assert_eq!(
            config.model.path.as_deref(),
            Some(Path::new("assets/character.glb"))
        );
        assert_eq!(config.model.scale, 2.0);
        assert_eq!(config.model.rotation_y, 0.0);
        assert_eq!(config.terrain.tile_size, 100.0);
        assert_eq!(config.terrain.load_distance, 3);
        assert_eq!(config.boxes.len(), 2);
        assert_eq!(config.boxes[0].scale, [5.0, 5.0, 5.0]);
        assert_eq!(config.boxes[1].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(config.fog, FogConfig::default());
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let result = ViewerConfig::parse("max_frame_delta = \"fast\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unreadable_file_falls_back() {
        let config = ViewerConfig::load(Some(Path::new("does/not/exist.toml")));
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_model_transform() {
        let model = ModelConfig {
            path: None,
            translation: [1.0, 2.0, 3.0],
            scale: 2.0,
            rotation_y: 90.0,
        };
        let point = model.transform().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5));
    }
}
