use config::{
    Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState,
};
use glam::Vec3;
use serde::Deserialize;

use crate::render::geometry::SphereParameters;

const DEFAULT_SETTINGS: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/resources/Settings.toml"
));

/// Name of the optional settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "Settings";
pub const ENV_PREFIX: &str = "SPHERE";

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub struct SphereSettings {
    pub latitude_bands: u32,
    pub longitude_bands: u32,
    pub radius: f32,
    pub clamp_colors: bool,
}

impl From<SphereSettings> for SphereParameters {
    fn from(settings: SphereSettings) -> Self {
        SphereParameters {
            latitude_bands: settings.latitude_bands,
            longitude_bands: settings.longitude_bands,
            radius: settings.radius,
            clamp_colors: settings.clamp_colors,
        }
    }
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub struct CameraSettings {
    pub eye: [f32; 3],
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub struct LightingSettings {
    // not normalized, the fragment stage does that
    pub direction: [f32; 3],
    pub clear_color: [f64; 3],
}

impl LightingSettings {
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq)]
pub struct AnimationSettings {
    // radians added to the model rotation every frame
    pub rotation_step: f32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    pub window: WindowSettings,
    pub sphere: SphereSettings,
    pub camera: CameraSettings,
    pub lighting: LightingSettings,
    pub animation: AnimationSettings,
}

impl Settings {
    /// Builder preloaded with the compiled-in defaults.
    pub fn builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_SETTINGS, FileFormat::Toml))
    }

    /// Defaults, overridden by `Settings.toml` in the working directory and
    /// then by `SPHERE_`-prefixed environment variables. Without either the
    /// compiled-in defaults are used unchanged. A malformed override is an
    /// error, reported like any other startup failure.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_config(
            Self::builder()
                .add_source(File::with_name(SETTINGS_FILE).required(false))
                .add_source(Self::environment())
                .build()?,
        )
    }

    /// Compiled-in defaults only, reproducing the reference scene.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::from_config(Self::builder().build()?)
    }

    pub fn from_config(settings: Config) -> Result<Self, ConfigError> {
        let settings = settings.try_deserialize()?;

        Ok(settings)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }
}
