//! # Unified Configuration System
//!
//! All configuration for the demo in one place: window and context creation,
//! shader sources, asset paths, camera tuning and the scene to draw.
//!
//! ## Design Goals
//!
//! - **Centralized**: All configuration types in one place for easy discovery
//! - **Serializable**: TOML and RON through the [`Config`] trait
//! - **Type Safe**: Strong typing with validation and defaults
//!
//! Every section is `#[serde(default)]`, so a file only needs the values it
//! changes.

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};
use crate::render::ShaderKind;

/// Oldest OpenGL version with a core profile
pub const MIN_CORE_VERSION: (u32, u32) = (3, 2);

/// GLSL 330 vertex shader: MVP transform, UV pass-through with flipped V
pub const DEFAULT_VERTEX_SHADER: &str = "#version 330 core
layout(location = 0) in vec3 vertexPos;
layout(location = 1) in vec2 vertexUV;
uniform mat4 MVP;
out vec2 uv;

void main()
{
   gl_Position = MVP * vec4(vertexPos, 1.0);
   uv = vec2(vertexUV.x, 1.0-vertexUV.y);
}
";

/// GLSL 330 fragment shader sampling `textureSampler`
pub const DEFAULT_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 color;
in vec2 uv;
uniform sampler2D textureSampler;

void main()
{
   color = texture(textureSampler, uv).rgba;
}
";

/// # Window Configuration
///
/// Window size, title and the OpenGL context the window is created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Requested OpenGL version (major, minor); always a core profile
    pub gl_version: (u32, u32),
    /// Synchronize buffer swaps with the display refresh
    pub vsync: bool,
}

impl WindowConfig {
    /// Create a window configuration with the default context settings
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }

    /// Check the size, title and context version
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.is_empty() {
            return Err(ConfigError::Invalid("window title cannot be empty".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".to_string()));
        }
        // Core profiles start at 3.2
        if self.gl_version < MIN_CORE_VERSION {
            let (major, minor) = self.gl_version;
            return Err(ConfigError::Invalid(format!(
                "OpenGL {major}.{minor} has no core profile (need {}.{} or later)",
                MIN_CORE_VERSION.0, MIN_CORE_VERSION.1
            )));
        }
        Ok(())
    }

    /// Width over height
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Game".to_string(),
            width: 1024,
            height: 768,
            gl_version: (3, 3),
            vsync: true,
        }
    }
}

/// One shader stage as it appears in a configuration file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShaderSource {
    /// Pipeline stage (`vertex`, `fragment` or `geometry`)
    pub kind: ShaderKind,
    /// GLSL source text
    pub source: String,
}

impl ShaderSource {
    /// Create a shader source entry
    pub fn new(kind: ShaderKind, source: impl Into<String>) -> Self {
        Self { kind, source: source.into() }
    }
}

/// # Shader Configuration
///
/// GLSL sources for every stage linked into the demo program, and the names
/// of the uniforms the render loop writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Stages in attach order
    pub stages: Vec<ShaderSource>,
    /// Name of the model-view-projection `mat4` uniform
    pub mvp_uniform: String,
    /// Name of the texture `sampler2D` uniform
    pub sampler_uniform: String,
}

impl ShaderConfig {
    /// Replace the stage list
    pub fn with_stages(mut self, stages: Vec<ShaderSource>) -> Self {
        self.stages = stages;
        self
    }

    /// Validate the shader configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for required in [ShaderKind::Vertex, ShaderKind::Fragment] {
            if !self.stages.iter().any(|stage| stage.kind == required) {
                return Err(ConfigError::Invalid(format!("missing {required} shader stage")));
            }
        }
        if let Some(stage) = self.stages.iter().find(|stage| stage.source.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("{} shader source is empty", stage.kind)));
        }
        if self.mvp_uniform.is_empty() || self.sampler_uniform.is_empty() {
            return Err(ConfigError::Invalid("uniform names cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            stages: vec![
                ShaderSource::new(ShaderKind::Vertex, DEFAULT_VERTEX_SHADER),
                ShaderSource::new(ShaderKind::Fragment, DEFAULT_FRAGMENT_SHADER),
            ],
            mvp_uniform: "MVP".to_string(),
            sampler_uniform: "textureSampler".to_string(),
        }
    }
}

/// # Asset Configuration
///
/// Files loaded at startup and the vertex attribute slots they feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Wavefront OBJ mesh
    pub mesh_path: String,
    /// Texture image (DDS, PNG, JPEG or BMP)
    pub texture_path: String,
    /// Attribute slot of the vertex positions
    pub position_attribute: u32,
    /// Attribute slot of the texture coordinates
    pub uv_attribute: u32,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            mesh_path: "cube.obj".to_string(),
            texture_path: "cube.dds".to_string(),
            position_attribute: 0,
            uv_attribute: 1,
        }
    }
}

/// # Camera Configuration
///
/// Starting pose and tuning of the first-person camera.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Starting position in world space
    pub position: [f32; 3],
    /// Starting yaw in radians
    pub horizontal_angle: f32,
    /// Starting pitch in radians
    pub vertical_angle: f32,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Movement speed in units per second
    pub speed: f32,
    /// Radians of rotation per pixel of cursor offset
    pub mouse_speed: f32,
    /// Near clipping plane
    pub near: f32,
    /// Far clipping plane
    pub far: f32,
}

impl CameraConfig {
    /// Validate the camera configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "field of view {} out of range",
                self.fov_degrees
            )));
        }
        if self.speed <= 0.0 || self.mouse_speed <= 0.0 {
            return Err(ConfigError::Invalid("camera speeds must be positive".to_string()));
        }
        if self.near <= 0.0 || self.near >= self.far {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far (got {} / {})",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 3.0, 0.0],
            horizontal_angle: 0.0,
            vertical_angle: 0.0,
            fov_degrees: 45.0,
            speed: 3.0,
            mouse_speed: 0.005,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// # Scene Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// RGBA clear colour
    pub clear_color: [f32; 4],
    /// One draw of the vertex array per translation
    pub instances: Vec<[f32; 3]>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.4, 0.0],
            instances: vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]],
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
/// This is the main configuration structure applications should use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Window and context creation
    pub window: WindowConfig,
    /// Shader stages and uniform names
    pub shaders: ShaderConfig,
    /// Startup assets
    pub assets: AssetConfig,
    /// First-person camera
    pub camera: CameraConfig,
    /// What gets drawn each frame
    pub scene: SceneConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        self.shaders.validate()?;
        self.camera.validate()?;
        if self.scene.instances.is_empty() {
            return Err(ConfigError::Invalid("scene has no instances to draw".to_string()));
        }
        Ok(())
    }
}

impl Config for AppConfig {}
