//! # Core Engine Module
//!
//! Shared abstractions the demo is assembled from.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for window, shaders, assets, camera and scene
//! - **Foundation**: Low-level utilities (math, arena keys, timing, logging)
//! - **Assets**: File loading and mesh/texture decoding

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;
pub use crate::assets;

// Re-export commonly used config types
pub use config::{
    AppConfig,
    WindowConfig,
    ShaderConfig,
    ShaderSource,
    AssetConfig,
    CameraConfig,
    SceneConfig,
    Config,
    ConfigError,
    DEFAULT_VERTEX_SHADER,
    DEFAULT_FRAGMENT_SHADER,
};
