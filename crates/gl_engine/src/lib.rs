//! # GL Engine
//!
//! A small OpenGL rendering core written in Rust.
//!
//! ## Features
//!
//! - **RAII Ownership**: shaders, programs, vertex arrays, buffers and
//!   textures are released when their owner drops
//! - **Link Protocol**: compile once, attach to one program, detach on link
//! - **Vertex Array Membership**: ordered members with back-references kept
//!   in a shared relation arena
//! - **Headless Backend**: every graphics call can be recorded without a GPU
//! - **Asset Decoding**: OBJ meshes, DDS (DXT1/3/5), PNG, JPEG and BMP
//!
//! ## Quick Start
//!
//! ```rust
//! use gl_engine::prelude::*;
//!
//! let context = RenderContext::new(HeadlessApi::new());
//!
//! let vertex = Shader::new(&context, ShaderKind::Vertex)?;
//! vertex.compile(DEFAULT_VERTEX_SHADER)?;
//! let fragment = Shader::new(&context, ShaderKind::Fragment)?;
//! fragment.compile(DEFAULT_FRAGMENT_SHADER)?;
//!
//! let program = Program::new(&context)?;
//! vertex.attach(&program)?;
//! fragment.attach(&program)?;
//! program.link()?;
//! program.use_program()?;
//!
//! let vao = VertexArray::new(&context)?;
//! let mut mesh = Mesh::new(&context, 0)?;
//! mesh.load(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])?;
//! mesh.bind(&vao)?;
//! assert_eq!(vao.render(), 1);
//! # Ok::<(), RenderError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod input;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{ImageData, MeshData, ObjLoader, TextureImage},
        config::Config,
        core::config::{
            AppConfig, AssetConfig, CameraConfig, SceneConfig, ShaderConfig, WindowConfig,
            DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
        },
        foundation::{
            math::{Mat4, Mat4Ext, Vec3},
            time::Timer,
        },
        input::{FirstPersonControls, InputEvent, KeyCode},
        render::{
            Camera, GlowApi, GraphicsApi, HeadlessApi, Mesh, Program, RenderContext, RenderError,
            Renderable, Shader, ShaderKind, Texture, VertexArray, Window,
        },
    };
}
