//! # Rendering Core
//!
//! RAII ownership of OpenGL objects with explicit relations between them.
//!
//! ## Architecture
//!
//! - **[`GraphicsApi`]**: every graphics call goes through this trait;
//!   [`GlowApi`] drives a real context, [`HeadlessApi`] records calls
//! - **[`RenderContext`]**: the API plus the relation arena, shared by all
//!   objects through an `Arc`
//! - **[`VertexArray`]**: ordered aggregate of [`Renderable`] objects
//!   ([`Mesh`], [`Texture`])
//! - **[`Shader`] / [`Program`]**: the compile → attach → link protocol
//! - **[`Window`] / [`Camera`]**: windowing and view maths for applications
//!
//! ## Relations
//!
//! Back-references (object → vertex array, shader → program) are arena keys.
//! Both sides of each relation live in one table behind one lock, and drop
//! of either side severs the relation before the handle is deleted.

pub mod api;
pub mod camera;
pub mod context;
pub mod error;
pub mod gl;
pub mod headless;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vao;
pub mod window;

#[cfg(test)]
mod protocol_tests;

pub use api::{BuildStatus, GraphicsApi, ShaderKind, UniformLocation};
pub use camera::Camera;
pub use context::RenderContext;
pub use error::{ObjectError, ProgramError, RenderError, RenderResult, ShaderError};
pub use gl::GlowApi;
pub use headless::{ApiCall, HeadlessApi};
pub use mesh::Mesh;
pub use shader::{Program, Shader};
pub use texture::Texture;
pub use vao::{ObjectSlot, Renderable, VertexArray};
pub use window::{Window, WindowError, WindowResult};
