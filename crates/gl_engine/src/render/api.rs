//! Graphics API abstraction
//!
//! The render core never calls OpenGL directly. Everything it issues goes
//! through [`GraphicsApi`], implemented by [`crate::render::GlowApi`] for a
//! real context and by [`crate::render::HeadlessApi`] for tests and tooling.
//!
//! Handles are opaque non-zero names handed out by the implementation.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::assets::BlockFormat;

macro_rules! api_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Raw object name
            pub const fn raw(self) -> u32 {
                self.0.get()
            }
        }
    };
}

api_handle!(
    /// Shader object name
    ShaderHandle
);
api_handle!(
    /// Program object name
    ProgramHandle
);
api_handle!(
    /// Buffer object name
    BufferHandle
);
api_handle!(
    /// Vertex array object name
    VertexArrayHandle
);
api_handle!(
    /// Texture object name
    TextureHandle
);

/// Location of a uniform inside a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderKind {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
    /// Geometry stage
    Geometry,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
            Self::Geometry => "geometry",
        })
    }
}

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Per-vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

/// Outcome of a compile or link, with the driver's info log
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildStatus {
    /// Whether the driver reported success
    pub success: bool,
    /// Info log; may be non-empty on success (warnings)
    pub log: String,
}

impl BuildStatus {
    /// Successful build with an optional log
    pub fn ok(log: impl Into<String>) -> Self {
        Self { success: true, log: log.into() }
    }

    /// Failed build with its log
    pub fn failed(log: impl Into<String>) -> Self {
        Self { success: false, log: log.into() }
    }
}

/// Every graphics call the render core issues
///
/// Creation calls return the implementation's error text on failure. All
/// other calls are fire-and-forget, as in the underlying API. Calls must be
/// made from the thread that owns the current context.
pub trait GraphicsApi {
    // Shaders and programs

    /// Create a shader object for one stage
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderHandle, String>;
    /// Set the source of a shader and compile it
    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> BuildStatus;
    /// Delete a shader object
    fn delete_shader(&self, shader: ShaderHandle);
    /// Create a program object
    fn create_program(&self) -> Result<ProgramHandle, String>;
    /// Attach a shader to a program
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Detach a shader from a program
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Link a program
    fn link_program(&self, program: ProgramHandle) -> BuildStatus;
    /// Make a program current, or none
    fn use_program(&self, program: Option<ProgramHandle>);
    /// Delete a program object
    fn delete_program(&self, program: ProgramHandle);
    /// Look up a uniform by name
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    /// Write a column-major `mat4` uniform of the current program
    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]);
    /// Write an `int`/sampler uniform of the current program
    fn uniform_i32(&self, location: UniformLocation, value: i32);

    // Vertex arrays and buffers

    /// Create a vertex array object
    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String>;
    /// Bind a vertex array, or none
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);
    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    /// Create a buffer object
    fn create_buffer(&self) -> Result<BufferHandle, String>;
    /// Bind a buffer to a target, or unbind the target
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    /// Bind a buffer and fill it with static data
    fn upload_buffer(&self, target: BufferTarget, buffer: BufferHandle, data: &[u8]);
    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferHandle);
    /// Enable a vertex attribute array
    fn enable_vertex_attrib(&self, index: u32);
    /// Disable a vertex attribute array
    fn disable_vertex_attrib(&self, index: u32);
    /// Point an attribute at tightly packed floats in the bound array buffer
    fn vertex_attrib_pointer(&self, index: u32, components: i32);
    /// Draw the bound element buffer as a `u32` triangle list
    fn draw_triangles(&self, index_count: i32);

    // Textures

    /// Create a texture object
    fn create_texture(&self) -> Result<TextureHandle, String>;
    /// Select the active texture unit
    fn active_texture_unit(&self, unit: u32);
    /// Bind a 2D texture to the active unit, or unbind
    fn bind_texture(&self, texture: Option<TextureHandle>);
    /// Upload one block-compressed level to the bound 2D texture
    fn upload_compressed_level(
        &self,
        format: BlockFormat,
        level: i32,
        width: u32,
        height: u32,
        data: &[u8],
    );
    /// Upload RGBA8 pixels to the bound 2D texture and build its mipmaps
    fn upload_rgba8(&self, width: u32, height: u32, data: &[u8]);
    /// Delete a texture object
    fn delete_texture(&self, texture: TextureHandle);

    // Frame state

    /// Set the viewport to the full framebuffer
    fn set_viewport(&self, width: u32, height: u32);
    /// Set the clear colour
    fn set_clear_color(&self, rgba: [f32; 4]);
    /// Clear colour and depth
    fn clear(&self);
    /// Enable depth testing with a less-than comparison
    fn enable_depth_test(&self);
    /// Enable back-face culling
    fn enable_back_face_culling(&self);
}
