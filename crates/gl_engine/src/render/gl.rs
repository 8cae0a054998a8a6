//! OpenGL implementation of [`GraphicsApi`] on top of `glow`
//!
//! Every method wraps a raw GL call and is only sound while the context it
//! was loaded from is current on the calling thread. [`GlowApi`] is created
//! from a window that made its context current, and the window outlives it.

use glow::HasContext;

use crate::assets::BlockFormat;

use super::api::{
    BufferHandle, BufferTarget, BuildStatus, GraphicsApi, ProgramHandle, ShaderHandle, ShaderKind,
    TextureHandle, UniformLocation, VertexArrayHandle,
};

// S3TC formats from EXT_texture_compression_s3tc
const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;

fn gl_size(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

const fn shader_type(kind: ShaderKind) -> u32 {
    match kind {
        ShaderKind::Vertex => glow::VERTEX_SHADER,
        ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        ShaderKind::Geometry => glow::GEOMETRY_SHADER,
    }
}

const fn buffer_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

const fn compressed_format(format: BlockFormat) -> u32 {
    match format {
        BlockFormat::Dxt1 => COMPRESSED_RGBA_S3TC_DXT1,
        BlockFormat::Dxt3 => COMPRESSED_RGBA_S3TC_DXT3,
        BlockFormat::Dxt5 => COMPRESSED_RGBA_S3TC_DXT5,
    }
}

/// [`GraphicsApi`] backed by a current OpenGL context
pub struct GlowApi {
    gl: glow::Context,
}

impl GlowApi {
    /// Wrap a loaded `glow` context
    pub fn new(gl: glow::Context) -> Self {
        // SAFETY: the context was made current before loading.
        let (version, renderer) = unsafe {
            (gl.get_parameter_string(glow::VERSION), gl.get_parameter_string(glow::RENDERER))
        };
        log::info!("OpenGL {} on {}", version, renderer);
        Self { gl }
    }

    /// Load GL entry points through a proc-address lookup
    ///
    /// # Safety
    ///
    /// The context the loader resolves against must be current on this
    /// thread and stay alive for as long as the returned API is used.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const std::ffi::c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }
}

impl GraphicsApi for GlowApi {
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderHandle, String> {
        unsafe { self.gl.create_shader(shader_type(kind)) }.map(|shader| ShaderHandle(shader.0))
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> BuildStatus {
        let shader = glow::NativeShader(shader.0);
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            BuildStatus {
                success: self.gl.get_shader_compile_status(shader),
                log: self.gl.get_shader_info_log(shader),
            }
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        unsafe { self.gl.create_program() }.map(|program| ProgramHandle(program.0))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .attach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0));
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .detach_shader(glow::NativeProgram(program.0), glow::NativeShader(shader.0));
        }
    }

    fn link_program(&self, program: ProgramHandle) -> BuildStatus {
        let program = glow::NativeProgram(program.0);
        unsafe {
            self.gl.link_program(program);
            BuildStatus {
                success: self.gl.get_program_link_status(program),
                log: self.gl.get_program_info_log(program),
            }
        }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.0))) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(glow::NativeProgram(program.0), name) }
            .map(|location| UniformLocation(location.0))
    }

    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&location), false, value) }
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_i32(Some(&location), value) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { self.gl.create_vertex_array() }.map(|vao| VertexArrayHandle(vao.0))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.0))) }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(vertex_array.0)) }
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { self.gl.create_buffer() }.map(|buffer| BufferHandle(buffer.0))
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let buffer = buffer.map(|b| glow::NativeBuffer(b.0));
        unsafe { self.gl.bind_buffer(buffer_target(target), buffer) }
    }

    fn upload_buffer(&self, target: BufferTarget, buffer: BufferHandle, data: &[u8]) {
        let target = buffer_target(target);
        unsafe {
            self.gl.bind_buffer(target, Some(glow::NativeBuffer(buffer.0)));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn disable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer(&self, index: u32, components: i32) {
        unsafe { self.gl.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0) }
    }

    fn draw_triangles(&self, index_count: i32) {
        unsafe { self.gl.draw_elements(glow::TRIANGLES, index_count, glow::UNSIGNED_INT, 0) }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { self.gl.create_texture() }.map(|texture| TextureHandle(texture.0))
    }

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0))) }
    }

    fn upload_compressed_level(
        &self,
        format: BlockFormat,
        level: i32,
        width: u32,
        height: u32,
        data: &[u8],
    ) {
        let image_size = i32::try_from(data.len()).unwrap_or(i32::MAX);
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.compressed_tex_image_2d(
                glow::TEXTURE_2D,
                level,
                compressed_format(format) as i32,
                gl_size(width),
                gl_size(height),
                0,
                image_size,
                data,
            );
            // The last level uploaded closes the mip chain.
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, level);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
        }
    }

    fn upload_rgba8(&self, width: u32, height: u32, data: &[u8]) {
        unsafe {
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                gl_size(width),
                gl_size(height),
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(data),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
        }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, gl_size(width), gl_size(height)) }
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    fn enable_depth_test(&self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(glow::LESS);
        }
    }

    fn enable_back_face_culling(&self) {
        unsafe {
            self.gl.enable(glow::CULL_FACE);
            self.gl.cull_face(glow::BACK);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_enums() {
        assert_eq!(shader_type(ShaderKind::Vertex), glow::VERTEX_SHADER);
        assert_eq!(shader_type(ShaderKind::Fragment), glow::FRAGMENT_SHADER);
        assert_eq!(shader_type(ShaderKind::Geometry), glow::GEOMETRY_SHADER);
    }

    #[test]
    fn test_s3tc_enums() {
        assert_eq!(compressed_format(BlockFormat::Dxt1), 0x83F1);
        assert_eq!(compressed_format(BlockFormat::Dxt5), 0x83F3);
    }

    #[test]
    fn test_gl_size_saturates() {
        assert_eq!(gl_size(640), 640);
        assert_eq!(gl_size(u32::MAX), i32::MAX);
    }
}
