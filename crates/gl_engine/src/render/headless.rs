//! Context-free graphics API
//!
//! [`HeadlessApi`] implements [`GraphicsApi`] without a GPU. It hands out
//! fresh handles, records every call in order and keeps enough state
//! (attachments, enabled attributes, buffer contents) for tests and tools
//! to check what the render core did.
//!
//! Compilation is simulated: a source compiles when it contains a `main`
//! entry point and its braces balance. Linking succeeds when at least one
//! compiled shader is attached, unless links are rejected explicitly.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroU32;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::assets::BlockFormat;

use super::api::{
    BufferHandle, BufferTarget, BuildStatus, GraphicsApi, ProgramHandle, ShaderHandle, ShaderKind,
    TextureHandle, UniformLocation, VertexArrayHandle,
};

/// One recorded graphics call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum ApiCall {
    CreateShader(ShaderKind, ShaderHandle),
    CompileShader(ShaderHandle),
    DeleteShader(ShaderHandle),
    CreateProgram(ProgramHandle),
    AttachShader(ProgramHandle, ShaderHandle),
    DetachShader(ProgramHandle, ShaderHandle),
    LinkProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    DeleteProgram(ProgramHandle),
    UniformMat4(UniformLocation, [f32; 16]),
    UniformI32(UniformLocation, i32),
    CreateVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    DeleteVertexArray(VertexArrayHandle),
    CreateBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    UploadBuffer(BufferTarget, BufferHandle, usize),
    DeleteBuffer(BufferHandle),
    EnableVertexAttrib(u32),
    DisableVertexAttrib(u32),
    VertexAttribPointer(u32, i32),
    DrawTriangles(i32),
    CreateTexture(TextureHandle),
    ActiveTextureUnit(u32),
    BindTexture(Option<TextureHandle>),
    UploadCompressedLevel(BlockFormat, i32, u32, u32),
    UploadRgba8(u32, u32),
    DeleteTexture(TextureHandle),
    SetViewport(u32, u32),
    SetClearColor([f32; 4]),
    Clear,
    EnableDepthTest,
    EnableBackFaceCulling,
}

#[derive(Default)]
struct HeadlessState {
    next_name: u32,
    calls: Vec<ApiCall>,
    live: BTreeSet<u32>,
    compiled: HashMap<u32, bool>,
    attachments: HashMap<u32, Vec<ShaderHandle>>,
    uniforms: HashMap<(u32, String), UniformLocation>,
    buffers: HashMap<u32, Vec<u8>>,
    enabled_attribs: BTreeSet<u32>,
    current_program: Option<ProgramHandle>,
    reject_links: bool,
    compile_delay: Option<Duration>,
}

impl HeadlessState {
    fn fresh_name(&mut self) -> NonZeroU32 {
        self.next_name += 1;
        self.live.insert(self.next_name);
        NonZeroU32::new(self.next_name).unwrap_or(NonZeroU32::MIN)
    }

    fn release(&mut self, name: u32) {
        self.live.remove(&name);
    }
}

/// Graphics API that runs without a GPU and records every call
#[derive(Default)]
pub struct HeadlessApi {
    state: Mutex<HeadlessState>,
}

impl HeadlessApi {
    /// Create an API with no objects and an empty call log
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: ApiCall) {
        self.state().calls.push(call);
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Forget recorded calls, keeping object state
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Number of objects created and not yet deleted
    pub fn live_objects(&self) -> usize {
        self.state().live.len()
    }

    /// Shaders currently attached to a program at the API level
    pub fn attached(&self, program: ProgramHandle) -> Vec<ShaderHandle> {
        self.state().attachments.get(&program.raw()).cloned().unwrap_or_default()
    }

    /// Program made current by the last `use_program`
    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state().current_program
    }

    /// Attribute indices currently enabled
    pub fn enabled_attribs(&self) -> Vec<u32> {
        self.state().enabled_attribs.iter().copied().collect()
    }

    /// Last data uploaded to a buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state().buffers.get(&buffer.raw()).cloned()
    }

    /// Make every following link fail
    pub fn reject_links(&self, reject: bool) {
        self.state().reject_links = reject;
    }

    /// Stall each compile for a while, outside the state lock
    pub fn set_compile_delay(&self, delay: Option<Duration>) {
        self.state().compile_delay = delay;
    }
}

fn simulate_compile(source: &str) -> BuildStatus {
    if !source.contains("void main") {
        return BuildStatus::failed("0:1(1): error: no entry point `main` defined");
    }
    let mut depth = 0i32;
    for (line, text) in source.lines().enumerate() {
        for c in text.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return BuildStatus::failed(format!("0:{}(1): error: unexpected '}}'", line + 1));
            }
        }
    }
    if depth != 0 {
        return BuildStatus::failed("0:0(0): error: unexpected end of file");
    }
    BuildStatus::ok("")
}

impl GraphicsApi for HeadlessApi {
    fn create_shader(&self, kind: ShaderKind) -> Result<ShaderHandle, String> {
        let mut state = self.state();
        let handle = ShaderHandle(state.fresh_name());
        state.compiled.insert(handle.raw(), false);
        state.calls.push(ApiCall::CreateShader(kind, handle));
        Ok(handle)
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> BuildStatus {
        let delay = {
            let mut state = self.state();
            state.calls.push(ApiCall::CompileShader(shader));
            state.compile_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let status = simulate_compile(source);
        self.state().compiled.insert(shader.raw(), status.success);
        status
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state();
        state.compiled.remove(&shader.raw());
        state.release(shader.raw());
        state.calls.push(ApiCall::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let mut state = self.state();
        let handle = ProgramHandle(state.fresh_name());
        state.attachments.insert(handle.raw(), Vec::new());
        state.calls.push(ApiCall::CreateProgram(handle));
        Ok(handle)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state();
        state.attachments.entry(program.raw()).or_default().push(shader);
        state.calls.push(ApiCall::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state();
        if let Some(list) = state.attachments.get_mut(&program.raw()) {
            list.retain(|&s| s != shader);
        }
        state.calls.push(ApiCall::DetachShader(program, shader));
    }

    fn link_program(&self, program: ProgramHandle) -> BuildStatus {
        let mut state = self.state();
        state.calls.push(ApiCall::LinkProgram(program));
        if state.reject_links {
            return BuildStatus::failed("error: linking rejected");
        }
        let attached = state.attachments.get(&program.raw()).cloned().unwrap_or_default();
        if attached.is_empty() {
            return BuildStatus::failed("error: no shaders attached");
        }
        let compiled = |s: &ShaderHandle| state.compiled.get(&s.raw()).copied().unwrap_or(false);
        if let Some(shader) = attached.iter().find(|s| !compiled(*s)) {
            return BuildStatus::failed(format!("error: shader {} is not compiled", shader.raw()));
        }
        BuildStatus::ok("")
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state();
        state.current_program = program;
        state.calls.push(ApiCall::UseProgram(program));
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state();
        state.attachments.remove(&program.raw());
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.release(program.raw());
        state.calls.push(ApiCall::DeleteProgram(program));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state();
        let key = (program.raw(), name.to_string());
        let next = u32::try_from(state.uniforms.len()).unwrap_or(u32::MAX);
        Some(*state.uniforms.entry(key).or_insert(UniformLocation(next)))
    }

    fn uniform_mat4(&self, location: UniformLocation, value: &[f32; 16]) {
        self.record(ApiCall::UniformMat4(location, *value));
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        self.record(ApiCall::UniformI32(location, value));
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        let mut state = self.state();
        let handle = VertexArrayHandle(state.fresh_name());
        state.calls.push(ApiCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.record(ApiCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut state = self.state();
        state.release(vertex_array.raw());
        state.calls.push(ApiCall::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let mut state = self.state();
        let handle = BufferHandle(state.fresh_name());
        state.calls.push(ApiCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record(ApiCall::BindBuffer(target, buffer));
    }

    fn upload_buffer(&self, target: BufferTarget, buffer: BufferHandle, data: &[u8]) {
        let mut state = self.state();
        state.buffers.insert(buffer.raw(), data.to_vec());
        state.calls.push(ApiCall::UploadBuffer(target, buffer, data.len()));
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state();
        state.buffers.remove(&buffer.raw());
        state.release(buffer.raw());
        state.calls.push(ApiCall::DeleteBuffer(buffer));
    }

    fn enable_vertex_attrib(&self, index: u32) {
        let mut state = self.state();
        state.enabled_attribs.insert(index);
        state.calls.push(ApiCall::EnableVertexAttrib(index));
    }

    fn disable_vertex_attrib(&self, index: u32) {
        let mut state = self.state();
        state.enabled_attribs.remove(&index);
        state.calls.push(ApiCall::DisableVertexAttrib(index));
    }

    fn vertex_attrib_pointer(&self, index: u32, components: i32) {
        self.record(ApiCall::VertexAttribPointer(index, components));
    }

    fn draw_triangles(&self, index_count: i32) {
        self.record(ApiCall::DrawTriangles(index_count));
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let mut state = self.state();
        let handle = TextureHandle(state.fresh_name());
        state.calls.push(ApiCall::CreateTexture(handle));
        Ok(handle)
    }

    fn active_texture_unit(&self, unit: u32) {
        self.record(ApiCall::ActiveTextureUnit(unit));
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        self.record(ApiCall::BindTexture(texture));
    }

    fn upload_compressed_level(
        &self,
        format: BlockFormat,
        level: i32,
        width: u32,
        height: u32,
        _data: &[u8],
    ) {
        self.record(ApiCall::UploadCompressedLevel(format, level, width, height));
    }

    fn upload_rgba8(&self, width: u32, height: u32, _data: &[u8]) {
        self.record(ApiCall::UploadRgba8(width, height));
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state();
        state.release(texture.raw());
        state.calls.push(ApiCall::DeleteTexture(texture));
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(ApiCall::SetViewport(width, height));
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        self.record(ApiCall::SetClearColor(rgba));
    }

    fn clear(&self) {
        self.record(ApiCall::Clear);
    }

    fn enable_depth_test(&self) {
        self.record(ApiCall::EnableDepthTest);
    }

    fn enable_back_face_culling(&self) {
        self.record(ApiCall::EnableBackFaceCulling);
    }
}
