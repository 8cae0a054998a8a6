//! Shader units and programs
//!
//! RAII wrappers around shader and program objects implementing the
//! compile → attach → link protocol:
//!
//! - a [`Shader`] compiles at most once; a second call fails whether or not
//!   the first succeeded, and a racing call fails immediately instead of
//!   waiting
//! - a compiled shader attaches to at most one unlinked [`Program`]
//! - a successful [`Program::link`] detaches every attached shader; the
//!   program then takes no more shaders and cannot relink
//!
//! Dropping either side detaches the pair first, so no back-reference
//! outlives its target.

use std::sync::{Arc, Mutex, PoisonError, TryLockError};

use crate::foundation::collections::{ProgramId, ShaderId};
use crate::foundation::math::{Mat4, Mat4Ext};

use super::api::{
    BuildStatus, GraphicsApi, ProgramHandle, ShaderHandle, ShaderKind, UniformLocation,
};
use super::context::{ProgramEntry, RenderContext, ShaderEntry};
use super::error::{ProgramError, RenderError, RenderResult, ShaderError};

/// One compiled pipeline stage
pub struct Shader<A: GraphicsApi> {
    context: Arc<RenderContext<A>>,
    id: ShaderId,
    kind: ShaderKind,
    handle: ShaderHandle,
    // `None` until the one compile attempt finishes. Held for the whole
    // compile; contenders use `try_lock` and fail.
    compile: Mutex<Option<BuildStatus>>,
}

impl<A: GraphicsApi> Shader<A> {
    /// Create a shader object for one stage
    pub fn new(context: &Arc<RenderContext<A>>, kind: ShaderKind) -> RenderResult<Self> {
        let handle = context
            .api()
            .create_shader(kind)
            .map_err(|message| RenderError::creation("shader", message))?;
        let id = context.links().shaders.insert(ShaderEntry { handle, program: None });
        log::debug!("Created {} shader {}", kind, handle.raw());

        Ok(Self {
            context: Arc::clone(context),
            id,
            kind,
            handle,
            compile: Mutex::new(None),
        })
    }

    /// Arena key of this shader
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Pipeline stage
    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    /// Compile the shader from GLSL source
    ///
    /// Only the first call does any work. The driver's info log is kept and
    /// available from [`Shader::compile_log`] even on success.
    pub fn compile(&self, source: &str) -> Result<(), ShaderError> {
        let mut state = match self.compile.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(ShaderError::CompileInProgress),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        if state.is_some() {
            return Err(ShaderError::AlreadyCompiled);
        }

        let status = self.context.api().compile_shader(self.handle, source);
        let result = if status.success {
            if !status.log.trim().is_empty() {
                log::warn!("{} shader compiled with messages:\n{}", self.kind, status.log);
            }
            log::debug!("Compiled {} shader {}", self.kind, self.handle.raw());
            Ok(())
        } else {
            log::error!("{} shader failed to compile:\n{}", self.kind, status.log);
            Err(ShaderError::CompileFailed { kind: self.kind, log: status.log.clone() })
        };
        *state = Some(status);
        result
    }

    /// Whether the one compile attempt succeeded
    pub fn is_compiled(&self) -> bool {
        match self.compile.try_lock() {
            Ok(state) => state.as_ref().is_some_and(|status| status.success),
            Err(TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().as_ref().is_some_and(|status| status.success)
            }
            Err(TryLockError::WouldBlock) => false,
        }
    }

    /// Driver info log of the compile attempt; empty before it
    pub fn compile_log(&self) -> String {
        let state = self.compile.lock().unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map(|status| status.log.clone()).unwrap_or_default()
    }

    /// Program this shader is attached to, if any
    pub fn program(&self) -> Option<ProgramId> {
        self.context.links().shaders.get(self.id).and_then(|entry| entry.program)
    }

    /// Attach this shader to a program that has not linked yet
    ///
    /// Fails without touching the attach-list when the shader did not
    /// compile, is attached already, or the program has linked.
    pub fn attach(&self, program: &Program<A>) -> Result<(), ShaderError> {
        if !Arc::ptr_eq(&self.context, &program.context) {
            return Err(ShaderError::ForeignContext);
        }
        if !self.is_compiled() {
            return Err(ShaderError::NotCompiled);
        }

        let mut links = self.context.links();
        let links = &mut *links;
        let (Some(shader), Some(target)) =
            (links.shaders.get_mut(self.id), links.programs.get_mut(program.id))
        else {
            return Err(ShaderError::ForeignContext);
        };
        if target.linked {
            return Err(ShaderError::ProgramLinked);
        }
        if shader.program.is_some() {
            return Err(ShaderError::AlreadyAttached);
        }

        self.context.api().attach_shader(target.handle, self.handle);
        target.attached.push(self.id);
        shader.program = Some(program.id);
        log::debug!(
            "Attached {} shader {} to program {}",
            self.kind,
            self.handle.raw(),
            target.handle.raw()
        );
        Ok(())
    }
}

impl<A: GraphicsApi> Drop for Shader<A> {
    fn drop(&mut self) {
        let api = self.context.api();
        {
            let mut links = self.context.links();
            let removed = links.shaders.remove(self.id);
            if let Some(ShaderEntry { program: Some(program), .. }) = removed {
                if let Some(entry) = links.programs.get_mut(program) {
                    entry.attached.retain(|&id| id != self.id);
                    api.detach_shader(entry.handle, self.handle);
                }
            }
        }
        api.delete_shader(self.handle);
        log::debug!("Deleted {} shader {}", self.kind, self.handle.raw());
    }
}

/// Linked combination of shader units
pub struct Program<A: GraphicsApi> {
    context: Arc<RenderContext<A>>,
    id: ProgramId,
    handle: ProgramHandle,
}

impl<A: GraphicsApi> Program<A> {
    /// Create an empty program
    pub fn new(context: &Arc<RenderContext<A>>) -> RenderResult<Self> {
        let handle = context
            .api()
            .create_program()
            .map_err(|message| RenderError::creation("program", message))?;
        let id = context.links().programs.insert(ProgramEntry {
            handle,
            attached: Vec::new(),
            linked: false,
            log: String::new(),
        });
        log::debug!("Created program {}", handle.raw());

        Ok(Self { context: Arc::clone(context), id, handle })
    }

    /// Arena key of this program
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Shaders currently attached, in attach order
    pub fn attached(&self) -> Vec<ShaderId> {
        self.context
            .links()
            .programs
            .get(self.id)
            .map(|entry| entry.attached.clone())
            .unwrap_or_default()
    }

    /// Whether a link has succeeded
    pub fn is_linked(&self) -> bool {
        self.context.links().programs.get(self.id).is_some_and(|entry| entry.linked)
    }

    /// Driver info log of the last link attempt
    pub fn link_log(&self) -> String {
        self.context
            .links()
            .programs
            .get(self.id)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    /// Link the attached shaders
    ///
    /// On success every attached shader is detached and forgets this
    /// program. On failure the shaders stay attached and link may be tried
    /// again.
    pub fn link(&self) -> Result<(), ProgramError> {
        let api = self.context.api();
        let mut links = self.context.links();
        let links = &mut *links;
        let Some(entry) = links.programs.get_mut(self.id) else {
            return Err(ProgramError::NothingAttached);
        };
        if entry.linked {
            return Err(ProgramError::AlreadyLinked);
        }
        if entry.attached.is_empty() {
            return Err(ProgramError::NothingAttached);
        }

        let status = api.link_program(self.handle);
        entry.log.clone_from(&status.log);
        if !status.success {
            log::error!("Program {} failed to link:\n{}", self.handle.raw(), status.log);
            return Err(ProgramError::LinkFailed { log: status.log });
        }

        for shader_id in entry.attached.drain(..) {
            if let Some(shader) = links.shaders.get_mut(shader_id) {
                shader.program = None;
                api.detach_shader(self.handle, shader.handle);
            }
        }
        entry.linked = true;
        log::info!("Linked program {}", self.handle.raw());
        Ok(())
    }

    /// Make this program current for subsequent draws
    pub fn use_program(&self) -> Result<(), ProgramError> {
        if !self.is_linked() {
            return Err(ProgramError::NotLinked);
        }
        self.context.api().use_program(Some(self.handle));
        Ok(())
    }

    /// Look up a uniform by name
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        let location = self.context.api().uniform_location(self.handle, name);
        if location.is_none() {
            log::warn!("Uniform '{}' not found in program {}", name, self.handle.raw());
        }
        location
    }

    /// Write a matrix uniform; the program must be current
    pub fn set_uniform_mat4(&self, location: UniformLocation, value: &Mat4) {
        self.context.api().uniform_mat4(location, &value.to_column_array());
    }
}

impl<A: GraphicsApi> Drop for Program<A> {
    fn drop(&mut self) {
        let api = self.context.api();
        {
            let mut links = self.context.links();
            if let Some(entry) = links.programs.remove(self.id) {
                for shader_id in entry.attached {
                    if let Some(shader) = links.shaders.get_mut(shader_id) {
                        shader.program = None;
                        api.detach_shader(self.handle, shader.handle);
                    }
                }
            }
        }
        api.delete_program(self.handle);
        log::debug!("Deleted program {}", self.handle.raw());
    }
}
