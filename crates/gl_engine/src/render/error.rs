//! Render core errors
//!
//! Every expected failure of the shader/program protocol and of the
//! renderable/vertex-array relation is its own variant, so callers can tell
//! "already linked" from "nothing to link".

use thiserror::Error;

use super::ShaderKind;

/// Result alias for render core construction
pub type RenderResult<T> = Result<T, RenderError>;

/// Top-level render core error
#[derive(Error, Debug)]
pub enum RenderError {
    /// The graphics API could not create an object
    #[error("Failed to create {what}: {message}")]
    Creation {
        /// Kind of object
        what: &'static str,
        /// Driver message
        message: String,
    },

    /// Shader protocol failure
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// Program protocol failure
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Renderable object failure
    #[error(transparent)]
    Object(#[from] ObjectError),
}

impl RenderError {
    pub(crate) fn creation(what: &'static str, message: String) -> Self {
        Self::Creation { what, message }
    }
}

/// Shader compile/attach failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// A compile was already attempted on this shader
    #[error("Shader was already compiled")]
    AlreadyCompiled,

    /// Another thread is compiling this shader right now
    #[error("Shader compile already in progress")]
    CompileInProgress,

    /// The driver rejected the source
    #[error("{kind} shader failed to compile:\n{log}")]
    CompileFailed {
        /// Stage of the failing shader
        kind: ShaderKind,
        /// Driver info log
        log: String,
    },

    /// Attach needs a successfully compiled shader
    #[error("Shader has not compiled successfully")]
    NotCompiled,

    /// The shader is attached to a program already
    #[error("Shader is already attached to a program")]
    AlreadyAttached,

    /// The target program has linked and takes no more shaders
    #[error("Program is already linked")]
    ProgramLinked,

    /// Shader and program belong to different render contexts
    #[error("Shader and program belong to different render contexts")]
    ForeignContext,
}

/// Program link/use failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgramError {
    /// Link called with an empty attach list
    #[error("No shaders attached to link")]
    NothingAttached,

    /// Link called on a program that linked successfully before
    #[error("Program is already linked")]
    AlreadyLinked,

    /// The driver rejected the link
    #[error("Program failed to link:\n{log}")]
    LinkFailed {
        /// Driver info log
        log: String,
    },

    /// Use called before a successful link
    #[error("Program has not linked successfully")]
    NotLinked,
}

/// Renderable object bind/render failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The object already belongs to a vertex array
    #[error("Object is already bound to a vertex array")]
    AlreadyBound,

    /// Render called on an object with no vertex array
    #[error("Object is not bound to a vertex array")]
    NotBound,

    /// Bind called before any data was loaded
    #[error("Object has no data to upload")]
    NothingToUpload,

    /// Loaded data is malformed
    #[error("Invalid object data: {0}")]
    InvalidData(String),

    /// Object and vertex array belong to different render contexts
    #[error("Object and vertex array belong to different render contexts")]
    ForeignContext,
}
