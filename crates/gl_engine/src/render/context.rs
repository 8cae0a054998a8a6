//! Shared render context and the relation arena
//!
//! Every render object holds an `Arc<RenderContext<A>>`. Besides the graphics
//! API, the context owns two slot-map tables holding *both* sides of each
//! back-reference:
//!
//! - `LinkTable`: shader → program back-references and each program's
//!   ordered attach-list
//! - `MemberTable`: object → vertex-array back-references and each vertex
//!   array's ordered member list
//!
//! A relation is only ever changed with its table locked, so the two sides
//! cannot disagree.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::foundation::collections::{ObjectId, ProgramId, ShaderId, SlotMap, VertexArrayId};

use super::api::{
    BufferHandle, BufferTarget, GraphicsApi, ProgramHandle, ShaderHandle, TextureHandle,
    UniformLocation,
    VertexArrayHandle,
};

/// Arena entry of a shader unit
pub(crate) struct ShaderEntry {
    pub(crate) handle: ShaderHandle,
    pub(crate) program: Option<ProgramId>,
}

/// Arena entry of a program
pub(crate) struct ProgramEntry {
    pub(crate) handle: ProgramHandle,
    pub(crate) attached: Vec<ShaderId>,
    pub(crate) linked: bool,
    pub(crate) log: String,
}

#[derive(Default)]
pub(crate) struct LinkTable {
    pub(crate) shaders: SlotMap<ShaderId, ShaderEntry>,
    pub(crate) programs: SlotMap<ProgramId, ProgramEntry>,
}

/// Arena entry of a vertex array
pub(crate) struct ArrayEntry {
    pub(crate) handle: VertexArrayHandle,
    pub(crate) members: Vec<ObjectId>,
}

/// Arena entry of a renderable object
pub(crate) struct ObjectEntry {
    pub(crate) owner: Option<VertexArrayId>,
    pub(crate) attrib_index: u32,
    pub(crate) draw: DrawCommand,
}

#[derive(Default)]
pub(crate) struct MemberTable {
    pub(crate) arrays: SlotMap<VertexArrayId, ArrayEntry>,
    pub(crate) objects: SlotMap<ObjectId, ObjectEntry>,
}

/// What a renderable object does when drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawCommand {
    /// Indexed triangles from a position buffer
    Elements {
        vertices: BufferHandle,
        elements: BufferHandle,
        index_count: i32,
    },
    /// Texture coordinates feeding a sampler on unit 0
    TexCoords {
        coords: BufferHandle,
        texture: TextureHandle,
        sampler: Option<UniformLocation>,
    },
}

impl DrawCommand {
    /// Issue the draw calls for one object
    ///
    /// Leaves the attribute array of `attrib_index` enabled for texture
    /// coordinates, so the following element draw can sample them.
    pub(crate) fn issue<A: GraphicsApi>(&self, api: &A, attrib_index: u32) {
        match *self {
            Self::Elements { vertices, elements, index_count } => {
                api.enable_vertex_attrib(attrib_index);
                api.bind_buffer(BufferTarget::Array, Some(vertices));
                api.vertex_attrib_pointer(attrib_index, 3);
                api.bind_buffer(BufferTarget::ElementArray, Some(elements));
                api.draw_triangles(index_count);
                api.disable_vertex_attrib(attrib_index);
            }
            Self::TexCoords { coords, texture, sampler } => {
                api.active_texture_unit(0);
                api.bind_texture(Some(texture));
                if let Some(sampler) = sampler {
                    api.uniform_i32(sampler, 0);
                }
                api.bind_buffer(BufferTarget::Array, Some(coords));
                api.enable_vertex_attrib(attrib_index);
                api.vertex_attrib_pointer(attrib_index, 2);
            }
        }
    }
}

/// Graphics API plus the relation arena, shared by every render object
pub struct RenderContext<A: GraphicsApi> {
    api: A,
    links: Mutex<LinkTable>,
    members: Mutex<MemberTable>,
}

impl<A: GraphicsApi> RenderContext<A> {
    /// Wrap a graphics API in a new shared context
    pub fn new(api: A) -> Arc<Self> {
        log::debug!("Creating render context");
        Arc::new(Self {
            api,
            links: Mutex::new(LinkTable::default()),
            members: Mutex::new(MemberTable::default()),
        })
    }

    /// The graphics API, for frame-level state (clear, viewport, ...)
    pub fn api(&self) -> &A {
        &self.api
    }

    // A panic while a table was locked leaves the table itself consistent:
    // every mutation is a single push/retain/assignment.
    pub(crate) fn links(&self) -> MutexGuard<'_, LinkTable> {
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn members(&self) -> MutexGuard<'_, MemberTable> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live shaders and programs in the arena
    pub fn link_counts(&self) -> (usize, usize) {
        let links = self.links();
        (links.shaders.len(), links.programs.len())
    }

    /// Number of live vertex arrays and renderable objects in the arena
    pub fn member_counts(&self) -> (usize, usize) {
        let members = self.members();
        (members.arrays.len(), members.objects.len())
    }
}
