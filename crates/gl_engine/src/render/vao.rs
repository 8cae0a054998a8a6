//! Vertex arrays and the renderable objects bound to them
//!
//! A [`VertexArray`] keeps an ordered list of member objects; each member
//! records which vertex array it belongs to. Both sides live in the
//! context's member table, so binding, unbinding and dropping either side
//! always update them together.

use std::sync::Arc;

use crate::foundation::collections::{ObjectId, VertexArrayId};

use super::api::{GraphicsApi, VertexArrayHandle};
use super::context::{ArrayEntry, DrawCommand, ObjectEntry, RenderContext};
use super::error::{ObjectError, RenderError, RenderResult};

/// A vertex array object aggregating renderable members
pub struct VertexArray<A: GraphicsApi> {
    context: Arc<RenderContext<A>>,
    id: VertexArrayId,
    handle: VertexArrayHandle,
}

impl<A: GraphicsApi> VertexArray<A> {
    /// Create an empty vertex array
    pub fn new(context: &Arc<RenderContext<A>>) -> RenderResult<Self> {
        let handle = context
            .api()
            .create_vertex_array()
            .map_err(|message| RenderError::creation("vertex array", message))?;
        let id = context.members().arrays.insert(ArrayEntry { handle, members: Vec::new() });
        log::debug!("Created vertex array {}", handle.raw());

        Ok(Self { context: Arc::clone(context), id, handle })
    }

    /// Arena key of this vertex array
    pub fn id(&self) -> VertexArrayId {
        self.id
    }

    /// Make this vertex array current
    pub fn bind(&self) {
        self.context.api().bind_vertex_array(Some(self.handle));
    }

    /// Members in bind order
    pub fn members(&self) -> Vec<ObjectId> {
        self.context
            .members()
            .arrays
            .get(self.id)
            .map(|entry| entry.members.clone())
            .unwrap_or_default()
    }

    /// Draw every member in bind order
    ///
    /// Enables each member's attribute index before drawing it and disables
    /// all of them afterwards. Returns the number of members drawn.
    pub fn render(&self) -> usize {
        let api = self.context.api();
        api.bind_vertex_array(Some(self.handle));

        let commands: Vec<(u32, DrawCommand)> = {
            let members = self.context.members();
            members
                .arrays
                .get(self.id)
                .map(|array| {
                    array
                        .members
                        .iter()
                        .filter_map(|&id| members.objects.get(id))
                        .map(|object| (object.attrib_index, object.draw))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (attrib_index, draw) in &commands {
            api.enable_vertex_attrib(*attrib_index);
            draw.issue(api, *attrib_index);
        }
        for (attrib_index, _) in &commands {
            api.disable_vertex_attrib(*attrib_index);
        }
        commands.len()
    }

    pub(crate) fn context(&self) -> &Arc<RenderContext<A>> {
        &self.context
    }
}

impl<A: GraphicsApi> Drop for VertexArray<A> {
    fn drop(&mut self) {
        {
            let mut members = self.context.members();
            if let Some(entry) = members.arrays.remove(self.id) {
                for id in entry.members {
                    if let Some(object) = members.objects.get_mut(id) {
                        object.owner = None;
                    }
                }
            }
        }
        self.context.api().delete_vertex_array(self.handle);
        log::debug!("Deleted vertex array {}", self.handle.raw());
    }
}

/// Arena membership shared by every renderable object
///
/// Dropping the slot unregisters the object. Variants that own buffers call
/// [`ObjectSlot::unregister`] themselves first, so the vertex array never
/// lists an object whose buffers are gone.
pub struct ObjectSlot<A: GraphicsApi> {
    context: Arc<RenderContext<A>>,
    id: ObjectId,
}

impl<A: GraphicsApi> ObjectSlot<A> {
    pub(crate) fn new(
        context: &Arc<RenderContext<A>>,
        attrib_index: u32,
        draw: DrawCommand,
    ) -> Self {
        let id = context.members().objects.insert(ObjectEntry { owner: None, attrib_index, draw });
        Self { context: Arc::clone(context), id }
    }

    /// Arena key of the object
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Vertex array the object is bound to
    pub fn owner(&self) -> Option<VertexArrayId> {
        self.context.members().objects.get(self.id).and_then(|entry| entry.owner)
    }

    /// Vertex attribute index the object feeds
    pub fn attrib_index(&self) -> u32 {
        self.context.members().objects.get(self.id).map_or(0, |entry| entry.attrib_index)
    }

    /// Change the vertex attribute index
    pub fn set_attrib_index(&self, index: u32) {
        if let Some(entry) = self.context.members().objects.get_mut(self.id) {
            entry.attrib_index = index;
        }
    }

    pub(crate) fn api(&self) -> &A {
        self.context.api()
    }

    pub(crate) fn update_draw(&self, update: impl FnOnce(&mut DrawCommand)) {
        if let Some(entry) = self.context.members().objects.get_mut(self.id) {
            update(&mut entry.draw);
        }
    }

    /// Register with a vertex array, running `upload` while it is bound
    pub(crate) fn register(
        &self,
        vertex_array: &VertexArray<A>,
        upload: impl FnOnce(&A),
    ) -> Result<(), ObjectError> {
        if !Arc::ptr_eq(&self.context, vertex_array.context()) {
            return Err(ObjectError::ForeignContext);
        }

        let mut members = self.context.members();
        let members = &mut *members;
        let (Some(object), Some(array)) =
            (members.objects.get_mut(self.id), members.arrays.get_mut(vertex_array.id))
        else {
            return Err(ObjectError::ForeignContext);
        };
        if object.owner.is_some() {
            return Err(ObjectError::AlreadyBound);
        }

        let api = self.context.api();
        api.bind_vertex_array(Some(array.handle));
        upload(api);

        array.members.push(self.id);
        object.owner = Some(vertex_array.id);
        log::debug!(
            "Bound object to vertex array {} ({} members)",
            array.handle.raw(),
            array.members.len()
        );
        Ok(())
    }

    /// Leave the owning vertex array; returns whether anything was removed
    pub fn unregister(&self) -> bool {
        let mut members = self.context.members();
        let members = &mut *members;
        let Some(object) = members.objects.get_mut(self.id) else {
            return false;
        };
        let Some(owner) = object.owner.take() else {
            return false;
        };
        if let Some(array) = members.arrays.get_mut(owner) {
            array.members.retain(|&id| id != self.id);
        }
        true
    }

    /// Issue this object's draw calls
    pub fn render(&self) -> Result<(), ObjectError> {
        let (attrib_index, draw) = {
            let members = self.context.members();
            match members.objects.get(self.id) {
                Some(ObjectEntry { owner: Some(_), attrib_index, draw }) => (*attrib_index, *draw),
                _ => return Err(ObjectError::NotBound),
            }
        };
        draw.issue(self.context.api(), attrib_index);
        Ok(())
    }
}

impl<A: GraphicsApi> Drop for ObjectSlot<A> {
    fn drop(&mut self) {
        self.unregister();
        self.context.members().objects.remove(self.id);
    }
}

/// Something that can be bound to a [`VertexArray`] and drawn
pub trait Renderable<A: GraphicsApi> {
    /// Arena membership of this object
    fn slot(&self) -> &ObjectSlot<A>;

    /// Upload data and register with a vertex array
    ///
    /// Fails when already bound (to this or any other vertex array) or when
    /// nothing was loaded.
    fn bind(&mut self, vertex_array: &VertexArray<A>) -> Result<(), ObjectError>;

    /// Issue the draw calls; fails when unbound
    fn render(&self) -> Result<(), ObjectError> {
        self.slot().render()
    }

    /// Leave the owning vertex array; returns whether anything was removed
    fn unbind(&self) -> bool {
        self.slot().unregister()
    }

    /// Arena key
    fn id(&self) -> ObjectId {
        self.slot().id()
    }

    /// Vertex array this object is bound to
    fn owner(&self) -> Option<VertexArrayId> {
        self.slot().owner()
    }

    /// Vertex attribute index this object feeds
    fn attrib_index(&self) -> u32 {
        self.slot().attrib_index()
    }

    /// Change the vertex attribute index
    fn set_attrib_index(&self, index: u32) {
        self.slot().set_attrib_index(index);
    }
}
