//! Indexed triangle meshes
//!
//! A [`Mesh`] owns a vertex buffer of tightly packed `vec3` positions and an
//! element buffer of `u32` triangle indices. Data is kept on the CPU until
//! [`Renderable::bind`] uploads it with the vertex array bound.

use std::sync::Arc;

use crate::assets::MeshData;

use super::api::{BufferHandle, BufferTarget, GraphicsApi};
use super::context::{DrawCommand, RenderContext};
use super::error::{ObjectError, RenderError, RenderResult};
use super::vao::{ObjectSlot, Renderable, VertexArray};

/// Floats per position
const POSITION_COMPONENTS: usize = 3;

/// Triangle geometry bound to a vertex array
pub struct Mesh<A: GraphicsApi> {
    slot: ObjectSlot<A>,
    vertex_buffer: BufferHandle,
    element_buffer: BufferHandle,
    positions: Vec<f32>,
    indices: Vec<u32>,
}

impl<A: GraphicsApi> Mesh<A> {
    /// Create an empty mesh feeding the given attribute index
    pub fn new(context: &Arc<RenderContext<A>>, attrib_index: u32) -> RenderResult<Self> {
        let api = context.api();
        let vertex_buffer = api
            .create_buffer()
            .map_err(|message| RenderError::creation("vertex buffer", message))?;
        let element_buffer = match api.create_buffer() {
            Ok(buffer) => buffer,
            Err(message) => {
                api.delete_buffer(vertex_buffer);
                return Err(RenderError::creation("element buffer", message));
            }
        };

        let draw = DrawCommand::Elements {
            vertices: vertex_buffer,
            elements: element_buffer,
            index_count: 0,
        };
        Ok(Self {
            slot: ObjectSlot::new(context, attrib_index, draw),
            vertex_buffer,
            element_buffer,
            positions: Vec::new(),
            indices: Vec::new(),
        })
    }

    /// Create a mesh from decoded model data
    pub fn from_mesh_data(
        context: &Arc<RenderContext<A>>,
        data: &MeshData,
        attrib_index: u32,
    ) -> RenderResult<Self> {
        let mut mesh = Self::new(context, attrib_index)?;
        mesh.load(data.positions.clone(), data.indices.clone())?;
        Ok(mesh)
    }

    /// Replace the CPU-side geometry
    ///
    /// `positions` holds three floats per vertex and every index must name
    /// one of those vertices. Fails once the mesh is bound.
    pub fn load(&mut self, positions: Vec<f32>, indices: Vec<u32>) -> Result<(), ObjectError> {
        if self.slot.owner().is_some() {
            return Err(ObjectError::AlreadyBound);
        }
        if positions.len() % POSITION_COMPONENTS != 0 {
            return Err(ObjectError::InvalidData(format!(
                "{} position floats is not a multiple of {POSITION_COMPONENTS}",
                positions.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(ObjectError::InvalidData(format!(
                "{} indices do not form whole triangles",
                indices.len()
            )));
        }
        let vertex_count = positions.len() / POSITION_COMPONENTS;
        if let Some(&index) = indices.iter().find(|&&index| index as usize >= vertex_count) {
            return Err(ObjectError::InvalidData(format!(
                "index {index} out of range for {vertex_count} vertices"
            )));
        }
        let index_count = i32::try_from(indices.len())
            .map_err(|_| {
                ObjectError::InvalidData(format!("{} indices exceed a draw call", indices.len()))
            })?;

        self.slot.update_draw(|draw| {
            if let DrawCommand::Elements { index_count: count, .. } = draw {
                *count = index_count;
            }
        });
        self.positions = positions;
        self.indices = indices;
        Ok(())
    }

    /// Number of vertices loaded
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    /// Number of indices drawn per render
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Buffer holding the positions
    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer
    }

    /// Buffer holding the indices
    pub fn element_buffer(&self) -> BufferHandle {
        self.element_buffer
    }
}

impl<A: GraphicsApi> Renderable<A> for Mesh<A> {
    fn slot(&self) -> &ObjectSlot<A> {
        &self.slot
    }

    fn bind(&mut self, vertex_array: &VertexArray<A>) -> Result<(), ObjectError> {
        if self.positions.is_empty() || self.indices.is_empty() {
            return Err(ObjectError::NothingToUpload);
        }
        let (vertex_buffer, element_buffer) = (self.vertex_buffer, self.element_buffer);
        let (positions, indices) = (&self.positions, &self.indices);
        self.slot.register(vertex_array, |api| {
            api.upload_buffer(BufferTarget::Array, vertex_buffer, bytemuck::cast_slice(positions));
            let bytes = bytemuck::cast_slice(indices);
            api.upload_buffer(BufferTarget::ElementArray, element_buffer, bytes);
        })?;
        log::debug!(
            "Uploaded mesh: {} vertices, {} indices",
            self.vertex_count(),
            self.index_count()
        );
        Ok(())
    }
}

impl<A: GraphicsApi> Drop for Mesh<A> {
    fn drop(&mut self) {
        self.slot.unregister();
        let api = self.slot.api();
        api.delete_buffer(self.vertex_buffer);
        api.delete_buffer(self.element_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::headless::{ApiCall, HeadlessApi};

    fn triangle() -> (Vec<f32>, Vec<u32>) {
        (vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
    }

    #[test]
    fn test_load_validates_geometry() {
        let context = RenderContext::new(HeadlessApi::new());
        let mut mesh = Mesh::new(&context, 0).unwrap();

        assert!(matches!(mesh.load(vec![0.0; 4], vec![]), Err(ObjectError::InvalidData(_))));
        assert!(matches!(mesh.load(vec![0.0; 9], vec![0, 1]), Err(ObjectError::InvalidData(_))));
        assert!(matches!(mesh.load(vec![0.0; 9], vec![0, 1, 3]), Err(ObjectError::InvalidData(_))));

        let (positions, indices) = triangle();
        mesh.load(positions, indices).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    fn test_bind_needs_data() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();

        assert_eq!(mesh.bind(&vao), Err(ObjectError::NothingToUpload));
        assert!(vao.members().is_empty());
        assert_eq!(mesh.owner(), None);
    }

    #[test]
    fn test_bind_uploads_with_vertex_array_bound() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();
        let (positions, indices) = triangle();
        mesh.load(positions.clone(), indices).unwrap();
        context.api().clear_calls();

        mesh.bind(&vao).unwrap();

        let calls = context.api().calls();
        assert!(matches!(calls[0], ApiCall::BindVertexArray(Some(_))));
        assert_eq!(calls[1], ApiCall::UploadBuffer(BufferTarget::Array, mesh.vertex_buffer(), 36));
        let elements = mesh.element_buffer();
        assert_eq!(calls[2], ApiCall::UploadBuffer(BufferTarget::ElementArray, elements, 12));
        let uploaded = context.api().buffer_data(mesh.vertex_buffer()).unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<f32, u8>(&positions));
        assert_eq!(mesh.owner(), Some(vao.id()));
        assert_eq!(vao.members(), vec![mesh.id()]);
    }

    #[test]
    fn test_render_draws_index_count() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();
        mesh.load(vec![0.0; 12], vec![0, 1, 2, 2, 1, 3]).unwrap();

        assert_eq!(mesh.render(), Err(ObjectError::NotBound));

        mesh.bind(&vao).unwrap();
        context.api().clear_calls();
        mesh.render().unwrap();

        let calls = context.api().calls();
        assert!(calls.contains(&ApiCall::VertexAttribPointer(0, 3)));
        assert!(calls.contains(&ApiCall::DrawTriangles(6)));
        assert!(context.api().enabled_attribs().is_empty());
    }

    #[test]
    fn test_load_after_bind_is_rejected() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();
        let (positions, indices) = triangle();
        mesh.load(positions.clone(), indices.clone()).unwrap();
        mesh.bind(&vao).unwrap();

        assert_eq!(mesh.load(positions, indices), Err(ObjectError::AlreadyBound));
    }

    #[test]
    fn test_drop_unregisters_before_releasing_buffers() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();
        let (positions, indices) = triangle();
        mesh.load(positions, indices).unwrap();
        mesh.bind(&vao).unwrap();

        drop(mesh);

        assert!(vao.members().is_empty());
        assert_eq!(context.member_counts(), (1, 0));
        assert_eq!(context.api().live_objects(), 1);
    }

    #[test]
    fn test_from_mesh_data() {
        let context = RenderContext::new(HeadlessApi::new());
        let data = crate::assets::ObjLoader::parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        let mesh = Mesh::from_mesh_data(&context, &data, 0).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
    }
}
