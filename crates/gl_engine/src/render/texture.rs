//! Textured surfaces
//!
//! A [`Texture`] pairs a buffer of `vec2` texture coordinates with a 2D
//! texture object. When drawn it activates texture unit 0, binds the texture
//! and points the sampler uniform at that unit, leaving its coordinate
//! attribute enabled for the mesh drawn after it.

use std::sync::Arc;

use crate::assets::TextureImage;

use super::api::{BufferHandle, BufferTarget, GraphicsApi, TextureHandle, UniformLocation};
use super::context::{DrawCommand, RenderContext};
use super::error::{ObjectError, RenderError, RenderResult};
use super::vao::{ObjectSlot, Renderable, VertexArray};

/// Floats per texture coordinate
const UV_COMPONENTS: usize = 2;

/// Texture coordinates plus the image they sample
pub struct Texture<A: GraphicsApi> {
    slot: ObjectSlot<A>,
    coord_buffer: BufferHandle,
    texture: TextureHandle,
    coords: Vec<f32>,
    // Dropped once uploaded; the texture object keeps the pixels.
    image: Option<TextureImage>,
    uploaded: bool,
}

impl<A: GraphicsApi> Texture<A> {
    /// Create an empty texture feeding the given attribute index
    pub fn new(context: &Arc<RenderContext<A>>, attrib_index: u32) -> RenderResult<Self> {
        let api = context.api();
        let coord_buffer = api
            .create_buffer()
            .map_err(|message| RenderError::creation("texture coordinate buffer", message))?;
        let texture = match api.create_texture() {
            Ok(texture) => texture,
            Err(message) => {
                api.delete_buffer(coord_buffer);
                return Err(RenderError::creation("texture", message));
            }
        };

        let draw = DrawCommand::TexCoords { coords: coord_buffer, texture, sampler: None };
        Ok(Self {
            slot: ObjectSlot::new(context, attrib_index, draw),
            coord_buffer,
            texture,
            coords: Vec::new(),
            image: None,
            uploaded: false,
        })
    }

    /// Replace the image and its per-vertex coordinates
    ///
    /// Fails once the texture is bound.
    pub fn load(&mut self, image: TextureImage, coords: Vec<f32>) -> Result<(), ObjectError> {
        if self.slot.owner().is_some() {
            return Err(ObjectError::AlreadyBound);
        }
        if coords.len() % UV_COMPONENTS != 0 {
            return Err(ObjectError::InvalidData(format!(
                "{} texture coordinate floats is not a multiple of {UV_COMPONENTS}",
                coords.len()
            )));
        }
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ObjectError::InvalidData(format!("empty {width}x{height} image")));
        }

        self.image = Some(image);
        self.coords = coords;
        self.uploaded = false;
        Ok(())
    }

    /// Sampler uniform pointed at texture unit 0 on every render
    pub fn set_sampler_uniform(&self, location: Option<UniformLocation>) {
        self.slot.update_draw(|draw| {
            if let DrawCommand::TexCoords { sampler, .. } = draw {
                *sampler = location;
            }
        });
    }

    /// Number of coordinates loaded
    pub fn coord_count(&self) -> usize {
        self.coords.len() / UV_COMPONENTS
    }

    /// Whether the image has reached the texture object
    pub fn is_uploaded(&self) -> bool {
        self.uploaded
    }

    /// Buffer holding the coordinates
    pub fn coord_buffer(&self) -> BufferHandle {
        self.coord_buffer
    }

    /// The texture object
    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

fn upload_image<A: GraphicsApi>(api: &A, texture: TextureHandle, image: &TextureImage) {
    api.active_texture_unit(0);
    api.bind_texture(Some(texture));
    match image {
        TextureImage::Compressed(dds) => {
            for (level, mip) in (0..).zip(&dds.levels) {
                api.upload_compressed_level(dds.format, level, mip.width, mip.height, &mip.data);
            }
        }
        TextureImage::Rgba(pixels) => api.upload_rgba8(pixels.width, pixels.height, &pixels.data),
    }
}

impl<A: GraphicsApi> Renderable<A> for Texture<A> {
    fn slot(&self) -> &ObjectSlot<A> {
        &self.slot
    }

    fn bind(&mut self, vertex_array: &VertexArray<A>) -> Result<(), ObjectError> {
        if self.coords.is_empty() || (self.image.is_none() && !self.uploaded) {
            return Err(ObjectError::NothingToUpload);
        }
        let (coord_buffer, texture) = (self.coord_buffer, self.texture);
        let coords = &self.coords;
        let image = &mut self.image;
        self.slot.register(vertex_array, |api| {
            api.upload_buffer(BufferTarget::Array, coord_buffer, bytemuck::cast_slice(coords));
            if let Some(image) = image.take() {
                upload_image(api, texture, &image);
            }
        })?;

        self.uploaded = true;
        log::debug!("Uploaded texture: {} coordinates", self.coord_count());
        Ok(())
    }
}

impl<A: GraphicsApi> Drop for Texture<A> {
    fn drop(&mut self) {
        self.slot.unregister();
        let api = self.slot.api();
        api.delete_buffer(self.coord_buffer);
        api.delete_texture(self.texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::dds::tests::build_dds;
    use crate::assets::{DdsImage, ImageData};
    use crate::render::headless::{ApiCall, HeadlessApi};
    use crate::render::Mesh;

    fn checker() -> TextureImage {
        TextureImage::Rgba(ImageData::solid_color(2, 2, [255, 255, 255, 255]))
    }

    #[test]
    fn test_bind_needs_image_and_coords() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut texture = Texture::new(&context, 1).unwrap();
        assert_eq!(texture.bind(&vao), Err(ObjectError::NothingToUpload));

        texture.load(checker(), Vec::new()).unwrap();
        assert_eq!(texture.bind(&vao), Err(ObjectError::NothingToUpload));
    }

    #[test]
    fn test_odd_coordinates_rejected() {
        let context = RenderContext::new(HeadlessApi::new());
        let mut texture = Texture::new(&context, 1).unwrap();
        let result = texture.load(checker(), vec![0.0; 3]);
        assert!(matches!(result, Err(ObjectError::InvalidData(_))));
    }

    #[test]
    fn test_compressed_levels_uploaded_in_order() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut texture = Texture::new(&context, 1).unwrap();
        let dds = DdsImage::decode(&build_dds(b"DXT5", 8, 8, 4, 16 * 4 + 16 + 16 + 16)).unwrap();
        let levels = dds.levels.len();
        texture.load(TextureImage::Compressed(dds), vec![0.0; 6]).unwrap();
        context.api().clear_calls();

        texture.bind(&vao).unwrap();

        let uploads: Vec<ApiCall> = context
            .api()
            .calls()
            .into_iter()
            .filter(|call| matches!(call, ApiCall::UploadCompressedLevel(..)))
            .collect();
        assert_eq!(uploads.len(), levels);
        let base = ApiCall::UploadCompressedLevel(crate::assets::BlockFormat::Dxt5, 0, 8, 8);
        assert_eq!(uploads[0], base);
        assert!(texture.is_uploaded());
    }

    #[test]
    fn test_image_uploaded_once_across_rebinds() {
        let context = RenderContext::new(HeadlessApi::new());
        let first = VertexArray::new(&context).unwrap();
        let second = VertexArray::new(&context).unwrap();
        let mut texture = Texture::new(&context, 1).unwrap();
        texture.load(checker(), vec![0.0; 6]).unwrap();

        texture.bind(&first).unwrap();
        assert_eq!(texture.bind(&second), Err(ObjectError::AlreadyBound));
        assert!(texture.unbind());
        texture.bind(&second).unwrap();

        let rgba_uploads = context
            .api()
            .calls()
            .iter()
            .filter(|call| matches!(call, ApiCall::UploadRgba8(2, 2)))
            .count();
        assert_eq!(rgba_uploads, 1);
        assert_eq!(texture.owner(), Some(second.id()));
        assert!(first.members().is_empty());
    }

    #[test]
    fn test_render_samples_unit_zero() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut texture = Texture::new(&context, 1).unwrap();
        texture.load(checker(), vec![0.0; 6]).unwrap();
        texture.set_sampler_uniform(Some(UniformLocation(7)));
        texture.bind(&vao).unwrap();
        context.api().clear_calls();

        texture.render().unwrap();

        let calls = context.api().calls();
        assert_eq!(calls[0], ApiCall::ActiveTextureUnit(0));
        assert_eq!(calls[1], ApiCall::BindTexture(Some(texture.texture())));
        assert_eq!(calls[2], ApiCall::UniformI32(UniformLocation(7), 0));
        assert!(calls.contains(&ApiCall::VertexAttribPointer(1, 2)));
        assert_eq!(context.api().enabled_attribs(), vec![1]);
    }

    #[test]
    fn test_vertex_array_renders_members_in_bind_order() {
        let context = RenderContext::new(HeadlessApi::new());
        let vao = VertexArray::new(&context).unwrap();
        let mut texture = Texture::new(&context, 1).unwrap();
        texture.load(checker(), vec![0.0; 6]).unwrap();
        let mut mesh = Mesh::new(&context, 0).unwrap();
        mesh.load(vec![0.0; 9], vec![0, 1, 2]).unwrap();

        texture.bind(&vao).unwrap();
        mesh.bind(&vao).unwrap();
        context.api().clear_calls();

        assert_eq!(vao.render(), 2);

        let calls = context.api().calls();
        let bind_texture =
            calls.iter().position(|c| matches!(c, ApiCall::BindTexture(Some(_)))).unwrap();
        let draw = calls.iter().position(|c| matches!(c, ApiCall::DrawTriangles(3))).unwrap();
        assert!(bind_texture < draw);
        assert_eq!(calls.last(), Some(&ApiCall::DisableVertexAttrib(0)));
        assert!(context.api().enabled_attribs().is_empty());
    }
}
