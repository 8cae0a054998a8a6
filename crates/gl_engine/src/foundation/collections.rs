//! Stable keys for the render relation arena
//!
//! Every shader, program, vertex array and renderable object is registered in
//! a slot map owned by the `RenderContext`. Members refer to their owner by
//! key, so a released owner turns into a failed lookup instead of a dangling
//! reference.

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Key of a shader unit in the relation arena
    pub struct ShaderId;
    /// Key of a program in the relation arena
    pub struct ProgramId;
    /// Key of a vertex-array aggregate in the relation arena
    pub struct VertexArrayId;
    /// Key of a renderable object in the relation arena
    pub struct ObjectId;
}
