//! CPU terrain mesher: turns a height field into a LOD mesh whose outer ring
//! stitches against neighbours at any other LOD.
#![forbid(unsafe_code)]

mod build;
mod error;
mod layout;
mod mesh_build;
mod normals;

pub use build::build_terrain_mesh;
pub use error::MeshError;
pub use layout::{BufferSizes, VertexIndexMap, VertexKind, VertexSlot};
pub use mesh_build::{MeshPayload, Normals};
pub use normals::face_normal;
