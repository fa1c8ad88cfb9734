//! tello3d core library - mesh geometry, normals and asset normalization
//!
//! This library provides the stateless pieces needed to get the DJI Tello
//! drone model on screen: a PLY reader, triangle mesh transforms, vertex
//! normal computation and conversion into a renderer-ready mesh.

pub mod asset;
pub mod convert;
pub mod error;
pub mod geometry;
pub mod normals;
pub mod ply;
pub mod render;
pub mod transform;

// Re-export commonly used types
pub use asset::{load_normalized_asset, load_normalized_asset_from, NormalizeConfig};
pub use convert::{convert, to_render_mesh, with_computed_normals};
pub use error::{AssetError, PlyError};
pub use geometry::{Aabb, TriangleMesh};
pub use normals::NormalWeighting;
pub use render::RenderMesh;
pub use transform::{rotation_from_axis_angle, EulerAngles};
