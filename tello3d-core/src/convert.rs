//! Conversion from a geometry mesh to a renderer-ready mesh
use nalgebra::{Point3, Vector3};

use crate::geometry::TriangleMesh;
use crate::render::RenderMesh;

/// Copy of `mesh` with freshly computed angle-weighted vertex normals.
/// The input is left untouched.
pub fn with_computed_normals(mesh: &TriangleMesh) -> TriangleMesh {
    let mut mesh = mesh.clone();
    mesh.compute_vertex_normals();
    mesh
}

/// Snapshot the four vertex arrays of `mesh` at render precision.
/// Normals are copied as they are; call [`with_computed_normals`] first.
pub fn to_render_mesh(mesh: &TriangleMesh) -> RenderMesh {
    RenderMesh::new(
        mesh.vertices.iter().map(point_to_f32).collect(),
        mesh.vertex_colors.iter().map(vector_to_f32).collect(),
        mesh.triangles.clone(),
        mesh.vertex_normals.iter().map(vector_to_f32).collect(),
    )
}

/// Compute vertex normals and convert to a [`RenderMesh`]
pub fn convert(mesh: &TriangleMesh) -> RenderMesh {
    to_render_mesh(&with_computed_normals(mesh))
}

fn point_to_f32(p: &Point3<f64>) -> [f32; 3] {
    [p.x as f32, p.y as f32, p.z as f32]
}

fn vector_to_f32(v: &Vector3<f64>) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}
