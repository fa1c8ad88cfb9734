//! Triangle mesh container and the in-place transforms used by the asset pipeline
use nalgebra::{Point3, Rotation3, Vector3};

use crate::normals::{self, NormalWeighting};

/// Axis-aligned bounding box of a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn diagonal_length(&self) -> f64 {
        self.extent().norm()
    }
}

/// An indexed triangle mesh with optional per-vertex colors and normals.
///
/// `vertex_colors` and `vertex_normals` are either empty or hold exactly one
/// entry per vertex. Colors are RGB in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f64>>,
    pub vertex_colors: Vec<Vector3<f64>>,
    pub vertex_normals: Vec<Vector3<f64>>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            vertex_colors: Vec::new(),
            vertex_normals: Vec::new(),
            triangles,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Vector3<f64>>) -> Self {
        self.vertex_colors = colors;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_vertices(&self) -> bool {
        !self.vertices.is_empty()
    }

    pub fn has_triangles(&self) -> bool {
        self.has_vertices() && !self.triangles.is_empty()
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.has_vertices() && self.vertex_colors.len() == self.vertices.len()
    }

    pub fn has_vertex_normals(&self) -> bool {
        self.has_vertices() && self.vertex_normals.len() == self.vertices.len()
    }

    /// Mean of the vertex positions. The origin for an empty mesh.
    pub fn get_center(&self) -> Point3<f64> {
        if self.vertices.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.vertices.len() as f64)
    }

    pub fn get_axis_aligned_bounding_box(&self) -> Option<Aabb> {
        let first = *self.vertices.first()?;
        let bounds = self.vertices.iter().fold(
            Aabb {
                min: first,
                max: first,
            },
            |bounds, p| Aabb {
                min: bounds.min.inf(p),
                max: bounds.max.sup(p),
            },
        );
        Some(bounds)
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) -> &mut Self {
        for p in &mut self.vertices {
            *p += *offset;
        }
        self
    }

    /// Uniformly scale positions about `center`
    pub fn scale(&mut self, factor: f64, center: &Point3<f64>) -> &mut Self {
        for p in &mut self.vertices {
            *p = center + (*p - center) * factor;
        }
        self
    }

    /// Rotate positions about `center`. Normals rotate with the mesh.
    pub fn rotate(&mut self, rotation: &Rotation3<f64>, center: &Point3<f64>) -> &mut Self {
        for p in &mut self.vertices {
            *p = center + rotation * (*p - center);
        }
        for n in &mut self.vertex_normals {
            *n = rotation * *n;
        }
        self
    }

    pub fn paint_uniform_color(&mut self, color: Vector3<f64>) -> &mut Self {
        self.vertex_colors = vec![color; self.vertices.len()];
        self
    }

    /// Replace the vertex normals with angle-weighted ones
    pub fn compute_vertex_normals(&mut self) -> &mut Self {
        self.compute_vertex_normals_with(NormalWeighting::Angle)
    }

    pub fn compute_vertex_normals_with(&mut self, weighting: NormalWeighting) -> &mut Self {
        self.vertex_normals = normals::vertex_normals(&self.vertices, &self.triangles, weighting);
        self
    }

    /// Axis-aligned cube centered at the origin with 8 shared vertices and
    /// counter-clockwise (outward) winding.
    pub fn cube(size: f64) -> Self {
        let half = size / 2.0;
        // Vertex i has +x when bit 0 is set, +y for bit 1, +z for bit 2
        let vertices = (0..8u32)
            .map(|i| {
                let axis = |bit: u32| if i & bit != 0 { half } else { -half };
                Point3::new(axis(1), axis(2), axis(4))
            })
            .collect();

        let triangles = vec![
            // Front (+z)
            [4, 5, 7],
            [4, 7, 6],
            // Back (-z)
            [0, 2, 3],
            [0, 3, 1],
            // Top (+y)
            [2, 6, 7],
            [2, 7, 3],
            // Bottom (-y)
            [0, 1, 5],
            [0, 5, 4],
            // Right (+x)
            [1, 3, 7],
            [1, 7, 5],
            // Left (-x)
            [0, 4, 6],
            [0, 6, 2],
        ];

        Self::new(vertices, triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_center_is_vertex_mean() {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 6.0, 0.0),
                Point3::new(0.0, 0.0, 9.0),
            ],
            vec![],
        );
        let center = mesh.get_center();
        assert!((center - Point3::new(0.75, 1.5, 2.25)).norm() < 1e-12);
    }

    #[test]
    fn test_center_of_empty_mesh() {
        assert_eq!(TriangleMesh::default().get_center(), Point3::origin());
        assert!(TriangleMesh::default()
            .get_axis_aligned_bounding_box()
            .is_none());
    }

    #[test]
    fn test_bounding_box() {
        let mut mesh = TriangleMesh::cube(2.0);
        mesh.translate(&Vector3::new(1.0, 2.0, 3.0));
        let aabb = mesh.get_axis_aligned_bounding_box().unwrap();
        assert_eq!(aabb.min, Point3::new(0.0, 1.0, 2.0));
        assert_eq!(aabb.max, Point3::new(2.0, 3.0, 4.0));
        assert_eq!(aabb.center(), Point3::new(1.0, 2.0, 3.0));
        assert!((aabb.diagonal_length() - 12f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_scale_about_point() {
        let mut mesh = TriangleMesh::new(vec![Point3::new(3.0, 3.0, 3.0)], vec![]);
        mesh.scale(0.5, &Point3::new(1.0, 1.0, 1.0));
        assert!((mesh.vertices[0] - Point3::new(2.0, 2.0, 2.0)).norm() < 1e-12);
    }

    #[test]
    fn test_rotate_moves_normals() {
        let mut mesh = TriangleMesh::new(vec![Point3::new(0.0, 1.0, 0.0)], vec![]);
        mesh.vertex_normals = vec![Vector3::new(0.0, 0.0, 1.0)];
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), PI);
        mesh.rotate(&rotation, &Point3::origin());

        assert!((mesh.vertices[0] - Point3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
        assert!((mesh.vertex_normals[0] - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_paint_uniform_color() {
        let mut mesh = TriangleMesh::cube(1.0);
        mesh.paint_uniform_color(Vector3::new(0.0, 1.0, 1.0));
        assert!(mesh.has_vertex_colors());
        assert!(mesh
            .vertex_colors
            .iter()
            .all(|c| *c == Vector3::new(0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let mut mesh = TriangleMesh::cube(2.0);
        mesh.compute_vertex_normals();
        assert!(mesh.has_vertex_normals());
        for (p, n) in mesh.vertices.iter().zip(&mesh.vertex_normals) {
            assert!((n - p.coords.normalize()).norm() < 1e-9);
        }
    }
}
