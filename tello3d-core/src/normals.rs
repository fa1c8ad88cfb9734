//! Per-vertex normal estimation from triangle topology
use log::{debug, warn};
use nalgebra::{Point3, Vector3};

/// Face normals shorter than this are treated as degenerate triangles
const DEGENERATE_EPSILON: f64 = 1e-12;

/// How incident face normals are weighted when averaged at a vertex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalWeighting {
    /// Weight by the interior angle of the triangle at the vertex
    #[default]
    Angle,
    /// Weight by triangle area (sum of raw cross products)
    Area,
    /// Every incident face counts the same
    Uniform,
}

/// Unnormalized face normal following the counter-clockwise winding of `a, b, c`.
/// Its length is twice the triangle's area.
pub fn face_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    (b - a).cross(&(c - a))
}

/// Compute one unit normal per vertex.
///
/// Vertices not referenced by any non-degenerate triangle get a zero normal.
/// Triangles referencing vertices out of range are skipped.
pub fn vertex_normals(
    vertices: &[Point3<f64>],
    triangles: &[[u32; 3]],
    weighting: NormalWeighting,
) -> Vec<Vector3<f64>> {
    if vertices.is_empty() || triangles.is_empty() {
        warn!(
            "degenerate geometry: computing normals for {} vertices and {} triangles",
            vertices.len(),
            triangles.len()
        );
        return vec![Vector3::zeros(); vertices.len()];
    }

    let mut accumulated = vec![Vector3::zeros(); vertices.len()];
    let mut skipped = 0usize;

    for triangle in triangles {
        let corners = match triangle_corners(vertices, triangle) {
            Some(corners) => corners,
            None => {
                skipped += 1;
                continue;
            }
        };

        let normal = face_normal(&corners[0], &corners[1], &corners[2]);
        let Some(unit) = normal.try_normalize(DEGENERATE_EPSILON) else {
            skipped += 1;
            continue;
        };

        for i in 0..3 {
            let contribution = match weighting {
                NormalWeighting::Angle => {
                    let here = corners[i];
                    let next = corners[(i + 1) % 3] - here;
                    let prev = corners[(i + 2) % 3] - here;
                    unit * next.angle(&prev)
                }
                NormalWeighting::Area => normal,
                NormalWeighting::Uniform => unit,
            };
            accumulated[triangle[i] as usize] += contribution;
        }
    }

    if skipped > 0 {
        debug!("skipped {} degenerate or out-of-range triangles", skipped);
    }

    let mut orphaned = 0usize;
    let normals: Vec<Vector3<f64>> = accumulated
        .into_iter()
        .map(|n| {
            n.try_normalize(DEGENERATE_EPSILON).unwrap_or_else(|| {
                orphaned += 1;
                Vector3::zeros()
            })
        })
        .collect();

    if orphaned > 0 {
        warn!(
            "degenerate geometry: {} of {} vertices have no usable incident face",
            orphaned,
            vertices.len()
        );
    }

    normals
}

fn triangle_corners(vertices: &[Point3<f64>], triangle: &[u32; 3]) -> Option<[Point3<f64>; 3]> {
    Some([
        *vertices.get(triangle[0] as usize)?,
        *vertices.get(triangle[1] as usize)?,
        *vertices.get(triangle[2] as usize)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn right_triangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let v = right_triangle();
        let n = face_normal(&v[0], &v[1], &v[2]);
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);

        let flipped = face_normal(&v[0], &v[2], &v[1]);
        assert!((flipped - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_single_triangle_normals() {
        let normals = vertex_normals(&right_triangle(), &[[0, 1, 2]], NormalWeighting::Angle);
        assert_eq!(normals.len(), 3);
        for n in normals {
            assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_angle_weighting_differs_from_uniform() {
        // Vertex 0 sees a 90 degree corner of the XY triangle and a narrower
        // corner of a near-vertical triangle facing -X.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.1, -1.0, 1.0),
        ];
        let triangles = [[0, 1, 2], [0, 3, 4]];

        let angle = vertex_normals(&vertices, &triangles, NormalWeighting::Angle);
        let uniform = vertex_normals(&vertices, &triangles, NormalWeighting::Uniform);

        assert!((angle[0].norm() - 1.0).abs() < 1e-12);
        assert!((uniform[0].norm() - 1.0).abs() < 1e-12);
        // The wide corner dominates, pulling the angle-weighted normal toward +Z
        assert!(angle[0].z > uniform[0].z);
    }

    #[test]
    fn test_area_weighting_favours_large_faces() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        // Large face in XY (+Z normal), small face in XZ (+Y normal)
        let triangles = [[0, 1, 2], [0, 3, 1]];
        let normals = vertex_normals(&vertices, &triangles, NormalWeighting::Area);
        assert!(normals[0].z > normals[0].y.abs());
    }

    #[test]
    fn test_no_triangles_gives_zero_normals() {
        let normals = vertex_normals(&right_triangle(), &[], NormalWeighting::Angle);
        assert_eq!(normals, vec![Vector3::zeros(); 3]);
        assert!(vertex_normals(&[], &[], NormalWeighting::Angle).is_empty());
    }

    #[test]
    fn test_degenerate_and_isolated_vertices() {
        let mut vertices = right_triangle();
        vertices.push(Point3::new(5.0, 5.0, 5.0));
        // Collinear triangle plus one that references a missing vertex
        let triangles = [[0, 1, 2], [0, 1, 1], [0, 1, 9]];
        let normals = vertex_normals(&vertices, &triangles, NormalWeighting::Angle);
        assert_eq!(normals.len(), 4);
        assert!((normals[0] - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        assert_eq!(normals[3], Vector3::zeros());
    }
}
