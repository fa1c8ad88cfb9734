//! Loader for the bundled DJI Tello drone mesh
//!
//! The model is authored in millimetres with Z up and a grey paint job. The
//! normalization pipeline re-origins it, shrinks it to scene units, turns it
//! upside-down about X and paints it a flat tint before use.
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::{Point3, Vector3};

use crate::error::AssetError;
use crate::geometry::TriangleMesh;
use crate::ply;
use crate::transform::rotation_from_axis_angle;

/// Location of the drone mesh, relative to this crate's directory
pub const TELLO_ASSET: &str = "resources/tello.ply";

/// Absolute path of the bundled drone mesh
pub fn asset_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(TELLO_ASSET)
}

/// Fixed parameters of the normalization pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeConfig {
    /// Uniform scale applied about the origin after centering
    pub scale: f64,
    /// Axis-angle rotation; the vector length is the angle in radians
    pub rotation: Vector3<f64>,
    /// RGB tint painted over every vertex
    pub color: Vector3<f64>,
}

impl NormalizeConfig {
    pub fn tello() -> Self {
        Self {
            scale: 0.002,
            rotation: Vector3::new(PI, 0.0, 0.0),
            color: Vector3::new(0.0, 1.0, 1.0),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self::tello()
    }
}

/// Load the bundled drone mesh and normalize it
pub fn load_normalized_asset() -> Result<TriangleMesh, AssetError> {
    load_normalized_asset_from(asset_path())
}

/// Load the mesh at `path` and run it through the drone normalization
pub fn load_normalized_asset_from(path: impl AsRef<Path>) -> Result<TriangleMesh, AssetError> {
    let mesh = load_mesh(path)?;
    Ok(normalize(mesh, &NormalizeConfig::tello()))
}

/// Read a PLY mesh without modifying it
pub fn load_mesh(path: impl AsRef<Path>) -> Result<TriangleMesh, AssetError> {
    let path = path.as_ref();
    info!("Loading mesh asset from {:?}", path);

    let data = fs::read(path).map_err(|source| AssetError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = ply::parse_ply(&data).map_err(|source| AssetError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "Loaded {} vertices and {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Center, scale, rotate, recompute normals and paint, in that order.
/// Triangles are carried through unchanged.
pub fn normalize(mut mesh: TriangleMesh, config: &NormalizeConfig) -> TriangleMesh {
    let center = mesh.get_center();
    debug!("centering mesh at {:?}", center);
    mesh.translate(&-center.coords);

    mesh.scale(config.scale, &Point3::origin());

    let rotation = rotation_from_axis_angle(&config.rotation);
    let pivot = mesh.get_center();
    mesh.rotate(&rotation, &pivot);

    mesh.compute_vertex_normals();
    mesh.paint_uniform_color(config.color);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_ply(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tello3d-{}-{}.ply", std::process::id(), name));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn lopsided_mesh() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3::new(100.0, 20.0, 5.0),
                Point3::new(180.0, 20.0, 5.0),
                Point3::new(100.0, 90.0, 5.0),
                Point3::new(100.0, 20.0, 60.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
        .with_colors(vec![Vector3::new(0.5, 0.5, 0.5); 4])
    }

    #[test]
    fn test_bundled_asset_is_normalized() {
        let mesh = load_normalized_asset().unwrap();
        assert!(mesh.has_triangles());
        assert!(mesh.has_vertex_normals());

        assert!(mesh
            .vertex_colors
            .iter()
            .all(|c| *c == Vector3::new(0.0, 1.0, 1.0)));
        assert_eq!(mesh.vertex_colors.len(), mesh.vertex_count());

        assert!(mesh.get_center().coords.norm() < 1e-6);
    }

    #[test]
    fn test_bundled_asset_keeps_triangles() {
        let raw = load_mesh(asset_path()).unwrap();
        let normalized = load_normalized_asset().unwrap();
        assert_eq!(raw.triangles, normalized.triangles);
        assert_eq!(raw.vertex_count(), normalized.vertex_count());
    }

    #[test]
    fn test_scale_shrinks_bounding_box_diagonal() {
        let raw = load_mesh(asset_path()).unwrap();
        let before = raw.get_axis_aligned_bounding_box().unwrap().diagonal_length();
        let after = normalize(raw, &NormalizeConfig::tello())
            .get_axis_aligned_bounding_box()
            .unwrap()
            .diagonal_length();
        assert!((after - 0.002 * before).abs() < 1e-9);
    }

    #[test]
    fn test_pipeline_matches_manual_composition() {
        let source = lopsided_mesh();
        let mean = source.get_center();
        let normalized = normalize(source.clone(), &NormalizeConfig::tello());

        for (raw, out) in source.vertices.iter().zip(&normalized.vertices) {
            // Half turn about X: (x, y, z) -> (x, -y, -z)
            let scaled = (raw - mean) * 0.002;
            let expected = Point3::new(scaled.x, -scaled.y, -scaled.z);
            assert!((out - expected).norm() < 1e-12);
        }
        assert_eq!(normalized.triangles, source.triangles);
    }

    #[test]
    fn test_normals_follow_rotated_geometry() {
        let normalized = normalize(lopsided_mesh(), &NormalizeConfig::tello());
        let mut expected = normalized.clone();
        expected.compute_vertex_normals();
        assert_eq!(normalized.vertex_normals, expected.vertex_normals);
    }

    #[test]
    fn test_point_above_origin_ends_up_below() {
        // Two points straddling the origin so centering leaves them in place
        let mesh = TriangleMesh::new(
            vec![Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, -1.0, 0.0)],
            vec![],
        );
        let config = NormalizeConfig {
            scale: 1.0,
            ..NormalizeConfig::tello()
        };
        let normalized = normalize(mesh, &config);
        assert!((normalized.vertices[0] - Point3::new(0.0, -1.0, 0.0)).norm() < 1e-12);
        assert!((normalized.vertices[1] - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_load_from_custom_path() {
        let path = temp_ply(
            "custom",
            "ply\nformat ascii 1.0\nelement vertex 3\nproperty float x\nproperty float y\n\
             property float z\nelement face 1\nproperty list uchar int vertex_indices\n\
             end_header\n0 0 0\n300 0 0\n0 300 0\n3 0 1 2\n",
        );
        let mesh = load_normalized_asset_from(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(mesh.vertex_count(), 3);
        assert!(mesh.get_center().coords.norm() < 1e-6);
        // Counter-clockwise in XY faces +Z, which the half turn flips to -Z
        for n in &mesh.vertex_normals {
            assert!((n - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let path = std::env::temp_dir().join("tello3d-definitely-missing.ply");
        let result = load_normalized_asset_from(&path);
        match result {
            Err(AssetError::NotFound { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_file_is_format_error() {
        let path = temp_ply("garbage", "this is not a mesh\n");
        let result = load_normalized_asset_from(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AssetError::Format { .. })));
    }
}
