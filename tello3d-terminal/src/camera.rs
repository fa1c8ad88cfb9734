//! Camera and projection for the terminal viewer
use nalgebra::{Matrix4, Point3, Vector3};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera looking at the origin from +Z
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    /// Camera for a `columns` x `rows` character grid
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: columns as f32 / (rows.max(1) as f32 * CELL_ASPECT),
            near: 0.01,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        }
    }

    /// Move the camera back along +Z until a sphere of `radius` around the
    /// target fits the vertical field of view.
    pub fn frame(&mut self, radius: f32) {
        let radius = radius.max(f32::EPSILON);
        let distance = radius / (self.fov / 2.0).sin() * 1.1;
        self.position = self.target + Vector3::z() * distance;
        self.near = (distance - radius * 2.0).max(distance * 0.01);
        self.far = distance + radius * 2.0;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = (self.position - self.target).norm() * (self.fov / 2.0).tan() * 2.0;
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    /// Combined projection * view matrix
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Map a model-space point to `(column, row, depth)`, with depth in
    /// normalized device coordinates. `None` when outside the view volume.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        mvp: &Matrix4<f32>,
        columns: u32,
        rows: u32,
    ) -> Option<(f32, f32, f32)> {
        let ndc = mvp.transform_point(point);
        if !ndc.coords.iter().all(|c| c.is_finite()) || ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }

        let column = (ndc.x + 1.0) * 0.5 * columns as f32;
        let row = (1.0 - ndc.y) * 0.5 * rows as f32;
        Some((column, row, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(80, 24)
    }
}
