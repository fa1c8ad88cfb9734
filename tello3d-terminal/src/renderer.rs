//! ASCII rasterizer for indexed render meshes
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;
use tello3d_core::RenderMesh;

use crate::camera::Camera;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Keeps unlit faces faintly visible
const AMBIENT: f32 = 0.15;

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: char,
    color: Color,
}

const EMPTY: Cell = Cell {
    glyph: ' ',
    color: Color::Reset,
};

/// Z-buffered renderer that draws a mesh as terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    cells: Vec<Cell>,
    light_dir: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            cells: vec![EMPTY; size],
            light_dir: Vector3::new(0.3, 0.5, 1.0).normalize(),
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.cells.fill(EMPTY);
    }

    /// Number of non-blank cells in the current frame
    pub fn covered_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.glyph != ' ').count()
    }

    pub fn render_mesh(&mut self, mesh: &RenderMesh, model: &Matrix4<f32>, camera: &Camera) {
        let mvp = camera.view_projection() * model;
        let columns = self.width as u32;
        let rows = self.height as u32;

        let projected: Vec<Option<(f32, f32, f32)>> = mesh
            .positions()
            .iter()
            .map(|p| camera.project_to_screen(&Point3::from(*p), &mvp, columns, rows))
            .collect();

        // Normals and light live in world space, so rotate normals by the model only
        let world_normals: Vec<Vector3<f32>> = mesh
            .normals()
            .iter()
            .map(|n| model.transform_vector(&Vector3::from(*n)))
            .collect();

        for &triangle in mesh.indices() {
            let corners = triangle.map(|i| projected.get(i as usize).copied().flatten());
            let [Some(a), Some(b), Some(c)] = corners else {
                continue;
            };

            let brightness = self.shade(&triangle, &world_normals);
            let glyph = glyph_for(brightness);
            let color = tint(mesh, &triangle, brightness);
            self.rasterize_triangle([a, b, c], Cell { glyph, color });
        }
    }

    /// Lambert term averaged over the triangle's vertex normals
    fn shade(&self, triangle: &[u32; 3], normals: &[Vector3<f32>]) -> f32 {
        let sum: Vector3<f32> = triangle
            .iter()
            .filter_map(|&i| normals.get(i as usize))
            .sum();
        let diffuse = sum
            .try_normalize(f32::EPSILON)
            .map_or(0.0, |n| n.dot(&self.light_dir).max(0.0));
        AMBIENT + (1.0 - AMBIENT) * diffuse
    }

    fn rasterize_triangle(&mut self, coords: [(f32, f32, f32); 3], cell: Cell) {
        let [v0, v1, v2] = coords;

        // Bounding box clipped to the screen
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.cells[idx] = cell;
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.cells.chunks(self.width.max(1)) {
            for cell in row {
                writer.queue(SetForegroundColor(cell.color))?;
                writer.queue(Print(cell.glyph))?;
            }
            writer.queue(Print("\r\n"))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn glyph_for(brightness: f32) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    // Lit geometry never maps to the blank glyph
    let index = ((brightness.clamp(0.0, 1.0) * last as f32).round() as usize).clamp(1, last);
    LUMINOSITY_RAMP[index]
}

/// Average vertex color of the triangle scaled by brightness; white without colors
fn tint(mesh: &RenderMesh, triangle: &[u32; 3], brightness: f32) -> Color {
    let colors = mesh.colors();
    let mut rgb = [0.0f32; 3];
    let mut found = 0;
    for color in triangle.iter().filter_map(|&i| colors.get(i as usize)) {
        for (acc, c) in rgb.iter_mut().zip(color) {
            *acc += c;
        }
        found += 1;
    }
    if found == 0 {
        rgb = [1.0; 3];
    } else {
        rgb.iter_mut().for_each(|c| *c /= found as f32);
    }

    let channel = |c: f32| ((c * brightness).clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: channel(rgb[0]),
        g: channel(rgb[1]),
        b: channel(rgb[2]),
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
