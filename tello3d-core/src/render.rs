//! Renderer-ready mesh snapshot

/// Floats per interleaved vertex: position, normal, color
pub const INTERLEAVED_STRIDE: usize = 9;

/// Immutable mesh data laid out for upload to a graphics pipeline.
///
/// Holds positions, colors, triangle indices and vertex normals as plain
/// fixed-size arrays. `colors` is empty when the source mesh had no colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
    indices: Vec<[u32; 3]>,
    normals: Vec<[f32; 3]>,
}

impl RenderMesh {
    pub fn new(
        positions: Vec<[f32; 3]>,
        colors: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
        normals: Vec<[f32; 3]>,
    ) -> Self {
        Self {
            positions,
            colors,
            indices,
            normals,
        }
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Index buffer as a flat list, three entries per triangle
    pub fn flat_indices(&self) -> Vec<u32> {
        self.indices.iter().flatten().copied().collect()
    }

    /// Interleaved `[px, py, pz, nx, ny, nz, r, g, b]` per vertex.
    ///
    /// Missing normals are written as zero, missing colors as white.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.positions.len() * INTERLEAVED_STRIDE);
        for (i, position) in self.positions.iter().enumerate() {
            let normal = self.normals.get(i).copied().unwrap_or([0.0; 3]);
            let color = self.colors.get(i).copied().unwrap_or([1.0; 3]);
            data.extend_from_slice(position);
            data.extend_from_slice(&normal);
            data.extend_from_slice(&color);
        }
        data
    }
}
