use std::fs;
use std::path::Path;

use tracing::info;

use crate::color::{resolve_colors, ColorSelection, Rgb};
use crate::error::Result;
use crate::types::Mesh;

/// Uniform surface material for the external viewer.
///
/// Applied when no per-vertex colors are selected; always part of the
/// render payload so the lighting terms live in one place instead of at
/// the call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialConfig {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            ambient: 0.5,
            diffuse: 1.0,
            specular: 0.2,
        }
    }
}

/// Everything the external rendering collaborator needs to draw the
/// surface: flat position and index buffers, optional per-vertex colors,
/// and the uniform material.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    /// Interleaved positions: [x, y, z, x, y, z, ...]
    pub positions: Vec<f32>,
    /// Triangle indices into the position buffer
    pub indices: Vec<u32>,
    /// One RGB triple per vertex, or `None` for uniform shading
    pub colors: Option<Vec<Rgb>>,
    pub material: MaterialConfig,
}

impl RenderPayload {
    /// Assemble the payload for a mesh and coloring selection.
    pub fn build(
        mesh: &Mesh,
        selection: &ColorSelection,
        material: MaterialConfig,
    ) -> Result<Self> {
        let colors = resolve_colors(mesh, selection)?;

        let positions = mesh
            .vertices()
            .iter()
            .flat_map(|v| v.iter().copied())
            .collect();
        let indices = mesh
            .triangles()
            .iter()
            .flat_map(|t| t.iter().copied())
            .collect();

        Ok(Self {
            positions,
            indices,
            colors,
            material,
        })
    }

    /// Number of vertices in the payload.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of triangles in the payload.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Write the payload as an ASCII PLY file for an external mesh viewer.
///
/// Vertex colors are written as uchar properties when present; uniform
/// payloads get a plain position-only vertex element.
pub fn write_ply(payload: &RenderPayload, path: &Path) -> Result<()> {
    let mut out = String::new();

    out.push_str("ply\nformat ascii 1.0\n");
    out.push_str("comment exported by surf-view\n");
    out.push_str(&format!("element vertex {}\n", payload.vertex_count()));
    out.push_str("property float x\nproperty float y\nproperty float z\n");
    if payload.colors.is_some() {
        out.push_str("property uchar red\nproperty uchar green\nproperty uchar blue\n");
    }
    out.push_str(&format!("element face {}\n", payload.triangle_count()));
    out.push_str("property list uchar int vertex_indices\nend_header\n");

    for (i, position) in payload.positions.chunks_exact(3).enumerate() {
        out.push_str(&format!("{} {} {}", position[0], position[1], position[2]));
        if let Some(colors) = &payload.colors {
            let [r, g, b] = colors[i];
            out.push_str(&format!(" {r} {g} {b}"));
        }
        out.push('\n');
    }

    for triangle in payload.indices.chunks_exact(3) {
        out.push_str(&format!("3 {} {} {}\n", triangle[0], triangle[1], triangle[2]));
    }

    fs::write(path, out)?;
    info!(path = %path.display(), "Wrote render payload");
    Ok(())
}
