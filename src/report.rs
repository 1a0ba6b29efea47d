use glam::Vec3;
use serde::Serialize;

use crate::types::Mesh;

/// Coordinate extents of the vertex positions.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Extents {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Inventory of a mesh's geometry and attributes.
#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub segmentations: Vec<String>,
    pub vertex_data: Vec<String>,
    pub extents: Option<Extents>,
}

impl MeshSummary {
    /// Gather the summary from a mesh. Pure; the mesh is untouched.
    pub fn collect(mesh: &Mesh) -> Self {
        Self {
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            segmentations: mesh
                .segmentations()
                .iter()
                .map(|s| s.name().to_string())
                .collect(),
            vertex_data: mesh
                .vertex_data_fields()
                .iter()
                .map(|d| d.name.clone())
                .collect(),
            extents: compute_extents(mesh),
        }
    }
}

fn compute_extents(mesh: &Mesh) -> Option<Extents> {
    let mut positions = mesh.vertices().iter().map(|&v| Vec3::from_array(v));
    let first = positions.next()?;

    let (min, max) = positions.fold((first, first), |(min, max), p| {
        (min.min(p), max.max(p))
    });

    Some(Extents {
        min: min.to_array(),
        max: max.to_array(),
    })
}

/// Render the mesh inventory as a text report.
pub fn summarize(mesh: &Mesh) -> String {
    let summary = MeshSummary::collect(mesh);

    let mut out = String::from("=== Mesh Summary ===\n");
    out.push_str(&format!("  Vertices:      {}\n", summary.vertex_count));
    out.push_str(&format!("  Triangles:     {}\n", summary.triangle_count));

    if let Some(extents) = summary.extents {
        out.push_str(&format!(
            "  Extents:       ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})\n",
            extents.min[0],
            extents.min[1],
            extents.min[2],
            extents.max[0],
            extents.max[1],
            extents.max[2]
        ));
    }

    out.push_str(&format!(
        "  Segmentations: {}\n",
        format_names(&summary.segmentations)
    ));
    out.push_str(&format!(
        "  Vertex data:   {}\n",
        format_names(&summary.vertex_data)
    ));
    out
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
