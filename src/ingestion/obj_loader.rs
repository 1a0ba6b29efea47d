use std::path::Path;

use tracing::{debug, warn};

use crate::error::{Result, SurfViewError};
use crate::types::Mesh;

/// Load an OBJ file into a `Mesh`.
///
/// Only positions and triangle indices are used; OBJ carries no
/// per-vertex attribute fields this tool can color by. Multiple models
/// in one file are concatenated with their indices rebased.
pub fn load_obj(path: &Path) -> Result<Mesh> {
    let (models, materials_result) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
        .map_err(|e| SurfViewError::Input(format!("Failed to load OBJ: {e}")))?;

    if let Err(e) = materials_result {
        warn!("Failed to load MTL: {e}");
    }

    debug!(model_count = models.len(), "Loaded OBJ models");

    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for model in models {
        let base = vertices.len() as u32;
        let mesh = model.mesh;

        for position in mesh.positions.chunks_exact(3) {
            vertices.push([position[0], position[1], position[2]]);
        }
        for tri in mesh.indices.chunks_exact(3) {
            triangles.push([base + tri[0], base + tri[1], base + tri[2]]);
        }
    }

    Mesh::new(vertices, triangles)
}
