use crate::error::{Result, SurfViewError};
use crate::types::Segmentation;

/// A named per-vertex scalar field (cortical thickness, sulcal depth, ...).
#[derive(Debug, Clone)]
pub struct VertexData {
    pub name: String,
    /// One value per vertex, aligned to the mesh vertex order.
    pub data: Vec<f32>,
}

impl VertexData {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// A triangulated surface with its per-vertex attributes.
///
/// Built once by the loaders, read-only afterwards. The `add_*` builder
/// methods verify attribute alignment against the vertex count; the
/// accessors never mutate.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    vertices: Vec<[f32; 3]>,
    triangles: Vec<[u32; 3]>,
    segmentations: Vec<Segmentation>,
    vertex_data: Vec<VertexData>,
}

impl Mesh {
    /// Build a mesh from geometry, verifying triangle indices.
    pub fn new(vertices: Vec<[f32; 3]>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let n = vertices.len();
        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&idx) = tri.iter().find(|&&idx| idx as usize >= n) {
                return Err(SurfViewError::InvariantViolation(format!(
                    "triangle {i} references vertex {idx}, mesh has {n} vertices"
                )));
            }
        }

        Ok(Self {
            vertices,
            triangles,
            segmentations: Vec::new(),
            vertex_data: Vec::new(),
        })
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Attach a segmentation. Its keys must cover every vertex exactly
    /// once and its name must be unused.
    pub fn add_segmentation(&mut self, segmentation: Segmentation) -> Result<()> {
        if segmentation.len() != self.vertex_count() {
            return Err(SurfViewError::InvariantViolation(format!(
                "segmentation '{}' covers {} vertices, mesh has {}",
                segmentation.name(),
                segmentation.len(),
                self.vertex_count()
            )));
        }
        if self.segmentations.iter().any(|s| s.name() == segmentation.name()) {
            return Err(SurfViewError::InvariantViolation(format!(
                "duplicate segmentation name '{}'",
                segmentation.name()
            )));
        }

        self.segmentations.push(segmentation);
        Ok(())
    }

    /// Attach a per-vertex scalar field. Same alignment and naming rules
    /// as `add_segmentation`.
    pub fn add_vertex_data(&mut self, vertex_data: VertexData) -> Result<()> {
        if vertex_data.data.len() != self.vertex_count() {
            return Err(SurfViewError::InvariantViolation(format!(
                "vertex data '{}' has {} values, mesh has {} vertices",
                vertex_data.name,
                vertex_data.data.len(),
                self.vertex_count()
            )));
        }
        if self.vertex_data.iter().any(|d| d.name == vertex_data.name) {
            return Err(SurfViewError::InvariantViolation(format!(
                "duplicate vertex data name '{}'",
                vertex_data.name
            )));
        }

        self.vertex_data.push(vertex_data);
        Ok(())
    }

    /// All segmentations, in attachment order.
    pub fn segmentations(&self) -> &[Segmentation] {
        &self.segmentations
    }

    /// All vertex-data fields, in attachment order.
    pub fn vertex_data_fields(&self) -> &[VertexData] {
        &self.vertex_data
    }

    /// Look up a segmentation by name.
    pub fn segmentation(&self, name: &str) -> Result<&Segmentation> {
        self.segmentations
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| SurfViewError::NotFound(format!("segmentation '{name}'")))
    }

    /// Look up a vertex-data field by name.
    pub fn vertex_data(&self, name: &str) -> Result<&VertexData> {
        self.vertex_data
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SurfViewError::NotFound(format!("vertex data '{name}'")))
    }

    /// Whether the mesh contains no geometry.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
