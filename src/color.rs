use tracing::debug;

use crate::error::{Result, SurfViewError};
use crate::types::{Mesh, VertexLabel};

/// An RGB triple, each channel 0-255.
pub type Rgb = [u8; 3];

/// Unlabeled vertices render as black.
const UNLABELED_COLOR: Rgb = [0, 0, 0];

/// What the surface should be colored by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSelection {
    /// No per-vertex coloring; the viewer shades with its uniform material.
    Uniform,
    /// Color by the named segmentation's label table.
    Segmentation(String),
    /// Color by the named scalar field, normalized to a green ramp.
    VertexData(String),
}

impl ColorSelection {
    /// Build a selection from the two optional coloring flags.
    ///
    /// The two attribute modes are mutually exclusive. The CLI already
    /// rejects passing both, but the check is repeated here so the
    /// library is safe to call directly.
    pub fn from_flags(
        segmentation: Option<String>,
        vertex_data: Option<String>,
    ) -> Result<Self> {
        match (segmentation, vertex_data) {
            (Some(_), Some(_)) => Err(SurfViewError::InvalidSelection(
                "--segmentation and --vertex-data are mutually exclusive".into(),
            )),
            (Some(name), None) => Ok(ColorSelection::Segmentation(name)),
            (None, Some(name)) => Ok(ColorSelection::VertexData(name)),
            (None, None) => Ok(ColorSelection::Uniform),
        }
    }
}

impl std::fmt::Display for ColorSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorSelection::Uniform => write!(f, "uniform"),
            ColorSelection::Segmentation(name) => write!(f, "segmentation '{name}'"),
            ColorSelection::VertexData(name) => write!(f, "vertex data '{name}'"),
        }
    }
}

/// Derive a per-vertex color array from a mesh and a coloring selection.
///
/// Returns one RGB triple per vertex in vertex order, or `None` for the
/// uniform selection. Pure: same inputs, same output, no mutation.
pub fn resolve_colors(mesh: &Mesh, selection: &ColorSelection) -> Result<Option<Vec<Rgb>>> {
    match selection {
        ColorSelection::Uniform => Ok(None),
        ColorSelection::Segmentation(name) => {
            segmentation_colors(mesh, name).map(Some)
        }
        ColorSelection::VertexData(name) => vertex_data_colors(mesh, name).map(Some),
    }
}

/// One color per vertex from the segmentation's label table; unlabeled
/// vertices come out black.
fn segmentation_colors(mesh: &Mesh, name: &str) -> Result<Vec<Rgb>> {
    let segmentation = mesh.segmentation(name)?;
    debug!(
        segmentation = name,
        labels = segmentation.labels().len(),
        "Resolving segmentation colors"
    );

    segmentation
        .keys()
        .iter()
        .map(|key| match key {
            VertexLabel::Unlabeled => Ok(UNLABELED_COLOR),
            VertexLabel::Id(id) => {
                let color = segmentation.label(*id)?.color;
                Ok([color[0], color[1], color[2]])
            }
        })
        .collect()
}

/// One color per vertex from the scalar field, as a green intensity ramp
/// normalized so the maximum value maps to 255.
///
/// Negative values fall through the saturating cast to green 0; the
/// maximum itself must be positive or the normalization is meaningless.
fn vertex_data_colors(mesh: &Mesh, name: &str) -> Result<Vec<Rgb>> {
    let field = mesh.vertex_data(name)?;
    if field.data.is_empty() {
        return Ok(Vec::new());
    }

    let max = field.data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !(max > 0.0) {
        return Err(SurfViewError::DegenerateRange(format!(
            "vertex data '{name}' has maximum {max}; cannot normalize"
        )));
    }
    debug!(vertex_data = name, max, "Resolving scalar field colors");

    Ok(field
        .data
        .iter()
        .map(|&value| {
            let green = (value / max * 255.0).round() as u8;
            [0, green, 0]
        })
        .collect())
}
