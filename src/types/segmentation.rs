use std::collections::BTreeMap;

use crate::error::{Result, SurfViewError};

/// A named anatomical region with its display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    /// RGBA, each channel 0-255. Loaders supplying RGB fill alpha with 255.
    pub color: [u8; 4],
}

impl Label {
    pub fn new(name: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }

    /// Construct from an opaque RGB triple.
    pub fn rgb(name: impl Into<String>, rgb: [u8; 3]) -> Self {
        Self::new(name, [rgb[0], rgb[1], rgb[2], 255])
    }
}

/// The label assignment of a single vertex.
///
/// Unlabeled vertices are a distinct variant rather than a reserved id,
/// so they can never collide with an entry in the label table. File
/// formats that encode "no label" as `-1` convert at the loader boundary
/// via [`VertexLabel::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLabel {
    Unlabeled,
    Id(u32),
}

impl VertexLabel {
    /// Convert a raw integer key as stored on disk: `-1` means unlabeled,
    /// non-negative values are label ids. Any other negative value is
    /// corrupt input.
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            -1 => Ok(VertexLabel::Unlabeled),
            k if k >= 0 => Ok(VertexLabel::Id(k as u32)),
            k => Err(SurfViewError::InvariantViolation(format!(
                "vertex label id {k} is negative and not the -1 unlabeled marker"
            ))),
        }
    }
}

/// A categorical labeling of every vertex of a mesh.
///
/// `keys` is aligned to the mesh vertex order; `labels` maps each id
/// appearing in `keys` to its name and display color.
#[derive(Debug, Clone)]
pub struct Segmentation {
    name: String,
    keys: Vec<VertexLabel>,
    labels: BTreeMap<u32, Label>,
}

impl Segmentation {
    /// Build a segmentation, verifying that every labeled vertex has a
    /// table entry.
    pub fn new(
        name: impl Into<String>,
        keys: Vec<VertexLabel>,
        labels: BTreeMap<u32, Label>,
    ) -> Result<Self> {
        let name = name.into();

        for (vertex, key) in keys.iter().enumerate() {
            if let VertexLabel::Id(id) = key {
                if !labels.contains_key(id) {
                    return Err(SurfViewError::InvariantViolation(format!(
                        "segmentation '{name}': vertex {vertex} has label id {id} \
                         with no table entry"
                    )));
                }
            }
        }

        Ok(Self { name, keys, labels })
    }

    /// Build from raw integer keys as read from disk (`-1` = unlabeled).
    ///
    /// A `-1` key in the *table* is rejected here; it can never become a
    /// valid id.
    pub fn from_raw_keys(
        name: impl Into<String>,
        raw_keys: &[i32],
        raw_labels: BTreeMap<i32, Label>,
    ) -> Result<Self> {
        let name = name.into();

        let mut labels = BTreeMap::new();
        for (raw_id, label) in raw_labels {
            if raw_id < 0 {
                return Err(SurfViewError::InvariantViolation(format!(
                    "segmentation '{name}': label table contains reserved id {raw_id}"
                )));
            }
            labels.insert(raw_id as u32, label);
        }

        let keys = raw_keys
            .iter()
            .map(|&raw| VertexLabel::from_raw(raw))
            .collect::<Result<Vec<_>>>()?;

        Self::new(name, keys, labels)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-vertex label assignments, aligned to the mesh vertex order.
    pub fn keys(&self) -> &[VertexLabel] {
        &self.keys
    }

    /// Number of vertices this segmentation covers.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Look up a label by id. Ids absent from the table are an error;
    /// the unlabeled state never reaches this call.
    pub fn label(&self, id: u32) -> Result<&Label> {
        self.labels.get(&id).ok_or_else(|| {
            SurfViewError::NotFound(format!(
                "label id {id} in segmentation '{}'",
                self.name
            ))
        })
    }

    /// The full label table, ordered by id.
    pub fn labels(&self) -> &BTreeMap<u32, Label> {
        &self.labels
    }
}
