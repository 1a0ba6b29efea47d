use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};
use tracing::debug;

use crate::error::{Result, SurfViewError};
use crate::types::{Mesh, VertexData};

/// Vertex properties that are geometry or appearance, not scalar fields.
const RESERVED_PROPERTIES: [&str; 13] = [
    "x", "y", "z", "nx", "ny", "nz", "red", "green", "blue", "alpha", "r", "g", "b",
];

/// Load a PLY file into a `Mesh`.
///
/// Positions and fan-triangulated faces become the geometry; every other
/// scalar vertex property (`quality`, `thickness`, ...) becomes a
/// vertex-data field of the same name.
pub fn load_ply(path: &Path) -> Result<Mesh> {
    let file = File::open(path)
        .map_err(|e| SurfViewError::Input(format!("Failed to open PLY: {e}")))?;
    let mut reader = BufReader::new(file);

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| SurfViewError::Input(format!("Failed to parse PLY: {e}")))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| SurfViewError::Input("PLY file missing 'vertex' element".into()))?;

    debug!(vertex_count = vertices.len(), "Parsing PLY vertices");

    let scalar_fields: Vec<String> = vertices
        .first()
        .map(|v| {
            let reserved: BTreeSet<&str> = RESERVED_PROPERTIES.into_iter().collect();
            v.keys()
                .filter(|key| !reserved.contains(key.as_str()))
                .filter(|key| is_scalar_property(&v[*key]))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    let mut positions = Vec::with_capacity(vertices.len());
    let mut fields: Vec<(String, Vec<f32>)> = scalar_fields
        .iter()
        .map(|name| (name.clone(), Vec::with_capacity(vertices.len())))
        .collect();

    for vertex in vertices {
        positions.push([
            get_float_property(vertex, "x")?,
            get_float_property(vertex, "y")?,
            get_float_property(vertex, "z")?,
        ]);
        for (name, values) in &mut fields {
            values.push(get_float_property(vertex, name)?);
        }
    }

    // Parse faces, fan-triangulating polygons with >3 vertices
    let mut triangles = Vec::new();
    if let Some(faces) = ply.payload.get("face") {
        debug!(face_count = faces.len(), "Parsing PLY faces");
        for face in faces {
            let face_indices = get_index_list(face)?;
            if face_indices.len() >= 3 {
                for i in 1..face_indices.len() - 1 {
                    triangles.push([face_indices[0], face_indices[i], face_indices[i + 1]]);
                }
            }
        }
    }

    let mut mesh = Mesh::new(positions, triangles)?;
    for (name, values) in fields {
        debug!(field = %name, "Attaching PLY scalar property");
        mesh.add_vertex_data(VertexData::new(name, values))?;
    }
    Ok(mesh)
}

fn is_scalar_property(prop: &Property) -> bool {
    !matches!(
        prop,
        Property::ListChar(_)
            | Property::ListUChar(_)
            | Property::ListShort(_)
            | Property::ListUShort(_)
            | Property::ListInt(_)
            | Property::ListUInt(_)
            | Property::ListFloat(_)
            | Property::ListDouble(_)
    )
}

/// Extract a float property, handling Float/Double/Int/Short types.
fn get_float_property(element: &DefaultElement, key: &str) -> Result<f32> {
    let prop = element
        .get(key)
        .ok_or_else(|| SurfViewError::Input(format!("PLY vertex missing property '{key}'")))?;

    match prop {
        Property::Float(v) => Ok(*v),
        Property::Double(v) => Ok(*v as f32),
        Property::Int(v) => Ok(*v as f32),
        Property::Short(v) => Ok(*v as f32),
        Property::UInt(v) => Ok(*v as f32),
        Property::UShort(v) => Ok(*v as f32),
        Property::Char(v) => Ok(*v as f32),
        Property::UChar(v) => Ok(*v as f32),
        _ => Err(SurfViewError::Input(format!(
            "PLY property '{key}' has unsupported type"
        ))),
    }
}

/// Extract the index list from a face element.
fn get_index_list(face: &DefaultElement) -> Result<Vec<u32>> {
    // Try "vertex_indices" first, then "vertex_index"
    let key = if face.contains_key("vertex_indices") {
        "vertex_indices"
    } else {
        "vertex_index"
    };

    let prop = face.get(key).ok_or_else(|| {
        SurfViewError::Input("PLY face missing vertex_indices property".into())
    })?;

    match prop {
        Property::ListInt(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUInt(v) => Ok(v.clone()),
        Property::ListUChar(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        Property::ListUShort(v) => Ok(v.iter().map(|&i| i as u32).collect()),
        _ => Err(SurfViewError::Input(
            "PLY face vertex_indices has unsupported type".into(),
        )),
    }
}
