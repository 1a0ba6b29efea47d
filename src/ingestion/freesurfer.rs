//! Loaders for the FreeSurfer binary surface formats.
//!
//! All three formats are big-endian: reconstructed surfaces
//! (`lh.white`, `rh.pial`, ...), per-vertex curvature/morphometry files
//! (`lh.thickness`, `lh.sulc`, ...) and annotation files with an
//! embedded color table (`lh.aparc.annot`).

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{Hemisphere, SurfaceKind};
use crate::error::{Result, SurfViewError};
use crate::types::{Label, Mesh, Segmentation, VertexData, VertexLabel};

/// `lh.white` and friends start with these three bytes.
const SURFACE_MAGIC: [u8; 3] = [0xFF, 0xFF, 0xFE];
/// New-format curv files start with these three bytes.
const CURV_MAGIC: [u8; 3] = [0xFF, 0xFF, 0xFF];

/// Big-endian reader over a loaded file.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => {
                let slice = &self.data[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(SurfViewError::Input(format!(
                "unexpected end of file at byte {} (wanted {n} more)",
                self.pos
            ))),
        }
    }

    fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a length-prefixed string; the length includes a trailing NUL
    /// in most FreeSurfer writers.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(SurfViewError::Input(format!(
                "negative string length {len}"
            )));
        }
        let bytes = self.take(len as usize)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Skip the creator comment of a surface file: text terminated by
    /// two consecutive newlines.
    fn skip_comment(&mut self) -> Result<()> {
        while self.pos + 1 < self.data.len() {
            if self.data[self.pos] == b'\n' {
                if self.data[self.pos + 1] == b'\n' {
                    self.pos += 2;
                    return Ok(());
                }
                // single newline terminator used by some writers
                self.pos += 1;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(SurfViewError::Input(
            "surface comment not terminated".into(),
        ))
    }
}

/// Check whether a file starts with the surface magic bytes.
pub fn is_surface_file(path: &Path) -> bool {
    let mut magic = [0u8; 3];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .map(|()| magic == SURFACE_MAGIC)
        .unwrap_or(false)
}

/// Load a reconstructed surface (`lh.white`, `rh.pial`, ...).
pub fn load_surface(path: &Path) -> Result<Mesh> {
    let data = fs::read(path)
        .map_err(|e| SurfViewError::Input(format!("Failed to read surface: {e}")))?;
    let mut reader = Reader::new(&data);

    let magic = reader.take(3)?;
    if magic != SURFACE_MAGIC {
        return Err(SurfViewError::Input(format!(
            "{} is not a FreeSurfer surface file",
            path.display()
        )));
    }
    reader.skip_comment()?;

    let vertex_count = reader.read_i32()?;
    let triangle_count = reader.read_i32()?;
    if vertex_count < 0 || triangle_count < 0 {
        return Err(SurfViewError::Input(format!(
            "negative counts in surface header ({vertex_count} vertices, \
             {triangle_count} triangles)"
        )));
    }
    debug!(
        vertices = vertex_count,
        triangles = triangle_count,
        "Parsing FreeSurfer surface"
    );

    let mut vertices = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        vertices.push([x, y, z]);
    }

    let mut triangles = Vec::with_capacity(triangle_count as usize);
    for _ in 0..triangle_count {
        let mut tri = [0u32; 3];
        for slot in &mut tri {
            let idx = reader.read_i32()?;
            if idx < 0 {
                return Err(SurfViewError::Input(format!(
                    "negative triangle index {idx}"
                )));
            }
            *slot = idx as u32;
        }
        triangles.push(tri);
    }

    Mesh::new(vertices, triangles)
}

/// Load a per-vertex morphometry file (`lh.thickness`, `lh.sulc`, ...),
/// named after `name`.
pub fn load_curv(path: &Path, name: &str) -> Result<VertexData> {
    let data = fs::read(path)
        .map_err(|e| SurfViewError::Input(format!("Failed to read curv: {e}")))?;
    let mut reader = Reader::new(&data);

    let magic = reader.take(3)?;
    if magic != CURV_MAGIC {
        return Err(SurfViewError::Input(format!(
            "{} is not a new-format FreeSurfer curv file",
            path.display()
        )));
    }

    let vertex_count = reader.read_i32()?;
    let _face_count = reader.read_i32()?;
    let values_per_vertex = reader.read_i32()?;
    if values_per_vertex != 1 {
        return Err(SurfViewError::Input(format!(
            "curv file has {values_per_vertex} values per vertex, expected 1"
        )));
    }
    if vertex_count < 0 {
        return Err(SurfViewError::Input(format!(
            "negative vertex count {vertex_count} in curv header"
        )));
    }

    let mut values = Vec::with_capacity(vertex_count as usize);
    for _ in 0..vertex_count {
        values.push(reader.read_f32()?);
    }

    Ok(VertexData::new(name, values))
}

/// One color-table entry as stored in an annot file.
struct TableEntry {
    id: u32,
    label: Label,
}

impl TableEntry {
    /// The per-vertex annotation code packing this entry's color.
    fn code(&self) -> u32 {
        let [r, g, b, _] = self.label.color;
        (r as u32) | ((g as u32) << 8) | ((b as u32) << 16)
    }
}

/// Load an annotation file (`lh.aparc.annot`) as a segmentation.
///
/// Per-vertex annotation codes pack the region color as R | G<<8 | B<<16;
/// the embedded color table recovers region names and ids. Codes that
/// match no table entry (including the conventional 0 for unknown)
/// become unlabeled vertices.
pub fn load_annot(path: &Path, name: &str) -> Result<Segmentation> {
    let data = fs::read(path)
        .map_err(|e| SurfViewError::Input(format!("Failed to read annot: {e}")))?;
    let mut reader = Reader::new(&data);

    let vertex_count = reader.read_i32()?;
    if vertex_count < 0 {
        return Err(SurfViewError::Input(format!(
            "negative vertex count {vertex_count} in annot header"
        )));
    }

    let mut codes = vec![0u32; vertex_count as usize];
    for _ in 0..vertex_count {
        let vertex = reader.read_i32()?;
        let code = reader.read_i32()?;
        if vertex < 0 || vertex >= vertex_count {
            return Err(SurfViewError::Input(format!(
                "annot vertex index {vertex} out of range"
            )));
        }
        codes[vertex as usize] = code as u32;
    }

    let has_table = reader.read_i32()?;
    if has_table == 0 {
        return Err(SurfViewError::Input(format!(
            "{} has no embedded color table",
            path.display()
        )));
    }

    let entries = read_color_table(&mut reader)?;
    debug!(
        vertices = vertex_count,
        entries = entries.len(),
        segmentation = name,
        "Parsing FreeSurfer annotation"
    );

    let by_code: HashMap<u32, u32> = entries
        .iter()
        .map(|entry| (entry.code(), entry.id))
        .collect();

    let mut unmatched = 0usize;
    let keys = codes
        .iter()
        .map(|code| match by_code.get(code) {
            Some(&id) => VertexLabel::Id(id),
            None => {
                if *code != 0 {
                    unmatched += 1;
                }
                VertexLabel::Unlabeled
            }
        })
        .collect();
    if unmatched > 0 {
        warn!(
            unmatched,
            "Annotation codes without a color-table entry were left unlabeled"
        );
    }

    let labels: BTreeMap<u32, Label> = entries
        .into_iter()
        .map(|entry| (entry.id, entry.label))
        .collect();

    Segmentation::new(name, keys, labels)
}

/// Read the embedded color table, original or version-2 layout.
fn read_color_table(reader: &mut Reader<'_>) -> Result<Vec<TableEntry>> {
    let first = reader.read_i32()?;

    if first > 0 {
        // Original layout: entry index doubles as the label id.
        let entry_count = first as usize;
        let _table_name = reader.read_string()?;

        let mut entries = Vec::with_capacity(entry_count);
        for id in 0..entry_count {
            entries.push(TableEntry {
                id: id as u32,
                label: read_table_label(reader)?,
            });
        }
        Ok(entries)
    } else {
        // Negative value encodes the layout version.
        let version = -first;
        if version != 2 {
            return Err(SurfViewError::Input(format!(
                "unsupported annot color table version {version}"
            )));
        }

        let _max_id = reader.read_i32()?;
        let _table_name = reader.read_string()?;
        let entry_count = reader.read_i32()?;
        if entry_count < 0 {
            return Err(SurfViewError::Input(format!(
                "negative color table entry count {entry_count}"
            )));
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            let id = reader.read_i32()?;
            if id < 0 {
                return Err(SurfViewError::InvariantViolation(format!(
                    "annot color table contains negative label id {id}"
                )));
            }
            entries.push(TableEntry {
                id: id as u32,
                label: read_table_label(reader)?,
            });
        }
        Ok(entries)
    }
}

/// Read one name + RGBA tuple from the color table.
fn read_table_label(reader: &mut Reader<'_>) -> Result<Label> {
    let name = reader.read_string()?;
    let r = reader.read_i32()?;
    let g = reader.read_i32()?;
    let b = reader.read_i32()?;
    // Fourth field is a transparency flag, 0 in every atlas shipped with
    // FreeSurfer.
    let _flag = reader.read_i32()?;

    for (channel, value) in [("red", r), ("green", g), ("blue", b)] {
        if !(0..=255).contains(&value) {
            return Err(SurfViewError::Input(format!(
                "color table {channel} value {value} out of range for '{name}'"
            )));
        }
    }

    Ok(Label::rgb(name, [r as u8, g as u8, b as u8]))
}

/// Load a surface from a FreeSurfer subject directory and attach every
/// readable morphometry file and annotation for the same hemisphere.
///
/// Missing attribute files are skipped with a warning; only the surface
/// itself is required.
pub fn load_subject_dir(
    dir: &Path,
    hemisphere: Hemisphere,
    surface: SurfaceKind,
) -> Result<Mesh> {
    let surf_path = dir
        .join("surf")
        .join(format!("{hemisphere}.{surface}"));
    if !surf_path.exists() {
        return Err(SurfViewError::Input(format!(
            "Surface not found: {}",
            surf_path.display()
        )));
    }

    let mut mesh = load_surface(&surf_path)?;

    for field in ["thickness", "curv", "sulc"] {
        let path = dir.join("surf").join(format!("{hemisphere}.{field}"));
        if !path.exists() {
            continue;
        }
        match load_curv(&path, field).and_then(|vd| mesh.add_vertex_data(vd)) {
            Ok(()) => debug!(field, "Attached morphometry"),
            Err(e) => warn!(field, error = %e, "Skipping morphometry file"),
        }
    }

    let label_dir = dir.join("label");
    if label_dir.is_dir() {
        let mut annot_paths: Vec<_> = fs::read_dir(&label_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                annot_name(path, hemisphere).is_some()
            })
            .collect();
        annot_paths.sort();

        for path in annot_paths {
            let name = annot_name(&path, hemisphere).unwrap_or_default();
            match load_annot(&path, &name).and_then(|seg| mesh.add_segmentation(seg)) {
                Ok(()) => debug!(segmentation = %name, "Attached annotation"),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping annotation"),
            }
        }
    }

    Ok(mesh)
}

/// Segmentation name for `label/{hemi}.NAME.annot`, or `None` if the
/// file belongs to the other hemisphere or is not an annot file.
fn annot_name(path: &Path, hemisphere: Hemisphere) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let prefix = format!("{hemisphere}.");
    file_name
        .strip_prefix(&prefix)?
        .strip_suffix(".annot")
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn push_i32(buf: &mut Vec<u8>, v: i32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }

    fn push_f32(buf: &mut Vec<u8>, v: f32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }

    fn push_string(buf: &mut Vec<u8>, s: &str) {
        push_i32(buf, s.len() as i32 + 1);
        buf.extend_from_slice(s.as_bytes());
        buf.push(0);
    }

    fn surface_bytes(vertices: &[[f32; 3]], triangles: &[[i32; 3]]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&SURFACE_MAGIC);
        buf.extend_from_slice(b"created by tests\n\n");
        push_i32(&mut buf, vertices.len() as i32);
        push_i32(&mut buf, triangles.len() as i32);
        for v in vertices {
            for &c in v {
                push_f32(&mut buf, c);
            }
        }
        for t in triangles {
            for &i in t {
                push_i32(&mut buf, i);
            }
        }
        buf
    }

    fn curv_bytes(values: &[f32]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&CURV_MAGIC);
        push_i32(&mut buf, values.len() as i32);
        push_i32(&mut buf, 0);
        push_i32(&mut buf, 1);
        for &v in values {
            push_f32(&mut buf, v);
        }
        buf
    }

    /// v2 annot: per-vertex codes plus (id, name, rgb) table entries.
    fn annot_bytes_v2(
        codes: &[u32],
        entries: &[(i32, &str, [u8; 3])],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        push_i32(&mut buf, codes.len() as i32);
        for (vertex, &code) in codes.iter().enumerate() {
            push_i32(&mut buf, vertex as i32);
            push_i32(&mut buf, code as i32);
        }
        push_i32(&mut buf, 1); // table present
        push_i32(&mut buf, -2); // version 2
        push_i32(&mut buf, entries.len() as i32);
        push_string(&mut buf, "test.ctab");
        push_i32(&mut buf, entries.len() as i32);
        for &(id, name, rgb) in entries {
            push_i32(&mut buf, id);
            push_string(&mut buf, name);
            push_i32(&mut buf, rgb[0] as i32);
            push_i32(&mut buf, rgb[1] as i32);
            push_i32(&mut buf, rgb[2] as i32);
            push_i32(&mut buf, 0);
        }
        buf
    }

    fn annot_bytes_old(codes: &[u32], entries: &[(&str, [u8; 3])]) -> Vec<u8> {
        let mut buf = Vec::new();
        push_i32(&mut buf, codes.len() as i32);
        for (vertex, &code) in codes.iter().enumerate() {
            push_i32(&mut buf, vertex as i32);
            push_i32(&mut buf, code as i32);
        }
        push_i32(&mut buf, 1);
        push_i32(&mut buf, entries.len() as i32);
        push_string(&mut buf, "old.ctab");
        for &(name, rgb) in entries {
            push_string(&mut buf, name);
            push_i32(&mut buf, rgb[0] as i32);
            push_i32(&mut buf, rgb[1] as i32);
            push_i32(&mut buf, rgb[2] as i32);
            push_i32(&mut buf, 0);
        }
        buf
    }

    fn write_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn code(rgb: [u8; 3]) -> u32 {
        (rgb[0] as u32) | ((rgb[1] as u32) << 8) | ((rgb[2] as u32) << 16)
    }

    #[test]
    fn surface_roundtrip() {
        let bytes = surface_bytes(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0, 1, 2]],
        );
        let file = write_file(&bytes);

        assert!(is_surface_file(file.path()));
        let mesh = load_surface(file.path()).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.triangles()[0], [0, 1, 2]);
    }

    #[test]
    fn surface_bad_magic_rejected() {
        let file = write_file(b"not a surface at all");
        assert!(!is_surface_file(file.path()));
        let err = load_surface(file.path()).unwrap_err();
        assert!(matches!(err, SurfViewError::Input(_)));
    }

    #[test]
    fn surface_truncated_rejected() {
        let mut bytes = surface_bytes(&[[0.0; 3]; 3], &[[0, 1, 2]]);
        bytes.truncate(bytes.len() - 6);
        let file = write_file(&bytes);
        let err = load_surface(file.path()).unwrap_err();
        assert!(err.to_string().contains("end of file"));
    }

    #[test]
    fn curv_roundtrip() {
        let file = write_file(&curv_bytes(&[1.5, -0.5, 2.25]));
        let field = load_curv(file.path(), "thickness").unwrap();
        assert_eq!(field.name, "thickness");
        assert_eq!(field.data, vec![1.5, -0.5, 2.25]);
    }

    #[test]
    fn curv_bad_magic_rejected() {
        let file = write_file(&surface_bytes(&[], &[]));
        assert!(load_curv(file.path(), "x").is_err());
    }

    #[test]
    fn annot_v2_roundtrip() {
        let red = [255u8, 0, 0];
        let blue = [0u8, 0, 255];
        let bytes = annot_bytes_v2(
            &[0, code(red), code(blue)],
            &[(7, "precentral", red), (9, "postcentral", blue)],
        );
        let file = write_file(&bytes);

        let seg = load_annot(file.path(), "aparc").unwrap();
        assert_eq!(seg.name(), "aparc");
        assert_eq!(
            seg.keys(),
            &[
                VertexLabel::Unlabeled,
                VertexLabel::Id(7),
                VertexLabel::Id(9)
            ]
        );
        assert_eq!(seg.label(7).unwrap().name, "precentral");
        assert_eq!(seg.label(9).unwrap().color, [0, 0, 255, 255]);
    }

    #[test]
    fn annot_old_layout_uses_entry_index_as_id() {
        let green = [0u8, 200, 0];
        let bytes = annot_bytes_old(&[code(green), 0], &[("cuneus", green)]);
        let file = write_file(&bytes);

        let seg = load_annot(file.path(), "aparc").unwrap();
        assert_eq!(
            seg.keys(),
            &[VertexLabel::Id(0), VertexLabel::Unlabeled]
        );
        assert_eq!(seg.label(0).unwrap().name, "cuneus");
    }

    #[test]
    fn annot_unmatched_code_is_unlabeled() {
        let red = [255u8, 0, 0];
        let bytes = annot_bytes_v2(&[code([1, 2, 3])], &[(7, "precentral", red)]);
        let file = write_file(&bytes);

        let seg = load_annot(file.path(), "aparc").unwrap();
        assert_eq!(seg.keys(), &[VertexLabel::Unlabeled]);
    }

    #[test]
    fn annot_without_table_rejected() {
        let mut buf = Vec::new();
        push_i32(&mut buf, 1);
        push_i32(&mut buf, 0);
        push_i32(&mut buf, 0);
        push_i32(&mut buf, 0); // no table
        let file = write_file(&buf);

        let err = load_annot(file.path(), "aparc").unwrap_err();
        assert!(err.to_string().contains("color table"));
    }

    #[test]
    fn subject_dir_assembles_attributes() {
        let tmp = tempfile::tempdir().unwrap();
        let surf_dir = tmp.path().join("surf");
        let label_dir = tmp.path().join("label");
        std::fs::create_dir_all(&surf_dir).unwrap();
        std::fs::create_dir_all(&label_dir).unwrap();

        std::fs::write(
            surf_dir.join("lh.white"),
            surface_bytes(&[[0.0; 3], [1.0; 3], [2.0; 3]], &[[0, 1, 2]]),
        )
        .unwrap();
        std::fs::write(surf_dir.join("lh.thickness"), curv_bytes(&[1.0, 2.0, 3.0]))
            .unwrap();

        let red = [255u8, 0, 0];
        std::fs::write(
            label_dir.join("lh.aparc.annot"),
            annot_bytes_v2(&[code(red); 3], &[(4, "precentral", red)]),
        )
        .unwrap();
        // other hemisphere, ignored
        std::fs::write(
            label_dir.join("rh.aparc.annot"),
            annot_bytes_v2(&[0, 0, 0], &[(4, "precentral", red)]),
        )
        .unwrap();

        let mesh =
            load_subject_dir(tmp.path(), Hemisphere::Left, SurfaceKind::White).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertex_data("thickness").unwrap().data, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.segmentations().len(), 1);
        assert_eq!(mesh.segmentation("aparc").unwrap().name(), "aparc");
    }

    #[test]
    fn subject_dir_missing_surface_is_input_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_subject_dir(tmp.path(), Hemisphere::Left, SurfaceKind::Pial)
            .unwrap_err();
        assert!(matches!(err, SurfViewError::Input(_)));
        assert!(err.to_string().contains("lh.pial"));
    }

    #[test]
    fn subject_dir_misaligned_curv_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let surf_dir = tmp.path().join("surf");
        std::fs::create_dir_all(&surf_dir).unwrap();

        std::fs::write(
            surf_dir.join("lh.white"),
            surface_bytes(&[[0.0; 3], [1.0; 3], [2.0; 3]], &[[0, 1, 2]]),
        )
        .unwrap();
        // only two values for a three-vertex surface
        std::fs::write(surf_dir.join("lh.curv"), curv_bytes(&[1.0, 2.0])).unwrap();

        let mesh =
            load_subject_dir(tmp.path(), Hemisphere::Left, SurfaceKind::White).unwrap();
        assert!(mesh.vertex_data("curv").is_err());
        assert!(mesh.vertex_data_fields().is_empty());
    }
}
