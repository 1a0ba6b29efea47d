pub mod freesurfer;
pub mod obj_loader;
pub mod ply_loader;

use std::path::Path;

use tracing::info;

use crate::config::InputConfig;
use crate::error::{Result, SurfViewError};
use crate::types::Mesh;

/// Supported input kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Ply,
    Obj,
    FreeSurferSurface,
    FreeSurferSubjectDir,
}

impl InputFormat {
    /// Detect the input kind from the path: a directory is a FreeSurfer
    /// subject directory, known extensions pick their loader, and
    /// anything else must carry the FreeSurfer surface magic.
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Ok(InputFormat::FreeSurferSubjectDir);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "ply" => Ok(InputFormat::Ply),
            "obj" => Ok(InputFormat::Obj),
            _ if freesurfer::is_surface_file(path) => Ok(InputFormat::FreeSurferSurface),
            _ => Err(SurfViewError::Input(format!(
                "Unrecognized mesh input: {}",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Ply => "PLY",
            InputFormat::Obj => "OBJ",
            InputFormat::FreeSurferSurface => "FreeSurfer surface",
            InputFormat::FreeSurferSubjectDir => "FreeSurfer subject directory",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load a fully populated mesh from any supported input.
pub fn load(input: &InputConfig) -> Result<Mesh> {
    if !input.path.exists() {
        return Err(SurfViewError::Input(format!(
            "Input not found: {}",
            input.path.display()
        )));
    }

    let format = InputFormat::from_path(&input.path)?;
    info!(format = %format, path = %input.path.display(), "Detected input format");

    let mesh = match format {
        InputFormat::Ply => ply_loader::load_ply(&input.path)?,
        InputFormat::Obj => obj_loader::load_obj(&input.path)?,
        InputFormat::FreeSurferSurface => freesurfer::load_surface(&input.path)?,
        InputFormat::FreeSurferSubjectDir => {
            freesurfer::load_subject_dir(&input.path, input.hemisphere, input.surface)?
        }
    };

    info!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        segmentations = mesh.segmentations().len(),
        vertex_data = mesh.vertex_data_fields().len(),
        "Loaded mesh"
    );

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::{Hemisphere, SurfaceKind};

    #[test]
    fn format_detection_by_extension() {
        assert_eq!(
            InputFormat::from_path(Path::new("mesh.ply")).unwrap(),
            InputFormat::Ply
        );
        assert_eq!(
            InputFormat::from_path(Path::new("Mesh.PLY")).unwrap(),
            InputFormat::Ply
        );
        assert_eq!(
            InputFormat::from_path(Path::new("mesh.obj")).unwrap(),
            InputFormat::Obj
        );
    }

    #[test]
    fn format_detection_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(
            InputFormat::from_path(tmp.path()).unwrap(),
            InputFormat::FreeSurferSubjectDir
        );
    }

    #[test]
    fn format_detection_unrecognized() {
        assert!(InputFormat::from_path(Path::new("mesh.stl")).is_err());
    }

    #[test]
    fn load_missing_input() {
        let input = InputConfig {
            path: PathBuf::from("/nonexistent/lh.white"),
            hemisphere: Hemisphere::Left,
            surface: SurfaceKind::White,
        };
        let err = load(&input).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
