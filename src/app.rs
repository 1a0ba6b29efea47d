use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::info;

use crate::color::ColorSelection;
use crate::config::{AppCommand, AppConfig, InfoConfig, InputConfig, ViewConfig};
use crate::error::{Result, SurfViewError};
use crate::ingestion;
use crate::render::{self, RenderPayload};
use crate::report::{summarize, MeshSummary};

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunResult {
    pub duration: Duration,
}

/// Application driver -- dispatches the `view` and `info` commands.
pub struct App;

impl App {
    pub fn run(config: &AppConfig) -> Result<RunResult> {
        let start = Instant::now();

        match &config.command {
            AppCommand::Info(info) => Self::info(info)?,
            AppCommand::View(view) => Self::view(view)?,
        }

        Ok(RunResult {
            duration: start.elapsed(),
        })
    }

    /// Load the mesh and print its inventory.
    fn info(config: &InfoConfig) -> Result<()> {
        let mesh = ingestion::load(&config.input)?;

        if config.json {
            let summary = MeshSummary::collect(&mesh);
            let json = serde_json::to_string_pretty(&summary).map_err(|e| {
                SurfViewError::Output(format!("Failed to serialize summary: {e}"))
            })?;
            println!("{json}");
        } else {
            print!("{}", summarize(&mesh));
        }
        Ok(())
    }

    /// Load the mesh, resolve the coloring selection, and write the
    /// render payload for an external viewer.
    fn view(config: &ViewConfig) -> Result<()> {
        let mesh = ingestion::load(&config.input)?;

        let selection = ColorSelection::from_flags(
            config.segmentation.clone(),
            config.vertex_data.clone(),
        )?;
        info!(selection = %selection, "Resolving surface colors");

        let payload = RenderPayload::build(&mesh, &selection, config.material)?;
        let output = config
            .output
            .clone()
            .unwrap_or_else(|| default_output(&config.input));
        render::write_ply(&payload, &output)?;

        println!(
            "Wrote {} ({} vertices, {} triangles, {})",
            output.display(),
            payload.vertex_count(),
            payload.triangle_count(),
            match &payload.colors {
                Some(_) => "per-vertex colors",
                None => "uniform material",
            }
        );
        println!("Open it in any mesh viewer, e.g. `meshlab {}`", output.display());
        Ok(())
    }
}

/// Output path when `-o` is not given: next to the current directory,
/// never on top of the input.
fn default_output(input: &InputConfig) -> PathBuf {
    if input.path.is_dir() {
        PathBuf::from(format!("{}.{}.view.ply", input.hemisphere, input.surface))
    } else {
        input.path.with_extension("view.ply")
    }
}
