use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::render::MaterialConfig;

/// Cortical hemisphere, named the way FreeSurfer names its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Hemisphere {
    #[value(name = "lh")]
    Left,
    #[value(name = "rh")]
    Right,
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hemisphere::Left => write!(f, "lh"),
            Hemisphere::Right => write!(f, "rh"),
        }
    }
}

/// Reconstructed surface variant inside a subject directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SurfaceKind {
    #[value(name = "white")]
    White,
    #[value(name = "pial")]
    Pial,
    #[value(name = "inflated")]
    Inflated,
    #[value(name = "sphere")]
    Sphere,
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceKind::White => write!(f, "white"),
            SurfaceKind::Pial => write!(f, "pial"),
            SurfaceKind::Inflated => write!(f, "inflated"),
            SurfaceKind::Sphere => write!(f, "sphere"),
        }
    }
}

/// Where to load the mesh from: a mesh file or a FreeSurfer subject
/// directory plus hemisphere/surface choice.
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub path: PathBuf,
    pub hemisphere: Hemisphere,
    pub surface: SurfaceKind,
}

/// Resolved configuration for the `view` command.
#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub input: InputConfig,
    pub segmentation: Option<String>,
    pub vertex_data: Option<String>,
    pub output: Option<PathBuf>,
    pub material: MaterialConfig,
}

/// Resolved configuration for the `info` command.
#[derive(Debug, Clone)]
pub struct InfoConfig {
    pub input: InputConfig,
    pub json: bool,
}

/// The operation selected on the command line.
#[derive(Debug, Clone)]
pub enum AppCommand {
    View(ViewConfig),
    Info(InfoConfig),
}

/// Fully resolved application configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub command: AppCommand,
    pub verbose: bool,
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "surf-view",
    about = "Brain surface mesh inspector and viewer front-end",
    version
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export a (possibly colored) surface for an external mesh viewer
    View {
        /// Mesh file (PLY, OBJ, FreeSurfer surface) or subject directory
        input: PathBuf,

        /// Hemisphere when the input is a subject directory
        #[arg(long, value_enum, default_value = "lh")]
        hemisphere: Hemisphere,

        /// Surface variant when the input is a subject directory
        #[arg(long, value_enum, default_value = "white")]
        surface: SurfaceKind,

        /// Color vertices by the named segmentation
        #[arg(long, conflicts_with = "vertex_data")]
        segmentation: Option<String>,

        /// Color vertices by the named scalar field
        #[arg(long)]
        vertex_data: Option<String>,

        /// Output PLY path (default: input name with .ply extension)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Uniform material ambient term
        #[arg(long, default_value_t = 0.5)]
        ambient: f32,

        /// Uniform material diffuse term
        #[arg(long, default_value_t = 1.0)]
        diffuse: f32,

        /// Uniform material specular term
        #[arg(long, default_value_t = 0.2)]
        specular: f32,
    },
    /// Print an inventory of the mesh's geometry and attributes
    Info {
        /// Mesh file (PLY, OBJ, FreeSurfer surface) or subject directory
        input: PathBuf,

        /// Hemisphere when the input is a subject directory
        #[arg(long, value_enum, default_value = "lh")]
        hemisphere: Hemisphere,

        /// Surface variant when the input is a subject directory
        #[arg(long, value_enum, default_value = "white")]
        surface: SurfaceKind,

        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl From<CliArgs> for AppConfig {
    fn from(args: CliArgs) -> Self {
        let command = match args.command {
            Command::View {
                input,
                hemisphere,
                surface,
                segmentation,
                vertex_data,
                output,
                ambient,
                diffuse,
                specular,
            } => AppCommand::View(ViewConfig {
                input: InputConfig {
                    path: input,
                    hemisphere,
                    surface,
                },
                segmentation,
                vertex_data,
                output,
                material: MaterialConfig {
                    ambient,
                    diffuse,
                    specular,
                },
            }),
            Command::Info {
                input,
                hemisphere,
                surface,
                json,
            } => AppCommand::Info(InfoConfig {
                input: InputConfig {
                    path: input,
                    hemisphere,
                    surface,
                },
                json,
            }),
        };

        AppConfig {
            command,
            verbose: args.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hemisphere_display() {
        assert_eq!(Hemisphere::Left.to_string(), "lh");
        assert_eq!(Hemisphere::Right.to_string(), "rh");
    }

    #[test]
    fn surface_kind_display() {
        assert_eq!(SurfaceKind::White.to_string(), "white");
        assert_eq!(SurfaceKind::Pial.to_string(), "pial");
        assert_eq!(SurfaceKind::Inflated.to_string(), "inflated");
        assert_eq!(SurfaceKind::Sphere.to_string(), "sphere");
    }

    #[test]
    fn view_args_to_config() {
        let args = CliArgs::parse_from([
            "surf-view",
            "view",
            "subjects/bert",
            "--hemisphere",
            "rh",
            "--surface",
            "pial",
            "--segmentation",
            "aparc",
            "-o",
            "out.ply",
            "--ambient",
            "0.3",
            "-v",
        ]);

        let config: AppConfig = args.into();
        assert!(config.verbose);

        let AppCommand::View(view) = config.command else {
            panic!("expected view command");
        };
        assert_eq!(view.input.path, PathBuf::from("subjects/bert"));
        assert_eq!(view.input.hemisphere, Hemisphere::Right);
        assert_eq!(view.input.surface, SurfaceKind::Pial);
        assert_eq!(view.segmentation.as_deref(), Some("aparc"));
        assert_eq!(view.vertex_data, None);
        assert_eq!(view.output, Some(PathBuf::from("out.ply")));
        assert!((view.material.ambient - 0.3).abs() < f32::EPSILON);
        assert!((view.material.diffuse - 1.0).abs() < f32::EPSILON);
        assert!((view.material.specular - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn view_args_defaults() {
        let args = CliArgs::parse_from(["surf-view", "view", "mesh.ply"]);
        let config: AppConfig = args.into();

        let AppCommand::View(view) = config.command else {
            panic!("expected view command");
        };
        assert_eq!(view.input.hemisphere, Hemisphere::Left);
        assert_eq!(view.input.surface, SurfaceKind::White);
        assert_eq!(view.segmentation, None);
        assert_eq!(view.vertex_data, None);
        assert_eq!(view.output, None);
    }

    #[test]
    fn coloring_flags_conflict_at_cli() {
        let result = CliArgs::try_parse_from([
            "surf-view",
            "view",
            "mesh.ply",
            "--segmentation",
            "aparc",
            "--vertex-data",
            "thickness",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn info_args_to_config() {
        let args = CliArgs::parse_from(["surf-view", "info", "mesh.ply", "--json"]);
        let config: AppConfig = args.into();
        assert!(!config.verbose);

        let AppCommand::Info(info) = config.command else {
            panic!("expected info command");
        };
        assert_eq!(info.input.path, PathBuf::from("mesh.ply"));
        assert!(info.json);
    }
}
