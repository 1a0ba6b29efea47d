pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod render;
pub mod report;
pub mod types;

pub use color::{resolve_colors, ColorSelection};
pub use render::{MaterialConfig, RenderPayload};
pub use types::{Label, Mesh, Segmentation, VertexData, VertexLabel};
