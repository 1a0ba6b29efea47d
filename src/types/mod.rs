pub mod mesh;
pub mod segmentation;

pub use mesh::{Mesh, VertexData};
pub use segmentation::{Label, Segmentation, VertexLabel};
