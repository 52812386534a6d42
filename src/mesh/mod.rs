pub mod builder;
pub mod grid;
pub mod stl;
pub mod validation;
pub mod writer;

pub use builder::Triangle;
pub use grid::{MeshConfig, VertexGrid, generate_vertex_grid};
pub use stl::{estimate_stl_size, serialize_terrain, triangle_count, write_stl};
pub use validation::{StlReport, inspect_stl};
