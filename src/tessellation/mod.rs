pub mod edge_statistics;
pub mod edge_table;
pub mod options;
pub mod report;
pub mod simple_cell_tessellator;
pub mod sink;
pub mod tessellation_mesh;

pub use edge_statistics::*;
pub use edge_table::*;
pub use options::*;
pub use report::*;
pub use simple_cell_tessellator::*;
pub use sink::*;
pub use tessellation_mesh::*;

/// A trait for tessellating a shape
pub trait Tessellation<Opt> {
    type Output;
    fn tessellate(&self, options: Opt) -> Self::Output;
}
