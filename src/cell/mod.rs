pub mod attribute;
pub mod cell_kind;
pub mod dataset;
pub mod lagrange_cell;
pub mod unstructured_grid;

pub use attribute::*;
pub use cell_kind::*;
pub use dataset::*;
pub use lagrange_cell::*;
pub use unstructured_grid::*;
