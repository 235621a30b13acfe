pub mod edge_key;
pub mod point_buffer;

pub use edge_key::*;
pub use point_buffer::*;
