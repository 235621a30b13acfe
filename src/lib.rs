#![allow(clippy::needless_range_loop)]

mod cell;
mod metric;
mod misc;
mod point;
mod tessellation;

pub mod prelude {
    pub use crate::cell::*;
    pub use crate::metric::*;
    pub use crate::misc::*;
    pub use crate::point::*;
    pub use crate::tessellation::*;
}
