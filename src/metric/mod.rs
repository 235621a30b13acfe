pub mod attributes_error_metric;
pub mod error_metric_collection;
pub mod geometric_error_metric;
pub mod smooth_error_metric;
pub mod view_dependent_error_metric;

pub use attributes_error_metric::*;
pub use error_metric_collection::*;
pub use geometric_error_metric::*;
pub use smooth_error_metric::*;
pub use view_dependent_error_metric::*;

use std::{cell::RefCell, rc::Rc};

use crate::{
    cell::{AttributeSelection, GenericDataSet},
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

/// A rule deciding whether the linear approximation of an edge is accurate enough.
///
/// Every evaluation receives the two endpoints of the edge, the point of the
/// true (curved) cell at parameter `alpha` along the edge, and `alpha` itself,
/// which lies strictly inside `(0, 1)`. The three buffers share the same layout.
pub trait ErrorMetric<T: FloatingPoint> {
    /// Refresh the state derived from the dataset (reference size, attribute range).
    /// Called by the tessellator before a batch of cells is processed.
    fn prepare(&mut self, _context: &MetricContext<T>) {}

    /// Check if the edge `left`-`right` must be split at `mid`
    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool;

    /// Magnitude of the error compared by [`ErrorMetric::requires_edge_subdivision`], always `>= 0`
    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T;

    /// Stamp of the last configuration change
    fn stamp(&self) -> Stamp;
}

/// A metric shared between its owner, who tunes it, and the collections using it
pub type SharedErrorMetric<T> = Rc<RefCell<dyn ErrorMetric<T>>>;

/// Wrap a metric so it can be added to an [`ErrorMetricCollection`] and still be tuned afterwards
pub fn shared<M>(metric: M) -> Rc<RefCell<M>> {
    Rc::new(RefCell::new(metric))
}

/// Dataset dependent information handed to the metrics
#[derive(Clone, Debug, PartialEq)]
pub struct MetricContext<T: FloatingPoint> {
    diagonal: T,
    attribute: Option<AttributeSelection<T>>,
    stamp: Stamp,
}

impl<T: FloatingPoint> MetricContext<T> {
    pub fn new(diagonal: T, attribute: Option<AttributeSelection<T>>, stamp: Stamp) -> Self {
        Self {
            diagonal,
            attribute,
            stamp,
        }
    }

    pub fn from_dataset<D: GenericDataSet<T> + ?Sized>(dataset: &D) -> Self {
        Self {
            diagonal: dataset
                .bounding_box()
                .map(|b| b.diagonal_length())
                .unwrap_or(T::zero()),
            attribute: dataset.attribute_selection(),
            stamp: dataset.stamp(),
        }
    }

    /// Length of the dataset bounding box diagonal
    pub fn diagonal(&self) -> T {
        self.diagonal
    }

    pub fn attribute(&self) -> Option<&AttributeSelection<T>> {
        self.attribute.as_ref()
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }
}

/// Check the contract shared by every metric evaluation
#[inline]
pub(crate) fn debug_check_arguments<T: FloatingPoint>(
    left: &PointBuffer<T>,
    mid: &PointBuffer<T>,
    right: &PointBuffer<T>,
    alpha: T,
) {
    debug_assert!(
        alpha > T::zero() && alpha < T::one(),
        "alpha must lie strictly inside (0, 1), got {}",
        alpha.as_f64()
    );
    debug_assert!(
        left.len() == mid.len() && mid.len() == right.len(),
        "point buffers differ in length: {} {} {}",
        left.len(),
        mid.len(),
        right.len()
    );
}
