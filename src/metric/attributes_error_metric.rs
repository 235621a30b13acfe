use log::warn;

use crate::{
    cell::AttributeSelection,
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

use super::{debug_check_arguments, ErrorMetric, MetricContext};

/// Subdivides edges along which the active attribute departs from a linear ramp.
///
/// The value stored at the midpoint is compared with the linear interpolation
/// of the endpoints at `alpha`. The tolerance is either absolute, or relative to
/// the range of the active attribute; the squared threshold is recomputed only
/// when the dataset stamp moves past the one it was computed against.
#[derive(Clone, Debug)]
pub struct AttributesErrorMetric<T: FloatingPoint> {
    attribute_tolerance: T,
    absolute_attribute_tolerance: T,
    defined_by_absolute: bool,
    square_absolute_attribute_tolerance: T,
    selection: Option<AttributeSelection<T>>,
    computed_at: Stamp,
    stamp: Stamp,
}

impl<T: FloatingPoint> Default for AttributesErrorMetric<T> {
    fn default() -> Self {
        let mut metric = Self {
            attribute_tolerance: nalgebra::convert(0.1),
            absolute_attribute_tolerance: T::one(),
            defined_by_absolute: false,
            square_absolute_attribute_tolerance: T::zero(),
            selection: None,
            computed_at: Stamp::zero(),
            stamp: Stamp::now(),
        };
        metric.compute_square_absolute_attribute_tolerance();
        metric
    }
}

impl<T: FloatingPoint> AttributesErrorMetric<T> {
    /// Create a metric with a tolerance relative to the attribute range
    pub fn with_relative_tolerance(value: T) -> Self {
        let mut metric = Self::default();
        metric.set_attribute_tolerance(value);
        metric
    }

    /// Create a metric with an absolute tolerance in attribute units
    pub fn with_absolute_tolerance(value: T) -> Self {
        let mut metric = Self::default();
        metric.set_absolute_attribute_tolerance(value);
        metric
    }

    /// Relative tolerance, a fraction of the attribute range
    pub fn attribute_tolerance(&self) -> T {
        self.attribute_tolerance
    }

    pub fn absolute_attribute_tolerance(&self) -> T {
        self.absolute_attribute_tolerance
    }

    /// Check if the absolute tolerance is the authoritative one
    pub fn is_defined_by_absolute(&self) -> bool {
        self.defined_by_absolute
    }

    /// Squared threshold in use
    pub fn square_absolute_attribute_tolerance(&self) -> T {
        self.square_absolute_attribute_tolerance
    }

    /// Set the relative tolerance. Non positive values are ignored, values above 1 are clamped to 1.
    /// A relative tolerance of 1 accepts every edge.
    pub fn set_attribute_tolerance(&mut self, value: T) {
        if !(value > T::zero()) {
            warn!(
                "attribute tolerance must be positive, ignoring {}",
                value.as_f64()
            );
            return;
        }
        let value = if value > T::one() {
            warn!("attribute tolerance {} clamped to 1", value.as_f64());
            T::one()
        } else {
            value
        };
        self.attribute_tolerance = value;
        self.defined_by_absolute = false;
        self.compute_square_absolute_attribute_tolerance();
        self.stamp.modified();
    }

    /// Set the absolute tolerance. Non positive values are ignored.
    pub fn set_absolute_attribute_tolerance(&mut self, value: T) {
        if !(value > T::zero()) {
            warn!(
                "absolute attribute tolerance must be positive, ignoring {}",
                value.as_f64()
            );
            return;
        }
        self.absolute_attribute_tolerance = value;
        self.defined_by_absolute = true;
        self.compute_square_absolute_attribute_tolerance();
        self.stamp.modified();
    }

    fn compute_square_absolute_attribute_tolerance(&mut self) {
        self.square_absolute_attribute_tolerance = if self.defined_by_absolute {
            self.absolute_attribute_tolerance * self.absolute_attribute_tolerance
        } else {
            let range = self
                .selection
                .as_ref()
                .map(|s| s.extent())
                .unwrap_or(T::zero());
            let d = range * self.attribute_tolerance;
            d * d
        };
    }

    fn never_subdivides(&self) -> bool {
        !self.defined_by_absolute && self.attribute_tolerance >= T::one()
    }

    /// Squared deviation of the midpoint attribute from the linear interpolation
    fn square_error(
        &self,
        selection: &AttributeSelection<T>,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        let deviation = |i: usize| {
            let l = left.attribute(i);
            let r = right.attribute(i);
            l + alpha * (r - l) - mid.attribute(i)
        };
        match (selection.component, selection.components) {
            (Some(c), _) => {
                let d = deviation(selection.offset + c);
                d * d
            }
            (None, n) => (selection.offset..selection.offset + n)
                .map(deviation)
                .fold(T::zero(), |acc, d| acc + d * d),
        }
    }
}

impl<T: FloatingPoint> ErrorMetric<T> for AttributesErrorMetric<T> {
    fn prepare(&mut self, context: &MetricContext<T>) {
        if context.stamp() > self.computed_at || self.selection.as_ref() != context.attribute() {
            self.selection = context.attribute().cloned();
            self.compute_square_absolute_attribute_tolerance();
            self.computed_at = context.stamp();
        }
    }

    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool {
        if self.never_subdivides() {
            return false;
        }
        self.error(left, mid, right, alpha) > self.square_absolute_attribute_tolerance
    }

    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        debug_check_arguments(left, mid, right, alpha);
        match &self.selection {
            Some(selection) => self.square_error(selection, left, mid, right, alpha),
            None => T::zero(),
        }
    }

    fn stamp(&self) -> Stamp {
        self.stamp
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    use super::*;

    fn point(x: f64, attributes: &[f64]) -> PointBuffer<f64> {
        PointBuffer::from_parts(&Point3::new(x, 0., 0.), &Vector3::zeros(), attributes)
    }

    fn context(range: (f64, f64), components: usize, component: Option<usize>) -> MetricContext<f64> {
        MetricContext::new(
            1.,
            Some(AttributeSelection {
                offset: 0,
                components,
                component,
                range,
            }),
            Stamp::now(),
        )
    }

    #[test]
    fn linear_ramp_never_subdivides() {
        let mut metric = AttributesErrorMetric::with_relative_tolerance(1e-6);
        metric.prepare(&context((0., 10.), 1, None));
        let (l, r) = (point(0., &[2.]), point(1., &[6.]));
        for alpha in [0.1, 0.25, 0.5, 0.9] {
            let m = point(alpha, &[2. + 4. * alpha]);
            assert!(!metric.requires_edge_subdivision(&l, &m, &r, alpha));
        }
    }

    #[test]
    fn error_is_squared_attribute_deviation() {
        let mut metric = AttributesErrorMetric::with_relative_tolerance(0.1);
        metric.prepare(&context((0., 10.), 1, None));
        assert_relative_eq!(metric.square_absolute_attribute_tolerance(), 1.);

        let (l, r) = (point(0., &[2.]), point(1., &[6.]));
        let m = point(0.5, &[4.5]);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0.25, epsilon = 1e-10);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));

        let m = point(0.5, &[5.5]);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 2.25, epsilon = 1e-10);
        assert!(metric.requires_edge_subdivision(&l, &m, &r, 0.5));
    }

    #[test]
    fn vector_attribute_compares_all_components() {
        let mut metric = AttributesErrorMetric::with_absolute_tolerance(0.6);
        metric.prepare(&context((0., 1.), 2, None));
        let (l, r) = (point(0., &[0., 0.]), point(1., &[0., 0.]));
        let m = point(0.5, &[0.3, 0.4]);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0.25, epsilon = 1e-10);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));

        metric.prepare(&context((0., 1.), 2, Some(1)));
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0.16, epsilon = 1e-10);
    }

    #[test]
    fn tolerance_is_recomputed_when_the_dataset_changes() {
        let mut metric = AttributesErrorMetric::with_relative_tolerance(0.5);
        let first = context((0., 2.), 1, None);
        metric.prepare(&first);
        assert_relative_eq!(metric.square_absolute_attribute_tolerance(), 1.);

        // same stamp, same selection: nothing to do
        metric.prepare(&first);
        assert_relative_eq!(metric.square_absolute_attribute_tolerance(), 1.);

        metric.prepare(&context((0., 4.), 1, None));
        assert_relative_eq!(metric.square_absolute_attribute_tolerance(), 4.);
    }

    #[test]
    fn full_range_tolerance_accepts_everything() {
        let mut metric = AttributesErrorMetric::with_relative_tolerance(3.);
        assert_eq!(metric.attribute_tolerance(), 1.);
        metric.prepare(&context((0., 1.), 1, None));
        let (l, r) = (point(0., &[0.]), point(1., &[0.]));
        let m = point(0.5, &[100.]);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));
    }

    #[test]
    fn without_attributes_nothing_is_measured() {
        let metric = AttributesErrorMetric::<f64>::with_absolute_tolerance(1e-3);
        let p = point(0., &[]);
        assert_eq!(metric.error(&p, &p, &p, 0.5), 0.);
        assert!(!metric.requires_edge_subdivision(&p, &p, &p, 0.5));
    }
}
