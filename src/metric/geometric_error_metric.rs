use log::warn;
use nalgebra::Point3;

use crate::{
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

use super::{debug_check_arguments, ErrorMetric, MetricContext};

/// Squared distance from `point` to the line through `a` and `b`.
/// Falls back to the squared distance to `a` when the line is degenerated.
pub fn distance2_line_point<T: FloatingPoint>(a: &Point3<T>, b: &Point3<T>, point: &Point3<T>) -> T {
    let u = b - a;
    let v = point - a;
    let uu = u.norm_squared();
    if uu <= T::default_epsilon() {
        v.norm_squared()
    } else {
        u.cross(&v).norm_squared() / uu
    }
}

/// Subdivides edges whose midpoint lies too far from the straight chord.
///
/// The tolerance is a squared world distance. It is either given directly
/// (absolute) or as a fraction of the dataset bounding box diagonal (relative),
/// in which case it is resolved when the metric is prepared against a dataset.
#[derive(Clone, Debug)]
pub struct GeometricErrorMetric<T: FloatingPoint> {
    absolute_geometric_tolerance: T,
    relative_geometric_tolerance: Option<T>,
    smallest_size: T,
    stamp: Stamp,
}

impl<T: FloatingPoint> Default for GeometricErrorMetric<T> {
    fn default() -> Self {
        Self {
            absolute_geometric_tolerance: T::one(),
            relative_geometric_tolerance: None,
            smallest_size: T::one(),
            stamp: Stamp::now(),
        }
    }
}

impl<T: FloatingPoint> GeometricErrorMetric<T> {
    /// Create a metric with a squared absolute tolerance
    pub fn with_absolute_tolerance(value: T) -> Self {
        let mut metric = Self::default();
        metric.set_absolute_geometric_tolerance(value);
        metric
    }

    /// Create a metric with a tolerance relative to the dataset size
    pub fn with_relative_tolerance(value: T) -> Self {
        let mut metric = Self::default();
        metric.set_relative_geometric_tolerance(value);
        metric
    }

    /// Squared distance threshold in use
    pub fn absolute_geometric_tolerance(&self) -> T {
        self.absolute_geometric_tolerance
    }

    /// Relative tolerance when the metric is defined relatively
    pub fn relative_geometric_tolerance(&self) -> Option<T> {
        self.relative_geometric_tolerance
    }

    pub fn is_relative(&self) -> bool {
        self.relative_geometric_tolerance.is_some()
    }

    /// Reference size of the relative tolerance
    pub fn smallest_size(&self) -> T {
        self.smallest_size
    }

    /// Set the squared distance threshold. Non positive values are ignored.
    pub fn set_absolute_geometric_tolerance(&mut self, value: T) {
        if !(value > T::zero()) {
            warn!(
                "absolute geometric tolerance must be positive, ignoring {}",
                value.as_f64()
            );
            return;
        }
        self.relative_geometric_tolerance = None;
        self.absolute_geometric_tolerance = value;
        self.stamp.modified();
    }

    /// Set the tolerance as a fraction of the dataset bounding box diagonal.
    /// Non positive values are ignored and values above 1 are clamped to 1.
    pub fn set_relative_geometric_tolerance(&mut self, value: T) {
        if !(value > T::zero()) {
            warn!(
                "relative geometric tolerance must be positive, ignoring {}",
                value.as_f64()
            );
            return;
        }
        let value = if value > T::one() {
            warn!(
                "relative geometric tolerance {} clamped to 1",
                value.as_f64()
            );
            T::one()
        } else {
            value
        };
        self.relative_geometric_tolerance = Some(value);
        self.update_absolute_tolerance();
        self.stamp.modified();
    }

    fn update_absolute_tolerance(&mut self) {
        if let Some(relative) = self.relative_geometric_tolerance {
            let d = relative * self.smallest_size;
            // keep the threshold positive for flat or empty datasets
            self.absolute_geometric_tolerance = (d * d).max(T::default_epsilon());
        }
    }
}

impl<T: FloatingPoint> ErrorMetric<T> for GeometricErrorMetric<T> {
    fn prepare(&mut self, context: &MetricContext<T>) {
        if self.is_relative() && self.smallest_size != context.diagonal() {
            self.smallest_size = context.diagonal();
            self.update_absolute_tolerance();
        }
    }

    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool {
        self.error(left, mid, right, alpha) > self.absolute_geometric_tolerance
    }

    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        debug_check_arguments(left, mid, right, alpha);
        distance2_line_point(&left.global(), &right.global(), &mid.global())
    }

    fn stamp(&self) -> Stamp {
        self.stamp
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn point(x: f64, y: f64, z: f64) -> PointBuffer<f64> {
        PointBuffer::from_parts(&Point3::new(x, y, z), &Vector3::zeros(), &[])
    }

    #[test]
    fn collinear_midpoint_never_subdivides() {
        let mut rng = StdRng::seed_from_u64(7);
        let metric = GeometricErrorMetric::with_absolute_tolerance(1e-12);
        for _ in 0..100 {
            let a: Point3<f64> = Point3::new(rng.random(), rng.random(), rng.random());
            let b: Point3<f64> = Point3::new(rng.random(), rng.random(), rng.random());
            let t: f64 = rng.random_range(0.05..0.95);
            let m = a + (b - a) * t;
            let (l, m, r) = (
                point(a.x, a.y, a.z),
                point(m.x, m.y, m.z),
                point(b.x, b.y, b.z),
            );
            assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));
        }
    }

    #[test]
    fn error_is_squared_deviation() {
        let l = point(0., 0., 0.);
        let r = point(2., 0., 0.);
        let m = point(1., 0.3, 0.);

        let metric = GeometricErrorMetric::with_absolute_tolerance(0.1);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0.09, epsilon = 1e-10);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));

        let metric = GeometricErrorMetric::with_absolute_tolerance(0.08);
        assert!(metric.requires_edge_subdivision(&l, &m, &r, 0.5));
    }

    #[test]
    fn degenerated_edge_uses_point_distance() {
        let l = point(1., 1., 1.);
        let m = point(1., 1., 3.);
        let metric = GeometricErrorMetric::with_absolute_tolerance(1.);
        assert_relative_eq!(metric.error(&l, &m, &l, 0.5), 4., epsilon = 1e-10);
        assert!(metric.requires_edge_subdivision(&l, &m, &l, 0.5));
    }

    #[test]
    fn relative_tolerance_follows_dataset_size() {
        let mut metric = GeometricErrorMetric::with_relative_tolerance(0.01);
        metric.prepare(&MetricContext::new(10., None, Stamp::now()));
        assert_relative_eq!(metric.absolute_geometric_tolerance(), 0.01, epsilon = 1e-12);
        assert_relative_eq!(metric.smallest_size(), 10.);

        metric.set_relative_geometric_tolerance(4.);
        assert_eq!(metric.relative_geometric_tolerance(), Some(1.));
        assert_relative_eq!(metric.absolute_geometric_tolerance(), 100., epsilon = 1e-12);
    }

    #[test]
    fn invalid_tolerances_are_ignored() {
        let mut metric = GeometricErrorMetric::with_absolute_tolerance(0.5);
        let stamp = metric.stamp();
        metric.set_absolute_geometric_tolerance(0.);
        metric.set_absolute_geometric_tolerance(-1.);
        metric.set_relative_geometric_tolerance(f64::NAN);
        assert_eq!(metric.absolute_geometric_tolerance(), 0.5);
        assert!(!metric.is_relative());
        assert_eq!(metric.stamp(), stamp);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "alpha")]
    fn alpha_on_an_endpoint_is_a_contract_violation() {
        let l = point(0., 0., 0.);
        let metric = GeometricErrorMetric::with_absolute_tolerance(0.5);
        metric.requires_edge_subdivision(&l, &l, &l, 1.);
    }
}
