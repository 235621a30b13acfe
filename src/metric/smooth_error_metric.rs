use log::warn;
use nalgebra::convert;

use crate::{
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

use super::{debug_check_arguments, ErrorMetric};

const MIN_ANGLE_TOLERANCE: f64 = 90.1;
const MAX_ANGLE_TOLERANCE: f64 = 179.9;

/// Subdivides edges that bend too sharply at their midpoint.
///
/// The angle at the midpoint between the directions to the two endpoints is
/// 180 degrees for a straight edge. The edge is split while that angle is
/// below the angle tolerance, which is kept inside `(90, 180)` degrees.
#[derive(Clone, Debug)]
pub struct SmoothErrorMetric<T: FloatingPoint> {
    angle_tolerance: T,
    cos_tolerance: T,
    stamp: Stamp,
}

impl<T: FloatingPoint> Default for SmoothErrorMetric<T> {
    fn default() -> Self {
        let angle_tolerance: T = convert(MIN_ANGLE_TOLERANCE);
        Self {
            angle_tolerance,
            cos_tolerance: degrees_cos(angle_tolerance),
            stamp: Stamp::now(),
        }
    }
}

fn degrees_cos<T: FloatingPoint>(degrees: T) -> T {
    (degrees * T::pi() / convert::<f64, T>(180.0)).cos()
}

impl<T: FloatingPoint> SmoothErrorMetric<T> {
    pub fn with_angle_tolerance(value: T) -> Self {
        let mut metric = Self::default();
        metric.set_angle_tolerance(value);
        metric
    }

    /// Angle tolerance in degrees
    pub fn angle_tolerance(&self) -> T {
        self.angle_tolerance
    }

    /// Cosine of the angle tolerance
    pub fn cos_tolerance(&self) -> T {
        self.cos_tolerance
    }

    /// Set the angle tolerance in degrees.
    /// Values at or below 90 become 90.1, values at or above 180 become 179.9.
    pub fn set_angle_tolerance(&mut self, value: T) {
        if value.as_f64().is_nan() {
            warn!("angle tolerance is not a number, ignoring it");
            return;
        }
        let clamped = if value <= convert::<f64, T>(90.0) {
            convert(MIN_ANGLE_TOLERANCE)
        } else if value >= convert::<f64, T>(180.0) {
            convert(MAX_ANGLE_TOLERANCE)
        } else {
            value
        };
        if clamped != value {
            warn!(
                "angle tolerance {} clamped to {}",
                value.as_f64(),
                clamped.as_f64()
            );
        }
        self.angle_tolerance = clamped;
        self.cos_tolerance = degrees_cos(clamped);
        self.stamp.modified();
    }

    /// Cosine of the angle at `mid`, -1 for a straight or degenerated edge
    fn cos_angle(left: &PointBuffer<T>, mid: &PointBuffer<T>, right: &PointBuffer<T>) -> T {
        let m = mid.global();
        let a = left.global() - m;
        let b = right.global() - m;
        let ab = a.norm_squared() * b.norm_squared();
        if ab <= T::zero() {
            return -T::one();
        }
        (a.dot(&b) / ab.sqrt()).clamp(-T::one(), T::one())
    }
}

impl<T: FloatingPoint> ErrorMetric<T> for SmoothErrorMetric<T> {
    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool {
        debug_check_arguments(left, mid, right, alpha);
        Self::cos_angle(left, mid, right) > self.cos_tolerance
    }

    /// Angle deficit in degrees: how far the angle at the midpoint is from a straight 180
    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        debug_check_arguments(left, mid, right, alpha);
        let angle = Self::cos_angle(left, mid, right).acos() * convert::<f64, T>(180.0) / T::pi();
        (convert::<f64, T>(180.0) - angle).max(T::zero())
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

    fn point(x: f64, y: f64) -> PointBuffer<f64> {
        PointBuffer::from_parts(&Point3::new(x, y, 0.), &Vector3::zeros(), &[])
    }

    #[test]
    fn angle_tolerance_is_clamped_inside_open_range() {
        let mut metric = SmoothErrorMetric::<f64>::default();
        metric.set_angle_tolerance(90.);
        assert_relative_eq!(metric.angle_tolerance(), 90.1);
        metric.set_angle_tolerance(180.);
        assert_relative_eq!(metric.angle_tolerance(), 179.9);
        metric.set_angle_tolerance(30.);
        assert_relative_eq!(metric.angle_tolerance(), 90.1);
        metric.set_angle_tolerance(120.);
        assert_relative_eq!(metric.angle_tolerance(), 120.);
        assert_relative_eq!(metric.cos_tolerance(), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn straight_edge_is_smooth() {
        let metric = SmoothErrorMetric::with_angle_tolerance(179.);
        let (l, m, r) = (point(0., 0.), point(1., 0.), point(2., 0.));
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0., epsilon = 1e-6);
    }

    #[test]
    fn sharp_bend_is_subdivided() {
        // right angle at the midpoint
        let (l, m, r) = (point(0., 0.), point(1., 1.), point(2., 0.));
        let metric = SmoothErrorMetric::with_angle_tolerance(120.);
        assert!(metric.requires_edge_subdivision(&l, &m, &r, 0.5));
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 90., epsilon = 1e-9);

        // 150 degrees at the midpoint
        let h = (15f64).to_radians().tan();
        let m = point(1., h);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));
        let strict = SmoothErrorMetric::with_angle_tolerance(160.);
        assert!(strict.requires_edge_subdivision(&l, &m, &r, 0.5));
        assert_relative_eq!(strict.error(&l, &m, &r, 0.5), 30., epsilon = 1e-9);
    }

    #[test]
    fn collapsed_midpoint_is_not_subdivided() {
        let metric = SmoothErrorMetric::with_angle_tolerance(179.);
        let (l, r) = (point(0., 0.), point(2., 0.));
        assert!(!metric.requires_edge_subdivision(&l, &l, &r, 0.5));
    }
}
