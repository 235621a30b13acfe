use log::warn;
use nalgebra::{convert, Matrix4, Point2, Point3, Vector2};

use crate::{
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

use super::{debug_check_arguments, ErrorMetric};

/// World to display mapping of a viewport
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewTransform<T: FloatingPoint> {
    /// Combined projection * view matrix, world to clip space
    world_to_clip: Matrix4<T>,
    /// Viewport size in pixels
    viewport: Vector2<T>,
}

impl<T: FloatingPoint> ViewTransform<T> {
    pub fn new(world_to_clip: Matrix4<T>, viewport: Vector2<T>) -> Self {
        Self {
            world_to_clip,
            viewport,
        }
    }

    pub fn world_to_clip(&self) -> &Matrix4<T> {
        &self.world_to_clip
    }

    pub fn viewport(&self) -> &Vector2<T> {
        &self.viewport
    }

    /// Project a world point to display coordinates in pixels.
    /// Returns `None` for points behind the eye.
    pub fn world_to_display(&self, point: &Point3<T>) -> Option<Point2<T>> {
        let clip = self.world_to_clip * point.to_homogeneous();
        if clip.w <= T::zero() {
            return None;
        }
        let half = T::half();
        let x = (clip.x / clip.w + T::one()) * half * self.viewport.x;
        let y = (clip.y / clip.w + T::one()) * half * self.viewport.y;
        Some(Point2::new(x, y))
    }
}

/// Subdivides edges whose projected midpoint is visibly off the projected chord.
///
/// The pixel tolerance is a squared distance in pixels; the default of 0.25
/// makes the interpolated midpoint land on the same pixel as the true one.
#[derive(Clone, Debug)]
pub struct ViewDependentErrorMetric<T: FloatingPoint> {
    pixel_tolerance: T,
    view: ViewTransform<T>,
    stamp: Stamp,
}

impl<T: FloatingPoint> ViewDependentErrorMetric<T> {
    pub fn new(view: ViewTransform<T>) -> Self {
        Self {
            pixel_tolerance: convert(0.25),
            view,
            stamp: Stamp::now(),
        }
    }

    pub fn with_pixel_tolerance(mut self, value: T) -> Self {
        self.set_pixel_tolerance(value);
        self
    }

    /// Squared pixel distance threshold
    pub fn pixel_tolerance(&self) -> T {
        self.pixel_tolerance
    }

    /// Set the squared pixel distance threshold. Non positive values are ignored.
    pub fn set_pixel_tolerance(&mut self, value: T) {
        if !(value > T::zero()) {
            warn!("pixel tolerance must be positive, ignoring {}", value.as_f64());
            return;
        }
        self.pixel_tolerance = value;
        self.stamp.modified();
    }

    pub fn view(&self) -> &ViewTransform<T> {
        &self.view
    }

    /// Update the viewing transform, e.g. after the camera moved
    pub fn set_view(&mut self, view: ViewTransform<T>) {
        self.view = view;
        self.stamp.modified();
    }

    fn projected_distance2(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
    ) -> Option<T> {
        let l = self.view.world_to_display(&left.global())?;
        let m = self.view.world_to_display(&mid.global())?;
        let r = self.view.world_to_display(&right.global())?;
        let u = r - l;
        let v = m - l;
        let uu = u.norm_squared();
        if uu <= T::default_epsilon() {
            return Some(v.norm_squared());
        }
        let cross = u.x * v.y - u.y * v.x;
        Some(cross * cross / uu)
    }
}

impl<T: FloatingPoint> ErrorMetric<T> for ViewDependentErrorMetric<T> {
    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool {
        self.error(left, mid, right, alpha) > self.pixel_tolerance
    }

    /// Squared pixel distance of the projected midpoint to the projected chord,
    /// 0 when a point is behind the eye
    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        debug_check_arguments(left, mid, right, alpha);
        self.projected_distance2(left, mid, right)
            .unwrap_or(T::zero())
    }

    fn stamp(&self) -> Stamp {
        self.stamp
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Point3, Vector2, Vector3};

    use super::*;

    fn point(x: f64, y: f64, z: f64) -> PointBuffer<f64> {
        PointBuffer::from_parts(&Point3::new(x, y, z), &Vector3::zeros(), &[])
    }

    /// Orthographic view of the [-1, 1]^2 square on a 200x100 viewport
    fn orthographic() -> ViewTransform<f64> {
        ViewTransform::new(Matrix4::identity(), Vector2::new(200., 100.))
    }

    #[test]
    fn projects_to_pixels() {
        let view = orthographic();
        let p = view.world_to_display(&Point3::new(0., 0., 0.)).unwrap();
        assert_relative_eq!(p, Point2::new(100., 50.));
        let p = view.world_to_display(&Point3::new(1., -1., 0.)).unwrap();
        assert_relative_eq!(p, Point2::new(200., 0.));
    }

    #[test]
    fn measures_squared_pixel_deviation() {
        let metric = ViewDependentErrorMetric::new(orthographic()).with_pixel_tolerance(1.);
        let (l, r) = (point(-0.5, 0., 0.), point(0.5, 0., 0.));

        // 0.01 world units along y is half a pixel on a 100 pixel high viewport
        let m = point(0., 0.01, 0.);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 0.25, epsilon = 1e-9);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));

        // depth is invisible in an orthographic projection
        let m = point(0., 0., 0.7);
        assert!(!metric.requires_edge_subdivision(&l, &m, &r, 0.5));

        let m = point(0., 0.1, 0.);
        assert_relative_eq!(metric.error(&l, &m, &r, 0.5), 25., epsilon = 1e-9);
        assert!(metric.requires_edge_subdivision(&l, &m, &r, 0.5));
    }

    #[test]
    fn points_behind_the_eye_are_ignored() {
        let mut flip = Matrix4::identity();
        flip[(3, 3)] = -1.;
        let metric = ViewDependentErrorMetric::new(ViewTransform::new(flip, Vector2::new(10., 10.)));
        let (l, m, r) = (point(0., 0., 0.), point(0., 5., 0.), point(1., 0., 0.));
        assert_eq!(metric.error(&l, &m, &r, 0.5), 0.);
    }

    #[test]
    fn pixel_tolerance_must_be_positive() {
        let mut metric = ViewDependentErrorMetric::new(orthographic());
        assert_relative_eq!(metric.pixel_tolerance(), 0.25);
        metric.set_pixel_tolerance(0.);
        assert_relative_eq!(metric.pixel_tolerance(), 0.25);
        metric.set_pixel_tolerance(4.);
        assert_relative_eq!(metric.pixel_tolerance(), 4.);
    }
}
