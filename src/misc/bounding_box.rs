use nalgebra::{Point3, Vector3};
use simba::scalar::SupersetOf;

use crate::misc::FloatingPoint;

/// An axis aligned bounding box in 3D space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox<T: FloatingPoint> {
    min: Vector3<T>,
    max: Vector3<T>,
}

impl<T: FloatingPoint> BoundingBox<T> {
    /// Create a new bounding box from two opposite corners.
    pub fn new(a: Vector3<T>, b: Vector3<T>) -> Self {
        Self {
            min: a.zip_map(&b, |x, y| x.min(y)),
            max: a.zip_map(&b, |x, y| x.max(y)),
        }
    }

    /// Create a new bounding box from point iterator.
    /// Returns `None` if the iterator is empty.
    pub fn new_with_points<'a, I: IntoIterator<Item = &'a Point3<T>>>(iter: I) -> Option<Self> {
        let mut iter = iter.into_iter();
        let first = iter.next()?;
        let mut min = first.coords;
        let mut max = first.coords;

        for point in iter {
            for i in 0..3 {
                min[i] = min[i].min(point[i]);
                max[i] = max[i].max(point[i]);
            }
        }

        Some(Self { min, max })
    }

    pub fn min(&self) -> &Vector3<T> {
        &self.min
    }

    pub fn max(&self) -> &Vector3<T> {
        &self.max
    }

    pub fn center(&self) -> Vector3<T> {
        (self.min + self.max) * T::half()
    }

    pub fn size(&self) -> Vector3<T> {
        self.max - self.min
    }

    /// Length of the box diagonal.
    /// Used as the reference size of relative tolerances.
    /// # Examples
    /// ```
    /// use nalgebra::Vector3;
    /// use adaptess::prelude::BoundingBox;
    /// let bb = BoundingBox::new(Vector3::new(0., 0., 0.), Vector3::new(3., 4., 0.));
    /// assert_eq!(bb.diagonal_length(), 5.);
    /// ```
    pub fn diagonal_length(&self) -> T {
        self.size().norm()
    }

    /// Check if the bounding box contains a point, allowing `tolerance` slack on every side.
    /// # Examples
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use adaptess::prelude::BoundingBox;
    /// let bb = BoundingBox::new(Vector3::from_element(0.), Vector3::from_element(1.));
    /// assert!(bb.contains(&Point3::new(0.5, 0.5, 0.5), 0.));
    /// assert!(bb.contains(&Point3::new(0., 0.5, 1.0), 0.));
    /// assert!(!bb.contains(&Point3::new(-1e-8, 0.5, 0.5), 0.));
    /// assert!(bb.contains(&Point3::new(-1e-8, 0.5, 0.5), 1e-6));
    /// ```
    pub fn contains(&self, point: &Point3<T>, tolerance: T) -> bool {
        (0..3).all(|i| self.min[i] - tolerance <= point[i] && point[i] <= self.max[i] + tolerance)
    }

    /// Cast the bounding box to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> BoundingBox<F> {
        BoundingBox {
            min: self.min.cast(),
            max: self.max.cast(),
        }
    }
}
