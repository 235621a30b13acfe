use nalgebra::{Point3, Vector3};

use crate::misc::FloatingPoint;

/// Offset of the parametric coordinates in a [`PointBuffer`]
pub const PARAMETRIC_OFFSET: usize = 3;

/// Offset of the first attribute component in a [`PointBuffer`]
pub const ATTRIBUTES_OFFSET: usize = 6;

/// A sample point of a cell with a fixed layout:
/// `[x, y, z, r, s, t, attr_0, .., attr_{k-1}]`
///
/// `xyz` are world coordinates, `rst` the parametric coordinates in the cell
/// that produced the point and the tail holds the `k` interpolated point
/// attribute components. Without attributes the tail is empty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointBuffer<T: FloatingPoint> {
    data: Vec<T>,
}

impl<T: FloatingPoint> PointBuffer<T> {
    /// Create a zeroed buffer carrying `components` attribute components
    pub fn new(components: usize) -> Self {
        Self {
            data: vec![T::zero(); ATTRIBUTES_OFFSET + components],
        }
    }

    /// Create a buffer from its three parts
    /// # Examples
    /// ```
    /// use nalgebra::{Point3, Vector3};
    /// use adaptess::prelude::PointBuffer;
    /// let p = PointBuffer::from_parts(&Point3::new(1., 2., 3.), &Vector3::new(0.5, 0., 0.), &[7.]);
    /// assert_eq!(p.as_slice(), &[1., 2., 3., 0.5, 0., 0., 7.]);
    /// assert_eq!(p.number_of_components(), 1);
    /// ```
    pub fn from_parts(global: &Point3<T>, parametric: &Vector3<T>, attributes: &[T]) -> Self {
        let mut data = Vec::with_capacity(ATTRIBUTES_OFFSET + attributes.len());
        data.extend_from_slice(global.coords.as_slice());
        data.extend_from_slice(parametric.as_slice());
        data.extend_from_slice(attributes);
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of attribute components `k`
    pub fn number_of_components(&self) -> usize {
        self.data.len() - ATTRIBUTES_OFFSET
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn global(&self) -> Point3<T> {
        Point3::new(self.data[0], self.data[1], self.data[2])
    }

    pub fn set_global(&mut self, global: &Point3<T>) {
        self.data[..PARAMETRIC_OFFSET].copy_from_slice(global.coords.as_slice());
    }

    pub fn parametric(&self) -> Vector3<T> {
        Vector3::new(
            self.data[PARAMETRIC_OFFSET],
            self.data[PARAMETRIC_OFFSET + 1],
            self.data[PARAMETRIC_OFFSET + 2],
        )
    }

    pub fn set_parametric(&mut self, parametric: &Vector3<T>) {
        self.data[PARAMETRIC_OFFSET..ATTRIBUTES_OFFSET].copy_from_slice(parametric.as_slice());
    }

    pub fn attributes(&self) -> &[T] {
        &self.data[ATTRIBUTES_OFFSET..]
    }

    pub fn attributes_mut(&mut self) -> &mut [T] {
        &mut self.data[ATTRIBUTES_OFFSET..]
    }

    /// Attribute component `index`
    pub fn attribute(&self, index: usize) -> T {
        self.data[ATTRIBUTES_OFFSET + index]
    }

    /// Resize the attribute tail to `components` entries, zeroing new slots
    pub fn resize(&mut self, components: usize) {
        self.data.resize(ATTRIBUTES_OFFSET + components, T::zero());
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point3, Vector3};

    use super::PointBuffer;

    #[test]
    fn layout_is_global_parametric_attributes() {
        let mut p = PointBuffer::<f64>::new(2);
        assert_eq!(p.len(), 8);
        p.set_global(&Point3::new(1., 2., 3.));
        p.set_parametric(&Vector3::new(0.25, 0.5, 0.));
        p.attributes_mut().copy_from_slice(&[4., 5.]);
        assert_eq!(p.as_slice(), &[1., 2., 3., 0.25, 0.5, 0., 4., 5.]);
        assert_eq!(p.global(), Point3::new(1., 2., 3.));
        assert_eq!(p.parametric(), Vector3::new(0.25, 0.5, 0.));
        assert_eq!(p.attribute(1), 5.);
    }

    #[test]
    fn no_attributes_means_empty_tail() {
        let p = PointBuffer::<f64>::new(0);
        assert_eq!(p.len(), 6);
        assert!(p.attributes().is_empty());
    }
}
