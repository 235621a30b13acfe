use nalgebra::{Point3, Vector3};

use crate::{
    misc::{BoundingBox, FloatingPoint, Stamp},
    point::PointId,
};

use super::{AttributeSelection, CellKind};

/// Dataset seen by the tessellator.
///
/// Only global information is needed here: the size of the point id space,
/// the extent used by relative tolerances and the layout of the point attributes
/// carried by every [`crate::point::PointBuffer`].
pub trait GenericDataSet<T: FloatingPoint> {
    /// Number of points, synthesized points get ids from this value on
    fn number_of_points(&self) -> usize;

    /// Number of interpolated point attribute components `k`
    fn number_of_point_components(&self) -> usize;

    /// Bounds of the points, `None` for an empty dataset
    fn bounding_box(&self) -> Option<BoundingBox<T>>;

    /// Active attribute as seen in the attribute tail of a point buffer
    fn attribute_selection(&self) -> Option<AttributeSelection<T>>;

    /// Stamp of the last modification
    fn stamp(&self) -> Stamp;
}

/// A higher-order cell handed to the tessellator
pub trait HigherOrderCell<T: FloatingPoint> {
    /// Unique id of the cell in its dataset
    fn id(&self) -> usize;

    fn kind(&self) -> CellKind;

    /// Global ids of the corner nodes
    fn point_ids(&self) -> &[PointId];

    /// Map parametric coordinates to world coordinates
    fn evaluate_location(&self, pcoords: &Vector3<T>) -> Point3<T>;

    /// Interpolate the point attribute components at `pcoords` into `attributes`.
    /// Components past the end of `attributes` are not written.
    fn interpolate_attributes(&self, pcoords: &Vector3<T>, attributes: &mut [T]);

    /// Dataset the cell belongs to
    fn dataset(&self) -> &dyn GenericDataSet<T>;
}
