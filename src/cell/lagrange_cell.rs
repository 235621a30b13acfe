use nalgebra::{Point3, Vector3};

use crate::{misc::FloatingPoint, point::PointId};

use super::{CellKind, GenericDataSet, HigherOrderCell, UnstructuredGrid, MAX_CELL_NODES};

/// A cell of an [`UnstructuredGrid`] interpolated with its Lagrange shape functions
#[derive(Clone, Copy, Debug)]
pub struct LagrangeCell<'a, T: FloatingPoint> {
    id: usize,
    kind: CellKind,
    nodes: &'a [PointId],
    grid: &'a UnstructuredGrid<T>,
}

impl<'a, T: FloatingPoint> LagrangeCell<'a, T> {
    pub(crate) fn new(
        id: usize,
        kind: CellKind,
        nodes: &'a [PointId],
        grid: &'a UnstructuredGrid<T>,
    ) -> Self {
        Self {
            id,
            kind,
            nodes,
            grid,
        }
    }

    fn weights(&self, pcoords: &Vector3<T>) -> [T; MAX_CELL_NODES] {
        let mut weights = [T::zero(); MAX_CELL_NODES];
        self.kind.shape_functions(pcoords, &mut weights);
        weights
    }
}

impl<T: FloatingPoint> HigherOrderCell<T> for LagrangeCell<'_, T> {
    fn id(&self) -> usize {
        self.id
    }

    fn kind(&self) -> CellKind {
        self.kind
    }

    fn point_ids(&self) -> &[PointId] {
        &self.nodes[..self.kind.number_of_corners()]
    }

    fn evaluate_location(&self, pcoords: &Vector3<T>) -> Point3<T> {
        let weights = self.weights(pcoords);
        let points = self.grid.points();
        let coords = self
            .nodes
            .iter()
            .zip(weights.iter())
            .fold(Vector3::zeros(), |acc, (&id, &w)| acc + points[id].coords * w);
        Point3::from(coords)
    }

    fn interpolate_attributes(&self, pcoords: &Vector3<T>, attributes: &mut [T]) {
        let weights = self.weights(pcoords);
        let components = self
            .grid
            .attributes()
            .iter()
            .flat_map(|attribute| (0..attribute.number_of_components()).map(move |c| (attribute, c)));
        for (value, (attribute, c)) in attributes.iter_mut().zip(components) {
            *value = self
                .nodes
                .iter()
                .zip(weights.iter())
                .fold(T::zero(), |acc, (&id, &w)| acc + attribute.tuple(id)[c] * w);
        }
    }

    fn dataset(&self) -> &dyn GenericDataSet<T> {
        self.grid
    }
}
