use crate::{
    misc::FloatingPoint,
    point::{PointBuffer, PointId},
};

/// A linear cell produced by the tessellation, as point ids
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Simplex {
    Line([PointId; 2]),
    Triangle([PointId; 3]),
    Tetrahedron([PointId; 4]),
}

impl Simplex {
    pub fn ids(&self) -> &[PointId] {
        match self {
            Simplex::Line(ids) => ids,
            Simplex::Triangle(ids) => ids,
            Simplex::Tetrahedron(ids) => ids,
        }
    }

    pub fn dimension(&self) -> usize {
        self.ids().len() - 1
    }
}

/// Receiver of the tessellation output.
///
/// For every cell, each distinct point is inserted once before the simplices
/// referring to it. Ids below the dataset point count are dataset points,
/// the others were synthesized at edge midpoints.
pub trait TessellationSink<T: FloatingPoint> {
    fn insert_point(&mut self, id: PointId, point: &PointBuffer<T>);
    fn insert_simplex(&mut self, simplex: Simplex);
}

/// Output of a single cell, points with their cell parametric coordinates
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellTessellation<T: FloatingPoint> {
    points: Vec<(PointId, PointBuffer<T>)>,
    simplices: Vec<Simplex>,
}

impl<T: FloatingPoint> CellTessellation<T> {
    pub fn new() -> Self {
        Self {
            points: vec![],
            simplices: vec![],
        }
    }

    pub fn points(&self) -> &[(PointId, PointBuffer<T>)] {
        &self.points
    }

    pub fn simplices(&self) -> &[Simplex] {
        &self.simplices
    }

    /// Find a point by id
    pub fn point(&self, id: PointId) -> Option<&PointBuffer<T>> {
        self.points.iter().find(|(i, _)| *i == id).map(|(_, p)| p)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.simplices.clear();
    }
}

impl<T: FloatingPoint> TessellationSink<T> for CellTessellation<T> {
    fn insert_point(&mut self, id: PointId, point: &PointBuffer<T>) {
        self.points.push((id, point.clone()));
    }

    fn insert_simplex(&mut self, simplex: Simplex) {
        self.simplices.push(simplex);
    }
}
