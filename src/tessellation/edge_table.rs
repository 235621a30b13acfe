use std::collections::HashMap;

use nalgebra::Point3;

use crate::{
    misc::FloatingPoint,
    point::{EdgeKey, PointId},
};

/// Decision taken for an edge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeState {
    /// The straight edge is accurate enough
    Accepted,
    /// The edge is split at the given midpoint
    Split(PointId),
}

impl EdgeState {
    pub fn is_split(&self) -> bool {
        matches!(self, EdgeState::Split(_))
    }
}

/// Cell independent data of a point: where it is and what it carries.
/// Parametric coordinates depend on the cell and are not stored.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointRecord<T: FloatingPoint> {
    pub global: Point3<T>,
    pub attributes: Vec<T>,
}

/// Midpoint cache shared by every cell processed by a tessellator.
///
/// Edges are keyed by their unordered endpoint ids, so the cells sharing an
/// edge all see the decision and the midpoint of the first one evaluating it.
#[derive(Clone, Debug, Default)]
pub struct EdgeTable<T: FloatingPoint> {
    points: HashMap<PointId, PointRecord<T>>,
    edges: HashMap<EdgeKey, EdgeState>,
    first_id: PointId,
    next_id: PointId,
}

impl<T: FloatingPoint> EdgeTable<T> {
    /// Create a table allocating new point ids from `first_id`
    pub fn new(first_id: PointId) -> Self {
        Self {
            points: HashMap::new(),
            edges: HashMap::new(),
            first_id,
            next_id: first_id,
        }
    }

    /// Forget every point and edge and allocate ids from `first_id` again
    pub fn reset(&mut self, first_id: PointId) {
        self.clear();
        self.first_id = first_id;
        self.next_id = first_id;
    }

    /// Forget every point and edge but keep allocating fresh ids,
    /// so ids already handed out are never reused for other points
    pub fn clear(&mut self) {
        self.points.clear();
        self.edges.clear();
    }

    /// Id the next synthesized point will get
    pub fn next_id(&self) -> PointId {
        self.next_id
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of points synthesized since the last reset
    pub fn number_of_allocated_points(&self) -> usize {
        self.next_id - self.first_id
    }

    pub fn point(&self, id: PointId) -> Option<&PointRecord<T>> {
        self.points.get(&id)
    }

    /// Record a point of the dataset
    pub fn insert_point(&mut self, id: PointId, record: PointRecord<T>) {
        self.points.insert(id, record);
    }

    /// Record a synthesized point and return its fresh id
    pub fn allocate_point(&mut self, record: PointRecord<T>) -> PointId {
        let id = self.next_id;
        self.next_id += 1;
        self.points.insert(id, record);
        id
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<EdgeState> {
        self.edges.get(key).copied()
    }

    pub fn insert_edge(&mut self, key: EdgeKey, state: EdgeState) {
        self.edges.insert(key, state);
    }

    /// Midpoint of a split edge
    pub fn midpoint(&self, key: &EdgeKey) -> Option<PointId> {
        match self.edges.get(key) {
            Some(EdgeState::Split(id)) => Some(*id),
            _ => None,
        }
    }
}
