use std::collections::HashMap;

use log::warn;
use nalgebra::{convert, Point3};
use simba::scalar::SupersetOf;

use crate::{
    misc::{BoundingBox, FloatingPoint},
    point::{PointBuffer, PointId},
};

use super::{Simplex, TessellationSink};

/// Linear mesh gathered from the tessellation of many cells.
///
/// Points are merged by id, so a point shared by several cells (a dataset
/// point or the midpoint of a shared edge) appears once and the output is
/// watertight wherever the input was.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TessellationMesh<T: FloatingPoint> {
    index: HashMap<PointId, usize>,
    ids: Vec<PointId>,
    points: Vec<Point3<T>>,
    components: usize,
    attributes: Vec<T>,
    lines: Vec<[usize; 2]>,
    triangles: Vec<[usize; 3]>,
    tetrahedra: Vec<[usize; 4]>,
}

impl<T: FloatingPoint> TessellationMesh<T> {
    /// Create an empty mesh carrying `components` attribute components per point
    pub fn new(components: usize) -> Self {
        Self {
            index: HashMap::new(),
            ids: vec![],
            points: vec![],
            components,
            attributes: vec![],
            lines: vec![],
            triangles: vec![],
            tetrahedra: vec![],
        }
    }

    pub fn points(&self) -> &[Point3<T>] {
        &self.points
    }

    /// Tessellator id of every point
    pub fn ids(&self) -> &[PointId] {
        &self.ids
    }

    /// Local index of the point with tessellator id `id`
    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn number_of_components(&self) -> usize {
        self.components
    }

    /// Attribute components of every point, point after point
    pub fn attributes(&self) -> &[T] {
        &self.attributes
    }

    /// Attribute components of point `index`
    pub fn attribute(&self, index: usize) -> &[T] {
        &self.attributes[index * self.components..(index + 1) * self.components]
    }

    pub fn lines(&self) -> &[[usize; 2]] {
        &self.lines
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn tetrahedra(&self) -> &[[usize; 4]] {
        &self.tetrahedra
    }

    pub fn number_of_simplices(&self) -> usize {
        self.lines.len() + self.triangles.len() + self.tetrahedra.len()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox<T>> {
        BoundingBox::new_with_points(self.points.iter())
    }

    /// Cast the mesh to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> TessellationMesh<F> {
        TessellationMesh {
            index: self.index.clone(),
            ids: self.ids.clone(),
            points: self.points.iter().map(|p| p.cast()).collect(),
            components: self.components,
            attributes: self.attributes.iter().map(|a| convert(*a)).collect(),
            lines: self.lines.clone(),
            triangles: self.triangles.clone(),
            tetrahedra: self.tetrahedra.clone(),
        }
    }

    fn local<const N: usize>(&self, ids: &[PointId; N]) -> Option<[usize; N]> {
        let mut local = [0; N];
        for (l, id) in local.iter_mut().zip(ids.iter()) {
            *l = self.index_of(*id)?;
        }
        Some(local)
    }
}

impl<T: FloatingPoint> TessellationSink<T> for TessellationMesh<T> {
    fn insert_point(&mut self, id: PointId, point: &PointBuffer<T>) {
        if self.index.contains_key(&id) {
            return;
        }
        self.index.insert(id, self.points.len());
        self.ids.push(id);
        self.points.push(point.global());

        let attributes = point.attributes();
        if attributes.len() != self.components {
            warn!(
                "point {} carries {} attribute components, the mesh expects {}",
                id,
                attributes.len(),
                self.components
            );
        }
        let n = attributes.len().min(self.components);
        self.attributes.extend_from_slice(&attributes[..n]);
        self.attributes
            .resize(self.attributes.len() + self.components - n, T::zero());
    }

    fn insert_simplex(&mut self, simplex: Simplex) {
        let inserted = match &simplex {
            Simplex::Line(ids) => self.local(ids).map(|l| self.lines.push(l)),
            Simplex::Triangle(ids) => self.local(ids).map(|l| self.triangles.push(l)),
            Simplex::Tetrahedron(ids) => self.local(ids).map(|l| self.tetrahedra.push(l)),
        };
        if inserted.is_none() {
            warn!("{:?} refers to a point that was never inserted", simplex);
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point3, Vector3};

    use super::*;

    fn point(x: f64, a: f64) -> PointBuffer<f64> {
        PointBuffer::from_parts(&Point3::new(x, 0., 0.), &Vector3::zeros(), &[a])
    }

    #[test]
    fn merges_points_by_id() {
        let mut mesh = TessellationMesh::new(1);
        mesh.insert_point(7, &point(0., 1.));
        mesh.insert_point(3, &point(1., 2.));
        mesh.insert_point(9, &point(2., 3.));
        mesh.insert_simplex(Simplex::Triangle([7, 3, 9]));
        // the second cell sees the same points again
        mesh.insert_point(3, &point(1., 2.));
        mesh.insert_point(4, &point(3., 4.));
        mesh.insert_simplex(Simplex::Line([3, 4]));

        assert_eq!(mesh.points().len(), 4);
        assert_eq!(mesh.triangles(), &[[0, 1, 2]]);
        assert_eq!(mesh.lines(), &[[1, 3]]);
        assert_eq!(mesh.attribute(3), &[4.]);
        assert_eq!(mesh.index_of(9), Some(2));
        assert_eq!(mesh.ids(), &[7, 3, 9, 4]);
    }

    #[test]
    fn skips_simplices_with_unknown_points() {
        let mut mesh = TessellationMesh::new(1);
        mesh.insert_point(0, &point(0., 0.));
        mesh.insert_simplex(Simplex::Line([0, 1]));
        assert_eq!(mesh.number_of_simplices(), 0);
    }

    #[test]
    fn pads_missing_attributes() {
        let mut mesh = TessellationMesh::new(2);
        mesh.insert_point(0, &point(0., 5.));
        assert_eq!(mesh.attribute(0), &[5., 0.]);

        let single = mesh.cast::<f32>();
        assert_eq!(single.attribute(0), &[5f32, 0.]);
        assert_eq!(single.points()[0], Point3::new(0f32, 0., 0.));
    }
}
