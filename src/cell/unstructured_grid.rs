use std::collections::HashMap;

use itertools::Itertools;
use nalgebra::Point3;

use crate::{
    misc::{BoundingBox, FloatingPoint, Stamp},
    point::PointId,
};

use super::{AttributeSelection, CellKind, GenericDataSet, LagrangeCell, PointAttribute};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct CellRecord {
    kind: CellKind,
    nodes: Vec<PointId>,
}

/// A face of a 3D cell, given by the cell index and its local face index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellFace {
    pub cell: usize,
    pub face: usize,
}

/// A minimal unstructured dataset of higher-order cells with point attributes
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnstructuredGrid<T: FloatingPoint> {
    points: Vec<Point3<T>>,
    cells: Vec<CellRecord>,
    attributes: Vec<PointAttribute<T>>,
    active_attribute: Option<usize>,
    active_component: Option<usize>,
    stamp: Stamp,
}

impl<T: FloatingPoint> UnstructuredGrid<T> {
    pub fn new(points: Vec<Point3<T>>) -> Self {
        Self {
            points,
            cells: vec![],
            attributes: vec![],
            active_attribute: None,
            active_component: None,
            stamp: Stamp::now(),
        }
    }

    pub fn points(&self) -> &[Point3<T>] {
        &self.points
    }

    pub fn attributes(&self) -> &[PointAttribute<T>] {
        &self.attributes
    }

    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// Append a cell and return its index
    pub fn try_add_cell(&mut self, kind: CellKind, nodes: &[PointId]) -> anyhow::Result<usize> {
        anyhow::ensure!(
            nodes.len() == kind.number_of_nodes(),
            "{:?} needs {} nodes, got {}",
            kind,
            kind.number_of_nodes(),
            nodes.len()
        );
        if let Some(id) = nodes.iter().find(|&&id| id >= self.points.len()) {
            anyhow::bail!(
                "Node {} is out of range, the grid has {} points",
                id,
                self.points.len()
            );
        }
        anyhow::ensure!(
            nodes.iter().all_unique(),
            "Cell nodes must be distinct, got {:?}",
            nodes
        );

        self.cells.push(CellRecord {
            kind,
            nodes: nodes.to_vec(),
        });
        self.stamp.modified();
        Ok(self.cells.len() - 1)
    }

    /// Append a point attribute and return its index.
    /// The first attribute added becomes the active one.
    pub fn try_add_attribute(&mut self, attribute: PointAttribute<T>) -> anyhow::Result<usize> {
        anyhow::ensure!(
            attribute.number_of_tuples() == self.points.len(),
            "Attribute {} has {} tuples for {} points",
            attribute.name(),
            attribute.number_of_tuples(),
            self.points.len()
        );
        self.attributes.push(attribute);
        if self.active_attribute.is_none() {
            self.active_attribute = Some(self.attributes.len() - 1);
        }
        self.stamp.modified();
        Ok(self.attributes.len() - 1)
    }

    /// Select the attribute (and optionally the single component) driving attribute error metrics
    pub fn try_set_active_attribute(
        &mut self,
        index: usize,
        component: Option<usize>,
    ) -> anyhow::Result<()> {
        let attribute = self
            .attributes
            .get(index)
            .ok_or_else(|| anyhow::anyhow!("No attribute at index {}", index))?;
        if let Some(c) = component {
            anyhow::ensure!(
                c < attribute.number_of_components(),
                "Attribute {} has no component {}",
                attribute.name(),
                c
            );
        }
        self.active_attribute = Some(index);
        self.active_component = component;
        self.stamp.modified();
        Ok(())
    }

    pub fn active_attribute(&self) -> Option<&PointAttribute<T>> {
        self.active_attribute.and_then(|i| self.attributes.get(i))
    }

    /// Move a point, e.g. to deform the mesh between two tessellations
    pub fn try_set_point(&mut self, id: PointId, point: Point3<T>) -> anyhow::Result<()> {
        let p = self
            .points
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("No point with id {}", id))?;
        *p = point;
        self.stamp.modified();
        Ok(())
    }

    pub fn cell(&self, index: usize) -> Option<LagrangeCell<'_, T>> {
        self.cells
            .get(index)
            .map(|c| LagrangeCell::new(index, c.kind, &c.nodes, self))
    }

    pub fn cells(&self) -> impl Iterator<Item = LagrangeCell<'_, T>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| LagrangeCell::new(i, c.kind, &c.nodes, self))
    }

    /// Count the cells using each face (as a sorted triple of corner ids)
    fn face_uses(&self) -> HashMap<[PointId; 3], usize> {
        let mut uses: HashMap<[PointId; 3], usize> = HashMap::new();
        for cell in &self.cells {
            for face in cell.kind.faces() {
                *uses.entry(face_key(&cell.nodes, face)).or_insert(0) += 1;
            }
        }
        uses
    }

    /// Number of cells using face `face` of cell `cell`
    pub fn number_of_cells_using_face(&self, cell: usize, face: usize) -> usize {
        let Some(record) = self.cells.get(cell) else {
            return 0;
        };
        let Some(local) = record.kind.faces().get(face) else {
            return 0;
        };
        let key = face_key(&record.nodes, local);
        self.cells
            .iter()
            .flat_map(|c| c.kind.faces().iter().map(|f| face_key(&c.nodes, f)))
            .filter(|k| *k == key)
            .count()
    }

    /// Faces of the 3D cells used by exactly one cell
    pub fn boundary_faces(&self) -> Vec<CellFace> {
        let uses = self.face_uses();
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, cell)| {
                let uses = &uses;
                cell.kind
                    .faces()
                    .iter()
                    .enumerate()
                    .filter(move |(_, face)| uses.get(&face_key(&cell.nodes, face)) == Some(&1))
                    .map(move |(face, _)| CellFace { cell: i, face })
            })
            .collect()
    }
}

fn face_key(nodes: &[PointId], face: &[usize; 3]) -> [PointId; 3] {
    let mut key = face.map(|i| nodes[i]);
    key.sort_unstable();
    key
}

impl<T: FloatingPoint> GenericDataSet<T> for UnstructuredGrid<T> {
    fn number_of_points(&self) -> usize {
        self.points.len()
    }

    fn number_of_point_components(&self) -> usize {
        self.attributes.iter().map(|a| a.number_of_components()).sum()
    }

    fn bounding_box(&self) -> Option<BoundingBox<T>> {
        BoundingBox::new_with_points(self.points.iter())
    }

    fn attribute_selection(&self) -> Option<AttributeSelection<T>> {
        let index = self.active_attribute?;
        let attribute = self.attributes.get(index)?;
        let offset = self.attributes[..index]
            .iter()
            .map(|a| a.number_of_components())
            .sum();
        let range = attribute.range(self.active_component)?;
        Some(AttributeSelection {
            offset,
            components: attribute.number_of_components(),
            component: self.active_component,
            range,
        })
    }

    fn stamp(&self) -> Stamp {
        self.stamp
    }
}
