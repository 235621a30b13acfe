use std::collections::HashMap;

use crate::misc::FloatingPoint;

use super::TessellationMesh;

/// Statistics of the triangle edges of a mesh
/// HashMap<(usize, usize), usize> -> ((edge index0, edge index1), count)
#[derive(Clone, Debug)]
pub struct TessellationEdgeStatistics(HashMap<(usize, usize), usize>);

impl TessellationEdgeStatistics {
    /// Create a new `TessellationEdgeStatistics` from the triangles of a mesh
    pub fn new<T: FloatingPoint>(mesh: &TessellationMesh<T>) -> Self {
        let mut edge_count: HashMap<(usize, usize), usize> = Default::default();

        // Count occurrences of each undirected edge
        for tri in mesh.triangles() {
            let edges = [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
            for &(a, b) in &edges {
                let key = if a < b { (a, b) } else { (b, a) };
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }

        Self(edge_count)
    }

    /// Get the count of edges
    pub fn count(&self) -> &HashMap<(usize, usize), usize> {
        &self.0
    }

    /// Edges used by a single triangle
    pub fn boundary_edges(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.0.iter().filter(|(_, c)| **c == 1).map(|(e, _)| e)
    }

    /// Edges used by more than two triangles
    pub fn non_manifold_edges(&self) -> impl Iterator<Item = &(usize, usize)> {
        self.0.iter().filter(|(_, c)| **c > 2).map(|(e, _)| e)
    }
}

/// Statistics of the tetrahedron faces of a mesh
/// HashMap<[usize; 3], usize> -> (sorted face indices, count)
#[derive(Clone, Debug)]
pub struct TessellationFaceStatistics(HashMap<[usize; 3], usize>);

impl TessellationFaceStatistics {
    pub fn new<T: FloatingPoint>(mesh: &TessellationMesh<T>) -> Self {
        let mut face_count: HashMap<[usize; 3], usize> = Default::default();

        for tet in mesh.tetrahedra() {
            let faces = [
                [tet[0], tet[1], tet[3]],
                [tet[1], tet[2], tet[3]],
                [tet[2], tet[0], tet[3]],
                [tet[0], tet[2], tet[1]],
            ];
            for mut face in faces {
                face.sort_unstable();
                *face_count.entry(face).or_insert(0) += 1;
            }
        }

        Self(face_count)
    }

    pub fn count(&self) -> &HashMap<[usize; 3], usize> {
        &self.0
    }

    /// Faces used by a single tetrahedron
    pub fn boundary_faces(&self) -> impl Iterator<Item = &[usize; 3]> {
        self.0.iter().filter(|(_, c)| **c == 1).map(|(f, _)| f)
    }

    /// Faces used by more than two tetrahedra
    pub fn non_manifold_faces(&self) -> impl Iterator<Item = &[usize; 3]> {
        self.0.iter().filter(|(_, c)| **c > 2).map(|(f, _)| f)
    }
}
