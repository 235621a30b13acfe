use nalgebra::{convert, Vector3};

use crate::{misc::FloatingPoint, point::PointId};

/// Largest node count of a supported cell
pub const MAX_CELL_NODES: usize = 10;

const LINE_NODES: [[f64; 3]; 3] = [[0., 0., 0.], [1., 0., 0.], [0.5, 0., 0.]];

const TRIANGLE_NODES: [[f64; 3]; 6] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [0., 1., 0.],
    [0.5, 0., 0.],
    [0.5, 0.5, 0.],
    [0., 0.5, 0.],
];

const QUAD_NODES: [[f64; 3]; 8] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [1., 1., 0.],
    [0., 1., 0.],
    [0.5, 0., 0.],
    [1., 0.5, 0.],
    [0.5, 1., 0.],
    [0., 0.5, 0.],
];

const TETRA_NODES: [[f64; 3]; 10] = [
    [0., 0., 0.],
    [1., 0., 0.],
    [0., 1., 0.],
    [0., 0., 1.],
    [0.5, 0., 0.],
    [0.5, 0.5, 0.],
    [0., 0.5, 0.],
    [0., 0., 0.5],
    [0.5, 0., 0.5],
    [0., 0.5, 0.5],
];

// outward oriented for a positively oriented tetrahedron
const TETRA_FACES: [[usize; 3]; 4] = [[0, 1, 3], [1, 2, 3], [2, 0, 3], [0, 2, 1]];

/// Kind of cell handled by the tessellator.
/// Node ordering follows the VTK conventions: corners first, then one node per edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellKind {
    Line,
    /// 2 end nodes + 1 mid node
    QuadraticLine,
    Triangle,
    /// 3 corners + 3 edge nodes
    QuadraticTriangle,
    Quad,
    /// 4 corners + 4 edge nodes (serendipity)
    QuadraticQuad,
    Tetra,
    /// 4 corners + 6 edge nodes
    QuadraticTetra,
}

impl CellKind {
    /// Topological dimension of the cell
    pub fn dimension(&self) -> usize {
        match self {
            CellKind::Line | CellKind::QuadraticLine => 1,
            CellKind::Triangle
            | CellKind::QuadraticTriangle
            | CellKind::Quad
            | CellKind::QuadraticQuad => 2,
            CellKind::Tetra | CellKind::QuadraticTetra => 3,
        }
    }

    pub fn number_of_nodes(&self) -> usize {
        match self {
            CellKind::Line => 2,
            CellKind::QuadraticLine => 3,
            CellKind::Triangle => 3,
            CellKind::QuadraticTriangle => 6,
            CellKind::Quad => 4,
            CellKind::QuadraticQuad => 8,
            CellKind::Tetra => 4,
            CellKind::QuadraticTetra => 10,
        }
    }

    /// Number of corner nodes, the nodes of the coarse linear approximation
    pub fn number_of_corners(&self) -> usize {
        match self {
            CellKind::Line | CellKind::QuadraticLine => 2,
            CellKind::Triangle | CellKind::QuadraticTriangle => 3,
            CellKind::Quad | CellKind::QuadraticQuad | CellKind::Tetra | CellKind::QuadraticTetra => 4,
        }
    }

    /// Parametric coordinates of a node
    pub fn node_parametric_coords<T: FloatingPoint>(&self, node: usize) -> Vector3<T> {
        let p = match self {
            CellKind::Line | CellKind::QuadraticLine => LINE_NODES[node],
            CellKind::Triangle | CellKind::QuadraticTriangle => TRIANGLE_NODES[node],
            CellKind::Quad | CellKind::QuadraticQuad => QUAD_NODES[node],
            CellKind::Tetra | CellKind::QuadraticTetra => TETRA_NODES[node],
        };
        Vector3::new(convert(p[0]), convert(p[1]), convert(p[2]))
    }

    /// Triangular faces of a 3D cell as triples of corner indices, empty otherwise
    pub fn faces(&self) -> &'static [[usize; 3]] {
        match self {
            CellKind::Tetra | CellKind::QuadraticTetra => &TETRA_FACES,
            _ => &[],
        }
    }

    /// Coarse partition of the cell into linear simplices, as corner index lists.
    ///
    /// Simplicial cells are their own partition. Quads are cut along the
    /// diagonal through their corner of smallest global id so that the result
    /// does not depend on how the cell was listed.
    pub fn reference_simplices(&self, corner_ids: &[PointId]) -> Vec<Vec<usize>> {
        match self {
            CellKind::Quad | CellKind::QuadraticQuad => {
                let lowest = (0..4).min_by_key(|&i| corner_ids[i]).unwrap_or(0);
                if lowest % 2 == 0 {
                    vec![vec![0, 1, 2], vec![0, 2, 3]]
                } else {
                    vec![vec![0, 1, 3], vec![1, 2, 3]]
                }
            }
            _ => vec![(0..self.number_of_corners()).collect()],
        }
    }

    /// Evaluate the shape functions at `pcoords`, writing one weight per node into `weights`
    pub fn shape_functions<T: FloatingPoint>(&self, pcoords: &Vector3<T>, weights: &mut [T]) {
        debug_assert!(weights.len() >= self.number_of_nodes());

        let one = T::one();
        let two: T = convert(2.0);
        let four: T = convert(4.0);
        let (r, s, t) = (pcoords.x, pcoords.y, pcoords.z);

        match self {
            CellKind::Line => {
                weights[0] = one - r;
                weights[1] = r;
            }
            CellKind::QuadraticLine => {
                weights[0] = (one - r) * (one - two * r);
                weights[1] = r * (two * r - one);
                weights[2] = four * r * (one - r);
            }
            CellKind::Triangle => {
                weights[0] = one - r - s;
                weights[1] = r;
                weights[2] = s;
            }
            CellKind::QuadraticTriangle => {
                let u = one - r - s;
                weights[0] = u * (two * u - one);
                weights[1] = r * (two * r - one);
                weights[2] = s * (two * s - one);
                weights[3] = four * r * u;
                weights[4] = four * r * s;
                weights[5] = four * s * u;
            }
            CellKind::Quad => {
                weights[0] = (one - r) * (one - s);
                weights[1] = r * (one - s);
                weights[2] = r * s;
                weights[3] = (one - r) * s;
            }
            CellKind::QuadraticQuad => {
                // serendipity functions written on [-1, 1]^2
                let half = T::half();
                let quarter: T = convert(0.25);
                let x = two * r - one;
                let y = two * s - one;
                let corners = [(-one, -one), (one, -one), (one, one), (-one, one)];
                for (i, (xi, yi)) in corners.into_iter().enumerate() {
                    weights[i] = quarter * (one + x * xi) * (one + y * yi) * (x * xi + y * yi - one);
                }
                weights[4] = half * (one - x * x) * (one - y);
                weights[5] = half * (one + x) * (one - y * y);
                weights[6] = half * (one - x * x) * (one + y);
                weights[7] = half * (one - x) * (one - y * y);
            }
            CellKind::Tetra => {
                weights[0] = one - r - s - t;
                weights[1] = r;
                weights[2] = s;
                weights[3] = t;
            }
            CellKind::QuadraticTetra => {
                let u = one - r - s - t;
                weights[0] = u * (two * u - one);
                weights[1] = r * (two * r - one);
                weights[2] = s * (two * s - one);
                weights[3] = t * (two * t - one);
                weights[4] = four * u * r;
                weights[5] = four * r * s;
                weights[6] = four * s * u;
                weights[7] = four * u * t;
                weights[8] = four * r * t;
                weights[9] = four * s * t;
            }
        }
    }
}
