use std::array;

use anyhow::ensure;
use itertools::Itertools;
use log::{debug, trace, warn};
use nalgebra::Vector3;

use crate::{
    cell::{GenericDataSet, HigherOrderCell, UnstructuredGrid},
    metric::{ErrorMetric, ErrorMetricCollection, MetricContext, SharedErrorMetric},
    misc::{FloatingPoint, Stamp},
    point::{EdgeKey, PointBuffer, PointId},
};

use super::{
    CellReport, EdgeState, EdgeTable, PointRecord, Simplex, SubdivisionOptions, Tessellation,
    TessellationMesh, TessellationSink, TessellationStatistics,
};

/// A linear simplex being refined, with the parametric coordinates of its
/// vertices in the cell being tessellated
#[derive(Clone, Copy, Debug)]
struct Tile<T: FloatingPoint, const N: usize> {
    ids: [PointId; N],
    pcoords: [Vector3<T>; N],
}

impl<T: FloatingPoint, const N: usize> Tile<T, N> {
    fn from_corners<C: HigherOrderCell<T> + ?Sized>(cell: &C, corners: &[usize]) -> Self {
        let ids = cell.point_ids();
        let kind = cell.kind();
        Self {
            ids: array::from_fn(|k| ids[corners[k]]),
            pcoords: array::from_fn(|k| kind.node_parametric_coords(corners[k])),
        }
    }

    /// Local vertex indices of an edge of the tile
    fn slots(&self, key: &EdgeKey) -> Option<(usize, usize)> {
        let i = self.ids.iter().position(|&id| id == key.lo())?;
        let j = self.ids.iter().position(|&id| id == key.hi())?;
        Some((i, j))
    }

    /// Split the edge `i`-`j` at `mid`, each child keeps the orientation of the tile
    fn bisect(&self, i: usize, j: usize, mid: PointId) -> (Self, Self) {
        let p = (self.pcoords[i] + self.pcoords[j]) * T::half();
        let mut a = *self;
        a.ids[j] = mid;
        a.pcoords[j] = p;
        let mut b = *self;
        b.ids[i] = mid;
        b.pcoords[i] = p;
        (a, b)
    }
}

trait IntoSimplex {
    fn into_simplex(self) -> Simplex;
}

impl IntoSimplex for [PointId; 2] {
    fn into_simplex(self) -> Simplex {
        Simplex::Line(self)
    }
}

impl IntoSimplex for [PointId; 3] {
    fn into_simplex(self) -> Simplex {
        Simplex::Triangle(self)
    }
}

impl IntoSimplex for [PointId; 4] {
    fn into_simplex(self) -> Simplex {
        Simplex::Tetrahedron(self)
    }
}

fn load<T: FloatingPoint>(buffer: &mut PointBuffer<T>, record: &PointRecord<T>, pcoords: &Vector3<T>) {
    if buffer.number_of_components() != record.attributes.len() {
        buffer.resize(record.attributes.len());
    }
    buffer.set_global(&record.global);
    buffer.set_parametric(pcoords);
    buffer.attributes_mut().copy_from_slice(&record.attributes);
}

/// Adaptive tessellator of higher-order cells.
///
/// Every cell is cut into the linear simplices of its corners, then each
/// simplex edge is checked against the error metrics: the point of the curved
/// cell halfway along the edge is compared with the straight edge. Edges asking
/// for a split are bisected one after the other in ascending [`EdgeKey`] order,
/// and the children are checked again one level deeper, until every edge is
/// accepted or the maximum subdivision level is reached.
///
/// Decisions and midpoints are cached per edge for the lifetime of the
/// tessellator, so neighboring cells refine their shared edges and faces the
/// same way and reuse bit-identical midpoints.
#[derive(Debug)]
pub struct SimpleCellTessellator<T: FloatingPoint> {
    metrics: ErrorMetricCollection<T>,
    options: SubdivisionOptions,
    edge_table: EdgeTable<T>,
    context: Option<MetricContext<T>>,
    number_of_points: usize,
    number_of_components: usize,
    cache_stamp: Stamp,
    max_errors: Vec<T>,
    statistics: TessellationStatistics,
    left: PointBuffer<T>,
    mid: PointBuffer<T>,
    right: PointBuffer<T>,
}

impl<T: FloatingPoint> Default for SimpleCellTessellator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatingPoint> SimpleCellTessellator<T> {
    pub fn new() -> Self {
        Self {
            metrics: ErrorMetricCollection::new(),
            options: SubdivisionOptions::default(),
            edge_table: EdgeTable::new(0),
            context: None,
            number_of_points: 0,
            number_of_components: 0,
            cache_stamp: Stamp::zero(),
            max_errors: vec![],
            statistics: TessellationStatistics::default(),
            left: PointBuffer::new(0),
            mid: PointBuffer::new(0),
            right: PointBuffer::new(0),
        }
    }

    pub fn with_options(mut self, options: SubdivisionOptions) -> Self {
        self.set_options(options);
        self
    }

    pub fn with_error_metric(mut self, metric: SharedErrorMetric<T>) -> Self {
        self.add_error_metric(metric);
        self
    }

    pub fn options(&self) -> &SubdivisionOptions {
        &self.options
    }

    /// Change the options. Cached decisions are dropped.
    pub fn set_options(&mut self, options: SubdivisionOptions) {
        if options != self.options {
            self.options = options;
            self.edge_table.clear();
        }
    }

    pub fn metrics(&self) -> &ErrorMetricCollection<T> {
        &self.metrics
    }

    /// Metrics deciding the subdivision. Editing them drops the cached decisions
    /// on the next tessellation.
    pub fn metrics_mut(&mut self) -> &mut ErrorMetricCollection<T> {
        &mut self.metrics
    }

    /// Add a metric, see [`ErrorMetricCollection::add_item`]
    pub fn add_error_metric(&mut self, metric: SharedErrorMetric<T>) -> bool {
        self.metrics.add_item(metric)
    }

    /// Bind the tessellator to a dataset: synthesized points get ids from the
    /// dataset point count on, metrics are prepared against its size and
    /// attributes, and the midpoint cache starts empty.
    ///
    /// A later modification of the dataset is picked up by the next
    /// tessellation, which drops the midpoint cache.
    pub fn initialize<D: GenericDataSet<T> + ?Sized>(&mut self, dataset: &D) {
        self.bind(dataset);
        self.cache_stamp = self.metrics.stamp();
        self.edge_table.reset(self.number_of_points);
        self.max_errors.clear();
        self.statistics = TessellationStatistics::default();
        debug!(
            "tessellator initialized with {} points and {} attribute components",
            self.number_of_points, self.number_of_components
        );
    }

    /// Capture the point count, the attribute layout and the metric context of a dataset
    fn bind<D: GenericDataSet<T> + ?Sized>(&mut self, dataset: &D) {
        self.number_of_points = dataset.number_of_points();
        self.number_of_components = dataset.number_of_point_components();
        let context = MetricContext::from_dataset(dataset);
        self.metrics.prepare(&context);
        self.context = Some(context);
        for buffer in [&mut self.left, &mut self.mid, &mut self.right] {
            buffer.resize(self.number_of_components);
        }
    }

    /// Drop every cached edge and start allocating point ids from the dataset
    /// point count again. Output gathered before must not be merged with output
    /// gathered after.
    pub fn reset(&mut self) {
        self.edge_table.reset(self.number_of_points);
        self.max_errors.clear();
        self.statistics = TessellationStatistics::default();
    }

    pub fn edge_table(&self) -> &EdgeTable<T> {
        &self.edge_table
    }

    pub fn number_of_components(&self) -> usize {
        self.number_of_components
    }

    /// Largest error of every metric over the evaluated edges, in metric order.
    /// Only recorded when [`SubdivisionOptions::measurement`] is on.
    pub fn max_errors(&self) -> &[T] {
        &self.max_errors
    }

    /// Totals since the last initialization or reset
    pub fn statistics(&self) -> &TessellationStatistics {
        &self.statistics
    }

    /// Tessellate a 3D cell into tetrahedra
    pub fn tessellate<C, S>(&mut self, cell: &C, sink: &mut S) -> anyhow::Result<CellReport>
    where
        C: HigherOrderCell<T> + ?Sized,
        S: TessellationSink<T> + ?Sized,
    {
        let kind = cell.kind();
        ensure!(
            kind.dimension() == 3,
            "Tetrahedra can only be produced from a 3D cell, got {:?}",
            kind
        );
        self.begin(cell)?;
        let tiles: Vec<Tile<T, 4>> = kind
            .reference_simplices(cell.point_ids())
            .iter()
            .map(|corners| Tile::from_corners(cell, corners))
            .collect();
        Ok(self.run(cell, tiles, sink))
    }

    /// Tessellate a 2D cell into triangles
    pub fn triangulate<C, S>(&mut self, cell: &C, sink: &mut S) -> anyhow::Result<CellReport>
    where
        C: HigherOrderCell<T> + ?Sized,
        S: TessellationSink<T> + ?Sized,
    {
        let kind = cell.kind();
        ensure!(
            kind.dimension() == 2,
            "Triangles can only be produced from a 2D cell, got {:?}",
            kind
        );
        self.begin(cell)?;
        let tiles: Vec<Tile<T, 3>> = kind
            .reference_simplices(cell.point_ids())
            .iter()
            .map(|corners| Tile::from_corners(cell, corners))
            .collect();
        Ok(self.run(cell, tiles, sink))
    }

    /// Tessellate a 1D cell into line segments
    pub fn tessellate_edge<C, S>(&mut self, cell: &C, sink: &mut S) -> anyhow::Result<CellReport>
    where
        C: HigherOrderCell<T> + ?Sized,
        S: TessellationSink<T> + ?Sized,
    {
        let kind = cell.kind();
        ensure!(
            kind.dimension() == 1,
            "Line segments can only be produced from a 1D cell, got {:?}",
            kind
        );
        self.begin(cell)?;
        let tiles: Vec<Tile<T, 2>> = vec![Tile::from_corners(cell, &[0, 1])];
        Ok(self.run(cell, tiles, sink))
    }

    /// Triangulate the face `face` of a 3D cell, evaluated with the shape
    /// functions of the cell. The triangles are oriented outward.
    pub fn triangulate_face<C, S>(
        &mut self,
        cell: &C,
        face: usize,
        sink: &mut S,
    ) -> anyhow::Result<CellReport>
    where
        C: HigherOrderCell<T> + ?Sized,
        S: TessellationSink<T> + ?Sized,
    {
        let kind = cell.kind();
        ensure!(
            kind.dimension() == 3,
            "Faces can only be triangulated on a 3D cell, got {:?}",
            kind
        );
        let Some(corners) = kind.faces().get(face) else {
            anyhow::bail!("{:?} has no face {}", kind, face);
        };
        self.begin(cell)?;
        let tiles: Vec<Tile<T, 3>> = vec![Tile::from_corners(cell, corners)];
        Ok(self.run(cell, tiles, sink))
    }

    /// Tessellate every cell of a grid, each one with the simplices of its own dimension.
    /// The tessellator is initialized with the grid first.
    pub fn tessellate_grid<S>(
        &mut self,
        grid: &UnstructuredGrid<T>,
        sink: &mut S,
    ) -> anyhow::Result<TessellationStatistics>
    where
        S: TessellationSink<T> + ?Sized,
    {
        self.initialize(grid);
        for cell in grid.cells() {
            match cell.kind().dimension() {
                1 => self.tessellate_edge(&cell, sink)?,
                2 => self.triangulate(&cell, sink)?,
                _ => self.tessellate(&cell, sink)?,
            };
        }
        Ok(self.statistics)
    }

    /// Triangulate the outer surface of a grid: the faces of its 3D cells used
    /// by a single cell, and its 2D cells.
    /// The tessellator is initialized with the grid first.
    pub fn triangulate_boundary<S>(
        &mut self,
        grid: &UnstructuredGrid<T>,
        sink: &mut S,
    ) -> anyhow::Result<TessellationStatistics>
    where
        S: TessellationSink<T> + ?Sized,
    {
        self.initialize(grid);
        for face in grid.boundary_faces() {
            if let Some(cell) = grid.cell(face.cell) {
                self.triangulate_face(&cell, face.face, sink)?;
            }
        }
        for cell in grid.cells().filter(|c| c.kind().dimension() == 2) {
            self.triangulate(&cell, sink)?;
        }
        Ok(self.statistics)
    }

    /// Check the tessellator state and the cell corners before a cell is processed
    fn begin<C: HigherOrderCell<T> + ?Sized>(&mut self, cell: &C) -> anyhow::Result<()> {
        let Some(bound) = self.context.as_ref().map(|c| c.stamp()) else {
            anyhow::bail!("The tessellator must be initialized with a dataset first");
        };

        let dataset = cell.dataset();
        if dataset.stamp() > bound {
            debug!("dataset modified, dropping the midpoint cache");
            self.bind(dataset);
            // ids handed out before stay unique, new dataset points come first
            let first = self.edge_table.next_id().max(self.number_of_points);
            self.edge_table.reset(first);
        }

        let kind = cell.kind();
        let ids = cell.point_ids();
        ensure!(
            ids.len() == kind.number_of_corners(),
            "{:?} has {} corners, got {} point ids",
            kind,
            kind.number_of_corners(),
            ids.len()
        );
        if let Some(id) = ids.iter().find(|&&id| id >= self.number_of_points) {
            anyhow::bail!(
                "Point {} of cell {} is not a point of the initialized dataset",
                id,
                cell.id()
            );
        }

        if let Some(context) = &self.context {
            self.metrics.prepare(context);
        }
        let stamp = self.metrics.stamp();
        if stamp > self.cache_stamp {
            debug!("error metrics modified, dropping the midpoint cache");
            self.edge_table.clear();
            self.cache_stamp = stamp;
        }
        if self.options.measurement && self.max_errors.len() != self.metrics.len() {
            self.max_errors = vec![T::zero(); self.metrics.len()];
        }

        for (k, &id) in ids.iter().enumerate() {
            if self.edge_table.point(id).is_none() {
                let record = self.evaluate(cell, &kind.node_parametric_coords(k));
                self.edge_table.insert_point(id, record);
            }
        }
        Ok(())
    }

    fn evaluate<C: HigherOrderCell<T> + ?Sized>(&self, cell: &C, pcoords: &Vector3<T>) -> PointRecord<T> {
        let mut attributes = vec![T::zero(); self.number_of_components];
        cell.interpolate_attributes(pcoords, &mut attributes);
        PointRecord {
            global: cell.evaluate_location(pcoords),
            attributes,
        }
    }

    fn run<C, S, const N: usize>(&mut self, cell: &C, tiles: Vec<Tile<T, N>>, sink: &mut S) -> CellReport
    where
        C: HigherOrderCell<T> + ?Sized,
        S: TessellationSink<T> + ?Sized,
        [PointId; N]: IntoSimplex,
    {
        let mut report = CellReport::default();
        let mut leaves = vec![];
        for tile in tiles {
            self.refine(cell, tile, 0, &mut leaves, &mut report);
        }
        self.emit(&leaves, sink, &mut report);
        self.statistics.accumulate(&report);

        debug!(
            "cell {} tessellated into {} simplices, {} edges split, {} edges capped",
            cell.id(),
            report.simplices,
            report.split_edges,
            report.max_level_hits
        );
        report
    }

    /// Check every edge of the tile and bisect it along the ones asking for it
    fn refine<C, const N: usize>(
        &mut self,
        cell: &C,
        tile: Tile<T, N>,
        level: usize,
        leaves: &mut Vec<Tile<T, N>>,
        report: &mut CellReport,
    ) where
        C: HigherOrderCell<T> + ?Sized,
    {
        let mut split = vec![];
        for (i, j) in (0..N).tuple_combinations::<(usize, usize)>() {
            if self.check_edge(cell, &tile, i, j, level, report) {
                split.push(EdgeKey::new(tile.ids[i], tile.ids[j]));
            }
        }

        if split.is_empty() {
            leaves.push(tile);
        } else {
            split.sort();
            self.bisect(cell, tile, &split, level, leaves, report);
        }
    }

    /// Bisect the tile along the first edge of `split` it contains,
    /// then the children along the remaining ones
    fn bisect<C, const N: usize>(
        &mut self,
        cell: &C,
        tile: Tile<T, N>,
        split: &[EdgeKey],
        level: usize,
        leaves: &mut Vec<Tile<T, N>>,
        report: &mut CellReport,
    ) where
        C: HigherOrderCell<T> + ?Sized,
    {
        let next = split.iter().enumerate().find_map(|(p, key)| {
            let (i, j) = tile.slots(key)?;
            let mid = self.edge_table.midpoint(key)?;
            Some((p, i, j, mid))
        });

        match next {
            Some((p, i, j, mid)) => {
                let (a, b) = tile.bisect(i, j, mid);
                let rest = &split[p + 1..];
                self.bisect(cell, a, rest, level, leaves, report);
                self.bisect(cell, b, rest, level, leaves, report);
            }
            None => self.refine(cell, tile, level + 1, leaves, report),
        }
    }

    /// Decide whether the edge `i`-`j` of the tile is split, computing and
    /// caching its midpoint when it is
    fn check_edge<C, const N: usize>(
        &mut self,
        cell: &C,
        tile: &Tile<T, N>,
        i: usize,
        j: usize,
        level: usize,
        report: &mut CellReport,
    ) -> bool
    where
        C: HigherOrderCell<T> + ?Sized,
    {
        report.evaluated_edges += 1;
        let key = EdgeKey::new(tile.ids[i], tile.ids[j]);
        if let Some(state) = self.edge_table.edge(&key) {
            report.cache_hits += 1;
            return state.is_split();
        }

        // the smaller id is always on the left
        let (l, r) = if tile.ids[i] == key.lo() { (i, j) } else { (j, i) };
        let alpha = T::half();
        let pcoords = (tile.pcoords[l] + tile.pcoords[r]) * alpha;
        let midpoint = self.evaluate(cell, &pcoords);

        let (Some(left), Some(right)) = (
            self.edge_table.point(key.lo()),
            self.edge_table.point(key.hi()),
        ) else {
            warn!("edge {:?} has an endpoint without record, accepting it", key);
            self.edge_table.insert_edge(key, EdgeState::Accepted);
            return false;
        };
        load(&mut self.left, left, &tile.pcoords[l]);
        load(&mut self.right, right, &tile.pcoords[r]);
        load(&mut self.mid, &midpoint, &pcoords);

        let requested = level < self.options.fixed_levels()
            || self
                .metrics
                .requires_edge_subdivision(&self.left, &self.mid, &self.right, alpha);

        if self.options.measurement {
            let errors = self.metrics.errors(&self.left, &self.mid, &self.right, alpha);
            self.max_errors.resize(errors.len(), T::zero());
            for (max, error) in self.max_errors.iter_mut().zip(errors) {
                if error > *max {
                    *max = error;
                }
            }
        }

        let split = if requested && level >= self.options.max_subdivision_level {
            trace!(
                "edge {:?} accepted at the maximum subdivision level {}",
                key,
                level
            );
            report.max_level_hits += 1;
            false
        } else {
            requested
        };

        if split {
            let id = self.edge_table.allocate_point(midpoint);
            self.edge_table.insert_edge(key, EdgeState::Split(id));
            report.split_edges += 1;
        } else {
            self.edge_table.insert_edge(key, EdgeState::Accepted);
        }
        split
    }

    /// Send the points of the leaves, each once, then the leaves themselves
    fn emit<S, const N: usize>(&self, leaves: &[Tile<T, N>], sink: &mut S, report: &mut CellReport)
    where
        S: TessellationSink<T> + ?Sized,
        [PointId; N]: IntoSimplex,
    {
        let vertices = leaves
            .iter()
            .flat_map(|tile| tile.ids.iter().zip(tile.pcoords.iter()))
            .unique_by(|(id, _)| **id);
        for (&id, pcoords) in vertices {
            match self.edge_table.point(id) {
                Some(record) => {
                    let point = PointBuffer::from_parts(&record.global, pcoords, &record.attributes);
                    sink.insert_point(id, &point);
                    report.points += 1;
                }
                None => warn!("point {} has no record", id),
            }
        }

        for tile in leaves {
            sink.insert_simplex(tile.ids.into_simplex());
        }
        report.simplices = leaves.len();
    }
}

/// Tessellate every cell of the grid into a merged mesh
impl<'a, T: FloatingPoint> Tessellation<&'a mut SimpleCellTessellator<T>> for UnstructuredGrid<T> {
    type Output = anyhow::Result<TessellationMesh<T>>;

    fn tessellate(&self, tessellator: &'a mut SimpleCellTessellator<T>) -> Self::Output {
        let mut mesh = TessellationMesh::new(self.number_of_point_components());
        tessellator.tessellate_grid(self, &mut mesh)?;
        Ok(mesh)
    }
}
