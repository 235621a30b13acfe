/// Summary of the tessellation of one cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellReport {
    /// Edge evaluations, cached or not
    pub evaluated_edges: usize,
    /// Evaluations answered by the midpoint cache
    pub cache_hits: usize,
    /// Edges newly split while processing the cell
    pub split_edges: usize,
    /// Edges accepted only because the maximum subdivision level was reached
    pub max_level_hits: usize,
    /// Simplices sent to the sink
    pub simplices: usize,
    /// Distinct points sent to the sink
    pub points: usize,
}

impl CellReport {
    /// Check if the maximum subdivision level truncated the refinement
    pub fn hit_max_level(&self) -> bool {
        self.max_level_hits > 0
    }
}

/// Running totals over the tessellated cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TessellationStatistics {
    pub cells: usize,
    pub evaluated_edges: usize,
    pub cache_hits: usize,
    pub split_edges: usize,
    pub max_level_hits: usize,
    pub simplices: usize,
    pub points: usize,
}

impl TessellationStatistics {
    pub fn accumulate(&mut self, report: &CellReport) {
        self.cells += 1;
        self.evaluated_edges += report.evaluated_edges;
        self.cache_hits += report.cache_hits;
        self.split_edges += report.split_edges;
        self.max_level_hits += report.max_level_hits;
        self.simplices += report.simplices;
        self.points += report.points;
    }

    pub fn hit_max_level(&self) -> bool {
        self.max_level_hits > 0
    }
}
