/// Options of the adaptive subdivision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubdivisionOptions {
    /// Deepest level an edge can be split at, whatever the error metrics say
    pub max_subdivision_level: usize,
    /// Number of levels split unconditionally before the error metrics are consulted
    pub fixed_subdivisions: usize,
    /// Record the largest error of every metric over the evaluated edges
    pub measurement: bool,
}

impl Default for SubdivisionOptions {
    fn default() -> Self {
        Self {
            max_subdivision_level: 100,
            fixed_subdivisions: 0,
            measurement: false,
        }
    }
}

impl SubdivisionOptions {
    pub fn with_max_subdivision_level(mut self, level: usize) -> Self {
        self.max_subdivision_level = level;
        self
    }

    pub fn with_fixed_subdivisions(mut self, levels: usize) -> Self {
        self.fixed_subdivisions = levels;
        self
    }

    pub fn with_measurement(mut self, measurement: bool) -> Self {
        self.measurement = measurement;
        self
    }

    /// Unconditional levels, never deeper than the maximum level
    pub fn fixed_levels(&self) -> usize {
        self.fixed_subdivisions.min(self.max_subdivision_level)
    }
}

#[cfg(test)]
mod tests {
    use super::SubdivisionOptions;

    #[test]
    fn fixed_levels_never_exceed_max_level() {
        let options = SubdivisionOptions::default();
        assert_eq!(options.max_subdivision_level, 100);
        assert_eq!(options.fixed_levels(), 0);

        let options = options
            .with_max_subdivision_level(3)
            .with_fixed_subdivisions(5);
        assert_eq!(options.fixed_levels(), 3);
    }
}
