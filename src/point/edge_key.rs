/// Identifier of a point of the tessellated dataset.
///
/// Points of the input dataset keep their own ids, points synthesized at
/// subdivision midpoints get ids starting right after the last input point.
pub type PointId = usize;

/// Direction independent identity of an edge.
///
/// The key stores the smaller point id first, so `(a, b)` and `(b, a)` collapse
/// to the same value. Keys are ordered lexicographically on `(lo, hi)`,
/// which gives every cell sharing an edge the same refinement order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeKey {
    lo: PointId,
    hi: PointId,
}

impl EdgeKey {
    /// Create a key from the two endpoint ids in any order
    /// # Examples
    /// ```
    /// use adaptess::prelude::EdgeKey;
    /// assert_eq!(EdgeKey::new(3, 7), EdgeKey::new(7, 3));
    /// assert_eq!(EdgeKey::new(7, 3).lo(), 3);
    /// ```
    pub fn new(a: PointId, b: PointId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> PointId {
        self.lo
    }

    pub fn hi(&self) -> PointId {
        self.hi
    }

    /// Check if the edge ends at `id`
    pub fn contains(&self, id: PointId) -> bool {
        self.lo == id || self.hi == id
    }
}

impl From<(PointId, PointId)> for EdgeKey {
    fn from((a, b): (PointId, PointId)) -> Self {
        Self::new(a, b)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::EdgeKey;

    #[test]
    fn key_is_direction_independent() {
        let mut map = HashMap::new();
        map.insert(EdgeKey::new(10, 2), "edge");
        assert_eq!(map.get(&EdgeKey::new(2, 10)), Some(&"edge"));
        assert_eq!(map.get(&(10, 2).into()), Some(&"edge"));
        assert!(EdgeKey::new(2, 10).contains(10));
        assert!(!EdgeKey::new(2, 10).contains(3));
    }

    #[test]
    fn keys_are_ordered_by_smaller_endpoint_first() {
        let mut keys = vec![
            EdgeKey::new(5, 1),
            EdgeKey::new(0, 9),
            EdgeKey::new(1, 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![EdgeKey::new(0, 9), EdgeKey::new(1, 2), EdgeKey::new(1, 5)]
        );
    }
}
