use itertools::{Itertools, MinMaxResult};

use crate::misc::FloatingPoint;

/// A named point-centered attribute array with `components` values per point
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointAttribute<T: FloatingPoint> {
    name: String,
    components: usize,
    values: Vec<T>,
}

impl<T: FloatingPoint> PointAttribute<T> {
    pub fn try_new(name: &str, components: usize, values: Vec<T>) -> anyhow::Result<Self> {
        anyhow::ensure!(components > 0, "Attribute {} has no components", name);
        anyhow::ensure!(
            values.len() % components == 0,
            "Attribute {} has {} values, not a multiple of {} components",
            name,
            values.len(),
            components
        );
        Ok(Self {
            name: name.to_string(),
            components,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number_of_components(&self) -> usize {
        self.components
    }

    pub fn number_of_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Values of point `index`
    pub fn tuple(&self, index: usize) -> &[T] {
        &self.values[index * self.components..(index + 1) * self.components]
    }

    /// Range of one component, or of the tuple magnitude when `component` is `None`
    /// and the attribute has more than one component
    /// # Examples
    /// ```
    /// use adaptess::prelude::PointAttribute;
    /// let a = PointAttribute::try_new("v", 2, vec![3., 4., 0., 1.]).unwrap();
    /// assert_eq!(a.range(Some(0)), Some((0., 3.)));
    /// assert_eq!(a.range(None), Some((1., 5.)));
    /// ```
    pub fn range(&self, component: Option<usize>) -> Option<(T, T)> {
        let values: Vec<T> = match component {
            Some(c) => {
                if c >= self.components {
                    return None;
                }
                self.values.iter().skip(c).step_by(self.components).copied().collect()
            }
            None if self.components == 1 => self.values.clone(),
            None => self
                .values
                .chunks(self.components)
                .map(|tuple| tuple.iter().fold(T::zero(), |acc, v| acc + *v * *v).sqrt())
                .collect(),
        };
        match values
            .into_iter()
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }
}

/// Location and range of the active attribute inside the attribute tail of a point buffer
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeSelection<T: FloatingPoint> {
    /// First component of the active attribute in the tail
    pub offset: usize,
    /// Number of components of the active attribute
    pub components: usize,
    /// Selected component, `None` compares all components together
    pub component: Option<usize>,
    /// Range of the selected component (or magnitude)
    pub range: (T, T),
}

impl<T: FloatingPoint> AttributeSelection<T> {
    /// Width of the attribute range
    pub fn extent(&self) -> T {
        self.range.1 - self.range.0
    }
}
