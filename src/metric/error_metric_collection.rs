use std::{cell::RefCell, rc::Rc};

use crate::{
    misc::{FloatingPoint, Stamp},
    point::PointBuffer,
};

use super::{ErrorMetric, MetricContext, SharedErrorMetric};

/// An ordered set of error metrics combined with a logical OR:
/// an edge is split as soon as one member asks for it.
///
/// Members are compared by identity, so the same metric instance is held
/// at most once while two equal but distinct instances are both kept.
#[derive(Clone)]
pub struct ErrorMetricCollection<T: FloatingPoint> {
    items: Vec<SharedErrorMetric<T>>,
    stamp: Stamp,
}

impl<T: FloatingPoint> std::fmt::Debug for ErrorMetricCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorMetricCollection")
            .field("items", &self.items.len())
            .field("stamp", &self.stamp)
            .finish()
    }
}

impl<T: FloatingPoint> Default for ErrorMetricCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_instance<A: ?Sized, B: ?Sized>(a: &Rc<RefCell<A>>, b: &Rc<RefCell<B>>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl<T: FloatingPoint> ErrorMetricCollection<T> {
    pub fn new() -> Self {
        Self {
            items: vec![],
            stamp: Stamp::now(),
        }
    }

    /// Insert `metric` unless this very instance is already present.
    /// Returns true if the metric was inserted.
    pub fn add_item(&mut self, metric: SharedErrorMetric<T>) -> bool {
        if self.contains(&metric) {
            return false;
        }
        self.items.push(metric);
        self.stamp.modified();
        true
    }

    /// Remove `metric` if present. Returns true if it was removed.
    pub fn remove_item<M: ?Sized>(&mut self, metric: &Rc<RefCell<M>>) -> bool {
        let Some(index) = self.items.iter().position(|m| same_instance(m, metric)) else {
            return false;
        };
        self.items.remove(index);
        self.stamp.modified();
        true
    }

    pub fn remove_all_items(&mut self) {
        self.items.clear();
        self.stamp.modified();
    }

    pub fn contains<M: ?Sized>(&self, metric: &Rc<RefCell<M>>) -> bool {
        self.items.iter().any(|m| same_instance(m, metric))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Members in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &SharedErrorMetric<T>> {
        self.items.iter()
    }

    /// Error of every member for the given edge, in insertion order
    pub fn errors(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> Vec<T> {
        self.items
            .iter()
            .map(|m| m.borrow().error(left, mid, right, alpha))
            .collect()
    }
}

impl<T: FloatingPoint> ErrorMetric<T> for ErrorMetricCollection<T> {
    fn prepare(&mut self, context: &MetricContext<T>) {
        self.items
            .iter()
            .for_each(|m| m.borrow_mut().prepare(context));
    }

    fn requires_edge_subdivision(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> bool {
        self.items
            .iter()
            .any(|m| m.borrow().requires_edge_subdivision(left, mid, right, alpha))
    }

    /// Largest error among the members voting for a split, 0 when none does
    fn error(
        &self,
        left: &PointBuffer<T>,
        mid: &PointBuffer<T>,
        right: &PointBuffer<T>,
        alpha: T,
    ) -> T {
        self.items
            .iter()
            .map(|m| m.borrow())
            .filter(|m| m.requires_edge_subdivision(left, mid, right, alpha))
            .map(|m| m.error(left, mid, right, alpha))
            .fold(T::zero(), |acc, e| if e > acc { e } else { acc })
    }

    /// Latest stamp of the collection and its members
    fn stamp(&self) -> Stamp {
        self.items
            .iter()
            .map(|m| m.borrow().stamp())
            .fold(self.stamp, |acc, s| acc.max(s))
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Point3, Vector3};

    use crate::metric::{shared, GeometricErrorMetric};

    use super::*;

    /// Metric with a fixed verdict
    struct Constant {
        verdict: bool,
        error: f64,
        stamp: Stamp,
    }

    impl Constant {
        fn new(verdict: bool, error: f64) -> Self {
            Self {
                verdict,
                error,
                stamp: Stamp::now(),
            }
        }
    }

    impl ErrorMetric<f64> for Constant {
        fn requires_edge_subdivision(
            &self,
            _: &PointBuffer<f64>,
            _: &PointBuffer<f64>,
            _: &PointBuffer<f64>,
            _: f64,
        ) -> bool {
            self.verdict
        }

        fn error(&self, _: &PointBuffer<f64>, _: &PointBuffer<f64>, _: &PointBuffer<f64>, _: f64) -> f64 {
            self.error
        }

        fn stamp(&self) -> Stamp {
            self.stamp
        }
    }

    fn edge() -> (PointBuffer<f64>, PointBuffer<f64>, PointBuffer<f64>) {
        let p = |x: f64, y: f64| PointBuffer::from_parts(&Point3::new(x, y, 0.), &Vector3::zeros(), &[]);
        (p(0., 0.), p(0.5, 0.2), p(1., 0.))
    }

    #[test]
    fn add_item_is_idempotent() {
        let mut collection = ErrorMetricCollection::new();
        let metric = shared(GeometricErrorMetric::<f64>::default());
        assert!(collection.add_item(metric.clone()));
        assert!(!collection.add_item(metric.clone()));
        assert_eq!(collection.len(), 1);

        // an equal but distinct instance is another member
        assert!(collection.add_item(shared(GeometricErrorMetric::default())));
        assert_eq!(collection.len(), 2);

        assert!(collection.remove_item(&metric));
        assert!(!collection.remove_item(&metric));
        assert_eq!(collection.len(), 1);

        collection.remove_all_items();
        assert!(collection.is_empty());
    }

    #[test]
    fn any_member_forces_subdivision() {
        let (l, m, r) = edge();

        let mut always = ErrorMetricCollection::new();
        always.add_item(shared(Constant::new(true, 3.)));

        let mut mixed = ErrorMetricCollection::new();
        mixed.add_item(shared(Constant::new(false, 7.)));
        mixed.add_item(shared(Constant::new(true, 3.)));

        let mut never = ErrorMetricCollection::new();
        never.add_item(shared(Constant::new(false, 7.)));

        assert!(always.requires_edge_subdivision(&l, &m, &r, 0.5));
        assert_eq!(
            mixed.requires_edge_subdivision(&l, &m, &r, 0.5),
            always.requires_edge_subdivision(&l, &m, &r, 0.5)
        );
        assert!(!never.requires_edge_subdivision(&l, &m, &r, 0.5));
        assert!(!ErrorMetricCollection::new().requires_edge_subdivision(&l, &m, &r, 0.5));

        // only the members voting for a split contribute to the error
        assert_eq!(mixed.error(&l, &m, &r, 0.5), 3.);
        assert_eq!(never.error(&l, &m, &r, 0.5), 0.);
        assert_eq!(mixed.errors(&l, &m, &r, 0.5), vec![7., 3.]);
    }

    #[test]
    fn collections_nest() {
        let (l, m, r) = edge();
        let inner = shared(ErrorMetricCollection::new());
        inner.borrow_mut().add_item(shared(Constant::new(true, 1.)));

        let mut outer = ErrorMetricCollection::new();
        outer.add_item(shared(Constant::new(false, 0.)));
        outer.add_item(inner.clone());
        assert!(outer.requires_edge_subdivision(&l, &m, &r, 0.5));

        inner.borrow_mut().remove_all_items();
        assert!(!outer.requires_edge_subdivision(&l, &m, &r, 0.5));
    }

    #[test]
    fn stamp_follows_members() {
        let metric = shared(GeometricErrorMetric::<f64>::default());
        let mut collection = ErrorMetricCollection::new();
        collection.add_item(metric.clone());
        let before = collection.stamp();

        metric.borrow_mut().set_absolute_geometric_tolerance(0.5);
        assert!(collection.stamp() > before);
    }
}
