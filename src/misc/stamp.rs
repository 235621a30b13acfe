use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STAMP: AtomicU64 = AtomicU64::new(1);

/// Monotonic modification stamp.
///
/// Every call to [`Stamp::now`] returns a value strictly greater than any
/// stamp handed out before it, so comparing two stamps tells which object
/// was modified last.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stamp(u64);

impl Stamp {
    /// The stamp older than every modification
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Take a fresh stamp
    pub fn now() -> Self {
        Self(NEXT_STAMP.fetch_add(1, Ordering::Relaxed))
    }

    /// Update to a fresh stamp
    pub fn modified(&mut self) {
        *self = Self::now();
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Stamp;

    #[test]
    fn stamps_are_increasing() {
        let a = Stamp::now();
        let b = Stamp::now();
        assert!(b > a);
        assert!(a > Stamp::zero());

        let mut c = a;
        c.modified();
        assert!(c > b);
    }
}
