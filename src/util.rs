//! Miscellaneous utility structs and functions.

use std::fmt::Debug;

/// An interval on a number line.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T> Interval<T> {
    /// Creates a new interval.
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd> Interval<T> {
    /// Returns true if this interval overlaps with the other.
    /// Intervals that only touch at an end point do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.max > other.min && other.max > self.min
    }
}

impl<T: std::ops::Sub<T, Output = T> + Copy> Interval<T> {
    /// Gets the magnitude of the interval.
    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl<T: Debug> Debug for Interval<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}, {:?}]", self.min, self.max)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = Interval::new(0, 10);
        assert!(!a.overlaps(&Interval::new(10, 20)));
        assert!(a.overlaps(&Interval::new(9, 20)));
        assert!(a.overlaps(&Interval::new(2, 3)));
    }

    #[test]
    fn empty_interval_inside_another_overlaps() {
        let a = Interval::new(0, 10);
        assert!(a.overlaps(&Interval::new(5, 5)));
        assert!(!a.overlaps(&Interval::new(0, 0)));
        assert_eq!(a.length(), 10);
    }
}
