//! Mathematical types used for display positions and routing heuristics.

use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Linearly interpolates between two points.
pub fn lerp(from: Point2d, to: Point2d, t: f64) -> Point2d {
    from + (to - from) * t
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn lerp_midpoint() {
        let mid = lerp(Point2d::new(0.0, 0.0), Point2d::new(10.0, -4.0), 0.5);
        assert_approx_eq!(mid.x, 5.0);
        assert_approx_eq!(mid.y, -2.0);
    }
}
