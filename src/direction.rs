use crate::math::Vector2d;
use serde::{Deserialize, Serialize};

/// A direction of travel, listed in clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

/// The orientation of a road.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// A side relative to a car's direction of travel.
///
/// `Right` is toward the shoulder of the road, `Left` toward its centre.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
    ];

    /// Index of the direction within [Direction::ALL].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The orientation of roads carrying traffic in this direction.
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Right | Direction::Left => Orientation::Horizontal,
            Direction::Down | Direction::Up => Orientation::Vertical,
        }
    }

    /// Whether travelling in this direction increases the coordinate along the road.
    pub fn is_increasing(self) -> bool {
        matches!(self, Direction::Right | Direction::Up)
    }

    /// Whether this is the travel direction of a road's right-hand lanes.
    pub fn is_right_hand(self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }

    /// The opposite direction.
    pub fn reverse(self) -> Self {
        Self::ALL[(self.index() + 2) % 4]
    }

    /// A unit vector pointing in this direction.
    pub fn axis(self) -> Vector2d {
        match self {
            Direction::Right => Vector2d::new(1.0, 0.0),
            Direction::Down => Vector2d::new(0.0, -1.0),
            Direction::Left => Vector2d::new(-1.0, 0.0),
            Direction::Up => Vector2d::new(0.0, 1.0),
        }
    }
}

impl Orientation {
    /// The direction travelled by lanes on this side of the road.
    pub fn direction(self, right_hand: bool) -> Direction {
        match (self, right_hand) {
            (Orientation::Horizontal, true) => Direction::Right,
            (Orientation::Horizontal, false) => Direction::Left,
            (Orientation::Vertical, true) => Direction::Down,
            (Orientation::Vertical, false) => Direction::Up,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clockwise_order() {
        assert_eq!(Direction::Right.reverse(), Direction::Left);
        assert_eq!(Direction::Up.reverse(), Direction::Down);
        for dir in Direction::ALL {
            assert_eq!(Direction::ALL[dir.index()], dir);
            assert_eq!(dir.reverse().reverse(), dir);
            assert_eq!(dir.orientation(), dir.reverse().orientation());
        }
    }

    #[test]
    fn lane_directions() {
        assert_eq!(Orientation::Horizontal.direction(true), Direction::Right);
        assert_eq!(Orientation::Vertical.direction(false), Direction::Up);
        assert!(Direction::Up.is_increasing());
        assert!(!Direction::Down.is_increasing());
        assert!(Direction::Down.is_right_hand());
    }
}
