use crate::SimConfig;

/// The speed change limits of a car, and the stopping distances they imply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dynamics {
    /// The largest increase in speed per tick.
    max_acc: i32,
    /// The largest decrease in speed per tick.
    max_dec: i32,
    /// Extra space kept clear ahead of a stopped car.
    buffer: i32,
}

impl Dynamics {
    /// Creates the dynamics model described by a configuration.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            max_acc: config.max_acceleration.max(0),
            max_dec: config.max_deceleration.max(1),
            buffer: config.braking_buffer.max(0),
        }
    }

    /// The space a car of the given size needs to come to a stop from `speed`,
    /// measured from its rear and including its own length.
    pub fn braking_distance(&self, size: i32, speed: i32) -> i32 {
        let stopping: i32 = (0..=speed.max(0)).step_by(self.max_dec as usize).sum();
        size + stopping + self.buffer
    }

    /// The lowest and highest accelerations which keep the speed within `[0, max_speed]`.
    pub fn acceleration_range(&self, speed: i32, max_speed: i32) -> (i32, i32) {
        let lo = i32::max(-self.max_dec, -speed);
        let hi = i32::max(lo, i32::min(self.max_acc, max_speed - speed));
        (lo, hi)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn braking_distance_at_rest_is_size_plus_buffer() {
        let dynamics = Dynamics::new(&SimConfig::default());
        assert_eq!(dynamics.braking_distance(30, 0), 30 + 20);
    }

    #[test]
    fn braking_distance_sums_multiples_of_deceleration() {
        let dynamics = Dynamics::new(&SimConfig::default());
        // 0 + 4 + 8 + 12
        assert_eq!(dynamics.braking_distance(20, 13), 20 + 24 + 20);
        assert_eq!(dynamics.braking_distance(20, 12), 20 + 24 + 20);
        assert_eq!(dynamics.braking_distance(20, 11), 20 + 12 + 20);
        assert_eq!(dynamics.braking_distance(20, 3), 20 + 20);
    }

    #[test]
    fn braking_distance_is_monotonic() {
        let dynamics = Dynamics::new(&SimConfig::default());
        let mut last = dynamics.braking_distance(25, 0);
        for speed in 1..40 {
            let next = dynamics.braking_distance(25, speed);
            assert!(next >= last);
            // Braking as hard as possible always fits in the space reserved before.
            let slower = (speed - 4).max(0);
            assert!(slower + dynamics.braking_distance(25, slower) <= next);
            last = next;
        }
    }

    #[test]
    fn acceleration_range_respects_speed_limits() {
        let dynamics = Dynamics::new(&SimConfig::default());
        assert_eq!(dynamics.acceleration_range(0, 10), (0, 2));
        assert_eq!(dynamics.acceleration_range(3, 10), (-3, 2));
        assert_eq!(dynamics.acceleration_range(9, 10), (-4, 1));
        assert_eq!(dynamics.acceleration_range(10, 10), (-4, 0));
        assert_eq!(dynamics.acceleration_range(0, 0), (0, 0));
    }
}
