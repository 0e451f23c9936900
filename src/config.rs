use serde::{Deserialize, Serialize};

/// The tuning parameters of a simulation.
///
/// All distances are in abstract length units and all speeds in units per tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// The width of a lane, which is also the side length of a crossing.
    pub block_size: i32,
    /// The maximum speed on a lane segment.
    pub lane_max_speed: i32,
    /// The maximum speed on a crossing segment.
    pub crossing_max_speed: i32,
    /// The largest change in speed a car can make in one tick when speeding up.
    pub max_acceleration: i32,
    /// The largest change in speed a car can make in one tick when braking.
    pub max_deceleration: i32,
    /// Extra space reserved ahead of every car on top of its stopping distance.
    pub braking_buffer: i32,
    /// The number of ticks a lane change takes to complete.
    pub lane_change_duration: u64,
    /// The score at which a car wins the run.
    pub win_score: u32,
    /// The smallest footprint of a randomly generated car.
    pub min_car_size: i32,
    /// The largest footprint of a randomly generated car.
    pub max_car_size: i32,
    /// The lowest top speed of a randomly generated car.
    pub min_car_max_speed: i32,
    /// The highest top speed of a randomly generated car.
    pub max_car_max_speed: i32,
    /// The lowest initial speed of a randomly generated car.
    pub min_car_speed: i32,
    /// Seed for the random number generator; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        let block_size = 40;
        Self {
            block_size,
            lane_max_speed: block_size / 3,
            crossing_max_speed: block_size / 5,
            max_acceleration: 2,
            max_deceleration: 4,
            braking_buffer: block_size / 2,
            lane_change_duration: 3,
            win_score: 100,
            min_car_size: block_size / 2,
            max_car_size: 3 * block_size / 2,
            min_car_max_speed: block_size / 4,
            max_car_max_speed: block_size / 3,
            min_car_speed: block_size / 10,
            seed: None,
        }
    }
}

impl SimConfig {
    /// Creates a default configuration with a fixed random seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "block_size": 40, "seed": 7 }"#).unwrap();
        assert_eq!(config.lane_max_speed, 13);
        assert_eq!(config.braking_buffer, 20);
        assert_eq!(config.seed, Some(7));
    }
}
