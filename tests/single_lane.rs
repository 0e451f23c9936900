//! Tests that involve a single car on a single lane.

use assert_approx_eq::assert_approx_eq;
use reservation_traffic::{scenario, CarAttributes, CarId, SimConfig, Simulation};

fn setup() -> (Simulation, CarId) {
    let mut sim = Simulation::new(&scenario::ring(), SimConfig::seeded(1)).unwrap();
    let network = sim.network();
    let lane = |name: &str| network.lane_segments(network.road_by_name(name).unwrap().lanes()[0]);
    let (bottom, right) = (lane("bottom"), lane("right"));
    let car = sim
        .add_car(
            &CarAttributes {
                name: "car".into(),
                color: [255, 0, 0],
                size: 20,
                speed: 4,
                max_speed: 13,
            },
            bottom[0],
            0,
            [right[0], right[1]],
        )
        .unwrap();
    (sim, car)
}

/// Test that a car's position increases monotonically.
#[test]
fn car_drives_forward() {
    let (mut sim, car) = setup();
    let mut pos = sim.get_car(car).unwrap().position();
    for _ in 0..80 {
        sim.step();
        let next_pos = sim.get_car(car).unwrap().position();
        assert!(next_pos.x > pos.x);
        assert_approx_eq!(next_pos.y, 20.0);
        pos = next_pos;
    }
}

/// Test that a car on an empty road speeds up to its top speed.
#[test]
fn car_reaches_top_speed() {
    let (mut sim, car) = setup();
    let mut speeds = vec![];
    for _ in 0..6 {
        sim.step();
        speeds.push(sim.get_car(car).unwrap().speed());
    }
    assert_eq!(speeds, [6, 8, 10, 12, 13, 13]);

    let car = sim.get_car(car).unwrap();
    assert_eq!(car.reserved_length(), car.braking_distance());
}
