//! Tests that the reservation invariants hold throughout random runs.

use reservation_traffic::{CheckMode, Scenario, SimConfig, Simulation, SimulationTester};

fn run(preset: &str, cars: usize, seed: u64, ticks: usize) {
    let mut scenario = Scenario::preset(preset).unwrap();
    scenario.cars = cars;
    scenario.config = SimConfig::seeded(seed);
    let mut sim = Simulation::from_scenario(&scenario).unwrap();
    let tester = SimulationTester::all(5);

    for _ in 0..ticks {
        if let Some(results) = tester.run(&sim) {
            for result in results {
                assert!(result.passed, "{} at frame {}", result, sim.frame());
            }
        }
        sim.step();
    }
    assert!(
        sim.iter_cars().all(|car| !car.is_dead()),
        "{} had a collision",
        preset
    );
}

#[test]
fn big_network_stays_consistent() {
    run("big", 10, 7, 300);
}

#[test]
fn overtaking_road_stays_consistent() {
    run("left_right_overtake", 6, 11, 300);
}

#[test]
fn busy_crossings_stay_consistent() {
    run("two_crossing", 22, 3, 200);
}

#[test]
fn checks_only_run_on_their_frames() {
    let mut sim = Simulation::from_scenario(&Scenario::preset("ring").unwrap()).unwrap();
    let tester = SimulationTester::new(&[CheckMode::Consistency, CheckMode::Overlap], 3);
    let mut checked = 0;
    for _ in 0..9 {
        if let Some(results) = tester.run(&sim) {
            assert_eq!(results.len(), 2);
            assert!(results.iter().all(|result| result.passed));
            checked += 1;
        }
        sim.step();
    }
    assert_eq!(checked, 3);
}
