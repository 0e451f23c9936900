//! Consistency checks run against a simulation while it steps.

use crate::{Car, Simulation};
use itertools::Itertools;
use std::fmt;

/// A property of the simulation state that can be checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckMode {
    /// Every live car's reservation chain ends in a lane segment.
    Reserved,
    /// Every live car has reserved enough space to stop.
    Reservation,
    /// Cars and segments agree on which segments each car reserves.
    Consistency,
    /// Cars in a crossing hold an arrival priority there, and only live cars hold priorities.
    Priority,
    /// No two live cars reserve the same space.
    Overlap,
}

impl CheckMode {
    pub const ALL: [CheckMode; 5] = [
        CheckMode::Reserved,
        CheckMode::Reservation,
        CheckMode::Consistency,
        CheckMode::Priority,
        CheckMode::Overlap,
    ];
}

/// The outcome of a single check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub mode: CheckMode,
    pub passed: bool,
    pub message: String,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "ok" } else { "FAILED" };
        write!(f, "{:?} check {}: {}", self.mode, status, self.message)
    }
}

/// Runs a set of checks every `rate` frames.
#[derive(Clone, Debug)]
pub struct SimulationTester {
    modes: Vec<CheckMode>,
    rate: usize,
}

impl SimulationTester {
    /// Creates a tester running the given checks every `rate` frames.
    pub fn new(modes: &[CheckMode], rate: usize) -> Self {
        Self {
            modes: modes.to_vec(),
            rate: rate.max(1),
        }
    }

    /// Creates a tester running every check every `rate` frames.
    pub fn all(rate: usize) -> Self {
        Self::new(&CheckMode::ALL, rate)
    }

    /// Runs the checks if the simulation is on a checked frame.
    pub fn run(&self, sim: &Simulation) -> Option<Vec<CheckResult>> {
        if sim.frame() % self.rate != 0 {
            return None;
        }
        Some(self.modes.iter().map(|mode| self.check(sim, *mode)).collect())
    }

    /// Runs a single check.
    pub fn check(&self, sim: &Simulation, mode: CheckMode) -> CheckResult {
        let (failures, message) = match mode {
            CheckMode::Reserved => reserved(sim),
            CheckMode::Reservation => reservation(sim),
            CheckMode::Consistency => consistency(sim),
            CheckMode::Priority => priority(sim),
            CheckMode::Overlap => overlap(sim),
        };
        CheckResult {
            mode,
            passed: failures == 0,
            message,
        }
    }
}

fn live_cars(sim: &Simulation) -> impl Iterator<Item = &Car> {
    sim.iter_cars().filter(|car| !car.is_dead())
}

fn reserved(sim: &Simulation) -> (usize, String) {
    let network = sim.network();
    let count = live_cars(sim)
        .filter(|car| {
            car.reservations()
                .last()
                .map_or(true, |res| !network.segment(res.segment).is_lane())
        })
        .count();
    (count, format!("{} cars' reservations do not end in a lane segment", count))
}

fn reservation(sim: &Simulation) -> (usize, String) {
    let network = sim.network();
    let mut too_short = 0;
    let mut short_tail = 0;
    for car in live_cars(sim).filter(|car| car.route_problem().is_none()) {
        if car.reserved_length() < car.braking_distance() {
            too_short += 1;
        }
        let res = car.reservations();
        if let [.., before, tail] = res {
            if network.segment(before.segment).is_crossing() && tail.length() < car.size() {
                short_tail += 1;
            }
        }
    }
    (
        too_short + short_tail,
        format!(
            "{} cars cannot stop in their reservation, {} would stop inside a crossing",
            too_short, short_tail
        ),
    )
}

fn consistency(sim: &Simulation) -> (usize, String) {
    let network = sim.network();
    let mut missing = 0;
    let mut additional = 0;
    for car in sim.iter_cars() {
        let chains = car.reservations().iter().chain(car.parallel_reservations().unwrap_or(&[]));
        for res in chains {
            let count = network
                .segment(res.segment)
                .cars()
                .iter()
                .filter(|id| **id == car.id())
                .count();
            if count != 1 {
                missing += 1;
            }
        }
    }
    for segment in network.iter_segments() {
        for id in segment.cars() {
            let reserved = sim
                .get_car(*id)
                .map_or(false, |car| car.reservations_on(segment.id()).next().is_some());
            if !reserved {
                additional += 1;
            }
        }
    }
    (
        missing + additional,
        format!(
            "{} reservations are not registered exactly once, {} registrations have no reservation",
            missing, additional
        ),
    )
}

fn priority(sim: &Simulation) -> (usize, String) {
    let network = sim.network();
    let mut unclaimed = 0;
    let mut stale = 0;
    for car in live_cars(sim) {
        for res in car.reservations() {
            if let Some(intersection) = network.segment(res.segment).intersection() {
                if network.intersection(intersection).priority(car.id()).is_none() {
                    unclaimed += 1;
                }
            }
        }
    }
    for intersection in network.iter_intersections() {
        for (id, _) in intersection.iter_priorities() {
            let valid = sim
                .get_car(id)
                .map_or(false, |car| !car.is_dead() && car.claims().contains(&intersection.id()));
            if !valid {
                stale += 1;
            }
        }
    }
    (
        unclaimed + stale,
        format!(
            "{} crossings are held without priority, {} priorities belong to no live car",
            unclaimed, stale
        ),
    )
}

fn overlap(sim: &Simulation) -> (usize, String) {
    let network = sim.network();
    let cars = live_cars(sim).collect::<Vec<_>>();
    let count = cars
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| {
            let mut mine = a.reservations().iter().chain(a.parallel_reservations().unwrap_or(&[]));
            mine.any(|mine| {
                b.reservations_on(mine.segment).any(|theirs| {
                    let crossing = network.segment(mine.segment).is_crossing();
                    mine.interval().overlaps(&theirs.interval()) || (crossing && mine.passage() != theirs.passage())
                })
            })
        })
        .count();
    (count, format!("{} pairs of cars reserve the same space", count))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{CarAttributes, RoadAttributes, SimConfig};

    #[test]
    fn checks_pass_on_a_fresh_simulation() {
        let roads = [
            RoadAttributes::horizontal("h", 100, 1, 1),
            RoadAttributes::vertical("v", 400, 1, 1),
        ];
        let mut sim = Simulation::new(&roads, SimConfig::seeded(3)).unwrap();
        sim.reset(3).unwrap();
        let tester = SimulationTester::all(10);
        let results = tester.run(&sim).unwrap();
        assert_eq!(results.len(), 5);
        for result in results {
            assert!(result.passed, "{}", result);
        }

        sim.step();
        assert!(tester.run(&sim).is_none());
    }

    #[test]
    fn overlapping_reservations_are_reported() {
        let roads = [
            RoadAttributes::horizontal("h", 100, 1, 1),
            RoadAttributes::vertical("v", 400, 1, 1),
        ];
        let mut sim = Simulation::new(&roads, SimConfig::default()).unwrap();
        let lane = sim.network().road_by_name("h").unwrap().right_lanes()[0];
        let east = sim.network().lane_segments(lane)[0];
        let goals = sim
            .network()
            .iter_lane_segments()
            .filter(|id| *id != east)
            .take(2)
            .collect::<Vec<_>>();
        let attribs = CarAttributes {
            name: "a".into(),
            color: [0, 0, 0],
            size: 20,
            speed: 0,
            max_speed: 0,
        };
        let a = sim.add_car(&attribs, east, 0, [goals[0], goals[1]]).unwrap();
        sim.add_car(&attribs, east, 100, [goals[0], goals[1]]).unwrap();

        let tester = SimulationTester::new(&[CheckMode::Overlap], 1);
        assert!(tester.check(&sim, CheckMode::Overlap).passed);

        // Force the first car's reservation into the second's.
        sim.cars[a].res[0].end = 120;
        let result = tester.check(&sim, CheckMode::Overlap);
        assert!(!result.passed);
        assert_eq!(result.message, "1 pairs of cars reserve the same space");
    }
}
