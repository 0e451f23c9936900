//! Chooses the acceleration and lane changes of each car.
//!
//! Every candidate acceleration is checked by projecting the car's reservation
//! chain far enough to stop from the resulting speed, then checking the new
//! parts of the projection against the reservations of every other car.

use crate::car::reservation::{next_hops, project, Hops};
use crate::{Car, CarSet, Direction, IntersectionId, Network, Reservation, RouteProblem, SegmentId, Side};
use log::debug;
use smallvec::SmallVec;

/// The action chosen for a car in one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    /// The change in speed.
    pub acceleration: i32,
    /// The side to change lane toward, if any.
    pub lane_change: Option<Side>,
}

/// An action along with the reservations validated for it.
#[derive(Clone, Debug)]
pub(crate) struct Decision {
    pub action: Action,
    /// The validated reservation chain, or `None` if every candidate was rejected.
    pub res: Option<Vec<Reservation>>,
    /// The validated reservation on the lane change target.
    pub parallel: Option<Vec<Reservation>>,
    /// The first routing problem met while projecting.
    pub route_problem: Option<RouteProblem>,
}

/// A chain to project for each candidate.
struct Track<'a> {
    chain: &'a [Reservation],
    /// Whether the chain must stay within its only segment.
    confined: bool,
}

/// Space in a lane segment that must last for a number of ticks.
#[derive(Clone, Copy)]
struct Room {
    segment: SegmentId,
    ticks: i32,
}

/// The outcome of an acceleration search.
struct Search {
    acceleration: i32,
    /// The projection of each track, unless every candidate was rejected.
    chains: Option<SmallVec<[Vec<Reservation>; 2]>>,
    problem: Option<RouteProblem>,
}

/// A car passing through a crossing segment.
#[derive(Clone, Copy, Debug)]
struct Transit {
    passage: (Direction, Direction),
    speed: i32,
    /// Ticks until the car clears the crossing.
    leaves: i32,
}

impl Transit {
    /// Returns true if this occupant keeps the entering car out of the crossing.
    /// A car may only follow an occupant along the same passage if the occupant
    /// is faster and leaves no later than the follower would.
    fn blocks(&self, entering: &Transit) -> bool {
        self.passage != entering.passage || self.speed <= entering.speed || self.leaves > entering.leaves
    }
}

/// Plans the actions of cars against a snapshot of the simulation.
pub(crate) struct Planner<'a> {
    network: &'a Network,
    cars: &'a CarSet,
    lane_change_duration: u64,
}

impl<'a> Planner<'a> {
    pub fn new(network: &'a Network, cars: &'a CarSet, lane_change_duration: u64) -> Self {
        Self {
            network,
            cars,
            lane_change_duration,
        }
    }

    /// Decides what a car does this tick.
    pub fn decide(&self, car: &Car) -> Decision {
        if car.is_dead() {
            return Decision {
                action: Action {
                    acceleration: 0,
                    lane_change: None,
                },
                res: None,
                parallel: None,
                route_problem: None,
            };
        }

        let mut tracks: SmallVec<[Track; 2]> = SmallVec::new();
        tracks.push(Track {
            chain: car.reservations(),
            confined: false,
        });
        if let Some(parallel) = car.parallel_reservations() {
            tracks.push(Track {
                chain: parallel,
                confined: true,
            });
        }
        let room = car.lane_change().map(|lc| Room {
            segment: lc.target(),
            ticks: lc.remaining(car.time()) as i32,
        });
        let straight = self.search(car, &tracks, room);
        let lane_change = self.choose_lane(car, &straight);

        let (res, parallel) = match straight.chains {
            Some(mut chains) => {
                let parallel = (chains.len() > 1).then(|| chains.remove(1));
                (Some(chains.remove(0)), parallel)
            }
            None => (None, None),
        };
        Decision {
            action: Action {
                acceleration: straight.acceleration,
                lane_change,
            },
            res,
            parallel,
            route_problem: straight.problem,
        }
    }

    /// Picks an adjacent lane offering a better acceleration than the current one.
    fn choose_lane(&self, car: &Car, straight: &Search) -> Option<Side> {
        let (_, hi) = car.acceleration_range();
        let current = car.reservations()[0];
        let eligible = !car.is_changing_lane()
            && car.reservations().len() == 1
            && self.network.segment(current.segment).is_lane()
            && current.segment != car.goal().segment
            && straight.acceleration < hi;
        if !eligible {
            return None;
        }

        let evaluate = |side: Side| {
            let target = self.network.adjacent_lane_segment(current.segment, side)?;
            let chain = [Reservation::new(target, car.loc(), car.loc(), current.from, current.direction)];
            let track = Track {
                chain: &chain,
                confined: true,
            };
            let room = Room {
                segment: target,
                ticks: self.lane_change_duration as i32 + 1,
            };
            let search = self.search(car, &[track], Some(room));
            search.chains.map(|_| search.acceleration)
        };
        let left = evaluate(Side::Left).filter(|acc| *acc > straight.acceleration);
        let right = evaluate(Side::Right).filter(|acc| *acc >= straight.acceleration);
        let side = match (left, right) {
            (Some(left), Some(right)) if left > right => Some(Side::Left),
            (_, Some(_)) => Some(Side::Right),
            (Some(_), None) => Some(Side::Left),
            (None, None) => None,
        };
        if let Some(side) = side {
            debug!(
                "{} wants to change lane to the {:?}, accelerating by {} if it stays",
                car.name(),
                side,
                straight.acceleration
            );
        }
        side
    }

    /// Finds the largest acceleration for which every track can be projected
    /// without conflicting with another car. Falls back to braking as hard as possible.
    fn search(&self, car: &Car, tracks: &[Track], room: Option<Room>) -> Search {
        let (lo, hi) = car.acceleration_range();
        let limit = tracks
            .iter()
            .flat_map(|track| track.chain)
            .map(|res| self.network.segment(res.segment).max_speed())
            .min()
            .unwrap_or(i32::MAX);
        let goals = [car.goal().segment, car.second_goal().segment];
        let mut problem = None;

        'candidates: for acceleration in (lo..=hi).rev() {
            let speed = car.speed() + acceleration;
            if speed > limit && acceleration > lo {
                continue;
            }
            if let Some(room) = room {
                let length = self.network.segment(room.segment).length();
                if car.loc() + speed * room.ticks + car.braking_distance_at(speed) > length {
                    continue;
                }
            }

            let needed = car.needed_at(speed);
            let mut chains = SmallVec::new();
            for track in tracks {
                let projected = if track.confined {
                    project(self.network, track.chain, needed, car.size(), leaves_segment)
                } else {
                    project(self.network, track.chain, needed, car.size(), |chain| {
                        next_hops(self.network, chain, goals)
                    })
                };
                match projected {
                    Ok(chain) => {
                        if self.conflicts(car, track.chain, &chain, speed) {
                            continue 'candidates;
                        }
                        chains.push(chain);
                    }
                    Err(stalled) => {
                        if !matches!(stalled.problem, RouteProblem::LeavesSegment { .. }) {
                            problem = problem.or(Some(stalled.problem));
                        }
                        continue 'candidates;
                    }
                }
            }
            return Search {
                acceleration,
                chains: Some(chains),
                problem,
            };
        }

        Search {
            acceleration: lo,
            chains: None,
            problem,
        }
    }

    /// Returns true if a projected chain conflicts with another car.
    fn conflicts(&self, car: &Car, current: &[Reservation], projected: &[Reservation], speed: i32) -> bool {
        let mut accumulated = 0;
        let mut entered: SmallVec<[IntersectionId; 2]> = SmallVec::new();
        for (i, res) in projected.iter().enumerate() {
            accumulated += res.length();
            let segment = self.network.segment(res.segment);
            let held = current.get(i).map_or(false, |cur| {
                cur.segment == res.segment && cur.begin <= res.begin && res.end <= cur.end
            });

            let Some(crossing) = segment.as_crossing() else {
                if !held && self.others(car, res.segment).any(|(_, other)| other.interval().overlaps(&res.interval())) {
                    return true;
                }
                continue;
            };
            let intersection = self.network.intersection(crossing.intersection());
            if held {
                // Already inside: only a faster car with an earlier arrival may share the crossing.
                let competing = self
                    .others(car, res.segment)
                    .filter(|(_, other)| other.passage() != res.passage() || other.interval().overlaps(&res.interval()));
                for (other, _) in competing {
                    if speed <= other.speed() || !intersection.precedes(car.id(), other.id()) {
                        return true;
                    }
                }
                continue;
            }

            let rate = speed.min(segment.max_speed()).max(1);
            let entering = Transit {
                passage: res.passage(),
                speed,
                leaves: (accumulated + rate - 1) / rate,
            };
            let blocked = self.others(car, res.segment).any(|(other, other_res)| {
                let occupant = Transit {
                    passage: other_res.passage(),
                    speed: other.speed(),
                    leaves: crossing.time_to_leave(other.id()).unwrap_or(i32::MAX),
                };
                occupant.blocks(&entering)
            });
            if blocked {
                return true;
            }

            let id = intersection.id();
            if !entered.contains(&id) && !car.holds_crossing_in(self.network, id) {
                entered.push(id);
                if self.waiting_ahead(car, id) {
                    return true;
                }
            }
        }
        false
    }

    /// Iterates over the reservations other cars hold on a segment.
    fn others(&self, car: &Car, segment: SegmentId) -> impl Iterator<Item = (&'a Car, &'a Reservation)> + '_ {
        let cars = self.cars;
        let me = car.id();
        self.network
            .segment(segment)
            .cars()
            .iter()
            .filter(move |id| **id != me)
            .filter_map(move |id| cars.get(*id))
            .flat_map(move |other| other.reservations_on(segment).map(move |res| (other, res)))
    }

    /// Returns true if a live car with an earlier arrival at the intersection
    /// holds no crossing in it yet; earlier arrivals already inside are left to
    /// the crossing occupancy rules.
    fn waiting_ahead(&self, car: &Car, intersection: IntersectionId) -> bool {
        let registry = self.network.intersection(intersection);
        registry.iter_priorities().any(|(id, _)| {
            id != car.id()
                && registry.precedes(id, car.id())
                && self
                    .cars
                    .get(id)
                    .map_or(false, |other| !other.is_dead() && !other.holds_crossing_in(self.network, intersection))
        })
    }
}

fn leaves_segment(chain: &[Reservation]) -> Result<Hops, RouteProblem> {
    let segment = chain.last().map(|res| res.segment).unwrap_or_default();
    Err(RouteProblem::LeavesSegment { segment })
}

#[cfg(test)]
mod test {
    use super::*;

    const EAST: (Direction, Direction) = (Direction::Right, Direction::Right);
    const NORTH: (Direction, Direction) = (Direction::Up, Direction::Up);

    fn transit(passage: (Direction, Direction), speed: i32, leaves: i32) -> Transit {
        Transit { passage, speed, leaves }
    }

    #[test]
    fn slower_car_may_follow_a_faster_one_through() {
        let occupant = transit(EAST, 8, 3);
        assert!(!occupant.blocks(&transit(EAST, 4, 10)));
        assert!(!occupant.blocks(&transit(EAST, 4, 3)));
    }

    #[test]
    fn occupant_leaving_later_blocks_entry() {
        let occupant = transit(EAST, 8, 6);
        assert!(occupant.blocks(&transit(EAST, 4, 5)));
    }

    #[test]
    fn occupant_no_faster_blocks_entry() {
        assert!(transit(EAST, 4, 1).blocks(&transit(EAST, 4, 10)));
        assert!(transit(EAST, 2, 1).blocks(&transit(EAST, 6, 10)));
    }

    #[test]
    fn occupant_on_another_passage_blocks_entry() {
        let occupant = transit(NORTH, 13, 1);
        assert!(occupant.blocks(&transit(EAST, 1, 20)));
        assert!(transit((Direction::Right, Direction::Up), 13, 1).blocks(&transit(EAST, 1, 20)));
    }
}
