use crate::car::reservation::{next_hops, project};
use crate::car::Dynamics;
use crate::planner::{Action, Planner};
use crate::{
    Car, CarAttributes, CarId, CarSet, Goal, Network, NetworkError, Reservation, RoadAttributes, Scenario,
    ScenarioError, SegmentId, SimConfig, SpawnError,
};
use cgmath::MetricSpace;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

/// Names and colours given to randomly generated cars.
const PALETTE: [(&str, [u8; 3]); 8] = [
    ("Red", [220, 50, 47]),
    ("Blue", [38, 139, 210]),
    ("Green", [133, 153, 0]),
    ("Orange", [203, 75, 22]),
    ("Violet", [108, 113, 196]),
    ("Cyan", [42, 161, 152]),
    ("Yellow", [181, 137, 0]),
    ("Magenta", [211, 54, 130]),
];

/// The state of a run after a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The run continues.
    Running,
    /// Every car has crashed.
    AllDead,
    /// A car reached the winning score.
    Won { car: CarId },
    /// No car moved.
    Deadlock,
}

impl TickOutcome {
    /// Whether the run has ended.
    pub fn is_over(self) -> bool {
        self != TickOutcome::Running
    }
}

/// A traffic simulation.
pub struct Simulation {
    /// The road network.
    pub(crate) network: Network,
    /// The cars being simulated.
    pub(crate) cars: CarSet,
    /// The simulation parameters.
    config: SimConfig,
    /// Drives car generation.
    rng: StdRng,
    /// The current frame of simulation.
    frame: usize,
    /// The next arrival sequence number.
    seq: u64,
    /// The state of the run after the last tick.
    outcome: TickOutcome,
}

impl Simulation {
    /// Creates a simulation of the given roads, without any cars.
    pub fn new(roads: &[RoadAttributes], config: SimConfig) -> Result<Self, NetworkError> {
        let network = Network::new(roads, &config)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            network,
            cars: CarSet::with_key(),
            config,
            rng,
            frame: 0,
            seq: 0,
            outcome: TickOutcome::Running,
        })
    }

    /// Creates a simulation from a scenario, populated with random cars.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let mut sim = Self::new(&scenario.roads, scenario.config.clone())?;
        sim.reset(scenario.cars)?;
        Ok(sim)
    }

    /// Places a car with its rear `loc` units into a lane segment.
    ///
    /// The car reserves the space it needs to stop from its initial speed,
    /// routing toward the first of its goals. It is refused if any of that
    /// space is already reserved.
    pub fn add_car(
        &mut self,
        attribs: &CarAttributes,
        segment: SegmentId,
        loc: i32,
        goals: [SegmentId; 2],
    ) -> Result<CarId, SpawnError> {
        let lane = self
            .network
            .get_segment(segment)
            .and_then(|seg| seg.as_lane().map(|lane| (seg.length(), lane.direction())));
        let (length, direction) = lane.ok_or(SpawnError::NotALane)?;
        if loc < 0 || loc + attribs.size > length {
            return Err(SpawnError::OutOfBounds);
        }
        let is_lane = |id| self.network.get_segment(id).map_or(false, |seg| seg.is_lane());
        if goals[0] == goals[1] || !goals.into_iter().all(is_lane) {
            return Err(SpawnError::InvalidGoal);
        }

        let goals_at = goals.map(|id| Goal::new(&self.network, id));
        let dynamics = Dynamics::new(&self.config);
        let id = self
            .cars
            .insert_with_key(|id| Car::new(id, attribs, dynamics, segment, loc, direction, goals_at));
        let car = &self.cars[id];
        let (chain, problem) = match project(
            &self.network,
            car.reservations(),
            car.needed_at(car.speed()),
            car.size(),
            |chain| next_hops(&self.network, chain, goals),
        ) {
            Ok(chain) => (chain, None),
            Err(stalled) => (stalled.chain, Some(stalled.problem)),
        };
        if !self.is_free(id, &chain) {
            self.cars.remove(id);
            return Err(SpawnError::Occupied);
        }

        let car = &mut self.cars[id];
        if let Some(problem) = problem {
            warn!("{} cannot reserve its stopping distance: {}", car.name(), problem);
        }
        car.set_route_problem(problem);
        self.network.segment_mut(segment).occupy(id);
        car.commit(&mut self.network, chain, None);
        car.refresh(&mut self.network, &mut self.seq);
        car.update_coords(&self.network);
        Ok(id)
    }

    /// Places a car with random attributes on a random free lane segment,
    /// with two random goals.
    pub fn spawn_random_car(&mut self) -> Result<CarId, SpawnError> {
        let config = &self.config;
        let index = self.cars.len();
        let (name, color) = PALETTE[index % PALETTE.len()];
        let round = index / PALETTE.len();
        let name = match round {
            0 => name.to_string(),
            _ => format!("{} {}", name, round + 1),
        };
        let max_speed = self
            .rng
            .gen_range(config.min_car_max_speed..=config.max_car_max_speed.max(config.min_car_max_speed));
        let mut attribs = CarAttributes {
            name,
            color,
            size: self
                .rng
                .gen_range(config.min_car_size..=config.max_car_size.max(config.min_car_size)),
            speed: self.rng.gen_range(config.min_car_speed.min(max_speed)..=max_speed),
            max_speed,
        };

        let dynamics = Dynamics::new(config);
        let free = self
            .network
            .iter_segments()
            .filter(|seg| seg.is_lane() && seg.cars().is_empty())
            .filter(|seg| seg.length() >= dynamics.braking_distance(attribs.size, 0))
            .map(|seg| (seg.id(), seg.length()))
            .collect::<Vec<_>>();
        let &(segment, length) = free.choose(&mut self.rng).ok_or(SpawnError::NoFreeSegment)?;

        // Slow down until the car can stop within the segment.
        let size = attribs.size;
        let needed = |speed| speed + dynamics.braking_distance(size, speed);
        while attribs.speed > 0 && needed(attribs.speed) > length {
            attribs.speed -= 1;
        }
        let loc = self.rng.gen_range(0..=(length - needed(attribs.speed)).max(0));

        let goals = self.random_goals(segment)?;
        self.add_car(&attribs, segment, loc, goals)
    }

    /// Removes every car, then adds `count` random cars.
    pub fn reset(&mut self, count: usize) -> Result<(), SpawnError> {
        for car in self.cars.values_mut() {
            car.release_all(&mut self.network);
        }
        self.cars.clear();
        self.frame = 0;
        self.outcome = TickOutcome::Running;
        for _ in 0..count {
            self.spawn_random_car()?;
        }
        info!("Reset with {} cars", count);
        Ok(())
    }

    /// Decides what a car would do if the simulation were stepped now.
    pub fn plan(&self, id: CarId) -> Option<Action> {
        let planner = Planner::new(&self.network, &self.cars, self.config.lane_change_duration);
        self.cars.get(id).map(|car| planner.decide(car).action)
    }

    /// Advances the simulation by one tick.
    ///
    /// Cars are processed one after another; each car decides and commits its
    /// action before the next one plans.
    pub fn step(&mut self) -> TickOutcome {
        let ids = self.cars.keys().collect::<Vec<_>>();
        for id in ids {
            self.step_car(id);
        }
        self.frame += 1;
        self.outcome = self.evaluate();
        self.outcome
    }

    /// Steps the simulation, starting a new run with `car_count` random cars
    /// if the current one ended. Returns whether a new run was started.
    pub fn advance(&mut self, car_count: usize) -> Result<bool, SpawnError> {
        let outcome = self.step();
        if !outcome.is_over() {
            return Ok(false);
        }
        info!("Run ended after {} frames: {:?}", self.frame, outcome);
        self.reset(car_count)?;
        Ok(true)
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The state of the run after the last tick.
    pub fn outcome(&self) -> TickOutcome {
        self.outcome
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns an iterator over all the cars in the simulation.
    pub fn iter_cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    /// Gets a reference to the car with the given ID.
    pub fn get_car(&self, id: CarId) -> Option<&Car> {
        self.cars.get(id)
    }

    fn step_car(&mut self, id: CarId) {
        let decision = match self.cars.get(id) {
            Some(car) if !car.is_dead() => {
                Planner::new(&self.network, &self.cars, self.config.lane_change_duration).decide(car)
            }
            _ => return,
        };

        let Self { network, cars, .. } = self;
        let car = &mut cars[id];
        if decision.route_problem != car.route_problem() {
            if let Some(problem) = decision.route_problem {
                warn!("{} has a routing problem: {}", car.name(), problem);
            }
            car.set_route_problem(decision.route_problem);
        }

        car.change_speed(decision.action.acceleration);
        match decision.res {
            Some(res) => car.commit(network, res, decision.parallel),
            None => {
                let needed = car.needed_at(car.speed());
                car.trim(network, needed);
                if car.is_changing_lane() {
                    debug!("{} cannot keep its lane change safe, aborting", car.name());
                    car.abort_lane_change(network);
                }
            }
        }
        if self.target_conflicts(id) {
            debug!("{} lost its target lane, aborting lane change", self.cars[id].name());
            self.cars[id].abort_lane_change(&mut self.network);
        }

        let Self {
            network,
            cars,
            config,
            seq,
            ..
        } = self;
        let car = &mut cars[id];
        let left = car.advance(network);
        car.refresh(network, seq);
        if let Some(side) = decision.action.lane_change {
            if let Err(problem) = car.begin_lane_change(side, network, config.lane_change_duration) {
                debug!("{} cannot change lane: {}", car.name(), problem);
            }
        }
        car.update_coords(network);

        let crashed = self.collisions(id);
        if !crashed.is_empty() {
            for other in crashed.iter().chain([&id]) {
                let car = &mut self.cars[*other];
                warn!("{} crashed", car.name());
                car.kill(&mut self.network);
            }
            return;
        }

        self.check_goal(id, &left);
    }

    /// Returns true if another car has reserved space in the target of a lane change.
    fn target_conflicts(&self, id: CarId) -> bool {
        let car = &self.cars[id];
        let Some(parallel) = car.parallel_reservations() else {
            return false;
        };
        parallel.iter().any(|res| {
            self.network.segment(res.segment).cars().iter().any(|other| {
                *other != id
                    && self.cars.get(*other).map_or(false, |other| {
                        other
                            .reservations_on(res.segment)
                            .any(|o| o.interval().overlaps(&res.interval()))
                    })
            })
        })
    }

    /// Finds the live cars whose footprints overlap that of a car.
    fn collisions(&self, id: CarId) -> SmallVec<[CarId; 2]> {
        let car = &self.cars[id];
        let footprint = car.footprint();
        self.cars
            .values()
            .filter(|other| other.id() != id && !other.is_dead())
            .filter(|other| {
                let theirs = other.footprint();
                footprint.iter().any(|mine| {
                    theirs.iter().any(|res| {
                        if res.segment != mine.segment {
                            return false;
                        }
                        let crossing = self.network.segment(res.segment).is_crossing();
                        res.interval().overlaps(&mine.interval()) || (crossing && res.passage() != mine.passage())
                    })
                })
            })
            .map(|other| other.id())
            .collect()
    }

    /// Counts a goal as reached if the car is at it or drove through it.
    fn check_goal(&mut self, id: CarId, left: &[SegmentId]) {
        let car = &self.cars[id];
        let goal = *car.goal();
        let near = car.segment() == goal.segment
            && car.position().distance(goal.position) < 0.5 * (car.size() + self.network.block_size()) as f64;
        if !near && !left.contains(&goal.segment) {
            return;
        }

        let second = car.second_goal().segment;
        let next = self.random_goal(&[goal.segment, second]).unwrap_or(goal.segment);
        let next = Goal::new(&self.network, next);
        let car = &mut self.cars[id];
        car.reach_goal(next);
        info!("{} reached a goal, score {}", car.name(), car.score());
    }

    /// Picks two distinct goals, neither of them the given segment.
    fn random_goals(&mut self, start: SegmentId) -> Result<[SegmentId; 2], SpawnError> {
        let candidates = self.goal_candidates(&[start]);
        let picked = candidates
            .choose_multiple(&mut self.rng, 2)
            .copied()
            .collect::<Vec<_>>();
        match picked.as_slice() {
            [first, second] => Ok([*first, *second]),
            _ => Err(SpawnError::NoGoal),
        }
    }

    fn random_goal(&mut self, exclude: &[SegmentId]) -> Option<SegmentId> {
        let candidates = self.goal_candidates(exclude);
        candidates.choose(&mut self.rng).copied()
    }

    /// Lane segments long enough to be goals.
    fn goal_candidates(&self, exclude: &[SegmentId]) -> Vec<SegmentId> {
        self.network
            .iter_lane_segments()
            .filter(|id| !exclude.contains(id))
            .filter(|id| self.network.segment(*id).length() >= self.network.block_size())
            .collect()
    }

    /// Returns true if none of the space in a chain is reserved by another car.
    fn is_free(&self, id: CarId, chain: &[Reservation]) -> bool {
        chain.iter().all(|res| {
            let segment = self.network.segment(res.segment);
            segment.cars().iter().filter(|other| **other != id).all(|other| {
                segment.is_lane()
                    && self.cars.get(*other).map_or(true, |other| {
                        other
                            .reservations_on(res.segment)
                            .all(|o| !o.interval().overlaps(&res.interval()))
                    })
            })
        })
    }

    fn evaluate(&self) -> TickOutcome {
        if self.cars.is_empty() {
            return TickOutcome::Running;
        }
        let mut alive = self.cars.values().filter(|car| !car.is_dead()).peekable();
        if alive.peek().is_none() {
            return TickOutcome::AllDead;
        }
        if let Some(winner) = self.cars.values().find(|car| car.score() >= self.config.win_score) {
            return TickOutcome::Won { car: winner.id() };
        }
        if alive.all(|car| car.speed() == 0) {
            return TickOutcome::Deadlock;
        }
        TickOutcome::Running
    }
}
