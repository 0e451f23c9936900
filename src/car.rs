use self::reservation::{footprint, replace_chain, reserved_length, shrink};
use crate::math::{lerp, Point2d};
use crate::{CarId, Direction, IntersectionId, Network, RouteProblem, SegmentId, SegmentKind};
use cgmath::EuclideanSpace;
use log::warn;
use smallvec::SmallVec;

pub use dynamics::Dynamics;
pub use lane_change::LaneChange;
pub use reservation::Reservation;

mod dynamics;
mod lane_change;
pub(crate) mod reservation;

/// A simulated car.
#[derive(Clone, Debug)]
pub struct Car {
    /// The car's ID.
    pub(crate) id: CarId,
    /// A display name.
    name: String,
    /// A display colour.
    color: [u8; 3],
    /// The length of the car.
    size: i32,
    /// The distance travelled each tick.
    speed: i32,
    /// The highest speed the car will drive at.
    max_speed: i32,
    /// The acceleration limits.
    dynamics: Dynamics,
    /// The distance of the car's rear from the entry of its first reserved segment.
    loc: i32,
    /// Whether the car has crashed.
    dead: bool,
    /// The goal currently driven toward.
    goal: Goal,
    /// The goal after the current one.
    second_goal: Goal,
    /// The number of goals reached.
    score: u32,
    /// The number of ticks the car has been simulated for.
    time: u64,
    /// The reservation chain, starting at the car's rear.
    pub(crate) res: Vec<Reservation>,
    /// The in-progress lane change, if there is one.
    pub(crate) lane_change: Option<LaneChange>,
    /// The intersections the car has claimed an arrival priority on.
    claims: SmallVec<[IntersectionId; 4]>,
    /// The most recent problem met while extending the reservation.
    route_problem: Option<RouteProblem>,
    /// The world space coordinates of the centre of the car.
    world_pos: Point2d,
}

/// The attributes of a car.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CarAttributes {
    pub name: String,
    pub color: [u8; 3],
    /// The length of the car.
    pub size: i32,
    /// The initial speed.
    pub speed: i32,
    pub max_speed: i32,
}

/// A lane segment a car is driving toward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Goal {
    pub segment: SegmentId,
    /// The midpoint of the segment.
    pub position: Point2d,
}

impl Goal {
    /// Creates a goal at the midpoint of a segment.
    pub fn new(network: &Network, segment: SegmentId) -> Self {
        Self {
            segment,
            position: network.midpoint(segment),
        }
    }
}

impl Car {
    /// Creates a new car, with its rear `loc` units into `segment`.
    pub(crate) fn new(
        id: CarId,
        attribs: &CarAttributes,
        dynamics: Dynamics,
        segment: SegmentId,
        loc: i32,
        direction: Direction,
        goals: [Goal; 2],
    ) -> Self {
        let [goal, second_goal] = goals;
        Self {
            id,
            name: attribs.name.clone(),
            color: attribs.color,
            size: attribs.size,
            speed: attribs.speed.clamp(0, attribs.max_speed.max(0)),
            max_speed: attribs.max_speed.max(0),
            dynamics,
            loc,
            dead: false,
            goal,
            second_goal,
            score: 0,
            time: 0,
            res: vec![Reservation::new(segment, loc, loc, direction, direction)],
            lane_change: None,
            claims: SmallVec::new(),
            route_problem: None,
            world_pos: Point2d::origin(),
        }
    }

    /// Gets the car's ID.
    pub fn id(&self) -> CarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// The length of the car.
    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    pub fn max_speed(&self) -> i32 {
        self.max_speed
    }

    /// The distance of the car's rear from the entry of the segment it is on.
    pub fn loc(&self) -> i32 {
        self.loc
    }

    /// Whether the car has crashed.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn second_goal(&self) -> &Goal {
        &self.second_goal
    }

    /// The number of goals the car has reached.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// The segment the car's rear is on.
    pub fn segment(&self) -> SegmentId {
        self.res[0].segment
    }

    /// The direction the car is travelling in.
    pub fn direction(&self) -> Direction {
        self.res[0].direction
    }

    /// The reservation chain, starting at the car's rear.
    pub fn reservations(&self) -> &[Reservation] {
        &self.res
    }

    /// The reservation on the target lane of an in-progress lane change.
    pub fn parallel_reservations(&self) -> Option<&[Reservation]> {
        self.lane_change.as_ref().map(|lc| lc.res.as_slice())
    }

    /// Iterates over the car's reservations on a segment, including those of a lane change.
    pub fn reservations_on(&self, segment: SegmentId) -> impl Iterator<Item = &Reservation> {
        self.res
            .iter()
            .chain(self.parallel_reservations().unwrap_or(&[]))
            .filter(move |res| res.segment == segment)
    }

    /// The total length of the reservation chain, measured from the car's rear.
    pub fn reserved_length(&self) -> i32 {
        reserved_length(&self.res)
    }

    /// The part of the reservation chain the car physically occupies.
    pub fn footprint(&self) -> SmallVec<[Reservation; 4]> {
        footprint(&self.res, self.size)
    }

    /// The in-progress lane change, if there is one.
    pub fn lane_change(&self) -> Option<&LaneChange> {
        self.lane_change.as_ref()
    }

    pub fn is_changing_lane(&self) -> bool {
        self.lane_change.is_some()
    }

    /// The intersections the car has claimed an arrival priority on.
    pub fn claims(&self) -> &[IntersectionId] {
        &self.claims
    }

    /// The most recent problem met while extending the reservation, if it persists.
    pub fn route_problem(&self) -> Option<RouteProblem> {
        self.route_problem
    }

    /// The coordinates in world space of the centre of the car.
    pub fn position(&self) -> Point2d {
        self.world_pos
    }

    /// The number of ticks the car has been simulated for.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn dynamics(&self) -> &Dynamics {
        &self.dynamics
    }

    /// The space the car needs to stop at its current speed.
    pub fn braking_distance(&self) -> i32 {
        self.braking_distance_at(self.speed)
    }

    /// The space the car needs to stop from the given speed.
    pub fn braking_distance_at(&self, speed: i32) -> i32 {
        self.dynamics.braking_distance(self.size, speed)
    }

    /// The space a car must have reserved ahead of its rear to drive at `speed` for one tick.
    pub fn needed_at(&self, speed: i32) -> i32 {
        speed + self.braking_distance_at(speed)
    }

    /// The range of accelerations the car can choose from.
    pub fn acceleration_range(&self) -> (i32, i32) {
        self.dynamics.acceleration_range(self.speed, self.max_speed)
    }

    /// Whether the reservation chain holds a crossing of the given intersection.
    pub fn holds_crossing_in(&self, network: &Network, intersection: IntersectionId) -> bool {
        self.res
            .iter()
            .any(|res| network.segment(res.segment).intersection() == Some(intersection))
    }

    pub(crate) fn change_speed(&mut self, acceleration: i32) {
        self.speed = (self.speed + acceleration).clamp(0, self.max_speed);
    }

    pub(crate) fn set_route_problem(&mut self, problem: Option<RouteProblem>) {
        self.route_problem = problem;
    }

    /// Replaces the reservation chains with validated projections.
    pub(crate) fn commit(
        &mut self,
        network: &mut Network,
        res: Vec<Reservation>,
        parallel: Option<Vec<Reservation>>,
    ) {
        replace_chain(network, self.id, &mut self.res, res);
        if let (Some(lc), Some(parallel)) = (self.lane_change.as_mut(), parallel) {
            replace_chain(network, self.id, &mut lc.res, parallel);
        }
    }

    /// Shrinks the reservation chains to cover `needed` units, without entering any new segment.
    pub(crate) fn trim(&mut self, network: &mut Network, needed: i32) {
        let res = shrink(network, &self.res, needed, self.size);
        let parallel = self
            .lane_change
            .as_ref()
            .map(|lc| shrink(network, &lc.res, needed, self.size));
        self.commit(network, res, parallel);
    }

    /// Moves the car forward by its speed, releasing every segment it has fully left.
    /// Returns the segments left.
    pub(crate) fn advance(&mut self, network: &mut Network) -> SmallVec<[SegmentId; 4]> {
        self.time += 1;
        let reach = self.reserved_length() - self.size;
        if self.speed > reach {
            warn!(
                "{} would overrun its reservation, stopping after {} units",
                self.name,
                reach.max(0)
            );
            self.speed = reach.max(0);
        }
        self.loc += self.speed;
        self.progress_lane_change(network);

        let mut left = SmallVec::new();
        while self.res.len() > 1 {
            let segment = network.segment(self.res[0].segment);
            if self.loc < segment.length() {
                break;
            }
            self.loc -= segment.length();
            left.push(segment.id());
            network.segment_mut(self.res[0].segment).release(self.id);
            self.res.remove(0);
        }
        self.res[0].begin = self.loc;
        if let Some(lc) = self.lane_change.as_mut() {
            lc.res[0].begin = self.loc;
        }
        left
    }

    /// Updates the time each reserved crossing will take to leave,
    /// along with the intersections the car claims arrival priority on.
    pub(crate) fn refresh(&mut self, network: &mut Network, seq: &mut u64) {
        let mut accumulated = 0;
        let mut keep: SmallVec<[IntersectionId; 4]> = SmallVec::new();
        let mut claim: SmallVec<[IntersectionId; 4]> = SmallVec::new();
        for res in &self.res {
            accumulated += res.length();
            let segment = network.segment(res.segment);
            match segment.kind() {
                SegmentKind::Crossing(crossing) => {
                    let rate = self.speed.min(segment.max_speed()).max(1);
                    let ticks = (accumulated + rate - 1) / rate;
                    keep.push(crossing.intersection());
                    claim.push(crossing.intersection());
                    network.segment_mut(res.segment).set_time_to_leave(self.id, ticks);
                }
                SegmentKind::Lane(lane) => {
                    if let Some(next) = lane.end_crossing().and_then(|c| network.segment(c).intersection()) {
                        keep.push(next);
                    }
                }
            }
        }

        // Approaching the end of the lane at the tail of the chain.
        if let Some(tail) = self.res.last() {
            let segment = network.segment(tail.segment);
            if let Some(lane) = segment.as_lane() {
                let next = lane.end_crossing().and_then(|c| network.segment(c).intersection());
                if let Some(next) = next {
                    if (segment.length() - tail.end) * 10 <= segment.length() {
                        claim.push(next);
                    }
                }
            }
        }

        let id = self.id;
        self.claims.retain(|intersection| {
            let kept = keep.contains(intersection);
            if !kept {
                network.intersection_mut(*intersection).release(id);
            }
            kept
        });
        for intersection in claim {
            if !self.claims.contains(&intersection) {
                network.intersection_mut(intersection).claim(id, seq);
                self.claims.push(intersection);
            }
        }
    }

    /// Marks the car as crashed. It stops where it is and keeps only the space it occupies.
    pub(crate) fn kill(&mut self, network: &mut Network) {
        self.dead = true;
        self.speed = 0;
        self.abort_lane_change(network);
        let occupied = self.footprint().into_vec();
        replace_chain(network, self.id, &mut self.res, occupied);
        for intersection in self.claims.drain(..) {
            network.intersection_mut(intersection).release(self.id);
        }
    }

    /// Counts a goal as reached, and starts driving toward the next one.
    pub(crate) fn reach_goal(&mut self, next: Goal) {
        self.score += 1;
        self.goal = std::mem::replace(&mut self.second_goal, next);
    }

    /// Removes every trace of the car from the network.
    pub(crate) fn release_all(&mut self, network: &mut Network) {
        self.abort_lane_change(network);
        replace_chain(network, self.id, &mut self.res, vec![]);
        for intersection in self.claims.drain(..) {
            network.intersection_mut(intersection).release(self.id);
        }
    }

    /// Recomputes the world space position of the car's centre.
    pub(crate) fn update_coords(&mut self, network: &Network) {
        let Some(last) = self.res.len().checked_sub(1) else { return };
        let mut dist = self.size / 2;
        let mut centre = self.world_pos;
        for (i, res) in self.res.iter().enumerate() {
            if dist <= res.length() || i == last {
                centre = network.locate(res, res.begin + dist.min(res.length()));
                break;
            }
            dist -= res.length();
        }
        if let Some(lc) = &self.lane_change {
            let offset = network.lateral_offset(self.res[0].segment, lc.target());
            centre = lerp(centre, centre + offset, lc.progress(self.time));
        }
        self.world_pos = centre;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Direction, RoadAttributes, SimConfig};
    use assert_approx_eq::assert_approx_eq;
    use slotmap::SlotMap;

    fn network() -> Network {
        Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 1, 0),
                RoadAttributes::vertical("v", 300, 1, 0),
            ],
            &SimConfig::default(),
        )
        .unwrap()
    }

    fn spawn(network: &mut Network, loc: i32, speed: i32) -> Car {
        let mut ids = SlotMap::<CarId, ()>::with_key();
        let id = ids.insert(());
        let lane = network.road_by_name("h").unwrap().lanes()[0];
        let segment = network.lane_segments(lane)[0];
        let goal = Goal::new(network, segment);
        let attribs = CarAttributes {
            name: "test".into(),
            color: [0, 0, 0],
            size: 20,
            speed,
            max_speed: 13,
        };
        let mut car = Car::new(
            id,
            &attribs,
            Dynamics::new(&SimConfig::default()),
            segment,
            loc,
            Direction::Right,
            [goal, goal],
        );
        network.segment_mut(segment).occupy(id);
        let needed = car.needed_at(speed);
        car.res[0].end = loc + needed;
        car
    }

    #[test]
    fn advance_moves_within_the_segment() {
        let mut network = network();
        let mut car = spawn(&mut network, 100, 8);
        let left = car.advance(&mut network);
        assert!(left.is_empty());
        assert_eq!(car.loc(), 108);
        assert_eq!(car.reservations()[0].begin, 108);
        assert_eq!(car.time(), 1);

        car.update_coords(&network);
        assert_approx_eq!(car.position().x, 118.0);
        assert_approx_eq!(car.position().y, 120.0);
    }

    #[test]
    fn speed_is_capped_by_the_reservation() {
        let mut network = network();
        let mut car = spawn(&mut network, 100, 8);
        car.res[0].end = 125;
        car.advance(&mut network);
        assert_eq!(car.speed(), 5);
        assert_eq!(car.loc(), 105);
    }

    #[test]
    fn claims_the_intersection_ahead_near_the_end_of_the_lane() {
        let mut network = network();
        let mut car = spawn(&mut network, 200, 0);
        let mut seq = 0;
        car.refresh(&mut network, &mut seq);
        assert!(car.claims().is_empty());

        car.res[0].end = 290;
        car.refresh(&mut network, &mut seq);
        assert_eq!(car.claims().len(), 1);
        let intersection = network.intersection(car.claims()[0]);
        assert_eq!(intersection.priority(car.id()), Some(1));

        // Shrinking the reservation keeps the claim while the lane still leads into it.
        car.res[0].end = 250;
        car.refresh(&mut network, &mut seq);
        assert_eq!(car.claims().len(), 1);

        car.kill(&mut network);
        assert!(car.claims().is_empty());
        assert_eq!(network.iter_intersections().next().unwrap().priority(car.id()), None);
        assert_eq!(car.reserved_length(), 20);
    }

    #[test]
    fn reaching_a_goal_rotates_goals() {
        let mut network = network();
        let mut car = spawn(&mut network, 0, 0);
        let other = network.lane_segments(network.road_by_name("v").unwrap().lanes()[0])[0];
        let next = Goal::new(&network, other);
        car.reach_goal(next);
        assert_eq!(car.score(), 1);
        assert_eq!(car.second_goal().segment, other);
    }
}
