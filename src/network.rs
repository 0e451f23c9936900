//! The segment graph and intersection registry.

use crate::math::{Point2d, Vector2d};
use crate::{
    CrossingSegment, Direction, Intersection, IntersectionId, IntersectionSet, Lane, LaneId, LaneSet, Orientation,
    Reservation, Road, RoadId, RoadSet, Segment, SegmentId, SegmentKind, SegmentSet, Side,
};

mod build;

/// A road network, divided into lane and crossing segments.
///
/// The structure of the network is fixed once built; only the occupants
/// of its segments and the claims on its intersections change.
#[derive(Clone, Debug, Default)]
pub struct Network {
    block_size: i32,
    roads: RoadSet,
    lanes: LaneSet,
    segments: SegmentSet,
    intersections: IntersectionSet,
}

impl Network {
    /// The width of a lane and side length of a crossing.
    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    pub fn road(&self, id: RoadId) -> &Road {
        &self.roads[id]
    }

    /// Finds a road by its name.
    pub fn road_by_name(&self, name: &str) -> Option<&Road> {
        self.roads.values().find(|road| road.name() == name)
    }

    pub fn iter_roads(&self) -> impl Iterator<Item = &Road> {
        self.roads.values()
    }

    pub fn lane(&self, id: LaneId) -> &Lane {
        &self.lanes[id]
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id]
    }

    /// Gets a segment, if the ID belongs to this network.
    pub fn get_segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    pub fn iter_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    /// Iterates over the IDs of all lane segments.
    pub fn iter_lane_segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.segments
            .values()
            .filter(|seg| seg.is_lane())
            .map(|seg| seg.id())
    }

    /// The lane segments of a lane, in order of travel.
    pub fn lane_segments(&self, lane: LaneId) -> Vec<SegmentId> {
        let lane = &self.lanes[lane];
        let mut segments: Vec<_> = lane
            .segments()
            .iter()
            .copied()
            .filter(|id| self.segments[*id].is_lane())
            .collect();
        if !lane.direction().is_increasing() {
            segments.reverse();
        }
        segments
    }

    pub fn intersection(&self, id: IntersectionId) -> &Intersection {
        &self.intersections[id]
    }

    pub fn iter_intersections(&self) -> impl Iterator<Item = &Intersection> {
        self.intersections.values()
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id]
    }

    pub(crate) fn intersection_mut(&mut self, id: IntersectionId) -> &mut Intersection {
        &mut self.intersections[id]
    }

    /// The direction a car leaves `from` in to enter `to`,
    /// or `None` if `to` does not follow `from`.
    pub fn direction_between(&self, from: SegmentId, to: SegmentId) -> Option<Direction> {
        match self.segments[from].kind() {
            SegmentKind::Lane(lane) => {
                (lane.end_crossing() == Some(to)).then(|| lane.direction())
            }
            SegmentKind::Crossing(crossing) => crossing.direction_to(to),
        }
    }

    /// Finds the lane segment beside `segment` on the given side of a car
    /// travelling along it. Only lanes travelling in the same direction count.
    pub fn adjacent_lane_segment(&self, segment: SegmentId, side: Side) -> Option<SegmentId> {
        let lane_seg = self.segments[segment].as_lane()?;
        let lane = &self.lanes[lane_seg.lane()];
        let road = &self.roads[lane.road()];
        let index = lane.index();
        let group = if lane.direction().is_right_hand() {
            0..road.right_lanes().len()
        } else {
            road.right_lanes().len()..road.lanes().len()
        };
        // The shoulder is at the road's top for right-hand lanes and at its bottom otherwise.
        let towards_top = (side == Side::Right) == lane.direction().is_right_hand();
        let sibling = if towards_top {
            index.checked_sub(1)?
        } else {
            index + 1
        };
        if !group.contains(&sibling) {
            return None;
        }
        let pos = lane.segments().iter().position(|id| *id == segment)?;
        let sibling = &self.lanes[road.lanes()[sibling]];
        let adjacent = *sibling.segments().get(pos)?;
        self.segments[adjacent].is_lane().then(|| adjacent)
    }

    /// The centre point of a crossing segment.
    pub fn anchor(&self, crossing: SegmentId) -> Option<Point2d> {
        self.segments[crossing]
            .as_crossing()
            .map(|crossing| self.crossing_anchor(crossing))
    }

    /// The point at which cars enter a lane segment.
    pub fn entry_point(&self, segment: SegmentId) -> Point2d {
        match self.segments[segment].kind() {
            SegmentKind::Lane(lane) => self.lane_point(lane.lane(), lane.begin() as f64),
            SegmentKind::Crossing(crossing) => self.crossing_anchor(crossing),
        }
    }

    /// The point at which cars leave a lane segment, or the centre of a crossing.
    pub fn exit_point(&self, segment: SegmentId) -> Point2d {
        match self.segments[segment].kind() {
            SegmentKind::Lane(lane) => self.lane_point(lane.lane(), lane.end() as f64),
            SegmentKind::Crossing(crossing) => self.crossing_anchor(crossing),
        }
    }

    /// The midpoint of a segment's centre line.
    pub fn midpoint(&self, segment: SegmentId) -> Point2d {
        match self.segments[segment].kind() {
            SegmentKind::Lane(lane) => {
                self.lane_point(lane.lane(), 0.5 * (lane.begin() + lane.end()) as f64)
            }
            SegmentKind::Crossing(crossing) => self.crossing_anchor(crossing),
        }
    }

    /// The world position of a point `dist` units into a reserved segment,
    /// following the path through the segment the reservation describes.
    pub fn locate(&self, res: &Reservation, dist: i32) -> Point2d {
        let dist = dist as f64;
        match self.segments[res.segment].kind() {
            SegmentKind::Lane(lane) => {
                let sign = if lane.direction().is_increasing() { 1.0 } else { -1.0 };
                self.lane_point(lane.lane(), lane.begin() as f64 + sign * dist)
            }
            SegmentKind::Crossing(crossing) => {
                let anchor = self.crossing_anchor(crossing);
                let half = 0.5 * self.block_size as f64;
                if dist <= half {
                    anchor + res.from.axis() * (dist - half)
                } else {
                    anchor + res.direction.axis() * (dist - half)
                }
            }
        }
    }

    /// The vector from a lane segment's centre line to that of another parallel segment.
    pub fn lateral_offset(&self, from: SegmentId, to: SegmentId) -> Vector2d {
        let centre = |id: SegmentId| {
            self.segments[id]
                .as_lane()
                .map(|lane| (lane.direction().orientation(), self.lanes[lane.lane()].centre()))
        };
        match (centre(from), centre(to)) {
            (Some((Orientation::Horizontal, a)), Some((Orientation::Horizontal, b))) => {
                Vector2d::new(0.0, b - a)
            }
            (Some((Orientation::Vertical, a)), Some((Orientation::Vertical, b))) => {
                Vector2d::new(b - a, 0.0)
            }
            _ => Vector2d::new(0.0, 0.0),
        }
    }

    fn crossing_anchor(&self, crossing: &CrossingSegment) -> Point2d {
        Point2d::new(
            self.lanes[crossing.vertical_lane()].centre(),
            self.lanes[crossing.horizontal_lane()].centre(),
        )
    }

    fn lane_point(&self, lane: LaneId, along: f64) -> Point2d {
        let lane = &self.lanes[lane];
        match lane.direction().orientation() {
            Orientation::Horizontal => Point2d::new(along, lane.centre()),
            Orientation::Vertical => Point2d::new(lane.centre(), along),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{RoadAttributes, SimConfig};
    use assert_approx_eq::assert_approx_eq;

    /// One two-way horizontal road crossing one two-way vertical road.
    fn plus() -> Network {
        Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 1, 1),
                RoadAttributes::vertical("v", 200, 1, 1),
            ],
            &SimConfig::default(),
        )
        .unwrap()
    }

    fn lanes(network: &Network, road: &str) -> Vec<LaneId> {
        network.road_by_name(road).unwrap().lanes().to_vec()
    }

    #[test]
    fn builds_lane_and_crossing_segments() {
        let network = plus();
        assert_eq!(network.iter_segments().filter(|s| s.is_lane()).count(), 4);
        assert_eq!(network.iter_segments().filter(|s| s.is_crossing()).count(), 4);
        assert_eq!(network.iter_intersections().count(), 1);

        let h = lanes(&network, "h");
        let east = network.lane(h[0]);
        assert_eq!(east.direction(), Direction::Right);
        assert_eq!(east.top(), 100);
        assert_eq!(network.lane(h[1]).direction(), Direction::Left);
        assert_eq!(network.lane(h[1]).top(), 140);

        let seg = network.segment(east.segments()[0]);
        let lane_seg = seg.as_lane().unwrap();
        assert_eq!((lane_seg.begin(), lane_seg.end()), (0, 200));
        assert_eq!(seg.length(), 200);
        assert_eq!(seg.max_speed(), 13);
        assert_eq!(network.segment(east.segments()[1]).max_speed(), 8);
    }

    #[test]
    fn links_segments_in_travel_order() {
        let network = plus();
        let h = lanes(&network, "h");
        let v = lanes(&network, "v");
        let east = network.lane(h[0]).segments().to_vec();
        let west = network.lane(h[1]).segments().to_vec();
        let south = network.lane(v[0]).segments().to_vec();
        let north = network.lane(v[1]).segments().to_vec();

        assert_eq!(network.segment(east[0]).successors().as_slice(), &[east[1]]);
        assert_eq!(network.direction_between(east[1], east[2]), Some(Direction::Right));
        assert!(network.segment(east[2]).as_crossing().unwrap().connected(Direction::Right).is_none());
        // Eastbound traffic may turn south at the first crossing.
        assert_eq!(network.direction_between(east[1], south[0]), Some(Direction::Down));

        assert_eq!(network.direction_between(west[1], west[0]), Some(Direction::Left));
        assert!(network.segment(west[0]).successors().is_empty());
        assert_eq!(network.segment(north[0]).successors().as_slice(), &[north[1]]);
        assert!(network.segment(south[0]).successors().is_empty());
        assert_eq!(east[1], south[1]);
    }

    #[test]
    fn overlapping_roads_are_rejected() {
        let result = Network::new(
            &[
                RoadAttributes::horizontal("a", 0, 1, 1),
                RoadAttributes::horizontal("b", 60, 1, 0),
                RoadAttributes::vertical("c", 60, 1, 0),
            ],
            &SimConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            crate::NetworkError::Overlap {
                road: "b".into(),
                previous: "a".into()
            }
        );
    }

    #[test]
    fn adjacent_lanes_stay_on_the_same_side() {
        let network = Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 2, 2),
                RoadAttributes::vertical("v", 300, 1, 0),
            ],
            &SimConfig::default(),
        )
        .unwrap();
        let h = lanes(&network, "h");
        let seg = |lane: usize| network.lane_segments(h[lane])[0];

        // Eastbound: the shoulder lane is the one nearest the road's top.
        assert_eq!(network.adjacent_lane_segment(seg(0), Side::Right), None);
        assert_eq!(network.adjacent_lane_segment(seg(0), Side::Left), Some(seg(1)));
        assert_eq!(network.adjacent_lane_segment(seg(1), Side::Right), Some(seg(0)));
        assert_eq!(network.adjacent_lane_segment(seg(1), Side::Left), None);
        // Westbound: the shoulder lane is the last one.
        assert_eq!(network.adjacent_lane_segment(seg(2), Side::Right), Some(seg(3)));
        assert_eq!(network.adjacent_lane_segment(seg(2), Side::Left), None);
        assert_eq!(network.adjacent_lane_segment(seg(3), Side::Left), Some(seg(2)));
    }

    #[test]
    fn locates_points_along_a_path() {
        let network = plus();
        let h = lanes(&network, "h");
        let east = network.lane(h[0]).segments().to_vec();
        let res = Reservation::new(east[0], 0, 200, Direction::Right, Direction::Right);
        let p = network.locate(&res, 50);
        assert_approx_eq!(p.x, 50.0);
        assert_approx_eq!(p.y, 120.0);

        // Turning south in the first crossing.
        let res = Reservation::new(east[1], 0, 40, Direction::Right, Direction::Down);
        let p = network.locate(&res, 10);
        assert_approx_eq!(p.x, 210.0);
        assert_approx_eq!(p.y, 120.0);
        let p = network.locate(&res, 30);
        assert_approx_eq!(p.x, 220.0);
        assert_approx_eq!(p.y, 110.0);

        let mid = network.midpoint(east[0]);
        assert_approx_eq!(mid.x, 100.0);
        let offset = network.lateral_offset(network.lane_segments(h[0])[0], network.lane_segments(h[1])[0]);
        assert_approx_eq!(offset.y, 40.0);
    }
}
