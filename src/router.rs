//! A* route planning over the segment graph.

use crate::math::Point2d;
use crate::{Network, SegmentId};
use arrayvec::ArrayVec;
use cgmath::MetricSpace;

/// A path through the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// The segments of the path, starting with the segment searched from.
    pub segments: Vec<SegmentId>,
    /// The total length of every segment of the path except the goal.
    pub length: i32,
}

/// Finds the shortest path from `start` to `goal`, if one exists.
///
/// The cost of leaving a segment is its length. The search is guided by the
/// straight line distance from where a segment is left to where the goal is
/// entered, which never exceeds the remaining path length.
pub fn route(network: &Network, start: SegmentId, goal: SegmentId) -> Option<Route> {
    let target = network.entry_point(goal);
    pathfinding::directed::astar::astar(
        &start,
        |id| successors(network, *id),
        |id| heuristic(network, *id, goal, target),
        |id| *id == goal,
    )
    .map(|(segments, length)| Route { segments, length })
}

/// The segments which can be entered from a segment, along with the cost of doing so.
pub(crate) fn successors(network: &Network, id: SegmentId) -> ArrayVec<(SegmentId, i32), 4> {
    let segment = network.segment(id);
    let cost = segment.length();
    segment
        .successors()
        .into_iter()
        .map(|next| (next, cost))
        .collect()
}

fn heuristic(network: &Network, id: SegmentId, goal: SegmentId, target: Point2d) -> i32 {
    if id == goal {
        return 0;
    }
    network.exit_point(id).distance(target).floor() as i32
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{RoadAttributes, SimConfig};
    use pathfinding::directed::dijkstra::dijkstra;

    /// Three two-way horizontal roads crossing three two-way vertical roads.
    fn grid() -> Network {
        let mut roads = vec![];
        for (i, top) in [0, 300, 600].into_iter().enumerate() {
            roads.push(RoadAttributes::horizontal(&format!("h{}", i), top, 1, 1));
        }
        for (i, top) in [0, 400, 900].into_iter().enumerate() {
            roads.push(RoadAttributes::vertical(&format!("v{}", i), top, 1, 1));
        }
        Network::new(&roads, &SimConfig::default()).unwrap()
    }

    #[test]
    fn route_includes_start_and_goal() {
        let network = Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 1, 0),
                RoadAttributes::vertical("v", 200, 1, 0),
            ],
            &SimConfig::default(),
        )
        .unwrap();
        let east = network.lane_segments(network.road_by_name("h").unwrap().lanes()[0])[0];
        let south = network.lane_segments(network.road_by_name("v").unwrap().lanes()[0])[0];

        let found = route(&network, east, south).unwrap();
        assert_eq!(found.segments.len(), 3);
        assert_eq!(found.segments[0], east);
        assert_eq!(found.segments[2], south);
        assert_eq!(found.length, 200 + 40);

        let same = route(&network, east, east).unwrap();
        assert_eq!(same.segments, vec![east]);
        assert_eq!(same.length, 0);

        // Nothing leaves the southbound lane.
        assert_eq!(route(&network, south, east), None);
    }

    #[test]
    fn disconnected_segments_have_no_route() {
        let network = Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 0, 1),
                RoadAttributes::vertical("v", 200, 0, 1),
            ],
            &SimConfig::default(),
        )
        .unwrap();
        let west = network.lane_segments(network.road_by_name("h").unwrap().lanes()[0])[0];
        let north = network.lane_segments(network.road_by_name("v").unwrap().lanes()[0])[0];
        assert_eq!(route(&network, north, west), None);
        assert_eq!(route(&network, west, north), None);
    }

    #[test]
    fn routes_are_as_short_as_exhaustive_search() {
        let network = grid();
        let lane_segments = network.iter_lane_segments().collect::<Vec<_>>();
        let mut found = 0;
        for start in &lane_segments {
            for goal in &lane_segments {
                let exhaustive = dijkstra(start, |id| successors(&network, *id), |id| id == goal);
                let astar = route(&network, *start, *goal);
                match (exhaustive, astar) {
                    (Some((_, best)), Some(route)) => {
                        assert_eq!(route.length, best);
                        let summed: i32 = route.segments[..route.segments.len() - 1]
                            .iter()
                            .map(|id| network.segment(*id).length())
                            .sum();
                        assert_eq!(summed, route.length);
                        found += 1;
                    }
                    (None, None) => {}
                    (exhaustive, astar) => panic!("mismatch: {:?} vs {:?}", exhaustive, astar),
                }
            }
        }
        assert!(found > lane_segments.len());
    }

    #[test]
    fn heuristic_never_overestimates() {
        let network = grid();
        for goal in network.iter_lane_segments() {
            let target = network.entry_point(goal);
            for segment in network.iter_segments() {
                let id = segment.id();
                if let Some((_, cost)) = dijkstra(&id, |id| successors(&network, *id), |id| *id == goal) {
                    assert!(heuristic(&network, id, goal, target) <= cost);
                }
            }
        }
    }
}
