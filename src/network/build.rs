use super::Network;
use crate::{
    CrossingSegment, Intersection, IntersectionId, Lane, LaneId, LaneSegment, NetworkError,
    Orientation, Road, RoadAttributes, RoadId, Segment, SegmentKind, SimConfig,
};

impl Network {
    /// Builds the network for a set of roads.
    ///
    /// Every horizontal road crosses every vertical road. Lane segments bridge
    /// the gaps between consecutive crossings of a lane; there is one crossing
    /// segment for each pair of crossing lanes.
    pub fn new(roads: &[RoadAttributes], config: &SimConfig) -> Result<Self, NetworkError> {
        let mut sorted = roads.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|road| road.top);
        check_layout(&sorted, config.block_size)?;

        let mut network = Network {
            block_size: config.block_size,
            ..Default::default()
        };
        let ids = sorted
            .iter()
            .map(|attribs| network.add_road(attribs))
            .collect::<Vec<_>>();
        let of = |orientation| {
            ids.iter()
                .copied()
                .filter(|id| network.roads[*id].orientation() == orientation)
                .collect::<Vec<_>>()
        };
        let (horizontal, vertical) = (of(Orientation::Horizontal), of(Orientation::Vertical));

        let mut last_horiz = 0;
        for h in &horizontal {
            let mut last_vert = 0;
            for v in &vertical {
                network.add_intersection(*h, *v, last_horiz, last_vert, config);
                last_vert = network.roads[*v].bottom();
            }
            last_horiz = network.roads[*h].bottom();
        }

        network.link_segments();
        Ok(network)
    }

    fn add_road(&mut self, attribs: &RoadAttributes) -> RoadId {
        let block_size = self.block_size;
        let road_id = self
            .roads
            .insert_with_key(|id| Road::new(id, attribs, block_size));
        for index in 0..attribs.lane_count() {
            let road = &self.roads[road_id];
            let lane_id = self
                .lanes
                .insert_with_key(|id| Lane::new(id, road, index, block_size));
            self.roads[road_id].push_lane(lane_id);
        }
        road_id
    }

    /// Adds the crossings of two roads, along with the lane segments leading
    /// to them from the previous crossings of each lane.
    fn add_intersection(
        &mut self,
        h: RoadId,
        v: RoadId,
        last_horiz: i32,
        last_vert: i32,
        config: &SimConfig,
    ) {
        let intersection = self
            .intersections
            .insert_with_key(|id| Intersection::new(id, h, v));
        let (h_top, v_top) = (self.roads[h].top(), self.roads[v].top());
        let h_lanes = self.roads[h].lanes().to_vec();
        let v_lanes = self.roads[v].lanes().to_vec();

        for (i, h_lane) in h_lanes.iter().enumerate() {
            if v_top > last_vert {
                self.add_lane_segment(*h_lane, last_vert, v_top, config);
            }
            for v_lane in &v_lanes {
                if i == 0 && h_top > last_horiz {
                    self.add_lane_segment(*v_lane, last_horiz, h_top, config);
                }
                self.add_crossing(*h_lane, *v_lane, intersection, config);
            }
        }
    }

    /// Adds a segment spanning `[low, high]` along a lane.
    fn add_lane_segment(&mut self, lane_id: LaneId, low: i32, high: i32, config: &SimConfig) {
        let lane = &self.lanes[lane_id];
        let dir = lane.direction();
        let (begin, end) = if dir.is_increasing() {
            (low, high)
        } else {
            (high, low)
        };
        let kind = SegmentKind::Lane(LaneSegment::new(lane_id, begin, end, dir));
        let id = self
            .segments
            .insert_with_key(|id| Segment::new(id, kind, high - low, config.lane_max_speed));
        self.lanes[lane_id].segments.push(id);
    }

    fn add_crossing(
        &mut self,
        h_lane: LaneId,
        v_lane: LaneId,
        intersection: IntersectionId,
        config: &SimConfig,
    ) {
        let kind = SegmentKind::Crossing(CrossingSegment::new(h_lane, v_lane, intersection));
        let id = self.segments.insert_with_key(|id| {
            Segment::new(id, kind, config.block_size, config.crossing_max_speed)
        });
        self.lanes[h_lane].segments.push(id);
        self.lanes[v_lane].segments.push(id);
        self.intersections[intersection].segments.push(id);
    }

    /// Connects each segment to the one following it along every lane it is part of.
    fn link_segments(&mut self) {
        for lane in self.lanes.values() {
            let dir = lane.direction();
            for pair in lane.segments.windows(2) {
                let (from, to) = if dir.is_increasing() {
                    (pair[0], pair[1])
                } else {
                    (pair[1], pair[0])
                };
                match self.segments[from].kind_mut() {
                    SegmentKind::Lane(lane_seg) => lane_seg.end_crossing = Some(to),
                    SegmentKind::Crossing(crossing) => crossing.connected[dir.index()] = Some(to),
                }
            }
        }
    }
}

/// Ensures every road has lanes and that no two parallel roads overlap.
/// Roads must be sorted by their top.
fn check_layout(sorted: &[&RoadAttributes], block_size: i32) -> Result<(), NetworkError> {
    if let Some(road) = sorted.iter().find(|road| road.lane_count() == 0) {
        return Err(NetworkError::NoLanes(road.name.clone()));
    }
    for orientation in [Orientation::Horizontal, Orientation::Vertical] {
        let parallel = sorted
            .iter()
            .filter(|road| road.orientation == orientation)
            .collect::<Vec<_>>();
        for pair in parallel.windows(2) {
            let (previous, road) = (pair[0], pair[1]);
            let previous_bottom = previous.top + block_size * previous.lane_count() as i32;
            if road.top < previous_bottom {
                return Err(NetworkError::Overlap {
                    road: road.name.clone(),
                    previous: previous.name.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roads_without_lanes_are_rejected() {
        let result = Network::new(
            &[RoadAttributes::horizontal("empty", 0, 0, 0)],
            &SimConfig::default(),
        );
        assert_eq!(result.unwrap_err(), NetworkError::NoLanes("empty".into()));
    }

    #[test]
    fn adjacent_roads_need_no_lane_segment_between_them() {
        let network = Network::new(
            &[
                RoadAttributes::horizontal("h", 100, 1, 0),
                RoadAttributes::vertical("a", 0, 1, 0),
                RoadAttributes::vertical("b", 40, 1, 0),
            ],
            &SimConfig::default(),
        )
        .unwrap();
        let lane = network.road_by_name("h").unwrap().lanes()[0];
        let segments = network.lane(lane).segments();
        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|id| network.segment(*id).is_crossing()));
        assert_eq!(
            network.direction_between(segments[0], segments[1]),
            Some(crate::Direction::Right)
        );
    }
}
