use crate::{Direction, LaneId, Orientation, RoadId, SegmentId};
use serde::{Deserialize, Serialize};

/// The attributes of a road.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadAttributes {
    /// The name of the road, used in diagnostics.
    pub name: String,
    /// Whether the road runs horizontally or vertically.
    pub orientation: Orientation,
    /// The offset of the road's lower edge perpendicular to its direction.
    pub top: i32,
    /// The number of lanes travelling right (horizontal roads) or down (vertical roads).
    pub right_lanes: usize,
    /// The number of lanes travelling left (horizontal roads) or up (vertical roads).
    pub left_lanes: usize,
}

impl RoadAttributes {
    /// Creates the attributes of a horizontal road.
    pub fn horizontal(name: &str, top: i32, right_lanes: usize, left_lanes: usize) -> Self {
        Self {
            name: name.to_string(),
            orientation: Orientation::Horizontal,
            top,
            right_lanes,
            left_lanes,
        }
    }

    /// Creates the attributes of a vertical road.
    pub fn vertical(name: &str, top: i32, right_lanes: usize, left_lanes: usize) -> Self {
        Self {
            name: name.to_string(),
            orientation: Orientation::Vertical,
            top,
            right_lanes,
            left_lanes,
        }
    }

    /// The total number of lanes.
    pub fn lane_count(&self) -> usize {
        self.right_lanes + self.left_lanes
    }
}

/// A straight road made up of adjacent lanes.
#[derive(Clone, Debug)]
pub struct Road {
    id: RoadId,
    name: String,
    orientation: Orientation,
    top: i32,
    bottom: i32,
    /// The lanes ordered by offset; right-hand lanes come first.
    lanes: Vec<LaneId>,
    right_count: usize,
}

/// A single lane of a road.
#[derive(Clone, Debug)]
pub struct Lane {
    id: LaneId,
    road: RoadId,
    /// Position of the lane within its road's lanes.
    index: usize,
    direction: Direction,
    top: i32,
    bottom: i32,
    /// Lane and crossing segments in order of increasing coordinate.
    pub(crate) segments: Vec<SegmentId>,
}

impl Road {
    pub(crate) fn new(id: RoadId, attribs: &RoadAttributes, block_size: i32) -> Self {
        Self {
            id,
            name: attribs.name.clone(),
            orientation: attribs.orientation,
            top: attribs.top,
            bottom: attribs.top + block_size * attribs.lane_count() as i32,
            lanes: Vec::with_capacity(attribs.lane_count()),
            right_count: attribs.right_lanes,
        }
    }

    pub fn id(&self) -> RoadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The offset of the road's lower edge.
    pub fn top(&self) -> i32 {
        self.top
    }

    /// The offset of the road's upper edge.
    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// All lanes, ordered by offset.
    pub fn lanes(&self) -> &[LaneId] {
        &self.lanes
    }

    /// Lanes travelling right or down.
    pub fn right_lanes(&self) -> &[LaneId] {
        &self.lanes[..self.right_count]
    }

    /// Lanes travelling left or up.
    pub fn left_lanes(&self) -> &[LaneId] {
        &self.lanes[self.right_count..]
    }

    pub(crate) fn push_lane(&mut self, lane: LaneId) {
        self.lanes.push(lane);
    }
}

impl Lane {
    pub(crate) fn new(id: LaneId, road: &Road, index: usize, block_size: i32) -> Self {
        let top = road.top + block_size * index as i32;
        Self {
            id,
            road: road.id,
            index,
            direction: road.orientation.direction(index < road.right_count),
            top,
            bottom: top + block_size,
            segments: vec![],
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    /// The road the lane belongs to.
    pub fn road(&self) -> RoadId {
        self.road
    }

    /// Position of the lane within its road, counting from the road's top.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The direction of travel.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    /// The offset of the lane's centre line.
    pub fn centre(&self) -> f64 {
        0.5 * (self.top + self.bottom) as f64
    }

    /// The segments of the lane, ordered by increasing coordinate.
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }
}
