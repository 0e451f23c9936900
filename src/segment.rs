use crate::{CarId, Direction, IntersectionId, LaneId, SegmentId};
use arrayvec::ArrayVec;
use slotmap::SparseSecondaryMap;

/// An atomic unit of road space which cars reserve.
#[derive(Clone, Debug)]
pub struct Segment {
    id: SegmentId,
    kind: SegmentKind,
    /// The distance travelled from entry to exit.
    length: i32,
    /// The speed limit.
    max_speed: i32,
    /// The cars reserving space in this segment, in order of registration.
    cars: Vec<CarId>,
}

/// The two kinds of segment.
#[derive(Clone, Debug)]
pub enum SegmentKind {
    Lane(LaneSegment),
    Crossing(CrossingSegment),
}

/// A stretch of a single lane between two crossings.
#[derive(Clone, Debug)]
pub struct LaneSegment {
    lane: LaneId,
    /// The coordinate along the lane where cars enter.
    begin: i32,
    /// The coordinate along the lane where cars leave.
    end: i32,
    direction: Direction,
    /// The crossing that follows this segment, if any.
    pub(crate) end_crossing: Option<SegmentId>,
}

/// The square where a horizontal and a vertical lane cross.
#[derive(Clone, Debug)]
pub struct CrossingSegment {
    horizontal_lane: LaneId,
    vertical_lane: LaneId,
    intersection: IntersectionId,
    /// The segment reached by leaving in each direction, indexed by [Direction::index].
    pub(crate) connected: [Option<SegmentId>; 4],
    /// Estimated ticks until each occupant has cleared the crossing.
    pub(crate) time_to_leave: SparseSecondaryMap<CarId, i32>,
}

impl Segment {
    pub(crate) fn new(id: SegmentId, kind: SegmentKind, length: i32, max_speed: i32) -> Self {
        Self {
            id,
            kind,
            length,
            max_speed,
            cars: vec![],
        }
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn length(&self) -> i32 {
        self.length
    }

    pub fn max_speed(&self) -> i32 {
        self.max_speed
    }

    /// The cars reserving space in this segment.
    pub fn cars(&self) -> &[CarId] {
        &self.cars
    }

    pub fn is_lane(&self) -> bool {
        matches!(self.kind, SegmentKind::Lane(_))
    }

    pub fn is_crossing(&self) -> bool {
        matches!(self.kind, SegmentKind::Crossing(_))
    }

    pub fn as_lane(&self) -> Option<&LaneSegment> {
        match &self.kind {
            SegmentKind::Lane(lane) => Some(lane),
            SegmentKind::Crossing(_) => None,
        }
    }

    pub fn as_crossing(&self) -> Option<&CrossingSegment> {
        match &self.kind {
            SegmentKind::Crossing(crossing) => Some(crossing),
            SegmentKind::Lane(_) => None,
        }
    }

    /// The intersection this segment belongs to, if it is a crossing.
    pub fn intersection(&self) -> Option<IntersectionId> {
        self.as_crossing().map(|c| c.intersection)
    }

    /// The segments a car can move into after leaving this one.
    pub fn successors(&self) -> ArrayVec<SegmentId, 4> {
        match &self.kind {
            SegmentKind::Lane(lane) => lane.end_crossing.into_iter().collect(),
            SegmentKind::Crossing(crossing) => crossing.connected.iter().flatten().copied().collect(),
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut SegmentKind {
        &mut self.kind
    }

    /// Registers a car as reserving space in this segment.
    pub(crate) fn occupy(&mut self, car: CarId) {
        self.cars.push(car);
    }

    /// Removes a car's registration, along with its time to leave.
    pub(crate) fn release(&mut self, car: CarId) {
        if let Some(idx) = self.cars.iter().position(|id| *id == car) {
            self.cars.remove(idx);
        }
        if let SegmentKind::Crossing(crossing) = &mut self.kind {
            crossing.time_to_leave.remove(car);
        }
    }

    pub(crate) fn set_time_to_leave(&mut self, car: CarId, ticks: i32) {
        if let SegmentKind::Crossing(crossing) = &mut self.kind {
            crossing.time_to_leave.insert(car, ticks);
        }
    }
}

impl LaneSegment {
    pub(crate) fn new(lane: LaneId, begin: i32, end: i32, direction: Direction) -> Self {
        Self {
            lane,
            begin,
            end,
            direction,
            end_crossing: None,
        }
    }

    pub fn lane(&self) -> LaneId {
        self.lane
    }

    pub fn begin(&self) -> i32 {
        self.begin
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn end_crossing(&self) -> Option<SegmentId> {
        self.end_crossing
    }
}

impl CrossingSegment {
    pub(crate) fn new(
        horizontal_lane: LaneId,
        vertical_lane: LaneId,
        intersection: IntersectionId,
    ) -> Self {
        Self {
            horizontal_lane,
            vertical_lane,
            intersection,
            connected: [None; 4],
            time_to_leave: SparseSecondaryMap::new(),
        }
    }

    pub fn horizontal_lane(&self) -> LaneId {
        self.horizontal_lane
    }

    pub fn vertical_lane(&self) -> LaneId {
        self.vertical_lane
    }

    pub fn intersection(&self) -> IntersectionId {
        self.intersection
    }

    /// The segment reached by leaving in the given direction.
    pub fn connected(&self, dir: Direction) -> Option<SegmentId> {
        self.connected[dir.index()]
    }

    /// The direction to leave in to reach the given segment.
    pub fn direction_to(&self, segment: SegmentId) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| self.connected(*dir) == Some(segment))
    }

    /// The estimated ticks until the given car has cleared the crossing.
    pub fn time_to_leave(&self, car: CarId) -> Option<i32> {
        self.time_to_leave.get(car).copied()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use slotmap::{KeyData, SlotMap};

    #[test]
    fn release_clears_time_to_leave() {
        let mut cars = SlotMap::<CarId, ()>::with_key();
        let car = cars.insert(());
        let other = cars.insert(());
        let kind = SegmentKind::Crossing(CrossingSegment::new(
            LaneId::from(KeyData::from_ffi(1)),
            LaneId::from(KeyData::from_ffi(2)),
            IntersectionId::from(KeyData::from_ffi(1)),
        ));
        let mut segment = Segment::new(SegmentId::from(KeyData::from_ffi(1)), kind, 40, 8);
        segment.occupy(car);
        segment.occupy(other);
        segment.set_time_to_leave(car, 3);
        assert_eq!(segment.as_crossing().unwrap().time_to_leave(car), Some(3));

        segment.release(car);
        assert_eq!(segment.cars(), &[other]);
        assert_eq!(segment.as_crossing().unwrap().time_to_leave(car), None);
    }
}
