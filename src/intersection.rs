use crate::{CarId, IntersectionId, RoadId, SegmentId};
use slotmap::SparseSecondaryMap;

/// The crossings where one horizontal and one vertical road meet.
///
/// The intersection also records when each car approaching or inside it
/// first claimed it. A lower sequence number is an earlier claim, which
/// gives the car priority over later arrivals.
#[derive(Clone, Debug)]
pub struct Intersection {
    id: IntersectionId,
    horizontal_road: RoadId,
    vertical_road: RoadId,
    /// The crossing segments of the intersection.
    pub(crate) segments: Vec<SegmentId>,
    /// Arrival sequence number of each car claiming the intersection.
    priority: SparseSecondaryMap<CarId, u64>,
}

impl Intersection {
    pub(crate) fn new(id: IntersectionId, horizontal_road: RoadId, vertical_road: RoadId) -> Self {
        Self {
            id,
            horizontal_road,
            vertical_road,
            segments: vec![],
            priority: SparseSecondaryMap::new(),
        }
    }

    pub fn id(&self) -> IntersectionId {
        self.id
    }

    pub fn horizontal_road(&self) -> RoadId {
        self.horizontal_road
    }

    pub fn vertical_road(&self) -> RoadId {
        self.vertical_road
    }

    /// The crossing segments of the intersection.
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }

    /// The arrival sequence number of a car, if it has claimed the intersection.
    pub fn priority(&self, car: CarId) -> Option<u64> {
        self.priority.get(car).copied()
    }

    /// Iterates over the cars which have claimed the intersection.
    pub fn iter_priorities(&self) -> impl Iterator<Item = (CarId, u64)> + '_ {
        self.priority.iter().map(|(car, seq)| (car, *seq))
    }

    /// Returns true if `car` arrived strictly before `other`.
    /// A car without a claim is treated as arriving after every car with one.
    pub fn precedes(&self, car: CarId, other: CarId) -> bool {
        let rank = |id| self.priority(id).unwrap_or(u64::MAX);
        rank(car) < rank(other)
    }

    /// Records the arrival of a car unless it has already claimed the intersection.
    pub(crate) fn claim(&mut self, car: CarId, seq: &mut u64) {
        if !self.priority.contains_key(car) {
            *seq += 1;
            self.priority.insert(car, *seq);
        }
    }

    /// Removes a car's claim.
    pub(crate) fn release(&mut self, car: CarId) {
        self.priority.remove(car);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use slotmap::{KeyData, SlotMap};

    #[test]
    fn claims_are_ordered_and_kept() {
        let mut cars = SlotMap::<CarId, ()>::with_key();
        let (a, b, c) = (cars.insert(()), cars.insert(()), cars.insert(()));
        let mut intersection = Intersection::new(
            IntersectionId::from(KeyData::from_ffi(1)),
            RoadId::from(KeyData::from_ffi(1)),
            RoadId::from(KeyData::from_ffi(2)),
        );
        let mut seq = 0;
        intersection.claim(b, &mut seq);
        intersection.claim(a, &mut seq);
        intersection.claim(b, &mut seq);

        assert_eq!(intersection.priority(b), Some(1));
        assert_eq!(intersection.priority(a), Some(2));
        assert!(intersection.precedes(b, a));
        assert!(intersection.precedes(a, c));
        assert!(!intersection.precedes(c, a));

        intersection.release(b);
        assert_eq!(intersection.priority(b), None);
        assert_eq!(intersection.iter_priorities().count(), 1);
    }
}
