use super::reservation::{replace_chain, Reservation};
use super::Car;
use crate::{LaneChangeProblem, Network, SegmentId, Side};

/// Represents an in-progress lane change.
///
/// While changing lane the car holds a second reservation on the target lane
/// segment, alongside its own. Once the change completes that reservation
/// becomes the car's reservation chain; if it is aborted, it is dropped.
#[derive(Clone, Debug)]
pub struct LaneChange {
    /// The side the car is moving toward.
    side: Side,
    /// The lane segment being moved into.
    target: SegmentId,
    /// The car's time when the change began.
    started: u64,
    /// The number of ticks the change takes.
    duration: u64,
    /// The reservation on the target lane segment.
    pub(crate) res: Vec<Reservation>,
}

impl LaneChange {
    pub fn side(&self) -> Side {
        self.side
    }

    /// The lane segment being moved into.
    pub fn target(&self) -> SegmentId {
        self.target
    }

    pub fn started(&self) -> u64 {
        self.started
    }

    /// The number of ticks since the change began.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.started)
    }

    /// The number of ticks left until the change completes.
    pub fn remaining(&self, now: u64) -> u64 {
        self.duration.saturating_sub(self.elapsed(now))
    }

    /// The fraction of the change completed, between 0 and 1.
    pub fn progress(&self, now: u64) -> f64 {
        if self.duration == 0 {
            return 1.0;
        }
        (self.elapsed(now) as f64 / self.duration as f64).min(1.0)
    }

    pub fn is_complete(&self, now: u64) -> bool {
        self.elapsed(now) >= self.duration
    }
}

impl Car {
    /// Starts moving into the adjacent lane segment on the given side.
    ///
    /// The car must be the only segment in its reservation chain, and must be able
    /// to stop within the segment after driving at its current speed for the
    /// whole change.
    pub(crate) fn begin_lane_change(
        &mut self,
        side: Side,
        network: &mut Network,
        duration: u64,
    ) -> Result<(), LaneChangeProblem> {
        if self.lane_change.is_some() {
            return Err(LaneChangeProblem::AlreadyChanging);
        }
        let current = self.res[0];
        let segment = network.segment(current.segment);
        if self.res.len() != 1 || !segment.is_lane() {
            return Err(LaneChangeProblem::ChangeLaneWhileCrossing);
        }
        let braking = self.braking_distance();
        if self.loc + braking + duration as i32 * self.speed > segment.length() {
            return Err(LaneChangeProblem::LaneTooShort);
        }
        let target = network
            .adjacent_lane_segment(current.segment, side)
            .ok_or(LaneChangeProblem::NoAdjacentLane)?;

        let res = Reservation::new(target, self.loc, self.loc + braking, current.from, current.direction);
        network.segment_mut(target).occupy(self.id);
        self.lane_change = Some(LaneChange {
            side,
            target,
            started: self.time,
            duration,
            res: vec![res],
        });
        Ok(())
    }

    /// Abandons an in-progress lane change, releasing the target lane.
    pub(crate) fn abort_lane_change(&mut self, network: &mut Network) {
        if let Some(mut lc) = self.lane_change.take() {
            replace_chain(network, self.id, &mut lc.res, vec![]);
        }
    }

    /// Completes the lane change once its duration has passed,
    /// moving the car's reservation to the target lane.
    pub(crate) fn progress_lane_change(&mut self, network: &mut Network) {
        let complete = match &self.lane_change {
            Some(lc) => lc.is_complete(self.time),
            None => false,
        };
        if !complete {
            return;
        }
        if let Some(lc) = self.lane_change.take() {
            // The target lane is already registered.
            for res in &self.res {
                network.segment_mut(res.segment).release(self.id);
            }
            self.res = lc.res;
        }
    }
}
