//! Error and problem types.

use crate::SegmentId;
use thiserror::Error;

/// A malformed road layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("road {road} overlaps with road {previous}")]
    Overlap { road: String, previous: String },

    #[error("road {0} has no lanes")]
    NoLanes(String),
}

/// The reason a lane change request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LaneChangeProblem {
    #[error("cannot change lane while crossing an intersection")]
    ChangeLaneWhileCrossing,

    #[error("not enough room left in the lane segment to change lane")]
    LaneTooShort,

    #[error("there is no adjacent lane on that side")]
    NoAdjacentLane,

    #[error("a lane change is already in progress")]
    AlreadyChanging,
}

/// The reason a reservation could not be extended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RouteProblem {
    #[error("no path from segment {from:?} to segment {to:?}")]
    NoPath { from: SegmentId, to: SegmentId },

    #[error("path from segment {from:?} to segment {to:?} has no next segment")]
    PathTooShort { from: SegmentId, to: SegmentId },

    #[error("reservation may not leave segment {segment:?} during a lane change")]
    LeavesSegment { segment: SegmentId },
}

/// The reason a car could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("cars can only be placed on lane segments")]
    NotALane,

    #[error("the car does not fit within the segment at that location")]
    OutOfBounds,

    #[error("the space the car needs is already reserved")]
    Occupied,

    #[error("goals must be two different lane segments")]
    InvalidGoal,

    #[error("no free lane segment is long enough for a new car")]
    NoFreeSegment,

    #[error("the network has too few lane segments to choose goals from")]
    NoGoal,
}

/// Failure to set up a simulation from a scenario description.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid road layout: {0}")]
    Network(#[from] NetworkError),

    #[error("cannot populate scenario: {0}")]
    Spawn(#[from] SpawnError),

    #[error("unknown preset {0}")]
    UnknownPreset(String),
}
