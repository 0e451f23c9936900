pub use car::{Car, CarAttributes, Dynamics, Goal, LaneChange, Reservation};
pub use cgmath;
pub use config::SimConfig;
pub use direction::{Direction, Orientation, Side};
pub use error::{LaneChangeProblem, NetworkError, RouteProblem, ScenarioError, SpawnError};
pub use intersection::Intersection;
pub use network::Network;
pub use planner::Action;
pub use road::{Lane, Road, RoadAttributes};
pub use router::{route, Route};
pub use scenario::Scenario;
pub use segment::{CrossingSegment, LaneSegment, Segment, SegmentKind};
pub use simulation::{Simulation, TickOutcome};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use tester::{CheckMode, CheckResult, SimulationTester};
pub use util::Interval;

mod car;
mod config;
mod direction;
mod error;
mod intersection;
pub mod math;
mod network;
mod planner;
mod road;
mod router;
pub mod scenario;
mod segment;
mod simulation;
mod tester;
mod util;

new_key_type! {
    /// Unique ID of a [Road].
    pub struct RoadId;
    /// Unique ID of a [Lane].
    pub struct LaneId;
    /// Unique ID of a [Segment].
    pub struct SegmentId;
    /// Unique ID of an [Intersection].
    pub struct IntersectionId;
    /// Unique ID of a [Car].
    pub struct CarId;
}

type RoadSet = SlotMap<RoadId, Road>;
type LaneSet = SlotMap<LaneId, Lane>;
type SegmentSet = SlotMap<SegmentId, Segment>;
type IntersectionSet = SlotMap<IntersectionId, Intersection>;
type CarSet = SlotMap<CarId, Car>;
