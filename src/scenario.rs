//! Road layouts to run simulations on.
//!
//! Every preset is built around a one-way ring road running anticlockwise
//! along the edges of a 1600 by 920 area, laid out for the default block size.

use crate::{RoadAttributes, ScenarioError, SimConfig};
use serde::{Deserialize, Serialize};

/// The width of the area covered by the presets.
pub const WIDTH: i32 = 1600;
/// The height of the area covered by the presets.
pub const HEIGHT: i32 = 920;
const BLOCK: i32 = 40;

/// A road layout along with the number of cars to populate it with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub roads: Vec<RoadAttributes>,
    #[serde(default = "default_cars")]
    pub cars: usize,
    #[serde(default)]
    pub config: SimConfig,
}

fn default_cars() -> usize {
    10
}

impl Scenario {
    /// The names of the preset scenarios.
    pub const PRESETS: [&'static str; 6] = [
        "ring",
        "one_crossing",
        "left_right_overtake",
        "up_down_overtake",
        "two_crossing",
        "big",
    ];

    /// Parses a scenario from its JSON description.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Gets a preset scenario by name, with the default configuration.
    pub fn preset(name: &str) -> Result<Self, ScenarioError> {
        let (roads, cars) = match name {
            "ring" => (ring(), 4),
            "one_crossing" => (one_crossing(), 16),
            "left_right_overtake" => (left_right_overtake(), 2),
            "up_down_overtake" => (up_down_overtake(), 2),
            "two_crossing" => (two_crossing(), 22),
            "big" => (big(), 10),
            _ => return Err(ScenarioError::UnknownPreset(name.to_string())),
        };
        Ok(Self {
            roads,
            cars,
            config: SimConfig::default(),
        })
    }
}

/// The single-lane ring road around the edges of the area.
pub fn ring() -> Vec<RoadAttributes> {
    vec![
        RoadAttributes::horizontal("bottom", 0, 1, 0),
        RoadAttributes::vertical("right", WIDTH - BLOCK, 0, 1),
        RoadAttributes::horizontal("top", HEIGHT - BLOCK, 0, 1),
        RoadAttributes::vertical("left", 0, 1, 0),
    ]
}

/// The ring with a two-way road across each axis, meeting in the middle.
pub fn one_crossing() -> Vec<RoadAttributes> {
    with_ring([
        RoadAttributes::vertical("v1", WIDTH / 2 - 3 * BLOCK, 1, 1),
        RoadAttributes::horizontal("h1", HEIGHT / 2 - 3 * BLOCK, 1, 1),
    ])
}

/// The ring with a wide horizontal road, three lanes each way.
pub fn left_right_overtake() -> Vec<RoadAttributes> {
    with_ring([RoadAttributes::horizontal("h1", 330, 3, 3)])
}

/// The ring with a wide vertical road, three lanes each way.
pub fn up_down_overtake() -> Vec<RoadAttributes> {
    with_ring([RoadAttributes::vertical("v1", 680, 3, 3)])
}

/// The ring with two multi-lane roads across each axis.
pub fn two_crossing() -> Vec<RoadAttributes> {
    with_ring([
        RoadAttributes::horizontal("h1", 5 * BLOCK, 2, 2),
        RoadAttributes::horizontal("h2", 14 * BLOCK, 2, 2),
        RoadAttributes::vertical("v1", 9 * BLOCK, 3, 3),
        RoadAttributes::vertical("v2", 23 * BLOCK, 3, 4),
    ])
}

/// The ring with three roads across each axis; the outer ones are one-way.
pub fn big() -> Vec<RoadAttributes> {
    with_ring([
        RoadAttributes::horizontal("h1", HEIGHT / 4 - BLOCK, 0, 2),
        RoadAttributes::horizontal("h2", HEIGHT / 2 - 2 * BLOCK, 2, 2),
        RoadAttributes::horizontal("h3", 3 * HEIGHT / 4 - BLOCK, 2, 0),
        RoadAttributes::vertical("v1", WIDTH / 4 - BLOCK, 0, 2),
        RoadAttributes::vertical("v2", WIDTH / 2 - 2 * BLOCK, 2, 2),
        RoadAttributes::vertical("v3", 3 * WIDTH / 4 - BLOCK, 2, 0),
    ])
}

fn with_ring(roads: impl IntoIterator<Item = RoadAttributes>) -> Vec<RoadAttributes> {
    let mut out = ring();
    out.extend(roads);
    out
}
