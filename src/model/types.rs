//! Core type definitions for journeys: routes, legs and travel modes

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Travel mode of a single leg
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegMode {
    Transit,
    Walk,
    OwnVehicle,
    Other,
}

/// Mood a leg asks for when tracks are picked for it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mood {
    LowEnergy,
    Danceable,
}

impl LegMode {
    /// Mood pool lookup: sitting on transit gets calmer music, anything
    /// where the listener is moving gets the danceable pool.
    pub fn mood(self) -> Mood {
        match self {
            LegMode::Transit => Mood::LowEnergy,
            LegMode::Walk | LegMode::OwnVehicle | LegMode::Other => Mood::Danceable,
        }
    }

    /// Whether this mode supports turn-by-turn guidance
    pub fn supports_guidance(self) -> bool {
        matches!(self, LegMode::Walk | LegMode::OwnVehicle)
    }
}

/// One leg of a planned journey
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub mode: LegMode,
    pub travel_duration_secs: u64,
}

impl Leg {
    pub fn new(mode: LegMode, travel_duration_secs: u64) -> Self {
        Self {
            mode,
            travel_duration_secs,
        }
    }
}

/// A planned journey as handed over by the routing collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub duration_secs: u64,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

impl Route {
    pub fn new(duration_secs: u64, legs: Vec<Leg>) -> Self {
        Self {
            duration_secs,
            legs,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    pub fn duration_mins(&self) -> u64 {
        self.duration_secs / 60
    }

    /// Guided navigation only exists for single-leg walking or driving routes
    pub fn supports_guided_navigation(&self) -> bool {
        match self.legs.as_slice() {
            [leg] => leg.mode.supports_guidance(),
            _ => false,
        }
    }
}
