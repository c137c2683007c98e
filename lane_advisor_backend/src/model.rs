use bike_lanes::{Advisory, RouteStep, SelectionBasis};
use serde::{Deserialize, Serialize};

use crate::state::DataSource;

// ---------- Request/Response types ----------

#[derive(Deserialize, Debug, Clone)]
pub struct PositionUpdate {
    /// `[longitude, latitude]`
    pub position: [f64; 2],
    /// Compass heading in degrees when the client knows it.
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

#[derive(Serialize, Debug)]
pub struct AdvisoryOut {
    pub t: i64,
    pub position: [f64; 2],
    pub basis: SelectionBasis,
    pub distance_m: Option<f64>,
    /// True when the lane was picked at random (test mode or no geometry engine).
    pub random_pick: bool,
    #[serde(flatten)]
    pub advisory: Advisory,
    pub summary: String,
}

#[derive(Deserialize, Debug)]
pub struct StepsRequest {
    pub steps: Vec<RouteStep>,
    #[serde(default)]
    pub expanded: bool,
}

#[derive(Serialize, Debug)]
pub struct StepsOut {
    pub lines: Vec<String>,
    /// Safety summary at the start of each listed step.
    pub safety: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct HealthOut {
    pub ready: bool,
    pub source: Option<DataSource>,
    pub lanes: usize,
    pub loaded_at_ms: Option<i64>,
}
