use serde::Serialize;

use crate::lane::{Configuration, EnrichedLane, PathType, SafetyFeature};

pub const BIDIRECTIONAL_COLOR: &str = "#2ecc71";
pub const ONE_WAY_COLOR: &str = "#3498db";

/// Paint rule for one lane on the map layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaneStyle {
    pub id: String,
    pub color: &'static str,
    pub width: u8,
    pub opacity: f32,
}

pub fn line_width(path_type: PathType) -> u8 {
    match path_type {
        PathType::Protected => 6,
        PathType::Multiuse => 5,
        PathType::Dedicated => 4,
        PathType::Shared => 2,
    }
}

pub fn lane_style(lane: &EnrichedLane) -> LaneStyle {
    let p = &lane.properties;
    LaneStyle {
        id: p.id.clone(),
        color: match p.configuration {
            Configuration::Bidirectional => BIDIRECTIONAL_COLOR,
            Configuration::OneWay => ONE_WAY_COLOR,
        },
        width: line_width(p.path_type),
        // Seasonal lanes are drawn faded.
        opacity: if lane.has_feature(SafetyFeature::FourSeason) { 1.0 } else { 0.7 },
    }
}
