//! Raw municipal records to enriched lanes.
//!
//! Every `derive_*` function is a pure lookup over one record. `enhance` applies them
//! to a whole collection and decides what an invalid feature does to the run.

use std::collections::BTreeMap;

use geojson::FeatureCollection;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EnhanceError;
use crate::lane::{
    Bearing, Configuration, DirectionInfo, EnrichedLane, Hazard, LaneCollection, LaneName,
    LanePosition, LaneProperties, PathType, SafetyFeature, StreetSide,
};
use crate::raw::{fields, RawLaneRecord};

/// `TYPE_VOIE2_CODE` value marking a two-way facility.
pub const BIDIRECTIONAL_CODE: &str = "44";

/// Facility-type code to path type. Checked in order, first match wins.
pub const PATH_TYPE_TABLE: [(&str, PathType); 5] = [
    ("5", PathType::Protected),
    ("6", PathType::Protected),
    ("7", PathType::Protected),
    ("4", PathType::Dedicated),
    ("8", PathType::Multiuse),
];

/// On-street facilities shared with motor traffic.
pub const MIXED_TRAFFIC_CODES: [&str; 2] = ["1", "3"];
pub const DEDICATED_ON_STREET_CODE: &str = "4";
pub const MULTIUSE_PATH_CODE: &str = "8";

pub const MEDIAN_SEPARATOR_CODE: &str = "M";
pub const PAINTED_SEPARATOR_CODE: &str = "P";

/// Phrases in the description that mark a contraflow facility.
const AGAINST_FLOW_PHRASES: [&str; 2] = ["contresens", "contre-sens"];

const DEFAULT_LOCALITY: &str = "Montréal";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidFeaturePolicy {
    /// Log and drop the feature, keep the rest.
    Skip,
    /// Reject the whole collection; the caller falls back to the sample dataset.
    #[default]
    FailCollection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetSidePolicy {
    #[default]
    Unresolved,
    /// Demo mode: uniform random cardinal side per lane. Carries no geometric meaning.
    Randomized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceOptions {
    #[serde(default)]
    pub on_invalid_feature: InvalidFeaturePolicy,
    #[serde(default)]
    pub street_side: StreetSidePolicy,
}

pub fn derive_configuration(record: &RawLaneRecord) -> Configuration {
    if record.code_is(fields::FACILITY_TYPE_2, BIDIRECTIONAL_CODE)
        || record.number(fields::LANE_COUNT) == Some(2.0)
    {
        Configuration::Bidirectional
    } else {
        Configuration::OneWay
    }
}

pub fn derive_path_type(record: &RawLaneRecord) -> PathType {
    let Some(code) = record.code(fields::FACILITY_TYPE) else {
        return PathType::Shared;
    };
    PATH_TYPE_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, t)| *t)
        .unwrap_or(PathType::Shared)
}

/// Bidirectional lanes always get the east/west pair, whatever their real orientation.
/// One-way lanes get a single eastbound entry.
// TODO: derive the bearing keys from the polyline once lanes are matched to street segments.
pub fn derive_directions(
    record: &RawLaneRecord,
    configuration: Configuration,
) -> BTreeMap<Bearing, DirectionInfo> {
    let mut directions = BTreeMap::new();
    match configuration {
        Configuration::Bidirectional => {
            directions.insert(
                Bearing::Eastbound,
                DirectionInfo { position: LanePosition::South, with_traffic: true },
            );
            directions.insert(
                Bearing::Westbound,
                DirectionInfo { position: LanePosition::North, with_traffic: true },
            );
        }
        Configuration::OneWay => {
            directions.insert(
                Bearing::Eastbound,
                DirectionInfo { position: LanePosition::Full, with_traffic: !is_against_flow(record) },
            );
        }
    }
    directions
}

fn is_against_flow(record: &RawLaneRecord) -> bool {
    record
        .text(fields::DESCRIPTION)
        .map(|d| {
            let d = d.to_lowercase();
            AGAINST_FLOW_PHRASES.iter().any(|p| d.contains(p))
        })
        .unwrap_or(false)
}

pub fn derive_safety_features(record: &RawLaneRecord) -> Vec<SafetyFeature> {
    let mut features = Vec::new();
    if record.flag(fields::PROTECTED) == Some(true) {
        features.push(SafetyFeature::ProtectedBarrier);
    }
    if record.flag(fields::YEAR_ROUND) == Some(true) {
        features.push(SafetyFeature::FourSeason);
    }
    if record.flag(fields::ROUTE_VERTE) == Some(true) {
        features.push(SafetyFeature::RouteVerte);
    }
    match record.code(fields::SEPARATOR).as_deref() {
        Some(MEDIAN_SEPARATOR_CODE) => features.push(SafetyFeature::MedianSeparation),
        Some(PAINTED_SEPARATOR_CODE) => features.push(SafetyFeature::PaintedSeparation),
        _ => {}
    }
    features
}

pub fn derive_hazards(record: &RawLaneRecord) -> Vec<Hazard> {
    let mut hazards = Vec::new();
    let code = record.code(fields::FACILITY_TYPE);
    let code = code.as_deref();
    if code.is_some_and(|c| MIXED_TRAFFIC_CODES.contains(&c)) {
        hazards.push(Hazard::SharedWithCars);
    }
    if code == Some(DEDICATED_ON_STREET_CODE) {
        hazards.push(Hazard::DooringRisk);
    }
    if code == Some(MULTIUSE_PATH_CODE) {
        hazards.push(Hazard::PedestrianCrossings);
    }
    // Only an explicit "Non" counts; a missing flag says nothing about winter service.
    if record.flag(fields::YEAR_ROUND) == Some(false) {
        hazards.push(Hazard::SeasonalClosure);
    }
    hazards
}

pub fn derive_name(record: &RawLaneRecord) -> LaneName {
    let locality = record
        .text(fields::LOCALITY)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LOCALITY);
    LaneName {
        en: format!("Bike Path {} ({})", record.source_id, locality),
        fr: format!("Piste cyclable {} ({})", record.source_id, locality),
    }
}

pub fn derive_street_side<R: Rng + ?Sized>(policy: StreetSidePolicy, rng: &mut R) -> StreetSide {
    match policy {
        StreetSidePolicy::Unresolved => StreetSide::Unresolved,
        StreetSidePolicy::Randomized => *StreetSide::CARDINAL
            .choose(rng)
            .unwrap_or(&StreetSide::Unresolved),
    }
}

pub fn enhance_record<R: Rng + ?Sized>(
    record: RawLaneRecord,
    policy: StreetSidePolicy,
    rng: &mut R,
) -> EnrichedLane {
    let configuration = derive_configuration(&record);
    let properties = LaneProperties {
        id: format!("path-{}", record.source_id),
        name: derive_name(&record),
        path_type: derive_path_type(&record),
        street_side: derive_street_side(policy, rng),
        configuration,
        directions: derive_directions(&record, configuration),
        safety_features: derive_safety_features(&record),
        hazards: derive_hazards(&record),
    };
    EnrichedLane { properties, geometry: record.geometry }
}

/// Enhance a whole collection with a thread-local RNG for the randomized placeholders.
pub fn enhance(
    raw: &FeatureCollection,
    options: &EnhanceOptions,
) -> Result<LaneCollection, EnhanceError> {
    enhance_with_rng(raw, options, &mut rand::thread_rng())
}

pub fn enhance_with_rng<R: Rng + ?Sized>(
    raw: &FeatureCollection,
    options: &EnhanceOptions,
    rng: &mut R,
) -> Result<LaneCollection, EnhanceError> {
    let mut lanes = Vec::with_capacity(raw.features.len());
    let mut skipped = 0usize;

    for (index, feature) in raw.features.iter().enumerate() {
        match RawLaneRecord::from_feature(feature, index) {
            Ok(record) => lanes.push(enhance_record(record, options.street_side, rng)),
            Err(e) => match options.on_invalid_feature {
                InvalidFeaturePolicy::FailCollection => return Err(e),
                InvalidFeaturePolicy::Skip => {
                    tracing::warn!("skipping invalid feature: {}", e);
                    skipped += 1;
                }
            },
        }
    }

    tracing::debug!("enhanced {} features ({} skipped)", lanes.len(), skipped);
    Ok(LaneCollection::new(lanes))
}
