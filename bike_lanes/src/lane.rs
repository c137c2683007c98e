use std::collections::{BTreeMap, HashSet};

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde::{Deserialize, Serialize};

// ---------- Classifications ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Configuration {
    Bidirectional,
    OneWay,
}

/// Side of the street the lane sits on.
///
/// `Unresolved` means nobody has classified the lane against the street network yet.
/// The municipal schema carries no side information, so every enhanced lane starts out
/// unresolved unless the caller opts into randomized demo sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetSide {
    North,
    South,
    East,
    West,
    Unresolved,
}

impl StreetSide {
    pub const CARDINAL: [StreetSide; 4] = [
        StreetSide::North,
        StreetSide::South,
        StreetSide::East,
        StreetSide::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreetSide::North => "north",
            StreetSide::South => "south",
            StreetSide::East => "east",
            StreetSide::West => "west",
            StreetSide::Unresolved => "unresolved",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Protected,
    Dedicated,
    Multiuse,
    Shared,
}

impl PathType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Protected => "protected",
            PathType::Dedicated => "dedicated",
            PathType::Multiuse => "multiuse",
            PathType::Shared => "shared",
        }
    }
}

/// Travel bearing key used in `directions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bearing {
    Northbound,
    Southbound,
    Eastbound,
    Westbound,
}

impl Bearing {
    /// Snap a compass heading (degrees, 0 = north, clockwise) to the nearest cardinal bearing.
    pub fn from_heading(degrees: f64) -> Self {
        let d = degrees.rem_euclid(360.0);
        if !(45.0..315.0).contains(&d) {
            Bearing::Northbound
        } else if d < 135.0 {
            Bearing::Eastbound
        } else if d < 225.0 {
            Bearing::Southbound
        } else {
            Bearing::Westbound
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanePosition {
    North,
    South,
    Full,
}

impl LanePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanePosition::North => "north",
            LanePosition::South => "south",
            LanePosition::Full => "full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionInfo {
    pub position: LanePosition,
    pub with_traffic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyFeature {
    ProtectedBarrier,
    FourSeason,
    RouteVerte,
    MedianSeparation,
    PaintedSeparation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Hazard {
    SharedWithCars,
    DooringRisk,
    PedestrianCrossings,
    SeasonalClosure,
    OneWayStreet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneName {
    pub en: String,
    pub fr: String,
}

// ---------- Geometry ----------

/// Lane geometry as it came from the source, `[longitude, latitude]` pairs in
/// source order. Parts of a multi-line are kept apart; the gaps between them
/// are not lane.
#[derive(Debug, Clone, PartialEq)]
pub enum LaneGeometry {
    Line(Vec<[f64; 2]>),
    MultiLine(Vec<Vec<[f64; 2]>>),
}

impl LaneGeometry {
    pub fn parts(&self) -> Vec<&[[f64; 2]]> {
        match self {
            LaneGeometry::Line(line) => vec![line.as_slice()],
            LaneGeometry::MultiLine(lines) => lines.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.parts().iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count() == 0
    }

    pub fn to_value(&self) -> Value {
        let positions = |line: &[[f64; 2]]| line.iter().map(|c| c.to_vec()).collect::<Vec<_>>();
        match self {
            LaneGeometry::Line(line) => Value::LineString(positions(line)),
            LaneGeometry::MultiLine(lines) => {
                Value::MultiLineString(lines.iter().map(|l| positions(l)).collect())
            }
        }
    }
}

// ---------- Enriched lane ----------

/// Feature properties of an enriched lane, as the map renderer reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneProperties {
    pub id: String,
    pub name: LaneName,
    pub path_type: PathType,
    pub street_side: StreetSide,
    pub configuration: Configuration,
    pub directions: BTreeMap<Bearing, DirectionInfo>,
    pub safety_features: Vec<SafetyFeature>,
    pub hazards: Vec<Hazard>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedLane {
    pub properties: LaneProperties,
    pub geometry: LaneGeometry,
}

impl EnrichedLane {
    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn has_feature(&self, feature: SafetyFeature) -> bool {
        self.properties.safety_features.contains(&feature)
    }

    pub fn to_feature(&self) -> Feature {
        let properties = match serde_json::to_value(&self.properties) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(self.geometry.to_value())),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

/// Immutable result of one enhancement run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneCollection {
    pub lanes: Vec<EnrichedLane>,
}

impl LaneCollection {
    pub fn new(lanes: Vec<EnrichedLane>) -> Self {
        Self { lanes }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnrichedLane> {
        self.lanes.iter()
    }

    /// Ids that appear more than once, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dups: Vec<&str> = Vec::new();
        for lane in &self.lanes {
            if !seen.insert(lane.id()) && !dups.contains(&lane.id()) {
                dups.push(lane.id());
            }
        }
        dups
    }

    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.lanes.iter().map(EnrichedLane::to_feature).collect(),
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(id: &str) -> EnrichedLane {
        let mut directions = BTreeMap::new();
        directions.insert(
            Bearing::Eastbound,
            DirectionInfo { position: LanePosition::Full, with_traffic: false },
        );
        EnrichedLane {
            properties: LaneProperties {
                id: id.to_string(),
                name: LaneName { en: "A".into(), fr: "B".into() },
                path_type: PathType::Dedicated,
                street_side: StreetSide::Unresolved,
                configuration: Configuration::OneWay,
                directions,
                safety_features: vec![SafetyFeature::FourSeason],
                hazards: vec![Hazard::DooringRisk, Hazard::SeasonalClosure],
            },
            geometry: LaneGeometry::Line(vec![[-73.56, 45.50], [-73.55, 45.51]]),
        }
    }

    #[test]
    fn test_feature_properties_use_renderer_keys() {
        let feature = lane("path-1").to_feature();
        let props = serde_json::Value::Object(feature.properties.unwrap());

        assert_eq!(props["id"], "path-1");
        assert_eq!(props["pathType"], "dedicated");
        assert_eq!(props["streetSide"], "unresolved");
        assert_eq!(props["configuration"], "one-way");
        assert_eq!(props["directions"]["eastbound"]["position"], "full");
        assert_eq!(props["directions"]["eastbound"]["withTraffic"], false);
        assert_eq!(props["safetyFeatures"], serde_json::json!(["four-season"]));
        assert_eq!(props["hazards"], serde_json::json!(["dooring-risk", "seasonal-closure"]));

        match feature.geometry.unwrap().value {
            Value::LineString(coords) => assert_eq!(coords.len(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_multiline_parts_stay_separate_on_output() {
        let mut l = lane("path-2");
        l.geometry = LaneGeometry::MultiLine(vec![
            vec![[-73.600, 45.50], [-73.595, 45.50]],
            vec![[-73.582, 45.50], [-73.577, 45.50]],
        ]);
        assert_eq!(l.geometry.vertex_count(), 4);
        match l.to_feature().geometry.unwrap().value {
            Value::MultiLineString(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[1][0], vec![-73.582, 45.50]);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids_reported_once() {
        let c = LaneCollection::new(vec![lane("path-1"), lane("path-2"), lane("path-1"), lane("path-1")]);
        assert_eq!(c.duplicate_ids(), vec!["path-1"]);
        assert_eq!(c.to_geojson().features.len(), 4);
    }

    #[test]
    fn test_heading_snaps_to_cardinal_bearing() {
        assert_eq!(Bearing::from_heading(0.0), Bearing::Northbound);
        assert_eq!(Bearing::from_heading(350.0), Bearing::Northbound);
        assert_eq!(Bearing::from_heading(90.0), Bearing::Eastbound);
        assert_eq!(Bearing::from_heading(180.0), Bearing::Southbound);
        assert_eq!(Bearing::from_heading(-90.0), Bearing::Westbound);
    }
}
