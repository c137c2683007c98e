use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue, Value};

use crate::error::EnhanceError;
use crate::lane::LaneGeometry;

/// Attribute names of the municipal open-data schema.
pub mod fields {
    pub const SOURCE_ID: &str = "ID_CYCL";
    pub const FACILITY_TYPE: &str = "TYPE_VOIE_CODE";
    pub const FACILITY_TYPE_2: &str = "TYPE_VOIE2_CODE";
    pub const LANE_COUNT: &str = "NBR_VOIE";
    pub const PROTECTED: &str = "PROTEGE_4S";
    pub const YEAR_ROUND: &str = "SAISONS4";
    pub const ROUTE_VERTE: &str = "ROUTE_VERTE";
    pub const SEPARATOR: &str = "SEPARATEUR_CODE";
    pub const LOCALITY: &str = "NOM_ARR_VILLE_DESC";
    pub const DESCRIPTION: &str = "DESCRIPTION";
}

pub const YES: &str = "Oui";
pub const NO: &str = "Non";

/// Parse dataset text into a feature collection. Anything other than a
/// FeatureCollection at the top level is rejected.
pub fn parse_raw_collection(text: &str) -> Result<FeatureCollection, EnhanceError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => Err(EnhanceError::NotACollection),
    }
}

/// One bike facility in the municipal schema.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLaneRecord {
    pub source_id: String,
    pub properties: JsonObject,
    pub geometry: LaneGeometry,
}

impl RawLaneRecord {
    pub fn from_feature(feature: &Feature, index: usize) -> Result<Self, EnhanceError> {
        let geometry = feature
            .geometry
            .as_ref()
            .and_then(|g| lane_geometry(&g.value))
            .ok_or(EnhanceError::MissingGeometry { index })?;
        let properties = feature.properties.clone().unwrap_or_default();
        Self::with_index(properties, geometry, index)
    }

    pub fn from_properties(
        properties: JsonObject,
        geometry: LaneGeometry,
    ) -> Result<Self, EnhanceError> {
        Self::with_index(properties, geometry, 0)
    }

    fn with_index(
        properties: JsonObject,
        geometry: LaneGeometry,
        index: usize,
    ) -> Result<Self, EnhanceError> {
        if geometry.is_empty() {
            return Err(EnhanceError::MissingGeometry { index });
        }
        let source_id = properties
            .get(fields::SOURCE_ID)
            .and_then(scalar_to_string)
            .ok_or(EnhanceError::MissingField { index, field: fields::SOURCE_ID })?;
        Ok(Self { source_id, properties, geometry })
    }

    /// A coded attribute, trimmed. Numeric codes are compared by their decimal text.
    pub fn code(&self, field: &str) -> Option<String> {
        self.properties.get(field).and_then(scalar_to_string)
    }

    pub fn code_is(&self, field: &str, expected: &str) -> bool {
        self.code(field).as_deref() == Some(expected)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.properties.get(field)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.properties.get(field).and_then(JsonValue::as_str)
    }

    /// `Some(true)` for exactly "Oui", `Some(false)` for exactly "Non", `None` otherwise.
    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.text(field) {
            Some(YES) => Some(true),
            Some(NO) => Some(false),
            _ => None,
        }
    }
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lane_geometry(value: &Value) -> Option<LaneGeometry> {
    match value {
        Value::LineString(line) => line_positions(line).map(LaneGeometry::Line),
        Value::MultiLineString(lines) => lines
            .iter()
            .map(|l| line_positions(l))
            .collect::<Option<Vec<_>>>()
            .map(LaneGeometry::MultiLine),
        _ => None,
    }
}

fn line_positions(line: &[Vec<f64>]) -> Option<Vec<[f64; 2]>> {
    line.iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] => Some([*lon, *lat]),
            _ => None,
        })
        .collect()
}
