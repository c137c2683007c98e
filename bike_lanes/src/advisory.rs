//! Rider-facing text for the active lane. Formatting only.

use serde::Serialize;

use crate::lane::{Bearing, Configuration, EnrichedLane, Hazard, SafetyFeature, StreetSide};

/// Lane id token the bearing heuristic treats as an east-west corridor.
const EAST_WEST_CORRIDOR: &str = "demaisonneuve";

pub fn hazard_label(h: Hazard) -> &'static str {
    match h {
        Hazard::DooringRisk => "car doors",
        Hazard::PedestrianCrossings => "pedestrians",
        Hazard::SharedWithCars => "mixed traffic",
        Hazard::SeasonalClosure => "winter closure",
        Hazard::OneWayStreet => "one-way street",
    }
}

pub fn feature_label(f: SafetyFeature) -> &'static str {
    match f {
        SafetyFeature::ProtectedBarrier => "physical barrier",
        SafetyFeature::FourSeason => "open year-round",
        SafetyFeature::RouteVerte => "Route Verte",
        SafetyFeature::MedianSeparation => "median barrier",
        SafetyFeature::PaintedSeparation => "painted buffer",
    }
}

/// Placeholder travel bearing until a real heading is known: eastbound on the
/// east-west corridor, southbound anywhere else.
pub fn assumed_bearing(lane: &EnrichedLane) -> Bearing {
    if lane.id().contains(EAST_WEST_CORRIDOR) {
        Bearing::Eastbound
    } else {
        Bearing::Southbound
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advisory {
    pub lane_id: Option<String>,
    pub heading: Option<String>,
    pub side_label: String,
    pub direction_label: String,
    pub position_hint: Option<String>,
    pub safety_text: String,
    pub glyph: Option<&'static str>,
}

impl Advisory {
    pub fn no_selection() -> Self {
        Self {
            lane_id: None,
            heading: None,
            side_label: "Bike lane: Not on a bike path".to_string(),
            direction_label: "Direction: Unknown".to_string(),
            position_hint: None,
            safety_text: "No specific instructions".to_string(),
            glyph: None,
        }
    }

    /// One line for plain-text consumers. Never empty.
    pub fn summary(&self) -> String {
        match &self.heading {
            Some(h) => format!("{}: {}", h, self.safety_text),
            None => format!("{}. {}", self.side_label, self.safety_text),
        }
    }
}

fn side_text(side: StreetSide) -> String {
    side.as_str().to_uppercase()
}

pub fn advise(lane: Option<&EnrichedLane>, bearing: Option<Bearing>) -> Advisory {
    let Some(lane) = lane else {
        return Advisory::no_selection();
    };
    let p = &lane.properties;
    let bearing = bearing.unwrap_or_else(|| assumed_bearing(lane));

    let side_label = match p.street_side {
        StreetSide::Unresolved => "Bike lane: Side not yet determined".to_string(),
        side => format!("Bike lane: On {} side", side_text(side)),
    };

    // Single-direction lanes only ever carry one entry.
    let one_way = p.directions.iter().next();

    let (direction_text, position_hint, config_text) = match p.configuration {
        Configuration::Bidirectional => {
            let hint = p
                .directions
                .get(&bearing)
                .map(|d| format!("Stay on {} side of lane", d.position.as_str().to_uppercase()));
            let mut config = "BIDIRECTIONAL path".to_string();
            if let Some(h) = &hint {
                config.push_str(&format!(" ({})", h));
            }
            ("BIDIRECTIONAL".to_string(), hint, config)
        }
        Configuration::OneWay => {
            let with_traffic = one_way.map_or(true, |(_, d)| d.with_traffic);
            if with_traffic {
                ("ONE-WAY with traffic".to_string(), None, "ONE-WAY with traffic".to_string())
            } else {
                (
                    "ONE-WAY against traffic (CONTRAFLOW)".to_string(),
                    None,
                    "ONE-WAY against traffic (use caution!)".to_string(),
                )
            }
        }
    };

    let side_for_text = match p.street_side {
        StreetSide::Unresolved => "UNKNOWN".to_string(),
        side => side_text(side),
    };
    let mut safety_text = format!(
        "Bike lane on {} side, {}, {} lane",
        side_for_text,
        config_text,
        p.path_type.as_str().to_uppercase()
    );
    if !p.safety_features.is_empty() {
        let labels: Vec<&str> = p.safety_features.iter().map(|f| feature_label(*f)).collect();
        safety_text.push_str(&format!(" with {}", labels.join(", ")));
    }
    if !p.hazards.is_empty() {
        let labels: Vec<&str> = p.hazards.iter().map(|h| hazard_label(*h)).collect();
        safety_text.push_str(&format!(" - Watch for: {}", labels.join(", ")));
    }

    let glyph = match p.configuration {
        Configuration::Bidirectional => Some("⟷"),
        Configuration::OneWay => one_way.map(|(b, _)| match b {
            Bearing::Northbound => "↑",
            Bearing::Southbound => "↓",
            Bearing::Eastbound => "→",
            Bearing::Westbound => "←",
        }),
    };

    Advisory {
        lane_id: Some(p.id.clone()),
        heading: Some(format!("On {}", p.name.en)),
        side_label,
        direction_label: format!("Direction: {}", direction_text),
        position_hint,
        safety_text,
        glyph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_lanes;

    #[test]
    fn test_no_selection_still_has_text() {
        let a = advise(None, None);
        assert_eq!(a.side_label, "Bike lane: Not on a bike path");
        assert_eq!(a.direction_label, "Direction: Unknown");
        assert!(!a.summary().is_empty());
    }

    #[test]
    fn test_bidirectional_position_hint_for_matching_bearing() {
        let lanes = sample_lanes();
        let a = advise(Some(&lanes.lanes[0]), Some(Bearing::Eastbound));
        assert_eq!(a.side_label, "Bike lane: On SOUTH side");
        assert_eq!(a.direction_label, "Direction: BIDIRECTIONAL");
        assert_eq!(a.position_hint.as_deref(), Some("Stay on SOUTH side of lane"));
        assert_eq!(
            a.safety_text,
            "Bike lane on SOUTH side, BIDIRECTIONAL path (Stay on SOUTH side of lane), PROTECTED lane \
             with physical barrier, open year-round - Watch for: pedestrians"
        );
        assert_eq!(a.glyph, Some("⟷"));
        assert_eq!(a.heading.as_deref(), Some("On De Maisonneuve Bike Path"));
    }

    #[test]
    fn test_assumed_bearing_has_no_entry_on_bidirectional_lane() {
        let lanes = sample_lanes();
        // The sample id doesn't name the corridor, so the heuristic says southbound.
        assert_eq!(assumed_bearing(&lanes.lanes[0]), Bearing::Southbound);
        let a = advise(Some(&lanes.lanes[0]), None);
        assert!(a.position_hint.is_none());
    }

    #[test]
    fn test_one_way_with_traffic() {
        let lanes = sample_lanes();
        let a = advise(Some(&lanes.lanes[1]), None);
        assert_eq!(a.direction_label, "Direction: ONE-WAY with traffic");
        assert_eq!(a.glyph, Some("↓"));
        assert!(a.safety_text.ends_with("DEDICATED lane with painted buffer - Watch for: car doors"));
    }

    #[test]
    fn test_contraflow_and_unresolved_side() {
        let mut lane = sample_lanes().lanes[1].clone();
        lane.properties.street_side = StreetSide::Unresolved;
        for d in lane.properties.directions.values_mut() {
            d.with_traffic = false;
        }
        let a = advise(Some(&lane), None);
        assert_eq!(a.side_label, "Bike lane: Side not yet determined");
        assert_eq!(a.direction_label, "Direction: ONE-WAY against traffic (CONTRAFLOW)");
        assert!(a.safety_text.contains("ONE-WAY against traffic (use caution!)"));
    }
}
