use std::collections::BTreeMap;

use crate::lane::{
    Bearing, Configuration, DirectionInfo, EnrichedLane, Hazard, LaneCollection, LaneGeometry,
    LaneName, LanePosition, LaneProperties, PathType, SafetyFeature, StreetSide,
};

/// Built-in dataset used whenever the municipal dataset can't be loaded.
/// De Maisonneuve at Bordeaux, downtown Montréal.
pub fn sample_lanes() -> LaneCollection {
    let mut de_maisonneuve_dirs = BTreeMap::new();
    de_maisonneuve_dirs.insert(
        Bearing::Eastbound,
        DirectionInfo { position: LanePosition::South, with_traffic: true },
    );
    de_maisonneuve_dirs.insert(
        Bearing::Westbound,
        DirectionInfo { position: LanePosition::North, with_traffic: true },
    );

    let mut bordeaux_dirs = BTreeMap::new();
    bordeaux_dirs.insert(
        Bearing::Southbound,
        DirectionInfo { position: LanePosition::Full, with_traffic: true },
    );

    LaneCollection::new(vec![
        EnrichedLane {
            properties: LaneProperties {
                id: "path-sample-1".to_string(),
                name: LaneName {
                    en: "De Maisonneuve Bike Path".to_string(),
                    fr: "Piste cyclable De Maisonneuve".to_string(),
                },
                path_type: PathType::Protected,
                street_side: StreetSide::South,
                configuration: Configuration::Bidirectional,
                directions: de_maisonneuve_dirs,
                safety_features: vec![SafetyFeature::ProtectedBarrier, SafetyFeature::FourSeason],
                hazards: vec![Hazard::PedestrianCrossings],
            },
            geometry: LaneGeometry::Line(vec![
                [-73.5685, 45.5085],
                [-73.5670, 45.5085],
                [-73.5650, 45.5085],
                [-73.5630, 45.5085],
            ]),
        },
        EnrichedLane {
            properties: LaneProperties {
                id: "path-sample-2".to_string(),
                name: LaneName {
                    en: "Rue de Bordeaux".to_string(),
                    fr: "Rue de Bordeaux".to_string(),
                },
                path_type: PathType::Dedicated,
                street_side: StreetSide::West,
                configuration: Configuration::OneWay,
                directions: bordeaux_dirs,
                safety_features: vec![SafetyFeature::PaintedSeparation],
                hazards: vec![Hazard::DooringRisk],
            },
            geometry: LaneGeometry::Line(vec![
                [-73.5650, 45.5085],
                [-73.5650, 45.5070],
                [-73.5650, 45.5055],
                [-73.5650, 45.5040],
            ]),
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_two_fully_specified_lanes() {
        let lanes = sample_lanes();
        let ids: Vec<&str> = lanes.iter().map(|l| l.id()).collect();
        assert_eq!(ids, vec!["path-sample-1", "path-sample-2"]);
        for lane in lanes.iter() {
            assert_ne!(lane.properties.street_side, StreetSide::Unresolved);
            assert!(lane.geometry.vertex_count() > 2);
            assert!(!lane.properties.directions.is_empty());
        }
        assert!(lanes.duplicate_ids().is_empty());
    }
}
