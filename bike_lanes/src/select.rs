//! Picks the lane that drives rider advisories for a given position.

use geo::{Closest, HaversineClosestPoint, HaversineDistance, Line, Point};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::lane::{EnrichedLane, LaneCollection};

pub const DEFAULT_MAX_DISTANCE_M: f64 = 50.0;

/// Where riders are placed when no lane geometry is usable: De Maisonneuve at Bordeaux.
pub const DEFAULT_POSITION: [f64; 2] = [-73.5650, 45.5085];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Projection onto lane polylines is available. When false every
    /// selection is a random lane.
    pub geometry_engine: bool,
    /// Test mode: pick a random lane when nothing is within `max_distance_m`.
    pub random_fallback: bool,
    pub max_distance_m: f64,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            geometry_engine: true,
            random_fallback: false,
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBasis {
    /// Closest lane, within range.
    Nearest,
    /// Closest lane is too far away; nothing selected.
    OutOfRange,
    /// Closest lane is too far away; random lane picked (test mode).
    RandomFallback,
    /// No geometry engine; random lane picked.
    RandomNoGeometry,
    /// No lanes loaded.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveLaneSelection<'a> {
    pub lane: Option<&'a EnrichedLane>,
    /// Minimum great-circle distance in meters, when the geometry branch ran.
    pub distance_m: Option<f64>,
    pub basis: SelectionBasis,
}

impl<'a> ActiveLaneSelection<'a> {
    pub fn none(basis: SelectionBasis) -> Self {
        Self { lane: None, distance_m: None, basis }
    }

    pub fn is_random(&self) -> bool {
        matches!(self.basis, SelectionBasis::RandomFallback | SelectionBasis::RandomNoGeometry)
    }
}

/// Great-circle distance in meters from `position` to the closest point of the
/// lane. Multi-part lanes take the minimum over their parts. `None` when the lane
/// has no coordinates.
pub fn lane_distance_m(position: [f64; 2], lane: &EnrichedLane) -> Option<f64> {
    let point = Point::new(position[0], position[1]);
    lane.geometry
        .parts()
        .into_iter()
        .filter_map(|part| part_distance_m(point, part))
        .min_by(f64::total_cmp)
}

fn part_distance_m(point: Point, part: &[[f64; 2]]) -> Option<f64> {
    match part {
        [] => None,
        [only] => Some(point.haversine_distance(&Point::from(*only))),
        coords => coords
            .windows(2)
            .filter_map(|w| match Line::new(w[0], w[1]).haversine_closest_point(&point) {
                Closest::Intersection(_) => Some(0.0),
                Closest::SinglePoint(p) => Some(point.haversine_distance(&p)),
                Closest::Indeterminate => None,
            })
            .min_by(f64::total_cmp),
    }
}

/// Index and distance of the closest lane. Ties keep the earliest lane.
pub fn nearest_lane(position: [f64; 2], lanes: &LaneCollection) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, lane) in lanes.iter().enumerate() {
        let Some(d) = lane_distance_m(position, lane) else {
            tracing::warn!("lane {} has no geometry; skipping", lane.id());
            continue;
        };
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best
}

pub fn select_active<'a, R: Rng + ?Sized>(
    position: [f64; 2],
    lanes: &'a LaneCollection,
    options: &SelectionOptions,
    rng: &mut R,
) -> ActiveLaneSelection<'a> {
    if lanes.is_empty() {
        return ActiveLaneSelection::none(SelectionBasis::Empty);
    }

    if !options.geometry_engine {
        let lane = lanes.lanes.choose(rng);
        tracing::debug!("no geometry engine; random lane {:?}", lane.map(|l| l.id()));
        return ActiveLaneSelection { lane, distance_m: None, basis: SelectionBasis::RandomNoGeometry };
    }

    let Some((idx, distance)) = nearest_lane(position, lanes) else {
        return ActiveLaneSelection::none(SelectionBasis::Empty);
    };

    if distance <= options.max_distance_m {
        let lane = &lanes.lanes[idx];
        tracing::debug!("nearest lane {} at {:.1}m", lane.id(), distance);
        return ActiveLaneSelection { lane: Some(lane), distance_m: Some(distance), basis: SelectionBasis::Nearest };
    }

    if options.random_fallback {
        let lane = lanes.lanes.choose(rng);
        tracing::debug!(
            "nothing within {:.0}m (closest {:.1}m); test-mode random lane {:?}",
            options.max_distance_m,
            distance,
            lane.map(|l| l.id())
        );
        ActiveLaneSelection { lane, distance_m: Some(distance), basis: SelectionBasis::RandomFallback }
    } else {
        ActiveLaneSelection { lane: None, distance_m: Some(distance), basis: SelectionBasis::OutOfRange }
    }
}

/// Stand-in rider position for demos: the middle vertex of the first lane
/// part with more than two vertices.
pub fn simulated_position(lanes: &LaneCollection) -> [f64; 2] {
    lanes
        .iter()
        .flat_map(|l| l.geometry.parts())
        .find(|part| part.len() > 2)
        .map(|part| part[part.len() / 2])
        .unwrap_or(DEFAULT_POSITION)
}
