//! Montréal bike-lane enrichment and active-lane selection.
//!
//! Raw municipal GeoJSON goes through [`enhance`] once; the resulting
//! [`LaneCollection`] feeds the map renderer and [`select_active`], whose
//! pick is turned into rider text by [`advise`].

pub mod advisory;
pub mod enhance;
pub mod error;
pub mod lane;
pub mod raw;
pub mod route;
pub mod sample;
pub mod select;
pub mod style;

pub use advisory::{advise, Advisory};
pub use enhance::{enhance, enhance_with_rng, EnhanceOptions, InvalidFeaturePolicy, StreetSidePolicy};
pub use error::EnhanceError;
pub use lane::{
    Bearing, Configuration, DirectionInfo, EnrichedLane, Hazard, LaneCollection, LaneGeometry,
    LaneName, LanePosition, LaneProperties, PathType, SafetyFeature, StreetSide,
};
pub use raw::{parse_raw_collection, RawLaneRecord};
pub use route::{summarize_steps, RouteStep};
pub use sample::sample_lanes;
pub use select::{select_active, simulated_position, ActiveLaneSelection, SelectionBasis, SelectionOptions};
pub use style::{lane_style, LaneStyle};
