use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("dataset is not valid GeoJSON: {0}")]
    Format(#[from] geojson::Error),

    #[error("dataset is not a FeatureCollection")]
    NotACollection,

    #[error("feature {index} has no line geometry")]
    MissingGeometry { index: usize },

    #[error("feature {index} has no {field} field")]
    MissingField { index: usize, field: &'static str },
}

impl EnhanceError {
    /// Index of the offending feature, when the error is about a single feature.
    pub fn feature_index(&self) -> Option<usize> {
        match self {
            EnhanceError::MissingGeometry { index } | EnhanceError::MissingField { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}
