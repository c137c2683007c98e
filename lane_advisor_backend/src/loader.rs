use std::time::Duration;

use bike_lanes::{enhance, enhance_with_rng, parse_raw_collection, sample_lanes, EnhanceError, LaneCollection};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::config::AdvisorConfig;
use crate::state::{DataSource, LaneSnapshot};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dataset fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Enhance(#[from] EnhanceError),
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub async fn fetch_text(source: &str, timeout: Duration) -> Result<String, LoadError> {
    if is_url(source) {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let resp = client.get(source).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| LoadError::Io { path: source.to_string(), source: e })
    }
}

pub async fn fetch_and_enhance(cfg: &AdvisorConfig) -> Result<LaneCollection, LoadError> {
    let timeout = Duration::from_secs(cfg.fetch_timeout_secs);
    let text = tokio::time::timeout(timeout, fetch_text(&cfg.dataset, timeout))
        .await
        .map_err(|_| LoadError::Timeout(timeout))??;

    let raw = parse_raw_collection(&text)?;
    tracing::info!("fetched {} raw features from {}", raw.features.len(), cfg.dataset);

    let lanes = match cfg.random_seed {
        Some(seed) => enhance_with_rng(&raw, &cfg.enhance, &mut StdRng::seed_from_u64(seed))?,
        None => enhance(&raw, &cfg.enhance)?,
    };
    Ok(lanes)
}

/// Always yields a usable snapshot: any fetch or enhancement failure
/// substitutes the built-in sample lanes.
pub async fn load_lanes(cfg: &AdvisorConfig) -> LaneSnapshot {
    match fetch_and_enhance(cfg).await {
        Ok(lanes) => LaneSnapshot::new(lanes, DataSource::Dataset),
        Err(e) => {
            tracing::warn!("could not load {}: {}; using sample lanes", cfg.dataset, e);
            LaneSnapshot::new(sample_lanes(), DataSource::Sample)
        }
    }
}
