use anyhow::{Context, Result};
use bike_lanes::{EnhanceOptions, SelectionOptions};
use serde::Deserialize;
use std::{fs, path::Path};

/// Local export of the Montréal open-data bike network (`reseau_cyclable`).
pub const DEFAULT_DATASET: &str = "data/reseau_cyclable.geojson";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AdvisorConfig {
    pub bind_addr: String,
    /// File path or http(s) URL of the raw lane dataset.
    pub dataset: String,
    pub fetch_timeout_secs: u64,
    #[serde(flatten)]
    pub enhance: EnhanceOptions,
    #[serde(flatten)]
    pub selection: SelectionOptions,
    /// Seed for the test-mode random picks; unseeded when absent.
    pub random_seed: Option<u64>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            dataset: DEFAULT_DATASET.to_string(),
            fetch_timeout_secs: 10,
            enhance: EnhanceOptions::default(),
            selection: SelectionOptions::default(),
            random_seed: None,
        }
    }
}

impl AdvisorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// `ADVISOR_CONFIG` names the file (defaults otherwise); `BIND_ADDR`, `PORT`
    /// and `DATASET` override it.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var("ADVISOR_CONFIG") {
            Ok(p) => Self::load(Path::new(&p))?,
            Err(_) => Self::default(),
        };
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            cfg.bind_addr = addr;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
            cfg.bind_addr = with_port(&cfg.bind_addr, port);
        }
        if let Ok(dataset) = std::env::var("DATASET") {
            cfg.dataset = dataset;
        }
        Ok(cfg)
    }
}

fn with_port(addr: &str, port: u16) -> String {
    let host = addr.rsplit_once(':').map(|(h, _)| h).unwrap_or(addr);
    format!("{}:{}", host, port)
}
