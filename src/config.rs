// Tunables for the forecast heuristic and the console shell.
//
// The forecast constants are exposed as a serde struct so they can be
// overridden from JSON; `Default` carries the reference values.
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const R2_CONFIDENCE_THRESHOLD: f64 = 0.7;
pub const MIN_GROWTH_RATE: f64 = -0.1;
pub const MAX_GROWTH_RATE: f64 = 0.2;
pub const LINEAR_FLOOR_RATIO: f64 = 0.3;
pub const ABSOLUTE_FLOOR_RATIO: f64 = 0.2;
pub const SEASONAL_AMPLITUDE: f64 = 0.1;
pub const SEASONAL_PERIOD: f64 = 12.0;
pub const MIN_BASE_CONFIDENCE: f64 = 0.5;
pub const CONFIDENCE_DECAY_PER_PERIOD: f64 = 0.05;
pub const MIN_DISTANCE_FACTOR: f64 = 0.3;
pub const MIN_CONFIDENCE_PCT: u32 = 30;
pub const ENTITY_MIN_CONFIDENCE: f64 = 0.4;
pub const ACCELERATING_SLOPE: f64 = 5.0;
pub const MIN_MARKET_SHARE_PCT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// R² above which the fitted line is extrapolated directly.
    pub r2_threshold: f64,
    pub min_growth_rate: f64,
    pub max_growth_rate: f64,
    /// Floor for the linear branch, as a fraction of the recent average.
    pub linear_floor_ratio: f64,
    /// Floor applied to every forecast, as a fraction of the recent average.
    pub absolute_floor_ratio: f64,
    pub seasonal_amplitude: f64,
    /// Length of one seasonal cycle in periods.
    pub seasonal_period: f64,
    pub min_base_confidence: f64,
    pub confidence_decay: f64,
    pub min_distance_factor: f64,
    pub min_confidence_pct: u32,
    pub entity_min_confidence: f64,
    pub accelerating_slope: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            r2_threshold: R2_CONFIDENCE_THRESHOLD,
            min_growth_rate: MIN_GROWTH_RATE,
            max_growth_rate: MAX_GROWTH_RATE,
            linear_floor_ratio: LINEAR_FLOOR_RATIO,
            absolute_floor_ratio: ABSOLUTE_FLOOR_RATIO,
            seasonal_amplitude: SEASONAL_AMPLITUDE,
            seasonal_period: SEASONAL_PERIOD,
            min_base_confidence: MIN_BASE_CONFIDENCE,
            confidence_decay: CONFIDENCE_DECAY_PER_PERIOD,
            min_distance_factor: MIN_DISTANCE_FACTOR,
            min_confidence_pct: MIN_CONFIDENCE_PCT,
            entity_min_confidence: ENTITY_MIN_CONFIDENCE,
            accelerating_slope: ACCELERATING_SLOPE,
        }
    }
}

/// Settings for the console shell, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub year: i32,
    pub months: Vec<u32>,
    pub output_dir: PathBuf,
    pub forecast_horizon: usize,
    pub forecast: ForecastConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            year: 2025,
            months: vec![4, 5, 6, 7],
            output_dir: PathBuf::from("."),
            forecast_horizon: 6,
            forecast: ForecastConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = AppConfig::default();
        if let Some(dir) = lookup("TW_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TW_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(year) = lookup("TW_YEAR") {
            cfg.year = year
                .trim()
                .parse()
                .map_err(|_| ReportError::Config(format!("TW_YEAR is not a year: {year}")))?;
        }
        if let Some(months) = lookup("TW_MONTHS") {
            cfg.months = parse_months(&months)?;
        }
        if let Some(h) = lookup("TW_FORECAST_HORIZON") {
            cfg.forecast_horizon = h.trim().parse().map_err(|_| {
                ReportError::Config(format!("TW_FORECAST_HORIZON is not a number: {h}"))
            })?;
        }
        if let Some(path) = lookup("TW_FORECAST_CONFIG") {
            let text = std::fs::read_to_string(&path).map_err(|source| ReportError::Io {
                path: PathBuf::from(&path),
                source,
            })?;
            cfg.forecast = serde_json::from_str(&text)?;
        }
        Ok(cfg)
    }
}

fn parse_months(s: &str) -> Result<Vec<u32>> {
    let mut months = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<u32>() {
            Ok(m) if (1..=12).contains(&m) => months.push(m),
            _ => return Err(ReportError::Config(format!("invalid month in TW_MONTHS: {part}"))),
        }
    }
    if months.is_empty() {
        return Err(ReportError::Config("TW_MONTHS is empty".to_string()));
    }
    months.sort_unstable();
    months.dedup();
    Ok(months)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.months, vec![4, 5, 6, 7]);
    }

    #[test]
    fn months_are_sorted_and_deduplicated() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("TW_MONTHS", "7, 4,5,4")])).unwrap();
        assert_eq!(cfg.months, vec![4, 5, 7]);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup_from(&[("TW_MONTHS", "13")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("TW_YEAR", "twenty")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("TW_FORECAST_HORIZON", "-1")])).is_err());
    }

    #[test]
    fn forecast_config_fills_missing_fields() {
        let cfg: ForecastConfig = serde_json::from_str(r#"{"r2_threshold": 0.9}"#).unwrap();
        assert_eq!(cfg.r2_threshold, 0.9);
        assert_eq!(cfg.max_growth_rate, MAX_GROWTH_RATE);
    }
}
