//! Trend fitting and volume projections.
//!
//! The global forecast blends a fitted line with bounded exponential growth
//! and a seasonal wobble; per-entity projections only extend the fitted line
//! by one step. Both are heuristics, tuned through [`ForecastConfig`].
use crate::aggregate::{monthly_totals, series_by, EntitySeries, MonthVolume};
use crate::config::ForecastConfig;
use crate::types::{Dimension, QueryOutcome, VehicleRecord};
use crate::util::{average, month_abbrev, parse_u32_or_zero, percent_change, std_dev};
use serde::Serialize;
use std::cmp::Ordering;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMethod {
    InsufficientData,
    EnhancedLinear,
}

/// Least-squares fit of volume against period index `0..n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    /// Goodness of fit, clamped to `[0, 1]`.
    pub r2: f64,
    pub mean: f64,
    /// Mean of the last (up to) two volumes.
    pub recent_average: f64,
    /// `(last - first) / first`, 0 when the first volume is 0.
    pub growth: f64,
    pub method: FitMethod,
}

pub fn fit_trend(volumes: &[f64]) -> TrendFit {
    if volumes.len() < 2 {
        return TrendFit {
            slope: 0.0,
            intercept: 0.0,
            r2: 0.0,
            mean: average(volumes),
            recent_average: average(volumes),
            growth: 0.0,
            method: FitMethod::InsufficientData,
        };
    }

    let n = volumes.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in volumes.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    let mean = sum_y / n;
    let ss_total: f64 = volumes.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_residual: f64 = volumes
        .iter()
        .enumerate()
        .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
        .sum();
    let r2 = if ss_total > 0.0 { 1.0 - ss_residual / ss_total } else { 0.0 };

    let tail = &volumes[volumes.len().saturating_sub(2)..];
    let first = volumes[0];
    let last = volumes[volumes.len() - 1];

    TrendFit {
        slope,
        intercept,
        r2: r2.clamp(0.0, 1.0),
        mean,
        recent_average: average(tail),
        growth: if first > 0.0 { (last - first) / first } else { 0.0 },
        method: FitMethod::EnhancedLinear,
    }
}

/// Compound per-period growth from first to last volume, clamped to the
/// configured range.
pub fn bounded_growth_rate(volumes: &[f64], config: &ForecastConfig) -> f64 {
    if volumes.len() < 2 {
        return 0.0;
    }
    let first = volumes[0];
    let last = volumes[volumes.len() - 1];
    if first <= 0.0 {
        return 0.0;
    }
    let periods = (volumes.len() - 1) as f64;
    let rate = (last / first).powf(1.0 / periods) - 1.0;
    rate.clamp(config.min_growth_rate, config.max_growth_rate)
}

/// Calendar month within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The period `n` months later.
    pub fn plus_months(&self, n: u32) -> Period {
        let zero_based = (self.month.max(1) - 1) + n;
        Period {
            year: self.year + (zero_based / 12) as i32,
            month: zero_based % 12 + 1,
        }
    }

    /// e.g. `Aug 2025`.
    pub fn label(&self) -> String {
        format!("{} {}", month_abbrev(self.month), self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeForecast {
    pub period: String,
    pub volume: u64,
    /// Percent, between the configured minimum and 100.
    pub confidence: u32,
}

/// Project `horizon` periods past the end of `series`. An empty series has
/// nothing to extend and yields no rows.
pub fn forecast_volumes(series: &[SeriesPoint], horizon: usize, config: &ForecastConfig) -> Vec<VolumeForecast> {
    let volumes: Vec<f64> = series.iter().map(|p| p.volume).collect();
    let trend = fit_trend(&volumes);
    forecast_with_fit(series, &trend, horizon, config)
}

fn forecast_with_fit(
    series: &[SeriesPoint],
    trend: &TrendFit,
    horizon: usize,
    config: &ForecastConfig,
) -> Vec<VolumeForecast> {
    let Some(last) = series.last().map(|p| p.period) else {
        return Vec::new();
    };
    let volumes: Vec<f64> = series.iter().map(|p| p.volume).collect();
    let n = volumes.len() as f64;
    let anchor = if trend.recent_average != 0.0 { trend.recent_average } else { trend.mean };
    let growth = bounded_growth_rate(&volumes, config);
    let use_line = trend.r2 > config.r2_threshold && trend.slope.abs() > 0.0;
    let base_confidence = trend.r2.max(config.min_base_confidence) * 100.0;

    (1..=horizon)
        .map(|i| {
            let step = i as f64;
            let mut volume = if use_line {
                (trend.intercept + trend.slope * (n + step - 1.0)).max(anchor * config.linear_floor_ratio)
            } else {
                let seasonal = 1.0
                    + config.seasonal_amplitude * (step * 2.0 * PI / config.seasonal_period).sin();
                anchor * (1.0 + growth).powf(step) * seasonal
            };
            volume = volume.max(anchor * config.absolute_floor_ratio);

            let distance = (1.0 - step * config.confidence_decay).max(config.min_distance_factor);
            let confidence = ((base_confidence * distance).round() as u32).max(config.min_confidence_pct);

            VolumeForecast {
                period: last.plus_months(i as u32).label(),
                volume: volume.round().max(0.0) as u64,
                confidence,
            }
        })
        .collect()
}

/// Month-over-month growth statistics, all in percent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrowthPredictions {
    pub monthly_growth: f64,
    pub annualized_growth: f64,
    pub volatility: f64,
}

/// A step from a zero volume counts as 0 % growth.
pub fn growth_predictions(volumes: &[f64]) -> GrowthPredictions {
    if volumes.len() < 2 {
        return GrowthPredictions::default();
    }
    let rates: Vec<f64> = volumes.windows(2).map(|w| percent_change(w[0], w[1])).collect();
    let avg = average(&rates);
    GrowthPredictions {
        monthly_growth: avg,
        annualized_growth: ((1.0 + avg / 100.0).powi(12) - 1.0) * 100.0,
        volatility: std_dev(&rates),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Accelerating,
    Growing,
    Stable,
    Declining,
}

/// One-step projection for a single manufacturer, state or fuel type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityProjection {
    pub key: String,
    pub current_volume: u64,
    pub projected_volume: u64,
    /// Percent change from the current to the projected volume.
    pub growth: f64,
    pub confidence: u32,
    pub direction: TrendDirection,
    pub fit: TrendFit,
}

fn project_series(series: &EntitySeries, config: &ForecastConfig) -> Option<(EntityProjection, f64)> {
    let volumes = series.volumes();
    if volumes.len() < 2 {
        return None;
    }
    let fit = fit_trend(&volumes);
    let last = volumes[volumes.len() - 1];
    let projected = (fit.intercept + fit.slope * volumes.len() as f64).max(0.0);
    let direction = if fit.slope > 0.0 {
        TrendDirection::Growing
    } else if fit.slope < 0.0 {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    };
    Some((
        EntityProjection {
            key: series.key.clone(),
            current_volume: last as u64,
            projected_volume: projected.round() as u64,
            growth: percent_change(last, projected),
            confidence: (fit.r2.max(config.entity_min_confidence) * 100.0).round() as u32,
            direction,
            fit,
        },
        projected,
    ))
}

/// One-step projections for every entity along `dimension` that has at
/// least two months of data, largest projection first.
pub fn project_entities(
    records: &[&VehicleRecord],
    dimension: Dimension,
    limit: Option<usize>,
    config: &ForecastConfig,
) -> Vec<EntityProjection> {
    let mut scored: Vec<(EntityProjection, f64)> = series_by(records, dimension)
        .iter()
        .filter_map(|s| project_series(s, config))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.key.cmp(&b.0.key))
    });
    let mut out: Vec<EntityProjection> = scored.into_iter().map(|(p, _)| p).collect();
    if let Some(n) = limit {
        out.truncate(n);
    }
    out
}

pub fn manufacturer_projections(records: &[&VehicleRecord], config: &ForecastConfig) -> Vec<EntityProjection> {
    project_entities(records, Dimension::Manufacturer, Some(10), config)
}

pub fn state_projections(records: &[&VehicleRecord], config: &ForecastConfig) -> Vec<EntityProjection> {
    project_entities(records, Dimension::State, Some(8), config)
}

/// Fuel projections label slopes above the accelerating threshold and fold
/// flat series into declining.
pub fn fuel_projections(records: &[&VehicleRecord], config: &ForecastConfig) -> Vec<EntityProjection> {
    project_entities(records, Dimension::FuelType, None, config)
        .into_iter()
        .map(|mut p| {
            p.direction = if p.fit.slope > config.accelerating_slope {
                TrendDirection::Accelerating
            } else if p.fit.slope > 0.0 {
                TrendDirection::Growing
            } else {
                TrendDirection::Declining
            };
            p
        })
        .collect()
}

/// Monthly totals as a dated series. The year of each month comes from its
/// records, falling back to `default_year`.
pub fn historical_series(records: &[&VehicleRecord], default_year: i32) -> Vec<SeriesPoint> {
    monthly_totals(records)
        .into_iter()
        .map(|MonthVolume { month, volume }| {
            let year = records
                .iter()
                .find(|r| r.sale_month == month)
                .map(|r| parse_u32_or_zero(&r.sale_year) as i32)
                .filter(|y| *y > 0)
                .unwrap_or(default_year);
            SeriesPoint { period: Period::new(year, month), volume: volume as f64 }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastReport {
    pub historical: Vec<SeriesPoint>,
    pub trend: TrendFit,
    pub volume_forecasts: Vec<VolumeForecast>,
    pub manufacturers: Vec<EntityProjection>,
    pub states: Vec<EntityProjection>,
    pub fuel_types: Vec<EntityProjection>,
    pub growth: GrowthPredictions,
    pub total_historical_volume: u64,
}

/// Everything the forecasting view shows for one filtered record set, or
/// `NoData` when the set is empty.
pub fn forecast_report(
    records: &[&VehicleRecord],
    horizon: usize,
    default_year: i32,
    config: &ForecastConfig,
) -> QueryOutcome<ForecastReport> {
    if records.is_empty() {
        return QueryOutcome::NoData;
    }
    let historical = historical_series(records, default_year);
    let volumes: Vec<f64> = historical.iter().map(|p| p.volume).collect();
    let trend = fit_trend(&volumes);
    let volume_forecasts = forecast_with_fit(&historical, &trend, horizon, config);
    QueryOutcome::Data(ForecastReport {
        total_historical_volume: volumes.iter().sum::<f64>() as u64,
        growth: growth_predictions(&volumes),
        manufacturers: manufacturer_projections(records, config),
        states: state_projections(records, config),
        fuel_types: fuel_projections(records, config),
        volume_forecasts,
        trend,
        historical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::view;
    use crate::types::RegionClass;

    fn series(volumes: &[f64]) -> Vec<SeriesPoint> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint { period: Period::new(2025, 4 + i as u32), volume: *v })
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn two_point_line_fits_exactly() {
        let fit = fit_trend(&[100.0, 200.0]);
        assert!(close(fit.slope, 100.0));
        assert!(close(fit.intercept, 100.0));
        assert!(close(fit.r2, 1.0));
        assert_eq!(fit.method, FitMethod::EnhancedLinear);
        assert!(close(fit.recent_average, 150.0));
        assert!(close(fit.growth, 1.0));
    }

    #[test]
    fn short_series_is_insufficient() {
        let fit = fit_trend(&[42.0]);
        assert_eq!(fit.method, FitMethod::InsufficientData);
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r2, 0.0);
    }

    #[test]
    fn flat_series_has_zero_r2() {
        let fit = fit_trend(&[50.0, 50.0, 50.0]);
        assert!(close(fit.slope, 0.0));
        assert_eq!(fit.r2, 0.0);
    }

    #[test]
    fn growth_rate_is_bounded() {
        let cfg = ForecastConfig::default();
        assert!(close(bounded_growth_rate(&[100.0, 1000.0], &cfg), 0.2));
        assert!(close(bounded_growth_rate(&[1000.0, 100.0], &cfg), -0.1));
        assert!(close(bounded_growth_rate(&[100.0, 121.0, 110.0], &cfg), (1.1f64).sqrt() - 1.0));
        assert_eq!(bounded_growth_rate(&[0.0, 10.0], &cfg), 0.0);
    }

    #[test]
    fn zero_horizon_is_empty() {
        let cfg = ForecastConfig::default();
        assert!(forecast_volumes(&series(&[100.0, 200.0]), 0, &cfg).is_empty());
    }

    #[test]
    fn confidence_never_increases_with_distance() {
        let cfg = ForecastConfig::default();
        let out = forecast_volumes(&series(&[100.0, 140.0, 90.0, 160.0]), 18, &cfg);
        assert_eq!(out.len(), 18);
        assert!(out.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        assert!(out.iter().all(|f| f.confidence >= 30));
    }

    #[test]
    fn strong_line_is_extrapolated() {
        let cfg = ForecastConfig::default();
        let out = forecast_volumes(&series(&[100.0, 200.0, 300.0]), 2, &cfg);
        assert_eq!(out[0].volume, 400);
        assert_eq!(out[1].volume, 500);
        // r2 = 1: 100 * 0.95, then 100 * 0.90
        assert_eq!(out[0].confidence, 95);
        assert_eq!(out[1].confidence, 90);
        assert_eq!(out[0].period, "Jul 2025");
    }

    #[test]
    fn declining_line_is_floored() {
        let cfg = ForecastConfig::default();
        let out = forecast_volumes(&series(&[1000.0, 500.0, 10.0]), 3, &cfg);
        // recent average is 255, linear floor 0.3 * 255
        assert!(out.iter().all(|f| f.volume >= 76 && f.volume <= 77));
    }

    #[test]
    fn weak_fit_uses_bounded_growth() {
        let cfg = ForecastConfig::default();
        let out = forecast_volumes(&series(&[100.0, 300.0, 100.0, 300.0]), 1, &cfg);
        let anchor = 200.0;
        let growth = 0.2;
        let expected = anchor * (1.0 + growth) * (1.0 + 0.1 * (PI / 6.0).sin());
        assert_eq!(out[0].volume, expected.round() as u64);
        assert_eq!(out[0].confidence, 48);
    }

    #[test]
    fn periods_roll_over_years() {
        let p = Period::new(2025, 11);
        assert_eq!(p.plus_months(1), Period::new(2025, 12));
        assert_eq!(p.plus_months(2), Period::new(2026, 1));
        assert_eq!(p.plus_months(14).label(), "Jan 2027");
    }

    #[test]
    fn growth_predictions_from_monthly_rates() {
        let g = growth_predictions(&[100.0, 110.0, 121.0]);
        assert!((g.monthly_growth - 10.0).abs() < 1e-9);
        assert!(g.volatility.abs() < 1e-9);
        assert!((g.annualized_growth - (1.1f64.powi(12) - 1.0) * 100.0).abs() < 1e-6);
        assert_eq!(growth_predictions(&[5.0]), GrowthPredictions::default());
    }

    fn rec(make: &str, fuel: &str, state: &str, month: u32, count: u64) -> VehicleRecord {
        VehicleRecord {
            manufacturer: make.into(),
            model: "M".into(),
            variant: "V".into(),
            count,
            fuel_type: fuel.into(),
            engine_cc: "110".into(),
            vehicle_class: "M-CYCLE".into(),
            sale_month: month,
            sale_year: "2025".into(),
            office_code: "X".into(),
            office_name: "X RTO".into(),
            city_name: "X".into(),
            district_name: "X".into(),
            state_code: "S".into(),
            state_name: state.into(),
            region_class: RegionClass::Rural,
        }
    }

    #[test]
    fn entity_projection_extends_line_one_step() {
        let cfg = ForecastConfig::default();
        let data = vec![
            rec("HERO", "PETROL", "UP", 4, 100),
            rec("HERO", "PETROL", "UP", 5, 200),
            rec("ATHER", "ELECTRIC", "KA", 4, 50),
            rec("ATHER", "ELECTRIC", "KA", 5, 40),
            rec("SOLO", "PETROL", "UP", 4, 999),
        ];
        let v = view(&data);
        let makers = manufacturer_projections(&v, &cfg);
        assert_eq!(makers.len(), 2);
        assert_eq!(makers[0].key, "HERO");
        assert_eq!(makers[0].projected_volume, 300);
        assert!(close(makers[0].growth, 50.0));
        assert_eq!(makers[0].confidence, 100);
        assert_eq!(makers[1].direction, TrendDirection::Declining);
        assert_eq!(makers[1].projected_volume, 30);

        let fuels = fuel_projections(&v, &cfg);
        let petrol = fuels.iter().find(|p| p.key == "PETROL").unwrap();
        // petrol: 1099 in April, 200 in May
        assert_eq!(petrol.direction, TrendDirection::Declining);
        assert_eq!(petrol.projected_volume, 0);
    }

    #[test]
    fn report_bundles_everything() {
        let cfg = ForecastConfig::default();
        let data = vec![
            rec("HERO", "PETROL", "UP", 4, 100),
            rec("HERO", "PETROL", "UP", 5, 200),
            rec("HERO", "PETROL", "UP", 6, 300),
        ];
        let v = view(&data);
        let report = forecast_report(&v, 3, 2024, &cfg).data().unwrap();
        assert_eq!(report.historical.len(), 3);
        assert_eq!(report.historical[0].period, Period::new(2025, 4));
        assert_eq!(report.volume_forecasts.len(), 3);
        assert_eq!(report.volume_forecasts[0].period, "Jul 2025");
        assert_eq!(report.total_historical_volume, 600);
        let fuel = &report.fuel_types[0];
        assert_eq!(fuel.direction, TrendDirection::Accelerating);
    }

    #[test]
    fn empty_input_has_nothing_to_forecast() {
        let cfg = ForecastConfig::default();
        assert!(forecast_volumes(&[], 3, &cfg).is_empty());
        assert!(forecast_report(&[], 3, 2025, &cfg).is_no_data());
    }
}
