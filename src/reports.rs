use crate::competition::Insight;
use crate::forecast::{ForecastReport, GrowthPredictions, VolumeForecast};
use crate::geography::{regional_overview, OfficeProfile, RegionalOverview};
use crate::summary::{AggregatedSummary, ManufacturerSummary, MonthSummary};
use crate::types::{ForecastRow, GroupTotal, ManufacturerRow, MonthlyTrendRow, OfficeRow};
use crate::util::{format_int, format_number};
use serde::Serialize;

const NOT_AVAILABLE: &str = "N/A";

fn first_key(groups: &[GroupTotal]) -> String {
    groups
        .first()
        .map(|g| g.key.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn pct(v: f64) -> String {
    format!("{}%", format_number(v, 2))
}

/// Manufacturer ranking, in summary order (largest volume first).
pub fn manufacturer_rows(manufacturers: &[ManufacturerSummary]) -> Vec<ManufacturerRow> {
    manufacturers
        .iter()
        .enumerate()
        .map(|(i, m)| ManufacturerRow {
            rank: i + 1,
            manufacturer: m.name.clone(),
            volume: format_int(m.count),
            market_share: pct(m.percentage),
            top_model: first_key(&m.top_models),
            top_state: first_key(&m.state_distribution),
        })
        .collect()
}

pub fn office_rows(profiles: &[OfficeProfile]) -> Vec<OfficeRow> {
    profiles
        .iter()
        .map(|p| OfficeRow {
            office: p.name.clone(),
            state: p.state.clone(),
            classification: p.classification.to_string(),
            sales: format_int(p.sales),
            share: pct(p.percentage),
            top_manufacturer: p.top_manufacturer.clone(),
            dominant_fuel: p.dominant_fuel.clone(),
        })
        .collect()
}

/// Monthly trend table in calendar order.
pub fn monthly_rows(months: &[MonthSummary]) -> Vec<MonthlyTrendRow> {
    let mut sorted: Vec<&MonthSummary> = months.iter().collect();
    sorted.sort_by_key(|m| m.month);
    sorted
        .into_iter()
        .map(|m| MonthlyTrendRow {
            month: m.month_name.clone(),
            volume: format_int(m.count),
            share: pct(m.percentage),
            top_manufacturer: first_key(&m.top_manufacturers),
            top_fuel: first_key(&m.top_fuel_types),
        })
        .collect()
}

pub fn forecast_rows(forecasts: &[VolumeForecast]) -> Vec<ForecastRow> {
    forecasts
        .iter()
        .map(|f| ForecastRow {
            period: f.period.clone(),
            volume: format_int(f.volume),
            confidence: format!("{}%", f.confidence),
        })
        .collect()
}

/// Headline figures written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_vehicles: u64,
    pub total_manufacturers: usize,
    pub total_states: usize,
    pub total_offices: usize,
    pub market_leader: Option<String>,
    pub regional: RegionalOverview,
    pub trend_slope: f64,
    pub trend_r2: f64,
    pub growth: GrowthPredictions,
    pub next_period: Option<VolumeForecast>,
    pub insights: Vec<String>,
}

pub fn report_summary(
    summary: &AggregatedSummary,
    offices: &[OfficeProfile],
    forecast: &ForecastReport,
    insights: &[Insight],
) -> ReportSummary {
    ReportSummary {
        total_vehicles: summary.total_vehicles,
        total_manufacturers: summary.total_manufacturers,
        total_states: summary.total_states,
        total_offices: summary.total_offices,
        market_leader: summary.manufacturers.first().map(|m| m.name.clone()),
        regional: regional_overview(offices),
        trend_slope: forecast.trend.slope,
        trend_r2: forecast.trend.r2,
        growth: forecast.growth.clone(),
        next_period: forecast.volume_forecasts.first().cloned(),
        insights: insights.iter().map(Insight::description).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::view;
    use crate::config::ForecastConfig;
    use crate::forecast::forecast_report;
    use crate::geography::office_profiles;
    use crate::summary::summarize;
    use crate::types::{RegionClass, VehicleRecord};

    fn rec(make: &str, model: &str, office: &str, month: u32, count: u64) -> VehicleRecord {
        VehicleRecord {
            manufacturer: make.into(),
            model: model.into(),
            variant: "STD".into(),
            count,
            fuel_type: "PETROL".into(),
            engine_cc: "110".into(),
            vehicle_class: "M-CYCLE".into(),
            sale_month: month,
            sale_year: "2025".into(),
            office_code: "X".into(),
            office_name: office.into(),
            city_name: "PUNE".into(),
            district_name: "PUNE".into(),
            state_code: "MH".into(),
            state_name: "MAHARASHTRA".into(),
            region_class: RegionClass::Metro,
        }
    }

    fn sample() -> Vec<VehicleRecord> {
        vec![
            rec("HERO", "SPLENDOR", "PUNE RTO", 4, 1200),
            rec("HONDA", "ACTIVA", "PUNE RTO", 4, 800),
            rec("HERO", "SPLENDOR", "PIMPRI RTO", 5, 1500),
            rec("HONDA", "SHINE", "PIMPRI RTO", 5, 500),
        ]
    }

    #[test]
    fn manufacturer_rows_are_ranked_and_formatted() {
        let data = sample();
        let s = summarize(&view(&data)).data().unwrap();
        let rows = manufacturer_rows(&s.manufacturers);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].manufacturer, "HERO");
        assert_eq!(rows[0].volume, "2,700");
        assert_eq!(rows[0].market_share, "67.50%");
        assert_eq!(rows[0].top_model, "SPLENDOR");
        assert_eq!(rows[1].top_model, "ACTIVA");
    }

    #[test]
    fn monthly_rows_follow_calendar() {
        let data = sample();
        let s = summarize(&view(&data)).data().unwrap();
        let rows = monthly_rows(&s.monthly_trends);
        let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
        assert_eq!(months, vec!["April", "May"]);
        assert_eq!(rows[0].top_manufacturer, "HERO");
    }

    #[test]
    fn summary_collects_headlines() {
        let data = sample();
        let v = view(&data);
        let s = summarize(&v).data().unwrap();
        let offices = office_profiles(&v).data().unwrap();
        let f = forecast_report(&v, 2, 2025, &ForecastConfig::default()).data().unwrap();
        let out = report_summary(&s, &offices, &f, &[]);
        assert_eq!(out.total_vehicles, 4000);
        assert_eq!(out.market_leader.as_deref(), Some("HERO"));
        assert_eq!(out.regional.total_offices, 2);
        assert_eq!(forecast_rows(&f.volume_forecasts).len(), 2);
        assert_eq!(office_rows(&offices)[0].classification, "Metro");
    }
}
