//! Manufacturer competition: market share, month-over-month growth and the
//! cross tables behind the competitor view. Only manufacturers above the
//! minimum share take part in growth and cross tables.
use crate::aggregate::{breakdown, cross_totals, series_by, BreakdownQuery, CrossTotal};
use crate::config::MIN_MARKET_SHARE_PCT;
use crate::types::{Dimension, QueryOutcome, RegionClass, VehicleRecord};
use crate::util::{average, month_abbrev, percent_change};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const TOP_MODELS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketShareEntry {
    pub rank: usize,
    pub manufacturer: String,
    pub volume: u64,
    pub share: f64,
}

/// Ranked manufacturer shares, dropping those below `min_share` percent.
pub fn market_share(records: &[&VehicleRecord], min_share: f64) -> QueryOutcome<Vec<MarketShareEntry>> {
    breakdown(records, &BreakdownQuery::new(Dimension::Manufacturer).min_share(min_share)).map(|b| {
        b.entries
            .into_iter()
            .map(|e| MarketShareEntry {
                rank: e.rank,
                manufacturer: e.key,
                volume: e.count,
                share: e.percentage,
            })
            .collect()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodGrowth {
    /// e.g. `Apr-May`.
    pub label: String,
    pub from_month: u32,
    pub to_month: u32,
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthEntry {
    pub manufacturer: String,
    /// Volume per month, ascending.
    pub monthly_volumes: Vec<(u32, u64)>,
    pub period_growth: Vec<PeriodGrowth>,
    /// First to last month, in percent.
    pub overall_growth: f64,
    pub trend: Movement,
}

/// Month pairs and overall growth per manufacturer in `eligible`, fastest
/// growing first. Growth from a zero month is reported as 0.
pub fn growth_analysis(records: &[&VehicleRecord], eligible: &HashSet<String>) -> Vec<GrowthEntry> {
    let mut out: Vec<GrowthEntry> = series_by(records, Dimension::Manufacturer)
        .into_iter()
        .filter(|s| eligible.contains(&s.key))
        .map(|s| {
            let period_growth = s
                .points
                .windows(2)
                .map(|w| PeriodGrowth {
                    label: format!("{}-{}", month_abbrev(w[0].month), month_abbrev(w[1].month)),
                    from_month: w[0].month,
                    to_month: w[1].month,
                    growth: percent_change(w[0].volume as f64, w[1].volume as f64),
                })
                .collect();
            let overall_growth = match (s.points.first(), s.points.last()) {
                (Some(a), Some(b)) if s.points.len() > 1 => percent_change(a.volume as f64, b.volume as f64),
                _ => 0.0,
            };
            let trend = if overall_growth > 0.0 {
                Movement::Up
            } else if overall_growth < 0.0 {
                Movement::Down
            } else {
                Movement::Stable
            };
            GrowthEntry {
                monthly_volumes: s.points.iter().map(|p| (p.month, p.volume)).collect(),
                manufacturer: s.key,
                period_growth,
                overall_growth,
                trend,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        b.overall_growth
            .partial_cmp(&a.overall_growth)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.manufacturer.cmp(&b.manufacturer))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    MarketLeader { manufacturer: String, share: f64 },
    FastestGrowth { manufacturer: String, growth: f64 },
    MarketDecline { manufacturer: String, growth: f64 },
    NoData,
}

impl Insight {
    pub fn description(&self) -> String {
        match self {
            Insight::MarketLeader { manufacturer, share } => {
                format!("{} dominates with {:.2}% market share", manufacturer, share)
            }
            Insight::FastestGrowth { manufacturer, growth } => {
                format!("{} showing {:.1}% growth", manufacturer, growth)
            }
            Insight::MarketDecline { manufacturer, growth } => {
                format!("{} facing {:.1}% decline", manufacturer, growth.abs())
            }
            Insight::NoData => "No manufacturers meet the minimum market share threshold".to_string(),
        }
    }
}

/// Headline insights; a single `NoData` when neither table has rows.
/// `growth` must be sorted fastest first, as [`growth_analysis`] returns it.
pub fn insights(share: &[MarketShareEntry], growth: &[GrowthEntry]) -> Vec<Insight> {
    let mut out = Vec::new();
    if let Some(leader) = share.first() {
        out.push(Insight::MarketLeader {
            manufacturer: leader.manufacturer.clone(),
            share: leader.share,
        });
    }
    if let (Some(fast), Some(slow)) = (growth.first(), growth.last()) {
        out.push(Insight::FastestGrowth { manufacturer: fast.manufacturer.clone(), growth: fast.overall_growth });
        out.push(Insight::MarketDecline { manufacturer: slow.manufacturer.clone(), growth: slow.overall_growth });
    }
    if out.is_empty() {
        out.push(Insight::NoData);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub manufacturer: String,
    pub share: f64,
    pub rank: usize,
    pub growth: f64,
    pub market_average: f64,
    pub performance: Performance,
}

/// Compare one manufacturer's growth with the average of the growth table.
/// `None` when the manufacturer is missing from either table.
pub fn benchmark(company: &str, share: &[MarketShareEntry], growth: &[GrowthEntry]) -> Option<Benchmark> {
    let s = share.iter().find(|e| e.manufacturer == company)?;
    let g = growth.iter().find(|e| e.manufacturer == company)?;
    let market_average = average(&growth.iter().map(|e| e.overall_growth).collect::<Vec<_>>());
    Some(Benchmark {
        manufacturer: company.to_string(),
        share: s.share,
        rank: s.rank,
        growth: g.overall_growth,
        market_average,
        performance: if g.overall_growth > market_average { Performance::Above } else { Performance::Below },
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalShare {
    pub state: String,
    pub manufacturer: String,
    pub volume: u64,
    /// Classification of the first office seen for the pair.
    pub classification: RegionClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorAnalysis {
    pub total_market: u64,
    pub market_share: Vec<MarketShareEntry>,
    pub growth: Vec<GrowthEntry>,
    pub regional: Vec<RegionalShare>,
    pub fuel_competition: Vec<CrossTotal>,
    pub top_models: Vec<CrossTotal>,
    pub insights: Vec<Insight>,
}

/// Full competitor view for a record set; `NoData` when it is empty.
pub fn competitor_analysis(records: &[&VehicleRecord], min_share: Option<f64>) -> QueryOutcome<CompetitorAnalysis> {
    let min_share = min_share.unwrap_or(MIN_MARKET_SHARE_PCT);
    let share = match market_share(records, min_share) {
        QueryOutcome::Data(s) => s,
        QueryOutcome::NoData => return QueryOutcome::NoData,
    };
    let eligible: HashSet<String> = share.iter().map(|e| e.manufacturer.clone()).collect();
    let scoped: Vec<&VehicleRecord> = records
        .iter()
        .copied()
        .filter(|r| eligible.contains(&r.manufacturer))
        .collect();

    let mut first_class: HashMap<(String, String), RegionClass> = HashMap::new();
    for r in &scoped {
        first_class
            .entry((r.state_name.clone(), r.manufacturer.clone()))
            .or_insert(r.region_class);
    }
    let regional = cross_totals(&scoped, Dimension::State, Dimension::Manufacturer)
        .into_iter()
        .map(|ct| RegionalShare {
            classification: first_class
                .remove(&(ct.primary.clone(), ct.secondary.clone()))
                .unwrap_or_default(),
            state: ct.primary,
            manufacturer: ct.secondary,
            volume: ct.count,
        })
        .collect();

    let growth = growth_analysis(records, &eligible);
    let mut top_models = cross_totals(&scoped, Dimension::Manufacturer, Dimension::Model);
    top_models.truncate(TOP_MODELS);

    QueryOutcome::Data(CompetitorAnalysis {
        total_market: records.iter().map(|r| r.count).sum(),
        insights: insights(&share, &growth),
        fuel_competition: cross_totals(&scoped, Dimension::FuelType, Dimension::Manufacturer),
        market_share: share,
        growth,
        regional,
        top_models,
    })
}
