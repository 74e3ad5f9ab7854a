//! Dashboard-wide summary with one typed table per dimension.
use crate::aggregate::{breakdown, distinct_count, grand_total, top_n, Breakdown, BreakdownEntry, BreakdownQuery};
use crate::types::{Dimension, GroupTotal, QueryOutcome, VehicleRecord};
use crate::util::month_name;
use serde::Serialize;
use std::collections::HashMap;

pub const NESTED_TOP: usize = 5;
pub const TOP_LIST: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturerSummary {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub top_models: Vec<GroupTotal>,
    pub fuel_distribution: Vec<GroupTotal>,
    pub state_distribution: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSummary {
    pub fuel: String,
    pub count: u64,
    pub percentage: f64,
    pub manufacturers: Vec<GroupTotal>,
    pub top_models: Vec<GroupTotal>,
    pub state_distribution: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub top_cities: Vec<GroupTotal>,
    pub top_manufacturers: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitySummary {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub state: String,
    pub top_manufacturers: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeSummary {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
    pub city: String,
    pub state: String,
    pub top_manufacturers: Vec<GroupTotal>,
    pub fuel_distribution: Vec<GroupTotal>,
    pub top_models: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub month: u32,
    pub month_name: String,
    pub count: u64,
    pub percentage: f64,
    pub top_manufacturers: Vec<GroupTotal>,
    pub top_fuel_types: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTotal {
    pub model: String,
    pub count: u64,
    /// Manufacturer of the first record seen for this model.
    pub manufacturer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    pub total_vehicles: u64,
    pub total_manufacturers: usize,
    pub total_states: usize,
    pub total_cities: usize,
    pub total_offices: usize,
    pub total_fuel_types: usize,
    pub manufacturers: Vec<ManufacturerSummary>,
    pub fuel_types: Vec<FuelSummary>,
    pub states: Vec<StateSummary>,
    pub cities: Vec<CitySummary>,
    pub offices: Vec<OfficeSummary>,
    pub top_models: Vec<ModelTotal>,
    pub top_cities: Vec<CitySummary>,
    pub monthly_trends: Vec<MonthSummary>,
}

fn entries(b: QueryOutcome<Breakdown>) -> Vec<BreakdownEntry> {
    b.data().map(|b| b.entries).unwrap_or_default()
}

fn nested(e: &BreakdownEntry, d: Dimension) -> Vec<GroupTotal> {
    e.secondary(d).to_vec()
}

/// Location attributes of the last record seen for each key.
fn last_seen<F>(records: &[&VehicleRecord], key: Dimension, attr: F) -> HashMap<String, String>
where
    F: Fn(&VehicleRecord) -> &str,
{
    let mut map = HashMap::new();
    for r in records {
        map.insert(key.key(r).into_owned(), attr(r).to_string());
    }
    map
}

/// Summary over `records`. An empty view is `NoData`.
pub fn summarize(records: &[&VehicleRecord]) -> QueryOutcome<AggregatedSummary> {
    if records.is_empty() {
        return QueryOutcome::NoData;
    }
    let top = Some(NESTED_TOP);

    let manufacturers = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::Manufacturer)
            .with_secondary(Dimension::Model, top)
            .with_secondary(Dimension::FuelType, None)
            .with_secondary(Dimension::State, top),
    ))
    .into_iter()
    .map(|e| ManufacturerSummary {
        top_models: nested(&e, Dimension::Model),
        fuel_distribution: nested(&e, Dimension::FuelType),
        state_distribution: nested(&e, Dimension::State),
        name: e.key,
        count: e.count,
        percentage: e.percentage,
    })
    .collect();

    let fuel_types = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::FuelType)
            .with_secondary(Dimension::Manufacturer, top)
            .with_secondary(Dimension::Model, top)
            .with_secondary(Dimension::State, top),
    ))
    .into_iter()
    .map(|e| FuelSummary {
        manufacturers: nested(&e, Dimension::Manufacturer),
        top_models: nested(&e, Dimension::Model),
        state_distribution: nested(&e, Dimension::State),
        fuel: e.key,
        count: e.count,
        percentage: e.percentage,
    })
    .collect();

    let states = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::State)
            .with_secondary(Dimension::City, top)
            .with_secondary(Dimension::Manufacturer, top),
    ))
    .into_iter()
    .map(|e| StateSummary {
        top_cities: nested(&e, Dimension::City),
        top_manufacturers: nested(&e, Dimension::Manufacturer),
        name: e.key,
        count: e.count,
        percentage: e.percentage,
    })
    .collect();

    let city_states = last_seen(records, Dimension::City, |r| r.state_name.as_str());
    let cities: Vec<CitySummary> = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::City).with_secondary(Dimension::Manufacturer, top),
    ))
    .into_iter()
    .map(|e| CitySummary {
        top_manufacturers: nested(&e, Dimension::Manufacturer),
        state: city_states.get(&e.key).cloned().unwrap_or_default(),
        name: e.key,
        count: e.count,
        percentage: e.percentage,
    })
    .collect();

    let office_cities = last_seen(records, Dimension::Office, |r| r.city_name.as_str());
    let office_states = last_seen(records, Dimension::Office, |r| r.state_name.as_str());
    let offices = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::Office)
            .with_secondary(Dimension::Manufacturer, top)
            .with_secondary(Dimension::FuelType, None)
            .with_secondary(Dimension::Model, top),
    ))
    .into_iter()
    .map(|e| OfficeSummary {
        top_manufacturers: nested(&e, Dimension::Manufacturer),
        fuel_distribution: nested(&e, Dimension::FuelType),
        top_models: nested(&e, Dimension::Model),
        city: office_cities.get(&e.key).cloned().unwrap_or_default(),
        state: office_states.get(&e.key).cloned().unwrap_or_default(),
        name: e.key,
        count: e.count,
        percentage: e.percentage,
    })
    .collect();

    let mut monthly_trends: Vec<MonthSummary> = entries(breakdown(
        records,
        &BreakdownQuery::new(Dimension::Month)
            .with_secondary(Dimension::Manufacturer, top)
            .with_secondary(Dimension::FuelType, top),
    ))
    .into_iter()
    .map(|e| {
        let month = e.key.parse::<u32>().unwrap_or(0);
        MonthSummary {
            month,
            month_name: month_name(month),
            count: e.count,
            percentage: e.percentage,
            top_manufacturers: nested(&e, Dimension::Manufacturer),
            top_fuel_types: nested(&e, Dimension::FuelType),
        }
    })
    .collect();
    monthly_trends.sort_by_key(|m| m.month);

    let top_cities = cities.iter().take(TOP_LIST).cloned().collect();

    QueryOutcome::Data(AggregatedSummary {
        total_vehicles: grand_total(records),
        total_manufacturers: distinct_count(records, Dimension::Manufacturer),
        total_states: distinct_count(records, Dimension::State),
        total_cities: distinct_count(records, Dimension::City),
        total_offices: distinct_count(records, Dimension::Office),
        total_fuel_types: distinct_count(records, Dimension::FuelType),
        manufacturers,
        fuel_types,
        states,
        cities,
        offices,
        top_models: top_models(records, TOP_LIST),
        top_cities,
        monthly_trends,
    })
}

/// Models across all manufacturers, largest first.
pub fn top_models(records: &[&VehicleRecord], limit: usize) -> Vec<ModelTotal> {
    let mut makers: HashMap<&str, &str> = HashMap::new();
    for r in records {
        makers.entry(r.model.as_str()).or_insert(r.manufacturer.as_str());
    }
    top_n(records, Dimension::Model, Some(limit))
        .into_iter()
        .map(|g| ModelTotal {
            manufacturer: makers.get(g.key.as_str()).map(|m| m.to_string()).unwrap_or_default(),
            model: g.key,
            count: g.count,
        })
        .collect()
}
