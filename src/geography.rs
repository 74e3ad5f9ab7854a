//! Office-level (RTO) profiles for the geographic view.
use crate::aggregate::{group_totals, grand_total};
use crate::types::{Dimension, GroupTotal, QueryOutcome, RegionClass, VehicleRecord};
use crate::util::percentage;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeProfile {
    pub name: String,
    pub state: String,
    pub classification: RegionClass,
    pub sales: u64,
    pub percentage: f64,
    pub manufacturer_count: usize,
    pub fuel_type_count: usize,
    pub model_count: usize,
    pub manufacturer_breakdown: Vec<GroupTotal>,
    pub fuel_breakdown: Vec<GroupTotal>,
    pub model_breakdown: Vec<GroupTotal>,
    pub top_manufacturer: String,
    pub dominant_fuel: String,
}

/// One profile per office name, best selling first. An office takes the
/// state and classification of its first record.
pub fn office_profiles(records: &[&VehicleRecord]) -> QueryOutcome<Vec<OfficeProfile>> {
    if records.is_empty() {
        return QueryOutcome::NoData;
    }
    let total = grand_total(records);

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&VehicleRecord>> = HashMap::new();
    for r in records {
        let members = groups.entry(r.office_name.as_str()).or_insert_with(|| {
            order.push(r.office_name.as_str());
            Vec::new()
        });
        members.push(*r);
    }

    let mut profiles: Vec<OfficeProfile> = order
        .into_iter()
        .filter_map(|name| groups.get(name).map(|m| (name, m)))
        .map(|(name, members)| {
            let first = members[0];
            let sales = grand_total(members);
            let manufacturer_breakdown = group_totals(members, Dimension::Manufacturer);
            let fuel_breakdown = group_totals(members, Dimension::FuelType);
            let model_breakdown = group_totals(members, Dimension::Model);
            OfficeProfile {
                name: name.to_string(),
                state: first.state_name.clone(),
                classification: first.region_class,
                sales,
                percentage: percentage(sales, total),
                manufacturer_count: manufacturer_breakdown.len(),
                fuel_type_count: fuel_breakdown.len(),
                model_count: model_breakdown.len(),
                top_manufacturer: leading_key(&manufacturer_breakdown),
                dominant_fuel: leading_key(&fuel_breakdown),
                manufacturer_breakdown,
                fuel_breakdown,
                model_breakdown,
            }
        })
        .collect();
    profiles.sort_by(|a, b| b.sales.cmp(&a.sales).then_with(|| a.name.cmp(&b.name)));
    QueryOutcome::Data(profiles)
}

fn leading_key(groups: &[GroupTotal]) -> String {
    groups
        .first()
        .map(|g| g.key.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionalOverview {
    pub total_sales: u64,
    pub total_offices: usize,
    /// Rounded mean sales per office.
    pub average_per_office: u64,
    pub by_classification: BTreeMap<RegionClass, u64>,
}

pub fn regional_overview(profiles: &[OfficeProfile]) -> RegionalOverview {
    let total_sales: u64 = profiles.iter().map(|p| p.sales).sum();
    let mut by_classification = BTreeMap::new();
    for p in profiles {
        *by_classification.entry(p.classification).or_insert(0) += p.sales;
    }
    let average_per_office = if profiles.is_empty() {
        0
    } else {
        (total_sales as f64 / profiles.len() as f64).round() as u64
    };
    RegionalOverview {
        total_sales,
        total_offices: profiles.len(),
        average_per_office,
        by_classification,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateTier {
    #[serde(rename = "Tier-1 States")]
    Tier1,
    #[serde(rename = "Tier-2 States")]
    Tier2,
    #[serde(rename = "Tier-3 States")]
    Tier3,
}

const TIER_1_STATES: &[&str] = &[
    "MAHARASHTRA", "TAMIL NADU", "KARNATAKA", "GUJARAT", "HARYANA",
    "PUNJAB", "KERALA", "DELHI", "GOA",
];
const TIER_2_STATES: &[&str] = &[
    "UTTAR PRADESH", "WEST BENGAL", "RAJASTHAN", "MADHYA PRADESH",
    "ANDHRA PRADESH", "TELANGANA", "ODISHA", "JHARKHAND",
];
const TIER_3_STATES: &[&str] = &[
    "BIHAR", "ASSAM", "CHHATTISGARH", "HIMACHAL PRADESH",
    "UTTARAKHAND", "TRIPURA", "MEGHALAYA", "MANIPUR",
    "NAGALAND", "MIZORAM", "ARUNACHAL PRADESH", "SIKKIM",
];

/// Economic development tier of a state, by exact (normalised) name.
pub fn state_tier(state: &str) -> Option<StateTier> {
    let s = state.trim().to_uppercase();
    let s = s.as_str();
    if TIER_1_STATES.contains(&s) {
        Some(StateTier::Tier1)
    } else if TIER_2_STATES.contains(&s) {
        Some(StateTier::Tier2)
    } else if TIER_3_STATES.contains(&s) {
        Some(StateTier::Tier3)
    } else {
        None
    }
}
