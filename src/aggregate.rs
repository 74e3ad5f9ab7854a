//! Grouped totals, shares and rankings over record views.
//!
//! Every function takes a slice of record references (the output of a
//! filter, or [`view`] over a whole dataset) and recomputes from scratch.
use crate::types::{Dimension, GroupTotal, QueryOutcome, VehicleRecord};
use crate::util::percentage;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Borrow every record of a collection.
pub fn view(records: &[VehicleRecord]) -> Vec<&VehicleRecord> {
    records.iter().collect()
}

pub fn grand_total(records: &[&VehicleRecord]) -> u64 {
    records.iter().map(|r| r.count).sum()
}

fn by_count_desc(a: &GroupTotal, b: &GroupTotal) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key))
}

/// Summed counts per key, largest first (ties by key).
pub fn group_totals(records: &[&VehicleRecord], dimension: Dimension) -> Vec<GroupTotal> {
    let mut map: HashMap<String, u64> = HashMap::new();
    for r in records {
        *map.entry(dimension.key(r).into_owned()).or_insert(0) += r.count;
    }
    let mut out: Vec<GroupTotal> = map
        .into_iter()
        .map(|(key, count)| GroupTotal { key, count })
        .collect();
    out.sort_by(by_count_desc);
    out
}

/// [`group_totals`] truncated to `limit` entries when given.
pub fn top_n(records: &[&VehicleRecord], dimension: Dimension, limit: Option<usize>) -> Vec<GroupTotal> {
    let mut out = group_totals(records, dimension);
    if let Some(n) = limit {
        out.truncate(n);
    }
    out
}

/// Number of distinct keys along a dimension.
pub fn distinct_count(records: &[&VehicleRecord], dimension: Dimension) -> usize {
    let mut seen: std::collections::HashSet<std::borrow::Cow<'_, str>> = Default::default();
    for r in records {
        seen.insert(dimension.key(r));
    }
    seen.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SecondarySpec {
    pub dimension: Dimension,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownQuery {
    pub dimension: Dimension,
    /// Groups below this share of the grand total (in percent) are dropped
    /// before ranking.
    pub min_share: Option<f64>,
    pub secondary: Vec<SecondarySpec>,
}

impl BreakdownQuery {
    pub fn new(dimension: Dimension) -> Self {
        Self { dimension, min_share: None, secondary: Vec::new() }
    }

    pub fn min_share(mut self, pct: f64) -> Self {
        self.min_share = Some(pct);
        self
    }

    pub fn with_secondary(mut self, dimension: Dimension, limit: Option<usize>) -> Self {
        self.secondary.push(SecondarySpec { dimension, limit });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecondaryBreakdown {
    pub dimension: Dimension,
    pub groups: Vec<GroupTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    pub rank: usize,
    pub key: String,
    pub count: u64,
    pub percentage: f64,
    pub secondary: Vec<SecondaryBreakdown>,
}

impl BreakdownEntry {
    /// Nested groups for `dimension`, empty when it was not requested.
    pub fn secondary(&self, dimension: Dimension) -> &[GroupTotal] {
        self.secondary
            .iter()
            .find(|s| s.dimension == dimension)
            .map(|s| s.groups.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub dimension: Dimension,
    pub grand_total: u64,
    pub entries: Vec<BreakdownEntry>,
}

struct Acc<'a> {
    count: u64,
    members: Vec<&'a VehicleRecord>,
}

/// Ranked breakdown along `query.dimension`, or `NoData` for an empty view.
pub fn breakdown(records: &[&VehicleRecord], query: &BreakdownQuery) -> QueryOutcome<Breakdown> {
    if records.is_empty() {
        return QueryOutcome::NoData;
    }
    let grand_total = grand_total(records);

    let mut map: HashMap<String, Acc<'_>> = HashMap::new();
    for r in records {
        let e = map
            .entry(query.dimension.key(r).into_owned())
            .or_insert_with(|| Acc { count: 0, members: Vec::new() });
        e.count += r.count;
        if !query.secondary.is_empty() {
            e.members.push(*r);
        }
    }

    let mut groups: Vec<(String, Acc<'_>)> = map
        .into_iter()
        .filter(|(_, acc)| match query.min_share {
            Some(min) => percentage(acc.count, grand_total) >= min,
            None => true,
        })
        .collect();
    groups.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

    let entries = groups
        .into_iter()
        .enumerate()
        .map(|(idx, (key, acc))| {
            let secondary = query
                .secondary
                .iter()
                .map(|spec| SecondaryBreakdown {
                    dimension: spec.dimension,
                    groups: top_n(&acc.members, spec.dimension, spec.limit),
                })
                .collect();
            BreakdownEntry {
                rank: idx + 1,
                percentage: percentage(acc.count, grand_total),
                key,
                count: acc.count,
                secondary,
            }
        })
        .collect();

    QueryOutcome::Data(Breakdown { dimension: query.dimension, grand_total, entries })
}

/// Total for one `(primary, secondary)` key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTotal {
    pub primary: String,
    pub secondary: String,
    pub count: u64,
}

/// Totals over the composite key `primary × secondary`, largest first.
pub fn cross_totals(records: &[&VehicleRecord], primary: Dimension, secondary: Dimension) -> Vec<CrossTotal> {
    let mut map: HashMap<(String, String), u64> = HashMap::new();
    for r in records {
        let key = (primary.key(r).into_owned(), secondary.key(r).into_owned());
        *map.entry(key).or_insert(0) += r.count;
    }
    let mut out: Vec<CrossTotal> = map
        .into_iter()
        .map(|((p, s), count)| CrossTotal { primary: p, secondary: s, count })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.primary.cmp(&b.primary))
            .then_with(|| a.secondary.cmp(&b.secondary))
    });
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthVolume {
    pub month: u32,
    pub volume: u64,
}

/// Monthly volumes of one entity, ascending by month. Months with no
/// records are absent rather than zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitySeries {
    pub key: String,
    pub points: Vec<MonthVolume>,
}

impl EntitySeries {
    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume as f64).collect()
    }

    pub fn volume_in(&self, month: u32) -> Option<u64> {
        self.points.iter().find(|p| p.month == month).map(|p| p.volume)
    }
}

/// Per-entity monthly series, built from the `dimension × month` cross
/// totals. Output is ordered by entity key.
pub fn series_by(records: &[&VehicleRecord], dimension: Dimension) -> Vec<EntitySeries> {
    let mut by_key: HashMap<String, Vec<MonthVolume>> = HashMap::new();
    for ct in cross_totals(records, dimension, Dimension::Month) {
        let month = ct.secondary.parse::<u32>().unwrap_or(0);
        by_key
            .entry(ct.primary)
            .or_default()
            .push(MonthVolume { month, volume: ct.count });
    }
    let mut out: Vec<EntitySeries> = by_key
        .into_iter()
        .map(|(key, mut points)| {
            points.sort_by_key(|p| p.month);
            EntitySeries { key, points }
        })
        .collect();
    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}

/// Total volume per month, ascending by month.
pub fn monthly_totals(records: &[&VehicleRecord]) -> Vec<MonthVolume> {
    let mut map: HashMap<u32, u64> = HashMap::new();
    for r in records {
        *map.entry(r.sale_month).or_insert(0) += r.count;
    }
    let mut out: Vec<MonthVolume> = map
        .into_iter()
        .map(|(month, volume)| MonthVolume { month, volume })
        .collect();
    out.sort_by_key(|p| p.month);
    out
}
