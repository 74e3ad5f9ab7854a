use crate::types::{RegionClass, VehicleRecord};
use crate::util::leading_digits;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Predicate set for narrowing a record collection. Every present condition
/// must hold (exact match); absent conditions pass everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub manufacturer: Option<String>,
    pub fuel_type: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub office: Option<String>,
    pub office_classification: Option<RegionClass>,
    pub month: Option<u32>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub engine_cc: Option<String>,
}

fn eq_opt(want: &Option<String>, got: &str) -> bool {
    want.as_deref().map_or(true, |w| w == got)
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manufacturer(mut self, v: impl Into<String>) -> Self {
        self.manufacturer = Some(v.into());
        self
    }

    pub fn fuel_type(mut self, v: impl Into<String>) -> Self {
        self.fuel_type = Some(v.into());
        self
    }

    pub fn state(mut self, v: impl Into<String>) -> Self {
        self.state = Some(v.into());
        self
    }

    pub fn city(mut self, v: impl Into<String>) -> Self {
        self.city = Some(v.into());
        self
    }

    pub fn office(mut self, v: impl Into<String>) -> Self {
        self.office = Some(v.into());
        self
    }

    pub fn office_classification(mut self, v: RegionClass) -> Self {
        self.office_classification = Some(v);
        self
    }

    pub fn month(mut self, v: u32) -> Self {
        self.month = Some(v);
        self
    }

    pub fn model(mut self, v: impl Into<String>) -> Self {
        self.model = Some(v.into());
        self
    }

    pub fn variant(mut self, v: impl Into<String>) -> Self {
        self.variant = Some(v.into());
        self
    }

    pub fn engine_cc(mut self, v: impl Into<String>) -> Self {
        self.engine_cc = Some(v.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterCriteria::default()
    }

    pub fn matches(&self, r: &VehicleRecord) -> bool {
        eq_opt(&self.manufacturer, &r.manufacturer)
            && eq_opt(&self.fuel_type, &r.fuel_type)
            && eq_opt(&self.state, &r.state_name)
            && eq_opt(&self.city, &r.city_name)
            && eq_opt(&self.office, &r.office_name)
            && self.office_classification.map_or(true, |c| c == r.region_class)
            && self.month.map_or(true, |m| m == r.sale_month)
            && eq_opt(&self.model, &r.model)
            && eq_opt(&self.variant, &r.variant)
            && eq_opt(&self.engine_cc, &r.engine_cc)
    }

    /// Matching records in their original order. The source is untouched.
    pub fn apply<'a>(&self, records: &'a [VehicleRecord]) -> Vec<&'a VehicleRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Short description of the active conditions, e.g. `KERALA, ELECTRIC segment`.
    pub fn context_label(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(s) = &self.state {
            parts.push(s.clone());
        }
        if let Some(f) = &self.fuel_type {
            parts.push(f.clone());
        }
        if let Some(cc) = &self.engine_cc {
            parts.push(format!("{}cc", cc));
        }
        if parts.is_empty() {
            "overall market".to_string()
        } else {
            format!("{} segment", parts.join(", "))
        }
    }
}

/// Distinct values per field, used to populate dependent filter menus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub manufacturers: Vec<String>,
    pub fuel_types: Vec<String>,
    pub engine_ccs: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
    pub offices: Vec<String>,
    pub models: Vec<String>,
    pub variants: Vec<String>,
    pub classifications: Vec<RegionClass>,
}

impl FilterOptions {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VehicleRecord>,
    {
        let mut manufacturers = BTreeSet::new();
        let mut fuel_types = BTreeSet::new();
        let mut engine_ccs = BTreeSet::new();
        let mut states = BTreeSet::new();
        let mut cities = BTreeSet::new();
        let mut offices = BTreeSet::new();
        let mut models = BTreeSet::new();
        let mut variants = BTreeSet::new();
        let mut classifications = BTreeSet::new();
        for r in records {
            manufacturers.insert(r.manufacturer.clone());
            fuel_types.insert(r.fuel_type.clone());
            if !r.engine_cc.is_empty() {
                engine_ccs.insert(r.engine_cc.clone());
            }
            states.insert(r.state_name.clone());
            cities.insert(r.city_name.clone());
            offices.insert(r.office_name.clone());
            models.insert(r.model.clone());
            variants.insert(r.variant.clone());
            classifications.insert(r.region_class);
        }
        let mut engine_ccs: Vec<String> = engine_ccs.into_iter().collect();
        engine_ccs.sort_by(|a, b| cmp_cc(a, b));
        FilterOptions {
            manufacturers: manufacturers.into_iter().collect(),
            fuel_types: fuel_types.into_iter().collect(),
            engine_ccs,
            states: states.into_iter().collect(),
            cities: cities.into_iter().collect(),
            offices: offices.into_iter().collect(),
            models: models.into_iter().collect(),
            variants: variants.into_iter().collect(),
            classifications: classifications.into_iter().collect(),
        }
    }
}

// Leading integer part, so "110.5" sorts as 110.
/// Numeric order when both values start with a number, text order otherwise.
fn cmp_cc(a: &str, b: &str) -> Ordering {
    match (leading_digits::<u64>(a), leading_digits::<u64>(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}
