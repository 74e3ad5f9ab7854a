use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tabled::Tabled;

/// Number of positional columns in a registration extract row.
pub const COLUMN_COUNT: usize = 15;

/// Regional tier of the office a vehicle was registered at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RegionClass {
    Metro,
    Urban,
    #[default]
    Rural,
}

impl RegionClass {
    pub const ALL: [RegionClass; 3] = [RegionClass::Metro, RegionClass::Urban, RegionClass::Rural];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionClass::Metro => "Metro",
            RegionClass::Urban => "Urban",
            RegionClass::Rural => "Rural",
        }
    }

    pub fn tier(&self) -> &'static str {
        match self {
            RegionClass::Metro => "Tier-1",
            RegionClass::Urban => "Tier-2",
            RegionClass::Rural => "Tier-3/Rural",
        }
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a registration extract. Rows are pre-aggregated by the source,
/// so `count` is the number of vehicles the row stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub manufacturer: String,
    pub model: String,
    pub variant: String,
    pub count: u64,
    pub fuel_type: String,
    pub engine_cc: String,
    pub vehicle_class: String,
    pub sale_month: u32,
    pub sale_year: String,
    pub office_code: String,
    pub office_name: String,
    pub city_name: String,
    pub district_name: String,
    pub state_code: String,
    pub state_name: String,
    pub region_class: RegionClass,
}

/// A grouping axis for the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Manufacturer,
    Model,
    Variant,
    FuelType,
    EngineCc,
    State,
    City,
    District,
    Office,
    Month,
    RegionClass,
}

impl Dimension {
    /// Grouping key of `record` along this dimension.
    pub fn key<'a>(&self, record: &'a VehicleRecord) -> Cow<'a, str> {
        match self {
            Dimension::Manufacturer => Cow::Borrowed(&record.manufacturer),
            Dimension::Model => Cow::Borrowed(&record.model),
            Dimension::Variant => Cow::Borrowed(&record.variant),
            Dimension::FuelType => Cow::Borrowed(&record.fuel_type),
            Dimension::EngineCc => Cow::Borrowed(&record.engine_cc),
            Dimension::State => Cow::Borrowed(&record.state_name),
            Dimension::City => Cow::Borrowed(&record.city_name),
            Dimension::District => Cow::Borrowed(&record.district_name),
            Dimension::Office => Cow::Borrowed(&record.office_name),
            Dimension::Month => Cow::Owned(record.sale_month.to_string()),
            Dimension::RegionClass => Cow::Borrowed(record.region_class.as_str()),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Manufacturer => "manufacturer",
            Dimension::Model => "model",
            Dimension::Variant => "variant",
            Dimension::FuelType => "fuel_type",
            Dimension::EngineCc => "engine_cc",
            Dimension::State => "state",
            Dimension::City => "city",
            Dimension::District => "district",
            Dimension::Office => "office",
            Dimension::Month => "month",
            Dimension::RegionClass => "region_class",
        };
        f.write_str(s)
    }
}

/// Summed volume for one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotal {
    pub key: String,
    pub count: u64,
}

/// Result of a query over a possibly filtered record set.
///
/// `NoData` means nothing matched; it is never used for a set whose
/// totals merely sum to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum QueryOutcome<T> {
    NoData,
    Data(T),
}

impl<T> QueryOutcome<T> {
    pub fn is_no_data(&self) -> bool {
        matches!(self, QueryOutcome::NoData)
    }

    pub fn data(self) -> Option<T> {
        match self {
            QueryOutcome::Data(v) => Some(v),
            QueryOutcome::NoData => None,
        }
    }

    pub fn as_ref(&self) -> QueryOutcome<&T> {
        match self {
            QueryOutcome::Data(v) => QueryOutcome::Data(v),
            QueryOutcome::NoData => QueryOutcome::NoData,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> QueryOutcome<U> {
        match self {
            QueryOutcome::Data(v) => QueryOutcome::Data(f(v)),
            QueryOutcome::NoData => QueryOutcome::NoData,
        }
    }
}

// Console/CSV report rows. Numbers are pre-formatted strings so the CSV
// export and the markdown preview render the same text.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ManufacturerRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Manufacturer")]
    #[tabled(rename = "Manufacturer")]
    pub manufacturer: String,
    #[serde(rename = "Volume")]
    #[tabled(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "MarketShare")]
    #[tabled(rename = "MarketShare")]
    pub market_share: String,
    #[serde(rename = "TopModel")]
    #[tabled(rename = "TopModel")]
    pub top_model: String,
    #[serde(rename = "TopState")]
    #[tabled(rename = "TopState")]
    pub top_state: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OfficeRow {
    #[serde(rename = "Office")]
    #[tabled(rename = "Office")]
    pub office: String,
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "Classification")]
    #[tabled(rename = "Classification")]
    pub classification: String,
    #[serde(rename = "Sales")]
    #[tabled(rename = "Sales")]
    pub sales: String,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
    #[serde(rename = "TopManufacturer")]
    #[tabled(rename = "TopManufacturer")]
    pub top_manufacturer: String,
    #[serde(rename = "DominantFuel")]
    #[tabled(rename = "DominantFuel")]
    pub dominant_fuel: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTrendRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "Volume")]
    #[tabled(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
    #[serde(rename = "TopManufacturer")]
    #[tabled(rename = "TopManufacturer")]
    pub top_manufacturer: String,
    #[serde(rename = "TopFuel")]
    #[tabled(rename = "TopFuel")]
    pub top_fuel: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ForecastRow {
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "Volume")]
    #[tabled(rename = "Volume")]
    pub volume: String,
    #[serde(rename = "Confidence")]
    #[tabled(rename = "Confidence")]
    pub confidence: String,
}
