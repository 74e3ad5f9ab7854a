//! Analytics core for monthly two-wheeler registration extracts: parsing,
//! office classification, filtering, aggregation, competition and
//! geographic views, and heuristic forecasts.
pub mod aggregate;
pub mod classifier;
pub mod competition;
pub mod config;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod geography;
pub mod loader;
pub mod output;
pub mod reports;
pub mod summary;
pub mod types;
pub mod util;

pub use aggregate::{breakdown, Breakdown, BreakdownEntry, BreakdownQuery};
pub use classifier::{Classification, RegionClassifier};
pub use config::{AppConfig, ForecastConfig};
pub use error::{ReportError, Result};
pub use filter::{FilterCriteria, FilterOptions};
pub use forecast::{forecast_volumes, ForecastReport, Period, SeriesPoint, VolumeForecast};
pub use loader::{load_dataset, parse_records, Dataset, DatasetCache, LoadReport};
pub use summary::{summarize, AggregatedSummary};
pub use types::{Dimension, GroupTotal, QueryOutcome, RegionClass, VehicleRecord};
