use crate::classifier::RegionClassifier;
use crate::config::AppConfig;
use crate::error::{ReportError, Result};
use crate::types::{VehicleRecord, COLUMN_COUNT};
use crate::util::{month_name, parse_u32_or_zero, parse_u64_or_zero};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub malformed_rows: usize,
    pub parse_errors: usize,
}

impl LoadReport {
    fn absorb(&mut self, other: &LoadReport) {
        self.total_rows += other.total_rows;
        self.loaded_rows += other.loaded_rows;
        self.malformed_rows += other.malformed_rows;
        self.parse_errors += other.parse_errors;
    }
}

/// Parse one extract. The header row is ignored and bad rows are dropped
/// rather than reported as errors.
pub fn parse_records(text: &str) -> (Vec<VehicleRecord>, LoadReport) {
    let classifier = RegionClassifier::new();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for result in rdr.records() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line = e.position().map(|p| p.line()), error = %e, "dropping unreadable row");
                report.parse_errors += 1;
                continue;
            }
        };
        // Whitespace-only lines come through as a single empty field.
        if row.iter().all(|f| f.is_empty()) {
            report.total_rows -= 1;
            continue;
        }
        if row.len() < COLUMN_COUNT {
            debug!(line = source_line(&row), fields = row.len(), "dropping short row");
            report.malformed_rows += 1;
            continue;
        }
        records.push(to_record(&row, &classifier));
    }

    report.loaded_rows = records.len();
    (records, report)
}

/// 1-based line of a row in the source text, counting skipped blank lines.
fn source_line(row: &StringRecord) -> Option<u64> {
    row.position().map(|p| p.line())
}

fn to_record(row: &StringRecord, classifier: &RegionClassifier) -> VehicleRecord {
    let field = |i: usize| row.get(i).unwrap_or("").to_string();
    let office_name = field(10);
    let city_name = field(11);
    let district_name = field(12);
    let state_name = field(14);
    let region_class = classifier
        .classify(&office_name, &city_name, &district_name, &state_name)
        .class;

    VehicleRecord {
        manufacturer: field(0),
        model: field(1),
        variant: field(2),
        count: parse_u64_or_zero(row.get(3).unwrap_or("")),
        fuel_type: field(4),
        engine_cc: field(5),
        vehicle_class: field(6),
        sale_month: parse_u32_or_zero(row.get(7).unwrap_or("")),
        sale_year: field(8),
        office_code: field(9),
        office_name,
        city_name,
        district_name,
        state_code: field(13),
        state_name,
        region_class,
    }
}

/// All loaded periods. `records` holds every period in ascending month
/// order and each period is a range into it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<VehicleRecord>,
    periods: BTreeMap<u32, Range<usize>>,
    report: LoadReport,
}

impl Dataset {
    /// Parse each `(month, text)` independently and combine the results.
    /// A month given twice keeps the later text.
    pub fn from_periods<'a, I>(periods: I) -> Self
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        let mut by_month: BTreeMap<u32, (Vec<VehicleRecord>, LoadReport)> = BTreeMap::new();
        for (month, text) in periods {
            let (records, report) = parse_records(text);
            info!(
                month = %month_name(month),
                rows = report.loaded_rows,
                dropped = report.malformed_rows + report.parse_errors,
                "parsed period"
            );
            if records.is_empty() {
                warn!(month = %month_name(month), "period contains no usable rows");
            }
            by_month.insert(month, (records, report));
        }

        let mut dataset = Dataset::default();
        for (month, (records, report)) in by_month {
            dataset.report.absorb(&report);
            let start = dataset.records.len();
            dataset.records.extend(records);
            dataset.periods.insert(month, start..dataset.records.len());
        }
        dataset
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    /// Records of one period, empty when the month was not loaded.
    pub fn by_month(&self, month: u32) -> &[VehicleRecord] {
        self.periods
            .get(&month)
            .map(|range| &self.records[range.clone()])
            .unwrap_or(&[])
    }

    pub fn available_months(&self) -> Vec<u32> {
        self.periods.keys().copied().collect()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_vehicles(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }
}

/// Source file for one month, e.g. `data/2W_April_2025.csv`.
pub fn month_file(data_dir: &Path, month: u32, year: i32) -> PathBuf {
    data_dir.join(format!("2W_{}_{}.csv", month_name(month), year))
}

/// Read every configured month, then parse. The first read error aborts the
/// whole load.
pub fn load_dataset(config: &AppConfig) -> Result<Dataset> {
    let mut texts: Vec<(u32, String)> = Vec::with_capacity(config.months.len());
    for &month in &config.months {
        let path = month_file(&config.data_dir, month, config.year);
        let text = std::fs::read_to_string(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "read period file");
        texts.push((month, text));
    }

    let dataset = Dataset::from_periods(texts.iter().map(|(m, t)| (*m, t.as_str())));
    info!(
        records = dataset.records().len(),
        vehicles = dataset.total_vehicles(),
        months = ?dataset.available_months(),
        "dataset loaded"
    );
    Ok(dataset)
}

/// Load-once holder for the dataset with an explicit reset.
#[derive(Debug, Default)]
pub struct DatasetCache {
    dataset: Option<Dataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(ReportError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    /// Run `load` only when nothing is cached. A failed load leaves the cache
    /// empty.
    pub fn get_or_load<F>(&mut self, load: F) -> Result<&Dataset>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        if self.dataset.is_none() {
            self.dataset = Some(load()?);
        }
        self.get()
    }

    pub fn reset(&mut self) {
        self.dataset = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionClass;

    const HEADER: &str = "Make,Model,Variant,Count,Fuel,CC,Class,Month,Year,RtoCode,RtoName,City,District,StateCode,State";

    #[test]
    fn maps_columns_positionally() {
        let text = format!(
            "{HEADER}\nHERO,SPLENDOR,\"SELF, DRUM\",12,PETROL,97.2,M-CYCLE,4,2025,MH12,PUNE RTO,PUNE,PUNE,MH,MAHARASHTRA\n"
        );
        let (records, report) = parse_records(&text);
        assert_eq!(report.loaded_rows, 1);
        let r = &records[0];
        assert_eq!(r.manufacturer, "HERO");
        assert_eq!(r.variant, "SELF, DRUM");
        assert_eq!(r.count, 12);
        assert_eq!(r.engine_cc, "97.2");
        assert_eq!(r.sale_month, 4);
        assert_eq!(r.sale_year, "2025");
        assert_eq!(r.office_code, "MH12");
        assert_eq!(r.state_code, "MH");
        assert_eq!(r.state_name, "MAHARASHTRA");
        assert_eq!(r.region_class, RegionClass::Metro);
    }

    #[test]
    fn drops_short_and_blank_rows() {
        let text = format!(
            "{HEADER}\n\n   \nHONDA,ACTIVA,STD,5\nTVS,JUPITER,STD,x,PETROL,110,SCOOTER,y,2025,KA19,MANGALORE RTO,MANGALURU,DAKSHINA KANNADA,KA,KARNATAKA\n"
        );
        let (records, report) = parse_records(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(report.malformed_rows, 1);
        let r = &records[0];
        assert_eq!(r.count, 0);
        assert_eq!(r.sale_month, 0);
        assert_eq!(r.region_class, RegionClass::Urban);
    }

    #[test]
    fn decimal_counts_and_months_keep_their_integer_part() {
        let text = format!("{HEADER}\nHERO,A,B,12.0,PETROL,100,C,4.0,2025,X1,X,VILLAGE,D,S,STATE\n");
        let (records, _) = parse_records(&text);
        assert_eq!(records[0].count, 12);
        assert_eq!(records[0].sale_month, 4);
    }

    #[test]
    fn row_lines_count_blank_lines() {
        let text = format!("{HEADER}\n\n\nHONDA,ACTIVA,STD,5\n");
        let mut rdr = ReaderBuilder::new().flexible(true).from_reader(text.as_bytes());
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(source_line(&row), Some(4));
    }

    #[test]
    fn dataset_keeps_periods_apart() {
        let april = format!("{HEADER}\nHERO,A,B,1,PETROL,100,C,4,2025,X1,X,VILLAGE,D,S,STATE\n");
        let may = format!(
            "{HEADER}\nHERO,A,B,2,PETROL,100,C,5,2025,X1,X,VILLAGE,D,S,STATE\nTVS,A,B,3,PETROL,100,C,5,2025,X1,X,VILLAGE,D,S,STATE\n"
        );
        let ds = Dataset::from_periods([(5, may.as_str()), (4, april.as_str())]);
        assert_eq!(ds.available_months(), vec![4, 5]);
        assert_eq!(ds.by_month(4).len(), 1);
        assert_eq!(ds.by_month(5).len(), 2);
        assert!(ds.by_month(6).is_empty());
        assert_eq!(ds.records().len(), 3);
        assert_eq!(ds.records()[0].sale_month, 4);
        assert!(std::ptr::eq(ds.by_month(5).as_ptr(), ds.records()[1..].as_ptr()));
        assert_eq!(ds.total_vehicles(), 6);
    }

    #[test]
    fn cache_only_loads_once() {
        let mut cache = DatasetCache::new();
        assert!(matches!(cache.get(), Err(ReportError::NotLoaded)));
        let mut calls = 0;
        cache.get_or_load(|| {
            calls += 1;
            Ok(Dataset::default())
        })
        .unwrap();
        cache.get_or_load(|| {
            calls += 1;
            Ok(Dataset::default())
        })
        .unwrap();
        assert_eq!(calls, 1);
        cache.reset();
        assert!(!cache.is_loaded());
    }

    #[test]
    fn failed_load_leaves_cache_empty() {
        let mut cache = DatasetCache::new();
        let res = cache.get_or_load(|| Err(ReportError::Config("boom".into())));
        assert!(res.is_err());
        assert!(!cache.is_loaded());
    }

    #[test]
    fn month_file_naming() {
        let p = month_file(Path::new("data"), 6, 2025);
        assert_eq!(p, Path::new("data").join("2W_June_2025.csv"));
    }
}
