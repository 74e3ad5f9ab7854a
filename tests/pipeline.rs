use assert_matches::assert_matches;
use std::fs;
use two_wheeler_report::aggregate::{grand_total, group_totals, view};
use two_wheeler_report::competition::competitor_analysis;
use two_wheeler_report::forecast::forecast_report;
use two_wheeler_report::geography::office_profiles;
use two_wheeler_report::loader::month_file;
use two_wheeler_report::{
    breakdown, load_dataset, parse_records, summarize, AppConfig, BreakdownQuery, Dataset, Dimension,
    FilterCriteria, QueryOutcome, RegionClass, ReportError,
};

const HEADER: &str = "Make,Model,Variant,Count,Fuel,CC,Class,Month,Year,RtoCode,RtoName,City,District,StateCode,State";

const MAKES: [&str; 4] = ["HERO", "HONDA", "TVS", "BAJAJ"];
const FUELS: [&str; 2] = ["PETROL", "ELECTRIC"];
const OFFICES: [(&str, &str, &str); 3] = [
    ("PUNE RTO", "PUNE", "MAHARASHTRA"),
    ("MANGALORE RTO", "MANGALURU", "KARNATAKA"),
    ("SIRSI RTO", "SIRSI", "KARNATAKA"),
];

fn month_text(month: u32, rows: usize) -> String {
    let mut text = String::from(HEADER);
    for i in 0..rows {
        let make = MAKES[i % MAKES.len()];
        let fuel = FUELS[i % FUELS.len()];
        let (office, city, state) = OFFICES[i % OFFICES.len()];
        let count = 10 + (i as u64 * 7 + month as u64 * 3) % 90;
        text.push_str(&format!(
            "\n{make},{make}-M{},STD,{count},{fuel},110,SCOOTER,{month},2025,C{i},{office},{city},{city},XX,{state}",
            i % 3
        ));
    }
    text.push('\n');
    text
}

fn dataset() -> Dataset {
    let texts: Vec<(u32, String)> = (4..=7).map(|m| (m, month_text(m, 24 + m as usize))).collect();
    Dataset::from_periods(texts.iter().map(|(m, t)| (*m, t.as_str())))
}

#[test]
fn every_well_formed_row_becomes_a_record() {
    let text = month_text(4, 37);
    let (records, report) = parse_records(&text);
    assert_eq!(records.len(), 37);
    assert_eq!(report.loaded_rows, 37);
    assert_eq!(report.malformed_rows, 0);
    assert_eq!(records[5].office_code, "C5");
    assert_eq!(records[5].manufacturer, MAKES[5 % 4]);
}

#[test]
fn group_totals_partition_the_grand_total() {
    let ds = dataset();
    let records = view(ds.records());
    let total = grand_total(&records);
    for dim in [Dimension::Manufacturer, Dimension::FuelType, Dimension::Office, Dimension::Month] {
        let sum: u64 = group_totals(&records, dim).iter().map(|g| g.count).sum();
        assert_eq!(sum, total, "{dim}");
    }
    let b = breakdown(&records, &BreakdownQuery::new(Dimension::State)).data().unwrap();
    let pct: f64 = b.entries.iter().map(|e| e.percentage).sum();
    assert!((pct - 100.0).abs() < 1e-6);
    let ranks: Vec<usize> = b.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, (1..=b.entries.len()).collect::<Vec<_>>());
}

#[test]
fn filtered_view_is_a_subset() {
    let ds = dataset();
    let hero = FilterCriteria::new().manufacturer("HERO").apply(ds.records());
    assert!(!hero.is_empty());
    assert!(hero.iter().all(|r| r.manufacturer == "HERO"));
    assert!(grand_total(&hero) < ds.total_vehicles());
    let metro = FilterCriteria::new()
        .office_classification(RegionClass::Metro)
        .apply(ds.records());
    assert!(metro.iter().all(|r| r.office_name == "PUNE RTO"));
}

#[test]
fn offices_are_classified_at_load() {
    let ds = dataset();
    let records = view(ds.records());
    let profiles = office_profiles(&records).data().unwrap();
    let class_of = |name: &str| profiles.iter().find(|p| p.name == name).map(|p| p.classification);
    assert_eq!(class_of("PUNE RTO"), Some(RegionClass::Metro));
    assert_eq!(class_of("MANGALORE RTO"), Some(RegionClass::Urban));
    assert_eq!(class_of("SIRSI RTO"), Some(RegionClass::Rural));
}

#[test]
fn empty_selection_is_no_data() {
    let ds = dataset();
    let none = FilterCriteria::new().manufacturer("ROYAL ENFIELD").apply(ds.records());
    assert_matches!(summarize(&none), QueryOutcome::NoData);
    assert_matches!(competitor_analysis(&none, None), QueryOutcome::NoData);
    assert_matches!(breakdown(&none, &BreakdownQuery::new(Dimension::Model)), QueryOutcome::NoData);
    assert_matches!(forecast_report(&none, 3, 2025, &Default::default()), QueryOutcome::NoData);
}

#[test]
fn forecast_runs_over_loaded_months() {
    let ds = dataset();
    let records = view(ds.records());
    let report = forecast_report(&records, 3, 2025, &Default::default()).data().unwrap();
    assert_eq!(report.historical.len(), 4);
    let periods: Vec<&str> = report.volume_forecasts.iter().map(|f| f.period.as_str()).collect();
    assert_eq!(periods, vec!["Aug 2025", "Sep 2025", "Oct 2025"]);
    assert!(report.volume_forecasts.windows(2).all(|w| w[0].confidence >= w[1].confidence));
}

#[test]
fn loads_monthly_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    for m in [4, 5] {
        fs::write(month_file(dir.path(), m, 2025), month_text(m, 10)).unwrap();
    }
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        months: vec![4, 5],
        ..AppConfig::default()
    };
    let ds = load_dataset(&config).unwrap();
    assert_eq!(ds.available_months(), vec![4, 5]);
    assert_eq!(ds.records().len(), 20);
    assert_eq!(ds.report().loaded_rows, 20);
}

#[test]
fn missing_month_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(month_file(dir.path(), 4, 2025), month_text(4, 3)).unwrap();
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        months: vec![4, 6],
        ..AppConfig::default()
    };
    assert_matches!(load_dataset(&config), Err(ReportError::Io { path, .. }) if path.ends_with("2W_June_2025.csv"));
}
