// Console shell over the analytics library.
//
// - Option [1] loads the configured monthly extracts and prints diagnostics.
// - Option [2] builds the report tables, exports them and prints previews.
// - Option [3] drops the cached data so the next load rereads the files.
use std::io::{self, Write};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use two_wheeler_report::aggregate::view;
use two_wheeler_report::competition::competitor_analysis;
use two_wheeler_report::forecast::forecast_report;
use two_wheeler_report::geography::office_profiles;
use two_wheeler_report::util::{format_int, month_name};
use two_wheeler_report::{load_dataset, output, reports, summarize, AppConfig, DatasetCache, Result};

const PREVIEW_ROWS: usize = 5;

/// Read one menu selection after the shared "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask whether to return to the menu once the reports are written.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Option [1]: load the configured months once and print what was kept.
fn handle_load(cache: &mut DatasetCache, config: &AppConfig) {
    match cache.get_or_load(|| load_dataset(config)) {
        Ok(dataset) => {
            let report = dataset.report();
            let months: Vec<String> = dataset.available_months().into_iter().map(month_name).collect();
            println!(
                "Processing dataset... ({} rows loaded for {})",
                format_int(report.loaded_rows),
                months.join(", ")
            );
            println!(
                "Note: {} rows skipped ({} malformed, {} unparsable).",
                format_int(report.malformed_rows + report.parse_errors),
                format_int(report.malformed_rows),
                format_int(report.parse_errors)
            );
            println!("Total registrations: {}\n", format_int(dataset.total_vehicles()));
        }
        Err(e) => eprintln!("Failed to load data: {}\n", e),
    }
}

/// Option [2]: export every report table plus `summary.json` and print a
/// markdown preview of each.
fn handle_generate_reports(cache: &DatasetCache, config: &AppConfig) -> Result<()> {
    let dataset = cache.get()?;
    let records = view(dataset.records());

    println!("Generating reports...");
    println!("Outputs saved to {}\n", config.output_dir.display());
    output::ensure_dir(&config.output_dir)?;

    let (Some(summary), Some(forecast)) = (
        summarize(&records).data(),
        forecast_report(&records, config.forecast_horizon, config.year, &config.forecast).data(),
    ) else {
        println!("(no registrations in the loaded files)\n");
        return Ok(());
    };
    let offices = office_profiles(&records).data().unwrap_or_default();
    let insights = competitor_analysis(&records, None)
        .data()
        .map(|c| c.insights)
        .unwrap_or_default();

    let r1 = reports::manufacturer_rows(&summary.manufacturers);
    let file1 = config.output_dir.join("report1_manufacturer_ranking.csv");
    output::write_csv(&file1, &r1)?;
    output::preview_table("Manufacturer Market Ranking", Some("by registered volume"), &r1, PREVIEW_ROWS);
    println!("(Full table exported to {})\n", file1.display());

    let r2 = reports::office_rows(&offices);
    let file2 = config.output_dir.join("report2_office_performance.csv");
    output::write_csv(&file2, &r2)?;
    output::preview_table("Top Registering Offices", Some("RTO level, Metro / Urban / Rural"), &r2, PREVIEW_ROWS);
    println!("(Full table exported to {})\n", file2.display());

    let r3 = reports::monthly_rows(&summary.monthly_trends);
    let file3 = config.output_dir.join("report3_monthly_trends.csv");
    output::write_csv(&file3, &r3)?;
    output::preview_table("Monthly Registration Trends", None, &r3, 12);
    println!("(Full table exported to {})\n", file3.display());

    let r4 = reports::forecast_rows(&forecast.volume_forecasts);
    let file4 = config.output_dir.join("report4_volume_forecast.csv");
    output::write_csv(&file4, &r4)?;
    let note = format!("next {} months", config.forecast_horizon);
    output::preview_table("Volume Forecast", Some(&note), &r4, config.forecast_horizon);
    println!("(Full table exported to {})\n", file4.display());

    let stats = reports::report_summary(&summary, &offices, &forecast, &insights);
    let summary_path = config.output_dir.join("summary.json");
    output::write_json(&summary_path, &stats)?;
    println!("Summary Stats ({}):", summary_path.display());
    for line in &stats.insights {
        println!("- {}", line);
    }
    println!();
    Ok(())
}

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "two_wheeler_report=info".into()))
        .with(fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let mut cache = DatasetCache::new();

    loop {
        println!("Two-Wheeler Registration Reports:");
        println!("[1] Load the files");
        println!("[2] Generate Reports");
        println!("[3] Reload on next load\n");
        match read_choice().as_str() {
            "1" => handle_load(&mut cache, &config),
            "2" => {
                println!();
                if let Err(e) = handle_generate_reports(&cache, &config) {
                    eprintln!("Error: {}\n", e);
                    continue;
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                cache.reset();
                println!("Cached data cleared.\n");
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
