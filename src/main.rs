// Entry point and interactive menu.
//
// - Option [1] loads and validates the configured CSV file.
// - Option [2] changes the year / month / package filters.
// - Option [3] prints the dashboard reports and writes a JSON summary.
// - Option [4] exports the filtered table as CSV.
// - Options [5] and [6] reset filters or drop the loaded data.
use anyhow::Result;
use sales_dashboard::config::{load_config, Config};
use sales_dashboard::filter::{unknown_labels, ALL_LABEL};
use sales_dashboard::{loader, output, reports, util};
use sales_dashboard::{FilterState, Month, SchemaKind, Selection, SessionContext};
use std::io::{self, Write};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Read a single trimmed line after printing `prompt`. `None` at end of
/// input.
fn try_read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn read_line(prompt: &str) -> String {
    try_read_line(prompt).unwrap_or_default()
}

/// Split a comma-separated answer into labels. An empty answer keeps
/// "All".
fn read_labels(prompt: &str) -> Vec<String> {
    read_line(prompt)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Handle option [1]: load the configured file into the session.
///
/// A rejected upload leaves any previously loaded table in place.
fn handle_load(session: &mut SessionContext, config: &Config, kind: SchemaKind) {
    let path = config.data_path();
    match loader::load_csv(&path, kind) {
        Ok((table, report)) => {
            println!(
                "Processing dataset... ({} rows loaded, years: {:?})",
                util::format_int(report.total_rows as u64),
                report.years
            );
            if report.filled_cells > 0 {
                println!(
                    "Info: filled {} blank numeric cells with 0.",
                    util::format_int(report.filled_cells as u64)
                );
            }
            println!();
            session.load(table, Some(path));
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: prompt for each filter dimension.
fn handle_filters(session: &mut SessionContext) {
    if !session.is_loaded() {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    }
    let universe = session.universe();
    println!("Available years: {:?}", universe.years);
    let year = read_line("Year (blank keeps current): ");
    if !year.is_empty() {
        match year.parse::<i32>() {
            Ok(y) if (1000..=9999).contains(&y) => session.set_year(Some(y)),
            _ => println!("Invalid year {:?}, keeping current.", year),
        }
    }

    let months: Vec<String> = universe.months.iter().map(|m| m.to_string()).collect();
    println!("Months: {}, {}", ALL_LABEL, months.join(", "));
    let labels = read_labels("Months (comma-separated, blank = All): ");
    warn_unknown("month", &unknown_labels(&labels, Month::from_name));
    session.set_months(Selection::from_labels(&labels, Month::from_name));

    println!("Packages: {}, {}", ALL_LABEL, universe.packages.join(", "));
    let labels = read_labels("Packages (comma-separated, blank = All): ");
    let unknown: Vec<String> = labels
        .iter()
        .filter(|l| l.as_str() != ALL_LABEL && !universe.packages.contains(l))
        .cloned()
        .collect();
    warn_unknown("package", &unknown);
    session.set_packages(Selection::from_labels(&labels, |s| Some(s.to_string())));

    describe_filter(session.filter());
}

fn warn_unknown(dimension: &str, labels: &[String]) {
    if !labels.is_empty() {
        println!(
            "Warning: unknown {} value(s) {:?} match no rows.",
            dimension, labels
        );
    }
}

fn describe_filter(filter: &FilterState) {
    let months = match &filter.months {
        Selection::AllOf => ALL_LABEL.to_string(),
        Selection::Explicit(ms) => ms.iter().map(|m| m.name()).collect::<Vec<_>>().join(", "),
    };
    let packages = match &filter.packages {
        Selection::AllOf => ALL_LABEL.to_string(),
        Selection::Explicit(ps) => ps.join(", "),
    };
    let year = filter
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| ALL_LABEL.to_string());
    println!("Filter: year={} months=[{}] packages=[{}]\n", year, months, packages);
}

/// Handle option [3]: print all reports and write the JSON summary.
fn handle_generate_reports(session: &SessionContext, config: &Config) {
    let Some(cmp) = session.comparison() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    if cmp.current.is_empty() {
        println!("Warning: the current selection matches no rows.\n");
    }
    let preview = config.output.preview_rows;
    let year = cmp
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!("Key Metrics ({} vs previous year)\n", year);
    output::preview_table_rows(&reports::generate_kpis(&cmp), preview);

    println!("Summary Statistics\n");
    output::preview_table_rows(&reports::generate_statistics(&cmp.current), 7);

    println!("Monthly Trend\n");
    output::preview_table_rows(&reports::generate_trend(&cmp), 24);

    println!("Package Distribution\n");
    output::preview_table_rows(&reports::generate_packages(&cmp.current), preview);

    println!("Package Growth\n");
    output::preview_table_rows(&reports::generate_package_growth(&cmp), preview);

    println!("Highlights\n");
    output::preview_table_rows(
        &reports::generate_highlights(&cmp, config.output.top_months),
        preview + config.output.top_months,
    );

    let summary = reports::generate_summary(&cmp);
    let path = config.summary_path();
    match output::write_json(&path, &summary) {
        Ok(()) => println!("Summary saved to {}\n", path.display()),
        Err(e) => eprintln!("Write error: {}", e),
    }
}

/// Handle option [4]: export the filtered table.
fn handle_export(session: &SessionContext, config: &Config) {
    let Some(filtered) = session.filtered() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    let path = config.export_path();
    match output::export_to_path(&path, &filtered, true) {
        Ok(()) => println!(
            "Exported {} rows to {}\n",
            util::format_int(filtered.len() as u64),
            path.display()
        ),
        Err(e) => eprintln!("Write error: {}", e),
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,sales_dashboard=info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let config = load_config()?;
    let kind = config.schema_kind()?;
    let mut session = SessionContext::new();

    loop {
        println!("Sales Dashboard ({} data: {})", kind.name(), config.data.path);
        if let (Some(source), Some(at)) = (session.source(), session.loaded_at()) {
            println!(
                "Loaded {} at {}",
                source.display(),
                at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        println!("[1] Load the file");
        println!("[2] Set filters");
        println!("[3] Generate reports");
        println!("[4] Export filtered data");
        println!("[5] Reset filters");
        println!("[6] Clear data");
        println!("[0] Exit\n");
        let Some(choice) = try_read_line("Enter choice: ") else {
            println!();
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut session, &config, kind),
            "2" => handle_filters(&mut session),
            "3" => {
                println!();
                handle_generate_reports(&session, &config);
            }
            "4" => handle_export(&session, &config),
            "5" => {
                session.reset_filters();
                describe_filter(session.filter());
            }
            "6" => {
                session.clear();
                println!("Data cleared.\n");
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            other => {
                debug!(choice = other, "invalid menu choice");
                println!("Invalid choice. Please enter 0-6.\n");
            }
        }
    }
    Ok(())
}
