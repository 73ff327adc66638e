// Entry point and high-level CLI flow.
//
// - Option [1] loads the monthly workbook into the repository cache.
// - Option [2] filters, derives and writes the report tables and summary.
// - Option [3] re-reads the workbook, replacing the cached copy.
// - `--batch` loads and generates once without the menu.
use anyhow::{Context, Result};
use clap::Parser;
use solar_impact_report::config::{load_config, ReportConfig};
use solar_impact_report::filter::{self, RecordFilter};
use solar_impact_report::loader::WorkbookSource;
use solar_impact_report::normalize::TrustedDaysTable;
use solar_impact_report::repository::{LoadedWorkbook, WorkbookRepository};
use solar_impact_report::types::DataTrust;
use solar_impact_report::{output, pipeline, reports, util};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "solar-impact-report")]
#[command(about = "Monthly solar energy impact and cost report", long_about = None)]
struct Cli {
    /// JSON config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Monthly workbook (xlsx, xls, ods or csv)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Sheet to read; the first sheet when omitted
    #[arg(long)]
    sheet: Option<String>,

    /// Year to include (repeatable); all years in the data when omitted
    #[arg(long = "year")]
    years: Vec<i32>,

    /// Data trust level to include (repeatable)
    #[arg(long = "trust", value_enum, ignore_case = true)]
    trust_levels: Vec<DataTrust>,

    /// Directory for CSV and JSON outputs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Rows shown per table preview
    #[arg(long)]
    preview_rows: Option<usize>,

    /// Load and generate once, without the interactive menu
    #[arg(long)]
    batch: bool,
}

struct App {
    repo: WorkbookRepository,
    source: WorkbookSource,
    table: TrustedDaysTable,
    years: Option<BTreeSet<i32>>,
    trust_levels: BTreeSet<DataTrust>,
    out_dir: PathBuf,
    preview_rows: usize,
}

impl App {
    fn new(cli: Cli, config: ReportConfig) -> Result<Self> {
        let table = config
            .trusted_days_table()
            .context("invalid trusted_days table")?;
        let trust_levels = if cli.trust_levels.is_empty() {
            config.default_trust_levels.iter().copied().collect()
        } else {
            cli.trust_levels.into_iter().collect()
        };
        Ok(Self {
            repo: WorkbookRepository::new(),
            source: WorkbookSource::new(
                cli.data.unwrap_or(config.data_path),
                cli.sheet.or(config.sheet),
            ),
            table,
            years: (!cli.years.is_empty()).then(|| cli.years.into_iter().collect()),
            trust_levels,
            out_dir: cli.out_dir.unwrap_or(config.output_dir),
            preview_rows: cli.preview_rows.unwrap_or(config.preview_rows),
        })
    }

    fn print_load(&self, wb: &LoadedWorkbook) {
        println!(
            "Processing workbook... ({} rows read, {} loaded)",
            util::format_int(wb.report.total_rows),
            util::format_int(wb.report.loaded_rows)
        );
        if wb.report.parse_errors > 0 {
            println!(
                "Note: {} rows skipped due to parse/validation errors.",
                util::format_int(wb.report.parse_errors)
            );
        }
        println!();
    }

    fn handle_load(&self) -> Result<()> {
        let wb = self
            .repo
            .get(&self.source)
            .with_context(|| format!("failed to load {}", self.source.path.display()))?;
        self.print_load(&wb);
        Ok(())
    }

    fn handle_reload(&self) -> Result<()> {
        let wb = self
            .repo
            .reload(&self.source)
            .with_context(|| format!("failed to reload {}", self.source.path.display()))?;
        self.print_load(&wb);
        Ok(())
    }

    fn handle_generate_reports(&self) -> Result<()> {
        if !self.repo.is_cached(&self.source) {
            println!("Error: No data loaded. Please load the workbook first (option 1).\n");
            return Ok(());
        }
        let wb = self.repo.get(&self.source)?;

        let years = self
            .years
            .clone()
            .unwrap_or_else(|| filter::available_years(&wb.records));
        let record_filter = RecordFilter::new(years, self.trust_levels.iter().copied());
        let metrics = pipeline::run(&wb.records, &self.table, &record_filter);

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("cannot create {}", self.out_dir.display()))?;
        info!("writing reports to {}", self.out_dir.display());

        println!("Executive Summary");
        for (label, value) in reports::kpi_lines(&metrics) {
            println!("  {label}: {value}");
        }
        println!();

        let monthly = reports::monthly_rows(&metrics);
        self.emit("Monthly Solar Generation & Per-Day Figures", "monthly_derived.csv", &monthly)?;
        let buckets = reports::bucket_rows(&metrics);
        self.emit("Before / After Coupling", "coupling_buckets.csv", &buckets)?;
        let exports = reports::export_rows(&metrics);
        self.emit("Metered vs SP-Billed Export", "export_check.csv", &exports)?;
        let validation = reports::validation_rows(&metrics);
        self.emit("Data Trust & Energy Balance Validation", "validation.csv", &validation)?;

        let summary = reports::summary(&metrics, &record_filter);
        output::write_json(&self.out_dir.join("summary.json"), &summary)?;
        if let Some(impact) = &summary.cost_impact {
            println!("Impact of Solar on Electricity Cost (SGD)");
            println!("  Grid Import Cost: {}", util::format_number(impact.grid_import_cost_sgd, 2));
            println!("  Solar Savings: -{}", util::format_number(impact.solar_savings_sgd, 2));
            println!("  Export Revenue: -{}", util::format_number(impact.export_revenue_sgd, 2));
            println!("  Net Energy Impact: {}\n", util::format_number(impact.net_energy_impact_sgd, 2));
        }
        println!("{}", reports::exclusion_line(&summary.exclusions));
        println!("(Summary exported to summary.json)\n");
        Ok(())
    }

    fn emit<T>(&self, title: &str, file: &str, rows: &[T]) -> Result<()>
    where
        T: tabled::Tabled + serde::Serialize + Clone,
    {
        output::write_csv(&self.out_dir.join(file), rows)
            .with_context(|| format!("failed to write {file}"))?;
        println!("{}\n", title);
        output::preview_table_rows(rows, self.preview_rows);
        println!("(Full table exported to {})\n", file);
        Ok(())
    }
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu after generating reports.
///
/// Returns `true` for `Y`, `false` for `N` or a closed stdin.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn report_failure(e: anyhow::Error) {
    error!("{:#}", e);
    eprintln!("Error: {:#}\n", e);
}

fn interactive(app: &App) {
    loop {
        println!("Solar Energy Impact Report");
        println!("[1] Load the workbook");
        println!("[2] Generate reports");
        println!("[3] Reload the workbook\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => {
                if let Err(e) = app.handle_load() {
                    report_failure(e);
                }
            }
            "2" => {
                println!();
                if let Err(e) = app.handle_generate_reports() {
                    report_failure(e);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "3" => {
                if let Err(e) = app.handle_reload() {
                    report_failure(e);
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("solar_impact_report=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("failed to load config")?;
    let batch = cli.batch;
    let app = App::new(cli, config)?;

    if batch {
        app.handle_load()?;
        app.handle_generate_reports()?;
    } else {
        interactive(&app);
    }
    Ok(())
}
