use crate::error::{ReportError, Result};
use crate::types::{DataTrust, MonthlyRecord, RawRow};
use crate::util::{parse_f64_safe, parse_i32_safe};
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, StringRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Year",
    "Month",
    "Solar_Gen_kWh",
    "Solar_Savings_SGD",
    "Export_Revenue_SGD",
    "Grid_Import_kWh",
    "Grid_Export_kWh",
    "Solar_Self_kWh",
    "Total_Energy_Consumed_kWh",
    "Grid_Import_Cost_SGD",
    "Data_Trust",
    "Billing_Cycles_Used",
    "Energy_Balance_Check",
];

/// Where to read monthly rows from. Also the repository cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkbookSource {
    pub path: PathBuf,
    /// Sheet to read from a spreadsheet; the first sheet when `None`.
    pub sheet: Option<String>,
}

impl WorkbookSource {
    pub fn new(path: impl Into<PathBuf>, sheet: Option<String>) -> Self {
        Self {
            path: path.into(),
            sheet,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

pub fn load_workbook(source: &WorkbookSource) -> Result<(Vec<MonthlyRecord>, LoadReport)> {
    let (headers, rows) = read_table(source)?;
    check_columns(&headers)?;

    let mut report = LoadReport::default();
    let mut records: Vec<MonthlyRecord> = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        report.total_rows += 1;
        let raw: RawRow = match row.deserialize(Some(&headers)) {
            Ok(r) => r,
            Err(e) => {
                debug!("row {}: {}", idx + 2, e);
                report.parse_errors += 1;
                continue;
            }
        };
        match to_record(raw) {
            Ok(r) => records.push(r),
            Err(reason) => {
                warn!("skipping row {}: {}", idx + 2, reason);
                report.parse_errors += 1;
            }
        }
    }

    report.loaded_rows = records.len();
    info!(
        "loaded {} of {} rows from {} ({} skipped)",
        report.loaded_rows,
        report.total_rows,
        source.path.display(),
        report.parse_errors
    );
    Ok((records, report))
}

fn check_columns(headers: &StringRecord) -> Result<()> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(ReportError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn read_table(source: &WorkbookSource) -> Result<(StringRecord, Vec<StringRecord>)> {
    let ext = source
        .path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => read_csv(&source.path),
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => {
            read_spreadsheet(&source.path, source.sheet.as_deref())
        }
        _ => Err(ReportError::UnsupportedFormat(source.path.clone())),
    }
}

fn read_csv(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = trim_record(rdr.headers()?);
    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((headers, rows))
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_name = match sheet {
        Some(s) => s.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?,
    };
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows().skip_while(|row| row.iter().all(is_blank));
    let headers = rows
        .next()
        .map(|row| trim_record(&cells_to_record(row)))
        .ok_or_else(|| ReportError::EmptyWorkbook(path.to_path_buf()))?;
    let body = rows.map(cells_to_record).collect();
    Ok((headers, body))
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cells_to_record(row: &[Data]) -> StringRecord {
    row.iter().map(|cell| cell.to_string()).collect()
}

fn trim_record(record: &StringRecord) -> StringRecord {
    record.iter().map(str::trim).collect()
}

fn required<'a>(value: &'a Option<String>, column: &str) -> std::result::Result<&'a str, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("blank `{column}`")),
    }
}

fn number(value: &Option<String>, column: &str) -> std::result::Result<f64, String> {
    let v = required(value, column)?;
    parse_f64_safe(Some(v)).ok_or_else(|| format!("`{column}` is not a number: `{v}`"))
}

fn to_record(raw: RawRow) -> std::result::Result<MonthlyRecord, String> {
    let year_text = required(&raw.year, "Year")?;
    let year = parse_i32_safe(Some(year_text))
        .ok_or_else(|| format!("`Year` is not an integer: `{year_text}`"))?;
    let month_name = required(&raw.month, "Month")?.to_string();
    let data_trust: DataTrust = required(&raw.data_trust, "Data_Trust")?.parse()?;

    Ok(MonthlyRecord {
        year,
        month_name,
        solar_generated_kwh: number(&raw.solar_gen_kwh, "Solar_Gen_kWh")?,
        solar_savings_sgd: number(&raw.solar_savings_sgd, "Solar_Savings_SGD")?,
        export_revenue_sgd: number(&raw.export_revenue_sgd, "Export_Revenue_SGD")?,
        grid_import_kwh: number(&raw.grid_import_kwh, "Grid_Import_kWh")?,
        grid_export_kwh: number(&raw.grid_export_kwh, "Grid_Export_kWh")?,
        solar_self_kwh: number(&raw.solar_self_kwh, "Solar_Self_kWh")?,
        total_energy_consumed_kwh: number(
            &raw.total_energy_consumed_kwh,
            "Total_Energy_Consumed_kWh",
        )?,
        grid_import_cost_sgd: number(&raw.grid_import_cost_sgd, "Grid_Import_Cost_SGD")?,
        export_tariff_sgd_per_kwh: parse_f64_safe(raw.export_tariff_sgd_per_kwh.as_deref()),
        data_trust,
        billing_cycles_used: required(&raw.billing_cycles_used, "Billing_Cycles_Used")?.to_string(),
        energy_balance_check: required(&raw.energy_balance_check, "Energy_Balance_Check")?
            .to_string(),
    })
}
