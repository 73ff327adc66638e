use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

/// One sheet row as it comes out of the reader, before any typing.
///
/// Every field is optional so that a blank cell surfaces as `None` and the
/// loader can decide whether that is a row error or an absent value.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Solar_Gen_kWh")]
    pub solar_gen_kwh: Option<String>,
    #[serde(rename = "Solar_Savings_SGD")]
    pub solar_savings_sgd: Option<String>,
    #[serde(rename = "Export_Revenue_SGD")]
    pub export_revenue_sgd: Option<String>,
    #[serde(rename = "Grid_Import_kWh")]
    pub grid_import_kwh: Option<String>,
    #[serde(rename = "Grid_Export_kWh")]
    pub grid_export_kwh: Option<String>,
    #[serde(rename = "Solar_Self_kWh")]
    pub solar_self_kwh: Option<String>,
    #[serde(rename = "Total_Energy_Consumed_kWh")]
    pub total_energy_consumed_kwh: Option<String>,
    #[serde(rename = "Grid_Import_Cost_SGD")]
    pub grid_import_cost_sgd: Option<String>,
    #[serde(rename = "Export_Tariff_SGD_per_kWh", default)]
    pub export_tariff_sgd_per_kwh: Option<String>,
    #[serde(rename = "Data_Trust")]
    pub data_trust: Option<String>,
    #[serde(rename = "Billing_Cycles_Used")]
    pub billing_cycles_used: Option<String>,
    #[serde(rename = "Energy_Balance_Check")]
    pub energy_balance_check: Option<String>,
}

/// Confidence label attached to each month's readings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum DataTrust {
    High,
    Medium,
    Low,
}

impl fmt::Display for DataTrust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataTrust::High => "High",
            DataTrust::Medium => "Medium",
            DataTrust::Low => "Low",
        };
        f.write_str(s)
    }
}

impl FromStr for DataTrust {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(DataTrust::High),
            "medium" => Ok(DataTrust::Medium),
            "low" => Ok(DataTrust::Low),
            other => Err(format!("unknown data trust level `{other}`")),
        }
    }
}

/// A typed monthly row. Source columns are never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    pub year: i32,
    pub month_name: String,
    pub solar_generated_kwh: f64,
    pub solar_savings_sgd: f64,
    pub export_revenue_sgd: f64,
    pub grid_import_kwh: f64,
    pub grid_export_kwh: f64,
    pub solar_self_kwh: f64,
    pub total_energy_consumed_kwh: f64,
    pub grid_import_cost_sgd: f64,
    pub export_tariff_sgd_per_kwh: Option<f64>,
    pub data_trust: DataTrust,
    pub billing_cycles_used: String,
    pub energy_balance_check: String,
}

/// Calendar-sortable year + month. Field order gives the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    /// Short label such as `Jun 2025`.
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%b %Y").to_string())
            .unwrap_or_else(|| format!("{:02}/{}", self.month, self.year))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub record: MonthlyRecord,
    pub period_key: PeriodKey,
    /// `None` means the month has no trusted-day count at all.
    pub trusted_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CouplingStatus {
    Before,
    Transition,
    After,
}

impl fmt::Display for CouplingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CouplingStatus::Before => "Before",
            CouplingStatus::Transition => "Transition",
            CouplingStatus::After => "After",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub normalized: NormalizedRecord,
    pub solar_per_day_kwh: Option<f64>,
    pub grid_per_day_kwh: Option<f64>,
    pub savings_per_day_sgd: Option<f64>,
    pub coupling_status: CouplingStatus,
    pub sp_billed_export_kwh: Option<f64>,
    pub export_mismatch_kwh: Option<f64>,
}

impl DerivedRecord {
    pub fn record(&self) -> &MonthlyRecord {
        &self.normalized.record
    }
}

/// Headline figures. `None` renders as "N/A".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_solar_generated_kwh: Option<f64>,
    pub total_solar_savings_sgd: Option<f64>,
    pub total_export_revenue_sgd: Option<f64>,
    pub total_trusted_days: Option<u32>,
    pub grid_dependency_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketAggregate {
    pub status: CouplingStatus,
    pub records: usize,
    pub grid_import_kwh: f64,
    pub solar_self_kwh: f64,
    pub solar_generated_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportCheck {
    pub period_key: PeriodKey,
    pub grid_export_kwh: f64,
    pub sp_billed_export_kwh: f64,
    pub export_mismatch_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationEntry {
    pub period_key: PeriodKey,
    pub month_name: String,
    pub trusted_days: Option<u32>,
    pub billing_cycles_used: String,
    pub data_trust: DataTrust,
    pub energy_balance_check: String,
}

/// Grid cost offset by solar savings and export revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostImpact {
    pub grid_import_cost_sgd: f64,
    pub solar_savings_sgd: f64,
    pub export_revenue_sgd: f64,
    pub net_energy_impact_sgd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Exclusions {
    pub malformed_period: usize,
    pub without_trusted_days: usize,
    pub zero_trusted_days: usize,
    pub without_export_tariff: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedMetrics {
    pub kpis: KpiSummary,
    pub records: Vec<DerivedRecord>,
    pub buckets: Vec<BucketAggregate>,
    pub export_checks: Vec<ExportCheck>,
    pub validation: Vec<ValidationEntry>,
    pub cost_impact: Option<CostImpact>,
    pub exclusions: Exclusions,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "DataTrust")]
    #[tabled(rename = "DataTrust")]
    pub data_trust: String,
    #[serde(rename = "Coupling")]
    #[tabled(rename = "Coupling")]
    pub coupling: String,
    #[serde(rename = "SolarGenKWh")]
    #[tabled(rename = "SolarGenKWh")]
    pub solar_generated_kwh: String,
    #[serde(rename = "GridImportKWh")]
    #[tabled(rename = "GridImportKWh")]
    pub grid_import_kwh: String,
    #[serde(rename = "SolarSelfKWh")]
    #[tabled(rename = "SolarSelfKWh")]
    pub solar_self_kwh: String,
    #[serde(rename = "GridExportKWh")]
    #[tabled(rename = "GridExportKWh")]
    pub grid_export_kwh: String,
    #[serde(rename = "TrustedDays")]
    #[tabled(rename = "TrustedDays")]
    pub trusted_days: String,
    #[serde(rename = "SolarPerDayKWh")]
    #[tabled(rename = "SolarPerDayKWh")]
    pub solar_per_day_kwh: String,
    #[serde(rename = "GridPerDayKWh")]
    #[tabled(rename = "GridPerDayKWh")]
    pub grid_per_day_kwh: String,
    #[serde(rename = "SavingsPerDaySGD")]
    #[tabled(rename = "SavingsPerDaySGD")]
    pub savings_per_day_sgd: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BucketRow {
    #[serde(rename = "Coupling")]
    #[tabled(rename = "Coupling")]
    pub coupling: String,
    #[serde(rename = "Months")]
    #[tabled(rename = "Months")]
    pub months: usize,
    #[serde(rename = "GridImportKWh")]
    #[tabled(rename = "GridImportKWh")]
    pub grid_import_kwh: String,
    #[serde(rename = "SolarSelfKWh")]
    #[tabled(rename = "SolarSelfKWh")]
    pub solar_self_kwh: String,
    #[serde(rename = "SolarGenKWh")]
    #[tabled(rename = "SolarGenKWh")]
    pub solar_generated_kwh: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ExportRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "MeteredExportKWh")]
    #[tabled(rename = "MeteredExportKWh")]
    pub grid_export_kwh: String,
    #[serde(rename = "SPBilledExportKWh")]
    #[tabled(rename = "SPBilledExportKWh")]
    pub sp_billed_export_kwh: String,
    #[serde(rename = "MismatchKWh")]
    #[tabled(rename = "MismatchKWh")]
    pub export_mismatch_kwh: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ValidationRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "TrustedDays")]
    #[tabled(rename = "TrustedDays")]
    pub trusted_days: String,
    #[serde(rename = "BillingCyclesUsed")]
    #[tabled(rename = "BillingCyclesUsed")]
    pub billing_cycles_used: String,
    #[serde(rename = "DataTrust")]
    #[tabled(rename = "DataTrust")]
    pub data_trust: String,
    #[serde(rename = "EnergyBalanceCheck")]
    #[tabled(rename = "EnergyBalanceCheck")]
    pub energy_balance_check: String,
}

#[derive(Debug, Serialize)]
pub struct AppliedFilter {
    pub years: Vec<i32>,
    pub trust_levels: Vec<DataTrust>,
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub filter: AppliedFilter,
    pub records_in_view: usize,
    pub kpis: KpiSummary,
    pub cost_impact: Option<CostImpact>,
    pub exclusions: Exclusions,
}
