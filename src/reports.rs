// Turns derived metrics into display rows.
//
// Numbers become strings here, once, so the same rows feed both the
// terminal preview and the CSV export.
use crate::filter::RecordFilter;
use crate::types::{
    AppliedFilter, BucketRow, DerivedMetrics, Exclusions, ExportRow, MonthlyRow, SummaryReport,
    ValidationRow,
};
use crate::util::{format_number, format_opt};

fn days_text(days: Option<u32>) -> String {
    days.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string())
}

pub fn monthly_rows(metrics: &DerivedMetrics) -> Vec<MonthlyRow> {
    metrics
        .records
        .iter()
        .map(|d| {
            let r = d.record();
            MonthlyRow {
                month: d.normalized.period_key.label(),
                data_trust: r.data_trust.to_string(),
                coupling: d.coupling_status.to_string(),
                solar_generated_kwh: format_number(r.solar_generated_kwh, 0),
                grid_import_kwh: format_number(r.grid_import_kwh, 0),
                solar_self_kwh: format_number(r.solar_self_kwh, 0),
                grid_export_kwh: format_number(r.grid_export_kwh, 0),
                trusted_days: days_text(d.normalized.trusted_days),
                solar_per_day_kwh: format_opt(d.solar_per_day_kwh, 2),
                grid_per_day_kwh: format_opt(d.grid_per_day_kwh, 2),
                savings_per_day_sgd: format_opt(d.savings_per_day_sgd, 2),
            }
        })
        .collect()
}

pub fn bucket_rows(metrics: &DerivedMetrics) -> Vec<BucketRow> {
    metrics
        .buckets
        .iter()
        .map(|b| BucketRow {
            coupling: b.status.to_string(),
            months: b.records,
            grid_import_kwh: format_number(b.grid_import_kwh, 0),
            solar_self_kwh: format_number(b.solar_self_kwh, 0),
            solar_generated_kwh: format_number(b.solar_generated_kwh, 0),
        })
        .collect()
}

pub fn export_rows(metrics: &DerivedMetrics) -> Vec<ExportRow> {
    metrics
        .export_checks
        .iter()
        .map(|e| ExportRow {
            month: e.period_key.label(),
            grid_export_kwh: format_number(e.grid_export_kwh, 0),
            sp_billed_export_kwh: format_number(e.sp_billed_export_kwh, 0),
            export_mismatch_kwh: format_number(e.export_mismatch_kwh, 0),
        })
        .collect()
}

pub fn validation_rows(metrics: &DerivedMetrics) -> Vec<ValidationRow> {
    metrics
        .validation
        .iter()
        .map(|v| ValidationRow {
            month: v.period_key.label(),
            trusted_days: days_text(v.trusted_days),
            billing_cycles_used: v.billing_cycles_used.clone(),
            data_trust: v.data_trust.to_string(),
            energy_balance_check: v.energy_balance_check.clone(),
        })
        .collect()
}

pub fn summary(metrics: &DerivedMetrics, filter: &RecordFilter) -> SummaryReport {
    SummaryReport {
        filter: AppliedFilter {
            years: filter.years.iter().copied().collect(),
            trust_levels: filter.trust_levels.iter().copied().collect(),
        },
        records_in_view: metrics.records.len(),
        kpis: metrics.kpis.clone(),
        cost_impact: metrics.cost_impact.clone(),
        exclusions: metrics.exclusions.clone(),
    }
}

pub fn exclusion_line(ex: &Exclusions) -> String {
    format!(
        "Excluded: {} malformed period(s), {} without trusted days, {} with zero trusted days, {} without export tariff.",
        ex.malformed_period, ex.without_trusted_days, ex.zero_trusted_days, ex.without_export_tariff
    )
}

/// KPI card lines, `N/A` where a figure is undefined.
pub fn kpi_lines(metrics: &DerivedMetrics) -> Vec<(String, String)> {
    let k = &metrics.kpis;
    let money = |v: Option<f64>| match v {
        Some(v) => format!("${}", format_number(v, 0)),
        None => "N/A".to_string(),
    };
    vec![
        (
            "Total Solar Generated (kWh)".to_string(),
            format_opt(k.total_solar_generated_kwh, 0),
        ),
        ("Solar Savings (SGD)".to_string(), money(k.total_solar_savings_sgd)),
        ("Export Revenue (SGD)".to_string(), money(k.total_export_revenue_sgd)),
        (
            "Trusted Days".to_string(),
            k.total_trusted_days
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        (
            "Grid Dependency (%)".to_string(),
            match k.grid_dependency_pct {
                Some(p) => format!("{}%", format_number(p, 1)),
                None => "N/A".to_string(),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive;
    use crate::normalize::tests::record;
    use crate::normalize::{normalize, TrustedDaysTable};
    use crate::types::DataTrust;

    fn metrics() -> DerivedMetrics {
        let mut june = record(2025, "June");
        june.solar_generated_kwh = 9000.0;
        june.solar_savings_sgd = 1800.0;
        june.grid_import_kwh = 250.0;
        june.total_energy_consumed_kwh = 1000.0;
        june.export_tariff_sgd_per_kwh = Some(0.1);
        june.export_revenue_sgd = 12.0;
        june.grid_export_kwh = 125.0;
        let jan = record(2025, "January");
        derive(&normalize(&[june, jan], &TrustedDaysTable::default()).0)
    }

    #[test]
    fn monthly_rows_show_na_for_missing_per_day() {
        let rows = monthly_rows(&metrics());
        assert_eq!(rows[0].month, "Jan 2025");
        assert_eq!(rows[0].trusted_days, "N/A");
        assert_eq!(rows[0].solar_per_day_kwh, "N/A");
        assert_eq!(rows[1].solar_generated_kwh, "9,000");
        assert_eq!(rows[1].solar_per_day_kwh, "500.00");
        assert_eq!(rows[1].coupling, "After");
    }

    #[test]
    fn export_rows_only_for_tariffed_months() {
        let rows = export_rows(&metrics());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sp_billed_export_kwh, "120");
        assert_eq!(rows[0].export_mismatch_kwh, "5");
    }

    #[test]
    fn kpi_lines_render_na_when_empty() {
        let empty = derive(&[]);
        assert!(kpi_lines(&empty).iter().all(|(_, v)| v == "N/A"));
        let lines = kpi_lines(&metrics());
        assert_eq!(lines[1].1, "$1,800");
        assert_eq!(lines[4].1, "25.0%");
    }

    #[test]
    fn exclusion_line_lists_every_count() {
        let ex = Exclusions {
            malformed_period: 1,
            without_trusted_days: 2,
            zero_trusted_days: 3,
            without_export_tariff: 4,
        };
        assert_eq!(
            exclusion_line(&ex),
            "Excluded: 1 malformed period(s), 2 without trusted days, 3 with zero trusted days, 4 without export tariff."
        );
    }

    #[test]
    fn summary_serializes_undefined_as_null() {
        let filter = RecordFilter::new([2025], [DataTrust::High]);
        let s = summary(&derive(&[]), &filter);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["kpis"]["grid_dependency_pct"].is_null());
        assert!(json["cost_impact"].is_null());
        assert_eq!(json["filter"]["years"][0], 2025);
        assert_eq!(json["filter"]["trust_levels"][0], "High");
    }
}
