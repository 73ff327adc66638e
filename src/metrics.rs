//! Derived metrics over a filtered, period-ordered record sequence.
//!
//! Everything here is a pure function of its input: no caching, no state
//! carried between calls.

use crate::types::{
    BucketAggregate, CostImpact, CouplingStatus, DerivedMetrics, DerivedRecord, Exclusions,
    ExportCheck, KpiSummary, NormalizedRecord, ValidationEntry,
};
use crate::util::safe_div;
use tracing::{debug, warn};

pub fn coupling_status(month: u32) -> CouplingStatus {
    match month {
        1..=3 => CouplingStatus::Before,
        4 => CouplingStatus::Transition,
        _ => CouplingStatus::After,
    }
}

pub fn aggregate_kpis(records: &[NormalizedRecord]) -> KpiSummary {
    if records.is_empty() {
        return KpiSummary {
            total_solar_generated_kwh: None,
            total_solar_savings_sgd: None,
            total_export_revenue_sgd: None,
            total_trusted_days: None,
            grid_dependency_pct: None,
        };
    }
    let sum = |f: fn(&NormalizedRecord) -> f64| records.iter().map(f).sum::<f64>();
    let grid_import = sum(|r| r.record.grid_import_kwh);
    let consumed = sum(|r| r.record.total_energy_consumed_kwh);
    let grid_dependency_pct = match safe_div(grid_import, consumed, "grid dependency") {
        Ok(ratio) => Some(ratio * 100.0),
        Err(e) => {
            debug!("{}", e);
            None
        }
    };
    KpiSummary {
        total_solar_generated_kwh: Some(sum(|r| r.record.solar_generated_kwh)),
        total_solar_savings_sgd: Some(sum(|r| r.record.solar_savings_sgd)),
        total_export_revenue_sgd: Some(sum(|r| r.record.export_revenue_sgd)),
        total_trusted_days: Some(records.iter().filter_map(|r| r.trusted_days).sum()),
        grid_dependency_pct,
    }
}

/// Per-record derivation: per-day values, coupling bucket, export cross-check.
pub fn derive_record(r: &NormalizedRecord) -> DerivedRecord {
    let rec = &r.record;
    let (mut solar_pd, mut grid_pd, mut savings_pd) = (None, None, None);
    if let Some(days) = r.trusted_days {
        let label = format!("per-day values of {}", r.period_key.label());
        let days = f64::from(days);
        match (
            safe_div(rec.solar_generated_kwh, days, &label),
            safe_div(rec.grid_import_kwh, days, &label),
            safe_div(rec.solar_savings_sgd, days, &label),
        ) {
            (Ok(s), Ok(g), Ok(v)) => {
                solar_pd = Some(s);
                grid_pd = Some(g);
                savings_pd = Some(v);
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => warn!("skipping {}", e),
        }
    }

    let (mut sp_billed, mut mismatch) = (None, None);
    if let Some(tariff) = rec.export_tariff_sgd_per_kwh.filter(|t| *t != 0.0) {
        let billed = rec.export_revenue_sgd / tariff;
        sp_billed = Some(billed);
        mismatch = Some(rec.grid_export_kwh - billed);
    }

    DerivedRecord {
        normalized: r.clone(),
        solar_per_day_kwh: solar_pd,
        grid_per_day_kwh: grid_pd,
        savings_per_day_sgd: savings_pd,
        coupling_status: coupling_status(r.period_key.month),
        sp_billed_export_kwh: sp_billed,
        export_mismatch_kwh: mismatch,
    }
}

/// One aggregate per bucket that has records, ordered Before, Transition, After.
pub fn coupling_buckets(records: &[DerivedRecord]) -> Vec<BucketAggregate> {
    [
        CouplingStatus::Before,
        CouplingStatus::Transition,
        CouplingStatus::After,
    ]
    .into_iter()
    .filter_map(|status| {
        let members: Vec<&DerivedRecord> = records
            .iter()
            .filter(|r| r.coupling_status == status)
            .collect();
        if members.is_empty() {
            return None;
        }
        Some(BucketAggregate {
            status,
            records: members.len(),
            grid_import_kwh: members.iter().map(|r| r.record().grid_import_kwh).sum(),
            solar_self_kwh: members.iter().map(|r| r.record().solar_self_kwh).sum(),
            solar_generated_kwh: members.iter().map(|r| r.record().solar_generated_kwh).sum(),
        })
    })
    .collect()
}

pub fn export_checks(records: &[DerivedRecord]) -> Vec<ExportCheck> {
    records
        .iter()
        .filter_map(|r| {
            Some(ExportCheck {
                period_key: r.normalized.period_key,
                grid_export_kwh: r.record().grid_export_kwh,
                sp_billed_export_kwh: r.sp_billed_export_kwh?,
                export_mismatch_kwh: r.export_mismatch_kwh?,
            })
        })
        .collect()
}

pub fn cost_impact(records: &[NormalizedRecord]) -> Option<CostImpact> {
    if records.is_empty() {
        return None;
    }
    let grid: f64 = records.iter().map(|r| r.record.grid_import_cost_sgd).sum();
    let savings: f64 = records.iter().map(|r| r.record.solar_savings_sgd).sum();
    let export: f64 = records.iter().map(|r| r.record.export_revenue_sgd).sum();
    Some(CostImpact {
        grid_import_cost_sgd: grid,
        solar_savings_sgd: savings,
        export_revenue_sgd: export,
        net_energy_impact_sgd: grid - savings - export,
    })
}

pub fn validation(records: &[NormalizedRecord]) -> Vec<ValidationEntry> {
    records
        .iter()
        .map(|r| ValidationEntry {
            period_key: r.period_key,
            month_name: r.record.month_name.clone(),
            trusted_days: r.trusted_days,
            billing_cycles_used: r.record.billing_cycles_used.clone(),
            data_trust: r.record.data_trust,
            energy_balance_check: r.record.energy_balance_check.clone(),
        })
        .collect()
}

/// Run every derivation over `records`, which are expected in period order.
///
/// `exclusions.malformed_period` is left at zero; only the normalizer knows it.
pub fn derive(records: &[NormalizedRecord]) -> DerivedMetrics {
    let derived: Vec<DerivedRecord> = records.iter().map(derive_record).collect();

    let exclusions = Exclusions {
        malformed_period: 0,
        without_trusted_days: records.iter().filter(|r| r.trusted_days.is_none()).count(),
        zero_trusted_days: records.iter().filter(|r| r.trusted_days == Some(0)).count(),
        without_export_tariff: derived
            .iter()
            .filter(|r| r.sp_billed_export_kwh.is_none())
            .count(),
    };

    DerivedMetrics {
        kpis: aggregate_kpis(records),
        buckets: coupling_buckets(&derived),
        export_checks: export_checks(&derived),
        validation: validation(records),
        cost_impact: cost_impact(records),
        records: derived,
        exclusions,
    }
}
