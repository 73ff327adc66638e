//! Period keys and trusted-day annotation.

use crate::error::{ReportError, Result};
use crate::types::{MonthlyRecord, NormalizedRecord, PeriodKey};
use crate::util::parse_month;
use std::collections::BTreeMap;
use tracing::warn;

/// Verified-day counts per month number (1-12).
///
/// A month without an entry has no trusted-day count; it is never the same
/// thing as a count of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDaysTable {
    days: BTreeMap<u32, u32>,
}

impl TrustedDaysTable {
    pub fn new(days: BTreeMap<u32, u32>) -> Self {
        Self { days }
    }

    pub fn get(&self, month: u32) -> Option<u32> {
        self.days.get(&month).copied()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Default for TrustedDaysTable {
    /// Calibration for the June-December 2025 billing cycles.
    fn default() -> Self {
        let days = [(6, 18), (7, 31), (8, 31), (9, 30), (10, 31), (11, 30), (12, 24)];
        Self::new(days.into_iter().collect())
    }
}

pub fn period_key(record: &MonthlyRecord) -> Result<PeriodKey> {
    let month = parse_month(&record.month_name).ok_or_else(|| ReportError::MalformedPeriod {
        year: record.year,
        month: record.month_name.clone(),
    })?;
    Ok(PeriodKey {
        year: record.year,
        month,
    })
}

/// Attach period keys and trusted days, then sort by calendar time.
///
/// Records with an unrecognized month are dropped; the second element of the
/// result is how many.
pub fn normalize(
    records: &[MonthlyRecord],
    table: &TrustedDaysTable,
) -> (Vec<NormalizedRecord>, usize) {
    let mut dropped = 0usize;
    let mut out: Vec<NormalizedRecord> = Vec::with_capacity(records.len());
    for record in records {
        let key = match period_key(record) {
            Ok(k) => k,
            Err(e) => {
                warn!("dropping record: {}", e);
                dropped += 1;
                continue;
            }
        };
        out.push(NormalizedRecord {
            record: record.clone(),
            period_key: key,
            trusted_days: table.get(key.month),
        });
    }
    // Stable, so duplicate periods keep their input order.
    out.sort_by_key(|r| r.period_key);
    (out, dropped)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::DataTrust;

    pub(crate) fn record(year: i32, month: &str) -> MonthlyRecord {
        MonthlyRecord {
            year,
            month_name: month.to_string(),
            solar_generated_kwh: 0.0,
            solar_savings_sgd: 0.0,
            export_revenue_sgd: 0.0,
            grid_import_kwh: 0.0,
            grid_export_kwh: 0.0,
            solar_self_kwh: 0.0,
            total_energy_consumed_kwh: 0.0,
            grid_import_cost_sgd: 0.0,
            export_tariff_sgd_per_kwh: None,
            data_trust: DataTrust::High,
            billing_cycles_used: "1".to_string(),
            energy_balance_check: "OK".to_string(),
        }
    }

    #[test]
    fn sorts_by_calendar_time_not_input_order() {
        let input = vec![
            record(2025, "March"),
            record(2024, "December"),
            record(2025, "January"),
            record(2025, "Feb"),
        ];
        let (out, dropped) = normalize(&input, &TrustedDaysTable::default());
        assert_eq!(dropped, 0);
        let keys: Vec<(i32, u32)> = out
            .iter()
            .map(|r| (r.period_key.year, r.period_key.month))
            .collect();
        assert_eq!(keys, vec![(2024, 12), (2025, 1), (2025, 2), (2025, 3)]);
    }

    #[test]
    fn malformed_month_is_dropped_not_fatal() {
        let input = vec![record(2025, "June"), record(2025, "Juneish"), record(2025, "")];
        let (out, dropped) = normalize(&input, &TrustedDaysTable::default());
        assert_eq!(dropped, 2);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.month_name, "June");
    }

    #[test]
    fn months_outside_table_have_no_trusted_days() {
        let input = vec![record(2025, "January"), record(2025, "June")];
        let (out, _) = normalize(&input, &TrustedDaysTable::default());
        assert_eq!(out[0].trusted_days, None);
        assert_eq!(out[1].trusted_days, Some(18));
    }

    #[test]
    fn default_table_covers_june_to_december() {
        let table = TrustedDaysTable::default();
        assert_eq!(table.len(), 7);
        assert!((1..=5).all(|m| table.get(m).is_none()));
        assert!((6..=12).all(|m| table.get(m).is_some_and(|d| d > 0)));
    }

    #[test]
    fn period_label_matches_month_year_display() {
        let key = PeriodKey {
            year: 2025,
            month: 6,
        };
        assert_eq!(key.label(), "Jun 2025");
    }
}
