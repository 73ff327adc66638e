use crate::filter::RecordFilter;
use crate::metrics::derive;
use crate::normalize::{normalize, TrustedDaysTable};
use crate::types::{DerivedMetrics, MonthlyRecord};
use tracing::info;

/// Normalize, filter and derive in one pass over loaded records.
pub fn run(
    records: &[MonthlyRecord],
    table: &TrustedDaysTable,
    filter: &RecordFilter,
) -> DerivedMetrics {
    let (normalized, dropped) = normalize(records, table);
    let filtered = filter.apply(&normalized);
    info!(
        "{} of {} records in view ({} dropped as malformed)",
        filtered.len(),
        normalized.len(),
        dropped
    );
    let mut metrics = derive(&filtered);
    metrics.exclusions.malformed_period = dropped;
    metrics
}
