use crate::types::{DataTrust, MonthlyRecord, NormalizedRecord};
use std::collections::BTreeSet;

/// Year and data-trust selection. An empty set selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub years: BTreeSet<i32>,
    pub trust_levels: BTreeSet<DataTrust>,
}

impl RecordFilter {
    pub fn new(
        years: impl IntoIterator<Item = i32>,
        trust_levels: impl IntoIterator<Item = DataTrust>,
    ) -> Self {
        Self {
            years: years.into_iter().collect(),
            trust_levels: trust_levels.into_iter().collect(),
        }
    }

    pub fn matches(&self, r: &NormalizedRecord) -> bool {
        self.years.contains(&r.record.year) && self.trust_levels.contains(&r.record.data_trust)
    }

    pub fn apply(&self, records: &[NormalizedRecord]) -> Vec<NormalizedRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Distinct years present, ascending; the default year selection.
pub fn available_years(records: &[MonthlyRecord]) -> BTreeSet<i32> {
    records.iter().map(|r| r.year).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::record;
    use crate::normalize::{normalize, TrustedDaysTable};

    fn sample() -> Vec<NormalizedRecord> {
        let mut a = record(2024, "December");
        a.data_trust = DataTrust::Low;
        let mut b = record(2025, "June");
        b.data_trust = DataTrust::Medium;
        let c = record(2025, "July");
        normalize(&[a, b, c], &TrustedDaysTable::default()).0
    }

    #[test]
    fn keeps_records_matching_both_sets() {
        let f = RecordFilter::new([2025], [DataTrust::High, DataTrust::Medium]);
        let out = f.apply(&sample());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.record.year == 2025));
    }

    #[test]
    fn trust_level_excludes_independently_of_year() {
        let f = RecordFilter::new([2024, 2025], [DataTrust::High]);
        let out = f.apply(&sample());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].record.month_name, "July");
    }

    #[test]
    fn empty_sets_select_nothing() {
        let data = sample();
        assert!(RecordFilter::new([], [DataTrust::High]).apply(&data).is_empty());
        assert!(RecordFilter::new([2025], []).apply(&data).is_empty());
    }

    #[test]
    fn available_years_are_distinct_and_sorted() {
        let raw: Vec<MonthlyRecord> = sample().into_iter().map(|r| r.record).collect();
        let years: Vec<i32> = available_years(&raw).into_iter().collect();
        assert_eq!(years, vec![2024, 2025]);
    }
}
