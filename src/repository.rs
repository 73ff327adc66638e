//! Read-through cache of loaded workbooks.

use crate::error::Result;
use crate::loader::{load_workbook, LoadReport, WorkbookSource};
use crate::types::MonthlyRecord;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct LoadedWorkbook {
    pub records: Vec<MonthlyRecord>,
    pub report: LoadReport,
}

type Loader = dyn Fn(&WorkbookSource) -> Result<(Vec<MonthlyRecord>, LoadReport)> + Send + Sync;

/// Loads each distinct source at most once until it is invalidated.
///
/// Failed loads are not cached. The lock is held across a load, so concurrent
/// callers asking for the same source never read it twice.
pub struct WorkbookRepository {
    loader: Box<Loader>,
    cache: Mutex<HashMap<WorkbookSource, Arc<LoadedWorkbook>>>,
}

impl Default for WorkbookRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookRepository {
    pub fn new() -> Self {
        Self::with_loader(load_workbook)
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn(&WorkbookSource) -> Result<(Vec<MonthlyRecord>, LoadReport)> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, source: &WorkbookSource) -> Result<Arc<LoadedWorkbook>> {
        let mut cache = self.cache.lock();
        if let Some(hit) = cache.get(source) {
            debug!("cache hit for {}", source.path.display());
            return Ok(Arc::clone(hit));
        }
        let loaded = self.load(source)?;
        cache.insert(source.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Read `source` again and replace any cached copy.
    pub fn reload(&self, source: &WorkbookSource) -> Result<Arc<LoadedWorkbook>> {
        let mut cache = self.cache.lock();
        let loaded = self.load(source)?;
        cache.insert(source.clone(), Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn invalidate(&self, source: &WorkbookSource) -> bool {
        self.cache.lock().remove(source).is_some()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn is_cached(&self, source: &WorkbookSource) -> bool {
        self.cache.lock().contains_key(source)
    }

    fn load(&self, source: &WorkbookSource) -> Result<Arc<LoadedWorkbook>> {
        info!("reading {}", source.path.display());
        let (records, report) = (self.loader)(source)?;
        Ok(Arc::new(LoadedWorkbook { records, report }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::normalize::tests::record;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_repo() -> (WorkbookRepository, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let repo = WorkbookRepository::with_loader(move |source| {
            counter.fetch_add(1, Ordering::SeqCst);
            if source.path.to_str() == Some("missing.xlsx") {
                return Err(ReportError::EmptyWorkbook(source.path.clone()));
            }
            let report = LoadReport {
                total_rows: 1,
                loaded_rows: 1,
                parse_errors: 0,
            };
            Ok((vec![record(2025, "June")], report))
        });
        (repo, calls)
    }

    #[test]
    fn loads_once_per_source() {
        let (repo, calls) = counting_repo();
        let a = WorkbookSource::new("a.xlsx", None);
        let b = WorkbookSource::new("a.xlsx", Some("Other".to_string()));

        let first = repo.get(&a).unwrap();
        let second = repo.get(&a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        repo.get(&b).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn reload_and_invalidate_force_fresh_reads() {
        let (repo, calls) = counting_repo();
        let a = WorkbookSource::new("a.xlsx", None);

        let first = repo.get(&a).unwrap();
        let reloaded = repo.reload(&a).unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(repo.invalidate(&a));
        assert!(!repo.is_cached(&a));
        repo.get(&a).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        repo.clear();
        assert!(!repo.is_cached(&a));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let (repo, calls) = counting_repo();
        let missing = WorkbookSource::new("missing.xlsx", None);
        assert!(repo.get(&missing).is_err());
        assert!(!repo.is_cached(&missing));
        assert!(repo.get(&missing).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_across_threads() {
        let (repo, calls) = counting_repo();
        let repo = Arc::new(repo);
        let source = WorkbookSource::new("a.xlsx", None);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let repo = Arc::clone(&repo);
                let source = source.clone();
                std::thread::spawn(move || repo.get(&source).ok().map(|w| w.records.len()))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Some(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
