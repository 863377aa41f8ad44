//! Dataset Cache Module
//! Memoizes loaded tables by source path so repeated selections never re-parse.

use crate::data::loader::{DatasetLoader, LoaderError, SurveillanceTable, TableSchema};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument};

type CacheKey = (PathBuf, TableSchema);

/// Keyed, populate-once cache of loaded surveillance tables.
///
/// The key is the canonical source path plus the column schema. Entries are
/// never invalidated: the source is treated as static for the process lifetime.
/// The lock is held while a missing entry is loaded, so concurrent callers for
/// the same key wait for the first one and then share its table.
#[derive(Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<CacheKey, Arc<SurveillanceTable>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, loading it on first use.
    pub fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<SurveillanceTable>, LoaderError> {
        self.get_or_load_with_schema(path, &TableSchema::default())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn get_or_load_with_schema(
        &self,
        path: impl AsRef<Path>,
        schema: &TableSchema,
    ) -> Result<Arc<SurveillanceTable>, LoaderError> {
        let path = path.as_ref();
        let key = (Self::source_identity(path), schema.clone());

        let mut entries = self.lock();
        if let Some(table) = entries.get(&key) {
            debug!("dataset cache hit");
            return Ok(Arc::clone(table));
        }

        debug!("dataset cache miss");
        let table = Arc::new(DatasetLoader::load_with_schema(path, schema)?);
        entries.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Arc<SurveillanceTable>>> {
        // Tables are inserted whole, so a poisoned map is still consistent.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn source_identity(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::thread;
    use tempfile::NamedTempFile;

    fn sample_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "epiweek,state,ili").unwrap();
        writeln!(file, "201040,ca,1.0").unwrap();
        writeln!(file, "201041,ca,2.0").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn repeated_loads_share_one_table() {
        let file = sample_csv();
        let cache = DatasetCache::new();

        let first = cache.get_or_load(file.path()).unwrap();
        let second = cache.get_or_load(file.path()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_table_survives_source_changes() {
        let mut file = sample_csv();
        let cache = DatasetCache::new();
        let first = cache.get_or_load(file.path()).unwrap();

        writeln!(file, "201042,ca,3.0").unwrap();
        file.flush().unwrap();

        let second = cache.get_or_load(file.path()).unwrap();
        assert_eq!(second.height(), first.height());
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new();

        assert!(cache.get_or_load(dir.path().join("absent.csv")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_callers_get_the_same_table() {
        let file = sample_csv();
        let cache = Arc::new(DatasetCache::new());
        let path = file.path().to_path_buf();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let path = path.clone();
                thread::spawn(move || cache.get_or_load(&path).unwrap())
            })
            .collect();

        let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tables.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }
}
