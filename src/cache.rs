use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Mutex as AsyncMutex;

use crate::error::AppError;
use crate::fetcher::SheetSource;
use crate::snapshot::{self, Snapshot};

struct CacheEntry {
    snapshot: Arc<Snapshot>,
    fetched_at: Instant,
}

/// In-memory snapshot cache keyed by sheet name.
///
/// Each entry is replaced wholesale behind an `Arc`, so a concurrent reader
/// sees either the fully-old or the fully-new snapshot. Entries are never
/// evicted; past the freshness window they simply go stale and the next
/// request refreshes them. A refresh that fails leaves the previous entry
/// untouched.
pub struct SnapshotCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
    // One refresh lock per sheet name, so concurrent requests hitting the
    // same expired entry trigger a single upstream fetch.
    refresh_locks: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        SnapshotCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
            refresh_locks: AsyncMutex::new(HashMap::new()),
        }
    }

    /// Return the cached snapshot for `sheet` while it is fresh, otherwise
    /// fetch, normalize and store a new one.
    pub async fn get_or_refresh(
        &self,
        source: &dyn SheetSource,
        sheet: &str,
    ) -> Result<Arc<Snapshot>, AppError> {
        if let Some(snapshot) = self.fresh(sheet) {
            return Ok(snapshot);
        }

        let lock = {
            let mut locks = self.refresh_locks.lock().await;
            Arc::clone(locks.entry(sheet.to_string()).or_default())
        };
        let _guard = lock.lock().await;

        // Another request may have finished the refresh while we waited.
        if let Some(snapshot) = self.fresh(sheet) {
            log::debug!("sheet {sheet:?} refreshed while waiting for the lock");
            return Ok(snapshot);
        }

        log::info!("refreshing snapshot for sheet {sheet:?}");
        let grid = source.fetch_grid(sheet).await?;
        let snapshot = Arc::new(snapshot::normalize(&grid));
        log::debug!(
            "sheet {sheet:?}: {} headers, {} rows",
            snapshot.headers.len(),
            snapshot.rows.len()
        );

        self.entries.lock().unwrap().insert(
            sheet.to_string(),
            CacheEntry {
                snapshot: Arc::clone(&snapshot),
                fetched_at: Instant::now(),
            },
        );

        Ok(snapshot)
    }

    fn fresh(&self, sheet: &str) -> Option<Arc<Snapshot>> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(sheet)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{GridCell, GridRow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeSource {
        fn new() -> Self {
            FakeSource {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            FakeSource {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SheetSource for FakeSource {
        async fn fetch_grid(&self, _sheet: &str) -> Result<Vec<GridRow>, AppError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Fetch("simulated outage".into()));
            }
            Ok(vec![
                GridRow {
                    values: vec![GridCell {
                        formatted_value: Some("Name".into()),
                        effective_format: None,
                    }],
                },
                GridRow {
                    values: vec![GridCell {
                        formatted_value: Some(format!("fetch-{n}")),
                        effective_format: None,
                    }],
                },
            ])
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_refetch() {
        let cache = SnapshotCache::new(Duration::from_secs(120));
        let source = FakeSource::new();

        let first = cache.get_or_refresh(&source, "Agentes").await.unwrap();
        let second = cache.get_or_refresh(&source, "Agentes").await.unwrap();

        assert_eq!(source.calls(), 1);
        assert_eq!(first.version, second.version);
        assert_eq!(second.rows[0][0], "fetch-0");
    }

    #[tokio::test]
    async fn expired_entry_triggers_refetch() {
        let cache = SnapshotCache::new(Duration::from_millis(20));
        let source = FakeSource::new();

        cache.get_or_refresh(&source, "Agentes").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let refreshed = cache.get_or_refresh(&source, "Agentes").await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(refreshed.rows[0][0], "fetch-1");
    }

    #[tokio::test]
    async fn sheets_are_cached_independently() {
        let cache = SnapshotCache::new(Duration::from_secs(120));
        let source = FakeSource::new();

        cache.get_or_refresh(&source, "Agentes").await.unwrap();
        cache.get_or_refresh(&source, "Metricas PIC").await.unwrap();
        cache.get_or_refresh(&source, "Agentes").await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_entry() {
        let cache = SnapshotCache::new(Duration::from_millis(20));
        let good = FakeSource::new();
        let bad = FakeSource::failing();

        let first = cache.get_or_refresh(&good, "Agentes").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        let err = cache.get_or_refresh(&bad, "Agentes").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));

        // The stale entry is still there for the next refresh attempt.
        let recovered = cache.get_or_refresh(&good, "Agentes").await.unwrap();
        assert_ne!(first.version, recovered.version);
    }

    #[tokio::test]
    async fn concurrent_misses_fetch_once() {
        let cache = Arc::new(SnapshotCache::new(Duration::from_secs(120)));
        let source = Arc::new(FakeSource::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let source = Arc::clone(&source);
            handles.push(tokio::spawn(async move {
                cache.get_or_refresh(source.as_ref(), "Agentes").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(source.calls(), 1);
    }
}
