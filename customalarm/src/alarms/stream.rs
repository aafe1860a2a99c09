//! Snapshot streams
//!
//! Backends publish whole-collection snapshots on a `tokio::sync::watch`
//! channel. Each snapshot carries a version that grows by one per
//! successful mutation, so a subscriber that only sees the latest value
//! can still tell how many states it skipped.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// Immutable copy of a collection at one point in time
#[derive(Debug)]
pub struct Snapshot<T> {
    version: u64,
    items: Arc<[T]>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn empty() -> Self {
        Self::initial(Vec::new())
    }

    /// Version 0 snapshot, used when a backend starts with existing data
    pub fn initial(items: Vec<T>) -> Self {
        Self {
            version: 0,
            items: items.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Successor snapshot. The current one is left untouched.
    pub fn next(&self, items: Vec<T>) -> Self {
        Self {
            version: self.version + 1,
            items: items.into(),
        }
    }
}

#[async_trait]
trait SnapshotSource<T>: Send + Sync {
    fn current(&self) -> (u64, T);
    fn mark_seen(&mut self) -> (u64, T);
    async fn changed(&mut self) -> bool;
    fn boxed_clone(&self) -> Box<dyn SnapshotSource<T>>;
}

struct Projected<S, F> {
    rx: watch::Receiver<Snapshot<S>>,
    project: Arc<F>,
}

#[async_trait]
impl<S, T, F> SnapshotSource<T> for Projected<S, F>
where
    S: Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(&[S]) -> T + Send + Sync + 'static,
{
    fn current(&self) -> (u64, T) {
        // Clone the Arc and release the watch lock before projecting
        let snapshot = self.rx.borrow().clone();
        (snapshot.version, (self.project)(&snapshot.items))
    }

    fn mark_seen(&mut self) -> (u64, T) {
        let snapshot = self.rx.borrow_and_update().clone();
        (snapshot.version, (self.project)(&snapshot.items))
    }

    async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    fn boxed_clone(&self) -> Box<dyn SnapshotSource<T>> {
        Box::new(Projected {
            rx: self.rx.clone(),
            project: Arc::clone(&self.project),
        })
    }
}

/// Subscriber to a backend's snapshots, projected to `T`.
///
/// The first `next()` yields the current value immediately; every later
/// call waits for the next change. Cloning creates an independent
/// subscriber that again starts with the latest value.
pub struct AlarmStream<T> {
    source: Box<dyn SnapshotSource<T>>,
    primed: bool,
    version: u64,
}

impl<T: Send + 'static> AlarmStream<T> {
    pub(crate) fn project<S, F>(rx: watch::Receiver<Snapshot<S>>, project: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(&[S]) -> T + Send + Sync + 'static,
    {
        let version = rx.borrow().version;
        Self {
            source: Box::new(Projected {
                rx,
                project: Arc::new(project),
            }),
            primed: false,
            version,
        }
    }

    /// Next value, or `None` once the publishing backend is gone.
    pub async fn next(&mut self) -> Option<T> {
        if self.primed && !self.source.changed().await {
            return None;
        }
        self.primed = true;

        let (version, value) = self.source.mark_seen();
        self.version = version;
        Some(value)
    }

    /// Current value without waiting and without consuming a change.
    pub fn latest(&self) -> T {
        self.source.current().1
    }

    /// Version of the snapshot last returned by `next()`
    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T> Clone for AlarmStream<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.boxed_clone(),
            primed: false,
            version: self.version,
        }
    }
}

impl<T> std::fmt::Debug for AlarmStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmStream")
            .field("primed", &self.primed)
            .field("version", &self.version)
            .finish()
    }
}
