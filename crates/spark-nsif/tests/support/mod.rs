//! Test doubles for the external collaborators `spark_nsif` only consumes by contract:
//! a semilattice view, a directory watchable, and a namespace interface factory.
//!
//! Kept in `tests/support/` (a directory without a matching `tests/support.rs`) so cargo
//! does not treat it as its own test binary; each integration test pulls it in with
//! `mod support;`.

use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use spark_nsif::directory::{
    DirectoryWatchable, ReactorCard, SemilatticeView, TableReactorWatch, TableSnapshot,
};
use spark_nsif::ids::{PeerId, TableId};
use spark_nsif::namespace_interface::{NamespaceInterface, NamespaceInterfaceFactory, SharedContext};
use spark_nsif::thread_state::RegionMapHandle;

/// Retries `check` every 5ms until it reports `true` or `timeout` elapses.
///
/// Used instead of a single fixed sleep wherever a test must observe an effect produced
/// by another task on a worker thread (projector refresh, C4 expiry) without depending on
/// exact scheduling.
pub async fn wait_for<F, Fut>(mut check: F, timeout: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// A [`SemilatticeView`] whose snapshot the test controls directly via [`publish`].
pub struct FakeSemilatticeView {
    snapshot: Mutex<TableSnapshot>,
    notify: Notify,
}

impl FakeSemilatticeView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(TableSnapshot::new()),
            notify: Notify::new(),
        })
    }

    /// Replace the published snapshot and wake the projector's `changed()` waiter.
    ///
    /// Uses `notify_one`, which (unlike `notify_waiters`) banks a permit for a future
    /// waiter even if no task is currently suspended in `changed()` — the projector's own
    /// subscription loop may not have reached its `changed().await` yet when a test
    /// publishes right after constructing the repository.
    pub fn publish(&self, snapshot: TableSnapshot) {
        *self.snapshot.lock().expect("snapshot mutex poisoned") = snapshot;
        self.notify.notify_one();
    }
}

#[async_trait]
impl SemilatticeView for FakeSemilatticeView {
    fn snapshot(&self) -> TableSnapshot {
        self.snapshot.lock().expect("snapshot mutex poisoned").clone()
    }

    async fn changed(&self) {
        self.notify.notified().await;
    }
}

struct FakeReactorWatch;

#[async_trait]
impl TableReactorWatch for FakeReactorWatch {
    fn current(&self) -> Arc<HashMap<PeerId, ReactorCard>> {
        Arc::new(HashMap::new())
    }

    async fn changed(&self) {
        std::future::pending::<()>().await;
    }
}

/// A [`DirectoryWatchable`] whose per-table views never change; the repository's own
/// lifecycle does not depend on directory updates, only on being able to construct one.
pub struct FakeDirectoryWatchable;

impl FakeDirectoryWatchable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl DirectoryWatchable for FakeDirectoryWatchable {
    fn watch_table(&self, _table: TableId) -> Arc<dyn TableReactorWatch> {
        Arc::new(FakeReactorWatch)
    }
}

/// Controls whether a [`FakeInterface`]'s `wait_ready` resolves immediately or never, so
/// tests can exercise both the happy path and interruption during stage 3.
#[derive(Clone)]
pub enum Readiness {
    Immediate,
    Never,
}

struct FakeInterface {
    readiness: Readiness,
}

#[async_trait(?Send)]
impl NamespaceInterface for FakeInterface {
    async fn wait_ready(&self) {
        match self.readiness {
            Readiness::Immediate => {}
            Readiness::Never => std::future::pending::<()>().await,
        }
    }
}

/// A [`NamespaceInterfaceFactory`] that counts constructions per table (for coalescing /
/// re-construction-after-expiry assertions), lets a test dial in per-table readiness, and
/// records the [`RegionMapHandle`] handed to each construction so a test can prove a
/// long-lived interface keeps observing later C1 refreshes through it (not just a
/// construction-time snapshot).
pub struct FakeFactory {
    readiness: Mutex<HashMap<TableId, Readiness>>,
    constructions: Mutex<HashMap<TableId, u32>>,
    construction_total: AtomicU32,
    region_handles: Mutex<HashMap<TableId, RegionMapHandle>>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            readiness: Mutex::new(HashMap::new()),
            constructions: Mutex::new(HashMap::new()),
            construction_total: AtomicU32::new(0),
            region_handles: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_readiness(&self, table: TableId, readiness: Readiness) {
        self.readiness
            .lock()
            .expect("readiness mutex poisoned")
            .insert(table, readiness);
    }

    pub fn construction_count(&self, table: TableId) -> u32 {
        *self
            .constructions
            .lock()
            .expect("constructions mutex poisoned")
            .get(&table)
            .unwrap_or(&0)
    }

    pub fn construction_total(&self) -> u32 {
        self.construction_total.load(Ordering::Acquire)
    }

    /// Re-reads the region map through the handle captured at construction time for
    /// `table`, as the constructed interface itself would. Must be called on the worker
    /// thread that owns `table`'s entry, since [`RegionMapHandle::current`] reads a
    /// thread-local store.
    pub fn region_map_via_handle(&self, table: TableId) -> Option<spark_nsif::RegionMap<spark_nsif::ids::MachineId>> {
        self.region_handles
            .lock()
            .expect("region handles mutex poisoned")
            .get(&table)
            .map(RegionMapHandle::current)
    }
}

#[async_trait(?Send)]
impl NamespaceInterfaceFactory for FakeFactory {
    async fn construct(
        &self,
        table: TableId,
        _messaging: Arc<dyn spark_nsif::messaging::MessagingHandle>,
        region_map: RegionMapHandle,
        _reactor_watch: Arc<dyn TableReactorWatch>,
        _shared_context: SharedContext,
    ) -> Rc<dyn NamespaceInterface> {
        {
            let mut constructions = self.constructions.lock().expect("constructions mutex poisoned");
            *constructions.entry(table).or_insert(0) += 1;
        }
        self.construction_total.fetch_add(1, Ordering::AcqRel);
        self.region_handles
            .lock()
            .expect("region handles mutex poisoned")
            .insert(table, region_map);

        let readiness = {
            let readiness = self.readiness.lock().expect("readiness mutex poisoned");
            match readiness.get(&table) {
                Some(Readiness::Never) => Readiness::Never,
                _ => Readiness::Immediate,
            }
        };
        Rc::new(FakeInterface { readiness })
    }
}
