//! # FleetSupervisor: reconciliation rounds and graceful shutdown.
//!
//! The supervisor owns the event bus, the fleet map, and the runtime
//! cancellation token. It obtains declaration sets from the config source,
//! classifies them against the running fleet, and applies only the deltas —
//! tasks whose declaration did not change are never disturbed.
//!
//! ## High-level architecture
//! ```text
//! run():
//!   source.load() ──► start(initial) ──► one eager round
//!          │
//!          ▼
//!   loop every reload_period:
//!     source.load() ──► reconcile(live, declared)
//!                           ├─ added     → validate → spawn Worker → insert into Fleet
//!                           ├─ updated   → validate → TaskSlot::stage(descriptor)
//!                           ├─ removed   → TaskSlot::request_termination()
//!                           └─ unchanged → no action
//!     (a failed load abandons the round; the fleet keeps running)
//!
//! Shutdown path (OS signal or shutdown()):
//!   runtime_token.cancel() → every worker observes the same broadcast
//!   drain_with_grace(cfg.grace):
//!     ├─ all joined   → AllStoppedWithin
//!     └─ grace passed → GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - Rounds never overlap: the next reload is not read until the previous
//!   round is fully applied.
//! - Applying a round never waits for a worker to stop; termination is
//!   confirmed asynchronously through the completion channel, which is also
//!   the only path that removes a fleet entry.
//! - A rejected descriptor skips only that task; the rest of the round
//!   proceeds.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::FleetConfig;
use crate::core::fleet::{Fleet, Handle};
use crate::core::reconcile::reconcile;
use crate::core::shutdown;
use crate::core::slot::TaskSlot;
use crate::core::worker::Worker;
use crate::descriptor::TaskDescriptor;
use crate::error::FleetError;
use crate::events::{Bus, Event, EventKind};
use crate::fetch::Fetch;
use crate::sink::Sink;
use crate::source::ConfigSource;
use crate::subscribers::Subscriber;

/// Coordinates the fleet: spawns workers, applies declaration deltas, and
/// drives orderly shutdown.
pub struct FleetSupervisor {
    cfg: FleetConfig,
    bus: Bus,
    source: Arc<dyn ConfigSource>,
    fetcher: Arc<dyn Fetch>,
    sink: Arc<dyn Sink>,
    subscribers: Vec<Arc<dyn Subscriber>>,
    fleet: Arc<Fleet>,
    token: CancellationToken,
    done_tx: mpsc::UnboundedSender<String>,
    done_rx: StdMutex<Option<mpsc::UnboundedReceiver<String>>>,
}

impl FleetSupervisor {
    /// Creates a supervisor over the given collaborators.
    ///
    /// Nothing runs until [`start`](Self::start) (or [`run`](Self::run),
    /// which calls it) is invoked.
    pub fn new(
        cfg: FleetConfig,
        source: Arc<dyn ConfigSource>,
        fetcher: Arc<dyn Fetch>,
        sink: Arc<dyn Sink>,
        subscribers: Vec<Arc<dyn Subscriber>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let fleet = Fleet::new(bus.clone());
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        Self {
            cfg,
            bus,
            source,
            fetcher,
            sink,
            subscribers,
            fleet,
            token: CancellationToken::new(),
            done_tx,
            done_rx: StdMutex::new(Some(done_rx)),
        }
    }

    /// Starts the fleet from an initial declaration set.
    ///
    /// Performs one reconciliation round against the empty fleet, so every
    /// declared task is spawned. A descriptor that fails validation is
    /// reported and skipped; it never prevents other tasks from starting.
    ///
    /// Errors with [`FleetError::AlreadyStarted`] on a second call.
    pub async fn start(
        &self,
        declared: HashMap<String, TaskDescriptor>,
    ) -> Result<(), FleetError> {
        let done_rx = {
            let mut guard = self.done_rx.lock().unwrap_or_else(|e| e.into_inner());
            guard.take().ok_or(FleetError::AlreadyStarted)?
        };

        self.spawn_subscriber_listener();
        self.fleet.clone().spawn_listener(done_rx, self.token.clone());

        self.apply_round(declared).await;
        Ok(())
    }

    /// Loads a fresh declaration set and applies one reconciliation round.
    ///
    /// Never blocks waiting for a worker to stop: removals and updates are
    /// staged on the workers' slots and take effect at each worker's next
    /// tick. A failed load leaves the fleet on its last-known-good state.
    pub async fn reload(&self) -> Result<(), FleetError> {
        let declared = self.source.load().await?;
        self.apply_round(declared).await;
        Ok(())
    }

    /// Requests shutdown of the whole fleet.
    ///
    /// One-shot and irrevocable; every worker observes the same broadcast
    /// cancellation. Waiting for the drain is [`run`](Self::run)'s job.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Runs the supervisor until shutdown.
    ///
    /// Loads the initial declaration set (a failure here is fatal), starts
    /// the fleet, then reconciles on the configured cadence. Reload
    /// failures are published and do not tear down running tasks. On an OS
    /// termination signal or [`shutdown`](Self::shutdown), drains every
    /// worker within [`FleetConfig::grace`].
    pub async fn run(&self) -> Result<(), FleetError> {
        let initial = self.source.load().await?;
        self.start(initial).await?;

        let reload_loop = async {
            let period = self.cfg.reload_period;
            let mut timer = time::interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if let Err(e) = self.reload().await {
                    self.bus
                        .publish(Event::now(EventKind::ReloadFailed).with_reason(e.to_string()));
                }
            }
        };

        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {}
            _ = self.token.cancelled() => {}
            _ = reload_loop => {}
        }

        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        self.token.cancel();
        self.drain_with_grace().await
    }

    /// Returns the sorted names of currently live tasks.
    pub async fn tasks(&self) -> Vec<String> {
        self.fleet.names().await
    }

    /// Applies one classified declaration round to the fleet.
    ///
    /// Per task name, removal is staged before any update would be: a name
    /// both dropped and redeclared lands as `removed` now and `added` on a
    /// later round, once its old worker has drained.
    async fn apply_round(&self, mut declared: HashMap<String, TaskDescriptor>) {
        let live = self.fleet.live_view().await;
        let plan = reconcile(&live, &declared);

        for name in &plan.removed {
            self.fleet.mark_removed(name).await;
        }

        for name in &plan.updated {
            let Some(descriptor) = declared.remove(name) else {
                continue;
            };
            if let Err(e) = descriptor.validate() {
                self.bus.publish(
                    Event::now(EventKind::TaskRejected)
                        .with_task(name.as_str())
                        .with_reason(e.to_string()),
                );
                continue;
            }
            if self.fleet.stage(name, descriptor).await {
                self.bus
                    .publish(Event::now(EventKind::ReloadStaged).with_task(name.as_str()));
            }
        }

        for name in &plan.added {
            let Some(descriptor) = declared.remove(name) else {
                continue;
            };
            self.spawn_worker(descriptor).await;
        }
    }

    /// Validates and spawns one worker, registering it in the fleet.
    async fn spawn_worker(&self, descriptor: TaskDescriptor) {
        let name = descriptor.name.clone();

        if let Err(e) = descriptor.validate() {
            self.bus.publish(
                Event::now(EventKind::TaskRejected)
                    .with_task(name.as_str())
                    .with_reason(e.to_string()),
            );
            return;
        }
        if self.fleet.contains(&name).await {
            // Prior worker still draining; the next round re-adds the name.
            self.bus.publish(
                Event::now(EventKind::TaskRejected)
                    .with_task(name.as_str())
                    .with_reason("name still draining"),
            );
            return;
        }

        let slot = Arc::new(TaskSlot::new(descriptor.clone()));
        let worker = Worker::new(
            descriptor,
            slot.clone(),
            self.fetcher.clone(),
            self.sink.clone(),
            self.bus.clone(),
            self.done_tx.clone(),
        );
        let join = tokio::spawn(worker.run(self.token.child_token()));

        self.fleet.insert(name.clone(), Handle { slot, join }).await;
        self.bus
            .publish(Event::now(EventKind::TaskSpawned).with_task(name.as_str()));
    }

    /// Forwards bus events to the registered subscribers.
    fn spawn_subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let subs = self.subscribers.clone();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        for sub in &subs {
                            sub.handle(&ev).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Waits for every worker to finish within the configured grace period.
    async fn drain_with_grace(&self) -> Result<(), FleetError> {
        let handles = self.fleet.drain().await;
        let pending: StdMutex<BTreeSet<String>> =
            StdMutex::new(handles.iter().map(|(name, _)| name.clone()).collect());

        let drain = async {
            for (name, handle) in handles {
                let _ = handle.join.await;
                pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&name);
            }
        };

        match time::timeout(self.cfg.grace, drain).await {
            Ok(()) => {
                self.bus.publish(Event::now(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::now(EventKind::GraceExceeded));
                let stuck = pending
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .iter()
                    .cloned()
                    .collect();
                Err(FleetError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use crate::error::{FetchError, SinkError, SourceError};
    use crate::sink::Record;

    fn d(name: &str, interval_ms: u64, endpoint: &str, enabled: bool) -> TaskDescriptor {
        TaskDescriptor {
            name: name.to_string(),
            enabled,
            interval_ms,
            endpoint: endpoint.to_string(),
        }
    }

    fn declared(descs: &[TaskDescriptor]) -> HashMap<String, TaskDescriptor> {
        descs.iter().map(|d| (d.name.clone(), d.clone())).collect()
    }

    struct StubSource {
        declared: StdMutex<HashMap<String, TaskDescriptor>>,
        fail: AtomicBool,
    }

    impl StubSource {
        fn new(set: HashMap<String, TaskDescriptor>) -> Arc<Self> {
            Arc::new(Self {
                declared: StdMutex::new(set),
                fail: AtomicBool::new(false),
            })
        }

        fn set(&self, set: HashMap<String, TaskDescriptor>) {
            *self.declared.lock().unwrap() = set;
        }

        fn set_failing(&self, on: bool) {
            self.fail.store(on, Ordering::Relaxed);
        }
    }

    #[async_trait]
    impl ConfigSource for StubSource {
        async fn load(&self) -> Result<HashMap<String, TaskDescriptor>, SourceError> {
            if self.fail.load(Ordering::Relaxed) {
                return Err(SourceError::Io(std::io::Error::other("unreadable")));
            }
            Ok(self.declared.lock().unwrap().clone())
        }
    }

    struct StubFetch {
        endpoints: StdMutex<Vec<String>>,
    }

    impl StubFetch {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                endpoints: StdMutex::new(Vec::new()),
            })
        }

        fn hits(&self) -> usize {
            self.endpoints.lock().unwrap().len()
        }

        fn hits_for(&self, needle: &str) -> usize {
            self.endpoints
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.contains(needle))
                .count()
        }

        fn last_endpoint(&self) -> Option<String> {
            self.endpoints.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Fetch for StubFetch {
        async fn fetch(&self, endpoint: &str) -> Result<Value, FetchError> {
            self.endpoints.lock().unwrap().push(endpoint.to_string());
            Ok(json!({ "status": "ok" }))
        }
    }

    struct NullSink;

    #[async_trait]
    impl Sink for NullSink {
        async fn publish(&self, _record: Record) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn supervisor(source: Arc<StubSource>) -> (FleetSupervisor, Arc<StubFetch>) {
        let fetch = StubFetch::new();
        let sup = FleetSupervisor::new(
            FleetConfig::default(),
            source,
            fetch.clone(),
            Arc::new(NullSink),
            Vec::new(),
        );
        (sup, fetch)
    }

    async fn wait_for_tasks(sup: &FleetSupervisor, expected: &[&str]) {
        for _ in 0..200 {
            if sup.tasks().await == expected {
                return;
            }
            time::sleep(Duration::from_millis(5)).await;
        }
        panic!("fleet never reached {expected:?}, got {:?}", sup.tasks().await);
    }

    fn count_kind(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> usize {
        let mut n = 0;
        loop {
            match rx.try_recv() {
                Ok(ev) if ev.kind == kind => n += 1,
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        n
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_spawns_one_worker_per_descriptor() {
        let set = declared(&[d("a", 50, "http://h/a", true), d("b", 70, "http://h/b", true)]);
        let src = StubSource::new(set.clone());
        let (sup, fetch) = supervisor(src);

        sup.start(set).await.unwrap();
        assert_eq!(sup.tasks().await, ["a", "b"]);

        // Each worker runs the parameters it was declared with.
        let live = sup.fleet.live_view().await;
        assert_eq!(live["a"].interval_ms, 50);
        assert_eq!(live["b"].endpoint, "http://h/b");
        assert!(live["a"].enabled && live["b"].enabled);

        time::sleep(Duration::from_millis(150)).await;
        assert!(fetch.hits_for("/a") >= 1);
        assert!(fetch.hits_for("/b") >= 1);

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let src = StubSource::new(HashMap::new());
        let (sup, _) = supervisor(src);

        sup.start(HashMap::new()).await.unwrap();
        let err = sup.start(HashMap::new()).await.unwrap_err();
        assert!(matches!(err, FleetError::AlreadyStarted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_fleet_is_valid_and_can_grow() {
        let src = StubSource::new(HashMap::new());
        let (sup, fetch) = supervisor(src.clone());

        sup.start(HashMap::new()).await.unwrap();
        assert!(sup.tasks().await.is_empty());

        src.set(declared(&[d("a", 50, "http://h/a", true)]));
        sup.reload().await.unwrap();
        assert_eq!(sup.tasks().await, ["a"]);

        time::sleep(Duration::from_millis(60)).await;
        assert!(fetch.hits_for("/a") >= 1);

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_drops_removed_task_and_keeps_others_ticking() {
        let set = declared(&[d("a", 50, "http://h/a", true), d("b", 70, "http://h/b", true)]);
        let src = StubSource::new(set.clone());
        let (sup, fetch) = supervisor(src.clone());
        sup.start(set).await.unwrap();

        // 160ms: no tick of a (50ms) or b (70ms) is due at the exact wake-up
        // instant, so the round below races with nothing.
        time::sleep(Duration::from_millis(160)).await;
        let b_before = fetch.hits_for("/b");
        assert!(b_before >= 1);

        src.set(declared(&[d("b", 70, "http://h/b", true)]));
        sup.reload().await.unwrap();
        // Removal is asynchronous: the entry survives until a's next tick.
        assert_eq!(sup.tasks().await, ["a", "b"]);

        wait_for_tasks(&sup, &["b"]).await;

        time::sleep(Duration::from_millis(150)).await;
        assert!(fetch.hits_for("/b") > b_before, "b must keep ticking");

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_identical_reload_stages_nothing() {
        let set = declared(&[d("a", 100, "http://h/a", true)]);
        let src = StubSource::new(set.clone());
        let (sup, _) = supervisor(src.clone());
        sup.start(set).await.unwrap();

        let mut rx = sup.bus.subscribe();

        src.set(declared(&[d("a", 200, "http://h/a", true)]));
        sup.reload().await.unwrap();
        assert_eq!(count_kind(&mut rx, EventKind::ReloadStaged), 1);

        // Let the worker apply the staged descriptor at its next tick.
        time::sleep(Duration::from_millis(120)).await;

        sup.reload().await.unwrap();
        sup.reload().await.unwrap();
        assert_eq!(
            count_kind(&mut rx, EventKind::ReloadStaged),
            0,
            "re-declaring the applied parameters must be a no-op"
        );

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_updated_endpoint_used_on_next_fetch() {
        let set = declared(&[d("a", 50, "http://h/one", true)]);
        let src = StubSource::new(set.clone());
        let (sup, fetch) = supervisor(src.clone());
        sup.start(set).await.unwrap();

        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fetch.last_endpoint().unwrap(), "http://h/one");

        src.set(declared(&[d("a", 50, "http://h/two", true)]));
        sup.reload().await.unwrap();

        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fetch.last_endpoint().unwrap(), "http://h/two");

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_removed_name_respawns_only_after_drain() {
        let set = declared(&[d("a", 50, "http://h/a", true)]);
        let src = StubSource::new(set.clone());
        let (sup, fetch) = supervisor(src.clone());
        sup.start(set).await.unwrap();

        src.set(HashMap::new());
        sup.reload().await.unwrap();
        wait_for_tasks(&sup, &[]).await;

        src.set(declared(&[d("a", 50, "http://h/a", true)]));
        sup.reload().await.unwrap();
        assert_eq!(sup.tasks().await, ["a"]);

        let before = fetch.hits();
        time::sleep(Duration::from_millis(120)).await;
        assert!(fetch.hits() > before, "respawned task must tick again");

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reload_keeps_last_known_good_fleet() {
        let set = declared(&[d("a", 50, "http://h/a", true)]);
        let src = StubSource::new(set.clone());
        let (sup, fetch) = supervisor(src.clone());
        sup.start(set).await.unwrap();

        time::sleep(Duration::from_millis(60)).await;
        let before = fetch.hits();

        src.set_failing(true);
        assert!(sup.reload().await.is_err());
        assert_eq!(sup.tasks().await, ["a"]);

        time::sleep(Duration::from_millis(100)).await;
        assert!(fetch.hits() > before, "fleet keeps operating after a bad round");

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_descriptor_skips_only_that_task() {
        let set = declared(&[d("a", 50, "http://h/a", true), d("c", 0, "http://h/c", true)]);
        let src = StubSource::new(set.clone());
        let (sup, _) = supervisor(src);

        let result = sup.start(set).await;
        assert!(result.is_ok(), "one bad target must not prevent the rest");
        assert_eq!(sup.tasks().await, ["a"]);

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_all_workers() {
        let set = declared(&[d("a", 50, "http://h/a", true), d("b", 70, "http://h/b", true)]);
        let src = StubSource::new(set.clone());
        let (sup, _) = supervisor(src);
        sup.start(set).await.unwrap();

        sup.shutdown();
        sup.drain_with_grace().await.unwrap();
        assert!(sup.tasks().await.is_empty());
    }
}
