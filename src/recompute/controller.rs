//! Recompute controller worker.
//!
//! The controller owns a dedicated thread that listens to both store change
//! feeds plus a control channel. Store notifications and range changes only
//! arm the coalescer; the pass itself runs once the debounce window elapses
//! without further triggers. Finished dashboards are published on a bounded
//! channel with `try_send`, so a slow consumer never stalls the worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, select, Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, info, warn};

use crate::chart::ChartSpec;
use crate::error::{TallyError, TallyResult};
use crate::record::Record;
use crate::storage::{StoreChange, VersionedStore};
use crate::time::DateRange;

use super::coalesce::Coalescer;
use super::context::{Dashboard, RecomputeContext};

/// How long the worker sleeps when no pass is pending.
const IDLE_TICK: Duration = Duration::from_millis(250);

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Quiet period after the last trigger before a pass runs.
    pub debounce: Duration,
    /// Max queued control messages (range changes, flushes).
    pub control_queue_capacity: usize,
    /// Max unconsumed dashboards before new ones are dropped.
    pub frame_queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(30),
            control_queue_capacity: 64,
            frame_queue_capacity: 16,
        }
    }
}

#[derive(Debug)]
enum ControlMsg {
    SetRange(DateRange),
    ClearRange,
    Flush { reply: Sender<TallyResult<Dashboard>> },
    Shutdown,
}

#[derive(Debug, Default)]
struct ControllerStats {
    passes: AtomicU64,
    aggregations: AtomicU64,
    dropped_frames: AtomicU64,
}

struct Worker {
    records: Arc<dyn VersionedStore<Record>>,
    charts: Arc<dyn VersionedStore<ChartSpec>>,
    ctx: RecomputeContext,
    coalescer: Coalescer,
    frames_tx: Sender<Dashboard>,
    latest: Arc<Mutex<Option<Dashboard>>>,
    stats: Arc<ControllerStats>,
}

/// Debounced recompute driver.
#[allow(missing_docs)]
pub struct RecomputeController {
    control_tx: Sender<ControlMsg>,
    frames_rx: Receiver<Dashboard>,
    latest: Arc<Mutex<Option<Dashboard>>>,
    stats: Arc<ControllerStats>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for RecomputeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecomputeController")
            .field("passes", &self.passes())
            .field("dropped_frames", &self.dropped_frames())
            .finish_non_exhaustive()
    }
}

impl RecomputeController {
    /// Subscribes to both stores and starts the worker thread.
    ///
    /// If either store already holds data, a first pass is scheduled right
    /// away so the dashboard reflects what is there.
    pub fn spawn(
        records: Arc<dyn VersionedStore<Record>>,
        charts: Arc<dyn VersionedStore<ChartSpec>>,
        cfg: ControllerConfig,
    ) -> TallyResult<Self> {
        let (control_tx, control_rx) = bounded::<ControlMsg>(cfg.control_queue_capacity.max(1));
        let (frames_tx, frames_rx) = bounded::<Dashboard>(cfg.frame_queue_capacity.max(1));

        let records_rx = records.subscribe();
        let charts_rx = charts.subscribe();

        let latest = Arc::new(Mutex::new(None));
        let stats = Arc::new(ControllerStats::default());

        let mut coalescer = Coalescer::new(cfg.debounce);
        if records.version() > 0 || charts.version() > 0 {
            coalescer.trigger(Instant::now());
        }

        let worker = Worker {
            records,
            charts,
            ctx: RecomputeContext::new(),
            coalescer,
            frames_tx,
            latest: Arc::clone(&latest),
            stats: Arc::clone(&stats),
        };

        let join = thread::Builder::new()
            .name("tallyboard-recompute".to_string())
            .spawn(move || worker.run(control_rx, records_rx, charts_rx))
            .map_err(|e| TallyError::internal(format!("failed to spawn recompute worker: {e}")))?;

        info!(debounce_ms = cfg.debounce.as_millis() as u64, "recompute controller started");

        Ok(Self {
            control_tx,
            frames_rx,
            latest,
            stats,
            join: Mutex::new(Some(join)),
        })
    }

    fn send(&self, msg: ControlMsg) -> TallyResult<()> {
        self.control_tx
            .send(msg)
            .map_err(|_| TallyError::disconnected("recompute_control"))
    }

    /// Pins the active range and schedules a pass.
    pub fn set_range(&self, range: DateRange) -> TallyResult<()> {
        self.send(ControlMsg::SetRange(range))
    }

    /// Falls back to the full data bounds and schedules a pass.
    pub fn clear_range(&self) -> TallyResult<()> {
        self.send(ControlMsg::ClearRange)
    }

    /// Runs a pass now, bypassing the debounce window, and returns its dashboard.
    ///
    /// The dashboard is also published on the frame channel.
    pub fn flush(&self) -> TallyResult<Dashboard> {
        let (reply_tx, reply_rx) = bounded::<TallyResult<Dashboard>>(1);
        self.send(ControlMsg::Flush { reply: reply_tx })?;
        reply_rx
            .recv()
            .map_err(|_| TallyError::disconnected("recompute_control"))?
    }

    /// Published dashboards, oldest first.
    #[must_use]
    pub const fn frames(&self) -> &Receiver<Dashboard> {
        &self.frames_rx
    }

    /// Waits up to `timeout` for the next published dashboard.
    pub fn next_frame(&self, timeout: Duration) -> TallyResult<Dashboard> {
        self.frames_rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => TallyError::Timeout {
                what: "dashboard frame",
                timeout_ms: timeout.as_millis() as u64,
            },
            RecvTimeoutError::Disconnected => TallyError::disconnected("recompute_frames"),
        })
    }

    /// The most recent dashboard, whether or not it was consumed.
    #[must_use]
    pub fn latest(&self) -> Option<Dashboard> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    #[must_use]
    pub fn passes(&self) -> u64 {
        self.stats.passes.load(Ordering::Relaxed)
    }

    /// Per-chart aggregations run so far.
    #[must_use]
    pub fn aggregations(&self) -> u64 {
        self.stats.aggregations.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.stats.dropped_frames.load(Ordering::Relaxed)
    }
}

impl Drop for RecomputeController {
    fn drop(&mut self) {
        // The worker holds no sender of its own control channel, so a failed
        // send means it already exited.
        let _ = self.control_tx.send(ControlMsg::Shutdown);
        if let Ok(mut guard) = self.join.lock() {
            if let Some(handle) = guard.take() {
                if handle.join().is_err() {
                    warn!("recompute worker panicked");
                }
            }
        }
    }
}

impl Worker {
    fn run(
        mut self,
        control_rx: Receiver<ControlMsg>,
        mut records_rx: Receiver<StoreChange>,
        mut charts_rx: Receiver<StoreChange>,
    ) {
        let mut records_closed = false;
        let mut charts_closed = false;

        loop {
            let wait = self
                .coalescer
                .time_until_due(Instant::now())
                .unwrap_or(IDLE_TICK);

            select! {
                recv(control_rx) -> msg => match msg {
                    Ok(ControlMsg::SetRange(range)) => {
                        self.ctx.set_range(range);
                        self.coalescer.trigger(Instant::now());
                    }
                    Ok(ControlMsg::ClearRange) => {
                        self.ctx.clear_range();
                        self.coalescer.trigger(Instant::now());
                    }
                    Ok(ControlMsg::Flush { reply }) => {
                        self.coalescer.cancel();
                        let _ = reply.send(self.pass());
                    }
                    Ok(ControlMsg::Shutdown) | Err(_) => break,
                },
                recv(records_rx) -> msg => match msg {
                    Ok(change) => self.on_change(change),
                    Err(_) => records_closed = true,
                },
                recv(charts_rx) -> msg => match msg {
                    Ok(change) => self.on_change(change),
                    Err(_) => charts_closed = true,
                },
                default(wait) => {}
            }

            // A dropped store disconnects its feed; stop selecting on it.
            if records_closed {
                records_rx = never();
                records_closed = false;
            }
            if charts_closed {
                charts_rx = never();
                charts_closed = false;
            }

            if self.coalescer.poll(Instant::now()) {
                if let Err(e) = self.pass() {
                    warn!(error = %e, "recompute pass failed");
                }
            }
        }
        info!(passes = self.ctx.passes(), "recompute worker stopped");
    }

    fn on_change(&mut self, change: StoreChange) {
        debug!(store = change.store, version = change.version, "store changed");
        self.coalescer.trigger(Instant::now());
    }

    fn pass(&mut self) -> TallyResult<Dashboard> {
        self.ctx.refresh(self.records.as_ref(), self.charts.as_ref())?;
        let dashboard = self.ctx.recompute();

        self.stats.passes.store(self.ctx.passes(), Ordering::Relaxed);
        self.stats
            .aggregations
            .store(self.ctx.aggregations(), Ordering::Relaxed);

        if let Ok(mut guard) = self.latest.lock() {
            *guard = Some(dashboard.clone());
        }

        match self.frames_tx.try_send(dashboard.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.stats.dropped_frames.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cfg(debounce_ms: u64) -> ControllerConfig {
        ControllerConfig {
            debounce: Duration::from_millis(debounce_ms),
            ..ControllerConfig::default()
        }
    }

    fn stores() -> (Arc<InMemoryStore<Record>>, Arc<InMemoryStore<ChartSpec>>) {
        (
            Arc::new(InMemoryStore::new("records")),
            Arc::new(InMemoryStore::new("charts")),
        )
    }

    #[test]
    fn fresh_stores_do_not_trigger_a_pass() {
        let (records, charts) = stores();
        let ctl = RecomputeController::spawn(records, charts, cfg(10)).unwrap();
        assert!(ctl.next_frame(Duration::from_millis(100)).is_err());
        assert_eq!(ctl.passes(), 0);
    }

    #[test]
    fn flush_runs_immediately() {
        let (records, charts) = stores();
        charts.replace_all(ChartSpec::defaults()).unwrap();
        records
            .upsert(0, Record::new(0, d(1990, 1, 1), "M", "A", "Cook", "Acme"))
            .unwrap();

        let ctl = RecomputeController::spawn(records, charts, cfg(10_000)).unwrap();
        let board = ctl.flush().unwrap();
        assert_eq!(board.pass, 1);
        assert_eq!(board.record_count, 1);
        assert_eq!(board.charts.len(), 4);
        assert_eq!(ctl.latest(), Some(board.clone()));
        assert_eq!(ctl.frames().len(), 1);
        assert_eq!(ctl.next_frame(Duration::from_millis(100)).unwrap(), board);
        assert!(ctl.frames().is_empty());
    }

    #[test]
    fn range_change_schedules_pass() {
        let (records, charts) = stores();
        charts.replace_all(ChartSpec::defaults()).unwrap();
        records
            .replace_all(vec![
                Record::new(1, d(1980, 1, 1), "M", "A", "Cook", "Acme"),
                Record::new(2, d(2000, 1, 1), "F", "B", "Cook", "Acme"),
            ])
            .unwrap();

        let ctl = RecomputeController::spawn(records, charts, cfg(20)).unwrap();
        let first = ctl.next_frame(Duration::from_secs(2)).unwrap();
        assert_eq!(first.record_count, 2);

        let range = DateRange::new(d(1990, 1, 1), d(2010, 1, 1)).unwrap();
        ctl.set_range(range).unwrap();
        let second = ctl.next_frame(Duration::from_secs(2)).unwrap();
        assert_eq!(second.range, Some(range));
        assert_eq!(second.record_count, 1);

        ctl.clear_range().unwrap();
        let third = ctl.next_frame(Duration::from_secs(2)).unwrap();
        assert_eq!(third.range, third.bounds);
        assert_eq!(third.record_count, 2);
    }

    #[test]
    fn unread_frames_are_counted_as_dropped() {
        let (records, charts) = stores();
        charts.replace_all(ChartSpec::defaults()).unwrap();
        let ctl = RecomputeController::spawn(
            records,
            charts,
            ControllerConfig {
                debounce: Duration::from_secs(60),
                frame_queue_capacity: 1,
                ..ControllerConfig::default()
            },
        )
        .unwrap();
        ctl.flush().unwrap();
        ctl.flush().unwrap();
        assert_eq!(ctl.dropped_frames(), 1);
        assert_eq!(ctl.passes(), 2);
    }
}
