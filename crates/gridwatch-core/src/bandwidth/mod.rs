// ── Bandwidth estimator ──
//
// Wraps the page's fetch capability with a metering interceptor and
// publishes a sliding-window transfer rate once per tick. Byte
// accounting is amortized, not exact: the duplicated body of each
// response is counted off the caller's path, so totals are only
// guaranteed to have settled by a later tick.

mod window;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures_core::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use gridwatch_api::fetch::{Fetch, FetchHandle, FetchRequest, FetchResponse};
use gridwatch_api::Error as ApiError;

use crate::config::EstimatorConfig;
use crate::readout::Readouts;
use window::{Sample, SampleWindow};

/// Readout name for the windowed rate, in MB/s with 2 decimals.
pub const RATE_READOUT: &str = "bandwidth-rate";
/// Readout name for the cumulative total, in MB with 2 decimals.
pub const TOTAL_READOUT: &str = "bandwidth-total";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ── Metering interceptor ────────────────────────────────────────────

/// Forwards every request to the captured original fetch and returns the
/// response untouched. A duplicate of the body is read off the caller's
/// path; its length lands on the shared counter in any order relative to
/// the caller's own consumption and to tick boundaries.
struct MeteredFetch {
    inner: Arc<dyn Fetch>,
    total: Arc<AtomicU64>,
}

impl Fetch for MeteredFetch {
    fn fetch(&self, req: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, ApiError>> {
        let inner = Arc::clone(&self.inner);
        let total = Arc::clone(&self.total);
        Box::pin(async move {
            let resp = inner.fetch(req).await?;
            let duplicate = resp.body.clone();
            tokio::spawn(async move {
                // Fire-and-forget: a failed or late read simply
                // under-counts this response.
                total.fetch_add(duplicate.len() as u64, Ordering::Relaxed);
            });
            Ok(resp)
        })
    }
}

// ── Estimator ───────────────────────────────────────────────────────

/// One active interception round, created by `init` and consumed by `stop`.
struct Interception {
    /// Identity token: the wrapper we installed.
    metered: Arc<dyn Fetch>,
    /// What was installed before us, restored on stop.
    original: Arc<dyn Fetch>,
    cancel: CancellationToken,
    tick_task: JoinHandle<()>,
}

/// Sliding-window bandwidth estimator over the page's fetch capability.
///
/// Cheaply cloneable. `init` installs the interceptor and starts the
/// periodic tick; `stop` cancels the tick and restores the original
/// fetch unless something else has since replaced the interceptor.
#[derive(Clone)]
pub struct BandwidthEstimator {
    inner: Arc<EstimatorInner>,
}

struct EstimatorInner {
    handle: Arc<FetchHandle>,
    readouts: Arc<Readouts>,
    config: EstimatorConfig,
    total: Arc<AtomicU64>,
    window: Mutex<SampleWindow>,
    active: Mutex<Option<Interception>>,
}

impl BandwidthEstimator {
    pub fn new(handle: Arc<FetchHandle>, readouts: Arc<Readouts>, config: EstimatorConfig) -> Self {
        let window = SampleWindow::new(config.window_size);
        Self {
            inner: Arc::new(EstimatorInner {
                handle,
                readouts,
                config,
                total: Arc::new(AtomicU64::new(0)),
                window: Mutex::new(window),
                active: Mutex::new(None),
            }),
        }
    }

    /// Start metering: reset state, install the interceptor, spawn the
    /// periodic tick. Must be called from within a tokio runtime.
    ///
    /// Double-init is a reentrancy error: it is logged and the call
    /// returns with every piece of state -- counter, window, readouts,
    /// installed fetch -- exactly as it was.
    pub fn init(&self) {
        let mut active = lock(&self.inner.active);
        if active.is_some() {
            error!("bandwidth estimator already initialized");
            return;
        }

        self.inner.total.store(0, Ordering::Relaxed);
        lock(&self.inner.window).clear();

        let original = self.inner.handle.current();
        let metered: Arc<dyn Fetch> = Arc::new(MeteredFetch {
            inner: Arc::clone(&original),
            total: Arc::clone(&self.inner.total),
        });
        self.inner.handle.install(Arc::clone(&metered));

        let cancel = CancellationToken::new();
        let tick_task = tokio::spawn(tick_task(
            Arc::clone(&self.inner),
            cancel.clone(),
        ));

        *active = Some(Interception {
            metered,
            original,
            cancel,
            tick_task,
        });
        debug!("bandwidth estimator started");
    }

    /// Stop metering: cancel the tick and restore the original fetch if
    /// our interceptor is still the active one. Requests already in
    /// transit are not aborted. Idempotent.
    pub fn stop(&self) {
        let Some(interception) = lock(&self.inner.active).take() else {
            return;
        };
        interception.cancel.cancel();
        interception.tick_task.abort();
        self.inner
            .handle
            .uninstall(&interception.metered, interception.original);
        debug!("bandwidth estimator stopped");
    }

    /// Cumulative bytes accounted so far this round.
    pub fn total_bytes(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    /// Number of samples currently in the window.
    pub fn window_len(&self) -> usize {
        lock(&self.inner.window).len()
    }

    #[cfg(test)]
    pub(crate) fn tick_at(&self, now: Instant) {
        self.inner.publish_tick(now);
    }
}

impl EstimatorInner {
    /// Capture a sample and refresh the readouts. Never overlaps itself:
    /// only the tick task (or a test) calls this, strictly sequentially.
    fn publish_tick(&self, now: Instant) {
        let bytes = self.total.load(Ordering::Relaxed);

        let mut window = lock(&self.window);
        window.push(Sample { bytes, at: now });
        let rate = window.rate_mb_per_sec();
        drop(window);

        if let Some(rate) = rate {
            self.readouts.publish(RATE_READOUT, format!("{rate:.2}"));
        }
        self.readouts
            .publish(TOTAL_READOUT, format!("{:.2}", bytes as f64 / 1_000_000.0));
    }
}

/// Periodic sampling loop; strictly periodic and never overlapping.
async fn tick_task(inner: Arc<EstimatorInner>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(inner.config.tick_period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                // tokio's clock, so tests driving virtual time get
                // deterministic sample spacing.
                inner.publish_tick(tokio::time::Instant::now().into_std());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;

    /// Test fetch returning a body of a fixed size.
    struct SizedFetch(usize);

    impl Fetch for SizedFetch {
        fn fetch(&self, _req: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, ApiError>> {
            let body = Bytes::from(vec![0u8; self.0]);
            Box::pin(async move { Ok(FetchResponse { status: 200, body }) })
        }
    }

    fn setup(body_size: usize, config: EstimatorConfig) -> (Arc<FetchHandle>, Arc<Readouts>, BandwidthEstimator) {
        let handle = Arc::new(FetchHandle::new(Arc::new(SizedFetch(body_size))));
        let readouts = Arc::new(Readouts::new());
        let estimator =
            BandwidthEstimator::new(Arc::clone(&handle), Arc::clone(&readouts), config);
        (handle, readouts, estimator)
    }

    /// Long tick so the background task never interferes with
    /// deterministic `tick_at` calls.
    fn manual_tick_config() -> EstimatorConfig {
        EstimatorConfig {
            window_size: 3,
            tick_period: Duration::from_secs(3600),
        }
    }

    async fn drain_pending() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn req() -> FetchRequest {
        FetchRequest::get("http://localhost/stream.m3u8".parse().unwrap())
    }

    #[tokio::test]
    async fn metered_fetch_counts_bytes_eventually() {
        let (handle, _readouts, estimator) = setup(1_000, manual_tick_config());
        estimator.init();

        let resp = handle.fetch(req()).await.unwrap();
        // The caller's copy of the body is fully consumable.
        assert_eq!(resp.body.len(), 1_000);

        drain_pending().await;
        assert_eq!(estimator.total_bytes(), 1_000);

        estimator.stop();
    }

    #[tokio::test]
    async fn rate_is_window_delta_over_elapsed_seconds() {
        let (handle, readouts, estimator) = setup(3_000_000, manual_tick_config());
        let rate_rx = readouts.register(RATE_READOUT);
        let total_rx = readouts.register(TOTAL_READOUT);
        estimator.init();

        let t0 = Instant::now();
        estimator.tick_at(t0);
        assert_eq!(*rate_rx.borrow(), "", "one sample publishes no rate");

        handle.fetch(req()).await.unwrap();
        drain_pending().await;

        estimator.tick_at(t0 + Duration::from_secs(2));
        // 3 MB over 2 seconds.
        assert_eq!(*rate_rx.borrow(), "1.50");
        assert_eq!(*total_rx.borrow(), "3.00");

        estimator.stop();
    }

    #[tokio::test]
    async fn double_init_is_logged_and_leaves_state_untouched() {
        let (handle, readouts, estimator) = setup(500, manual_tick_config());
        let rate_rx = readouts.register(RATE_READOUT);
        estimator.init();

        handle.fetch(req()).await.unwrap();
        drain_pending().await;

        let t0 = Instant::now();
        estimator.tick_at(t0);
        estimator.tick_at(t0 + Duration::from_secs(1));
        let rate_before = rate_rx.borrow().clone();
        let total_before = estimator.total_bytes();
        let window_before = estimator.window_len();
        let installed_before = handle.current();

        estimator.init();

        assert_eq!(estimator.total_bytes(), total_before);
        assert_eq!(estimator.window_len(), window_before);
        assert_eq!(*rate_rx.borrow(), rate_before);
        assert!(handle.is_installed(&installed_before), "no re-wrap on double init");

        estimator.stop();
    }

    #[tokio::test]
    async fn stop_restores_the_original_fetch() {
        let (handle, _readouts, estimator) = setup(100, manual_tick_config());
        let original = handle.current();

        estimator.init();
        assert!(!handle.is_installed(&original));

        estimator.stop();
        assert!(handle.is_installed(&original));

        // Idempotent.
        estimator.stop();
        assert!(handle.is_installed(&original));
    }

    #[tokio::test]
    async fn stop_does_not_clobber_a_foreign_installer() {
        let (handle, _readouts, estimator) = setup(100, manual_tick_config());
        estimator.init();

        let foreign: Arc<dyn Fetch> = Arc::new(SizedFetch(7));
        handle.install(Arc::clone(&foreign));

        estimator.stop();
        assert!(handle.is_installed(&foreign));
    }

    #[tokio::test]
    async fn init_resets_state_from_previous_round() {
        let (handle, _readouts, estimator) = setup(800, manual_tick_config());
        estimator.init();
        handle.fetch(req()).await.unwrap();
        drain_pending().await;
        estimator.tick_at(Instant::now());
        estimator.stop();

        estimator.init();
        assert_eq!(estimator.total_bytes(), 0);
        assert_eq!(estimator.window_len(), 0);
        estimator.stop();
    }
}
