// ── Page bootstrap ──
//
// Wires the three subsystems together once at page load. All lifecycle
// objects -- the fetch handle, the readout registry, the estimator, the
// gateway, the grid -- are constructed here and passed by reference to
// whoever needs them; there is no module-level state.

use std::sync::Arc;

use tracing::info;
use url::Url;

use gridwatch_api::fetch::{FetchHandle, ReqwestFetch};
use gridwatch_api::{PtzClient, TransportConfig};

use crate::bandwidth::BandwidthEstimator;
use crate::config::{EstimatorConfig, ViewerConfig};
use crate::error::CoreError;
use crate::grid::{to_absolute_path, FeedGrid, GridSurface, PlayerFactory};
use crate::model::DeviceDirectory;
use crate::ptz::PtzGateway;
use crate::readout::Readouts;

/// The live page's control core, owning every lifecycle object.
pub struct LivePage {
    fetch: Arc<FetchHandle>,
    readouts: Arc<Readouts>,
    estimator: BandwidthEstimator,
    gateway: PtzGateway,
    grid: FeedGrid,
}

impl LivePage {
    /// Construct the control core over the server-rendered device
    /// directory. Does not start anything -- call
    /// [`start()`](Self::start) from within a tokio runtime.
    pub fn new(
        page_url: &Url,
        devices: DeviceDirectory,
        surface: Arc<dyn GridSurface>,
        factory: Arc<dyn PlayerFactory>,
        estimator_config: EstimatorConfig,
        viewer_config: ViewerConfig,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::default();

        let fetch = Arc::new(FetchHandle::new(Arc::new(ReqwestFetch::new(&transport)?)));
        let readouts = Arc::new(Readouts::new());
        let estimator = BandwidthEstimator::new(
            Arc::clone(&fetch),
            Arc::clone(&readouts),
            estimator_config,
        );

        // PTZ traffic goes through the same handle, so the estimator's
        // interceptor meters it along with everything else.
        let client = PtzClient::new(page_url.clone(), Arc::clone(&fetch));
        let gateway = PtzGateway::new(client);

        let recordings_href = to_absolute_path(page_url, "recordings")?;
        let grid = FeedGrid::new(
            surface,
            devices,
            factory,
            gateway.clone(),
            viewer_config,
            recordings_href,
        );

        Ok(Self {
            fetch,
            readouts,
            estimator,
            gateway,
            grid,
        })
    }

    /// Build the grid, start bandwidth metering, and kick off capability
    /// discovery in the background.
    pub fn start(&mut self) {
        self.grid.reset();
        self.estimator.init();

        let gateway = self.gateway.clone();
        let devices = self.grid.devices().clone();
        tokio::spawn(async move {
            gateway.discover_all(&devices).await;
        });

        info!(devices = self.grid.devices().len(), "live page started");
    }

    /// The global cancel/escape gesture: force-exit fullscreen
    /// everywhere.
    pub fn handle_escape(&self) {
        self.grid.exit_fullscreen();
    }

    /// Stop metering and tear the grid down. Requests already in transit
    /// are not aborted.
    pub fn shutdown(&mut self) {
        self.estimator.stop();
        self.grid.destroy();
    }

    // ── Component access ─────────────────────────────────────────────

    pub fn fetch(&self) -> &Arc<FetchHandle> {
        &self.fetch
    }

    pub fn readouts(&self) -> &Arc<Readouts> {
        &self.readouts
    }

    pub fn estimator(&self) -> &BandwidthEstimator {
        &self.estimator
    }

    pub fn gateway(&self) -> &PtzGateway {
        &self.gateway
    }

    pub fn grid(&self) -> &FeedGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut FeedGrid {
        &mut self.grid
    }
}
