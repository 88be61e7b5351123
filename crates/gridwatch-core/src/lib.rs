// gridwatch-core: Client-side control core for the live-monitoring dashboard.
//
// Three subsystems carry all the state and timing logic:
//   - `bandwidth`: sliding-window transfer-rate estimation over the
//     process-wide fetch capability,
//   - `ptz`: best-effort capability discovery and gated command dispatch,
//   - `grid`: feed lifecycle, selection filtering, and the
//     single-fullscreen invariant.
//
// `page` wires them together once at bootstrap. Presentation, the
// playback engine, and the server side are external collaborators behind
// the `GridSurface`, `Player`, and `gridwatch-api` seams.

pub mod bandwidth;
pub mod config;
pub mod error;
pub mod grid;
pub mod model;
pub mod page;
pub mod ptz;
pub mod readout;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bandwidth::BandwidthEstimator;
pub use config::{EstimatorConfig, ViewerConfig};
pub use error::CoreError;
pub use grid::{FeedGrid, GridSurface, Player, PlayerFactory};
pub use model::{Device, DeviceDirectory, DeviceId};
pub use page::LivePage;
pub use ptz::PtzGateway;
pub use readout::Readouts;
