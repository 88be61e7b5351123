// gridwatch-api: HTTP surface of the live-view control core.
//
// Two concerns live here: the typed PTZ endpoint client (`PtzClient`) and
// the process-wide network-fetch seam (`fetch`) that the bandwidth
// estimator in gridwatch-core intercepts. Everything else (state machines,
// gating, grid lifecycle) belongs to gridwatch-core.

pub mod error;
pub mod fetch;
pub mod ptz;
pub mod transport;
pub mod types;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::Error;
pub use fetch::{Fetch, FetchHandle, FetchMethod, FetchRequest, FetchResponse, ReqwestFetch};
pub use ptz::PtzClient;
pub use transport::TransportConfig;
pub use types::{Direction, Movement, PtzCapabilities, ZoomOp};
