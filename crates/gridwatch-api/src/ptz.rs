// PTZ endpoint client
//
// URL construction for the monitor server's PTZ endpoints. Requests are
// issued through the shared fetch capability, so an installed interceptor
// (the bandwidth estimator's metering wrapper) sees PTZ traffic like any
// other. Success of a move command is determined by response status
// alone; the body is never inspected.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::fetch::{FetchHandle, FetchRequest, ReqwestFetch};
use crate::types::{Direction, MoveRequest, PtzCapabilities};

/// HTTP client for the monitor server's PTZ endpoints.
pub struct PtzClient {
    fetch: Arc<FetchHandle>,
    base_url: Url,
}

impl PtzClient {
    /// Create a new PTZ client over the page's fetch capability.
    ///
    /// `base_url` is the server root the page was served from,
    /// e.g. `http://nvr.local:2020`.
    pub fn new(base_url: Url, fetch: Arc<FetchHandle>) -> Self {
        Self { fetch, base_url }
    }

    /// Create a PTZ client with a pre-built `reqwest::Client` behind a
    /// private fetch handle.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let fetch = Arc::new(FetchHandle::new(Arc::new(ReqwestFetch::from_reqwest(http))));
        Ok(Self {
            fetch,
            base_url: Url::parse(base_url)?,
        })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a full URL for `/api/ptz/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("/api/ptz/{path}"))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/ptz/capabilities/{deviceId}`
    ///
    /// Any non-2xx status or unparseable body surfaces as an error here;
    /// the gateway in gridwatch-core downgrades it to "no capabilities".
    pub async fn capabilities(&self, device_id: &str) -> Result<PtzCapabilities, Error> {
        let url = self.api_url(&format!("capabilities/{device_id}"))?;
        debug!("GET {url}");

        let resp = self.fetch.fetch(FetchRequest::get(url)).await?;
        if !resp.is_success() {
            return Err(Error::Api {
                status: resp.status,
                message: format!("capability discovery for {device_id} failed"),
            });
        }

        let body = String::from_utf8_lossy(&resp.body).into_owned();
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// `POST /api/ptz/move/{deviceId}` with body `{"direction": ...}`.
    pub async fn move_camera(&self, device_id: &str, direction: Direction) -> Result<(), Error> {
        let url = self.api_url(&format!("move/{device_id}"))?;
        debug!("POST {url} direction={direction}");

        let body = serde_json::to_value(MoveRequest { direction }).map_err(|e| {
            Error::Serialization {
                message: e.to_string(),
            }
        })?;

        let resp = self.fetch.fetch(FetchRequest::post_json(url, body)).await?;
        if resp.is_success() {
            Ok(())
        } else {
            Err(Error::Api {
                status: resp.status,
                message: format!("move {direction} rejected for {device_id}"),
            })
        }
    }
}
