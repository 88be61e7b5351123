// ── Process-wide network-fetch capability ──
//
// The page owns a single `FetchHandle` through which all media and API
// traffic flows. The bandwidth estimator installs an interceptor into the
// handle at init and restores the original at stop. Installation is
// guarded by pointer identity so a later installer is never clobbered by
// an earlier one's teardown.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use futures_core::future::BoxFuture;
use strum::Display;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// HTTP method of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FetchMethod {
    Get,
    Post,
}

/// An outgoing request, forwarded through the fetch capability unmodified.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: FetchMethod,
    pub url: Url,
    /// JSON body, sent with POST requests.
    pub body: Option<serde_json::Value>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: FetchMethod::Get,
            url,
            body: None,
        }
    }

    pub fn post_json(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: FetchMethod::Post,
            url,
            body: Some(body),
        }
    }
}

/// A response from the fetch capability.
///
/// The body is a cheaply shareable buffer: cloning it shares the
/// underlying allocation, so an interceptor can account for a duplicate
/// of the body without consuming the caller's copy.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The network-fetch capability itself.
///
/// Dyn-compatible so interceptors can wrap whatever is currently
/// installed without knowing its concrete type.
pub trait Fetch: Send + Sync {
    fn fetch(&self, req: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>>;
}

// ── Installable slot ────────────────────────────────────────────────

/// Process-wide slot holding the active fetch implementation.
///
/// `install` swaps in a replacement and hands back the displaced value;
/// `uninstall` restores it only while the expected installer is still
/// active. There is exactly one handle per page, constructed by the
/// bootstrap and passed by reference to whoever needs it.
pub struct FetchHandle {
    current: RwLock<Arc<dyn Fetch>>,
}

impl FetchHandle {
    pub fn new(initial: Arc<dyn Fetch>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// The currently installed fetch implementation.
    pub fn current(&self) -> Arc<dyn Fetch> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install a replacement, returning the displaced implementation.
    pub fn install(&self, fetch: Arc<dyn Fetch>) -> Arc<dyn Fetch> {
        match self.current.write() {
            Ok(mut guard) => std::mem::replace(&mut guard, fetch),
            Err(poisoned) => std::mem::replace(&mut poisoned.into_inner(), fetch),
        }
    }

    /// `true` if `fetch` is the currently installed implementation.
    pub fn is_installed(&self, fetch: &Arc<dyn Fetch>) -> bool {
        Arc::ptr_eq(&self.current(), fetch)
    }

    /// Restore `original`, but only if `expected` is still installed.
    ///
    /// Returns `false` (leaving the slot untouched) when another
    /// installer has since replaced `expected` -- its installation must
    /// not be clobbered by our teardown.
    pub fn uninstall(&self, expected: &Arc<dyn Fetch>, original: Arc<dyn Fetch>) -> bool {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if Arc::ptr_eq(&guard, expected) {
            *guard = original;
            true
        } else {
            debug!("fetch capability was superseded; leaving the replacement in place");
            false
        }
    }

    /// Issue a request through whatever is currently installed.
    pub async fn fetch(&self, req: FetchRequest) -> Result<FetchResponse, Error> {
        self.current().fetch(req).await
    }
}

// ── Production implementation ───────────────────────────────────────

/// Default fetch capability backed by `reqwest`.
pub struct ReqwestFetch {
    http: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(transport: &crate::transport::TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
        })
    }

    pub fn from_reqwest(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Fetch for ReqwestFetch {
    fn fetch(&self, req: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, Error>> {
        let http = self.http.clone();
        Box::pin(async move {
            let FetchRequest { method, url, body } = req;
            debug!("{method} {url}");

            let builder = match method {
                FetchMethod::Get => http.get(url),
                FetchMethod::Post => http.post(url),
            };
            let builder = match &body {
                Some(json) => builder.json(json),
                None => builder,
            };

            let resp = builder.send().await.map_err(Error::Transport)?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await.map_err(Error::Transport)?;
            Ok(FetchResponse { status, body })
        })
    }
}
