// ── PTZ control gateway ──
//
// Owns capability discovery and the per-device command gate. Discovery
// is best-effort fan-out/fan-in: every device is asked concurrently,
// failures downgrade to "no capabilities", and the aggregate resolves
// exactly once. Dispatch is a scoped acquire/release around each move:
// the whole control group is disabled while any command is in flight and
// re-enabled on every completion path.

mod directory;

pub use directory::{CapabilityDirectory, CapabilityMap};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use futures_util::future::join_all;
use tracing::{debug, warn};

use gridwatch_api::types::{Movement, ZoomOp};
use gridwatch_api::{Direction, PtzCapabilities, PtzClient};

use crate::model::{DeviceDirectory, DeviceId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ── Control group ───────────────────────────────────────────────────

/// One rendered control button.
#[derive(Debug, Clone, Copy)]
pub struct ControlButton {
    direction: Direction,
}

impl ControlButton {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn glyph(&self) -> &'static str {
        match self.direction {
            Direction::Up => "\u{25b2}",
            Direction::Down => "\u{25bc}",
            Direction::Left => "\u{25c0}",
            Direction::Right => "\u{25b6}",
            Direction::ZoomIn => " + ",
            Direction::ZoomOut => " - ",
        }
    }

    fn html(&self) -> String {
        format!(
            "<button class=\"js-ptz\" data-direction=\"{}\">{}</button>",
            self.direction,
            self.glyph()
        )
    }
}

/// The set of controls for one device, disabled/enabled as a unit.
///
/// Only supported directions get a button; unsupported ones are omitted
/// entirely rather than rendered disabled.
pub struct ControlGroup {
    device_id: DeviceId,
    movements: Vec<ControlButton>,
    zoom: Vec<ControlButton>,
    in_flight: AtomicUsize,
}

impl ControlGroup {
    fn from_capabilities(device_id: DeviceId, caps: &PtzCapabilities) -> Option<Self> {
        if !caps.has_any_controls() {
            return None;
        }

        let movements = Movement::ALL
            .iter()
            .filter(|m| caps.supported_movements.contains(m))
            .map(|&m| ControlButton {
                direction: m.into(),
            })
            .collect();
        let zoom = ZoomOp::ALL
            .iter()
            .filter(|z| caps.supported_zoom.contains(z))
            .map(|&z| ControlButton {
                direction: z.into(),
            })
            .collect();

        Some(Self {
            device_id,
            movements,
            zoom,
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// All buttons, movements before zoom, in enumeration order.
    pub fn buttons(&self) -> impl Iterator<Item = &ControlButton> {
        self.movements.iter().chain(self.zoom.iter())
    }

    /// `true` while no command is in flight for this group.
    pub fn buttons_enabled(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }

    pub fn html(&self) -> String {
        let mut html = format!(
            "<div id=\"ptz-controls-{}\" class=\"player-overlay ptz-menu\">",
            self.device_id
        );
        if !self.movements.is_empty() {
            html.push_str("<div>");
            for button in &self.movements {
                html.push_str(&button.html());
            }
            html.push_str("</div>");
        }
        if !self.zoom.is_empty() {
            html.push_str("<div>");
            for button in &self.zoom {
                html.push_str(&button.html());
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }
}

/// Scoped gate: disables the group on acquire, re-enables on drop, so
/// every exit path from a dispatch releases it.
struct GroupGate {
    group: Arc<ControlGroup>,
}

impl GroupGate {
    fn acquire(group: &Arc<ControlGroup>) -> Self {
        group.in_flight.fetch_add(1, Ordering::SeqCst);
        Self {
            group: Arc::clone(group),
        }
    }
}

impl Drop for GroupGate {
    fn drop(&mut self) {
        self.group.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Per-feed PTZ button ─────────────────────────────────────────────

/// The PTZ toggle button on one feed's overlay.
///
/// Created before discovery may have completed: it starts as a
/// placeholder and is notified with the full capability map once the
/// directory resolves.
#[derive(Clone)]
pub struct PtzButton {
    inner: Arc<PtzButtonState>,
}

struct PtzButtonState {
    device_id: DeviceId,
    capabilities: Mutex<Option<PtzCapabilities>>,
}

impl PtzButtonState {
    fn capabilities_ready(&self, map: &CapabilityMap) {
        let caps = map.get(&self.device_id).cloned().unwrap_or_default();
        *lock(&self.capabilities) = Some(caps);
    }
}

impl PtzButton {
    fn new(device_id: DeviceId) -> Self {
        Self {
            inner: Arc::new(PtzButtonState {
                device_id,
                capabilities: Mutex::new(None),
            }),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.inner.device_id
    }

    /// Resolved capabilities, or `None` while discovery is pending.
    pub fn capabilities(&self) -> Option<PtzCapabilities> {
        lock(&self.inner.capabilities).clone()
    }

    /// `true` once resolved with at least one control.
    pub fn has_controls(&self) -> bool {
        self.capabilities().is_some_and(|caps| caps.has_any_controls())
    }

    /// The overlay toggle button. Renders nothing while the button is a
    /// placeholder or the device has no controls.
    pub fn render(&self) -> String {
        if self.has_controls() {
            format!(
                "<button class=\"js-ptz-btn feed-btn\" data-device=\"{}\">\u{2725}</button>",
                self.inner.device_id
            )
        } else {
            String::new()
        }
    }
}

// ── Gateway ─────────────────────────────────────────────────────────

/// Mediates PTZ control for all feeds on the page.
///
/// Cheaply cloneable. One gateway per page; feeds request their PTZ
/// buttons here and the page bootstrap kicks off discovery once.
#[derive(Clone)]
pub struct PtzGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    client: PtzClient,
    directory: CapabilityDirectory,
    groups: DashMap<DeviceId, Arc<ControlGroup>>,
}

impl PtzGateway {
    pub fn new(client: PtzClient) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                client,
                directory: CapabilityDirectory::new(),
                groups: DashMap::new(),
            }),
        }
    }

    pub fn directory(&self) -> &CapabilityDirectory {
        &self.inner.directory
    }

    /// Discover capabilities for every device concurrently.
    ///
    /// Runs at most once per page; later calls are no-ops. Individual
    /// failures (transport, non-2xx, malformed body) downgrade to "no
    /// capabilities" for that device -- the aggregate always resolves
    /// and never propagates an error.
    pub async fn discover_all(&self, devices: &DeviceDirectory) {
        if !self.inner.directory.begin() {
            debug!("capability discovery already performed");
            return;
        }

        let client = &self.inner.client;
        let fetches = devices.keys().cloned().map(|id| async move {
            let result = client.capabilities(id.as_str()).await;
            (id, result)
        });

        let mut map = CapabilityMap::new();
        for (id, result) in join_all(fetches).await {
            match result {
                Ok(caps) => {
                    map.insert(id, caps);
                }
                Err(e) => {
                    debug!(device = %id, error = %e, "capability discovery failed; treating as none");
                }
            }
        }

        debug!(resolved = map.len(), total = devices.len(), "capability discovery complete");
        self.inner.directory.resolve(map);
    }

    /// Create the PTZ toggle button for one feed and register it for
    /// capability notification.
    pub fn feed_button(&self, device_id: DeviceId) -> PtzButton {
        let button = PtzButton::new(device_id);
        let state = Arc::clone(&button.inner);
        self.inner
            .directory
            .subscribe(move |map| state.capabilities_ready(map));
        button
    }

    /// The rendered control group for a device, if currently shown.
    pub fn controls(&self, device_id: &DeviceId) -> Option<Arc<ControlGroup>> {
        self.inner.groups.get(device_id).map(|g| Arc::clone(&g))
    }

    /// Idempotent show/hide of a device's control group.
    ///
    /// If the group is rendered, remove it; otherwise construct it from
    /// resolved capabilities. Before resolution -- or for a device with
    /// no controls -- the toggle has no visible effect.
    pub fn toggle_controls(&self, device_id: &DeviceId) {
        if self.inner.groups.remove(device_id).is_some() {
            return;
        }

        let Some(caps) = self.inner.directory.capabilities(device_id) else {
            debug!(device = %device_id, "toggle before capability resolution; ignoring");
            return;
        };
        if let Some(group) = ControlGroup::from_capabilities(device_id.clone(), &caps) {
            self.inner.groups.insert(device_id.clone(), Arc::new(group));
        }
    }

    /// Issue one move command, gating the device's whole control group
    /// for the duration.
    ///
    /// Success and failure take the same path back to the enabled state;
    /// failures are logged and never propagated.
    pub async fn dispatch_move(&self, device_id: &DeviceId, direction: Direction) {
        let Some(group) = self.controls(device_id) else {
            debug!(device = %device_id, "no rendered control group; ignoring move");
            return;
        };

        let _gate = GroupGate::acquire(&group);
        match self.inner.client.move_camera(device_id.as_str(), direction).await {
            Ok(()) => {
                // TODO: surface success/failure on the overlay buttons.
            }
            Err(e) => {
                warn!(device = %device_id, %direction, error = %e, "PTZ move failed");
            }
        }
    }
}
