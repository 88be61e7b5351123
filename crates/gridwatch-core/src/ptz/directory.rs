// ── Capability directory ──
//
// Per-page mapping from device id to discovered PTZ capabilities.
// Discovery runs once: Unresolved -> Resolving -> Resolved. Observers
// registered before resolution are each notified exactly once with the
// full map; after that the directory is immutable for the round.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use gridwatch_api::PtzCapabilities;

use crate::model::DeviceId;

/// The aggregate discovery result. Devices whose capability request
/// failed are simply absent, which renders the same as an empty set.
pub type CapabilityMap = HashMap<DeviceId, PtzCapabilities>;

type Observer = Box<dyn FnOnce(&CapabilityMap) + Send>;

enum DiscoveryState {
    Unresolved,
    Resolving,
    Resolved(Arc<CapabilityMap>),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Directory of discovered capabilities with one-shot observer fan-out.
pub struct CapabilityDirectory {
    state: Mutex<DiscoveryState>,
    observers: Mutex<Vec<Observer>>,
}

impl CapabilityDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DiscoveryState::Unresolved),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// The resolved map, or `None` while discovery is pending.
    pub fn resolved(&self) -> Option<Arc<CapabilityMap>> {
        match &*lock(&self.state) {
            DiscoveryState::Resolved(map) => Some(Arc::clone(map)),
            _ => None,
        }
    }

    /// Capabilities for one device.
    ///
    /// `None` means "not yet resolved". After resolution a device absent
    /// from the map reads as an empty capability set -- resolved-empty
    /// and unresolved are deliberately distinct.
    pub fn capabilities(&self, id: &DeviceId) -> Option<PtzCapabilities> {
        self.resolved()
            .map(|map| map.get(id).cloned().unwrap_or_default())
    }

    /// Register an observer for the resolution of this discovery round.
    ///
    /// Invoked exactly once: immediately if already resolved, otherwise
    /// when `resolve` runs.
    pub fn subscribe(&self, observer: impl FnOnce(&CapabilityMap) + Send + 'static) {
        let map = {
            let state = lock(&self.state);
            match &*state {
                DiscoveryState::Resolved(map) => Arc::clone(map),
                _ => {
                    // Registered while still holding the state lock;
                    // resolve drains the list only after taking it.
                    lock(&self.observers).push(Box::new(observer));
                    return;
                }
            }
        };
        observer(&map);
    }

    /// Transition Unresolved -> Resolving. Returns `false` if discovery
    /// already started (or finished), in which case the caller must not
    /// run another round.
    pub(crate) fn begin(&self) -> bool {
        let mut state = lock(&self.state);
        if matches!(*state, DiscoveryState::Unresolved) {
            *state = DiscoveryState::Resolving;
            true
        } else {
            false
        }
    }

    /// Publish the aggregate result and fan out to pending observers.
    pub(crate) fn resolve(&self, map: CapabilityMap) {
        let map = Arc::new(map);
        {
            let mut state = lock(&self.state);
            if matches!(*state, DiscoveryState::Resolved(_)) {
                warn!("capability directory already resolved; ignoring");
                return;
            }
            *state = DiscoveryState::Resolved(Arc::clone(&map));
        }

        let pending: Vec<Observer> = lock(&self.observers).drain(..).collect();
        for observer in pending {
            observer(&map);
        }
    }
}

impl Default for CapabilityDirectory {
    fn default() -> Self {
        Self::new()
    }
}
