// ── Optional display targets ──
//
// A readout is a named text surface somewhere in the page chrome (the
// throughput number in the status bar, for example). Producers publish
// by stable name; a name nobody registered is silently skipped, so a
// page variant without a given readout costs nothing.

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::trace;

/// Registry of named text readouts.
///
/// Consumers register a name and get a `watch::Receiver` carrying the
/// latest published text; the presentation layer renders it however it
/// likes.
#[derive(Default)]
pub struct Readouts {
    targets: DashMap<String, watch::Sender<String>>,
}

impl Readouts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a readout target. Replaces any previous registration of
    /// the same name.
    pub fn register(&self, name: &str) -> watch::Receiver<String> {
        let (tx, rx) = watch::channel(String::new());
        self.targets.insert(name.to_owned(), tx);
        rx
    }

    /// Remove a readout target.
    pub fn unregister(&self, name: &str) {
        self.targets.remove(name);
    }

    /// Publish text to a readout. A missing target is not an error.
    pub fn publish(&self, name: &str, text: String) {
        match self.targets.get(name) {
            Some(tx) => {
                let _ = tx.send(text);
            }
            None => trace!(name, "no readout target registered; skipping"),
        }
    }
}
