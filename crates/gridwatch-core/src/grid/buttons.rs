// ── Feed overlay buttons ──
//
// Closed variant set sharing a render/mount/teardown contract. The PTZ
// variant additionally carries the capability-resolution hook (see
// `ptz::PtzButton`). Fullscreen buttons expose a shared-state handle so
// the grid controller, not the button, can enforce the single-fullscreen
// invariant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::model::Device;
use crate::ptz::PtzButton;

// ── Player seam ─────────────────────────────────────────────────────

/// The opaque playback engine bound to one feed.
pub trait Player: Send {
    fn init(&mut self);
    fn destroy(&mut self);
}

/// Creates players; implemented by the embedding page over whatever
/// streaming stack it uses.
pub trait PlayerFactory: Send + Sync {
    fn create(&self, device: &Device, prefer_low_res: bool) -> Box<dyn Player>;
}

// ── Fullscreen ──────────────────────────────────────────────────────

/// Shared-state handle for one feed's fullscreen toggle.
///
/// The grid controller holds a clone of every handle and is the only
/// place allowed to activate one, which is how "at most one fullscreen
/// feed" is enforced.
#[derive(Clone, Default)]
pub struct FullscreenButton {
    active: Arc<AtomicBool>,
}

impl FullscreenButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Force-exit, used by the grid's global cancel path.
    pub fn exit_fullscreen(&self) {
        self.set_active(false);
    }
}

// ── Mute ────────────────────────────────────────────────────────────

/// Mute toggle; initial state comes from the device.
pub struct MuteButton {
    muted: AtomicBool,
}

impl MuteButton {
    pub fn new(muted: bool) -> Self {
        Self {
            muted: AtomicBool::new(muted),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Flip and return the new state.
    pub fn toggle(&self) -> bool {
        !self.muted.fetch_xor(true, Ordering::SeqCst)
    }
}

// ── The closed button set ───────────────────────────────────────────

/// A feed's overlay buttons: Recordings-link, Fullscreen-toggle,
/// Mute-toggle, PTZ-toggle, always in that order.
pub enum FeedButton {
    Recordings { href: Url },
    Fullscreen(FullscreenButton),
    Mute(MuteButton),
    Ptz(PtzButton),
}

impl FeedButton {
    pub fn render(&self) -> String {
        match self {
            Self::Recordings { href } => {
                format!("<a href=\"{href}\" class=\"feed-btn js-recordings\">\u{25cf}</a>")
            }
            Self::Fullscreen(_) => {
                "<button class=\"js-fullscreen-btn feed-btn\">\u{26f6}</button>".to_owned()
            }
            Self::Mute(mute) => {
                let glyph = if mute.is_muted() { "\u{1f507}" } else { "\u{1f50a}" };
                format!("<button class=\"js-mute-btn feed-btn\">{glyph}</button>")
            }
            Self::Ptz(ptz) => ptz.render(),
        }
    }

    /// Post-insertion hook, run once the grid's content is in place.
    pub fn mount(&self) {}

    /// Detach hook, run when the owning feed is destroyed.
    pub fn teardown(&self) {
        if let Self::Fullscreen(fullscreen) = self {
            fullscreen.exit_fullscreen();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mute_toggle_flips_state() {
        let mute = MuteButton::new(true);
        assert!(mute.is_muted());
        assert!(!mute.toggle());
        assert!(!mute.is_muted());
        assert!(mute.toggle());
    }

    #[test]
    fn fullscreen_handles_share_state() {
        let button = FullscreenButton::new();
        let handle = button.clone();
        button.set_active(true);
        assert!(handle.is_active());
        handle.exit_fullscreen();
        assert!(!button.is_active());
    }
}
