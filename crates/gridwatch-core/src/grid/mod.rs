// ── Feed grid controller ──
//
// Owns the ordered collection of feeds. `reset` fully supersedes the
// previous grid: every old feed is destroyed, the eligible devices are
// rebuilt in name order, the surface content is replaced in one pass,
// and only then are the players started. Fullscreen exclusivity lives
// here, not in the individual feeds.

mod buttons;
mod feed;

pub use buttons::{FeedButton, FullscreenButton, MuteButton, Player, PlayerFactory};
pub use feed::Feed;

use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::config::ViewerConfig;
use crate::error::CoreError;
use crate::model::{DeviceDirectory, DeviceId};
use crate::ptz::PtzGateway;

/// The container the grid renders into; implemented by the presentation
/// layer. Content is replaced wholesale, never patched per feed.
pub trait GridSurface: Send + Sync {
    fn replace_content(&self, html: &str);
}

/// Controller for the grid of live feeds.
pub struct FeedGrid {
    surface: Arc<dyn GridSurface>,
    devices: DeviceDirectory,
    factory: Arc<dyn PlayerFactory>,
    gateway: PtzGateway,
    config: ViewerConfig,
    recordings_href: Url,
    selection: Vec<DeviceId>,
    feeds: Vec<Feed>,
    fullscreen_buttons: Vec<FullscreenButton>,
}

impl FeedGrid {
    pub fn new(
        surface: Arc<dyn GridSurface>,
        devices: DeviceDirectory,
        factory: Arc<dyn PlayerFactory>,
        gateway: PtzGateway,
        config: ViewerConfig,
        recordings_href: Url,
    ) -> Self {
        Self {
            surface,
            devices,
            factory,
            gateway,
            config,
            recordings_href,
            selection: Vec::new(),
            feeds: Vec::new(),
            fullscreen_buttons: Vec::new(),
        }
    }

    pub fn devices(&self) -> &DeviceDirectory {
        &self.devices
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Replace the selection filter. An empty selection means every
    /// device passes, not none.
    pub fn set_selection(&mut self, ids: Vec<DeviceId>) {
        self.selection = ids;
    }

    fn is_selected(&self, id: &DeviceId) -> bool {
        self.selection.is_empty() || self.selection.contains(id)
    }

    /// Destroy the current grid and rebuild it from the directory.
    ///
    /// Devices are taken in name order (locale-naive, stable -- ties
    /// keep directory order) and must pass both the selection filter and
    /// their `enable` flag. Fragment assembly is decoupled from player
    /// startup: the surface content is replaced once for the whole grid,
    /// then every player is initialized.
    pub fn reset(&mut self) {
        for feed in &mut self.feeds {
            feed.destroy();
        }
        self.feeds.clear();
        self.fullscreen_buttons.clear();

        let mut sorted: Vec<_> = self.devices.values().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        for device in sorted {
            if !self.is_selected(&device.id) || !device.enable {
                continue;
            }

            let fullscreen = FullscreenButton::new();
            let ptz = self.gateway.feed_button(device.id.clone());

            let mut recordings_href = self.recordings_href.clone();
            recordings_href.set_fragment(Some(&format!("monitors={}", device.id)));

            let buttons = vec![
                FeedButton::Recordings {
                    href: recordings_href,
                },
                FeedButton::Fullscreen(fullscreen.clone()),
                FeedButton::Mute(MuteButton::new(device.muted)),
                FeedButton::Ptz(ptz),
            ];

            let player = self.factory.create(device, self.config.prefer_low_res);
            self.fullscreen_buttons.push(fullscreen.clone());
            self.feeds
                .push(Feed::new(device.clone(), player, buttons, fullscreen));
        }

        let html: String = self.feeds.iter().map(Feed::html).collect();
        self.surface.replace_content(&html);

        for feed in &mut self.feeds {
            feed.init();
        }
        debug!(feeds = self.feeds.len(), "grid reset");
    }

    /// Toggle one feed's fullscreen state, excluding all others.
    pub fn toggle_fullscreen(&self, device_id: &DeviceId) {
        for (feed, button) in self.feeds.iter().zip(&self.fullscreen_buttons) {
            if &feed.device().id == device_id {
                button.set_active(!button.is_active());
            } else {
                button.set_active(false);
            }
        }
    }

    /// Force-exit fullscreen on every feed; wired to the page's global
    /// cancel gesture.
    pub fn exit_fullscreen(&self) {
        for button in &self.fullscreen_buttons {
            button.exit_fullscreen();
        }
    }

    /// Tear the grid down entirely.
    pub fn destroy(&mut self) {
        for feed in &mut self.feeds {
            feed.destroy();
        }
        self.feeds.clear();
        self.fullscreen_buttons.clear();
        self.surface.replace_content("");
    }
}

/// Derive a sibling page URL from the current one by swapping the `live`
/// path segment (including variants like `live_lowres`) for `target`.
pub fn to_absolute_path(current: &Url, target: &str) -> Result<Url, CoreError> {
    let segments: Vec<String> = current
        .path_segments()
        .ok_or_else(|| CoreError::Config {
            message: format!("page URL {current} has no path"),
        })?
        .map(|s| {
            if s == "live" || s.starts_with("live_") {
                target.to_owned()
            } else {
                s.to_owned()
            }
        })
        .collect();

    let mut out = current.clone();
    out.set_path(&segments.join("/"));
    out.set_fragment(None);
    out.set_query(None);
    Ok(out)
}
