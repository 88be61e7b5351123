// ── Feed ──
//
// One playable unit bound to one device: a player, the overlay button
// set, and the rendered fragment. Owned exclusively by the grid
// controller; created on reset and destroyed before being replaced.

use crate::model::Device;

use super::buttons::{FeedButton, FullscreenButton, Player};

pub struct Feed {
    device: Device,
    player: Box<dyn Player>,
    buttons: Vec<FeedButton>,
    fullscreen: FullscreenButton,
    html: String,
}

impl Feed {
    pub(crate) fn new(
        device: Device,
        player: Box<dyn Player>,
        buttons: Vec<FeedButton>,
        fullscreen: FullscreenButton,
    ) -> Self {
        let html = render_fragment(&device, &buttons);
        Self {
            device,
            player,
            buttons,
            fullscreen,
            html,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The feed's rendered fragment; the grid concatenates these and
    /// inserts them in one pass.
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_active()
    }

    pub fn buttons(&self) -> &[FeedButton] {
        &self.buttons
    }

    /// Start playback. Runs after the grid's content replacement so the
    /// fragment is in place before the player attaches.
    pub(crate) fn init(&mut self) {
        for button in &self.buttons {
            button.mount();
        }
        self.player.init();
    }

    /// Tear down playback and detach the buttons. In-flight network
    /// requests are not aborted, only future work is cancelled.
    pub(crate) fn destroy(&mut self) {
        self.player.destroy();
        for button in &self.buttons {
            button.teardown();
        }
    }
}

fn render_fragment(device: &Device, buttons: &[FeedButton]) -> String {
    let mut overlay = String::new();
    for button in buttons {
        overlay.push_str(&button.render());
    }
    format!(
        "<div id=\"feed-{id}\" class=\"grid-item-container\">\
         <div class=\"js-overlay player-overlay feed-menu\">{overlay}</div>\
         <video class=\"grid-item\" muted disablepictureinpicture playsinline></video>\
         </div>",
        id = device.id,
    )
}
