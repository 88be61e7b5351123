// Integration tests for the feed grid controller: ordering, selection,
// lifecycle sequencing, and the single-fullscreen invariant. The
// presentation and playback seams are mocked with an event log.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use url::Url;

use gridwatch_api::PtzClient;
use gridwatch_core::config::ViewerConfig;
use gridwatch_core::grid::{FeedGrid, GridSurface, Player, PlayerFactory};
use gridwatch_core::model::{Device, DeviceDirectory, DeviceId};
use gridwatch_core::ptz::PtzGateway;

// ── Mocks ───────────────────────────────────────────────────────────

type EventLog = Arc<Mutex<Vec<String>>>;

struct MockSurface {
    log: EventLog,
    content: Mutex<String>,
}

impl GridSurface for MockSurface {
    fn replace_content(&self, html: &str) {
        self.log.lock().unwrap().push("replace".to_owned());
        *self.content.lock().unwrap() = html.to_owned();
    }
}

struct MockPlayer {
    id: DeviceId,
    log: EventLog,
}

impl Player for MockPlayer {
    fn init(&mut self) {
        self.log.lock().unwrap().push(format!("init {}", self.id));
    }

    fn destroy(&mut self) {
        self.log.lock().unwrap().push(format!("destroy {}", self.id));
    }
}

struct MockFactory {
    log: EventLog,
}

impl PlayerFactory for MockFactory {
    fn create(&self, device: &Device, prefer_low_res: bool) -> Box<dyn Player> {
        self.log
            .lock()
            .unwrap()
            .push(format!("create {} lowres={prefer_low_res}", device.id));
        Box::new(MockPlayer {
            id: device.id.clone(),
            log: Arc::clone(&self.log),
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn device(id: &str, name: &str, enable: bool) -> Device {
    Device {
        id: DeviceId::from(id),
        name: name.to_owned(),
        enable,
        muted: true,
        extra: HashMap::new(),
    }
}

fn directory(devices: Vec<Device>) -> DeviceDirectory {
    devices.into_iter().map(|d| (d.id.clone(), d)).collect()
}

struct Harness {
    grid: FeedGrid,
    log: EventLog,
    surface: Arc<MockSurface>,
}

fn setup(devices: DeviceDirectory) -> Harness {
    let log: EventLog = Arc::default();
    let surface = Arc::new(MockSurface {
        log: Arc::clone(&log),
        content: Mutex::new(String::new()),
    });
    let factory = Arc::new(MockFactory {
        log: Arc::clone(&log),
    });
    let client =
        PtzClient::from_reqwest("http://nvr.local:2020", reqwest::Client::new()).unwrap();
    let grid = FeedGrid::new(
        Arc::clone(&surface) as Arc<dyn GridSurface>,
        devices,
        factory,
        PtzGateway::new(client),
        ViewerConfig::default(),
        Url::parse("http://nvr.local:2020/recordings").unwrap(),
    );
    Harness { grid, log, surface }
}

fn feed_ids(grid: &FeedGrid) -> Vec<String> {
    grid.feeds()
        .iter()
        .map(|f| f.device().id.to_string())
        .collect()
}

// ── Ordering and selection ──────────────────────────────────────────

#[test]
fn feeds_are_built_in_name_order() {
    let mut h = setup(directory(vec![
        device("cam3", "Garage", true),
        device("cam1", "Back door", true),
        device("cam2", "Driveway", true),
    ]));
    h.grid.reset();
    assert_eq!(feed_ids(&h.grid), ["cam1", "cam2", "cam3"]);
}

#[test]
fn name_ties_keep_directory_order() {
    let mut h = setup(directory(vec![
        device("cam2", "Yard", true),
        device("cam1", "Yard", true),
    ]));
    h.grid.reset();
    assert_eq!(feed_ids(&h.grid), ["cam2", "cam1"]);
}

#[test]
fn selection_filters_to_named_devices() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
        device("cam3", "C", true),
    ]));
    h.grid.set_selection(vec![DeviceId::from("cam2")]);
    h.grid.reset();
    assert_eq!(feed_ids(&h.grid), ["cam2"]);
}

#[test]
fn empty_selection_means_every_device() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
    ]));
    h.grid.set_selection(Vec::new());
    h.grid.reset();
    assert_eq!(feed_ids(&h.grid), ["cam1", "cam2"]);
}

#[test]
fn disabled_devices_are_skipped() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", false),
    ]));
    h.grid.reset();
    assert_eq!(feed_ids(&h.grid), ["cam1"]);
}

// ── Lifecycle sequencing ────────────────────────────────────────────

#[test]
fn content_is_replaced_once_before_any_player_starts() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
    ]));
    h.grid.reset();

    let log = h.log.lock().unwrap().clone();
    let replace_at = log.iter().position(|e| e == "replace").unwrap();
    let first_init = log.iter().position(|e| e.starts_with("init")).unwrap();
    assert_eq!(log.iter().filter(|e| *e == "replace").count(), 1);
    assert!(replace_at < first_init, "content must land before players attach");
}

#[test]
fn reset_destroys_the_previous_grid_first() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
    ]));
    h.grid.reset();
    h.log.lock().unwrap().clear();
    h.grid.reset();

    let log = h.log.lock().unwrap().clone();
    let last_destroy = log
        .iter()
        .rposition(|e| e.starts_with("destroy"))
        .unwrap();
    let first_create = log.iter().position(|e| e.starts_with("create")).unwrap();
    assert_eq!(log.iter().filter(|e| e.starts_with("destroy")).count(), 2);
    assert!(last_destroy < first_create, "old players go down before new ones exist");
    assert_eq!(feed_ids(&h.grid), ["cam1", "cam2"], "no duplicate feeds");
}

#[test]
fn destroy_tears_down_players_and_clears_the_surface() {
    let mut h = setup(directory(vec![device("cam1", "A", true)]));
    h.grid.reset();
    h.grid.destroy();

    let log = h.log.lock().unwrap().clone();
    assert!(log.contains(&"destroy cam1".to_owned()));
    assert!(h.grid.feeds().is_empty());
    assert_eq!(*h.surface.content.lock().unwrap(), "");
}

#[test]
fn fragment_carries_overlay_buttons_in_order() {
    let mut h = setup(directory(vec![device("cam1", "A", true)]));
    h.grid.reset();

    let content = h.surface.content.lock().unwrap().clone();
    assert!(content.contains("id=\"feed-cam1\""));
    assert!(content.contains("recordings#monitors=cam1"));

    let recordings = content.find("js-recordings").unwrap();
    let fullscreen = content.find("js-fullscreen-btn").unwrap();
    let mute = content.find("js-mute-btn").unwrap();
    assert!(recordings < fullscreen && fullscreen < mute);
    // PTZ capabilities were never discovered, so no PTZ toggle renders.
    assert!(!content.contains("js-ptz-btn"));
}

// ── Fullscreen exclusivity ──────────────────────────────────────────

fn fullscreen_states(grid: &FeedGrid) -> Vec<bool> {
    grid.feeds().iter().map(|f| f.is_fullscreen()).collect()
}

#[test]
fn at_most_one_feed_is_fullscreen() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
        device("cam3", "C", true),
    ]));
    h.grid.reset();

    h.grid.toggle_fullscreen(&DeviceId::from("cam2"));
    assert_eq!(fullscreen_states(&h.grid), [false, true, false]);

    // Toggling another feed steals fullscreen rather than stacking.
    h.grid.toggle_fullscreen(&DeviceId::from("cam1"));
    assert_eq!(fullscreen_states(&h.grid), [true, false, false]);

    // Toggling the active feed exits.
    h.grid.toggle_fullscreen(&DeviceId::from("cam1"));
    assert_eq!(fullscreen_states(&h.grid), [false, false, false]);
}

#[test]
fn exit_fullscreen_clears_every_feed() {
    let mut h = setup(directory(vec![
        device("cam1", "A", true),
        device("cam2", "B", true),
    ]));
    h.grid.reset();

    h.grid.toggle_fullscreen(&DeviceId::from("cam2"));
    h.grid.exit_fullscreen();
    assert_eq!(fullscreen_states(&h.grid), [false, false]);
}
