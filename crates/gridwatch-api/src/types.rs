// Wire types for the PTZ endpoints.
//
// Capability sets keep movements and zoom operations as separate enums so
// a capability response can never smuggle a zoom op into the movement set.
// The move endpoint accepts either kind, so `Direction` is the union type
// that goes on the wire.

use serde::{Deserialize, Serialize};
use strum::Display;

/// A pan/tilt movement a camera may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
}

impl Movement {
    /// All movements, in the fixed order control buttons are rendered.
    pub const ALL: [Movement; 4] = [
        Movement::Up,
        Movement::Down,
        Movement::Left,
        Movement::Right,
    ];
}

/// A zoom operation a camera may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ZoomOp {
    ZoomIn,
    ZoomOut,
}

impl ZoomOp {
    /// Both zoom operations, in rendering order.
    pub const ALL: [ZoomOp; 2] = [ZoomOp::ZoomIn, ZoomOp::ZoomOut];
}

/// The union of movements and zoom operations -- the value sent to the
/// move endpoint as `{"direction": ...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
}

impl From<Movement> for Direction {
    fn from(m: Movement) -> Self {
        match m {
            Movement::Up => Direction::Up,
            Movement::Down => Direction::Down,
            Movement::Left => Direction::Left,
            Movement::Right => Direction::Right,
        }
    }
}

impl From<ZoomOp> for Direction {
    fn from(z: ZoomOp) -> Self {
        match z {
            ZoomOp::ZoomIn => Direction::ZoomIn,
            ZoomOp::ZoomOut => Direction::ZoomOut,
        }
    }
}

/// A device's discovered PTZ capability set.
///
/// An *absent* capability set (the device never answered discovery) is a
/// different state from an empty one; callers model absence with
/// `Option<PtzCapabilities>` or by leaving the device out of the
/// discovery result map. An empty set means "resolved, none supported".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtzCapabilities {
    #[serde(default)]
    pub supported_movements: Vec<Movement>,
    #[serde(default)]
    pub supported_zoom: Vec<ZoomOp>,
}

impl PtzCapabilities {
    /// `true` iff this device has at least one movement or zoom control.
    pub fn has_any_controls(&self) -> bool {
        !self.supported_movements.is_empty() || !self.supported_zoom.is_empty()
    }

    pub fn can_move(&self) -> bool {
        !self.supported_movements.is_empty()
    }

    pub fn can_zoom(&self) -> bool {
        !self.supported_zoom.is_empty()
    }
}

/// Request body for `POST /api/ptz/move/{deviceId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}
