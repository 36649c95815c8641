use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Rc;

/// Stable identifier of a tracked participant. Taken verbatim from the
/// entity id column, so it is usually the player's display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Rc<str>);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(v: &str) -> Self {
        EntityId(Rc::from(v))
    }
}

impl From<String> for EntityId {
    fn from(v: String) -> Self {
        EntityId(Rc::from(v))
    }
}

/// An RGB display color.
pub type Color = [u8; 3];

/// Position in render space (source coordinates with Z inverted at parse time).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Point3 { x, y, z }
    }

    /// True if any axis differs from `other` by more than `epsilon`.
    pub fn moved_from(&self, other: &Point3, epsilon: f32) -> bool {
        (self.x - other.x).abs() > epsilon
            || (self.y - other.y).abs() > epsilon
            || (self.z - other.z).abs() > epsilon
    }
}

/// View orientation in radians.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusFlags {
    pub crouching: bool,
    pub airborne: bool,
    pub dead: bool,
}

/// Health and shield fractions. Both default to full when the source omits them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub shield: f32,
}

impl Default for Vitals {
    fn default() -> Self {
        Vitals {
            health: 1.0,
            shield: 1.0,
        }
    }
}

/// Emblem and armor color ids. Opaque to the engine; forwarded to presentation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cosmetics {
    pub emblem_foreground: i32,
    pub emblem_background: i32,
    pub colors: [i32; 4],
}

/// Running combat counters. Each counter is expected to be non-decreasing per entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
}
