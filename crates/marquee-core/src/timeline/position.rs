//! Frame-level animation state

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Width/height pair for widgets and containers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// One frame of animation state
///
/// Equality compares only the coordinates; the flags are metadata
/// describing why the frame exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pause: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub pause_end: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub terminal: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reset: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_name: Option<String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn coords(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Plain copy of the coordinates with every flag cleared
    pub fn at(&self) -> Self {
        Self::new(self.x, self.y)
    }

    pub fn paused(mut self) -> Self {
        self.pause = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Largest per-axis distance to `other`
    pub fn chebyshev(&self, other: &Position) -> i64 {
        let dx = (i64::from(other.x) - i64::from(self.x)).abs();
        let dy = (i64::from(other.y) - i64::from(self.y)).abs();
        dx.max(dy)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Position {}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}
