//! Statement tree for animation programs
//!
//! Programs arrive as an immutable tree of [`Statement`]s. Text parsing is
//! somebody else's job; the tree is plain data and deserializes from JSON or
//! TOML with an internal `type` tag.

mod expr;
mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use expr::{BinaryOp, Expr, Value, VariableSource, Variables};
pub use validate::{validate, ValidationWarning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit vector in screen coordinates (y grows downward)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Down => (0, 1),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// Arguments shared by the directional movement statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    pub direction: Direction,
    #[serde(default = "Expr::zero")]
    pub distance: Expr,
    /// Pixels per emitted position
    #[serde(default = "Expr::one")]
    pub step: Expr,
    /// Ticks each emitted position is held for
    #[serde(default = "Expr::one")]
    pub interval: Expr,
    /// Blank space between repeats (scroll_loop)
    #[serde(default = "Expr::zero")]
    pub gap: Expr,
    /// Paused ticks at each end (scroll_bounce)
    #[serde(default = "Expr::zero")]
    pub pause_at_ends: Expr,
}

impl Motion {
    pub fn new(direction: Direction, distance: impl Into<Expr>) -> Self {
        Self {
            direction,
            distance: distance.into(),
            step: Expr::one(),
            interval: Expr::one(),
            gap: Expr::zero(),
            pause_at_ends: Expr::zero(),
        }
    }

    pub fn step(mut self, step: impl Into<Expr>) -> Self {
        self.step = step.into();
        self
    }

    pub fn interval(mut self, interval: impl Into<Expr>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn gap(mut self, gap: impl Into<Expr>) -> Self {
        self.gap = gap.into();
        self
    }

    pub fn pause_at_ends(mut self, ticks: impl Into<Expr>) -> Self {
        self.pause_at_ends = ticks.into();
        self
    }
}

/// Coordinate pair for absolute movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointExpr {
    pub x: Expr,
    pub y: Expr,
}

impl PointExpr {
    pub fn new(x: impl Into<Expr>, y: impl Into<Expr>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopCount {
    Infinite,
    Times(Expr),
}

/// One `if`/`elseif` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub condition: Expr,
    #[serde(default)]
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Statement {
    /// Relative movement along a direction
    Move(Motion),
    /// Linear movement between two explicit coordinates
    MoveTo {
        from: PointExpr,
        to: PointExpr,
        #[serde(default = "Expr::one")]
        step: Expr,
        #[serde(default = "Expr::one")]
        interval: Expr,
    },
    Pause {
        duration: Expr,
    },
    ResetPosition,
    Loop {
        count: LoopCount,
        #[serde(default)]
        body: Vec<Statement>,
    },
    If {
        branches: Vec<Branch>,
        #[serde(default, rename = "else")]
        otherwise: Vec<Statement>,
    },
    Break,
    Continue,
    Sync {
        event: String,
    },
    WaitFor {
        event: String,
        max_ticks: Expr,
    },
    ScrollClip(Motion),
    ScrollLoop(Motion),
    ScrollBounce(Motion),
    Slide(Motion),
    Define {
        name: String,
        #[serde(default)]
        body: Vec<Statement>,
    },
    Call {
        name: String,
    },
    Period {
        ticks: Expr,
    },
    Segment {
        name: String,
        #[serde(default)]
        body: Vec<Statement>,
    },
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move(_) => "move",
            Self::MoveTo { .. } => "move_to",
            Self::Pause { .. } => "pause",
            Self::ResetPosition => "reset_position",
            Self::Loop { .. } => "loop",
            Self::If { .. } => "if",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Sync { .. } => "sync",
            Self::WaitFor { .. } => "wait_for",
            Self::ScrollClip(_) => "scroll_clip",
            Self::ScrollLoop(_) => "scroll_loop",
            Self::ScrollBounce(_) => "scroll_bounce",
            Self::Slide(_) => "slide",
            Self::Define { .. } => "define",
            Self::Call { .. } => "call",
            Self::Period { .. } => "period",
            Self::Segment { .. } => "segment",
        }
    }

    pub fn pause(duration: impl Into<Expr>) -> Self {
        Self::Pause {
            duration: duration.into(),
        }
    }

    pub fn repeat(count: impl Into<Expr>, body: Vec<Statement>) -> Self {
        Self::Loop {
            count: LoopCount::Times(count.into()),
            body,
        }
    }

    pub fn forever(body: Vec<Statement>) -> Self {
        Self::Loop {
            count: LoopCount::Infinite,
            body,
        }
    }

    pub fn sync(event: impl Into<String>) -> Self {
        Self::Sync {
            event: event.into(),
        }
    }

    pub fn wait_for(event: impl Into<String>, max_ticks: impl Into<Expr>) -> Self {
        Self::WaitFor {
            event: event.into(),
            max_ticks: max_ticks.into(),
        }
    }
}

/// A complete animation program: statements plus named constants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            variables: BTreeMap::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Left.delta(), (-1, 0));
        assert_eq!(Direction::Down.delta(), (0, 1));
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert!(Direction::Right.is_horizontal());
        assert!(!Direction::Up.is_horizontal());
    }

    #[test]
    fn test_deserialize_program_json() {
        let program: Program = serde_json::from_str(
            r#"{
                "statements": [
                    {"type": "move", "direction": "right", "distance": 50},
                    {"type": "loop", "count": {"times": 3}, "body": [
                        {"type": "scroll_bounce", "direction": "left", "distance": 20,
                         "step": 5, "pause_at_ends": 3}
                    ]},
                    {"type": "loop", "count": "infinite", "body": [{"type": "break"}]},
                    {"type": "if", "branches": [
                        {"condition": {"op": ">", "lhs": {"var": "widget.x"}, "rhs": 10},
                         "body": [{"type": "sync", "event": "done"}]}
                    ], "else": [{"type": "reset_position"}]},
                    {"type": "wait_for", "event": "done", "max_ticks": 100}
                ],
                "variables": {"speed": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(program.statements.len(), 5);
        assert_eq!(
            program.statements[0],
            Statement::Move(Motion::new(Direction::Right, 50))
        );
        assert_eq!(
            program.statements[1],
            Statement::repeat(
                3,
                vec![Statement::ScrollBounce(
                    Motion::new(Direction::Left, 20).step(5).pause_at_ends(3)
                )]
            )
        );
        assert_eq!(
            program.statements[2],
            Statement::forever(vec![Statement::Break])
        );
        match &program.statements[3] {
            Statement::If { branches, otherwise } => {
                assert_eq!(branches.len(), 1);
                assert_eq!(otherwise, &vec![Statement::ResetPosition]);
            }
            other => panic!("expected if, got {:?}", other),
        }
        assert_eq!(program.variables.get("speed"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_deserialize_program_toml() {
        let program: Program = toml::from_str(
            r#"
            [[statements]]
            type = "scroll_clip"
            direction = "left"
            distance = 20
            step = 2

            [[statements]]
            type = "pause"
            duration = 5
            "#,
        )
        .unwrap();
        assert_eq!(
            program.statements,
            vec![
                Statement::ScrollClip(Motion::new(Direction::Left, 20).step(2)),
                Statement::pause(5),
            ]
        );
    }
}
