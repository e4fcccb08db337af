//! Static checks that produce non-fatal warnings
//!
//! Nothing reported here stops a program from running; the executor
//! recovers from each of these at runtime.

use std::collections::HashSet;
use std::fmt;

use super::{Expr, LoopCount, Motion, Program, Statement};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    UndefinedSequence(String),
    DuplicateSequence(String),
    BreakOutsideLoop,
    ContinueOutsideLoop,
    NonPositiveArgument {
        statement: &'static str,
        argument: &'static str,
        value: i64,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedSequence(name) => write!(f, "sequence '{}' is called but never defined", name),
            Self::DuplicateSequence(name) => write!(f, "sequence '{}' is defined more than once", name),
            Self::BreakOutsideLoop => write!(f, "break outside of a loop is ignored"),
            Self::ContinueOutsideLoop => write!(f, "continue outside of a loop is ignored"),
            Self::NonPositiveArgument {
                statement,
                argument,
                value,
            } => write!(f, "{} has {} = {}; nothing will be emitted", statement, argument, value),
        }
    }
}

/// Collect warnings for a whole program
pub fn validate(program: &Program) -> Vec<ValidationWarning> {
    let mut defined = HashSet::new();
    let mut called = Vec::new();
    let mut warnings = Vec::new();

    walk(&program.statements, 0, &mut defined, &mut called, &mut warnings);

    for name in called {
        if !defined.contains(&name) {
            let warning = ValidationWarning::UndefinedSequence(name);
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
    }

    warnings
}

fn walk(
    statements: &[Statement],
    loop_depth: usize,
    defined: &mut HashSet<String>,
    called: &mut Vec<String>,
    warnings: &mut Vec<ValidationWarning>,
) {
    for statement in statements {
        let kind = statement.kind();
        match statement {
            Statement::Move(motion)
            | Statement::ScrollClip(motion)
            | Statement::ScrollBounce(motion)
            | Statement::Slide(motion) => {
                check_positive(kind, "distance", &motion.distance, warnings);
                check_motion(kind, motion, warnings);
            }
            Statement::ScrollLoop(motion) => check_motion(kind, motion, warnings),
            Statement::MoveTo { step, interval, .. } => {
                check_positive(kind, "step", step, warnings);
                check_positive(kind, "interval", interval, warnings);
            }
            Statement::Pause { duration } => check_positive(kind, "duration", duration, warnings),
            Statement::WaitFor { max_ticks, .. } => {
                check_positive(kind, "max_ticks", max_ticks, warnings)
            }
            Statement::Period { ticks } => check_positive(kind, "ticks", ticks, warnings),
            Statement::Loop { count, body } => {
                if let LoopCount::Times(count) = count {
                    check_positive(kind, "count", count, warnings);
                }
                walk(body, loop_depth + 1, defined, called, warnings);
            }
            Statement::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    walk(&branch.body, loop_depth, defined, called, warnings);
                }
                walk(otherwise, loop_depth, defined, called, warnings);
            }
            Statement::Break if loop_depth == 0 => warnings.push(ValidationWarning::BreakOutsideLoop),
            Statement::Continue if loop_depth == 0 => {
                warnings.push(ValidationWarning::ContinueOutsideLoop)
            }
            Statement::Define { name, body } => {
                if !defined.insert(name.clone()) {
                    warnings.push(ValidationWarning::DuplicateSequence(name.clone()));
                }
                // a sequence body may be invoked from inside a loop
                walk(body, loop_depth.max(1), defined, called, warnings);
            }
            Statement::Call { name } => called.push(name.clone()),
            Statement::Segment { body, .. } => walk(body, loop_depth, defined, called, warnings),
            Statement::Break
            | Statement::Continue
            | Statement::ResetPosition
            | Statement::Sync { .. } => {}
        }
    }
}

fn check_motion(kind: &'static str, motion: &Motion, warnings: &mut Vec<ValidationWarning>) {
    check_positive(kind, "step", &motion.step, warnings);
    check_positive(kind, "interval", &motion.interval, warnings);
}

fn check_positive(
    statement: &'static str,
    argument: &'static str,
    expr: &Expr,
    warnings: &mut Vec<ValidationWarning>,
) {
    if let Some(value) = expr.literal_i64() {
        if value <= 0 {
            warnings.push(ValidationWarning::NonPositiveArgument {
                statement,
                argument,
                value,
            });
        }
    }
}
