//! Dry run that discovers SYNC points without generating positions
//!
//! Every branch of every conditional is visited, since the outcome is not
//! known ahead of time, and every loop body is visited exactly once. Tick
//! offsets are therefore estimates: PAUSE adds its duration, movement adds
//! its interval, SYNC/WAIT_FOR/RESET/BREAK/CONTINUE/PERIOD add one and
//! container statements add nothing of their own.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::Executor;
use crate::program::{Expr, Statement, Variables};
use crate::timeline::{Position, Size, SyncEvent};

struct DryRun<'a> {
    variables: Variables,
    tick: usize,
    events: Vec<SyncEvent>,
    waits: BTreeSet<String>,
    sequences: HashMap<&'a str, &'a [Statement]>,
    expanding: HashSet<&'a str>,
}

impl<'a> DryRun<'a> {
    fn new(variables: Variables) -> Self {
        Self {
            variables,
            tick: 0,
            events: Vec::new(),
            waits: BTreeSet::new(),
            sequences: HashMap::new(),
            expanding: HashSet::new(),
        }
    }

    fn ticks(&self, expr: &Expr) -> usize {
        self.variables.eval_i64(expr).max(0) as usize
    }

    fn visit(&mut self, statements: &'a [Statement]) {
        for statement in statements {
            match statement {
                Statement::Pause { duration } => self.tick += self.ticks(duration),
                Statement::Move(motion)
                | Statement::ScrollClip(motion)
                | Statement::ScrollLoop(motion)
                | Statement::ScrollBounce(motion)
                | Statement::Slide(motion) => self.tick += self.ticks(&motion.interval),
                Statement::MoveTo { interval, .. } => self.tick += self.ticks(interval),
                Statement::Sync { event } => {
                    self.events.push(SyncEvent::new(event.clone(), self.tick));
                    self.tick += 1;
                }
                Statement::WaitFor { event, .. } => {
                    self.waits.insert(event.clone());
                    self.tick += 1;
                }
                Statement::Loop { body, .. } => self.visit(body),
                Statement::If {
                    branches,
                    otherwise,
                } => {
                    for branch in branches {
                        self.visit(&branch.body);
                    }
                    self.visit(otherwise);
                }
                Statement::Segment { body, .. } => self.visit(body),
                Statement::Define { name, body } => {
                    self.sequences.insert(name.as_str(), body.as_slice());
                }
                Statement::Call { name } => {
                    let Some(body) = self.sequences.get(name.as_str()).copied() else {
                        continue;
                    };
                    // recursive sequences are expanded once
                    if self.expanding.insert(name.as_str()) {
                        self.visit(body);
                        self.expanding.remove(name.as_str());
                    }
                }
                Statement::ResetPosition
                | Statement::Break
                | Statement::Continue
                | Statement::Period { .. } => self.tick += 1,
            }
        }
    }
}

impl Executor {
    fn dry_run(&self, widget: Size, container: Size, start: &Position) -> DryRun<'_> {
        let mut run = DryRun::new(self.variables(widget, container, start));
        run.visit(&self.program().statements);
        run
    }

    /// Approximate `(event, tick)` pairs for every SYNC the program may emit
    pub fn extract_sync_events(
        &self,
        widget_size: Size,
        container_size: Size,
        starting_position: Position,
    ) -> Vec<SyncEvent> {
        let run = self.dry_run(widget_size, container_size, &starting_position);
        debug!(events = run.events.len(), ticks = run.tick, "Extracted sync events");
        run.events
    }

    /// Names of every event the program may wait for
    pub fn waiting_for_events(&self) -> BTreeSet<String> {
        self.dry_run(Size::default(), Size::default(), &Position::default())
            .waits
    }
}

#[cfg(test)]
mod tests {
    use crate::executor::Executor;
    use crate::program::{BinaryOp, Branch, Direction, Expr, Motion, Program, Statement};
    use crate::timeline::{Position, Size, SyncEvent};

    fn extract(statements: Vec<Statement>) -> Vec<SyncEvent> {
        Executor::new(Program::new(statements)).extract_sync_events(
            Size::new(100, 20),
            Size::new(300, 20),
            Position::new(0, 0),
        )
    }

    #[test]
    fn test_pause_duration_counts_toward_tick() {
        let events = extract(vec![Statement::pause(30), Statement::sync("e")]);
        assert_eq!(events, vec![SyncEvent::new("e", 30)]);
    }

    #[test]
    fn test_all_branches_are_visited() {
        let events = extract(vec![Statement::If {
            branches: vec![Branch {
                condition: Expr::binary(BinaryOp::Eq, 1.into(), 2.into()),
                body: vec![Statement::sync("never")],
            }],
            otherwise: vec![Statement::sync("always")],
        }]);
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["never", "always"]);
    }

    #[test]
    fn test_loop_body_visited_once() {
        let events = extract(vec![Statement::forever(vec![
            Statement::Move(Motion::new(Direction::Right, 10).interval(2)),
            Statement::sync("lap"),
        ])]);
        assert_eq!(events, vec![SyncEvent::new("lap", 2)]);
    }

    #[test]
    fn test_sequences_expand_at_call_site() {
        let events = extract(vec![
            Statement::Define {
                name: "signal".to_string(),
                body: vec![
                    Statement::sync("ping"),
                    Statement::Call {
                        name: "signal".to_string(),
                    },
                ],
            },
            Statement::pause(4),
            Statement::Call {
                name: "signal".to_string(),
            },
        ]);
        assert_eq!(events, vec![SyncEvent::new("ping", 4)]);
    }

    #[test]
    fn test_waits_are_collected_from_every_branch() {
        let executor = Executor::new(Program::new(vec![Statement::If {
            branches: vec![Branch {
                condition: false.into(),
                body: vec![Statement::wait_for("a", 10)],
            }],
            otherwise: vec![Statement::wait_for("b", 10)],
        }]));
        let waits: Vec<String> = executor.waiting_for_events().into_iter().collect();
        assert_eq!(waits, vec!["a".to_string(), "b".to_string()]);
    }
}
