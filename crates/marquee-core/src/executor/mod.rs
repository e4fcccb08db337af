//! Timeline generation
//!
//! The [`Executor`] walks a program's statement tree with an explicit stack
//! of frames instead of recursion, so nesting depth never grows the call
//! stack. Generation stops when the stack empties, when the step limit or
//! timeline-length limit is hit, or when an unbounded loop keeps ending its
//! iterations on the same coordinate ("stabilization").

mod commands;
mod context;
mod extract;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::config::EngineConfig;
use crate::program::{LoopCount, Program, Statement, VariableSource, Variables};
use crate::timeline::{Position, SegmentSpan, Size, Timeline};
use crate::{Error, Result};

pub use context::{ExecutionContext, StatementKey};

use context::statement_key;

/// Why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    StepLimit,
    TimelineLimit,
    Stabilized,
}

#[derive(Debug)]
enum FrameKind {
    Block,
    Segment { name: String, start: usize },
    Loop {
        key: StatementKey,
        total: Option<i64>,
        unrolled: bool,
    },
}

#[derive(Debug)]
struct Frame<'a> {
    statements: &'a [Statement],
    index: usize,
    kind: FrameKind,
}

impl<'a> Frame<'a> {
    fn new(statements: &'a [Statement], kind: FrameKind) -> Self {
        Self {
            statements,
            index: 0,
            kind,
        }
    }

    fn is_loop(&self) -> bool {
        matches!(self.kind, FrameKind::Loop { .. })
    }

    fn is_exhausted(&self) -> bool {
        self.index >= self.statements.len()
    }
}

/// Generates timelines for one animated element
#[derive(Debug, Clone)]
pub struct Executor {
    program: Program,
    config: EngineConfig,
    event_positions: HashMap<String, usize>,
    source: Option<Arc<dyn VariableSource>>,
}

impl Executor {
    pub fn new(program: Program) -> Self {
        Self::with_config(program, EngineConfig::default())
    }

    pub fn with_config(program: Program, config: EngineConfig) -> Self {
        Self {
            program,
            config,
            event_positions: HashMap::new(),
            source: None,
        }
    }

    /// Attach the provider used for variables the program does not define
    pub fn with_variable_source(mut self, source: Arc<dyn VariableSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn set_program(&mut self, program: Program) {
        self.program = program;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Ticks of events emitted elsewhere, used to size WAIT_FOR exactly
    pub fn set_event_positions(&mut self, positions: HashMap<String, usize>) {
        self.event_positions = positions;
    }

    pub fn event_positions(&self) -> &HashMap<String, usize> {
        &self.event_positions
    }

    fn variables(&self, widget: Size, container: Size, start: &Position) -> Variables {
        Variables {
            widget_x: start.x,
            widget_y: start.y,
            widget_width: widget.width,
            widget_height: widget.height,
            container_width: container.width,
            container_height: container.height,
            constants: self.program.variables.clone(),
            source: self.source.clone(),
        }
    }

    /// Run the program and return its timeline.
    ///
    /// Never fails: a structural fault is logged and whatever was generated
    /// up to that point is returned. The result always holds at least one
    /// position.
    pub fn execute(
        &self,
        widget_size: Size,
        container_size: Size,
        starting_position: Position,
        max_steps: Option<usize>,
    ) -> Timeline {
        let limit = max_steps.unwrap_or(self.config.max_steps).max(1);
        let variables = self.variables(widget_size, container_size, &starting_position);
        let mut ctx = ExecutionContext::new(
            variables,
            self.event_positions.clone(),
            self.config.max_positions,
        );
        ctx.smoothing = self.config.smoothing;
        let mut frames = Vec::new();

        match self.run(&mut ctx, &mut frames, limit) {
            Ok(reason) => debug!(
                ?reason,
                positions = ctx.timeline.len(),
                period = ?ctx.period,
                implicit_period = ?ctx.implicit_period,
                "Timeline generated"
            ),
            Err(e) => error!(
                error = %e,
                positions = ctx.timeline.len(),
                "Timeline generation aborted, returning partial timeline"
            ),
        }

        // close segments left open by an early stop
        while let Some(frame) = frames.pop() {
            close_frame(&mut ctx, frame);
        }

        ctx.into_timeline(starting_position)
    }

    fn run<'a>(
        &'a self,
        ctx: &mut ExecutionContext<'a>,
        frames: &mut Vec<Frame<'a>>,
        limit: usize,
    ) -> Result<StopReason> {
        frames.push(Frame::new(&self.program.statements, FrameKind::Block));
        let mut steps = 0usize;
        let mut recent: VecDeque<(i32, i32)> =
            VecDeque::with_capacity(self.config.stabilization_window);

        loop {
            if ctx.breaking {
                unwind_break(ctx, frames);
                continue;
            }
            if ctx.continuing {
                unwind_continue(ctx, frames);
                continue;
            }

            if frames.is_empty() {
                return Ok(StopReason::Completed);
            }
            if steps >= limit {
                return Ok(StopReason::StepLimit);
            }
            if ctx.timeline.len() >= limit {
                return Ok(StopReason::TimelineLimit);
            }

            let Some(frame) = frames.last_mut() else {
                return Ok(StopReason::Completed);
            };

            if !frame.is_exhausted() {
                let statements = frame.statements;
                let statement = &statements[frame.index];
                frame.index += 1;
                steps += 1;
                self.dispatch(statement, ctx, frames)?;
                ctx.sync_widget_position();
                continue;
            }

            // end of a block or of one loop iteration
            let FrameKind::Loop {
                key,
                total,
                unrolled,
            } = frame.kind
            else {
                if let Some(frame) = frames.pop() {
                    close_frame(ctx, frame);
                }
                ctx.active_segment = active_segment(frames);
                continue;
            };

            let counter = ctx.loop_counters.entry(key).or_insert(0);
            *counter += 1;
            let again = total.map_or(true, |total| *counter < total);

            if !unrolled {
                // each pass of an unbounded loop is one scheduler step
                steps += 1;
                if self.stabilized(&mut recent, ctx.current().coords()) {
                    debug!(position = ?ctx.current().coords(), "Position stabilized");
                    return Ok(StopReason::Stabilized);
                }
            }

            if again {
                frame.index = 0;
            } else {
                frames.pop();
            }
        }
    }

    fn stabilized(&self, recent: &mut VecDeque<(i32, i32)>, coords: (i32, i32)) -> bool {
        if self.config.stabilization_repeats == 0 {
            return false;
        }
        if recent.len() >= self.config.stabilization_window.max(1) {
            recent.pop_front();
        }
        recent.push_back(coords);
        recent.iter().filter(|c| **c == coords).count() >= self.config.stabilization_repeats
    }

    fn push<'a>(&self, frames: &mut Vec<Frame<'a>>, frame: Frame<'a>) -> Result<()> {
        if frames.len() >= self.config.max_frame_depth {
            return Err(Error::Program(format!(
                "nesting deeper than {} frames",
                self.config.max_frame_depth
            )));
        }
        frames.push(frame);
        Ok(())
    }

    fn dispatch<'a>(
        &'a self,
        statement: &'a Statement,
        ctx: &mut ExecutionContext<'a>,
        frames: &mut Vec<Frame<'a>>,
    ) -> Result<()> {
        match statement {
            Statement::Move(motion) => commands::move_by(ctx, motion),
            Statement::MoveTo {
                from,
                to,
                step,
                interval,
            } => commands::move_to(ctx, from, to, step, interval),
            Statement::Pause { duration } => commands::pause(ctx, duration),
            Statement::ResetPosition => commands::reset_position(ctx),
            Statement::Loop { count, body } => {
                let total = match count {
                    LoopCount::Infinite => None,
                    LoopCount::Times(expr) => {
                        let n = ctx.variables.eval_i64(expr);
                        if n <= 0 {
                            debug!(count = n, "Loop with non-positive count skipped");
                            return Ok(());
                        }
                        Some(n)
                    }
                };
                let unrolled = total.is_some_and(|n| n <= self.config.loop_unroll_limit);
                if !unrolled && ctx.loop_start.is_none() {
                    ctx.loop_start = Some(ctx.timeline.len());
                }

                let key = statement_key(statement);
                ctx.loop_counters.insert(key, 0);
                self.push(
                    frames,
                    Frame::new(
                        body,
                        FrameKind::Loop {
                            key,
                            total,
                            unrolled,
                        },
                    ),
                )?;
            }
            Statement::If {
                branches,
                otherwise,
            } => {
                // conditions are evaluated in order; untaken arms never run
                let body = branches
                    .iter()
                    .find(|branch| ctx.variables.eval_bool(&branch.condition))
                    .map(|branch| branch.body.as_slice())
                    .unwrap_or(otherwise.as_slice());
                if !body.is_empty() {
                    self.push(frames, Frame::new(body, FrameKind::Block))?;
                }
            }
            Statement::Break => {
                if frames.iter().any(Frame::is_loop) {
                    ctx.breaking = true;
                } else {
                    warn!("break outside of a loop ignored");
                }
            }
            Statement::Continue => {
                if frames.iter().any(Frame::is_loop) {
                    ctx.continuing = true;
                } else {
                    warn!("continue outside of a loop ignored");
                }
            }
            Statement::Sync { event } => commands::sync(ctx, event),
            Statement::WaitFor { event, max_ticks } => commands::wait_for(ctx, event, max_ticks),
            Statement::ScrollClip(motion) => {
                commands::scroll_clip(ctx, statement_key(statement), motion)
            }
            Statement::ScrollLoop(motion) => {
                commands::scroll_loop(ctx, statement_key(statement), motion)
            }
            Statement::ScrollBounce(motion) => commands::scroll_bounce(ctx, motion),
            Statement::Slide(motion) => commands::slide(ctx, motion),
            Statement::Define { name, body } => {
                ctx.defined_sequences.insert(name.clone(), body.as_slice());
            }
            Statement::Call { name } => match ctx.defined_sequences.get(name.as_str()).copied() {
                Some(body) => self.push(frames, Frame::new(body, FrameKind::Block))?,
                None => warn!(sequence = %name, "Call of undefined sequence ignored"),
            },
            Statement::Period { ticks } => {
                let ticks = ctx.variables.eval_i64(ticks);
                if ticks > 0 {
                    ctx.set_explicit_period(ticks as usize);
                } else {
                    warn!(ticks, "Period must be positive, ignored");
                }
            }
            Statement::Segment { name, body } => {
                let start = ctx.timeline.len();
                self.push(
                    frames,
                    Frame::new(
                        body,
                        FrameKind::Segment {
                            name: name.clone(),
                            start,
                        },
                    ),
                )?;
                ctx.active_segment = active_segment(frames);
            }
        }
        Ok(())
    }
}

/// Innermost enclosing segment name
fn active_segment(frames: &[Frame<'_>]) -> Option<String> {
    frames.iter().rev().find_map(|frame| match &frame.kind {
        FrameKind::Segment { name, .. } => Some(name.clone()),
        _ => None,
    })
}

/// Pop bookkeeping: record the span of a finished segment
fn close_frame(ctx: &mut ExecutionContext<'_>, frame: Frame<'_>) {
    if let FrameKind::Segment { name, start } = frame.kind {
        ctx.segments.push(SegmentSpan {
            name,
            start,
            end: ctx.timeline.len(),
        });
    }
}

/// BREAK: drop frames up to and including the nearest loop
fn unwind_break<'a>(ctx: &mut ExecutionContext<'a>, frames: &mut Vec<Frame<'a>>) {
    while let Some(frame) = frames.pop() {
        let was_loop = frame.is_loop();
        close_frame(ctx, frame);
        if was_loop {
            break;
        }
    }
    ctx.breaking = false;
    ctx.active_segment = active_segment(frames);
}

/// CONTINUE: drop frames above the nearest loop and end its current pass
fn unwind_continue<'a>(ctx: &mut ExecutionContext<'a>, frames: &mut Vec<Frame<'a>>) {
    while let Some(frame) = frames.last_mut() {
        if frame.is_loop() {
            frame.index = frame.statements.len();
            break;
        }
        if let Some(frame) = frames.pop() {
            close_frame(ctx, frame);
        }
    }
    ctx.continuing = false;
    ctx.active_segment = active_segment(frames);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{BinaryOp, Branch, Expr, Motion, Direction, PointExpr};
    use crate::timeline::smooth;
    use proptest::prelude::*;

    fn widget() -> Size {
        Size::new(100, 20)
    }

    fn container() -> Size {
        Size::new(300, 20)
    }

    fn run(statements: Vec<Statement>) -> Timeline {
        Executor::new(Program::new(statements)).execute(
            widget(),
            container(),
            Position::new(0, 0),
            None,
        )
    }

    fn xs(timeline: &Timeline) -> Vec<i32> {
        timeline.positions().iter().map(|p| p.x).collect()
    }

    fn right(distance: i64) -> Statement {
        Statement::Move(Motion::new(Direction::Right, distance))
    }

    fn run_smoothed(statements: Vec<Statement>) -> Timeline {
        let config = EngineConfig {
            smoothing: true,
            ..Default::default()
        };
        Executor::with_config(Program::new(statements), config).execute(
            widget(),
            container(),
            Position::new(0, 0),
            None,
        )
    }

    fn coords(timeline: &Timeline) -> Vec<(i32, i32)> {
        timeline.positions().iter().map(|p| p.coords()).collect()
    }

    /// Adjacent frames differ by at most one pixel unless a pause, a
    /// terminal frame or a reset jump is involved
    fn assert_continuous(timeline: &Timeline) {
        for (i, pair) in timeline.positions().windows(2).enumerate() {
            let (a, b) = (&pair[0], &pair[1]);
            if a.pause || b.pause || a.terminal || b.terminal || b.reset {
                continue;
            }
            assert!(a.chebyshev(b) <= 1, "jump at {}: {:?} -> {:?}", i, a, b);
        }
    }

    fn mixed_program() -> Vec<Statement> {
        vec![
            Statement::ScrollBounce(Motion::new(Direction::Right, 12).step(5).pause_at_ends(2)),
            Statement::ScrollClip(Motion::new(Direction::Down, 9).step(4)),
            Statement::sync("clipped"),
            Statement::wait_for("never", 3),
            Statement::Move(Motion::new(Direction::Left, 9).step(3)),
            Statement::ResetPosition,
            Statement::Move(Motion::new(Direction::Up, 6).step(6)),
            Statement::ScrollLoop(Motion::new(Direction::Left, 0).step(3).gap(10)),
        ]
    }

    #[test]
    fn test_move_right_fifty() {
        let timeline = run(vec![right(50)]);
        assert_eq!(timeline.len(), 50);
        assert_eq!(xs(&timeline), (1..=50).collect::<Vec<_>>());
        assert_eq!(timeline.last().unwrap().coords(), (50, 0));
    }

    #[test]
    fn test_empty_program_still_returns_a_frame() {
        let timeline = Executor::new(Program::default()).execute(
            widget(),
            container(),
            Position::new(7, 3),
            None,
        );
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.positions()[0].coords(), (7, 3));
    }

    #[test]
    fn test_small_loop_unrolls_into_one_run() {
        let timeline = run(vec![Statement::repeat(3, vec![right(10)])]);
        assert_eq!(timeline.len(), 30);
        assert_eq!(xs(&timeline), (1..=30).collect::<Vec<_>>());
        assert!(timeline.positions().iter().all(|p| !p.reset));
        assert_eq!(timeline.loop_start(), 0);
    }

    #[test]
    fn test_large_loop_runs_to_count() {
        let timeline = run(vec![right(5), Statement::repeat(20, vec![right(1)])]);
        assert_eq!(timeline.len(), 25);
        assert_eq!(timeline.last().unwrap().x, 25);
        assert_eq!(timeline.loop_start(), 5);
    }

    #[test]
    fn test_infinite_loop_hits_step_limit() {
        let timeline = Executor::new(Program::new(vec![Statement::forever(vec![right(1)])]))
            .execute(widget(), container(), Position::new(0, 0), Some(100));
        assert!(timeline.len() <= 100);
        assert!(timeline.len() >= 40);
    }

    #[test]
    fn test_empty_infinite_loop_terminates() {
        let timeline = run(vec![Statement::forever(Vec::new())]);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_infinite_loop_stabilizes_on_finished_clip() {
        let timeline = run(vec![Statement::forever(vec![Statement::ScrollClip(
            Motion::new(Direction::Left, 20).step(2),
        )])]);
        assert_eq!(timeline.len(), 10);
        assert_eq!(timeline.terminal_count(), 1);
        assert!(timeline.is_terminal(9));
    }

    #[test]
    fn test_break_stops_enclosing_loop() {
        let cond = Expr::binary(BinaryOp::Ge, Expr::var("widget.x"), 3.into());
        let timeline = run(vec![
            Statement::forever(vec![
                right(1),
                Statement::If {
                    branches: vec![Branch {
                        condition: cond,
                        body: vec![Statement::Break],
                    }],
                    otherwise: Vec::new(),
                },
            ]),
            Statement::pause(2),
        ]);
        assert_eq!(xs(&timeline), vec![1, 2, 3, 3, 3]);
        assert_eq!(timeline.pause_count(), 2);
    }

    #[test]
    fn test_continue_skips_rest_of_pass() {
        let timeline = run(vec![Statement::repeat(
            3,
            vec![right(2), Statement::Continue, Statement::pause(5)],
        )]);
        assert_eq!(xs(&timeline), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(timeline.pause_count(), 0);
    }

    #[test]
    fn test_break_outside_loop_is_ignored() {
        let timeline = run(vec![Statement::Break, right(2)]);
        assert_eq!(xs(&timeline), vec![1, 2]);
    }

    #[test]
    fn test_if_takes_exactly_one_branch() {
        let branch = |limit: i64, event: &str| Branch {
            condition: Expr::binary(BinaryOp::Lt, Expr::var("widget.x"), limit.into()),
            body: vec![Statement::sync(event)],
        };
        let timeline = run(vec![
            right(5),
            Statement::If {
                branches: vec![branch(3, "small"), branch(10, "medium")],
                otherwise: vec![Statement::sync("large")],
            },
        ]);
        let fired: Vec<&str> = timeline.sync_ticks().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(fired, vec!["medium"]);
    }

    #[test]
    fn test_conditions_see_widget_size() {
        let timeline = run(vec![Statement::If {
            branches: vec![Branch {
                condition: Expr::binary(
                    BinaryOp::Gt,
                    Expr::var("widget.width"),
                    Expr::var("container.width"),
                ),
                body: vec![right(3)],
            }],
            otherwise: vec![Statement::pause(1)],
        }]);
        assert_eq!(timeline.pause_count(), 1);
    }

    #[test]
    fn test_sequences_inline_at_call_site() {
        let timeline = run(vec![
            Statement::Define {
                name: "nudge".to_string(),
                body: vec![right(2)],
            },
            Statement::Call {
                name: "nudge".to_string(),
            },
            Statement::Call {
                name: "missing".to_string(),
            },
            Statement::Call {
                name: "nudge".to_string(),
            },
        ]);
        assert_eq!(xs(&timeline), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_recursive_sequence_is_bounded() {
        let timeline = run(vec![
            Statement::Define {
                name: "again".to_string(),
                body: vec![
                    right(1),
                    Statement::Call {
                        name: "again".to_string(),
                    },
                ],
            },
            Statement::Call {
                name: "again".to_string(),
            },
        ]);
        // the frame-depth guard aborts the run but keeps partial output
        assert_eq!(timeline.len(), EngineConfig::default().max_frame_depth - 1);
    }

    #[test]
    fn test_explicit_period_overrides_implicit() {
        let timeline = run(vec![
            Statement::Period { ticks: 4.into() },
            Statement::ScrollBounce(Motion::new(Direction::Right, 3)),
        ]);
        assert_eq!(timeline.period(), Some(4));
        assert_eq!(timeline.len(), 4);
    }

    #[test]
    fn test_scroll_loop_length() {
        let timeline = run(vec![Statement::ScrollLoop(
            Motion::new(Direction::Left, 100).step(3).gap(10),
        )]);
        assert_eq!(timeline.len(), 110);
        assert_eq!(timeline.period(), Some(110));
    }

    #[test]
    fn test_segment_names_positions() {
        let timeline = run(vec![
            right(1),
            Statement::Segment {
                name: "intro".to_string(),
                body: vec![right(2)],
            },
            right(1),
        ]);
        let names: Vec<Option<&str>> = timeline
            .positions()
            .iter()
            .map(|p| p.segment_name.as_deref())
            .collect();
        assert_eq!(names, vec![None, Some("intro"), Some("intro"), None]);
        assert_eq!(
            timeline.segments(),
            &[SegmentSpan {
                name: "intro".to_string(),
                start: 1,
                end: 3,
            }]
        );
    }

    #[test]
    fn test_wait_uses_injected_event_tick() {
        let mut executor = Executor::new(Program::new(vec![
            Statement::wait_for("go", 100),
            right(1),
        ]));
        executor.set_event_positions(HashMap::from([("go".to_string(), 30)]));
        let timeline = executor.execute(widget(), container(), Position::new(0, 0), None);
        assert_eq!(timeline.pause_count(), 30);
        assert_eq!(timeline.len(), 32);
    }

    #[test]
    fn test_frames_after_bounce_stay_playable() {
        let timeline = run(vec![
            Statement::ScrollBounce(Motion::new(Direction::Right, 3)),
            Statement::Move(Motion::new(Direction::Down, 10)),
        ]);
        assert_eq!(timeline.period(), None);
        assert_eq!(timeline.len(), 17);
        assert_eq!(timeline.last().unwrap().coords(), (0, 10));
    }

    #[test]
    fn test_sync_after_bounce_is_playable() {
        let timeline = run(vec![
            Statement::ScrollBounce(Motion::new(Direction::Right, 3)),
            Statement::sync("bounced"),
        ]);
        assert_eq!(timeline.period(), None);
        let tick = timeline.sync_ticks()[0].tick;
        assert_eq!(tick, 7);
        assert!(tick < timeline.len());
    }

    #[test]
    fn test_repeated_bounce_keeps_one_cycle_period() {
        let timeline = run(vec![Statement::forever(vec![Statement::ScrollBounce(
            Motion::new(Direction::Right, 3),
        )])]);
        assert!(timeline.positions().len() > 7);
        assert_eq!(timeline.period(), Some(7));
        assert_eq!(
            coords(&timeline)[..7],
            [(1, 0), (2, 0), (3, 0), (3, 0), (2, 0), (1, 0), (0, 0)]
        );
    }

    #[test]
    fn test_smoothed_mixed_program_is_continuous() {
        let timeline = run_smoothed(mixed_program());
        assert_continuous(&timeline);
        assert_eq!(timeline.period(), None);
        assert_eq!(timeline.terminal_count(), 1);
        assert_eq!(timeline.pause_count(), 2 + 2 + 3);
        // already smooth, so post-processing adds nothing
        assert_eq!(smooth(&timeline).positions().len(), timeline.positions().len());
    }

    #[test]
    fn test_smoothing_at_generation_matches_post_processing() {
        let raw = run(mixed_program());
        let processed = smooth(&raw);
        assert_continuous(&processed);

        let generated = run_smoothed(mixed_program());
        assert_eq!(coords(&generated), coords(&processed));
        assert_eq!(generated.sync_ticks(), processed.sync_ticks());

        let tick = generated.sync_ticks()[0].tick;
        let raw_tick = raw.sync_ticks()[0].tick;
        assert_eq!(generated.positions()[tick].coords(), raw.positions()[raw_tick].coords());
    }

    proptest! {
        #[test]
        fn prop_smoothed_generation_is_continuous(
            bounce in (1i64..30, 1i64..8, 0i64..3),
            clip in (1i64..30, 1i64..8),
            moved in (1i64..30, 1i64..8),
            wait in 0i64..4,
        ) {
            let statements = vec![
                Statement::ScrollBounce(
                    Motion::new(Direction::Down, bounce.0).step(bounce.1).pause_at_ends(bounce.2),
                ),
                Statement::ScrollClip(Motion::new(Direction::Left, clip.0).step(clip.1)),
                Statement::wait_for("never", wait),
                Statement::Move(Motion::new(Direction::Up, moved.0).step(moved.1)),
                Statement::ResetPosition,
                Statement::Move(Motion::new(Direction::Right, moved.0).step(moved.1)),
            ];
            let generated = run_smoothed(statements.clone());
            for pair in generated.positions().windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.pause || b.pause || a.terminal || b.terminal || b.reset {
                    continue;
                }
                prop_assert!(a.chebyshev(b) <= 1);
            }
            prop_assert_eq!(coords(&generated), coords(&smooth(&run(statements))));
        }
    }

    #[test]
    fn test_move_to_then_relative_move_tracks_position() {
        let timeline = run(vec![
            Statement::MoveTo {
                from: PointExpr::new(0, 0),
                to: PointExpr::new(0, 2),
                step: Expr::one(),
                interval: Expr::one(),
            },
            right(1),
        ]);
        assert_eq!(timeline.last().unwrap().coords(), (1, 2));
    }
}
