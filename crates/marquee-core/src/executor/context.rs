//! Mutable interpreter state for one program run

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::warn;

use crate::program::{Direction, Statement, Variables};
use crate::timeline::{smoothing, Position, SegmentSpan, SyncEvent, Timeline};

/// Identity of a statement node inside the program being executed.
///
/// The tree is borrowed immutably for the whole run, so node addresses are
/// stable and distinguish two instances of the same command kind.
pub type StatementKey = usize;

pub(crate) fn statement_key(statement: &Statement) -> StatementKey {
    statement as *const Statement as usize
}

/// Cumulative progress of a scroll_clip or slide command
#[derive(Debug, Clone)]
pub(crate) struct Progress {
    pub origin: Position,
    pub direction: Direction,
    pub total_moved: i32,
    pub stabilized: bool,
}

impl Progress {
    pub fn new(origin: Position, direction: Direction) -> Self {
        Self {
            origin,
            direction,
            total_moved: 0,
            stabilized: false,
        }
    }
}

pub struct ExecutionContext<'a> {
    pub variables: Variables,
    pub timeline: Vec<Position>,
    /// Positions emitted so far; always equal to `timeline.len()`
    pub tick_position: usize,
    pub loop_counters: HashMap<StatementKey, i64>,
    pub breaking: bool,
    pub continuing: bool,
    pub events: HashMap<String, bool>,
    pub defined_sync_events: BTreeSet<String>,
    pub waiting_for_events: BTreeSet<String>,
    pub event_positions: HashMap<String, usize>,
    pub defined_sequences: HashMap<String, &'a [Statement]>,
    pub(crate) clip_progress: HashMap<StatementKey, Progress>,
    pub(crate) slide_progress: Option<Progress>,
    pub(crate) completed_scroll_loops: HashSet<StatementKey>,
    /// Set by PERIOD; always wins
    pub(crate) period: Option<usize>,
    /// Length of the cycle a bounce or scroll loop produced; only kept if
    /// nothing after it breaks the cycle
    pub(crate) implicit_period: Option<usize>,
    pub(crate) loop_start: Option<usize>,
    pub(crate) segments: Vec<SegmentSpan>,
    pub(crate) sync_ticks: Vec<SyncEvent>,
    pub(crate) active_segment: Option<String>,
    /// Bridge multi-pixel jumps as frames are emitted
    pub(crate) smoothing: bool,
    max_positions: usize,
    capped: bool,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        variables: Variables,
        event_positions: HashMap<String, usize>,
        max_positions: usize,
    ) -> Self {
        Self {
            variables,
            timeline: Vec::new(),
            tick_position: 0,
            loop_counters: HashMap::new(),
            breaking: false,
            continuing: false,
            events: HashMap::new(),
            defined_sync_events: BTreeSet::new(),
            waiting_for_events: BTreeSet::new(),
            event_positions,
            defined_sequences: HashMap::new(),
            clip_progress: HashMap::new(),
            slide_progress: None,
            completed_scroll_loops: HashSet::new(),
            period: None,
            implicit_period: None,
            loop_start: None,
            segments: Vec::new(),
            sync_ticks: Vec::new(),
            active_segment: None,
            smoothing: false,
            max_positions,
            capped: false,
        }
    }

    /// The widget's tracked position as a flag-free frame
    pub fn current(&self) -> Position {
        Position::new(self.variables.widget_x, self.variables.widget_y)
    }

    pub fn last(&self) -> Option<&Position> {
        self.timeline.last()
    }

    /// Append one frame. Returns false once the position cap is reached.
    ///
    /// With smoothing on, one-pixel frames are inserted ahead of a jump so
    /// `tick_position` is already the final index of every frame.
    pub fn emit(&mut self, mut position: Position) -> bool {
        if position.segment_name.is_none() {
            position.segment_name = self.active_segment.clone();
        }
        if self.smoothing {
            let bridge = match self.timeline.last() {
                Some(prev) if smoothing::needs_bridge(prev, &position) => {
                    smoothing::bridge(prev, &position)
                }
                _ => Vec::new(),
            };
            for frame in bridge {
                if !self.push(frame) {
                    return false;
                }
            }
        }
        self.push(position)
    }

    fn push(&mut self, position: Position) -> bool {
        if self.timeline.len() >= self.max_positions {
            if !self.capped {
                warn!(
                    max_positions = self.max_positions,
                    "Position cap reached, dropping further output"
                );
                self.capped = true;
            }
            return false;
        }
        self.timeline.push(position);
        self.tick_position = self.timeline.len();
        true
    }

    /// Append `interval` copies of one frame
    pub fn emit_held(&mut self, position: Position, interval: usize) -> bool {
        for _ in 0..interval {
            if !self.emit(position.clone()) {
                return false;
            }
        }
        true
    }

    /// `count` paused frames at `at`; the last one ends the pause
    pub fn emit_pause(&mut self, at: &Position, count: usize) {
        for i in 0..count {
            let mut position = at.at().paused();
            position.pause_end = i + 1 == count;
            if !self.emit(position) {
                return;
            }
        }
    }

    pub fn mark_last_terminal(&mut self) {
        if let Some(last) = self.timeline.last_mut() {
            last.terminal = true;
        }
    }

    /// Force the tracked widget coordinates onto the last emitted frame
    pub fn sync_widget_position(&mut self) {
        if let Some(last) = self.timeline.last() {
            self.variables.widget_x = last.x;
            self.variables.widget_y = last.y;
        }
    }

    pub fn set_implicit_period(&mut self, ticks: usize) {
        if self.implicit_period.is_none() && ticks > 0 {
            self.implicit_period = Some(ticks);
        }
    }

    /// Explicit period, else the implicit one if every frame generated past
    /// it repeats the cycle
    fn resolved_period(&self) -> Option<usize> {
        if self.period.is_some() {
            return self.period;
        }
        let cycle = self.implicit_period?;
        let repeats = self.timeline[cycle.min(self.timeline.len())..]
            .iter()
            .enumerate()
            .all(|(i, pos)| *pos == self.timeline[i]);
        if repeats {
            Some(cycle)
        } else {
            warn!(
                cycle,
                generated = self.timeline.len(),
                "Frames after a looping command break its cycle, playing the whole timeline"
            );
            None
        }
    }

    pub fn set_explicit_period(&mut self, ticks: usize) {
        self.period = Some(ticks);
    }

    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Consume the context into a timeline; an empty run yields `fallback`
    pub fn into_timeline(self, fallback: Position) -> Timeline {
        let period = self.resolved_period();
        let mut positions = self.timeline;
        if positions.is_empty() {
            positions.push(fallback.at());
        }
        Timeline::new(
            positions,
            period,
            self.loop_start.unwrap_or(0),
            self.segments,
            self.sync_ticks,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(max_positions: usize) -> ExecutionContext<'static> {
        ExecutionContext::new(Variables::default(), HashMap::new(), max_positions)
    }

    #[test]
    fn test_emit_tracks_ticks_and_segment() {
        let mut ctx = context(10);
        ctx.active_segment = Some("intro".to_string());
        assert!(ctx.emit(Position::new(1, 0)));
        assert_eq!(ctx.tick_position, 1);
        assert_eq!(ctx.timeline[0].segment_name.as_deref(), Some("intro"));
    }

    #[test]
    fn test_emit_stops_at_cap() {
        let mut ctx = context(3);
        assert!(!ctx.emit_held(Position::new(0, 0), 5));
        assert_eq!(ctx.timeline.len(), 3);
        assert!(ctx.is_capped());
    }

    #[test]
    fn test_pause_marks_only_last_end() {
        let mut ctx = context(10);
        ctx.emit_pause(&Position::new(2, 2), 3);
        let ends: Vec<bool> = ctx.timeline.iter().map(|p| p.pause_end).collect();
        assert_eq!(ends, vec![false, false, true]);
        assert!(ctx.timeline.iter().all(|p| p.pause));
    }

    #[test]
    fn test_explicit_period_wins() {
        let mut ctx = context(10);
        ctx.set_explicit_period(7);
        ctx.set_implicit_period(3);
        assert_eq!(ctx.resolved_period(), Some(7));
    }

    #[test]
    fn test_implicit_period_dropped_when_cycle_is_broken() {
        let mut ctx = context(20);
        for x in [1, 2, 1, 0] {
            ctx.emit(Position::new(x, 0));
        }
        ctx.set_implicit_period(4);
        ctx.emit(Position::new(1, 0));
        ctx.emit(Position::new(2, 0));
        assert_eq!(ctx.resolved_period(), Some(4));

        ctx.emit(Position::new(0, 5));
        assert_eq!(ctx.resolved_period(), None);
        assert_eq!(ctx.into_timeline(Position::default()).len(), 7);
    }

    #[test]
    fn test_smoothing_bridges_at_emit() {
        let mut ctx = context(20);
        ctx.smoothing = true;
        ctx.emit(Position::new(0, 0));
        ctx.emit(Position::new(3, -2));
        let coords: Vec<(i32, i32)> = ctx.timeline.iter().map(|p| p.coords()).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, -1), (3, -2)]);
        assert_eq!(ctx.tick_position, 4);

        let mut reset = Position::new(0, 0);
        reset.reset = true;
        ctx.emit(reset);
        assert_eq!(ctx.tick_position, 5);
    }

    #[test]
    fn test_empty_run_falls_back_to_start() {
        let timeline = context(10).into_timeline(Position::new(4, 5));
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.positions()[0].coords(), (4, 5));
    }
}
