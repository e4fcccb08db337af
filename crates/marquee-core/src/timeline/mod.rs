//! Precomputed position sequences and the queries a renderer runs against them

mod position;
pub(crate) mod smoothing;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use position::{Position, Size};
pub use smoothing::smooth;

/// A named event together with the tick at which it is emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub name: String,
    pub tick: usize,
}

impl SyncEvent {
    pub fn new(name: impl Into<String>, tick: usize) -> Self {
        Self {
            name: name.into(),
            tick,
        }
    }
}

/// Index range `[start, end)` covered by a named segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

/// Ordered positions for one animated element, plus the index sets
/// recorded while generating them.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    positions: Vec<Position>,
    pause_starts: BTreeSet<usize>,
    pause_ends: BTreeSet<usize>,
    terminals: BTreeSet<usize>,
    loop_start: usize,
    period: Option<usize>,
    segments: Vec<SegmentSpan>,
    sync_ticks: Vec<SyncEvent>,
}

impl Timeline {
    /// Build a timeline, deriving the pause and terminal index sets from
    /// the position flags.
    pub fn new(
        positions: Vec<Position>,
        period: Option<usize>,
        loop_start: usize,
        segments: Vec<SegmentSpan>,
        sync_ticks: Vec<SyncEvent>,
    ) -> Self {
        let mut pause_starts = BTreeSet::new();
        let mut pause_ends = BTreeSet::new();
        let mut terminals = BTreeSet::new();

        for (i, pos) in positions.iter().enumerate() {
            if pos.pause {
                let continues_pause = i > 0 && positions[i - 1].pause && !positions[i - 1].pause_end;
                if !continues_pause {
                    pause_starts.insert(i);
                }
            }
            if pos.pause_end {
                pause_ends.insert(i);
            }
            if pos.terminal {
                terminals.insert(i);
            }
        }

        let period = period.filter(|p| *p > 0);

        Self {
            positions,
            pause_starts,
            pause_ends,
            terminals,
            loop_start,
            period,
            segments,
            sync_ticks,
        }
    }

    /// Every generated position, including any beyond the period
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Playable length: the period when one is set, otherwise every position
    pub fn len(&self) -> usize {
        match self.period {
            Some(period) => period.min(self.positions.len()),
            None => self.positions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn period(&self) -> Option<usize> {
        self.period
    }

    pub fn loop_start(&self) -> usize {
        self.loop_start
    }

    pub fn segments(&self) -> &[SegmentSpan] {
        &self.segments
    }

    /// Exact tick of every SYNC emitted while generating
    pub fn sync_ticks(&self) -> &[SyncEvent] {
        &self.sync_ticks
    }

    pub fn last(&self) -> Option<&Position> {
        self.positions[..self.len()].last()
    }

    pub fn pause_count(&self) -> usize {
        self.positions[..self.len()].iter().filter(|p| p.pause).count()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.range(..self.len()).count()
    }

    #[inline]
    fn index(&self, tick: usize) -> Option<usize> {
        let len = self.len();
        if len == 0 {
            None
        } else {
            Some(tick % len)
        }
    }

    /// Position to draw at an absolute tick, wrapping for looped playback
    pub fn position_at(&self, tick: usize) -> Option<&Position> {
        self.index(tick).map(|i| &self.positions[i])
    }

    pub fn is_pause_start(&self, tick: usize) -> bool {
        self.index(tick).is_some_and(|i| self.pause_starts.contains(&i))
    }

    pub fn is_pause_end(&self, tick: usize) -> bool {
        self.index(tick).is_some_and(|i| self.pause_ends.contains(&i))
    }

    pub fn is_loop_start(&self, tick: usize) -> bool {
        self.index(tick).is_some_and(|i| i == self.loop_start)
    }

    pub fn is_terminal(&self, tick: usize) -> bool {
        self.index(tick).is_some_and(|i| self.terminals.contains(&i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paused(x: i32) -> Position {
        Position::new(x, 0).paused()
    }

    fn sample() -> Timeline {
        let mut end = paused(2);
        end.pause_end = true;
        let positions = vec![
            Position::new(1, 0),
            paused(2),
            end,
            Position::new(3, 0).terminal(),
        ];
        Timeline::new(positions, None, 0, Vec::new(), Vec::new())
    }

    #[test]
    fn test_queries_follow_flags() {
        let timeline = sample();
        assert_eq!(timeline.len(), 4);
        assert!(!timeline.is_pause_start(0));
        assert!(timeline.is_pause_start(1));
        assert!(!timeline.is_pause_start(2));
        assert!(timeline.is_pause_end(2));
        assert!(timeline.is_terminal(3));
        assert!(timeline.is_loop_start(0));
        assert_eq!(timeline.pause_count(), 2);
        assert_eq!(timeline.terminal_count(), 1);
    }

    #[test]
    fn test_queries_wrap_modulo_length() {
        let timeline = sample();
        assert!(timeline.is_pause_start(5));
        assert!(timeline.is_terminal(7));
        assert!(timeline.is_loop_start(8));
        assert_eq!(timeline.position_at(9).map(|p| p.x), Some(2));
    }

    #[test]
    fn test_back_to_back_pauses_start_twice() {
        let mut first_end = paused(0);
        first_end.pause_end = true;
        let mut second_end = paused(0);
        second_end.pause_end = true;
        let timeline = Timeline::new(
            vec![paused(0), first_end, paused(0), second_end],
            None,
            0,
            Vec::new(),
            Vec::new(),
        );
        assert!(timeline.is_pause_start(0));
        assert!(timeline.is_pause_start(2));
    }

    #[test]
    fn test_period_limits_playable_length() {
        let positions = (0..10).map(|x| Position::new(x, 0)).collect();
        let timeline = Timeline::new(positions, Some(4), 0, Vec::new(), Vec::new());
        assert_eq!(timeline.len(), 4);
        assert_eq!(timeline.positions().len(), 10);
        assert_eq!(timeline.position_at(5).map(|p| p.x), Some(1));
        assert_eq!(timeline.last().map(|p| p.x), Some(3));
    }

    #[test]
    fn test_empty_timeline_queries_are_false() {
        let timeline = Timeline::default();
        assert!(timeline.is_empty());
        assert!(timeline.position_at(3).is_none());
        assert!(!timeline.is_loop_start(0));
    }
}
