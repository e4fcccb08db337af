//! Post-processing pass that removes multi-pixel jumps from a raw timeline

use tracing::debug;

use super::{Position, SegmentSpan, SyncEvent, Timeline};

/// Insert one-pixel intermediate frames wherever two adjacent positions are
/// more than one pixel apart on either axis.
///
/// Paused frames are left alone, and so is the arrival at a reset, which is
/// an instantaneous jump. Index-based metadata (period, loop start, segments,
/// sync ticks) is remapped onto the new indices.
pub fn smooth(timeline: &Timeline) -> Timeline {
    let source = timeline.positions();
    let mut out: Vec<Position> = Vec::with_capacity(source.len());
    // index_map[i] is the new index of source[i]; one extra slot for `len`
    let mut index_map = Vec::with_capacity(source.len() + 1);

    for pos in source {
        if let Some(prev) = out.last() {
            if needs_bridge(prev, pos) {
                let bridge = bridge(prev, pos);
                out.extend(bridge);
            }
        }
        index_map.push(out.len());
        out.push(pos.clone());
    }
    index_map.push(out.len());

    debug!(
        raw = source.len(),
        smoothed = out.len(),
        "Smoothed timeline"
    );

    let remap = |i: usize| index_map[i.min(source.len())];

    let period = timeline.period().map(remap);
    let loop_start = remap(timeline.loop_start());
    let segments = timeline
        .segments()
        .iter()
        .map(|span| SegmentSpan {
            name: span.name.clone(),
            start: remap(span.start),
            end: remap(span.end),
        })
        .collect();
    let sync_ticks = timeline
        .sync_ticks()
        .iter()
        .map(|event| SyncEvent::new(event.name.clone(), remap(event.tick)))
        .collect();

    Timeline::new(out, period, loop_start, segments, sync_ticks)
}

pub(crate) fn needs_bridge(prev: &Position, next: &Position) -> bool {
    !prev.pause && !next.pause && !next.reset && prev.chebyshev(next) > 1
}

/// Frames strictly between `from` and `to`, each at most one pixel from its
/// neighbours
pub(crate) fn bridge(from: &Position, to: &Position) -> Vec<Position> {
    let dx = i64::from(to.x) - i64::from(from.x);
    let dy = i64::from(to.y) - i64::from(from.y);
    let steps = dx.abs().max(dy.abs());

    (1..steps)
        .map(|k| {
            let x = i64::from(from.x) + dx * k / steps;
            let y = i64::from(from.y) + dy * k / steps;
            let mut pos = Position::new(x as i32, y as i32);
            pos.segment_name = to.segment_name.clone();
            pos
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn timeline(positions: Vec<Position>) -> Timeline {
        Timeline::new(positions, None, 0, Vec::new(), Vec::new())
    }

    fn assert_continuous(timeline: &Timeline) {
        for pair in timeline.positions().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.pause || b.pause || a.terminal || b.terminal || b.reset {
                continue;
            }
            assert!(a.chebyshev(b) <= 1, "jump from {:?} to {:?}", a, b);
        }
    }

    #[test]
    fn test_bridges_multi_pixel_step() {
        let smoothed = smooth(&timeline(vec![Position::new(0, 0), Position::new(3, 0)]));
        let xs: Vec<i32> = smoothed.positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_diagonal_bridge_stays_within_one_pixel() {
        let smoothed = smooth(&timeline(vec![Position::new(0, 0), Position::new(-7, 3)]));
        assert_eq!(smoothed.positions().len(), 8);
        assert_continuous(&smoothed);
        assert_eq!(smoothed.positions().last().map(|p| p.coords()), Some((-7, 3)));
    }

    #[test]
    fn test_reset_jump_is_kept() {
        let mut reset = Position::new(0, 0);
        reset.reset = true;
        let smoothed = smooth(&timeline(vec![Position::new(40, 0), reset]));
        assert_eq!(smoothed.positions().len(), 2);
    }

    #[test]
    fn test_period_and_sync_ticks_are_remapped() {
        let raw = Timeline::new(
            vec![Position::new(0, 0), Position::new(2, 0), Position::new(4, 0)],
            Some(3),
            1,
            vec![SegmentSpan {
                name: "run".to_string(),
                start: 1,
                end: 3,
            }],
            vec![SyncEvent::new("go", 2)],
        );
        let smoothed = smooth(&raw);
        assert_eq!(smoothed.positions().len(), 5);
        assert_eq!(smoothed.period(), Some(5));
        assert_eq!(smoothed.loop_start(), 2);
        assert_eq!(smoothed.sync_ticks()[0].tick, 4);
        assert_eq!(smoothed.segments()[0].start, 2);
        assert_eq!(smoothed.segments()[0].end, 5);
    }

    #[test]
    fn test_pause_flags_survive() {
        let mut end = Position::new(5, 0).paused();
        end.pause_end = true;
        let smoothed = smooth(&timeline(vec![
            Position::new(0, 0),
            Position::new(5, 0),
            end,
        ]));
        assert!(smoothed.is_pause_start(6));
        assert!(smoothed.is_pause_end(6));
    }

    proptest! {
        #[test]
        fn prop_smoothed_timeline_is_continuous(
            coords in prop::collection::vec((-50i32..50, -50i32..50, any::<bool>()), 1..40)
        ) {
            let positions = coords
                .into_iter()
                .map(|(x, y, paused)| {
                    let pos = Position::new(x, y);
                    if paused { pos.paused() } else { pos }
                })
                .collect();
            let smoothed = smooth(&timeline(positions));
            for pair in smoothed.positions().windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.pause || b.pause {
                    continue;
                }
                prop_assert!(a.chebyshev(b) <= 1);
            }
        }
    }
}
