//! Position-emitting statement handlers
//!
//! Each handler appends zero or more frames to the context timeline. Bad
//! arguments are semantic faults: they are logged and the statement emits
//! nothing.

use tracing::{debug, warn};

use super::context::{ExecutionContext, Progress, StatementKey};
use crate::program::{Direction, Expr, Motion, PointExpr};
use crate::timeline::{Position, SyncEvent};

/// Motion arguments after expression evaluation
#[derive(Debug, Clone, Copy)]
struct Resolved {
    direction: Direction,
    distance: i64,
    step: i64,
    interval: usize,
    gap: i64,
    pause_at_ends: usize,
}

fn resolve(ctx: &ExecutionContext<'_>, kind: &str, motion: &Motion) -> Option<Resolved> {
    let vars = &ctx.variables;
    let step = vars.eval_i64(&motion.step);
    let interval = vars.eval_i64(&motion.interval);

    if step <= 0 || interval <= 0 {
        warn!(command = kind, step, interval, "Step and interval must be positive, skipping");
        return None;
    }

    Some(Resolved {
        direction: motion.direction,
        distance: vars.eval_i64(&motion.distance),
        step,
        interval: interval as usize,
        gap: vars.eval_i64(&motion.gap),
        pause_at_ends: vars.eval_i64(&motion.pause_at_ends).max(0) as usize,
    })
}

/// Frame `amount` pixels from `origin` along `direction`
fn along(origin: &Position, direction: Direction, amount: i64) -> Position {
    let (dx, dy) = direction.delta();
    Position::new(
        clamp_i32(i64::from(origin.x) + i64::from(dx) * amount),
        clamp_i32(i64::from(origin.y) + i64::from(dy) * amount),
    )
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs()
}

/// Walk from `moved` to `distance` in `step` increments, snapping the final
/// increment onto `distance`. Returns the distance actually covered.
fn stepped_run(
    ctx: &mut ExecutionContext<'_>,
    origin: &Position,
    direction: Direction,
    mut moved: i64,
    distance: i64,
    step: i64,
    interval: usize,
) -> i64 {
    while moved < distance {
        let next = (moved + step).min(distance);
        if !ctx.emit_held(along(origin, direction, next), interval) {
            break;
        }
        moved = next;
    }
    moved
}

/// MOVE(direction, distance): `distance / step` positions, remainder dropped
pub(crate) fn move_by(ctx: &mut ExecutionContext<'_>, motion: &Motion) {
    let Some(args) = resolve(ctx, "move", motion) else {
        return;
    };
    if args.distance <= 0 {
        debug!(distance = args.distance, "Move with non-positive distance emits nothing");
        return;
    }

    let count = args.distance / args.step;
    let remainder = args.distance % args.step;
    if remainder != 0 {
        debug!(
            distance = args.distance,
            step = args.step,
            dropped = remainder,
            "Move distance is not a multiple of step"
        );
    }

    let origin = ctx.current();
    for i in 1..=count {
        if !ctx.emit_held(along(&origin, args.direction, i * args.step), args.interval) {
            break;
        }
    }
}

/// MOVE(from, to): linear interpolation on both axes at once
pub(crate) fn move_to(
    ctx: &mut ExecutionContext<'_>,
    from: &PointExpr,
    to: &PointExpr,
    step: &Expr,
    interval: &Expr,
) {
    let vars = &ctx.variables;
    let start = Position::new(vars.eval_i32(&from.x), vars.eval_i32(&from.y));
    let end = Position::new(vars.eval_i32(&to.x), vars.eval_i32(&to.y));
    let step = vars.eval_i64(step);
    let interval = vars.eval_i64(interval);

    if step <= 0 || interval <= 0 {
        warn!(command = "move_to", step, interval, "Step and interval must be positive, skipping");
        return;
    }
    let interval = interval as usize;

    if ctx.current() != start && !ctx.emit(start.clone()) {
        return;
    }

    let dx = i64::from(end.x) - i64::from(start.x);
    let dy = i64::from(end.y) - i64::from(start.y);
    let count = dx.abs().max(dy.abs()) / step;

    if count == 0 {
        if start != end {
            ctx.emit_held(end, interval);
        }
        return;
    }

    for i in 1..=count {
        let pos = Position::new(
            clamp_i32(i64::from(start.x) + dx * i / count),
            clamp_i32(i64::from(start.y) + dy * i / count),
        );
        if !ctx.emit_held(pos, interval) {
            break;
        }
    }
}

pub(crate) fn pause(ctx: &mut ExecutionContext<'_>, duration: &Expr) {
    let ticks = ctx.variables.eval_i64(duration);
    if ticks <= 0 {
        debug!(ticks, "Pause with non-positive duration emits nothing");
        return;
    }
    let at = ctx.current();
    ctx.emit_pause(&at, ticks as usize);
}

/// Instantaneous jump back to the origin
pub(crate) fn reset_position(ctx: &mut ExecutionContext<'_>) {
    let mut pos = Position::new(0, 0);
    pos.reset = true;
    ctx.emit(pos);
}

pub(crate) fn sync(ctx: &mut ExecutionContext<'_>, event: &str) {
    ctx.events.insert(event.to_string(), true);
    ctx.defined_sync_events.insert(event.to_string());
    ctx.sync_ticks.push(SyncEvent::new(event, ctx.tick_position));
    debug!(event, tick = ctx.tick_position, "Sync event fired");

    let here = ctx.current();
    ctx.emit(here);
}

/// WAIT_FOR: paused frames sized by what is known about the event, then one
/// frame resuming normal flow
pub(crate) fn wait_for(ctx: &mut ExecutionContext<'_>, event: &str, max_ticks: &Expr) {
    let max_ticks = ctx.variables.eval_i64(max_ticks).max(0) as usize;
    ctx.waiting_for_events.insert(event.to_string());

    let current_tick = ctx.tick_position;
    let wait = if let Some(&known) = ctx.event_positions.get(event) {
        max_ticks.min(known.saturating_sub(current_tick).max(1))
    } else if ctx.events.get(event).copied().unwrap_or(false) {
        1
    } else {
        max_ticks
    };

    debug!(event, wait, max_ticks, tick = current_tick, "Waiting for event");

    let here = ctx.current();
    ctx.emit_pause(&here, wait);
    ctx.emit(here);
}

/// Shared cumulative movement for scroll_clip and slide.
///
/// A single invocation covers the whole remaining distance and flags the
/// arrival frame terminal. Once complete, one more invocation may add a
/// terminal frame at the target if the widget has been moved off it; after
/// that the command is inert.
fn advance_cumulative(ctx: &mut ExecutionContext<'_>, progress: &mut Progress, args: Resolved) {
    let distance = args.distance;
    let target = along(&progress.origin, progress.direction, distance);

    if i64::from(progress.total_moved) < distance {
        let moved = stepped_run(
            ctx,
            &progress.origin,
            progress.direction,
            i64::from(progress.total_moved),
            distance,
            args.step,
            args.interval,
        );
        progress.total_moved = clamp_i32(moved);
        if moved >= distance {
            ctx.mark_last_terminal();
        }
        return;
    }

    if progress.stabilized {
        return;
    }
    progress.stabilized = true;

    if ctx.last() != Some(&target) {
        ctx.emit(target.terminal());
    }
}

pub(crate) fn scroll_clip(ctx: &mut ExecutionContext<'_>, key: StatementKey, motion: &Motion) {
    let Some(args) = resolve(ctx, "scroll_clip", motion) else {
        return;
    };
    if args.distance <= 0 {
        warn!(distance = args.distance, "scroll_clip needs a positive distance, skipping");
        return;
    }

    let mut progress = ctx
        .clip_progress
        .remove(&key)
        .unwrap_or_else(|| Progress::new(ctx.current(), args.direction));
    advance_cumulative(ctx, &mut progress, args);
    ctx.clip_progress.insert(key, progress);
}

/// SLIDE keeps one progress record for the whole program; changing the
/// slide direction starts over from the current position.
pub(crate) fn slide(ctx: &mut ExecutionContext<'_>, motion: &Motion) {
    let Some(args) = resolve(ctx, "slide", motion) else {
        return;
    };
    if args.distance <= 0 {
        warn!(distance = args.distance, "slide needs a positive distance, skipping");
        return;
    }

    let mut progress = match ctx.slide_progress.take() {
        Some(progress) if progress.direction == args.direction => progress,
        previous => {
            if let Some(previous) = previous {
                debug!(
                    from = previous.direction.as_str(),
                    to = args.direction.as_str(),
                    "Slide direction changed, resetting progress"
                );
            }
            Progress::new(ctx.current(), args.direction)
        }
    };
    advance_cumulative(ctx, &mut progress, args);
    ctx.slide_progress = Some(progress);
}

/// SCROLL_LOOP: exactly one repeat period of a wrapping scroll.
///
/// `scroll_unit = size along the axis + gap` and the motion repeats after
/// `scroll_unit / gcd(step, scroll_unit)` steps.
pub(crate) fn scroll_loop(ctx: &mut ExecutionContext<'_>, key: StatementKey, motion: &Motion) {
    if ctx.completed_scroll_loops.contains(&key) {
        return;
    }
    let Some(args) = resolve(ctx, "scroll_loop", motion) else {
        return;
    };

    let size = if args.direction.is_horizontal() {
        ctx.variables.widget_width
    } else {
        ctx.variables.widget_height
    };
    let scroll_unit = i64::from(size) + args.gap;
    if scroll_unit <= 0 {
        warn!(size, gap = args.gap, "scroll_loop unit is not positive, skipping");
        return;
    }

    let cycle_steps = scroll_unit / gcd(args.step, scroll_unit);
    debug!(scroll_unit, step = args.step, cycle_steps, "Generating scroll loop period");

    let origin = ctx.current();
    for i in 1..=cycle_steps {
        if !ctx.emit_held(along(&origin, args.direction, i * args.step), args.interval) {
            break;
        }
    }

    ctx.completed_scroll_loops.insert(key);
    let generated = ctx.timeline.len();
    ctx.set_implicit_period(generated);
}

/// SCROLL_BOUNCE: out, pause, back, pause
pub(crate) fn scroll_bounce(ctx: &mut ExecutionContext<'_>, motion: &Motion) {
    let Some(args) = resolve(ctx, "scroll_bounce", motion) else {
        return;
    };
    if args.distance <= 0 {
        warn!(distance = args.distance, "scroll_bounce needs a positive distance, skipping");
        return;
    }

    let origin = ctx.current();
    let boundary = along(&origin, args.direction, args.distance);

    // outward
    stepped_run(ctx, &origin, args.direction, 0, args.distance, args.step, args.interval);
    ctx.emit_pause(&boundary, args.pause_at_ends);

    // return, starting from the boundary itself
    ctx.emit(boundary.clone());
    let mut moved = 0;
    while moved < args.distance {
        moved = (moved + args.step).min(args.distance);
        let arriving = moved == args.distance;
        if arriving && origin.coords() == (0, 0) {
            // keeps arrival at the origin from looking like a reset jump
            let transitional = along(&origin, args.direction, 1);
            if ctx.last() != Some(&transitional) {
                ctx.emit(transitional);
            }
        }
        let pos = if arriving {
            origin.clone()
        } else {
            along(&boundary, args.direction.opposite(), moved)
        };
        if !ctx.emit_held(pos, args.interval) {
            break;
        }
    }
    ctx.emit_pause(&origin, args.pause_at_ends);

    let generated = ctx.timeline.len();
    ctx.set_implicit_period(generated);
}
