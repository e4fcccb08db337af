mod manager;
mod widget;

use std::collections::{BTreeSet, HashMap};

use crate::timeline::SyncEvent;

pub use manager::{ResolveSummary, TimelineCoordinator};
pub use widget::AnimatedWidget;

/// What the coordinator needs from one animated element
pub trait TimelineHandle {
    /// Approximate SYNC ticks, available without generating a timeline
    fn sync_events(&self) -> Vec<SyncEvent>;

    /// Events this element waits for
    fn waiting_for(&self) -> BTreeSet<String>;

    /// Generate the timeline using the given event ticks and return the
    /// exact SYNC ticks it contains.
    fn compute_timeline(&mut self, event_ticks: &HashMap<String, usize>) -> Vec<SyncEvent>;
}
