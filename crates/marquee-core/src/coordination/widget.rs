use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use super::TimelineHandle;
use crate::executor::Executor;
use crate::program::Program;
use crate::timeline::{Position, Size, SyncEvent, Timeline};

/// One animated element: a program plus the geometry it runs in.
///
/// The generated timeline is cached until the program or a size changes.
#[derive(Debug, Clone)]
pub struct AnimatedWidget {
    executor: Executor,
    widget_size: Size,
    container_size: Size,
    start: Position,
    timeline: Option<Timeline>,
}

impl AnimatedWidget {
    pub fn new(executor: Executor, widget_size: Size, container_size: Size, start: Position) -> Self {
        Self {
            executor,
            widget_size,
            container_size,
            start,
            timeline: None,
        }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn widget_size(&self) -> Size {
        self.widget_size
    }

    pub fn container_size(&self) -> Size {
        self.container_size
    }

    pub fn start(&self) -> &Position {
        &self.start
    }

    /// Last computed timeline, if still valid
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn set_program(&mut self, program: Program) {
        self.executor.set_program(program);
        self.invalidate();
    }

    pub fn resize(&mut self, widget_size: Size, container_size: Size) {
        if widget_size != self.widget_size || container_size != self.container_size {
            self.widget_size = widget_size;
            self.container_size = container_size;
            self.invalidate();
        }
    }

    pub fn invalidate(&mut self) {
        if self.timeline.take().is_some() {
            debug!("Cached timeline dropped");
        }
    }
}

impl TimelineHandle for AnimatedWidget {
    fn sync_events(&self) -> Vec<SyncEvent> {
        self.executor
            .extract_sync_events(self.widget_size, self.container_size, self.start.clone())
    }

    fn waiting_for(&self) -> BTreeSet<String> {
        self.executor.waiting_for_events()
    }

    fn compute_timeline(&mut self, event_ticks: &HashMap<String, usize>) -> Vec<SyncEvent> {
        self.executor.set_event_positions(event_ticks.clone());
        // smoothing, when enabled, happens during generation so these ticks
        // are final indices
        let timeline = self.executor.execute(
            self.widget_size,
            self.container_size,
            self.start.clone(),
            None,
        );
        let events = timeline.sync_ticks().to_vec();
        self.timeline = Some(timeline);
        events
    }
}
