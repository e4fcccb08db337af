use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use tracing::{debug, info, warn};

use super::TimelineHandle;
use crate::config::CoordinatorConfig;
use crate::timeline::SyncEvent;
use crate::{Error, Result};

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Widgets whose timeline was computed in this pass
    pub computed: Vec<String>,
    /// Widgets resolved with at least one dependency unmet
    pub forced: Vec<String>,
    pub iterations: usize,
}

#[derive(Clone, Copy)]
enum Mark {
    Active,
    Done,
}

/// Owns every animated element of a session and resolves their timelines
/// in SYNC/WAIT_FOR dependency order.
///
/// A widget depends on another when it waits for an event the other one
/// emits. Waits on events nobody emits, and waits on the widget's own
/// events, never block resolution.
#[derive(Debug)]
pub struct TimelineCoordinator<H> {
    widgets: BTreeMap<String, H>,
    /// event name -> (owner id, tick)
    sync_events: HashMap<String, (String, usize)>,
    /// widget id -> events it waits for
    waits: BTreeMap<String, BTreeSet<String>>,
    resolved: BTreeSet<String>,
    iteration_factor: usize,
}

impl<H> Default for TimelineCoordinator<H> {
    fn default() -> Self {
        Self::with_config(&CoordinatorConfig::default())
    }
}

impl<H> TimelineCoordinator<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &CoordinatorConfig) -> Self {
        Self {
            widgets: BTreeMap::new(),
            sync_events: HashMap::new(),
            waits: BTreeMap::new(),
            resolved: BTreeSet::new(),
            iteration_factor: config.iteration_factor.max(1),
        }
    }

    pub fn register_widget(&mut self, id: impl Into<String>, handle: H) {
        let id = id.into();
        self.resolved.remove(&id);
        self.widgets.insert(id, handle);
    }

    /// Record that `owner` emits `name` at `tick`
    pub fn register_sync_event(&mut self, owner: &str, name: &str, tick: usize) {
        if let Some((previous, _)) = self.sync_events.get(name) {
            if previous != owner {
                warn!(
                    event = name,
                    previous = %previous,
                    owner,
                    "Event emitted by more than one widget, keeping the latest"
                );
            }
        }
        self.sync_events
            .insert(name.to_string(), (owner.to_string(), tick));
    }

    /// Record that `dependent` waits for `event`. The event may be
    /// registered later; the link is made as soon as its owner is known.
    pub fn register_dependency(&mut self, dependent: &str, event: &str) {
        self.waits
            .entry(dependent.to_string())
            .or_default()
            .insert(event.to_string());
    }

    /// Drop every registration
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.sync_events.clear();
        self.waits.clear();
        self.resolved.clear();
    }

    pub fn is_resolved(&self, id: &str) -> bool {
        self.resolved.contains(id)
    }

    pub fn resolved(&self) -> &BTreeSet<String> {
        &self.resolved
    }

    pub fn widget(&self, id: &str) -> Option<&H> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut H> {
        self.widgets.get_mut(id)
    }

    pub fn widgets(&self) -> impl Iterator<Item = (&str, &H)> {
        self.widgets.iter().map(|(id, handle)| (id.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn event_tick(&self, name: &str) -> Option<usize> {
        self.sync_events.get(name).map(|(_, tick)| *tick)
    }

    pub fn event_owner(&self, name: &str) -> Option<&str> {
        self.sync_events.get(name).map(|(owner, _)| owner.as_str())
    }

    /// Widgets `id` has to wait for
    pub fn dependencies(&self, id: &str) -> BTreeSet<&str> {
        let Some(events) = self.waits.get(id) else {
            return BTreeSet::new();
        };
        events
            .iter()
            .filter_map(|event| self.sync_events.get(event))
            .map(|(owner, _)| owner.as_str())
            .filter(|owner| *owner != id && self.widgets.contains_key(*owner))
            .collect()
    }

    /// Waited-for events with no known owner yet, and who waits for them
    pub fn pending_dependencies(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut pending: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (dependent, events) in &self.waits {
            for event in events {
                if !self.sync_events.contains_key(event) {
                    pending
                        .entry(event.as_str())
                        .or_default()
                        .insert(dependent.as_str());
                }
            }
        }
        pending
    }

    fn dependents(&self, id: &str) -> Vec<&str> {
        self.waits
            .keys()
            .map(String::as_str)
            .filter(|dependent| self.dependencies(dependent).contains(id))
            .collect()
    }

    /// Unresolve `id` and everything that transitively waits on it
    pub fn mark_widget_for_recalculation(&mut self, id: &str) {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([id.to_string()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for dependent in self.dependents(&current) {
                queue.push_back(dependent.to_string());
            }
        }

        debug!(widget = id, affected = seen.len(), "Marked for recalculation");
        for affected in &seen {
            self.resolved.remove(affected);
        }
    }

    /// Depth-first search for a dependency cycle among unresolved widgets
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for id in self.widgets.keys() {
            if self.resolved.contains(id) || marks.contains_key(id.as_str()) {
                continue;
            }
            let mut path = Vec::new();
            if let Some(cycle) = self.visit(id, &mut marks, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn visit<'s>(
        &'s self,
        id: &'s str,
        marks: &mut HashMap<&'s str, Mark>,
        path: &mut Vec<&'s str>,
    ) -> Option<Vec<String>> {
        marks.insert(id, Mark::Active);
        path.push(id);

        for owner in self.dependencies(id) {
            if self.resolved.contains(owner) {
                continue;
            }
            match marks.get(owner) {
                Some(Mark::Active) => {
                    let start = path.iter().position(|p| *p == owner)?;
                    return Some(path[start..].iter().map(|p| p.to_string()).collect());
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(cycle) = self.visit(owner, marks, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        marks.insert(id, Mark::Done);
        None
    }

    fn unresolved(&self) -> Vec<String> {
        self.widgets
            .keys()
            .filter(|id| !self.resolved.contains(*id))
            .cloned()
            .collect()
    }

    fn is_ready(&self, id: &str) -> bool {
        self.dependencies(id)
            .iter()
            .all(|owner| self.resolved.contains(*owner))
    }
}

impl<H: TimelineHandle> TimelineCoordinator<H> {
    /// Register a widget together with its extracted events and waits
    pub fn register(&mut self, id: impl Into<String>, handle: H) {
        let id = id.into();
        let mut seen = BTreeSet::new();
        for event in handle.sync_events() {
            // the earliest occurrence is the one others wait for
            if seen.insert(event.name.clone()) {
                self.register_sync_event(&id, &event.name, event.tick);
            }
        }
        for event in handle.waiting_for() {
            self.register_dependency(&id, &event);
        }
        self.register_widget(id, handle);
    }

    /// Replace a widget's content and invalidate what depends on it
    pub fn update_widget(&mut self, id: &str, handle: H) -> Result<()> {
        if !self.widgets.contains_key(id) {
            return Err(Error::UnknownWidget(id.to_string()));
        }

        // dependents of events the widget used to emit
        self.mark_widget_for_recalculation(id);

        self.sync_events.retain(|_, (owner, _)| owner.as_str() != id);
        self.waits.remove(id);
        self.register(id, handle);

        // dependents of events it emits now
        self.mark_widget_for_recalculation(id);
        Ok(())
    }

    /// Compute every unresolved timeline in dependency order.
    ///
    /// Always terminates: when nothing is ready a widget from a dependency
    /// cycle (or, failing that, the first unresolved one) is computed with
    /// its unmet waits left approximate, and anything still unresolved once
    /// the iteration budget runs out is forced the same way.
    pub fn resolve_timelines(&mut self) -> ResolveSummary {
        let mut summary = ResolveSummary::default();
        let budget = self.iteration_factor * self.widgets.len().max(1);

        while summary.iterations < budget {
            let unresolved = self.unresolved();
            if unresolved.is_empty() {
                break;
            }
            summary.iterations += 1;

            let ready: Vec<String> = unresolved
                .iter()
                .filter(|id| self.is_ready(id))
                .cloned()
                .collect();

            if ready.is_empty() {
                let forced = match self.find_cycle() {
                    Some(cycle) => {
                        let pick = cycle.iter().min().cloned();
                        warn!(?cycle, "Dependency cycle detected, breaking it");
                        pick
                    }
                    None => {
                        warn!("Resolution stalled without a cycle");
                        unresolved.first().cloned()
                    }
                };
                let Some(forced) = forced else {
                    break;
                };
                self.compute(&forced);
                summary.forced.push(forced.clone());
                summary.computed.push(forced);
                continue;
            }

            for id in ready {
                self.compute(&id);
                summary.computed.push(id);
            }
        }

        for id in self.unresolved() {
            warn!(widget = %id, "Iteration budget exhausted, forcing resolution");
            self.compute(&id);
            summary.forced.push(id.clone());
            summary.computed.push(id);
        }

        info!(
            computed = summary.computed.len(),
            forced = summary.forced.len(),
            iterations = summary.iterations,
            "Timelines resolved"
        );
        summary
    }

    fn compute(&mut self, id: &str) {
        let event_ticks: HashMap<String, usize> = self
            .sync_events
            .iter()
            .map(|(name, (_, tick))| (name.clone(), *tick))
            .collect();

        let Some(handle) = self.widgets.get_mut(id) else {
            return;
        };
        let exact = handle.compute_timeline(&event_ticks);
        self.record_exact_ticks(id, &exact);
        self.resolved.insert(id.to_string());
        debug!(widget = id, events = exact.len(), "Timeline computed");
    }

    fn record_exact_ticks(&mut self, id: &str, events: &[SyncEvent]) {
        let mut seen = BTreeSet::new();
        for event in events {
            if !seen.insert(event.name.as_str()) {
                continue;
            }
            match self.sync_events.get_mut(&event.name) {
                Some((owner, tick)) if owner.as_str() == id => *tick = event.tick,
                Some(_) => {}
                None => {
                    self.sync_events
                        .insert(event.name.clone(), (id.to_string(), event.tick));
                }
            }
        }
    }
}
