//! Pointer-drag sessions bound to handle elements.
//!
//! A tracker is attached to one handle and owns the per-drag state machine
//! `NotDragging -> Dragging -> {Committed | Abandoned}`. Input events are fed
//! in explicitly through [`DragTracker::begin`], [`DragTracker::drag_to`] and
//! [`DragTracker::end`]; deltas are always measured from the press origin.

use crate::geometry::Point;
use crate::host::{NodeId, PointerButton, PointerEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    NotDragging,
    Dragging { origin: Point },
    Committed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMove<C> {
    pub context: C,
    pub delta_x: f64,
    pub delta_y: f64,
    pub event: PointerEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRelease<C> {
    pub context: C,
    /// Whether the handle asked to be told about drag completion.
    pub reports_end: bool,
}

#[derive(Debug, Clone)]
pub struct DragTracker<C> {
    handle: NodeId,
    context: C,
    reports_end: bool,
    attached: bool,
    state: DragState,
}

impl<C: Copy> DragTracker<C> {
    pub fn attach(handle: NodeId, context: C, reports_end: bool) -> Self {
        Self {
            handle,
            context,
            reports_end,
            attached: true,
            state: DragState::NotDragging,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Starts a drag when a primary press lands on this tracker's handle.
    pub fn begin(&mut self, event: &PointerEvent) -> Option<C> {
        if !self.attached
            || self.is_dragging()
            || event.button != PointerButton::Primary
            || event.target != Some(self.handle)
        {
            return None;
        }
        self.state = DragState::Dragging {
            origin: event.position,
        };
        Some(self.context)
    }

    pub fn drag_to(&mut self, event: &PointerEvent) -> Option<DragMove<C>> {
        let DragState::Dragging { origin } = self.state else {
            return None;
        };
        let (delta_x, delta_y) = event.position.delta_from(origin);
        Some(DragMove {
            context: self.context,
            delta_x,
            delta_y,
            event: *event,
        })
    }

    pub fn end(&mut self) -> Option<DragRelease<C>> {
        if !self.is_dragging() {
            return None;
        }
        self.state = DragState::Committed;
        Some(DragRelease {
            context: self.context,
            reports_end: self.reports_end,
        })
    }

    /// Detaches the tracker. A drag in progress is abandoned without an end
    /// notification. Calling this again is a no-op.
    pub fn dispose(&mut self) {
        if self.is_dragging() {
            tracing::debug!(handle = ?self.handle, "drag abandoned by dispose");
            self.state = DragState::Abandoned;
        }
        self.attached = false;
    }
}

/// Trackers for every handle of one session. Handles are disjoint elements,
/// so at most one tracker is mid-drag at a time.
#[derive(Debug, Clone)]
pub struct TrackerSet<C> {
    trackers: Vec<DragTracker<C>>,
}

impl<C> Default for TrackerSet<C> {
    fn default() -> Self {
        Self {
            trackers: Vec::new(),
        }
    }
}

impl<C: Copy> TrackerSet<C> {
    pub fn push(&mut self, tracker: DragTracker<C>) {
        self.trackers.push(tracker);
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn is_dragging(&self) -> bool {
        self.trackers.iter().any(DragTracker::is_dragging)
    }

    pub fn begin(&mut self, event: &PointerEvent) -> Option<C> {
        if self.is_dragging() {
            return None;
        }
        self.trackers
            .iter_mut()
            .find_map(|tracker| tracker.begin(event))
    }

    pub fn drag_to(&mut self, event: &PointerEvent) -> Option<DragMove<C>> {
        self.trackers
            .iter_mut()
            .find_map(|tracker| tracker.drag_to(event))
    }

    pub fn end(&mut self) -> Option<DragRelease<C>> {
        self.trackers.iter_mut().find_map(DragTracker::end)
    }

    /// Disposes and drops every tracker.
    pub fn dispose_all(&mut self) {
        for tracker in &mut self.trackers {
            tracker.dispose();
        }
        self.trackers.clear();
    }
}
