use super::model::{DragKind, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Select,
    BeginDrag(DragKind),
    EndDrag,
    Deselect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: SessionState,
    pub event: SessionEvent,
    pub to: SessionState,
}

impl StateTransition {
    pub const fn new(from: SessionState, event: SessionEvent, to: SessionState) -> Self {
        Self { from, event, to }
    }
}
