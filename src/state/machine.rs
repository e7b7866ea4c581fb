use super::error::{StateError, StateResult};
use super::{event::StateTransition, DragKind, SessionEvent, SessionState};

const HISTORY_LIMIT: usize = 64;

#[derive(Debug)]
pub struct SessionMachine {
    state: SessionState,
    transition_history: Vec<StateTransition>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn dragging(&self) -> Option<DragKind> {
        match self.state {
            SessionState::Dragging(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn can_transition(&self, event: SessionEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        match (self.state, event) {
            (SessionState::Idle, Select) => Some(SessionState::Selected),
            (SessionState::Selected, BeginDrag(kind)) => Some(SessionState::Dragging(kind)),
            (SessionState::Dragging(_), EndDrag) => Some(SessionState::Selected),
            // A drag interrupted by teardown is abandoned, never committed.
            (SessionState::Dragging(_), Deselect) => Some(SessionState::Idle),
            (SessionState::Selected, Deselect) => Some(SessionState::Idle),
            (SessionState::Idle, Deselect) => Some(SessionState::Idle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: SessionEvent) -> StateResult<SessionState> {
        tracing::debug!(from = ?self.state, event = ?event, "request session transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid session transition requested");
            StateError::InvalidSessionTransition { from, event }
        })?;

        let record = StateTransition::new(self.state, event, next);
        self.state = next;
        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.remove(0);
        }
        self.transition_history.push(record);

        Ok(self.state)
    }
}

#[cfg(test)]
impl SessionMachine {
    pub(crate) fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionState::{:?}", self.state)
    }
}
