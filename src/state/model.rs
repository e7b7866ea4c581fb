#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Resize,
    Rotate,
    Crop,
}

/// Lifecycle of one manipulation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Selected,
    Dragging(DragKind),
}
