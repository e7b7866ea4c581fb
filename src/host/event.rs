use crate::geometry::Point;

use super::{Entity, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const fn shift() -> Self {
        Self {
            shift: true,
            ctrl: false,
            alt: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub target: Option<NodeId>,
    pub button: PointerButton,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub const fn primary(target: Option<NodeId>, position: Point) -> Self {
        Self {
            target,
            button: PointerButton::Primary,
            position,
            modifiers: Modifiers {
                shift: false,
                ctrl: false,
                alt: false,
            },
        }
    }

    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Shift,
    Control,
    Alt,
    Character(char),
    Other(u32),
}

impl Key {
    pub const fn is_modifier(self) -> bool {
        matches!(self, Self::Shift | Self::Control | Self::Alt)
    }

    pub const fn is_deletion(self) -> bool {
        matches!(self, Self::Delete | Self::Backspace)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub default_prevented: bool,
}

impl KeyEvent {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Cause tag attached to content-changed notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSource {
    ImageResize,
    ImageCrop,
    InsertEntity,
    Keyboard,
    Paste,
    SetContent,
    Undo,
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityOperation {
    NewEntity,
    Click,
    Overwrite,
    ReplaceTemporaryContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityOperationEvent {
    pub entity: Entity,
    pub operation: EntityOperation,
    pub default_prevented: bool,
}

impl EntityOperationEvent {
    pub const fn new(entity: Entity, operation: EntityOperation) -> Self {
        Self {
            entity,
            operation,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Fired at crop commit before the new source is written to the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditImageEvent {
    pub image: NodeId,
    pub new_src: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PluginEvent {
    PointerDown(PointerEvent),
    PointerMove(PointerEvent),
    PointerUp {
        pointer: PointerEvent,
        is_clicking: bool,
    },
    KeyDown(KeyEvent),
    ContentChanged {
        source: ChangeSource,
        entity: Option<Entity>,
    },
    EntityOperation(EntityOperationEvent),
    ExtractContentWithDom {
        cloned_root: NodeId,
    },
    Blur,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_keys_are_not_deletions() {
        for key in [Key::Shift, Key::Control, Key::Alt] {
            assert!(key.is_modifier());
            assert!(!key.is_deletion());
        }
        assert!(Key::Delete.is_deletion());
        assert!(Key::Backspace.is_deletion());
        assert!(!Key::Character('a').is_modifier());
    }

    #[test]
    fn prevent_default_marks_key_event() {
        let mut event = KeyEvent::new(Key::Delete);
        assert!(!event.default_prevented);
        event.prevent_default();
        assert!(event.default_prevented);
    }
}
