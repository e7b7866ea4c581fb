//! Contract between the manipulation engine and the rich-text editor hosting it.
//!
//! The engine never owns document nodes. It addresses them through [`NodeId`]
//! and asks the host to read layout, mutate attributes, wrap nodes into
//! entities, record undo snapshots and broadcast notifications.

pub mod event;
#[cfg(test)]
pub(crate) mod mock;

use crate::error::ManipulationResult;
use crate::geometry::{BoxStyle, Color, Size};
use thiserror::Error;

pub use event::{
    ChangeSource, EditImageEvent, EntityOperation, EntityOperationEvent, Key, KeyEvent, Modifiers,
    PluginEvent, PointerButton, PointerEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Debug, Error)]
pub enum HostError {
    #[error("node {0:?} is not part of the document")]
    NodeNotFound(NodeId),
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    #[error("host operation failed: {0}")]
    Operation(String),
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Entity record returned by the host when a node is wrapped or looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub type_tag: String,
    pub wrapper: NodeId,
    pub is_readonly: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionAnchor {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    SingleDirectionResize,
}

/// Position of an element relative to its parent box, expressed as fractions of
/// the parent's width (from the left) and height (from the top).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleAnchor {
    pub x: f64,
    pub y: f64,
}

/// Visual elements the handlers ask the host to materialize inside a wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementSpec {
    ResizeHandle {
        anchor: HandleAnchor,
        cursor: &'static str,
        color: Color,
        size: f64,
        margin: f64,
    },
    SelectionFrame {
        color: Color,
    },
    RotateGrip {
        color: Color,
        background: Color,
        stem_length: f64,
        diameter: f64,
    },
    CropContainer,
    CropOverlay,
    CropHandle {
        anchor: HandleAnchor,
        cursor: &'static str,
        rotation_deg: f64,
        size: f64,
        stroke: f64,
    },
}

/// Operations the engine consumes from the host editor.
///
/// Read accessors are infallible and return neutral values (empty strings, zero
/// sizes) for nodes the host no longer knows; mutations report failures through
/// [`HostError`] and those propagate to the caller unchanged.
pub trait HostEditor {
    fn contains(&self, node: NodeId) -> bool;
    fn select(&mut self, node: NodeId, anchor: Option<SelectionAnchor>) -> HostResult<()>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn insert_before(&mut self, node: NodeId, reference: NodeId) -> HostResult<()>;
    fn remove_node(&mut self, node: NodeId) -> HostResult<()>;
    /// Image descendants of `root` (the whole document when `None`) matching `selector`.
    fn query_images(&self, root: Option<NodeId>, selector: &str) -> Vec<NodeId>;
    fn create_element(&mut self, parent: NodeId, spec: &ElementSpec) -> HostResult<NodeId>;
    fn set_box(&mut self, node: NodeId, style: &BoxStyle) -> HostResult<()>;

    fn wrap_entity(
        &mut self,
        node: NodeId,
        type_tag: &str,
        is_block: bool,
        is_readonly: bool,
    ) -> HostResult<Entity>;
    /// Entity whose wrapper is `node`, if any.
    fn entity_of(&self, node: NodeId) -> Option<Entity>;
    fn query_entities(&self, type_tag: &str) -> Vec<NodeId>;

    fn is_image(&self, node: NodeId) -> bool;
    fn is_content_editable(&self, node: NodeId) -> bool;
    fn matches_selector(&self, node: NodeId, selector: &str) -> bool;
    /// Size as laid out by the rendering surface, which may differ from the
    /// last size requested through [`HostEditor::set_display_size`].
    fn client_size(&self, node: NodeId) -> Size;
    fn set_display_size(&mut self, node: NodeId, size: Size) -> HostResult<()>;
    fn transform(&self, node: NodeId) -> String;
    fn set_transform(&mut self, node: NodeId, transform: &str) -> HostResult<()>;
    fn source(&self, node: NodeId) -> String;
    fn set_source(&mut self, node: NodeId, src: &str) -> HostResult<()>;
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> HostResult<()>;
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> HostResult<()>;
    /// Decoded bitmap of the image's current source at natural resolution.
    fn natural_bitmap(&self, node: NodeId) -> HostResult<image::DynamicImage>;

    fn add_undo_snapshot(&mut self) -> HostResult<()>;
    /// Runs `mutation` and records it as a single undo step.
    fn add_undo_snapshot_with<F>(&mut self, mutation: F) -> ManipulationResult<()>
    where
        F: FnOnce(&mut Self) -> ManipulationResult<()>,
        Self: Sized;
    fn trigger_content_changed(
        &mut self,
        source: ChangeSource,
        data: Option<NodeId>,
    ) -> HostResult<()>;
    /// Broadcasts the edit-image notification; listeners may replace `new_src`.
    fn trigger_edit_image(&mut self, event: &mut EditImageEvent) -> HostResult<()>;

    fn is_feature_enabled(&self, feature: Feature) -> bool;
    fn is_dark_mode(&self) -> bool;
    fn is_disposed(&self) -> bool;
}
