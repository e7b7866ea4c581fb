//! Interactive handlers that wrap a selected image and drive its manipulation.
//!
//! Exactly one handler variant is active per controller, chosen at
//! construction. Each owns at most one session; selecting a new image always
//! tears the previous session down first.

pub mod crop;
pub mod resize;
pub mod wrapper;

use crate::config::{HandlerMode, ManipulationConfig};
use crate::error::ManipulationResult;
use crate::host::{Entity, HostEditor, HostResult, NodeId, PointerEvent};
use crate::state::SessionState;

pub use crop::CropHandler;
pub use resize::ResizeRotateHandler;
pub use wrapper::{ENTITY_TYPE, SESSION_ATTRIBUTE};

/// Capabilities shared by every handler variant.
pub trait ImageManipulationHandler {
    /// Switches the session to `image`. Passing `None` ends the current
    /// session; `select_after` then places the caret on the released image.
    fn set_current_image<H: HostEditor>(
        &mut self,
        host: &mut H,
        image: Option<NodeId>,
        select_after: bool,
    ) -> ManipulationResult<()>;

    fn current_image(&self) -> Option<NodeId>;

    fn session_state(&self) -> SessionState;

    /// Unwraps `wrapper` after the host replaced it with temporary content.
    /// The active session ends only when `wrapper` is its own.
    fn release_session<H: HostEditor>(
        &mut self,
        host: &mut H,
        wrapper: NodeId,
    ) -> ManipulationResult<()>;

    /// Returns true when the press landed on one of the session's handles.
    fn pointer_down<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool>;

    fn pointer_move<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool>;

    fn pointer_up<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool>;

    fn image_wrapper<H: HostEditor>(&self, host: &H) -> Option<NodeId> {
        self.current_image()
            .and_then(|image| wrapper::image_wrapper(host, image))
    }

    fn is_handler_entity(&self, entity: &Entity) -> bool {
        wrapper::is_handler_entity(entity)
    }

    fn remove_wrappers<H: HostEditor>(
        &self,
        host: &mut H,
        wrapper: Option<NodeId>,
    ) -> HostResult<()> {
        wrapper::remove_wrappers(host, wrapper)
    }

    /// Strips session-only attributes from an exported copy of `image`.
    fn remove_temp_attributes<H: HostEditor>(&self, host: &mut H, image: NodeId) -> HostResult<()> {
        host.remove_attribute(image, SESSION_ATTRIBUTE)
    }
}

/// The handler variant selected by [`HandlerMode`].
#[derive(Debug)]
pub enum ImageHandler {
    Resize(ResizeRotateHandler),
    Crop(CropHandler),
}

impl ImageHandler {
    pub fn from_config(config: &ManipulationConfig) -> ManipulationResult<Self> {
        Ok(match config.mode {
            HandlerMode::Resize => Self::Resize(ResizeRotateHandler::new(config)?),
            HandlerMode::Crop => Self::Crop(CropHandler::new(config)?),
        })
    }

    pub const fn mode(&self) -> HandlerMode {
        match self {
            Self::Resize(_) => HandlerMode::Resize,
            Self::Crop(_) => HandlerMode::Crop,
        }
    }
}

impl ImageManipulationHandler for ImageHandler {
    fn set_current_image<H: HostEditor>(
        &mut self,
        host: &mut H,
        image: Option<NodeId>,
        select_after: bool,
    ) -> ManipulationResult<()> {
        match self {
            Self::Resize(handler) => handler.set_current_image(host, image, select_after),
            Self::Crop(handler) => handler.set_current_image(host, image, select_after),
        }
    }

    fn current_image(&self) -> Option<NodeId> {
        match self {
            Self::Resize(handler) => handler.current_image(),
            Self::Crop(handler) => handler.current_image(),
        }
    }

    fn session_state(&self) -> SessionState {
        match self {
            Self::Resize(handler) => handler.session_state(),
            Self::Crop(handler) => handler.session_state(),
        }
    }

    fn release_session<H: HostEditor>(
        &mut self,
        host: &mut H,
        wrapper: NodeId,
    ) -> ManipulationResult<()> {
        match self {
            Self::Resize(handler) => handler.release_session(host, wrapper),
            Self::Crop(handler) => handler.release_session(host, wrapper),
        }
    }

    fn pointer_down<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        match self {
            Self::Resize(handler) => handler.pointer_down(host, event),
            Self::Crop(handler) => handler.pointer_down(host, event),
        }
    }

    fn pointer_move<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        match self {
            Self::Resize(handler) => handler.pointer_move(host, event),
            Self::Crop(handler) => handler.pointer_move(host, event),
        }
    }

    fn pointer_up<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &PointerEvent,
    ) -> ManipulationResult<bool> {
        match self {
            Self::Resize(handler) => handler.pointer_up(host, event),
            Self::Crop(handler) => handler.pointer_up(host, event),
        }
    }
}
