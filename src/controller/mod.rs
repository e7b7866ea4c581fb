//! Event-stream entry point owning the single active handler.

use crate::config::{load_config, ManipulationConfig};
use crate::error::{ManipulationError, ManipulationResult};
use crate::handler::{ImageHandler, ImageManipulationHandler};
use crate::host::{
    ChangeSource, EntityOperation, EntityOperationEvent, HostEditor, KeyEvent, NodeId,
    PluginEvent, PointerEvent,
};

#[derive(Debug)]
pub struct ManipulationController {
    config: ManipulationConfig,
    handler: ImageHandler,
    disposed: bool,
}

impl ManipulationController {
    pub fn new(config: ManipulationConfig) -> ManipulationResult<Self> {
        config.validate()?;
        let handler = ImageHandler::from_config(&config)?;
        tracing::debug!(mode = ?handler.mode(), "manipulation controller created");
        Ok(Self {
            config,
            handler,
            disposed: false,
        })
    }

    /// Builds a controller from the user's `config.json`, or defaults.
    pub fn from_user_config() -> ManipulationResult<Self> {
        Self::new(load_config())
    }

    pub fn config(&self) -> &ManipulationConfig {
        &self.config
    }

    pub fn handler(&self) -> &ImageHandler {
        &self.handler
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn on_plugin_event<H: HostEditor>(
        &mut self,
        host: &mut H,
        event: &mut PluginEvent,
    ) -> ManipulationResult<()> {
        if self.disposed {
            return Err(ManipulationError::Disposed);
        }
        match event {
            PluginEvent::PointerDown(pointer) => self.on_pointer_down(host, pointer),
            PluginEvent::PointerMove(pointer) => {
                self.handler.pointer_move(host, pointer)?;
                Ok(())
            }
            PluginEvent::PointerUp {
                pointer,
                is_clicking,
            } => self.on_pointer_up(host, pointer, *is_clicking),
            PluginEvent::KeyDown(key) => self.on_key_down(host, key),
            PluginEvent::ContentChanged { source, entity } => {
                let own_change = matches!(source, ChangeSource::ImageResize | ChangeSource::ImageCrop)
                    || (*source == ChangeSource::InsertEntity
                        && entity
                            .as_ref()
                            .is_some_and(|entity| self.handler.is_handler_entity(entity)));
                if own_change {
                    return Ok(());
                }
                tracing::debug!(?source, "content changed; clearing image session");
                self.handler.set_current_image(host, None, false)?;
                self.handler.remove_wrappers(host, None)?;
                Ok(())
            }
            PluginEvent::EntityOperation(operation) => self.on_entity_operation(host, operation),
            PluginEvent::ExtractContentWithDom { cloned_root } => {
                for image in host.query_images(Some(*cloned_root), &self.config.image_selector) {
                    self.handler.remove_temp_attributes(host, image)?;
                }
                Ok(())
            }
            PluginEvent::Blur => self.handler.set_current_image(host, None, false),
        }
    }

    /// Starts a session on `image` regardless of pointer input.
    pub fn show_resize_handle<H: HostEditor>(
        &mut self,
        host: &mut H,
        image: NodeId,
    ) -> ManipulationResult<()> {
        if self.disposed {
            return Err(ManipulationError::Disposed);
        }
        self.handler.set_current_image(host, Some(image), false)
    }

    pub fn hide_resize_handle<H: HostEditor>(
        &mut self,
        host: &mut H,
        select_after: bool,
    ) -> ManipulationResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.handler.set_current_image(host, None, select_after)
    }

    /// Ends any session and stops handling events. Repeated calls do nothing.
    pub fn dispose<H: HostEditor>(&mut self, host: &mut H) -> ManipulationResult<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        tracing::debug!("manipulation controller disposed");
        self.handler.set_current_image(host, None, false)
    }

    fn on_pointer_down<H: HostEditor>(
        &mut self,
        host: &mut H,
        pointer: &PointerEvent,
    ) -> ManipulationResult<()> {
        if self.handler.pointer_down(host, pointer)? {
            return Ok(());
        }
        self.handler.set_current_image(host, None, false)
    }

    fn on_pointer_up<H: HostEditor>(
        &mut self,
        host: &mut H,
        pointer: &PointerEvent,
        is_clicking: bool,
    ) -> ManipulationResult<()> {
        if self.handler.pointer_up(host, pointer)? {
            return Ok(());
        }
        let Some(target) = pointer.target else {
            return Ok(());
        };
        if is_clicking
            && host.is_image(target)
            && host.is_content_editable(target)
            && host.matches_selector(target, &self.config.image_selector)
        {
            self.handler.set_current_image(host, Some(target), false)?;
        }
        Ok(())
    }

    fn on_key_down<H: HostEditor>(
        &mut self,
        host: &mut H,
        key: &mut KeyEvent,
    ) -> ManipulationResult<()> {
        if key.key.is_deletion() {
            let Some(wrapper) = self.handler.image_wrapper(host) else {
                return Ok(());
            };
            let handler = &mut self.handler;
            host.add_undo_snapshot_with(|host| {
                host.remove_node(wrapper)?;
                handler.set_current_image(host, None, false)
            })?;
            key.prevent_default();
            tracing::debug!(?wrapper, "deleted wrapped image");
            Ok(())
        } else if key.key.is_modifier() {
            Ok(())
        } else {
            self.handler.set_current_image(host, None, true)
        }
    }

    fn on_entity_operation<H: HostEditor>(
        &mut self,
        host: &mut H,
        operation: &mut EntityOperationEvent,
    ) -> ManipulationResult<()> {
        if !self.handler.is_handler_entity(&operation.entity) {
            return Ok(());
        }
        match operation.operation {
            EntityOperation::ReplaceTemporaryContent => {
                self.handler.release_session(host, operation.entity.wrapper)
            }
            EntityOperation::Click => {
                operation.prevent_default();
                Ok(())
            }
            EntityOperation::NewEntity | EntityOperation::Overwrite => Ok(()),
        }
    }
}
