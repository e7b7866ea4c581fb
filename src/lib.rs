pub mod config;
pub mod controller;
pub mod crop_info;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod handler;
pub mod host;
pub mod logging;
pub mod raster;
pub mod state;

pub use config::{HandlerMode, ManipulationConfig};
pub use controller::ManipulationController;
pub use crop_info::CropInfo;
pub use error::{ManipulationError, ManipulationResult};
pub use handler::{CropHandler, ImageHandler, ImageManipulationHandler, ResizeRotateHandler};
pub use host::{HostEditor, NodeId, PluginEvent};
