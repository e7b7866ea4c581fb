use crate::config::ConfigError;
use crate::host::HostError;
use crate::raster::RasterError;
use crate::state::StateError;
use thiserror::Error;

pub type ManipulationResult<T> = std::result::Result<T, ManipulationError>;

#[derive(Debug, Error)]
pub enum ManipulationError {
    #[error(transparent)]
    Host(#[from] HostError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("controller has been disposed")]
    Disposed,
}
