//! Top-level error type and the exit-code mapping: 1 = argument error,
//! 2 = scene load failure, 3 = I/O failure.

use thiserror::Error;

use crate::ppm::PpmError;
use crate::scene_file::SceneError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    Argument(String),

    #[error("scene load failed: {0}")]
    Scene(#[from] SceneError),

    #[error("resource error: {0}")]
    Resource(#[from] PpmError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Exit code: 1 argument, 2 scene/resource, 3 output/I-O.
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::Argument(_) => 1,
            RenderError::Scene(_) => 2,
            RenderError::Resource(_) => 2,
            RenderError::Io(_) => 3,
        }
    }
}
