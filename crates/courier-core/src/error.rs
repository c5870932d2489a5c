use thiserror::Error;

use crate::app::BuildError;
use crate::domain::ValidationError;
use crate::ports::StoreError;

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("invalid start request: {0}")]
    Validation(#[from] ValidationError),

    #[error("task '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Build(#[from] BuildError),
}
