use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::error::MarketError;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User already exists: {0}")]
    AlreadyExists(String),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for UserError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => UserError::NotFound(id),
            FrameworkError::Conflict(msg) => UserError::AlreadyExists(msg),
            FrameworkError::Validation(msg) => UserError::ValidationError(msg),
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                UserError::ActorCommunicationError(e.to_string())
            }
        }
    }
}

impl From<UserError> for MarketError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => MarketError::NotFound(id),
            UserError::AlreadyExists(msg) => MarketError::Conflict(msg),
            UserError::ValidationError(msg) => MarketError::Validation(msg),
            UserError::ActorCommunicationError(msg) => MarketError::ActorCommunicationError(msg),
        }
    }
}
