use thiserror::Error;

use crate::ObjectId;

pub type AttachResult<T> = Result<T, AttachError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    #[error("{0} is missing a required capability: {1}")]
    MissingComponent(ObjectId, &'static str),
    #[error("{0} was disabled at registration")]
    Disabled(ObjectId),
    #[error("{0} is not a registered entity")]
    UnknownEntity(ObjectId),
    #[error("{0} is not a registered host")]
    UnknownHost(ObjectId),
    #[error("{entity} is already attached to {host}, refusing to attach to {requested}")]
    AlreadyAttached {
        entity: ObjectId,
        host: ObjectId,
        requested: ObjectId,
    },
    #[error("{0} is being held")]
    Grabbed(ObjectId),
    #[error("Attaching {entity} to {host} would form a cycle")]
    AttachCycle { entity: ObjectId, host: ObjectId },
    #[error("Reparenting {entity} under {host} was vetoed by the scene authority")]
    Vetoed { entity: ObjectId, host: ObjectId },
}

impl AttachError {
    /// Recoverable errors leave the controller untouched, the rest are misconfiguration
    pub fn is_recoverable(&self) -> bool {
        match self {
            AttachError::AlreadyAttached { .. }
            | AttachError::Grabbed(_)
            | AttachError::AttachCycle { .. }
            | AttachError::Vetoed { .. } => true,
            AttachError::MissingComponent(..)
            | AttachError::Disabled(_)
            | AttachError::UnknownEntity(_)
            | AttachError::UnknownHost(_) => false,
        }
    }
}
