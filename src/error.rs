use thiserror::Error;

use crate::scene::NodeId;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("node {0:?} is no longer part of the scene")]
    StaleNode(NodeId),
    #[error("appending {child:?} to {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
    #[error("invalid value for attribute {name}: {reason}")]
    InvalidAttributeValue { name: String, reason: String },
    #[error("unknown tween function: {0}")]
    UnknownTween(String),
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("invalid paint style: {0}")]
    InvalidPaintStyle(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("listener failed: {0}")]
    Listener(String),
}

impl SceneError {
    pub(crate) fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        SceneError::InvalidAttributeValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
