use crate::hap::value::WireFormat;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Invalid {attribute} value format: {received} (expected {expected})")]
    RejectedFormat {
        attribute: &'static str,
        expected: WireFormat,
        received: WireFormat,
    },

    #[error("{attribute} value {value} is out of bounds")]
    OutOfBounds {
        attribute: &'static str,
        value: String,
    },

    #[error("Controller failed to apply {attribute}: {reason}")]
    ActuationFailure {
        attribute: &'static str,
        reason: String,
    },

    #[error("{0} is read-only")]
    ReadOnly(&'static str),

    #[error("{0} is write-only")]
    WriteOnly(&'static str),

    #[error("{0} is busy with another write")]
    AttributeBusy(&'static str),

    #[error("Unknown characteristic instance: {0}")]
    UnknownInstance(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

impl BridgeError {
    /// True for the rejections that happen before the controller is touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::RejectedFormat { .. }
                | Self::OutOfBounds { .. }
                | Self::ReadOnly(_)
                | Self::AttributeBusy(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
