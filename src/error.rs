//! Error types for model server operations

use thiserror::Error;

use crate::common::ModelId;

/// Result type alias for model server operations
pub type Result<T> = core::result::Result<T, ServerError>;

/// Reasons an inbound message or an API call is refused.
///
/// Handlers return these to the dispatch boundary, which logs them and drops the
/// message. No status is sent for a refused message.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    /// Payload ended before a mandatory field
    #[error("message truncated: needed {needed} more bytes, {remaining} left")]
    Truncated {
        /// Bytes the next field needs
        needed: usize,
        /// Bytes left in the payload
        remaining: usize,
    },

    /// Trailing Transition Time/Delay pair is neither absent nor two bytes
    #[error("invalid optional field length {0}")]
    OptionalLength(usize),

    /// Transition Time carries the unknown step count 0x3F
    #[error("transition time 0x{0:02x} has unknown number of steps")]
    UnknownTransitionSteps(u8),

    /// A field holds a value the Mesh Model encoding prohibits
    #[error("invalid {field} 0x{value:x}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Received value
        value: u32,
    },

    /// Opcode not handled by the addressed model
    #[error("model {model:?} does not handle opcode 0x{opcode:04x}")]
    UnknownOpcode {
        /// Addressed model
        model: ModelId,
        /// Received opcode
        opcode: u32,
    },

    /// No instance of the model on that element
    #[error("no {model:?} on element 0x{element:04x}")]
    NoSuchModel {
        /// Requested model
        model: ModelId,
        /// Element address
        element: u16,
    },

    /// Binding value does not belong to the target model
    #[error("model {model:?} does not hold {state} state")]
    ModelMismatch {
        /// Target model
        model: ModelId,
        /// Binding state name
        state: &'static str,
    },

    /// Model construction parameters out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// The category lock is already held by this call chain
    #[error("{0} server lock is already held")]
    Reentrant(&'static str),
}

impl ServerError {
    /// Create an invalid field error
    pub fn invalid(field: &'static str, value: impl Into<u32>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// Failures reported by the transport when sending or publishing.
///
/// These are only logged; the server never retries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The model has no publication configured
    #[error("no publication configured")]
    NoPublication,

    /// The transport refused the message
    #[error("transport error {0}")]
    Transport(i32),
}
