//! Unified error types for rtbridge

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Malformed or missing stream configuration, caught before any driver call
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Operation invoked in a session state that forbids it
    #[error("cannot {operation}: stream is {state}")]
    State { operation: String, state: String },

    /// Failure reported by the native driver layer
    #[error("driver error: {0}")]
    Driver(String),

    /// Callback produced a value that cannot cross the realtime boundary
    #[error("marshal fault: {0}")]
    Marshal(#[from] MarshalFault),
}

/// Faults raised while moving bytes between driver regions and host buffers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarshalFault {
    /// The callback returned a value with no byte view where one was required
    #[error("callback returned a non-buffer value")]
    NotABuffer,

    /// The callback's buffer does not match the stream's block length
    #[error("buffer length {actual} does not match expected {expected}")]
    WrongLength { expected: usize, actual: usize },
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a state error for an operation attempted in the given state
    pub fn state(operation: impl Into<String>, state: impl Into<String>) -> Self {
        Self::State {
            operation: operation.into(),
            state: state.into(),
        }
    }

    /// Wrap a driver-reported failure
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver(message.into())
    }
}
