//! rtbridge - Realtime audio callback bridge
//!
//! Marshals per-buffer audio callbacks from a host application onto the
//! realtime thread of a native audio driver: buffer copies across the
//! boundary, the host's execution gate around each invocation, and a
//! strictly ordered stream lifecycle.

pub mod bridge;
pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod format;
pub mod host;
pub mod stream;

pub use bridge::Direction;
pub use error::{BridgeError, Result};
pub use format::SampleFormat;
pub use host::{BlockValue, CallbackRef, ExecutionGate};
pub use stream::{SessionState, StreamSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
