//! Stream session lifecycle

mod session;

pub use session::{SessionState, StreamSession};
