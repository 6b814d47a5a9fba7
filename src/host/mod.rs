//! Host-side execution gate, callback handles, and block values

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// The host application's global execution gate.
///
/// Every interaction with host-owned state from the realtime thread happens
/// inside `enter()`. The critical section must stay bounded: no I/O and no
/// waiting on other locks while the guard is held.
#[derive(Default)]
pub struct ExecutionGate {
    gate: Mutex<()>,
}

impl ExecutionGate {
    /// Create a new shared gate
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the gate for one bounded critical section
    pub fn enter(&self) -> MutexGuard<'_, ()> {
        self.gate.lock()
    }
}

/// A value handed back by the host callback for one audio block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValue {
    /// No more data, stop the stream cleanly
    End,
    /// Bare status code with no sample data (capture streams)
    Status(i32),
    /// Owned interleaved sample bytes
    Bytes(Vec<u8>),
}

impl BlockValue {
    /// Single conversion point to a byte view.
    ///
    /// `End` and `Status` carry no bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            BlockValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Host callable invoked once per audio block.
///
/// Render streams receive `None`; capture and duplex streams receive an
/// owned copy of the input block.
pub type BlockFn = dyn FnMut(Option<Vec<u8>>) -> BlockValue + Send;

/// Shared-ownership handle to a registered host callback.
///
/// Cloning retains, dropping releases; the live handle count is the
/// observable reference count. The inner mutex hands the realtime thread
/// exclusive access to the callable for the duration of one invocation.
#[derive(Clone)]
pub struct CallbackRef {
    inner: Arc<Mutex<Box<BlockFn>>>,
}

impl CallbackRef {
    /// Register a host callable
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(Option<Vec<u8>>) -> BlockValue + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(callback))),
        }
    }

    /// Invoke the callable with zero or one argument.
    ///
    /// Callers on the realtime thread must already hold the execution gate.
    pub fn invoke(&self, input: Option<Vec<u8>>) -> BlockValue {
        let mut callback = self.inner.lock();
        (*callback)(input)
    }

    /// Number of live handles to the registered callable
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoke_passes_argument_through() {
        let callback = CallbackRef::new(|input: Option<Vec<u8>>| match input {
            Some(bytes) => BlockValue::Bytes(bytes),
            None => BlockValue::End,
        });

        assert_eq!(callback.invoke(None), BlockValue::End);
        assert_eq!(
            callback.invoke(Some(vec![1, 2, 3])),
            BlockValue::Bytes(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_handle_count_tracks_clones() {
        let callback = CallbackRef::new(|_| BlockValue::End);
        assert_eq!(callback.handle_count(), 1);

        let retained = callback.clone();
        assert_eq!(callback.handle_count(), 2);

        drop(retained);
        assert_eq!(callback.handle_count(), 1);
    }

    #[test]
    fn test_status_has_no_byte_view() {
        assert!(BlockValue::Status(0).as_bytes().is_none());
        assert!(BlockValue::End.as_bytes().is_none());
        assert_eq!(
            BlockValue::Bytes(vec![9]).as_bytes(),
            Some([9u8].as_slice())
        );
    }
}
