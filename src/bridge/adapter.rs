//! Realtime callback adapter
//!
//! The driver's realtime thread lands here once per audio block. The
//! adapter takes the host's execution gate, invokes the registered
//! callback with zero or one argument depending on direction, and turns
//! the returned value into a driver status code. Nothing raised by host
//! code is allowed to unwind into the driver: callback panics and marshal
//! faults both become an abnormal-stop status.

use crate::bridge::marshal;
use crate::driver::{StreamCallback, StreamTick};
use crate::error::MarshalFault;
use crate::host::{BlockValue, CallbackRef, ExecutionGate};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, trace};

/// Stream direction, fixed at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Output only: callback is invoked with no argument and must return bytes
    Render,
    /// Input only: callback receives a copy of the input block
    Capture,
    /// Both: input copy in, output bytes back
    Duplex,
}

/// Bridges one driver block into one host callback invocation
pub struct CallbackAdapter {
    gate: Arc<ExecutionGate>,
    callback: CallbackRef,
    direction: Direction,
    expected_output_len: usize,
    expected_input_len: usize,
}

impl CallbackAdapter {
    /// Build the adapter for a stream being opened.
    ///
    /// Expected lengths are in bytes; only the lengths relevant to
    /// `direction` are ever consulted.
    pub fn new(
        gate: Arc<ExecutionGate>,
        callback: CallbackRef,
        direction: Direction,
        expected_output_len: usize,
        expected_input_len: usize,
    ) -> Self {
        Self {
            gate,
            callback,
            direction,
            expected_output_len,
            expected_input_len,
        }
    }

    unsafe fn render_block(&mut self, output: *mut u8) -> StreamTick {
        let value = self.callback.invoke(None);
        self.marshal_out(value, output)
    }

    unsafe fn capture_block(&mut self, input: *const u8) -> StreamTick {
        let copy = marshal::copy_in(input, self.expected_input_len);
        stop_signal(self.callback.invoke(Some(copy)))
    }

    unsafe fn duplex_block(&mut self, output: *mut u8, input: *const u8) -> StreamTick {
        let copy = marshal::copy_in(input, self.expected_input_len);
        let value = self.callback.invoke(Some(copy));
        self.marshal_out(value, output)
    }

    /// Interpret a render-side return value and fill the output region
    unsafe fn marshal_out(&self, value: BlockValue, output: *mut u8) -> StreamTick {
        match value {
            BlockValue::End => StreamTick::Stop,
            value => match value.as_bytes() {
                Some(bytes) => {
                    match marshal::copy_out(bytes, output, self.expected_output_len) {
                        Ok(()) => StreamTick::Continue,
                        Err(fault) => self.marshal_abort(fault),
                    }
                }
                None => self.marshal_abort(MarshalFault::NotABuffer),
            },
        }
    }

    fn marshal_abort(&self, fault: MarshalFault) -> StreamTick {
        error!("Marshal fault in audio callback: {}", fault);
        StreamTick::Abort
    }
}

impl StreamCallback for CallbackAdapter {
    unsafe fn on_block(
        &mut self,
        output: *mut u8,
        input: *const u8,
        frames: u32,
        stream_time: f64,
    ) -> StreamTick {
        trace!("Audio block: {} frames at {:.4}s", frames, stream_time);

        // Gate first; every temporary created below is dropped before the
        // guard releases at the end of this call.
        let gate = self.gate.clone();
        let _gate = gate.enter();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self.direction {
            Direction::Render => unsafe { self.render_block(output) },
            Direction::Capture => unsafe { self.capture_block(input) },
            Direction::Duplex => unsafe { self.duplex_block(output, input) },
        }));

        match outcome {
            Ok(tick) => tick,
            Err(_) => {
                error!("Host callback panicked, aborting stream");
                StreamTick::Abort
            }
        }
    }
}

/// Capture-side return values carry only a stop signal
fn stop_signal(value: BlockValue) -> StreamTick {
    match value {
        BlockValue::End => StreamTick::Stop,
        BlockValue::Status(0) => StreamTick::Continue,
        BlockValue::Status(1) => StreamTick::Stop,
        BlockValue::Status(_) => StreamTick::Abort,
        BlockValue::Bytes(_) => StreamTick::Continue,
    }
}
