//! Stream session state machine over one driver stream slot
//!
//! A session walks Closed -> Open -> Running -> Open -> Closed, one cycle
//! at a time. Every transition is checked on the control thread before the
//! driver is touched, so the driver never sees an operation on a closed or
//! unopened slot. Closing a running stream stops it first; teardown via
//! Drop never raises.

use crate::bridge::{CallbackAdapter, Direction};
use crate::device::DeviceCatalog;
use crate::driver::{AudioDriver, OpenRequest, StreamParams};
use crate::error::{BridgeError, Result};
use crate::format::SampleFormat;
use crate::host::{BlockValue, CallbackRef, ExecutionGate};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Lifecycle state of a stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No stream slot held; the initial and terminal state
    Closed,
    /// Stream open but the realtime thread is not ticking
    Open,
    /// Realtime thread is invoking the callback once per block
    Running,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Open => "open",
            SessionState::Running => "running",
        };
        write!(f, "{}", name)
    }
}

/// Per-open derived state, discarded when the session returns to Closed
struct OpenState {
    direction: Direction,
    expected_output_len: usize,
    expected_input_len: usize,
}

/// One audio stream session over a driver instance.
///
/// Owns the driver's single stream slot and the registered callback
/// handle; at most one of each exists at any time.
pub struct StreamSession<D: AudioDriver> {
    driver: D,
    gate: Arc<ExecutionGate>,
    callback: Option<CallbackRef>,
    open: Option<OpenState>,
    state: SessionState,
}

impl<D: AudioDriver> StreamSession<D> {
    /// Create a session sharing the host's execution gate
    pub fn new(driver: D, gate: Arc<ExecutionGate>) -> Self {
        Self {
            driver,
            gate,
            callback: None,
            open: None,
            state: SessionState::Closed,
        }
    }

    /// Open a stream and register the per-block callback.
    ///
    /// Direction is derived from which parameter sets are present and is
    /// fixed until close. Expected block lengths in bytes are computed
    /// here, once, as channels x sample width x frames per buffer.
    pub fn open<F>(
        &mut self,
        output: Option<StreamParams>,
        input: Option<StreamParams>,
        format: SampleFormat,
        sample_rate: u32,
        frames_per_buffer: u32,
        callback: F,
    ) -> Result<()>
    where
        F: FnMut(Option<Vec<u8>>) -> BlockValue + Send + 'static,
    {
        if self.state != SessionState::Closed {
            return Err(BridgeError::state("open", self.state.to_string()));
        }

        let direction = match (&output, &input) {
            (Some(_), Some(_)) => Direction::Duplex,
            (Some(_), None) => Direction::Render,
            (None, Some(_)) => Direction::Capture,
            (None, None) => {
                return Err(BridgeError::config(
                    "at least one of output or input parameters is required",
                ))
            }
        };

        let width = format.width();
        let frames = frames_per_buffer as usize;
        let expected_output_len = output
            .as_ref()
            .map_or(0, |p| p.channels as usize * width * frames);
        let expected_input_len = input
            .as_ref()
            .map_or(0, |p| p.channels as usize * width * frames);

        let callback = CallbackRef::new(callback);
        let adapter = CallbackAdapter::new(
            self.gate.clone(),
            callback.clone(),
            direction,
            expected_output_len,
            expected_input_len,
        );

        self.driver.open_stream(OpenRequest {
            output,
            input,
            format,
            sample_rate,
            frames_per_buffer,
            callback: Box::new(adapter),
        })?;

        self.callback = Some(callback);
        self.open = Some(OpenState {
            direction,
            expected_output_len,
            expected_input_len,
        });
        self.state = SessionState::Open;
        info!(
            "Stream opened: {:?}, {} {} Hz, {} frames per buffer",
            direction, format, sample_rate, frames_per_buffer
        );
        Ok(())
    }

    /// Start the realtime thread
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Open {
            return Err(BridgeError::state("start", self.state.to_string()));
        }
        self.driver.start_stream()?;
        self.state = SessionState::Running;
        info!("Stream started");
        Ok(())
    }

    /// Stop the stream, letting the in-flight buffer complete
    pub fn stop(&mut self) -> Result<()> {
        if self.state != SessionState::Running {
            return Err(BridgeError::state("stop", self.state.to_string()));
        }
        self.driver.stop_stream()?;
        self.state = SessionState::Open;
        info!("Stream stopped");
        Ok(())
    }

    /// Stop the stream, discarding the in-flight buffer
    pub fn abort(&mut self) -> Result<()> {
        if self.state != SessionState::Running {
            return Err(BridgeError::state("abort", self.state.to_string()));
        }
        self.driver.abort_stream()?;
        self.state = SessionState::Open;
        info!("Stream aborted");
        Ok(())
    }

    /// Close the stream and release the callback handle.
    ///
    /// A running stream is stopped first. The release of the callback and
    /// the derived block lengths happens on every path back to Closed.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => {
                return Err(BridgeError::state("close", self.state.to_string()))
            }
            SessionState::Running => {
                self.driver.stop_stream()?;
                self.state = SessionState::Open;
            }
            SessionState::Open => {}
        }

        self.driver.close_stream();
        self.release();
        self.state = SessionState::Closed;
        info!("Stream closed");
        Ok(())
    }

    fn release(&mut self) {
        self.callback = None;
        self.open = None;
    }

    /// Current state of the lifecycle machine
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Direction of the open stream, if any
    pub fn direction(&self) -> Option<Direction> {
        self.open.as_ref().map(|open| open.direction)
    }

    /// Expected output block length in bytes, 0 for capture-only streams
    pub fn expected_output_len(&self) -> usize {
        self.open.as_ref().map_or(0, |open| open.expected_output_len)
    }

    /// Expected input block length in bytes, 0 for render-only streams
    pub fn expected_input_len(&self) -> usize {
        self.open.as_ref().map_or(0, |open| open.expected_input_len)
    }

    /// Whether the driver holds an open stream slot
    pub fn is_open(&self) -> bool {
        self.driver.is_stream_open()
    }

    /// Whether the realtime thread is ticking.
    ///
    /// Reflects the driver's view, which goes false on its own when the
    /// callback requests a stop.
    pub fn is_running(&self) -> bool {
        self.driver.is_stream_running()
    }

    /// Seconds of audio clocked through since open
    pub fn stream_time(&self) -> f64 {
        self.driver.stream_time()
    }

    /// Stream latency in frames
    pub fn stream_latency(&self) -> i64 {
        self.driver.stream_latency()
    }

    /// Sample rate of the open stream
    pub fn sample_rate(&self) -> u32 {
        self.driver.stream_sample_rate()
    }

    /// Device query surface of the underlying driver
    pub fn devices(&self) -> DeviceCatalog<'_, D> {
        DeviceCatalog::new(&self.driver)
    }
}

impl<D: AudioDriver> Drop for StreamSession<D> {
    fn drop(&mut self) {
        if self.state == SessionState::Running {
            if let Err(e) = self.driver.stop_stream() {
                warn!("Failed to stop stream during teardown: {}", e);
            }
        }
        if self.state != SessionState::Closed {
            self.driver.close_stream();
        }
        self.release();
    }
}
