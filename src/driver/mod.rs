//! Native audio driver abstraction consumed by the bridge

mod dummy;

pub use dummy::DummyDriver;

use crate::error::Result;
use crate::format::SampleFormat;

/// Status code handed back to the driver from one callback invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTick {
    /// Keep streaming
    Continue,
    /// Stop after the in-flight buffer drains
    Stop,
    /// Abnormal stop, the driver discards the in-flight buffer
    Abort,
}

impl StreamTick {
    /// The wire-level status code: 0 continue, 1 clean stop, 2 abnormal stop
    pub const fn code(self) -> i32 {
        match self {
            StreamTick::Continue => 0,
            StreamTick::Stop => 1,
            StreamTick::Abort => 2,
        }
    }
}

/// Realtime entry point registered with the driver at open time.
///
/// The driver calls `on_block` once per buffer period from its realtime
/// thread. A null pointer marks the missing side of a one-directional
/// stream.
pub trait StreamCallback: Send {
    /// Process one audio block.
    ///
    /// # Safety
    ///
    /// Non-null `output`/`input` must point to driver-owned regions sized
    /// for this stream's block length, valid only until the call returns.
    unsafe fn on_block(
        &mut self,
        output: *mut u8,
        input: *const u8,
        frames: u32,
        stream_time: f64,
    ) -> StreamTick;
}

/// Per-direction stream parameters in the driver's shape.
///
/// Value semantics: built by the parameter translator and consumed by the
/// single open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Index into the driver's device table
    pub device_id: u32,
    /// Number of channels to open
    pub channels: u32,
    /// First channel offset into the device's channel set
    pub first_channel: u32,
}

/// Capability record for one enumerated device
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Whether the device's capabilities were successfully probed
    pub probed: bool,
    /// Human-readable device name
    pub name: String,
    /// Maximum output channels supported
    pub output_channels: u32,
    /// Maximum input channels supported
    pub input_channels: u32,
    /// Maximum simultaneous input/output channels
    pub duplex_channels: u32,
    /// Whether this is the default output device
    pub is_default_output: bool,
    /// Whether this is the default input device
    pub is_default_input: bool,
}

/// Everything the driver needs to open its single stream slot
pub struct OpenRequest {
    /// Output-side parameters, absent for capture-only streams
    pub output: Option<StreamParams>,
    /// Input-side parameters, absent for render-only streams
    pub input: Option<StreamParams>,
    /// Sample format for both directions
    pub format: SampleFormat,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Block length in frames
    pub frames_per_buffer: u32,
    /// Realtime callback invoked once per block
    pub callback: Box<dyn StreamCallback>,
}

/// Contract of the native audio layer.
///
/// One stream slot per driver instance. `stop_stream`, `abort_stream` and
/// `close_stream` synchronize with the realtime thread: no callback is
/// executing once they return.
pub trait AudioDriver: Send {
    /// Number of devices in the driver's table
    fn device_count(&self) -> u32;

    /// Capability record for a device index
    fn device_info(&self, device_id: u32) -> Result<DeviceInfo>;

    /// Index of the default output device
    fn default_output_device(&self) -> u32;

    /// Index of the default input device
    fn default_input_device(&self) -> u32;

    /// Open the stream slot, registering the realtime callback
    fn open_stream(&mut self, request: OpenRequest) -> Result<()>;

    /// Begin invoking the callback once per buffer period
    fn start_stream(&mut self) -> Result<()>;

    /// Stop the stream, letting the in-flight buffer complete
    fn stop_stream(&mut self) -> Result<()>;

    /// Stop the stream, discarding the in-flight buffer
    fn abort_stream(&mut self) -> Result<()>;

    /// Tear down the stream slot and release the registered callback
    fn close_stream(&mut self);

    /// Whether the stream slot is occupied
    fn is_stream_open(&self) -> bool;

    /// Whether the realtime thread is actively ticking
    fn is_stream_running(&self) -> bool;

    /// Seconds of audio clocked through since open
    fn stream_time(&self) -> f64;

    /// Stream latency in frames
    fn stream_latency(&self) -> i64;

    /// Sample rate of the open stream, 0 when closed
    fn stream_sample_rate(&self) -> u32;
}
