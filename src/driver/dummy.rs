//! Clocked dummy backend with no hardware attached
//!
//! Drives the registered callback from a real ticker thread at the stream's
//! buffer period, which makes the two-thread model observable without an
//! audio device: the control thread opens and starts the slot, the ticker
//! thread owns the block regions and invokes the callback.

use crate::driver::{AudioDriver, DeviceInfo, OpenRequest, StreamCallback, StreamParams, StreamTick};
use crate::error::{BridgeError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Teardown command for the ticker thread
enum TickerCommand {
    /// Let the current block complete, then exit
    Drain,
    /// Exit without another block
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Output,
    Input,
}

/// Clock state shared between the control side and the ticker thread
struct StreamClock {
    /// Stream time in seconds, stored as f64 bits
    seconds: AtomicU64,
    /// Blocks clocked through since open
    blocks: AtomicU64,
    /// Cleared when the ticker exits, including callback-requested stops
    running: AtomicBool,
}

impl StreamClock {
    fn new() -> Self {
        Self {
            seconds: AtomicU64::new(0f64.to_bits()),
            blocks: AtomicU64::new(0),
            running: AtomicBool::new(false),
        }
    }

    fn seconds(&self) -> f64 {
        f64::from_bits(self.seconds.load(Ordering::Acquire))
    }

    fn advance(&self, delta: f64) {
        let next = self.seconds() + delta;
        self.seconds.store(next.to_bits(), Ordering::Release);
        self.blocks.fetch_add(1, Ordering::Relaxed);
    }
}

struct Ticker {
    commands: Sender<TickerCommand>,
    handle: JoinHandle<()>,
}

/// The driver's single stream slot
struct StreamSlot {
    callback: Arc<Mutex<Box<dyn StreamCallback>>>,
    output_len: usize,
    input_len: usize,
    frames: u32,
    sample_rate: u32,
    clock: Arc<StreamClock>,
    ticker: Option<Ticker>,
}

/// Driver backend that clocks streams against the wall clock instead of
/// hardware. Two fixed endpoint devices plus one duplex device.
pub struct DummyDriver {
    devices: Vec<DeviceInfo>,
    slot: Option<StreamSlot>,
}

impl DummyDriver {
    /// Create a driver with the fixed three-device table
    pub fn new() -> Self {
        Self {
            devices: vec![
                DeviceInfo {
                    probed: true,
                    name: "Dummy Output".to_string(),
                    output_channels: 8,
                    input_channels: 0,
                    duplex_channels: 0,
                    is_default_output: true,
                    is_default_input: false,
                },
                DeviceInfo {
                    probed: true,
                    name: "Dummy Input".to_string(),
                    output_channels: 0,
                    input_channels: 8,
                    duplex_channels: 0,
                    is_default_output: false,
                    is_default_input: true,
                },
                DeviceInfo {
                    probed: true,
                    name: "Dummy Duplex".to_string(),
                    output_channels: 2,
                    input_channels: 2,
                    duplex_channels: 2,
                    is_default_output: false,
                    is_default_input: false,
                },
            ],
            slot: None,
        }
    }

    /// Blocks clocked through the open stream so far
    pub fn blocks_processed(&self) -> u64 {
        self.slot
            .as_ref()
            .map(|slot| slot.clock.blocks.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn validate_params(&self, params: &StreamParams, side: Side) -> Result<()> {
        let info = self.devices.get(params.device_id as usize).ok_or_else(|| {
            BridgeError::driver(format!("invalid device id: {}", params.device_id))
        })?;

        let available = match side {
            Side::Output => info.output_channels,
            Side::Input => info.input_channels,
        };
        let requested = params.channels + params.first_channel;
        if requested > available {
            return Err(BridgeError::driver(format!(
                "device '{}' has {} {} channels, requested channels {}..{}",
                info.name,
                available,
                match side {
                    Side::Output => "output",
                    Side::Input => "input",
                },
                params.first_channel,
                requested,
            )));
        }
        Ok(())
    }
}

impl Default for DummyDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDriver for DummyDriver {
    fn device_count(&self) -> u32 {
        self.devices.len() as u32
    }

    fn device_info(&self, device_id: u32) -> Result<DeviceInfo> {
        self.devices
            .get(device_id as usize)
            .cloned()
            .ok_or_else(|| BridgeError::driver(format!("invalid device id: {}", device_id)))
    }

    fn default_output_device(&self) -> u32 {
        0
    }

    fn default_input_device(&self) -> u32 {
        1
    }

    fn open_stream(&mut self, request: OpenRequest) -> Result<()> {
        if self.slot.is_some() {
            return Err(BridgeError::driver("a stream is already open"));
        }
        if request.sample_rate == 0 {
            return Err(BridgeError::driver("sample rate must be positive"));
        }
        if request.frames_per_buffer == 0 {
            return Err(BridgeError::driver("frames per buffer must be positive"));
        }
        if let Some(params) = &request.output {
            self.validate_params(params, Side::Output)?;
        }
        if let Some(params) = &request.input {
            self.validate_params(params, Side::Input)?;
        }

        let width = request.format.width();
        let frames = request.frames_per_buffer as usize;
        let output_len = request
            .output
            .map_or(0, |p| p.channels as usize * width * frames);
        let input_len = request
            .input
            .map_or(0, |p| p.channels as usize * width * frames);

        self.slot = Some(StreamSlot {
            callback: Arc::new(Mutex::new(request.callback)),
            output_len,
            input_len,
            frames: request.frames_per_buffer,
            sample_rate: request.sample_rate,
            clock: Arc::new(StreamClock::new()),
            ticker: None,
        });

        info!(
            "Dummy stream open: {} Hz, {} frames, {} out / {} in bytes per block",
            request.sample_rate, request.frames_per_buffer, output_len, input_len
        );
        Ok(())
    }

    fn start_stream(&mut self) -> Result<()> {
        let slot = self
            .slot
            .as_mut()
            .ok_or_else(|| BridgeError::driver("no stream is open"))?;

        if slot.clock.running.load(Ordering::Acquire) {
            return Err(BridgeError::driver("stream is already running"));
        }
        // Reap a ticker that stopped itself on a callback status
        if let Some(ticker) = slot.ticker.take() {
            let _ = ticker.handle.join();
        }

        let (commands, command_rx) = bounded::<TickerCommand>(1);
        slot.clock.running.store(true, Ordering::Release);

        let callback = slot.callback.clone();
        let clock = slot.clock.clone();
        let output_len = slot.output_len;
        let input_len = slot.input_len;
        let frames = slot.frames;
        let sample_rate = slot.sample_rate;

        let handle = thread::spawn(move || {
            ticker_thread(
                callback, clock, command_rx, output_len, input_len, frames, sample_rate,
            );
        });
        slot.ticker = Some(Ticker { commands, handle });

        info!("Dummy stream started");
        Ok(())
    }

    fn stop_stream(&mut self) -> Result<()> {
        let slot = self
            .slot
            .as_mut()
            .ok_or_else(|| BridgeError::driver("no stream is open"))?;
        let ticker = slot
            .ticker
            .take()
            .ok_or_else(|| BridgeError::driver("stream is not running"))?;

        let _ = ticker.commands.send(TickerCommand::Drain);
        let _ = ticker.handle.join();
        info!("Dummy stream stopped");
        Ok(())
    }

    fn abort_stream(&mut self) -> Result<()> {
        let slot = self
            .slot
            .as_mut()
            .ok_or_else(|| BridgeError::driver("no stream is open"))?;
        let ticker = slot
            .ticker
            .take()
            .ok_or_else(|| BridgeError::driver("stream is not running"))?;

        let _ = ticker.commands.send(TickerCommand::Discard);
        let _ = ticker.handle.join();
        info!("Dummy stream aborted");
        Ok(())
    }

    fn close_stream(&mut self) {
        if let Some(mut slot) = self.slot.take() {
            if let Some(ticker) = slot.ticker.take() {
                let _ = ticker.commands.send(TickerCommand::Discard);
                let _ = ticker.handle.join();
            }
            info!("Dummy stream closed");
        }
    }

    fn is_stream_open(&self) -> bool {
        self.slot.is_some()
    }

    fn is_stream_running(&self) -> bool {
        self.slot
            .as_ref()
            .map(|slot| slot.clock.running.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    fn stream_time(&self) -> f64 {
        self.slot
            .as_ref()
            .map(|slot| slot.clock.seconds())
            .unwrap_or(0.0)
    }

    fn stream_latency(&self) -> i64 {
        self.slot.as_ref().map(|slot| slot.frames as i64).unwrap_or(0)
    }

    fn stream_sample_rate(&self) -> u32 {
        self.slot.as_ref().map(|slot| slot.sample_rate).unwrap_or(0)
    }
}

impl Drop for DummyDriver {
    fn drop(&mut self) {
        self.close_stream();
    }
}

/// Ticker loop: one callback invocation per buffer period.
///
/// The block regions live on this thread; pointers into them are valid only
/// for the synchronous callback window, exactly like hardware-owned DMA
/// regions.
fn ticker_thread(
    callback: Arc<Mutex<Box<dyn StreamCallback>>>,
    clock: Arc<StreamClock>,
    commands: Receiver<TickerCommand>,
    output_len: usize,
    input_len: usize,
    frames: u32,
    sample_rate: u32,
) {
    debug!("Dummy ticker thread started");

    let period = Duration::from_secs_f64(frames as f64 / sample_rate as f64);
    let delta = frames as f64 / sample_rate as f64;
    let mut output = vec![0u8; output_len];
    let mut input = vec![0u8; input_len];
    let mut fill: u8 = 0;

    loop {
        let draining = match commands.try_recv() {
            Ok(TickerCommand::Discard) => break,
            Ok(TickerCommand::Drain) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => break,
        };

        thread::sleep(period);

        // Rolling counter stands in for captured samples
        for byte in input.iter_mut() {
            *byte = fill;
            fill = fill.wrapping_add(1);
        }

        let output_ptr = if output.is_empty() {
            std::ptr::null_mut()
        } else {
            output.as_mut_ptr()
        };
        let input_ptr = if input.is_empty() {
            std::ptr::null()
        } else {
            input.as_ptr()
        };

        let tick = {
            let mut callback = callback.lock();
            // SAFETY: the regions outlive the call and match the block
            // lengths the slot was opened with
            unsafe { callback.on_block(output_ptr, input_ptr, frames, clock.seconds()) }
        };
        clock.advance(delta);

        match tick {
            StreamTick::Continue => {}
            StreamTick::Stop => {
                debug!("Callback requested stop");
                break;
            }
            StreamTick::Abort => {
                warn!("Callback requested abort");
                break;
            }
        }

        if draining {
            break;
        }
    }

    clock.running.store(false, Ordering::Release);
    debug!("Dummy ticker thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SampleFormat;
    use std::time::Instant;

    struct CountingCallback {
        ticks: Arc<AtomicU64>,
        first_input: Arc<Mutex<Option<Vec<u8>>>>,
        stop_after: u64,
    }

    impl StreamCallback for CountingCallback {
        unsafe fn on_block(
            &mut self,
            _output: *mut u8,
            input: *const u8,
            frames: u32,
            _stream_time: f64,
        ) -> StreamTick {
            if !input.is_null() {
                let mut first = self.first_input.lock();
                if first.is_none() {
                    let len = frames as usize * 2;
                    *first = Some(std::slice::from_raw_parts(input, len).to_vec());
                }
            }
            let seen = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
            if seen >= self.stop_after {
                StreamTick::Stop
            } else {
                StreamTick::Continue
            }
        }
    }

    fn render_request(callback: Box<dyn StreamCallback>) -> OpenRequest {
        OpenRequest {
            output: Some(StreamParams {
                device_id: 0,
                channels: 2,
                first_channel: 0,
            }),
            input: None,
            format: SampleFormat::SINT8,
            sample_rate: 48000,
            frames_per_buffer: 32,
            callback,
        }
    }

    fn wait_until_stopped(driver: &DummyDriver) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while driver.is_stream_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_device_table() {
        let driver = DummyDriver::new();
        assert_eq!(driver.device_count(), 3);
        assert_eq!(driver.default_output_device(), 0);
        assert_eq!(driver.default_input_device(), 1);
        assert!(driver.device_info(0).unwrap().is_default_output);
        assert!(driver.device_info(9).is_err());
    }

    #[test]
    fn test_open_validates_channels() {
        let mut driver = DummyDriver::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let request = OpenRequest {
            output: Some(StreamParams {
                device_id: 0,
                channels: 16,
                first_channel: 0,
            }),
            input: None,
            format: SampleFormat::SINT16,
            sample_rate: 48000,
            frames_per_buffer: 64,
            callback: Box::new(CountingCallback {
                ticks,
                first_input: Arc::new(Mutex::new(None)),
                stop_after: u64::MAX,
            }),
        };
        assert!(driver.open_stream(request).is_err());
        assert!(!driver.is_stream_open());
    }

    #[test]
    fn test_misuse_errors() {
        let mut driver = DummyDriver::new();
        assert!(driver.start_stream().is_err());
        assert!(driver.stop_stream().is_err());

        let ticks = Arc::new(AtomicU64::new(0));
        let request = render_request(Box::new(CountingCallback {
            ticks,
            first_input: Arc::new(Mutex::new(None)),
            stop_after: u64::MAX,
        }));
        driver.open_stream(request).unwrap();
        assert!(driver.stop_stream().is_err());

        let ticks = Arc::new(AtomicU64::new(0));
        let second = render_request(Box::new(CountingCallback {
            ticks,
            first_input: Arc::new(Mutex::new(None)),
            stop_after: u64::MAX,
        }));
        assert!(driver.open_stream(second).is_err());
    }

    #[test]
    fn test_callback_requested_stop_ends_ticker() {
        let mut driver = DummyDriver::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let request = render_request(Box::new(CountingCallback {
            ticks: ticks.clone(),
            first_input: Arc::new(Mutex::new(None)),
            stop_after: 3,
        }));
        driver.open_stream(request).unwrap();
        driver.start_stream().unwrap();

        wait_until_stopped(&driver);
        assert!(!driver.is_stream_running());
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert_eq!(driver.blocks_processed(), 3);
        assert!(driver.stream_time() > 0.0);

        // Stop after a self-stop joins the finished ticker
        driver.stop_stream().unwrap();
        driver.close_stream();
        assert!(!driver.is_stream_open());
    }

    #[test]
    fn test_input_region_carries_rolling_counter() {
        let mut driver = DummyDriver::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let first_input = Arc::new(Mutex::new(None));
        let request = OpenRequest {
            output: None,
            input: Some(StreamParams {
                device_id: 1,
                channels: 2,
                first_channel: 0,
            }),
            format: SampleFormat::SINT8,
            sample_rate: 48000,
            frames_per_buffer: 4,
            callback: Box::new(CountingCallback {
                ticks,
                first_input: first_input.clone(),
                stop_after: 1,
            }),
        };
        driver.open_stream(request).unwrap();
        driver.start_stream().unwrap();
        wait_until_stopped(&driver);

        let seen = first_input.lock().clone().unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        driver.close_stream();
    }

    #[test]
    fn test_restart_after_stop() {
        let mut driver = DummyDriver::new();
        let ticks = Arc::new(AtomicU64::new(0));
        let request = render_request(Box::new(CountingCallback {
            ticks: ticks.clone(),
            first_input: Arc::new(Mutex::new(None)),
            stop_after: u64::MAX,
        }));
        driver.open_stream(request).unwrap();

        driver.start_stream().unwrap();
        thread::sleep(Duration::from_millis(10));
        driver.stop_stream().unwrap();
        assert!(!driver.is_stream_running());
        let after_first = ticks.load(Ordering::SeqCst);
        assert!(after_first > 0);

        driver.start_stream().unwrap();
        thread::sleep(Duration::from_millis(10));
        driver.abort_stream().unwrap();
        assert!(ticks.load(Ordering::SeqCst) > after_first);
        driver.close_stream();
    }
}
