//! rtbridge CLI - drive the callback bridge over the dummy driver backend

use anyhow::Result;
use clap::Parser;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use rtbridge::config::{Args, BridgeConfig, Command};
use rtbridge::device::DeviceCatalog;
use rtbridge::driver::{AudioDriver, DummyDriver, StreamParams};
use rtbridge::{BlockValue, ExecutionGate, SampleFormat, StreamSession};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args)?;

    match args.command.unwrap_or_default() {
        Command::List { show_channels } => cmd_list(show_channels),
        Command::Info { device_id } => cmd_info(device_id),
        Command::Run {
            config,
            device,
            sample_rate,
            frames,
            format,
            seconds,
        } => cmd_run(config, device, sample_rate, frames, &format, seconds),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = args.log_level();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if let Some(log_file) = &args.log {
        let file = std::fs::File::create(log_file)?;
        subscriber.with_writer(file).init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// List available audio devices
fn cmd_list(show_channels: bool) -> Result<()> {
    let driver = DummyDriver::new();
    let catalog = DeviceCatalog::new(&driver);
    let devices = catalog.all();

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Available audio devices:\n");

    for (id, info) in devices {
        let output_tag = if info.is_default_output {
            " (default output)"
        } else {
            ""
        };
        let input_tag = if info.is_default_input {
            " (default input)"
        } else {
            ""
        };

        print!("  {}. {}{}{}", id, info.name, output_tag, input_tag);

        if show_channels {
            println!(
                "\n     out: {}  in: {}  duplex: {}",
                info.output_channels, info.input_channels, info.duplex_channels
            );
        } else {
            println!();
        }
    }

    println!();
    Ok(())
}

/// Show detailed device information
fn cmd_info(device_id: u32) -> Result<()> {
    let driver = DummyDriver::new();
    let catalog = DeviceCatalog::new(&driver);

    match catalog.info(device_id) {
        Ok(info) => {
            println!("Device Information:\n");
            println!("  Name:            {}", info.name);
            println!("  Probed:          {}", if info.probed { "Yes" } else { "No" });
            println!("  Output channels: {}", info.output_channels);
            println!("  Input channels:  {}", info.input_channels);
            println!("  Duplex channels: {}", info.duplex_channels);
            println!(
                "  Default output:  {}",
                if info.is_default_output { "Yes" } else { "No" }
            );
            println!(
                "  Default input:   {}",
                if info.is_default_input { "Yes" } else { "No" }
            );
        }
        Err(e) => {
            println!("Device not found: {}", e);
            println!("\nUse 'rtbridge list' to see available devices.");
        }
    }

    Ok(())
}

/// Open a render stream and feed a generated tone through the bridge
fn cmd_run(
    config_path: Option<String>,
    device: Option<u32>,
    cli_sample_rate: u32,
    cli_frames: u32,
    cli_format: &str,
    seconds: Option<f64>,
) -> Result<()> {
    // An explicit config file wins over CLI stream settings; without one,
    // the default-location file only contributes direction records.
    let (sample_rate, frames, format, config) = match &config_path {
        Some(path) => {
            let config = BridgeConfig::load(path)?;
            let format = config.sample_format()?;
            (config.sample_rate, config.frames_per_buffer, format, config)
        }
        None => {
            let config = BridgeConfig::load_default()?;
            (cli_sample_rate, cli_frames, cli_format.parse()?, config)
        }
    };

    let driver = DummyDriver::new();
    let output = match device {
        Some(device_id) => Some(StreamParams {
            device_id,
            channels: 2,
            first_channel: 0,
        }),
        None => config.output_params()?.or(Some(StreamParams {
            device_id: driver.default_output_device(),
            channels: 2,
            first_channel: 0,
        })),
    };
    let input = config.input_params()?;

    let channels = output.map_or(0, |p| p.channels);
    let block_len = channels as usize * format.width() * frames as usize;

    println!("rtbridge - realtime audio callback bridge\n");
    println!(
        "Stream: {} ch, {} Hz, {} frames per buffer, format {}",
        channels, sample_rate, frames, format
    );

    let gate = ExecutionGate::new();
    let mut session = StreamSession::new(driver, gate);

    let tone = tone_callback(format, channels, sample_rate, block_len);
    session.open(output, input, format, sample_rate, frames, tone)?;
    session.start()?;

    // Ctrl+C ends an open-ended run
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    let _ = ctrlc::set_handler(move || {
        println!("\nReceived Ctrl+C, stopping...");
        r.store(false, Ordering::SeqCst);
    });

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs_f64(s.max(0.0)));
    match seconds {
        Some(s) => println!("\nStreaming for {:.1}s...\n", s),
        None => println!("\nStreaming. Press Ctrl+C to stop.\n"),
    }

    while running.load(Ordering::SeqCst) && session.is_running() {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    if session.is_running() {
        session.stop()?;
    }
    println!(
        "Streamed {:.2}s of audio ({} frames latency).",
        session.stream_time(),
        session.stream_latency()
    );
    session.close()?;
    println!("Stopped.");

    Ok(())
}

/// Per-block callback generating a 440 Hz tone.
///
/// Float32 gets a sine; every other format gets silence of the right block
/// length, which still exercises the full marshal path.
fn tone_callback(
    format: SampleFormat,
    channels: u32,
    sample_rate: u32,
    block_len: usize,
) -> impl FnMut(Option<Vec<u8>>) -> BlockValue + Send + 'static {
    let mut phase: f64 = 0.0;
    let step = TAU * 440.0 / sample_rate.max(1) as f64;

    move |_input| {
        if format != SampleFormat::FLOAT32 {
            return BlockValue::Bytes(vec![0u8; block_len]);
        }

        let mut bytes = Vec::with_capacity(block_len);
        let frames = block_len / (4 * channels.max(1) as usize);
        for _ in 0..frames {
            let sample = (phase.sin() * 0.2) as f32;
            phase += step;
            for _ in 0..channels {
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
        if phase > TAU {
            phase -= TAU;
        }
        BlockValue::Bytes(bytes)
    }
}
