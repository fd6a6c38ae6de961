use std::{io::Write, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use pulse_wave_core::{
    DrawCall, FrameTicker, RecordingCanvas, ScheduledEvent, Scheduler, Size, WaveConfig,
};
use tracing_subscriber::EnvFilter;

mod screen;

use screen::HostScreen;

fn main() -> pulse_wave_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preview {
            config,
            child_width,
            child_height,
            duration_ms,
            fps,
            taps,
            json,
        } => {
            let config = load_config(config.as_ref())?;
            let options = PreviewOptions {
                child: Size::new(child_width, child_height),
                duration: Duration::from_millis(duration_ms),
                ticker: FrameTicker::with_fps(fps),
                taps,
                json,
            };
            run_preview(config, &options)
        }
        Commands::Config { config } => {
            let config = load_config(config.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> pulse_wave_core::Result<WaveConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading wave configuration");
            WaveConfig::from_path(path)
        }
        None => Ok(WaveConfig::default()),
    }
}

struct PreviewOptions {
    child: Size,
    duration: Duration,
    ticker: FrameTicker,
    taps: Vec<u64>,
    json: bool,
}

fn run_preview(config: WaveConfig, options: &PreviewOptions) -> pulse_wave_core::Result<()> {
    let mut screen = HostScreen::new(config, options.child)?;
    tracing::info!(
        width = screen.size().width,
        height = screen.size().height,
        "starting preview"
    );

    // The preview opens with a tap so there is something to look at.
    let mut scheduler = Scheduler::new();
    let mut events = vec![ScheduledEvent::new(Duration::ZERO, "tap")];
    events.extend(
        options
            .taps
            .iter()
            .map(|&at| ScheduledEvent::new(Duration::from_millis(at), "tap")),
    );
    scheduler.set_events(events);

    let mut canvas = RecordingCanvas::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut now = Duration::ZERO;
    let mut painted = 0usize;

    for event in scheduler.drain_due(now) {
        tracing::debug!(label = %event.label, at = ?event.at, "event");
        screen.on_tap();
    }
    if screen.paint_pending(&mut canvas) {
        painted += 1;
        emit_frame(&mut out, now, canvas.take(), options.json)?;
    }

    for delta in options.ticker.ticks_until(options.duration) {
        now += delta;
        for event in scheduler.drain_due(now) {
            tracing::debug!(label = %event.label, at = ?event.at, "event");
            screen.on_tap();
        }

        if !screen.frame(delta, &mut canvas) {
            continue;
        }
        painted += 1;
        emit_frame(&mut out, now, canvas.take(), options.json)?;
    }

    if !scheduler.is_exhausted() {
        tracing::warn!("taps scheduled after the end of the preview were skipped");
    }

    tracing::info!(
        painted,
        animating = screen.is_animating(),
        finished = screen.layout().engine().is_finished(),
        "preview complete"
    );
    Ok(())
}

fn emit_frame(
    out: &mut impl Write,
    now: Duration,
    calls: Vec<DrawCall>,
    json: bool,
) -> pulse_wave_core::Result<()> {
    let time_ms = now.as_millis() as u64;
    if json {
        let frame = serde_json::json!({
            "time_ms": time_ms,
            "draw_calls": calls,
        });
        writeln!(out, "{frame}")?;
    } else {
        let rings: Vec<String> = calls
            .iter()
            .map(|call| format!("{:.1}@{}", call.left, call.color.a))
            .collect();
        tracing::info!(time_ms, rings = %rings.join(" "), "frame");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pulse wave widget preview", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the host screen in a simulated frame loop.
    Preview {
        /// JSON configuration document. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Width of the wrapped child, in pixels.
        #[arg(long, default_value_t = 100.0)]
        child_width: f64,
        /// Height of the wrapped child, in pixels.
        #[arg(long, default_value_t = 100.0)]
        child_height: f64,
        /// How long to simulate, in milliseconds.
        #[arg(short, long, default_value_t = 2000)]
        duration_ms: u64,
        /// Simulated frame rate.
        #[arg(long, default_value_t = 60)]
        fps: u32,
        /// Additional tap times in milliseconds; each one toggles the wave.
        #[arg(short, long = "tap")]
        taps: Vec<u64>,
        /// Write one JSON line of draw calls per painted frame to stdout.
        #[arg(long)]
        json: bool,
    },
    /// Validate a configuration document and print the resolved values.
    Config {
        /// JSON configuration document. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
