mod assets;
mod showcase;
mod sink;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::util::SubscriberInitExt;

use nve_core::render::RgbaFrame;
use nve_core::{Config, Subbios};

use crate::assets::HostAssets;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    #[value(name = "40")]
    Forty,
    #[value(name = "80")]
    Eighty,
}

#[derive(Parser)]
#[command(name = "nve")]
#[command(version, about = "Headless Nimbus video emulator", long_about = None)]
struct Cli {
    /// Text and escape sequences for the console ("-" reads stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Where to write the final frame
    #[arg(short, long, default_value = "nve.png")]
    out: PathBuf,

    /// Screen width in columns
    #[arg(short, long, value_enum, default_value = "80")]
    mode: Mode,

    /// Draw a sample of every graphics primitive first
    #[arg(long)]
    showcase: bool,

    /// PNG to use as the logo
    #[arg(long)]
    logo: Option<PathBuf>,

    /// How long to let the compositor run before capturing
    #[arg(long, default_value_t = 100)]
    settle_ms: u64,

    /// Most verbose level of log output
    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    #[cfg(not(target_arch = "wasm32"))]
    {
        use thread_priority::*;
        // best effort
        let _ = set_current_thread_priority(ThreadPriority::Max);
    }

    let assets = match &cli.logo {
        Some(path) => HostAssets::with_logo(path)?,
        None => HostAssets::default(),
    };
    let mut subbios = Subbios::new(Config::default(), Arc::new(assets));

    let presented = Arc::new(AtomicUsize::new(0));
    let compositor = subbios.start_compositor({
        let presented = presented.clone();
        move |_: &RgbaFrame| {
            presented.fetch_add(1, Ordering::Relaxed);
        }
    })?;
    let ticker = subbios.start_flash_ticker()?;

    if cli.mode == Mode::Forty {
        subbios.console.print("\x1b[0h");
    }
    if cli.showcase {
        showcase::draw(&subbios.graphics)?;
    }
    if let Some(path) = &cli.input {
        let text = read_input(path)?;
        subbios.console.print(&text);
    }

    thread::sleep(Duration::from_millis(cli.settle_ms));
    ticker.stop();
    compositor.stop();
    info!("compositor presented {} frames", presented.load(Ordering::Relaxed));

    let frame = subbios.frame();
    sink::write_png(&frame, &cli.out)?;
    info!("wrote {}", cli.out.display());
    Ok(())
}
