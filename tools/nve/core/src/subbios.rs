//! The subsystem context: one video memory shared by the graphics surface
//! and the console, plus the background compositor and flash ticker.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{error, info, warn};

use crate::charset::AssetProvider;
use crate::console::Console;
use crate::error::FunctionError;
use crate::graphics::GraphicsOutput;
use crate::inputs::{input_channel, InputSource};
use crate::palette::ScreenWidth;
use crate::render::{FrameSink, RgbaFrame};
use crate::video::Video;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Time between composed frames.
    pub frame_interval: Duration,
    /// Time between flash phase steps.
    pub flash_interval: Duration,
    pub keyboard_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_micros(16_667),
            flash_interval: Duration::from_millis(250),
            keyboard_capacity: 256,
        }
    }
}

/// A periodic background thread. Dropping the handle stops and joins it.
pub struct TaskHandle {
    name: &'static str,
    stop: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl TaskHandle {
    fn spawn(name: &'static str, interval: Duration, mut tick: impl FnMut() + Send + 'static) -> io::Result<Self> {
        let (stop, stopped) = bounded::<()>(1);
        let thread = thread::Builder::new().name(name.to_string()).spawn(move || loop {
            match stopped.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => tick(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;
        info!("{} started", name);
        Ok(Self { name, stop, thread: Some(thread) })
    }

    /// Stops and joins the thread.
    pub fn stop(self) {}
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        let _ = self.stop.try_send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("{} panicked", self.name);
            } else {
                info!("{} stopped", self.name);
            }
        }
    }
}

pub struct Subbios {
    pub video: Arc<Video>,
    pub graphics: GraphicsOutput,
    pub console: Console,
    input: Option<InputSource>,
    config: Config,
}

impl Subbios {
    /// Builds the subsystem in 80 columns with graphics output started and
    /// the console at its initial state.
    pub fn new(config: Config, assets: Arc<dyn AssetProvider>) -> Self {
        let video = Arc::new(Video::new(ScreenWidth::High));
        let status = Arc::new(FunctionError::default());
        let (input, keyboard, pointer) = input_channel(config.keyboard_capacity);

        let graphics = GraphicsOutput::new(video.clone(), assets.clone(), pointer, status);
        if let Err(code) = graphics.cold_start() {
            warn!("graphics cold start failed: {}", code);
        }
        let mut console = Console::new(video.clone(), assets, keyboard);
        console.reset_to_initial_state();

        Self { video, graphics, console, input: Some(input), config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The host side of keyboard and pointer input. Available once.
    pub fn take_input(&mut self) -> Option<InputSource> {
        self.input.take()
    }

    /// Composes and renders a frame on the calling thread.
    pub fn frame(&self) -> RgbaFrame {
        self.video.frame()
    }

    /// Drains the draw queue and presents a frame to `sink` every frame
    /// interval.
    pub fn start_compositor(&self, mut sink: impl FrameSink + 'static) -> io::Result<TaskHandle> {
        let video = self.video.clone();
        TaskHandle::spawn("compositor", self.config.frame_interval, move || {
            let frame = video.frame();
            sink.present(&frame);
        })
    }

    pub fn start_flash_ticker(&self) -> io::Result<TaskHandle> {
        let video = self.video.clone();
        TaskHandle::spawn("flash ticker", self.config.flash_interval, move || video.advance_flash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::BuiltinAssets;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn fast_config() -> Config {
        Config { frame_interval: Duration::from_millis(2), flash_interval: Duration::from_millis(2), ..Config::default() }
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_starts_in_high_res_with_graphics_on() {
        let subbios = Subbios::new(Config::default(), Arc::new(BuiltinAssets));
        assert_eq!(subbios.video.width(), ScreenWidth::High);
        assert!(subbios.graphics.is_on());
        assert_eq!(subbios.console.cursor_position(), (1, 1));
        assert_eq!(subbios.config().keyboard_capacity, 256);
    }

    #[test]
    fn test_compositor_presents_frames_and_drains_queue() {
        let subbios = Subbios::new(fast_config(), Arc::new(BuiltinAssets));
        let frames = Arc::new(AtomicUsize::new(0));
        let seen = frames.clone();
        let handle = subbios
            .start_compositor(move |frame: &RgbaFrame| {
                assert_eq!((frame.width, frame.height), (640, 500));
                seen.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        subbios.graphics.poly_line(1, &[], 1, 0, 0, &[(0, 0), (100, 0)]).unwrap();
        assert!(wait_for(|| frames.load(Ordering::Relaxed) >= 3));
        assert!(wait_for(|| subbios.video.pipeline.queue_len() == 0));
        handle.stop();
        let stopped_at = frames.load(Ordering::Relaxed);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(frames.load(Ordering::Relaxed), stopped_at);
    }

    #[test]
    fn test_flash_ticker_advances_phase() {
        let subbios = Subbios::new(fast_config(), Arc::new(BuiltinAssets));
        let start = subbios.video.flash_phase();
        let _ticker = subbios.start_flash_ticker().unwrap();
        assert!(wait_for(|| subbios.video.flash_phase() != start));
    }

    #[test]
    fn test_input_is_taken_once() {
        let mut subbios = Subbios::new(Config::default(), Arc::new(BuiltinAssets));
        let mut input = subbios.take_input().unwrap();
        assert!(subbios.take_input().is_none());
        input.send_key('k');
        assert_eq!(subbios.console.getch(), Some('k'));
    }
}
