use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use log::warn;
use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::palette::{MEMORY_WIDTH, SCREEN_HEIGHT};
use crate::video::pipeline::lock;

pub const KEY_LEFT: char = '\x01';
pub const KEY_RIGHT: char = '\x02';
pub const KEY_OTHER: char = '\x07';
pub const KEY_BACKSPACE: char = '\x08';

pub const BUTTON_RIGHT: u8 = 0b01;
pub const BUTTON_LEFT: u8 = 0b10;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PointerStatus {
    pub x: i32,
    pub y: i32,
    pub buttons: u8,
}

/// The host side of keyboard and pointer input, already in screen
/// coordinates.
pub struct InputSource {
    keys: Producer<char>,
    pointer: Arc<Mutex<PointerStatus>>,
}

impl InputSource {
    pub fn send_key(&mut self, key: char) -> bool {
        match self.keys.push(key) {
            Ok(()) => true,
            Err(PushError::Full(dropped)) => {
                warn!("keyboard buffer full, dropping {:?}", dropped);
                false
            }
        }
    }

    pub fn send_str(&mut self, keys: &str) {
        for key in keys.chars() {
            self.send_key(key);
        }
    }

    pub fn set_pointer(&self, x: i32, y: i32, buttons: u8) {
        *lock(&self.pointer) = PointerStatus {
            x: x.clamp(0, MEMORY_WIDTH as i32 - 1),
            y: y.clamp(0, SCREEN_HEIGHT as i32 - 1),
            buttons: buttons & (BUTTON_LEFT | BUTTON_RIGHT),
        };
    }
}

/// The subsystem side of keyboard input.
pub struct Keyboard {
    keys: Consumer<char>,
    poll: Duration,
}

impl Keyboard {
    pub fn try_key(&mut self) -> Option<char> {
        self.keys.pop().ok()
    }

    /// Waits for the next key.
    pub fn wait_key(&mut self) -> char {
        loop {
            if let Ok(key) = self.keys.pop() {
                return key;
            }
            thread::sleep(self.poll);
        }
    }

    pub fn flush(&mut self) -> usize {
        let mut dropped = 0;
        while self.keys.pop().is_ok() {
            dropped += 1;
        }
        dropped
    }
}

/// Shared pointer snapshot read by the graphics surface.
#[derive(Clone, Debug, Default)]
pub struct Pointer(Arc<Mutex<PointerStatus>>);

impl Pointer {
    pub fn status(&self) -> PointerStatus {
        *lock(&self.0)
    }
}

pub fn input_channel(capacity: usize) -> (InputSource, Keyboard, Pointer) {
    let (producer, consumer) = RingBuffer::new(capacity);
    let pointer = Pointer::default();
    let source = InputSource { keys: producer, pointer: pointer.0.clone() };
    let keyboard = Keyboard { keys: consumer, poll: Duration::from_millis(5) };
    (source, keyboard, pointer)
}
