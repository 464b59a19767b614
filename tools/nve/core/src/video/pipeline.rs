use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::video::feature::{ClipRect, Feature, Layer, SpriteAction};
use crate::video::memory::{on_screen, VideoMemory};
use crate::video::sprite::SavedPixel;

#[inline(always)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ordered queue of pending features in front of video memory.
///
/// Locks are always taken queue first, then memory. A feature is applied
/// while both are held and only popped afterwards, so an empty queue means
/// every submitted feature has reached memory.
#[derive(Default)]
pub struct DrawPipeline {
    queue: Mutex<VecDeque<Feature>>,
    memory: Mutex<VideoMemory>,
}

impl DrawPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, feature: Feature) {
        lock(&self.queue).push_back(feature);
    }

    pub fn queue_len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Drops everything still queued.
    pub fn purge(&self) {
        let purged = {
            let mut queue = lock(&self.queue);
            let n = queue.len();
            queue.clear();
            n
        };
        if purged > 0 {
            debug!(target: "pipeline", "purged {} queued features", purged);
        }
    }

    /// Applies the oldest queued feature. Returns false if the queue was empty.
    pub fn step(&self) -> bool {
        let mut queue = lock(&self.queue);
        let Some(feature) = queue.front() else {
            return false;
        };
        {
            let mut memory = lock(&self.memory);
            apply(&mut memory, feature);
        }
        queue.pop_front();
        true
    }

    /// Applies every queued feature in submission order.
    pub fn compose(&self) -> usize {
        let mut applied = 0;
        while self.step() {
            applied += 1;
        }
        applied
    }

    /// Returns once the queue is empty, helping to apply whatever is left.
    pub fn drain_barrier(&self) {
        while self.step() {}
    }

    pub fn read<R>(&self, f: impl FnOnce(&VideoMemory) -> R) -> R {
        f(&lock(&self.memory))
    }

    pub fn snapshot(&self) -> VideoMemory {
        lock(&self.memory).clone()
    }

    pub fn copy_into(&self, target: &mut VideoMemory) {
        target.copy_from(&lock(&self.memory));
    }

    /// Drains the queue, then wipes memory.
    pub fn clear_memory(&self) {
        self.drain_barrier();
        lock(&self.memory).clear();
    }
}

fn blit(memory: &mut VideoMemory, layer: &Layer, clip: &ClipRect) {
    for (col, row, x, y) in layer.cells() {
        if !clip.contains(x, y) {
            continue;
        }
        if let Some(colour) = layer.source(col, row) {
            if layer.xor {
                memory.xor(x, y, colour);
            } else {
                memory.set(x, y, colour);
            }
        }
    }
}

fn capture(memory: &VideoMemory, layer: &Layer, clip: &ClipRect) -> Vec<SavedPixel> {
    layer
        .cells()
        .filter(|&(_, _, x, y)| clip.contains(x, y) && on_screen(x, y))
        .map(|(_, _, x, y)| SavedPixel { x, y, colour: memory.get(x, y) })
        .collect()
}

fn restore(memory: &mut VideoMemory, saved: &[SavedPixel]) {
    for pixel in saved {
        memory.set(pixel.x, pixel.y, pixel.colour);
    }
}

fn apply(memory: &mut VideoMemory, feature: &Feature) {
    match feature {
        Feature::Plain { layer, clip } => blit(memory, layer, clip),
        Feature::Sprite { layer, clip, save_table, action } => {
            let mut saved = save_table.lock();
            if *action == SpriteAction::Move {
                restore(memory, &saved);
            }
            *saved = capture(memory, layer, clip);
            blit(memory, layer, clip);
        }
        Feature::SpriteErase { save_table } => {
            let mut saved = save_table.lock();
            restore(memory, &saved);
            saved.clear();
        }
        Feature::ConsoleGlyph(layer) => blit(memory, layer, &ClipRect::memory()),
    }
}
