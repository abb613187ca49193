//! Bins, the press latch, and click resolution against the queue head.

use crate::config::{Category, GameConfig};
use crate::geometry::HitRect;
use crate::sound::{SoundCue, SoundPlayer};
use crate::spawner::{WasteItem, WasteQueue};

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub category: Category,
    pub label: String,
    pub rect: HitRect,
}

/// Per-press state. A press is resolved once no matter how long it is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputLatch {
    #[default]
    Idle,
    PressedUnresolved,
    PressedResolved,
}

impl InputLatch {
    /// Feed the pointer state for this tick. Returns true when a hit-test is due now.
    pub fn update(&mut self, pressed: bool) -> bool {
        if !pressed {
            *self = Self::Idle;
            return false;
        }
        if *self == Self::Idle {
            *self = Self::PressedUnresolved;
        }
        if *self == Self::PressedUnresolved {
            *self = Self::PressedResolved;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Head matched the bin and was removed.
    Sorted(WasteItem),
    /// Queue empty or head of another category; nothing removed.
    WrongBin,
}

/// Owns the bins for a session and resolves clicks against the queue.
#[derive(Debug, Clone)]
pub struct BinMatcher {
    bins: Vec<Bin>,
    latch: InputLatch,
}

impl BinMatcher {
    /// One bin per configured category, in table order.
    pub fn new(config: &GameConfig) -> Self {
        let bins = config
            .all_categories()
            .map(|category| {
                let spec = &config.categories[category.index()];
                Bin {
                    category,
                    label: spec.label.clone(),
                    rect: HitRect::centered(
                        spec.bin_x,
                        config.bin_y,
                        config.bin_width,
                        config.bin_height,
                    ),
                }
            })
            .collect();
        Self {
            bins,
            latch: InputLatch::Idle,
        }
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    #[cfg(test)]
    pub fn latch(&self) -> InputLatch {
        self.latch
    }

    /// First bin (in order) containing the point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        self.bins.iter().position(|b| b.rect.contains(x, y))
    }

    /// Latch step plus, on a fresh press, hit-test and resolution.
    /// Returns the clicked bin index and outcome, or `None` when nothing was resolved.
    pub fn handle_pointer(
        &mut self,
        x: f32,
        y: f32,
        pressed: bool,
        queue: &mut WasteQueue,
        sound: &mut dyn SoundPlayer,
    ) -> Option<(usize, ClickOutcome)> {
        if !self.latch.update(pressed) {
            return None;
        }
        let index = self.hit_test(x, y)?;
        Some((index, self.resolve(index, queue, sound)))
    }

    /// Compare bin `index` with the queue head. Only the head can ever be removed.
    pub fn resolve(
        &self,
        index: usize,
        queue: &mut WasteQueue,
        sound: &mut dyn SoundPlayer,
    ) -> ClickOutcome {
        let category = self.bins[index].category;
        if queue.head().is_some_and(|h| h.category == category) {
            if let Some(item) = queue.pop_head() {
                sound.play(SoundCue::Success);
                return ClickOutcome::Sorted(item);
            }
        }
        sound.play(SoundCue::Error);
        ClickOutcome::WrongBin
    }
}
