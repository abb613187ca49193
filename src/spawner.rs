//! Spawn cadence and the FIFO queue of falling waste.

use crate::config::{Category, GameConfig};
use crate::geometry::HitRect;
use rand::Rng;
use std::collections::VecDeque;

/// Interval shrinks on two spawns out of every three.
const HOLD_EVERY: u64 = 3;

/// One falling piece of waste. `id` is its spawn number (first item is 1).
#[derive(Debug, Clone, PartialEq)]
pub struct WasteItem {
    pub id: u64,
    pub category: Category,
    /// Centre, logical units.
    pub x: f32,
    pub y: f32,
}

impl WasteItem {
    pub fn rect(&self, config: &GameConfig) -> HitRect {
        HitRect::centered(self.x, self.y, config.item_width, config.item_height)
    }
}

/// Items in spawn order. The head is the oldest unmatched item and the only one that can leave.
#[derive(Debug, Clone, Default)]
pub struct WasteQueue {
    items: VecDeque<WasteItem>,
}

impl WasteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WasteItem) {
        self.items.push_back(item);
    }

    pub fn head(&self) -> Option<&WasteItem> {
        self.items.front()
    }

    pub fn pop_head(&mut self) -> Option<WasteItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WasteItem> {
        self.items.iter()
    }

    /// Move every item down by `dy`. Order and membership are untouched.
    pub fn fall(&mut self, dy: f32) {
        for item in &mut self.items {
            item.y += dy;
        }
    }

    #[cfg(test)]
    pub fn categories(&self) -> Vec<Category> {
        self.items.iter().map(|i| i.category).collect()
    }
}

/// Free-running spawn clock: spawns when `elapsed` is 0, then counts up to `interval`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnTimer {
    interval: u32,
    min_interval: u32,
    elapsed: u32,
    spawned: u64,
}

impl SpawnTimer {
    pub fn new(initial_interval: u32, min_interval: u32) -> Self {
        Self {
            interval: initial_interval.max(min_interval).max(1),
            min_interval: min_interval.max(1),
            elapsed: 0,
            spawned: 0,
        }
    }

    /// Advance one tick. Returns the spawn number when an item is due this tick.
    pub fn tick(&mut self) -> Option<u64> {
        let due = if self.elapsed == 0 {
            self.spawned += 1;
            if self.interval > self.min_interval && self.spawned % HOLD_EVERY != 0 {
                self.interval -= 1;
            }
            Some(self.spawned)
        } else {
            None
        };
        self.elapsed += 1;
        if self.elapsed >= self.interval {
            self.elapsed = 0;
        }
        due
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn spawned(&self) -> u64 {
        self.spawned
    }
}

/// Owns the timer and the queue; decides when a new item appears and what it is.
#[derive(Debug, Clone)]
pub struct Spawner {
    pub timer: SpawnTimer,
    pub queue: WasteQueue,
}

impl Spawner {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            timer: SpawnTimer::new(config.initial_interval, config.min_interval),
            queue: WasteQueue::new(),
        }
    }

    /// Run the spawn step for one tick. Returns the new item if one was spawned.
    pub fn tick(&mut self, config: &GameConfig, rng: &mut impl Rng) -> Option<&WasteItem> {
        let before = self.timer.interval();
        let id = self.timer.tick()?;
        let category = Category::new(rng.gen_range(0..config.category_count()) as u8);
        if self.timer.interval() != before {
            log::debug!("spawn interval {} -> {}", before, self.timer.interval());
        }
        self.queue.push(WasteItem {
            id,
            category,
            x: config.spawn_x(),
            y: config.spawn_y,
        });
        self.queue.items.back()
    }
}
