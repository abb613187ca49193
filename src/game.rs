//! Game state: one sorting session driven a tick at a time.
//!
//! Tick order: countdown if terminating, items fall, bin/item overlap, spawn step, pointer.
//! Nothing here sleeps or touches the terminal; sound and randomness are injected.

use crate::bins::{Bin, BinMatcher, ClickOutcome};
use crate::config::{Category, GameConfig};
use crate::sound::{SoundCue, SoundPlayer};
use crate::spawner::{SpawnTimer, Spawner, WasteQueue};
use rand::Rng;

/// Session lifecycle. `Terminating` replaces a blocking wait for the fatal cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Running,
    Terminating { ticks_left: u32 },
    Terminated,
}

/// Pointer state sampled once per tick, in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
}

#[cfg(test)]
impl PointerSample {
    pub fn released() -> Self {
        Self::default()
    }

    pub fn pressed_at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            pressed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTrigger {
    Click,
    /// The head item touched its own bin.
    Contact,
}

/// What happened during a tick, for the front end (flashes, logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    Sorted { id: u64, bin: usize, trigger: SortTrigger },
    WrongBin { bin: usize, trigger: SortTrigger },
    Fatal { id: u64, bin: usize },
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub ticks: u64,
    pub sorted: u64,
    pub wrong_clicks: u64,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    spawner: Spawner,
    matcher: BinMatcher,
    phase: Phase,
    pub stats: Stats,
    /// Item and bin of the fatal overlap, kept for the game-over screen.
    pub fatal: Option<(u64, usize)>,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            config: config.clone(),
            spawner: Spawner::new(config),
            matcher: BinMatcher::new(config),
            phase: Phase::Running,
            stats: Stats::default(),
            fatal: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Terminated
    }

    pub fn queue(&self) -> &WasteQueue {
        &self.spawner.queue
    }

    pub fn bins(&self) -> &[Bin] {
        self.matcher.bins()
    }

    pub fn timer(&self) -> &SpawnTimer {
        &self.spawner.timer
    }

    pub fn label(&self, category: Category) -> &str {
        self.config.label(category)
    }

    /// Advance the session by one tick.
    pub fn tick(
        &mut self,
        pointer: PointerSample,
        rng: &mut impl Rng,
        sound: &mut dyn SoundPlayer,
    ) -> Vec<TickEvent> {
        let mut events = Vec::new();
        match self.phase {
            Phase::Terminated => return events,
            Phase::Terminating { ticks_left } => {
                let left = ticks_left.saturating_sub(1);
                if left == 0 {
                    self.terminate(&mut events);
                } else {
                    self.phase = Phase::Terminating { ticks_left: left };
                }
                return events;
            }
            Phase::Running => {}
        }
        self.stats.ticks += 1;

        self.spawner.queue.fall(self.config.fall_speed);

        if self.check_overlaps(sound, &mut events) {
            return events;
        }

        if let Some(item) = self.spawner.tick(&self.config, rng) {
            log::debug!("spawned #{} {}", item.id, self.config.label(item.category));
        }

        if let Some((bin, outcome)) = self.matcher.handle_pointer(
            pointer.x,
            pointer.y,
            pointer.pressed,
            &mut self.spawner.queue,
            sound,
        ) {
            self.record(bin, &outcome, SortTrigger::Click, &mut events);
        }
        events
    }

    /// Every bin against every item, not just the head. Returns true if the session became fatal.
    fn check_overlaps(&mut self, sound: &mut dyn SoundPlayer, events: &mut Vec<TickEvent>) -> bool {
        for bin in 0..self.matcher.bins().len() {
            let rect = self.matcher.bins()[bin].rect;
            let category = self.matcher.bins()[bin].category;
            let touching: Vec<(u64, Category)> = self
                .spawner
                .queue
                .iter()
                .filter(|item| item.rect(&self.config).overlaps(&rect))
                .map(|item| (item.id, item.category))
                .collect();
            for (id, item_category) in touching {
                if item_category != category {
                    self.start_fatal(id, bin, sound, events);
                    return true;
                }
                let outcome = self.matcher.resolve(bin, &mut self.spawner.queue, sound);
                self.record(bin, &outcome, SortTrigger::Contact, events);
            }
        }
        false
    }

    fn record(
        &mut self,
        bin: usize,
        outcome: &ClickOutcome,
        trigger: SortTrigger,
        events: &mut Vec<TickEvent>,
    ) {
        match outcome {
            ClickOutcome::Sorted(item) => {
                self.stats.sorted += 1;
                log::debug!("sorted #{} into {} ({:?})", item.id, self.bins()[bin].label, trigger);
                events.push(TickEvent::Sorted {
                    id: item.id,
                    bin,
                    trigger,
                });
            }
            ClickOutcome::WrongBin => {
                if trigger == SortTrigger::Click {
                    self.stats.wrong_clicks += 1;
                }
                events.push(TickEvent::WrongBin { bin, trigger });
            }
        }
    }

    fn start_fatal(
        &mut self,
        id: u64,
        bin: usize,
        sound: &mut dyn SoundPlayer,
        events: &mut Vec<TickEvent>,
    ) {
        log::info!(
            "item #{} touched the {} bin; ending session",
            id,
            self.bins()[bin].label
        );
        sound.play(SoundCue::Fatal);
        self.fatal = Some((id, bin));
        events.push(TickEvent::Fatal { id, bin });
        let ticks = self.config.ticks_for(sound.duration(SoundCue::Fatal));
        if ticks == 0 {
            self.terminate(events);
        } else {
            self.phase = Phase::Terminating { ticks_left: ticks };
        }
    }

    fn terminate(&mut self, events: &mut Vec<TickEvent>) {
        log::info!(
            "session over after {} ticks: {} sorted, {} wrong clicks",
            self.stats.ticks,
            self.stats.sorted,
            self.stats.wrong_clicks
        );
        self.phase = Phase::Terminated;
        events.push(TickEvent::Terminated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CueDurations;
    use crate::sound::RecordingSound;
    use crate::spawner::WasteItem;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const FOOD: Category = Category::new(0);
    const BOTTLE: Category = Category::new(1);
    const PAPER: Category = Category::new(2);

    /// Config whose items fall beside the bins so nothing ever overlaps.
    fn calm_config() -> GameConfig {
        GameConfig {
            spawn_x: Some(-500.0),
            ..GameConfig::default()
        }
    }

    fn push(state: &mut GameState, id: u64, category: Category, x: f32, y: f32) {
        state.spawner.queue.push(WasteItem { id, category, x, y });
    }

    fn bin_center(state: &GameState, bin: usize) -> PointerSample {
        let r = state.bins()[bin].rect;
        PointerSample::pressed_at((r.left + r.right) / 2.0, (r.top + r.bottom) / 2.0)
    }

    #[test]
    fn test_queue_size_tracks_spawned_minus_sorted() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(1);
        let mut snd = RecordingSound::default();
        for t in 0..3000 {
            // Press every 7th tick on the bin matching the head, release otherwise.
            let pointer = match state.queue().head() {
                Some(h) if t % 7 == 0 => bin_center(&state, h.category.index()),
                _ => PointerSample::released(),
            };
            state.tick(pointer, &mut rng, &mut snd);
            assert_eq!(
                state.queue().len() as u64,
                state.timer().spawned() - state.stats.sorted
            );
        }
        assert!(state.stats.sorted > 0);
        assert_eq!(state.stats.wrong_clicks, 0);
        assert_eq!(state.phase(), Phase::Running);
    }

    #[test]
    fn test_scenario_food_bottle() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        // Consume the tick-0 spawn slot with no spawn so the queue stays ours.
        state.spawner.timer = SpawnTimer::new(u32::MAX, u32::MAX);
        state.spawner.timer.tick();
        push(&mut state, 1, FOOD, -500.0, 0.0);
        push(&mut state, 2, BOTTLE, -500.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut snd = RecordingSound::default();

        let events = state.tick(bin_center(&state, 1), &mut rng, &mut snd);
        assert_eq!(
            events,
            vec![TickEvent::WrongBin {
                bin: 1,
                trigger: SortTrigger::Click
            }]
        );
        assert_eq!(state.queue().categories(), vec![FOOD, BOTTLE]);
        assert_eq!(snd.played, vec![SoundCue::Error]);

        state.tick(PointerSample::released(), &mut rng, &mut snd);
        let events = state.tick(bin_center(&state, 0), &mut rng, &mut snd);
        assert_eq!(
            events,
            vec![TickEvent::Sorted {
                id: 1,
                bin: 0,
                trigger: SortTrigger::Click
            }]
        );
        assert_eq!(state.queue().categories(), vec![BOTTLE]);
        assert_eq!(snd.played, vec![SoundCue::Error, SoundCue::Success]);
        assert_eq!(state.stats.wrong_clicks, 1);
        assert_eq!(state.stats.sorted, 1);
    }

    #[test]
    fn test_non_head_match_removes_nothing() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        state.spawner.timer = SpawnTimer::new(u32::MAX, u32::MAX);
        state.spawner.timer.tick();
        push(&mut state, 1, FOOD, -500.0, 0.0);
        push(&mut state, 2, PAPER, -500.0, 0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut snd = RecordingSound::default();
        state.tick(bin_center(&state, 2), &mut rng, &mut snd);
        assert_eq!(state.queue().categories(), vec![FOOD, PAPER]);
        assert_eq!(snd.played, vec![SoundCue::Error]);
    }

    #[test]
    fn test_wrong_category_overlap_is_fatal_then_terminates() {
        let mut cfg = calm_config();
        cfg.sounds = CueDurations {
            fatal_ms: 100,
            ..CueDurations::default()
        };
        let mut state = GameState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        let mut snd = RecordingSound {
            durations: cfg.sounds,
            ..RecordingSound::default()
        };
        // A paper item sitting inside the food bin, behind a food head far above.
        let food_bin = state.bins()[0].rect;
        push(&mut state, 90, FOOD, -500.0, 0.0);
        push(&mut state, 91, PAPER, cfg.categories[0].bin_x, food_bin.top + 5.0);

        let events = state.tick(PointerSample::released(), &mut rng, &mut snd);
        assert_eq!(events, vec![TickEvent::Fatal { id: 91, bin: 0 }]);
        assert_eq!(snd.played, vec![SoundCue::Fatal]);
        assert_eq!(state.phase(), Phase::Terminating { ticks_left: 5 });
        assert_eq!(state.fatal, Some((91, 0)));

        // Nothing moves, spawns or resolves while the cue plays.
        let len = state.queue().len();
        let spawned = state.timer().spawned();
        for _ in 0..4 {
            let events = state.tick(bin_center(&state, 0), &mut rng, &mut snd);
            assert!(events.is_empty());
        }
        assert_eq!(state.queue().len(), len);
        assert_eq!(state.timer().spawned(), spawned);
        assert_eq!(snd.played, vec![SoundCue::Fatal]);

        let events = state.tick(PointerSample::released(), &mut rng, &mut snd);
        assert_eq!(events, vec![TickEvent::Terminated]);
        assert!(state.is_over());
        assert!(state.tick(PointerSample::released(), &mut rng, &mut snd).is_empty());
    }

    #[test]
    fn test_fatal_overlap_wins_over_click_on_same_tick() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(4);
        let mut snd = RecordingSound::default();
        let food_bin = state.bins()[0].rect;
        push(&mut state, 1, FOOD, -500.0, 0.0);
        push(&mut state, 2, PAPER, cfg.categories[0].bin_x, food_bin.top + 5.0);

        // Fresh press on the bin that matches the head.
        let events = state.tick(bin_center(&state, 0), &mut rng, &mut snd);
        assert_eq!(events, vec![TickEvent::Fatal { id: 2, bin: 0 }]);
        assert_eq!(snd.played, vec![SoundCue::Fatal]);
        assert_eq!(state.queue().categories(), vec![FOOD, PAPER]);
        assert_eq!(state.matcher.latch(), crate::bins::InputLatch::Idle);
        assert_eq!(state.stats.sorted, 0);
        assert!(matches!(state.phase(), Phase::Terminating { .. }));
    }

    #[test]
    fn test_fatal_overlap_while_press_is_held() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        state.spawner.timer = SpawnTimer::new(u32::MAX, u32::MAX);
        state.spawner.timer.tick();
        let mut rng = StdRng::seed_from_u64(4);
        let mut snd = RecordingSound::default();
        push(&mut state, 1, FOOD, -500.0, 0.0);

        // Press outside every bin and keep holding it.
        let held = PointerSample::pressed_at(5.0, 5.0);
        assert!(state.tick(held, &mut rng, &mut snd).is_empty());
        assert_eq!(state.matcher.latch(), crate::bins::InputLatch::PressedResolved);

        let food_bin = state.bins()[0].rect;
        push(&mut state, 2, BOTTLE, cfg.categories[0].bin_x, food_bin.top + 5.0);
        let events = state.tick(held, &mut rng, &mut snd);
        assert_eq!(events, vec![TickEvent::Fatal { id: 2, bin: 0 }]);
        assert_eq!(snd.played, vec![SoundCue::Fatal]);
        assert_eq!(state.queue().categories(), vec![FOOD, BOTTLE]);
    }

    #[test]
    fn test_zero_length_fatal_cue_terminates_immediately() {
        let mut cfg = calm_config();
        cfg.sounds.fatal_ms = 0;
        let mut state = GameState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(3);
        let mut snd = RecordingSound {
            durations: cfg.sounds,
            ..RecordingSound::default()
        };
        push(&mut state, 1, PAPER, cfg.categories[1].bin_x, cfg.bin_y);
        let events = state.tick(PointerSample::released(), &mut rng, &mut snd);
        assert_eq!(
            events,
            vec![TickEvent::Fatal { id: 1, bin: 1 }, TickEvent::Terminated]
        );
        assert!(state.is_over());
    }

    #[test]
    fn test_head_contact_with_own_bin_sorts() {
        let cfg = calm_config();
        let mut state = GameState::new(&cfg);
        state.spawner.timer = SpawnTimer::new(u32::MAX, u32::MAX);
        state.spawner.timer.tick();
        let mut rng = StdRng::seed_from_u64(5);
        let mut snd = RecordingSound::default();
        push(&mut state, 1, BOTTLE, cfg.categories[1].bin_x, cfg.bin_y);
        let events = state.tick(PointerSample::released(), &mut rng, &mut snd);
        assert_eq!(
            events,
            vec![TickEvent::Sorted {
                id: 1,
                bin: 1,
                trigger: SortTrigger::Contact
            }]
        );
        assert!(state.queue().is_empty());
        assert_eq!(snd.played, vec![SoundCue::Success]);
        assert_eq!(state.stats.wrong_clicks, 0);
    }

    #[test]
    fn test_default_drop_lands_in_middle_bin() {
        // Items fall at the screen centre, straight into the Bottle bin.
        let cfg = GameConfig::default();
        let mut state = GameState::new(&cfg);
        let mut rng = StdRng::seed_from_u64(11);
        let mut snd = RecordingSound::default();
        let mut ticks = 0;
        while state.phase() == Phase::Running && ticks < 10_000 {
            state.tick(PointerSample::released(), &mut rng, &mut snd);
            ticks += 1;
        }
        // With no clicks, the first non-bottle to reach the bin ends the session.
        assert!(matches!(state.phase(), Phase::Terminating { .. }));
        let (_, bin) = state.fatal.unwrap();
        assert_eq!(bin, 1);
        assert_eq!(snd.played.last(), Some(&SoundCue::Fatal));
        assert!(snd.played[..snd.played.len() - 1]
            .iter()
            .all(|c| *c == SoundCue::Success));
    }
}
