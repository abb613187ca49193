//! App: terminal init, fixed-rate tick loop, key and mouse handling.

use crate::Args;
use crate::config::GameConfig;
use crate::game::{GameState, SortTrigger, TickEvent};
use crate::input::{Action, PointerTracker, key_to_action};
use crate::sound::{SoundCue, TerminalSound};
use crate::theme::Theme;
use crate::ui::{self, CueFlash, Viewport};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use rand::SeedableRng;
use rand::rngs::StdRng;
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::Exit => Self::Restart,
        }
    }
}

/// Whether the loop keeps going after handling input or a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    quit_selected: QuitOption,
    rng: StdRng,
    sound: TerminalSound,
    pointer: PointerTracker,
    /// Board mapping from the last drawn frame; mouse cells are converted through it.
    viewport: Viewport,
    last_tick: Instant,
    flash: Option<CueFlash>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let seed = args.seed.unwrap_or_else(rand::random);
        log::info!("new session: seed {seed}, {} categories, {} fps", config.category_count(), config.fps);
        let sound = TerminalSound::new(config.sounds, args.mute, args.quiet_success);
        Ok(Self {
            state: GameState::new(&config),
            viewport: ui::viewport_for(Rect::new(0, 0, 80, 24), &config),
            args,
            config,
            theme,
            screen: Screen::Playing,
            paused: false,
            quit_selected: QuitOption::Resume,
            rng: StdRng::seed_from_u64(seed),
            sound,
            pointer: PointerTracker::default(),
            last_tick: Instant::now(),
            flash: None,
        })
    }

    fn reset_game(&mut self) {
        log::info!("restart after {} sorted", self.state.stats.sorted);
        self.state = GameState::new(&self.config);
        self.screen = Screen::Playing;
        self.paused = false;
        self.quit_selected = QuitOption::Resume;
        self.pointer.reset();
        self.flash = None;
        self.last_tick = Instant::now();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), DisableMouseCapture);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = self.config.tick_duration();
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                self.viewport = ui::viewport_for(f.area(), &self.config);
                ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    self.quit_selected,
                    &mut self.flash,
                    now,
                );
            })?;
            if self.flash.as_ref().is_some_and(CueFlash::done) {
                self.flash = None;
            }

            let timeout = tick_interval.saturating_sub(self.last_tick.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_action(key_to_action(key)) == Flow::Exit {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => self.pointer.on_mouse(mouse, &self.viewport),
                        _ => {}
                    }
                }
            }

            if self.last_tick.elapsed() >= tick_interval {
                self.last_tick = Instant::now();
                if self.screen == Screen::Playing && !self.paused && self.step() == Flow::Exit {
                    return Ok(());
                }
            }
        }
    }

    /// One simulation tick plus the front-end reaction to its events.
    fn step(&mut self) -> Flow {
        let sample = self.pointer.sample();
        let events = self.state.tick(sample, &mut self.rng, &mut self.sound);
        for event in events {
            match event {
                TickEvent::Sorted { id, bin, trigger } => {
                    let how = match trigger {
                        SortTrigger::Click => "",
                        SortTrigger::Contact => " (dropped in)",
                    };
                    let message = format!("#{id} sorted{how}");
                    self.flash = Some(CueFlash::new(bin, SoundCue::Success, message));
                }
                TickEvent::WrongBin { bin, trigger } => {
                    let message = match trigger {
                        SortTrigger::Click => format!("Not {}!", self.bin_label(bin)),
                        SortTrigger::Contact => format!("{} is blocked", self.bin_label(bin)),
                    };
                    self.flash = Some(CueFlash::new(bin, SoundCue::Error, message));
                }
                TickEvent::Fatal { id, bin } => {
                    let message = format!("#{id} hit {}", self.bin_label(bin));
                    self.flash = Some(CueFlash::new(bin, SoundCue::Fatal, message));
                }
                TickEvent::Terminated => {
                    if self.args.exit_on_fatal {
                        return Flow::Exit;
                    }
                    self.screen = Screen::GameOver;
                }
            }
        }
        Flow::Continue
    }

    fn bin_label(&self, bin: usize) -> &str {
        self.state.bins().get(bin).map(|b| b.label.as_str()).unwrap_or("?")
    }

    fn handle_action(&mut self, action: Action) -> Flow {
        match self.screen {
            Screen::Playing => match action {
                Action::Pause => {
                    self.paused = !self.paused;
                    self.pointer.reset();
                }
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down => self.quit_selected = self.quit_selected.next(),
                Action::Up => self.quit_selected = self.quit_selected.prev(),
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => {
                        self.screen = Screen::Playing;
                        self.pointer.reset();
                    }
                    QuitOption::Restart => self.reset_game(),
                    QuitOption::Exit => return Flow::Exit,
                },
                Action::Pause | Action::Quit => {
                    self.screen = Screen::Playing;
                    self.pointer.reset();
                }
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Flow::Exit,
                Action::Restart | Action::Confirm => self.reset_game(),
                _ => {}
            },
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(extra: &[&str]) -> App {
        let mut argv = vec!["wastesort", "--seed", "9", "--mute"];
        argv.extend_from_slice(extra);
        let args = Args::parse_from(argv);
        App::new(args, GameConfig::default(), Theme::default()).unwrap()
    }

    #[test]
    fn test_quit_menu_cycles_and_exits() {
        let mut a = app(&[]);
        assert_eq!(a.handle_action(Action::Quit), Flow::Continue);
        assert_eq!(a.screen, Screen::QuitMenu);
        a.handle_action(Action::Down);
        assert_eq!(a.quit_selected, QuitOption::Restart);
        a.handle_action(Action::Down);
        assert_eq!(a.quit_selected, QuitOption::Exit);
        assert_eq!(a.handle_action(Action::Confirm), Flow::Exit);
    }

    #[test]
    fn test_quit_menu_escape_resumes() {
        let mut a = app(&[]);
        a.handle_action(Action::Quit);
        a.handle_action(Action::Up);
        assert_eq!(a.quit_selected, QuitOption::Exit);
        a.handle_action(Action::Quit);
        assert_eq!(a.screen, Screen::Playing);
    }

    #[test]
    fn test_pause_toggles() {
        let mut a = app(&[]);
        a.handle_action(Action::Pause);
        assert!(a.paused);
        a.handle_action(Action::Pause);
        assert!(!a.paused);
    }

    #[test]
    fn test_session_end_shows_game_over_then_restart() {
        let mut a = app(&[]);
        let mut ticks = 0;
        while a.screen == Screen::Playing && ticks < 20_000 {
            assert_eq!(a.step(), Flow::Continue);
            ticks += 1;
        }
        assert_eq!(a.screen, Screen::GameOver);
        assert!(a.state.is_over());
        a.handle_action(Action::Restart);
        assert_eq!(a.screen, Screen::Playing);
        assert!(!a.state.is_over());
        assert_eq!(a.state.timer().spawned(), 0);
    }

    #[test]
    fn test_exit_on_fatal_leaves_loop() {
        let mut a = app(&["--exit-on-fatal"]);
        let mut flow = Flow::Continue;
        for _ in 0..20_000 {
            flow = a.step();
            if flow == Flow::Exit {
                break;
            }
        }
        assert_eq!(flow, Flow::Exit);
        assert!(a.state.is_over());
    }
}
