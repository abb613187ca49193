//! Layout and drawing: playfield, bins, falling waste, sidebar, pause, quit menu, game over.

use crate::app::{QuitOption, Screen};
use crate::config::GameConfig;
use crate::game::{GameState, Phase};
use crate::geometry::HitRect;
use crate::sound::SoundCue;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f32 = 2.0;
/// Flash length on the bin that produced a cue, ms.
const FLASH_MS: u32 = 350;

/// Maps logical screen coordinates onto the board's terminal cells and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub board: Rect,
    logical_w: f32,
    logical_h: f32,
}

impl Viewport {
    pub fn new(board: Rect, logical_w: f32, logical_h: f32) -> Self {
        Self {
            board,
            logical_w,
            logical_h,
        }
    }

    /// Logical point under the centre of a terminal cell. Off-board cells map outside the screen.
    pub fn to_logical(&self, column: u16, row: u16) -> (f32, f32) {
        if self.board.width == 0 || self.board.height == 0 {
            return (-1.0, -1.0);
        }
        let cx = f32::from(column) - f32::from(self.board.x) + 0.5;
        let cy = f32::from(row) - f32::from(self.board.y) + 0.5;
        (
            cx * self.logical_w / f32::from(self.board.width),
            cy * self.logical_h / f32::from(self.board.height),
        )
    }

    /// Cells covered by a logical rectangle, clipped to the board. At least one cell wide and tall.
    pub fn project(&self, r: &HitRect) -> Option<Rect> {
        if self.board.is_empty() {
            return None;
        }
        let sx = f32::from(self.board.width) / self.logical_w;
        let sy = f32::from(self.board.height) / self.logical_h;
        let x0 = (r.left * sx).floor() as i32;
        let y0 = (r.top * sy).floor() as i32;
        let x1 = ((r.right * sx).ceil() as i32).max(x0 + 1);
        let y1 = ((r.bottom * sy).ceil() as i32).max(y0 + 1);

        let bw = i32::from(self.board.width);
        let bh = i32::from(self.board.height);
        let (cx0, cy0) = (x0.clamp(0, bw), y0.clamp(0, bh));
        let (cx1, cy1) = (x1.clamp(0, bw), y1.clamp(0, bh));
        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }
        Some(Rect {
            x: self.board.x + cx0 as u16,
            y: self.board.y + cy0 as u16,
            width: (cx1 - cx0) as u16,
            height: (cy1 - cy0) as u16,
        })
    }
}

/// Playfield (with border) and sidebar for the given area, centred like the board is drawn.
fn game_layout(area: Rect, config: &GameConfig) -> (Rect, Rect) {
    let avail_w = area.width.saturating_sub(SIDEBAR_WIDTH + 2).max(1);
    let avail_h = area.height.saturating_sub(2).max(1);
    let ratio = config.screen_height / config.screen_width / CELL_ASPECT;
    let mut w = f32::from(avail_w);
    let mut h = (w * ratio).round();
    if h > f32::from(avail_h) {
        h = f32::from(avail_h);
        w = (h / ratio).round().min(f32::from(avail_w));
    }
    let (pw, ph) = (w.max(1.0) as u16 + 2, h.max(1.0) as u16 + 2);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph.max(SIDEBAR_MIN_HEIGHT)),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let playfield = Rect {
        height: ph.min(inner[0].height),
        ..inner[0]
    };
    (playfield, inner[1])
}

/// Sidebar sections need this many rows.
const SIDEBAR_MIN_HEIGHT: u16 = 18;

/// Viewport for the current terminal area; the same mapping `draw` uses.
pub fn viewport_for(area: Rect, config: &GameConfig) -> Viewport {
    let (playfield, _) = game_layout(area, config);
    let board = Block::default().borders(Borders::ALL).inner(playfield);
    Viewport::new(board, config.screen_width, config.screen_height)
}

/// A fading highlight on the bin that just produced a sound cue.
pub struct CueFlash {
    pub bin: usize,
    pub cue: SoundCue,
    /// Shown in the sidebar while the flash lasts.
    pub message: String,
    pub effect: Option<Effect>,
    pub last_process: Option<Instant>,
}

impl CueFlash {
    pub fn new(bin: usize, cue: SoundCue, message: String) -> Self {
        Self {
            bin,
            cue,
            message,
            effect: None,
            last_process: None,
        }
    }

    pub fn done(&self) -> bool {
        self.effect.as_ref().is_some_and(Effect::done)
    }
}

fn cue_color(cue: SoundCue) -> Color {
    match cue {
        SoundCue::Success => Color::Green,
        SoundCue::Error => Color::Yellow,
        SoundCue::Fatal => Color::Red,
    }
}

/// Draw the current screen, with optional pause overlay, quit menu and cue flash.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    quit_selected: QuitOption,
    flash: &mut Option<CueFlash>,
    now: Instant,
) {
    let area = frame.area();
    let message = flash.as_ref().map(|f| (f.message.clone(), cue_color(f.cue)));
    match screen {
        Screen::Playing => {
            draw_game(frame, state, theme, area, message);
            if let Some(f) = flash.as_mut() {
                apply_cue_flash(frame, state, area, f, now);
            }
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, state, theme, area, message);
            draw_quit_menu(frame, theme, quit_selected);
        }
        Screen::GameOver => {
            draw_game(frame, state, theme, area, None);
            draw_game_over(frame, state, theme, area);
        }
    }
}

/// Create the flash effect on first use, then advance it by the frame delta.
fn apply_cue_flash(
    frame: &mut Frame,
    state: &GameState,
    area: Rect,
    flash: &mut CueFlash,
    now: Instant,
) {
    let viewport = viewport_for(area, &state.config);
    let Some(bin) = state.bins().get(flash.bin) else {
        return;
    };
    let Some(rect) = viewport.project(&bin.rect) else {
        return;
    };
    let delta = flash
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    flash.last_process = Some(now);

    if flash.effect.is_none() {
        let c = cue_color(flash.cue);
        flash.effect =
            Some(fx::fade_from(c, c, (FLASH_MS, Interpolation::QuadOut)).with_area(rect));
    }
    if let Some(effect) = flash.effect.as_mut() {
        frame.render_effect(effect, rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    message: Option<(String, Color)>,
) {
    let (playfield, sidebar) = game_layout(area, &state.config);
    draw_playfield(frame, state, theme, playfield);
    draw_sidebar(frame, state, theme, sidebar, message);
}

fn draw_playfield(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let title = match state.phase() {
        Phase::Running => format!(" Wastesort  | Sorted: {} ", state.stats.sorted),
        Phase::Terminating { .. } | Phase::Terminated => " Wastesort  | Oops! ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.board_bg))
        .title(Span::styled(title, theme.accent));
    let board = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in board.y..board.y + board.height {
        for x in board.x..board.x + board.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.board_bg));
        }
    }

    let viewport = Viewport::new(board, state.config.screen_width, state.config.screen_height);
    let fatal_bin = state.fatal.map(|(_, bin)| bin);

    for (i, bin) in state.bins().iter().enumerate() {
        let Some(rect) = viewport.project(&bin.rect) else {
            continue;
        };
        let color = theme.category_color(bin.category);
        let border = if fatal_bin == Some(i) {
            Style::default().fg(theme.fatal).bg(theme.board_bg).bold()
        } else {
            Style::default().fg(color).bg(theme.board_bg)
        };
        let block = Block::default().borders(Borders::ALL).border_style(border);
        let inner = block.inner(rect);
        block.render(rect, frame.buffer_mut());
        if !inner.is_empty() {
            let label_row = Rect {
                y: inner.y + inner.height.saturating_sub(1),
                height: 1,
                ..inner
            };
            Paragraph::new(Span::styled(bin.label.as_str(), Style::default().fg(color).bold()))
                .alignment(Alignment::Center)
                .render(label_row, frame.buffer_mut());
        }
    }

    // Items drawn last so they sit on top of bins they are passing through.
    let head_id = state.queue().head().map(|h| h.id);
    for item in state.queue().iter() {
        let Some(rect) = viewport.project(&item.rect(&state.config)) else {
            continue;
        };
        let color = theme.category_color(item.category);
        let initial = state.label(item.category).chars().next().unwrap_or('?');
        let fg = if Some(item.id) == head_id {
            Color::White
        } else {
            theme.board_bg
        };
        let buf = frame.buffer_mut();
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(color));
            }
        }
        let cx = rect.x + rect.width / 2;
        let cy = rect.y + rect.height / 2;
        buf[(cx, cy)]
            .set_char(initial)
            .set_style(Style::default().fg(fg).bg(color).bold());
    }
}

fn draw_sidebar(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    message: Option<(String, Color)>,
) {
    let title_style = Style::default().fg(theme.accent);
    let fg_style = Style::default().fg(theme.text);
    let border_style = Style::default().fg(theme.border).bg(theme.board_bg);
    let legend_rows = state.bins().len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),               // Lowest item
            Constraint::Length(legend_rows + 3), // Bins legend
            Constraint::Length(8),               // Stats
            Constraint::Length(1),               // Last cue message
            Constraint::Fill(1),
        ])
        .split(area);

    // --- Lowest ---
    let lowest_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let lowest_inner = lowest_block.inner(chunks[0]);
    lowest_block.render(chunks[0], frame.buffer_mut());
    let lowest = match state.queue().head() {
        Some(head) => Span::styled(
            state.label(head.category).to_string(),
            Style::default().fg(theme.category_color(head.category)).bold(),
        ),
        None => Span::styled("-", Style::default().fg(theme.muted)),
    };
    Paragraph::new(vec![
        Line::from(Span::styled("Lowest", title_style)),
        Line::from(lowest),
    ])
    .render(lowest_inner, frame.buffer_mut());

    // --- Bins legend ---
    let legend_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let legend_inner = legend_block.inner(chunks[1]);
    legend_block.render(chunks[1], frame.buffer_mut());
    let mut legend = vec![Line::from(Span::styled("Bins", title_style))];
    legend.extend(state.bins().iter().map(|bin| {
        let c = theme.category_color(bin.category);
        Line::from(vec![
            Span::styled("██ ", Style::default().fg(c)),
            Span::styled(bin.label.as_str(), fg_style),
        ])
    }));
    Paragraph::new(legend).render(legend_inner, frame.buffer_mut());

    // --- Stats ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let stat = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(name, title_style), Span::styled(value, fg_style)])
    };
    let stats_lines = vec![
        stat("Sorted: ", state.stats.sorted.to_string()),
        stat("Wrong clicks: ", state.stats.wrong_clicks.to_string()),
        stat("Spawned: ", state.timer().spawned().to_string()),
        stat("Falling: ", state.queue().len().to_string()),
        stat("Interval: ", format!("{} ticks", state.timer().interval())),
        stat(
            "Next drop: ",
            format!("{} ticks", state.timer().interval() - state.timer().elapsed()),
        ),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    if let Some((text, color)) = message {
        Paragraph::new(Span::styled(format!(" {text}"), Style::default().fg(color).bold()))
            .render(chunks[3], frame.buffer_mut());
    }
}

fn centered_popup(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn clear_rect(frame: &mut Frame, rect: Rect, bg: Color) {
    let buf = frame.buffer_mut();
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
        }
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 28, 5);
    clear_rect(frame, popup, theme.board_bg);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P: Resume    Q: Quit ",
            Style::default().fg(theme.text),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border).bg(theme.board_bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 36, 11);
    clear_rect(frame, popup, theme.board_bg);
    let cause = match state.fatal {
        Some((_, bin)) if state.is_over() => state
            .bins()
            .get(bin)
            .map(|b| format!(" Wrong waste hit the {} bin ", b.label))
            .unwrap_or_default(),
        _ => String::new(),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(Span::styled(cause, Style::default().fg(theme.muted))),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Sorted: {} ", state.stats.sorted),
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            format!(" Wrong clicks: {} ", state.stats.wrong_clicks),
            Style::default().fg(theme.text),
        )),
        Line::from(Span::styled(
            format!(" Time: {:.1} s ", state.stats.ticks as f64 / f64::from(state.config.fps)),
            Style::default().fg(theme.text),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " R: Restart    Q: Quit ",
            Style::default().fg(theme.text),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border).bg(theme.board_bg))
            .title(Span::styled(" Wastesort ", theme.accent)),
    );
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let quit_rect = centered_popup(area, 24, 8);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(" Quit? ");

    clear_rect(frame, quit_rect, theme.board_bg);

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.board_bg).bg(theme.accent).bold()
        } else {
            Style::default().fg(theme.accent)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.y + inner.height {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn test_to_logical_uses_cell_centres() {
        let vp = Viewport::new(Rect::new(10, 5, 100, 50), 200.0, 100.0);
        assert_eq!(vp.to_logical(10, 5), (1.0, 1.0));
        assert_eq!(vp.to_logical(109, 54), (199.0, 99.0));
        let (x, y) = vp.to_logical(0, 0);
        assert!(x < 0.0 && y < 0.0);
    }

    #[test]
    fn test_project_clips_to_board() {
        let vp = Viewport::new(Rect::new(0, 0, 100, 50), 100.0, 50.0);
        let inside = vp.project(&HitRect::centered(50.0, 25.0, 10.0, 10.0)).unwrap();
        assert_eq!(inside, Rect::new(45, 20, 10, 10));
        let partial = vp.project(&HitRect::centered(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(partial, Rect::new(0, 0, 5, 5));
        assert!(vp.project(&HitRect::centered(50.0, 80.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_bin_centre_cell_maps_back_into_bin() {
        let cfg = GameConfig::default();
        let state = GameState::new(&cfg);
        for area in [Rect::new(0, 0, 80, 24), Rect::new(0, 0, 200, 60), Rect::new(3, 2, 120, 40)] {
            let vp = viewport_for(area, &cfg);
            for (i, bin) in state.bins().iter().enumerate() {
                let cells = vp.project(&bin.rect).unwrap();
                let (x, y) = vp.to_logical(cells.x + cells.width / 2, cells.y + cells.height / 2);
                assert!(bin.rect.contains(x, y), "bin {i} in {area:?}: ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_layout_keeps_aspect() {
        let cfg = GameConfig::default();
        let vp = viewport_for(Rect::new(0, 0, 200, 60), &cfg);
        let ratio = f32::from(vp.board.height) * CELL_ASPECT / f32::from(vp.board.width);
        let expected = cfg.screen_height / cfg.screen_width;
        assert!((ratio - expected).abs() < 0.05, "ratio {ratio} vs {expected}");
    }
}
