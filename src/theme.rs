//! Colours for the board, bins and waste, loadable from a btop-style theme file.
//!
//! File format: one `theme[key]="#RRGGBB"` per line, `#` comments. Unknown keys are ignored.
//! Category colours come from six slots (`waste0`..`waste5`) and repeat for larger tables.

use crate::Palette;
use crate::config::Category;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const SLOTS: usize = 6;

/// One Dark: green, yellow, red, blue, magenta, cyan.
const ONEDARK_WASTE: [Color; SLOTS] = [
    Color::Rgb(0x98, 0xC3, 0x79),
    Color::Rgb(0xE5, 0xC0, 0x7B),
    Color::Rgb(0xE0, 0x6C, 0x75),
    Color::Rgb(0x61, 0xAF, 0xEF),
    Color::Rgb(0xC6, 0x78, 0xDD),
    Color::Rgb(0x56, 0xB6, 0xC2),
];

const HIGH_CONTRAST_WASTE: [Color; SLOTS] = [
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0x00, 0xFF, 0xFF),
];

/// Paul Tol's vibrant set; no red/green pair among the first three bins.
const COLORBLIND_WASTE: [Color; SLOTS] = [
    Color::Rgb(0x00, 0x77, 0xBB),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x00, 0x99, 0x88),
    Color::Rgb(0xCC, 0x33, 0x11),
    Color::Rgb(0xEE, 0x33, 0x77),
    Color::Rgb(0xBB, 0xBB, 0x00),
];

#[derive(Debug, Clone)]
pub struct Theme {
    pub waste: [Color; SLOTS],
    pub board_bg: Color,
    pub border: Color,
    pub text: Color,
    /// Titles and the selected menu entry.
    pub accent: Color,
    /// Hints, empty values.
    pub muted: Color,
    /// Outline of the bin that ended the session.
    pub fatal: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex colour {value:?} for theme[{key}]")]
    InvalidHex { key: String, value: String },
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            waste: ONEDARK_WASTE,
            board_bg: Color::Rgb(0x31, 0x35, 0x3F),
            border: Color::Rgb(0x3F, 0x44, 0x4F),
            text: Color::Rgb(0xAB, 0xB2, 0xBF),
            accent: Color::Rgb(0xE5, 0xC0, 0x7B),
            muted: Color::Rgb(0x5C, 0x63, 0x70),
            fatal: Color::Rgb(0xE0, 0x6C, 0x75),
        }
    }
}

impl Theme {
    /// Defaults, then the file at `path` if it exists, then the palette's waste colours.
    /// A bad colour value in the file is an error; a missing file is not.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        if let Some(path) = path.filter(|p| p.exists()) {
            let text = std::fs::read_to_string(path)?;
            theme.apply_entries(&parse_theme_file(&text))?;
        }
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// `Normal` keeps whatever the file or defaults set.
    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => self.waste = HIGH_CONTRAST_WASTE,
            Palette::Colorblind => self.waste = COLORBLIND_WASTE,
        }
    }

    fn apply_entries(&mut self, entries: &HashMap<String, String>) -> Result<(), ThemeError> {
        for (key, value) in entries {
            let slot = match key.as_str() {
                "bg" | "meter_bg" => &mut self.board_bg,
                "border" | "div_line" => &mut self.border,
                "text" | "main_fg" => &mut self.text,
                "accent" | "title" => &mut self.accent,
                "muted" | "inactive_fg" => &mut self.muted,
                "fatal" => &mut self.fatal,
                other => match waste_slot(other) {
                    Some(i) => &mut self.waste[i],
                    None => {
                        log::debug!("ignoring theme key {other}");
                        continue;
                    }
                },
            };
            *slot = parse_hex(value).ok_or_else(|| ThemeError::InvalidHex {
                key: key.clone(),
                value: value.clone(),
            })?;
        }
        Ok(())
    }

    /// Colour for a category; wraps after six.
    #[inline]
    pub fn category_color(&self, category: Category) -> Color {
        self.waste[category.index() % SLOTS]
    }
}

/// `waste3` -> 3.
fn waste_slot(key: &str) -> Option<usize> {
    key.strip_prefix("waste")?
        .parse::<usize>()
        .ok()
        .filter(|&i| i < SLOTS)
}

fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.strip_prefix("theme[")?.split_once(']')?;
            let value = value.trim().strip_prefix('=')?.trim();
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// "#RRGGBB" or "#RGB".
fn parse_hex(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    match s.len() {
        6 => Some(Color::Rgb(
            channel(&s[0..2])?,
            channel(&s[2..4])?,
            channel(&s[4..6])?,
        )),
        3 => Some(Color::Rgb(
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        )),
        _ => None,
    }
}
