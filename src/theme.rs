//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Number of values with their own tile colour (2 through 2048).
pub const TILE_STEPS: usize = 11;

/// Tile and UI colours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Tile colours for 2, 4, 8, … 2048 (index = log2(value) − 1).
    pub tiles: [Color; TILE_STEPS],
    /// Tiles above 2048.
    pub tile_big: Color,
    /// Label colour on light tiles (2 and 4).
    pub text_dark: Color,
    /// Label colour on everything else.
    pub text_light: Color,
    /// Playfield background.
    pub bg: Color,
    /// Grid lines inside the playfield.
    pub grid: Color,
    /// Borders.
    pub div_line: Color,
    /// Text (score, counters).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// The warm beige 2048 palette.
    pub fn classic() -> Self {
        Self {
            tiles: [
                Color::Rgb(238, 228, 218), // 2
                Color::Rgb(237, 224, 200), // 4
                Color::Rgb(242, 177, 121), // 8
                Color::Rgb(245, 149, 99),  // 16
                Color::Rgb(246, 124, 95),  // 32
                Color::Rgb(246, 94, 59),   // 64
                Color::Rgb(237, 207, 114), // 128
                Color::Rgb(237, 204, 97),  // 256
                Color::Rgb(237, 200, 80),  // 512
                Color::Rgb(237, 197, 63),  // 1024
                Color::Rgb(237, 194, 46),  // 2048
            ],
            tile_big: Color::Rgb(60, 58, 50),
            text_dark: Color::Rgb(119, 110, 101),
            text_light: Color::Rgb(249, 246, 242),
            bg: Color::Rgb(187, 173, 160),
            grid: Color::Rgb(205, 193, 180),
            div_line: Color::Rgb(143, 122, 102),
            main_fg: Color::Rgb(119, 110, 101),
            title: Color::Rgb(119, 110, 101),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the classic palette if path is None or the file is missing.
    /// Keys that are absent or unparsable keep their classic colour.
    pub fn load(path: Option<&Path>) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                log::warn!("theme file {} not found, using classic palette", p.display());
                return Ok(Self::default());
            }
            None => return Ok(Self::default()),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        log::info!("loaded {} theme keys from {}", map.len(), path.display());
        Ok(Self::from_map(&map))
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str, fallback: Color| {
            map.get(key)
                .and_then(|v| parse_hex(v).ok())
                .unwrap_or(fallback)
        };
        let base = Self::classic();
        let mut tiles = base.tiles;
        for (i, tile) in tiles.iter_mut().enumerate() {
            *tile = get(&format!("tile_{}", 2u32 << i), *tile);
        }
        Self {
            tiles,
            tile_big: get("tile_big", base.tile_big),
            text_dark: get("text_dark", base.text_dark),
            text_light: get("text_light", base.text_light),
            bg: get("bg", base.bg),
            grid: get("grid", base.grid),
            div_line: get("div_line", base.div_line),
            main_fg: get("main_fg", base.main_fg),
            title: get("title", base.title),
        }
    }

    /// Tile colour for a block value.
    pub fn tile_color(&self, value: u32) -> Color {
        let step = value.max(2).trailing_zeros() as usize;
        self.tiles.get(step - 1).copied().unwrap_or(self.tile_big)
    }

    /// Label colour for a block value: dark on the two lightest tiles.
    pub fn label_color(&self, value: u32) -> Color {
        if value <= 4 {
            self.text_dark
        } else {
            self.text_light
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        s.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(|| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = if s.len() == 6 {
        (channel(0..2)?, channel(2..4)?, channel(4..6)?)
    } else if s.len() == 3 {
        (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17)
    } else {
        return Err(ThemeError::InvalidHex(s.to_string()));
    };
    Ok(Color::Rgb(r, g, b))
}

/// Approximate RGB for a ratatui colour.
fn rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        Color::Black => (0, 0, 0),
        _ => (128, 128, 128),
    }
}

/// Mix `fg` over `bg` with opacity `alpha` (0 = all bg, 255 = all fg).
pub fn blend(fg: Color, bg: Color, alpha: u8) -> Color {
    if alpha == u8::MAX {
        return fg;
    }
    let (fr, fg_, fb) = rgb(fg);
    let (br, bg_, bb) = rgb(bg);
    let a = f32::from(alpha) / 255.0;
    let mix = |f: u8, b: u8| (f32::from(b) + (f32::from(f) - f32::from(b)) * a).round() as u8;
    Color::Rgb(mix(fr, br), mix(fg_, bg_), mix(fb, bb))
}
