//! Layout and drawing: playfield, blocks, merge animations, sidebar, pause and quit overlays.

use crate::app::{QuitOption, Screen};
use crate::theme::{Theme, blend};
use glam::Vec2;
use mergefall::GameState;
use mergefall::animation::{MergeFrame, Sprite};
use mergefall::game::{BLOCK_SIZE, GRID_COLUMNS, GRID_ROWS, GRID_SIZE, PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 24;
/// Smallest board (terminal columns) worth drawing.
const MIN_BOARD_COLS: u16 = 24;
/// Duration of the restart fade (TachyonFX) in ms.
const RESTART_FADE_MS: u32 = 400;

/// Board size in terminal cells for the given area (inner, no border).
///
/// Each terminal cell shows two stacked pixels (▀), so a 2:1 playfield
/// needs four columns per row. Returns None when the board would be too small.
fn board_size(area: Rect) -> Option<(u16, u16)> {
    let max_w = area.width.saturating_sub(2 + SIDEBAR_WIDTH);
    let max_h = area.height.saturating_sub(2);
    let cols = max_w.min(max_h.saturating_mul(4));
    let cols = cols - cols % 4;
    (cols >= MIN_BOARD_COLS).then_some((cols, cols / 4))
}

/// Offscreen pixel grid: one column per terminal column, two rows per terminal row.
struct Raster {
    cols: usize,
    rows: usize,
    /// Playfield pixels per raster pixel (same on both axes).
    scale: f32,
    px: Vec<Color>,
}

impl Raster {
    fn new(cols: u16, term_rows: u16, bg: Color) -> Self {
        let (cols, rows) = (cols as usize, term_rows as usize * 2);
        Self {
            cols,
            rows,
            scale: PLAYFIELD_WIDTH / cols as f32,
            px: vec![bg; cols * rows],
        }
    }

    /// Raster cells covered by the playfield interval [start, start + len).
    fn span(&self, start: f32, len: f32, limit: usize) -> std::ops::Range<usize> {
        let lo = (start / self.scale).floor().clamp(0.0, limit as f32) as usize;
        let hi = ((start + len) / self.scale).ceil().clamp(0.0, limit as f32) as usize;
        lo..hi.max(lo)
    }

    fn grid(&mut self, color: Color) {
        for k in 0..=GRID_COLUMNS {
            let x = (k as f32 * GRID_SIZE / self.scale) as usize;
            if x < self.cols {
                for y in 0..self.rows {
                    self.px[y * self.cols + x] = color;
                }
            }
        }
        for k in 0..=GRID_ROWS {
            let y = (k as f32 * GRID_SIZE / self.scale) as usize;
            if y < self.rows {
                for x in 0..self.cols {
                    self.px[y * self.cols + x] = color;
                }
            }
        }
    }

    /// Paint a square, mixing with what is underneath by `alpha`.
    fn square(&mut self, pos: Vec2, size: f32, color: Color, alpha: u8) {
        let xs = self.span(pos.x, size, self.cols);
        let ys = self.span(pos.y, size, self.rows);
        for y in ys {
            for x in xs.clone() {
                let p = &mut self.px[y * self.cols + x];
                *p = blend(color, *p, alpha);
            }
        }
    }

    fn get(&self, x: usize, y: usize) -> Option<Color> {
        (x < self.cols && y < self.rows).then(|| self.px[y * self.cols + x])
    }
}

/// Draw current screen, with optional pause overlay and quit menu.
/// While `restarting` (and animations are on), runs the TachyonFX fade over the board and
/// updates `restart_effect` / `restart_effect_time`.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    best_score: u64,
    no_animation: bool,
    restarting: bool,
    restart_effect: &mut Option<Effect>,
    restart_effect_time: &mut Option<Instant>,
    now: Instant,
    quit_selected: Option<QuitOption>,
) {
    let area = frame.area();
    let Some((cols, rows)) = board_size(area) else {
        draw_too_small(frame, theme, area);
        return;
    };

    let board_rect = draw_game(frame, state, theme, area, cols, rows, best_score, no_animation);

    if restarting && !no_animation {
        apply_restart_effect(frame, theme, board_rect, restart_effect, restart_effect_time, now);
    }
    if paused {
        draw_pause_overlay(frame, theme, area);
    }
    if screen == Screen::QuitMenu {
        if let Some(opt) = quit_selected {
            draw_quit_menu(frame, theme, opt);
        }
    }
}

/// Create or advance the restart fade (board fades to background colour).
fn apply_restart_effect(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    restart_effect: &mut Option<Effect>,
    restart_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = restart_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *restart_effect_time = Some(now);

    let effect = restart_effect.get_or_insert_with(|| {
        fx::fade_to(theme.bg, theme.bg, (RESTART_FADE_MS, Interpolation::Linear))
            .with_area(board_rect)
    });
    frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
}

fn draw_too_small(frame: &mut Frame, theme: &Theme, area: Rect) {
    let p = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(" Terminal too small ", Style::default().fg(theme.title).bold())),
        Line::from(Span::styled(" Q — Quit ", Style::default().fg(theme.main_fg))),
    ])
    .alignment(Alignment::Center);
    p.render(area, frame.buffer_mut());
}

/// Draw game: playfield + sidebar centered in the area. Returns the board rect (inside the border).
fn draw_game(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    cols: u16,
    rows: u16,
    best_score: u64,
    no_animation: bool,
) -> Rect {
    let (pw, ph) = (cols + 2, rows + 2);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);

    let board_rect = draw_playfield(frame, state, theme, inner[0], cols, rows, no_animation);
    draw_sidebar(frame, state, theme, inner[1], best_score);
    board_rect
}

fn draw_playfield(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    area: Rect,
    cols: u16,
    rows: u16,
    no_animation: bool,
) -> Rect {
    let title = format!(" Mergefall  | Score: {} ", state.score());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title).bold()));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: cols.min(inner.width),
        height: rows.min(inner.height),
    };

    let mut raster = Raster::new(cols, rows, theme.bg);
    raster.grid(theme.grid);

    let mut labels: Vec<(Vec2, u32)> = Vec::with_capacity(state.blocks().len());
    for b in state.blocks() {
        raster.square(b.pos, b.size(), theme.tile_color(b.value()), u8::MAX);
        labels.push((b.center(), b.value()));
    }

    if !no_animation {
        for animation in state.animations().iter() {
            let sprites: &[Sprite] = &match animation.frame() {
                MergeFrame::Converging(pair) => pair.to_vec(),
                MergeFrame::Revealing(s) => vec![s],
            };
            for s in sprites {
                raster.square(s.pos, s.size, theme.tile_color(s.value), s.alpha);
                if s.alpha >= 128 {
                    labels.push((s.pos + Vec2::splat(s.size / 2.0), s.value));
                }
            }
        }
    }

    // Two raster rows per terminal row: top pixel as fg, bottom pixel as bg.
    let buf = frame.buffer_mut();
    for ty in 0..board_rect.height {
        for tx in 0..board_rect.width {
            let (x, y) = (tx as usize, ty as usize * 2);
            let top = raster.get(x, y).unwrap_or(theme.bg);
            let bot = raster.get(x, y + 1).unwrap_or(theme.bg);
            buf[(board_rect.x + tx, board_rect.y + ty)]
                .set_symbol("▀")
                .set_style(Style::default().fg(top).bg(bot));
        }
    }

    // Value labels, only where they fit inside a block.
    let block_cols = BLOCK_SIZE / raster.scale;
    for (center, value) in labels {
        let label = value.to_string();
        if label.len() as f32 > block_cols {
            continue;
        }
        if center.x < 0.0 || center.y < 0.0 || center.x >= PLAYFIELD_WIDTH || center.y >= PLAYFIELD_HEIGHT {
            continue;
        }
        let cx = (center.x / raster.scale) as u16;
        let cy = (center.y / (raster.scale * 2.0)) as u16;
        let lx = cx.saturating_sub(label.len() as u16 / 2);
        if cy >= board_rect.height || lx + label.len() as u16 > board_rect.width {
            continue;
        }
        let style = Style::default()
            .fg(theme.label_color(value))
            .bg(theme.tile_color(value))
            .bold();
        buf.set_string(board_rect.x + lx, board_rect.y + cy, label, style);
    }

    board_rect
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, area: Rect, best_score: u64) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(4), // Tiles
            Constraint::Length(1), // gap
            Constraint::Length(7), // Keys
        ])
        .split(area);

    // --- Stats ---
    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let stat = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(label, title_style), Span::styled(value, fg_style)])
    };
    let stats_lines = vec![
        stat("Score: ", state.score().to_string()),
        stat("Best: ", best_score.max(state.score()).to_string()),
        stat("Merges: ", state.merges().to_string()),
        stat("Blocks: ", state.blocks().len().to_string()),
        stat("Top tile: ", state.best_tile().to_string()),
        stat("Animating: ", state.animations().len().to_string()),
        stat("Seed: ", state.seed().to_string()),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Tiles ---
    let tiles_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let tiles_inner = tiles_block.inner(chunks[2]);
    tiles_block.render(chunks[2], frame.buffer_mut());
    let tiles_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(tiles_inner);
    Paragraph::new(Line::from(Span::styled("Tiles", title_style)))
        .render(tiles_layout[0], frame.buffer_mut());
    draw_tile_strip(frame, theme, tiles_layout[1]);

    // --- Keys ---
    let keys_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let keys_inner = keys_block.inner(chunks[4]);
    keys_block.render(chunks[4], frame.buffer_mut());
    let keys = [
        ("Click/Space", "spawn"),
        ("P", "pause"),
        ("R", "restart"),
        ("Q/Esc", "quit"),
    ];
    let mut key_lines = vec![Line::from(Span::styled("Keys", title_style))];
    key_lines.extend(keys.iter().map(|(k, what)| {
        Line::from(vec![
            Span::styled(format!("{k:<12}"), title_style),
            Span::styled(*what, fg_style),
        ])
    }));
    Paragraph::new(key_lines).render(keys_inner, frame.buffer_mut());
}

/// One coloured cell per tile value, 2 on the left.
fn draw_tile_strip(frame: &mut Frame, theme: &Theme, area: Rect) {
    let n = theme.tiles.len() as u16;
    let w = (area.width / n).max(1);
    for (i, &c) in theme.tiles.iter().enumerate() {
        let x = area.x + i as u16 * w;
        if x >= area.x + area.width {
            break;
        }
        let r = Rect {
            x,
            y: area.y,
            width: w,
            height: area.height.min(1),
        };
        Paragraph::new("█").style(Style::default().fg(c).bg(c)).render(r, frame.buffer_mut());
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw.min(area.width),
        height: qh.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    // Clear background
    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default().fg(theme.bg).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.title)
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
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_board_size_keeps_aspect() {
        let (cols, rows) = board_size(Rect::new(0, 0, 200, 40)).unwrap();
        assert_eq!(cols % 4, 0);
        assert_eq!(cols, rows * 4);
        assert!(cols + 2 + SIDEBAR_WIDTH <= 200);
        assert!(rows + 2 <= 40);
    }

    #[test]
    fn test_board_size_too_small() {
        assert!(board_size(Rect::new(0, 0, 40, 10)).is_none());
    }

    #[test]
    fn test_raster_square_is_clipped() {
        let mut r = Raster::new(144, 36, Color::Black);
        assert!((r.scale - 10.0).abs() < f32::EPSILON);
        r.square(Vec2::new(-30.0, -30.0), 60.0, Color::White, 255);
        assert_eq!(r.get(0, 0), Some(Color::White));
        assert_eq!(r.get(2, 2), Some(Color::White));
        assert_eq!(r.get(3, 3), Some(Color::Black));
        // fully outside draws nothing
        r.square(Vec2::new(5000.0, 5000.0), 60.0, Color::Red, 255);
        assert!(r.px.iter().all(|&c| c != Color::Red));
    }

    #[test]
    fn test_draw_shows_score_and_labels() {
        let mut state = GameState::new(1);
        state
            .registry_mut()
            .insert(Vec2::new(130.0, 322.0), Vec2::ZERO, 16);
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(200, 50)).unwrap();
        let mut effect = None;
        let mut effect_time = None;
        terminal
            .draw(|f| {
                draw(
                    f,
                    Screen::Playing,
                    &state,
                    &theme,
                    false,
                    0,
                    false,
                    false,
                    &mut effect,
                    &mut effect_time,
                    Instant::now(),
                    None,
                );
            })
            .unwrap();
        let buf = terminal.backend().buffer();
        let text: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Score: 0"));
        assert!(text.contains("16"));
        assert!(effect.is_none());
    }
}
