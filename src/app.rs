//! App: terminal init, main loop, frame stepping and input handling.

use crate::input::{Action, key_to_action, mouse_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use mergefall::GameState;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Longest elapsed time fed to one simulation step; longer stalls are cut short.
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
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

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    quit_selected: QuitOption,
    /// Best score across restarts in this session.
    best_score: u64,
    /// Restarts so far; each one reseeds from the base seed.
    restarts: u64,
    /// Board is fading out before a restart.
    restarting: bool,
    /// TachyonFX fade for the restart (created by the ui when the fade starts).
    restart_effect: Option<Effect>,
    /// Last time the restart effect was processed (for delta).
    restart_effect_time: Option<Instant>,
    last_frame: Instant,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Self {
        let state = GameState::new(config.seed);
        Self {
            args,
            config,
            theme,
            state,
            screen: Screen::Playing,
            paused: false,
            quit_selected: QuitOption::Resume,
            best_score: 0,
            restarts: 0,
            restarting: false,
            restart_effect: None,
            restart_effect_time: None,
            last_frame: Instant::now(),
        }
    }

    fn begin_restart(&mut self) {
        self.screen = Screen::Playing;
        self.paused = false;
        if self.args.no_animation {
            self.finish_restart();
        } else {
            self.restarting = true;
        }
    }

    fn finish_restart(&mut self) {
        self.restarts += 1;
        let seed = self.config.seed.wrapping_add(self.restarts);
        log::info!(
            "restart #{}: final score {}, new seed {}",
            self.restarts,
            self.state.score(),
            seed
        );
        self.state = GameState::new(seed);
        self.restarting = false;
        self.restart_effect = None;
        self.restart_effect_time = None;
    }

    /// Returns true when the app should exit.
    fn apply_action(&mut self, action: Action) -> bool {
        match self.screen {
            Screen::Playing => match action {
                Action::Spawn if !self.paused && !self.restarting => {
                    self.state.spawn_batch(self.config.spawn_count);
                }
                Action::Pause => self.paused = !self.paused,
                Action::Restart if !self.restarting => self.begin_restart(),
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
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.begin_restart(),
                    QuitOption::Exit => return true,
                },
                Action::Pause | Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
        }
        false
    }

    fn handle_event(&mut self, event: Event) -> bool {
        let action = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => key_to_action(key),
            Event::Mouse(mouse) => mouse_to_action(mouse),
            _ => Action::None,
        };
        self.apply_action(action)
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

        log::info!(
            "session over: score {}, best {}, merges {}",
            self.state.score(),
            self.best_score.max(self.state.score()),
            self.state.merges()
        );
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        self.last_frame = Instant::now();

        loop {
            // Drain input once per frame, waiting at most until the next frame is due.
            let timeout = frame_duration.saturating_sub(self.last_frame.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if self.handle_event(event::read()?) {
                        return Ok(());
                    }
                }
            }

            let now = Instant::now();
            let dt = now
                .saturating_duration_since(self.last_frame)
                .as_secs_f32()
                .min(MAX_FRAME_DT);
            self.last_frame = now;

            if self.screen == Screen::Playing && !self.paused && !self.restarting {
                let report = self.state.step(dt);
                if report.merges > 0 {
                    log::debug!(
                        "{} merges (+{}), score {}",
                        report.merges,
                        report.points,
                        self.state.score()
                    );
                }
                if report.escaped > 0 {
                    log::trace!("{} blocks left the field", report.escaped);
                }
                self.best_score = self.best_score.max(self.state.score());
            }

            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    self.best_score,
                    self.args.no_animation,
                    self.restarting,
                    &mut self.restart_effect,
                    &mut self.restart_effect_time,
                    now,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                );
            })?;

            if self.restarting && self.restart_effect.as_ref().is_some_and(Effect::done) {
                self.finish_restart();
            }
        }
    }
}
