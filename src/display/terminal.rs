use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::clock::FrameClock;
use super::DrawMode;
use crate::color::ColorCycler;
use crate::config::{self, Config, SavedSweep};
use crate::controls::{self, EntryTarget, EntryValue, InputField};
use crate::ipc::{self, IpcCommand};
use crate::visualizer::{BrailleCanvas, SegmentBuffer, SweepController, SweepPhase, Viewport};

pub async fn run(
    config: Config,
    config_path: Option<PathBuf>,
    ipc_rx: Option<mpsc::Receiver<IpcCommand>>,
) -> Result<()> {
    let app = TerminalApp::new(&config, config_path)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, app, config.display.fps, ipc_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: TerminalApp,
    fps: u32,
    mut ipc_rx: Option<mpsc::Receiver<IpcCommand>>,
) -> Result<()> {
    let frame_budget = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

    while !app.should_quit() {
        // Socket commands are applied here so every mutation stays on this task
        if let Some(rx) = ipc_rx.as_mut() {
            while let Ok(cmd) = rx.try_recv() {
                ipc::process_ipc_command(cmd, &mut app.controller, &mut app.surface);
            }
        }

        app.advance(Instant::now());

        terminal.draw(|frame| app.render(frame))?;

        if event::poll(frame_budget)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }
    }

    info!(
        "Exiting at multiplier {:.3} with {} chords on screen",
        app.controller().state().multiplier,
        app.surface().len()
    );
    Ok(())
}

/// Everything the terminal front-end owns: the controller, the chords it
/// has emitted, the frame clock and any half-typed input.
pub struct TerminalApp {
    controller: SweepController,
    surface: SegmentBuffer,
    clock: FrameClock,
    draw_mode: DrawMode,
    input: Option<InputField>,
    message: Option<String>,
    outline: (u8, u8, u8),
    show_status: bool,
    save_path: Option<PathBuf>,
    should_quit: bool,
}

impl TerminalApp {
    pub fn new(config: &Config, save_path: Option<PathBuf>) -> Result<Self> {
        let controller = SweepController::new(
            config.circle(),
            config.initial_state(),
            ColorCycler::new(config.sweep.color_mode, config.sweep.seed),
        )?;
        Ok(Self {
            controller,
            surface: SegmentBuffer::new(),
            clock: FrameClock::new(),
            draw_mode: config.sweep.draw_mode,
            input: None,
            message: None,
            outline: config.display.outline_color.as_tuple(),
            show_status: config.display.show_status,
            save_path,
            should_quit: false,
        })
    }

    pub fn controller(&self) -> &SweepController {
        &self.controller
    }

    pub fn surface(&self) -> &SegmentBuffer {
        &self.surface
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run whatever sweep work the frame clock allows at `now`.
    pub fn advance(&mut self, now: Instant) {
        let state = self.controller.state();
        if !self.clock.tick(now, state.interval_millis, state.paused) {
            return;
        }

        match self.draw_mode {
            DrawMode::Revolution => {
                // Single steps may have left the cursor mid-lap
                if self.controller.state().current_point != 0 {
                    self.controller.rewind();
                }
                self.controller.clear(&mut self.surface);
                self.controller.draw_full_sweep(&mut self.surface);
            }
            DrawMode::Chord => {
                if self.controller.state().current_point == 0 {
                    self.controller.clear(&mut self.surface);
                }
                self.controller.step(&mut self.surface);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.input.is_some() {
            self.handle_entry_key(key);
            return;
        }

        match key {
            KeyEvent {
                code: KeyCode::Char('q'),
                ..
            }
            | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            } => {
                self.should_quit = true;
            }
            KeyEvent {
                code: KeyCode::Char(' '),
                ..
            } => {
                let paused = self.controller.toggle_pause();
                if !paused {
                    self.clock.reset();
                }
                self.message = Some(if paused { "Paused" } else { "Running" }.to_string());
            }
            KeyEvent {
                code: KeyCode::Char('c'),
                ..
            } => {
                self.controller.clear(&mut self.surface);
            }
            KeyEvent {
                code: KeyCode::Char('s'),
                ..
            } => {
                self.controller.step(&mut self.surface);
            }
            KeyEvent {
                code: KeyCode::Char('+') | KeyCode::Char('='),
                ..
            } => self.nudge_interval(1),
            KeyEvent {
                code: KeyCode::Char('-'),
                ..
            } => self.nudge_interval(-1),
            KeyEvent {
                code: KeyCode::Char(']'),
                ..
            } => self.nudge_increment(1),
            KeyEvent {
                code: KeyCode::Char('['),
                ..
            } => self.nudge_increment(-1),
            KeyEvent {
                code: KeyCode::Char('m'),
                ..
            } => {
                self.input = Some(InputField::new(EntryTarget::Multiplier));
            }
            KeyEvent {
                code: KeyCode::Char('n'),
                ..
            } => {
                self.input = Some(InputField::new(EntryTarget::NumPoints));
            }
            KeyEvent {
                code: KeyCode::Char('k'),
                ..
            } => {
                let colors = self.controller.colors_mut();
                let mode = colors.mode().next();
                colors.set_mode(mode);
                self.message = Some(format!("Colour mode: {}", mode));
            }
            KeyEvent {
                code: KeyCode::Char('w'),
                ..
            } => self.save_settings(),
            _ => {}
        }
    }

    fn handle_entry_key(&mut self, key: KeyEvent) {
        let Some(field) = self.input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.input = None;
            }
            KeyCode::Backspace => field.backspace(),
            KeyCode::Char(ch) => field.push(ch),
            KeyCode::Enter => {
                let result = field.submit();
                let label = field.target().label();
                self.input = None;
                match result {
                    Ok(value) => self.apply_entry(value),
                    Err(e) => {
                        warn!("Invalid {}: {}", label.to_lowercase(), e);
                        self.message = Some(format!("Invalid number given: {}", e));
                    }
                }
            }
            _ => {}
        }
    }

    fn apply_entry(&mut self, value: EntryValue) {
        let result = match value {
            EntryValue::Multiplier(m) => self.controller.set_multiplier(m),
            EntryValue::NumPoints(n) => self.controller.set_num_points(n),
        };
        self.message = Some(match result {
            Ok(()) => match value {
                EntryValue::Multiplier(m) => format!("Times table {}", m),
                EntryValue::NumPoints(n) => format!("{} points", n),
            },
            Err(e) => {
                warn!("{}", e);
                format!("Rejected: {}", e)
            }
        });
    }

    fn nudge_interval(&mut self, notches: i64) {
        let millis = controls::step_interval(self.controller.state().interval_millis, notches);
        self.controller.set_interval_time(millis);
        self.message = Some(format!("Drawing speed {} ms", millis));
    }

    fn nudge_increment(&mut self, notches: i32) {
        let step = controls::step_increment(self.controller.state().multiplier_increment, notches);
        self.message = Some(match self.controller.set_mult_increment(step) {
            Ok(()) => format!("Multiplier step {:.2}", step),
            Err(e) => {
                warn!("{}", e);
                format!("Rejected: {}", e)
            }
        });
    }

    fn save_settings(&mut self) {
        let Some(path) = self.save_path.clone().or_else(Config::default_path) else {
            self.message = Some("No config directory to save to".to_string());
            return;
        };
        let state = self.controller.state();
        let saved = SavedSweep {
            num_points: state.num_points,
            multiplier: state.multiplier,
            multiplier_increment: state.multiplier_increment,
            interval_ms: state.interval_millis,
            color_mode: self.controller.colors().mode(),
        };
        self.message = Some(match config::save_sweep_settings(&path, &saved) {
            Ok(()) => {
                info!("Saved settings to {}", path.display());
                format!("Saved to {}", path.display())
            }
            Err(e) => {
                warn!("Failed to save settings: {:#}", e);
                format!("Save failed: {}", e)
            }
        });
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with transparent/reset background for terminal transparency support
        let block = ratatui::widgets::Block::default().style(Style::default().bg(Color::Reset));
        frame.render_widget(block, area);

        let status_height = if self.show_status { 1 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(status_height)])
            .split(area);
        let (canvas_area, status_area) = (chunks[0], chunks[1]);

        if canvas_area.width > 0 && canvas_area.height > 0 {
            let mut canvas =
                BrailleCanvas::new(canvas_area.width as usize, canvas_area.height as usize);
            let viewport = Viewport::new(self.controller.circle(), canvas.grid_w, canvas.grid_h);
            let (cx, cy) = viewport.grid_center();
            canvas.circle(cx, cy, viewport.grid_radius(), self.outline);
            if !self.surface.is_empty() {
                canvas.segments(self.surface.segments(), &viewport);
            }
            canvas.render(frame.buffer_mut(), canvas_area);
        }

        if self.show_status {
            self.render_status(frame, status_area);
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (text, color) = match &self.input {
            Some(field) => (
                format!(" {}: {}_  [enter] apply [esc] cancel ", field.target().label(), field.text()),
                Color::Yellow,
            ),
            None => {
                let state = self.controller.state();
                let mut text = format!(
                    " [space] {} | x{:.2} step {:.2} [/] | {} pts [n] | [m]ult | {} ms +/- | [c]lear [k]olor {} [w]rite [q]uit ",
                    match self.controller.phase() {
                        SweepPhase::Paused => "resume",
                        SweepPhase::Running => "pause",
                    },
                    state.multiplier,
                    state.multiplier_increment,
                    state.num_points,
                    state.interval_millis,
                    self.controller.colors().mode(),
                );
                if let Some(message) = &self.message {
                    text.push_str(&format!("| {} ", message));
                }
                (text, Color::DarkGray)
            }
        };

        for (i, ch) in text.chars().enumerate() {
            if i >= area.width as usize {
                break;
            }
            if let Some(cell) = frame.buffer_mut().cell_mut((area.x + i as u16, area.y)) {
                cell.set_char(ch);
                cell.set_fg(color);
            }
        }
    }
}
