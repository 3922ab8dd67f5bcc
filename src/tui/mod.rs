//! Ratatui-based terminal UI.
//!
//! The TUI is a cell browser: one notebook cell at a time, with its chart on
//! the left and its report on the right. Settings changes re-run the cell.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Terminal,
};

use crate::app::pipeline::{run_cell, CellOutput, NotebookRun};
use crate::cli::NotebookArgs;
use crate::domain::{CellKind, CurveShape, NotebookConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{curve_color, CellChart};

/// Noise levels cycled by the `n` key.
const NOISE_LEVELS: [f64; 5] = [0.1, 0.25, 0.5, 1.0, 2.0];
const SAMPLE_STEP: usize = 10;
const MIN_SAMPLES: usize = 10;

/// Start the TUI.
pub fn run(args: NotebookArgs) -> Result<(), AppError> {
    let config = crate::app::config_from_args(&args);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: NotebookConfig,
    cell: CellKind,
    output: Option<CellOutput>,
    status: String,
}

impl App {
    fn new(config: NotebookConfig) -> Self {
        let mut app = Self {
            config,
            cell: CellKind::Ftest,
            output: None,
            status: String::new(),
        };
        app.rerun();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::io(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                self.cell = self.cell.next();
                self.rerun();
            }
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                self.cell = self.cell.prev();
                self.rerun();
            }
            KeyCode::Char('r') => {
                self.config.sample_seed = self.config.sample_seed.wrapping_add(1);
                self.rerun();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.config.sample_count = self.config.sample_count.saturating_add(SAMPLE_STEP);
                self.rerun();
            }
            KeyCode::Char('-') => {
                self.config.sample_count = self
                    .config
                    .sample_count
                    .saturating_sub(SAMPLE_STEP)
                    .max(MIN_SAMPLES);
                self.rerun();
            }
            KeyCode::Char('n') => {
                self.config.noise = next_noise(self.config.noise);
                self.rerun();
            }
            KeyCode::Char('s') => {
                self.config.curve_shape = match self.config.curve_shape {
                    CurveShape::ExpDecay => CurveShape::Gaussian,
                    CurveShape::Gaussian => CurveShape::ExpDecay,
                };
                self.rerun();
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    /// Recompute the current cell. Failures land in the status line.
    fn rerun(&mut self) {
        match run_cell(self.cell, &self.config) {
            Ok(output) => {
                self.output = Some(output);
                self.status = format!("{} ok", self.cell.display_name());
            }
            Err(err) => {
                self.output = None;
                self.status = format!("{} failed: {err}", self.cell.display_name());
            }
        }
    }

    fn write_debug(&mut self) {
        let Some(output) = &self.output else {
            self.status = "Nothing to write: the current cell failed.".to_string();
            return;
        };
        let run = NotebookRun {
            seed: self.config.sample_seed,
            sample_count: self.config.sample_count,
            noise: self.config.noise,
            cells: vec![output.clone()],
        };
        self.status = match crate::debug::write_debug_bundle(&run, &self.config) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let position = CellKind::ALL.iter().position(|&c| c == self.cell).unwrap_or(0) + 1;
        let lines = vec![
            Line::from(vec![
                Span::styled("nb", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " | cell {position}/{}: ",
                    CellKind::ALL.len()
                )),
                Span::styled(
                    self.cell.display_name(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    "seed: {} | samples: {} | noise: {} | shape: {:?} | max degree: {} | threshold: {}",
                    self.config.sample_seed,
                    self.config.sample_count,
                    self.config.noise,
                    self.config.curve_shape,
                    self.config.max_degree,
                    self.config.ftest_threshold,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_report(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some(output) = &self.output else {
            let block = Block::default().title("Chart").borders(Borders::ALL);
            let msg = Paragraph::new("No output for this cell.")
                .style(Style::default().fg(Color::Yellow))
                .block(block);
            frame.render_widget(msg, area);
            return;
        };

        let plot = output.plot();
        let block = Block::default()
            .title(legend_line(&plot))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);
        frame.render_widget(CellChart::new(&plot), inner);
    }

    fn draw_report(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.output {
            Some(output) => crate::report::format_cell(output),
            None => self.status.clone(),
        };
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Report").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ cell  r reseed  +/- samples  n noise  s shape  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart title: plot title followed by a colored key per curve.
fn legend_line(plot: &crate::domain::CellPlot) -> Line<'static> {
    let mut spans = vec![Span::raw(format!(" {} ", plot.title))];
    if !plot.points.is_empty() {
        spans.push(Span::styled("· data ", Style::default().fg(Color::White)));
    }
    for (i, curve) in plot.curves.iter().enumerate() {
        spans.push(Span::styled(
            format!("- {} ", curve.label),
            Style::default().fg(curve_color(i)),
        ));
    }
    Line::from(spans)
}

fn next_noise(current: f64) -> f64 {
    NOISE_LEVELS
        .iter()
        .copied()
        .find(|&level| level > current + 1e-12)
        .unwrap_or(NOISE_LEVELS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(NotebookConfig {
            sample_count: 40,
            ..NotebookConfig::default()
        })
    }

    #[test]
    fn noise_cycles_and_wraps() {
        assert_eq!(next_noise(0.1), 0.25);
        assert_eq!(next_noise(0.3), 0.5);
        assert_eq!(next_noise(2.0), 0.1);
    }

    #[test]
    fn arrow_keys_walk_the_cells() {
        let mut app = app();
        assert_eq!(app.cell, CellKind::Ftest);
        assert!(app.output.is_some());
        assert!(!app.handle_key(KeyCode::Right));
        assert_eq!(app.cell, CellKind::Roots);
        assert_eq!(app.output.as_ref().map(|o| o.kind()), Some(CellKind::Roots));
        app.handle_key(KeyCode::Left);
        assert_eq!(app.cell, CellKind::Ftest);
    }

    #[test]
    fn sample_count_has_a_floor() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_key(KeyCode::Char('-'));
        }
        assert_eq!(app.config.sample_count, MIN_SAMPLES);
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
