//! # Console Rendering
//!
//! Turns analysis frames into text lines for the current mode, and owns the
//! terminal while the analyzer runs (raw mode, alternate screen, hidden
//! cursor; all restored on drop).

pub mod bargraph;
pub mod chord_view;
pub mod spectrum_view;
pub mod tuner_view;

use std::io::{self, Stdout, Write};

use anyhow::Result;
use chordscope_core::spectrum::SpectrumLayout;
use chordscope_core::AnalysisResult;
use crossterm::{
    cursor, execute, queue,
    style::Print,
    terminal::{self, ClearType},
};

use crate::cli::Mode;
use crate::config::Settings;
use bargraph::{adaptive_scale, render_bargraph};
use spectrum_view::{spectrum_bars, Axis};

/// Display state the keys can change.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub mode: Mode,
    pub adaptive: bool,
    pub graph_scale: f32,
    pub freq_range: (f32, f32),
}

impl ViewState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            mode: settings.mode,
            adaptive: settings.adaptive,
            graph_scale: settings.graph_scale,
            freq_range: (settings.min_freq as f32, settings.max_freq as f32),
        }
    }

    pub fn next_mode(&mut self) {
        self.mode = self.mode.next();
        log::info!("Switched to {} mode", self.mode.label());
    }

    pub fn toggle_adaptive(&mut self) {
        self.adaptive = !self.adaptive;
        log::info!("Adaptive scaling {}", if self.adaptive { "on" } else { "off" });
    }

    fn status_line(&self) -> String {
        format!(
            "chordscope | {} | adaptive {} | x quit  m mode  a adaptive",
            self.mode.label(),
            if self.adaptive { "on" } else { "off" }
        )
    }

    /// Vertical scale for a bar graph: fixed, or fitted to the tallest bar.
    fn vscale(&self, bars: &[i32], height: usize) -> f32 {
        let scale = if self.adaptive {
            adaptive_scale(bars).unwrap_or(self.graph_scale)
        } else {
            self.graph_scale
        };
        scale * height as f32
    }
}

/// Lines shown before the first full analysis window is available.
pub fn compose_waiting(view: &ViewState) -> Vec<String> {
    vec![view.status_line(), "Filling audio buffer...".to_string()]
}

/// Lines for one frame of `view.mode`, at most `height` of them.
pub fn compose(
    view: &ViewState,
    layout: &SpectrumLayout,
    result: &AnalysisResult,
    width: usize,
    height: usize,
) -> Vec<String> {
    let mut lines = vec![view.status_line()];
    // Status line and base line.
    let graph_height = height.saturating_sub(2);

    match view.mode {
        Mode::Semilog | Mode::Linear | Mode::Loglog => {
            let (axis, smoothed) = match view.mode {
                Mode::Linear => (Axis::Linear, true),
                Mode::Loglog => (Axis::Logarithmic, false),
                _ => (Axis::Logarithmic, true),
            };
            let bars = spectrum_bars(&result.spectrum, layout, axis, smoothed, view.freq_range, width);
            let vscale = view.vscale(&bars, graph_height);
            lines.extend(render_bargraph(&bars, graph_height, vscale, ':'));
        }
        Mode::Tuner => {
            let graph_height = graph_height.saturating_sub(1);
            let bars = tuner_view::wrap_octave(&result.spectrum, layout, width);
            let vscale = view.vscale(&bars, graph_height);
            lines.push(tuner_view::note_header(width));
            lines.extend(render_bargraph(&bars, graph_height, vscale, '='));
        }
        Mode::Autotune => {
            lines.push(String::new());
            lines.push(tuner_view::autotune_line(result.pitch.as_ref(), width));
            if let Some(pitch) = &result.pitch {
                lines.push(tuner_view::pitch_readout(pitch));
            }
        }
        Mode::Chords => {
            lines.push(String::new());
            lines.push(chord_view::chord_line(result.chord.as_ref()));
        }
    }

    lines.truncate(height.max(1));
    lines
}

/// The terminal, held in raw mode on the alternate screen.
pub struct Screen {
    stdout: Stdout,
}

impl Screen {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { stdout })
    }

    /// Current size as `(columns, rows)`.
    pub fn size(&self) -> (usize, usize) {
        let (columns, rows) = terminal::size().unwrap_or((80, 24));
        (columns as usize, rows as usize)
    }

    pub fn draw(&mut self, lines: &[String]) -> Result<()> {
        queue!(self.stdout, terminal::Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            queue!(self.stdout, cursor::MoveTo(0, row as u16), Print(line))?;
        }
        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen) {
            log::error!("Error restoring terminal: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("Error leaving raw mode: {}", e);
        }
    }
}
