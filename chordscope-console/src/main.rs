// chordscope-console/src/main.rs

//! Console frontend for chordscope.
//!
//! The main thread owns the terminal: it polls keys, drains analysis frames
//! from the worker and redraws the current mode. The worker thread owns the
//! audio streams and the shared queue (see [`worker`]).

mod cli;
mod config;
mod ui;
mod worker;

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chordscope_core::audio;
use chordscope_core::spectrum::SpectrumLayout;
use chordscope_core::AnalysisResult;
use clap::Parser;
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use cli::Cli;
use config::{Config, Settings};
use ui::{Screen, ViewState};
use worker::{AnalysisWorker, WorkerEvent};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::resolve_config_path(cli.config.as_deref());
    let (file_config, load_error) = match config_path.as_deref().map(config::load_config) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (Config::default(), Some(e)),
        None => (Config::default(), None),
    };
    let settings = Settings::merge(&cli, file_config);

    init_logging(settings.log_file.as_deref())?;

    if let Some(e) = load_error {
        log::error!("Failed to load config: {:#}", e);
        return Err(e);
    }
    if let Some(path) = &config_path {
        log::info!("Loaded config from {}", path.display());
    }

    if cli.list_devices {
        return print_devices();
    }

    settings.validate()?;
    log::info!("chordscope starting in {} mode", settings.mode.label());
    log::debug!("Settings: {:?}", settings);

    run(settings)
}

/// Logs to stderr, or to `log_file` so log lines stay off the display.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    builder.format_timestamp_millis();
    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn print_devices() -> Result<()> {
    let (inputs, outputs) = audio::list_devices()?;
    println!("Input devices:");
    for name in &inputs {
        println!("  {}", name);
    }
    println!("Output devices:");
    for name in &outputs {
        println!("  {}", name);
    }
    Ok(())
}

fn run(settings: Settings) -> Result<()> {
    let (events_tx, events_rx) = crossbeam_channel::bounded(4);
    let worker = AnalysisWorker::spawn(&settings, events_tx)?;

    let mut view = ViewState::from_settings(&settings);
    let refresh = Duration::from_millis(settings.refresh_ms);

    // The screen is dropped, restoring the terminal, before any error surfaces.
    let outcome = Screen::enter().and_then(|mut screen| render_loop(&mut screen, &mut view, &events_rx, refresh));

    drop(events_rx);
    worker.shutdown();
    log::info!("chordscope finished");
    outcome
}

enum KeyAction {
    Quit,
    NextMode,
    ToggleAdaptive,
    Ignore,
}

fn key_action(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    match code {
        KeyCode::Char('x') | KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('m') => KeyAction::NextMode,
        KeyCode::Char('a') => KeyAction::ToggleAdaptive,
        _ => KeyAction::Ignore,
    }
}

fn render_loop(
    screen: &mut Screen,
    view: &mut ViewState,
    events_rx: &Receiver<WorkerEvent>,
    refresh: Duration,
) -> Result<()> {
    let mut layout: Option<SpectrumLayout> = None;
    let mut latest: Option<AnalysisResult> = None;

    loop {
        if event::poll(refresh)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key_action(key.code, key.modifiers) {
                        KeyAction::Quit => {
                            log::info!("Quit requested");
                            return Ok(());
                        }
                        KeyAction::NextMode => view.next_mode(),
                        KeyAction::ToggleAdaptive => view.toggle_adaptive(),
                        KeyAction::Ignore => {}
                    }
                }
            }
        }

        loop {
            match events_rx.try_recv() {
                Ok(WorkerEvent::Started { layout: started }) => layout = Some(started),
                Ok(WorkerEvent::Frame(result)) => latest = Some(result),
                Ok(WorkerEvent::Failed(message)) => bail!(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => bail!("analysis worker stopped unexpectedly"),
            }
        }

        let (columns, rows) = screen.size();
        // Writing the last column would wrap the line.
        let width = columns.saturating_sub(1).max(1);
        let lines = match (&layout, &latest) {
            (Some(layout), Some(result)) => ui::compose(view, layout, result, width, rows),
            _ => ui::compose_waiting(view),
        };
        screen.draw(&lines)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_keys() {
        for code in [KeyCode::Char('x'), KeyCode::Char('q'), KeyCode::Esc] {
            assert!(matches!(key_action(code, KeyModifiers::NONE), KeyAction::Quit));
        }
        assert!(matches!(
            key_action(KeyCode::Char('c'), KeyModifiers::CONTROL),
            KeyAction::Quit
        ));
        assert!(matches!(
            key_action(KeyCode::Char('c'), KeyModifiers::NONE),
            KeyAction::Ignore
        ));
    }

    #[test]
    fn mode_and_adaptive_keys() {
        assert!(matches!(key_action(KeyCode::Char('m'), KeyModifiers::NONE), KeyAction::NextMode));
        assert!(matches!(
            key_action(KeyCode::Char('a'), KeyModifiers::NONE),
            KeyAction::ToggleAdaptive
        ));
    }
}
