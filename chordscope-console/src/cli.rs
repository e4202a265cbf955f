use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

/// What the console draws each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Spectrum on a logarithmic frequency axis, gaps smoothed
    #[default]
    Semilog,
    /// Spectrum on a linear frequency axis, gaps smoothed
    Linear,
    /// Spectrum on a logarithmic frequency axis, unsmoothed
    Loglog,
    /// One octave from A1 wrapped across the width, with note headers
    Tuner,
    /// Detected note positioned by its cent offset
    Autotune,
    /// Detected chord and its tones
    Chords,
}

impl Mode {
    pub const ALL: [Mode; 6] = [
        Mode::Semilog,
        Mode::Linear,
        Mode::Loglog,
        Mode::Tuner,
        Mode::Autotune,
        Mode::Chords,
    ];

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Mode {
        let index = Mode::ALL.iter().position(|&mode| mode == self).unwrap_or(0);
        Mode::ALL[(index + 1) % Mode::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Semilog => "semilog",
            Mode::Linear => "linear",
            Mode::Loglog => "log-log",
            Mode::Tuner => "spectral tuner",
            Mode::Autotune => "automatic tuner",
            Mode::Chords => "chord guesser",
        }
    }
}

pub const DEFAULT_MIN_FREQ: u32 = 50;
pub const DEFAULT_MAX_FREQ: u32 = 2000;
pub const DEFAULT_REFRESH_MS: u64 = 50;

#[derive(Parser, Debug)]
#[command(name = "chordscope", about = "Real-time console spectrum analyzer, tuner and chord guesser")]
pub struct Cli {
    /// Display mode
    #[arg(short, long, value_enum, default_value_t = Mode::Semilog)]
    pub mode: Mode,

    /// Lowest frequency shown by the spectrum modes (Hz, 20-10000)
    #[arg(long, default_value_t = DEFAULT_MIN_FREQ)]
    pub min_freq: u32,

    /// Highest frequency shown by the spectrum modes (Hz, up to 20000)
    #[arg(long, default_value_t = DEFAULT_MAX_FREQ)]
    pub max_freq: u32,

    /// Rescale bars so the tallest one fills the screen
    #[arg(short, long)]
    pub adaptive: bool,

    /// Echo playback volume in percent (0 = no echo)
    #[arg(short, long, default_value_t = 0)]
    pub echo: u8,

    /// Config file (defaults to ./chordscope.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write log output to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Milliseconds between analysis frames
    #[arg(long, default_value_t = DEFAULT_REFRESH_MS)]
    pub refresh_ms: u64,

    /// List audio devices and exit
    #[arg(long)]
    pub list_devices: bool,
}
