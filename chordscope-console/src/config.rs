use anyhow::{bail, Context, Result};
use chordscope_core::analysis::AnalysisSettings;
use chordscope_core::queue::DEFAULT_QUEUE_LEN;
use chordscope_core::spectrum::{DEFAULT_FFT_LEN, DEFAULT_SAMPLE_RATE};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, Mode, DEFAULT_MAX_FREQ, DEFAULT_MIN_FREQ, DEFAULT_REFRESH_MS};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "chordscope.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_fft_len")]
    pub fft_len: usize,
    #[serde(default = "default_queue_len")]
    pub queue_len: usize,
    #[serde(default)]
    pub echo: u8,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_min_freq")]
    pub min_freq: u32,
    #[serde(default = "default_max_freq")]
    pub max_freq: u32,
    #[serde(default)]
    pub adaptive: bool,
    #[serde(default = "default_graph_scale")]
    pub graph_scale: f32,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_volume_scale")]
    pub volume_scale: f32,
    #[serde(default = "default_pitch_peaks")]
    pub pitch_peaks: usize,
    #[serde(default = "default_chord_peaks")]
    pub chord_peaks: usize,
    #[serde(default = "default_max_chord_notes")]
    pub max_chord_notes: usize,
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            fft_len: default_fft_len(),
            queue_len: default_queue_len(),
            echo: 0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            min_freq: default_min_freq(),
            max_freq: default_max_freq(),
            adaptive: false,
            graph_scale: default_graph_scale(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            volume_scale: default_volume_scale(),
            pitch_peaks: default_pitch_peaks(),
            chord_peaks: default_chord_peaks(),
            max_chord_notes: default_max_chord_notes(),
            accuracy_threshold: default_accuracy_threshold(),
        }
    }
}

impl From<AnalysisConfig> for AnalysisSettings {
    fn from(config: AnalysisConfig) -> Self {
        Self {
            volume_scale: config.volume_scale,
            pitch_peaks: config.pitch_peaks,
            accuracy_threshold: config.accuracy_threshold,
            chord_peaks: config.chord_peaks,
            max_chord_notes: config.max_chord_notes,
        }
    }
}

fn default_sample_rate() -> u32 { DEFAULT_SAMPLE_RATE }
fn default_fft_len() -> usize { DEFAULT_FFT_LEN }
fn default_queue_len() -> usize { DEFAULT_QUEUE_LEN }
fn default_min_freq() -> u32 { DEFAULT_MIN_FREQ }
fn default_max_freq() -> u32 { DEFAULT_MAX_FREQ }
fn default_graph_scale() -> f32 { 0.0008 }
fn default_refresh_ms() -> u64 { DEFAULT_REFRESH_MS }
fn default_volume_scale() -> f32 { AnalysisSettings::default().volume_scale }
fn default_pitch_peaks() -> usize { AnalysisSettings::default().pitch_peaks }
fn default_chord_peaks() -> usize { AnalysisSettings::default().chord_peaks }
fn default_max_chord_notes() -> usize { AnalysisSettings::default().max_chord_notes }
fn default_accuracy_threshold() -> f32 { AnalysisSettings::default().accuracy_threshold }

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}

/// Explicit `--config` path, or `chordscope.toml` in the working directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    })
}

/// Everything the binary runs with, after merging the CLI and the file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    pub min_freq: u32,
    pub max_freq: u32,
    pub adaptive: bool,
    pub graph_scale: f32,
    pub refresh_ms: u64,
    pub echo: u8,
    pub sample_rate: u32,
    pub fft_len: usize,
    pub queue_len: usize,
    pub analysis: AnalysisSettings,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Config values apply only where the CLI is still at its default.
    pub fn merge(cli: &Cli, file: Config) -> Self {
        let mut settings = Self {
            mode: cli.mode,
            min_freq: cli.min_freq,
            max_freq: cli.max_freq,
            adaptive: cli.adaptive,
            graph_scale: file.display.graph_scale,
            refresh_ms: cli.refresh_ms,
            echo: cli.echo,
            sample_rate: file.audio.sample_rate,
            fft_len: file.audio.fft_len,
            queue_len: file.audio.queue_len,
            analysis: file.analysis.into(),
            log_file: cli.log_file.clone().or(file.log_file),
        };
        if cli.mode == Mode::default() { settings.mode = file.display.mode; }
        if cli.min_freq == DEFAULT_MIN_FREQ { settings.min_freq = file.display.min_freq; }
        if cli.max_freq == DEFAULT_MAX_FREQ { settings.max_freq = file.display.max_freq; }
        if !cli.adaptive { settings.adaptive = file.display.adaptive; }
        if cli.refresh_ms == DEFAULT_REFRESH_MS { settings.refresh_ms = file.display.refresh_ms; }
        if cli.echo == 0 { settings.echo = file.audio.echo; }
        settings
    }

    pub fn validate(&self) -> Result<()> {
        if !(20..=10_000).contains(&self.min_freq) {
            bail!("min_freq must be between 20 and 10000 Hz, got {}", self.min_freq);
        }
        if !(self.min_freq + 1..=20_000).contains(&self.max_freq) {
            bail!(
                "max_freq must be between {} and 20000 Hz, got {}",
                self.min_freq + 1,
                self.max_freq
            );
        }
        if self.echo > 100 {
            bail!("echo volume must be between 0 and 100, got {}", self.echo);
        }
        if !self.fft_len.is_power_of_two() {
            bail!("fft_len must be a power of two, got {}", self.fft_len);
        }
        if self.queue_len <= self.fft_len {
            bail!(
                "queue_len ({}) must be larger than fft_len ({})",
                self.queue_len,
                self.fft_len
            );
        }
        if self.sample_rate == 0 {
            bail!("sample_rate must be greater than zero");
        }
        if self.refresh_ms == 0 {
            bail!("refresh_ms must be greater than zero");
        }
        if !(self.graph_scale.is_finite() && self.graph_scale > 0.0) {
            bail!("graph_scale must be a positive number, got {}", self.graph_scale);
        }
        self.analysis.validate().context("invalid [analysis] settings")?;
        Ok(())
    }

    /// Playback volume multiplier, or `None` when echo is off.
    pub fn echo_volume(&self) -> Option<f32> {
        (self.echo > 0).then(|| self.echo as f32 / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["chordscope"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        let settings = Settings::merge(&cli(&[]), config);
        assert_eq!(settings.mode, Mode::Semilog);
        assert_eq!(settings.fft_len, DEFAULT_FFT_LEN);
        assert_eq!(settings.queue_len, DEFAULT_QUEUE_LEN);
        assert_eq!(settings.analysis, AnalysisSettings::default());
        assert_eq!(settings.echo_volume(), None);
        settings.validate().unwrap();
    }

    #[test]
    fn file_fills_values_left_at_default() {
        let config: Config = toml::from_str(
            r#"
            log_file = "chordscope.log"

            [audio]
            echo = 25
            fft_len = 16384

            [display]
            mode = "tuner"
            min_freq = 80
            max_freq = 900

            [analysis]
            chord_peaks = 12
            "#,
        )
        .unwrap();
        let settings = Settings::merge(&cli(&["--max-freq", "3000"]), config);
        assert_eq!(settings.mode, Mode::Tuner);
        assert_eq!(settings.min_freq, 80);
        assert_eq!(settings.max_freq, 3000);
        assert_eq!(settings.fft_len, 16384);
        assert_eq!(settings.analysis.chord_peaks, 12);
        assert_eq!(settings.analysis.pitch_peaks, 5);
        assert_eq!(settings.echo_volume(), Some(0.25));
        assert_eq!(settings.log_file, Some(PathBuf::from("chordscope.log")));
    }

    #[test]
    fn cli_wins_over_file() {
        let config: Config = toml::from_str("[display]\nmode = \"linear\"\n").unwrap();
        let settings = Settings::merge(&cli(&["--mode", "chords"]), config);
        assert_eq!(settings.mode, Mode::Chords);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let base = Settings::merge(&cli(&[]), Config::default());

        let settings = Settings { min_freq: 10, ..base.clone() };
        assert!(settings.validate().is_err());

        let settings = Settings { max_freq: base.min_freq, ..base.clone() };
        assert!(settings.validate().is_err());

        let settings = Settings { echo: 101, ..base.clone() };
        assert!(settings.validate().is_err());

        let settings = Settings { fft_len: 1000, ..base.clone() };
        assert!(settings.validate().is_err());

        let settings = Settings { queue_len: base.fft_len, ..base.clone() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(toml::from_str::<Config>("[display]\nmode = \"sideways\"\n").is_err());
    }
}
