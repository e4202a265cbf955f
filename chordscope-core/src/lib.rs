// chordscope-core/src/lib.rs

//! The core logic for the chordscope spectrum analyzer.
//! This crate owns the shared audio queue, the spectral transform, and the
//! heuristics that turn spectral peaks into a pitch and a chord name. It also
//! holds the cpal glue that feeds the queue. It contains no terminal code.

pub mod analysis;
pub mod audio;
pub mod chord;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod queue;
pub mod spectrum;
pub mod tuning;

pub use error::{Error, Result};

use analysis::{ChordDetection, PitchDetection};

/// One audio sample, and one magnitude bin of a computed spectrum.
pub type Sample = i16;

/// Largest representable sample; spectrum magnitudes are clamped to it.
pub const MAX_SAMPLE_VALUE: Sample = i16::MAX;

/// Represents the result of a single audio analysis frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    /// Magnitudes of the lower half of the spectrum.
    pub spectrum: Vec<Sample>,
    /// The detected note, if the peaks agreed on a fundamental.
    pub pitch: Option<PitchDetection>,
    /// The detected chord, if the distinct tones matched a known shape.
    pub chord: Option<ChordDetection>,
}
