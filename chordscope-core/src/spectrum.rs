//! # Spectrum Helpers
//!
//! Conversions between spectral bin indices and frequencies, the
//! linear-to-logarithmic axis mapping used by the visualizers, and peak
//! picking over a magnitude spectrum.

use crate::error::{Error, Result};
use crate::Sample;

/// Sample rate the capture stream is opened with by default.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Number of samples per analysis window by default. Must be a power of 2.
pub const DEFAULT_FFT_LEN: usize = 65_536;

/// Ties a transform length to the sample rate it was captured at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumLayout {
    pub sample_rate: u32,
    pub fft_len: usize,
}

impl Default for SpectrumLayout {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fft_len: DEFAULT_FFT_LEN,
        }
    }
}

impl SpectrumLayout {
    pub fn new(sample_rate: u32, fft_len: usize) -> Self {
        Self { sample_rate, fft_len }
    }

    /// Frequency (Hz) associated with bin `index`.
    pub fn index_to_freq(&self, index: f32) -> f32 {
        2.0 * index * self.sample_rate as f32 / self.fft_len as f32
    }

    /// Fractional bin index associated with `freq` (Hz). Inverse of [`Self::index_to_freq`].
    pub fn freq_to_index(&self, freq: f32) -> f32 {
        0.5 * freq * self.fft_len as f32 / self.sample_rate as f32
    }

    /// Number of bins carrying distinct information for a real input.
    pub fn usable_bins(&self) -> usize {
        self.fft_len / 2
    }
}

/// Maps a linear value onto a logarithmic output axis.
///
/// # Arguments
/// * `lin_min` - Smallest linear value (maps to `log_min`)
/// * `lin_range` - Width of the linear input range
/// * `log_min` - Start of the output axis
/// * `log_range` - Width of the output axis
/// * `value` - Linear value to map
///
/// # Returns
/// * `Err(OutOfRange)` - If `value < lin_min`
pub fn map_lin_to_log(lin_min: f32, lin_range: f32, log_min: f32, log_range: f32, value: f32) -> Result<f32> {
    if value < lin_min {
        log::debug!("Linear value {} is below the minimum {}.", value, lin_min);
        return Err(Error::OutOfRange(format!(
            "linear value {value} is below the minimum {lin_min}"
        )));
    }
    Ok(log_min + ((value + 1.0 - lin_min).ln() / (lin_range + lin_min).ln()) * log_range)
}

/// Returns the indices of the `n_out` largest values of `input`, largest first.
///
/// Equal values keep their original (ascending index) order. With
/// `declump`, a candidate directly next to an already selected index is
/// skipped, so one spectral lobe does not fill several slots.
///
/// The result holds only the indices actually found; it is shorter than
/// `n_out` when the input runs out of non-adjacent candidates.
///
/// # Errors
/// * `InvalidArgument` if `input` is empty
pub fn find_n_largest(input: &[Sample], n_out: usize, declump: bool) -> Result<Vec<usize>> {
    if input.is_empty() {
        return Err(Error::invalid("input array size must be greater than zero"));
    }

    let mut order: Vec<usize> = (0..input.len()).collect();
    order.sort_by(|&a, &b| input[b].cmp(&input[a]));

    let mut selected: Vec<usize> = Vec::with_capacity(n_out.min(input.len()));
    for index in order {
        if selected.len() == n_out {
            break;
        }
        if declump && selected.iter().any(|&s| s.abs_diff(index) == 1) {
            continue;
        }
        selected.push(index);
    }

    log::trace!("Found largest elements: count = {}", selected.len());
    Ok(selected)
}
