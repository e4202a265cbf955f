//! # Fast Fourier Transform (FFT) Module
//!
//! This module provides the spectral transform used by the real-time analysis
//! loop, and the magnitude extraction that turns a block of samples into a
//! displayable spectrum.
//!
//! ## Features
//! - Recursive radix-2 Cooley-Tukey transform for power-of-two lengths
//! - No per-level allocation: each recursion writes into its half of the output
//! - Magnitude spectrum with volume scaling and clamping to the sample range
//! - Reusable `FrequencyAnalyzer` workspace for the per-frame hot path

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};

use rustfft::num_complex::Complex64;

use crate::error::{Error, Result};
use crate::{Sample, MAX_SAMPLE_VALUE};

/// Default magnitude scale applied by the visualizers.
pub const DEFAULT_VOLUME_SCALE: f32 = 0.005;

static FIRST_TRANSFORM_LOGGED: AtomicBool = AtomicBool::new(false);

fn validate_length(n: usize) -> Result<()> {
    if n == 0 || !n.is_power_of_two() {
        log::error!("Input size for FFT must be a power of two and greater than zero (got {}).", n);
        return Err(Error::invalid(format!(
            "input size for FFT must be a power of two and greater than zero, got {n}"
        )));
    }
    Ok(())
}

/// Computes the discrete Fourier transform of `input`.
///
/// # Arguments
/// * `input` - Complex samples; the length must be a non-zero power of two
///
/// # Returns
/// * `Ok(spectrum)` - Complex bins, same length as the input
/// * `Err(InvalidArgument)` - If the length is not a power of two
pub fn fft(input: &[Complex64]) -> Result<Vec<Complex64>> {
    let mut output = vec![Complex64::new(0.0, 0.0); input.len()];
    fft_into(input, &mut output)?;
    Ok(output)
}

/// Same as [`fft`], writing into a caller-provided buffer.
pub fn fft_into(input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
    validate_length(input.len())?;
    if output.len() != input.len() {
        return Err(Error::invalid(format!(
            "FFT output length {} does not match input length {}",
            output.len(),
            input.len()
        )));
    }

    if !FIRST_TRANSFORM_LOGGED.swap(true, Ordering::Relaxed) {
        log::debug!("Starting FFT computation for {} samples.", input.len());
    }

    transform(input, 1, output);
    Ok(())
}

/// Decimation-in-time step.
///
/// Reads every `stride`-th element of `input` (starting at index 0) and
/// writes its `output.len()`-point transform into `output`. The even half
/// lands in the lower half of `output` and the odd half in the upper half,
/// and the butterfly then combines them in place.
fn transform(input: &[Complex64], stride: usize, output: &mut [Complex64]) {
    let n = output.len();
    if n == 1 {
        output[0] = input[0];
        return;
    }

    let half = n / 2;
    let (even, odd) = output.split_at_mut(half);
    transform(input, stride * 2, even);
    transform(&input[stride..], stride * 2, odd);

    for k in 0..half {
        let twiddle = Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64);
        let t = twiddle * odd[k];
        let e = even[k];
        even[k] = e + t;
        odd[k] = e - t;
    }
}

/// Converts a complex bin to a scaled, clamped magnitude.
#[inline]
fn magnitude(bin: Complex64, scale: f32) -> Sample {
    let magnitude = bin.norm() * scale as f64;
    magnitude.min(MAX_SAMPLE_VALUE as f64) as Sample
}

/// Calculates the magnitude of every frequency bin of `input`.
///
/// The input is real, so the upper half of the result mirrors the lower
/// half. Callers interpret only the first `input.len() / 2` bins.
///
/// # Arguments
/// * `input` - Real samples; the length must be a non-zero power of two
/// * `scale` - Multiplier applied to each magnitude before clamping
pub fn find_frequency_content(input: &[Sample], scale: f32) -> Result<Vec<Sample>> {
    let mut analyzer = FrequencyAnalyzer::new(input.len())?;
    let mut output = vec![0; input.len()];
    analyzer.analyze(input, scale, &mut output)?;
    Ok(output)
}

/// Pre-allocated workspace for repeated magnitude spectra of one length.
#[derive(Debug, Clone)]
pub struct FrequencyAnalyzer {
    input: Vec<Complex64>,
    output: Vec<Complex64>,
}

impl FrequencyAnalyzer {
    /// Allocates buffers for `len`-point transforms.
    pub fn new(len: usize) -> Result<Self> {
        validate_length(len)?;
        Ok(Self {
            input: vec![Complex64::new(0.0, 0.0); len],
            output: vec![Complex64::new(0.0, 0.0); len],
        })
    }

    /// Transform length this workspace was sized for.
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Writes the scaled magnitude spectrum of `samples` into `spectrum`.
    ///
    /// Both slices must have the workspace length.
    pub fn analyze(&mut self, samples: &[Sample], scale: f32, spectrum: &mut [Sample]) -> Result<()> {
        validate_length(samples.len())?;
        if samples.len() != self.len() || spectrum.len() != self.len() {
            return Err(Error::invalid(format!(
                "frequency content expects {} samples in and out, got {} and {}",
                self.len(),
                samples.len(),
                spectrum.len()
            )));
        }

        for (slot, &sample) in self.input.iter_mut().zip(samples) {
            *slot = Complex64::new(sample as f64, 0.0);
        }
        fft_into(&self.input, &mut self.output)?;

        for (out, &bin) in spectrum.iter_mut().zip(&self.output) {
            *out = magnitude(bin, scale);
        }
        Ok(())
    }
}
