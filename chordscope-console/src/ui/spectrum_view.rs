//! Scaled spectrum views: the magnitude spectrum between two frequencies,
//! bucketed into one bar per console column.

use chordscope_core::spectrum::{map_lin_to_log, SpectrumLayout};
use chordscope_core::Sample;

use super::bargraph::smooth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Linear,
    Logarithmic,
}

/// Buckets `spectrum[min_freq..max_freq]` into `width` bars.
///
/// On the logarithmic axis each bin is weighted by `1 / index`; on the
/// linear axis bins are averaged over the bucket width.
pub fn bucket_spectrum(
    spectrum: &[Sample],
    layout: &SpectrumLayout,
    axis: Axis,
    min_freq: f32,
    max_freq: f32,
    width: usize,
) -> Vec<i32> {
    let mut bars = vec![0i32; width];
    if width == 0 || spectrum.is_empty() {
        return bars;
    }

    let first = (layout.freq_to_index(min_freq) as usize).min(spectrum.len() - 1);
    let last = (layout.freq_to_index(max_freq) as usize).min(spectrum.len());
    if last <= first {
        return bars;
    }
    let span = last - first;
    let bucket_width = (layout.fft_len / width).max(1) as i32;

    for (i, &magnitude) in spectrum.iter().enumerate().take(last).skip(first) {
        let (column, value) = match axis {
            Axis::Logarithmic => {
                let position = map_lin_to_log(first as f32, span as f32, 0.0, width as f32, i as f32)
                    .unwrap_or(0.0);
                (position as usize, magnitude as i32 / i.max(1) as i32)
            }
            Axis::Linear => (width * (i - first) / span, magnitude as i32 / bucket_width),
        };
        bars[column.min(width - 1)] += value;
    }
    bars
}

/// Bars for the semilog, linear and log-log modes.
pub fn spectrum_bars(
    spectrum: &[Sample],
    layout: &SpectrumLayout,
    axis: Axis,
    smoothed: bool,
    (min_freq, max_freq): (f32, f32),
    width: usize,
) -> Vec<i32> {
    let mut bars = bucket_spectrum(spectrum, layout, axis, min_freq, max_freq, width);
    if smoothed {
        smooth(&mut bars);
    }
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    // Bin i maps to 2 * i Hz.
    fn layout() -> SpectrumLayout {
        SpectrumLayout::new(1024, 1024)
    }

    #[test]
    fn linear_axis_spreads_bins_evenly() {
        let spectrum = vec![64; 512];
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Linear, 0.0, 512.0, 4);
        // 256 bins over 4 columns, each bin divided by a bucket width of 256.
        assert_eq!(bars, vec![0, 0, 0, 0]);

        let spectrum = vec![512; 512];
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Linear, 0.0, 512.0, 4);
        assert_eq!(bars, vec![128, 128, 128, 128]);
    }

    #[test]
    fn peak_lands_in_its_linear_column() {
        let mut spectrum = vec![0; 512];
        spectrum[200] = 25600;
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Linear, 0.0, 512.0, 4);
        assert_eq!(bars, vec![0, 0, 0, 100]);
    }

    #[test]
    fn logarithmic_axis_weights_by_index() {
        let mut spectrum = vec![0; 512];
        spectrum[100] = 1000;
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Logarithmic, 20.0, 1000.0, 10);
        assert_eq!(bars.iter().sum::<i32>(), 10);
        assert_eq!(bars.len(), 10);
    }

    #[test]
    fn empty_range_gives_flat_bars() {
        let spectrum = vec![100; 512];
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Linear, 600.0, 500.0, 8);
        assert!(bars.iter().all(|&bar| bar == 0));
        assert!(bucket_spectrum(&spectrum, &layout(), Axis::Linear, 0.0, 500.0, 0).is_empty());
    }

    #[test]
    fn range_is_clamped_to_the_spectrum() {
        let spectrum = vec![1024; 512];
        let bars = bucket_spectrum(&spectrum, &layout(), Axis::Linear, 0.0, 50_000.0, 2);
        // 256 bins per column, each contributing 1024 / 512.
        assert_eq!(bars, vec![512, 512]);
    }
}
