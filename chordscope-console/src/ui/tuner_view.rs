//! Spectral tuner (one octave wrapped across the screen) and the automatic
//! tuner line.

use chordscope_core::analysis::PitchDetection;
use chordscope_core::spectrum::SpectrumLayout;
use chordscope_core::tuning::NOTE_NAMES;
use chordscope_core::Sample;

/// Lowest frequency of the wrapped octave (A1).
pub const OCTAVE_BASE_FREQ: f32 = 55.0;

/// Semitones spanned by the width of the automatic tuner line.
pub const AUTOTUNE_SPAN_SEMITONES: f32 = 4.0;

/// Note names spread across `width` columns, one per semitone above A.
pub fn note_header(width: usize) -> String {
    let mut header = vec![' '; width];
    for (k, name) in NOTE_NAMES.iter().enumerate() {
        let start = width * k / NOTE_NAMES.len();
        for (offset, c) in name.chars().enumerate() {
            if let Some(slot) = header.get_mut(start + offset) {
                *slot = c;
            }
        }
    }
    header.into_iter().collect()
}

/// Spreads the octave above A1 across `width` bars on a log-frequency axis.
///
/// Column `i` covers `55 * 2^(i / width)` up to `55 * 2^((i + 1) / width)` Hz,
/// and its bar is the summed magnitude divided by the bin span it covers.
pub fn wrap_octave(spectrum: &[Sample], layout: &SpectrumLayout, width: usize) -> Vec<i32> {
    let edges: Vec<f32> = (0..=width)
        .map(|i| layout.freq_to_index(OCTAVE_BASE_FREQ * 2.0_f32.powf(i as f32 / width as f32)))
        .collect();

    edges
        .windows(2)
        .map(|edge| {
            let (start, end) = (edge[0], edge[1]);
            let lo = (start.round() as usize).min(spectrum.len());
            let hi = (end.round() as usize).min(spectrum.len());
            let span = end - start;
            spectrum[lo..hi.max(lo)]
                .iter()
                .map(|&magnitude| (magnitude as f32 / span) as i32)
                .sum()
        })
        .collect()
}

/// The automatic tuner line: the note name is centred when in tune and
/// drifts left as it goes sharp, across a four semitone span.
pub fn autotune_line(pitch: Option<&PitchDetection>, width: usize) -> String {
    let Some(pitch) = pitch else {
        return "No pitch detected.".to_string();
    };

    let mut line = vec![' '; width];
    let offset = (pitch.cents_sharp * width as f32 / (AUTOTUNE_SPAN_SEMITONES * 100.0)) as i64;
    let center = (width as i64 / 2 - offset).clamp(0, (width as i64 - 2).max(0)) as usize;
    for (i, c) in pitch.name.chars().enumerate() {
        if let Some(slot) = line.get_mut(center + i) {
            *slot = c;
        }
    }
    format!("Output note name is: {}", line.into_iter().collect::<String>())
}

/// Frequency and offset of a detected pitch, e.g. "440.0 Hz, +3 cents".
///
/// Detected frequencies come from the bin mapping, which reads one octave
/// high, so the figure is halved to show the sounding pitch.
pub fn pitch_readout(pitch: &PitchDetection) -> String {
    format!("{:.1} Hz, {:+.0} cents", pitch.frequency / 2.0, pitch.cents_sharp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(name: &'static str, cents_sharp: f32) -> PitchDetection {
        PitchDetection {
            frequency: 440.0,
            number: 1,
            name,
            cents_sharp,
        }
    }

    #[test]
    fn header_places_every_note() {
        let header = note_header(60);
        assert_eq!(header.len(), 60);
        assert!(header.starts_with("A    A#   B"));
        assert_eq!(&header[55..57], "G#");
    }

    #[test]
    fn octave_has_one_bar_per_column() {
        let layout = SpectrumLayout::new(44_100, 65_536);
        let spectrum = vec![100; 32_768];
        let bars = wrap_octave(&spectrum, &layout, 24);
        assert_eq!(bars.len(), 24);
        assert!(bars.iter().all(|&bar| bar >= 0));
    }

    #[test]
    fn a_peak_in_the_octave_lights_its_column() {
        // Bin i maps to 2 * i Hz; the first column starts at bin 27.5.
        let layout = SpectrumLayout::new(1024, 1024);
        let mut spectrum = vec![0; 512];
        spectrum[28] = 1000;
        let bars = wrap_octave(&spectrum, &layout, 12);
        assert!(bars[0] > 0);
        assert!(bars[1..].iter().all(|&bar| bar == 0));
    }

    #[test]
    fn in_tune_note_is_centred() {
        let line = autotune_line(Some(&reading("C#", 0.0)), 20);
        assert_eq!(line, format!("Output note name is: {}C#{}", " ".repeat(10), " ".repeat(8)));
    }

    #[test]
    fn detuned_note_moves_and_clamps() {
        let line = autotune_line(Some(&reading("A", 40.0)), 20);
        let body = line.trim_start_matches("Output note name is: ");
        assert_eq!(body.find('A'), Some(8));

        let line = autotune_line(Some(&reading("A", 5000.0)), 20);
        let body = line.trim_start_matches("Output note name is: ");
        assert_eq!(body.find('A'), Some(0));

        let line = autotune_line(Some(&reading("A", -5000.0)), 20);
        let body = line.trim_start_matches("Output note name is: ");
        assert_eq!(body.find('A'), Some(18));
    }

    #[test]
    fn readout_shows_the_sounding_frequency() {
        let pitch = PitchDetection {
            frequency: 880.0,
            number: 1,
            name: "A",
            cents_sharp: 3.2,
        };
        assert_eq!(pitch_readout(&pitch), "440.0 Hz, +3 cents");
    }

    #[test]
    fn missing_pitch_is_reported() {
        assert_eq!(autotune_line(None, 20), "No pitch detected.");
    }
}
