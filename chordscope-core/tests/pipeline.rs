use std::f64::consts::PI;

use chordscope_core::analysis::{AnalysisSettings, Analyzer};
use chordscope_core::queue::AudioQueue;
use chordscope_core::spectrum::SpectrumLayout;
use chordscope_core::Sample;

/// Sums whole-bin sinusoids `(bin, amplitude)` over one window.
fn synthesize(len: usize, partials: &[(usize, f64)]) -> Vec<Sample> {
    (0..len)
        .map(|n| {
            let value: f64 = partials
                .iter()
                .map(|&(bin, amplitude)| amplitude * (2.0 * PI * (bin * n) as f64 / len as f64).sin())
                .sum();
            value.round() as Sample
        })
        .collect()
}

/// Small enough that quantization noise never reaches one magnitude unit.
fn quiet_settings() -> AnalysisSettings {
    AnalysisSettings {
        volume_scale: 0.0002,
        ..Default::default()
    }
}

#[test]
fn harmonic_tone_is_named_a() {
    // 7040 Hz over 4096 samples: bin 256 is a 440 Hz tone with a 16 sample period.
    let layout = SpectrumLayout::new(7040, 4096);
    let window = synthesize(4096, &[(256, 4000.0), (512, 6000.0), (768, 8000.0)]);

    let mut analyzer = Analyzer::new(layout, quiet_settings()).unwrap();
    let result = analyzer.analyze(&window).unwrap();

    assert_eq!(result.spectrum.len(), 2048);
    let pitch = result.pitch.expect("a pitch for a harmonic tone");
    assert_eq!(pitch.name, "A");
    assert_eq!(pitch.number, 1);
    assert!(pitch.cents_sharp.abs() < 1.0, "cents {}", pitch.cents_sharp);
}

#[test]
fn major_triad_is_named_from_the_queue() {
    // 1 Hz bins: A4, C#5 and E5 rounded to whole hertz.
    let layout = SpectrumLayout::new(8192, 8192);
    let window = synthesize(8192, &[(440, 5000.0), (554, 5000.0), (659, 5000.0)]);

    let queue = AudioQueue::new(3 * 8192).unwrap();
    queue.push(&vec![0; 1000], 1.0).unwrap();
    queue.push(&window, 1.0).unwrap();

    let mut analyzer = Analyzer::new(layout, quiet_settings()).unwrap();
    let result = analyzer.analyze_queue(&queue).unwrap();

    let chord = result.chord.expect("a chord for three distinct tones");
    assert_eq!(chord.tones, vec![1, 5, 8]);
    assert_eq!(chord.name, "A Maj");
    // peek_fresh leaves the queue untouched for playback.
    assert_eq!(queue.pending(), 1000 + 8192);
}

#[test]
fn silence_yields_an_empty_result() {
    let layout = SpectrumLayout::new(8192, 1024);
    let mut analyzer = Analyzer::new(layout, AnalysisSettings::default()).unwrap();
    let result = analyzer.analyze(&vec![0; 1024]).unwrap();
    assert!(result.spectrum.iter().all(|&bin| bin == 0));
    assert_eq!(result.pitch, None);
    assert_eq!(result.chord, None);
}

#[test]
fn analyzer_rejects_non_power_of_two_layouts() {
    let layout = SpectrumLayout::new(44_100, 1000);
    assert!(Analyzer::new(layout, AnalysisSettings::default()).is_err());
}
