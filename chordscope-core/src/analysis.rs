//! # Analysis Pipeline Module
//!
//! Runs one frame of the real-time pipeline: the freshest window is pulled
//! from the audio queue, turned into a magnitude spectrum, and the strongest
//! peaks are reduced to a pitch (approximate-HCF fundamental) and to a chord
//! (distinct pitch classes matched against the chord dictionary).
//!
//! ## Pipeline
//! 1. `AudioQueue::peek_fresh` - newest `fft_len` samples
//! 2. `FrequencyAnalyzer::analyze` - scaled magnitude spectrum
//! 3. `find_n_largest` - declumped peaks in the lower half
//! 4. `approx_hcf` + `pitch_number` - note name and cents offset
//! 5. quarter-tone distinct tones + `ChordDictionary::identify` - chord name

use crate::chord::{ChordDictionary, CHORD_MAX_NOTES};
use crate::error::{Error, Result};
use crate::fft::{FrequencyAnalyzer, DEFAULT_VOLUME_SCALE};
use crate::pitch::approx_hcf;
use crate::queue::AudioQueue;
use crate::spectrum::{find_n_largest, SpectrumLayout};
use crate::tuning::{pitch_name, pitch_number};
use crate::{AnalysisResult, Sample};

/// Tunables for the pitch and chord heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Magnitude scale handed to the frequency-content extractor.
    pub volume_scale: f32,
    /// Peaks folded together for the fundamental estimate.
    pub pitch_peaks: usize,
    /// Largest peak ratio accepted by the fundamental estimate.
    pub accuracy_threshold: f32,
    /// Peaks considered as chord tones.
    pub chord_peaks: usize,
    /// Most distinct tones passed to the chord matcher.
    pub max_chord_notes: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            volume_scale: DEFAULT_VOLUME_SCALE,
            pitch_peaks: 5,
            accuracy_threshold: 5.0,
            chord_peaks: 10,
            max_chord_notes: 4,
        }
    }
}

impl AnalysisSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.volume_scale.is_finite() && self.volume_scale > 0.0) {
            return Err(Error::invalid("volume_scale must be a positive number"));
        }
        if self.pitch_peaks < 2 {
            return Err(Error::invalid("pitch_peaks must be at least 2"));
        }
        if self.chord_peaks == 0 {
            return Err(Error::invalid("chord_peaks must be greater than zero"));
        }
        if !(1..=CHORD_MAX_NOTES).contains(&self.max_chord_notes) {
            return Err(Error::invalid(format!(
                "max_chord_notes must be between 1 and {CHORD_MAX_NOTES}"
            )));
        }
        if !(self.accuracy_threshold >= 1.0) {
            return Err(Error::invalid("accuracy_threshold must be at least 1"));
        }
        Ok(())
    }
}

/// A detected pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchDetection {
    /// Estimated fundamental in Hz.
    pub frequency: f32,
    /// Pitch number, 1 (A) to 12 (G#).
    pub number: u8,
    pub name: &'static str,
    pub cents_sharp: f32,
}

/// A chord named from the distinct tones found in the spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordDetection {
    pub name: String,
    /// Sorted, de-duplicated pitch numbers that were matched.
    pub tones: Vec<u8>,
}

impl ChordDetection {
    /// Note names of the matched tones, e.g. `["A", "C#", "E"]`.
    ///
    /// # Errors
    /// * `OutOfRange` if a tone is outside 1..=12
    pub fn tone_names(&self) -> Result<Vec<&'static str>> {
        self.tones.iter().map(|&tone| pitch_name(tone)).collect()
    }
}

/// Frequencies of the strongest non-silent bins in `spectrum`, strongest first.
///
/// The DC bin and bins with zero magnitude are never reported.
fn peak_frequencies(spectrum: &[Sample], layout: &SpectrumLayout, count: usize) -> Result<Vec<f32>> {
    if spectrum.is_empty() {
        return Ok(Vec::new());
    }
    let peaks = find_n_largest(spectrum, count, true)?;
    Ok(peaks
        .into_iter()
        .filter(|&index| index > 0 && spectrum[index] > 0)
        .map(|index| layout.index_to_freq(index as f32))
        .collect())
}

/// Estimates the played note from a lower-half magnitude spectrum.
///
/// # Returns
/// * `Ok(None)` - Fewer than two peaks, or peaks with no harmonic relation
pub fn detect_pitch(
    spectrum: &[Sample],
    layout: &SpectrumLayout,
    settings: &AnalysisSettings,
) -> Result<Option<PitchDetection>> {
    let frequencies = peak_frequencies(spectrum, layout, settings.pitch_peaks)?;
    if frequencies.len() < 2 {
        log::trace!("Not enough spectral peaks for a pitch estimate.");
        return Ok(None);
    }

    let pitch = approx_hcf(&frequencies, settings.accuracy_threshold)?;
    if pitch <= 0.0 {
        log::trace!("No pitch detected from peaks {:?}.", frequencies);
        return Ok(None);
    }

    let reading = pitch_number(pitch)?;
    Ok(Some(PitchDetection {
        frequency: pitch,
        number: reading.number,
        name: reading.name()?,
        cents_sharp: reading.cents_sharp,
    }))
}

/// Guesses the chord sounding in a lower-half magnitude spectrum.
///
/// Peaks are taken strongest first. A peak becomes a chord tone only when it
/// lies at least a quarter tone away from every tone already accepted, and
/// collection stops at `max_chord_notes`.
pub fn guess_chord(
    spectrum: &[Sample],
    layout: &SpectrumLayout,
    dictionary: &ChordDictionary,
    settings: &AnalysisSettings,
) -> Result<Option<ChordDetection>> {
    let quartertone = 2.0_f32.powf(1.0 / 24.0);
    let frequencies = peak_frequencies(spectrum, layout, settings.chord_peaks)?;

    let mut tone_frequencies: Vec<f32> = Vec::with_capacity(settings.max_chord_notes);
    let mut tones: Vec<u8> = Vec::with_capacity(settings.max_chord_notes);
    for freq in frequencies {
        if tone_frequencies.len() >= settings.max_chord_notes {
            break;
        }
        let distinct = tone_frequencies
            .iter()
            .all(|&tone| freq.max(tone) / freq.min(tone) >= quartertone);
        if distinct {
            tone_frequencies.push(freq);
            tones.push(pitch_number(freq)?.number);
        }
    }

    tones.sort_unstable();
    tones.dedup();
    if tones.is_empty() {
        return Ok(None);
    }

    Ok(dictionary.identify_name(&tones)?.map(|name| ChordDetection { name, tones }))
}

/// Owns the buffers and tables needed to analyze frame after frame.
#[derive(Debug)]
pub struct Analyzer {
    layout: SpectrumLayout,
    settings: AnalysisSettings,
    frequency: FrequencyAnalyzer,
    dictionary: ChordDictionary,
    window: Vec<Sample>,
    spectrum: Vec<Sample>,
}

impl Analyzer {
    /// Builds an analyzer for `layout`, initializing the chord dictionary.
    pub fn new(layout: SpectrumLayout, settings: AnalysisSettings) -> Result<Self> {
        settings.validate()?;
        let frequency = FrequencyAnalyzer::new(layout.fft_len)?;
        let dictionary = ChordDictionary::initialized()?;
        log::info!(
            "Analyzer ready: {} point transform at {} Hz.",
            layout.fft_len,
            layout.sample_rate
        );
        Ok(Self {
            layout,
            settings,
            frequency,
            dictionary,
            window: vec![0; layout.fft_len],
            spectrum: vec![0; layout.fft_len],
        })
    }

    pub fn layout(&self) -> &SpectrumLayout {
        &self.layout
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn dictionary(&self) -> &ChordDictionary {
        &self.dictionary
    }

    /// Lower half of the most recently computed spectrum.
    pub fn spectrum(&self) -> &[Sample] {
        &self.spectrum[..self.layout.usable_bins()]
    }

    /// Computes the spectrum of `window` (exactly `fft_len` samples).
    pub fn load_window(&mut self, window: &[Sample]) -> Result<&[Sample]> {
        self.frequency
            .analyze(window, self.settings.volume_scale, &mut self.spectrum)?;
        Ok(self.spectrum())
    }

    /// Computes the spectrum of the newest `fft_len` samples in `queue`.
    ///
    /// # Errors
    /// * `Underflow` while the queue has not yet seen a full window
    pub fn load_queue(&mut self, queue: &AudioQueue) -> Result<&[Sample]> {
        queue.peek_fresh(&mut self.window, 1.0)?;
        self.frequency
            .analyze(&self.window, self.settings.volume_scale, &mut self.spectrum)?;
        Ok(self.spectrum())
    }

    /// Pitch of the loaded spectrum.
    pub fn detect_pitch(&self) -> Result<Option<PitchDetection>> {
        detect_pitch(self.spectrum(), &self.layout, &self.settings)
    }

    /// Chord of the loaded spectrum.
    pub fn guess_chord(&self) -> Result<Option<ChordDetection>> {
        guess_chord(self.spectrum(), &self.layout, &self.dictionary, &self.settings)
    }

    /// Full analysis of `window`.
    pub fn analyze(&mut self, window: &[Sample]) -> Result<AnalysisResult> {
        self.load_window(window)?;
        self.result()
    }

    /// Full analysis of the freshest window in `queue`.
    pub fn analyze_queue(&mut self, queue: &AudioQueue) -> Result<AnalysisResult> {
        self.load_queue(queue)?;
        self.result()
    }

    fn result(&self) -> Result<AnalysisResult> {
        Ok(AnalysisResult {
            pitch: self.detect_pitch()?,
            chord: self.guess_chord()?,
            spectrum: self.spectrum().to_vec(),
        })
    }
}
