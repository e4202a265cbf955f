//! # Chord Dictionary Module
//!
//! Chord shapes defined in root position on A, transposed through all twelve
//! roots into a lookup table, and a matcher that names the most specific
//! chord containing a set of detected pitch classes.
//!
//! Notes use the pitch numbering of [`crate::tuning`]: 1 = A ... 12 = G#.

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};
use crate::tuning::{pitch_name, NOTE_NAMES};

/// Most notes any shape in the dictionary holds.
pub const CHORD_MAX_NOTES: usize = 5;

/// Number of distinct chord shapes.
pub const NUM_CHORD_TYPES: usize = 11;

/// Canonical shapes, rooted on A.
const A_ROOT_CHORDS: [(&[u8], &str); NUM_CHORD_TYPES] = [
    (&[1, 5, 8, 3], "A add9"),
    (&[1, 5, 8, 12], "A Maj7"),
    (&[1, 4, 8, 11], "A min7"),
    (&[1, 5, 8, 11], "A dom7"),
    (&[1, 4, 8, 12], "A minMaj7"),
    (&[1, 4, 7], "A dim"),
    (&[1, 6, 8], "A sus4"),
    (&[1, 3, 8], "A sus2"),
    (&[1, 5, 8], "A Maj"),
    (&[1, 4, 8], "A min"),
    (&[1, 8], "A 5"),
];

/// A chord: its notes in root position and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    notes: Vec<u8>,
    name: String,
}

impl Chord {
    /// Builds a chord from its notes (root first) and display name.
    pub fn new(notes: &[u8], name: impl Into<String>) -> Self {
        Self {
            notes: notes.to_vec(),
            name: name.into(),
        }
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn num_notes(&self) -> usize {
        self.notes.len()
    }

    /// Root note, or `None` for an empty chord.
    pub fn root(&self) -> Option<u8> {
        self.notes.first().copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name without its leading root, e.g. "Maj7" for "C#Maj7".
    pub fn quality(&self) -> &str {
        let rest = self
            .name
            .strip_prefix(|c: char| matches!(c, 'A'..='G'))
            .unwrap_or(&self.name);
        let rest = rest.strip_prefix('#').unwrap_or(rest);
        rest.trim_start()
    }

    /// True if every note of `notes_in` is one of this chord's notes.
    pub fn contains(&self, notes_in: &[u8]) -> bool {
        notes_in.iter().all(|note| self.notes.contains(note))
    }

    /// Shifts every note by `semitones_up`, wrapping within the octave.
    ///
    /// The name is rebuilt from the new root. A one-letter root keeps a space
    /// before the quality ("B Maj") and a sharp root takes its place
    /// ("A#Maj").
    ///
    /// # Errors
    /// * `InvalidArgument` if `semitones_up` is outside -11..=11
    pub fn transpose(&self, semitones_up: i32) -> Result<Chord> {
        if !(-11..=11).contains(&semitones_up) {
            log::error!("Invalid transpose semitones: {}", semitones_up);
            return Err(Error::invalid(format!(
                "transpose semitones must be between -11 and 11, got {semitones_up}"
            )));
        }

        let notes: Vec<u8> = self
            .notes
            .iter()
            .map(|&note| (((note as i32 + semitones_up - 1) % 12 + 12) % 12 + 1) as u8)
            .collect();

        let name = match notes.first() {
            Some(&root) => {
                let root_name = pitch_name(root)?;
                let quality = self.quality();
                if root_name.len() == 1 {
                    format!("{root_name} {quality}")
                } else {
                    format!("{root_name}{quality}")
                }
            }
            None => self.name.clone(),
        };

        log::trace!(
            "Transposed chord from {:?} to {:?} by {} semitones.",
            self.notes,
            notes,
            semitones_up
        );
        Ok(Chord { notes, name })
    }
}

/// Every chord shape in every key, built on first use.
///
/// The table is owned by the dictionary value rather than held in a static;
/// build one and share it by reference (it is `Sync`).
#[derive(Debug, Default)]
pub struct ChordDictionary {
    chords: OnceCell<Vec<Chord>>,
}

impl ChordDictionary {
    /// Creates an uninitialized dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dictionary with its table already built.
    pub fn initialized() -> Result<Self> {
        let dictionary = Self::new();
        dictionary.initialize()?;
        Ok(dictionary)
    }

    pub fn is_initialized(&self) -> bool {
        self.chords.get().is_some()
    }

    /// Builds the transposition table. Calling it again is a no-op.
    pub fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            log::debug!("Chord dictionary already initialized.");
            return Ok(());
        }
        self.table().map(|_| ())
    }

    /// The full table: shape-major, root-minor (A, A#, B, ... G#).
    pub fn chords(&self) -> Result<&[Chord]> {
        self.table().map(Vec::as_slice)
    }

    fn table(&self) -> Result<&Vec<Chord>> {
        self.chords.get_or_try_init(|| {
            log::info!("Initializing chord dictionary.");
            let mut chords = Vec::with_capacity(NUM_CHORD_TYPES * NOTE_NAMES.len());
            for (notes, name) in A_ROOT_CHORDS {
                let shape = Chord::new(notes, name);
                for semitones in 0..NOTE_NAMES.len() as i32 {
                    chords.push(shape.transpose(semitones)?);
                }
            }
            log::info!("Chord dictionary initialized with {} chords.", chords.len());
            Ok(chords)
        })
    }

    /// Finds the most specific chord holding every note in `notes`.
    ///
    /// Among all chords containing the notes, the one with the fewest notes
    /// wins. A later candidate of the same size replaces the current best when
    /// its root equals `notes[0]`.
    ///
    /// # Returns
    /// * `Ok(Some(chord))` - Best match
    /// * `Ok(None)` - No chord contains all the notes
    /// * `Err(InvalidArgument)` - `notes` is empty
    /// * `Err(Integrity)` - The chosen table entry has no name
    pub fn identify(&self, notes: &[u8]) -> Result<Option<&Chord>> {
        if !self.is_initialized() {
            log::warn!("Chord dictionary not initialized. Initializing now.");
        }
        let chords = self.chords()?;

        let Some(&first) = notes.first() else {
            return Err(Error::invalid("number of input notes must be greater than zero"));
        };

        let mut best: Option<&Chord> = None;
        let mut num_candidates = 0;
        for chord in chords.iter().filter(|chord| chord.contains(notes)) {
            num_candidates += 1;
            let replace = match best {
                None => true,
                Some(current) => {
                    chord.num_notes() < current.num_notes()
                        || (chord.num_notes() == current.num_notes() && chord.root() == Some(first))
                }
            };
            if replace {
                best = Some(chord);
            }
        }

        let Some(best) = best else {
            log::debug!("No matching chord found for notes {:?}.", notes);
            return Ok(None);
        };

        if best.name().is_empty() {
            log::error!("Chord name is empty for the best candidate.");
            return Err(Error::Integrity(
                "invalid chord name for the best candidate".into(),
            ));
        }

        log::debug!(
            "Identified chord {} from {} candidates for notes {:?}.",
            best.name(),
            num_candidates,
            notes
        );
        Ok(Some(best))
    }

    /// Convenience over [`Self::identify`] that returns the chord name.
    pub fn identify_name(&self, notes: &[u8]) -> Result<Option<String>> {
        Ok(self.identify(notes)?.map(|chord| chord.name().to_owned()))
    }
}
