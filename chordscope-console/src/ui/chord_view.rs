use chordscope_core::analysis::ChordDetection;

/// "Detected Chord: A Maj (A C# E)", or a notice when nothing matched.
pub fn chord_line(chord: Option<&ChordDetection>) -> String {
    match chord {
        Some(chord) => match chord.tone_names() {
            Ok(names) => format!("Detected Chord: {} ({})", chord.name, names.join(" ")),
            Err(_) => format!("Detected Chord: {}", chord.name),
        },
        None => "No Chord Detected".to_string(),
    }
}
