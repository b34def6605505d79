// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Pitch names and velocity scaling for the encoder interface.

/// Pitch class names, sharps only
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name of a MIDI note number (60 = "C4", 0 = "C-1")
pub fn pitch_name(note: u8) -> String {
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASSES[(note % 12) as usize], octave)
}

/// Parse a pitch name produced by [`pitch_name`]. Flats are accepted too.
pub fn parse_pitch(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, octave) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave: i32 = octave.parse().ok()?;
    let number = base + accidental + (octave + 1) * 12;
    u8::try_from(number).ok().filter(|n| *n <= 127)
}

/// Rescale a MIDI velocity (0-127) to the encoder's 1-100 range
pub fn velocity_percent(velocity: u8) -> u8 {
    let scaled = (velocity as f64 / 127.0 * 100.0).round();
    scaled.clamp(1.0, 100.0) as u8
}

/// Map a 1-100 velocity back to MIDI (1-127)
pub fn velocity_midi(percent: u8) -> u8 {
    let scaled = (percent as f64 / 100.0 * 127.0).round();
    scaled.clamp(1.0, 127.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_names() {
        assert_eq!(pitch_name(60), "C4");
        assert_eq!(pitch_name(61), "C#4");
        assert_eq!(pitch_name(69), "A4");
        assert_eq!(pitch_name(0), "C-1");
        assert_eq!(pitch_name(127), "G9");
        assert_eq!(pitch_name(11), "B-1");
    }

    #[test]
    fn test_parse_pitch() {
        for note in 0..=127u8 {
            assert_eq!(parse_pitch(&pitch_name(note)), Some(note));
        }
        assert_eq!(parse_pitch("Db4"), Some(61));
        assert_eq!(parse_pitch("Cb-1"), None);
        assert_eq!(parse_pitch("H2"), None);
        assert_eq!(parse_pitch("G#9"), None);
        assert_eq!(parse_pitch(""), None);
    }

    #[test]
    fn test_velocity_percent() {
        assert_eq!(velocity_percent(127), 100);
        assert_eq!(velocity_percent(100), 79);
        assert_eq!(velocity_percent(80), 63);
        assert_eq!(velocity_percent(1), 1);
        assert_eq!(velocity_percent(0), 1);
    }

    #[test]
    fn test_velocity_midi() {
        assert_eq!(velocity_midi(100), 127);
        assert_eq!(velocity_midi(79), 100);
        assert_eq!(velocity_midi(1), 1);
    }
}
