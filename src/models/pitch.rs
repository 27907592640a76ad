//! Diatonic pitch and staff-position arithmetic
//!
//! Mensural pitch is letter + octave only; chromatic alteration lives in signature
//! clefs and written accidentals. Octaves start at C (C4 = middle C).

use crate::error::ModelParseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteLetter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteLetter {
    const ALL: [NoteLetter; 7] = [
        NoteLetter::C,
        NoteLetter::D,
        NoteLetter::E,
        NoteLetter::F,
        NoteLetter::G,
        NoteLetter::A,
        NoteLetter::B,
    ];

    /// Position within the octave, C = 0
    pub fn index(&self) -> i32 {
        match self {
            NoteLetter::C => 0,
            NoteLetter::D => 1,
            NoteLetter::E => 2,
            NoteLetter::F => 3,
            NoteLetter::G => 4,
            NoteLetter::A => 5,
            NoteLetter::B => 6,
        }
    }

    pub fn from_index(index: i32) -> NoteLetter {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    pub fn from_char(c: char) -> Option<NoteLetter> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteLetter::C),
            'D' => Some(NoteLetter::D),
            'E' => Some(NoteLetter::E),
            'F' => Some(NoteLetter::F),
            'G' => Some(NoteLetter::G),
            'A' => Some(NoteLetter::A),
            'B' => Some(NoteLetter::B),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            NoteLetter::C => 'C',
            NoteLetter::D => 'D',
            NoteLetter::E => 'E',
            NoteLetter::F => 'F',
            NoteLetter::G => 'G',
            NoteLetter::A => 'A',
            NoteLetter::B => 'B',
        }
    }
}

/// Chromatic alteration carried by signature clefs and written accidentals
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Accidental {
    Flat,
    Natural,
    Sharp,
}

impl Accidental {
    pub fn semitone_offset(&self) -> i8 {
        match self {
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub letter: NoteLetter,
    pub octave: i8,
}

impl Pitch {
    pub fn new(letter: NoteLetter, octave: i8) -> Self {
        Self { letter, octave }
    }

    /// Single diatonic ordinal used for comparison and staff arithmetic
    pub fn place_number(&self) -> i32 {
        i32::from(self.octave) * 7 + self.letter.index()
    }

    pub fn from_place_number(place: i32) -> Self {
        Self {
            letter: NoteLetter::from_index(place),
            octave: place.div_euclid(7) as i8,
        }
    }

    /// Move by diatonic steps (positive = up)
    pub fn transpose(&self, steps: i32) -> Self {
        Self::from_place_number(self.place_number() + steps)
    }

    /// Diatonic distance from `self` up to `other`
    pub fn steps_to(&self, other: &Pitch) -> i32 {
        other.place_number() - self.place_number()
    }

    /// Staff position (0 = bottom line, 1 = first space, ...) given a reference
    /// pitch sitting at a known staff position
    pub fn staff_position(&self, reference: &Pitch, reference_position: i32) -> i32 {
        reference_position + reference.steps_to(self)
    }

    /// Pitch sitting at a staff position given a reference
    pub fn at_staff_position(position: i32, reference: &Pitch, reference_position: i32) -> Self {
        reference.transpose(position - reference_position)
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    fn cmp(&self, other: &Self) -> Ordering {
        self.place_number().cmp(&other.place_number())
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter.to_char(), self.octave)
    }
}

impl FromStr for Pitch {
    type Err = ModelParseError;

    /// Parse names like `"G4"` or `"b-1"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let letter = chars
            .next()
            .and_then(NoteLetter::from_char)
            .ok_or_else(|| ModelParseError::Pitch(s.to_string()))?;
        let octave: i8 = chars
            .as_str()
            .parse()
            .map_err(|_| ModelParseError::Pitch(s.to_string()))?;
        Ok(Pitch::new(letter, octave))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_number_round_trip_edges() {
        let c4 = Pitch::new(NoteLetter::C, 4);
        assert_eq!(c4.place_number(), 28);
        assert_eq!(Pitch::new(NoteLetter::B, 3).place_number(), 27);
        assert_eq!(Pitch::from_place_number(27), Pitch::new(NoteLetter::B, 3));
        assert_eq!(Pitch::from_place_number(-1), Pitch::new(NoteLetter::B, -1));
    }

    #[test]
    fn test_ordering_by_place() {
        let b3 = Pitch::new(NoteLetter::B, 3);
        let c4 = Pitch::new(NoteLetter::C, 4);
        assert!(b3 < c4);
        assert_eq!(b3.steps_to(&c4), 1);
    }

    #[test]
    fn test_staff_position() {
        // treble: G4 on the second line
        let g4 = Pitch::new(NoteLetter::G, 4);
        let b4 = Pitch::new(NoteLetter::B, 4);
        assert_eq!(b4.staff_position(&g4, 2), 4);
        assert_eq!(Pitch::at_staff_position(8, &g4, 2), Pitch::new(NoteLetter::F, 5));
    }

    #[test]
    fn test_parse() {
        assert_eq!("G4".parse::<Pitch>(), Ok(Pitch::new(NoteLetter::G, 4)));
        assert_eq!("f3".parse::<Pitch>(), Ok(Pitch::new(NoteLetter::F, 3)));
        assert!("H2".parse::<Pitch>().is_err());
        assert!("G".parse::<Pitch>().is_err());
    }
}
