//! Modern key signature derived from signature clefs

use super::clef::Clef;
use super::pitch::{Accidental, NoteLetter};
use serde::{Deserialize, Serialize};

const FLAT_ORDER: [NoteLetter; 7] = [
    NoteLetter::B,
    NoteLetter::E,
    NoteLetter::A,
    NoteLetter::D,
    NoteLetter::G,
    NoteLetter::C,
    NoteLetter::F,
];

const SHARP_ORDER: [NoteLetter; 7] = [
    NoteLetter::F,
    NoteLetter::C,
    NoteLetter::G,
    NoteLetter::D,
    NoteLetter::A,
    NoteLetter::E,
    NoteLetter::B,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignatureElement {
    pub letter: NoteLetter,
    pub accidental: Accidental,
}

/// Ordered accidentals of a key signature. Equality ignores order and octave.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModernKeySignature {
    elements: Vec<KeySignatureElement>,
}

impl ModernKeySignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conventional signature with `fifths` sharps (positive) or flats (negative)
    pub fn from_fifths(fifths: i8) -> Self {
        let (order, accidental) = if fifths < 0 {
            (&FLAT_ORDER, Accidental::Flat)
        } else {
            (&SHARP_ORDER, Accidental::Sharp)
        };
        let count = usize::from(fifths.unsigned_abs()).min(7);
        Self {
            elements: order[..count]
                .iter()
                .map(|&letter| KeySignatureElement { letter, accidental })
                .collect(),
        }
    }

    /// Derive from the accidental clefs of a clef set (principal clefs are skipped)
    pub fn from_clefs<'a>(clefs: impl IntoIterator<Item = &'a Clef>) -> Self {
        let mut sig = Self::new();
        for clef in clefs {
            if let Some(accidental) = clef.clef_type.accidental() {
                sig.apply(clef.pitch.letter, accidental);
            }
        }
        sig
    }

    /// Add an accidental; a natural cancels the letter's previous alteration
    pub fn apply(&mut self, letter: NoteLetter, accidental: Accidental) {
        self.elements.retain(|e| e.letter != letter);
        if accidental != Accidental::Natural {
            self.elements.push(KeySignatureElement { letter, accidental });
        }
    }

    pub fn elements(&self) -> &[KeySignatureElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn accidental_for(&self, letter: NoteLetter) -> Option<Accidental> {
        self.elements
            .iter()
            .find(|e| e.letter == letter)
            .map(|e| e.accidental)
    }

    pub fn num_flats(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.accidental == Accidental::Flat)
            .count()
    }

    pub fn num_sharps(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| e.accidental == Accidental::Sharp)
            .count()
    }

    /// Circle-of-fifths position; non-conventional signatures count flats negative
    /// and sharps positive
    pub fn fifths(&self) -> i8 {
        self.num_sharps() as i8 - self.num_flats() as i8
    }

    /// Whether the accidentals form a prefix of the conventional order
    pub fn is_conventional(&self) -> bool {
        let fifths = self.fifths();
        *self == Self::from_fifths(fifths) && (self.num_flats() == 0 || self.num_sharps() == 0)
    }
}

impl PartialEq for ModernKeySignature {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self.elements.iter().all(|e| other.elements.contains(e))
    }
}

impl Eq for ModernKeySignature {}
