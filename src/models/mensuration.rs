//! Mensuration: binary/ternary division at four levels
//!
//! Music time is counted in minims. Each level divides one note value into the next
//! smaller one:
//!
//! ```text
//! maxima --modus maior--> longa --modus minor--> brevis --tempus--> semibrevis --prolatio--> minima
//! ```

use super::proportion::Proportion;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Mensural note values, numbered as in the event file format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum NoteType {
    Semifusa = 1,
    Fusa = 2,
    Semiminima = 3,
    Minima = 4,
    Semibrevis = 5,
    Brevis = 6,
    Longa = 7,
    Maxima = 8,
}

impl NoteType {
    pub fn name(&self) -> &'static str {
        match self {
            NoteType::Semifusa => "Semifusa",
            NoteType::Fusa => "Fusa",
            NoteType::Semiminima => "Semiminima",
            NoteType::Minima => "Minima",
            NoteType::Semibrevis => "Semibrevis",
            NoteType::Brevis => "Brevis",
            NoteType::Longa => "Longa",
            NoteType::Maxima => "Maxima",
        }
    }

    /// The mensuration level that divides this note value, if any
    pub fn governing_level(&self) -> Option<MensurationLevel> {
        match self {
            NoteType::Semibrevis => Some(MensurationLevel::Prolatio),
            NoteType::Brevis => Some(MensurationLevel::Tempus),
            NoteType::Longa => Some(MensurationLevel::ModusMinor),
            NoteType::Maxima => Some(MensurationLevel::ModusMaior),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Division {
    Binary,
    Ternary,
}

impl Division {
    pub fn factor(&self) -> i64 {
        match self {
            Division::Binary => 2,
            Division::Ternary => 3,
        }
    }
}

impl Default for Division {
    fn default() -> Self {
        Division::Binary
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MensurationLevel {
    Prolatio,
    Tempus,
    ModusMinor,
    ModusMaior,
}

/// Division structure plus tempo change in force
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mensuration {
    pub prolatio: Division,
    pub tempus: Division,
    pub modus_minor: Division,
    pub modus_maior: Division,
    pub tempo_change: Proportion,
}

impl Mensuration {
    pub fn new(prolatio: Division, tempus: Division, modus_minor: Division, modus_maior: Division) -> Self {
        Self {
            prolatio,
            tempus,
            modus_minor,
            modus_maior,
            tempo_change: Proportion::ONE,
        }
    }

    pub fn with_tempo_change(mut self, tempo_change: Proportion) -> Self {
        self.tempo_change = tempo_change;
        self
    }

    pub fn division(&self, level: MensurationLevel) -> Division {
        match level {
            MensurationLevel::Prolatio => self.prolatio,
            MensurationLevel::Tempus => self.tempus,
            MensurationLevel::ModusMinor => self.modus_minor,
            MensurationLevel::ModusMaior => self.modus_maior,
        }
    }

    pub fn with_division(mut self, level: MensurationLevel, division: Division) -> Self {
        match level {
            MensurationLevel::Prolatio => self.prolatio = division,
            MensurationLevel::Tempus => self.tempus = division,
            MensurationLevel::ModusMinor => self.modus_minor = division,
            MensurationLevel::ModusMaior => self.modus_maior = division,
        }
        self
    }

    /// Whether a note value is perfect (ternary) under this mensuration
    pub fn is_perfect(&self, note_type: NoteType) -> bool {
        note_type
            .governing_level()
            .map_or(false, |level| self.division(level) == Division::Ternary)
    }

    /// Length in minims of an uncolored, unaltered note value
    pub fn note_length(&self, note_type: NoteType) -> Proportion {
        let semibrevis = self.prolatio.factor();
        let brevis = semibrevis * self.tempus.factor();
        let longa = brevis * self.modus_minor.factor();
        let maxima = longa * self.modus_maior.factor();
        match note_type {
            NoteType::Semifusa => Proportion::new(1, 8),
            NoteType::Fusa => Proportion::new(1, 4),
            NoteType::Semiminima => Proportion::new(1, 2),
            NoteType::Minima => Proportion::ONE,
            NoteType::Semibrevis => Proportion::whole(semibrevis),
            NoteType::Brevis => Proportion::whole(brevis),
            NoteType::Longa => Proportion::whole(longa),
            NoteType::Maxima => Proportion::whole(maxima),
        }
    }

    /// Length of a perfect note reduced by one third of its value
    pub fn imperfected_length(&self, note_type: NoteType) -> Proportion {
        let full = self.note_length(note_type);
        if self.is_perfect(note_type) {
            full * Proportion::new(2, 3)
        } else {
            full
        }
    }

    /// Length of the second of two equal notes doubled by alteration
    pub fn altered_length(&self, note_type: NoteType) -> Proportion {
        self.note_length(note_type) * Proportion::whole(2)
    }

    /// Coloration takes away a third: perfect values become imperfect,
    /// imperfect values run in sesquialtera
    pub fn colored_length(&self, note_type: NoteType) -> Proportion {
        self.note_length(note_type) * Proportion::new(2, 3)
    }

    /// Dot of addition adds half the value
    pub fn dotted_length(&self, note_type: NoteType) -> Proportion {
        self.note_length(note_type) * Proportion::new(3, 2)
    }

    pub fn breve_length(&self) -> Proportion {
        self.note_length(NoteType::Brevis)
    }
}

/// Main graphic component of a mensuration sign
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MensSymbol {
    Circle,
    Semicircle,
    ReversedSemicircle,
    Number(u32),
}

/// One graphic mensuration sign (O, C, C|, O., 3, ...)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MensSign {
    pub symbol: MensSymbol,
    pub stroke: bool,
    pub dot: bool,
}

impl MensSign {
    pub fn new(symbol: MensSymbol) -> Self {
        Self {
            symbol,
            stroke: false,
            dot: false,
        }
    }

    pub fn stroked(mut self) -> Self {
        self.stroke = true;
        self
    }

    pub fn dotted(mut self) -> Self {
        self.dot = true;
        self
    }

    /// Apply this sign's conventional meaning on top of a base mensuration
    pub fn apply_to(&self, base: Mensuration) -> Mensuration {
        let mut m = base;
        match self.symbol {
            MensSymbol::Circle => m.tempus = Division::Ternary,
            MensSymbol::Semicircle | MensSymbol::ReversedSemicircle => m.tempus = Division::Binary,
            MensSymbol::Number(n) => {
                m.tempo_change = m.tempo_change * Proportion::whole(i64::from(n.max(1)));
            }
        }
        if !matches!(self.symbol, MensSymbol::Number(_)) {
            m.prolatio = if self.dot { Division::Ternary } else { Division::Binary };
        }
        if self.stroke {
            m.tempo_change = m.tempo_change * Proportion::whole(2);
        }
        m
    }
}

/// Conventional mensuration implied by a sequence of signs, starting from binary defaults
pub fn implied_mensuration(signs: &[MensSign]) -> Mensuration {
    signs
        .iter()
        .fold(Mensuration::default(), |m, sign| sign.apply_to(m))
}
