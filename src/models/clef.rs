//! Clefs: principal clefs, accidental (signature) clefs and their modern equivalents
//!
//! Staff locations use the same numbering as [`Pitch::staff_position`]: 0 is the bottom
//! line, 1 the first space, 8 the top line of a five-line staff.

use super::pitch::{Accidental, NoteLetter, Pitch};
use crate::error::ModelParseError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClefType {
    C,
    F,
    G,
    Gamma,
    FRound,
    FSquare,
    ModernG,
    ModernG8,
    ModernF,
    ModernC,
    Bmol,
    BmolDouble,
    Bqua,
    Diesis,
    ModernFlat,
    ModernNatural,
    ModernSharp,
    None,
}

static CLEF_NAMES: Lazy<HashMap<&'static str, ClefType>> = Lazy::new(|| {
    [
        ("C", ClefType::C),
        ("F", ClefType::F),
        ("G", ClefType::G),
        ("Gamma", ClefType::Gamma),
        ("Frnd", ClefType::FRound),
        ("Fsqr", ClefType::FSquare),
        ("MODERNG", ClefType::ModernG),
        ("MODERNG8", ClefType::ModernG8),
        ("MODERNF", ClefType::ModernF),
        ("MODERNC", ClefType::ModernC),
        ("Bmol", ClefType::Bmol),
        ("BmolDouble", ClefType::BmolDouble),
        ("Bqua", ClefType::Bqua),
        ("Diesis", ClefType::Diesis),
        ("MODERNFlat", ClefType::ModernFlat),
        ("MODERNNatural", ClefType::ModernNatural),
        ("MODERNSharp", ClefType::ModernSharp),
        ("NONE", ClefType::None),
    ]
    .into_iter()
    .collect()
});

impl ClefType {
    pub fn name(&self) -> &'static str {
        CLEF_NAMES
            .iter()
            .find(|(_, t)| *t == self)
            .map(|(name, _)| *name)
            .unwrap_or("NONE")
    }

    /// Clefs that fix staff pitch (as opposed to accidentals)
    pub fn is_principal(&self) -> bool {
        matches!(
            self,
            ClefType::C
                | ClefType::F
                | ClefType::G
                | ClefType::Gamma
                | ClefType::FRound
                | ClefType::FSquare
                | ClefType::ModernG
                | ClefType::ModernG8
                | ClefType::ModernF
                | ClefType::ModernC
        )
    }

    pub fn is_modern(&self) -> bool {
        matches!(
            self,
            ClefType::ModernG
                | ClefType::ModernG8
                | ClefType::ModernF
                | ClefType::ModernC
                | ClefType::ModernFlat
                | ClefType::ModernNatural
                | ClefType::ModernSharp
        )
    }

    /// Alteration expressed by an accidental clef
    pub fn accidental(&self) -> Option<Accidental> {
        match self {
            ClefType::Bmol | ClefType::BmolDouble | ClefType::ModernFlat => Some(Accidental::Flat),
            ClefType::Bqua | ClefType::ModernNatural => Some(Accidental::Natural),
            ClefType::Diesis | ClefType::ModernSharp => Some(Accidental::Sharp),
            _ => None,
        }
    }

    pub fn is_accidental(&self) -> bool {
        self.accidental().is_some()
    }

    pub fn is_flat(&self) -> bool {
        self.accidental() == Some(Accidental::Flat)
    }

    pub fn is_sharp(&self) -> bool {
        self.accidental() == Some(Accidental::Sharp)
    }

    /// Pitch a principal clef names when none is given explicitly
    pub fn default_pitch(&self) -> Option<Pitch> {
        match self {
            ClefType::C | ClefType::ModernC => Some(Pitch::new(NoteLetter::C, 4)),
            ClefType::F | ClefType::FRound | ClefType::FSquare | ClefType::ModernF => {
                Some(Pitch::new(NoteLetter::F, 3))
            }
            ClefType::G | ClefType::ModernG => Some(Pitch::new(NoteLetter::G, 4)),
            ClefType::ModernG8 => Some(Pitch::new(NoteLetter::G, 3)),
            ClefType::Gamma => Some(Pitch::new(NoteLetter::G, 2)),
            _ => None,
        }
    }

    /// Modern accidental clef for a traditional one
    fn modern_accidental(&self) -> ClefType {
        match self.accidental() {
            Some(Accidental::Flat) => ClefType::ModernFlat,
            Some(Accidental::Natural) => ClefType::ModernNatural,
            Some(Accidental::Sharp) => ClefType::ModernSharp,
            None => ClefType::None,
        }
    }
}

impl FromStr for ClefType {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CLEF_NAMES
            .get(s)
            .copied()
            .ok_or_else(|| ModelParseError::Clef(s.to_string()))
    }
}

/// Family a principal clef belongs to for modern key-signature placement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClefFamily {
    G,
    G8,
    C,
    F,
}

impl ClefFamily {
    fn of(clef_type: ClefType) -> ClefFamily {
        match clef_type {
            ClefType::ModernG8 => ClefFamily::G8,
            ClefType::C | ClefType::ModernC => ClefFamily::C,
            ClefType::F | ClefType::FRound | ClefType::FSquare | ClefType::ModernF | ClefType::Gamma => {
                ClefFamily::F
            }
            _ => ClefFamily::G,
        }
    }

    /// Octave in which the conventional signature window starts
    fn signature_octave(&self) -> i8 {
        match self {
            ClefFamily::G => 4,
            ClefFamily::G8 | ClefFamily::C => 3,
            ClefFamily::F => 2,
        }
    }
}

/// Modern form a clef is displayed as when modern clefs are requested
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModernClef {
    pub clef_type: ClefType,
    pub line_space: i32,
    pub pitch: Pitch,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Clef {
    pub clef_type: ClefType,
    /// Staff location of the clef's reference pitch
    pub line_space: i32,
    pub pitch: Pitch,
    /// Part of the key signature rather than an inline accidental
    pub signature: bool,
    /// Derived at construction; see [`Clef::modern_equivalent`] for context-aware form
    pub modern: Option<ModernClef>,
}

impl PartialEq for Clef {
    fn eq(&self, other: &Self) -> bool {
        self.clef_type == other.clef_type
            && self.line_space == other.line_space
            && self.pitch == other.pitch
            && self.signature == other.signature
    }
}

impl Eq for Clef {}

impl Clef {
    pub fn new(clef_type: ClefType, line_space: i32, pitch: Pitch, signature: bool) -> Self {
        // principal clefs always belong to the signature
        let signature = signature || clef_type.is_principal();
        let mut clef = Self {
            clef_type,
            line_space,
            pitch,
            signature,
            modern: None,
        };
        clef.modern = default_modern_clef(&clef);
        clef
    }

    /// Principal clef at its conventional pitch
    pub fn principal(clef_type: ClefType, line_space: i32) -> Self {
        let pitch = clef_type
            .default_pitch()
            .unwrap_or(Pitch::new(NoteLetter::C, 4));
        Self::new(clef_type, line_space, pitch, true)
    }

    /// Signature accidental at a pitch, positioned relative to a principal clef
    pub fn accidental(clef_type: ClefType, pitch: Pitch, principal: &Clef) -> Self {
        let line_space = principal.staff_position_of(&pitch);
        Self::new(clef_type, line_space, pitch, true)
    }

    pub fn is_principal(&self) -> bool {
        self.clef_type.is_principal()
    }

    pub fn is_accidental(&self) -> bool {
        self.clef_type.is_accidental()
    }

    /// Staff position of a pitch under this principal clef
    pub fn staff_position_of(&self, pitch: &Pitch) -> i32 {
        pitch.staff_position(&self.pitch, self.line_space)
    }

    /// Pitch sitting at a staff position under this principal clef
    pub fn pitch_at(&self, position: i32) -> Pitch {
        Pitch::at_staff_position(position, &self.pitch, self.line_space)
    }

    /// Same alteration of the same letter, octave ignored
    pub fn is_equivalent_accidental(&self, other: &Clef) -> bool {
        self.clef_type.accidental().is_some()
            && self.clef_type.accidental() == other.clef_type.accidental()
            && self.pitch.letter == other.pitch.letter
    }

    /// Best modern clef for this one, relative to the principal clef of its set.
    ///
    /// Accidentals are moved into the conventional key-signature octave for the
    /// principal's family, so a B-flat lands on B4 under a G clef, B3 under a C clef
    /// and B2 under an F clef.
    pub fn modern_equivalent(&self, principal: Option<&Clef>) -> Clef {
        if self.is_principal() {
            return match self.modern {
                Some(m) => Clef::new(m.clef_type, m.line_space, m.pitch, true),
                None => *self,
            };
        }
        let accidental = match self.clef_type.accidental() {
            Some(a) => a,
            None => return *self,
        };
        let modern_principal = principal.map(|p| p.modern_equivalent(None));
        let family = modern_principal
            .as_ref()
            .map_or(ClefFamily::G, |p| ClefFamily::of(p.clef_type));
        let window_start_letter = match accidental {
            Accidental::Sharp => NoteLetter::A,
            _ => NoteLetter::F,
        };
        let start = Pitch::new(window_start_letter, family.signature_octave()).place_number();
        let offset = (self.pitch.letter.index() - window_start_letter.index()).rem_euclid(7);
        let pitch = Pitch::from_place_number(start + offset);
        let line_space = match modern_principal {
            Some(p) => p.staff_position_of(&pitch),
            None => pitch.staff_position(&Pitch::new(NoteLetter::G, 4), 2),
        };
        Clef::new(self.clef_type.modern_accidental(), line_space, pitch, self.signature)
    }
}

/// Modern clef derived from type and staff range at construction time
fn default_modern_clef(clef: &Clef) -> Option<ModernClef> {
    let clef_type = clef.clef_type;
    if clef_type == ClefType::None {
        return None;
    }
    if clef_type.is_modern() {
        return Some(ModernClef {
            clef_type,
            line_space: clef.line_space,
            pitch: clef.pitch,
        });
    }
    if clef_type.is_accidental() {
        return Some(ModernClef {
            clef_type: clef_type.modern_accidental(),
            line_space: clef.line_space,
            pitch: clef.pitch,
        });
    }

    // pitch at the middle line decides the modern family
    let center = clef.pitch_at(4).place_number();
    let (modern_type, pitch, line_space) = if center >= Pitch::new(NoteLetter::E, 4).place_number() {
        (ClefType::ModernG, Pitch::new(NoteLetter::G, 4), 2)
    } else if center >= Pitch::new(NoteLetter::A, 3).place_number() {
        (ClefType::ModernG8, Pitch::new(NoteLetter::G, 3), 2)
    } else {
        (ClefType::ModernF, Pitch::new(NoteLetter::F, 3), 6)
    };
    Some(ModernClef {
        clef_type: modern_type,
        line_space,
        pitch,
    })
}
