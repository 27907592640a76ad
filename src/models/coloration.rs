//! Coloration schemes
//!
//! Color changes are relative: a change names the new primary color/fill, and the
//! color it replaces becomes the secondary (the one used for individually colored
//! notes). Switching back restores the original pair.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Black,
    Red,
    Blue,
    Green,
    Yellow,
    White,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fill {
    Full,
    Void,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSpec {
    pub color: Color,
    pub fill: Fill,
}

impl ColorSpec {
    pub const fn new(color: Color, fill: Fill) -> Self {
        Self { color, fill }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coloration {
    pub primary: ColorSpec,
    pub secondary: ColorSpec,
}

impl Coloration {
    /// White mensural notation: void noteheads, coloration in full black
    pub const DEFAULT: Coloration = Coloration {
        primary: ColorSpec::new(Color::Black, Fill::Void),
        secondary: ColorSpec::new(Color::Black, Fill::Full),
    };

    pub fn new(primary: ColorSpec, secondary: ColorSpec) -> Self {
        Self { primary, secondary }
    }

    /// Apply a color change on top of this scheme
    pub fn compose(&self, change: &Coloration) -> Coloration {
        if change.primary == self.primary {
            *self
        } else {
            Coloration {
                primary: change.primary,
                secondary: self.primary,
            }
        }
    }

    /// Whether notes drawn in this scheme read as colored against a base scheme
    pub fn is_colored_against(&self, base: &Coloration) -> bool {
        self.primary != base.primary
    }

    /// Color a note is drawn with, given its own colored flag
    pub fn note_spec(&self, note_colored: bool) -> ColorSpec {
        if note_colored {
            self.secondary
        } else {
            self.primary
        }
    }
}

impl Default for Coloration {
    fn default() -> Self {
        Self::DEFAULT
    }
}
