//! ClefSet: a principal clef plus the signature accidentals sounding with it
//!
//! The first clef is the principal one (when the set has one); the remainder are
//! accidentals in the order they were written. Duplicate accidentals are skipped
//! rather than stored, and the derived key signature is recomputed whenever
//! membership changes.

use super::clef::Clef;
use super::key_signature::ModernKeySignature;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClefSet {
    clefs: Vec<Clef>,
    key_signature: ModernKeySignature,
}

impl ClefSet {
    pub fn new(first: Clef) -> Self {
        let mut set = Self {
            clefs: vec![first],
            key_signature: ModernKeySignature::new(),
        };
        set.recompute_key_signature();
        set
    }

    pub fn from_clefs(clefs: impl IntoIterator<Item = Clef>, use_modern: bool) -> Option<Self> {
        let mut iter = clefs.into_iter();
        let mut set = ClefSet::new(iter.next()?);
        for clef in iter {
            set.add_clef(clef, use_modern);
        }
        Some(set)
    }

    pub fn principal(&self) -> Option<&Clef> {
        self.clefs.first().filter(|c| c.is_principal())
    }

    /// Accidental tail (everything after a leading principal clef)
    pub fn accidentals(&self) -> &[Clef] {
        let skip = usize::from(self.principal().is_some());
        &self.clefs[skip..]
    }

    pub fn clefs(&self) -> &[Clef] {
        &self.clefs
    }

    pub fn len(&self) -> usize {
        self.clefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clefs.is_empty()
    }

    pub fn key_signature(&self) -> &ModernKeySignature {
        &self.key_signature
    }

    pub fn contains(&self, clef: &Clef) -> bool {
        self.clefs.contains(clef)
    }

    /// Insert a clef, returning whether membership changed.
    ///
    /// In modern mode the clef is first replaced by its modern equivalent relative to
    /// this set's principal. An accidental equivalent to one already present is
    /// skipped. A principal clef replaces the current principal.
    pub fn add_clef(&mut self, clef: Clef, use_modern: bool) -> bool {
        let clef = if use_modern {
            clef.modern_equivalent(self.principal())
        } else {
            clef
        };

        if clef.is_principal() {
            return match self.principal() {
                Some(p) if *p == clef => false,
                Some(_) => {
                    self.clefs[0] = clef;
                    self.recompute_key_signature();
                    true
                }
                None => {
                    self.clefs.insert(0, clef);
                    self.recompute_key_signature();
                    true
                }
            };
        }

        if self.contains(&clef) || self.clefs.iter().any(|c| c.is_equivalent_accidental(&clef)) {
            log::trace!("skipping duplicate accidental {:?} {}", clef.clef_type, clef.pitch);
            return false;
        }
        self.clefs.push(clef);
        self.recompute_key_signature();
        true
    }

    fn recompute_key_signature(&mut self) {
        self.key_signature = ModernKeySignature::from_clefs(self.accidentals().iter());
    }

    /// Same principal, and `prev`'s clefs form a prefix of this set
    pub fn extends(&self, prev: &ClefSet) -> bool {
        self.principal() == prev.principal()
            && prev.clefs.len() <= self.clefs.len()
            && prev.clefs.iter().zip(&self.clefs).all(|(a, b)| a == b)
    }

    /// Whether two sets disagree.
    ///
    /// Exact mode compares position by position (type, location, pitch). Modern mode
    /// compares only the principals' modern forms (both replaced by `suggested` when a
    /// voice-level override exists) and then the derived key signatures.
    pub fn contradicts(&self, other: &ClefSet, use_modern: bool, suggested: Option<&Clef>) -> bool {
        if !use_modern {
            return self.clefs.len() != other.clefs.len()
                || self.clefs.iter().zip(&other.clefs).any(|(a, b)| {
                    a.clef_type != b.clef_type || a.line_space != b.line_space || a.pitch != b.pitch
                });
        }

        if suggested.is_none() {
            let modern_type = |set: &ClefSet| {
                set.principal()
                    .map(|p| p.modern_equivalent(None))
                    .map(|m| (m.clef_type, m.line_space))
            };
            if modern_type(self) != modern_type(other) {
                return true;
            }
        }
        self.key_signature != other.key_signature
    }

    /// Signature-only comparison: skip leading principals, compare accidental tails
    /// position by position (alteration and letter).
    pub fn sig_contradicts(&self, other: &ClefSet) -> bool {
        let a = self.accidentals();
        let b = other.accidentals();
        a.len() != b.len()
            || a.iter().zip(b).any(|(x, y)| {
                x.clef_type.accidental() != y.clef_type.accidental() || x.pitch.letter != y.pitch.letter
            })
    }
}
