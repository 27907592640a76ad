// Duration helpers for MusicXML export

use crate::models::proportion::Proportion;

/// Plain note values as (length in quarters, MusicXML type name), longest first
const NOTE_TYPES: [(i64, i64, &str); 9] = [
    (16, 1, "long"),
    (8, 1, "breve"),
    (4, 1, "whole"),
    (2, 1, "half"),
    (1, 1, "quarter"),
    (1, 2, "eighth"),
    (1, 4, "16th"),
    (1, 8, "32nd"),
    (1, 16, "64th"),
];

/// Convert a duration (in quarter notes) to a MusicXML note type and dot count
///
/// Matches plain, dotted and double-dotted values exactly. Durations with no plain
/// notation (proportional groups, values split across barlines) return `None` and
/// are exported without a `<type>`.
///
/// # Examples
/// ```
/// use mensural_engine::models::Proportion;
/// use mensural_engine::renderers::musicxml::duration::duration_to_note_type;
///
/// assert_eq!(duration_to_note_type(Proportion::ONE), Some(("quarter", 0)));
/// assert_eq!(duration_to_note_type(Proportion::new(3, 4)), Some(("eighth", 1)));
/// ```
pub fn duration_to_note_type(quarters: Proportion) -> Option<(&'static str, usize)> {
    NOTE_TYPES.iter().find_map(|&(num, den, name)| {
        let base = Proportion::new(num, den);
        [Proportion::ONE, Proportion::new(3, 2), Proportion::new(7, 4)]
            .iter()
            .position(|factor| base * *factor == quarters)
            .map(|dots| (name, dots))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breve_and_long() {
        assert_eq!(duration_to_note_type(Proportion::whole(8)), Some(("breve", 0)));
        assert_eq!(duration_to_note_type(Proportion::whole(16)), Some(("long", 0)));
        assert_eq!(duration_to_note_type(Proportion::whole(12)), Some(("breve", 1)));
    }

    #[test]
    fn test_whole_note() {
        assert_eq!(duration_to_note_type(Proportion::whole(4)), Some(("whole", 0)));
    }

    #[test]
    fn test_dotted_half() {
        assert_eq!(duration_to_note_type(Proportion::whole(3)), Some(("half", 1)));
    }

    #[test]
    fn test_double_dotted_quarter() {
        assert_eq!(duration_to_note_type(Proportion::new(7, 4)), Some(("quarter", 2)));
    }

    #[test]
    fn test_unreduced_input() {
        assert_eq!(duration_to_note_type(Proportion::new(4, 8)), Some(("eighth", 0)));
    }

    #[test]
    fn test_no_plain_notation() {
        // triplet quarter and a value split by a barline
        assert_eq!(duration_to_note_type(Proportion::new(2, 3)), None);
        assert_eq!(duration_to_note_type(Proportion::whole(5)), None);
    }
}
