// Label and state identifiers.
//
// Text labels are Unicode scalar values. Everything at or above
// RESERVED_LABEL_BASE is outside the char range and is used for boundary
// symbols and internal markers.

use crate::FstError;

/// Arc label. `0` is epsilon.
pub type Label = u32;

/// Dense state index.
pub type StateId = usize;

/// The empty label.
pub const EPSILON: Label = 0;

/// Sentinel returned by `start()` on an automaton without a start state.
pub const NO_STATE_ID: StateId = usize::MAX;

/// First label past the Unicode range.
pub const RESERVED_LABEL_BASE: Label = 0x0011_0000;

/// Beginning-of-string boundary, written `[BOS]` in text.
pub const BOS: Label = RESERVED_LABEL_BASE;

/// End-of-string boundary, written `[EOS]` in text.
pub const EOS: Label = RESERVED_LABEL_BASE + 1;

/// Label for a character.
#[inline]
pub fn char_label(ch: char) -> Label {
    ch as Label
}

/// Character for a label, if it is a non-epsilon Unicode scalar value.
#[inline]
pub fn label_char(label: Label) -> Option<char> {
    if label == EPSILON {
        return None;
    }
    char::from_u32(label)
}

/// Labels for every character of `s`, in order.
pub fn string_labels(s: &str) -> Vec<Label> {
    s.chars().map(char_label).collect()
}

/// Render a label sequence as text. Epsilons are skipped; boundary labels
/// render as `[BOS]`/`[EOS]`.
pub fn labels_to_string(labels: &[Label]) -> Result<String, FstError> {
    let mut out = String::with_capacity(labels.len());
    for &label in labels {
        match label {
            EPSILON => {}
            BOS => out.push_str("[BOS]"),
            EOS => out.push_str("[EOS]"),
            _ => out.push(label_char(label).ok_or(FstError::UnrepresentableLabel(label))?),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_code_points() {
        assert_eq!(char_label('a'), 97);
        assert_eq!(label_char(0x00e4), Some('\u{00e4}'));
        assert_eq!(label_char(EPSILON), None);
        assert_eq!(label_char(BOS), None);
    }

    #[test]
    fn render_skips_epsilon() {
        let labels = [char_label('a'), EPSILON, char_label('b')];
        assert_eq!(labels_to_string(&labels).unwrap(), "ab");
    }

    #[test]
    fn render_boundaries() {
        let labels = [BOS, char_label('x'), EOS];
        assert_eq!(labels_to_string(&labels).unwrap(), "[BOS]x[EOS]");
    }

    #[test]
    fn reject_marker_labels() {
        let err = labels_to_string(&[RESERVED_LABEL_BASE + 7]).unwrap_err();
        assert_eq!(err, FstError::UnrepresentableLabel(RESERVED_LABEL_BASE + 7));
    }

    #[test]
    fn round_trip_multibyte() {
        let labels = string_labels("k\u{00e4}si");
        assert_eq!(labels.len(), 4);
        assert_eq!(labels_to_string(&labels).unwrap(), "k\u{00e4}si");
    }
}
