//! Button event types and the bitmask transition diff.

/// Number of keys on the attached TTP229 board, selected by the TP2 strap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCount {
    /// 8-key board; samples use the low 8 bits.
    Eight,
    /// 16-key board.
    Sixteen,
}

impl KeyCount {
    /// Number of clock cycles per sample, and the highest key number.
    pub fn keys(self) -> u8 {
        match self {
            KeyCount::Eight => 8,
            KeyCount::Sixteen => 16,
        }
    }
}

/// A single press or release transition.
///
/// `key` is 1-based: bit 0 of a bitmask sample corresponds to key 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// The key that changed, 1..=16.
    pub key: u8,
    /// `true` for a release, `false` for a press.
    pub released: bool,
    /// Other changed bits remain after this one; call again promptly instead
    /// of waiting for another edge.
    pub more_pending: bool,
}

/// Diffs two bitmask samples and picks the single transition to report.
///
/// Presses win over releases when both are present, and the lowest-numbered
/// key wins within the chosen kind.
pub(crate) fn next_transition(previous: u16, current: u16) -> Option<ButtonEvent> {
    let changes = previous ^ current;
    if changes == 0 {
        return None;
    }

    let pressed = changes & current;
    let (candidates, released) = if pressed != 0 {
        (pressed, false)
    } else {
        (changes & previous, true)
    };

    let bit = candidates & candidates.wrapping_neg();
    Some(ButtonEvent {
        key: bit.trailing_zeros() as u8 + 1,
        released,
        more_pending: changes & !bit != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_change_yields_nothing() {
        assert_eq!(next_transition(0x0000, 0x0000), None);
        assert_eq!(next_transition(0x8421, 0x8421), None);
    }

    #[test]
    fn press_reported_before_release_of_same_key() {
        // A touch-and-lift pair must always come out press first.
        let press = next_transition(0x0000, 0x0008).unwrap();
        assert_eq!((press.key, press.released), (4, false));
        let release = next_transition(0x0008, 0x0000).unwrap();
        assert_eq!((release.key, release.released), (4, true));
    }

    #[test]
    fn press_wins_over_release_in_one_sample() {
        // Key 1 lifted and key 2 touched between two samples.
        let ev = next_transition(0b01, 0b10).unwrap();
        assert_eq!((ev.key, ev.released), (2, false));
        assert!(ev.more_pending, "release of key 1 still outstanding");
    }

    #[test]
    fn lowest_key_first_within_a_kind() {
        let ev = next_transition(0x0000, 0b10100).unwrap();
        assert_eq!((ev.key, ev.released), (3, false));
        assert!(ev.more_pending);

        let ev = next_transition(0b10100, 0x0000).unwrap();
        assert_eq!((ev.key, ev.released), (3, true));
        assert!(ev.more_pending);
    }

    #[test]
    fn single_change_has_nothing_pending() {
        let ev = next_transition(0x0000, 0x8000).unwrap();
        assert_eq!((ev.key, ev.released, ev.more_pending), (16, false, false));
    }
}
