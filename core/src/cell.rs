use crate::{ExperimentError, Result};

/// Participant-visible cell, decoded once from the wire integers.
///
/// Every negative value the backend does not give a meaning to renders as
/// an unannotated unrevealed cell; positive values above 8 cannot be a
/// mine count and are rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StateCell {
    Unrevealed,
    Revealed(u8),
    RevealedMine,
    Flagged,
    MarkedSafe,
    Probe,
}

impl StateCell {
    pub fn from_code(code: i32) -> Result<Self> {
        Ok(match code {
            0..=8 => Self::Revealed(code as u8),
            -2 => Self::RevealedMine,
            -3 => Self::Flagged,
            -4 => Self::MarkedSafe,
            -5 => Self::Probe,
            code if code < 0 => Self::Unrevealed,
            code => return Err(ExperimentError::InvalidCellCode(code)),
        })
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Unrevealed => -1,
            Self::Revealed(count) => count as i32,
            Self::RevealedMine => -2,
            Self::Flagged => -3,
            Self::MarkedSafe => -4,
            Self::Probe => -5,
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::Unrevealed
    }
}

/// Ground-truth cell from the stimulus board.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoardCell {
    Mine,
    Clear(u8),
}

impl BoardCell {
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            -1 => Ok(Self::Mine),
            0..=8 => Ok(Self::Clear(code as u8)),
            code => Err(ExperimentError::InvalidCellCode(code)),
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            Self::Mine => -1,
            Self::Clear(count) => count as i32,
        }
    }

    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_sentinels_decode_to_their_variants() {
        assert_eq!(StateCell::from_code(0).unwrap(), StateCell::Revealed(0));
        assert_eq!(StateCell::from_code(3).unwrap(), StateCell::Revealed(3));
        assert_eq!(StateCell::from_code(-2).unwrap(), StateCell::RevealedMine);
        assert_eq!(StateCell::from_code(-3).unwrap(), StateCell::Flagged);
        assert_eq!(StateCell::from_code(-4).unwrap(), StateCell::MarkedSafe);
        assert_eq!(StateCell::from_code(-5).unwrap(), StateCell::Probe);
    }

    #[test]
    fn unassigned_negatives_are_plain_unrevealed() {
        assert_eq!(StateCell::from_code(-1).unwrap(), StateCell::Unrevealed);
        assert_eq!(StateCell::from_code(-6).unwrap(), StateCell::Unrevealed);
        assert_eq!(StateCell::from_code(-100).unwrap(), StateCell::Unrevealed);
    }

    #[test]
    fn counts_above_eight_are_rejected() {
        assert_eq!(
            StateCell::from_code(9),
            Err(ExperimentError::InvalidCellCode(9))
        );
        assert_eq!(
            BoardCell::from_code(9),
            Err(ExperimentError::InvalidCellCode(9))
        );
        assert_eq!(
            BoardCell::from_code(-2),
            Err(ExperimentError::InvalidCellCode(-2))
        );
    }

    #[test]
    fn sentinel_codes_survive_reencoding() {
        for code in [-5, -4, -3, -2, 0, 1, 8] {
            assert_eq!(StateCell::from_code(code).unwrap().code(), code);
        }
        assert_eq!(BoardCell::Mine.code(), -1);
        assert_eq!(BoardCell::Clear(2).code(), 2);
    }
}
