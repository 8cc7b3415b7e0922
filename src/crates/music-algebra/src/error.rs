use thiserror::Error;

pub type Result<T> = std::result::Result<T, MusicError>;

/// Errors surfaced by rational arithmetic and the performance interpreter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MusicError {
    /// A division (or an operand) had a zero denominator
    #[error("division by zero in {numerator}/{denominator}")]
    DivisionByZero { numerator: i64, denominator: i64 },

    /// An intermediate value left the `i64` range
    #[error("integer overflow during rational {op}")]
    Overflow { op: &'static str },

    #[error("MIDI channel {0} is outside 1..=16")]
    InvalidChannel(u8),

    #[error("unknown pitch class '{0}'")]
    UnknownPitchClass(String),

    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error("invalid rational '{0}', expected n/d or n")]
    InvalidRational(String),
}

impl MusicError {
    pub fn division_by_zero(numerator: i64, denominator: i64) -> Self {
        MusicError::DivisionByZero {
            numerator,
            denominator,
        }
    }

    pub fn overflow(op: &'static str) -> Self {
        MusicError::Overflow { op }
    }
}
