//! Error types.
//!
//! Only decode and rule-table failures are reported as values. Schema
//! violations on the encode side (a field straddling a byte boundary, a
//! write past an exactly-sized buffer) are assertions: the format and the
//! code producing it are designed together, so hitting one is a bug.

use thiserror::Error;

use super::RuleId;

/// Result alias for rule decoding.
pub type FormatResult<T> = Result<T, FormatError>;

/// A packed rule record that cannot be decoded.
///
/// Decoding is all-or-nothing: any of these aborts `unpack` without
/// producing a partial rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("rule record truncated at byte {offset}")]
    UnexpectedEnd { offset: usize },

    #[error("rule record has {extra} trailing bytes")]
    TrailingBytes { extra: usize },

    #[error("invalid {field} value {value}")]
    InvalidField { field: &'static str, value: u8 },

    #[error("when-do at ({col},{row}) lies outside the 5x5 window")]
    CoordOutOfWindow { col: u8, row: u8 },

    #[error("duplicate when-do at ({col},{row})")]
    DuplicateWhenDo { col: u8, row: u8 },
}

/// Rule table failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("{0} is already in use")]
    IdInUse(RuleId),

    #[error("{0} is out of range")]
    IdOutOfRange(RuleId),

    #[error("no rule ids left")]
    IdsExhausted,

    #[error("failed to decode {id}: {source}")]
    Format {
        id: RuleId,
        #[source]
        source: FormatError,
    },
}
