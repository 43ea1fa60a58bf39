//! Errors shared by the packet decoder and the snailfish reducer.

use crate::bits::OpKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A character in the transmission is not a hex digit.
    #[error("invalid hex digit {digit:?} at offset {offset}")]
    InvalidHexDigit { digit: char, offset: usize },

    /// A snailfish number does not follow the bracketed pair grammar.
    #[error("syntax error in {text:?}: {reason}")]
    SyntaxError { text: String, reason: &'static str },

    /// The pairwise search needs two numbers to add.
    #[error("need at least two numbers, got {count}")]
    NotEnoughNumbers { count: usize },

    #[error("cannot read {wanted} bits at bit {position} of a {len}-bit stream")]
    TruncatedStream { position: usize, wanted: usize, len: usize },

    /// A type id has no operator, or an operator got the wrong number of operands.
    #[error("invalid operator type {type_id} with {operands} operand(s)")]
    InvalidOperator { type_id: u8, operands: usize },

    #[error("{what} does not fit in 64 bits")]
    Overflow { what: &'static str },
}

impl Error {
    pub(crate) fn arity(op: OpKind, operands: usize) -> Self {
        Error::InvalidOperator { type_id: op.type_id(), operands }
    }

    pub(crate) fn syntax(text: &str, reason: &'static str) -> Self {
        Error::SyntaxError { text: text.to_owned(), reason }
    }

    /// True for the errors caused by text that is not in the expected format.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidHexDigit { .. } | Error::SyntaxError { .. } | Error::NotEnoughNumbers { .. }
        )
    }
}
