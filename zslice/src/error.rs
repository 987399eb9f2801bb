//! Module containing the zslice universal error type
use thiserror::Error;

/// Universal error type for zslice
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Character that can't start any token
    #[error("unexpected character '{1}' at offset {0}")]
    UnexpectedChar(usize, char),

    /// Token that doesn't fit the grammar at this position
    #[error("unexpected '{1}' at offset {0}")]
    UnexpectedToken(usize, String),

    /// Expression ended early (e.g. an unclosed parenthesis)
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// Expression is empty
    #[error("expression is empty")]
    EmptyExpression,

    /// Identifier is not a variable, constant, or known function
    #[error("unknown identifier '{1}' at offset {0}")]
    UnknownIdent(usize, String),

    /// Function was called with the wrong number of arguments
    #[error("{name}() takes {expected} argument(s), got {got}")]
    BadArity {
        /// Function name
        name: &'static str,
        /// Number of arguments expected by the function
        expected: usize,
        /// Number of arguments provided
        got: usize,
    },

    /// Expression is nested more deeply than the parser allows
    #[error("expression is nested too deeply (more than {0} levels)")]
    TooDeep(usize),

    /// Numeric literal could not be parsed
    #[error("bad number '{1}' at offset {0}")]
    BadNumber(usize, String),

    /// A setting is outside of its valid range
    #[error("invalid setting `{0}`: {1}")]
    InvalidSetting(&'static str, String),
}
