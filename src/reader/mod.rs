//! Reading symbols out of text, and folding them into trees.
//!
//! Reading happens in two stages:
//! - The [`Tokenizer`] pulls characters from a [`Source`] and cuts them into
//!   terminal symbols, using a priority list of [`Matcher`]s.
//! - The [`Parser`] takes those symbols in order, and folds runs of them into
//!   nonterminal nodes according to its [`Grammar`].

mod grammar;
mod matcher;
mod parse;
mod source;
mod token;


pub use grammar::{Definition, Grammar, Sequence, SequenceNode};
pub use matcher::{Literal, Match, Matcher, RegexMatcher};
pub use parse::{Parser, ParserConfig, TokenQueue};
pub use source::{CharSource, ReadSource, Source};
pub use token::{Tokenizer, TokenizerConfig};

/// Error type for reading.
///
/// The variants separate problems by who can fix them:
/// - A `Configuration` error is a bad pattern, production, or buffer size.
///   It is reported when the bad item is registered, and nothing is changed.
/// - A `Precondition` error is a call made in the wrong state,
///   e.g. popping from an empty queue, or running before binding input.
/// - `Exhausted` means the input needs more room than the reader was given:
///   a partial match that fills the whole buffer, or a grammar that keeps
///   folding without end.
/// - `Io` is a failure of the underlying input.
#[derive(Debug)]
pub enum Error {
    Configuration(String),
    Precondition(String),
    Exhausted(String),
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            Error::Configuration(e) => write!(f, "configuration error: {e}"),
            Error::Precondition(e) => write!(f, "precondition violated: {e}"),
            Error::Exhausted(e) => write!(f, "resource exhausted: {e}"),
            Error::Io(e) => write!(f, "input error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        let more = more.as_ref();
        match self {
            Error::Configuration(e) => Error::Configuration(format!("{more}: {e}")),
            Error::Precondition(e) => Error::Precondition(format!("{more}: {e}")),
            Error::Exhausted(e) => Error::Exhausted(format!("{more}: {e}")),
            Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), format!("{more}: {e}"))),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}

/// The main result type for this module.
pub type Result<T> = std::result::Result<T, Error>;
