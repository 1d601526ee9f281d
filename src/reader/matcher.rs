//! Matchers: the patterns that terminals are recognized by.
//!
//! The tokenizer does not care about pattern syntax. Anything that can answer
//! "where is the leftmost match in this text, and could the text be the start
//! of a match if more of it arrived?" can be registered.

use std::ops::Range;

use regex::Regex;
use regex_automata::{
    dfa::{dense, Automaton},
    Anchored, Input,
};

use crate::reader::{Error, Result};

/// Outcome of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// A complete match, as a byte range of the searched text.
    Full(Range<usize>),
    /// No complete match, but `text[start..]` is the beginning of one;
    /// more input may complete it.
    Partial(usize),
}

/// A pattern that can be searched for in text.
pub trait Matcher {
    /// Find the leftmost match in `text`.
    ///
    /// A full match anywhere in the text is preferred over a partial one.
    /// Ranges and offsets are byte offsets on character boundaries.
    fn search(&self, text: &str) -> Option<Match>;
}

impl<F> Matcher for F
where
    F: Fn(&str) -> Option<Match>,
{
    fn search(&self, text: &str) -> Option<Match> {
        self(text)
    }
}

/// Matches an exact string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal(String);

impl Literal {
    pub fn new(literal: impl Into<String>) -> Self {
        Literal(literal.into())
    }
}

impl Matcher for Literal {
    fn search(&self, text: &str) -> Option<Match> {
        let lit = self.0.as_str();
        if lit.is_empty() {
            return None;
        }
        if let Some(start) = text.find(lit) {
            return Some(Match::Full(start..start + lit.len()));
        }
        // The leftmost tail of the text that the literal starts with.
        text.char_indices()
            .map(|(start, _)| start)
            .find(|&start| lit.starts_with(&text[start..]))
            .map(Match::Partial)
    }
}

/// Matches a regular expression.
///
/// Full matches are leftmost-first, as [`Regex::find`] reports them;
/// empty matches are skipped.
/// Partial matches are found by running an anchored DFA for the same pattern
/// from each position to the end of the text: if the DFA is still alive when
/// the text runs out, more text could complete the match.
#[derive(Clone, Debug)]
pub struct RegexMatcher {
    full: Regex,
    prefix: dense::DFA<Vec<u32>>,
}

impl RegexMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let full = Regex::new(pattern)
            .map_err(|e| Error::Configuration(format!("invalid pattern {pattern:?}: {e}")))?;
        let prefix = dense::Builder::new()
            .configure(dense::DFA::config().unicode_word_boundary(true))
            .build(pattern)
            .map_err(|e| {
                Error::Configuration(format!("cannot build prefix matcher for {pattern:?}: {e}"))
            })?;
        Ok(RegexMatcher { full, prefix })
    }

    pub fn as_str(&self) -> &str {
        self.full.as_str()
    }

    /// Whether `text[start..]` could be extended into a match.
    fn may_extend(&self, text: &str, start: usize) -> bool {
        let input = Input::new(text).range(start..).anchored(Anchored::Yes);
        let Ok(mut state) = self.prefix.start_state_forward(&input) else {
            return false;
        };
        for &byte in &text.as_bytes()[start..] {
            state = self.prefix.next_state(state, byte);
            // A quit state means the DFA gave up (non-ASCII next to a
            // Unicode word boundary); we can't tell, so don't wait on it.
            if self.prefix.is_dead_state(state) || self.prefix.is_quit_state(state) {
                return false;
            }
        }
        if self.prefix.is_match_state(state) {
            // Matches are reported one byte late, so this state may only be
            // holding an empty match. It's live if some byte leads past it.
            return (0..=u8::MAX).any(|b| {
                let next = self.prefix.next_state(state, b);
                !self.prefix.is_dead_state(next) && !self.prefix.is_match_state(next)
            });
        }
        true
    }
}

impl Matcher for RegexMatcher {
    fn search(&self, text: &str) -> Option<Match> {
        if let Some(m) = self.full.find_iter(text).find(|m| !m.is_empty()) {
            return Some(Match::Full(m.range()));
        }
        text.char_indices()
            .map(|(start, _)| start)
            .find(|&start| self.may_extend(text, start))
            .map(Match::Partial)
    }
}
