//! Module for extracting terminal symbols from an input stream.
//!
//! The tokenizer holds a bounded buffer of characters. Each cycle it resolves
//! whatever is in the buffer into tokens, then refills the buffer from its
//! source. Text that might be the start of a match (a partial match at the
//! end of the buffer) is carried over to the next cycle, so tokens can span
//! refills.

use std::collections::VecDeque;
use std::ops::Range;

use crate::data::{Symbol, SymbolId};
use crate::reader::{Error, Literal, Match, Matcher, RegexMatcher, Result, Source};

/// Buffer sizes for a [`Tokenizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Size of the buffer, in characters.
    /// This bounds the length of any single partial match.
    pub capacity: usize,
    /// Most characters requested from the source in one pull.
    pub pull: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            capacity: 200,
            pull: 10,
        }
    }
}

impl TokenizerConfig {
    pub fn with_capacity(self, capacity: usize) -> Self {
        TokenizerConfig { capacity, ..self }
    }

    pub fn with_pull(self, pull: usize) -> Self {
        TokenizerConfig { pull, ..self }
    }

    fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Configuration("buffer capacity must be nonzero".to_owned()));
        }
        if self.pull == 0 {
            return Err(Error::Configuration("pull size must be nonzero".to_owned()));
        }
        Ok(())
    }
}

/// A piece of the buffer during resolution.
enum Segment {
    Unresolved(Range<usize>),
    Token(Range<usize>, SymbolId),
}

/// What the highest-priority matcher made of a segment.
enum Found {
    Full(Range<usize>, SymbolId),
    Partial,
}

/// Buffered, refillable tokenizer.
///
/// Matchers are tried in registration order: the first one registered has
/// the highest priority.
pub struct Tokenizer<'s> {
    config: TokenizerConfig,
    matchers: Vec<(Box<dyn Matcher + 's>, SymbolId)>,
    source: Option<Box<dyn Source + 's>>,
    on_discard: Option<Box<dyn FnMut(&str) + 's>>,

    /// Unresolved text.
    buffer: String,
    /// Characters in the buffer.
    head: usize,

    queue: VecDeque<Symbol>,
}

impl Default for Tokenizer<'_> {
    fn default() -> Self {
        Tokenizer {
            config: TokenizerConfig::default(),
            matchers: Vec::new(),
            source: None,
            on_discard: None,
            buffer: String::new(),
            head: 0,
            queue: VecDeque::new(),
        }
    }
}

impl<'s> Tokenizer<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TokenizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Tokenizer {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Add a matcher below all previously registered ones.
    ///
    /// Text it matches becomes a terminal with the given id,
    /// which may not be [`SymbolId::UNRESOLVED`].
    pub fn register(
        &mut self,
        matcher: impl Matcher + 's,
        id: impl Into<SymbolId>,
    ) -> Result<&mut Self> {
        let id = id.into();
        if id.is_unresolved() {
            return Err(Error::Configuration(format!(
                "terminal id {id} is reserved for unresolved text"
            )));
        }
        self.matchers.push((Box::new(matcher), id));
        Ok(self)
    }

    pub fn register_literal(
        &mut self,
        literal: &str,
        id: impl Into<SymbolId>,
    ) -> Result<&mut Self> {
        self.register(Literal::new(literal), id)
    }

    pub fn register_regex(&mut self, pattern: &str, id: impl Into<SymbolId>) -> Result<&mut Self> {
        let matcher = RegexMatcher::new(pattern)?;
        self.register(matcher, id)
    }

    /// Attach the input to pull from, replacing any previous one.
    ///
    /// Carried-over text from the previous input is kept.
    pub fn bind(&mut self, source: impl Source + 's) {
        self.source = Some(Box::new(source));
    }

    /// Observe text that no matcher recognized.
    ///
    /// Such text is dropped from the output; the hook sees each dropped
    /// segment, in order.
    pub fn on_discard(&mut self, hook: impl FnMut(&str) + 's) {
        self.on_discard = Some(Box::new(hook));
    }

    /// Tokenize the bound input until it runs out.
    ///
    /// Returns the number of tokens produced by this call.
    /// A partial match at the end of the input is kept as [`pending`](Self::pending)
    /// text, and is resolved by a later run if more input arrives.
    pub fn run(&mut self) -> Result<usize> {
        if self.matchers.is_empty() {
            tracing::warn!("no patterns registered; tokenizer has nothing to do");
            return Ok(0);
        }
        let mut source = self.source.take().ok_or_else(|| {
            Error::Precondition("tokenizer run without a bound source".to_owned())
        })?;
        let result = self.drain(source.as_mut());
        self.source = Some(source);
        result
    }

    fn drain(&mut self, source: &mut (dyn Source + 's)) -> Result<usize> {
        let mut produced = 0;
        loop {
            if self.head > 0 {
                produced += self.resolve()?;
            }

            let free = self.config.capacity.saturating_sub(self.head);
            if free == 0 {
                return Err(Error::Exhausted(format!(
                    "buffer of {} characters is full and cannot be resolved",
                    self.config.capacity
                )));
            }
            let pulled = source.pull(&mut self.buffer, free.min(self.config.pull))?;
            tracing::trace!(pulled, head = self.head, "refilled tokenizer buffer");
            if pulled == 0 {
                break;
            }
            self.head += pulled;
        }
        tracing::debug!(produced, pending = self.head, "tokenizer input exhausted");
        Ok(produced)
    }

    /// Ask the matchers, in priority order, about a segment.
    ///
    /// A partial match only counts for the last segment: anything earlier is
    /// followed by a token, so it cannot grow.
    fn find(&self, text: &str, last: bool) -> Option<Found> {
        for (matcher, id) in &self.matchers {
            match matcher.search(text) {
                Some(Match::Full(range)) if !range.is_empty() => {
                    return Some(Found::Full(range, *id));
                }
                Some(Match::Partial(_)) if last => return Some(Found::Partial),
                _ => (),
            }
        }
        None
    }

    /// Cut the buffered text into tokens.
    fn resolve(&mut self) -> Result<usize> {
        let mut produced = 0;
        let mut carry = None;

        // The top of the stack is the leftmost segment.
        let mut work = vec![Segment::Unresolved(0..self.buffer.len())];
        while let Some(segment) = work.pop() {
            let range = match segment {
                Segment::Token(range, id) => {
                    let symbol = Symbol::new(id, &self.buffer[range]);
                    tracing::trace!("token {symbol}");
                    self.queue.push_back(symbol);
                    produced += 1;
                    continue;
                }
                Segment::Unresolved(range) if range.is_empty() => continue,
                Segment::Unresolved(range) => range,
            };

            let text = &self.buffer[range.clone()];
            match self.find(text, work.is_empty()) {
                Some(Found::Full(found, id)) => {
                    let found = (range.start + found.start)..(range.start + found.end);
                    work.push(Segment::Unresolved(found.end..range.end));
                    work.push(Segment::Token(found.clone(), id));
                    work.push(Segment::Unresolved(range.start..found.start));
                }
                Some(Found::Partial) => {
                    if text.chars().count() >= self.config.capacity {
                        return Err(Error::Exhausted(format!(
                            "partial match needs more than the buffer capacity of {} characters",
                            self.config.capacity
                        )));
                    }
                    carry = Some(range);
                }
                None => {
                    tracing::debug!(text, "discarding unrecognized text");
                    if let Some(hook) = self.on_discard.as_mut() {
                        hook(text);
                    }
                }
            }
        }

        // A partial match is always the rightmost segment, so it runs to the
        // end of the buffer.
        match carry {
            Some(range) => {
                self.buffer.drain(..range.start);
                self.head = self.buffer.chars().count();
            }
            None => {
                self.buffer.clear();
                self.head = 0;
            }
        }
        Ok(produced)
    }

    /// Remove the oldest token.
    pub fn pop(&mut self) -> Result<Symbol> {
        self.queue
            .pop_front()
            .ok_or_else(|| Error::Precondition("popped from an empty token queue".to_owned()))
    }

    /// Tokens produced and not yet popped, oldest first.
    pub fn tokens(&self) -> impl Iterator<Item = &Symbol> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Text carried over for a partial match that may complete with more input.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
