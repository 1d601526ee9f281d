//! Folding a stream of symbols into trees.
//!
//! The parser keeps a working sequence of root nodes. Each incoming token is
//! appended as a leaf, and then the roots are folded until no production
//! matches anywhere:
//!
//! - Productions are tried in priority order, alternatives in declared
//!   order, and start positions left to right. The first match wins.
//! - Matching walks the sequence nodes greedily: each takes as many equal
//!   symbols as it may (up to `max`), and never gives any back.
//! - The matched span is moved into a new node, which takes its place.
//! - A match that runs into the end of the roots, and could still take more
//!   symbols there, waits while more tokens are due in this run; the fold
//!   happens once it is closed off or the last token has arrived.
//!
//! There is no lookahead, precedence or recovery; a sequence that never
//! matches just leaves its symbols as roots.

use std::collections::VecDeque;
use std::ops::Range;

use crate::data::{Forest, Node, Symbol, SymbolId};
use crate::reader::{Definition, Error, Grammar, Result, Sequence, Tokenizer};

/// A FIFO of tokens for the parser to consume.
pub trait TokenQueue {
    /// Number of tokens ready to pop.
    fn pending(&self) -> usize;

    /// Remove the oldest token.
    fn pop(&mut self) -> Result<Symbol>;
}

impl TokenQueue for Tokenizer<'_> {
    fn pending(&self) -> usize {
        self.len()
    }

    fn pop(&mut self) -> Result<Symbol> {
        Tokenizer::pop(self)
    }
}

impl TokenQueue for VecDeque<Symbol> {
    fn pending(&self) -> usize {
        self.len()
    }

    fn pop(&mut self) -> Result<Symbol> {
        self.pop_front()
            .ok_or_else(|| Error::Precondition("popped from an empty token queue".to_owned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Most reductions allowed after a single token arrives.
    /// Grammars with unit cycles (`A -> B`, `B -> A`) would otherwise fold forever.
    pub reduction_limit: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            reduction_limit: 10_000,
        }
    }
}

impl ParserConfig {
    pub fn with_reduction_limit(self, reduction_limit: usize) -> Self {
        ParserConfig { reduction_limit }
    }
}

/// Bottom-up parser over a bound token queue.
#[derive(Default)]
pub struct Parser<'t> {
    config: ParserConfig,
    grammar: Grammar,
    queue: Option<&'t mut dyn TokenQueue>,
    roots: Vec<Node>,
}

impl<'t> Parser<'t> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Result<Self> {
        if config.reduction_limit == 0 {
            return Err(Error::Configuration(
                "reduction limit must be nonzero".to_owned(),
            ));
        }
        Ok(Parser {
            config,
            ..Self::default()
        })
    }

    /// Use an existing production table.
    pub fn with_grammar(self, grammar: Grammar) -> Self {
        Parser { grammar, ..self }
    }

    /// See [`Grammar::add_production`].
    pub fn add_production(
        &mut self,
        id: impl Into<SymbolId>,
        alternatives: impl IntoIterator<Item = Sequence>,
    ) -> Result<&mut Self> {
        self.grammar.add_production(id, alternatives)?;
        Ok(self)
    }

    /// See [`Grammar::lookup`].
    pub fn productions(&self, id: impl Into<SymbolId>) -> Result<&Definition> {
        self.grammar.lookup(id)
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Attach the token queue to drain.
    pub fn bind(&mut self, queue: &'t mut dyn TokenQueue) {
        self.queue = Some(queue);
    }

    /// Consume the tokens that are in the bound queue now, folding after each.
    ///
    /// Returns the number of tokens consumed.
    pub fn run(&mut self) -> Result<usize> {
        let queue = self
            .queue
            .take()
            .ok_or_else(|| Error::Precondition("parser run without a bound token queue".to_owned()))?;
        let result = self.consume(&mut *queue);
        self.queue = Some(queue);
        result
    }

    fn consume(&mut self, queue: &mut (dyn TokenQueue + 't)) -> Result<usize> {
        let total = queue.pending();
        for n in 1..=total {
            let token = queue.pop()?;
            self.roots.push(Node::leaf(token));

            let more = n < total;
            let mut reductions = 0;
            while self.reduce_step(more) {
                reductions += 1;
                if reductions > self.config.reduction_limit {
                    return Err(Error::Exhausted(format!(
                        "more than {} reductions after one token; does the grammar have a cycle?",
                        self.config.reduction_limit
                    )));
                }
            }
        }
        tracing::debug!(consumed = total, roots = self.roots.len(), "parser run complete");
        Ok(total)
    }

    /// Perform a single reduction, if any production matches.
    ///
    /// No more input is expected, so a match at the end of the roots is
    /// folded as it stands. Returns whether a reduction happened.
    pub fn reduce(&mut self) -> bool {
        self.reduce_step(false)
    }

    /// One reduction. With `more` input due, an open match at the end of the
    /// roots is left to grow instead.
    fn reduce_step(&mut self, more: bool) -> bool {
        let Some((id, walk)) = self.find_reduction() else {
            return false;
        };
        if more && walk.open {
            tracing::trace!(%id, start = walk.span.start, "waiting for more input");
            return false;
        }
        let span = walk.span;
        let children: Vec<Node> = self.roots.drain(span.clone()).collect();
        tracing::trace!(%id, start = span.start, count = children.len(), "folded roots");
        self.roots.insert(span.start, Node::branch(id, children));
        true
    }

    /// The highest-priority, leftmost match in the working sequence.
    fn find_reduction(&self) -> Option<(SymbolId, Walk)> {
        for (id, definition) in self.grammar.iter() {
            for sequence in definition.alternatives() {
                for start in 0..self.roots.len() {
                    if let Some(walk) = match_at(sequence, &self.roots, start) {
                        return Some((id, walk));
                    }
                }
            }
        }
        None
    }

    /// The current top-level nodes, left to right.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<Node> {
        self.roots
    }

    /// Display adapter for the current roots.
    pub fn forest(&self) -> Forest<'_> {
        Forest(&self.roots)
    }
}

/// A successful walk of a sequence over the roots.
struct Walk {
    span: Range<usize>,
    /// The walk ran out of roots while a node could still take more,
    /// so a later token might extend the match.
    open: bool,
}

/// Walk `sequence` over `roots` from `start`.
///
/// Each sequence node greedily takes up to `max` symbols with its id, and is
/// satisfied with at least `min`. A match must cover at least one root.
fn match_at(sequence: &Sequence, roots: &[Node], start: usize) -> Option<Walk> {
    let mut pos = start;
    let mut open = false;
    for node in sequence.nodes() {
        let mut count = 0;
        while count < node.max() && roots.get(pos).is_some_and(|root| root.id() == node.id()) {
            count += 1;
            pos += 1;
        }
        if count < node.min() {
            return None;
        }
        open |= count < node.max() && pos == roots.len();
    }
    (pos > start).then_some(Walk {
        span: start..pos,
        open,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SequenceNode;

    fn seq(nodes: &[(usize, usize, usize)]) -> Sequence {
        nodes
            .iter()
            .map(|&(id, min, max)| SequenceNode::new(id, min, max).unwrap())
            .collect()
    }

    fn tokens(ids: &[usize]) -> VecDeque<Symbol> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| Symbol::new(id, format!("t{i}")))
            .collect()
    }

    fn ids(nodes: &[Node]) -> Vec<usize> {
        nodes.iter().map(|n| n.id().0).collect()
    }

    #[test]
    fn run_requires_queue() {
        let mut parser = Parser::new();
        assert!(matches!(parser.run(), Err(Error::Precondition(_))));
    }

    #[test]
    fn no_matching_production_leaves_leaves() -> Result<()> {
        let mut queue = tokens(&[1, 2, 3]);
        let mut parser = Parser::new();
        parser.add_production(9, [seq(&[(7, 1, 1)])])?;
        parser.bind(&mut queue);
        assert_eq!(parser.run()?, 3);
        assert_eq!(ids(parser.roots()), [1, 2, 3]);
        assert!(parser.roots().iter().all(Node::is_leaf));
        let texts: Vec<&str> = parser.roots().iter().map(Node::text).collect();
        assert_eq!(texts, ["t0", "t1", "t2"]);
        Ok(())
    }

    #[test]
    fn quantifier_takes_up_to_max() -> Result<()> {
        let mut queue = tokens(&[1, 2, 2, 2]);
        let mut parser = Parser::new();
        parser.add_production(4, [seq(&[(1, 1, 1), (2, 1, 2)])])?;
        parser.bind(&mut queue);
        parser.run()?;
        // "1 2" waits for a second 2; the third 2 has nothing left to join.
        assert_eq!(ids(parser.roots()), [4, 2]);
        assert_eq!(ids(parser.roots()[0].children()), [1, 2, 2]);
        Ok(())
    }

    #[test]
    fn open_match_folds_at_end_of_run() -> Result<()> {
        let mut queue = tokens(&[1, 2]);
        let mut parser = Parser::new();
        parser.add_production(4, [seq(&[(1, 1, 1), (2, 1, 2)])])?;
        parser.bind(&mut queue);
        parser.run()?;
        assert_eq!(ids(parser.roots()), [4]);
        assert_eq!(ids(parser.roots()[0].children()), [1, 2]);
        Ok(())
    }

    #[test]
    fn open_match_closed_by_other_symbol() -> Result<()> {
        let mut queue = tokens(&[1, 2, 3]);
        let mut parser = Parser::new();
        parser.add_production(4, [seq(&[(1, 1, 1), (2, 1, 5)])])?;
        parser.bind(&mut queue);
        parser.run()?;
        assert_eq!(ids(parser.roots()), [4, 3]);
        assert_eq!(ids(parser.roots()[0].children()), [1, 2]);
        Ok(())
    }

    #[test]
    fn reduction_sees_the_whole_sequence() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(4, [seq(&[(1, 1, 1), (2, 1, 2)])])?;
        // Load both tokens before folding.
        parser.roots.extend(tokens(&[1, 2, 2]).into_iter().map(Node::leaf));
        assert!(parser.reduce());
        assert_eq!(ids(parser.roots()), [4]);
        assert_eq!(ids(parser.roots()[0].children()), [1, 2, 2]);
        assert!(!parser.reduce());
        Ok(())
    }

    #[test]
    fn priority_order_beats_position() -> Result<()> {
        let mut parser = Parser::new();
        parser
            .add_production(10, [seq(&[(2, 1, 1)])])?
            .add_production(11, [seq(&[(1, 1, 1)])])?;
        parser.roots.extend(tokens(&[1, 2]).into_iter().map(Node::leaf));
        // Production 10 is tried first, even though its match starts later.
        assert!(parser.reduce());
        assert_eq!(ids(parser.roots()), [1, 10]);
        Ok(())
    }

    #[test]
    fn alternatives_in_declared_order() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(5, [seq(&[(2, 1, 1)]), seq(&[(1, 1, 1), (2, 1, 1)])])?;
        parser.roots.extend(tokens(&[1, 2]).into_iter().map(Node::leaf));
        assert!(parser.reduce());
        assert_eq!(ids(parser.roots()), [1, 5]);
        Ok(())
    }

    #[test]
    fn leftmost_start_wins() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(5, [seq(&[(1, 1, 1)])])?;
        parser.roots.extend(tokens(&[1, 1]).into_iter().map(Node::leaf));
        assert!(parser.reduce());
        assert_eq!(ids(parser.roots()), [5, 1]);
        assert_eq!(parser.roots()[0].children()[0].text(), "t0");
        Ok(())
    }

    #[test]
    fn greedy_walk_does_not_backtrack() -> Result<()> {
        let mut parser = Parser::new();
        // With backtracking, "1 1" would match as 1{1,3} then 1.
        parser.add_production(5, [seq(&[(1, 1, 3), (1, 1, 1)])])?;
        parser.roots.extend(tokens(&[1, 1]).into_iter().map(Node::leaf));
        assert!(!parser.reduce());
        assert_eq!(ids(parser.roots()), [1, 1]);
        Ok(())
    }

    #[test]
    fn optional_nodes_may_be_absent() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(5, [seq(&[(1, 1, 1), (2, 0, 1), (3, 0, 2)])])?;
        parser.roots.extend(tokens(&[1, 3, 3, 3]).into_iter().map(Node::leaf));
        assert!(parser.reduce());
        assert_eq!(ids(parser.roots()), [5, 3]);
        assert_eq!(ids(parser.roots()[0].children()), [1, 3, 3]);
        Ok(())
    }

    #[test]
    fn empty_matches_are_not_reductions() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(5, [seq(&[(1, 0, 2)])])?;
        parser.roots.extend(tokens(&[2, 3]).into_iter().map(Node::leaf));
        assert!(!parser.reduce());
        Ok(())
    }

    #[test]
    fn reduction_replaces_span_in_place() -> Result<()> {
        let mut parser = Parser::new();
        parser.add_production(8, [seq(&[(2, 2, 3)])])?;
        let leaves: Vec<Node> = tokens(&[1, 2, 2, 2, 3]).into_iter().map(Node::leaf).collect();
        parser.roots.extend(leaves.iter().cloned());
        let before = parser.roots().len();

        assert!(parser.reduce());
        let folded = &parser.roots()[1];
        assert_eq!(parser.roots().len(), before - (folded.children().len() - 1));
        assert_eq!(folded.children(), &leaves[1..4]);
        assert_eq!(ids(parser.roots()), [1, 8, 3]);
        Ok(())
    }

    #[test]
    fn nested_reductions_build_trees() -> Result<()> {
        let mut queue = tokens(&[1, 2, 1, 2]);
        let mut parser = Parser::new();
        parser
            .add_production(10, [seq(&[(1, 1, 1), (2, 1, 1)])])?
            .add_production(20, [seq(&[(10, 2, 2)])])?;
        parser.bind(&mut queue);
        parser.run()?;
        assert_eq!(ids(parser.roots()), [20]);
        let root = &parser.roots()[0];
        assert_eq!(ids(root.children()), [10, 10]);
        let leaves: Vec<&str> = root.leaves().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(leaves, ["t0", "t1", "t2", "t3"]);
        Ok(())
    }

    #[test]
    fn unit_cycle_hits_reduction_limit() -> Result<()> {
        let mut queue = tokens(&[1]);
        let mut parser = Parser::with_config(ParserConfig::default().with_reduction_limit(50))?;
        parser
            .add_production(2, [seq(&[(1, 1, 1)])])?
            .add_production(1, [seq(&[(2, 1, 1)])])?;
        parser.bind(&mut queue);
        match parser.run() {
            Err(Error::Exhausted(_)) => Ok(()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn run_after_run_is_idempotent() -> Result<()> {
        let mut queue = tokens(&[1, 2]);
        let mut parser = Parser::new();
        parser.add_production(4, [seq(&[(1, 1, 1), (2, 1, 2)])])?;
        parser.bind(&mut queue);
        parser.run()?;
        let before = parser.roots().to_vec();
        assert!(!parser.reduce());
        assert_eq!(parser.run()?, 0);
        assert_eq!(parser.roots(), &before[..]);
        Ok(())
    }

    #[test]
    fn undefined_productions_are_errors() {
        let parser = Parser::new();
        assert!(matches!(parser.productions(3), Err(Error::Precondition(_))));
    }
}
