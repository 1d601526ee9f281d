//! Productions: how runs of symbols fold into nonterminals.
//!
//! A production maps a nonterminal id to one or more alternative
//! [`Sequence`]s. Each sequence is a list of [`SequenceNode`]s, each of which
//! accepts between `min` and `max` consecutive symbols of one id, like a
//! `{min,max}` repetition in a regular expression.

use std::collections::HashMap;

use crate::data::SymbolId;
use crate::reader::{Error, Result};

/// One position of a sequence: `min..=max` consecutive symbols of `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceNode {
    id: SymbolId,
    min: usize,
    max: usize,
}

impl SequenceNode {
    pub fn new(id: impl Into<SymbolId>, min: usize, max: usize) -> Result<Self> {
        let id = id.into();
        if min > max {
            return Err(Error::Configuration(format!(
                "sequence node for {id} has minimum {min} greater than maximum {max}"
            )));
        }
        Ok(SequenceNode { id, min, max })
    }

    /// Exactly one symbol of `id`.
    pub fn one(id: impl Into<SymbolId>) -> Self {
        SequenceNode {
            id: id.into(),
            min: 1,
            max: 1,
        }
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }
}

/// An ordered list of sequence nodes: one alternative of a production.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence(Vec<SequenceNode>);

impl Sequence {
    pub fn new(nodes: impl IntoIterator<Item = SequenceNode>) -> Self {
        Sequence(nodes.into_iter().collect())
    }

    pub fn nodes(&self) -> &[SequenceNode] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SequenceNode> for Sequence {
    fn from_iter<T: IntoIterator<Item = SequenceNode>>(iter: T) -> Self {
        Sequence::new(iter)
    }
}

/// The alternatives for one nonterminal, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    alternatives: Vec<Sequence>,
}

impl Definition {
    /// Check the shape of a definition: at least one alternative,
    /// and no empty alternatives.
    pub fn new(alternatives: impl IntoIterator<Item = Sequence>) -> Result<Self> {
        let alternatives: Vec<Sequence> = alternatives.into_iter().collect();
        if alternatives.is_empty() {
            return Err(Error::Configuration(
                "definition has no sequences".to_owned(),
            ));
        }
        if let Some(i) = alternatives.iter().position(Sequence::is_empty) {
            return Err(Error::Configuration(format!("sequence {i} is empty")));
        }
        Ok(Definition { alternatives })
    }

    pub fn alternatives(&self) -> &[Sequence] {
        &self.alternatives
    }
}

/// The production table.
///
/// Nonterminals are kept in the order they were first registered;
/// that order is the priority order for folding.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    productions: Vec<(SymbolId, Definition)>,
    index: HashMap<SymbolId, usize>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grammar from `(id, alternatives)` pairs, in priority order.
    pub fn from_productions<I, A>(productions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SymbolId, A)>,
        A: IntoIterator<Item = Sequence>,
    {
        let mut grammar = Grammar::new();
        for (id, alternatives) in productions {
            grammar.add_production(id, alternatives)?;
        }
        Ok(grammar)
    }

    /// Define `id` by the given alternatives.
    ///
    /// Redefining an id replaces its alternatives, but keeps its priority.
    /// On error, the table is unchanged.
    pub fn add_production(
        &mut self,
        id: impl Into<SymbolId>,
        alternatives: impl IntoIterator<Item = Sequence>,
    ) -> Result<&mut Self> {
        let id = id.into();
        if id.is_unresolved() {
            return Err(Error::Configuration(format!(
                "nonterminal id {id} is reserved for unresolved text"
            )));
        }
        let definition = Definition::new(alternatives)
            .map_err(|e| e.annotate(format!("in production for {id}")))?;

        match self.index.get(&id) {
            Some(&slot) => {
                tracing::debug!(%id, "replacing production");
                self.productions[slot].1 = definition;
            }
            None => {
                self.index.insert(id, self.productions.len());
                self.productions.push((id, definition));
            }
        }
        Ok(self)
    }

    /// The alternatives for `id`.
    pub fn lookup(&self, id: impl Into<SymbolId>) -> Result<&Definition> {
        let id = id.into();
        self.index
            .get(&id)
            .map(|&slot| &self.productions[slot].1)
            .ok_or_else(|| Error::Precondition(format!("undefined production {id}")))
    }

    /// Productions in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Definition)> {
        self.productions.iter().map(|(id, def)| (*id, def))
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}
