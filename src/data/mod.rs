//! Symbols and the trees built out of them.
//!
//! A [`Symbol`] is an id plus the text it stands for. Terminals get their id
//! from the matcher that recognized them and carry the matched text;
//! nonterminals get their id from a production and carry the id, as text.
//!
//! A [`Node`] is a symbol that owns its children. Nodes are moved from the
//! parser's working sequence into a new parent when they are folded, never
//! copied, so every node has exactly one owner.

#[cfg(feature = "render")]
mod render;
#[cfg(feature = "render")]
pub use render::render_forest;

use std::fmt::{self, Display, Formatter};

/// Identifier for a terminal or nonterminal symbol.
///
/// Terminal and nonterminal ids share a single namespace.
/// Zero is reserved for text that has not been resolved yet.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

impl SymbolId {
    pub const UNRESOLVED: SymbolId = SymbolId(0);

    pub fn is_unresolved(self) -> bool {
        self == Self::UNRESOLVED
    }
}

impl From<usize> for SymbolId {
    fn from(value: usize) -> Self {
        SymbolId(value)
    }
}

impl Display for SymbolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A recognized token: an id, and the text associated with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub id: SymbolId,
    pub text: String,
}

impl Symbol {
    pub fn new(id: impl Into<SymbolId>, text: impl Into<String>) -> Self {
        Symbol {
            id: id.into(),
            text: text.into(),
        }
    }

    /// A nonterminal symbol. Its text is the stringified id.
    pub fn nonterminal(id: SymbolId) -> Self {
        Symbol {
            id,
            text: id.to_string(),
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.id, self.text)
    }
}

/// A symbol, and the subtree it was folded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    symbol: Symbol,
    children: Vec<Node>,
}

impl Node {
    /// A node without children, e.g. a token fresh from the tokenizer.
    pub fn leaf(symbol: Symbol) -> Self {
        Node {
            symbol,
            children: Vec::new(),
        }
    }

    /// A nonterminal node that takes ownership of `children`.
    pub fn branch(id: SymbolId, children: Vec<Node>) -> Self {
        Node {
            symbol: Symbol::nonterminal(id),
            children,
        }
    }

    pub fn id(&self) -> SymbolId {
        self.symbol.id
    }

    pub fn text(&self) -> &str {
        &self.symbol.text
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The direct children with the given id, left to right.
    pub fn children_with(&self, id: impl Into<SymbolId>) -> impl Iterator<Item = &Node> {
        let id = id.into();
        self.children.iter().filter(move |child| child.id() == id)
    }

    /// Leaf symbols under this node, left to right.
    ///
    /// For a node built by the parser, these are the tokens it was folded from.
    pub fn leaves(&self) -> Vec<&Symbol> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                out.push(&node.symbol);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    pub fn into_parts(self) -> (Symbol, Vec<Node>) {
        (self.symbol, self.children)
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        writeln!(f, "{pad}[ID = {} | TEXT = {}]", self.id(), self.text())?;
        if !self.children.is_empty() {
            writeln!(f, "{pad}{{")?;
            for child in &self.children {
                child.fmt_indented(f, indent + 4)?;
            }
            writeln!(f, "{pad}}}")?;
        }
        Ok(())
    }
}

impl From<Symbol> for Node {
    fn from(value: Symbol) -> Self {
        Node::leaf(value)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Display adapter for a sequence of root nodes.
pub struct Forest<'a>(pub &'a [Node]);

impl Display for Forest<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for root in self.0 {
            root.fmt_indented(f, 0)?;
        }
        Ok(())
    }
}
