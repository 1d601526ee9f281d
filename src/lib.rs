//! Priority-driven tokenizer and bottom-up token folder.
//!
//! Text is pulled from a [`Source`](reader::Source) into a bounded buffer and
//! cut into terminal tokens by a priority list of [`Matcher`](reader::Matcher)s.
//! The tokens are then folded into trees by a [`Parser`](reader::Parser)
//! according to quantified productions ("an `A`, then one or two `B`s").
//!

pub mod data;
pub mod reader;

#[cfg(feature = "render")]
pub use data::render_forest;
pub use data::{Node, Symbol, SymbolId};
pub use reader::{Error, Parser, Result, Tokenizer};
