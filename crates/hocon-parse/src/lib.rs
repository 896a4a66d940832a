//! Document parser for the HOCON configuration language.
//!
//! This crate turns token streams into two parallel trees: a
//! formatting-preserving syntax tree (config nodes, able to re-render the
//! exact input and to support document edits) and the semantic value tree
//! defined by `hocon-tree`, with substitution placeholders left for the
//! resolver. Includes are delegated through the [`IncludeHandler`] seam so
//! this crate performs no I/O.

mod build;
mod diagnostic;
mod document;
mod error;
mod include;
mod node;
mod parser;
mod syntax;

pub use build::build_value;
pub use diagnostic::render_parse_error;
pub use document::ConfigDocument;
pub use error::ParseError;
pub use include::{IncludeHandler, IncludeKind, IncludeSpec, NoIncludes};
pub use node::{Field, Node, RawToken, Root, SeparatorKind};
pub use parser::{parse_document_nodes, parse_value_fragment};
pub use syntax::ConfigSyntax;
