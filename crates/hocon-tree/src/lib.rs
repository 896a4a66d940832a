//! Value tree representation for HOCON configuration.
//!
//! This crate provides the semantic side of the parse pipeline: source
//! origins, the error model, key paths, and the config value tree with
//! its merge rules. The formatting-preserving syntax tree lives in
//! `hocon-parse`; resolution of substitutions lives in `hocon`.

mod concat;
mod error;
mod origin;
mod path;
mod render;
mod value;

pub use concat::join_concat;
pub use error::{ConfigError, ConfigErrorKind, Result};
pub use render::{RenderOptions, render};
pub use origin::Origin;
pub use path::Path;
pub use value::{ConfigValue, Object, ResolveStatus, Substitution, ValueKind, format_double};
