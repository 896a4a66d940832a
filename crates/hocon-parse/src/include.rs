//! The seam between the parser and the include engine.
//!
//! When the value builder encounters an `include` directive it asks an
//! [`IncludeHandler`] for the referenced document's value tree and splices
//! the result at the current object position. The real engine (source
//! resolution, cycle guard, missing-file policy) lives in the `hocon`
//! crate; this crate performs no I/O.

use hocon_tree::{ConfigValue, Origin, Result};

/// How an include argument named its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    /// Bare quoted string: `include "foo.conf"`. Heuristically a file.
    Heuristic,
    /// `include file("foo.conf")`
    File,
    /// `include classpath("foo.conf")`: a named resource, resolvable
    /// only by an application includer.
    Classpath,
    /// `include url("...")`
    Url,
}

/// A parsed include directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSpec {
    /// How the target was named.
    pub kind: IncludeKind,
    /// The target name (unescaped).
    pub name: String,
    /// True when wrapped in `required(...)`: a missing target is an
    /// error regardless of the allow-missing policy.
    pub required: bool,
}

/// Supplies value trees for include directives.
pub trait IncludeHandler {
    /// Parse the named source and return its root value (an object).
    fn include(&self, spec: &IncludeSpec, origin: &Origin) -> Result<ConfigValue>;
}

/// An include handler for contexts where includes cannot occur or must
/// not be followed; every include becomes an empty object.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeHandler for NoIncludes {
    fn include(&self, _spec: &IncludeSpec, origin: &Origin) -> Result<ConfigValue> {
        Ok(ConfigValue::empty_object(origin.clone()))
    }
}
