//! Immutable option objects for parsing and resolving.
//!
//! Mutators return modified copies, so options can be shared freely and
//! tweaked locally (the include engine adjusts `allow_missing` per
//! directive without touching the caller's options).

use std::sync::Arc;

use hocon_parse::ConfigSyntax;

use crate::include::Includer;

/// Options controlling how a source is parsed.
#[derive(Clone, Default)]
pub struct ParseOptions {
    syntax: ConfigSyntax,
    origin_description: Option<String>,
    allow_missing: bool,
    includer: Option<Arc<dyn Includer>>,
}

impl ParseOptions {
    /// Default options: unspecified syntax, missing sources are errors,
    /// no application includer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The preferred syntax.
    pub fn syntax(&self) -> ConfigSyntax {
        self.syntax
    }

    /// Return a copy with the syntax set.
    pub fn set_syntax(mut self, syntax: ConfigSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// The origin description override, if any.
    pub fn origin_description(&self) -> Option<&str> {
        self.origin_description.as_deref()
    }

    /// Return a copy with an origin description override.
    pub fn set_origin_description(mut self, description: impl Into<String>) -> Self {
        self.origin_description = Some(description.into());
        self
    }

    /// Whether a missing source parses as an empty object instead of an
    /// error.
    pub fn allow_missing(&self) -> bool {
        self.allow_missing
    }

    /// Return a copy with `allow_missing` set.
    pub fn set_allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// The application includer, if one is installed.
    pub fn includer(&self) -> Option<&Arc<dyn Includer>> {
        self.includer.as_ref()
    }

    /// Return a copy with the includer replaced.
    pub fn set_includer(mut self, includer: Arc<dyn Includer>) -> Self {
        self.includer = Some(includer);
        self
    }

    /// Return a copy with `fallback` appended to the includer chain. The
    /// engine's default includer always remains the final fallback.
    pub fn append_includer(mut self, fallback: Arc<dyn Includer>) -> Self {
        self.includer = Some(match self.includer.take() {
            Some(existing) => Arc::new(crate::include::ChainedIncluder::new(existing, fallback)),
            None => fallback,
        });
        self
    }
}

impl std::fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseOptions")
            .field("syntax", &self.syntax)
            .field("origin_description", &self.origin_description)
            .field("allow_missing", &self.allow_missing)
            .field("includer", &self.includer.as_ref().map(|_| "..."))
            .finish()
    }
}

/// Options controlling resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    use_system_environment: bool,
    allow_unresolved: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            use_system_environment: true,
            allow_unresolved: false,
        }
    }
}

impl ResolveOptions {
    /// Default options: environment fallback on, unresolved
    /// substitutions are errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether missing substitution paths fall back to environment
    /// variables.
    pub fn use_system_environment(&self) -> bool {
        self.use_system_environment
    }

    /// Return a copy with environment fallback set.
    pub fn set_use_system_environment(mut self, value: bool) -> Self {
        self.use_system_environment = value;
        self
    }

    /// Whether unresolved substitutions are left in place instead of
    /// raising.
    pub fn allow_unresolved(&self) -> bool {
        self.allow_unresolved
    }

    /// Return a copy with `allow_unresolved` set.
    pub fn set_allow_unresolved(mut self, value: bool) -> Self {
        self.allow_unresolved = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_copies() {
        let base = ParseOptions::new();
        let json = base.clone().set_syntax(ConfigSyntax::Json);
        assert_eq!(base.syntax(), ConfigSyntax::Unspecified);
        assert_eq!(json.syntax(), ConfigSyntax::Json);
        assert!(!base.allow_missing());
        assert!(base.clone().set_allow_missing(true).allow_missing());
    }

    #[test]
    fn test_resolve_options_defaults() {
        let options = ResolveOptions::default();
        assert!(options.use_system_environment());
        assert!(!options.allow_unresolved());
        let quiet = options.set_use_system_environment(false);
        assert!(!quiet.use_system_environment());
    }
}
