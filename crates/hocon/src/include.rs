//! The include engine.
//!
//! The parser hands include directives to this engine, which maps them to
//! sources, re-enters the parse pipeline, and applies the missing-file
//! policy. Applications may install their own [`Includer`]; the default
//! includer is always reachable as the final fallback.

use std::sync::Arc;

use hocon_parse::{IncludeHandler, IncludeKind, IncludeSpec};
use hocon_tree::{ConfigError, ConfigValue, Origin, Result};

use crate::source::Parseable;
use crate::ParseOptions;

/// Context handed to includers for resolving nested includes.
pub struct IncludeContext<'a> {
    source: &'a Parseable,
    options: ParseOptions,
}

impl<'a> IncludeContext<'a> {
    pub(crate) fn new(source: &'a Parseable, options: ParseOptions) -> Self {
        Self { source, options }
    }

    /// The parse options in effect for the including document.
    pub fn parse_options(&self) -> &ParseOptions {
        &self.options
    }

    /// A copy of this context with different parse options.
    pub fn with_parse_options(&self, options: ParseOptions) -> IncludeContext<'a> {
        IncludeContext {
            source: self.source,
            options,
        }
    }

    /// Derive a source for a name relative to the including source.
    pub fn relative(&self, name: &str) -> Parseable {
        self.source.relative_to(name, self.options.clone())
    }
}

/// Supplies values for include directives.
///
/// Returning `Ok(None)` declines the directive and passes it to the next
/// includer in the chain; the engine's default includer is always the
/// final fallback.
pub trait Includer: Send + Sync {
    /// Handle an include directive, or decline it.
    fn include(
        &self,
        context: &IncludeContext<'_>,
        spec: &IncludeSpec,
    ) -> Result<Option<ConfigValue>>;
}

/// Two includers chained; the first takes precedence.
pub(crate) struct ChainedIncluder {
    first: Arc<dyn Includer>,
    fallback: Arc<dyn Includer>,
}

impl ChainedIncluder {
    pub(crate) fn new(first: Arc<dyn Includer>, fallback: Arc<dyn Includer>) -> Self {
        Self { first, fallback }
    }
}

impl Includer for ChainedIncluder {
    fn include(
        &self,
        context: &IncludeContext<'_>,
        spec: &IncludeSpec,
    ) -> Result<Option<ConfigValue>> {
        match self.first.include(context, spec)? {
            Some(value) => Ok(Some(value)),
            None => self.fallback.include(context, spec),
        }
    }
}

/// The built-in includer: quoted and `file()` includes resolve relative
/// to the including source; `classpath()` is only resolvable by an
/// application includer; `url()` is not supported.
pub struct DefaultIncluder;

impl Includer for DefaultIncluder {
    fn include(
        &self,
        context: &IncludeContext<'_>,
        spec: &IncludeSpec,
    ) -> Result<Option<ConfigValue>> {
        match spec.kind {
            IncludeKind::Url => Err(ConfigError::parse(
                context.source.origin().clone(),
                format!("url() includes are not supported: url(\"{}\")", spec.name),
            )),
            IncludeKind::Classpath => {
                let what = format!("classpath(\"{}\")", spec.name);
                if spec.required {
                    Err(ConfigError::io(
                        Origin::new(what.clone()),
                        format!("{what} could not be resolved without an application includer"),
                    ))
                } else {
                    Ok(Some(ConfigValue::empty_object(
                        Origin::new(what).with_suffix(" (not found)"),
                    )))
                }
            }
            IncludeKind::File | IncludeKind::Heuristic => {
                let source = context.relative(&spec.name);
                // Includes default to allow-missing; required() turns
                // the policy off locally.
                let options = context
                    .parse_options()
                    .clone()
                    .set_allow_missing(!spec.required);
                source.parse_with(options).map(Some)
            }
        }
    }
}

/// Adapter the value builder calls into: composes the application
/// includer chain with the default.
pub(crate) struct EngineIncludeHandler<'a> {
    source: &'a Parseable,
    options: &'a ParseOptions,
}

impl<'a> EngineIncludeHandler<'a> {
    pub(crate) fn new(source: &'a Parseable, options: &'a ParseOptions) -> Self {
        Self { source, options }
    }
}

impl IncludeHandler for EngineIncludeHandler<'_> {
    fn include(&self, spec: &IncludeSpec, origin: &Origin) -> Result<ConfigValue> {
        let context = IncludeContext::new(self.source, self.options.clone());
        if let Some(app) = self.options.includer()
            && let Some(value) = app.include(&context, spec)?
        {
            return Ok(value);
        }
        match DefaultIncluder.include(&context, spec)? {
            Some(value) => Ok(value),
            // The default handles every kind; reaching here means an
            // includer protocol bug, but an empty object is harmless.
            None => Ok(ConfigValue::empty_object(origin.clone())),
        }
    }
}
