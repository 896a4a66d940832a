//! Substitution resolution.
//!
//! Walks an unresolved value tree and produces a new tree with every
//! substitution replaced, every concatenation joined, and every delayed
//! merge replayed. The input is never mutated.
//!
//! Self-references resolve through the delayed-merge stack: when a layer
//! of a merge at path `p` is being resolved, a substitution whose path is
//! a prefix of the path under definition sees the merged older layers as
//! the "previous" value. Lookups descend raw objects before resolving,
//! so resolving `${a.x}` does not force unrelated siblings of `x`.

use std::collections::HashMap;

use hocon_tree::{
    ConfigError, ConfigValue, Object, Origin, Path, Result, Substitution, ValueKind, join_concat,
};
use tracing::trace;

use crate::ResolveOptions;

/// Resolve a root object against itself.
pub fn resolve(root: &ConfigValue, options: &ResolveOptions) -> Result<ConfigValue> {
    let Some(object) = root.as_object() else {
        return Err(ConfigError::bug(
            "resolve() requires an object at the root".to_string(),
        ));
    };

    let mut resolver = Resolver {
        root: object,
        options,
        memo: HashMap::new(),
        in_progress: Vec::new(),
        self_stack: Vec::new(),
    };

    let mut resolved = Object::new();
    for (key, value) in object.iter() {
        let at = vec![key.clone()];
        if let Some(resolved_value) = resolver.resolve_value(value, &at)? {
            resolved.insert(key.clone(), resolved_value);
        }
    }
    Ok(ConfigValue::object(resolved, root.origin.clone()))
}

struct Resolver<'a> {
    /// The raw (unresolved) root object substitutions look up into.
    root: &'a Object,
    options: &'a ResolveOptions,
    /// Resolved-value cache keyed by canonical substitution path. Only
    /// populated for resolutions computed outside any cycle or
    /// self-reference context.
    memo: HashMap<Vec<String>, ConfigValue>,
    /// Substitution paths on the active resolution chain.
    in_progress: Vec<Vec<String>>,
    /// Delayed-merge frames: (path under definition, previous value).
    self_stack: Vec<(Vec<String>, Option<ConfigValue>)>,
}

impl Resolver<'_> {
    /// Resolve one value. `at` is the field path from the root to this
    /// value; `None` means the value erased itself (optional
    /// substitution to a missing path).
    fn resolve_value(
        &mut self,
        value: &ConfigValue,
        at: &[String],
    ) -> Result<Option<ConfigValue>> {
        match &value.kind {
            ValueKind::String(_)
            | ValueKind::Int(_)
            | ValueKind::Double(_)
            | ValueKind::Bool(_)
            | ValueKind::Null => Ok(Some(value.clone())),

            ValueKind::Object(object) => {
                let mut out = Object::new();
                for (key, child) in object.iter() {
                    let mut child_path = at.to_vec();
                    child_path.push(key.clone());
                    if let Some(resolved) = self.resolve_value(child, &child_path)? {
                        out.insert(key.clone(), resolved);
                    }
                }
                Ok(Some(ConfigValue::object(out, value.origin.clone())))
            }

            ValueKind::List(items) => {
                let mut out = Vec::new();
                for item in items {
                    if let Some(resolved) = self.resolve_value(item, at)? {
                        out.push(resolved);
                    }
                }
                Ok(Some(ConfigValue::list(out, value.origin.clone())))
            }

            ValueKind::Concat(parts) => self.resolve_concat(value, parts, at),
            ValueKind::Substitution(sub) => self.resolve_substitution(value, sub, at),
            ValueKind::DelayedMerge(stack) => self.resolve_delayed_merge(stack, at),
        }
    }

    fn resolve_concat(
        &mut self,
        original: &ConfigValue,
        parts: &[ConfigValue],
        at: &[String],
    ) -> Result<Option<ConfigValue>> {
        let mut resolved = Vec::with_capacity(parts.len());
        let mut erased_any = false;
        let mut any_unresolved = false;
        for part in parts {
            match self.resolve_value(part, at)? {
                Some(value) => {
                    if !value.is_resolved() {
                        any_unresolved = true;
                    }
                    resolved.push(value);
                }
                None => erased_any = true,
            }
        }

        if any_unresolved {
            // Only possible under allow_unresolved; keep the shape.
            return Ok(Some(ConfigValue::concat(resolved, original.origin.clone())));
        }

        // An erased optional substitution takes its adjacent whitespace
        // filler with it.
        if erased_any {
            while resolved.first().is_some_and(is_whitespace_string) {
                resolved.remove(0);
            }
            while resolved.last().is_some_and(is_whitespace_string) {
                resolved.pop();
            }
        }

        join_concat(resolved, &original.origin)
    }

    fn resolve_delayed_merge(
        &mut self,
        stack: &[ConfigValue],
        at: &[String],
    ) -> Result<Option<ConfigValue>> {
        // Fold from the right: each newer layer is resolved with the
        // merged older layers available as the previous value.
        let mut previous: Option<ConfigValue> = None;
        for layer in stack.iter().rev() {
            self.self_stack.push((at.to_vec(), previous.clone()));
            let result = self.resolve_value(layer, at);
            self.self_stack.pop();
            previous = match (result?, previous) {
                (Some(new), Some(old)) => Some(new.with_fallback(&old)),
                (Some(new), None) => Some(new),
                (None, old) => old,
            };
        }
        Ok(previous)
    }

    fn resolve_substitution(
        &mut self,
        original: &ConfigValue,
        sub: &Substitution,
        at: &[String],
    ) -> Result<Option<ConfigValue>> {
        let target = sub.path.segments();
        trace!("resolving {} at {:?}", sub.expression(), at);

        if is_prefix(target, at) {
            return self.resolve_self_reference(original, sub, target);
        }

        if self.in_progress.iter().any(|p| p.as_slice() == target) {
            if sub.optional {
                return Ok(None);
            }
            if self.options.allow_unresolved() {
                return Ok(Some(original.clone()));
            }
            let trace: Vec<String> = self
                .in_progress
                .iter()
                .map(|p| Path::new(p.clone()).render())
                .collect();
            return Err(ConfigError::cycle(
                original.origin.clone(),
                format!(
                    "cycle detected while resolving substitution {}.",
                    sub.expression()
                ),
                trace,
            ));
        }

        if let Some(cached) = self.memo.get(target) {
            return Ok(Some(cached.clone()));
        }

        self.in_progress.push(target.to_vec());
        let result = self.lookup(target);
        self.in_progress.pop();

        match result? {
            Some(value) => {
                if self.in_progress.is_empty() && self.self_stack.is_empty() && value.is_resolved()
                {
                    self.memo.insert(target.to_vec(), value.clone());
                }
                Ok(Some(value))
            }
            None => {
                if self.options.use_system_environment()
                    && let Some((name, text)) = env_lookup(&sub.path)
                {
                    return Ok(Some(ConfigValue::string(
                        text,
                        Origin::new(format!("env var \"{name}\"")),
                    )));
                }
                if sub.optional {
                    Ok(None)
                } else if self.options.allow_unresolved() {
                    Ok(Some(original.clone()))
                } else {
                    Err(ConfigError::unresolved_substitution(
                        original.origin.clone(),
                        sub.expression(),
                    ))
                }
            }
        }
    }

    /// A substitution whose path is a prefix of the path under
    /// definition resolves against the previous value from the
    /// enclosing delayed-merge stack.
    fn resolve_self_reference(
        &mut self,
        original: &ConfigValue,
        sub: &Substitution,
        target: &[String],
    ) -> Result<Option<ConfigValue>> {
        for (def_path, previous) in self.self_stack.iter().rev() {
            if is_prefix(def_path, target) {
                let found = previous
                    .as_ref()
                    .and_then(|value| descend(value, &target[def_path.len()..]));
                return match found {
                    Some(value) => Ok(Some(value.clone())),
                    None => self.absent_self_reference(original, sub),
                };
            }
        }
        self.absent_self_reference(original, sub)
    }

    fn absent_self_reference(
        &mut self,
        original: &ConfigValue,
        sub: &Substitution,
    ) -> Result<Option<ConfigValue>> {
        if sub.optional {
            Ok(None)
        } else if self.options.allow_unresolved() {
            Ok(Some(original.clone()))
        } else {
            Err(ConfigError::cycle(
                original.origin.clone(),
                format!(
                    "substitution {} is part of a cycle of substitutions (self-referential with \
                     no previous value).",
                    sub.expression()
                ),
                vec![sub.path.render()],
            ))
        }
    }

    /// Look up a path in the raw root and resolve what is found.
    ///
    /// Descends raw objects first so only the needed subtree is
    /// resolved, then descends the resolved value for any remaining
    /// segments (which exist when the raw walk hit an unresolved shape).
    fn lookup(&mut self, target: &[String]) -> Result<Option<ConfigValue>> {
        let root = self.root;
        let Some(mut current) = root.get(&target[0]) else {
            return Ok(None);
        };
        let mut walked = vec![target[0].clone()];
        let mut index = 1;
        while index < target.len() {
            let ValueKind::Object(object) = &current.kind else {
                break;
            };
            let Some(next) = object.get(&target[index]) else {
                return Ok(None);
            };
            current = next;
            walked.push(target[index].clone());
            index += 1;
        }

        let resolved = self.resolve_value(current, &walked)?;
        if index == target.len() {
            return Ok(resolved);
        }
        match resolved {
            None => Ok(None),
            Some(value) => Ok(descend(&value, &target[index..]).cloned()),
        }
    }
}

/// Descend a resolved value through object keys.
fn descend<'v>(value: &'v ConfigValue, segments: &[String]) -> Option<&'v ConfigValue> {
    let mut current = value;
    for segment in segments {
        match &current.kind {
            ValueKind::Object(object) => current = object.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn is_prefix(prefix: &[String], of: &[String]) -> bool {
    of.len() >= prefix.len() && prefix == &of[..prefix.len()]
}

fn is_whitespace_string(value: &ConfigValue) -> bool {
    matches!(&value.kind, ValueKind::String(s) if s.chars().all(char::is_whitespace))
}

fn env_lookup(path: &Path) -> Option<(String, String)> {
    let dotted = path.join_plain(".");
    if let Ok(value) = std::env::var(&dotted) {
        return Some((dotted, value));
    }
    let underscored = path.join_plain("_");
    std::env::var(&underscored).ok().map(|v| (underscored, v))
}
