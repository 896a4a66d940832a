//! The semantic config value tree.
//!
//! Values form a closed sum: objects, lists, scalars, plus the three
//! unresolved shapes the resolver eliminates (concatenations,
//! substitutions, delayed merges). Every value carries an origin. Trees
//! handed to the resolver are never mutated; merging builds new values.

use indexmap::IndexMap;

use crate::{Origin, Path};

/// Whether a subtree still contains anything the resolver must process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStatus {
    /// No substitutions, concatenations, or delayed merges anywhere.
    Resolved,
    /// At least one unresolved shape remains.
    Unresolved,
}

/// A config value: a kind plus the origin it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValue {
    /// The shape and content of this value.
    pub kind: ValueKind,
    /// Where this value came from.
    pub origin: Origin,
}

/// The closed sum of value shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Key/value mapping. Insertion order is preserved for rendering;
    /// equality ignores order.
    Object(Object),
    /// Ordered sequence of values.
    List(Vec<ConfigValue>),
    /// String scalar.
    String(String),
    /// Integer scalar (64-bit signed).
    Int(i64),
    /// Floating point scalar.
    Double(f64),
    /// Boolean scalar.
    Bool(bool),
    /// Null scalar.
    Null,
    /// Adjacent values to be joined at resolve time.
    Concat(Vec<ConfigValue>),
    /// A `${path}` or `${?path}` reference.
    Substitution(Substitution),
    /// Values whose merge is postponed until substitutions resolve.
    /// Highest priority first; resolution folds from the right.
    DelayedMerge(Vec<ConfigValue>),
}

/// An object: ordered mapping from key to child value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    entries: IndexMap<String, ConfigValue>,
}

/// A substitution expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// The referenced path.
    pub path: Path,
    /// True for `${?path}`: missing resolves to absence instead of an
    /// error.
    pub optional: bool,
}

impl Substitution {
    /// The expression as written, e.g. `${a.b}` or `${?a.b}`.
    pub fn expression(&self) -> String {
        if self.optional {
            format!("${{?{}}}", self.path.render())
        } else {
            format!("${{{}}}", self.path.render())
        }
    }
}

impl ConfigValue {
    /// Create a string value.
    pub fn string(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            kind: ValueKind::String(text.into()),
            origin,
        }
    }

    /// Create an integer value.
    pub fn int(value: i64, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Int(value),
            origin,
        }
    }

    /// Create a double value.
    pub fn double(value: f64, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Double(value),
            origin,
        }
    }

    /// Create a boolean value.
    pub fn bool(value: bool, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Bool(value),
            origin,
        }
    }

    /// Create a null value.
    pub fn null(origin: Origin) -> Self {
        Self {
            kind: ValueKind::Null,
            origin,
        }
    }

    /// Create an object value.
    pub fn object(object: Object, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Object(object),
            origin,
        }
    }

    /// Create an empty object value.
    pub fn empty_object(origin: Origin) -> Self {
        Self::object(Object::default(), origin)
    }

    /// Create a list value.
    pub fn list(items: Vec<ConfigValue>, origin: Origin) -> Self {
        Self {
            kind: ValueKind::List(items),
            origin,
        }
    }

    /// Create a concatenation.
    pub fn concat(parts: Vec<ConfigValue>, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Concat(parts),
            origin,
        }
    }

    /// Create a substitution reference.
    pub fn substitution(path: Path, optional: bool, origin: Origin) -> Self {
        Self {
            kind: ValueKind::Substitution(Substitution { path, optional }),
            origin,
        }
    }

    /// The resolve status of this subtree.
    pub fn resolve_status(&self) -> ResolveStatus {
        if self.is_resolved() {
            ResolveStatus::Resolved
        } else {
            ResolveStatus::Unresolved
        }
    }

    /// True iff the subtree contains no substitution, concatenation, or
    /// delayed merge.
    pub fn is_resolved(&self) -> bool {
        match &self.kind {
            ValueKind::Object(object) => object.values().all(ConfigValue::is_resolved),
            ValueKind::List(items) => items.iter().all(ConfigValue::is_resolved),
            ValueKind::String(_)
            | ValueKind::Int(_)
            | ValueKind::Double(_)
            | ValueKind::Bool(_)
            | ValueKind::Null => true,
            ValueKind::Concat(_) | ValueKind::Substitution(_) | ValueKind::DelayedMerge(_) => {
                false
            }
        }
    }

    /// Short kind name used in diagnostics.
    pub fn value_type_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Object(_) => "object",
            ValueKind::List(_) => "list",
            ValueKind::String(_) => "string",
            ValueKind::Int(_) | ValueKind::Double(_) => "number",
            ValueKind::Bool(_) => "boolean",
            ValueKind::Null => "null",
            ValueKind::Concat(_) => "concatenation",
            ValueKind::Substitution(_) => "substitution",
            ValueKind::DelayedMerge(_) => "delayed merge",
        }
    }

    /// Get the object, if this is one.
    pub fn as_object(&self) -> Option<&Object> {
        match &self.kind {
            ValueKind::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Get the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match &self.kind {
            ValueKind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get the string, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render a scalar as the string it contributes to a string
    /// concatenation. Objects, lists, and unresolved shapes return None.
    pub fn scalar_to_string(&self) -> Option<String> {
        match &self.kind {
            ValueKind::String(s) => Some(s.clone()),
            ValueKind::Int(n) => Some(n.to_string()),
            ValueKind::Double(d) => Some(format_double(*d)),
            ValueKind::Bool(b) => Some(b.to_string()),
            ValueKind::Null => Some("null".to_string()),
            _ => None,
        }
    }

    /// Merge with `fallback`, this value winning on conflicts.
    ///
    /// Objects merge key-wise and recursively; a resolved scalar or list
    /// ignores its fallback entirely. When either side still contains an
    /// unresolved top-level shape the merge is recorded as a delayed
    /// merge and replayed by the resolver once both sides are concrete.
    pub fn with_fallback(&self, fallback: &ConfigValue) -> ConfigValue {
        match &self.kind {
            ValueKind::DelayedMerge(stack) => {
                let mut stack = stack.clone();
                stack.extend(fallback.delayed_merge_stack());
                ConfigValue {
                    kind: ValueKind::DelayedMerge(stack),
                    origin: Origin::merged(&self.origin, &fallback.origin),
                }
            }
            ValueKind::Substitution(_) | ValueKind::Concat(_) => {
                let mut stack = vec![self.clone()];
                stack.extend(fallback.delayed_merge_stack());
                ConfigValue {
                    kind: ValueKind::DelayedMerge(stack),
                    origin: Origin::merged(&self.origin, &fallback.origin),
                }
            }
            ValueKind::Object(object) => match &fallback.kind {
                ValueKind::Object(fallback_object) => {
                    let merged = object.merged_with(fallback_object);
                    ConfigValue {
                        kind: ValueKind::Object(merged),
                        origin: Origin::merged(&self.origin, &fallback.origin),
                    }
                }
                ValueKind::Substitution(_)
                | ValueKind::Concat(_)
                | ValueKind::DelayedMerge(_) => {
                    // The fallback may turn out to be an object we must
                    // merge beneath this one.
                    let mut stack = vec![self.clone()];
                    stack.extend(fallback.delayed_merge_stack());
                    ConfigValue {
                        kind: ValueKind::DelayedMerge(stack),
                        origin: Origin::merged(&self.origin, &fallback.origin),
                    }
                }
                _ => self.clone(),
            },
            // Resolved scalars and lists win outright.
            _ => self.clone(),
        }
    }

    /// This value as a delayed-merge stack (itself, or its own stack).
    fn delayed_merge_stack(&self) -> Vec<ConfigValue> {
        match &self.kind {
            ValueKind::DelayedMerge(stack) => stack.clone(),
            _ => vec![self.clone()],
        }
    }
}

/// Render a double the way it was most likely written.
pub fn format_double(d: f64) -> String {
    if d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{:.1}", d)
    } else {
        format!("{}", d)
    }
}

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a child value by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Descend a whole path.
    pub fn get_path(&self, path: &Path) -> Option<&ConfigValue> {
        let value = self.get(path.first())?;
        match path.remainder() {
            None => Some(value),
            Some(rest) => value.as_object()?.get_path(&rest),
        }
    }

    /// Insert a value, replacing any existing entry for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) {
        self.entries.insert(key.into(), value);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.entries.iter()
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &ConfigValue> {
        self.entries.values()
    }

    /// Key-wise merge, entries of `self` winning; shared keys recurse
    /// through [`ConfigValue::with_fallback`]. Order: fallback's keys
    /// first (they are "older"), then keys only present in `self`.
    pub fn merged_with(&self, fallback: &Object) -> Object {
        let mut entries = IndexMap::new();
        for (key, fallback_value) in fallback.iter() {
            match self.get(key) {
                Some(value) => {
                    entries.insert(key.clone(), value.with_fallback(fallback_value));
                }
                None => {
                    entries.insert(key.clone(), fallback_value.clone());
                }
            }
        }
        for (key, value) in self.iter() {
            if !fallback.contains_key(key) {
                entries.insert(key.clone(), value.clone());
            }
        }
        Object { entries }
    }
}

impl FromIterator<(String, ConfigValue)> for Object {
    fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
