//! The resolved-config query layer.
//!
//! A `Config` wraps an object root and offers typed path lookups.
//! Missing, wrong-type, and unresolved errors are distinct; accessor
//! errors always propagate.

use hocon_tree::{
    ConfigError, ConfigValue, Object, Path, RenderOptions, Result, ValueKind, render,
};

use crate::{ResolveOptions, resolve, units};

/// An immutable configuration rooted at an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: ConfigValue,
}

impl Config {
    /// Wrap a root value, which must be an object.
    pub fn from_root(root: ConfigValue) -> Result<Config> {
        if root.as_object().is_none() {
            return Err(ConfigError::wrong_type(
                root.origin.clone(),
                "",
                "object at config root",
                root.value_type_name(),
            ));
        }
        Ok(Config { root })
    }

    /// The root value.
    pub fn root(&self) -> &ConfigValue {
        &self.root
    }

    /// The root object.
    pub fn root_object(&self) -> &Object {
        match &self.root.kind {
            ValueKind::Object(object) => object,
            _ => unreachable!("config root is checked at construction"),
        }
    }

    /// Whether the whole tree is free of substitutions.
    pub fn is_resolved(&self) -> bool {
        self.root.is_resolved()
    }

    /// Resolve substitutions with default options.
    pub fn resolve(&self) -> Result<Config> {
        self.resolve_with(&ResolveOptions::default())
    }

    /// Resolve substitutions.
    pub fn resolve_with(&self, options: &ResolveOptions) -> Result<Config> {
        let resolved = resolve(&self.root, options)?;
        Ok(Config { root: resolved })
    }

    /// Merge with a fallback configuration (this one wins) without
    /// re-resolving.
    pub fn with_fallback(&self, other: &Config) -> Config {
        Config {
            root: self.root.with_fallback(&other.root),
        }
    }

    /// Render with default options.
    pub fn render(&self) -> String {
        render(&self.root, &RenderOptions::defaults())
    }

    /// Render with the given options.
    pub fn render_with(&self, options: &RenderOptions) -> String {
        render(&self.root, options)
    }

    /// Find the value at a path, distinguishing missing, wrong-type,
    /// and unresolved failures.
    fn find(&self, path: &str) -> Result<&ConfigValue> {
        let parsed = Path::parse(path)?;
        let segments = parsed.segments();
        let mut current = self.root_object();
        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            let so_far = Path::new(segments[..=index].to_vec());
            let value = current.get(segment).ok_or_else(|| {
                ConfigError::missing(self.root.origin.clone(), so_far.render())
            })?;
            match &value.kind {
                ValueKind::Substitution(_) | ValueKind::Concat(_) | ValueKind::DelayedMerge(_) => {
                    return Err(ConfigError::unresolved_substitution(
                        value.origin.clone(),
                        format!("value at '{}'", so_far.render()),
                    ));
                }
                _ => {}
            }
            if index == last {
                return Ok(value);
            }
            current = value.as_object().ok_or_else(|| {
                ConfigError::wrong_type(
                    value.origin.clone(),
                    so_far.render(),
                    "object",
                    value.value_type_name(),
                )
            })?;
        }
        unreachable!("paths have at least one segment")
    }

    /// Get the value at a path.
    pub fn get_value(&self, path: &str) -> Result<ConfigValue> {
        self.find(path).cloned()
    }

    /// Get a string. Numbers and booleans coerce to their text form.
    pub fn get_string(&self, path: &str) -> Result<String> {
        string_from(self.find(path)?, path)
    }

    /// Get a boolean. The strings `true/false`, `yes/no`, and `on/off`
    /// coerce.
    pub fn get_bool(&self, path: &str) -> Result<bool> {
        bool_from(self.find(path)?, path)
    }

    /// Get a 64-bit signed integer. Doubles must be integral and in
    /// range.
    pub fn get_int(&self, path: &str) -> Result<i64> {
        int_from(self.find(path)?, path)
    }

    /// Get a double. Integers widen.
    pub fn get_double(&self, path: &str) -> Result<f64> {
        double_from(self.find(path)?, path)
    }

    /// Get an object.
    pub fn get_object(&self, path: &str) -> Result<Object> {
        let value = self.find(path)?;
        value.as_object().cloned().ok_or_else(|| {
            ConfigError::wrong_type(value.origin.clone(), path, "object", value.value_type_name())
        })
    }

    /// Get a nested configuration.
    pub fn get_config(&self, path: &str) -> Result<Config> {
        let value = self.find(path)?;
        if value.as_object().is_none() {
            return Err(ConfigError::wrong_type(
                value.origin.clone(),
                path,
                "object",
                value.value_type_name(),
            ));
        }
        Ok(Config {
            root: value.clone(),
        })
    }

    /// Get a list of values.
    pub fn get_list(&self, path: &str) -> Result<Vec<ConfigValue>> {
        let value = self.find(path)?;
        value.as_list().map(|items| items.to_vec()).ok_or_else(|| {
            ConfigError::wrong_type(value.origin.clone(), path, "list", value.value_type_name())
        })
    }

    /// Get a list of strings.
    pub fn get_string_list(&self, path: &str) -> Result<Vec<String>> {
        self.get_list(path)?
            .iter()
            .map(|item| string_from(item, path))
            .collect()
    }

    /// Get a list of integers.
    pub fn get_int_list(&self, path: &str) -> Result<Vec<i64>> {
        self.get_list(path)?
            .iter()
            .map(|item| int_from(item, path))
            .collect()
    }

    /// Get a duration as nanoseconds. Strings carry units (`10ms`,
    /// `5 seconds`); bare numbers mean milliseconds.
    pub fn get_duration(&self, path: &str) -> Result<i64> {
        let value = self.find(path)?;
        match &value.kind {
            ValueKind::String(s) => units::parse_duration(s, &value.origin, path),
            ValueKind::Int(n) => n.checked_mul(1_000_000).ok_or_else(|| {
                ConfigError::wrong_type(
                    value.origin.clone(),
                    path,
                    "duration",
                    "value too large to fit in 64 bits",
                )
            }),
            ValueKind::Double(d) => Ok((d * 1_000_000.0) as i64),
            _ => Err(ConfigError::wrong_type(
                value.origin.clone(),
                path,
                "duration (string or number)",
                value.value_type_name(),
            )),
        }
    }

    /// Get a size in bytes. Strings carry units (`128K`, `1kB`); suffix
    /// shape distinguishes binary from decimal.
    pub fn get_bytes(&self, path: &str) -> Result<i64> {
        let value = self.find(path)?;
        match &value.kind {
            ValueKind::String(s) => units::parse_bytes(s, &value.origin, path),
            ValueKind::Int(n) => Ok(*n),
            ValueKind::Double(d) => Ok(*d as i64),
            _ => Err(ConfigError::wrong_type(
                value.origin.clone(),
                path,
                "size in bytes (string or number)",
                value.value_type_name(),
            )),
        }
    }

    /// True iff every prefix of the path is an object and the leaf is
    /// present and not null. A non-object prefix is a wrong-type error,
    /// not `false`.
    pub fn has_path(&self, path: &str) -> Result<bool> {
        let parsed = Path::parse(path)?;
        let segments = parsed.segments();
        let mut current = self.root_object();
        let last = segments.len() - 1;
        for (index, segment) in segments.iter().enumerate() {
            let Some(value) = current.get(segment) else {
                return Ok(false);
            };
            if index == last {
                return Ok(!matches!(value.kind, ValueKind::Null));
            }
            let so_far = Path::new(segments[..=index].to_vec());
            current = value.as_object().ok_or_else(|| {
                ConfigError::wrong_type(
                    value.origin.clone(),
                    so_far.render(),
                    "object",
                    value.value_type_name(),
                )
            })?;
        }
        unreachable!("paths have at least one segment")
    }
}

fn string_from(value: &ConfigValue, path: &str) -> Result<String> {
    match &value.kind {
        ValueKind::String(s) => Ok(s.clone()),
        ValueKind::Int(n) => Ok(n.to_string()),
        ValueKind::Double(d) => Ok(hocon_tree::format_double(*d)),
        ValueKind::Bool(b) => Ok(b.to_string()),
        _ => Err(ConfigError::wrong_type(
            value.origin.clone(),
            path,
            "string",
            value.value_type_name(),
        )),
    }
}

fn bool_from(value: &ConfigValue, path: &str) -> Result<bool> {
    match &value.kind {
        ValueKind::Bool(b) => Ok(*b),
        ValueKind::String(s) => match s.as_str() {
            "true" | "yes" | "on" => Ok(true),
            "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::wrong_type(
                value.origin.clone(),
                path,
                "boolean",
                "string",
            )),
        },
        _ => Err(ConfigError::wrong_type(
            value.origin.clone(),
            path,
            "boolean",
            value.value_type_name(),
        )),
    }
}

fn int_from(value: &ConfigValue, path: &str) -> Result<i64> {
    match &value.kind {
        ValueKind::Int(n) => Ok(*n),
        ValueKind::Double(d) => {
            if d.fract() == 0.0 && *d >= i64::MIN as f64 && *d <= i64::MAX as f64 {
                Ok(*d as i64)
            } else {
                Err(ConfigError::wrong_type(
                    value.origin.clone(),
                    path,
                    "64-bit integer",
                    "out-of-range or fractional number",
                ))
            }
        }
        _ => Err(ConfigError::wrong_type(
            value.origin.clone(),
            path,
            "number",
            value.value_type_name(),
        )),
    }
}

fn double_from(value: &ConfigValue, path: &str) -> Result<f64> {
    match &value.kind {
        ValueKind::Double(d) => Ok(*d),
        ValueKind::Int(n) => Ok(*n as f64),
        _ => Err(ConfigError::wrong_type(
            value.origin.clone(),
            path,
            "number",
            value.value_type_name(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hocon_tree::ConfigErrorKind;

    fn config(source: &str) -> Config {
        crate::parse_str(source).expect("parse failed")
    }

    #[test]
    fn test_typed_accessors() {
        let config = config(
            "str = hello\nint = 42\ndbl = 2.5\nflag = true\nlist = [1, 2, 3]\nobj { x = 1 }",
        );
        assert_eq!(config.get_string("str").unwrap(), "hello");
        assert_eq!(config.get_int("int").unwrap(), 42);
        assert_eq!(config.get_double("dbl").unwrap(), 2.5);
        assert!(config.get_bool("flag").unwrap());
        assert_eq!(config.get_int_list("list").unwrap(), vec![1, 2, 3]);
        assert_eq!(config.get_object("obj").unwrap().len(), 1);
        assert_eq!(config.get_config("obj").unwrap().get_int("x").unwrap(), 1);
    }

    #[test]
    fn test_string_coercion() {
        let config = config("a = 42\nb = true\nc = 2.5");
        assert_eq!(config.get_string("a").unwrap(), "42");
        assert_eq!(config.get_string("b").unwrap(), "true");
        assert_eq!(config.get_string("c").unwrap(), "2.5");
    }

    #[test]
    fn test_bool_coercion() {
        let config = config("a = yes\nb = off\nc = \"true\"");
        assert!(config.get_bool("a").unwrap());
        assert!(!config.get_bool("b").unwrap());
        assert!(config.get_bool("c").unwrap());
    }

    #[test]
    fn test_int_from_double() {
        let config = config("a = 3.0\nb = 3.5");
        assert_eq!(config.get_int("a").unwrap(), 3);
        assert!(config.get_int("b").is_err());
    }

    #[test]
    fn test_double_from_int() {
        let config = config("a = 3");
        assert_eq!(config.get_double("a").unwrap(), 3.0);
    }

    #[test]
    fn test_missing_error() {
        let config = config("a = 1");
        let error = config.get_int("nope").expect_err("expected missing");
        assert!(matches!(error.kind(), ConfigErrorKind::Missing { .. }));
        let error = config.get_int("a.b.c").expect_err("expected wrong type");
        assert!(matches!(error.kind(), ConfigErrorKind::WrongType { .. }));
    }

    #[test]
    fn test_wrong_type_error() {
        let config = config("a = hello");
        let error = config.get_int("a").expect_err("expected wrong type");
        assert!(matches!(error.kind(), ConfigErrorKind::WrongType { .. }));
    }

    #[test]
    fn test_string_list() {
        let config = config("l = [a, 2, true]");
        assert_eq!(config.get_string_list("l").unwrap(), vec!["a", "2", "true"]);
    }

    #[test]
    fn test_durations() {
        let config = config("a = 10ms\nb = 250\nc = \"5 seconds\"");
        assert_eq!(config.get_duration("a").unwrap(), 10_000_000);
        assert_eq!(config.get_duration("b").unwrap(), 250_000_000);
        assert_eq!(config.get_duration("c").unwrap(), 5_000_000_000);
    }

    #[test]
    fn test_bytes() {
        let config = config("a = 128K\nb = 1kB\nc = 42");
        assert_eq!(config.get_bytes("a").unwrap(), 128 * 1024);
        assert_eq!(config.get_bytes("b").unwrap(), 1000);
        assert_eq!(config.get_bytes("c").unwrap(), 42);
    }

    #[test]
    fn test_has_path() {
        let config = config("a { b = 1 }\nn = null");
        assert!(config.has_path("a").unwrap());
        assert!(config.has_path("a.b").unwrap());
        assert!(!config.has_path("a.c").unwrap());
        assert!(!config.has_path("z").unwrap());
        // null leaf reads as absent
        assert!(!config.has_path("n").unwrap());
        // non-object prefix is an error, not false
        assert!(config.has_path("a.b.c").is_err());
    }

    #[test]
    fn test_with_fallback_left_bias() {
        let a = config("x = 1\nshared = from_a");
        let b = config("y = 2\nshared = from_b");
        let merged = a.with_fallback(&b);
        assert_eq!(merged.get_int("x").unwrap(), 1);
        assert_eq!(merged.get_int("y").unwrap(), 2);
        assert_eq!(merged.get_string("shared").unwrap(), "from_a");
    }

    #[test]
    fn test_with_fallback_then_resolve() {
        let a = config("answer = ${base.value}");
        let b = config("base { value = 42 }");
        let merged = a.with_fallback(&b).resolve().expect("resolve failed");
        assert_eq!(merged.get_int("answer").unwrap(), 42);
    }

    #[test]
    fn test_unresolved_access_raises() {
        let unresolved = crate::parse_str("a = ${b}\nb = 1").expect("parse failed");
        let error = unresolved.get_int("a").expect_err("expected unresolved");
        assert!(matches!(
            error.kind(),
            ConfigErrorKind::UnresolvedSubstitution { .. }
        ));
        // But resolving first works
        assert_eq!(unresolved.resolve().unwrap().get_int("a").unwrap(), 1);
    }

    #[test]
    fn test_quoted_path_segments() {
        let config = config("\"a.b\" = 1");
        assert_eq!(config.get_int("\"a.b\"").unwrap(), 1);
    }
}
