//! Joining concatenation parts.
//!
//! Used twice: the value builder joins eagerly when every part is already
//! resolved (so `a = [1] "x"` fails at parse time), and the resolver joins
//! after substituting. Callers must pass resolved parts only.

use crate::{ConfigError, ConfigValue, Origin, Result, ValueKind};

/// Join resolved concatenation parts into a single value.
///
/// All-strings join with preserved whitespace (other scalars stringify);
/// all-lists concatenate; all-objects merge with later parts winning.
/// Whitespace filler is ignored between non-string parts. Mixing objects
/// or lists with strings is an error. Returns `None` for an empty part
/// list (possible after optional substitutions erase themselves).
pub fn join_concat(parts: Vec<ConfigValue>, origin: &Origin) -> Result<Option<ConfigValue>> {
    if parts.is_empty() {
        return Ok(None);
    }

    let has_object = parts.iter().any(|p| matches!(p.kind, ValueKind::Object(_)));
    let has_list = parts.iter().any(|p| matches!(p.kind, ValueKind::List(_)));

    if has_object || has_list {
        let mut kept = Vec::new();
        for part in parts {
            match &part.kind {
                ValueKind::Object(_) | ValueKind::List(_) => kept.push(part),
                ValueKind::String(s) if is_whitespace(s) => continue,
                other_kind => {
                    return Err(ConfigError::wrong_type(
                        part.origin.clone(),
                        "",
                        if has_object { "object" } else { "list" },
                        kind_name(other_kind),
                    ));
                }
            }
        }
        if has_object && has_list {
            return Err(ConfigError::wrong_type(
                origin.clone(),
                "",
                "all objects or all lists in concatenation",
                "a mix of objects and lists",
            ));
        }
        if kept.len() == 1 {
            return Ok(kept.pop());
        }
        if has_list {
            let mut items = Vec::new();
            let mut joined_origin = kept[0].origin.clone();
            for part in &kept {
                joined_origin = Origin::merged(&joined_origin, &part.origin);
                if let ValueKind::List(list) = &part.kind {
                    items.extend(list.iter().cloned());
                }
            }
            return Ok(Some(ConfigValue::list(items, joined_origin)));
        }
        // Objects: later parts win, expressed through the left-biased
        // merge primitive with the later part on the left.
        let mut iter = kept.into_iter();
        let mut acc = iter.next().expect("kept is non-empty");
        for part in iter {
            acc = part.with_fallback(&acc);
        }
        return Ok(Some(acc));
    }

    // All scalars.
    if parts.len() == 1 {
        let mut parts = parts;
        return Ok(parts.pop());
    }
    let mut text = String::new();
    let first_origin = parts[0].origin.clone();
    for part in &parts {
        match part.scalar_to_string() {
            Some(s) => text.push_str(&s),
            None => {
                return Err(ConfigError::bug(format!(
                    "unresolved {} reached concatenation join",
                    part.value_type_name()
                )));
            }
        }
    }
    Ok(Some(ConfigValue::string(text, first_origin)))
}

fn is_whitespace(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn kind_name(kind: &ValueKind) -> &'static str {
    match kind {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;

    fn origin() -> Origin {
        Origin::new("test")
    }

    #[test]
    fn test_string_join_preserves_whitespace() {
        let parts = vec![
            ConfigValue::string("foo", origin()),
            ConfigValue::string(" ", origin()),
            ConfigValue::string("bar", origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        assert_eq!(joined.as_str(), Some("foo bar"));
    }

    #[test]
    fn test_scalars_stringify() {
        let parts = vec![
            ConfigValue::int(10, origin()),
            ConfigValue::string("ms", origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        assert_eq!(joined.as_str(), Some("10ms"));
    }

    #[test]
    fn test_null_stringifies() {
        let parts = vec![
            ConfigValue::string("x ", origin()),
            ConfigValue::null(origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        assert_eq!(joined.as_str(), Some("x null"));
    }

    #[test]
    fn test_list_concat() {
        let parts = vec![
            ConfigValue::list(vec![ConfigValue::int(1, origin())], origin()),
            ConfigValue::string(" ", origin()),
            ConfigValue::list(vec![ConfigValue::int(2, origin())], origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        let items = joined.as_list().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_object_concat_later_wins() {
        let mut a = Object::new();
        a.insert("x", ConfigValue::int(1, origin()));
        let mut b = Object::new();
        b.insert("x", ConfigValue::int(2, origin()));
        b.insert("y", ConfigValue::int(3, origin()));
        let parts = vec![
            ConfigValue::object(a, origin()),
            ConfigValue::string(" ", origin()),
            ConfigValue::object(b, origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        let object = joined.as_object().unwrap();
        assert_eq!(object.get("x").unwrap().kind, ValueKind::Int(2));
        assert_eq!(object.get("y").unwrap().kind, ValueKind::Int(3));
    }

    #[test]
    fn test_mixed_is_error() {
        let parts = vec![
            ConfigValue::list(vec![], origin()),
            ConfigValue::string("tail", origin()),
        ];
        assert!(join_concat(parts, &origin()).is_err());
    }

    #[test]
    fn test_single_nonstring_reduces() {
        let parts = vec![
            ConfigValue::string(" ", origin()),
            ConfigValue::list(vec![ConfigValue::int(1, origin())], origin()),
        ];
        let joined = join_concat(parts, &origin()).unwrap().unwrap();
        assert!(joined.as_list().is_some());
    }

    #[test]
    fn test_empty_is_none() {
        assert!(join_concat(vec![], &origin()).unwrap().is_none());
    }
}
