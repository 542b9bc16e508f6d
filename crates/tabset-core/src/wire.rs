//! Helpers shared by the tagged-dictionary builders
//!
//! Every configuration object travels as `{"<identifier>": {<field>: <value>}}`.
//! These functions pull that shape apart and describe what went wrong in
//! terms the caller turns into its own error code.

use serde_json::{Map, Value};

/// A JSON object
pub(crate) type Object = Map<String, Value>;

/// Type name of a JSON value, as reported in error messages
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "None",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

/// Why a tagged dictionary could not be split
#[derive(Debug, PartialEq)]
pub(crate) enum TagError {
    /// Not exactly one key, or the key is not a known identifier
    Keys(Vec<String>),
    /// The identifier maps to something other than an object
    NotObject {
        identifier: String,
        found: &'static str,
    },
}

/// Split `{"<identifier>": {...}}` into its identifier and inner object
pub(crate) fn split_tagged<'a>(
    object: &'a Object,
    identifiers: &[&str],
) -> Result<(&'a str, &'a Object), TagError> {
    let mut entries = object.iter();
    let (key, inner) = match (entries.next(), entries.next()) {
        (Some(entry), None) if identifiers.contains(&entry.0.as_str()) => entry,
        _ => return Err(TagError::Keys(object.keys().cloned().collect())),
    };
    match inner {
        Value::Object(inner) => Ok((key.as_str(), inner)),
        other => Err(TagError::NotObject {
            identifier: key.clone(),
            found: type_name(other),
        }),
    }
}

/// A problem with the set of keys in an inner object
#[derive(Debug, PartialEq)]
pub(crate) enum KeyError {
    /// A required key is absent (or null)
    Missing(&'static str),
    /// A key the variant does not accept
    Unexpected(String),
}

/// Check that `object` only uses `accepted` keys and carries all `required` ones
pub(crate) fn check_keys(
    object: &Object,
    accepted: &[&'static str],
    required: &[&'static str],
) -> Result<(), KeyError> {
    if let Some(key) = object.keys().find(|k| !accepted.contains(&k.as_str())) {
        return Err(KeyError::Unexpected(key.clone()));
    }
    match required
        .iter()
        .find(|k| object.get(**k).is_none_or(Value::is_null))
    {
        Some(key) => Err(KeyError::Missing(key)),
        None => Ok(()),
    }
}

/// Field lookup that treats an explicit null as absent
pub(crate) fn field<'a>(object: &'a Object, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|v| !v.is_null())
}

/// A string or a list of strings, flattened into a list
pub(crate) fn string_or_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

/// Render a list of names the way messages quote them: `['a', 'b']`
pub(crate) fn quoted_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Object {
        match value {
            Value::Object(map) => map,
            _ => panic!("Expected object"),
        }
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(null)), "None");
        assert_eq!(type_name(&json!(true)), "bool");
        assert_eq!(type_name(&json!(3)), "int");
        assert_eq!(type_name(&json!(3.5)), "float");
        assert_eq!(type_name(&json!("x")), "str");
        assert_eq!(type_name(&json!([1])), "list");
        assert_eq!(type_name(&json!({})), "dict");
    }

    #[test]
    fn test_split_tagged() {
        let value = object(json!({"a-input": {"x": 1}}));
        let (id, inner) = split_tagged(&value, &["a-input", "b-input"]).unwrap();
        assert_eq!(id, "a-input");
        assert_eq!(inner.get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_split_tagged_rejects_bad_keys() {
        let two = object(json!({"a-input": {}, "b-input": {}}));
        assert!(matches!(split_tagged(&two, &["a-input", "b-input"]), Err(TagError::Keys(k)) if k.len() == 2));

        let unknown = object(json!({"c-input": {}}));
        assert_eq!(
            split_tagged(&unknown, &["a-input"]),
            Err(TagError::Keys(vec!["c-input".to_string()]))
        );

        let not_object = object(json!({"a-input": "text"}));
        assert_eq!(
            split_tagged(&not_object, &["a-input"]),
            Err(TagError::NotObject {
                identifier: "a-input".to_string(),
                found: "str"
            })
        );
    }

    #[test]
    fn test_check_keys() {
        let value = object(json!({"uri": "x", "format": null}));
        assert_eq!(check_keys(&value, &["uri", "format"], &["uri"]), Ok(()));
        assert_eq!(
            check_keys(&value, &["uri"], &["uri"]),
            Err(KeyError::Unexpected("format".to_string()))
        );
        assert_eq!(
            check_keys(&value, &["uri", "format"], &["format"]),
            Err(KeyError::Missing("format"))
        );
    }

    #[test]
    fn test_string_or_list() {
        assert_eq!(string_or_list(&json!("a")), Some(vec!["a".to_string()]));
        assert_eq!(
            string_or_list(&json!(["a", "b"])),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(string_or_list(&json!(["a", 1])), None);
        assert_eq!(string_or_list(&json!(1)), None);
    }

    #[test]
    fn test_quoted_list() {
        assert_eq!(quoted_list(&["csv", "log"]), "['csv', 'log']");
    }
}
