//! Argument normalizer — repairs model-supplied tool arguments.
//!
//! Small local models mangle tool arguments in predictable ways: the whole
//! arguments object arrives as a JSON-encoded string (sometimes encoded
//! twice), individual string fields wrap the real value in another object,
//! booleans and numbers come quoted. The normalizer undoes those artifacts
//! against the tool's declared parameter schema before dispatch, so tool
//! implementations only ever see typed values.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use llamaloop_core::{NormalizeError, ParamKind, ToolParams};

/// Ceiling on string-unwrap attempts. A string that JSON-encodes itself
/// would otherwise loop forever.
const MAX_UNWRAP_DEPTH: usize = 4;

/// Normalize raw arguments against a tool's parameter declarations.
///
/// Repairs applied in order:
/// 1. unwrap string-encoded argument objects (bounded recursion),
/// 2. unwrap same-key-wrapped field values,
/// 3. coerce quoted booleans/integers/numbers per the declared kind,
/// 4. drop undeclared fields, fill declared defaults, and require the rest.
///
/// Idempotent: already-normalized arguments come back unchanged.
pub fn normalize(
    tool_name: &str,
    params: &ToolParams,
    raw: Value,
) -> Result<Map<String, Value>, NormalizeError> {
    let unwrapped = unwrap_serialized(raw);

    let object = match unwrapped {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(NormalizeError::NotAnObject {
                tool: tool_name.to_string(),
                got: type_name(&other).to_string(),
            });
        }
    };

    let mut normalized = Map::new();
    for (key, value) in object {
        let Some(spec) = params.get(&key) else {
            // Models hallucinate extra fields; tolerate them silently.
            trace!(tool = tool_name, field = %key, "Dropping undeclared argument");
            continue;
        };
        let value = unwrap_same_key(&key, value);
        normalized.insert(key, coerce(spec.kind, value));
    }

    for spec in params.iter() {
        if normalized.contains_key(&spec.name) {
            continue;
        }
        if let Some(default) = &spec.default {
            normalized.insert(spec.name.clone(), default.clone());
        } else if spec.required {
            return Err(NormalizeError::MissingRequired {
                tool: tool_name.to_string(),
                field: spec.name.clone(),
            });
        }
    }

    Ok(normalized)
}

/// While the whole value is a string containing JSON, parse it — up to the
/// fixed ceiling. The common case is one extra layer of encoding.
fn unwrap_serialized(mut value: Value) -> Value {
    for depth in 0..MAX_UNWRAP_DEPTH {
        let Value::String(s) = &value else {
            break;
        };
        let trimmed = s.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with('"')) {
            break;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(parsed) => {
                debug!(depth, "Unwrapped a layer of argument serialization");
                value = parsed;
            }
            Err(_) => break,
        }
    }
    value
}

/// Some models wrap a field's value in a JSON object keyed by the same
/// field name: `{"path": "{\"path\": \"a.txt\"}"}`. Unwrap one level when
/// the parsed object contains the key.
fn unwrap_same_key(key: &str, value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let trimmed = s.trim();
    if !trimmed.starts_with('{') {
        return value;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut obj)) => match obj.remove(key) {
            Some(inner) => inner,
            None => value,
        },
        _ => value,
    }
}

/// Coerce a string into the declared primitive kind when a case-insensitive
/// literal interpretation exists; otherwise leave the value alone and let
/// the tool reject it.
fn coerce(kind: ParamKind, value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    match kind {
        ParamKind::Boolean => match s.to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value,
        },
        ParamKind::Integer => match s.trim().parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => value,
        },
        ParamKind::Number => {
            if let Ok(n) = s.trim().parse::<i64>() {
                return Value::Number(n.into());
            }
            match s.trim().parse::<f64>() {
                Ok(f) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(value),
                Err(_) => value,
            }
        }
        _ => value,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llamaloop_core::ParamSpec;
    use serde_json::json;

    fn params() -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("path", "File path.").required(),
            ParamSpec::boolean("show_hidden", "Include hidden files."),
            ParamSpec::integer("timeout", "Seconds.").with_default(json!(90)),
            ParamSpec::new("ratio", ParamKind::Number, "A ratio."),
        ])
    }

    #[test]
    fn passthrough_of_typed_arguments() {
        let raw = json!({"path": "a.txt", "show_hidden": true});
        let result = normalize("list_dir", &params(), raw).unwrap();
        assert_eq!(result["path"], json!("a.txt"));
        assert_eq!(result["show_hidden"], json!(true));
        // Declared default filled in.
        assert_eq!(result["timeout"], json!(90));
    }

    #[test]
    fn idempotent_on_normalized_arguments() {
        let raw = json!({"path": "a.txt", "show_hidden": false, "timeout": 30});
        let once = normalize("t", &params(), raw).unwrap();
        let twice = normalize("t", &params(), Value::Object(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unwraps_string_encoded_object() {
        let raw = json!(r#"{"path": "a.txt"}"#);
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["path"], json!("a.txt"));
    }

    #[test]
    fn unwraps_doubly_encoded_object() {
        let inner = r#"{"path": "a.txt"}"#;
        let outer = serde_json::to_string(inner).unwrap();
        let result = normalize("t", &params(), json!(outer)).unwrap();
        assert_eq!(result["path"], json!("a.txt"));
    }

    #[test]
    fn unwrap_terminates_on_self_encoding_string() {
        // Each parse yields another JSON string; the ceiling must stop it.
        let mut value = String::from("\"base\"");
        for _ in 0..10 {
            value = serde_json::to_string(&value).unwrap();
        }
        let result = normalize("t", &params(), Value::String(value));
        // Lands on a string, not an object — reported as such, not hung.
        assert!(matches!(result, Err(NormalizeError::NotAnObject { .. })));
    }

    #[test]
    fn coerces_quoted_boolean() {
        let raw = json!({"path": "a.txt", "show_hidden": "false"});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["show_hidden"], json!(false));

        let raw = json!({"path": "a.txt", "show_hidden": "True"});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["show_hidden"], json!(true));
    }

    #[test]
    fn coerces_quoted_numbers() {
        let raw = json!({"path": "a.txt", "timeout": "45", "ratio": "0.5"});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["timeout"], json!(45));
        assert_eq!(result["ratio"], json!(0.5));
    }

    #[test]
    fn unparseable_strings_left_as_is() {
        let raw = json!({"path": "a.txt", "timeout": "soon"});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["timeout"], json!("soon"));
    }

    #[test]
    fn unknown_fields_dropped() {
        let raw = json!({"path": "a.txt", "hallucinated": 42});
        let result = normalize("t", &params(), raw).unwrap();
        assert!(!result.contains_key("hallucinated"));
    }

    #[test]
    fn missing_required_is_an_error_naming_the_field() {
        let raw = json!({"show_hidden": true});
        let err = normalize("list_dir", &params(), raw).unwrap_err();
        match err {
            NormalizeError::MissingRequired { tool, field } => {
                assert_eq!(tool, "list_dir");
                assert_eq!(field, "path");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn same_key_wrapped_value_unwrapped() {
        let raw = json!({"path": r#"{"path": "real.txt"}"#});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["path"], json!("real.txt"));
    }

    #[test]
    fn differently_keyed_wrap_left_alone() {
        let raw = json!({"path": r#"{"other": "x"}"#});
        let result = normalize("t", &params(), raw).unwrap();
        assert_eq!(result["path"], json!(r#"{"other": "x"}"#));
    }

    #[test]
    fn null_arguments_mean_empty() {
        let only_optional = ToolParams::new(vec![ParamSpec::string("q", "Query.")]);
        let result = normalize("t", &only_optional, Value::Null).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn array_arguments_rejected() {
        let err = normalize("t", &params(), json!([1, 2])).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { .. }));
    }
}
