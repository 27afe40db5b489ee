//! Typed tool parameter schema.
//!
//! Each tool declares its parameters as `ParamSpec`s rather than a raw JSON
//! blob so the argument normalizer can see the declared kind, required flag,
//! and default of every field. `ToolParams::to_json_schema` renders the
//! object-schema shape the inference server expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The declared type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// The JSON Schema type tag for this kind.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

/// Declaration of a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    pub fn object(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Object, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// The ordered parameter declarations of one tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolParams(pub Vec<ParamSpec>);

impl ToolParams {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self(params)
    }

    /// Look up a parameter declaration by name.
    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.0.iter()
    }

    /// Render the JSON Schema object sent to the inference server.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for p in &self.0 {
            properties.insert(
                p.name.clone(),
                serde_json::json!({
                    "type": p.kind.type_tag(),
                    "description": p.description,
                }),
            );
            if p.required {
                required.push(Value::String(p.name.clone()));
            }
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ToolParams {
        ToolParams::new(vec![
            ParamSpec::string("command", "The shell command to execute.").required(),
            ParamSpec::integer("timeout", "Timeout in seconds.")
                .with_default(serde_json::json!(90)),
            ParamSpec::boolean("show_hidden", "Include hidden files."),
        ])
    }

    #[test]
    fn lookup_by_name() {
        let params = sample();
        assert_eq!(params.get("command").unwrap().kind, ParamKind::String);
        assert!(params.get("nonexistent").is_none());
    }

    #[test]
    fn renders_json_schema() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["command"]["type"], "string");
        assert_eq!(schema["properties"]["timeout"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["command"]));
    }

    #[test]
    fn defaults_are_declared_not_rendered() {
        // Defaults are a normalizer concern; the wire schema stays plain.
        let schema = sample().to_json_schema();
        assert!(schema["properties"]["timeout"].get("default").is_none());
        assert_eq!(
            sample().get("timeout").unwrap().default,
            Some(serde_json::json!(90))
        );
    }
}
