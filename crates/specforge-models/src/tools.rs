use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Primitive type of a declared tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// A single named parameter of a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub description: String,
}

/// Declared parameters of a tool and which of them are required
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub properties: BTreeMap<String, ToolParameter>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; `required` controls membership in the required list
    pub fn param(
        mut self,
        name: &str,
        kind: ParameterType,
        description: &str,
        required: bool,
    ) -> Self {
        self.properties.insert(
            name.to_string(),
            ToolParameter {
                kind,
                description: description.to_string(),
            },
        );
        if required && !self.required.iter().any(|r| r == name) {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Render as a JSON Schema object, the shape both direct backends accept
    pub fn to_json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, param)| {
                (
                    name.clone(),
                    json!({
                        "type": param.kind.as_str(),
                        "description": param.description,
                    }),
                )
            })
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required,
        })
    }
}

/// Tool definition supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameter_schema: ParameterSchema,
}

impl ToolDefinition {
    pub fn new(name: &str, description: &str, parameter_schema: ParameterSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameter_schema,
        }
    }
}

/// A backend's structured call after backend-specific decoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl ToolCall {
    /// Build from a JSON arguments object. String values are kept verbatim,
    /// anything else keeps its compact JSON text.
    pub fn from_json_arguments(name: &str, arguments: &Value) -> Self {
        let arguments = arguments
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| {
                        let text = match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (key.clone(), text)
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            arguments,
        }
    }

    pub fn argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).map(String::as_str)
    }
}

/// Canonical, backend-agnostic structured action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProposedChange {
    #[serde(rename_all = "camelCase")]
    WriteFile { path: String, content: String },
    #[serde(rename_all = "camelCase")]
    EditFile {
        path: String,
        old_text: String,
        new_text: String,
    },
    #[serde(rename_all = "camelCase")]
    RunCommand { command: String },
}

impl ProposedChange {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WriteFile { .. } => "writeFile",
            Self::EditFile { .. } => "editFile",
            Self::RunCommand { .. } => "runCommand",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_renders_required_and_types() {
        let schema = ParameterSchema::new()
            .param("path", ParameterType::String, "Target file", true)
            .param("mode", ParameterType::Integer, "Unix mode", false);

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "mode": {"type": "integer", "description": "Unix mode"},
                    "path": {"type": "string", "description": "Target file"}
                },
                "required": ["path"]
            })
        );
    }

    #[test]
    fn test_required_not_duplicated() {
        let schema = ParameterSchema::new()
            .param("path", ParameterType::String, "a", true)
            .param("path", ParameterType::String, "b", true);
        assert_eq!(schema.required, vec!["path".to_string()]);
        assert_eq!(schema.properties["path"].description, "b");
    }

    #[test]
    fn test_tool_call_stringifies_non_string_arguments() {
        let call = ToolCall::from_json_arguments(
            "runCommand",
            &json!({"command": "ls", "timeout": 30, "dry": true}),
        );
        assert_eq!(call.argument("command"), Some("ls"));
        assert_eq!(call.argument("timeout"), Some("30"));
        assert_eq!(call.argument("dry"), Some("true"));
    }

    #[test]
    fn test_tool_call_non_object_arguments_are_empty() {
        let call = ToolCall::from_json_arguments("writeFile", &json!("oops"));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_proposed_change_serializes_tagged() {
        let change = ProposedChange::EditFile {
            path: "src/main.rs".to_string(),
            old_text: "a".to_string(),
            new_text: "b".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&change).unwrap(),
            json!({"kind": "editFile", "path": "src/main.rs", "oldText": "a", "newText": "b"})
        );
    }
}
