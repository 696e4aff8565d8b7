//! Normalization of structured calls into [`ProposedChange`]s, plus the
//! text protocol used when the host model has no native tool calling.

use serde_json::Value;

use specforge_models::{ParameterSchema, ParameterType, ProposedChange, ToolCall, ToolDefinition};

pub const WRITE_FILE: &str = "writeFile";
pub const EDIT_FILE: &str = "editFile";
pub const RUN_COMMAND: &str = "runCommand";

const PATH_KEYS: &[&str] = &["path", "filePath", "file_path"];
const CONTENT_KEYS: &[&str] = &["content", "text"];
const OLD_TEXT_KEYS: &[&str] = &["oldText", "old_text", "oldContent", "old_content"];
const NEW_TEXT_KEYS: &[&str] = &["newText", "new_text", "newContent", "new_content"];
const COMMAND_KEYS: &[&str] = &["command", "cmd"];

/// The three tools that map one-to-one onto [`ProposedChange`]
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            WRITE_FILE,
            "Create a file or replace its entire content",
            ParameterSchema::new()
                .param("path", ParameterType::String, "Workspace-relative file path", true)
                .param("content", ParameterType::String, "Complete new file content", true),
        ),
        ToolDefinition::new(
            EDIT_FILE,
            "Replace one exact occurrence of text in an existing file",
            ParameterSchema::new()
                .param("path", ParameterType::String, "Workspace-relative file path", true)
                .param("oldText", ParameterType::String, "Exact text to replace", true)
                .param("newText", ParameterType::String, "Replacement text", true),
        ),
        ToolDefinition::new(
            RUN_COMMAND,
            "Run a shell command in the workspace root",
            ParameterSchema::new().param("command", ParameterType::String, "Command line to run", true),
        ),
    ]
}

fn first_argument(call: &ToolCall, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| call.argument(key))
        .unwrap_or_default()
        .to_string()
}

/// Map one call onto the canonical shape.
///
/// Unknown tool names degrade to a write using whatever path/content
/// arguments are present; this never fails.
pub fn normalize_tool_call(call: &ToolCall) -> ProposedChange {
    match call.name.as_str() {
        "writeFile" | "write_file" => ProposedChange::WriteFile {
            path: first_argument(call, PATH_KEYS),
            content: first_argument(call, CONTENT_KEYS),
        },
        "editFile" | "edit_file" => ProposedChange::EditFile {
            path: first_argument(call, PATH_KEYS),
            old_text: first_argument(call, OLD_TEXT_KEYS),
            new_text: first_argument(call, NEW_TEXT_KEYS),
        },
        "runCommand" | "run_command" => ProposedChange::RunCommand {
            command: first_argument(call, COMMAND_KEYS),
        },
        other => {
            tracing::warn!(tool = other, "unknown tool name, treating it as a file write");
            ProposedChange::WriteFile {
                path: first_argument(call, PATH_KEYS),
                content: first_argument(call, CONTENT_KEYS),
            }
        }
    }
}

pub fn normalize_tool_calls(calls: &[ToolCall]) -> Vec<ProposedChange> {
    calls.iter().map(normalize_tool_call).collect()
}

/// Extend a system prompt with a description of `tools` and the JSON-array
/// answer format expected from a model without native tool calling.
pub fn build_host_tool_prompt(system: &str, tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(system.trim_end());
    if !prompt.is_empty() {
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Available actions\n\n");
    prompt.push_str("You can propose actions by calling the following tools:\n\n");
    for tool in tools {
        prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        for (name, param) in &tool.parameter_schema.properties {
            let required = if tool.parameter_schema.is_required(name) {
                "required"
            } else {
                "optional"
            };
            prompt.push_str(&format!(
                "  - {} ({}, {}): {}\n",
                name,
                param.kind.as_str(),
                required,
                param.description
            ));
        }
    }

    prompt.push_str(
        "\nRespond with ONLY a JSON array of tool calls and no other text. Each element must \
         have the form {\"name\": \"<tool name>\", \"arguments\": {\"<parameter>\": \"<value>\"}}. \
         Respond with [] if no action is needed.",
    );
    prompt
}

/// Find the bracketed span starting at the first `[` that closes it,
/// skipping brackets inside JSON strings.
fn balanced_array_span(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn locate_json_array(text: &str) -> Option<Vec<Value>> {
    let start = text.find('[')?;

    // Widest span first, then the tightest balanced one
    if let Some(end) = text.rfind(']') {
        if end > start {
            if let Ok(items) = serde_json::from_str::<Vec<Value>>(&text[start..=end]) {
                return Some(items);
            }
        }
    }

    balanced_array_span(text, start).and_then(|span| serde_json::from_str(span).ok())
}

fn tool_call_from_value(item: &Value) -> Option<ToolCall> {
    let name = item
        .get("name")
        .or_else(|| item.get("tool"))
        .and_then(Value::as_str)?;

    let arguments = item
        .get("arguments")
        .or_else(|| item.get("input"))
        .or_else(|| item.get("parameters"))
        .cloned()
        .unwrap_or(Value::Null);

    // Some models double-encode the arguments object
    let arguments = match arguments {
        Value::String(encoded) => serde_json::from_str(&encoded).unwrap_or(Value::Null),
        other => other,
    };

    Some(ToolCall::from_json_arguments(name, &arguments))
}

/// Decode the JSON array a host model was asked to produce.
///
/// Text around the array is ignored. No array, or an unparsable one, means
/// no calls.
pub fn parse_host_tool_calls(text: &str) -> Vec<ToolCall> {
    match locate_json_array(text) {
        Some(items) => items.iter().filter_map(tool_call_from_value).collect(),
        None => {
            tracing::debug!("no tool call array found in host model output");
            Vec::new()
        }
    }
}
