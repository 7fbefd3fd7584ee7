//! Tool types and the tool/schema bridge.
//!
//! Tools are discovered from a [`ToolProvider`](super::toolbox::ToolProvider)
//! as [`ToolSpec`]s and handed to the model as [`ToolDefinition`]s. Results
//! come back as [`ToolOutcome`]s and are flattened to a single string before
//! the model sees them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::AgentError;

/// Maximum raw byte length of tool argument JSON from the LLM.
pub const MAX_TOOL_ARGS_LEN: usize = 100_000;

/// A tool as advertised by the tool provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, unique within a catalog.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema for the arguments. May be `null` or empty.
    #[serde(default)]
    pub input_schema: Value,
}

/// A tool definition in the shape the model API expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: Value,
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call (assigned by the provider).
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON-encoded arguments for the tool.
    pub arguments: String,
}

/// The single pending tool invocation of a model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocationRequest {
    /// Provider-assigned call ID, echoed back with the result.
    pub call_id: String,
    /// Tool to invoke.
    pub tool_name: String,
    /// Raw JSON arguments as emitted by the model.
    pub arguments: String,
}

impl ToolInvocationRequest {
    /// Parses the arguments into a JSON object.
    ///
    /// An empty or whitespace-only argument string is treated as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolInvocation`] when the payload is too large,
    /// is not valid JSON, or is not an object.
    pub fn parse_arguments(&self) -> Result<Map<String, Value>, AgentError> {
        let fail = |message: String| AgentError::ToolInvocation {
            name: self.tool_name.clone(),
            message,
        };

        if self.arguments.len() > MAX_TOOL_ARGS_LEN {
            return Err(fail(format!(
                "tool arguments too large ({} bytes, max {MAX_TOOL_ARGS_LEN})",
                self.arguments.len()
            )));
        }

        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(fail(format!(
                "arguments must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(fail(format!("invalid arguments: {e}"))),
        }
    }

    /// Converts the request back into the wire-level tool call.
    #[must_use]
    pub fn to_call(&self) -> ToolCall {
        ToolCall {
            id: self.call_id.clone(),
            name: self.tool_name.clone(),
            arguments: self.arguments.clone(),
        }
    }
}

impl From<ToolCall> for ToolInvocationRequest {
    fn from(call: ToolCall) -> Self {
        Self {
            call_id: call.id,
            tool_name: call.name,
            arguments: call.arguments,
        }
    }
}

/// One content item of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContentPart {
    /// Plain text.
    Text(String),
    /// Any non-text payload, kept as JSON.
    Structured(Value),
}

impl ContentPart {
    /// Renders the part as text; structured payloads become compact JSON.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }
}

/// The result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Content items in provider order.
    pub parts: Vec<ContentPart>,
    /// Whether the tool reported failure.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutcome {
    /// Successful outcome with a single text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(text.into())],
            is_error: false,
        }
    }

    /// Failed outcome carrying the error text.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            parts: vec![ContentPart::Text(message.into())],
            is_error: true,
        }
    }

    /// Synthetic outcome for a call that never produced a result.
    #[must_use]
    pub fn from_failure(err: &AgentError) -> Self {
        Self::error(format!("Error: {err}"))
    }
}

/// Converts a provider tool into a model function declaration.
///
/// Schemas that are missing, `null`, empty, or not objects become an
/// argument-less object schema so the tool stays callable.
#[must_use]
pub fn to_model_tool(spec: &ToolSpec) -> ToolDefinition {
    ToolDefinition {
        name: spec.name.clone(),
        description: spec.description.clone(),
        parameters: normalize_schema(&spec.input_schema),
    }
}

/// Converts a whole catalog, dropping duplicate names after the first.
#[must_use]
pub fn to_model_tools(specs: &[ToolSpec]) -> Vec<ToolDefinition> {
    let mut seen = HashSet::with_capacity(specs.len());
    specs
        .iter()
        .filter(|spec| {
            let fresh = seen.insert(spec.name.as_str());
            if !fresh {
                warn!(tool = %spec.name, "duplicate tool name in catalog, keeping the first");
            }
            fresh
        })
        .map(to_model_tool)
        .collect()
}

fn normalize_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) if !map.is_empty() => {
            let mut map = map.clone();
            map.entry("type").or_insert_with(|| json!("object"));
            if map.get("type") == Some(&json!("object")) {
                map.entry("properties").or_insert_with(|| json!({}));
            }
            Value::Object(map)
        }
        _ => json!({ "type": "object", "properties": {} }),
    }
}

/// Flattens a tool outcome into the single string fed back to the model.
///
/// Parts are rendered in order and joined with newlines.
#[must_use]
pub fn flatten_outcome(outcome: &ToolOutcome) -> String {
    outcome
        .parts
        .iter()
        .map(ContentPart::render)
        .collect::<Vec<_>>()
        .join("\n")
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn spec(name: &str, schema: Value) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema: schema,
        }
    }

    #[test_case(Value::Null ; "null schema")]
    #[test_case(json!({}) ; "empty object")]
    #[test_case(json!("object") ; "non-object schema")]
    fn test_missing_schema_accepts_empty_object(schema: Value) {
        let def = to_model_tool(&spec("get_heroes", schema));
        assert_eq!(def.parameters, json!({"type": "object", "properties": {}}));
        assert!(def.parameters.get("required").is_none());
    }

    #[test]
    fn test_schema_is_passed_through() {
        let schema = json!({
            "type": "object",
            "properties": {"name": {"type": "string"}},
            "required": ["name"]
        });
        let def = to_model_tool(&spec("get_player_info", schema.clone()));
        assert_eq!(def.name, "get_player_info");
        assert_eq!(def.description, "get_player_info tool");
        assert_eq!(def.parameters, schema);
    }

    #[test]
    fn test_schema_without_properties_gets_them() {
        let def = to_model_tool(&spec("ping", json!({"type": "object"})));
        assert_eq!(def.parameters["properties"], json!({}));
    }

    #[test]
    fn test_duplicate_names_dropped() {
        let specs = vec![
            spec("a", Value::Null),
            spec("b", Value::Null),
            spec("a", json!({"type": "object", "properties": {"x": {}}})),
        ];
        let defs = to_model_tools(&specs);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].parameters["properties"], json!({}));
    }

    #[test]
    fn test_flatten_mixed_parts_in_order() {
        let outcome = ToolOutcome {
            parts: vec![
                ContentPart::Text("Player: foo".to_string()),
                ContentPart::Structured(json!({"mmr": 5000})),
                ContentPart::Text("done".to_string()),
            ],
            is_error: false,
        };
        assert_eq!(flatten_outcome(&outcome), "Player: foo\n{\"mmr\":5000}\ndone");
    }

    #[test]
    fn test_flatten_empty_outcome() {
        assert_eq!(flatten_outcome(&ToolOutcome::default()), "");
    }

    #[test]
    fn test_parse_arguments_object() {
        let req = ToolInvocationRequest {
            call_id: "c1".to_string(),
            tool_name: "get_player_info".to_string(),
            arguments: r#"{"name": "foo"}"#.to_string(),
        };
        let args = req.parse_arguments().unwrap_or_default();
        assert_eq!(args.get("name"), Some(&json!("foo")));
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "whitespace")]
    #[test_case("{}" ; "braces")]
    fn test_parse_arguments_empty(raw: &str) {
        let req = ToolInvocationRequest {
            call_id: "c1".to_string(),
            tool_name: "list_heroes".to_string(),
            arguments: raw.to_string(),
        };
        assert!(req.parse_arguments().is_ok_and(|m| m.is_empty()));
    }

    #[test_case("[1, 2]" ; "array")]
    #[test_case("\"foo\"" ; "string")]
    #[test_case("{not json" ; "garbage")]
    fn test_parse_arguments_rejects(raw: &str) {
        let req = ToolInvocationRequest {
            call_id: "c1".to_string(),
            tool_name: "get_player_info".to_string(),
            arguments: raw.to_string(),
        };
        let err = req.parse_arguments();
        assert!(matches!(
            err,
            Err(AgentError::ToolInvocation { ref name, .. }) if name == "get_player_info"
        ));
    }

    #[test]
    fn test_parse_arguments_too_large() {
        let req = ToolInvocationRequest {
            call_id: "c1".to_string(),
            tool_name: "big".to_string(),
            arguments: format!("{{\"x\":\"{}\"}}", "a".repeat(MAX_TOOL_ARGS_LEN)),
        };
        assert!(req.parse_arguments().is_err());
    }

    #[test]
    fn test_failure_outcome_is_error() {
        let outcome = ToolOutcome::from_failure(&AgentError::ToolInvocation {
            name: "get_player_info".to_string(),
            message: "not found".to_string(),
        });
        assert!(outcome.is_error);
        assert!(flatten_outcome(&outcome).contains("not found"));
    }

    fn part_strategy() -> impl Strategy<Value = ContentPart> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,12}".prop_map(ContentPart::Text),
            any::<i64>().prop_map(|n| ContentPart::Structured(json!({ "n": n }))),
        ]
    }

    proptest! {
        #[test]
        fn prop_flatten_keeps_every_part_in_order(
            parts in prop::collection::vec(part_strategy(), 0..8),
        ) {
            let expected: Vec<String> = parts.iter().map(ContentPart::render).collect();
            let outcome = ToolOutcome { parts, is_error: false };
            let flat = flatten_outcome(&outcome);
            prop_assert_eq!(flat, expected.join("\n"));
        }

        #[test]
        fn prop_flatten_concatenation_is_associative(
            left in prop::collection::vec(part_strategy(), 1..4),
            right in prop::collection::vec(part_strategy(), 1..4),
        ) {
            let whole = ToolOutcome {
                parts: [left.clone(), right.clone()].concat(),
                is_error: false,
            };
            let l = flatten_outcome(&ToolOutcome { parts: left, is_error: false });
            let r = flatten_outcome(&ToolOutcome { parts: right, is_error: false });
            prop_assert_eq!(flatten_outcome(&whole), format!("{l}\n{r}"));
        }
    }
}
