//! Canonical schema → provider wire dialects.
//!
//! | Dialect    | Type tokens | `additionalProperties` | Wrapping                      |
//! |------------|-------------|------------------------|-------------------------------|
//! | Gemini     | `OBJECT`    | dropped (unsupported)  | `generationConfig.responseSchema` |
//! | OpenAI     | `object`    | passed through         | `{name, strict: true, schema}` |
//! | Anthropic  | `object`    | passed through         | single forced tool            |

use super::{CanonicalSchema, SchemaKind, PROTOCOL_SCHEMA_NAME, PROTOCOL_TOOL_DESCRIPTION};
use crate::error::SchemaTranslationError;
use crate::types::ProviderId;
use serde::Serialize;
use serde_json::{Map, Value};

/// Translate a canonical schema into the wire schema of `dialect`.
///
/// Pure and deterministic: the same input always yields the same value,
/// with properties in declaration order.
pub fn translate(
    schema: &CanonicalSchema,
    dialect: ProviderId,
) -> Result<Value, SchemaTranslationError> {
    translate_node(schema, dialect, "$")
}

fn translate_node(
    node: &CanonicalSchema,
    dialect: ProviderId,
    path: &str,
) -> Result<Value, SchemaTranslationError> {
    let fail = |reason: &str| SchemaTranslationError {
        dialect,
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let mut out = Map::new();
    out.insert("type".into(), Value::String(type_token(node.kind, dialect)));

    match node.kind {
        SchemaKind::Object => {
            if node.properties.is_empty() && dialect == ProviderId::Gemini {
                return Err(fail("OBJECT nodes must declare at least one property"));
            }
            let mut properties = Map::new();
            for (name, child) in &node.properties {
                let child_path = format!("{path}.{name}");
                properties.insert(name.clone(), translate_node(child, dialect, &child_path)?);
            }
            out.insert("properties".into(), Value::Object(properties));

            if let Some(missing) = node
                .required
                .iter()
                .find(|name| !node.properties.iter().any(|(p, _)| p == *name))
            {
                return Err(fail(&format!("required property \"{missing}\" is not declared")));
            }
            if !node.required.is_empty() {
                out.insert(
                    "required".into(),
                    Value::Array(node.required.iter().cloned().map(Value::String).collect()),
                );
            }

            if let Some(closed) = node.closed {
                if dialect != ProviderId::Gemini {
                    out.insert("additionalProperties".into(), Value::Bool(!closed));
                }
            }
        }
        SchemaKind::Array => {
            let items = node
                .items
                .as_deref()
                .ok_or_else(|| fail("array node has no item schema"))?;
            out.insert(
                "items".into(),
                translate_node(items, dialect, &format!("{path}[]"))?,
            );
        }
        SchemaKind::Enum => {
            if node.enum_values.is_empty() {
                return Err(fail("enum node has no values"));
            }
            out.insert(
                "enum".into(),
                Value::Array(node.enum_values.iter().cloned().map(Value::String).collect()),
            );
        }
        SchemaKind::String | SchemaKind::Number | SchemaKind::Boolean => {}
    }

    Ok(Value::Object(out))
}

fn type_token(kind: SchemaKind, dialect: ProviderId) -> String {
    match dialect {
        ProviderId::Gemini => kind.type_name().to_uppercase(),
        ProviderId::OpenAi | ProviderId::Anthropic => kind.type_name().to_string(),
    }
}

/// Strict structured-output wrapper (`response_format.json_schema`).
#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub strict: bool,
    pub schema: Value,
}

impl JsonSchemaFormat {
    pub fn protocol(schema: Value) -> Self {
        Self {
            name: PROTOCOL_SCHEMA_NAME.to_string(),
            strict: true,
            schema,
        }
    }
}

/// A tool definition whose input schema carries the structured output.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn protocol(input_schema: Value) -> Self {
        Self {
            name: PROTOCOL_SCHEMA_NAME.to_string(),
            description: PROTOCOL_TOOL_DESCRIPTION.to_string(),
            input_schema,
        }
    }

    /// `tool_choice` value forcing the model to call this tool.
    pub fn forced_choice(&self) -> ToolChoice {
        ToolChoice {
            choice_type: "tool".to_string(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolChoice {
    #[serde(rename = "type")]
    pub choice_type: String,
    pub name: String,
}
