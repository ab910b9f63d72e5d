//! Canonical description of the structured output the model must return.
//!
//! The canonical schema is provider-neutral. [`translate`] turns it into each
//! provider's wire dialect at request time.

mod translate;

pub use translate::{translate, JsonSchemaFormat, ToolChoice, ToolDefinition};

/// Name shared by the strict-schema format and the forced tool.
pub const PROTOCOL_SCHEMA_NAME: &str = "camera_override_protocol";

/// Description attached to the forced tool definition.
pub const PROTOCOL_TOOL_DESCRIPTION: &str =
    "Output the camera override protocol as structured JSON";

/// Field names of the camera override protocol, in output order.
pub const PROTOCOL_FIELDS: [&str; 6] = [
    "camera_override_protocol",
    "volumetric_reconstruction",
    "consistency_anchors",
    "framing_boundaries",
    "optical_physics",
    "final_technical_prompt",
];

/// Node kinds of the canonical schema grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    /// String leaf restricted to a fixed set of literals
    Enum,
}

impl SchemaKind {
    /// Lower-case JSON Schema type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String | SchemaKind::Enum => "string",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
        }
    }
}

/// A recursive, immutable schema node.
///
/// Properties keep insertion order; translators only read the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    pub kind: SchemaKind,
    pub properties: Vec<(String, CanonicalSchema)>,
    pub required: Vec<String>,
    pub items: Option<Box<CanonicalSchema>>,
    pub enum_values: Vec<String>,
    /// Whether an object forbids undeclared properties; `None` leaves it unstated
    pub closed: Option<bool>,
}

impl CanonicalSchema {
    fn leaf(kind: SchemaKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            required: Vec::new(),
            items: None,
            enum_values: Vec::new(),
            closed: None,
        }
    }

    pub fn string() -> Self {
        Self::leaf(SchemaKind::String)
    }

    pub fn number() -> Self {
        Self::leaf(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::leaf(SchemaKind::Boolean)
    }

    /// String leaf limited to `values`.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: values.into_iter().map(Into::into).collect(),
            ..Self::leaf(SchemaKind::Enum)
        }
    }

    pub fn array(items: CanonicalSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::leaf(SchemaKind::Array)
        }
    }

    /// Object node with properties in the given order. Nothing is required
    /// until [`CanonicalSchema::require_all`] or [`CanonicalSchema::require`].
    pub fn object<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (S, CanonicalSchema)>,
        S: Into<String>,
    {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
            ..Self::leaf(SchemaKind::Object)
        }
    }

    /// Mark every declared property as required.
    pub fn require_all(mut self) -> Self {
        self.required = self.properties.iter().map(|(name, _)| name.clone()).collect();
        self
    }

    /// Mark a subset of properties as required.
    pub fn require<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    /// Forbid properties beyond the declared ones.
    pub fn closed(mut self) -> Self {
        self.closed = Some(true);
        self
    }
}

/// The fixed camera override protocol schema: one closed object with six
/// required string fields.
pub fn protocol_schema() -> CanonicalSchema {
    CanonicalSchema::object(
        PROTOCOL_FIELDS
            .iter()
            .map(|name| (*name, CanonicalSchema::string())),
    )
    .require_all()
    .closed()
}
