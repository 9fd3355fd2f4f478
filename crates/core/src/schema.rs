//! Declarative tool input schemas.
//!
//! Each tool describes its accepted fields once. The registry validates the
//! description when the tool is registered, renders it as JSON Schema for the
//! model, and checks incoming argument payloads against it before the tool
//! body runs.

use serde_json::{Map, Value, json};

/// Semantic type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn json_name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// One accepted argument field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
}

/// The input shape of a tool: an object with named, typed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    fields: Vec<SchemaField>,
}

impl ToolSchema {
    /// Start an empty object schema.
    pub fn object() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(name, field_type, description, true)
    }

    /// Add an optional field.
    pub fn optional(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(name, field_type, description, false)
    }

    fn field(mut self, name: &str, field_type: FieldType, description: &str, required: bool) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
            required,
        });
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Check the description itself: non-empty unique names, described fields.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err("field with empty name".into());
            }
            if !seen.insert(field.name.as_str()) {
                return Err(format!("duplicate field '{}'", field.name));
            }
            if field.description.trim().is_empty() {
                return Err(format!("field '{}' has no description", field.name));
            }
        }
        Ok(())
    }

    /// Render as a JSON Schema object.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                json!({
                    "type": field.field_type.json_name(),
                    "description": field.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Check an argument payload against the declared fields.
    pub fn check(&self, arguments: &Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err("arguments must be a JSON object".into());
        };

        for field in &self.fields {
            match object.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.field_type.matches(value) => {
                    return Err(format!(
                        "field '{}' must be of type {}",
                        field.name,
                        field.field_type.json_name()
                    ));
                }
                Some(_) => {}
            }
        }

        if let Some(extra) = object
            .keys()
            .find(|k| !self.fields.iter().any(|f| &f.name == *k))
        {
            return Err(format!("unexpected field '{extra}'"));
        }

        Ok(())
    }
}
