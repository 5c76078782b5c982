//! Optional input and output schemas for components.
//!
//! A component may declare the shape of its positional arguments, keyword arguments,
//! slot fills and context data. Components without a schema skip validation entirely.
//!
//! ```rust
//! use tera_components::component::{ComponentSchema, MapSchema, ValueKind};
//!
//! let schema = ComponentSchema::default()
//!     .with_kwargs(MapSchema::new().required("title", ValueKind::String).optional("count", ValueKind::Integer));
//! ```

use serde_json::{Map, Value};
use std::fmt;

use crate::core::ComponentError;

/// JSON value kinds a field can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Any value, including null.
    Any,
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// Number without a fractional part
    Integer,
    /// `true` / `false`
    Bool,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// `null`
    Null,
}

impl ValueKind {
    /// Whether `value` is of this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Null => value.is_null(),
        }
    }

    fn of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "number",
            Value::Number(_) => "integer",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// Expected positional arguments, in order. The count must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgsSchema(pub Vec<ValueKind>);

/// One named field of a [`MapSchema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Accepted kind
    pub kind: ValueKind,
    /// Whether the field must be present
    pub required: bool,
}

/// Expected keys of a mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapSchema {
    /// Declared fields
    pub fields: Vec<FieldSchema>,
    /// Whether undeclared keys are accepted
    pub allow_extra: bool,
}

impl MapSchema {
    /// Schema with no fields that rejects extra keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn required(mut self, name: &str, kind: ValueKind) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            kind,
            required: true,
        });
        self
    }

    /// Add an optional field.
    pub fn optional(mut self, name: &str, kind: ValueKind) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            kind,
            required: false,
        });
        self
    }

    /// Accept keys that are not declared.
    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    fn check<'a>(&self, keys: impl Iterator<Item = (&'a String, Option<&'a Value>)> + Clone) -> Result<(), String> {
        for field in &self.fields {
            let found = keys.clone().find(|(key, _)| **key == field.name);
            match found {
                None if field.required => return Err(format!("Missing required key '{}'", field.name)),
                None => {}
                Some((_, Some(value))) if !field.kind.matches(value) => {
                    return Err(format!(
                        "Key '{}' expected {}, got {}",
                        field.name,
                        field.kind,
                        ValueKind::of(value)
                    ));
                }
                Some(_) => {}
            }
        }

        if !self.allow_extra {
            if let Some((extra, _)) =
                keys.clone().find(|(key, _)| !self.fields.iter().any(|f| &f.name == *key))
            {
                return Err(format!("Unexpected key '{extra}'"));
            }
        }
        Ok(())
    }
}

/// Declared shapes of a component's inputs and context data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentSchema {
    /// Positional arguments
    pub args: Option<ArgsSchema>,
    /// Keyword arguments
    pub kwargs: Option<MapSchema>,
    /// Slot fills (presence only; fill kinds are not checked)
    pub slots: Option<MapSchema>,
    /// Output of `get_context_data`
    pub data: Option<MapSchema>,
}

impl ComponentSchema {
    /// Set the positional argument schema.
    pub fn with_args(mut self, args: ArgsSchema) -> Self {
        self.args = Some(args);
        self
    }

    /// Set the keyword argument schema.
    pub fn with_kwargs(mut self, kwargs: MapSchema) -> Self {
        self.kwargs = Some(kwargs);
        self
    }

    /// Set the slot schema.
    pub fn with_slots(mut self, slots: MapSchema) -> Self {
        self.slots = Some(slots);
        self
    }

    /// Set the context data schema.
    pub fn with_data(mut self, data: MapSchema) -> Self {
        self.data = Some(data);
        self
    }

    /// Check raw render inputs.
    pub fn validate_inputs<'a>(
        &self,
        component: &str,
        args: &[Value],
        kwargs: &Map<String, Value>,
        slot_names: impl Iterator<Item = &'a String> + Clone,
    ) -> Result<(), ComponentError> {
        if let Some(ArgsSchema(kinds)) = &self.args {
            if kinds.len() != args.len() {
                return Err(invalid(
                    component,
                    "positional argument",
                    format!("Expected {} positional arguments, got {}", kinds.len(), args.len()),
                ));
            }
            for (index, (kind, value)) in kinds.iter().zip(args).enumerate() {
                if !kind.matches(value) {
                    return Err(invalid(
                        component,
                        "positional argument",
                        format!("Argument at position {index} expected {kind}, got {}", ValueKind::of(value)),
                    ));
                }
            }
        }

        if let Some(schema) = &self.kwargs {
            schema
                .check(kwargs.iter().map(|(k, v)| (k, Some(v))))
                .map_err(|message| invalid(component, "keyword argument", message))?;
        }

        if let Some(schema) = &self.slots {
            schema
                .check(slot_names.map(|name| (name, None)))
                .map_err(|message| invalid(component, "slot", message))?;
        }

        Ok(())
    }

    /// Check the output of `get_context_data`.
    pub fn validate_data(&self, component: &str, data: &Map<String, Value>) -> Result<(), ComponentError> {
        match &self.data {
            Some(schema) => schema
                .check(data.iter().map(|(k, v)| (k, Some(v))))
                .map_err(|message| invalid(component, "data", message)),
            None => Ok(()),
        }
    }
}

fn invalid(component: &str, category: &str, message: String) -> ComponentError {
    ComponentError::Validation {
        component: component.to_string(),
        category: category.to_string(),
        message,
    }
}
