//! Validation of untrusted tool arguments against a [`ParameterSchema`].
//!
//! Only the subset of JSON Schema used by tool definitions is understood:
//! `required`, per-property `type`, and `minItems`/`maxItems` on arrays.
//! Properties that are absent or `null` are not type-checked, and arguments
//! not declared in `properties` are ignored.

use serde_json::{Map, Value};

use crate::definition::{ParameterSchema, PropertySpec, PropertyType};
use crate::error::ValidationError;

/// Check `args` against `schema`. Never mutates its inputs.
pub fn validate_args(
    schema: &ParameterSchema,
    args: &Map<String, Value>,
) -> Result<(), ValidationError> {
    let mut missing: Vec<String> = Vec::new();
    for name in &schema.required {
        if !args.contains_key(name.as_str()) && !missing.contains(name) {
            missing.push(name.clone());
        }
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingRequired(missing));
    }

    for (name, spec) in &schema.properties {
        match args.get(name) {
            None | Some(Value::Null) => continue,
            Some(value) => check_property(name, spec, value)?,
        }
    }
    Ok(())
}

fn check_property(name: &str, spec: &PropertySpec, value: &Value) -> Result<(), ValidationError> {
    let Some(kind) = spec.kind() else {
        return Ok(());
    };

    let wrong_type = || ValidationError::WrongType {
        name: name.to_string(),
        expected: expected_phrase(kind),
    };

    match kind {
        PropertyType::Array => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            if let Some(min) = spec.min_items
                && items.len() < min
            {
                return Err(ValidationError::TooFewItems {
                    name: name.to_string(),
                    min,
                });
            }
            if let Some(max) = spec.max_items
                && items.len() > max
            {
                return Err(ValidationError::TooManyItems {
                    name: name.to_string(),
                    max,
                });
            }
            Ok(())
        }
        PropertyType::Number if value.is_number() => Ok(()),
        PropertyType::Integer if is_integral(value) => Ok(()),
        PropertyType::String if value.is_string() => Ok(()),
        PropertyType::Boolean if value.is_boolean() => Ok(()),
        PropertyType::Object if value.is_object() => Ok(()),
        _ => Err(wrong_type()),
    }
}

fn is_integral(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

fn expected_phrase(kind: PropertyType) -> &'static str {
    match kind {
        PropertyType::String => "a string",
        PropertyType::Number => "a number",
        PropertyType::Integer => "an integer",
        PropertyType::Array => "a list",
        PropertyType::Boolean => "a boolean",
        PropertyType::Object => "an object",
    }
}
