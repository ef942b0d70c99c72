//! Parameter schemas derived from tool parameter types
//!
//! One Rust type per tool yields both the JSON Schema shown to the model and
//! the compiled validator run against the model's arguments, so the two can
//! not drift apart.

use jsonschema::Validator;
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde_json::Value;

use crate::error::ToolError;

/// Model-facing schema plus its compiled validator
pub struct ParamSchema {
    model: Value,
    validator: Validator,
}

impl ParamSchema {
    /// Generate and compile the schema for `T`
    pub fn for_type<T: JsonSchema>(tool: &'static str) -> Result<Self, ToolError> {
        let model = model_schema::<T>();
        let validator = jsonschema::validator_for(&model).map_err(|e| ToolError::InvalidSchema {
            tool,
            reason: e.to_string(),
        })?;

        Ok(Self { model, validator })
    }

    pub const fn model(&self) -> &Value {
        &self.model
    }

    /// Check arguments, describing every violation
    ///
    /// Messages carry the offending field: required-property errors name it
    /// in the text, everything else is prefixed with its JSON pointer.
    pub fn validate(&self, params: &Value) -> Result<(), String> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(params)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {e}", path.trim_start_matches('/'))
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}

/// Self-contained schema for `T` with no `$ref`s, `$schema` or `title`
fn model_schema<T: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator();
    let mut schema = generator.into_root_schema_for::<T>();
    schema.remove("$schema");
    schema.remove("title");
    schema.to_value()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    enum Mood {
        #[serde(rename = "calm")]
        Calm,
        #[serde(rename = "tense")]
        Tense,
    }

    /// Sample parameters
    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct Sample {
        /// Entity name
        #[schemars(length(min = 1))]
        name: String,
        mood: Option<Mood>,
        #[schemars(range(max = 500))]
        limit: Option<u32>,
    }

    #[test]
    fn model_schema_is_inline_object() {
        let schema = ParamSchema::for_type::<Sample>("sample").unwrap();
        let model = schema.model();

        assert_eq!(model["type"], "object");
        assert_eq!(model["required"], json!(["name"]));
        assert_eq!(model["properties"]["name"]["description"], "Entity name");
        assert!(model.get("title").is_none());
        assert!(model.get("$schema").is_none());
        assert!(!model.to_string().contains("$ref"));
    }

    #[test]
    fn validation_names_fields() {
        let schema = ParamSchema::for_type::<Sample>("sample").unwrap();

        assert!(schema.validate(&json!({"name": "Mara", "extra": true})).is_ok());

        let missing = schema.validate(&json!({})).unwrap_err();
        assert!(missing.contains("\"name\""), "{missing}");

        let wrong_enum = schema.validate(&json!({"name": "Mara", "mood": "angry"})).unwrap_err();
        assert!(wrong_enum.starts_with("mood: "), "{wrong_enum}");

        let too_big = schema.validate(&json!({"name": "Mara", "limit": 900})).unwrap_err();
        assert!(too_big.starts_with("limit: "), "{too_big}");
    }
}
