use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

/// Expected JSON type of a config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// Custom predicate for one field; the message becomes the violation text.
pub type CustomCheck = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Validation rule for a single top-level config field.
#[derive(Clone, Default)]
pub struct FieldRule {
    pub required: bool,
    pub field_type: Option<FieldType>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed: Option<Vec<Value>>,
    pub custom: Option<CustomCheck>,
}

impl FieldRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn of_type(mut self, ty: FieldType) -> Self {
        self.field_type = Some(ty);
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn one_of(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn custom<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(check));
        self
    }
}

/// One failed rule; validation aggregates these instead of stopping early.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigViolation {
    pub field: String,
    pub rule: &'static str,
    pub message: String,
}

/// Field-by-field validator built from a schema.
#[derive(Clone, Default)]
pub struct ConfigValidator {
    schema: HashMap<String, FieldRule>,
}

/// Build a validator performing required/type/min/max/enum/custom checks per
/// field, aggregating all violations.
pub fn create_validator(schema: HashMap<String, FieldRule>) -> ConfigValidator {
    ConfigValidator { schema }
}

/// Magnitude a min/max bound applies to: the number itself, or the length of
/// a string or array.
fn magnitude(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(a) => Some(a.len() as f64),
        _ => None,
    }
}

impl ConfigValidator {
    /// Check a candidate config against the schema; empty result means valid.
    pub fn validate(&self, config: &Value) -> Vec<ConfigViolation> {
        let mut violations = Vec::new();
        let Some(object) = config.as_object() else {
            violations.push(ConfigViolation {
                field: String::new(),
                rule: "type",
                message: "config must be an object".into(),
            });
            return violations;
        };

        let mut fields: Vec<(&String, &FieldRule)> = self.schema.iter().collect();
        fields.sort_by_key(|(name, _)| name.as_str());

        for (field, rule) in fields {
            let value = object.get(field).filter(|v| !v.is_null());
            let Some(value) = value else {
                if rule.required {
                    violations.push(ConfigViolation {
                        field: field.clone(),
                        rule: "required",
                        message: format!("{field} is required"),
                    });
                }
                continue;
            };

            if let Some(ty) = rule.field_type {
                if !ty.matches(value) {
                    violations.push(ConfigViolation {
                        field: field.clone(),
                        rule: "type",
                        message: format!("{field} must be of type {}", ty.name()),
                    });
                    continue;
                }
            }
            if let Some(min) = rule.min {
                if magnitude(value).is_some_and(|m| m < min) {
                    violations.push(ConfigViolation {
                        field: field.clone(),
                        rule: "min",
                        message: format!("{field} must be >= {min}"),
                    });
                }
            }
            if let Some(max) = rule.max {
                if magnitude(value).is_some_and(|m| m > max) {
                    violations.push(ConfigViolation {
                        field: field.clone(),
                        rule: "max",
                        message: format!("{field} must be <= {max}"),
                    });
                }
            }
            if let Some(allowed) = &rule.allowed {
                if !allowed.contains(value) {
                    violations.push(ConfigViolation {
                        field: field.clone(),
                        rule: "enum",
                        message: format!("{field} must be one of the allowed values"),
                    });
                }
            }
            if let Some(check) = &rule.custom {
                if let Err(message) = check(value) {
                    violations.push(ConfigViolation { field: field.clone(), rule: "custom", message });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> HashMap<String, FieldRule> {
        HashMap::from([
            ("stok_limit".to_string(), FieldRule::new().required().of_type(FieldType::Integer).min(1.0).max(10_000.0)),
            ("para_birimi".to_string(), FieldRule::new().of_type(FieldType::String).one_of(vec![json!("TRY"), json!("USD"), json!("EUR")])),
            ("etiketler".to_string(), FieldRule::new().of_type(FieldType::Array).max(5.0)),
        ])
    }

    #[test]
    fn valid_config_passes() {
        let v = create_validator(schema());
        let violations = v.validate(&json!({"stok_limit": 50, "para_birimi": "TRY"}));
        assert!(violations.is_empty());
    }

    #[test]
    fn violations_are_aggregated_not_short_circuited() {
        let v = create_validator(schema());
        let violations = v.validate(&json!({
            "stok_limit": 0,
            "para_birimi": "GBP",
            "etiketler": ["a", "b", "c", "d", "e", "f"]
        }));
        let rules: Vec<&str> = violations.iter().map(|x| x.rule).collect();
        assert_eq!(violations.len(), 3);
        assert!(rules.contains(&"min"));
        assert!(rules.contains(&"enum"));
        assert!(rules.contains(&"max"));
    }

    #[test]
    fn required_and_type_checks() {
        let v = create_validator(schema());
        let violations = v.validate(&json!({"para_birimi": 42}));
        let rules: Vec<&str> = violations.iter().map(|x| x.rule).collect();
        assert!(rules.contains(&"required"));
        assert!(rules.contains(&"type"));
    }

    #[test]
    fn custom_predicate_runs() {
        let schema = HashMap::from([(
            "kod".to_string(),
            FieldRule::new().custom(|v| {
                if v.as_str().is_some_and(|s| s.starts_with("TR")) {
                    Ok(())
                } else {
                    Err("kod must start with TR".into())
                }
            }),
        )]);
        let v = create_validator(schema);
        assert!(v.validate(&json!({"kod": "TR001"})).is_empty());
        let violations = v.validate(&json!({"kod": "X"}));
        assert_eq!(violations[0].message, "kod must start with TR");
    }

    #[test]
    fn non_object_config_is_rejected() {
        let v = create_validator(schema());
        assert_eq!(v.validate(&json!(42)).len(), 1);
    }
}
