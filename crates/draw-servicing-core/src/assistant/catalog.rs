use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::assistant::function::AssistantFunction;
use crate::error::DrawServicingError;
use crate::DrawServicingResult;

/// Version tag of the built-in catalog. Bump when a function or parameter
/// changes shape.
pub const CATALOG_VERSION: &str = "2024.1";

/// Primitive JSON type a parameter must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }

    /// Whether `value` is of this type. Integers must be whole JSON numbers.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
    /// Value used when an optional parameter is omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            description: description.into(),
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, description: &str, default: Value) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            description: description.into(),
            default: Some(default),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl FunctionSpec {
    /// Check `arguments` against the declared parameters and fill in
    /// defaults. Undeclared arguments are dropped.
    pub fn validate_arguments(
        &self,
        arguments: &Map<String, Value>,
    ) -> DrawServicingResult<Map<String, Value>> {
        let mut validated = Map::new();

        for param in &self.parameters {
            match arguments.get(&param.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    if !param.param_type.accepts(value) {
                        return Err(DrawServicingError::InvalidArguments {
                            function: self.name.clone(),
                            reason: format!(
                                "parameter `{}` must be of type {}, got {value}",
                                param.name,
                                param.param_type.as_str()
                            ),
                        });
                    }
                    validated.insert(param.name.clone(), value.clone());
                }
                None if param.required => {
                    return Err(DrawServicingError::InvalidArguments {
                        function: self.name.clone(),
                        reason: format!("missing required parameter `{}`", param.name),
                    });
                }
                None => {
                    if let Some(default) = &param.default {
                        validated.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }

        Ok(validated)
    }

    /// JSON-schema function declaration in the shape hosted models expect.
    pub fn to_tool_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut prop = json!({
                "type": param.param_type.as_str(),
                "description": param.description,
            });
            if let (Some(default), Some(obj)) = (&param.default, prop.as_object_mut()) {
                obj.insert("default".into(), default.clone());
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        })
    }
}

/// The fixed set of read-only functions a deployment offers the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantFunctionCatalog {
    pub version: String,
    pub functions: Vec<FunctionSpec>,
}

impl AssistantFunctionCatalog {
    /// Build a catalog, rejecting duplicate function names.
    pub fn new(version: &str, functions: Vec<FunctionSpec>) -> DrawServicingResult<Self> {
        let mut seen = HashSet::new();
        for f in &functions {
            if !seen.insert(f.name.as_str()) {
                return Err(DrawServicingError::InvalidInput {
                    field: "functions".into(),
                    reason: format!("duplicate function name `{}`", f.name),
                });
            }
        }
        Ok(Self {
            version: version.into(),
            functions,
        })
    }

    /// Catalog with every registered [`AssistantFunction`].
    pub fn standard() -> Self {
        Self {
            version: CATALOG_VERSION.into(),
            functions: AssistantFunction::ALL.iter().map(|f| f.spec()).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.iter().map(|f| f.name.as_str()).collect()
    }

    /// Replace the default of an optional parameter.
    pub fn with_default(
        mut self,
        function: &str,
        parameter: &str,
        value: Value,
    ) -> DrawServicingResult<Self> {
        let spec = self
            .functions
            .iter_mut()
            .find(|f| f.name == function)
            .ok_or_else(|| DrawServicingError::UnknownFunction(function.into()))?;
        let param = spec
            .parameters
            .iter_mut()
            .find(|p| p.name == parameter)
            .ok_or_else(|| DrawServicingError::InvalidInput {
                field: parameter.into(),
                reason: format!("`{function}` has no parameter `{parameter}`"),
            })?;
        if !param.param_type.accepts(&value) {
            return Err(DrawServicingError::InvalidInput {
                field: parameter.into(),
                reason: format!("default must be of type {}", param.param_type.as_str()),
            });
        }
        param.default = Some(value);
        Ok(self)
    }

    /// All function declarations, ready to hand to the model.
    pub fn to_tool_schema(&self) -> Value {
        Value::Array(self.functions.iter().map(FunctionSpec::to_tool_schema).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_names() {
        let catalog = AssistantFunctionCatalog::standard();
        assert_eq!(
            catalog.names(),
            vec![
                "get_loans",
                "get_recent_draws",
                "get_project_status",
                "get_lien_waiver_status",
                "get_project_risk"
            ]
        );
        assert_eq!(catalog.version, CATALOG_VERSION);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let spec = AssistantFunction::GetLoans.spec();
        assert!(AssistantFunctionCatalog::new("dup", vec![spec.clone(), spec]).is_err());
    }

    #[test]
    fn test_missing_required_parameter() {
        let spec = AssistantFunction::GetProjectStatus.spec();
        let err = spec.validate_arguments(&Map::new()).unwrap_err();
        assert!(matches!(err, DrawServicingError::InvalidArguments { .. }));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let spec = AssistantFunction::GetProjectRisk.spec();
        let args = json!({ "project_id": null });
        assert!(spec.validate_arguments(args.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let spec = AssistantFunction::GetRecentDraws.spec();
        for bad in [json!({ "limit": "5" }), json!({ "limit": 2.5 }), json!({ "limit": true })] {
            assert!(spec.validate_arguments(bad.as_object().unwrap()).is_err());
        }
    }

    #[test]
    fn test_defaults_filled_and_extras_dropped() {
        let spec = AssistantFunction::GetRecentDraws.spec();
        let args = json!({ "verbose": true });
        let validated = spec.validate_arguments(args.as_object().unwrap()).unwrap();
        assert_eq!(Value::Object(validated), json!({ "limit": 5 }));
    }

    #[test]
    fn test_with_default_overrides() {
        let catalog = AssistantFunctionCatalog::standard()
            .with_default("get_recent_draws", "limit", json!(20))
            .unwrap();
        let spec = catalog.get("get_recent_draws").unwrap();
        let validated = spec.validate_arguments(&Map::new()).unwrap();
        assert_eq!(validated.get("limit"), Some(&json!(20)));

        assert!(AssistantFunctionCatalog::standard()
            .with_default("get_recent_draws", "limit", json!("twenty"))
            .is_err());
    }

    #[test]
    fn test_tool_schema_shape() {
        let schema = AssistantFunction::GetProjectStatus.spec().to_tool_schema();
        assert_eq!(schema["name"], "get_project_status");
        assert_eq!(schema["parameters"]["type"], "object");
        assert_eq!(schema["parameters"]["properties"]["project_id"]["type"], "string");
        assert_eq!(schema["parameters"]["required"], json!(["project_id"]));
    }
}
