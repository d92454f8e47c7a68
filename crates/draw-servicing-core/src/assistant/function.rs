use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::assistant::catalog::{FunctionSpec, ParamType, ParameterSpec};
use crate::error::DrawServicingError;
use crate::DrawServicingResult;

/// Number of draws returned by `get_recent_draws` when no limit is given.
pub const DEFAULT_RECENT_DRAWS: u32 = 5;

/// Every function the assistant can call. Adding a capability means adding
/// a variant here plus its arm in [`FunctionInvocation::from_arguments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantFunction {
    GetLoans,
    GetRecentDraws,
    GetProjectStatus,
    GetLienWaiverStatus,
    GetProjectRisk,
}

impl AssistantFunction {
    pub const ALL: [AssistantFunction; 5] = [
        AssistantFunction::GetLoans,
        AssistantFunction::GetRecentDraws,
        AssistantFunction::GetProjectStatus,
        AssistantFunction::GetLienWaiverStatus,
        AssistantFunction::GetProjectRisk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AssistantFunction::GetLoans => "get_loans",
            AssistantFunction::GetRecentDraws => "get_recent_draws",
            AssistantFunction::GetProjectStatus => "get_project_status",
            AssistantFunction::GetLienWaiverStatus => "get_lien_waiver_status",
            AssistantFunction::GetProjectRisk => "get_project_risk",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Catalog declaration for this function.
    pub fn spec(&self) -> FunctionSpec {
        let project_id = || {
            ParameterSpec::required(
                "project_id",
                ParamType::String,
                "Identifier of the construction project",
            )
        };

        let (description, parameters) = match self {
            AssistantFunction::GetLoans => ("List all construction loans", vec![]),
            AssistantFunction::GetRecentDraws => (
                "List the most recently submitted draw requests",
                vec![ParameterSpec::optional(
                    "limit",
                    ParamType::Integer,
                    "Maximum number of draws to return",
                    json!(DEFAULT_RECENT_DRAWS),
                )],
            ),
            AssistantFunction::GetProjectStatus => (
                "Summarise draws and the remaining loan reserve for a project",
                vec![project_id()],
            ),
            AssistantFunction::GetLienWaiverStatus => (
                "List lien waivers and their status for a project",
                vec![project_id()],
            ),
            AssistantFunction::GetProjectRisk => (
                "Average draw risk score and recent inspections for a project",
                vec![project_id()],
            ),
        };

        FunctionSpec {
            name: self.name().into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A function call with typed, validated arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum FunctionInvocation {
    GetLoans,
    GetRecentDraws { limit: u32 },
    GetProjectStatus { project_id: String },
    GetLienWaiverStatus { project_id: String },
    GetProjectRisk { project_id: String },
}

impl FunctionInvocation {
    /// Build from arguments already checked by
    /// [`FunctionSpec::validate_arguments`].
    pub fn from_arguments(
        function: AssistantFunction,
        arguments: &Map<String, Value>,
    ) -> DrawServicingResult<Self> {
        let invocation = match function {
            AssistantFunction::GetLoans => FunctionInvocation::GetLoans,
            AssistantFunction::GetRecentDraws => FunctionInvocation::GetRecentDraws {
                limit: limit_arg(function, arguments)?,
            },
            AssistantFunction::GetProjectStatus => FunctionInvocation::GetProjectStatus {
                project_id: project_id_arg(function, arguments)?,
            },
            AssistantFunction::GetLienWaiverStatus => FunctionInvocation::GetLienWaiverStatus {
                project_id: project_id_arg(function, arguments)?,
            },
            AssistantFunction::GetProjectRisk => FunctionInvocation::GetProjectRisk {
                project_id: project_id_arg(function, arguments)?,
            },
        };
        Ok(invocation)
    }

    pub fn function(&self) -> AssistantFunction {
        match self {
            FunctionInvocation::GetLoans => AssistantFunction::GetLoans,
            FunctionInvocation::GetRecentDraws { .. } => AssistantFunction::GetRecentDraws,
            FunctionInvocation::GetProjectStatus { .. } => AssistantFunction::GetProjectStatus,
            FunctionInvocation::GetLienWaiverStatus { .. } => {
                AssistantFunction::GetLienWaiverStatus
            }
            FunctionInvocation::GetProjectRisk { .. } => AssistantFunction::GetProjectRisk,
        }
    }
}

fn invalid(function: AssistantFunction, reason: String) -> DrawServicingError {
    DrawServicingError::InvalidArguments {
        function: function.name().into(),
        reason,
    }
}

fn limit_arg(
    function: AssistantFunction,
    arguments: &Map<String, Value>,
) -> DrawServicingResult<u32> {
    let Some(value) = arguments.get("limit") else {
        return Ok(DEFAULT_RECENT_DRAWS);
    };
    value
        .as_i64()
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            invalid(
                function,
                format!("`limit` must be a positive integer, got {value}"),
            )
        })
}

fn project_id_arg(
    function: AssistantFunction,
    arguments: &Map<String, Value>,
) -> DrawServicingResult<String> {
    let id = arguments
        .get("project_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if id.is_empty() {
        return Err(invalid(function, "`project_id` must be a non-empty string".into()));
    }
    Ok(id.to_string())
}
