use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::assistant::aggregate::{project_risk_aggregate, project_status_aggregate};
use crate::assistant::catalog::AssistantFunctionCatalog;
use crate::assistant::function::{AssistantFunction, FunctionInvocation};
use crate::error::DrawServicingError;
use crate::ports::QueryPort;
use crate::DrawServicingResult;

/// Function the model asked to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// A JSON object, or a string holding one.
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    pub fn new(name: &str, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as an object. Null and blank strings mean no arguments.
    pub fn arguments_object(&self) -> DrawServicingResult<Map<String, Value>> {
        let invalid = |reason: String| DrawServicingError::InvalidArguments {
            function: self.name.clone(),
            reason,
        };

        match &self.arguments {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map.clone()),
            Value::String(encoded) if encoded.trim().is_empty() => Ok(Map::new()),
            Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(invalid(format!("arguments must be an object, got {other}"))),
                Err(e) => Err(invalid(format!("arguments are not valid JSON: {e}"))),
            },
            other => Err(invalid(format!("arguments must be an object, got {other}"))),
        }
    }
}

/// What the model returned for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDecision {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

/// Lifecycle of one assistant turn. Both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingDecision,
    Dispatched,
    DirectReply,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DispatchOutcome {
    DirectReply {
        message: String,
    },
    Dispatched {
        function: AssistantFunction,
        result_payload: Value,
    },
}

impl DispatchOutcome {
    pub fn state(&self) -> TurnState {
        match self {
            DispatchOutcome::DirectReply { .. } => TurnState::DirectReply,
            DispatchOutcome::Dispatched { .. } => TurnState::Dispatched,
        }
    }
}

/// Route a model decision to the query it names, timing windows from now.
pub fn dispatch<Q: QueryPort + ?Sized>(
    decision: &ModelDecision,
    catalog: &AssistantFunctionCatalog,
    query: &Q,
) -> DrawServicingResult<DispatchOutcome> {
    dispatch_at(decision, catalog, query, Utc::now())
}

/// Route a model decision to the query it names.
///
/// A name the catalog does not declare, or one it declares without a
/// registered implementation, fails with `UnknownFunction`.
pub fn dispatch_at<Q: QueryPort + ?Sized>(
    decision: &ModelDecision,
    catalog: &AssistantFunctionCatalog,
    query: &Q,
    as_of: DateTime<Utc>,
) -> DrawServicingResult<DispatchOutcome> {
    let Some(call) = &decision.function_call else {
        return Ok(DispatchOutcome::DirectReply {
            message: decision.message.clone(),
        });
    };

    let invocation = resolve(call, catalog)?;
    let result_payload = execute(&invocation, query, as_of)?;

    Ok(DispatchOutcome::Dispatched {
        function: invocation.function(),
        result_payload,
    })
}

/// Validate a call against the catalog and type its arguments.
pub fn resolve(
    call: &FunctionCall,
    catalog: &AssistantFunctionCatalog,
) -> DrawServicingResult<FunctionInvocation> {
    let spec = catalog
        .get(&call.name)
        .ok_or_else(|| DrawServicingError::UnknownFunction(call.name.clone()))?;
    let function = AssistantFunction::parse(&call.name)
        .ok_or_else(|| DrawServicingError::UnknownFunction(call.name.clone()))?;

    let arguments = spec.validate_arguments(&call.arguments_object()?)?;
    FunctionInvocation::from_arguments(function, &arguments)
}

/// Run a resolved invocation against the query port.
pub fn execute<Q: QueryPort + ?Sized>(
    invocation: &FunctionInvocation,
    query: &Q,
    as_of: DateTime<Utc>,
) -> DrawServicingResult<Value> {
    let payload = match invocation {
        FunctionInvocation::GetLoans => Value::Array(query.list_loans()?),
        FunctionInvocation::GetRecentDraws { limit } => {
            Value::Array(query.list_recent_draws(*limit)?)
        }
        FunctionInvocation::GetProjectStatus { project_id } => {
            let rows = query.project_status_rows(project_id)?;
            serde_json::to_value(project_status_aggregate(rows.loan.as_ref(), &rows.draws))?
        }
        FunctionInvocation::GetLienWaiverStatus { project_id } => {
            Value::Array(query.list_lien_waivers(project_id)?)
        }
        FunctionInvocation::GetProjectRisk { project_id } => {
            let rows = query.project_risk_rows(project_id)?;
            serde_json::to_value(project_risk_aggregate(&rows.draws, &rows.inspections, as_of))?
        }
    };
    Ok(payload)
}
