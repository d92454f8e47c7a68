use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use draw_servicing_core::assistant::{
    self, AssistantFunctionCatalog, FunctionInvocation, ModelDecision,
};
use draw_servicing_core::ports::QuerySnapshot;

use crate::config::AssistantConfig;
use crate::input;

/// Arguments for printing the assistant function catalog
#[derive(Args)]
pub struct CatalogArgs {
    /// Print the catalog structure instead of the model-facing tool schema
    #[arg(long)]
    pub raw: bool,
}

/// Arguments for dispatching a model decision against fixture rows
#[derive(Args)]
pub struct DispatchArgs {
    /// Path to JSON input file with `decision` and `fixtures`
    #[arg(long)]
    pub input: Option<String>,

    /// Evaluate time windows as of this instant instead of now (RFC 3339)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DispatchInput {
    decision: ModelDecision,
    #[serde(default)]
    fixtures: QuerySnapshot,
}

/// Standard catalog with config overrides applied.
pub fn configured_catalog(
    config: &AssistantConfig,
) -> Result<AssistantFunctionCatalog, Box<dyn std::error::Error>> {
    let catalog = AssistantFunctionCatalog::standard();
    Ok(match config.recent_draws_limit {
        Some(limit) => catalog.with_default("get_recent_draws", "limit", json!(limit))?,
        None => catalog,
    })
}

pub fn run_catalog(
    args: CatalogArgs,
    config: &AssistantConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let catalog = configured_catalog(config)?;
    if args.raw {
        return Ok(serde_json::to_value(catalog)?);
    }
    Ok(json!({
        "version": catalog.version,
        "functions": catalog.to_tool_schema(),
    }))
}

/// Snapshot files often omit projects; say so instead of silently returning
/// an empty aggregate.
fn warn_on_unknown_project(input: &DispatchInput, catalog: &AssistantFunctionCatalog) {
    let Some(call) = &input.decision.function_call else {
        return;
    };
    let Ok(invocation) = assistant::dispatch::resolve(call, catalog) else {
        return;
    };
    let project_id = match &invocation {
        FunctionInvocation::GetProjectStatus { project_id }
        | FunctionInvocation::GetLienWaiverStatus { project_id }
        | FunctionInvocation::GetProjectRisk { project_id } => project_id,
        _ => return,
    };
    if !input.fixtures.has_project(project_id) {
        tracing::warn!(%project_id, "No fixture rows for project, returning empty rows");
    }
}

pub fn run_dispatch(
    args: DispatchArgs,
    config: &AssistantConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let dispatch_input: DispatchInput = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for dispatch")?;

    let catalog = configured_catalog(config)?;
    warn_on_unknown_project(&dispatch_input, &catalog);
    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let outcome = assistant::dispatch_at(
        &dispatch_input.decision,
        &catalog,
        &dispatch_input.fixtures,
        as_of,
    )?;
    tracing::info!(state = ?outcome.state(), "Dispatched model decision");
    Ok(json!({ "result": outcome }))
}
