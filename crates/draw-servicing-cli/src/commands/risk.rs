use chrono::{DateTime, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use draw_servicing_core::risk::draw_score::{self, DrawRiskInput, RiskPolicy};

use crate::input;

/// Arguments for draw risk scoring
#[derive(Args)]
pub struct RiskScoreArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Requested draw amount
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Description of the work the draw pays for
    #[arg(long)]
    pub description: Option<String>,

    /// When the project's previous draw was submitted (RFC 3339)
    #[arg(long)]
    pub last_submitted_at: Option<DateTime<Utc>>,

    /// Evaluate as of this instant instead of now (RFC 3339)
    #[arg(long)]
    pub as_of: Option<DateTime<Utc>>,
}

pub fn run_risk_score(
    args: RiskScoreArgs,
    policy: &RiskPolicy,
) -> Result<Value, Box<dyn std::error::Error>> {
    let risk_input: DrawRiskInput = if let Some(data) = input::load(args.input.as_deref())? {
        data
    } else {
        let amount = args
            .amount
            .ok_or("--amount is required (or provide --input)")?;
        let description = args
            .description
            .ok_or("--description is required (or provide --input)")?;

        DrawRiskInput {
            amount,
            description,
            last_submitted_at: args.last_submitted_at,
        }
    };

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    let result = draw_score::assess_draw_risk(&risk_input, policy, as_of);
    tracing::debug!(
        score = %result.result.risk_score,
        signals = result.result.signals.len(),
        "Scored draw"
    );
    Ok(serde_json::to_value(result)?)
}
