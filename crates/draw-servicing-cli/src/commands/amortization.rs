use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use draw_servicing_core::amortization::payment;
use draw_servicing_core::amortization::schedule::{self, LoanTerms};

use crate::input;

/// Arguments for amortization schedule generation
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage (6 = 6%)
    #[arg(long)]
    pub annual_rate_percent: Option<Decimal>,

    /// Term in months
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Loan start date (YYYY-MM-DD); the first payment is due one month later
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(data) = input::load(args.input.as_deref())? {
        data
    } else {
        LoanTerms {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate_percent
                .ok_or("--annual-rate-percent is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            start_date: args
                .start_date
                .ok_or("--start-date is required (or provide --input)")?,
        }
    };

    let result = schedule::build_amortization_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for applying a payment to a balance
#[derive(Args)]
pub struct ApplyPaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Outstanding balance before the payment
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Monthly rate as a decimal (0.005 = 0.5%)
    #[arg(long)]
    pub monthly_rate: Option<Decimal>,

    /// Payment amount
    #[arg(long)]
    pub amount: Option<Decimal>,
}

#[derive(Deserialize)]
struct ApplyPaymentInput {
    outstanding_balance: Decimal,
    monthly_rate: Decimal,
    payment_amount: Decimal,
}

pub fn run_apply_payment(args: ApplyPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payment_input: ApplyPaymentInput = match input::load(args.input.as_deref())? {
        Some(data) => data,
        None => ApplyPaymentInput {
            outstanding_balance: args
                .balance
                .ok_or("--balance is required (or provide --input)")?,
            monthly_rate: args
                .monthly_rate
                .ok_or("--monthly-rate is required (or provide --input)")?,
            payment_amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
        },
    };

    let result = payment::build_payment_application(
        payment_input.outstanding_balance,
        payment_input.monthly_rate,
        payment_input.payment_amount,
    )?;
    if !result.result.interest_shortfall.is_zero() {
        tracing::warn!(
            shortfall = %result.result.interest_shortfall,
            "Payment does not cover accrued interest"
        );
    }
    Ok(serde_json::to_value(result)?)
}
