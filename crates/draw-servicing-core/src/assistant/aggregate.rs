//! In-core aggregation for the two assistant functions that summarise
//! project rows instead of passing them through.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ports::{DrawRiskRow, DrawStatusRow, InspectionRow, ProjectLoanRow};
use crate::types::Money;

const APPROVED: &str = "approved";
const ACTIVE: &str = "active";
const INSPECTION_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub total_draws: u64,
    pub approved_draws: u64,
    pub sum_drawn: Money,
    pub outstanding_reserve: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRisk {
    pub average_risk_score: Decimal,
    pub overdue_inspections: u64,
}

/// Draw counts, approved total and the reserve left on an active loan.
///
/// The reserve is zero when the project has no loan or the loan is not
/// `active`. It is not floored, so over-drawn loans report a negative
/// reserve.
pub fn project_status_aggregate(
    loan: Option<&ProjectLoanRow>,
    draws: &[DrawStatusRow],
) -> ProjectStatus {
    let approved: Vec<&DrawStatusRow> = draws.iter().filter(|d| d.status == APPROVED).collect();
    let sum_drawn: Money = approved.iter().map(|d| d.amount).sum();

    let outstanding_reserve = match loan {
        Some(l) if l.status == ACTIVE => l.amount - sum_drawn,
        _ => Decimal::ZERO,
    };

    ProjectStatus {
        total_draws: draws.len() as u64,
        approved_draws: approved.len() as u64,
        sum_drawn,
        outstanding_reserve,
    }
}

/// Mean draw risk score and the count of inspections submitted in the
/// trailing seven days ending at `as_of`.
///
/// Draws without a score count as 0 in the mean.
pub fn project_risk_aggregate(
    draws: &[DrawRiskRow],
    inspections: &[InspectionRow],
    as_of: DateTime<Utc>,
) -> ProjectRisk {
    let average_risk_score = if draws.is_empty() {
        Decimal::ZERO
    } else {
        let total: Decimal = draws
            .iter()
            .map(|d| Decimal::from(d.risk_score.unwrap_or(0)))
            .sum();
        total / Decimal::from(draws.len() as u64)
    };

    let window_start = as_of - Duration::days(INSPECTION_WINDOW_DAYS);
    let overdue_inspections = inspections
        .iter()
        .filter(|i| i.submitted_at >= window_start && i.submitted_at <= as_of)
        .count() as u64;

    ProjectRisk {
        average_risk_score,
        overdue_inspections,
    }
}
