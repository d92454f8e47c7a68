//! Collaborator interfaces and the row shapes that cross them.
//!
//! The core never talks to a datastore or a model directly. Callers inject
//! implementations of [`StoragePort`] and [`QueryPort`]; rows come back either
//! typed (when the core computes over them) or as raw JSON (when they are
//! passed through unmodified).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::types::{Money, Rate};

/// A row handed back to the caller exactly as the collaborator produced it.
pub type RawRow = serde_json::Value;

/// Failure reported by a collaborator implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortError {
    pub port: &'static str,
    pub reason: String,
}

impl PortError {
    pub fn storage(reason: impl Into<String>) -> Self {
        Self {
            port: "storage",
            reason: reason.into(),
        }
    }

    pub fn query(reason: impl Into<String>) -> Self {
        Self {
            port: "query",
            reason: reason.into(),
        }
    }

    pub fn model(reason: impl Into<String>) -> Self {
        Self {
            port: "model",
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} port: {}", self.port, self.reason)
    }
}

impl std::error::Error for PortError {}

pub type PortResult<T> = Result<T, PortError>;

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Review state of a draw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawStatus {
    Pending,
    Approved,
    Rejected,
}

impl DrawStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawStatus::Pending => "pending",
            DrawStatus::Approved => "approved",
            DrawStatus::Rejected => "rejected",
        }
    }
}

/// A draw request as submitted by a contractor, before scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDraw {
    pub project_id: String,
    pub amount: Money,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
}

/// A scored draw request ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub project_id: String,
    pub amount: Money,
    pub description: String,
    pub status: DrawStatus,
    pub risk_score: u8,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
}

/// Reviewer decision applied to an existing draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawReview {
    pub status: DrawStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// A construction loan as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub amount: Money,
    pub annual_rate_percent: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub status: String,
}

/// One persisted row of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub loan_id: String,
    pub period_index: u32,
    pub due_date: NaiveDate,
    pub payment: Money,
    pub principal_due: Money,
    pub interest_due: Money,
    pub balance_after: Money,
}

/// A recorded loan payment and how it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub loan_id: String,
    pub paid_on: NaiveDate,
    pub amount: Money,
    pub applied_interest: Money,
    pub applied_principal: Money,
    pub remaining_balance: Money,
}

/// Loan fields needed for the project status aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectLoanRow {
    pub amount: Money,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawStatusRow {
    pub amount: Money,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRiskRow {
    #[serde(default)]
    pub risk_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRow {
    pub submitted_at: DateTime<Utc>,
}

/// Raw rows behind `get_project_status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatusRows {
    #[serde(default)]
    pub loan: Option<ProjectLoanRow>,
    #[serde(default)]
    pub draws: Vec<DrawStatusRow>,
}

/// Raw rows behind `get_project_risk`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRiskRows {
    #[serde(default)]
    pub draws: Vec<DrawRiskRow>,
    #[serde(default)]
    pub inspections: Vec<InspectionRow>,
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Read/write access to the servicing datastore.
#[cfg_attr(test, mockall::automock)]
pub trait StoragePort {
    fn last_draw_submission(&self, project_id: &str) -> PortResult<Option<DateTime<Utc>>>;
    fn insert_draw(&self, record: &DrawRecord) -> PortResult<DrawRecord>;
    fn update_draw(&self, id: &str, review: &DrawReview) -> PortResult<RawRow>;
    fn list_loans(&self) -> PortResult<Vec<RawRow>>;
    fn list_recent_draws(&self, limit: u32) -> PortResult<Vec<RawRow>>;
    fn get_loan(&self, id: &str) -> PortResult<Option<LoanRow>>;
    fn insert_amortization_rows(&self, rows: &[AmortizationRow])
        -> PortResult<Vec<AmortizationRow>>;
    fn last_payment(&self, loan_id: &str) -> PortResult<Option<PaymentRow>>;
    fn insert_payment(&self, row: &PaymentRow) -> PortResult<PaymentRow>;
}

/// The five read operations the assistant may trigger.
#[cfg_attr(test, mockall::automock)]
pub trait QueryPort {
    fn list_loans(&self) -> PortResult<Vec<RawRow>>;
    fn list_recent_draws(&self, limit: u32) -> PortResult<Vec<RawRow>>;
    fn project_status_rows(&self, project_id: &str) -> PortResult<ProjectStatusRows>;
    fn list_lien_waivers(&self, project_id: &str) -> PortResult<Vec<RawRow>>;
    fn project_risk_rows(&self, project_id: &str) -> PortResult<ProjectRiskRows>;
}

// ---------------------------------------------------------------------------
// In-memory query port
// ---------------------------------------------------------------------------

/// Rows for one project inside a [`QuerySnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub status: ProjectStatusRows,
    #[serde(default)]
    pub lien_waivers: Vec<RawRow>,
    #[serde(default)]
    pub risk: ProjectRiskRows,
}

/// A [`QueryPort`] answered from rows captured up front.
///
/// `recent_draws` is expected newest first. Unknown projects read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySnapshot {
    #[serde(default)]
    pub loans: Vec<RawRow>,
    #[serde(default)]
    pub recent_draws: Vec<RawRow>,
    #[serde(default)]
    pub projects: HashMap<String, ProjectSnapshot>,
}

impl QuerySnapshot {
    pub fn has_project(&self, project_id: &str) -> bool {
        self.projects.contains_key(project_id)
    }

    fn project(&self, project_id: &str) -> Option<&ProjectSnapshot> {
        self.projects.get(project_id)
    }
}

impl QueryPort for QuerySnapshot {
    fn list_loans(&self) -> PortResult<Vec<RawRow>> {
        Ok(self.loans.clone())
    }

    fn list_recent_draws(&self, limit: u32) -> PortResult<Vec<RawRow>> {
        Ok(self.recent_draws.iter().take(limit as usize).cloned().collect())
    }

    fn project_status_rows(&self, project_id: &str) -> PortResult<ProjectStatusRows> {
        Ok(self
            .project(project_id)
            .map(|p| p.status.clone())
            .unwrap_or_default())
    }

    fn list_lien_waivers(&self, project_id: &str) -> PortResult<Vec<RawRow>> {
        Ok(self
            .project(project_id)
            .map(|p| p.lien_waivers.clone())
            .unwrap_or_default())
    }

    fn project_risk_rows(&self, project_id: &str) -> PortResult<ProjectRiskRows> {
        Ok(self
            .project(project_id)
            .map(|p| p.risk.clone())
            .unwrap_or_default())
    }
}
