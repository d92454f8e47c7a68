use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::DrawServicingError;
use crate::ports::{DrawRecord, DrawReview, DrawStatus, NewDraw, RawRow, StoragePort};
use crate::risk::draw_score::{compute_risk_score_at, DrawRiskInput};
use crate::DrawServicingResult;

/// Score a new draw against the project's previous submission and store it
/// as `pending`.
pub fn submit_draw<S: StoragePort + ?Sized>(
    storage: &S,
    draw: NewDraw,
    as_of: DateTime<Utc>,
) -> DrawServicingResult<DrawRecord> {
    if draw.project_id.trim().is_empty() {
        return Err(DrawServicingError::InvalidInput {
            field: "project_id".into(),
            reason: "Project id is required".into(),
        });
    }
    if draw.amount <= Decimal::ZERO {
        return Err(DrawServicingError::InvalidInput {
            field: "amount".into(),
            reason: "Draw amount must be positive".into(),
        });
    }

    let last_submitted_at = storage.last_draw_submission(&draw.project_id)?;
    let score = compute_risk_score_at(
        &DrawRiskInput {
            amount: draw.amount,
            description: draw.description.clone(),
            last_submitted_at,
        },
        as_of,
    );

    let record = DrawRecord {
        id: None,
        project_id: draw.project_id,
        amount: draw.amount,
        description: draw.description,
        status: DrawStatus::Pending,
        risk_score: score.value(),
        submitted_at: as_of,
        submitted_by: draw.submitted_by,
    };
    Ok(storage.insert_draw(&record)?)
}

/// Record a reviewer's approve/reject decision.
pub fn review_draw<S: StoragePort + ?Sized>(
    storage: &S,
    draw_id: &str,
    review: &DrawReview,
) -> DrawServicingResult<RawRow> {
    if draw_id.trim().is_empty() {
        return Err(DrawServicingError::InvalidInput {
            field: "draw_id".into(),
            reason: "Draw id is required".into(),
        });
    }
    if review.status == DrawStatus::Pending {
        return Err(DrawServicingError::InvalidInput {
            field: "status".into(),
            reason: "A review must approve or reject the draw".into(),
        });
    }
    Ok(storage.update_draw(draw_id, review)?)
}

/// Most recent draws across all projects.
pub fn recent_draws<S: StoragePort + ?Sized>(
    storage: &S,
    limit: u32,
) -> DrawServicingResult<Vec<RawRow>> {
    if limit == 0 {
        return Err(DrawServicingError::InvalidInput {
            field: "limit".into(),
            reason: "Limit must be at least 1".into(),
        });
    }
    Ok(storage.list_recent_draws(limit)?)
}
