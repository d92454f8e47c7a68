//! Draw-request risk scoring.
//!
//! A draw starts at 100 and loses points for each independent signal:
//! 1. **Large draw**: amount above the policy threshold.
//! 2. **Short description**: fewer characters than the policy minimum.
//! 3. **Recent resubmission**: the project's previous draw landed inside the
//!    resubmission window.
//!
//! Penalties stack and the score is clamped at 0.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::types::*;

const BASE_SCORE: u8 = 100;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

/// Input for scoring a single draw request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRiskInput {
    pub amount: Money,
    pub description: String,
    /// When the project's previous draw was submitted, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_submitted_at: Option<DateTime<Utc>>,
}

/// Heuristic review priority in `[0, 100]`; lower means riskier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MAX: RiskScore = RiskScore(BASE_SCORE);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RiskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

/// Thresholds and penalties applied by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub large_draw_threshold: Money,
    pub large_draw_penalty: u8,
    pub min_description_chars: usize,
    pub short_description_penalty: u8,
    pub resubmission_window_days: i64,
    pub resubmission_penalty: u8,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            large_draw_threshold: dec!(100000),
            large_draw_penalty: 20,
            min_description_chars: 15,
            short_description_penalty: 10,
            resubmission_window_days: 7,
            resubmission_penalty: 15,
        }
    }
}

/// A signal that reduced the score, with the points it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum RiskSignal {
    LargeDraw { penalty: u8 },
    ShortDescription { chars: usize, penalty: u8 },
    RecentResubmission { days_since_last: i64, penalty: u8 },
}

impl RiskSignal {
    pub fn penalty(&self) -> u8 {
        match self {
            RiskSignal::LargeDraw { penalty }
            | RiskSignal::ShortDescription { penalty, .. }
            | RiskSignal::RecentResubmission { penalty, .. } => *penalty,
        }
    }
}

/// Score plus the signals that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRiskAssessment {
    pub risk_score: RiskScore,
    pub signals: Vec<RiskSignal>,
    pub total_penalty: u32,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score a draw against the default policy, measuring elapsed time from now.
pub fn compute_risk_score(input: &DrawRiskInput) -> RiskScore {
    compute_risk_score_at(input, Utc::now())
}

/// Score a draw against the default policy at a fixed point in time.
pub fn compute_risk_score_at(input: &DrawRiskInput, as_of: DateTime<Utc>) -> RiskScore {
    score_with_policy(input, &RiskPolicy::default(), as_of).risk_score
}

/// Collect the signals that fire for `input` under `policy`.
fn collect_signals(
    input: &DrawRiskInput,
    policy: &RiskPolicy,
    as_of: DateTime<Utc>,
) -> Vec<RiskSignal> {
    let mut signals = Vec::new();

    if input.amount > policy.large_draw_threshold {
        signals.push(RiskSignal::LargeDraw {
            penalty: policy.large_draw_penalty,
        });
    }

    let chars = input.description.chars().count();
    if chars < policy.min_description_chars {
        signals.push(RiskSignal::ShortDescription {
            chars,
            penalty: policy.short_description_penalty,
        });
    }

    // A timestamp in the future has negative elapsed time and still counts
    if let Some(last) = input.last_submitted_at {
        let elapsed = as_of - last;
        if elapsed < Duration::days(policy.resubmission_window_days) {
            signals.push(RiskSignal::RecentResubmission {
                days_since_last: elapsed.num_days(),
                penalty: policy.resubmission_penalty,
            });
        }
    }

    signals
}

fn score_with_policy(
    input: &DrawRiskInput,
    policy: &RiskPolicy,
    as_of: DateTime<Utc>,
) -> DrawRiskAssessment {
    let signals = collect_signals(input, policy, as_of);
    let total_penalty: u32 = signals.iter().map(|s| u32::from(s.penalty())).sum();
    let score = u32::from(BASE_SCORE).saturating_sub(total_penalty);

    DrawRiskAssessment {
        // score <= BASE_SCORE, so it always fits
        risk_score: RiskScore(u8::try_from(score).unwrap_or(0)),
        signals,
        total_penalty,
    }
}

/// Full assessment under an explicit policy, wrapped with metadata.
pub fn assess_draw_risk(
    input: &DrawRiskInput,
    policy: &RiskPolicy,
    as_of: DateTime<Utc>,
) -> ComputationOutput<DrawRiskAssessment> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.amount <= Decimal::ZERO {
        warnings.push(format!(
            "Draw amount {} is not positive; scored as submitted",
            input.amount
        ));
    }
    if input.description.trim().is_empty() {
        warnings.push("Draw description is blank".into());
    }

    let assessment = score_with_policy(input, policy, as_of);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Draw Risk Score (penalty deduction from 100)",
        &serde_json::json!({
            "as_of": as_of.to_rfc3339(),
            "large_draw_threshold": policy.large_draw_threshold.to_string(),
            "min_description_chars": policy.min_description_chars,
            "resubmission_window_days": policy.resubmission_window_days,
        }),
        warnings,
        elapsed,
        assessment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn clean_input() -> DrawRiskInput {
        DrawRiskInput {
            amount: dec!(50000),
            description: "Framing and roof sheathing, phase 2".into(),
            last_submitted_at: None,
        }
    }

    #[test]
    fn test_clean_draw_scores_full() {
        assert_eq!(compute_risk_score_at(&clean_input(), now()).value(), 100);
    }

    #[test]
    fn test_all_penalties_stack() {
        let input = DrawRiskInput {
            amount: dec!(150000),
            description: "short".into(),
            last_submitted_at: Some(now() - Duration::days(3)),
        };
        // 100 - 20 - 10 - 15
        assert_eq!(compute_risk_score_at(&input, now()).value(), 55);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut input = clean_input();
        input.amount = dec!(100000);
        assert_eq!(compute_risk_score_at(&input, now()).value(), 100);
        input.amount = dec!(100000.01);
        assert_eq!(compute_risk_score_at(&input, now()).value(), 80);
    }

    #[test]
    fn test_description_counts_characters_not_bytes() {
        let mut input = clean_input();
        // 15 characters, more than 15 bytes
        input.description = "ééééééééééééééé".into();
        assert_eq!(compute_risk_score_at(&input, now()).value(), 100);
        input.description = "éééééééééééééé".into();
        assert_eq!(compute_risk_score_at(&input, now()).value(), 90);
    }

    #[test]
    fn test_resubmission_window_boundary() {
        let mut input = clean_input();
        input.last_submitted_at = Some(now() - Duration::days(7));
        assert_eq!(compute_risk_score_at(&input, now()).value(), 100);
        input.last_submitted_at = Some(now() - Duration::days(7) + Duration::seconds(1));
        assert_eq!(compute_risk_score_at(&input, now()).value(), 85);
    }

    #[test]
    fn test_future_last_submission_penalised() {
        let mut input = clean_input();
        input.last_submitted_at = Some(now() + Duration::hours(2));
        assert_eq!(compute_risk_score_at(&input, now()).value(), 85);
    }

    #[test]
    fn test_score_clamped_at_zero() {
        let policy = RiskPolicy {
            large_draw_penalty: 60,
            short_description_penalty: 60,
            ..RiskPolicy::default()
        };
        let input = DrawRiskInput {
            amount: dec!(200000),
            description: "x".into(),
            last_submitted_at: None,
        };
        let out = assess_draw_risk(&input, &policy, now());
        assert_eq!(out.result.risk_score.value(), 0);
        assert_eq!(out.result.total_penalty, 120);
    }

    #[test]
    fn test_each_penalty_never_raises_score() {
        let base = compute_risk_score_at(&clean_input(), now());

        let mut large = clean_input();
        large.amount = dec!(250000);
        let mut terse = clean_input();
        terse.description = "misc".into();
        let mut recent = clean_input();
        recent.last_submitted_at = Some(now() - Duration::days(1));

        for input in [large, terse, recent] {
            let score = compute_risk_score_at(&input, now());
            assert!(score <= base);
            assert!(score.value() <= 100);
        }
    }

    #[test]
    fn test_assessment_lists_signals() {
        let input = DrawRiskInput {
            amount: dec!(150000),
            description: "short".into(),
            last_submitted_at: Some(now() - Duration::days(3)),
        };
        let out = assess_draw_risk(&input, &RiskPolicy::default(), now());
        assert_eq!(
            out.result.signals,
            vec![
                RiskSignal::LargeDraw { penalty: 20 },
                RiskSignal::ShortDescription {
                    chars: 5,
                    penalty: 10,
                },
                RiskSignal::RecentResubmission {
                    days_since_last: 3,
                    penalty: 15
                },
            ]
        );
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_blank_description_warns() {
        let mut input = clean_input();
        input.description = "   ".into();
        let out = assess_draw_risk(&input, &RiskPolicy::default(), now());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let input = DrawRiskInput {
            amount: dec!(120000),
            description: "Foundation pour".into(),
            last_submitted_at: Some(now() - Duration::days(2)),
        };
        assert_eq!(
            compute_risk_score_at(&input, now()),
            compute_risk_score_at(&input, now())
        );
    }
}
