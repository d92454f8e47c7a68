use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DrawServicingError;
use crate::time_value::{add_months, level_payment};
use crate::types::*;
use crate::DrawServicingResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Terms of a fixed-rate, fully amortising loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Nominal annual rate as a percentage (6 = 6%).
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    pub start_date: NaiveDate,
}

impl LoanTerms {
    /// Periodic rate: `annual_rate_percent / 100 / 12`.
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate_percent / PERCENT / MONTHS_PER_YEAR
    }

    fn validate(&self) -> DrawServicingResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(DrawServicingError::InvalidTerms {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate_percent < Decimal::ZERO {
            return Err(DrawServicingError::InvalidTerms {
                field: "annual_rate_percent".into(),
                reason: "Annual rate cannot be negative".into(),
            });
        }
        if self.term_months == 0 {
            return Err(DrawServicingError::InvalidTerms {
                field: "term_months".into(),
                reason: "Term must be at least 1 month".into(),
            });
        }
        Ok(())
    }
}

/// A single month in the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub period_index: u32,
    pub due_date: NaiveDate,
    pub payment: Money,
    pub principal_due: Money,
    pub interest_due: Money,
    pub balance_after: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub monthly_rate: Rate,
    pub level_payment: Money,
    pub entries: Vec<AmortizationEntry>,
    pub total_interest: Money,
    pub total_principal: Money,
}

/// Generate the month-by-month schedule for `terms`.
///
/// Entry `i` falls due `i` calendar months after `start_date`. The last
/// entry retires whatever balance remains, so it always closes at zero.
pub fn generate_amortization_schedule(
    terms: &LoanTerms,
) -> DrawServicingResult<AmortizationSchedule> {
    terms.validate()?;

    let rate = terms.monthly_rate();
    let payment = level_payment(terms.principal, rate, terms.term_months)?;

    let mut entries = Vec::with_capacity(terms.term_months as usize);
    let mut balance = terms.principal;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=terms.term_months {
        let interest = balance * rate;
        let principal = if period == terms.term_months {
            // Final period absorbs accumulated rounding drift
            balance
        } else {
            payment - interest
        };
        balance -= principal;

        total_interest += interest;

        entries.push(AmortizationEntry {
            period_index: period,
            due_date: add_months(terms.start_date, period)?,
            payment: principal + interest,
            principal_due: principal,
            interest_due: interest,
            balance_after: balance,
        });
    }

    // Summing the per-period principal drifts in the last digit; the final
    // period retires the remaining balance, so the total is exact.
    let total_principal = terms.principal - balance;

    Ok(AmortizationSchedule {
        monthly_rate: rate,
        level_payment: payment,
        entries,
        total_interest,
        total_principal,
    })
}

/// Schedule wrapped in the standard output envelope.
pub fn build_amortization_schedule(
    terms: &LoanTerms,
) -> DrawServicingResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let schedule = generate_amortization_schedule(terms)?;

    if terms.annual_rate_percent.is_zero() {
        warnings.push("Zero interest rate; principal repaid straight-line".into());
    }
    let clamped = schedule
        .entries
        .iter()
        .filter(|e| e.due_date.day() != terms.start_date.day())
        .count();
    if clamped > 0 {
        warnings.push(format!(
            "{clamped} due date(s) clamped to month end (start day {})",
            terms.start_date.day()
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization (monthly compounding)",
        &serde_json::json!({
            "principal": terms.principal.to_string(),
            "annual_rate_percent": terms.annual_rate_percent.to_string(),
            "term_months": terms.term_months,
            "start_date": terms.start_date.to_string(),
            "day_of_month_policy": "clamp_to_month_end",
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_terms() -> LoanTerms {
        LoanTerms {
            principal: dec!(120000),
            annual_rate_percent: dec!(6),
            term_months: 12,
            start_date: date(2024, 1, 1),
        }
    }

    #[test]
    fn test_first_period_interest() {
        let sched = generate_amortization_schedule(&sample_terms()).unwrap();
        assert_eq!(sched.monthly_rate, dec!(0.005));
        assert_eq!(sched.entries[0].interest_due, dec!(600));
        assert_eq!(sched.entries[0].due_date, date(2024, 2, 1));
    }

    #[test]
    fn test_schedule_closes_at_zero() {
        let sched = generate_amortization_schedule(&sample_terms()).unwrap();
        assert_eq!(sched.entries.len(), 12);
        let last = sched.entries.last().unwrap();
        assert_eq!(last.period_index, 12);
        assert_eq!(last.balance_after, Decimal::ZERO);
        assert_eq!(last.due_date, date(2025, 1, 1));
        assert_eq!(sched.total_principal, dec!(120000));
    }

    #[test]
    fn test_balances_strictly_decrease() {
        let sched = generate_amortization_schedule(&sample_terms()).unwrap();
        let mut previous = dec!(120000);
        for entry in &sched.entries {
            assert!(entry.balance_after < previous);
            previous = entry.balance_after;
        }
    }

    #[test]
    fn test_level_payment_held_until_final_period() {
        let sched = generate_amortization_schedule(&sample_terms()).unwrap();
        for entry in &sched.entries[..11] {
            assert!((entry.payment - sched.level_payment).abs() < dec!(0.0000000001));
        }
        // Final payment differs from the level payment only by drift
        let last = &sched.entries[11];
        assert!((last.payment - sched.level_payment).abs() < dec!(0.000001));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let mut terms = sample_terms();
        terms.annual_rate_percent = Decimal::ZERO;
        let sched = generate_amortization_schedule(&terms).unwrap();
        for entry in &sched.entries {
            assert_eq!(entry.principal_due, dec!(10000));
            assert_eq!(entry.interest_due, Decimal::ZERO);
        }
        assert_eq!(sched.total_interest, Decimal::ZERO);
    }

    #[test]
    fn test_month_end_start_date_clamps() {
        let mut terms = sample_terms();
        terms.start_date = date(2024, 1, 31);
        terms.term_months = 4;
        let sched = generate_amortization_schedule(&terms).unwrap();
        let dates: Vec<NaiveDate> = sched.entries.iter().map(|e| e.due_date).collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 2, 29),
                date(2024, 3, 31),
                date(2024, 4, 30),
                date(2024, 5, 31)
            ]
        );
    }

    #[test]
    fn test_due_dates_one_month_apart() {
        let mut terms = sample_terms();
        terms.term_months = 36;
        terms.start_date = date(2023, 11, 15);
        let sched = generate_amortization_schedule(&terms).unwrap();
        for pair in sched.entries.windows(2) {
            let (a, b) = (pair[0].due_date, pair[1].due_date);
            let months = (b.year() - a.year()) * 12 + b.month() as i32 - a.month() as i32;
            assert_eq!(months, 1);
            assert_eq!(a.day(), b.day());
        }
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let mut zero_term = sample_terms();
        zero_term.term_months = 0;
        let mut zero_principal = sample_terms();
        zero_principal.principal = Decimal::ZERO;
        let mut negative_rate = sample_terms();
        negative_rate.annual_rate_percent = dec!(-1);

        for terms in [zero_term, zero_principal, negative_rate] {
            assert!(matches!(
                generate_amortization_schedule(&terms),
                Err(DrawServicingError::InvalidTerms { .. })
            ));
        }
    }

    #[test]
    fn test_total_principal_is_exact_over_long_terms() {
        for (rate, months) in [(dec!(6), 12), (dec!(7.25), 360), (dec!(11), 37)] {
            let mut terms = sample_terms();
            terms.annual_rate_percent = rate;
            terms.term_months = months;
            let sched = generate_amortization_schedule(&terms).unwrap();
            assert_eq!(sched.total_principal, terms.principal);
            assert_eq!(sched.entries.last().unwrap().balance_after, Decimal::ZERO);
        }
    }

    #[test]
    fn test_extreme_rate_still_amortizes() {
        // (1 + r)^n is beyond Decimal range here; the payment tends to P·r
        let terms = LoanTerms {
            principal: dec!(100000),
            annual_rate_percent: dec!(300),
            term_months: 360,
            start_date: date(2024, 1, 1),
        };
        let sched = generate_amortization_schedule(&terms).unwrap();
        assert_eq!(sched.entries.len(), 360);
        assert!((sched.level_payment - dec!(25000)).abs() < dec!(0.01));
        assert_eq!(sched.entries.last().unwrap().balance_after, Decimal::ZERO);
        assert_eq!(sched.total_principal, dec!(100000));
    }

    #[test]
    fn test_envelope_warns_on_clamping() {
        let mut terms = sample_terms();
        terms.start_date = date(2024, 1, 31);
        let out = build_amortization_schedule(&terms).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("clamped"));
    }
}
