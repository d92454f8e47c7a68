use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::DrawServicingError;
use crate::types::{Money, Rate};
use crate::DrawServicingResult;

/// Level payment that amortises `principal` to zero over `nper` periods.
///
/// `A = P·r / (1 − (1+r)^−n)`, rewritten as `P·r·f / (f − 1)` with
/// `f = (1+r)^n` so only one division is needed. A zero rate degenerates
/// to straight-line `P / n`. When `f` or `P·r·f` leaves the `Decimal`
/// range, `(1+r)^−n` is below its resolution and the payment is `P·r`.
pub fn level_payment(principal: Money, rate: Rate, nper: u32) -> DrawServicingResult<Money> {
    if nper == 0 {
        return Err(DrawServicingError::InvalidTerms {
            field: "term_months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let overflow = || DrawServicingError::InvalidTerms {
        field: "annual_rate_percent".into(),
        reason: "Rate and term produce a non-representable payment".into(),
    };

    let interest_only = principal.checked_mul(rate).ok_or_else(overflow)?;

    let Some(factor) = (Decimal::ONE + rate).checked_powi(i64::from(nper)) else {
        return Ok(interest_only);
    };
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(overflow());
    }

    match interest_only
        .checked_mul(factor)
        .and_then(|v| v.checked_div(denominator))
    {
        Some(payment) => Ok(payment),
        None => {
            let discount = Decimal::ONE.checked_div(factor).ok_or_else(overflow)?;
            interest_only
                .checked_div(Decimal::ONE - discount)
                .ok_or_else(overflow)
        }
    }
}

/// Advance `date` by whole calendar months.
///
/// The day of month is kept when the target month has it, otherwise it is
/// clamped to that month's last day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> DrawServicingResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| DrawServicingError::InvalidTerms {
            field: "start_date".into(),
            reason: format!("{date} + {months} months is outside the supported calendar"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_level_payment_basic() {
        // 120k over 12 months at 0.5%/month ≈ 10,327.97
        let result = level_payment(dec!(120000), dec!(0.005), 12).unwrap();
        assert!((result - dec!(10327.97)).abs() < dec!(0.01));
    }

    #[test]
    fn test_level_payment_zero_rate() {
        let result = level_payment(dec!(1200), Decimal::ZERO, 12).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_level_payment_zero_periods() {
        assert!(level_payment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_level_payment_large_growth_factor_tends_to_interest_only() {
        // 25%/month over 360 months and 5%/month over 1440 months both push
        // (1 + r)^n past the Decimal range
        let result = level_payment(dec!(100000), dec!(0.25), 360).unwrap();
        assert_eq!(result, dec!(25000));
        let result = level_payment(dec!(100000), dec!(0.05), 1440).unwrap();
        assert_eq!(result, dec!(5000));
    }

    #[test]
    fn test_level_payment_product_overflow_uses_discount_form() {
        // (1.05)^1200 fits, but P·r·(1.05)^1200 does not
        let result = level_payment(dec!(1000000000), dec!(0.05), 1200).unwrap();
        assert!((result - dec!(50000000)).abs() < dec!(0.01));
    }

    #[test]
    fn test_level_payment_near_limit_matches_closed_form() {
        // 3%/month over 600 months still fits; A ≈ P·r·(1 + (1+r)^−n)
        let result = level_payment(dec!(100000), dec!(0.03), 600).unwrap();
        assert!(result > dec!(3000));
        assert!((result - dec!(3000)).abs() < dec!(0.001));
    }

    #[test]
    fn test_add_months_preserves_day() {
        assert_eq!(add_months(date(2024, 1, 15), 1).unwrap(), date(2024, 2, 15));
        assert_eq!(add_months(date(2024, 11, 15), 3).unwrap(), date(2025, 2, 15));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
        assert_eq!(add_months(date(2024, 1, 31), 3).unwrap(), date(2024, 4, 30));
        // Anchored at the start date, so March gets its 31st back
        assert_eq!(add_months(date(2024, 1, 31), 2).unwrap(), date(2024, 3, 31));
    }
}
