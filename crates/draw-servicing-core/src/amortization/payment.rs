use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DrawServicingError;
use crate::types::*;
use crate::DrawServicingResult;

/// How a single payment splits between interest and principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentApplication {
    pub applied_interest: Money,
    pub applied_principal: Money,
    pub remaining_balance: Money,
    /// Interest the payment did not cover. Not carried forward.
    pub interest_shortfall: Money,
}

/// Apply `payment_amount` against `outstanding_balance` at `monthly_rate`.
///
/// Interest accrues on the full balance first and the remainder reduces
/// principal. A payment smaller than the accrued interest applies no
/// principal and leaves the balance unchanged: there is no negative
/// amortization and the unpaid interest is only reported, never capitalised.
pub fn apply_payment(
    outstanding_balance: Money,
    monthly_rate: Rate,
    payment_amount: Money,
) -> DrawServicingResult<PaymentApplication> {
    if payment_amount < Decimal::ZERO {
        return Err(DrawServicingError::InvalidPayment {
            field: "payment_amount".into(),
            reason: "Payment amount cannot be negative".into(),
        });
    }
    if outstanding_balance < Decimal::ZERO {
        return Err(DrawServicingError::InvalidPayment {
            field: "outstanding_balance".into(),
            reason: "Outstanding balance cannot be negative".into(),
        });
    }
    if monthly_rate < Decimal::ZERO {
        return Err(DrawServicingError::InvalidPayment {
            field: "monthly_rate".into(),
            reason: "Monthly rate cannot be negative".into(),
        });
    }

    let applied_interest = outstanding_balance * monthly_rate;
    let applied_principal = (payment_amount - applied_interest).max(Decimal::ZERO);
    let interest_shortfall = (applied_interest - payment_amount).max(Decimal::ZERO);

    Ok(PaymentApplication {
        applied_interest,
        applied_principal,
        remaining_balance: outstanding_balance - applied_principal,
        interest_shortfall,
    })
}

/// Payment application wrapped in the standard output envelope.
///
/// An underpayment is not an error; it surfaces as a warning alongside the
/// `interest_shortfall` figure.
pub fn build_payment_application(
    outstanding_balance: Money,
    monthly_rate: Rate,
    payment_amount: Money,
) -> DrawServicingResult<ComputationOutput<PaymentApplication>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let application = apply_payment(outstanding_balance, monthly_rate, payment_amount)?;

    if !application.interest_shortfall.is_zero() {
        warnings.push(format!(
            "Payment does not cover accrued interest; {} unpaid and not capitalised",
            application.interest_shortfall
        ));
    }
    if outstanding_balance.is_zero() {
        warnings.push("Balance is already zero; payment applied to nothing".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Interest-first payment application",
        &serde_json::json!({
            "outstanding_balance": outstanding_balance.to_string(),
            "monthly_rate": monthly_rate.to_string(),
            "payment_amount": payment_amount.to_string(),
        }),
        warnings,
        elapsed,
        application,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_interest_then_principal() {
        let result = apply_payment(dec!(1000), dec!(0.01), dec!(50)).unwrap();
        assert_eq!(
            result,
            PaymentApplication {
                applied_interest: dec!(10),
                applied_principal: dec!(40),
                remaining_balance: dec!(960),
                interest_shortfall: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_components_sum_to_payment() {
        let result = apply_payment(dec!(85000), dec!(0.00625), dec!(1200)).unwrap();
        assert_eq!(result.applied_interest + result.applied_principal, dec!(1200));
        assert_eq!(
            result.remaining_balance,
            dec!(85000) - result.applied_principal
        );
    }

    #[test]
    fn test_underpayment_applies_no_principal() {
        let result = apply_payment(dec!(1000), dec!(0.01), dec!(4)).unwrap();
        assert_eq!(result.applied_principal, Decimal::ZERO);
        assert_eq!(result.remaining_balance, dec!(1000));
        assert_eq!(result.interest_shortfall, dec!(6));
    }

    #[test]
    fn test_zero_rate_all_principal() {
        let result = apply_payment(dec!(500), Decimal::ZERO, dec!(125)).unwrap();
        assert_eq!(result.applied_interest, Decimal::ZERO);
        assert_eq!(result.remaining_balance, dec!(375));
    }

    #[test]
    fn test_negative_inputs_rejected() {
        for (balance, rate, amount) in [
            (dec!(1000), dec!(0.01), dec!(-1)),
            (dec!(-1), dec!(0.01), dec!(10)),
            (dec!(1000), dec!(-0.01), dec!(10)),
        ] {
            assert!(matches!(
                apply_payment(balance, rate, amount),
                Err(DrawServicingError::InvalidPayment { .. })
            ));
        }
    }

    #[test]
    fn test_envelope_flags_shortfall() {
        let out = build_payment_application(dec!(1000), dec!(0.01), dec!(4)).unwrap();
        assert_eq!(out.result.interest_shortfall, dec!(6));
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("does not cover accrued interest"));
        assert_eq!(out.assumptions["payment_amount"], "4");
    }

    #[test]
    fn test_envelope_clean_payment_has_no_warnings() {
        let out = build_payment_application(dec!(1000), dec!(0.01), dec!(50)).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.result.remaining_balance, dec!(960));
    }

    #[test]
    fn test_envelope_propagates_invalid_payment() {
        assert!(matches!(
            build_payment_application(dec!(1000), dec!(0.01), dec!(-5)),
            Err(DrawServicingError::InvalidPayment { .. })
        ));
    }
}
