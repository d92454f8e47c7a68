use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::amortization::payment::apply_payment;
use crate::amortization::schedule::{generate_amortization_schedule, LoanTerms};
use crate::error::DrawServicingError;
use crate::ports::{AmortizationRow, LoanRow, PaymentRow, RawRow, StoragePort};
use crate::types::Money;
use crate::DrawServicingResult;

/// Percent-per-year to decimal-per-month.
const ANNUAL_PERCENT_TO_MONTHLY: Decimal = dec!(1200);

pub fn list_loans<S: StoragePort + ?Sized>(storage: &S) -> DrawServicingResult<Vec<RawRow>> {
    Ok(storage.list_loans()?)
}

fn load_loan<S: StoragePort + ?Sized>(storage: &S, loan_id: &str) -> DrawServicingResult<LoanRow> {
    storage
        .get_loan(loan_id)?
        .ok_or_else(|| DrawServicingError::NotFound {
            entity: "loan".into(),
            id: loan_id.into(),
        })
}

/// Generate the loan's schedule and persist one row per period.
pub fn book_amortization<S: StoragePort + ?Sized>(
    storage: &S,
    loan_id: &str,
) -> DrawServicingResult<Vec<AmortizationRow>> {
    let loan = load_loan(storage, loan_id)?;
    let schedule = generate_amortization_schedule(&LoanTerms {
        principal: loan.amount,
        annual_rate_percent: loan.annual_rate_percent,
        term_months: loan.term_months,
        start_date: loan.start_date,
    })?;

    let rows: Vec<AmortizationRow> = schedule
        .entries
        .into_iter()
        .map(|e| AmortizationRow {
            loan_id: loan.id.clone(),
            period_index: e.period_index,
            due_date: e.due_date,
            payment: e.payment,
            principal_due: e.principal_due,
            interest_due: e.interest_due,
            balance_after: e.balance_after,
        })
        .collect();

    Ok(storage.insert_amortization_rows(&rows)?)
}

/// Apply a payment to the loan's running balance and persist it.
///
/// The balance is the last payment's remaining balance, or the original
/// principal when nothing has been paid yet.
pub fn record_payment<S: StoragePort + ?Sized>(
    storage: &S,
    loan_id: &str,
    amount: Money,
    paid_on: NaiveDate,
) -> DrawServicingResult<PaymentRow> {
    let loan = load_loan(storage, loan_id)?;
    let balance = storage
        .last_payment(loan_id)?
        .map(|p| p.remaining_balance)
        .unwrap_or(loan.amount);

    let monthly_rate = loan.annual_rate_percent / ANNUAL_PERCENT_TO_MONTHLY;
    let applied = apply_payment(balance, monthly_rate, amount)?;

    let row = PaymentRow {
        id: None,
        loan_id: loan.id,
        paid_on,
        amount,
        applied_interest: applied.applied_interest,
        applied_principal: applied.applied_principal,
        remaining_balance: applied.remaining_balance,
    };
    Ok(storage.insert_payment(&row)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockStoragePort;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan() -> LoanRow {
        LoanRow {
            id: "L-1".into(),
            project_id: Some("p-1".into()),
            amount: dec!(120000),
            annual_rate_percent: dec!(6),
            term_months: 12,
            start_date: date(2024, 1, 1),
            status: "active".into(),
        }
    }

    #[test]
    fn test_book_amortization_persists_every_period() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_get_loan()
            .with(eq("L-1"))
            .returning(|_| Ok(Some(loan())));
        storage
            .expect_insert_amortization_rows()
            .times(1)
            .returning(|rows| Ok(rows.to_vec()));

        let rows = book_amortization(&storage, "L-1").unwrap();
        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.loan_id == "L-1"));
        assert_eq!(rows[0].interest_due, dec!(600));
        assert_eq!(rows[11].balance_after, Decimal::ZERO);
    }

    #[test]
    fn test_missing_loan_is_not_found() {
        let mut storage = MockStoragePort::new();
        storage.expect_get_loan().returning(|_| Ok(None));
        let err = book_amortization(&storage, "L-404").unwrap_err();
        assert!(matches!(err, DrawServicingError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_stored_terms_rejected() {
        let mut storage = MockStoragePort::new();
        storage.expect_get_loan().returning(|_| {
            let mut l = loan();
            l.term_months = 0;
            Ok(Some(l))
        });
        let err = book_amortization(&storage, "L-1").unwrap_err();
        assert!(matches!(err, DrawServicingError::InvalidTerms { .. }));
    }

    #[test]
    fn test_first_payment_starts_from_principal() {
        let mut storage = MockStoragePort::new();
        storage.expect_get_loan().returning(|_| Ok(Some(loan())));
        storage.expect_last_payment().returning(|_| Ok(None));
        storage.expect_insert_payment().returning(|r| Ok(r.clone()));

        let row = record_payment(&storage, "L-1", dec!(10600), date(2024, 2, 1)).unwrap();
        assert_eq!(row.applied_interest, dec!(600));
        assert_eq!(row.applied_principal, dec!(10000));
        assert_eq!(row.remaining_balance, dec!(110000));
    }

    #[test]
    fn test_payment_chains_from_last_balance() {
        let mut storage = MockStoragePort::new();
        storage.expect_get_loan().returning(|_| Ok(Some(loan())));
        storage.expect_last_payment().returning(|_| {
            Ok(Some(PaymentRow {
                id: Some("P-1".into()),
                loan_id: "L-1".into(),
                paid_on: date(2024, 2, 1),
                amount: dec!(10600),
                applied_interest: dec!(600),
                applied_principal: dec!(10000),
                remaining_balance: dec!(110000),
            }))
        });
        storage.expect_insert_payment().returning(|r| Ok(r.clone()));

        let row = record_payment(&storage, "L-1", dec!(1000), date(2024, 3, 1)).unwrap();
        assert_eq!(row.applied_interest, dec!(550));
        assert_eq!(row.remaining_balance, dec!(109550));
    }

    #[test]
    fn test_negative_payment_never_persisted() {
        let mut storage = MockStoragePort::new();
        storage.expect_get_loan().returning(|_| Ok(Some(loan())));
        storage.expect_last_payment().returning(|_| Ok(None));
        let err = record_payment(&storage, "L-1", dec!(-5), date(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, DrawServicingError::InvalidPayment { .. }));
    }
}
