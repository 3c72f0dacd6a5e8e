//! Display totals computed from month arrays.
//!
//! Totals are never stored. They are recomputed from the current month arrays on every read so an
//! edit is always visible in the next total.

use crate::model::{Amount, EnvelopeMonth};
use serde::Serialize;

/// Planned and contingency sums for one envelope.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct EnvelopeTotals {
    pub planned: Amount,
    pub contingency: Amount,
}

impl EnvelopeTotals {
    pub fn total(&self) -> Amount {
        self.planned + self.contingency
    }
}

/// Sums across every envelope of a plan.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct PlanTotals {
    pub planned: Amount,
    pub contingency: Amount,
    pub grand_total: Amount,
}

/// Sums the months that are present. Absent months contribute nothing.
pub fn envelope_totals(months: &[EnvelopeMonth]) -> EnvelopeTotals {
    EnvelopeTotals {
        planned: months.iter().map(EnvelopeMonth::planned_amount).sum(),
        contingency: months.iter().map(EnvelopeMonth::contingency_amount).sum(),
    }
}

pub fn plan_totals(envelopes: impl IntoIterator<Item = EnvelopeTotals>) -> PlanTotals {
    let mut totals = PlanTotals::default();
    for envelope in envelopes {
        totals.planned += envelope.planned;
        totals.contingency += envelope.contingency;
    }
    totals.grand_total = totals.planned + totals.contingency;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::merge_month;
    use crate::model::{AmountField, Month};

    fn month(n: u8) -> Month {
        Month::new(n).unwrap()
    }

    fn amount(s: &str) -> Amount {
        Amount::parse(s)
    }

    #[test]
    fn test_envelope_totals() {
        let months = vec![
            EnvelopeMonth::new(month(1), amount("100"), amount("10")),
            EnvelopeMonth::new(month(2), Amount::ZERO, amount("50")),
        ];
        let totals = envelope_totals(&months);
        assert_eq!(totals.planned, amount("100"));
        assert_eq!(totals.contingency, amount("60"));
        assert_eq!(totals.total(), amount("160"));
    }

    #[test]
    fn test_empty_envelope_totals() {
        assert_eq!(envelope_totals(&[]), EnvelopeTotals::default());
    }

    #[test]
    fn test_plan_totals() {
        let a = EnvelopeTotals {
            planned: amount("100"),
            contingency: amount("10"),
        };
        let b = EnvelopeTotals {
            planned: amount("1.000,50"),
            contingency: amount("0,50"),
        };
        let totals = plan_totals([a, b]);
        assert_eq!(totals.planned, amount("1100.5"));
        assert_eq!(totals.contingency, amount("10.5"));
        assert_eq!(totals.grand_total, amount("1111"));
    }

    #[test]
    fn test_totals_follow_merge_sequence() {
        let edits = [
            (3, AmountField::Planned, "100"),
            (3, AmountField::Planned, "40"),
            (4, AmountField::Planned, "1.500,25"),
            (4, AmountField::Contingency, "25"),
            (3, AmountField::Contingency, "5"),
            (12, AmountField::Planned, "0"),
        ];
        let mut months = Vec::new();
        for (m, field, value) in edits {
            months = merge_month(&months, month(m), field, amount(value));
        }
        let totals = envelope_totals(&months);
        let expected: Amount = months.iter().map(|m| m.planned_amount()).sum();
        assert_eq!(totals.planned, expected);
        assert_eq!(totals.planned, amount("1540.25"));
        assert_eq!(totals.contingency, amount("30"));
    }
}
