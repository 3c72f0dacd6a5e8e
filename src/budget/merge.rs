use crate::model::{Amount, AmountField, EnvelopeMonth, Month};

/// Applies a single-field edit to a month array and returns the edited copy.
///
/// If `month` is present only `field` changes on it; otherwise a new entry is appended with `field`
/// set to `value` and the other amount at zero. Every other month is carried over unchanged and the
/// input is left untouched.
pub fn merge_month(
    months: &[EnvelopeMonth],
    month: Month,
    field: AmountField,
    value: Amount,
) -> Vec<EnvelopeMonth> {
    let mut merged = months.to_vec();
    match merged.iter_mut().find(|m| m.month() == month) {
        Some(existing) => *existing = existing.with(field, value),
        None => merged.push(EnvelopeMonth::empty(month).with(field, value)),
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(n: u8) -> Month {
        Month::new(n).unwrap()
    }

    fn amount(s: &str) -> Amount {
        Amount::parse(s)
    }

    #[test]
    fn test_merge_creates_missing_month() {
        let months = vec![EnvelopeMonth::new(month(1), amount("100"), amount("10"))];
        let merged = merge_month(&months, month(2), AmountField::Contingency, amount("50"));
        assert_eq!(
            merged,
            vec![
                EnvelopeMonth::new(month(1), amount("100"), amount("10")),
                EnvelopeMonth::new(month(2), Amount::ZERO, amount("50")),
            ]
        );
    }

    #[test]
    fn test_merge_preserves_untouched_months() {
        let months = vec![
            EnvelopeMonth::new(month(1), amount("100"), amount("10")),
            EnvelopeMonth::new(month(3), amount("300"), amount("30")),
        ];
        let merged = merge_month(&months, month(1), AmountField::Planned, amount("150"));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].planned_amount(), amount("150"));
        assert_eq!(merged[0].contingency_amount(), amount("10"));
        assert_eq!(merged[1], months[1]);
    }

    #[test]
    fn test_merge_does_not_mutate_input() {
        let months = vec![EnvelopeMonth::new(month(5), amount("1"), amount("2"))];
        let _ = merge_month(&months, month(5), AmountField::Planned, amount("9"));
        assert_eq!(months[0].planned_amount(), amount("1"));
    }

    #[test]
    fn test_merge_keeps_insertion_order() {
        let months = vec![EnvelopeMonth::empty(month(12))];
        let merged = merge_month(&months, month(1), AmountField::Planned, amount("5"));
        let order: Vec<u8> = merged.iter().map(|m| m.month().number()).collect();
        assert_eq!(order, vec![12, 1]);
    }

    #[test]
    fn test_merge_into_empty() {
        let merged = merge_month(&[], month(7), AmountField::Planned, amount("8.000"));
        assert_eq!(
            merged,
            vec![EnvelopeMonth::new(month(7), amount("8000"), Amount::ZERO)]
        );
    }
}
