use chrono::{Days, Months, NaiveDate};

use crate::domain::models::schedule::RecurrenceType;
use crate::error::AppError;

/// Occurrences produced when neither an end date nor a count bounds the rule.
pub const SAFETY_CAP: usize = 52;
/// Hard ceiling for any single expansion.
pub const MAX_OCCURRENCES: usize = 366;

#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    pub date: NaiveDate,
    pub recurrence_type: RecurrenceType,
    pub end_date: Option<NaiveDate>,
    /// Takes precedence over `end_date` when both are set.
    pub count: Option<u32>,
}

/// Expands a rule into its ordered occurrence dates, base date first.
///
/// Occurrence `n` is computed from the base date rather than from the
/// previous occurrence, so monthly and yearly rules clamp to the end of
/// short months without drifting (Jan 31, Feb 28, Mar 31, ...).
pub fn expand(rule: &RecurrenceRule) -> Result<Vec<NaiveDate>, AppError> {
    if rule.recurrence_type == RecurrenceType::None {
        return Ok(vec![rule.date]);
    }

    let (limit, end_date) = match (rule.count, rule.end_date) {
        (Some(0), _) => return Err(AppError::Validation("repeatCount must be at least 1".into())),
        (Some(count), _) if count as usize > MAX_OCCURRENCES => {
            return Err(AppError::Validation(format!("repeatCount must not exceed {}", MAX_OCCURRENCES)));
        }
        (Some(count), _) => (count as usize, None),
        (None, Some(end)) => (MAX_OCCURRENCES, Some(end)),
        (None, None) => (SAFETY_CAP, None),
    };

    let mut dates = Vec::with_capacity(limit.min(SAFETY_CAP));
    for n in 0..limit {
        let Some(date) = nth_occurrence(rule.date, rule.recurrence_type, n as u32) else {
            break;
        };
        if let Some(end) = end_date && date > end && n > 0 {
            break;
        }
        dates.push(date);
    }
    Ok(dates)
}

fn nth_occurrence(base: NaiveDate, recurrence_type: RecurrenceType, n: u32) -> Option<NaiveDate> {
    match recurrence_type {
        RecurrenceType::None => (n == 0).then_some(base),
        RecurrenceType::Daily => base.checked_add_days(Days::new(n as u64)),
        RecurrenceType::Weekly => base.checked_add_days(Days::new(7 * n as u64)),
        RecurrenceType::Monthly => base.checked_add_months(Months::new(n)),
        RecurrenceType::Yearly => base.checked_add_months(Months::new(12 * n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rule(recurrence_type: RecurrenceType, end_date: Option<NaiveDate>, count: Option<u32>) -> RecurrenceRule {
        RecurrenceRule { date: d(2026, 1, 5), recurrence_type, end_date, count }
    }

    #[test]
    fn test_none_ignores_bounds() {
        let dates = expand(&rule(RecurrenceType::None, Some(d(2026, 3, 1)), Some(10))).unwrap();
        assert_eq!(dates, vec![d(2026, 1, 5)]);
    }

    #[test]
    fn test_weekly_count() {
        let dates = expand(&rule(RecurrenceType::Weekly, None, Some(5))).unwrap();
        assert_eq!(dates.len(), 5);
        for (i, pair) in dates.windows(2).enumerate() {
            assert_eq!((pair[1] - pair[0]).num_days(), 7, "gap {} is not a week", i);
        }
        assert_eq!(dates[0], d(2026, 1, 5));
    }

    #[test]
    fn test_daily_end_date_is_inclusive() {
        let dates = expand(&rule(RecurrenceType::Daily, Some(d(2026, 1, 8)), None)).unwrap();
        assert_eq!(dates, vec![d(2026, 1, 5), d(2026, 1, 6), d(2026, 1, 7), d(2026, 1, 8)]);
    }

    #[test]
    fn test_count_wins_over_end_date() {
        let dates = expand(&rule(RecurrenceType::Daily, Some(d(2026, 1, 6)), Some(4))).unwrap();
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[3], d(2026, 1, 8));
    }

    #[test]
    fn test_unbounded_uses_safety_cap() {
        let dates = expand(&rule(RecurrenceType::Weekly, None, None)).unwrap();
        assert_eq!(dates.len(), SAFETY_CAP);
    }

    #[test]
    fn test_end_before_base_yields_base_only() {
        let dates = expand(&rule(RecurrenceType::Daily, Some(d(2025, 12, 31)), None)).unwrap();
        assert_eq!(dates, vec![d(2026, 1, 5)]);
    }

    #[test]
    fn test_monthly_clamps_without_drift() {
        let r = RecurrenceRule { date: d(2026, 1, 31), recurrence_type: RecurrenceType::Monthly, end_date: None, count: Some(3) };
        assert_eq!(expand(&r).unwrap(), vec![d(2026, 1, 31), d(2026, 2, 28), d(2026, 3, 31)]);
    }

    #[test]
    fn test_yearly_leap_day() {
        let r = RecurrenceRule { date: d(2028, 2, 29), recurrence_type: RecurrenceType::Yearly, end_date: None, count: Some(2) };
        assert_eq!(expand(&r).unwrap(), vec![d(2028, 2, 29), d(2029, 2, 28)]);
    }

    #[test]
    fn test_invalid_counts_rejected() {
        assert!(matches!(expand(&rule(RecurrenceType::Daily, None, Some(0))), Err(AppError::Validation(_))));
        assert!(matches!(expand(&rule(RecurrenceType::Daily, None, Some(367))), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_invalid_type_is_a_parse_error() {
        assert!("fortnightly".parse::<RecurrenceType>().is_err());
        assert_eq!("Weekly".parse::<RecurrenceType>().unwrap(), RecurrenceType::Weekly);
    }
}
