//! Dashboard summary across all goals.

use super::streaks::{current_streak, current_streak_with_grace};
use crate::types::{Goal, Record};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Active goals
    pub total_goals: usize,
    /// Completed records dated in the current calendar month
    pub monthly_records: usize,
    /// Aggregate current streak across all goals
    pub current_streak: u32,
}

/// First and last day of the month containing `today`.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);
    (first, last)
}

/// Summarize goals and records as of `today`.
///
/// `grace_day` selects the lenient streak that may end yesterday.
pub fn build_overview(
    goals: &[Goal],
    records: &[Record],
    today: NaiveDate,
    grace_day: bool,
) -> Overview {
    let (month_start, month_end) = month_bounds(today);

    let monthly_records = records
        .iter()
        .filter(|r| r.is_completed())
        .filter(|r| month_start <= r.date && r.date <= month_end)
        .count();

    let current_streak = if grace_day {
        current_streak_with_grace(records, today)
    } else {
        current_streak(records, today)
    };

    Overview {
        total_goals: goals.iter().filter(|g| g.is_active).count(),
        monthly_records,
        current_streak,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{completed, day, goal, skipped};

    #[test]
    fn test_month_bounds() {
        assert_eq!(
            month_bounds(day(2024, 2, 14)),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
        assert_eq!(
            month_bounds(day(2023, 12, 31)),
            (day(2023, 12, 1), day(2023, 12, 31))
        );
    }

    #[test]
    fn test_overview_counts() {
        let mut archived = goal("b");
        archived.is_active = false;
        let goals = vec![goal("a"), archived];

        let records = vec![
            completed("a", day(2024, 3, 1), 10),
            completed("a", day(2024, 3, 9), 10),
            completed("b", day(2024, 3, 10), 10),
            skipped("a", day(2024, 3, 8)),
            completed("a", day(2024, 2, 29), 10),
        ];

        let overview = build_overview(&goals, &records, day(2024, 3, 10), false);
        assert_eq!(overview.total_goals, 1);
        assert_eq!(overview.monthly_records, 3);
        assert_eq!(overview.current_streak, 2);
    }

    #[test]
    fn test_overview_grace_day() {
        let goals = vec![goal("a")];
        let records = vec![completed("a", day(2024, 3, 9), 10)];

        let strict = build_overview(&goals, &records, day(2024, 3, 10), false);
        let lenient = build_overview(&goals, &records, day(2024, 3, 10), true);
        assert_eq!(strict.current_streak, 0);
        assert_eq!(lenient.current_streak, 1);
    }

    #[test]
    fn test_overview_json_keys() {
        let json = serde_json::to_value(Overview {
            total_goals: 2,
            monthly_records: 5,
            current_streak: 1,
        })
        .unwrap();
        assert_eq!(json["totalGoals"], 2);
        assert_eq!(json["monthlyRecords"], 5);
        assert_eq!(json["currentStreak"], 1);
    }
}
