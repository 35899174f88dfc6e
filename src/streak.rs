//! Consecutive-day activity streaks.

use time::Date;

use crate::transaction::Transaction;

/// Count the streak of consecutive transaction days ending at `today`.
///
/// Transaction dates are sorted descending and walked from `today`: each
/// next date may be at most one day before the current cursor, which then
/// moves to that date. The walk stops at the first gap of more than one day.
///
/// Dates are not deduplicated before the walk, so several transactions on
/// the same day each extend the streak and the count can exceed the number
/// of elapsed calendar days. This matches the behaviour users already see.
/// Transactions without a parseable timestamp are ignored.
pub fn calculate_streak_days(transactions: &[Transaction], today: Date) -> u32 {
    let mut dates: Vec<Date> = transactions
        .iter()
        .filter_map(|transaction| transaction.created_at)
        .map(|created_at| created_at.date())
        .collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let mut streak = 0;
    let mut cursor = today;

    for date in dates {
        if (cursor - date).whole_days() <= 1 {
            streak += 1;
            cursor = date;
        } else {
            break;
        }
    }

    streak
}
