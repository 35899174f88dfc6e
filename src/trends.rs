//! Monthly trend buckets: per-month income and expense sums.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::transaction::{Transaction, TransactionKind};

/// Income and expense sums for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// The month label in the unpadded `"YYYY-M"` form, e.g. `"2024-3"`.
    pub month_key: String,
    /// The sum of income amounts recorded in this month.
    pub income: f64,
    /// The sum of expense amounts recorded in this month.
    pub expense: f64,
}

/// Group transactions by calendar month and sum income and expenses per
/// bucket.
///
/// Transactions without a parseable timestamp are excluded. Buckets are
/// ordered by `(year, month)` ascending; the unpadded `"YYYY-M"` label is
/// kept for wire compatibility but is not the sort key, so October through
/// December sort after September rather than after January.
pub fn calculate_monthly_trends(transactions: &[Transaction]) -> Vec<MonthlyBucket> {
    let mut buckets: BTreeMap<(i32, u8), (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let Some(created_at) = transaction.created_at else {
            continue;
        };

        let key = (created_at.year(), created_at.month() as u8);
        let (income, expense) = buckets.entry(key).or_default();

        match transaction.kind {
            Some(TransactionKind::Income) => *income += transaction.amount,
            Some(TransactionKind::Expense) => *expense += transaction.amount,
            None => {}
        }
    }

    buckets
        .into_iter()
        .map(|((year, month), (income, expense))| MonthlyBucket {
            month_key: format!("{year}-{month}"),
            income,
            expense,
        })
        .collect()
}

#[cfg(test)]
mod trends_tests {
    use time::macros::datetime;

    use super::calculate_monthly_trends;
    use crate::transaction::{Transaction, TransactionKind};

    fn transaction(
        kind: TransactionKind,
        amount: f64,
        created_at: Option<time::OffsetDateTime>,
    ) -> Transaction {
        Transaction {
            id: String::new(),
            kind: Some(kind),
            amount,
            description: String::new(),
            category: String::new(),
            created_at,
        }
    }

    #[test]
    fn buckets_by_month_with_separate_sums() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                100.0,
                Some(datetime!(2024-01-05 10:00 UTC)),
            ),
            transaction(
                TransactionKind::Expense,
                30.0,
                Some(datetime!(2024-01-20 10:00 UTC)),
            ),
            transaction(
                TransactionKind::Income,
                200.0,
                Some(datetime!(2024-02-01 10:00 UTC)),
            ),
        ];

        let buckets = calculate_monthly_trends(&transactions);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month_key, "2024-1");
        assert_eq!(buckets[0].income, 100.0);
        assert_eq!(buckets[0].expense, 30.0);
        assert_eq!(buckets[1].month_key, "2024-2");
        assert_eq!(buckets[1].income, 200.0);
        assert_eq!(buckets[1].expense, 0.0);
    }

    #[test]
    fn late_months_sort_after_early_months() {
        // Lexicographic sorting of unpadded keys would put "2024-10" before
        // "2024-9"; the numeric sort must not.
        let transactions = vec![
            transaction(
                TransactionKind::Expense,
                10.0,
                Some(datetime!(2024-10-01 10:00 UTC)),
            ),
            transaction(
                TransactionKind::Expense,
                20.0,
                Some(datetime!(2024-09-01 10:00 UTC)),
            ),
        ];

        let buckets = calculate_monthly_trends(&transactions);

        assert_eq!(buckets[0].month_key, "2024-9");
        assert_eq!(buckets[1].month_key, "2024-10");
    }

    #[test]
    fn transactions_without_timestamps_are_excluded() {
        let transactions = vec![transaction(TransactionKind::Income, 100.0, None)];

        assert!(calculate_monthly_trends(&transactions).is_empty());
    }
}
