//! Filtering and totalling of transaction lists.
//!
//! Filtering by type and searching by text compose with AND. An unmatched
//! filter yields an empty list and zero totals, never an error.

use serde::{Deserialize, Serialize};

use crate::transaction::{Transaction, TransactionKind};

/// Which transaction types to include in a filtered view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    /// Include both income and expenses.
    #[default]
    All,
    /// Include only income.
    Income,
    /// Include only expenses.
    Expense,
}

impl TypeFilter {
    fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Income => transaction.kind == Some(TransactionKind::Income),
            TypeFilter::Expense => transaction.kind == Some(TransactionKind::Expense),
        }
    }
}

/// Income and expense sums over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// The sum of all income amounts.
    pub income: f64,
    /// The sum of all expense amounts.
    pub expense: f64,
}

impl Totals {
    /// The net balance, income minus expenses.
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// Select the transactions matching both the type filter and the search text.
///
/// The search is a case-insensitive substring match over the description and
/// the type name. An empty search matches everything.
pub fn filter_transactions<'a>(
    transactions: &'a [Transaction],
    type_filter: TypeFilter,
    search: &str,
) -> Vec<&'a Transaction> {
    let query = search.trim().to_lowercase();

    transactions
        .iter()
        .filter(|transaction| type_filter.matches(transaction))
        .filter(|transaction| {
            query.is_empty()
                || transaction.description.to_lowercase().contains(&query)
                || transaction
                    .kind
                    .is_some_and(|kind| kind.as_str().contains(&query))
        })
        .collect()
}

/// Sum income and expenses over a set of transactions.
///
/// Transactions without a recognised type contribute to neither sum.
pub fn calculate_totals<'a, I>(transactions: I) -> Totals
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut totals = Totals::default();

    for transaction in transactions {
        match transaction.kind {
            Some(TransactionKind::Income) => totals.income += transaction.amount,
            Some(TransactionKind::Expense) => totals.expense += transaction.amount,
            None => {}
        }
    }

    totals
}
