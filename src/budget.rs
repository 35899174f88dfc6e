//! Budget status: total expenses compared against a monthly threshold.

use serde::Serialize;

/// The monthly budget used when the server is started without an explicit
/// `--monthly-budget`.
pub const DEFAULT_MONTHLY_BUDGET: f64 = 2000.0;

/// Whether all-time expenses are over or within the monthly budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum BudgetStatus {
    /// Expenses exceed the budget by `overage`.
    OverBudget {
        /// How far over the budget expenses are.
        overage: f64,
    },
    /// Expenses are at or below the budget with `remaining` left to spend.
    WithinBudget {
        /// How much of the budget is left.
        remaining: f64,
    },
}

/// Compare total expenses against the monthly budget.
///
/// Spending exactly the budget counts as within-budget.
pub fn budget_status(total_expense: f64, monthly_budget: f64) -> BudgetStatus {
    if total_expense > monthly_budget {
        BudgetStatus::OverBudget {
            overage: total_expense - monthly_budget,
        }
    } else {
        BudgetStatus::WithinBudget {
            remaining: monthly_budget - total_expense,
        }
    }
}

#[cfg(test)]
mod budget_tests {
    use super::{BudgetStatus, budget_status};

    #[test]
    fn under_budget_reports_remaining() {
        assert_eq!(
            budget_status(1500.0, 2000.0),
            BudgetStatus::WithinBudget { remaining: 500.0 }
        );
    }

    #[test]
    fn over_budget_reports_overage() {
        assert_eq!(
            budget_status(2500.0, 2000.0),
            BudgetStatus::OverBudget { overage: 500.0 }
        );
    }

    #[test]
    fn spending_exactly_the_budget_is_within_budget() {
        assert_eq!(
            budget_status(2000.0, 2000.0),
            BudgetStatus::WithinBudget { remaining: 0.0 }
        );
    }

    #[test]
    fn status_serializes_with_kebab_case_tag() {
        let encoded = serde_json::to_value(budget_status(2500.0, 2000.0)).unwrap();

        assert_eq!(encoded["status"], "over-budget");
        assert_eq!(encoded["overage"], 500.0);
    }
}
