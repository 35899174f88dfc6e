//! Financial health metrics derived from income and expense totals.

use crate::filters::Totals;

/// Savings rate and expense ratio as display percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthMetrics {
    /// `(income - expense) / income * 100`, clamped to `[0, 100]`.
    pub savings_rate_percent: f64,
    /// `expense / income * 100`, clamped to `[0, 100]`.
    pub expense_ratio_percent: f64,
}

/// Compute savings rate and expense ratio from totals.
///
/// Both metrics are zero when there is no income, avoiding a division by
/// zero. The underlying ratios can leave `[0, 100]` (spending more than you
/// earn), but the reported values are clamped for display.
pub fn calculate_health_metrics(totals: &Totals) -> HealthMetrics {
    if totals.income <= 0.0 {
        return HealthMetrics {
            savings_rate_percent: 0.0,
            expense_ratio_percent: 0.0,
        };
    }

    let savings_rate = (totals.income - totals.expense) / totals.income * 100.0;
    let expense_ratio = totals.expense / totals.income * 100.0;

    HealthMetrics {
        savings_rate_percent: savings_rate.clamp(0.0, 100.0),
        expense_ratio_percent: expense_ratio.clamp(0.0, 100.0),
    }
}

#[cfg(test)]
mod metrics_tests {
    use super::calculate_health_metrics;
    use crate::filters::Totals;

    #[test]
    fn computes_rates_from_totals() {
        let metrics = calculate_health_metrics(&Totals {
            income: 100.0,
            expense: 30.0,
        });

        assert_eq!(metrics.savings_rate_percent, 70.0);
        assert_eq!(metrics.expense_ratio_percent, 30.0);
    }

    #[test]
    fn zero_income_yields_zero_metrics() {
        let metrics = calculate_health_metrics(&Totals {
            income: 0.0,
            expense: 500.0,
        });

        assert_eq!(metrics.savings_rate_percent, 0.0);
        assert_eq!(metrics.expense_ratio_percent, 0.0);
    }

    #[test]
    fn overspending_is_clamped_to_display_range() {
        let metrics = calculate_health_metrics(&Totals {
            income: 100.0,
            expense: 250.0,
        });

        assert_eq!(metrics.savings_rate_percent, 0.0);
        assert_eq!(metrics.expense_ratio_percent, 100.0);
    }
}
