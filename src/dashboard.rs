//! This file defines the dashboard view-model, the pure computation that
//! builds it, and the dashboard route handler.
//!
//! [compute_dashboard] is the heart of the aggregation engine: a
//! deterministic, side-effect-free function from (transactions, filter,
//! search, budget, today, already-unlocked achievements) to a view-model
//! plus the achievements that unlock now. The handler wraps it with storage
//! access and event publishing.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error,
    achievement::{AchievementRule, evaluate_achievements},
    budget::{BudgetStatus, budget_status},
    event::DomainEvent,
    filters::{TypeFilter, calculate_totals, filter_transactions},
    metrics::calculate_health_metrics,
    streak::calculate_streak_days,
    transaction::Transaction,
    trends::{MonthlyBucket, calculate_monthly_trends},
};

/// The aggregated view of a user's finances, recomputed on every request and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViewModel {
    /// Income minus expenses over the filtered transactions.
    pub balance: f64,
    /// Total income over the filtered transactions.
    pub total_income: f64,
    /// Total expenses over the filtered transactions.
    pub total_expense: f64,
    /// All-time expenses compared against the monthly budget.
    pub budget_status: BudgetStatus,
    /// The savings rate as a display percentage in `[0, 100]`.
    pub savings_rate_percent: f64,
    /// The expense ratio as a display percentage in `[0, 100]`.
    pub expense_ratio_percent: f64,
    /// Per-month income and expense sums over all transactions.
    pub monthly_trends: Vec<MonthlyBucket>,
    /// The consecutive-day activity streak ending today.
    pub streak_days: u32,
    /// Every achievement ID the user has unlocked, including ones unlocked
    /// by this recomputation.
    pub achievements: Vec<String>,
    /// Whether the filtered view is empty and the client should show its
    /// "no data" state.
    pub no_data: bool,
}

/// Build the dashboard view-model and determine which achievements unlock
/// now.
///
/// The type filter and search only narrow the balance and totals; budget
/// status, trends, streaks, and achievements are always computed over the
/// full transaction history. Malformed records degrade rather than error:
/// an empty history yields all-zero metrics and `no_data`.
pub fn compute_dashboard(
    transactions: &[Transaction],
    type_filter: TypeFilter,
    search: &str,
    monthly_budget: f64,
    today: Date,
    unlocked: &BTreeSet<String>,
) -> (DashboardViewModel, Vec<&'static AchievementRule>) {
    let filtered = filter_transactions(transactions, type_filter, search);
    let filtered_totals = calculate_totals(filtered.iter().copied());

    let all_time_totals = calculate_totals(transactions);
    let health = calculate_health_metrics(&filtered_totals);
    let streak_days = calculate_streak_days(transactions, today);

    let newly_unlocked = evaluate_achievements(transactions, today, unlocked);

    let mut achievements: Vec<String> = unlocked
        .iter()
        .cloned()
        .chain(newly_unlocked.iter().map(|rule| rule.id.to_owned()))
        .collect();
    achievements.sort();
    achievements.dedup();

    let view_model = DashboardViewModel {
        balance: filtered_totals.balance(),
        total_income: filtered_totals.income,
        total_expense: filtered_totals.expense,
        budget_status: budget_status(all_time_totals.expense, monthly_budget),
        savings_rate_percent: health.savings_rate_percent,
        expense_ratio_percent: health.expense_ratio_percent,
        monthly_trends: calculate_monthly_trends(transactions),
        streak_days,
        achievements,
        no_data: filtered.is_empty(),
    };

    (view_model, newly_unlocked)
}

/// Query parameters selecting whose dashboard to compute and how to filter
/// it.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// The username whose dashboard to compute.
    pub user: String,
    /// The transaction type filter, defaulting to `all`.
    #[serde(default)]
    pub filter: TypeFilter,
    /// Case-insensitive search text over descriptions and type names.
    #[serde(default)]
    pub search: String,
}

/// Compute and return a user's dashboard.
///
/// Any achievements that unlock are recorded against the account before the
/// response is sent, and one [DomainEvent::AchievementUnlocked] per unlock
/// plus a [DomainEvent::DashboardRecomputed] are published.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardViewModel>, Error> {
    let username = query.user.trim().to_owned();
    if username.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let today = OffsetDateTime::now_utc().date();

    let (view_model, newly_unlocked, transaction_count) = {
        let mut store = state.store.lock().map_err(|_| Error::StoreLockError)?;
        if !store.contains_user(&username) {
            return Err(Error::UserNotFound);
        }

        let transactions = store.transactions_for(&username);
        let transaction_count = transactions.len();
        let unlocked = store.unlocked_achievements(&username);
        let (view_model, newly_unlocked) = compute_dashboard(
            transactions,
            query.filter,
            &query.search,
            state.monthly_budget,
            today,
            &unlocked,
        );

        if !newly_unlocked.is_empty() {
            store.record_achievements(&username, newly_unlocked.iter().map(|rule| rule.id))?;
        }

        (view_model, newly_unlocked, transaction_count)
    };

    for rule in &newly_unlocked {
        state.publish(DomainEvent::AchievementUnlocked {
            username: username.clone(),
            achievement: rule.details(),
        });
    }
    state.publish(DomainEvent::DashboardRecomputed {
        username,
        transaction_count,
    });

    Ok(Json(view_model))
}

#[cfg(test)]
mod dashboard_tests {
    use std::collections::BTreeSet;

    use time::macros::{date, datetime};

    use super::compute_dashboard;
    use crate::{
        budget::BudgetStatus,
        filters::TypeFilter,
        transaction::{Transaction, TransactionKind},
    };

    const TODAY: time::Date = date!(2024 - 01 - 02);

    fn transaction(
        kind: TransactionKind,
        amount: f64,
        created_at: time::OffsetDateTime,
    ) -> Transaction {
        Transaction {
            id: String::new(),
            kind: Some(kind),
            amount,
            description: String::new(),
            category: String::new(),
            created_at: Some(created_at),
        }
    }

    #[test]
    fn income_and_expense_produce_expected_dashboard() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                100.0,
                datetime!(2024-01-01 09:00 UTC),
            ),
            transaction(
                TransactionKind::Expense,
                30.0,
                datetime!(2024-01-02 09:00 UTC),
            ),
        ];

        let (view_model, _) = compute_dashboard(
            &transactions,
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );

        assert_eq!(view_model.balance, 70.0);
        assert_eq!(view_model.total_income, 100.0);
        assert_eq!(view_model.total_expense, 30.0);
        assert_eq!(view_model.savings_rate_percent, 70.0);
        assert_eq!(view_model.expense_ratio_percent, 30.0);
        assert_eq!(
            view_model.budget_status,
            BudgetStatus::WithinBudget { remaining: 1970.0 }
        );
        assert!(!view_model.no_data);
    }

    #[test]
    fn balance_equals_income_minus_expense_under_any_filter() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                250.0,
                datetime!(2024-01-01 09:00 UTC),
            ),
            transaction(
                TransactionKind::Expense,
                40.0,
                datetime!(2024-01-01 10:00 UTC),
            ),
            transaction(
                TransactionKind::Expense,
                60.0,
                datetime!(2024-01-02 10:00 UTC),
            ),
        ];

        for filter in [TypeFilter::All, TypeFilter::Income, TypeFilter::Expense] {
            let (view_model, _) = compute_dashboard(
                &transactions,
                filter,
                "",
                2000.0,
                TODAY,
                &BTreeSet::new(),
            );

            assert_eq!(
                view_model.balance,
                view_model.total_income - view_model.total_expense
            );
        }
    }

    #[test]
    fn empty_history_yields_all_zero_metrics_and_no_data() {
        let (view_model, newly_unlocked) = compute_dashboard(
            &[],
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );

        assert_eq!(view_model.balance, 0.0);
        assert_eq!(view_model.savings_rate_percent, 0.0);
        assert_eq!(view_model.expense_ratio_percent, 0.0);
        assert_eq!(view_model.streak_days, 0);
        assert!(view_model.monthly_trends.is_empty());
        assert!(view_model.achievements.is_empty());
        assert!(newly_unlocked.is_empty());
        assert!(view_model.no_data);
    }

    #[test]
    fn achievements_unlock_once_and_persist_in_the_view() {
        let transactions = vec![transaction(
            TransactionKind::Expense,
            600.0,
            datetime!(2024-01-02 09:00 UTC),
        )];

        let (first_view, first_unlocks) = compute_dashboard(
            &transactions,
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );
        let first_ids: Vec<_> = first_unlocks.iter().map(|rule| rule.id).collect();
        assert!(first_ids.contains(&"first-transaction"));
        assert!(first_ids.contains(&"big-spender"));

        // A second pass with the unlocks recorded must not re-fire them.
        let unlocked: BTreeSet<String> = first_view.achievements.iter().cloned().collect();
        let (second_view, second_unlocks) = compute_dashboard(
            &transactions,
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &unlocked,
        );

        assert!(second_unlocks.is_empty());
        assert_eq!(second_view.achievements, first_view.achievements);
    }

    #[test]
    fn trends_cover_all_transactions_regardless_of_filter() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                100.0,
                datetime!(2024-01-01 09:00 UTC),
            ),
            transaction(
                TransactionKind::Expense,
                50.0,
                datetime!(2024-02-01 09:00 UTC),
            ),
        ];

        let (view_model, _) = compute_dashboard(
            &transactions,
            TypeFilter::Income,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );

        assert_eq!(view_model.monthly_trends.len(), 2);
    }

    #[test]
    fn recomputation_is_deterministic() {
        let transactions = vec![
            transaction(
                TransactionKind::Income,
                1200.0,
                datetime!(2024-01-01 09:00 UTC),
            ),
            transaction(
                TransactionKind::Expense,
                90.0,
                datetime!(2024-01-02 09:00 UTC),
            ),
        ];

        let first = compute_dashboard(
            &transactions,
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );
        let second = compute_dashboard(
            &transactions,
            TypeFilter::All,
            "",
            2000.0,
            TODAY,
            &BTreeSet::new(),
        );

        assert_eq!(first.0, second.0);
    }
}

#[cfg(test)]
mod dashboard_route_tests {
    use axum::{Json, extract::{Query, State}};
    use tempfile::tempdir;
    use time::OffsetDateTime;

    use super::{DashboardQuery, get_dashboard};
    use crate::{
        AppState, DEFAULT_MONTHLY_BUDGET, Error, FlatFileStore,
        event::DomainEvent,
        filters::TypeFilter,
        transaction::{Transaction, TransactionKind},
    };

    fn query(user: &str) -> Query<DashboardQuery> {
        Query(DashboardQuery {
            user: user.to_owned(),
            filter: TypeFilter::All,
            search: String::new(),
        })
    }

    fn state_with_user(dir: &std::path::Path, username: &str) -> AppState {
        let mut store = FlatFileStore::open(dir).unwrap();
        store.create_user(username, "hunter2").unwrap();

        AppState::new(store, DEFAULT_MONTHLY_BUDGET)
    }

    fn big_expense() -> Transaction {
        Transaction {
            id: "tx-1".to_owned(),
            kind: Some(TransactionKind::Expense),
            amount: 600.0,
            description: "New couch".to_owned(),
            category: "furniture".to_owned(),
            created_at: Some(OffsetDateTime::now_utc()),
        }
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let dir = tempdir().unwrap();
        let state = state_with_user(dir.path(), "alice");

        let result = get_dashboard(State(state), query("bob")).await;

        assert_eq!(result.err(), Some(Error::UserNotFound));
    }

    #[tokio::test]
    async fn achievements_unlock_at_most_once_across_requests() {
        let dir = tempdir().unwrap();
        let state = state_with_user(dir.path(), "alice");
        {
            let mut store = state.store.lock().unwrap();
            store.add_transaction("alice", big_expense()).unwrap();
        }
        let mut events = state.subscribe();

        let Json(first) = get_dashboard(State(state.clone()), query("alice"))
            .await
            .unwrap();
        assert!(
            first
                .achievements
                .iter()
                .any(|id| id == "big-spender")
        );

        let mut unlock_events = 0;
        while let Ok(event) = events.try_recv() {
            if matches!(event, DomainEvent::AchievementUnlocked { .. }) {
                unlock_events += 1;
            }
        }
        // first-transaction and big-spender both fire on the first pass.
        assert_eq!(unlock_events, 2);

        let Json(second) = get_dashboard(State(state.clone()), query("alice"))
            .await
            .unwrap();
        assert_eq!(second.achievements, first.achievements);

        while let Ok(event) = events.try_recv() {
            assert!(
                !matches!(event, DomainEvent::AchievementUnlocked { .. }),
                "achievements must not re-fire on recomputation"
            );
        }
    }

    #[tokio::test]
    async fn every_request_publishes_a_recompute_event() {
        let dir = tempdir().unwrap();
        let state = state_with_user(dir.path(), "alice");
        let mut events = state.subscribe();

        get_dashboard(State(state.clone()), query("alice"))
            .await
            .unwrap();

        let recomputed = std::iter::from_fn(|| events.try_recv().ok())
            .any(|event| matches!(event, DomainEvent::DashboardRecomputed { .. }));
        assert!(recomputed);
    }
}
