//! Achievement rules and their evaluation.
//!
//! Each achievement is a data entry pairing metadata with a predicate over
//! the full transaction history. Evaluation is pure and re-run after every
//! mutation; unlocking diffs against the set of already-unlocked IDs, so an
//! achievement can unlock at most once and never reverses.

use std::collections::BTreeSet;

use serde::Serialize;
use time::Date;

use crate::{
    filters::calculate_totals,
    streak::calculate_streak_days,
    transaction::{Transaction, TransactionKind},
};

/// The income-minus-expense total needed for the savings master achievement.
const SAVINGS_MASTER_THRESHOLD: f64 = 1000.0;

/// The streak length needed for the transaction streak achievement.
const TRANSACTION_STREAK_DAYS: u32 = 7;

/// The single-expense amount needed for the big spender achievement.
const BIG_SPENDER_THRESHOLD: f64 = 500.0;

/// Everything an achievement predicate may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// The user's full transaction history.
    pub transactions: &'a [Transaction],
    /// The reference date for time-based rules.
    pub today: Date,
}

/// An achievement definition: metadata plus an unlock predicate.
pub struct AchievementRule {
    /// The stable identifier recorded once the achievement unlocks.
    pub id: &'static str,
    /// The display title.
    pub title: &'static str,
    /// The display description.
    pub description: &'static str,
    /// The display icon.
    pub icon: &'static str,
    predicate: fn(&RuleInput) -> bool,
}

impl AchievementRule {
    /// The serializable metadata for this rule.
    pub fn details(&self) -> AchievementDetails {
        AchievementDetails {
            id: self.id,
            title: self.title,
            description: self.description,
            icon: self.icon,
        }
    }
}

impl std::fmt::Debug for AchievementRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementRule")
            .field("id", &self.id)
            .finish()
    }
}

/// The displayable part of an achievement rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDetails {
    /// The stable identifier of the achievement.
    pub id: &'static str,
    /// The display title.
    pub title: &'static str,
    /// The display description.
    pub description: &'static str,
    /// The display icon.
    pub icon: &'static str,
}

/// The full achievement rule table.
///
/// Adding an achievement means adding an entry here; the evaluation logic
/// treats all rules uniformly.
pub static RULES: [AchievementRule; 4] = [
    AchievementRule {
        id: "first-transaction",
        title: "First Transaction",
        description: "Added your first transaction",
        icon: "🎉",
        predicate: |input| !input.transactions.is_empty(),
    },
    AchievementRule {
        id: "savings-master",
        title: "Savings Master",
        description: "Save $1000 or more",
        icon: "💰",
        predicate: |input| {
            let totals = calculate_totals(input.transactions);
            totals.balance() >= SAVINGS_MASTER_THRESHOLD
        },
    },
    AchievementRule {
        id: "transaction-streak",
        title: "Transaction Streak",
        description: "Add transactions for 7 days",
        icon: "🔥",
        predicate: |input| {
            calculate_streak_days(input.transactions, input.today) >= TRANSACTION_STREAK_DAYS
        },
    },
    AchievementRule {
        id: "big-spender",
        title: "Big Spender",
        description: "Make a single expense of $500+",
        icon: "💸",
        predicate: |input| {
            input
                .transactions
                .iter()
                .filter(|transaction| transaction.kind == Some(TransactionKind::Expense))
                .any(|transaction| transaction.amount >= BIG_SPENDER_THRESHOLD)
        },
    },
];

/// Evaluate all rules and return those that unlock now.
///
/// Rules whose IDs are already in `unlocked` are skipped, so re-evaluating
/// after every mutation never re-fires an achievement.
pub fn evaluate_achievements(
    transactions: &[Transaction],
    today: Date,
    unlocked: &BTreeSet<String>,
) -> Vec<&'static AchievementRule> {
    let input = RuleInput {
        transactions,
        today,
    };

    RULES
        .iter()
        .filter(|rule| !unlocked.contains(rule.id))
        .filter(|rule| (rule.predicate)(&input))
        .collect()
}
