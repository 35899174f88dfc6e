//! Domain events emitted when the dashboard is recomputed.
//!
//! The aggregation itself is pure; events are published afterwards on a
//! broadcast channel so that presentation collaborators (notifications,
//! logging) can subscribe without the engine knowing about them.

use serde::Serialize;

use crate::achievement::AchievementDetails;

/// A discrete event produced while recomputing a user's dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum DomainEvent {
    /// An achievement transitioned from not-unlocked to unlocked.
    ///
    /// This transition happens at most once per achievement per user and
    /// never reverses.
    AchievementUnlocked {
        /// The user that unlocked the achievement.
        username: String,
        /// The metadata of the unlocked achievement.
        achievement: AchievementDetails,
    },

    /// A dashboard view-model was recomputed.
    DashboardRecomputed {
        /// The user whose dashboard was recomputed.
        username: String,
        /// How many transactions fed the computation.
        transaction_count: usize,
    },
}
