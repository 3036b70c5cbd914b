//! Tunable game-balance parameters, centralized so call sites never carry
//! their own reward literals.

use serde::{Deserialize, Serialize};

/// Reward values and achievement thresholds. Injected into the progression
/// engine and the achievement evaluator; overridable from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    /// Insights granted for completing any node.
    pub base_node_insights: i64,
    /// Extra insights granted when the completed node is a checkpoint.
    pub checkpoint_bonus: i64,
    /// A node is a checkpoint when its sequence day is a multiple of this.
    pub checkpoint_interval: i64,
    /// Daily heart allowance.
    pub max_hearts: i64,
    /// Completions needed for the Pathfinder badge.
    pub pathfinder_units: i64,
    /// Completions needed for the Trailblazer badge.
    pub trailblazer_units: i64,
    /// Consecutive days needed for the week-streak badge.
    pub week_streak_days: i64,
    /// Consecutive days needed for the month-streak badge.
    pub month_streak_days: i64,
    /// Insights needed for the Insight Collector badge.
    pub insight_collector_threshold: i64,
    /// Insights needed for the Insight Sage badge.
    pub insight_sage_threshold: i64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            base_node_insights: 10,
            checkpoint_bonus: 20,
            checkpoint_interval: 7,
            max_hearts: 5,
            pathfinder_units: 10,
            trailblazer_units: 30,
            week_streak_days: 7,
            month_streak_days: 30,
            insight_collector_threshold: 100,
            insight_sage_threshold: 500,
        }
    }
}

impl BalanceConfig {
    /// Read `BALANCE_*` overrides from the environment, falling back to the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_node_insights: env_i64("BALANCE_BASE_NODE_INSIGHTS", defaults.base_node_insights),
            checkpoint_bonus: env_i64("BALANCE_CHECKPOINT_BONUS", defaults.checkpoint_bonus),
            checkpoint_interval: env_i64(
                "BALANCE_CHECKPOINT_INTERVAL",
                defaults.checkpoint_interval,
            ),
            max_hearts: env_i64("BALANCE_MAX_HEARTS", defaults.max_hearts),
            pathfinder_units: env_i64("BALANCE_PATHFINDER_UNITS", defaults.pathfinder_units),
            trailblazer_units: env_i64("BALANCE_TRAILBLAZER_UNITS", defaults.trailblazer_units),
            week_streak_days: env_i64("BALANCE_WEEK_STREAK_DAYS", defaults.week_streak_days),
            month_streak_days: env_i64("BALANCE_MONTH_STREAK_DAYS", defaults.month_streak_days),
            insight_collector_threshold: env_i64(
                "BALANCE_INSIGHT_COLLECTOR_THRESHOLD",
                defaults.insight_collector_threshold,
            ),
            insight_sage_threshold: env_i64(
                "BALANCE_INSIGHT_SAGE_THRESHOLD",
                defaults.insight_sage_threshold,
            ),
        }
    }

    pub fn is_checkpoint_day(&self, sequence_day: i64) -> bool {
        self.checkpoint_interval > 0 && sequence_day % self.checkpoint_interval == 0
    }

    /// Insights earned for completing the node at the given sequence day.
    pub fn node_reward(&self, sequence_day: i64) -> i64 {
        if self.is_checkpoint_day(sequence_day) {
            self.base_node_insights + self.checkpoint_bonus
        } else {
            self.base_node_insights
        }
    }
}

fn env_i64(key: &str, fallback: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_every_seventh_day() {
        let balance = BalanceConfig::default();
        assert!(balance.is_checkpoint_day(7));
        assert!(balance.is_checkpoint_day(14));
        assert!(!balance.is_checkpoint_day(1));
        assert!(!balance.is_checkpoint_day(5));
        assert!(!balance.is_checkpoint_day(6));
    }

    #[test]
    fn checkpoint_nodes_earn_the_bonus() {
        let balance = BalanceConfig::default();
        assert_eq!(balance.node_reward(3), 10);
        assert_eq!(balance.node_reward(7), 30);
        assert_eq!(balance.node_reward(21), 30);
    }

    #[test]
    fn zero_interval_never_checkpoints() {
        let balance = BalanceConfig {
            checkpoint_interval: 0,
            ..Default::default()
        };
        assert!(!balance.is_checkpoint_day(0));
        assert_eq!(balance.node_reward(7), 10);
    }
}
