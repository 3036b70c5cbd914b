//! Achievement evaluation: a fixed rule set over aggregate user stats.

use db::models::{
    badge::{Badge, BadgeType},
    node_progress::NodeProgress,
    user_profile::UserProfile,
};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use super::balance::BalanceConfig;

/// Snapshot of the aggregates the badge rules see.
#[derive(Debug, Clone, Copy)]
pub struct UserStats {
    pub units_completed: i64,
    pub streak: i64,
    pub insights: i64,
    pub hearts: i64,
}

struct BadgeRule {
    badge_type: BadgeType,
    display_name: &'static str,
    predicate: fn(&UserStats, &BalanceConfig) -> bool,
}

/// Ordered rule table. Every predicate is a pure function of the stats
/// snapshot; awarding is idempotent at the storage layer.
const RULES: &[BadgeRule] = &[
    BadgeRule {
        badge_type: BadgeType::FirstSteps,
        display_name: "First Steps",
        predicate: |stats, _| stats.units_completed >= 1,
    },
    BadgeRule {
        badge_type: BadgeType::Pathfinder,
        display_name: "Pathfinder",
        predicate: |stats, balance| stats.units_completed >= balance.pathfinder_units,
    },
    BadgeRule {
        badge_type: BadgeType::Trailblazer,
        display_name: "Trailblazer",
        predicate: |stats, balance| stats.units_completed >= balance.trailblazer_units,
    },
    BadgeRule {
        badge_type: BadgeType::WeekStreak,
        display_name: "Dedicated",
        predicate: |stats, balance| stats.streak >= balance.week_streak_days,
    },
    BadgeRule {
        badge_type: BadgeType::MonthStreak,
        display_name: "Devoted",
        predicate: |stats, balance| stats.streak >= balance.month_streak_days,
    },
    BadgeRule {
        badge_type: BadgeType::InsightCollector,
        display_name: "Insight Collector",
        predicate: |stats, balance| stats.insights >= balance.insight_collector_threshold,
    },
    BadgeRule {
        badge_type: BadgeType::InsightSage,
        display_name: "Insight Sage",
        predicate: |stats, balance| stats.insights >= balance.insight_sage_threshold,
    },
];

pub struct AchievementService;

impl AchievementService {
    /// Evaluate every rule and award anything newly earned, returning the
    /// display names of the new badges. Per-badge persistence failures are
    /// logged and skipped; the caller always gets whatever succeeded.
    pub async fn check_and_award(
        pool: &SqlitePool,
        balance: &BalanceConfig,
        user_id: Uuid,
    ) -> Vec<String> {
        let stats = match Self::load_stats(pool, user_id).await {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                warn!(user_id = %user_id, "achievement check for unknown user");
                return Vec::new();
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "failed to load stats for achievement check");
                return Vec::new();
            }
        };

        let mut newly_awarded = Vec::new();
        for rule in RULES {
            if !(rule.predicate)(&stats, balance) {
                continue;
            }
            match Badge::award(pool, user_id, rule.badge_type).await {
                Ok(Some(_)) => {
                    info!(user_id = %user_id, badge = %rule.badge_type, "badge awarded");
                    newly_awarded.push(rule.display_name.to_string());
                }
                // Already held; the unique index swallowed the insert.
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        user_id = %user_id,
                        badge = %rule.badge_type,
                        error = %e,
                        "failed to persist badge, skipping"
                    );
                }
            }
        }
        newly_awarded
    }

    async fn load_stats(pool: &SqlitePool, user_id: Uuid) -> Result<Option<UserStats>, sqlx::Error> {
        let Some(profile) = UserProfile::find_by_id(pool, user_id).await? else {
            return Ok(None);
        };
        let units_completed = NodeProgress::count_completed(pool, user_id).await?;
        Ok(Some(UserStats {
            units_completed,
            streak: profile.streak,
            insights: profile.insights,
            hearts: profile.hearts,
        }))
    }
}
