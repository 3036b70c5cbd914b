use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Identifier into the fixed achievement rule table.
#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Hash, TS, EnumString, Display,
)]
#[sqlx(type_name = "badge_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BadgeType {
    FirstSteps,
    Pathfinder,
    Trailblazer,
    WeekStreak,
    MonthStreak,
    InsightCollector,
    InsightSage,
}

/// A permanently awarded achievement marker. Append-only; at most one row per
/// (user, badge type), enforced by a unique index.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Badge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_type: BadgeType,
    pub awarded_at: DateTime<Utc>,
}

impl Badge {
    /// Award the badge unless the user already holds it. Returns the new row,
    /// or `None` when the unique index swallowed a duplicate.
    pub async fn award(
        pool: &SqlitePool,
        user_id: Uuid,
        badge_type: BadgeType,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO badges (id, user_id, badge_type)
             VALUES ($1, $2, $3)
             ON CONFLICT(user_id, badge_type) DO NOTHING
             RETURNING id, user_id, badge_type, awarded_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(badge_type)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT id, user_id, badge_type, awarded_at
             FROM badges
             WHERE user_id = $1
             ORDER BY awarded_at ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
