use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::learning_node::NodeType;

/// Per-node unlock state. Strictly forward-moving:
/// locked -> available -> current -> completed. `completed` is terminal.
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default)]
#[sqlx(type_name = "progress_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Locked,
    Available,
    Current,
    Completed,
}

/// One user's state for one learning node.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct NodeProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub node_id: Uuid,
    pub status: ProgressStatus,
    pub insights_earned: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub response_payload: Option<String>, // JSON-serialized, opaque to the engine
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A learning node joined with one user's progress, for the path screen.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct PathEntry {
    pub node_id: Uuid,
    pub sequence_day: i64,
    pub node_type: NodeType,
    pub title: String,
    pub estimated_minutes: i64,
    pub status: ProgressStatus,
    pub insights_earned: Option<i64>,
    pub completed_at: Option<DateTime<Utc>>,
}

const PROGRESS_COLUMNS: &str = "id, user_id, node_id, status, insights_earned, completed_at, \
     response_payload, created_at, updated_at";

impl NodeProgress {
    /// Parse the stored response payload back into JSON.
    pub fn parsed_response(&self) -> Option<serde_json::Value> {
        self.response_payload
            .as_ref()
            .and_then(|json| serde_json::from_str(json).ok())
    }

    pub async fn find_by_user_and_node(
        pool: &SqlitePool,
        user_id: Uuid,
        node_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM node_progress
             WHERE user_id = $1 AND node_id = $2"
        ))
        .bind(user_id)
        .bind(node_id)
        .fetch_optional(pool)
        .await
    }

    /// Set the status for a (user, node) pair, creating the row if the path
    /// has not seeded it yet.
    pub async fn upsert_status<'e, E>(
        executor: E,
        user_id: Uuid,
        node_id: Uuid,
        status: ProgressStatus,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO node_progress (id, user_id, node_id, status)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT(user_id, node_id) DO UPDATE SET
                 status = excluded.status,
                 updated_at = datetime('now', 'subsec')
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(node_id)
        .bind(status)
        .fetch_one(executor)
        .await
    }

    /// Mark a node completed: status, earned insights, completion timestamp
    /// and the verbatim response payload land in one UPDATE.
    pub async fn complete<'e, E>(
        executor: E,
        user_id: Uuid,
        node_id: Uuid,
        insights_earned: i64,
        response_payload: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(&format!(
            "UPDATE node_progress
             SET status = $3,
                 insights_earned = $4,
                 completed_at = datetime('now', 'subsec'),
                 response_payload = $5,
                 updated_at = datetime('now', 'subsec')
             WHERE user_id = $1 AND node_id = $2
             RETURNING {PROGRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(node_id)
        .bind(ProgressStatus::Completed)
        .bind(insights_earned)
        .bind(response_payload)
        .fetch_one(executor)
        .await
    }

    pub async fn count_completed(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM node_progress
             WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn count_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM node_progress WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_current_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM node_progress
             WHERE user_id = $1 AND status = 'current'
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// The whole path for one user, in unlock order.
    pub async fn path_for_user(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<Vec<PathEntry>, sqlx::Error> {
        sqlx::query_as::<_, PathEntry>(
            "SELECT
                 n.id AS node_id,
                 n.sequence_day,
                 n.node_type,
                 n.title,
                 n.estimated_minutes,
                 p.status,
                 p.insights_earned,
                 p.completed_at
             FROM learning_nodes n
             JOIN node_progress p ON p.node_id = n.id AND p.user_id = $1
             ORDER BY n.sequence_day ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
