use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Kind of learning content the node presents
#[derive(Debug, Clone, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default)]
#[sqlx(type_name = "node_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeType {
    #[default]
    DomainDrill,
    ConnectionExplore,
    LocalMeasure,
    KnowledgeReview,
}

/// A single unit of learning content in the fixed path sequence. Reference
/// data: read-only to the progression engine.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct LearningNode {
    pub id: Uuid,
    pub sequence_day: i64,
    pub node_type: NodeType,
    pub title: String,
    pub estimated_minutes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateLearningNode {
    pub sequence_day: i64,
    pub node_type: NodeType,
    pub title: String,
    pub estimated_minutes: i64,
}

const NODE_COLUMNS: &str = "id, sequence_day, node_type, title, estimated_minutes, created_at";

impl LearningNode {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {NODE_COLUMNS} FROM learning_nodes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The full catalog in unlock order.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {NODE_COLUMNS} FROM learning_nodes ORDER BY sequence_day ASC"
        ))
        .fetch_all(pool)
        .await
    }

    /// The node that unlocks after the given sequence day, if any.
    pub async fn find_next_after<'e, E>(
        executor: E,
        sequence_day: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {NODE_COLUMNS} FROM learning_nodes
             WHERE sequence_day > $1
             ORDER BY sequence_day ASC
             LIMIT 1"
        ))
        .bind(sequence_day)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_sequence_range(
        pool: &SqlitePool,
        start_day: i64,
        end_day: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {NODE_COLUMNS} FROM learning_nodes
             WHERE sequence_day BETWEEN $1 AND $2
             ORDER BY sequence_day ASC"
        ))
        .bind(start_day)
        .bind(end_day)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateLearningNode,
        node_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(&format!(
            "INSERT INTO learning_nodes (id, sequence_day, node_type, title, estimated_minutes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {NODE_COLUMNS}"
        ))
        .bind(node_id)
        .bind(data.sequence_day)
        .bind(data.node_type.clone())
        .bind(&data.title)
        .bind(data.estimated_minutes)
        .fetch_one(pool)
        .await
    }
}
