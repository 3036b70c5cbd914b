use std::str::FromStr;

use db::models::{
    learning_node::{CreateLearningNode, LearningNode, NodeType},
    user_profile::UserProfile,
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use uuid::Uuid;

/// In-memory database with the full schema applied. A single connection keeps
/// the database alive and shared for the whole test.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    db::MIGRATOR.run(&pool).await.unwrap();
    pool
}

pub async fn seed_user(pool: &SqlitePool) -> Uuid {
    let id = Uuid::new_v4();
    UserProfile::create(pool, id, 5).await.unwrap();
    id
}

/// Seed a linear path of nodes for days 1..=days.
pub async fn seed_nodes(pool: &SqlitePool, days: i64) -> Vec<LearningNode> {
    let mut nodes = Vec::new();
    for day in 1..=days {
        let data = CreateLearningNode {
            sequence_day: day,
            node_type: NodeType::DomainDrill,
            title: format!("Day {day}"),
            estimated_minutes: 5,
        };
        let node = LearningNode::create(pool, &data, Uuid::new_v4())
            .await
            .unwrap();
        nodes.push(node);
    }
    nodes
}
