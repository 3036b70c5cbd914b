mod common;

use chrono::{DateTime, Duration, Utc};
use common::{seed_nodes, seed_user, test_pool};
use db::models::{
    node_progress::{NodeProgress, ProgressStatus},
    user_profile::UserProfile,
};
use services::services::{
    balance::BalanceConfig,
    path_integrity::PathIntegrityService,
    progression::{ProgressionError, ProgressionService},
};
use sqlx::SqlitePool;
use uuid::Uuid;

async fn set_session_state(
    pool: &SqlitePool,
    user_id: Uuid,
    last_session_at: Option<DateTime<Utc>>,
    streak: i64,
    hearts: i64,
) {
    sqlx::query("UPDATE user_profiles SET last_session_at = $2, streak = $3, hearts = $4 WHERE id = $1")
        .bind(user_id)
        .bind(last_session_at)
        .bind(streak)
        .bind(hearts)
        .execute(pool)
        .await
        .unwrap();
}

async fn set_insights(pool: &SqlitePool, user_id: Uuid, insights: i64) {
    sqlx::query("UPDATE user_profiles SET insights = $2 WHERE id = $1")
        .bind(user_id)
        .bind(insights)
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn initialize_path_seeds_one_current_and_is_idempotent() {
    let pool = test_pool().await;
    let user_id = seed_user(&pool).await;
    seed_nodes(&pool, 5).await;

    let seeded = ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(seeded, 5);

    let path = ProgressionService::get_path(&pool, user_id).await.unwrap();
    assert_eq!(path[0].status, ProgressStatus::Current);
    assert!(
        path[1..]
            .iter()
            .all(|entry| entry.status == ProgressStatus::Locked)
    );

    let reseeded = ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();
    assert_eq!(reseeded, 0);
}

#[tokio::test]
async fn completing_the_chain_keeps_exactly_one_current() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 8).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();

    for (i, node) in nodes.iter().enumerate() {
        let current = NodeProgress::find_current_for_user(&pool, user_id)
            .await
            .unwrap()
            .expect("a current node before each completion");
        assert_eq!(current.node_id, node.id);

        let outcome =
            ProgressionService::complete_node(&pool, &balance, user_id, node.id, None)
                .await
                .unwrap();

        let last = i == nodes.len() - 1;
        assert_eq!(outcome.next_node_unlocked, !last);

        let path = ProgressionService::get_path(&pool, user_id).await.unwrap();
        let current_count = path
            .iter()
            .filter(|entry| entry.status == ProgressStatus::Current)
            .count();
        assert_eq!(current_count, if last { 0 } else { 1 });
    }

    let path = ProgressionService::get_path(&pool, user_id).await.unwrap();
    assert!(
        path.iter()
            .all(|entry| entry.status == ProgressStatus::Completed)
    );
}

#[tokio::test]
async fn checkpoint_day_earns_the_bonus_and_others_do_not() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 7).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();

    for node in &nodes[..6] {
        let outcome =
            ProgressionService::complete_node(&pool, &balance, user_id, node.id, None)
                .await
                .unwrap();
        assert!(!outcome.is_checkpoint);
        assert_eq!(outcome.insights_earned, 10);
    }

    let outcome =
        ProgressionService::complete_node(&pool, &balance, user_id, nodes[6].id, None)
            .await
            .unwrap();
    assert!(outcome.is_checkpoint);
    assert_eq!(outcome.insights_earned, 30);

    let profile = UserProfile::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(profile.insights, 6 * 10 + 30);
}

#[tokio::test]
async fn completing_a_node_twice_is_rejected() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 3).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();

    ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, None)
        .await
        .unwrap();

    let err = ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressionError::NodeAlreadyCompleted));

    let profile = UserProfile::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(profile.insights, 10);
}

#[tokio::test]
async fn completion_requires_an_initialized_path() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 3).await;

    let err = ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressionError::PathNotInitialized));
}

#[tokio::test]
async fn unknown_references_are_reported_as_not_found() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 1).await;

    let err = ProgressionService::complete_node(&pool, &balance, user_id, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressionError::NodeNotFound));

    let err =
        ProgressionService::complete_node(&pool, &balance, Uuid::new_v4(), nodes[0].id, None)
            .await
            .unwrap_err();
    assert!(matches!(err, ProgressionError::UserNotFound));
}

#[tokio::test]
async fn hearts_run_down_to_zero_and_never_below() {
    let pool = test_pool().await;
    let user_id = seed_user(&pool).await;

    for expected in (0..5).rev() {
        let balance = ProgressionService::spend_heart(&pool, user_id).await.unwrap();
        assert_eq!(balance.hearts_remaining, expected);
    }

    let err = ProgressionService::spend_heart(&pool, user_id).await.unwrap_err();
    assert!(matches!(err, ProgressionError::NoHeartsRemaining));

    let profile = UserProfile::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(profile.hearts, 0);
}

#[tokio::test]
async fn first_session_starts_the_streak_at_one() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;

    let stats = ProgressionService::update_daily_stats(&pool, &balance, user_id)
        .await
        .unwrap();
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.hearts, 5);
    assert!(!stats.streak_extended);

    let profile = UserProfile::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert!(profile.last_session_at.is_some());
}

#[tokio::test]
async fn same_day_roll_over_is_a_noop() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;

    ProgressionService::update_daily_stats(&pool, &balance, user_id)
        .await
        .unwrap();

    // Spend some hearts; a same-day call must not refill them.
    ProgressionService::spend_heart(&pool, user_id).await.unwrap();
    ProgressionService::spend_heart(&pool, user_id).await.unwrap();

    let stats = ProgressionService::update_daily_stats(&pool, &balance, user_id)
        .await
        .unwrap();
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.hearts, 3);
    assert!(!stats.streak_extended);
}

#[tokio::test]
async fn consecutive_day_extends_the_streak_and_refills_hearts() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    set_session_state(&pool, user_id, Some(Utc::now() - Duration::days(1)), 3, 1).await;

    let stats = ProgressionService::update_daily_stats(&pool, &balance, user_id)
        .await
        .unwrap();
    assert_eq!(stats.streak, 4);
    assert_eq!(stats.hearts, 5);
    assert!(stats.streak_extended);
}

#[tokio::test]
async fn missed_days_reset_the_streak_to_one() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    set_session_state(&pool, user_id, Some(Utc::now() - Duration::days(3)), 9, 2).await;

    let stats = ProgressionService::update_daily_stats(&pool, &balance, user_id)
        .await
        .unwrap();
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.hearts, 5);
    assert!(!stats.streak_extended);
}

#[tokio::test]
async fn crossing_one_hundred_insights_awards_the_collector_badge() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 3).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();
    set_insights(&pool, user_id, 90).await;

    let outcome = ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, None)
        .await
        .unwrap();
    assert_eq!(outcome.insights_earned, 10);
    assert!(outcome.new_badges.iter().any(|b| b == "Insight Collector"));
    assert!(outcome.new_badges.iter().any(|b| b == "First Steps"));

    let profile = UserProfile::find_by_id(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(profile.insights, 100);
}

#[tokio::test]
async fn response_payload_is_stored_verbatim() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 2).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();

    let payload = serde_json::json!({"answers": [2, 4], "skipped": false});
    ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, Some(payload.clone()))
        .await
        .unwrap();

    let progress = NodeProgress::find_by_user_and_node(&pool, user_id, nodes[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(progress.parsed_response(), Some(payload));
}

#[tokio::test]
async fn leaderboard_orders_by_insights_and_respects_the_limit() {
    let pool = test_pool().await;
    let low = seed_user(&pool).await;
    let high = seed_user(&pool).await;
    let mid = seed_user(&pool).await;
    set_insights(&pool, low, 50).await;
    set_insights(&pool, high, 200).await;
    set_insights(&pool, mid, 100).await;

    let entries = ProgressionService::leaderboard(&pool, 10).await.unwrap();
    let order: Vec<Uuid> = entries.iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![high, mid, low]);

    let top_two = ProgressionService::leaderboard(&pool, 2).await.unwrap();
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].user_id, high);
}

#[tokio::test]
async fn path_integrity_accepts_a_healthy_path() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 4).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();
    ProgressionService::complete_node(&pool, &balance, user_id, nodes[0].id, None)
        .await
        .unwrap();

    let report = PathIntegrityService::validate(&pool, user_id).await.unwrap();
    assert!(report.is_ok());
    assert_eq!(report.current_count, 1);
}

#[tokio::test]
async fn path_integrity_flags_duplicate_current_nodes() {
    let pool = test_pool().await;
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 4).await;
    ProgressionService::initialize_path(&pool, user_id)
        .await
        .unwrap();

    // Corrupt the path: a second node marked current, far past the frontier.
    NodeProgress::upsert_status(&pool, user_id, nodes[3].id, ProgressStatus::Current)
        .await
        .unwrap();

    let report = PathIntegrityService::validate(&pool, user_id).await.unwrap();
    assert!(!report.is_ok());
    assert_eq!(report.current_count, 2);
    assert!(!report.warnings.is_empty());
}

#[tokio::test]
async fn path_integrity_reports_uninitialized_paths() {
    let pool = test_pool().await;
    let user_id = seed_user(&pool).await;
    seed_nodes(&pool, 2).await;

    let report = PathIntegrityService::validate(&pool, user_id).await.unwrap();
    assert!(!report.is_initialized);
    assert!(!report.is_ok());
}
