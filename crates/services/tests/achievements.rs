mod common;

use common::{seed_nodes, seed_user, test_pool};
use db::models::{
    badge::{Badge, BadgeType},
    node_progress::{NodeProgress, ProgressStatus},
    user_profile::UserProfile,
};
use services::services::{achievements::AchievementService, balance::BalanceConfig};
use uuid::Uuid;

#[tokio::test]
async fn fresh_user_earns_no_badges() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;

    let awarded = AchievementService::check_and_award(&pool, &balance, user_id).await;
    assert!(awarded.is_empty());
}

#[tokio::test]
async fn second_check_with_no_state_change_returns_nothing() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    let nodes = seed_nodes(&pool, 2).await;

    // One completed unit, written directly so the evaluator runs first here.
    NodeProgress::upsert_status(&pool, user_id, nodes[0].id, ProgressStatus::Current)
        .await
        .unwrap();
    NodeProgress::complete(&pool, user_id, nodes[0].id, 10, None)
        .await
        .unwrap();

    let first = AchievementService::check_and_award(&pool, &balance, user_id).await;
    assert_eq!(first, vec!["First Steps".to_string()]);

    let second = AchievementService::check_and_award(&pool, &balance, user_id).await;
    assert!(second.is_empty());
}

#[tokio::test]
async fn badge_uniqueness_holds_at_the_storage_layer() {
    let pool = test_pool().await;
    let user_id = seed_user(&pool).await;

    let first = Badge::award(&pool, user_id, BadgeType::FirstSteps).await.unwrap();
    assert!(first.is_some());

    let second = Badge::award(&pool, user_id, BadgeType::FirstSteps).await.unwrap();
    assert!(second.is_none());

    let held = Badge::find_by_user(&pool, user_id).await.unwrap();
    assert_eq!(held.len(), 1);
}

#[tokio::test]
async fn insight_thresholds_award_both_tiers() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;
    UserProfile::add_insights(&pool, user_id, 500).await.unwrap();

    let awarded = AchievementService::check_and_award(&pool, &balance, user_id).await;
    assert!(awarded.iter().any(|b| b == "Insight Collector"));
    assert!(awarded.iter().any(|b| b == "Insight Sage"));
}

#[tokio::test]
async fn unknown_user_yields_no_awards() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();

    let awarded = AchievementService::check_and_award(&pool, &balance, Uuid::new_v4()).await;
    assert!(awarded.is_empty());
}

#[tokio::test]
async fn streak_badges_fire_at_their_thresholds() {
    let pool = test_pool().await;
    let balance = BalanceConfig::default();
    let user_id = seed_user(&pool).await;

    sqlx::query("UPDATE user_profiles SET streak = $2 WHERE id = $1")
        .bind(user_id)
        .bind(7i64)
        .execute(&pool)
        .await
        .unwrap();

    let awarded = AchievementService::check_and_award(&pool, &balance, user_id).await;
    assert_eq!(awarded, vec!["Dedicated".to_string()]);
}
