//! Read-only checks of the per-user path invariants.

use db::models::node_progress::{NodeProgress, PathEntry, ProgressStatus};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PathIntegrityError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of validating one user's path. Never mutates anything; anomalies
/// are reported as warnings for an operator to act on.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PathIntegrityReport {
    pub is_initialized: bool,
    pub current_count: i64,
    pub warnings: Vec<String>,
}

impl PathIntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.warnings.is_empty()
    }
}

pub struct PathIntegrityService;

impl PathIntegrityService {
    /// Check that exactly one node is `current` among the non-completed rows
    /// and that nothing is unlocked beyond the node after the furthest
    /// completed one.
    pub async fn validate(
        pool: &SqlitePool,
        user_id: Uuid,
    ) -> Result<PathIntegrityReport, PathIntegrityError> {
        // Ordered by sequence day.
        let entries = NodeProgress::path_for_user(pool, user_id).await?;

        if entries.is_empty() {
            return Ok(PathIntegrityReport {
                is_initialized: false,
                current_count: 0,
                warnings: vec!["no progress rows; path has not been initialized".to_string()],
            });
        }

        let mut warnings = Vec::new();

        let current_count = entries
            .iter()
            .filter(|e| e.status == ProgressStatus::Current)
            .count() as i64;
        let all_completed = entries
            .iter()
            .all(|e| e.status == ProgressStatus::Completed);

        if all_completed {
            if current_count != 0 {
                warnings.push(format!(
                    "path fully completed but {current_count} node(s) still marked current"
                ));
            }
        } else if current_count != 1 {
            warnings.push(format!(
                "expected exactly one current node, found {current_count}"
            ));
        }

        // Nothing may be unlocked beyond the position right after the
        // furthest completed node.
        let furthest_completed = entries
            .iter()
            .rposition(|e| e.status == ProgressStatus::Completed);
        let unlock_limit = furthest_completed.map(|p| p + 1).unwrap_or(0);
        for (position, entry) in entries.iter().enumerate() {
            let unlocked = matches!(
                entry.status,
                ProgressStatus::Available | ProgressStatus::Current
            );
            if unlocked && position > unlock_limit {
                warnings.push(unlocked_too_far(entry, position, unlock_limit));
            }
        }

        if warnings.is_empty() {
            info!(user_id = %user_id, "path integrity ok");
        } else {
            warn!(user_id = %user_id, warnings = warnings.len(), "path integrity anomalies found");
        }

        Ok(PathIntegrityReport {
            is_initialized: true,
            current_count,
            warnings,
        })
    }
}

fn unlocked_too_far(entry: &PathEntry, position: usize, unlock_limit: usize) -> String {
    format!(
        "node at day {} ({} in sequence) is {} but the unlock frontier is position {}",
        entry.sequence_day, position, entry.status, unlock_limit
    )
}
