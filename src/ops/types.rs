// Status and snapshot types for tracked operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of one tracked operation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// No run has started yet, or the record was reset.
    Idle,
    /// A run is in flight.
    Running,
    /// The last run completed successfully.
    Succeeded,
    /// The last run failed with an error.
    Failed,
    /// The last run was cancelled before settling.
    Cancelled,
}

impl OperationStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, OperationStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Succeeded | OperationStatus::Failed | OperationStatus::Cancelled
        )
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Idle => write!(f, "idle"),
            OperationStatus::Running => write!(f, "running"),
            OperationStatus::Succeeded => write!(f, "succeeded"),
            OperationStatus::Failed => write!(f, "failed"),
            OperationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Point-in-time copy of a coordinator's tracked record.
///
/// `error` is set only when the status is `Failed`; `ended_at` only once a
/// terminal transition happened. Field casing matches the mobile API's JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSnapshot {
    pub run_id: Option<Uuid>,
    pub status: OperationStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Notification delivered to subscribers on transitions and progress updates.
#[derive(Debug, Clone, Serialize)]
pub struct OperationEvent {
    pub run_id: Uuid,
    pub status: OperationStatus,
    pub progress: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(OperationStatus::Running.is_active());
        assert!(!OperationStatus::Idle.is_active());

        assert!(OperationStatus::Succeeded.is_terminal());
        assert!(OperationStatus::Failed.is_terminal());
        assert!(OperationStatus::Cancelled.is_terminal());
        assert!(!OperationStatus::Idle.is_terminal());
        assert!(!OperationStatus::Running.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OperationStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
        let back: OperationStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(back, OperationStatus::Cancelled);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = OperationSnapshot {
            run_id: None,
            status: OperationStatus::Idle,
            progress: 0,
            error: None,
            started_at: None,
            ended_at: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("runId"));
        assert!(object.contains_key("startedAt"));
        assert!(object.contains_key("endedAt"));
    }
}
