//! Boundary to the editor session that actually places actors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What to spawn and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnRequest {
    pub asset_path: String,
    pub location: [f64; 3],
    /// `[pitch, yaw, roll]` in degrees.
    pub rotation: [f64; 3],
    pub label: Option<String>,
}

/// Result reported by a bridge; serializes with a `status` tag so it can be
/// returned as a skill result as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpawnOutcome {
    Success {
        actor_label: String,
        location: [f64; 3],
    },
    MockSuccess {
        msg: String,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        msg: String,
    },
}

impl SpawnOutcome {
    pub fn error(msg: impl Into<String>) -> Self {
        SpawnOutcome::Error {
            code: None,
            msg: msg.into(),
        }
    }
}

#[async_trait]
pub trait SpawnBridge: Send + Sync {
    async fn spawn_actor(&self, request: &SpawnRequest) -> SpawnOutcome;
}

/// Stand-in used when no editor is reachable. Always reports `mock_success`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockBridge;

#[async_trait]
impl SpawnBridge for MockBridge {
    async fn spawn_actor(&self, request: &SpawnRequest) -> SpawnOutcome {
        log::info!("Mock spawn of {} at {:?}", request.asset_path, request.location);
        SpawnOutcome::MockSuccess {
            msg: format!("Mock Spawn {} at {:?}", request.asset_path, request.location),
        }
    }
}
