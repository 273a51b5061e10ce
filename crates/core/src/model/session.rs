use serde::{Deserialize, Serialize};

use crate::model::{SessionId, UserId};

/// Provider-side session record. Status and score are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub status: String,
    pub score: f64,
}
