use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::store::SessionStore;
use crate::tracking::engine::EngineSnapshot;
use crate::tracking::models::{ActivityKind, ActivitySession, ActivityState};
use crate::tracking::{ChannelSource, TrackingEngine};

/// Shared state of the HTTP surface: one engine fed by one push source.
pub struct SessionsState {
    pub engine: TrackingEngine,
    pub source: Arc<ChannelSource>,
    pub store: SessionStore,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StartRequest {
    pub kind: ActivityKind,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    pub state: ActivityState,
    pub session: Option<ActivitySession>,
}

impl From<EngineSnapshot> for SessionView {
    fn from(snapshot: EngineSnapshot) -> Self {
        Self {
            state: snapshot.state,
            session: snapshot.session.map(|session| (*session).clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl ToString) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
