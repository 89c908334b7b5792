use serde::Deserialize;

use crate::config::EngineConfig;
use crate::model::ChangeEvent;
use crate::snapshot::{DerivedCache, Snapshot};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: EngineConfig,
    pub snapshot: Option<Snapshot>,
    pub derived: DerivedCache,
    pub pending_events: Vec<ChangeEvent>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            snapshot: None,
            derived: DerivedCache::default(),
            pending_events: Vec::new(),
        }
    }

    /// Hands a change event to everything that derives from completion state.
    pub fn publish(&mut self, event: ChangeEvent) {
        tracing::info!(
            event_id = %event.id,
            kind = ?event.kind,
            participant = %event.participant_id,
            assessment_type = %event.assessment_type,
            author = event.author.as_deref().unwrap_or(""),
            "completion changed"
        );
        self.derived.invalidate(&event);
        self.pending_events.push(event);
    }
}
