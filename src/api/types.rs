//! Shared state for the HTTP layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::diagnosis::{Diagnoser, KnowledgeBase};

/// Shared context for all routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    /// Strategy answering `/diagnose`. May block; call via `spawn_blocking`.
    pub diagnoser: Arc<dyn Diagnoser>,
    /// Knowledge base backing `/conditions` and `/health`.
    pub knowledge: Arc<KnowledgeBase>,
    pub lexicon_available: bool,
    pub started_at: DateTime<Utc>,
}

impl ApiContext {
    pub fn new(
        diagnoser: Arc<dyn Diagnoser>,
        knowledge: Arc<KnowledgeBase>,
        lexicon_available: bool,
    ) -> Self {
        Self {
            diagnoser,
            knowledge,
            lexicon_available,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
