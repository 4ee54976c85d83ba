//! Routes settle events into the rule engine

use crate::debounce::SettleHandler;
use crate::{EventKind, SettleEvent};
use crossbeam_channel::Sender;
use rules::RuleEngine;
use tidy_core::{ActionResult, ActionStatus};
use tracing::{debug, error, info, warn};

/// Settle handler that applies the first matching rule
pub struct RuleDispatcher {
    engine: RuleEngine,
    /// Optional sink for produced results (audit trail, tests)
    results: Option<Sender<ActionResult>>,
}

impl RuleDispatcher {
    pub fn new(engine: RuleEngine) -> Self {
        Self {
            engine,
            results: None,
        }
    }

    /// Forward every produced result on `results`
    pub fn with_results(mut self, results: Sender<ActionResult>) -> Self {
        self.results = Some(results);
        self
    }
}

impl SettleHandler for RuleDispatcher {
    fn on_settle(&self, event: SettleEvent) {
        let content_type = match (event.kind, event.content_type.as_deref()) {
            (EventKind::Deleted, _) => {
                info!("File deleted: {}", event.path.display());
                return;
            }
            (_, Some(content_type)) => content_type,
            (kind, None) => {
                debug!("No content type for {} file {}", kind, event.path.display());
                return;
            }
        };

        info!(
            "File {}: {} ({})",
            event.kind,
            event.path.display(),
            content_type
        );

        let Some(result) = self.engine.evaluate(&event.path, content_type) else {
            return;
        };

        log_result(&result);

        if let Some(results) = &self.results {
            if results.send(result).is_err() {
                debug!("Result receiver dropped");
            }
        }
    }
}

/// Log a result at a level matching its status
pub fn log_result(result: &ActionResult) {
    match result.status {
        ActionStatus::Success => info!("Action log: {}", result),
        ActionStatus::Fail => warn!("Action log: {}", result),
        ActionStatus::Error => error!("Action log: {}", result),
    }
}
