//! Deletion Dispatcher
//!
//! Fans one [`DeletionIntent`] out to every registered target. Deletions are
//! issued concurrently and each target yields its own [`TargetResult`]; a
//! failing target never stops the others and is never reported back to the
//! webhook caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tombsync_core::types::DeletionIntent;
use tracing::{info, warn};

use crate::metrics;
use crate::registry::{RegisteredTarget, TargetRegistry};

/// What happened on one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Deleted,
    DryRunSkipped,
    Failed(String),
}

impl TargetOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, TargetOutcome::Failed(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetOutcome::Deleted => "deleted",
            TargetOutcome::DryRunSkipped => "dry_run",
            TargetOutcome::Failed(_) => "failed",
        }
    }
}

/// Result of a dispatch on one target
#[derive(Debug, Clone)]
pub struct TargetResult {
    pub target: String,
    pub host: String,
    pub outcome: TargetOutcome,
    pub duration: Duration,
}

/// Per-target results of one dispatch
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub intent: DeletionIntent,
    pub results: Vec<TargetResult>,
}

impl DispatchOutcome {
    pub fn deleted(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &TargetResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.outcome.is_success())
    }

    /// One summary line for the whole dispatch; per-target failures are
    /// logged as they happen.
    pub fn log_summary(&self) {
        if self.all_succeeded() {
            info!(targets = self.results.len(), "Deleted {}", self.intent);
        } else {
            warn!(
                deleted = self.deleted(),
                failed = self.results.len() - self.deleted(),
                "Partially replicated delete of {}",
                self.intent
            );
        }
    }
}

/// Applies deletions to all targets of a registry
#[derive(Debug, Clone)]
pub struct DeletionDispatcher {
    registry: Arc<TargetRegistry>,
    dry_run: bool,
}

impl DeletionDispatcher {
    pub fn new(registry: Arc<TargetRegistry>, dry_run: bool) -> Self {
        Self { registry, dry_run }
    }

    /// Delete the intent's object from every target
    pub async fn dispatch(&self, intent: &DeletionIntent) -> DispatchOutcome {
        let results = join_all(
            self.registry
                .iter()
                .map(|target| self.delete_on(target, intent)),
        )
        .await;

        let outcome = DispatchOutcome {
            intent: intent.clone(),
            results,
        };
        outcome.log_summary();
        outcome
    }

    async fn delete_on(&self, registered: &RegisteredTarget, intent: &DeletionIntent) -> TargetResult {
        let target = &registered.target;
        let start = Instant::now();

        let outcome = if self.dry_run {
            info!(target_name = %target.name, "(dry run) delete {}", intent);
            TargetOutcome::DryRunSkipped
        } else {
            match registered
                .store
                .delete_object(&intent.bucket, &intent.object_key, intent.version_id())
                .await
            {
                Ok(()) => TargetOutcome::Deleted,
                Err(e) => {
                    warn!(
                        target_name = %target.name,
                        remote = e.is_remote(),
                        "unable to delete the object: {} from site {}; {}",
                        intent.object_key,
                        target.host(),
                        e
                    );
                    TargetOutcome::Failed(e.to_string())
                }
            }
        };

        let duration = start.elapsed();
        metrics::record_deletion(&target.name, outcome.as_str(), duration.as_secs_f64());

        TargetResult {
            target: target.name.clone(),
            host: target.host(),
            outcome,
            duration,
        }
    }
}
