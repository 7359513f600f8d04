use crate::retry::{RetryScheduler, RunOutcome};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Host document readiness at the moment the bootstrapper is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Document parsing finished.
    DomContentLoaded,
    /// Every resource finished loading.
    Load,
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleSignal::DomContentLoaded => write!(f, "DOMContentLoaded"),
            LifecycleSignal::Load => write!(f, "load"),
        }
    }
}

/// Which lifecycle signals may start the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPolicy {
    /// Whichever of DOMContentLoaded or load arrives first
    FirstSignal,
    /// Only the full page load
    LoadOnly,
}

/// Decides when the shared scheduler starts.
///
/// Every accepted signal calls `start`; the scheduler's state machine turns
/// the second and later calls into no-ops.
pub struct Bootstrapper {
    scheduler: Arc<RetryScheduler>,
    policy: StartPolicy,
}

impl Bootstrapper {
    pub fn new(scheduler: Arc<RetryScheduler>, policy: StartPolicy) -> Self {
        Self { scheduler, policy }
    }

    pub fn scheduler(&self) -> &Arc<RetryScheduler> {
        &self.scheduler
    }

    /// Start right away when the document is already complete.
    ///
    /// Returns `None` when the caller should wait for lifecycle signals.
    pub async fn attach(&self, ready_state: ReadyState) -> Option<RunOutcome> {
        if ready_state == ReadyState::Complete {
            debug!("Document already complete, initializing immediately");
            Some(self.scheduler.start().await)
        } else {
            debug!("Document {:?}, waiting for lifecycle signals", ready_state);
            None
        }
    }

    pub fn accepts(&self, signal: LifecycleSignal) -> bool {
        match self.policy {
            StartPolicy::FirstSignal => true,
            StartPolicy::LoadOnly => signal == LifecycleSignal::Load,
        }
    }

    pub async fn signal(&self, signal: LifecycleSignal) -> RunOutcome {
        if !self.accepts(signal) {
            debug!("{} fired, not a start signal under {:?}", signal, self.policy);
            return RunOutcome::Ignored(self.scheduler.state());
        }
        debug!("{} fired", signal);
        self.scheduler.start().await
    }
}
