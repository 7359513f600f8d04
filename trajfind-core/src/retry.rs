use crate::config::{DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS, LocatorConfig};
use crate::error::ConfigError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};
use trajfind_scanner::TrajectoryRecord;

pub type FoundCallback = Arc<dyn Fn(TrajectoryRecord) + Send + Sync>;
pub type NotFoundCallback = Arc<dyn Fn(u32) + Send + Sync>;
/// Called before each attempt with `(attempt, max_attempts)`.
pub type AttemptCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// One search of the host graph.
pub trait TrajectoryProbe: Send {
    fn probe(&mut self) -> Option<TrajectoryRecord>;
}

impl<F> TrajectoryProbe for F
where
    F: FnMut() -> Option<TrajectoryRecord> + Send,
{
    fn probe(&mut self) -> Option<TrajectoryRecord> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Succeeded,
    Exhausted,
    Stopped,
}

impl SchedulerState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SchedulerState::Succeeded | SchedulerState::Exhausted | SchedulerState::Stopped
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Found {
        record: TrajectoryRecord,
        attempt: u32,
    },
    Exhausted {
        attempts: u32,
    },
    Stopped {
        attempts: u32,
    },
    /// `start` was called while the scheduler was not idle.
    Ignored(SchedulerState),
}

/// Fixed-interval retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(max_attempts));
        }
        if interval.is_zero() {
            return Err(ConfigError::InvalidInterval(0));
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }

    pub fn from_config(config: &LocatorConfig) -> Result<Self, ConfigError> {
        Self::new(config.max_attempts, config.interval())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RunSlot {
    state: SchedulerState,
    /// Bumped by every accepted `start`. A run only keeps going while its
    /// generation is current and the state is `Running`.
    generation: u64,
}

/// Repeats a probe on a fixed interval until it finds a record or the
/// budget runs out.
///
/// The scheduler is a small state machine: `start` only runs from `Idle`,
/// so duplicate lifecycle signals cannot launch a second concurrent run.
/// Terminal schedulers stay terminal until [`RetryScheduler::reset`].
pub struct RetryScheduler {
    policy: RetryPolicy,
    probe: Mutex<Box<dyn TrajectoryProbe>>,
    slot: Mutex<RunSlot>,
    attempts_made: AtomicU32,
    /// Generation of the run allowed to continue, 0 when none is.
    active_tx: watch::Sender<u64>,
    found_callback: Option<FoundCallback>,
    not_found_callback: Option<NotFoundCallback>,
    attempt_callback: Option<AttemptCallback>,
}

impl RetryScheduler {
    pub fn new<F>(policy: RetryPolicy, probe: F) -> Self
    where
        F: FnMut() -> Option<TrajectoryRecord> + Send + 'static,
    {
        Self::with_probe(policy, Box::new(probe))
    }

    pub fn with_probe(policy: RetryPolicy, probe: Box<dyn TrajectoryProbe>) -> Self {
        let (active_tx, _) = watch::channel(0);
        Self {
            policy,
            probe: Mutex::new(probe),
            slot: Mutex::new(RunSlot {
                state: SchedulerState::Idle,
                generation: 0,
            }),
            attempts_made: AtomicU32::new(0),
            active_tx,
            found_callback: None,
            not_found_callback: None,
            attempt_callback: None,
        }
    }

    pub fn with_found_callback(mut self, callback: FoundCallback) -> Self {
        self.found_callback = Some(callback);
        self
    }

    pub fn with_not_found_callback(mut self, callback: NotFoundCallback) -> Self {
        self.not_found_callback = Some(callback);
        self
    }

    pub fn with_attempt_callback(mut self, callback: AttemptCallback) -> Self {
        self.attempt_callback = Some(callback);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn state(&self) -> SchedulerState {
        self.lock_slot().state
    }

    /// Misses counted in the current (or last) run.
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made.load(Ordering::SeqCst)
    }

    /// Run the search to a terminal state.
    ///
    /// The first attempt happens immediately. Between attempts the task
    /// sleeps on the tokio timer, leaving the executor free.
    pub async fn start(&self) -> RunOutcome {
        let generation = {
            let mut slot = self.lock_slot();
            if slot.state != SchedulerState::Idle {
                debug!("Scheduler is {:?}, ignoring start", slot.state);
                return RunOutcome::Ignored(slot.state);
            }
            slot.state = SchedulerState::Running;
            slot.generation += 1;
            self.attempts_made.store(0, Ordering::SeqCst);
            self.active_tx.send_replace(slot.generation);
            slot.generation
        };
        let mut active_rx = self.active_tx.subscribe();

        let max_attempts = self.policy.max_attempts;
        info!("Starting trajectory search ({} attempts, {:?} apart)", max_attempts, self.policy.interval);

        let mut made = 0;
        loop {
            let found = {
                // Held across the check so a superseded run cannot probe
                // after a newer one has taken over
                let mut probe = self.lock_probe();
                if !self.is_current(generation) {
                    return RunOutcome::Stopped { attempts: made };
                }

                let attempt = made + 1;
                debug!("Attempt {} of {}", attempt, max_attempts);
                if let Some(ref callback) = self.attempt_callback {
                    callback(attempt, max_attempts);
                }
                probe.probe()
            };

            if let Some(record) = found {
                let attempt = made + 1;
                if !self.finish(generation, SchedulerState::Succeeded) {
                    return RunOutcome::Stopped { attempts: made };
                }
                info!("Successfully found trajectory data at {}", record.location());
                if let Some(ref callback) = self.found_callback {
                    callback(record.clone());
                }
                return RunOutcome::Found { record, attempt };
            }

            made += 1;
            if !self.record_miss(generation, made) {
                return RunOutcome::Stopped { attempts: made };
            }
            if made >= max_attempts {
                if !self.finish(generation, SchedulerState::Exhausted) {
                    return RunOutcome::Stopped { attempts: made };
                }
                error!("Failed to find trajectory data after {} attempts", made);
                if let Some(ref callback) = self.not_found_callback {
                    callback(made);
                }
                return RunOutcome::Exhausted { attempts: made };
            }

            debug!("Trajectory not found, retrying in {:?}", self.policy.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.policy.interval) => {}
                _ = active_rx.wait_for(|active| *active != generation) => {
                    info!("Trajectory search stopped after {} attempts", made);
                    return RunOutcome::Stopped { attempts: made };
                }
            }
        }
    }

    /// Stop a running search. A pending attempt never fires.
    ///
    /// Returns false when there was no run to stop.
    pub fn stop(&self) -> bool {
        let mut slot = self.lock_slot();
        if slot.state != SchedulerState::Running {
            return false;
        }
        slot.state = SchedulerState::Stopped;
        self.active_tx.send_replace(0);
        true
    }

    /// Return a finished scheduler to `Idle` so it can be started again.
    ///
    /// A stopped run that is still winding down stays stopped: the next
    /// `start` opens a new generation.
    pub fn reset(&self) -> bool {
        let mut slot = self.lock_slot();
        if !slot.state.is_terminal() {
            return false;
        }
        slot.state = SchedulerState::Idle;
        self.attempts_made.store(0, Ordering::SeqCst);
        true
    }

    fn is_current(&self, generation: u64) -> bool {
        let slot = self.lock_slot();
        slot.generation == generation && slot.state == SchedulerState::Running
    }

    fn record_miss(&self, generation: u64, made: u32) -> bool {
        let slot = self.lock_slot();
        if slot.generation != generation || slot.state != SchedulerState::Running {
            return false;
        }
        self.attempts_made.store(made, Ordering::SeqCst);
        true
    }

    fn finish(&self, generation: u64, to: SchedulerState) -> bool {
        let mut slot = self.lock_slot();
        if slot.generation != generation || slot.state != SchedulerState::Running {
            return false;
        }
        slot.state = to;
        true
    }

    fn lock_slot(&self) -> MutexGuard<'_, RunSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_probe(&self) -> MutexGuard<'_, Box<dyn TrajectoryProbe>> {
        self.probe.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(uuid: &str) -> TrajectoryRecord {
        TrajectoryRecord::from_value(json!({"uuid": uuid, "steps": []}), "test.questions.q")
            .unwrap()
    }

    fn policy(max_attempts: u32, interval_ms: u64) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(interval_ms)).unwrap()
    }

    #[test]
    fn test_policy_rejects_zero_values() {
        assert!(matches!(
            RetryPolicy::new(0, Duration::from_millis(10)),
            Err(ConfigError::InvalidMaxAttempts(0))
        ));
        assert!(matches!(
            RetryPolicy::new(3, Duration::ZERO),
            Err(ConfigError::InvalidInterval(0))
        ));
    }

    #[test]
    fn test_policy_from_config() {
        let config = LocatorConfig {
            max_attempts: 4,
            interval_ms: 25,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config).unwrap();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(policy.interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SchedulerState::Idle.is_terminal());
        assert!(!SchedulerState::Running.is_terminal());
        assert!(SchedulerState::Succeeded.is_terminal());
        assert!(SchedulerState::Exhausted.is_terminal());
        assert!(SchedulerState::Stopped.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success() {
        let scheduler = RetryScheduler::new(policy(5, 100), || Some(record("now")));
        let outcome = scheduler.start().await;

        assert_eq!(outcome, RunOutcome::Found { record: record("now"), attempt: 1 });
        assert_eq!(scheduler.state(), SchedulerState::Succeeded);
        assert_eq!(scheduler.attempts_made(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_allows_restart() {
        let scheduler = RetryScheduler::new(policy(1, 10), || None);
        assert_eq!(scheduler.start().await, RunOutcome::Exhausted { attempts: 1 });
        assert_eq!(
            scheduler.start().await,
            RunOutcome::Ignored(SchedulerState::Exhausted)
        );

        assert!(scheduler.reset());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.start().await, RunOutcome::Exhausted { attempts: 1 });
    }

    #[test]
    fn test_reset_and_stop_on_idle_are_noops() {
        let scheduler = RetryScheduler::new(policy(1, 10), || None);
        assert!(!scheduler.reset());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }
}
