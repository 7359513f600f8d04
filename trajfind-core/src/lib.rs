pub mod bootstrap;
pub mod config;
pub mod error;
pub mod locate;
pub mod report;
pub mod retry;

pub use bootstrap::{Bootstrapper, LifecycleSignal, ReadyState, StartPolicy};
pub use config::{ConfigLoader, LocatorConfig, LogLevel, Strategy};
pub use error::{ConfigError, LocateError};
pub use locate::TrajectoryLocator;
pub use retry::{
    AttemptCallback, FoundCallback, NotFoundCallback, RetryPolicy, RetryScheduler, RunOutcome,
    SchedulerState, TrajectoryProbe,
};

pub use trajfind_scanner::{HostNode, HostValue, TrajectoryRecord};
