//! Polling loop.
//!
//! Each cycle signs in if needed, walks the projects in the order the API
//! returned them, publishes each balance as soon as it arrives, and then
//! sleeps. The first failure ends the cycle early; balances published before
//! it stay published. Failed cycles sleep for the retry interval instead of
//! the normal one.
//!
//! ```text
//! Idle -> Authenticating -> Fetching -> Publishing -> Sleeping -> Idle
//!              |                |                        ^
//!              +----------------+--- failure ------------+ (retry interval)
//! ```

use std::sync::Arc;
use std::time::Duration;

use mcsbalance_core::Redactor;
use mcsbalance_fetch::{AuthError, BalanceSource, FetchError};
use mcsbalance_store::BalanceGauges;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// Settings
// ============================================================================

/// Default interval between successful cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Default interval after a failed cycle.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Default number of consecutive failures that triggers a report.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Timing of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Sleep after a successful cycle.
    pub interval: Duration,
    /// Sleep after a failed cycle.
    pub retry_interval: Duration,
    /// Consecutive failures before the retry-limit report fires.
    pub retry_limit: u32,
}

impl PollSettings {
    /// Returns how long to sleep before the next cycle.
    pub fn delay(&self, next: NextPoll) -> Duration {
        match next {
            NextPoll::Interval => self.interval,
            NextPoll::Retry { .. } => self.retry_interval,
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Why a cycle failed.
#[derive(Debug, Error)]
pub enum PollError {
    /// Sign-in failed.
    #[error("authentication failed")]
    Auth(#[from] AuthError),

    /// A project's balance could not be fetched.
    #[error("fetching balance of project {project} failed")]
    Fetch {
        /// Id of the project that failed.
        project: String,
        /// The underlying error.
        #[source]
        source: FetchError,
    },
}

/// Result of one cycle.
#[derive(Debug)]
pub enum PollOutcome {
    /// Every project was fetched and published.
    Success {
        /// Number of balances published.
        published: usize,
    },
    /// The cycle stopped at the first failure.
    Failure(PollError),
}

impl PollOutcome {
    /// Returns true for [`PollOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success { .. })
    }
}

// ============================================================================
// Retry State
// ============================================================================

/// What the loop does after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPoll {
    /// Sleep the normal interval.
    Interval,
    /// Sleep the retry interval.
    Retry {
        /// Consecutive failures including this one.
        attempt: u32,
        /// The failure count reached the limit and was reset.
        limit_exceeded: bool,
    },
}

/// Consecutive failure counter.
///
/// The count is always below the limit between cycles: reaching the limit
/// reports and resets it in the same step. The limit never stops polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    consecutive_failures: u32,
    limit: u32,
}

impl RetryState {
    /// Creates a counter. A zero limit is treated as one.
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive_failures: 0,
            limit: limit.max(1),
        }
    }

    /// Current number of consecutive failures.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Configured limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records a cycle outcome.
    pub fn record(&mut self, outcome: &PollOutcome) -> NextPoll {
        if outcome.is_success() {
            self.record_success()
        } else {
            self.record_failure()
        }
    }

    /// Records a successful cycle.
    pub fn record_success(&mut self) -> NextPoll {
        self.consecutive_failures = 0;
        NextPoll::Interval
    }

    /// Records a failed cycle.
    pub fn record_failure(&mut self) -> NextPoll {
        self.consecutive_failures += 1;
        let attempt = self.consecutive_failures;
        let limit_exceeded = attempt >= self.limit;
        if limit_exceeded {
            self.consecutive_failures = 0;
        }
        NextPoll::Retry {
            attempt,
            limit_exceeded,
        }
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Drives balance updates forever.
pub struct Poller<S> {
    source: S,
    gauges: Arc<BalanceGauges>,
    settings: PollSettings,
    retry: RetryState,
    redactor: Redactor,
}

impl<S: BalanceSource> Poller<S> {
    /// Creates a poller publishing into `gauges`.
    pub fn new(
        source: S,
        gauges: Arc<BalanceGauges>,
        settings: PollSettings,
        redactor: Redactor,
    ) -> Self {
        Self {
            source,
            gauges,
            retry: RetryState::new(settings.retry_limit),
            settings,
            redactor,
        }
    }

    /// Returns the retry counter.
    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    /// Runs one cycle without sleeping or touching the retry counter.
    pub async fn poll_once(&self) -> PollOutcome {
        if let Err(e) = self.source.ensure_authenticated().await {
            return PollOutcome::Failure(e.into());
        }

        let projects = self.source.projects().await;
        info!(projects = projects.len(), "Updating balances");

        for project in &projects {
            match self.source.fetch_balance(&project.id).await {
                Ok(balance) => self.gauges.set(&project.title, balance),
                Err(source) => {
                    return PollOutcome::Failure(PollError::Fetch {
                        project: project.id.clone(),
                        source,
                    });
                }
            }
        }

        PollOutcome::Success {
            published: projects.len(),
        }
    }

    /// Runs one cycle, updates the retry counter, and returns the delay
    /// before the next one.
    pub async fn cycle(&mut self) -> Duration {
        let outcome = self.poll_once().await;
        let next = self.retry.record(&outcome);

        match &outcome {
            PollOutcome::Success { published } => {
                debug!(published, "Balances updated");
            }
            PollOutcome::Failure(error) => {
                warn!(
                    error = %self.redactor.redact_error(error),
                    "Balance update failed"
                );
            }
        }

        let delay = self.settings.delay(next);
        if let NextPoll::Retry {
            attempt,
            limit_exceeded,
        } = next
        {
            if limit_exceeded {
                warn!(
                    limit = self.retry.limit(),
                    "Retry limit {} has been exceeded",
                    self.retry.limit()
                );
            }
            info!(
                attempt,
                delay_secs = delay.as_secs(),
                "Request will retry after {} seconds",
                delay.as_secs()
            );
        }
        delay
    }

    /// Polls until the process exits.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.settings.interval.as_secs(),
            retry_interval_secs = self.settings.retry_interval.as_secs(),
            retry_limit = self.retry.limit(),
            "Balance poller started"
        );
        loop {
            let delay = self.cycle().await;
            tokio::time::sleep(delay).await;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
