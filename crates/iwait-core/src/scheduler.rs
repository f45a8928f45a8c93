//! Drives probe rounds until the strategy is satisfied, the timeout expires,
//! or the caller cancels.
//!
//! Lifecycle: `Idle -> Delayed -> Polling -> {Succeeded | TimedOut | Aborted}`.
//! The interval ticker, the timeout deadline and the cancellation listener
//! live in one [`Timers`] guard that is dropped exactly once, on the terminal
//! transition, before the result or error is produced.

use std::future::pending;
use std::time::Duration;

use futures::StreamExt;
use futures::stream;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::config::WaitConfig;
use crate::error::{WaitError, WaitOutcome};
use crate::probes::{ProbeRegistry, Prober};
use crate::resource::{ResourceDescriptor, parse_resources};
use crate::result::{ResourceState, WaitResult};

/// Scheduler lifecycle. Terminal phases are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Delayed,
    Polling,
    Succeeded,
    TimedOut,
    Aborted,
}

impl Phase {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::TimedOut | Self::Aborted)
    }
}

/// Why polling stopped before the strategy was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    TimedOut,
    Aborted,
}

/// Interval ticker, timeout deadline and cancellation listener, acquired
/// together and released together.
struct Timers {
    ticker: Interval,
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl Timers {
    /// The first tick fires once `delay` has elapsed, later ticks every
    /// `interval`. A delay or timeout too large to represent means "never".
    fn acquire(config: &WaitConfig, started: Instant) -> Self {
        let first = started
            .checked_add(config.delay)
            .unwrap_or_else(|| far_future(started));
        let mut ticker = interval_at(first, config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            ticker,
            deadline: config
                .timeout
                .and_then(|timeout| started.checked_add(timeout)),
            cancel: config.cancellation.clone(),
        }
    }

    /// Called after every round. A round that ran past the next start time
    /// skips that start: the next round begins one full `interval` after
    /// this one settled instead of immediately.
    fn settle(&mut self, round_started: Instant, interval: Duration) {
        if round_started.elapsed() >= interval {
            self.ticker.reset();
        }
    }

    /// Resolves when the operation is cancelled or its deadline passes.
    /// Cancellation wins when both are due.
    async fn interrupted(
        deadline: Option<Instant>,
        cancel: Option<&CancellationToken>,
    ) -> Interrupt {
        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => pending().await,
            }
        };
        let expired = async {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancelled => Interrupt::Aborted,
            _ = expired => Interrupt::TimedOut,
        }
    }
}

/// Roughly thirty years ahead; sleeping until then is the same as never waking.
fn far_future(from: Instant) -> Instant {
    const THIRTY_YEARS: Duration = Duration::from_secs(86_400 * 365 * 30);
    from.checked_add(THIRTY_YEARS).unwrap_or(from)
}

/// Waits using the built-in probes.
pub async fn wait(options: crate::config::WaitOptions) -> WaitOutcome {
    let config = options.resolve()?;
    let prober = ProbeRegistry::new(&config)?;
    wait_with(&config, &prober).await
}

/// Waits using a caller-supplied prober.
pub async fn wait_with<P>(config: &WaitConfig, prober: &P) -> WaitOutcome
where
    P: Prober + ?Sized,
{
    let descriptors = parse_resources(&config.resources)?;
    Poller::new(config, prober, descriptors).run().await
}

struct Poller<'a, P: ?Sized> {
    config: &'a WaitConfig,
    prober: &'a P,
    descriptors: Vec<ResourceDescriptor>,
    states: Vec<ResourceState>,
    phase: Phase,
    started: Instant,
    rounds: u64,
}

impl<'a, P> Poller<'a, P>
where
    P: Prober + ?Sized,
{
    fn new(config: &'a WaitConfig, prober: &'a P, descriptors: Vec<ResourceDescriptor>) -> Self {
        let states = descriptors
            .iter()
            .map(|descriptor| ResourceState::new(descriptor.original.clone()))
            .collect();
        Self {
            config,
            prober,
            descriptors,
            states,
            phase: Phase::Idle,
            started: Instant::now(),
            rounds: 0,
        }
    }

    async fn run(mut self) -> WaitOutcome {
        if self.states.is_empty() {
            self.phase = Phase::Succeeded;
            return Ok(WaitResult::empty());
        }

        let mut timers = Timers::acquire(self.config, self.started);
        self.phase = Phase::Delayed;
        if !self.config.delay.is_zero() {
            tracing::debug!(delay_ms = self.config.delay.as_millis() as u64, "delaying first round");
        }

        let interval = self.config.interval;
        loop {
            let deadline = timers.deadline;
            let cancel = timers.cancel.clone();
            let step = tokio::select! {
                biased;
                interrupt = Timers::interrupted(deadline, cancel.as_ref()) => Err(interrupt),
                complete = async {
                    timers.ticker.tick().await;
                    self.phase = Phase::Polling;
                    let round_started = Instant::now();
                    let complete = self.round().await;
                    timers.settle(round_started, interval);
                    complete
                } => Ok(complete),
            };
            match step {
                Ok(true) => return Ok(self.succeed(timers)),
                Ok(false) => {}
                Err(interrupt) => return self.interrupt(timers, interrupt),
            }
        }
    }

    /// Runs one round and reports whether the strategy is now satisfied.
    async fn round(&mut self) -> bool {
        self.rounds += 1;
        let round = self.rounds;
        let limit = self.config.simultaneous.unwrap_or(self.descriptors.len()).max(1);
        let stop_early = self.config.strategy.stops_on_first_ready();
        let prober = self.prober;
        let reverse = self.config.reverse;
        let verbose = self.config.verbose;

        let mut settled = stream::iter(self.descriptors.iter().enumerate())
            .map(|(index, descriptor)| async move {
                if verbose {
                    tracing::debug!(round, resource = %descriptor.original, kind = %descriptor.kind, "probing resource");
                }
                (index, prober.probe(descriptor).await)
            })
            .buffer_unordered(limit);

        while let Some((index, outcome)) = settled.next().await {
            let state = &mut self.states[index];
            if verbose {
                match &outcome {
                    Ok(verdict) => {
                        tracing::debug!(round, resource = %state.resource, verdict, reverse, "probe settled")
                    }
                    Err(err) => {
                        tracing::debug!(round, resource = %state.resource, error = %err, "probe failed")
                    }
                }
            }
            state.record(outcome, reverse, Instant::now());
            if stop_early && state.ready {
                // Pending siblings are dropped with the stream.
                self.log_progress(round);
                return true;
            }
        }

        self.log_progress(round);
        self.is_satisfied()
    }

    fn is_satisfied(&self) -> bool {
        let ready = self.states.iter().filter(|state| state.ready).count();
        self.config
            .strategy
            .is_satisfied(ready, self.states.len(), self.config.threshold)
    }

    fn pending(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|state| !state.ready)
            .map(|state| state.resource.clone())
            .collect()
    }

    fn log_progress(&self, round: u64) {
        if !self.config.log {
            return;
        }
        let pending = self.pending();
        if pending.is_empty() {
            tracing::info!(round, "all resources ready");
        } else {
            tracing::info!(
                round,
                waiting = pending.len(),
                resources = %pending.join(", "),
                "waiting for resources"
            );
        }
    }

    fn result(&self) -> WaitResult {
        WaitResult::from_states(&self.states, self.is_satisfied(), self.started.elapsed())
    }

    fn succeed(mut self, timers: Timers) -> WaitResult {
        drop(timers);
        self.transition(Phase::Succeeded);
        let result = self.result();
        if self.config.log {
            tracing::info!(
                rounds = self.rounds,
                elapsed_ms = result.elapsed.as_millis() as u64,
                strategy = %self.config.strategy,
                "wait completed"
            );
        }
        result
    }

    fn interrupt(mut self, timers: Timers, interrupt: Interrupt) -> WaitOutcome {
        drop(timers);
        match interrupt {
            Interrupt::Aborted => {
                self.transition(Phase::Aborted);
                let elapsed = self.started.elapsed();
                tracing::info!(rounds = self.rounds, elapsed_ms = elapsed.as_millis() as u64, "wait aborted");
                Err(WaitError::Aborted { elapsed })
            }
            Interrupt::TimedOut => {
                self.transition(Phase::TimedOut);
                let result = self.result();
                let pending = result.not_ready.clone();
                tracing::warn!(
                    rounds = self.rounds,
                    pending = %pending.join(", "),
                    "timed out waiting for resources"
                );
                Err(WaitError::Timeout {
                    timeout: self.config.timeout.unwrap_or_default(),
                    pending,
                    result,
                })
            }
        }
    }

    fn transition(&mut self, next: Phase) {
        debug_assert!(!self.phase.is_terminal(), "terminal phase {:?} re-entered", self.phase);
        self.phase = next;
    }
}
