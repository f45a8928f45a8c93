use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use iwait_core::{
    ProbeError, Prober, ResourceDescriptor, ResourceKind, WaitError, WaitOptions, wait, wait_with,
};
use tokio_util::sync::CancellationToken;

/// Reports each resource ready after a fixed number of probes.
struct Countdown {
    remaining: HashMap<String, usize>,
    calls: AtomicUsize,
}

#[async_trait]
impl Prober for Countdown {
    async fn probe(&self, resource: &ResourceDescriptor) -> Result<bool, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if resource.kind == ResourceKind::Ping {
            return Err(ProbeError::Command {
                command: "ping".into(),
                reason: "not allowed in tests".into(),
            });
        }
        let needed = self.remaining.get(&resource.original).copied().unwrap_or(0);
        Ok(call >= needed)
    }
}

#[tokio::test(start_paused = true)]
async fn library_callers_can_supply_their_own_prober() -> Result<()> {
    let prober = Countdown {
        remaining: HashMap::from([("tcp:9000".to_string(), 3)]),
        calls: AtomicUsize::new(0),
    };
    let config = WaitOptions::new(["tcp:9000", "ping:db"])
        .with_interval(Duration::from_millis(100))
        .with_strategy(iwait_core::Strategy::Any)
        .resolve()?;

    let result = wait_with(&config, &prober).await?;
    assert!(result.success);
    assert_eq!(result.ready, vec!["tcp:9000"]);
    assert!(matches!(
        result.errors.get("ping:db"),
        Some(ProbeError::Command { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn cancellation_aborts_a_pending_wait() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let options = WaitOptions::new(["dir:/definitely/not/a/real/dir"])
        .with_interval(Duration::from_millis(20))
        .with_cancellation(token);
    match wait(options).await {
        Err(WaitError::Aborted { elapsed }) => {
            assert!(elapsed >= Duration::from_millis(100));
        }
        other => panic!("expected abort, got {other:?}"),
    }
}

/// Never answers within a test's lifetime.
#[derive(Default)]
struct Stalled {
    started: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait]
impl Prober for Stalled {
    async fn probe(&self, _resource: &ResourceDescriptor) -> Result<bool, ProbeError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

#[tokio::test]
async fn cancellation_interrupts_a_check_in_flight() -> Result<()> {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let prober = Stalled::default();
    let config = WaitOptions::new(["tcp:9000"])
        .with_cancellation(token)
        .resolve()?;
    match wait_with(&config, &prober).await {
        Err(WaitError::Aborted { elapsed }) => {
            assert!(elapsed >= Duration::from_millis(100));
            assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(prober.started.load(Ordering::SeqCst), 1);
    assert_eq!(prober.finished.load(Ordering::SeqCst), 0);
    Ok(())
}
