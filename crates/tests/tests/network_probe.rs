
use std::time::Duration;

use anyhow::Result;
use iwait_core::{Strategy, WaitError, wait};
use support::{bind_local, closed_port, fast_options};
use tokio::time::Instant;

#[tokio::test]
async fn tcp_listener_is_ready() -> Result<()> {
    let Some(listener) = bind_local()? else {
        return Ok(());
    };
    let port = listener.local_addr()?.port();
    let result = wait(fast_options([format!("tcp:127.0.0.1:{port}")])).await?;
    assert!(result.success);
    drop(listener);
    Ok(())
}

#[tokio::test]
async fn unused_port_times_out_with_pending_list() -> Result<()> {
    let Some(port) = closed_port()? else {
        return Ok(());
    };
    let resource = format!("tcp:127.0.0.1:{port}");
    let started = Instant::now();
    let err = wait(fast_options([resource.clone()]).with_timeout(Duration::from_millis(200)))
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    match err {
        WaitError::Timeout {
            timeout, pending, ..
        } => {
            assert_eq!(timeout, Duration::from_millis(200));
            assert_eq!(pending, vec![resource]);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    Ok(())
}

#[tokio::test]
async fn reverse_succeeds_on_closed_port() -> Result<()> {
    let Some(port) = closed_port()? else {
        return Ok(());
    };
    let result = wait(fast_options([format!("tcp:127.0.0.1:{port}")]).with_reverse(true)).await?;
    assert!(result.success);
    assert_eq!(result.ready.len(), 1);
    Ok(())
}

#[tokio::test]
async fn port_opening_later_is_detected() -> Result<()> {
    let Some(port) = closed_port()? else {
        return Ok(());
    };
    let opener = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        drop(listener);
        Ok::<_, std::io::Error>(())
    });

    let result = wait(fast_options([format!("tcp:127.0.0.1:{port}")])).await?;
    assert!(result.success);
    assert!(result.elapsed >= Duration::from_millis(150));
    opener.abort();
    Ok(())
}

#[tokio::test]
async fn threshold_and_any_tolerate_missing_services() -> Result<()> {
    let (Some(listener), Some(port)) = (bind_local()?, closed_port()?) else {
        return Ok(());
    };
    let open = format!("tcp:127.0.0.1:{}", listener.local_addr()?.port());
    let closed = format!("tcp:127.0.0.1:{port}");

    let result = wait(
        fast_options([open.clone(), closed.clone()])
            .with_strategy(Strategy::Threshold)
            .with_threshold(1),
    )
    .await?;
    assert!(result.success);
    assert_eq!(result.ready, vec![open.clone()]);
    assert_eq!(result.not_ready, vec![closed.clone()]);

    let result = wait(fast_options([closed, open.clone()]).with_strategy(Strategy::Any)).await?;
    assert!(result.success);
    assert_eq!(result.ready, vec![open]);
    Ok(())
}

#[tokio::test]
async fn all_strategy_waits_for_every_port() -> Result<()> {
    let (Some(listener), Some(port)) = (bind_local()?, closed_port()?) else {
        return Ok(());
    };
    let open = format!("tcp:127.0.0.1:{}", listener.local_addr()?.port());
    let closed = format!("tcp:127.0.0.1:{port}");
    let err = wait(fast_options([open, closed.clone()]).with_timeout(Duration::from_millis(250)))
        .await
        .unwrap_err();
    match err {
        WaitError::Timeout { pending, result, .. } => {
            assert_eq!(pending, vec![closed]);
            assert_eq!(result.ready.len(), 1);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_resources_fail_fast() {
    let started = Instant::now();
    let err = wait(fast_options(["tcp:localhost:70000"])).await.unwrap_err();
    assert!(matches!(err, WaitError::Parse(_)));
    assert!(started.elapsed() < Duration::from_secs(1));

    let err = wait(fast_options(["gopher://example.com"])).await.unwrap_err();
    assert!(matches!(err, WaitError::Parse(_)));
}
