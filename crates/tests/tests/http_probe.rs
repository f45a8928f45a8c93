
use std::time::Duration;

use anyhow::Result;
use iwait_core::{BasicAuth, StatusValidator, WaitError, wait};
use support::{fast_options, serve_http};

#[tokio::test]
async fn head_and_get_become_ready() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let head = format!("http://{addr}/ok");
    let get = format!("http-get://{addr}/ok");

    let result = wait(fast_options([head.clone(), get.clone()])).await?;
    assert!(result.success);
    assert_eq!(result.ready, vec![head, get]);
    assert!(result.errors.is_empty());
    Ok(())
}

#[tokio::test]
async fn rejected_status_times_out() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let resource = format!("http-get://{addr}/teapot");
    let err = wait(fast_options([resource.clone()]).with_timeout(Duration::from_millis(300)))
        .await
        .unwrap_err();
    match err {
        WaitError::Timeout { pending, result, .. } => {
            assert_eq!(pending, vec![resource.clone()]);
            assert_eq!(result.not_ready, vec![resource]);
            assert!(result.errors.is_empty(), "a bad status is not a probe error");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn custom_status_validator_accepts_418() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let options = fast_options([format!("http://{addr}/teapot")])
        .with_validate_status("418".parse::<StatusValidator>()?);
    assert!(wait(options).await?.success);
    Ok(())
}

#[tokio::test]
async fn redirects_are_followed_unless_disabled() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let resource = format!("http-get://{addr}/redirect");
    assert!(wait(fast_options([resource.clone()])).await?.success);

    let options = fast_options([resource])
        .with_timeout(Duration::from_millis(300))
        .with_follow_redirect(false);
    assert!(wait(options).await.unwrap_err().is_timeout());
    Ok(())
}

#[tokio::test]
async fn basic_auth_is_sent() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let options = fast_options([format!("http-get://{addr}/auth")])
        .with_basic_auth("ops:secret".parse::<BasicAuth>()?);
    assert!(wait(options).await?.success);
    Ok(())
}

#[tokio::test]
async fn reverse_waits_for_endpoint_to_go_away() -> Result<()> {
    let Some(addr) = serve_http()? else {
        return Ok(());
    };
    let result = wait(fast_options([format!("http://{addr}/missing")]).with_reverse(true)).await?;
    assert!(result.success, "404 is not ready, so reverse succeeds");
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn http_over_unix_socket() -> Result<()> {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;
    use std::thread;

    let dir = tempfile::tempdir()?;
    let socket = dir.path().join("api.sock");
    let listener = UnixListener::bind(&socket)?;
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            loop {
                let mut line = String::new();
                match reader.read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) if line == "\r\n" => break,
                    Ok(_) => {}
                }
            }
            let status = if request_line.starts_with("GET /status ") {
                "204 No Content"
            } else {
                "404 Not Found"
            };
            let mut stream = reader.into_inner();
            let _ = write!(
                stream,
                "HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
        }
    });

    let resource = format!("http-get://unix:{}:/status", socket.display());
    let result = wait(fast_options([resource.clone()])).await?;
    assert!(result.success);
    assert_eq!(result.ready, vec![resource]);

    let missing = format!("http-get://unix:{}:/other", socket.display());
    let err = wait(fast_options([missing]).with_timeout(Duration::from_millis(300)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
    Ok(())
}
