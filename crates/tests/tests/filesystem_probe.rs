
use std::fs;
use std::time::Duration;

use anyhow::Result;
use iwait_core::{Strategy, wait};
use support::fast_options;

#[tokio::test]
async fn file_appearing_later_is_ready_once_stable() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("artifact.bin");
    let writer_path = path.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::fs::write(&writer_path, b"payload").await
    });

    let result = wait(
        fast_options([path.display().to_string()]).with_window(Duration::from_millis(100)),
    )
    .await?;
    assert!(result.success);
    assert!(result.elapsed >= Duration::from_millis(200), "needs a stable window after appearing");
    Ok(())
}

#[tokio::test]
async fn glob_waits_for_a_match() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let pattern = format!("file:{}/*.log", dir.path().display());
    let target = dir.path().join("server.log");
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::fs::write(&target, b"started").await
    });

    let result = wait(fast_options([pattern.clone()]).with_window(Duration::from_millis(50))).await?;
    assert_eq!(result.ready, vec![pattern]);
    Ok(())
}

#[tokio::test]
async fn reverse_waits_for_directory_removal() -> Result<()> {
    let root = tempfile::tempdir()?;
    let cache = root.path().join("cache");
    fs::create_dir(&cache)?;
    fs::write(cache.join("build.lock"), b"")?;
    let remover = cache.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        tokio::fs::remove_dir_all(&remover).await
    });

    let resource = format!("dir:{}", cache.display());
    let result = wait(fast_options([resource]).with_reverse(true)).await?;
    assert!(result.success);
    assert!(result.elapsed >= Duration::from_millis(150));
    Ok(())
}

#[tokio::test]
async fn directories_require_entries_by_default() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let resource = format!("dir:{}", dir.path().display());

    let err = wait(fast_options([resource.clone()]).with_timeout(Duration::from_millis(200)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let options = fast_options([resource.clone()]).with_dir_not_empty(false);
    assert!(wait(options).await?.success);

    fs::write(dir.path().join("entry"), b"x")?;
    assert!(wait(fast_options([resource])).await?.success);
    Ok(())
}

#[tokio::test]
async fn race_returns_on_first_ready_resource() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let present = dir.path().join("present");
    fs::write(&present, b"ready")?;
    let present = format!("dir:{}", dir.path().display());
    let missing = dir.path().join("never").display().to_string();

    let result = wait(fast_options([missing.clone(), present.clone()]).with_strategy(Strategy::Race)).await?;
    assert!(result.success);
    assert_eq!(result.ready, vec![present]);
    assert_eq!(result.not_ready, vec![missing]);
    Ok(())
}
