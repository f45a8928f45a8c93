use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task;
use tokio::time::Instant;

use super::io_error;
use crate::error::ProbeError;

#[derive(Debug, Clone, Copy)]
struct SizeSample {
    size: u64,
    since: Instant,
}

/// Reports a file ready once its size has not changed for `window`.
pub struct FileProbe {
    window: Duration,
    samples: Mutex<HashMap<PathBuf, SizeSample>>,
}

impl FileProbe {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            samples: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, pattern: &str) -> Result<bool, ProbeError> {
        if is_glob(pattern) {
            return self.check_glob(pattern).await;
        }
        self.check_path(Path::new(pattern)).await
    }

    async fn check_glob(&self, pattern: &str) -> Result<bool, ProbeError> {
        let owned = pattern.to_string();
        let matches = task::spawn_blocking(move || expand_glob(&owned))
            .await
            .map_err(|err| ProbeError::Io {
                path: pattern.to_string(),
                reason: format!("glob expansion task failed: {err}"),
            })??;
        tracing::trace!(pattern, matched = matches.len(), "expanded file pattern");
        self.forget_unmatched(pattern, &matches);
        if matches.is_empty() {
            return Ok(false);
        }
        // Every match is sampled even when one of them fails.
        let mut ready = true;
        let mut first_error = None;
        for verdict in join_all(matches.iter().map(|path| self.check_path(path))).await {
            match verdict {
                Ok(stable) => ready &= stable,
                Err(err) => {
                    ready = false;
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(ready),
        }
    }

    /// Drops samples for files this pattern used to match but no longer does.
    fn forget_unmatched(&self, pattern: &str, matches: &[PathBuf]) {
        let Ok(compiled) = glob::Pattern::new(pattern) else {
            return;
        };
        let current: HashSet<&Path> = matches.iter().map(PathBuf::as_path).collect();
        self.samples
            .lock()
            .retain(|path, _| !compiled.matches_path(path) || current.contains(path.as_path()));
    }

    async fn check_path(&self, path: &Path) -> Result<bool, ProbeError> {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Ok(false),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.samples.lock().remove(path);
                return Ok(false);
            }
            Err(err) => return Err(io_error(path, &err)),
        };
        Ok(self.observe(path, size, Instant::now()))
    }

    /// Records a size observation and reports whether it has been stable for
    /// the whole window.
    fn observe(&self, path: &Path, size: u64, now: Instant) -> bool {
        let mut samples = self.samples.lock();
        match samples.get(path) {
            Some(sample) if sample.size == size => {
                let stable_for = now.saturating_duration_since(sample.since);
                if stable_for >= self.window {
                    tracing::trace!(path = %path.display(), size, "file size stabilised");
                    return true;
                }
                false
            }
            _ => {
                samples.insert(path.to_path_buf(), SizeSample { size, since: now });
                false
            }
        }
    }
}

fn is_glob(value: &str) -> bool {
    value.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, ProbeError> {
    let paths = glob::glob(pattern).map_err(|err| ProbeError::Io {
        path: pattern.to_string(),
        reason: format!("invalid pattern: {err}"),
    })?;
    Ok(paths.filter_map(Result::ok).filter(|path| path.is_file()).collect())
}
