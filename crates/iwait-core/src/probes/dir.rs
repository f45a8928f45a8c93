use std::io::ErrorKind;
use std::path::Path;

use super::io_error;
use crate::error::ProbeError;

pub struct DirProbe {
    require_entries: bool,
}

impl DirProbe {
    pub fn new(require_entries: bool) -> Self {
        Self { require_entries }
    }

    pub async fn check(&self, path: &Path) -> Result<bool, ProbeError> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::trace!(path = %path.display(), "path exists but is not a directory");
                return Ok(false);
            }
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(err) => return Err(io_error(path, &err)),
        }
        if !self.require_entries {
            return Ok(true);
        }
        let mut entries = tokio::fs::read_dir(path)
            .await
            .map_err(|err| io_error(path, &err))?;
        let first = entries
            .next_entry()
            .await
            .map_err(|err| io_error(path, &err))?;
        Ok(first.is_some())
    }
}
