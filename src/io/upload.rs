use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use super::bucket::Bucket;

/// Upload every file below `dir` to `prefix`, keeping relative paths
///
/// Returns the uploaded keys in upload order.
pub async fn upload_directory(
    bucket: &dyn Bucket,
    dir: &Path,
    prefix: &str,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(dir)?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let key = format!("{prefix}/{relative}");

        debug!(file = %entry.path().display(), %key, "uploading");
        bucket.upload_file(entry.path(), &key).await?;
        keys.push(key);
    }

    Ok(keys)
}
