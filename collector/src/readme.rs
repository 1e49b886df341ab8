use std::path::Path;

use anyhow::Context;
use tracing::{info, instrument};

/// Replaces everything between the `name` section markers with `stats`.
pub fn update_section(content: &str, name: &str, stats: &str) -> anyhow::Result<String> {
    let start_marker = format!("<!--START_SECTION:{name}-->");
    let end_marker = format!("<!--END_SECTION:{name}-->");

    let start = content
        .find(&start_marker)
        .map(|index| index + start_marker.len())
        .ok_or_else(|| anyhow::anyhow!("Missing {start_marker} marker"))?;
    let end = content[start..]
        .find(&end_marker)
        .map(|index| start + index)
        .ok_or_else(|| anyhow::anyhow!("Missing {end_marker} marker after {start_marker}"))?;

    Ok(format!(
        "{}\n{stats}\n{}",
        &content[..start],
        &content[end..]
    ))
}

/// Rewrites the section in place. Returns whether the file changed.
#[instrument(skip(stats))]
pub async fn update_file(path: &Path, name: &str, stats: &str) -> anyhow::Result<bool> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let updated = update_section(&content, name, stats)?;
    if updated == content {
        info!("README is already up to date");
        return Ok(false);
    }

    tokio::fs::write(path, updated)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("README updated");
    Ok(true)
}
