use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::collector::{RunOutput, TranscriptResult};

/// Body written for videos without a transcript
pub const MISSING_PLACEHOLDER: &str = "[no transcript available]";

/// Default artifact name
pub const DEFAULT_OUTPUT_FILE: &str = "all_transcripts.txt";

/// Render one entry: title delimiter, blank line, body, blank line
fn format_entry(result: &TranscriptResult) -> String {
    let body = result
        .text()
        .map(str::trim_end)
        .unwrap_or(MISSING_PLACEHOLDER);

    format!("========== {} ==========\n\n{}\n\n", result.video.title, body)
}

/// Render the whole artifact in listing order
pub fn render(output: &RunOutput) -> String {
    output.results.iter().map(format_entry).collect()
}

/// Write the artifact, replacing any previous file at `path`.
///
/// Content goes to a temporary file beside the target which is then renamed over it, so
/// the target only ever holds a complete artifact.
pub fn save_to_file(output: &RunOutput, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        fs_err::create_dir_all(dir)?;
    }

    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(render(output).as_bytes())
        .context("Failed to write transcripts")?;
    #[cfg(unix)]
    file.as_file()
        .set_permissions(artifact_permissions(path))
        .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::debug!("Wrote {} entries to {}", output.results.len(), path.display());
    Ok(())
}

/// Mode for the artifact: whatever the file being replaced had, 0644 for a new one
#[cfg(unix)]
fn artifact_permissions(path: &Path) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    fs_err::metadata(path)
        .map(|meta| meta.permissions())
        .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o644))
}
