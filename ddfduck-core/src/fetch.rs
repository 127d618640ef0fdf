//! Source dataset fetch via the `git` command-line tool.

use crate::error::{ConvertError, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Fail with `ToolMissing` unless `<tool> --version` runs successfully.
pub fn require_tool(tool: &str) -> Result<()> {
    let ok = Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(ConvertError::ToolMissing {
            tool: tool.to_string(),
        })
    }
}

/// Shallow-clone `url` into `repo_path`, or pull if it already exists.
pub fn clone_or_update(repo_path: &Path, url: &str) -> Result<()> {
    let mut cmd = Command::new("git");
    if repo_path.exists() {
        info!(
            "Repository exists at {}, pulling latest changes",
            repo_path.display()
        );
        cmd.arg("-C").arg(repo_path).arg("pull");
    } else {
        info!("Cloning repository to {}", repo_path.display());
        cmd.args(["clone", "--depth", "1", url]).arg(repo_path);
    }

    let status = cmd
        .status()
        .map_err(|e| ConvertError::fetch(format!("could not run git: {e}")))?;
    if !status.success() {
        return Err(ConvertError::fetch(format!("git exited with {status}")));
    }
    Ok(())
}
