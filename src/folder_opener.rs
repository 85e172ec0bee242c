//! Opening local folders in the desktop file explorer.

use crate::error::{ApiError, ApiResult};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

pub trait FolderOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<()>;
}

/// Launches the platform file explorer without blocking the caller.
pub struct SystemFolderOpener;

impl SystemFolderOpener {
    fn program() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

impl FolderOpener for SystemFolderOpener {
    fn open(&self, path: &Path) -> Result<()> {
        let program = Self::program();
        launch_detached(program, path)?;
        info!("Opened {:?} with {}", path, program);
        Ok(())
    }
}

/// Spawns `program path` and waits for it on a separate thread so the exited
/// process gets reaped.
fn launch_detached(program: &str, path: &Path) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut child = Command::new(program)
        .arg(path)
        .spawn()
        .with_context(|| format!("Failed to launch {} for {:?}", program, path))?;
    let program = program.to_string();
    Ok(std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            debug!("{} exited with {}", program, status);
            Some(status)
        }
        Err(err) => {
            warn!("Failed to wait for {}: {}", program, err);
            None
        }
    }))
}

/// Resolves `requested` against `root` and checks it names an existing directory
/// inside `root`.
pub fn resolve_folder(root: &Path, requested: &str) -> ApiResult<PathBuf> {
    let requested = requested.trim();
    if requested.is_empty() {
        return Err(ApiError::BadRequest("Folder path required".to_string()));
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve working directory {:?}", root))?;
    let candidate = root.join(requested.trim_start_matches('/'));
    let resolved = candidate
        .canonicalize()
        .map_err(|_| ApiError::not_found("Folder", requested))?;
    if !resolved.starts_with(&root) {
        return Err(ApiError::BadRequest("Invalid path".to_string()));
    }
    if !resolved.is_dir() {
        return Err(ApiError::BadRequest(format!("{} is not a folder", requested)));
    }
    Ok(resolved)
}
