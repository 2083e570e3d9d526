use anyhow::Result;
use notify::{Event, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Extensions of preview inputs: metadata, templates, styles, logic.
const WATCHED_EXTENSIONS: &[&str] = &["json", "html", "scss", "css", "ts"];

/// Directories never worth reloading for.
const IGNORED_DIRS: &[&str] = &["node_modules", "target", ".git", "dist"];

/// Start watching the project's input paths.
///
/// Directories are watched recursively. Files are watched through their
/// parent directory so editors that save by renaming are still seen. When a
/// watched input changes, sends a notification through the broadcast channel.
pub fn start(inputs: &[PathBuf], tx: broadcast::Sender<()>) -> Result<impl Watcher> {
    let inputs: Vec<PathBuf> = inputs.iter().map(|p| absolute(p)).collect();
    let filter = inputs.clone();

    let mut watcher =
        notify::recommended_watcher(move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                if event.paths.iter().any(|p| is_relevant(p, &filter)) {
                    debug!(paths = ?event.paths, "input changed");
                    let _ = tx.send(());
                }
            }
        })?;

    let mut targets: Vec<(PathBuf, RecursiveMode)> = Vec::new();
    for input in &inputs {
        let target = if input.is_dir() {
            (input.clone(), RecursiveMode::Recursive)
        } else {
            match input.parent().filter(|dir| dir.is_dir()) {
                Some(dir) => (dir.to_path_buf(), RecursiveMode::NonRecursive),
                None => {
                    warn!(path = %input.display(), "input has no existing directory; not watched");
                    continue;
                }
            }
        };
        if !targets.iter().any(|(path, _)| *path == target.0) {
            targets.push(target);
        }
    }

    for (path, mode) in &targets {
        watcher.watch(path, *mode)?;
    }
    Ok(watcher)
}

fn absolute(path: &Path) -> PathBuf {
    if path.exists() {
        std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    } else {
        match (path.parent(), path.file_name()) {
            (Some(parent), Some(name)) if parent.exists() => std::fs::canonicalize(parent)
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| path.to_path_buf()),
            _ => path.to_path_buf(),
        }
    }
}

/// Whether a changed path is one of `inputs` or lies under an input directory.
fn is_relevant(path: &Path, inputs: &[PathBuf]) -> bool {
    is_watched(path) && inputs.iter().any(|input| path.starts_with(input))
}

fn is_watched(path: &Path) -> bool {
    let ignored = path.components().any(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
    });
    if ignored {
        return false;
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    WATCHED_EXTENSIONS.contains(&ext)
}
