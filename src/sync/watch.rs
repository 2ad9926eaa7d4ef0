// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced file watching for the drawing and canvas files.
//!
//! Notify's callback runs on its own thread and only forwards which
//! watched file changed; a tokio task owns the debounce timers. Each new
//! notification re-arms that file's timer, so editor write bursts (and
//! the multiple events a single save can fire) collapse into one engine
//! transition roughly 100ms after the last write.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::SyncEngine;

const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchedFile {
    Drawing,
    Canvas,
}

#[derive(Debug)]
pub enum WatchError {
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watch { path, source } => write!(f, "cannot watch {path:?}: {source}"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Watch { source, .. } => Some(source),
        }
    }
}

/// Keeps the underlying watcher alive; dropping it stops event delivery
/// and lets the debounce task wind down.
#[derive(Debug)]
pub struct WatchGuard {
    _watcher: RecommendedWatcher,
}

/// Watches the engine's drawing and canvas files and drives the matching
/// engine transitions after the debounce window. Must be called from
/// within a tokio runtime.
pub fn spawn_watchers(engine: Arc<SyncEngine>) -> Result<WatchGuard, WatchError> {
    let drawing_name = file_name(&engine.paths().drawing);
    let canvas_name = file_name(&engine.paths().canvas);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = {
        let drawing_name = drawing_name.clone();
        let canvas_name = canvas_name.clone();
        recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            let Ok(event) = res else { return };
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            for path in &event.paths {
                let name = file_name(path);
                if name == drawing_name {
                    let _ = tx.send(WatchedFile::Drawing);
                } else if name == canvas_name {
                    let _ = tx.send(WatchedFile::Canvas);
                }
            }
        })
        .map_err(|source| WatchError::Watch {
            path: engine.paths().drawing.clone(),
            source,
        })?
    };

    for dir in watched_dirs(engine.paths()) {
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: dir.clone(),
                source,
            })?;
        tracing::debug!(dir = %dir.display(), "watching directory");
    }

    tokio::spawn(debounce_loop(engine, rx));

    Ok(WatchGuard { _watcher: watcher })
}

async fn debounce_loop(engine: Arc<SyncEngine>, mut rx: mpsc::UnboundedReceiver<WatchedFile>) {
    let mut drawing_deadline: Option<Instant> = None;
    let mut canvas_deadline: Option<Instant> = None;

    loop {
        let next = match (drawing_deadline, canvas_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (deadline, None) | (None, deadline) => deadline,
        };

        tokio::select! {
            changed = rx.recv() => {
                match changed {
                    Some(WatchedFile::Drawing) => {
                        drawing_deadline = Some(Instant::now() + DEBOUNCE);
                    }
                    Some(WatchedFile::Canvas) => {
                        canvas_deadline = Some(Instant::now() + DEBOUNCE);
                    }
                    // Watcher dropped.
                    None => break,
                }
            }
            _ = sleep_until_opt(next), if next.is_some() => {
                let now = Instant::now();
                if drawing_deadline.is_some_and(|at| at <= now) {
                    drawing_deadline = None;
                    if let Err(err) = engine.drawing_file_changed() {
                        tracing::warn!(error = %err, "drawing file change failed");
                    }
                }
                if canvas_deadline.is_some_and(|at| at <= now) {
                    canvas_deadline = None;
                    if let Err(err) = engine.canvas_file_changed() {
                        tracing::warn!(error = %err, "canvas file change failed");
                    }
                }
            }
        }
    }

    tracing::debug!("file watch task stopped");
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn watched_dirs(paths: &super::SyncPaths) -> BTreeSet<PathBuf> {
    [&paths.drawing, &paths.canvas]
        .into_iter()
        .map(|path| {
            let parent = path.parent().unwrap_or(Path::new("."));
            if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            }
        })
        .collect()
}
