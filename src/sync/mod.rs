// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The sync orchestrator.
//!
//! Three change sources feed the engine: live patches from connected
//! clients, the watched drawing file and the watched canvas file. Each
//! transition runs under the state lock, compares against the last
//! serialized marker of its source to tell a real change from its own
//! echo, and only then fans the change out to the other representations.

pub mod watch;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::format::canvas::{canvas_to_graph, graph_to_canvas, CanvasConvertError, CanvasDocument};
use crate::format::live::{
    live_to_graph, patched_shape_record, LiveConvertError, LiveSnapshot, ShapeUpdate, StoreDiff,
};
use crate::format::ocif::export_document;

const DRAWING_FILENAME: &str = "drawing.json";
const INTERCHANGE_FILENAME: &str = "diagram.ocif.json";
const CANVAS_FILENAME: &str = "diagram.canvas";

/// Identifies a connected client, so its own patches are not echoed back.
pub type ClientId = Uuid;

/// Which change source currently drives the state. The phase is the
/// transition entry gate, claimed before the state lock: live patches are
/// refused while a file-originated phase is active, and file transitions
/// require `Idle`. Every transition restores `Idle` on exit, error paths
/// included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    FromLive,
    FromDrawingFile,
    FromCanvasFile,
}

impl SyncPhase {
    fn is_file_originated(self) -> bool {
        matches!(self, Self::FromDrawingFile | Self::FromCanvasFile)
    }
}

/// What a transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The change was real and has been propagated.
    Applied,
    /// The change matched its marker: an echo of our own write, or no
    /// effective difference. Nothing was written or broadcast.
    NoChange,
    /// Another phase was active; the transition did not run.
    Ignored,
}

/// A change fanned out to connected clients. `origin` names the client
/// whose patch caused it, so that client can be skipped.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub origin: Option<ClientId>,
    pub diff: StoreDiff,
}

/// The three files the engine keeps consistent. The interchange and
/// canvas files are derived outputs of every transition; the drawing and
/// canvas files are also watched inputs.
#[derive(Debug, Clone)]
pub struct SyncPaths {
    pub drawing: PathBuf,
    pub interchange: PathBuf,
    pub canvas: PathBuf,
}

impl SyncPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            drawing: dir.join(DRAWING_FILENAME),
            interchange: dir.join(INTERCHANGE_FILENAME),
            canvas: dir.join(CANVAS_FILENAME),
        }
    }
}

#[derive(Debug)]
struct SyncState {
    snapshot: LiveSnapshot,
    /// Serialization of `snapshot` as of the last completed transition.
    live_marker: String,
    /// Exact bytes last written to or read from the drawing file.
    drawing_marker: String,
    /// Exact bytes last written to or read from the canvas file.
    canvas_marker: String,
}

#[derive(Debug)]
pub enum SyncError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    CanvasConvert {
        path: PathBuf,
        source: CanvasConvertError,
    },
    LiveConvert {
        source: LiveConvertError,
    },
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
            Self::CanvasConvert { path, source } => {
                write!(f, "cannot convert canvas document at {path:?}: {source}")
            }
            Self::LiveConvert { source } => {
                write!(f, "cannot convert live snapshot: {source}")
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::CanvasConvert { source, .. } => Some(source),
            Self::LiveConvert { source } => Some(source),
        }
    }
}

#[derive(Debug)]
pub struct SyncEngine {
    paths: SyncPaths,
    phase: Mutex<SyncPhase>,
    state: Mutex<SyncState>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Builds the engine, seeding the live snapshot and all markers from
    /// whatever is already on disk. Missing files mean an empty session;
    /// nothing is written until the first real change.
    pub fn new(paths: SyncPaths) -> Result<Self, SyncError> {
        let (snapshot, drawing_marker) = match read_optional(&paths.drawing)? {
            Some(content) => {
                let snapshot: LiveSnapshot =
                    serde_json::from_str(&content).map_err(|source| SyncError::Json {
                        path: paths.drawing.clone(),
                        source,
                    })?;
                (snapshot, content)
            }
            None => (LiveSnapshot::default(), String::new()),
        };
        let canvas_marker = read_optional(&paths.canvas)?.unwrap_or_default();
        let live_marker = snapshot.canonical_json();

        tracing::info!(
            drawing = %paths.drawing.display(),
            records = snapshot.store.len(),
            "sync engine initialized"
        );

        let (events, _) = broadcast::channel(64);
        Ok(Self {
            paths,
            phase: Mutex::new(SyncPhase::Idle),
            state: Mutex::new(SyncState {
                snapshot,
                live_marker,
                drawing_marker,
                canvas_marker,
            }),
            events,
        })
    }

    /// Claims the phase for a transition. Live patches may overlap each
    /// other (the state lock serializes their actual work) but are
    /// refused while a file phase is active; file transitions require
    /// `Idle`.
    fn try_begin(&self, next: SyncPhase) -> bool {
        let mut phase = self.phase.lock().expect("sync phase lock poisoned");
        let allowed = match next {
            SyncPhase::FromLive => !phase.is_file_originated(),
            _ => *phase == SyncPhase::Idle,
        };
        if allowed {
            *phase = next;
        }
        allowed
    }

    fn end_phase(&self) {
        *self.phase.lock().expect("sync phase lock poisoned") = SyncPhase::Idle;
    }

    pub fn paths(&self) -> &SyncPaths {
        &self.paths
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// The current live snapshot, for greeting a freshly connected client.
    pub fn snapshot(&self) -> LiveSnapshot {
        self.state
            .lock()
            .expect("sync state lock poisoned")
            .snapshot
            .clone()
    }

    /// Applies a structural diff from a live client and fans it out to
    /// the files and the other clients.
    pub fn apply_live_patch(
        &self,
        origin: Option<ClientId>,
        diff: &StoreDiff,
    ) -> Result<TransitionOutcome, SyncError> {
        if !self.try_begin(SyncPhase::FromLive) {
            tracing::debug!("live patch ignored during file sync");
            return Ok(TransitionOutcome::Ignored);
        }
        let result = {
            let mut state = self.state.lock().expect("sync state lock poisoned");
            self.live_patch_locked(&mut state, origin, diff)
        };
        self.end_phase();
        result
    }

    fn live_patch_locked(
        &self,
        state: &mut SyncState,
        origin: Option<ClientId>,
        diff: &StoreDiff,
    ) -> Result<TransitionOutcome, SyncError> {
        let mut updated = state.snapshot.clone();
        updated.apply_diff(diff);
        let serialized = updated.canonical_json();
        if serialized == state.live_marker {
            return Ok(TransitionOutcome::NoChange);
        }

        let graph = live_to_graph(&updated).map_err(|source| SyncError::LiveConvert { source })?;
        let canvas_json = canvas_json(&graph_to_canvas(&graph));
        let interchange_json = export_document(&graph);

        write_file(&self.paths.drawing, &serialized)?;
        write_file(&self.paths.interchange, &interchange_json)?;
        write_file(&self.paths.canvas, &canvas_json)?;

        state.snapshot = updated;
        state.live_marker = serialized.clone();
        state.drawing_marker = serialized;
        state.canvas_marker = canvas_json;

        tracing::info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            updated = diff.updated.len(),
            "live patch applied"
        );
        let _ = self.events.send(SyncEvent {
            origin,
            diff: diff.clone(),
        });
        Ok(TransitionOutcome::Applied)
    }

    /// Reacts to an observed change of the drawing file: loads the new
    /// snapshot, diffs it against the live store and propagates.
    pub fn drawing_file_changed(&self) -> Result<TransitionOutcome, SyncError> {
        if !self.try_begin(SyncPhase::FromDrawingFile) {
            tracing::debug!("drawing change ignored during active sync");
            return Ok(TransitionOutcome::Ignored);
        }
        let result = {
            let mut state = self.state.lock().expect("sync state lock poisoned");
            self.drawing_changed_locked(&mut state)
        };
        self.end_phase();
        result
    }

    fn drawing_changed_locked(
        &self,
        state: &mut SyncState,
    ) -> Result<TransitionOutcome, SyncError> {
        let content = match read_optional(&self.paths.drawing)? {
            Some(content) => content,
            None => return Ok(TransitionOutcome::NoChange),
        };
        if content == state.drawing_marker {
            // Our own last write, observed by the watcher.
            return Ok(TransitionOutcome::NoChange);
        }

        let new_snapshot: LiveSnapshot =
            serde_json::from_str(&content).map_err(|source| SyncError::Json {
                path: self.paths.drawing.clone(),
                source,
            })?;
        let diff = crate::format::live::diff_snapshots(&state.snapshot, &new_snapshot);

        let graph =
            live_to_graph(&new_snapshot).map_err(|source| SyncError::LiveConvert { source })?;
        let canvas_json = canvas_json(&graph_to_canvas(&graph));
        let interchange_json = export_document(&graph);

        write_file(&self.paths.interchange, &interchange_json)?;
        write_file(&self.paths.canvas, &canvas_json)?;

        state.live_marker = new_snapshot.canonical_json();
        state.snapshot = new_snapshot;
        state.drawing_marker = content;
        state.canvas_marker = canvas_json;

        if diff.is_empty() {
            return Ok(TransitionOutcome::NoChange);
        }

        tracing::info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            updated = diff.updated.len(),
            "drawing file changed externally, updating clients"
        );
        let _ = self.events.send(SyncEvent { origin: None, diff });
        Ok(TransitionOutcome::Applied)
    }

    /// Reacts to an observed change of the canvas file: patches changed
    /// shapes into the live store and refreshes the interchange file.
    ///
    /// Only nodes present in both the old and new canvas documents are
    /// reconciled; canvas-side additions and removals do not touch the
    /// live store.
    pub fn canvas_file_changed(&self) -> Result<TransitionOutcome, SyncError> {
        if !self.try_begin(SyncPhase::FromCanvasFile) {
            tracing::debug!("canvas change ignored during active sync");
            return Ok(TransitionOutcome::Ignored);
        }
        let result = {
            let mut state = self.state.lock().expect("sync state lock poisoned");
            self.canvas_changed_locked(&mut state)
        };
        self.end_phase();
        result
    }

    fn canvas_changed_locked(&self, state: &mut SyncState) -> Result<TransitionOutcome, SyncError> {
        let content = match read_optional(&self.paths.canvas)? {
            Some(content) => content,
            None => return Ok(TransitionOutcome::NoChange),
        };
        if content == state.canvas_marker {
            return Ok(TransitionOutcome::NoChange);
        }

        let new_doc: CanvasDocument =
            serde_json::from_str(&content).map_err(|source| SyncError::Json {
                path: self.paths.canvas.clone(),
                source,
            })?;
        // The marker always holds our own last serialization, so this
        // only misses when the baseline file predates the engine.
        let old_doc: CanvasDocument =
            serde_json::from_str(&state.canvas_marker).unwrap_or_default();

        let graph = canvas_to_graph(&new_doc).map_err(|source| SyncError::CanvasConvert {
            path: self.paths.canvas.clone(),
            source,
        })?;
        let interchange_json = export_document(&graph);

        let diff = shape_patches(&state.snapshot, &old_doc, &new_doc);
        if !diff.is_empty() {
            state.snapshot.apply_diff(&diff);
            let serialized = state.snapshot.canonical_json();
            write_file(&self.paths.drawing, &serialized)?;
            state.live_marker = serialized.clone();
            state.drawing_marker = serialized;
        }

        write_file(&self.paths.interchange, &interchange_json)?;
        state.canvas_marker = content;

        if diff.is_empty() {
            tracing::info!("canvas file changed, interchange refreshed");
            return Ok(TransitionOutcome::NoChange);
        }

        tracing::info!(
            updated = diff.updated.len(),
            "canvas file changed, patching live store"
        );
        let _ = self.events.send(SyncEvent { origin: None, diff });
        Ok(TransitionOutcome::Applied)
    }
}

/// Minimal single-shape patches for nodes whose text or geometry changed
/// between two canvas documents.
fn shape_patches(
    snapshot: &LiveSnapshot,
    old_doc: &CanvasDocument,
    new_doc: &CanvasDocument,
) -> StoreDiff {
    let mut diff = StoreDiff::default();

    for new_node in &new_doc.nodes {
        let Some(old_node) = old_doc
            .nodes
            .iter()
            .find(|node| node.id() == new_node.id())
        else {
            continue;
        };
        let Some(record) = snapshot.store.get(new_node.id()).filter(|r| r.is_shape()) else {
            continue;
        };

        let old_base = old_node.base();
        let new_base = new_node.base();
        let changed = |old: f64, new: f64| if old != new { Some(new) } else { None };

        let update = ShapeUpdate {
            text: match (old_node.content(), new_node.content()) {
                (old, Some(new)) if old != Some(new) => Some(new.to_owned()),
                _ => None,
            },
            x: changed(old_base.x, new_base.x),
            y: changed(old_base.y, new_base.y),
            width: changed(old_base.width, new_base.width),
            height: changed(old_base.height, new_base.height),
        };
        if update.is_empty() {
            continue;
        }

        let patched = patched_shape_record(record, &update);
        diff.updated
            .insert(record.id.clone(), (record.clone(), patched));
    }

    diff
}

fn canvas_json(doc: &CanvasDocument) -> String {
    // Plain structs; serialization cannot fail.
    serde_json::to_string_pretty(doc).expect("canvas document serializes")
}

fn read_optional(path: &Path) -> Result<Option<String>, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SyncError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| SyncError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests;
