// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};

use super::{SyncEngine, SyncError, SyncPaths, SyncPhase, TransitionOutcome};
use crate::format::canvas::{CanvasDocument, CanvasNode};
use crate::format::live::{rich_text_document, LiveRecord, ShapeProps, StoreDiff};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!(
            "triptych-{prefix}-{}-{nanos}-{counter}",
            std::process::id()
        ));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct EngineTestCtx {
    _tmp: TempDir,
    paths: SyncPaths,
    engine: SyncEngine,
}

impl EngineTestCtx {
    fn new(prefix: &str) -> Self {
        let tmp = TempDir::new(prefix);
        let paths = SyncPaths::in_dir(tmp.path());
        let engine = SyncEngine::new(paths.clone()).expect("engine initializes in empty dir");
        Self {
            _tmp: tmp,
            paths,
            engine,
        }
    }
}

#[fixture]
fn ctx() -> EngineTestCtx {
    EngineTestCtx::new("engine")
}

fn shape_record(id: &str, x: f64, y: f64, w: f64, h: f64, text: &str) -> LiveRecord {
    LiveRecord {
        id: id.to_owned(),
        type_name: "shape".to_owned(),
        x: Some(x),
        y: Some(y),
        props: Some(ShapeProps {
            w: Some(w),
            h: Some(h),
            color: None,
            rich_text: Some(rich_text_document(text)),
            extra: Default::default(),
        }),
        extra: Default::default(),
    }
}

fn add_shape_diff(record: LiveRecord) -> StoreDiff {
    let mut diff = StoreDiff::default();
    diff.added.insert(record.id.clone(), record);
    diff
}

#[rstest]
fn live_patch_writes_all_three_files(ctx: EngineTestCtx) {
    let mut events = ctx.engine.subscribe();
    let origin = Some(uuid::Uuid::new_v4());

    let outcome = ctx
        .engine
        .apply_live_patch(origin, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("apply live patch");
    assert_eq!(outcome, TransitionOutcome::Applied);

    let drawing = fs::read_to_string(&ctx.paths.drawing).expect("drawing file written");
    assert!(drawing.contains("\"n1\""));

    let interchange = fs::read_to_string(&ctx.paths.interchange).expect("interchange written");
    assert!(interchange.contains("https://canvasprotocol.org/ocif/0.5"));
    assert!(interchange.contains("resource-n1"));

    let canvas: CanvasDocument = serde_json::from_str(
        &fs::read_to_string(&ctx.paths.canvas).expect("canvas written"),
    )
    .expect("canvas parses");
    assert_eq!(canvas.nodes.len(), 1);
    assert_eq!(canvas.nodes[0].id(), "n1");
    assert_eq!(canvas.nodes[0].content(), Some("Alpha"));

    let event = events.try_recv().expect("patch broadcast");
    assert_eq!(event.origin, origin);
    assert_eq!(event.diff.added.len(), 1);
}

#[rstest]
fn replaying_an_applied_patch_is_a_no_op(ctx: EngineTestCtx) {
    let diff = add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha"));
    ctx.engine
        .apply_live_patch(None, &diff)
        .expect("first patch");

    let mut events = ctx.engine.subscribe();
    let outcome = ctx
        .engine
        .apply_live_patch(None, &diff)
        .expect("replayed patch");
    assert_eq!(outcome, TransitionOutcome::NoChange);
    assert!(events.try_recv().is_err());
}

#[rstest]
fn own_drawing_write_does_not_retrigger_a_sync_pass(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("apply live patch");

    // What the drawing watcher would do after observing our own write.
    let mut events = ctx.engine.subscribe();
    let outcome = ctx.engine.drawing_file_changed().expect("watch callback");
    assert_eq!(outcome, TransitionOutcome::NoChange);
    assert!(events.try_recv().is_err());
}

#[rstest]
fn external_drawing_change_is_diffed_and_broadcast(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");

    let mut snapshot = ctx.engine.snapshot();
    snapshot
        .store
        .insert("n2".to_owned(), shape_record("n2", 200.0, 0.0, 80.0, 40.0, "Beta"));
    fs::write(&ctx.paths.drawing, snapshot.canonical_json()).expect("external write");

    let mut events = ctx.engine.subscribe();
    let outcome = ctx.engine.drawing_file_changed().expect("file change");
    assert_eq!(outcome, TransitionOutcome::Applied);

    let event = events.try_recv().expect("diff broadcast");
    assert_eq!(event.origin, None);
    assert!(event.diff.added.contains_key("n2"));

    // Derived files follow the drawing file.
    let canvas: CanvasDocument = serde_json::from_str(
        &fs::read_to_string(&ctx.paths.canvas).expect("canvas refreshed"),
    )
    .expect("canvas parses");
    assert_eq!(canvas.nodes.len(), 2);

    // The same content a second time is an echo.
    let outcome = ctx.engine.drawing_file_changed().expect("echo");
    assert_eq!(outcome, TransitionOutcome::NoChange);
    assert!(events.try_recv().is_err());
}

#[rstest]
fn canvas_text_edit_emits_exactly_one_patch_for_that_node(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");

    let mut doc: CanvasDocument = serde_json::from_str(
        &fs::read_to_string(&ctx.paths.canvas).expect("canvas exists"),
    )
    .expect("canvas parses");
    match &mut doc.nodes[0] {
        CanvasNode::Text { text, .. } => *text = "Renamed".to_owned(),
        node => panic!("expected text node, got {node:?}"),
    }
    fs::write(&ctx.paths.canvas, serde_json::to_string(&doc).expect("serialize"))
        .expect("external canvas write");

    let mut events = ctx.engine.subscribe();
    let outcome = ctx.engine.canvas_file_changed().expect("canvas change");
    assert_eq!(outcome, TransitionOutcome::Applied);

    let event = events.try_recv().expect("patch broadcast");
    assert!(event.diff.added.is_empty());
    assert!(event.diff.removed.is_empty());
    assert_eq!(event.diff.updated.len(), 1);
    let (before, after) = &event.diff.updated["n1"];
    assert_eq!(before.shape_text(), "Alpha");
    assert_eq!(after.shape_text(), "Renamed");
    assert!(events.try_recv().is_err());

    // The live store took the edit and persisted it.
    assert_eq!(ctx.engine.snapshot().store["n1"].shape_text(), "Renamed");
    assert!(fs::read_to_string(&ctx.paths.drawing)
        .expect("drawing file")
        .contains("Renamed"));

    // The same canvas content again is an echo.
    let outcome = ctx.engine.canvas_file_changed().expect("echo");
    assert_eq!(outcome, TransitionOutcome::NoChange);
}

#[rstest]
fn canvas_geometry_edit_patches_position_and_size(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");

    let mut doc: CanvasDocument = serde_json::from_str(
        &fs::read_to_string(&ctx.paths.canvas).expect("canvas exists"),
    )
    .expect("canvas parses");
    {
        let base = match &mut doc.nodes[0] {
            CanvasNode::Text { base, .. } => base,
            node => panic!("expected text node, got {node:?}"),
        };
        base.x = 40.0;
        base.width = 160.0;
    }
    fs::write(&ctx.paths.canvas, serde_json::to_string(&doc).expect("serialize"))
        .expect("external canvas write");

    ctx.engine.canvas_file_changed().expect("canvas change");

    let record = &ctx.engine.snapshot().store["n1"];
    assert_eq!(record.x, Some(40.0));
    assert_eq!(record.y, Some(0.0));
    let props = record.props.as_ref().expect("props");
    assert_eq!(props.w, Some(160.0));
    assert_eq!(props.h, Some(50.0));
}

#[rstest]
fn canvas_additions_are_not_reconciled_into_the_live_store(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");

    let mut doc: CanvasDocument = serde_json::from_str(
        &fs::read_to_string(&ctx.paths.canvas).expect("canvas exists"),
    )
    .expect("canvas parses");
    doc.nodes.push(CanvasNode::Text {
        base: crate::format::canvas::CanvasNodeBase {
            id: "fresh".to_owned(),
            x: 500.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
            color: None,
        },
        text: "New".to_owned(),
    });
    fs::write(&ctx.paths.canvas, serde_json::to_string(&doc).expect("serialize"))
        .expect("external canvas write");

    let mut events = ctx.engine.subscribe();
    let outcome = ctx.engine.canvas_file_changed().expect("canvas change");
    assert_eq!(outcome, TransitionOutcome::NoChange);
    assert!(events.try_recv().is_err());
    assert!(!ctx.engine.snapshot().store.contains_key("fresh"));

    // The interchange file still reflects the whole new canvas document.
    assert!(fs::read_to_string(&ctx.paths.interchange)
        .expect("interchange refreshed")
        .contains("fresh"));
}

#[rstest]
fn malformed_watched_json_aborts_without_mutation(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");
    let before = ctx.engine.snapshot();

    fs::write(&ctx.paths.drawing, "{ broken").expect("corrupt drawing");
    let err = ctx.engine.drawing_file_changed().unwrap_err();
    assert!(matches!(err, SyncError::Json { .. }));
    assert_eq!(ctx.engine.snapshot(), before);

    fs::write(&ctx.paths.canvas, "[nonsense").expect("corrupt canvas");
    let err = ctx.engine.canvas_file_changed().unwrap_err();
    assert!(matches!(err, SyncError::Json { .. }));
    assert_eq!(ctx.engine.snapshot(), before);

    // The watch stays armed: a valid rewrite still goes through.
    fs::write(&ctx.paths.drawing, before.canonical_json()).expect("restore drawing");
    let mut fixed = before.clone();
    fixed
        .store
        .insert("n2".to_owned(), shape_record("n2", 1.0, 1.0, 10.0, 10.0, "Beta"));
    fs::write(&ctx.paths.drawing, fixed.canonical_json()).expect("valid rewrite");
    assert_eq!(
        ctx.engine.drawing_file_changed().expect("recovers"),
        TransitionOutcome::Applied
    );
}

#[rstest]
fn transitions_are_refused_while_a_file_phase_is_active(ctx: EngineTestCtx) {
    let diff = add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha"));
    let mut events = ctx.engine.subscribe();

    assert!(ctx.engine.try_begin(SyncPhase::FromCanvasFile));

    assert_eq!(
        ctx.engine.apply_live_patch(None, &diff).expect("live patch"),
        TransitionOutcome::Ignored
    );
    assert_eq!(
        ctx.engine.drawing_file_changed().expect("drawing change"),
        TransitionOutcome::Ignored
    );
    assert!(events.try_recv().is_err());
    assert!(ctx.engine.snapshot().store.is_empty());

    // Once the phase is released the same patch goes through.
    ctx.engine.end_phase();
    assert_eq!(
        ctx.engine.apply_live_patch(None, &diff).expect("live patch"),
        TransitionOutcome::Applied
    );
}

#[rstest]
fn engine_seeds_from_existing_files(ctx: EngineTestCtx) {
    ctx.engine
        .apply_live_patch(None, &add_shape_diff(shape_record("n1", 0.0, 0.0, 100.0, 50.0, "Alpha")))
        .expect("seed");

    // A second engine over the same directory picks up where we left off
    // and treats the on-disk state as its baseline.
    let reopened = SyncEngine::new(ctx.paths.clone()).expect("reopen");
    assert!(reopened.snapshot().store.contains_key("n1"));
    assert_eq!(
        reopened.drawing_file_changed().expect("baseline"),
        TransitionOutcome::NoChange
    );
    assert_eq!(
        reopened.canvas_file_changed().expect("baseline"),
        TransitionOutcome::NoChange
    );
}
