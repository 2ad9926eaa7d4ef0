// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The live shape-store snapshot format and its structural diffs.
//!
//! Only records with `typeName == "shape"` are interpreted; every other
//! record (page, camera, instance, pointer, ...) passes through the
//! flattened `extra` map untouched so a snapshot survives a parse/apply/
//! serialize cycle without losing store metadata. For the same reason the
//! reverse of [`live_to_graph`] is not a whole-snapshot converter: the
//! sync engine builds targeted single-record patches with
//! [`patched_shape_record`] instead.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::format::palette::graph_color_to_canvas;
use crate::model::{
    CanonicalNode, CanonicalResource, GraphDocument, IdError, NodeId, ResourceId, ShapeKind,
    MIME_PLAIN_TEXT,
};

/// Display text for a shape whose rich-text payload has no text run.
pub const DEFAULT_SHAPE_TEXT: &str = "test";

const RECORD_TYPE_SHAPE: &str = "shape";
const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const DEFAULT_STROKE_COLOR: &str = "#000000";
const DEFAULT_FILL_COLOR: &str = "#ffffff";

/// A full store snapshot: records keyed by id plus an opaque schema blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    #[serde(default)]
    pub store: BTreeMap<String, LiveRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveRecord {
    pub id: String,
    #[serde(rename = "typeName")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<ShapeProps>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LiveRecord {
    pub fn is_shape(&self) -> bool {
        self.type_name == RECORD_TYPE_SHAPE
    }

    /// The shape's display text: the first text run of the rich-text
    /// payload, or the fixed default.
    pub fn shape_text(&self) -> &str {
        self.props
            .as_ref()
            .and_then(|props| props.rich_text.as_ref())
            .and_then(first_text_run)
            .unwrap_or(DEFAULT_SHAPE_TEXT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, rename = "richText", skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A structural diff between two snapshots, in the live store's own wire
/// format: `updated` entries are `[before, after]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDiff {
    #[serde(default)]
    pub added: BTreeMap<String, LiveRecord>,
    #[serde(default)]
    pub removed: BTreeMap<String, LiveRecord>,
    #[serde(default)]
    pub updated: BTreeMap<String, (LiveRecord, LiveRecord)>,
}

impl StoreDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Computes the record-level diff from `old` to `new`.
pub fn diff_snapshots(old: &LiveSnapshot, new: &LiveSnapshot) -> StoreDiff {
    let mut diff = StoreDiff::default();

    for (id, record) in &new.store {
        match old.store.get(id) {
            None => {
                diff.added.insert(id.clone(), record.clone());
            }
            Some(before) if before != record => {
                diff.updated
                    .insert(id.clone(), (before.clone(), record.clone()));
            }
            Some(_) => {}
        }
    }
    for (id, record) in &old.store {
        if !new.store.contains_key(id) {
            diff.removed.insert(id.clone(), record.clone());
        }
    }

    diff
}

impl LiveSnapshot {
    /// Applies a structural diff in place. Last writer wins: `updated`
    /// entries overwrite whatever is stored regardless of the diff's
    /// `before` image.
    pub fn apply_diff(&mut self, diff: &StoreDiff) {
        for (id, record) in &diff.added {
            self.store.insert(id.clone(), record.clone());
        }
        for id in diff.removed.keys() {
            self.store.remove(id);
        }
        for (id, (_, after)) in &diff.updated {
            self.store.insert(id.clone(), after.clone());
        }
    }

    /// The canonical serialized form used for change-marker comparison.
    /// Record order is fixed by the underlying map, so equal snapshots
    /// always serialize identically.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("snapshot serializes")
    }
}

#[derive(Debug)]
pub enum LiveConvertError {
    InvalidRecordId { value: String, source: IdError },
}

impl fmt::Display for LiveConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRecordId { value, source } => {
                write!(f, "invalid shape record id {value:?}: {source}")
            }
        }
    }
}

impl std::error::Error for LiveConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRecordId { source, .. } => Some(source),
        }
    }
}

/// Converts the shape records of a snapshot into the canonical model:
/// one rectangle node plus one `text/plain` resource per shape.
pub fn live_to_graph(snapshot: &LiveSnapshot) -> Result<GraphDocument, LiveConvertError> {
    let mut graph = GraphDocument::default();

    for record in snapshot.store.values() {
        if !record.is_shape() {
            continue;
        }

        let id = NodeId::new(&record.id).map_err(|source| LiveConvertError::InvalidRecordId {
            value: record.id.clone(),
            source,
        })?;
        let resource_id = ResourceId::for_node(&id);

        graph.resources.push(CanonicalResource::inline(
            resource_id.clone(),
            MIME_PLAIN_TEXT,
            record.shape_text(),
        ));

        let mut node = CanonicalNode::new(id, ShapeKind::Rectangle);
        node.resource = Some(resource_id);
        if let (Some(x), Some(y)) = (record.x, record.y) {
            node.position = Some((x, y));
        }
        if let Some(props) = &record.props {
            if let (Some(w), Some(h)) = (props.w, props.h) {
                node.size = Some((w, h));
            }
        }
        node.style.stroke_width = Some(DEFAULT_STROKE_WIDTH);
        node.style.stroke_color = Some(DEFAULT_STROKE_COLOR.to_owned());
        node.style.fill_color = Some(
            record
                .props
                .as_ref()
                .and_then(|props| props.color.as_deref())
                .map(graph_color_to_canvas)
                .unwrap_or(DEFAULT_FILL_COLOR)
                .to_owned(),
        );
        graph.nodes.push(node);
    }

    Ok(graph)
}

/// A field-level update for a single shape record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeUpdate {
    pub text: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ShapeUpdate {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }
}

/// Clones a shape record and applies the update field by field, leaving
/// everything else (rotation, bindings, meta, ...) exactly as stored.
pub fn patched_shape_record(record: &LiveRecord, update: &ShapeUpdate) -> LiveRecord {
    let mut patched = record.clone();

    if let Some(x) = update.x {
        patched.x = Some(x);
    }
    if let Some(y) = update.y {
        patched.y = Some(y);
    }
    if update.width.is_some() || update.height.is_some() || update.text.is_some() {
        let props = patched.props.get_or_insert_with(ShapeProps::default);
        if let Some(w) = update.width {
            props.w = Some(w);
        }
        if let Some(h) = update.height {
            props.h = Some(h);
        }
        if let Some(text) = &update.text {
            match props.rich_text.as_mut() {
                Some(rich_text) => set_first_text_run(rich_text, text),
                None => props.rich_text = Some(rich_text_document(text)),
            }
        }
    }

    patched
}

/// Extracts the first text run: the fixed `/content/0/content/0/text`
/// path first, then a depth-first scan for any `text` string.
fn first_text_run(rich_text: &Value) -> Option<&str> {
    if let Some(text) = rich_text
        .pointer("/content/0/content/0/text")
        .and_then(Value::as_str)
    {
        return Some(text);
    }
    scan_for_text(rich_text)
}

fn scan_for_text(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                return Some(text);
            }
            map.values().find_map(scan_for_text)
        }
        Value::Array(items) => items.iter().find_map(scan_for_text),
        _ => None,
    }
}

/// Overwrites the first text run in place, or rebuilds the payload as a
/// minimal document when the expected structure is absent.
fn set_first_text_run(rich_text: &mut Value, text: &str) {
    if let Some(slot) = rich_text.pointer_mut("/content/0/content/0/text") {
        *slot = Value::String(text.to_owned());
    } else {
        *rich_text = rich_text_document(text);
    }
}

/// A minimal rich-text document holding a single paragraph of text.
pub fn rich_text_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        }]
    })
}
