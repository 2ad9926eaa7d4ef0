// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The JSON Canvas format (`*.canvas`) and its conversion to/from the
//! canonical graph model.
//!
//! The canvas schema is simpler than the canonical one: group nodes have
//! no canonical counterpart and are dropped when converting toward the
//! graph, and edge sides/colors are presentation-only. The two directions
//! are deliberately asymmetric about missing edge endpoints: converting a
//! canvas document fails with a structural error, while converting a
//! graph document silently drops the relation.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::format::palette::{canvas_color_to_graph, graph_color_to_canvas};
use crate::model::{
    CanonicalNode, CanonicalRelation, CanonicalResource, GraphDocument, IdError, NodeId,
    RelationId, RelationKind, ResourceId, ShapeKind, MIME_MARKDOWN, MIME_PLAIN_TEXT,
};

pub const DEFAULT_NODE_WIDTH: f64 = 120.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 60.0;
const GRID_ORIGIN: f64 = 50.0;
const GRID_SPACING: f64 = 100.0;
const DEFAULT_FILL_COLOR: &str = "#ffffff";
const DEFAULT_STROKE_COLOR: &str = "black";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasDocument {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
}

/// Fields shared by all canvas node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasNodeBase {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CanvasNode {
    Text {
        #[serde(flatten)]
        base: CanvasNodeBase,
        text: String,
    },
    File {
        #[serde(flatten)]
        base: CanvasNodeBase,
        file: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subpath: Option<String>,
    },
    Link {
        #[serde(flatten)]
        base: CanvasNodeBase,
        url: String,
    },
    Group {
        #[serde(flatten)]
        base: CanvasNodeBase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        background: Option<String>,
    },
}

impl CanvasNode {
    pub fn base(&self) -> &CanvasNodeBase {
        match self {
            Self::Text { base, .. }
            | Self::File { base, .. }
            | Self::Link { base, .. }
            | Self::Group { base, .. } => base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    /// The node's inline content (text, file path or URL), if any.
    ///
    /// An empty text body counts as no content; such nodes get no
    /// resource when converted to the canonical model.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => {
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Self::File { file, .. } => Some(file),
            Self::Link { url, .. } => Some(url),
            Self::Group { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasEdge {
    pub id: String,
    #[serde(rename = "fromNode")]
    pub from_node: String,
    #[serde(rename = "toNode")]
    pub to_node: String,
    #[serde(default, rename = "fromSide", skip_serializing_if = "Option::is_none")]
    pub from_side: Option<Side>,
    #[serde(default, rename = "toSide", skip_serializing_if = "Option::is_none")]
    pub to_side: Option<Side>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasConvertError {
    /// An edge references a node id absent from the sibling node list.
    MissingEdgeEndpoint { edge_id: String, node_id: String },
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
}

impl fmt::Display for CanvasConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEdgeEndpoint { edge_id, node_id } => {
                write!(f, "canvas edge {edge_id} references missing node {node_id}")
            }
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
        }
    }
}

impl std::error::Error for CanvasConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingEdgeEndpoint { .. } => None,
            Self::InvalidId { source, .. } => Some(source),
        }
    }
}

fn node_id(field: &'static str, value: &str) -> Result<NodeId, CanvasConvertError> {
    NodeId::new(value).map_err(|source| CanvasConvertError::InvalidId {
        field,
        value: value.to_owned(),
        source,
    })
}

/// Converts a canonical graph document into a canvas document.
///
/// Arrow nodes are skipped; nodes without explicit coordinates fall back
/// to a deterministic 3-column grid so they still lay out without
/// overlap. Edge relations whose endpoints are not among the emitted
/// nodes are dropped without error.
pub fn graph_to_canvas(doc: &GraphDocument) -> CanvasDocument {
    let mut nodes = Vec::new();

    for (index, node) in doc.nodes.iter().enumerate() {
        if node.is_arrow() {
            continue;
        }

        let (width, height) = node.size.unwrap_or((DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT));
        let (x, y) = node.position.unwrap_or_else(|| grid_position(index, width, height));

        let color = node
            .style
            .fill_color
            .as_deref()
            .unwrap_or(DEFAULT_FILL_COLOR);

        nodes.push(CanvasNode::Text {
            base: CanvasNodeBase {
                id: node.id.as_str().to_owned(),
                x,
                y,
                width,
                height,
                color: Some(graph_color_to_canvas(color).to_owned()),
            },
            text: doc.display_text(node),
        });
    }

    let mut edges = Vec::new();
    for relation in &doc.relations {
        let RelationKind::Edge { start, end, label, .. } = &relation.kind else {
            continue;
        };

        let resolved = |id: &NodeId| nodes.iter().any(|node| node.id() == id.as_str());
        if !resolved(start) || !resolved(end) {
            // Asymmetric with canvas_to_graph: dangling relations are
            // dropped here, not reported.
            continue;
        }

        edges.push(CanvasEdge {
            id: uuid::Uuid::new_v4().simple().to_string(),
            from_node: start.as_str().to_owned(),
            to_node: end.as_str().to_owned(),
            from_side: Some(Side::Right),
            to_side: Some(Side::Left),
            color: None,
            label: if label.is_empty() {
                None
            } else {
                Some(label.clone())
            },
        });
    }

    CanvasDocument { nodes, edges }
}

pub(crate) fn grid_position(index: usize, width: f64, height: f64) -> (f64, f64) {
    let col = (index % 3) as f64;
    let row = (index / 3) as f64;
    (
        GRID_ORIGIN + col * (width + GRID_SPACING),
        GRID_ORIGIN + row * (height + GRID_SPACING),
    )
}

/// Converts a canvas document into the canonical graph model.
///
/// Group nodes are dropped (the canonical model cannot express them).
/// Each edge synthesizes an arrow node positioned at the source node's
/// center whose size is the center-to-origin vector toward the target —
/// a vector proxy, not a true bounding box. Fails if an edge endpoint
/// cannot be resolved among the input nodes.
pub fn canvas_to_graph(doc: &CanvasDocument) -> Result<GraphDocument, CanvasConvertError> {
    let mut graph = GraphDocument::default();

    for node in &doc.nodes {
        if matches!(node, CanvasNode::Group { .. }) {
            continue;
        }

        let base = node.base();
        let id = node_id("canvas node id", &base.id)?;

        let resource = node.content().map(|content| {
            let mime = match node {
                CanvasNode::Text { .. } => MIME_MARKDOWN,
                _ => MIME_PLAIN_TEXT,
            };
            CanonicalResource::inline(ResourceId::for_node(&id), mime, content)
        });

        let mut canonical = CanonicalNode::new(id, ShapeKind::Rectangle);
        canonical.position = Some((base.x, base.y));
        canonical.size = Some((base.width, base.height));
        canonical.style.stroke_color = Some(
            base.color
                .as_deref()
                .map(canvas_color_to_graph)
                .unwrap_or(DEFAULT_STROKE_COLOR)
                .to_owned(),
        );
        canonical.style.fill_color = base
            .color
            .as_deref()
            .map(|color| canvas_color_to_graph(color).to_owned());

        if let Some(resource) = resource {
            canonical.resource = Some(resource.id.clone());
            graph.resources.push(resource);
        }
        graph.nodes.push(canonical);
    }

    for edge in &doc.edges {
        let from = doc
            .nodes
            .iter()
            .find(|node| node.id() == edge.from_node)
            .ok_or_else(|| CanvasConvertError::MissingEdgeEndpoint {
                edge_id: edge.id.clone(),
                node_id: edge.from_node.clone(),
            })?;
        let to = doc
            .nodes
            .iter()
            .find(|node| node.id() == edge.to_node)
            .ok_or_else(|| CanvasConvertError::MissingEdgeEndpoint {
                edge_id: edge.id.clone(),
                node_id: edge.to_node.clone(),
            })?;

        let edge_id =
            RelationId::new(&edge.id).map_err(|source| CanvasConvertError::InvalidId {
                field: "canvas edge id",
                value: edge.id.clone(),
                source,
            })?;
        let arrow_id = NodeId::arrow_for_edge(&edge_id);

        let from_base = from.base();
        let to_base = to.base();
        let mut arrow = CanonicalNode::new(arrow_id.clone(), ShapeKind::Arrow);
        arrow.position = Some((
            from_base.x + from_base.width / 2.0,
            from_base.y + from_base.height / 2.0,
        ));
        arrow.size = Some((to_base.x - from_base.x, to_base.y - from_base.y));
        graph.nodes.push(arrow);

        graph.relations.push(CanonicalRelation {
            id: edge_id,
            kind: RelationKind::Edge {
                start: node_id("canvas edge fromNode", &edge.from_node)?,
                end: node_id("canvas edge toNode", &edge.to_node)?,
                arrow: arrow_id,
                label: edge.label.clone().unwrap_or_default(),
            },
        });
    }

    Ok(graph)
}
