// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Vector scene derivation and SVG rendering.
//!
//! A [`Scene`] is a fully resolved picture of a graph document: every
//! node has concrete coordinates and style, every edge has its boundary
//! attachment points computed, and the overall canvas bounds are known.
//! Rendering to SVG is a plain serialization of the scene.

pub mod geometry;
mod svg;

pub use geometry::{boundary_intersection, Bounds, Outline};
pub use svg::render_svg;

use crate::format::canvas::grid_position;
use crate::model::{GraphDocument, NodeId, RelationId, RelationKind, ShapeKind, MIME_MARKDOWN};

const DEFAULT_NODE_WIDTH: f64 = 120.0;
const DEFAULT_NODE_HEIGHT: f64 = 60.0;
const MARKDOWN_NODE_SIZE: f64 = 100.0;
const DEFAULT_STROKE_WIDTH: f64 = 2.0;
const DEFAULT_STROKE_COLOR: &str = "#64748b";
const DEFAULT_FILL_COLOR: &str = "#f8fafc";
const SCENE_MARGIN: f64 = 50.0;
const EMPTY_SCENE_WIDTH: f64 = 800.0;
const EMPTY_SCENE_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    pub outline: Outline,
    pub stroke_width: f64,
    pub stroke_color: String,
    pub fill_color: String,
}

impl SceneNode {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::of_rect(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGroup {
    pub id: RelationId,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
    pub groups: Vec<SceneGroup>,
    pub bounds: Bounds,
}

/// Resolves a graph document into a drawable scene.
///
/// Synthetic arrow nodes are skipped (edges draw themselves); nodes
/// without explicit geometry fall back to the shared deterministic grid.
/// Edges whose endpoints are missing from the scene are dropped, as are
/// groups with no resolvable members.
pub fn scene_from_graph(doc: &GraphDocument) -> Scene {
    let mut nodes = Vec::new();

    for (index, node) in doc.nodes.iter().enumerate() {
        if node.is_arrow() {
            continue;
        }

        let (width, height) = node.size.unwrap_or_else(|| {
            if has_markdown_representation(doc, node) {
                (MARKDOWN_NODE_SIZE, MARKDOWN_NODE_SIZE)
            } else {
                (DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT)
            }
        });
        let (x, y) = node
            .position
            .unwrap_or_else(|| grid_position(index, width, height));

        nodes.push(SceneNode {
            id: node.id.clone(),
            x,
            y,
            width,
            height,
            text: doc.display_text(node),
            outline: match node.shape {
                ShapeKind::Oval => Outline::Ellipse,
                _ => Outline::Rectangle,
            },
            stroke_width: node.style.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
            stroke_color: node
                .style
                .stroke_color
                .clone()
                .unwrap_or_else(|| DEFAULT_STROKE_COLOR.to_owned()),
            fill_color: node
                .style
                .fill_color
                .clone()
                .unwrap_or_else(|| DEFAULT_FILL_COLOR.to_owned()),
        });
    }

    let mut edges = Vec::new();
    let mut groups = Vec::new();

    for relation in &doc.relations {
        match &relation.kind {
            RelationKind::Edge {
                start, end, label, ..
            } => {
                let find = |id: &NodeId| nodes.iter().find(|node| &node.id == id);
                let (Some(from), Some(to)) = (find(start), find(end)) else {
                    continue;
                };

                let start_point = boundary_intersection(
                    from.center(),
                    to.center(),
                    (from.width / 2.0, from.height / 2.0),
                    from.outline,
                );
                let end_point = boundary_intersection(
                    to.center(),
                    from.center(),
                    (to.width / 2.0, to.height / 2.0),
                    to.outline,
                );

                edges.push(SceneEdge {
                    from: start.clone(),
                    to: end.clone(),
                    start: start_point,
                    end: end_point,
                    label: label.clone(),
                });
            }
            RelationKind::Group { members } => {
                let mut bounds: Option<Bounds> = None;
                for member in members {
                    if let Some(node) = nodes.iter().find(|node| &node.id == member) {
                        let node_bounds = node.bounds();
                        bounds = Some(match bounds {
                            Some(acc) => acc.union(&node_bounds),
                            None => node_bounds,
                        });
                    }
                }
                if let Some(bounds) = bounds {
                    groups.push(SceneGroup {
                        id: relation.id.clone(),
                        bounds: bounds.expand(SCENE_MARGIN),
                    });
                }
            }
        }
    }

    let bounds = nodes
        .iter()
        .map(SceneNode::bounds)
        .reduce(|acc, bounds| acc.union(&bounds))
        .map(|bounds| bounds.expand(SCENE_MARGIN))
        .unwrap_or(Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: EMPTY_SCENE_WIDTH,
            max_y: EMPTY_SCENE_HEIGHT,
        });

    Scene {
        nodes,
        edges,
        groups,
        bounds,
    }
}

fn has_markdown_representation(doc: &GraphDocument, node: &crate::model::CanonicalNode) -> bool {
    node.resource
        .as_ref()
        .and_then(|id| doc.resource(id.as_str()))
        .map(|resource| {
            resource
                .representations
                .iter()
                .any(|rep| rep.mime_type == MIME_MARKDOWN)
        })
        .unwrap_or(false)
}
