// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::ids::{NodeId, RelationId, ResourceId};

pub const MIME_PLAIN_TEXT: &str = "text/plain";
pub const MIME_MARKDOWN: &str = "text/markdown";

/// Display text for a node when no inline text, resource content or
/// location can be resolved.
pub const FALLBACK_NODE_TEXT: &str = "Node";

/// Visual kind of a canonical node.
///
/// `Arrow` marks the synthetic nodes that exist solely to give an edge
/// relation a position/size; converters skip them when emitting genuine
/// diagram nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rectangle,
    Oval,
    Arrow,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleHints {
    pub stroke_width: Option<f64>,
    pub stroke_color: Option<String>,
    pub fill_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNode {
    pub id: NodeId,
    pub position: Option<(f64, f64)>,
    pub size: Option<(f64, f64)>,
    pub resource: Option<ResourceId>,
    pub text: Option<String>,
    pub shape: ShapeKind,
    pub style: StyleHints,
}

impl CanonicalNode {
    pub fn new(id: NodeId, shape: ShapeKind) -> Self {
        Self {
            id,
            position: None,
            size: None,
            resource: None,
            text: None,
            shape,
            style: StyleHints::default(),
        }
    }

    pub fn is_arrow(&self) -> bool {
        self.shape == ShapeKind::Arrow
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    /// A binary edge between two nodes, backed by a synthetic arrow node.
    Edge {
        start: NodeId,
        end: NodeId,
        arrow: NodeId,
        label: String,
    },
    /// A grouping relation over member nodes; no start/end.
    Group { members: Vec<NodeId> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRelation {
    pub id: RelationId,
    pub kind: RelationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    pub mime_type: String,
    pub content: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResource {
    pub id: ResourceId,
    pub representations: Vec<Representation>,
}

impl CanonicalResource {
    pub fn inline(id: ResourceId, mime_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            representations: vec![Representation {
                mime_type: mime_type.into(),
                content: Some(content.into()),
                location: None,
            }],
        }
    }
}

/// The canonical graph interchange document: the lossless pivot format
/// between the live store, the canvas file and the rendered scene.
///
/// Instances are transient: rebuilt fresh on every conversion pass and
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    pub nodes: Vec<CanonicalNode>,
    pub relations: Vec<CanonicalRelation>,
    pub resources: Vec<CanonicalResource>,
}

impl GraphDocument {
    pub fn node(&self, id: &str) -> Option<&CanonicalNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }

    pub fn resource(&self, id: &str) -> Option<&CanonicalResource> {
        self.resources
            .iter()
            .find(|resource| resource.id.as_str() == id)
    }

    /// Resolves the display text for a node.
    ///
    /// Preference order: inline text; the referenced resource's
    /// `text/plain` content; its `text/markdown` content; any
    /// representation's external location; any representation's content;
    /// the literal fallback.
    pub fn display_text(&self, node: &CanonicalNode) -> String {
        if let Some(text) = node.text.as_deref() {
            return text.to_owned();
        }

        let resource = node
            .resource
            .as_ref()
            .and_then(|id| self.resource(id.as_str()));

        if let Some(resource) = resource {
            let content_for = |mime: &str| {
                resource
                    .representations
                    .iter()
                    .filter(|rep| rep.mime_type == mime)
                    .find_map(|rep| rep.content.as_deref())
            };

            if let Some(content) = content_for(MIME_PLAIN_TEXT) {
                return content.to_owned();
            }
            if let Some(content) = content_for(MIME_MARKDOWN) {
                return content.to_owned();
            }
            if let Some(location) = resource
                .representations
                .iter()
                .find_map(|rep| rep.location.as_deref())
            {
                return location.to_owned();
            }
            if let Some(content) = resource
                .representations
                .iter()
                .find_map(|rep| rep.content.as_deref())
            {
                return content.to_owned();
            }
        }

        FALLBACK_NODE_TEXT.to_owned()
    }

    /// Checks the structural invariants every conversion relies on: edge
    /// relations must reference existing endpoints, and synthetic arrow
    /// nodes and their backing relation must exist pairwise.
    pub fn check_invariants(&self) -> Result<(), GraphInvariantError> {
        for relation in &self.relations {
            if let RelationKind::Edge { start, end, arrow, .. } = &relation.kind {
                for endpoint in [start, end] {
                    if self.node(endpoint.as_str()).is_none() {
                        return Err(GraphInvariantError::MissingEndpoint {
                            relation_id: relation.id.clone(),
                            node_id: endpoint.clone(),
                        });
                    }
                }
                if self.node(arrow.as_str()).is_none() {
                    return Err(GraphInvariantError::MissingArrowNode {
                        relation_id: relation.id.clone(),
                        node_id: arrow.clone(),
                    });
                }
            }
        }

        for node in self.nodes.iter().filter(|node| node.is_arrow()) {
            let backed = self.relations.iter().any(|relation| {
                matches!(&relation.kind, RelationKind::Edge { arrow, .. } if arrow == &node.id)
            });
            if !backed {
                return Err(GraphInvariantError::OrphanArrowNode {
                    node_id: node.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphInvariantError {
    MissingEndpoint {
        relation_id: RelationId,
        node_id: NodeId,
    },
    MissingArrowNode {
        relation_id: RelationId,
        node_id: NodeId,
    },
    OrphanArrowNode {
        node_id: NodeId,
    },
}

impl fmt::Display for GraphInvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEndpoint {
                relation_id,
                node_id,
            } => write!(
                f,
                "edge relation {relation_id} references missing node {node_id}"
            ),
            Self::MissingArrowNode {
                relation_id,
                node_id,
            } => write!(
                f,
                "edge relation {relation_id} references missing arrow node {node_id}"
            ),
            Self::OrphanArrowNode { node_id } => {
                write!(f, "arrow node {node_id} has no backing edge relation")
            }
        }
    }
}

impl std::error::Error for GraphInvariantError {}

#[cfg(test)]
mod tests {
    use super::{
        CanonicalNode, CanonicalRelation, CanonicalResource, GraphDocument, GraphInvariantError,
        RelationKind, Representation, ShapeKind, MIME_MARKDOWN, MIME_PLAIN_TEXT,
    };
    use crate::model::{NodeId, RelationId, ResourceId};

    fn node(id: &str) -> CanonicalNode {
        CanonicalNode::new(NodeId::new(id).expect("node id"), ShapeKind::Rectangle)
    }

    fn doc_with_resource(representations: Vec<Representation>) -> (GraphDocument, CanonicalNode) {
        let mut node = node("n1");
        let resource_id = ResourceId::for_node(&node.id);
        node.resource = Some(resource_id.clone());
        let doc = GraphDocument {
            nodes: vec![node.clone()],
            relations: Vec::new(),
            resources: vec![CanonicalResource {
                id: resource_id,
                representations,
            }],
        };
        (doc, node)
    }

    #[test]
    fn inline_text_wins_over_resource_content() {
        let (mut doc, mut node) = doc_with_resource(vec![Representation {
            mime_type: MIME_PLAIN_TEXT.to_owned(),
            content: Some("from resource".to_owned()),
            location: None,
        }]);
        node.text = Some("inline".to_owned());
        doc.nodes[0] = node.clone();

        assert_eq!(doc.display_text(&node), "inline");
    }

    #[test]
    fn plain_text_representation_preferred_over_markdown() {
        let (doc, node) = doc_with_resource(vec![
            Representation {
                mime_type: MIME_MARKDOWN.to_owned(),
                content: Some("# md".to_owned()),
                location: None,
            },
            Representation {
                mime_type: MIME_PLAIN_TEXT.to_owned(),
                content: Some("plain".to_owned()),
                location: None,
            },
        ]);

        assert_eq!(doc.display_text(&node), "plain");
    }

    #[test]
    fn svg_location_beats_literal_fallback() {
        let (doc, node) = doc_with_resource(vec![Representation {
            mime_type: "image/svg+xml".to_owned(),
            content: None,
            location: Some("https://example.org/diagram.svg".to_owned()),
        }]);

        assert_eq!(doc.display_text(&node), "https://example.org/diagram.svg");
    }

    #[test]
    fn falls_back_to_literal_node_text() {
        let (doc, node) = doc_with_resource(Vec::new());
        assert_eq!(doc.display_text(&node), "Node");

        let lone = super::CanonicalNode::new(
            NodeId::new("n2").expect("node id"),
            ShapeKind::Rectangle,
        );
        assert_eq!(doc.display_text(&lone), "Node");
    }

    #[test]
    fn invariant_check_rejects_missing_endpoint() {
        let edge_id = RelationId::new("e1").expect("relation id");
        let arrow_id = NodeId::arrow_for_edge(&edge_id);
        let mut arrow = CanonicalNode::new(arrow_id.clone(), ShapeKind::Arrow);
        arrow.position = Some((0.0, 0.0));

        let doc = GraphDocument {
            nodes: vec![node("a"), arrow],
            relations: vec![CanonicalRelation {
                id: edge_id.clone(),
                kind: RelationKind::Edge {
                    start: NodeId::new("a").expect("node id"),
                    end: NodeId::new("missing").expect("node id"),
                    arrow: arrow_id,
                    label: String::new(),
                },
            }],
            resources: Vec::new(),
        };

        assert_eq!(
            doc.check_invariants(),
            Err(GraphInvariantError::MissingEndpoint {
                relation_id: edge_id,
                node_id: NodeId::new("missing").expect("node id"),
            })
        );
    }

    #[test]
    fn invariant_check_rejects_orphan_arrow_node() {
        let doc = GraphDocument {
            nodes: vec![CanonicalNode::new(
                NodeId::new("arrow-ghost").expect("node id"),
                ShapeKind::Arrow,
            )],
            relations: Vec::new(),
            resources: Vec::new(),
        };

        assert_eq!(
            doc.check_invariants(),
            Err(GraphInvariantError::OrphanArrowNode {
                node_id: NodeId::new("arrow-ghost").expect("node id"),
            })
        );
    }
}
