// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The OCIF interchange format (`*.ocif.json`).
//!
//! The wire structs mirror the published JSON schema exactly; conversion
//! to and from [`GraphDocument`] is lossy only for extension payloads we
//! do not model (unknown `data` entry types are ignored on the way in and
//! never produced on the way out).

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{
    CanonicalNode, CanonicalRelation, CanonicalResource, GraphDocument, IdError, NodeId,
    RelationId, RelationKind, Representation, ResourceId, ShapeKind,
};

pub const OCIF_VERSION: &str = "https://canvasprotocol.org/ocif/0.5";

pub const NODE_TYPE_RECT: &str = "@ocif/node/rect";
pub const NODE_TYPE_RECTANGLE: &str = "@ocif/node/rectangle";
pub const NODE_TYPE_OVAL: &str = "@ocif/node/oval";
pub const NODE_TYPE_ARROW: &str = "@ocif/node/arrow";
pub const REL_TYPE_EDGE: &str = "@ocif/rel/edge";
pub const REL_TYPE_GROUP: &str = "@ocif/rel/group";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifDocument {
    pub ocif: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<OcifNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<OcifRelation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<OcifResource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<OcifNodeData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifNodeData {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(
        default,
        rename = "strokeWidth",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_width: Option<f64>,
    #[serde(
        default,
        rename = "strokeColor",
        skip_serializing_if = "Option::is_none"
    )]
    pub stroke_color: Option<String>,
    #[serde(default, rename = "fillColor", skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifRelation {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<OcifRelationData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifRelationData {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifResource {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub representations: Vec<OcifRepresentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OcifRepresentation {
    #[serde(rename = "mime-type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug)]
pub enum OcifError {
    Json(serde_json::Error),
    InvalidId {
        field: &'static str,
        value: String,
        source: IdError,
    },
    EdgeWithoutEndpoints {
        relation_id: String,
    },
}

impl fmt::Display for OcifError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid interchange JSON: {err}"),
            Self::InvalidId {
                field,
                value,
                source,
            } => write!(f, "invalid id for {field}: {value:?}: {source}"),
            Self::EdgeWithoutEndpoints { relation_id } => {
                write!(f, "edge relation {relation_id} lacks start or end")
            }
        }
    }
}

impl std::error::Error for OcifError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::InvalidId { source, .. } => Some(source),
            Self::EdgeWithoutEndpoints { .. } => None,
        }
    }
}

impl From<serde_json::Error> for OcifError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

fn node_id(field: &'static str, value: &str) -> Result<NodeId, OcifError> {
    NodeId::new(value).map_err(|source| OcifError::InvalidId {
        field,
        value: value.to_owned(),
        source,
    })
}

fn shape_kind(node: &OcifNode) -> ShapeKind {
    match node.data.first().map(|data| data.node_type.as_str()) {
        Some(NODE_TYPE_OVAL) => ShapeKind::Oval,
        Some(NODE_TYPE_ARROW) => ShapeKind::Arrow,
        Some(NODE_TYPE_RECT) | Some(NODE_TYPE_RECTANGLE) => ShapeKind::Rectangle,
        // Unknown node data (and its absence) also means rectangle.
        _ => ShapeKind::Rectangle,
    }
}

/// Parses interchange JSON into the canonical model.
pub fn parse_document(raw: &str) -> Result<GraphDocument, OcifError> {
    let wire: OcifDocument = serde_json::from_str(raw)?;
    graph_from_wire(&wire)
}

pub fn graph_from_wire(wire: &OcifDocument) -> Result<GraphDocument, OcifError> {
    let mut graph = GraphDocument::default();

    for node in &wire.nodes {
        let id = node_id("node id", &node.id)?;
        let mut canonical = CanonicalNode::new(id, shape_kind(node));
        canonical.position = node.position.map(|[x, y]| (x, y));
        canonical.size = node.size.map(|[w, h]| (w, h));
        canonical.text = node.text.clone();
        if let Some(resource) = &node.resource {
            canonical.resource =
                Some(
                    ResourceId::new(resource.as_str()).map_err(|source| OcifError::InvalidId {
                        field: "node resource",
                        value: resource.clone(),
                        source,
                    })?,
                );
        }
        if let Some(data) = node.data.first() {
            canonical.style.stroke_width = data.stroke_width;
            canonical.style.stroke_color = data.stroke_color.clone();
            canonical.style.fill_color = data.fill_color.clone();
        }
        graph.nodes.push(canonical);
    }

    for relation in &wire.relations {
        let id = RelationId::new(&relation.id).map_err(|source| OcifError::InvalidId {
            field: "relation id",
            value: relation.id.clone(),
            source,
        })?;

        // The first entry of a recognized type wins; anything else in the
        // data array is an extension we do not model.
        let Some(kind) = relation
            .data
            .iter()
            .find_map(|data| relation_kind(&relation.id, &id, data).transpose())
            .transpose()?
        else {
            continue;
        };

        graph.relations.push(CanonicalRelation { id, kind });
    }

    for resource in &wire.resources {
        let id = ResourceId::new(&resource.id).map_err(|source| OcifError::InvalidId {
            field: "resource id",
            value: resource.id.clone(),
            source,
        })?;
        graph.resources.push(CanonicalResource {
            id,
            representations: resource
                .representations
                .iter()
                .map(|rep| Representation {
                    mime_type: rep.mime_type.clone(),
                    content: rep.content.clone(),
                    location: rep.location.clone(),
                })
                .collect(),
        });
    }

    Ok(graph)
}

fn relation_kind(
    raw_id: &str,
    id: &RelationId,
    data: &OcifRelationData,
) -> Result<Option<RelationKind>, OcifError> {
    match data.rel_type.as_str() {
        REL_TYPE_EDGE => {
            let (Some(start), Some(end)) = (&data.start, &data.end) else {
                return Err(OcifError::EdgeWithoutEndpoints {
                    relation_id: raw_id.to_owned(),
                });
            };
            let arrow = match &data.node {
                Some(node) => node_id("edge arrow node", node)?,
                None => NodeId::arrow_for_edge(id),
            };
            Ok(Some(RelationKind::Edge {
                start: node_id("edge start", start)?,
                end: node_id("edge end", end)?,
                arrow,
                label: data.rel.clone().unwrap_or_default(),
            }))
        }
        REL_TYPE_GROUP => {
            let members = data
                .members
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|member| node_id("group member", member))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(RelationKind::Group { members }))
        }
        _ => Ok(None),
    }
}

/// Serializes the canonical model as pretty-printed interchange JSON.
pub fn export_document(graph: &GraphDocument) -> String {
    let wire = wire_from_graph(graph);
    // The wire structs contain nothing a serializer can reject.
    serde_json::to_string_pretty(&wire).expect("interchange document serializes")
}

pub fn wire_from_graph(graph: &GraphDocument) -> OcifDocument {
    let mut wire = OcifDocument {
        ocif: OCIF_VERSION.to_owned(),
        ..OcifDocument::default()
    };

    for node in &graph.nodes {
        let node_type = match node.shape {
            ShapeKind::Rectangle => NODE_TYPE_RECT,
            ShapeKind::Oval => NODE_TYPE_OVAL,
            ShapeKind::Arrow => NODE_TYPE_ARROW,
        };
        wire.nodes.push(OcifNode {
            id: node.id.as_str().to_owned(),
            position: node.position.map(|(x, y)| [x, y]),
            size: node.size.map(|(w, h)| [w, h]),
            resource: node.resource.as_ref().map(|id| id.as_str().to_owned()),
            text: node.text.clone(),
            data: vec![OcifNodeData {
                node_type: node_type.to_owned(),
                stroke_width: node.style.stroke_width,
                stroke_color: node.style.stroke_color.clone(),
                fill_color: node.style.fill_color.clone(),
            }],
        });
    }

    for relation in &graph.relations {
        let data = match &relation.kind {
            RelationKind::Edge {
                start,
                end,
                arrow,
                label,
            } => OcifRelationData {
                rel_type: REL_TYPE_EDGE.to_owned(),
                start: Some(start.as_str().to_owned()),
                end: Some(end.as_str().to_owned()),
                rel: Some(label.clone()),
                node: Some(arrow.as_str().to_owned()),
                members: None,
            },
            RelationKind::Group { members } => OcifRelationData {
                rel_type: REL_TYPE_GROUP.to_owned(),
                start: None,
                end: None,
                rel: None,
                node: None,
                members: Some(
                    members
                        .iter()
                        .map(|member| member.as_str().to_owned())
                        .collect(),
                ),
            },
        };
        wire.relations.push(OcifRelation {
            id: relation.id.as_str().to_owned(),
            data: vec![data],
        });
    }

    for resource in &graph.resources {
        wire.resources.push(OcifResource {
            id: resource.id.as_str().to_owned(),
            representations: resource
                .representations
                .iter()
                .map(|rep| OcifRepresentation {
                    mime_type: rep.mime_type.clone(),
                    content: rep.content.clone(),
                    location: rep.location.clone(),
                })
                .collect(),
        });
    }

    wire
}
