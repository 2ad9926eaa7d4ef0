// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The canonical graph model: nodes, relations and resources.
//!
//! This is the lossless pivot format every converter goes through. Model
//! values are transient; they are rebuilt on each conversion pass and the
//! sync engine only retains serialized snapshots for change detection.

pub mod graph;
pub mod ids;

pub use graph::{
    CanonicalNode, CanonicalRelation, CanonicalResource, GraphDocument, GraphInvariantError,
    RelationKind, Representation, ShapeKind, StyleHints, FALLBACK_NODE_TEXT, MIME_MARKDOWN,
    MIME_PLAIN_TEXT,
};
pub use ids::{Id, IdError, NodeId, RelationId, ResourceId};
