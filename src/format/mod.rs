// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stateless converters between the canonical graph model and the three
//! concrete formats: the OCIF interchange file, the JSON Canvas file and
//! the live shape-store snapshot.

pub mod canvas;
pub mod live;
pub mod ocif;
pub mod palette;

pub use canvas::{canvas_to_graph, graph_to_canvas, CanvasConvertError, CanvasDocument};
pub use live::{
    diff_snapshots, live_to_graph, patched_shape_record, LiveConvertError, LiveRecord,
    LiveSnapshot, ShapeUpdate, StoreDiff,
};
pub use ocif::{export_document, parse_document, OcifDocument, OcifError, OCIF_VERSION};
