// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use triptych::format::live::{rich_text_document, LiveRecord, LiveSnapshot, ShapeProps};

const PALETTE: [&str; 4] = ["blue", "green", "red", "yellow"];

/// A snapshot of `count` shapes laid out in a wide grid, plus the page
/// record every real store carries.
pub fn snapshot(count: usize) -> LiveSnapshot {
    let mut snapshot = LiveSnapshot::default();

    snapshot.store.insert(
        "page:main".to_owned(),
        LiveRecord {
            id: "page:main".to_owned(),
            type_name: "page".to_owned(),
            ..LiveRecord::default()
        },
    );

    for i in 0..count {
        let id = format!("shape:{i:05}");
        let record = LiveRecord {
            id: id.clone(),
            type_name: "shape".to_owned(),
            x: Some((i % 20) as f64 * 160.0),
            y: Some((i / 20) as f64 * 90.0),
            props: Some(ShapeProps {
                w: Some(120.0),
                h: Some(60.0),
                color: Some(PALETTE[i % PALETTE.len()].to_owned()),
                rich_text: Some(rich_text_document(&format!("Node {i}"))),
                extra: Default::default(),
            }),
            extra: Default::default(),
        };
        snapshot.store.insert(id, record);
    }

    snapshot
}

/// A copy of `base` with roughly a tenth of the shapes moved, one shape
/// removed and one added, so diffs hit every bucket.
pub fn mutated(base: &LiveSnapshot) -> LiveSnapshot {
    let mut new = base.clone();

    for (i, record) in new.store.values_mut().enumerate() {
        if record.type_name == "shape" && i % 10 == 0 {
            record.x = record.x.map(|x| x + 7.0);
        }
    }

    let first_shape = new
        .store
        .keys()
        .find(|id| id.starts_with("shape:"))
        .cloned();
    if let Some(id) = first_shape {
        new.store.remove(&id);
    }

    new.store.insert(
        "shape:fresh".to_owned(),
        LiveRecord {
            id: "shape:fresh".to_owned(),
            type_name: "shape".to_owned(),
            x: Some(-200.0),
            y: Some(-200.0),
            props: Some(ShapeProps {
                w: Some(120.0),
                h: Some(60.0),
                color: None,
                rich_text: Some(rich_text_document("Fresh")),
                extra: Default::default(),
            }),
            extra: Default::default(),
        },
    );

    new
}
