// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The shared color palette.
//!
//! JSON Canvas encodes preset colors as the strings `"1"`..`"6"`; the
//! canonical model and the live store use color names. Anything outside
//! the fixed palette passes through unchanged in both directions.

/// Preset canvas color codes mapped to color names.
pub const CANVAS_PRESETS: [(&str, &str); 6] = [
    ("1", "red"),
    ("2", "orange"),
    ("3", "yellow"),
    ("4", "green"),
    ("5", "cyan"),
    ("6", "purple"),
];

/// Named palette colors mapped back to hex for canvas output.
pub const NAMED_TO_HEX: [(&str, &str); 6] = [
    ("red", "#ff0000"),
    ("orange", "#ffa500"),
    ("yellow", "#ffff00"),
    ("green", "#00ff00"),
    ("cyan", "#00ffff"),
    ("purple", "#800080"),
];

/// Translates a canvas color (`"1"`..`"6"` or free-form) into the
/// canonical color vocabulary. Unknown strings pass through.
pub fn canvas_color_to_graph(color: &str) -> &str {
    for (code, name) in CANVAS_PRESETS {
        if color == code {
            return name;
        }
    }
    color
}

/// Translates a canonical color back into a canvas color string: fixed
/// palette names become hex, everything else passes through.
pub fn graph_color_to_canvas(color: &str) -> &str {
    for (name, hex) in NAMED_TO_HEX {
        if color == name {
            return hex;
        }
    }
    color
}
