// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! SVG serialization of a resolved scene.

use std::fmt::Write;

use super::{Outline, Scene};

const EDGE_COLOR: &str = "#94a3b8";
const TEXT_COLOR: &str = "#1e293b";
const GROUP_FILL: &str = "#e0e0e0";
const GROUP_STROKE: &str = "#555555";
const NODE_CORNER_RADIUS: f64 = 8.0;
const FONT_SIZE: f64 = 14.0;

/// Renders a scene as a standalone SVG document. Groups and edges are
/// drawn first so nodes appear on top.
pub fn render_svg(scene: &Scene) -> String {
    let bounds = scene.bounds;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = write!(
        out,
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svg width=\"{w}\" height=\"{h}\" viewBox=\"{min_x} {min_y} {w} {h}\" ",
            "xmlns=\"http://www.w3.org/2000/svg\">\n",
            "<rect x=\"{min_x}\" y=\"{min_y}\" width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n",
            "<defs>\n",
            "<marker id=\"arrowhead\" markerWidth=\"10\" markerHeight=\"7\" ",
            "refX=\"9\" refY=\"3.5\" orient=\"auto\">\n",
            "<polygon points=\"0 0, 10 3.5, 0 7\" fill=\"{edge_color}\"/>\n",
            "</marker>\n",
            "</defs>\n",
        ),
        w = bounds.width(),
        h = bounds.height(),
        min_x = bounds.min_x,
        min_y = bounds.min_y,
        edge_color = EDGE_COLOR,
    );

    for group in &scene.groups {
        let _ = write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" \
             fill=\"{GROUP_FILL}\" stroke=\"{GROUP_STROKE}\" stroke-width=\"2\"/>\n",
            group.bounds.min_x,
            group.bounds.min_y,
            group.bounds.width(),
            group.bounds.height(),
        );
    }

    for edge in &scene.edges {
        let _ = write!(
            out,
            "<path d=\"M {} {} L {} {}\" stroke=\"{EDGE_COLOR}\" stroke-width=\"2\" \
             fill=\"none\" marker-end=\"url(#arrowhead)\" title=\"{}\"/>\n",
            edge.start.0,
            edge.start.1,
            edge.end.0,
            edge.end.1,
            escape_xml(&edge.label),
        );
    }

    for node in &scene.nodes {
        match node.outline {
            Outline::Ellipse => {
                let _ = write!(
                    out,
                    "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" \
                     fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>\n",
                    node.x + node.width / 2.0,
                    node.y + node.height / 2.0,
                    node.width / 2.0,
                    node.height / 2.0,
                    escape_xml(&node.fill_color),
                    escape_xml(&node.stroke_color),
                    node.stroke_width,
                );
            }
            Outline::Rectangle => {
                let _ = write!(
                    out,
                    "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" \
                     fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\" \
                     rx=\"{NODE_CORNER_RADIUS}\" ry=\"{NODE_CORNER_RADIUS}\"/>\n",
                    node.x,
                    node.y,
                    node.width,
                    node.height,
                    escape_xml(&node.fill_color),
                    escape_xml(&node.stroke_color),
                    node.stroke_width,
                );
            }
        }

        let (cx, cy) = node.center();
        let _ = write!(
            out,
            "<text text-anchor=\"middle\" dominant-baseline=\"middle\" \
             x=\"{cx}\" y=\"{cy}\" font-family=\"Arial\" font-size=\"{FONT_SIZE}\" \
             fill=\"{TEXT_COLOR}\">{}</text>\n",
            escape_xml(&node.text),
        );
    }

    out.push_str("</svg>\n");
    out
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
