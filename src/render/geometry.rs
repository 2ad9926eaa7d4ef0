// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Triptych-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Triptych and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Axis-aligned bounds and shape-boundary intersection.

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// The outline an edge endpoint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    Rectangle,
    Ellipse,
}

/// The point where the ray from a shape's center toward `target` leaves
/// the shape's boundary.
///
/// Rectangles use a slab test: the ray exits through whichever
/// half-extent it reaches first. Ellipses use the closed-form polar
/// radius `t = 1/sqrt((cos θ/a)² + (sin θ/b)²)`.
pub fn boundary_intersection(
    center: (f64, f64),
    target: (f64, f64),
    half_extents: (f64, f64),
    outline: Outline,
) -> (f64, f64) {
    let (cx, cy) = center;
    let dx = target.0 - cx;
    let dy = target.1 - cy;
    let (half_width, half_height) = half_extents;

    match outline {
        Outline::Rectangle => {
            let length = (dx * dx + dy * dy).sqrt();
            if length == 0.0 {
                return center;
            }
            let dir_x = dx / length;
            let dir_y = dy / length;

            // Near-axis directions would blow up the division.
            let tx = if dir_x.abs() < 0.01 {
                f64::INFINITY
            } else {
                half_width / dir_x.abs()
            };
            let ty = if dir_y.abs() < 0.01 {
                f64::INFINITY
            } else {
                half_height / dir_y.abs()
            };
            let t = tx.min(ty);

            (cx + dir_x * t, cy + dir_y * t)
        }
        Outline::Ellipse => {
            let angle = dy.atan2(dx);
            let t = 1.0
                / ((angle.cos() / half_width).powi(2) + (angle.sin() / half_height).powi(2))
                    .sqrt();
            (cx + angle.cos() * t, cy + angle.sin() * t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{boundary_intersection, Bounds, Outline};

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn horizontal_ray_exits_through_the_vertical_edge() {
        // A 100x50 rectangle centered at (50, 25), aimed at a target far
        // to the right: the exit point is the middle of the right edge.
        let point = boundary_intersection(
            (50.0, 25.0),
            (350.0, 25.0),
            (50.0, 25.0),
            Outline::Rectangle,
        );
        assert_close(point, (100.0, 25.0));
    }

    #[test]
    fn diagonal_ray_exits_through_the_nearer_slab() {
        // Wide flat rectangle, 45 degree ray: the height slab is reached
        // first.
        let point = boundary_intersection(
            (0.0, 0.0),
            (100.0, 100.0),
            (50.0, 25.0),
            Outline::Rectangle,
        );
        // dir = (1/sqrt2, 1/sqrt2); ty = 25*sqrt2 beats tx = 50*sqrt2.
        assert_close(point, (25.0, 25.0));
    }

    #[test]
    fn ellipse_intersection_on_the_major_axis() {
        let point = boundary_intersection(
            (0.0, 0.0),
            (500.0, 0.0),
            (60.0, 30.0),
            Outline::Ellipse,
        );
        assert_close(point, (60.0, 0.0));
    }

    #[test]
    fn ellipse_intersection_on_the_minor_axis() {
        let point = boundary_intersection(
            (0.0, 0.0),
            (0.0, -500.0),
            (60.0, 30.0),
            Outline::Ellipse,
        );
        assert_close(point, (0.0, -30.0));
    }

    #[test]
    fn bounds_union_and_expand() {
        let a = Bounds::of_rect(0.0, 0.0, 100.0, 50.0);
        let b = Bounds::of_rect(300.0, -20.0, 100.0, 50.0);
        let union = a.union(&b);
        assert_eq!(union, Bounds {
            min_x: 0.0,
            min_y: -20.0,
            max_x: 400.0,
            max_y: 50.0,
        });

        let padded = union.expand(50.0);
        assert_eq!(padded.width(), 500.0);
        assert_eq!(padded.height(), 170.0);
    }
}
