// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Spatial regions in pixel coordinates, used to filter events.

/// Anything that can say whether a pixel coordinate is inside it.
pub trait Region {
    fn contains(&self, x: f64, y: f64) -> bool;
}

impl<F> Region for F
where
    F: Fn(f64, f64) -> bool,
{
    fn contains(&self, x: f64, y: f64) -> bool {
        self(x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Region for Circle {
    fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

/// An axis-aligned box. The lower bounds are inclusive, the upper bounds
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Region for Rectangle {
    fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..self.x_max).contains(&x) && (self.y_min..self.y_max).contains(&y)
    }
}

/// A simple polygon, tested with the even-odd rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<(f64, f64)>,
}

impl Region for Polygon {
    fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.vertices.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = self.vertices[i];
            let (xj, yj) = self.vertices[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}
