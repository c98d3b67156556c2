use serde::Deserialize;

/// Axis-aligned bounding box in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A pre-projected multipolygon in map coordinates. Each ring is a closed
/// loop of `[x, y]` vertices; holes are additional rings and resolve via
/// even-odd filling. Geometry is immutable after load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl Geometry {
    pub fn new(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Self { rings }
    }

    pub fn is_empty(&self) -> bool {
        self.rings.iter().all(|r| r.is_empty())
    }

    /// Bounding box over all rings. `None` for empty geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut out: Option<Bounds> = None;
        for ring in &self.rings {
            for &[x, y] in ring {
                out = Some(match out {
                    None => Bounds {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    },
                    Some(b) => Bounds {
                        min_x: b.min_x.min(x),
                        min_y: b.min_y.min(y),
                        max_x: b.max_x.max(x),
                        max_y: b.max_y.max(y),
                    },
                });
            }
        }
        out
    }

    /// Area centroid via the shoelace formula, accumulated across rings so
    /// opposite-winding holes subtract. Degenerate (near-zero area) shapes
    /// fall back to the bounds center.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let mut area2 = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for ring in &self.rings {
            if ring.len() < 3 {
                continue;
            }
            for i in 0..ring.len() {
                let [x0, y0] = ring[i];
                let [x1, y1] = ring[(i + 1) % ring.len()];
                let cross = x0 * y1 - x1 * y0;
                area2 += cross;
                cx += (x0 + x1) * cross;
                cy += (y0 + y1) * cross;
            }
        }
        if area2.abs() < 1e-9 {
            return self.bounds().map(|b| b.center());
        }
        let factor = 1.0 / (3.0 * area2);
        Some((cx * factor, cy * factor))
    }

    /// Even-odd ray-cast containment test over all rings.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let [xi, yi] = ring[i];
                let [xj, yj] = ring[j];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}
