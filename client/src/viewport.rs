use chronomap_shared::Bounds;

/// Viewport owns the pan/zoom transform from projected map coordinates to
/// screen coordinates: `screen = offset + scale * world`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
}

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 8.0;
const ZOOM_SENSITIVITY: f64 = 0.002;

/// Fraction of the viewport a drilled-into state is scaled to fill.
const FIT_FILL: f64 = 0.9;

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    /// The overview transform: untranslated, unscaled.
    pub const IDENTITY: Viewport = Viewport {
        offset_x: 0.0,
        offset_y: 0.0,
        scale: 1.0,
    };

    /// Convert map coordinates to screen coordinates.
    pub fn world_to_screen(&self, wx: f64, wy: f64) -> (f64, f64) {
        (
            wx * self.scale + self.offset_x,
            wy * self.scale + self.offset_y,
        )
    }

    /// Convert screen coordinates to map coordinates.
    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (
            (sx - self.offset_x) / self.scale,
            (sy - self.offset_y) / self.scale,
        )
    }

    /// Zoom toward a focus point (screen coordinates), keeping the map point
    /// under the focus fixed.
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let factor = (-delta * ZOOM_SENSITIVITY).exp();
        let new_scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let ratio = new_scale / self.scale;

        self.offset_x = screen_x - (screen_x - self.offset_x) * ratio;
        self.offset_y = screen_y - (screen_y - self.offset_y) * ratio;
        self.scale = new_scale;
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Transform that centers `bounds` and scales it to fill 90% of the
    /// viewport, clamped to `[MIN_SCALE, MAX_SCALE]` so a tiny region is
    /// never over-magnified and a huge one never shrinks below identity.
    pub fn fit_bounds(bounds: &Bounds, viewport_w: f64, viewport_h: f64) -> Viewport {
        let dx = bounds.width();
        let dy = bounds.height();
        if dx <= 0.0 || dy <= 0.0 || viewport_w <= 0.0 || viewport_h <= 0.0 {
            return Viewport::IDENTITY;
        }

        let scale = (FIT_FILL / (dx / viewport_w).max(dy / viewport_h)).clamp(MIN_SCALE, MAX_SCALE);
        let (cx, cy) = bounds.center();
        Viewport {
            offset_x: viewport_w / 2.0 - scale * cx,
            offset_y: viewport_h / 2.0 - scale * cy,
            scale,
        }
    }

    /// Linear interpolation between two transforms, for animated transitions.
    pub fn lerp(from: &Viewport, to: &Viewport, t: f64) -> Viewport {
        Viewport {
            offset_x: from.offset_x + (to.offset_x - from.offset_x) * t,
            offset_y: from.offset_y + (to.offset_y - from.offset_y) * t,
            scale: from.scale + (to.scale - from.scale) * t,
        }
    }
}
