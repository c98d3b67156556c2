use std::collections::HashMap;
use std::fmt;

/// Counter step between allocated pick colors. Adjacent canvas pixels get
/// anti-aliased toward neighboring RGB values; a stride of 10 keeps every
/// allocated identifier farther apart than any blend artifact at typical
/// backing resolutions.
pub const PICK_STRIDE: u32 = 10;

const PICK_SPACE: u32 = 0xFF_FF_FF;

/// An RGB identifier flat-filled into the offscreen pick surface.
/// `(0, 0, 0)` is the reserved background and never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PickColor {
    pub const BACKGROUND: PickColor = PickColor { r: 0, g: 0, b: 0 };

    fn from_counter(counter: u32) -> Self {
        Self {
            r: (counter & 0xFF) as u8,
            g: ((counter >> 8) & 0xFF) as u8,
            b: ((counter >> 16) & 0xFF) as u8,
        }
    }

    /// CSS fill string for the pick pass.
    pub fn css(&self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// The feature set outgrew the 24-bit pick color space. The feature count is
/// known at load time, so this is a fatal configuration error, not a runtime
/// condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickCapacityError {
    pub requested: usize,
    pub capacity: usize,
}

impl fmt::Display for PickCapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot allocate {} pick colors (capacity {} at stride {})",
            self.requested, self.capacity, PICK_STRIDE
        )
    }
}

impl std::error::Error for PickCapacityError {}

/// Bijective feature-index ↔ pick-color registry for one loaded feature set.
/// Allocation happens once; lookups are the per-pointer-move hot path.
#[derive(Debug, Clone)]
pub struct PickRegistry {
    colors: Vec<PickColor>,
    index_of: HashMap<PickColor, usize>,
}

impl PickRegistry {
    pub fn capacity() -> usize {
        (PICK_SPACE / PICK_STRIDE) as usize
    }

    /// Allocate `n` distinct non-background identifiers, one per feature
    /// index `0..n`.
    pub fn allocate(n: usize) -> Result<Self, PickCapacityError> {
        if n > Self::capacity() {
            return Err(PickCapacityError {
                requested: n,
                capacity: Self::capacity(),
            });
        }
        let mut colors = Vec::with_capacity(n);
        let mut index_of = HashMap::with_capacity(n);
        for i in 0..n {
            let color = PickColor::from_counter((i as u32 + 1) * PICK_STRIDE);
            colors.push(color);
            index_of.insert(color, i);
        }
        Ok(Self { colors, index_of })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, index: usize) -> PickColor {
        self.colors[index]
    }

    /// Resolve a sampled pixel back to a feature index. Background pixels and
    /// unregistered colors (anti-aliased seams, gaps between polygons) resolve
    /// to `None`.
    pub fn resolve(&self, r: u8, g: u8, b: u8) -> Option<usize> {
        let color = PickColor { r, g, b };
        if color == PickColor::BACKGROUND {
            return None;
        }
        self.index_of.get(&color).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn allocates_distinct_non_background_colors() {
        let reg = PickRegistry::allocate(3200).expect("county-scale allocation");
        let mut seen = HashSet::new();
        for i in 0..reg.len() {
            let c = reg.color(i);
            assert_ne!(c, PickColor::BACKGROUND);
            assert!(seen.insert(c), "duplicate color at index {i}");
        }
    }

    #[test]
    fn every_allocated_color_resolves_to_its_index() {
        let reg = PickRegistry::allocate(500).unwrap();
        for i in 0..reg.len() {
            let c = reg.color(i);
            assert_eq!(reg.resolve(c.r, c.g, c.b), Some(i));
        }
    }

    #[test]
    fn background_never_resolves() {
        let reg = PickRegistry::allocate(100).unwrap();
        assert_eq!(reg.resolve(0, 0, 0), None);
    }

    #[test]
    fn off_stride_color_does_not_resolve() {
        let reg = PickRegistry::allocate(100).unwrap();
        // One channel-unit off an allocated color, as an anti-aliased seam
        // would produce.
        let c = reg.color(0);
        assert_eq!(reg.resolve(c.r.wrapping_add(1), c.g, c.b), None);
    }

    #[test]
    fn allocation_beyond_capacity_errors() {
        let err = PickRegistry::allocate(PickRegistry::capacity() + 1).unwrap_err();
        assert_eq!(err.capacity, PickRegistry::capacity());
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn css_formats_rgb() {
        assert_eq!(PickColor { r: 10, g: 0, b: 0 }.css(), "rgb(10,0,0)");
    }
}
