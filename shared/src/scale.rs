/// Solid map fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// ColorBrewer Blues, 7 steps — the sequential ramp for value buckets.
const BLUES: [Rgb; 7] = [
    Rgb { r: 0xEF, g: 0xF3, b: 0xFF },
    Rgb { r: 0xC6, g: 0xDB, b: 0xEF },
    Rgb { r: 0x9E, g: 0xCA, b: 0xE1 },
    Rgb { r: 0x6B, g: 0xAE, b: 0xD6 },
    Rgb { r: 0x42, g: 0x92, b: 0xC6 },
    Rgb { r: 0x21, g: 0x71, b: 0xB5 },
    Rgb { r: 0x08, g: 0x45, b: 0x94 },
];

/// A stepped color scale: `thresholds` split the value line into
/// `thresholds.len() + 1` buckets, each mapped to one swatch. The domain is
/// derived once from the loaded data and immutable afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale {
    thresholds: Vec<f64>,
    swatches: Vec<Rgb>,
}

impl ThresholdScale {
    /// Blues ramp over evenly spaced thresholds across `[low, high]`.
    /// `low`/`high` come from the dataset extent (minimum … high percentile).
    pub fn blues_from_extent(low: f64, high: f64) -> Self {
        let buckets = BLUES.len();
        let span = (high - low).max(f64::EPSILON);
        let step = span / buckets as f64;
        let thresholds = (1..buckets).map(|i| low + step * i as f64).collect();
        Self {
            thresholds,
            swatches: BLUES.to_vec(),
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn swatches(&self) -> &[Rgb] {
        &self.swatches
    }

    /// Bucket color for a value. Values below the first threshold take the
    /// first swatch, values at or above the last take the last.
    pub fn color_for(&self, value: f64) -> Rgb {
        let bucket = self.thresholds.iter().take_while(|&&t| value >= t).count();
        self.swatches[bucket]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_scale_has_one_more_swatch_than_threshold() {
        let s = ThresholdScale::blues_from_extent(0.0, 14.0);
        assert_eq!(s.swatches().len(), s.thresholds().len() + 1);
        assert_eq!(s.thresholds().len(), 6);
        assert!((s.thresholds()[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn low_values_take_first_swatch() {
        let s = ThresholdScale::blues_from_extent(0.0, 14.0);
        assert_eq!(s.color_for(-5.0), s.swatches()[0]);
        assert_eq!(s.color_for(1.9), s.swatches()[0]);
    }

    #[test]
    fn high_values_take_last_swatch() {
        let s = ThresholdScale::blues_from_extent(0.0, 14.0);
        assert_eq!(s.color_for(12.0), *s.swatches().last().unwrap());
        assert_eq!(s.color_for(99.0), *s.swatches().last().unwrap());
    }

    #[test]
    fn value_at_threshold_enters_next_bucket() {
        let s = ThresholdScale::blues_from_extent(0.0, 14.0);
        // First threshold is 2.0: exactly 2.0 belongs to the second bucket.
        assert_eq!(s.color_for(2.0), s.swatches()[1]);
    }

    #[test]
    fn degenerate_extent_still_buckets() {
        let s = ThresholdScale::blues_from_extent(5.0, 5.0);
        assert_eq!(s.color_for(4.0), s.swatches()[0]);
        assert_eq!(s.color_for(6.0), *s.swatches().last().unwrap());
    }

    #[test]
    fn css_is_lowercase_hex() {
        assert_eq!(Rgb { r: 8, g: 69, b: 148 }.css(), "#084594");
    }
}
