use serde::Deserialize;

/// A year-indexed series of optional values. An absent year and an explicit
/// `null` both mean "no data" and must render as omitted — never as zero.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimeSeries {
    entries: Vec<(i32, Option<f64>)>,
}

impl TimeSeries {
    /// Build from `(year, value)` pairs. Entries are sorted by year; a
    /// duplicate year keeps the last value seen.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i32, Option<f64>)>) -> Self {
        let mut entries: Vec<(i32, Option<f64>)> = pairs.into_iter().collect();
        entries.sort_by_key(|&(year, _)| year);
        entries.dedup_by(|later, earlier| {
            if later.0 == earlier.0 {
                earlier.1 = later.1;
                true
            } else {
                false
            }
        });
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `year`. `None` covers both a missing year and a null entry.
    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.entries
            .binary_search_by_key(&year, |&(y, _)| y)
            .ok()
            .and_then(|i| self.entries[i].1)
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.entries.iter().map(|&(y, _)| y)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Option<f64>)> + '_ {
        self.entries.iter().copied()
    }

    /// Present (non-null) values only.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().filter_map(|&(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::TimeSeries;

    #[test]
    fn missing_year_is_none() {
        let s = TimeSeries::from_pairs([(2010, Some(4.2)), (2012, Some(5.0))]);
        assert_eq!(s.value_at(2010), Some(4.2));
        assert_eq!(s.value_at(2011), None);
    }

    #[test]
    fn null_entry_is_none_and_distinct_from_zero() {
        let s = TimeSeries::from_pairs([(2010, None), (2011, Some(0.0))]);
        assert_eq!(s.value_at(2010), None);
        assert_eq!(s.value_at(2011), Some(0.0));
    }

    #[test]
    fn pairs_are_sorted_by_year() {
        let s = TimeSeries::from_pairs([(2012, Some(2.0)), (2010, Some(1.0))]);
        let years: Vec<i32> = s.years().collect();
        assert_eq!(years, vec![2010, 2012]);
    }

    #[test]
    fn duplicate_year_keeps_last_value() {
        let s = TimeSeries::from_pairs([(2010, Some(1.0)), (2010, Some(9.0))]);
        assert_eq!(s.value_at(2010), Some(9.0));
    }

    #[test]
    fn values_skips_nulls() {
        let s = TimeSeries::from_pairs([(2010, Some(3.0)), (2011, None), (2012, Some(7.0))]);
        let vals: Vec<f64> = s.values().collect();
        assert_eq!(vals, vec![3.0, 7.0]);
    }
}
