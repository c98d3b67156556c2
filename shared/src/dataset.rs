use std::collections::HashMap;

use serde::Deserialize;

use crate::feature::{CountyFeature, StateFeature, state_of};
use crate::geometry::Geometry;
use crate::pick::{PickCapacityError, PickRegistry};
use crate::scale::ThresholdScale;
use crate::series::TimeSeries;

/// High bound of the color domain is this quantile of all observed values,
/// not the maximum, so a handful of outlier counties can't wash out the ramp.
const EXTENT_HIGH_QUANTILE: f64 = 0.995;

/// One pre-projected polygon feature as it arrives from the geometry file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawShape {
    pub id: String,
    pub name: String,
    pub rings: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawSeriesEntry {
    pub year: i32,
    pub value: Option<f64>,
}

/// Per-county time series as it arrives from the values file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCountySeries {
    pub county_id: String,
    pub values: Vec<RawSeriesEntry>,
}

/// The fully joined, immutable in-memory dataset the map renders from:
/// state and county features, the year sequence, the value extent, and the
/// pick-color registry (one identifier per county, allocated once).
#[derive(Debug, Clone)]
pub struct Dataset {
    pub states: Vec<StateFeature>,
    pub counties: Vec<CountyFeature>,
    pub years: Vec<i32>,
    /// `(low, high)` color domain: minimum observed value … p99.5.
    pub extent: (f64, f64),
    pub picks: PickRegistry,
}

impl Dataset {
    /// Join series records onto county shapes by FIPS id and derive the year
    /// sequence and value extent. Counties without a series record keep an
    /// empty series (they render unfilled at every year). Fails only if the
    /// county count exceeds the pick-color space.
    pub fn build(
        states: Vec<RawShape>,
        counties: Vec<RawShape>,
        series: Vec<RawCountySeries>,
    ) -> Result<Self, PickCapacityError> {
        let mut series_by_id: HashMap<String, TimeSeries> = series
            .into_iter()
            .map(|rec| {
                let ts = TimeSeries::from_pairs(rec.values.iter().map(|e| (e.year, e.value)));
                (rec.county_id, ts)
            })
            .collect();

        let states: Vec<StateFeature> = states
            .into_iter()
            .map(|s| StateFeature {
                id: s.id,
                name: s.name,
                geometry: Geometry::new(s.rings),
            })
            .collect();

        let counties: Vec<CountyFeature> = counties
            .into_iter()
            .map(|c| {
                let series = series_by_id.remove(&c.id).unwrap_or_default();
                CountyFeature {
                    state_id: state_of(&c.id),
                    id: c.id,
                    name: c.name,
                    geometry: Geometry::new(c.rings),
                    series,
                }
            })
            .collect();

        let picks = PickRegistry::allocate(counties.len())?;

        let mut years: Vec<i32> = counties
            .iter()
            .flat_map(|c| c.series.years())
            .collect();
        years.sort_unstable();
        years.dedup();

        let mut values: Vec<f64> = counties.iter().flat_map(|c| c.series.values()).collect();
        values.sort_by(f64::total_cmp);
        let extent = match values.first() {
            Some(&low) => (low, quantile_sorted(&values, EXTENT_HIGH_QUANTILE)),
            None => (0.0, 0.0),
        };

        Ok(Self {
            states,
            counties,
            years,
            extent,
            picks,
        })
    }

    /// The immutable value → style mapping shared by the map and the legend.
    pub fn color_scale(&self) -> ThresholdScale {
        ThresholdScale::blues_from_extent(self.extent.0, self.extent.1)
    }

    pub fn state(&self, id: &str) -> Option<&StateFeature> {
        self.states.iter().find(|s| s.id == id)
    }

    /// County indices belonging to one state — the pick-buffer draw set when
    /// that state is drilled into.
    pub fn county_indices_of(&self, state_id: &str) -> impl Iterator<Item = usize> + '_ {
        let state_id = state_id.to_owned();
        self.counties
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.state_id == state_id)
            .map(|(i, _)| i)
    }
}

/// Linear-interpolated quantile of an ascending-sorted slice.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(id: &str, name: &str, x0: f64) -> RawShape {
        RawShape {
            id: id.into(),
            name: name.into(),
            rings: vec![vec![[x0, 0.0], [x0 + 1.0, 0.0], [x0 + 1.0, 1.0], [x0, 1.0]]],
        }
    }

    fn entry(year: i32, value: Option<f64>) -> RawSeriesEntry {
        RawSeriesEntry { year, value }
    }

    fn sample() -> Dataset {
        Dataset::build(
            vec![shape("06", "California", 0.0), shape("48", "Texas", 10.0)],
            vec![
                shape("06037", "Los Angeles", 0.0),
                shape("06075", "San Francisco", 2.0),
                shape("48201", "Harris", 10.0),
            ],
            vec![
                RawCountySeries {
                    county_id: "06037".into(),
                    values: vec![entry(2010, Some(12.0)), entry(2011, Some(11.0))],
                },
                RawCountySeries {
                    county_id: "48201".into(),
                    values: vec![entry(2010, Some(8.0)), entry(2011, None)],
                },
            ],
        )
        .expect("sample dataset")
    }

    #[test]
    fn series_attach_by_county_id() {
        let ds = sample();
        let la = ds.counties.iter().find(|c| c.id == "06037").unwrap();
        assert_eq!(la.series.value_at(2010), Some(12.0));
        assert_eq!(la.state_id, "06");
    }

    #[test]
    fn county_without_record_gets_empty_series() {
        let ds = sample();
        let sf = ds.counties.iter().find(|c| c.id == "06075").unwrap();
        assert!(sf.series.is_empty());
        assert_eq!(sf.series.value_at(2010), None);
    }

    #[test]
    fn years_are_sorted_union_of_observed_years() {
        let ds = sample();
        assert_eq!(ds.years, vec![2010, 2011]);
    }

    #[test]
    fn extent_ignores_nulls_and_uses_min() {
        let ds = sample();
        assert_eq!(ds.extent.0, 8.0);
        assert!(ds.extent.1 <= 12.0 && ds.extent.1 > 11.0);
    }

    #[test]
    fn pick_registry_covers_all_counties() {
        let ds = sample();
        assert_eq!(ds.picks.len(), ds.counties.len());
    }

    #[test]
    fn county_indices_of_state_filters_by_prefix() {
        let ds = sample();
        let idx: Vec<usize> = ds.county_indices_of("06").collect();
        assert_eq!(idx.len(), 2);
        for i in idx {
            assert_eq!(ds.counties[i].state_id, "06");
        }
    }

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&v, 0.0), 1.0);
        assert_eq!(quantile_sorted(&v, 1.0), 5.0);
        assert_eq!(quantile_sorted(&v, 0.5), 3.0);
        assert!((quantile_sorted(&v, 0.9) - 4.6).abs() < 1e-9);
    }

    #[test]
    fn raw_shapes_decode_from_json() {
        let raw: RawShape = serde_json::from_str(
            r#"{"id":"06037","name":"Los Angeles","rings":[[[0.0,0.0],[1.0,0.0],[1.0,1.0]]]}"#,
        )
        .expect("decode");
        assert_eq!(raw.id, "06037");
        assert_eq!(raw.rings[0].len(), 3);
    }
}
