pub mod dataset;
pub mod feature;
pub mod geometry;
pub mod pick;
pub mod scale;
pub mod series;

pub use dataset::{Dataset, RawCountySeries, RawSeriesEntry, RawShape};
pub use feature::{CountyFeature, CountyId, StateFeature, StateId};
pub use geometry::{Bounds, Geometry};
pub use pick::{PickCapacityError, PickColor, PickRegistry};
pub use scale::{Rgb, ThresholdScale};
pub use series::TimeSeries;
