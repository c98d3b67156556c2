use crate::geometry::Geometry;
use crate::series::TimeSeries;

/// Two-digit FIPS code of a state.
pub type StateId = String;
/// Five-digit FIPS code of a county; the first two digits are its state.
pub type CountyId = String;

/// A coarse region: drawn on the vector overview layer, clickable to drill
/// into its counties.
#[derive(Debug, Clone, PartialEq)]
pub struct StateFeature {
    pub id: StateId,
    pub name: String,
    pub geometry: Geometry,
}

/// A fine-grained region: rasterized on the county surface and, when its
/// state is drilled into, flat-filled into the pick buffer. Identity and
/// geometry are fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyFeature {
    pub id: CountyId,
    pub state_id: StateId,
    pub name: String,
    pub geometry: Geometry,
    pub series: TimeSeries,
}

/// Derive the parent state id from a county FIPS code.
pub fn state_of(county_id: &str) -> StateId {
    county_id.chars().take(2).collect()
}

#[cfg(test)]
mod tests {
    use super::state_of;

    #[test]
    fn state_of_takes_fips_prefix() {
        assert_eq!(state_of("06037"), "06");
        assert_eq!(state_of("48"), "48");
        assert_eq!(state_of("1"), "1");
    }
}
