use serde::Deserialize;
use serde::de::DeserializeOwned;

use chronomap_shared::{Dataset, RawCountySeries, RawShape};

/// Pre-projected state and county shapes, as served under `/data/`.
#[derive(Debug, Deserialize)]
struct ShapesPayload {
    states: Vec<RawShape>,
    counties: Vec<RawShape>,
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<T>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}

/// Loads the map shapes and the county time series, then joins them into
/// the immutable dataset. Pick-color exhaustion is a fatal load error.
pub async fn load_dataset() -> Result<Dataset, String> {
    let shapes: ShapesPayload = fetch_json("/data/us-shapes.json").await?;
    let series: Vec<RawCountySeries> = fetch_json("/data/unemployment.json").await?;
    Dataset::build(shapes.states, shapes.counties, series).map_err(|e| e.to_string())
}
