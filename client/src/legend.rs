use leptos::prelude::*;

use chronomap_shared::ThresholdScale;

use crate::app::DatasetStore;

/// Label for one legend bucket. The open-ended first and last buckets read
/// as bounds; interior buckets as ranges.
pub fn bucket_label(thresholds: &[f64], bucket: usize) -> String {
    if thresholds.is_empty() {
        return String::new();
    }
    if bucket == 0 {
        format!("< {:.1}", thresholds[0])
    } else if bucket >= thresholds.len() {
        format!("≥ {:.1}", thresholds[thresholds.len() - 1])
    } else {
        format!("{:.1}–{:.1}", thresholds[bucket - 1], thresholds[bucket])
    }
}

/// Swatch bar for the value → color mapping, one cell per bucket.
#[component]
pub fn Legend() -> impl IntoView {
    let DatasetStore(dataset) = expect_context();

    let scale = Memo::new(move |_| dataset.with(|d| d.as_ref().map(|d| d.color_scale())));

    view! {
        {move || {
            let scale: ThresholdScale = scale.get()?;
            let cells: Vec<_> = scale
                .swatches()
                .iter()
                .enumerate()
                .map(|(i, swatch)| {
                    let label = bucket_label(scale.thresholds(), i);
                    view! {
                        <div class="legend-cell">
                            <span
                                class="legend-swatch"
                                style:background=swatch.css()
                            ></span>
                            <span class="legend-label">{label}</span>
                        </div>
                    }
                })
                .collect();
            Some(view! { <div class="legend">{cells}</div> })
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_every_bucket() {
        let thresholds = [2.0, 4.0, 6.0];
        assert_eq!(bucket_label(&thresholds, 0), "< 2.0");
        assert_eq!(bucket_label(&thresholds, 1), "2.0–4.0");
        assert_eq!(bucket_label(&thresholds, 2), "4.0–6.0");
        assert_eq!(bucket_label(&thresholds, 3), "≥ 6.0");
    }

    #[test]
    fn one_label_per_swatch() {
        let scale = ThresholdScale::blues_from_extent(1.0, 15.0);
        for i in 0..scale.swatches().len() {
            assert!(!bucket_label(scale.thresholds(), i).is_empty());
        }
    }
}
