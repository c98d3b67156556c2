use leptos::prelude::*;

use chronomap_shared::TimeSeries;

use crate::app::{DatasetStore, HoveredCounty, PointerPosition, YearIndex};

const POINTER_GAP: f64 = 14.0;
pub const TIP_WIDTH: f64 = 180.0;
pub const TIP_HEIGHT: f64 = 92.0;

const SPARK_W: f64 = 160.0;
const SPARK_H: f64 = 36.0;

/// Places the tooltip next to the pointer, flipping to the opposite side
/// when it would run off an edge and clamping as a last resort.
pub fn tooltip_offset(
    px: f64,
    py: f64,
    tip_w: f64,
    tip_h: f64,
    view_w: f64,
    view_h: f64,
) -> (f64, f64) {
    let mut x = px + POINTER_GAP;
    if x + tip_w > view_w {
        x = px - tip_w - POINTER_GAP;
    }
    let mut y = py + POINTER_GAP;
    if y + tip_h > view_h {
        y = py - tip_h - POINTER_GAP;
    }
    (x.clamp(0.0, (view_w - tip_w).max(0.0)), y.clamp(0.0, (view_h - tip_h).max(0.0)))
}

/// SVG polyline `points` for a series sparkline. Years map left to right
/// across the full axis; missing years leave gaps in the x spacing but the
/// line connects through them (a sparkline, not a chart).
pub fn sparkline_points(series: &TimeSeries, years: &[i32], w: f64, h: f64) -> String {
    if years.len() < 2 {
        return String::new();
    }
    let values: Vec<f64> = series.values().collect();
    let (low, high) = match (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) {
        (Some(low), Some(high)) => (low, high),
        _ => return String::new(),
    };
    let span = (high - low).max(1e-9);
    let step = w / (years.len() - 1) as f64;

    let mut out = String::new();
    for (i, &year) in years.iter().enumerate() {
        let Some(v) = series.value_at(year) else {
            continue;
        };
        let x = i as f64 * step;
        let y = h - ((v - low) / span) * h;
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{x:.1},{y:.1}"));
    }
    out
}

/// Sparkline x-coordinate of the year cursor.
pub fn sparkline_cursor_x(year_index: usize, years_len: usize, w: f64) -> f64 {
    if years_len < 2 {
        return 0.0;
    }
    (year_index.min(years_len - 1)) as f64 * (w / (years_len - 1) as f64)
}

/// Hover tooltip: county name, value at the current year, and a sparkline
/// of its whole series with a cursor at the year being shown.
#[component]
pub fn Tooltip() -> impl IntoView {
    let DatasetStore(dataset) = expect_context();
    let HoveredCounty(hovered) = expect_context();
    let YearIndex(year_index) = expect_context();
    let PointerPosition(pointer) = expect_context();

    let content = Memo::new(move |_| {
        let idx = hovered.get()?;
        dataset.with(|d| {
            let d = d.as_ref()?;
            let county = d.counties.get(idx)?;
            let year = d.years.get(year_index.get()).copied()?;
            let value = county.series.value_at(year);
            let points = sparkline_points(&county.series, &d.years, SPARK_W, SPARK_H);
            let cursor = sparkline_cursor_x(year_index.get(), d.years.len(), SPARK_W);
            Some((county.name.clone(), year, value, points, cursor))
        })
    });

    let position = Memo::new(move |_| {
        let (px, py) = pointer.get()?;
        let window = web_sys::window()?;
        let view_w = window.inner_width().ok()?.as_f64()?;
        let view_h = window.inner_height().ok()?.as_f64()?;
        Some(tooltip_offset(px, py, TIP_WIDTH, TIP_HEIGHT, view_w, view_h))
    });

    view! {
        {move || {
            let (name, year, value, points, cursor) = content.get()?;
            let (x, y) = position.get()?;
            let reading = match value {
                Some(v) => format!("{year}: {v:.1}%"),
                None => format!("{year}: no data"),
            };
            Some(
                view! {
                    <div
                        class="tooltip"
                        style:left=format!("{x}px")
                        style:top=format!("{y}px")
                        style:width=format!("{TIP_WIDTH}px")
                    >
                        <div class="tooltip-name">{name}</div>
                        <div class="tooltip-reading">{reading}</div>
                        <svg
                            class="tooltip-spark"
                            width=SPARK_W.to_string()
                            height=SPARK_H.to_string()
                        >
                            <polyline
                                points=points
                                fill="none"
                                stroke="#4292c6"
                                stroke-width="1.5"
                            />
                            <line
                                x1=format!("{cursor:.1}")
                                y1="0"
                                x2=format!("{cursor:.1}")
                                y2=SPARK_H.to_string()
                                stroke="#999"
                                stroke-dasharray="2,2"
                            />
                        </svg>
                    </div>
                },
            )
        }}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f64 = 800.0;
    const H: f64 = 600.0;

    #[test]
    fn tooltip_sits_beside_the_pointer() {
        let (x, y) = tooltip_offset(100.0, 100.0, TIP_WIDTH, TIP_HEIGHT, W, H);
        assert_eq!((x, y), (100.0 + POINTER_GAP, 100.0 + POINTER_GAP));
    }

    #[test]
    fn flips_left_near_the_right_edge() {
        let (x, _) = tooltip_offset(780.0, 100.0, TIP_WIDTH, TIP_HEIGHT, W, H);
        assert_eq!(x, 780.0 - TIP_WIDTH - POINTER_GAP);
    }

    #[test]
    fn flips_up_near_the_bottom_edge() {
        let (_, y) = tooltip_offset(100.0, 590.0, TIP_WIDTH, TIP_HEIGHT, W, H);
        assert_eq!(y, 590.0 - TIP_HEIGHT - POINTER_GAP);
    }

    #[test]
    fn clamped_inside_a_tiny_viewport() {
        let (x, y) = tooltip_offset(5.0, 5.0, TIP_WIDTH, TIP_HEIGHT, 100.0, 50.0);
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn corner_pointer_stays_in_view() {
        let (x, y) = tooltip_offset(W, H, TIP_WIDTH, TIP_HEIGHT, W, H);
        assert!(x >= 0.0 && x + TIP_WIDTH <= W);
        assert!(y >= 0.0 && y + TIP_HEIGHT <= H);
    }

    #[test]
    fn sparkline_spans_the_value_range() {
        let series = TimeSeries::from_pairs(vec![
            (2010, Some(2.0)),
            (2011, Some(8.0)),
            (2012, Some(5.0)),
        ]);
        let points = sparkline_points(&series, &[2010, 2011, 2012], 100.0, 30.0);
        assert_eq!(points, "0.0,30.0 50.0,0.0 100.0,15.0");
    }

    #[test]
    fn sparkline_skips_missing_years() {
        let series = TimeSeries::from_pairs(vec![(2010, Some(2.0)), (2012, Some(4.0))]);
        let points = sparkline_points(&series, &[2010, 2011, 2012], 100.0, 30.0);
        assert_eq!(points, "0.0,30.0 100.0,0.0");
    }

    #[test]
    fn empty_series_yields_no_polyline() {
        let series = TimeSeries::from_pairs(vec![(2010, None)]);
        assert_eq!(
            sparkline_points(&series, &[2010, 2011], 100.0, 30.0),
            String::new()
        );
    }

    #[test]
    fn cursor_tracks_the_year_axis() {
        assert_eq!(sparkline_cursor_x(0, 5, 100.0), 0.0);
        assert_eq!(sparkline_cursor_x(4, 5, 100.0), 100.0);
        assert_eq!(sparkline_cursor_x(2, 5, 100.0), 50.0);
    }
}
