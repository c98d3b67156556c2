use chronomap_shared::{CountyFeature, Dataset, Geometry, ThresholdScale};
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule};

use crate::viewport::Viewport;

/// Fill color for a county at a given year, or `None` when the series has
/// no value there. Missing years render unfilled, never as a zero bucket.
pub fn fill_for(county: &CountyFeature, year: i32, scale: &ThresholdScale) -> Option<String> {
    county
        .series
        .value_at(year)
        .map(|v| scale.color_for(v).css())
}

/// Appends every ring of a multipolygon to the current path. Holes resolve
/// through even-odd filling, so no per-ring winding bookkeeping is needed.
fn trace_geometry(ctx: &CanvasRenderingContext2d, geometry: &Geometry) {
    for ring in &geometry.rings {
        let mut points = ring.iter();
        let Some(&[x, y]) = points.next() else {
            continue;
        };
        ctx.move_to(x, y);
        for &[x, y] in points {
            ctx.line_to(x, y);
        }
        ctx.close_path();
    }
}

/// Resets the context to device pixels and clears the whole surface.
pub fn clear_layer(ctx: &CanvasRenderingContext2d, css_w: f64, css_h: f64, dpr: f64) {
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
    ctx.clear_rect(0.0, 0.0, css_w, css_h);
}

/// Installs the map transform: world coordinates through the viewport, then
/// CSS pixels scaled up to the backing store.
fn apply_view(ctx: &CanvasRenderingContext2d, vp: &Viewport, dpr: f64) {
    ctx.set_transform(
        vp.scale * dpr,
        0.0,
        0.0,
        vp.scale * dpr,
        vp.offset_x * dpr,
        vp.offset_y * dpr,
    )
    .ok();
}

/// Paints the visible layer: choropleth county fills for the current year,
/// hairline county borders, state outlines on top. With a drill-in
/// restriction only that state's counties and outline are drawn.
pub fn render_visible(
    ctx: &CanvasRenderingContext2d,
    dataset: &Dataset,
    scale: &ThresholdScale,
    year: i32,
    vp: &Viewport,
    restriction: Option<&str>,
    css_w: f64,
    css_h: f64,
    dpr: f64,
) {
    clear_layer(ctx, css_w, css_h, dpr);
    apply_view(ctx, vp, dpr);

    // Stroke widths in world units so they stay constant on screen.
    let county_line = 0.5 / vp.scale;
    let state_line = 1.0 / vp.scale;

    ctx.set_line_width(county_line);
    ctx.set_stroke_style_str("rgba(255,255,255,0.35)");
    for county in &dataset.counties {
        if let Some(state_id) = restriction {
            if county.state_id != state_id {
                continue;
            }
        }
        let Some(css) = fill_for(county, year, scale) else {
            continue;
        };
        ctx.set_fill_style_str(&css);
        ctx.begin_path();
        trace_geometry(ctx, &county.geometry);
        ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
        ctx.stroke();
    }

    ctx.set_line_width(state_line);
    ctx.set_stroke_style_str("#ffffff");
    for state in &dataset.states {
        if let Some(state_id) = restriction {
            if state.id != state_id {
                continue;
            }
        }
        ctx.begin_path();
        trace_geometry(ctx, &state.geometry);
        ctx.stroke();
    }
}

/// Paints the pick buffer: flat fills in each county's identifier color,
/// no strokes (anti-aliased edges would mint colors the registry cannot
/// resolve — seam misses are expected and read as background).
///
/// Only the drilled-in state's counties are drawn; with no restriction the
/// buffer stays clear and every read resolves to background. Counties
/// without data still paint, so hover works everywhere inside the state.
pub fn render_pick(
    ctx: &CanvasRenderingContext2d,
    dataset: &Dataset,
    vp: &Viewport,
    restriction: Option<&str>,
    css_w: f64,
    css_h: f64,
    dpr: f64,
) {
    clear_layer(ctx, css_w, css_h, dpr);
    let Some(state_id) = restriction else {
        return;
    };
    apply_view(ctx, vp, dpr);

    for idx in dataset.county_indices_of(state_id) {
        ctx.set_fill_style_str(&dataset.picks.color(idx).css());
        ctx.begin_path();
        trace_geometry(ctx, &dataset.counties[idx].geometry);
        ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
    }
}

/// Paints the overview-only vector layer: hover highlight over the covered
/// state, plus centroid name labels. Shown only at the overview zoom.
pub fn render_state_overlay(
    ctx: &CanvasRenderingContext2d,
    dataset: &Dataset,
    hovered: Option<usize>,
    vp: &Viewport,
    css_w: f64,
    css_h: f64,
    dpr: f64,
    show_names: bool,
) {
    clear_layer(ctx, css_w, css_h, dpr);
    apply_view(ctx, vp, dpr);

    if let Some(idx) = hovered {
        if let Some(state) = dataset.states.get(idx) {
            ctx.set_fill_style_str("rgba(255,255,255,0.18)");
            ctx.begin_path();
            trace_geometry(ctx, &state.geometry);
            ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd);
            ctx.set_stroke_style_str("rgba(255,255,255,0.9)");
            ctx.set_line_width(1.5 / vp.scale);
            ctx.stroke();
        }
    }

    if !show_names {
        return;
    }
    ctx.set_font("11px sans-serif");
    ctx.set_text_align("center");
    ctx.set_line_width(3.0);
    ctx.set_stroke_style_str("rgba(255,255,255,0.85)");
    ctx.set_fill_style_str("#333333");
    for state in &dataset.states {
        let Some((cx, cy)) = state.geometry.centroid() else {
            continue;
        };
        ctx.stroke_text(&state.name, cx, cy).ok();
        ctx.fill_text(&state.name, cx, cy).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chronomap_shared::TimeSeries;

    fn county(id: &str, pairs: Vec<(i32, Option<f64>)>) -> CountyFeature {
        CountyFeature {
            id: id.to_string(),
            state_id: id[..2].to_string(),
            name: format!("County {id}"),
            geometry: Geometry::new(vec![vec![
                [0.0, 0.0],
                [10.0, 0.0],
                [10.0, 10.0],
                [0.0, 10.0],
                [0.0, 0.0],
            ]]),
            series: TimeSeries::from_pairs(pairs),
        }
    }

    #[test]
    fn missing_years_never_get_a_fill() {
        let scale = ThresholdScale::blues_from_extent(0.0, 15.0);
        let c = county("06001", vec![(2010, Some(4.0)), (2012, Some(6.0))]);
        for year in 2008..=2018 {
            let filled = fill_for(&c, year, &scale).is_some();
            assert_eq!(
                filled,
                year == 2010 || year == 2012,
                "year {year} fill mismatch"
            );
        }
    }

    #[test]
    fn explicit_null_is_unfilled_but_zero_is_filled() {
        let scale = ThresholdScale::blues_from_extent(0.0, 15.0);
        let null = county("06001", vec![(2016, None)]);
        let zero = county("06003", vec![(2016, Some(0.0))]);
        assert_eq!(fill_for(&null, 2016, &scale), None);
        assert_eq!(
            fill_for(&zero, 2016, &scale),
            Some(scale.color_for(0.0).css())
        );
    }

    #[test]
    fn mixed_counties_fill_by_bucket_at_one_year() {
        // Three counties at 2016 over the extent [0, 15]: values 5, null, 12.
        let scale = ThresholdScale::blues_from_extent(0.0, 15.0);
        let a = county("06001", vec![(2016, Some(5.0))]);
        let b = county("06003", vec![(2016, None)]);
        let c = county("06005", vec![(2016, Some(12.0))]);

        let fill_a = fill_for(&a, 2016, &scale).expect("a has data");
        let fill_c = fill_for(&c, 2016, &scale).expect("c has data");
        assert_eq!(fill_for(&b, 2016, &scale), None);
        assert_eq!(fill_a, scale.color_for(5.0).css());
        assert_eq!(fill_c, scale.color_for(12.0).css());
        assert_ne!(fill_a, fill_c, "distant values land in distinct buckets");
    }
}
