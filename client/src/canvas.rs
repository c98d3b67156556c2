use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use chronomap_shared::StateId;

use crate::app::{
    DatasetStore, HoveredCounty, HoveredState, PointerPosition, SelectedState, ShowStateNames,
    YearIndex,
};
use crate::hit::PickSurface;
use crate::overlay::StateGrid;
use crate::render::{clear_layer, render_pick, render_state_overlay, render_visible};
use crate::render_loop::FrameScheduler;
use crate::transition::{Completion, TickOutcome, TransformController};
use crate::viewport::Viewport;

/// Backing-store resolution cap. High-DPR phones gain nothing above 2x for
/// flat polygon fills.
const MAX_DPR: f64 = 2.0;

/// Click-vs-drag discrimination threshold in CSS pixels.
const CLICK_SLOP_PX: f64 = 5.0;

/// A zoom request raised by an input handler, consumed by the frame loop so
/// transitions start on the same clock that advances them.
enum ZoomRequest {
    Drill(StateId),
    Reset,
}

fn canvas_ctx(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into().ok())
}

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .clamp(1.0, MAX_DPR)
}

/// The choropleth map: a visible canvas pair (counties below, state overlay
/// above) plus the hidden pick buffer, with drag/wheel/pinch navigation and
/// click-to-drill.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let DatasetStore(dataset) = expect_context();
    let YearIndex(year_index) = expect_context();
    let HoveredCounty(hovered_county) = expect_context();
    let HoveredState(hovered_state) = expect_context();
    let SelectedState(selected) = expect_context();
    let PointerPosition(pointer_pos) = expect_context();
    let ShowStateNames(show_names) = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();

    let map_canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let overlay_canvas_ref = NodeRef::<leptos::html::Canvas>::new();

    // Drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start_x = Rc::new(Cell::new(0.0f64));
    let drag_start_y = Rc::new(Cell::new(0.0f64));
    let last_x = Rc::new(Cell::new(0.0f64));
    let last_y = Rc::new(Cell::new(0.0f64));

    // Pinch state
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    // Zoom state machine, shared between input handlers and the frame loop.
    let controller = Rc::new(RefCell::new(TransformController::new()));
    let pending_zoom: Rc<RefCell<Option<ZoomRequest>>> = Rc::new(RefCell::new(None));

    // Hidden pick buffer. Hover over counties simply stays off if the
    // context cannot be created.
    let pick: Rc<RefCell<Option<PickSurface>>> = Rc::new(RefCell::new(match PickSurface::new() {
        Ok(surface) => Some(surface),
        Err(e) => {
            web_sys::console::warn_1(&format!("pick surface unavailable: {e}").into());
            None
        }
    }));

    // State hit-test grid, rebuilt when the dataset loads.
    let state_grid: Rc<RefCell<Option<StateGrid>>> = Rc::new(RefCell::new(None));
    Effect::new({
        let state_grid = state_grid.clone();
        move || {
            dataset.with(|d| {
                *state_grid.borrow_mut() = d.as_ref().map(|d| StateGrid::build(&d.states));
            });
        }
    });

    // Cached 2D contexts (invalidated on canvas resize)
    let map_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));
    let overlay_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));
    let last_size: Rc<Cell<(u32, u32)>> = Rc::new(Cell::new((0, 0)));

    // The pick buffer repaints only when the drilled selection or the
    // transform under it changed, not on every frame.
    type PickState = Option<(Viewport, String)>;
    let pick_rendered: Rc<RefCell<PickState>> = Rc::new(RefCell::new(None));

    let scheduler = {
        let controller = controller.clone();
        let pending_zoom = pending_zoom.clone();
        let pick = pick.clone();
        let pick_rendered = pick_rendered.clone();
        let map_ctx = map_ctx.clone();
        let overlay_ctx = overlay_ctx.clone();
        let last_size = last_size.clone();
        Rc::new(FrameScheduler::new(move |now| {
            let Some(map_canvas) = map_canvas_ref.get_untracked() else {
                return false;
            };
            let map_canvas: &HtmlCanvasElement = &map_canvas;
            let Some(overlay_canvas) = overlay_canvas_ref.get_untracked() else {
                return false;
            };
            let overlay_canvas: &HtmlCanvasElement = &overlay_canvas;

            let Some(parent) = map_canvas.parent_element() else {
                return false;
            };
            let css_w = parent.client_width() as f64;
            let css_h = parent.client_height() as f64;
            if css_w <= 0.0 || css_h <= 0.0 {
                return false;
            }
            let dpr = device_pixel_ratio();
            let backing_w = (css_w * dpr) as u32;
            let backing_h = (css_h * dpr) as u32;
            if last_size.get() != (backing_w, backing_h) {
                last_size.set((backing_w, backing_h));
                map_canvas.set_width(backing_w);
                map_canvas.set_height(backing_h);
                overlay_canvas.set_width(backing_w);
                overlay_canvas.set_height(backing_h);
                if let Some(surface) = pick.borrow_mut().as_mut() {
                    surface.resize(css_w, css_h, dpr);
                    // A pick buffer out of step with the visible canvas would
                    // hit-test against stale geometry.
                    debug_assert_eq!(surface.backing_size(), (backing_w, backing_h));
                }
                // Canvas resize resets 2D context state
                *map_ctx.borrow_mut() = None;
                *overlay_ctx.borrow_mut() = None;
                *pick_rendered.borrow_mut() = None;
            }

            let mut controller = controller.borrow_mut();

            // Start a requested transition on this frame's clock.
            if let Some(request) = pending_zoom.borrow_mut().take() {
                match request {
                    ZoomRequest::Drill(state_id) => {
                        let bounds = dataset.with_untracked(|d| {
                            d.as_ref()
                                .and_then(|d| d.state(&state_id))
                                .and_then(|s| s.geometry.bounds())
                        });
                        if let Some(bounds) = bounds {
                            hovered_state.set(None);
                            controller.select_state(
                                state_id,
                                &bounds,
                                viewport.get_untracked(),
                                css_w,
                                css_h,
                                now,
                            );
                        }
                    }
                    ZoomRequest::Reset => {
                        hovered_county.set(None);
                        selected.set(None);
                        controller.reset(viewport.get_untracked(), now);
                    }
                }
            }

            match controller.tick(now) {
                TickOutcome::Idle => {}
                TickOutcome::Animating(vp) => viewport.set(vp),
                TickOutcome::Finished(vp, completion) => {
                    viewport.set(vp);
                    match completion {
                        Completion::DrilledIn(state_id) => selected.set(Some(state_id)),
                        Completion::ResetDone => {}
                    }
                }
            }

            let vp = viewport.get_untracked();
            let restriction = controller.selection().map(str::to_owned);
            let overlay_visible = controller.overlay_visible();
            let animating = controller.is_animating();
            drop(controller);

            dataset.with_untracked(|d| {
                let Some(d) = d.as_ref() else {
                    return;
                };

                if map_ctx.borrow().is_none() {
                    *map_ctx.borrow_mut() = canvas_ctx(map_canvas);
                }
                if let Some(ctx) = map_ctx.borrow().as_ref() {
                    let year = d
                        .years
                        .get(year_index.get_untracked())
                        .copied()
                        .unwrap_or_default();
                    render_visible(
                        ctx,
                        d,
                        &d.color_scale(),
                        year,
                        &vp,
                        restriction.as_deref(),
                        css_w,
                        css_h,
                        dpr,
                    );
                }

                if overlay_ctx.borrow().is_none() {
                    *overlay_ctx.borrow_mut() = canvas_ctx(overlay_canvas);
                }
                if let Some(ctx) = overlay_ctx.borrow().as_ref() {
                    if overlay_visible {
                        render_state_overlay(
                            ctx,
                            d,
                            hovered_state.get_untracked(),
                            &vp,
                            css_w,
                            css_h,
                            dpr,
                            show_names.get_untracked(),
                        );
                    } else {
                        clear_layer(ctx, css_w, css_h, dpr);
                    }
                }

                if let Some(surface) = pick.borrow().as_ref() {
                    let wanted = restriction.clone().map(|id| (vp, id));
                    let mut rendered = pick_rendered.borrow_mut();
                    if *rendered != wanted {
                        render_pick(
                            surface.ctx(),
                            d,
                            &vp,
                            restriction.as_deref(),
                            css_w,
                            css_h,
                            dpr,
                        );
                        *rendered = wanted;
                    }
                }
            });

            animating
        }))
    };

    // Repaint on any scene change.
    let sched = scheduler.clone();
    Effect::new(move || {
        dataset.track();
        year_index.track();
        viewport.track();
        hovered_state.track();
        selected.track();
        show_names.track();
        sched.mark_dirty();
    });

    // --- Input handlers ---

    let on_wheel = {
        let controller = controller.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            if controller.borrow().is_animating() {
                return;
            }
            let delta = e.delta_y();
            let x = e.offset_x() as f64;
            let y = e.offset_y() as f64;
            viewport.update(|vp| vp.zoom_at(delta, x, y));
        }
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let controller = controller.clone();
        move |e: PointerEvent| {
            if controller.borrow().is_animating() {
                return;
            }
            is_dragging.set(true);
            hovered_county.set(None);
            hovered_state.set(None);
            drag_start_x.set(e.client_x() as f64);
            drag_start_y.set(e.client_y() as f64);
            last_x.set(e.client_x() as f64);
            last_y.set(e.client_y() as f64);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_x = last_x.clone();
        let last_y = last_y.clone();
        let controller = controller.clone();
        let pick = pick.clone();
        let state_grid = state_grid.clone();
        move |e: PointerEvent| {
            if is_dragging.get() {
                let dx = e.client_x() as f64 - last_x.get();
                let dy = e.client_y() as f64 - last_y.get();
                last_x.set(e.client_x() as f64);
                last_y.set(e.client_y() as f64);
                viewport.update(|vp| vp.pan(dx, dy));
                return;
            }

            let local = map_canvas_ref
                .get_untracked()
                .map(|el| {
                    let rect = el.get_bounding_client_rect();
                    (
                        e.client_x() as f64 - rect.left(),
                        e.client_y() as f64 - rect.top(),
                    )
                })
                .unwrap_or((e.offset_x() as f64, e.offset_y() as f64));

            let controller = controller.borrow();
            if controller.is_animating() {
                return;
            }
            if controller.selection().is_some() {
                // Drilled in: counties hit-test through the pick buffer.
                let hit = pick.borrow().as_ref().and_then(|surface| {
                    dataset.with_untracked(|d| {
                        let d = d.as_ref()?;
                        surface.resolve(&d.picks, local.0, local.1)
                    })
                });
                if hit != hovered_county.get_untracked() {
                    hovered_county.set(hit);
                }
                if hovered_county.get_untracked().is_some() {
                    pointer_pos.set(Some((e.client_x() as f64, e.client_y() as f64)));
                }
            } else if controller.overlay_visible() {
                // Overview: states hit-test through the spatial grid.
                let vp = viewport.get_untracked();
                let (wx, wy) = vp.screen_to_world(local.0, local.1);
                let hit = state_grid.borrow().as_ref().and_then(|grid| {
                    dataset.with_untracked(|d| {
                        d.as_ref().and_then(|d| grid.find_at(&d.states, wx, wy))
                    })
                });
                if hit != hovered_state.get_untracked() {
                    hovered_state.set(hit);
                }
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let drag_start_x = drag_start_x.clone();
        let drag_start_y = drag_start_y.clone();
        let controller = controller.clone();
        let pending_zoom = pending_zoom.clone();
        let state_grid = state_grid.clone();
        let sched = scheduler.clone();
        move |e: MouseEvent| {
            let dx = (e.client_x() as f64 - drag_start_x.get()).abs();
            let dy = (e.client_y() as f64 - drag_start_y.get()).abs();
            if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
                return;
            }
            let controller = controller.borrow();
            if controller.is_animating() || !controller.overlay_visible() {
                return;
            }
            drop(controller);

            let local = map_canvas_ref
                .get_untracked()
                .map(|el| {
                    let rect = el.get_bounding_client_rect();
                    (
                        e.client_x() as f64 - rect.left(),
                        e.client_y() as f64 - rect.top(),
                    )
                })
                .unwrap_or((e.offset_x() as f64, e.offset_y() as f64));
            let vp = viewport.get_untracked();
            let (wx, wy) = vp.screen_to_world(local.0, local.1);
            let hit = state_grid.borrow().as_ref().and_then(|grid| {
                dataset.with_untracked(|d| {
                    let d = d.as_ref()?;
                    let idx = grid.find_at(&d.states, wx, wy)?;
                    Some(d.states[idx].id.clone())
                })
            });
            if let Some(state_id) = hit {
                *pending_zoom.borrow_mut() = Some(ZoomRequest::Drill(state_id));
                sched.mark_dirty();
            }
        }
    };

    let on_pointer_leave = {
        move |_: PointerEvent| {
            if hovered_county.get_untracked().is_some() {
                hovered_county.set(None);
            }
            if hovered_state.get_untracked().is_some() {
                hovered_state.set(None);
            }
        }
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                pinch_dist.set((dx * dx + dy * dy).sqrt());
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        let controller = controller.clone();
        move |e: web_sys::TouchEvent| {
            let touches = e.touches();
            if touches.length() == 2 {
                e.prevent_default();
                if controller.borrow().is_animating() {
                    return;
                }
                let (Some(t0), Some(t1)) = (touches.get(0), touches.get(1)) else {
                    return;
                };
                let dx = (t1.client_x() - t0.client_x()) as f64;
                let dy = (t1.client_y() - t0.client_y()) as f64;
                let new_dist = (dx * dx + dy * dy).sqrt();
                let old_dist = pinch_dist.get();

                if old_dist > 0.0 {
                    let mid_x = (t0.client_x() + t1.client_x()) as f64 / 2.0;
                    let mid_y = (t0.client_y() + t1.client_y()) as f64 / 2.0;
                    let delta = -(new_dist - old_dist) * 2.0;
                    viewport.update(|vp| vp.zoom_at(delta, mid_x, mid_y));
                }

                pinch_dist.set(new_dist);
            }
        }
    };

    // Stored thread-locally so the `<Show>` child closure, which leptos
    // requires to be Send + Sync, need not capture the Rc-based handler.
    let on_reset = StoredValue::new_local({
        let pending_zoom = pending_zoom.clone();
        let sched = scheduler.clone();
        move |_: MouseEvent| {
            *pending_zoom.borrow_mut() = Some(ZoomRequest::Reset);
            sched.mark_dirty();
        }
    });

    // Two visible canvases plus the reset affordance; the pick buffer stays
    // detached.
    view! {
        <div
            style="position: relative; width: 100%; height: 100%; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:click=on_click
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
        >
            <canvas
                node_ref=map_canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
            <canvas
                node_ref=overlay_canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; pointer-events: none;"
            />
            <Show when=move || selected.get().is_some()>
                <button class="reset-zoom" on:click=move |e| on_reset.with_value(|f| f(e))>
                    "Back to overview"
                </button>
            </Show>
        </div>
    }
}
