use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use chronomap_shared::PickRegistry;

/// The hidden hit-testing canvas. Created detached and never attached to
/// the DOM; it exists only to be painted in pick colors and read back one
/// pixel at a time.
pub struct PickSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl PickSurface {
    pub fn new() -> Result<Self, String> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|_| "canvas creation failed")?
            .dyn_into()
            .map_err(|_| "not a canvas element")?;

        // The buffer is read back on every pointer move.
        let options = js_sys::Object::new();
        js_sys::Reflect::set(
            &options,
            &"willReadFrequently".into(),
            &wasm_bindgen::JsValue::TRUE,
        )
        .ok();
        let ctx: CanvasRenderingContext2d = canvas
            .get_context_with_context_options("2d", &options)
            .map_err(|_| "2d context unavailable")?
            .ok_or("2d context unavailable")?
            .dyn_into()
            .map_err(|_| "unexpected context type")?;

        Ok(Self {
            canvas,
            ctx,
            dpr: 1.0,
        })
    }

    pub fn ctx(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    /// Matches the pick buffer's backing store to the visible canvas. Both
    /// surfaces must agree, or pick reads would sample the wrong county.
    pub fn resize(&mut self, css_w: f64, css_h: f64, dpr: f64) {
        self.dpr = dpr;
        self.canvas.set_width((css_w * dpr) as u32);
        self.canvas.set_height((css_h * dpr) as u32);
    }

    /// Resolves the county under a surface-local CSS-pixel coordinate by
    /// reading one pixel out of the pick buffer. Background and
    /// anti-aliasing artifacts resolve to `None`.
    pub fn resolve(&self, registry: &PickRegistry, x: f64, y: f64) -> Option<usize> {
        let (w, h) = self.backing_size();
        if w == 0 || h == 0 {
            return None;
        }
        let px = ((x * self.dpr).floor()).clamp(0.0, (w - 1) as f64);
        let py = ((y * self.dpr).floor()).clamp(0.0, (h - 1) as f64);
        let image = self.ctx.get_image_data(px, py, 1.0, 1.0).ok()?;
        let data = image.data();
        registry.resolve(data[0], data[1], data[2])
    }
}
