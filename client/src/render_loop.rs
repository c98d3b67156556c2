use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Coalesces repaint requests onto `requestAnimationFrame`.
///
/// Call `mark_dirty()` whenever the scene changes; the frame function runs
/// at most once per vsync with the rAF timestamp (which drives zoom
/// transitions). Returning `true` keeps the loop running for the next
/// frame, so animations self-schedule until they settle.
pub struct FrameScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    dirty: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Inner {
    /// Requests one animation frame if none is pending.
    fn schedule(&self) {
        if self.raf_id.get().is_some() {
            return;
        }
        let Some(window) = self.window.as_ref() else {
            return;
        };
        let cb_ref = self.callback.borrow();
        if let Some(cb) = cb_ref.as_ref() {
            if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                self.raf_id.set(Some(id));
            }
        }
    }
}

impl FrameScheduler {
    pub fn new(frame_fn: impl Fn(f64) -> bool + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            dirty: Cell::new(false),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            inner_cb.raf_id.set(None);
            if !inner_cb.dirty.replace(false) {
                return;
            }
            if frame_fn(timestamp) {
                inner_cb.dirty.set(true);
                inner_cb.schedule();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self { inner }
    }

    /// Flag the scene for repaint and make sure a frame is pending.
    pub fn mark_dirty(&self) {
        self.inner.dirty.set(true);
        self.inner.schedule();
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        self.inner.dirty.set(false);
        // Break the callback->inner reference cycle on teardown.
        self.inner.callback.borrow_mut().take();
    }
}
