use std::cell::RefCell;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::app::{DatasetStore, PlaybackActive, PlaybackDriver, PlaybackPolicy, YearIndex};

/// Milliseconds between automatic year steps.
pub const STEP_INTERVAL_MS: i32 = 2000;

/// What happens when playback reaches either end of the year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopPolicy {
    /// Jump back to the first year and keep going forward.
    #[default]
    Wrap,
    /// Reverse direction and sweep back through the range.
    Alternate,
}

/// Advance one step through `len` frames. Returns the new index and
/// direction. At a boundary, `Alternate` reverses first so the step lands
/// one frame inward; `Wrap` steps modulo `len`.
pub fn advance(index: usize, len: usize, direction: i32, policy: LoopPolicy) -> (usize, i32) {
    if len <= 1 {
        return (0, direction);
    }
    let at_boundary = (direction > 0 && index + 1 == len) || (direction < 0 && index == 0);
    let direction = if at_boundary && policy == LoopPolicy::Alternate {
        -direction
    } else {
        direction
    };
    let next = (index as i64 + direction as i64).rem_euclid(len as i64) as usize;
    (next, direction)
}

/// Pure model of the scrubber: an index into the year axis, a travel
/// direction, and whether the clock is running. The wasm interval engine
/// mirrors this logic against the reactive signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporalDriver {
    index: usize,
    len: usize,
    direction: i32,
    policy: LoopPolicy,
    running: bool,
}

impl TemporalDriver {
    pub fn new(len: usize, policy: LoopPolicy) -> Self {
        Self {
            index: 0,
            len,
            direction: 1,
            policy,
            running: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn set_policy(&mut self, policy: LoopPolicy) {
        self.policy = policy;
    }

    /// Adjusts the frame count (the dataset arrives after the driver is
    /// created), clamping the cursor back into range if it shrank.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }

    /// One clock tick. Does nothing while paused.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        let (index, direction) = advance(self.index, self.len, self.direction, self.policy);
        self.index = index;
        self.direction = direction;
    }

    /// Manual scrub: jumps to `index` and pauses the clock.
    pub fn scrub(&mut self, index: usize) {
        self.running = false;
        self.index = index.min(self.len.saturating_sub(1));
    }
}

struct StepIntervalBinding {
    window: web_sys::Window,
    interval_id: i32,
    _callback: Closure<dyn Fn()>,
}

thread_local! {
    static STEP_INTERVAL_BINDING: RefCell<Option<StepIntervalBinding>> = const { RefCell::new(None) };
}

/// Starts the year-stepping engine. Call this once from an Effect.
/// The interval always runs; it only advances while playback is active.
pub fn start_playback_engine() {
    STEP_INTERVAL_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            old.window.clear_interval_with_handle(old.interval_id);
        }
    });

    let DatasetStore(dataset) = expect_context();
    let YearIndex(year_index) = expect_context();
    let PlaybackActive(playing) = expect_context();
    let PlaybackPolicy(policy) = expect_context();
    let PlaybackDriver(driver) = expect_context();

    let Some(window) = web_sys::window() else {
        return;
    };
    let cb = Closure::<dyn Fn()>::new(move || {
        let len = dataset.with_untracked(|d| d.as_ref().map(|d| d.years.len()).unwrap_or(0));
        if len == 0 {
            return;
        }
        driver.update_value(|d| {
            d.set_len(len);
            d.set_policy(policy.get_untracked());
            d.set_running(playing.get_untracked());
            d.tick();
            if d.is_running() {
                year_index.set(d.index());
            }
        });
    });

    let Ok(interval_id) = window.set_interval_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        STEP_INTERVAL_MS,
    ) else {
        return;
    };
    STEP_INTERVAL_BINDING.with(|slot| {
        *slot.borrow_mut() = Some(StepIntervalBinding {
            window: window.clone(),
            interval_id,
            _callback: cb,
        });
    });
}

/// Year slider, play/pause toggle, and loop policy picker.
#[component]
pub fn Scrubber() -> impl IntoView {
    let DatasetStore(dataset) = expect_context();
    let YearIndex(year_index) = expect_context();
    let PlaybackActive(playing) = expect_context();
    let PlaybackPolicy(policy) = expect_context();
    let PlaybackDriver(driver) = expect_context();

    let years = Memo::new(move |_| {
        dataset.with(|d| d.as_ref().map(|d| d.years.clone()).unwrap_or_default())
    });
    let current_year = Memo::new(move |_| {
        years.with(|ys| ys.get(year_index.get()).copied())
    });
    let max_index = move || years.with(|ys| ys.len().saturating_sub(1));

    let on_scrub = move |ev: leptos::ev::Event| {
        if let Ok(idx) = event_target_value(&ev).parse::<usize>() {
            // Manual scrubbing always pauses playback.
            playing.set(false);
            let len = years.with_untracked(|ys| ys.len());
            driver.update_value(|d| {
                d.set_len(len);
                d.scrub(idx);
                year_index.set(d.index());
            });
        }
    };

    let toggle_play = move |_| {
        playing.update(|p| *p = !*p);
    };

    let on_policy = move |ev: leptos::ev::Event| {
        let next = match event_target_value(&ev).as_str() {
            "alternate" => LoopPolicy::Alternate,
            _ => LoopPolicy::Wrap,
        };
        policy.set(next);
    };

    view! {
        <div class="scrubber">
            <button
                class="scrubber-toggle"
                on:click=toggle_play
                title=move || if playing.get() { "Pause" } else { "Play" }
            >
                {move || if playing.get() { "⏸" } else { "▶" }}
            </button>
            <input
                type="range"
                class="scrubber-track"
                min="0"
                max=move || max_index().to_string()
                prop:value=move || year_index.get().to_string()
                on:input=on_scrub
            />
            <span class="scrubber-year">
                {move || current_year.get().map(|y| y.to_string()).unwrap_or_default()}
            </span>
            <select class="scrubber-policy" on:change=on_policy>
                <option
                    value="wrap"
                    selected=move || policy.get() == LoopPolicy::Wrap
                >
                    "Loop"
                </option>
                <option
                    value="alternate"
                    selected=move || policy.get() == LoopPolicy::Alternate
                >
                    "Bounce"
                </option>
            </select>
        </div>
    }
}
