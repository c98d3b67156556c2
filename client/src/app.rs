use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use chronomap_shared::{Dataset, StateId};

use gloo_storage::Storage;

use crate::canvas::MapCanvas;
use crate::data::load_dataset;
use crate::legend::Legend;
use crate::scrubber::{LoopPolicy, Scrubber, TemporalDriver, start_playback_engine};
use crate::tooltip::Tooltip;
use crate::viewport::Viewport;

#[derive(Clone, Copy)]
pub(crate) struct DatasetStore(pub RwSignal<Option<Dataset>>);

/// Index into the dataset's year sequence — the single cursor that
/// recoloring, the scrubber, and the tooltip all follow.
#[derive(Clone, Copy)]
pub(crate) struct YearIndex(pub RwSignal<usize>);

#[derive(Clone, Copy)]
pub(crate) struct PlaybackActive(pub RwSignal<bool>);

#[derive(Clone, Copy)]
pub(crate) struct PlaybackPolicy(pub RwSignal<LoopPolicy>);

/// The non-reactive playback model, shared by the interval engine and the
/// scrubber input. Cursor changes it produces flow out through [`YearIndex`].
#[derive(Clone, Copy)]
pub(crate) struct PlaybackDriver(pub StoredValue<TemporalDriver>);

/// County index under the pointer while drilled into a state.
#[derive(Clone, Copy)]
pub(crate) struct HoveredCounty(pub RwSignal<Option<usize>>);

/// State index under the pointer at the overview zoom.
#[derive(Clone, Copy)]
pub(crate) struct HoveredState(pub RwSignal<Option<usize>>);

/// The drilled-in state, set when its zoom transition completes.
#[derive(Clone, Copy)]
pub(crate) struct SelectedState(pub RwSignal<Option<StateId>>);

/// Last pointer position in client coordinates, for tooltip placement.
#[derive(Clone, Copy)]
pub(crate) struct PointerPosition(pub RwSignal<Option<(f64, f64)>>);

#[derive(Clone, Copy)]
pub(crate) struct ShowStateNames(pub RwSignal<bool>);

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    loop_policy: LoopPolicy,
    autoplay: bool,
    show_state_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            loop_policy: LoopPolicy::Wrap,
            autoplay: true,
            show_state_names: true,
        }
    }
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let saved: Settings = gloo_storage::LocalStorage::get("chronomap_settings").unwrap_or_default();

    let dataset: RwSignal<Option<Dataset>> = RwSignal::new(None);
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::IDENTITY);
    let year_index: RwSignal<usize> = RwSignal::new(0);
    let playback_active: RwSignal<bool> = RwSignal::new(false);
    let playback_policy: RwSignal<LoopPolicy> = RwSignal::new(saved.loop_policy);
    let hovered_county: RwSignal<Option<usize>> = RwSignal::new(None);
    let hovered_state: RwSignal<Option<usize>> = RwSignal::new(None);
    let selected: RwSignal<Option<StateId>> = RwSignal::new(None);
    let pointer_pos: RwSignal<Option<(f64, f64)>> = RwSignal::new(None);
    let show_state_names: RwSignal<bool> = RwSignal::new(saved.show_state_names);

    provide_context(DatasetStore(dataset));
    provide_context(viewport);
    provide_context(YearIndex(year_index));
    provide_context(PlaybackActive(playback_active));
    provide_context(PlaybackPolicy(playback_policy));
    provide_context(PlaybackDriver(StoredValue::new(TemporalDriver::new(
        0,
        saved.loop_policy,
    ))));
    provide_context(HoveredCounty(hovered_county));
    provide_context(HoveredState(hovered_state));
    provide_context(SelectedState(selected));
    provide_context(PointerPosition(pointer_pos));
    provide_context(ShowStateNames(show_state_names));

    // Persist settings to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            loop_policy: playback_policy.get(),
            autoplay: playback_active.get(),
            show_state_names: show_state_names.get(),
        };
        let _ = gloo_storage::LocalStorage::set("chronomap_settings", &settings);
    });

    // Load the dataset once; playback starts on its own when autoplay is on.
    let autoplay = saved.autoplay;
    Effect::new(move || {
        if dataset.with_untracked(|d| d.is_some()) {
            return;
        }
        spawn_local(async move {
            match load_dataset().await {
                Ok(d) => {
                    // Start at the first year of the sequence.
                    year_index.set(0);
                    dataset.set(Some(d));
                    if autoplay {
                        playback_active.set(true);
                    }
                }
                Err(e) => {
                    web_sys::console::error_1(&format!("dataset load failed: {e}").into());
                }
            }
        });
    });

    Effect::new(move || {
        start_playback_engine();
    });

    view! {
        <div class="app">
            <header class="app-header">
                <h1>"County unemployment over time"</h1>
                <label class="names-toggle">
                    <input
                        type="checkbox"
                        prop:checked=move || show_state_names.get()
                        on:change=move |_| show_state_names.update(|v| *v = !*v)
                    />
                    "State names"
                </label>
            </header>
            <div class="map-frame" style="position: relative; width: 960px; height: 600px;">
                <MapCanvas />
            </div>
            <Legend />
            <Scrubber />
            <Tooltip />
        </div>
    }
}
