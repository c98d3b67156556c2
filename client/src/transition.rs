use chronomap_shared::{Bounds, StateId};

use crate::viewport::Viewport;

pub const ZOOM_DURATION_MS: f64 = 1000.0;

/// Where the view currently is in the overview ⇄ drilled-in cycle.
///
/// The vector state overlay is visible only in `Overview`; the pick buffer
/// and county hover are active only in `Drilled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoomPhase {
    Overview,
    DrillingIn(StateId),
    Drilled(StateId),
    ResettingOut,
}

/// Cubic ease-out: decelerating to zero velocity.
fn cubic_ease_out(t: f64) -> f64 {
    let t = t - 1.0;
    t * t * t + 1.0
}

#[derive(Debug, Clone)]
struct ActiveTransition {
    from: Viewport,
    to: Viewport,
    start: f64,
    generation: u64,
}

/// What a frame tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No transition in flight.
    Idle,
    /// Transition still running; apply this transform and keep animating.
    Animating(Viewport),
    /// Transition just finished; apply the final transform and the completion.
    Finished(Viewport, Completion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Drill-in done: selection is now this state, pick buffer redraws
    /// restricted to it, reset affordance appears.
    DrilledIn(StateId),
    /// Reset done: the overview layer is visible again.
    ResetDone,
}

/// Owns the overview ⇄ drilled state machine and its animated transitions.
///
/// At most one transition is ever in flight: starting a new one replaces the
/// active transition and bumps the generation counter, so a superseded
/// transition can never deliver its completion. Callers poll `tick` from the
/// frame loop; there are no stored callbacks to go stale.
#[derive(Debug, Clone)]
pub struct TransformController {
    phase: ZoomPhase,
    active: Option<ActiveTransition>,
    generation: u64,
}

impl Default for TransformController {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformController {
    pub fn new() -> Self {
        Self {
            phase: ZoomPhase::Overview,
            active: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> &ZoomPhase {
        &self.phase
    }

    /// The drilled-in state, once its transition has completed.
    pub fn selection(&self) -> Option<&str> {
        match &self.phase {
            ZoomPhase::Drilled(id) => Some(id.as_str()),
            _ => None,
        }
    }

    /// The vector overview layer is shown only at overview; it disappears the
    /// moment a drill-in starts and reappears when a reset finishes.
    pub fn overlay_visible(&self) -> bool {
        matches!(self.phase, ZoomPhase::Overview)
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Begin an animated drill into `state_id`, superseding any in-flight
    /// transition. `current` is the live transform at call time.
    pub fn select_state(
        &mut self,
        state_id: StateId,
        state_bounds: &Bounds,
        current: Viewport,
        viewport_w: f64,
        viewport_h: f64,
        now: f64,
    ) {
        self.generation += 1;
        self.phase = ZoomPhase::DrillingIn(state_id);
        self.active = Some(ActiveTransition {
            from: current,
            to: Viewport::fit_bounds(state_bounds, viewport_w, viewport_h),
            start: now,
            generation: self.generation,
        });
    }

    /// Begin an animated return to the overview. Selection clears at
    /// animation start, so the pick buffer empties immediately; the overlay
    /// reappears at completion.
    pub fn reset(&mut self, current: Viewport, now: f64) {
        self.generation += 1;
        self.phase = ZoomPhase::ResettingOut;
        self.active = Some(ActiveTransition {
            from: current,
            to: Viewport::IDENTITY,
            start: now,
            generation: self.generation,
        });
    }

    /// Advance the in-flight transition to `now`.
    pub fn tick(&mut self, now: f64) -> TickOutcome {
        let Some(active) = &self.active else {
            return TickOutcome::Idle;
        };
        if active.generation != self.generation {
            // Superseded transition must never complete.
            self.active = None;
            return TickOutcome::Idle;
        }

        let t = ((now - active.start) / ZOOM_DURATION_MS).clamp(0.0, 1.0);
        let vp = Viewport::lerp(&active.from, &active.to, cubic_ease_out(t));
        if t < 1.0 {
            return TickOutcome::Animating(vp);
        }

        self.active = None;
        let completion = match std::mem::replace(&mut self.phase, ZoomPhase::Overview) {
            ZoomPhase::DrillingIn(id) => {
                self.phase = ZoomPhase::Drilled(id.clone());
                Completion::DrilledIn(id)
            }
            ZoomPhase::ResettingOut => Completion::ResetDone,
            // A completed transition in a settled phase cannot happen; treat
            // it as a finished reset.
            other => {
                self.phase = other;
                Completion::ResetDone
            }
        };
        TickOutcome::Finished(vp, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: f64 = 960.0;
    const H: f64 = 600.0;

    fn state_bounds() -> Bounds {
        Bounds {
            min_x: 100.0,
            min_y: 100.0,
            max_x: 400.0,
            max_y: 300.0,
        }
    }

    fn drive_to_end(c: &mut TransformController, from: f64) -> Vec<Completion> {
        let mut done = Vec::new();
        let mut t = from;
        while t <= from + ZOOM_DURATION_MS + 50.0 {
            if let TickOutcome::Finished(_, completion) = c.tick(t) {
                done.push(completion);
            }
            t += 100.0;
        }
        done
    }

    #[test]
    fn drill_in_completes_with_selection() {
        let mut c = TransformController::new();
        c.select_state("06".into(), &state_bounds(), Viewport::IDENTITY, W, H, 0.0);
        assert!(!c.overlay_visible());
        assert_eq!(c.selection(), None, "selection set only at animation end");

        let done = drive_to_end(&mut c, 0.0);
        assert_eq!(done, vec![Completion::DrilledIn("06".into())]);
        assert_eq!(c.selection(), Some("06"));
        assert!(!c.is_animating());
    }

    #[test]
    fn reset_before_drill_completes_supersedes_cleanly() {
        let mut c = TransformController::new();
        c.select_state("06".into(), &state_bounds(), Viewport::IDENTITY, W, H, 0.0);

        // Partway through the drill, ask for a reset.
        let mid = match c.tick(400.0) {
            TickOutcome::Animating(vp) => vp,
            other => panic!("expected in-flight animation, got {other:?}"),
        };
        c.reset(mid, 400.0);
        assert_eq!(c.selection(), None);

        // Only the reset completion ever fires; the drill's never does.
        let done = drive_to_end(&mut c, 400.0);
        assert_eq!(done, vec![Completion::ResetDone]);
        assert_eq!(*c.phase(), ZoomPhase::Overview);
        assert!(c.overlay_visible());
    }

    #[test]
    fn rapid_reselect_keeps_only_latest_target() {
        let mut c = TransformController::new();
        c.select_state("06".into(), &state_bounds(), Viewport::IDENTITY, W, H, 0.0);
        c.select_state("48".into(), &state_bounds(), Viewport::IDENTITY, W, H, 100.0);

        let done = drive_to_end(&mut c, 100.0);
        assert_eq!(done, vec![Completion::DrilledIn("48".into())]);
        assert_eq!(c.selection(), Some("48"));
    }

    #[test]
    fn tick_progress_eases_toward_target() {
        let mut c = TransformController::new();
        c.select_state("06".into(), &state_bounds(), Viewport::IDENTITY, W, H, 0.0);
        let target = Viewport::fit_bounds(&state_bounds(), W, H);

        let early = match c.tick(100.0) {
            TickOutcome::Animating(vp) => vp,
            other => panic!("unexpected {other:?}"),
        };
        let late = match c.tick(900.0) {
            TickOutcome::Animating(vp) => vp,
            other => panic!("unexpected {other:?}"),
        };
        let dist =
            |vp: &Viewport| (vp.scale - target.scale).abs() + (vp.offset_x - target.offset_x).abs();
        assert!(dist(&late) < dist(&early));
    }

    #[test]
    fn finished_transition_lands_exactly_on_target() {
        let mut c = TransformController::new();
        c.select_state("06".into(), &state_bounds(), Viewport::IDENTITY, W, H, 0.0);
        let target = Viewport::fit_bounds(&state_bounds(), W, H);
        match c.tick(ZOOM_DURATION_MS) {
            TickOutcome::Finished(vp, _) => assert_eq!(vp, target),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn idle_controller_ticks_idle() {
        let mut c = TransformController::new();
        assert_eq!(c.tick(123.0), TickOutcome::Idle);
        assert!(c.overlay_visible());
    }

    #[test]
    fn ease_out_endpoints() {
        assert!((cubic_ease_out(0.0)).abs() < 1e-9);
        assert!((cubic_ease_out(1.0) - 1.0).abs() < 1e-9);
        assert!(cubic_ease_out(0.5) > 0.5);
    }
}
