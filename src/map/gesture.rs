use crate::config::ViewportConfig;
use crate::events::{PointerInput, ViewControl, ViewportEvent, WheelDeltaMode, PRIMARY_BUTTON};
use crate::map::animation::AnimationDriver;
use crate::map::hit::pick_at;
use crate::map::markers::{MarkerId, ProjectedMarker};
use crate::map::transform::{zoom_at_point, ViewTransform, ViewportError};
use glam::DVec2;
use std::borrow::Cow;
use std::collections::VecDeque;

/// Transform position at a point in time, for release-velocity estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSample {
    pub pos: DVec2,
    pub time: f64,
}

/// State of one press-drag-release, alive from pointer-down to pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerSession {
    pub pointer_id: u32,
    pub start: DVec2,
    pub start_transform: ViewTransform,
    pub samples: VecDeque<PanSample>,
    pub did_pan: bool,
}

impl PointerSession {
    fn record(&mut self, transform: &ViewTransform, time: f64, config: &ViewportConfig) {
        self.samples.push_back(PanSample {
            pos: DVec2::new(transform.x, transform.y),
            time,
        });

        while self.samples.len() > 2
            && self
                .samples
                .front()
                .is_some_and(|s| time - s.time > config.pan_sample_window_ms)
        {
            self.samples.pop_front();
        }
        while self.samples.len() > config.pan_sample_max {
            self.samples.pop_front();
        }
    }

    /// Average velocity across the sample window, if it spans any time.
    fn release_velocity(&self) -> Option<DVec2> {
        let (first, last) = (self.samples.front()?, self.samples.back()?);
        let dt = last.time - first.time;
        if self.samples.len() < 2 || dt <= 0.0 {
            return None;
        }
        Some((last.pos - first.pos) / dt)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Hovering(MarkerId),
    Panning(PointerSession),
}

/// What the owner of the selection should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionIntent {
    /// A click landed; report the hit (or the miss) as the new selection.
    Confirm(Option<MarkerId>),
    /// Drop the current selection, if any.
    Clear,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GestureOutcome {
    pub redraw: bool,
    pub selection: Option<SelectionIntent>,
}

/// Everything a gesture may read or mutate while handling one event.
pub struct GestureContext<'a> {
    pub transform: &'a mut ViewTransform,
    pub markers: &'a [ProjectedMarker],
    pub driver: &'a mut AnimationDriver,
    pub config: &'a ViewportConfig,
    pub size: (f64, f64),
    pub now: f64,
}

/// Turns pointer, wheel and control input into pans, zooms, hover changes,
/// selections and momentum.
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    state: GestureState,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn hovered(&self) -> Option<&str> {
        match &self.state {
            GestureState::Hovering(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.state, GestureState::Panning(_))
    }

    /// Forget the hovered marker (e.g. when the marker set is replaced).
    /// Returns whether anything changed.
    pub fn clear_hover(&mut self) -> bool {
        if let GestureState::Hovering(_) = self.state {
            self.state = GestureState::Idle;
            return true;
        }
        false
    }

    pub fn handle(&mut self, event: &ViewportEvent, cx: GestureContext) -> Result<GestureOutcome, ViewportError> {
        let outcome = match event {
            ViewportEvent::PointerDown(p) => self.pointer_down(p, cx),
            ViewportEvent::PointerMove(p) => self.pointer_move(p, cx),
            ViewportEvent::PointerUp(p) | ViewportEvent::PointerCancel(p) => self.pointer_up(p, cx),
            ViewportEvent::PointerLeave(_) => GestureOutcome {
                redraw: self.clear_hover(),
                selection: None,
            },
            ViewportEvent::Wheel {
                delta_y,
                delta_mode,
                x,
                y,
            } => return wheel(*delta_y, *delta_mode, DVec2::new(*x, *y), cx),
            ViewportEvent::Resize { .. } => GestureOutcome::default(),
        };
        Ok(outcome)
    }

    /// Zoom in/out around the viewport centre, or return to identity, with an
    /// eased tween.
    pub fn control(&mut self, control: ViewControl, cx: GestureContext) -> Result<GestureOutcome, ViewportError> {
        cx.driver.cancel();

        let current = *cx.transform;
        let center = DVec2::new(cx.size.0 / 2.0, cx.size.1 / 2.0);
        let factor = cx.config.zoom_control_factor;
        let (target, duration) = match control {
            ViewControl::ZoomIn => (
                zoom_at_point(&current, current.k * factor, center, cx.config.scale)?.into_owned(),
                cx.config.zoom_tween_ms,
            ),
            ViewControl::ZoomOut => (
                zoom_at_point(&current, current.k / factor, center, cx.config.scale)?.into_owned(),
                cx.config.zoom_tween_ms,
            ),
            ViewControl::Reset => (
                ViewTransform::new(0.0, 0.0, cx.config.scale.clamp(1.0)),
                cx.config.reset_tween_ms,
            ),
        };

        log::debug!("{control:?}: tween to k={:.3}", target.k);
        cx.driver.start_tween(current, target, duration, cx.now);
        Ok(GestureOutcome {
            redraw: false,
            selection: Some(SelectionIntent::Clear),
        })
    }

    fn pointer_down(&mut self, p: &PointerInput, cx: GestureContext) -> GestureOutcome {
        if p.button != PRIMARY_BUTTON || !p.is_primary || self.is_panning() {
            return GestureOutcome::default();
        }

        cx.driver.cancel();
        let had_hover = self.hovered().is_some();

        let mut session = PointerSession {
            pointer_id: p.pointer_id,
            start: p.position(),
            start_transform: *cx.transform,
            samples: VecDeque::with_capacity(cx.config.pan_sample_max + 1),
            did_pan: false,
        };
        session.record(cx.transform, cx.now, cx.config);
        self.state = GestureState::Panning(session);

        GestureOutcome {
            redraw: had_hover,
            selection: None,
        }
    }

    fn pointer_move(&mut self, p: &PointerInput, cx: GestureContext) -> GestureOutcome {
        let GestureState::Panning(session) = &mut self.state else {
            return self.hover(p.position(), &cx);
        };
        if session.pointer_id != p.pointer_id {
            return GestureOutcome::default();
        }

        let delta = p.position() - session.start;
        let mut selection = None;
        if !session.did_pan {
            if delta.x.abs() + delta.y.abs() < cx.config.drag_threshold_px {
                return GestureOutcome::default();
            }
            session.did_pan = true;
            selection = Some(SelectionIntent::Clear);
            log::debug!("drag threshold crossed");
        }

        let start = session.start_transform;
        *cx.transform = ViewTransform::new(start.x + delta.x, start.y + delta.y, cx.transform.k);
        session.record(cx.transform, cx.now, cx.config);

        GestureOutcome {
            redraw: true,
            selection,
        }
    }

    fn pointer_up(&mut self, p: &PointerInput, cx: GestureContext) -> GestureOutcome {
        let session = match std::mem::take(&mut self.state) {
            GestureState::Panning(session) if session.pointer_id == p.pointer_id => session,
            other => {
                self.state = other;
                return GestureOutcome::default();
            }
        };

        if !session.did_pan {
            let picked = pick_at(cx.markers, cx.transform, p.position(), cx.config.click_hit_slop_px);
            return GestureOutcome {
                redraw: false,
                selection: Some(SelectionIntent::Confirm(picked.map(|m| m.id.clone()))),
            };
        }

        if let Some(velocity) = session.release_velocity() {
            cx.driver.start_momentum(velocity, &cx.config.momentum, cx.now);
        }
        GestureOutcome::default()
    }

    fn hover(&mut self, point: DVec2, cx: &GestureContext) -> GestureOutcome {
        let hit = pick_at(cx.markers, cx.transform, point, cx.config.hover_hit_slop_px);
        if hit.map(|m| m.id.as_str()) == self.hovered() {
            return GestureOutcome::default();
        }

        self.state = match hit {
            Some(marker) => GestureState::Hovering(marker.id.clone()),
            None => GestureState::Idle,
        };
        GestureOutcome {
            redraw: true,
            selection: None,
        }
    }
}

/// Instant zoom around the cursor. Deltas compose multiplicatively through
/// the exponential, so bursts of small deltas equal one large one.
fn wheel(
    delta_y: f64,
    delta_mode: WheelDeltaMode,
    origin: DVec2,
    cx: GestureContext,
) -> Result<GestureOutcome, ViewportError> {
    cx.driver.cancel();

    let delta = match delta_mode {
        WheelDeltaMode::Pixel => delta_y,
        WheelDeltaMode::Line => delta_y * cx.config.wheel_line_height_px,
    };
    let scale_by = (-delta * cx.config.wheel_sensitivity).exp();

    let current = *cx.transform;
    if let Cow::Owned(next) = zoom_at_point(&current, current.k * scale_by, origin, cx.config.scale)? {
        *cx.transform = next;
    }

    Ok(GestureOutcome {
        redraw: true,
        selection: Some(SelectionIntent::Clear),
    })
}
