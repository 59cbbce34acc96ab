use crate::config::{ViewportConfig, TWEEN_DEFAULT_MS};
use crate::events::{ViewControl, ViewportEvent};
use crate::map::animation::{AnimationDriver, FrameClock, TickStatus};
use crate::map::gesture::{GestureContext, GestureController, GestureOutcome, SelectionIntent};
use crate::map::markers::{project_markers, MarkerId, PointOfInterest, ProjectedMarker};
use crate::map::projection::Projector;
use crate::map::renderer::{Basemap, DrawSurface, Renderer, Scene};
use crate::map::transform::{center_at_point, ViewTransform, ViewportError};

type SelectionCallback = Box<dyn FnMut(Option<&str>)>;

/// The interactive map component: owns the view transform, the projected
/// markers, the gesture state machine, the transform driver and the renderer.
///
/// Event handlers only mutate state and raise a redraw flag; `on_frame`
/// advances the driver and draws at most once, so any number of events
/// between two frames coalesce into a single redraw.
pub struct Viewport<S, C> {
    config: ViewportConfig,
    clock: C,
    size: (f64, f64),
    transform: ViewTransform,
    points: Vec<PointOfInterest>,
    markers: Vec<ProjectedMarker>,
    basemap: Basemap,
    projector: Option<Box<dyn Projector>>,
    gesture: GestureController,
    driver: AnimationDriver,
    selected: Option<MarkerId>,
    redraw_pending: bool,
    on_selection_change: Option<SelectionCallback>,
    renderer: Renderer<S>,
}

impl<S: DrawSurface, C: FrameClock> Viewport<S, C> {
    pub fn new(surface: S, clock: C, config: ViewportConfig) -> Self {
        let renderer = Renderer::new(surface, &config);
        Self {
            config,
            clock,
            size: (0.0, 0.0),
            transform: ViewTransform::IDENTITY,
            points: Vec::new(),
            markers: Vec::new(),
            basemap: Basemap::default(),
            projector: None,
            gesture: GestureController::new(),
            driver: AnimationDriver::new(),
            selected: None,
            redraw_pending: true,
            on_selection_change: None,
            renderer,
        }
    }

    /// Called with the new selection on every confirmed click and on every
    /// deselect caused by dragging, wheel zoom or the view controls. Never
    /// called for hover.
    pub fn on_selection_change<F>(&mut self, callback: F)
    where
        F: FnMut(Option<&str>) + 'static,
    {
        self.on_selection_change = Some(Box::new(callback));
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn markers(&self) -> &[ProjectedMarker] {
        &self.markers
    }

    pub fn points(&self) -> &[PointOfInterest] {
        &self.points
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.gesture.hovered()
    }

    pub fn is_animating(&self) -> bool {
        self.driver.is_active()
    }

    pub fn surface(&self) -> &S {
        self.renderer.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.renderer.surface_mut()
    }

    /// Whether the host should call `on_frame` on its next tick.
    pub fn wants_frame(&self) -> bool {
        self.redraw_pending || self.driver.is_active()
    }

    pub fn request_redraw(&mut self) {
        self.redraw_pending = true;
    }

    /// Replace the projector. `None` renders empty frames until one is set.
    pub fn set_projector(&mut self, projector: Option<Box<dyn Projector>>) {
        self.projector = projector;
        self.reproject_markers();
        self.reproject_basemap();
    }

    /// Resize and swap in a projector fitted to the new size, projecting
    /// markers and basemap once.
    pub fn refit(&mut self, width: f64, height: f64, projector: Option<Box<dyn Projector>>) {
        self.resize(width, height);
        self.set_projector(projector);
    }

    pub fn set_points(&mut self, points: Vec<PointOfInterest>) {
        self.points = points;
        self.reproject_markers();
        if self.gesture.clear_hover() {
            log::debug!("hover cleared by new point set");
        }
    }

    pub fn set_basemap(&mut self, basemap: Basemap) {
        self.basemap = basemap;
        self.reproject_basemap();
    }

    /// Set the selection from outside (e.g. restoring a pinned point). Does
    /// not invoke the selection callback.
    pub fn set_selected(&mut self, id: Option<MarkerId>) {
        if self.selected != id {
            self.selected = id;
            self.redraw_pending = true;
        }
    }

    /// Jump, without animation, so `id` sits in the middle of the viewport at
    /// `scale`. Returns `false` when the marker isn't currently projected.
    pub fn center_on(&mut self, id: &str, scale: f64) -> Result<bool, ViewportError> {
        let Some(marker) = self.markers.iter().find(|m| m.id == id) else {
            return Ok(false);
        };
        let scale = self.config.scale.clamp(scale);
        self.driver.cancel();
        self.transform = center_at_point(marker.position(), scale, self.size)?;
        self.redraw_pending = true;
        Ok(true)
    }

    /// Like `center_on`, but eases there over the default tween duration.
    pub fn fly_to(&mut self, id: &str, scale: f64) -> Result<bool, ViewportError> {
        let Some(marker) = self.markers.iter().find(|m| m.id == id) else {
            return Ok(false);
        };
        let scale = self.config.scale.clamp(scale);
        let target = center_at_point(marker.position(), scale, self.size)?;
        let now = self.clock.now_ms();
        self.driver.start_tween(self.transform, target, TWEEN_DEFAULT_MS, now);
        Ok(true)
    }

    pub fn handle_event(&mut self, event: ViewportEvent) -> Result<(), ViewportError> {
        if let ViewportEvent::Resize { width, height } = event {
            self.resize(width, height);
            return Ok(());
        }

        let cx = GestureContext {
            transform: &mut self.transform,
            markers: &self.markers,
            driver: &mut self.driver,
            config: &self.config,
            size: self.size,
            now: self.clock.now_ms(),
        };
        let outcome = self.gesture.handle(&event, cx)?;
        self.apply(outcome);
        Ok(())
    }

    pub fn control(&mut self, control: ViewControl) -> Result<(), ViewportError> {
        let cx = GestureContext {
            transform: &mut self.transform,
            markers: &self.markers,
            driver: &mut self.driver,
            config: &self.config,
            size: self.size,
            now: self.clock.now_ms(),
        };
        let outcome = self.gesture.control(control, cx)?;
        self.apply(outcome);
        Ok(())
    }

    /// Advance the transform driver and redraw if anything changed. Returns
    /// whether a frame was drawn.
    pub fn on_frame(&mut self) -> bool {
        let now = self.clock.now_ms();
        match self.driver.tick(now, &mut self.transform) {
            TickStatus::Idle => {}
            TickStatus::Running | TickStatus::Finished => self.redraw_pending = true,
        }

        if !self.redraw_pending {
            return false;
        }
        self.redraw_pending = false;

        self.renderer.render(&Scene {
            transform: self.transform,
            size: self.size,
            markers: &self.markers,
            hovered: self.gesture.hovered(),
            selected: self.selected.as_deref(),
        });
        true
    }

    /// Markers live in projection space, so a bare resize only moves the
    /// viewport edges. Use `refit` when the projector depends on the size.
    fn resize(&mut self, width: f64, height: f64) {
        let size = (width.max(0.0), height.max(0.0));
        if size == self.size {
            return;
        }
        self.size = size;
        self.redraw_pending = true;
    }

    fn reproject_markers(&mut self) {
        self.markers = match &self.projector {
            Some(projector) => project_markers(&self.points, &**projector),
            None => Vec::new(),
        };
        self.redraw_pending = true;
    }

    fn reproject_basemap(&mut self) {
        self.renderer.set_geometry(&self.basemap, self.projector.as_deref());
        self.redraw_pending = true;
    }

    fn apply(&mut self, outcome: GestureOutcome) {
        if outcome.redraw {
            self.redraw_pending = true;
        }

        match outcome.selection {
            None => {}
            Some(SelectionIntent::Confirm(id)) => {
                self.selected = id;
                self.redraw_pending = true;
                self.notify_selection();
            }
            Some(SelectionIntent::Clear) => {
                if self.selected.take().is_some() {
                    self.redraw_pending = true;
                    self.notify_selection();
                }
            }
        }
    }

    fn notify_selection(&mut self) {
        log::debug!("selection -> {:?}", self.selected);
        if let Some(callback) = self.on_selection_change.as_mut() {
            callback(self.selected.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PointerInput, WheelDeltaMode};
    use crate::config::ScaleBounds;
    use crate::map::animation::ManualClock;
    use crate::map::markers::MarkerGroup;
    use crate::map::renderer::tests::RecordingSurface;
    use glam::DVec2;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Calls = Rc<RefCell<Vec<Option<String>>>>;

    fn poi(id: &str, lon: f64, lat: f64) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            name: id.to_string(),
            lon,
            lat,
            screen_radius: 4.0,
            group: MarkerGroup::Other,
        }
    }

    /// Viewport over an identity projection, 200x100, with two spots.
    fn viewport() -> (Viewport<RecordingSurface, ManualClock>, ManualClock, Calls) {
        let clock = ManualClock::new();
        let mut vp = Viewport::new(RecordingSurface::default(), clock.clone(), ViewportConfig::default());
        vp.handle_event(ViewportEvent::Resize {
            width: 200.0,
            height: 100.0,
        })
        .unwrap();
        vp.set_projector(Some(Box::new(|lon: f64, lat: f64| Some(DVec2::new(lon, lat)))));
        vp.set_points(vec![poi("a", 50.0, 50.0), poi("b", 150.0, 50.0)]);

        let calls: Calls = Rc::default();
        let sink = calls.clone();
        vp.on_selection_change(move |id| sink.borrow_mut().push(id.map(str::to_string)));
        vp.on_frame();
        (vp, clock, calls)
    }

    fn down(x: f64, y: f64) -> ViewportEvent {
        ViewportEvent::PointerDown(PointerInput::primary(x, y))
    }
    fn mv(x: f64, y: f64) -> ViewportEvent {
        ViewportEvent::PointerMove(PointerInput::primary(x, y))
    }
    fn up(x: f64, y: f64) -> ViewportEvent {
        ViewportEvent::PointerUp(PointerInput::primary(x, y))
    }

    fn drain(vp: &mut Viewport<RecordingSurface, ManualClock>, clock: &ManualClock) -> usize {
        let mut frames = 0;
        while vp.wants_frame() {
            clock.advance(16.0);
            vp.on_frame();
            frames += 1;
            assert!(frames < 10_000, "viewport never settled");
        }
        frames
    }

    #[test]
    fn test_click_selects_and_notifies() {
        let (mut vp, _clock, calls) = viewport();
        vp.handle_event(down(51.0, 50.0)).unwrap();
        vp.handle_event(mv(52.0, 51.0)).unwrap();
        vp.handle_event(up(52.0, 51.0)).unwrap();

        assert_eq!(vp.selected(), Some("a"));
        assert_eq!(*calls.borrow(), vec![Some("a".to_string())]);
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
    }

    #[test]
    fn test_drag_deselects_exactly_once() {
        let (mut vp, clock, calls) = viewport();
        vp.set_selected(Some("b".into()));

        vp.handle_event(down(10.0, 10.0)).unwrap();
        for step in 1..=20 {
            clock.advance(8.0);
            vp.handle_event(mv(10.0 + step as f64, 10.0)).unwrap();
        }
        vp.handle_event(up(30.0, 10.0)).unwrap();

        assert_eq!(*calls.borrow(), vec![None]);
        assert_eq!(vp.selected(), None);
    }

    #[test]
    fn test_deselect_without_selection_is_silent() {
        let (mut vp, _clock, calls) = viewport();
        vp.handle_event(ViewportEvent::Wheel {
            delta_y: -1.0,
            delta_mode: WheelDeltaMode::Line,
            x: 10.0,
            y: 10.0,
        })
        .unwrap();
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_hover_never_notifies() {
        let (mut vp, _clock, calls) = viewport();
        vp.handle_event(mv(50.0, 50.0)).unwrap();
        assert_eq!(vp.hovered(), Some("a"));
        vp.handle_event(mv(150.0, 50.0)).unwrap();
        assert_eq!(vp.hovered(), Some("b"));
        assert!(calls.borrow().is_empty());
        assert_eq!(vp.selected(), None);
    }

    #[test]
    fn test_moves_coalesce_into_one_redraw() {
        let (mut vp, clock, _calls) = viewport();
        let before = vp.surface().clears();

        vp.handle_event(down(10.0, 10.0)).unwrap();
        for step in 1..=12 {
            vp.handle_event(mv(10.0 + step as f64 * 3.0, 10.0)).unwrap();
        }
        assert_eq!(vp.surface().clears(), before);

        clock.advance(16.0);
        assert!(vp.on_frame());
        assert!(!vp.on_frame());
        assert_eq!(vp.surface().clears(), before + 1);
    }

    #[test]
    fn test_release_glides_then_settles() {
        let (mut vp, clock, _calls) = viewport();
        vp.handle_event(down(0.0, 0.0)).unwrap();
        for step in 1..=6 {
            clock.advance(10.0);
            vp.handle_event(mv(step as f64 * 10.0, 0.0)).unwrap();
        }
        vp.handle_event(up(60.0, 0.0)).unwrap();
        assert!(vp.is_animating());

        let released_at = vp.transform().x;
        let frames = drain(&mut vp, &clock);
        assert!(frames > 1);
        assert!(vp.transform().x > released_at);
        assert!(!vp.is_animating());
    }

    #[test]
    fn test_press_stops_momentum() {
        let (mut vp, clock, _calls) = viewport();
        vp.handle_event(down(0.0, 0.0)).unwrap();
        for step in 1..=6 {
            clock.advance(10.0);
            vp.handle_event(mv(step as f64 * 10.0, 0.0)).unwrap();
        }
        vp.handle_event(up(60.0, 0.0)).unwrap();
        clock.advance(16.0);
        vp.on_frame();

        vp.handle_event(down(100.0, 50.0)).unwrap();
        assert!(!vp.is_animating());
        let frozen = vp.transform();
        clock.advance(16.0);
        vp.on_frame();
        assert_eq!(vp.transform(), frozen);
    }

    #[test]
    fn test_zoom_control_tweens_and_deselects() {
        let (mut vp, clock, calls) = viewport();
        vp.set_selected(Some("a".into()));

        vp.control(ViewControl::ZoomIn).unwrap();
        assert_eq!(*calls.borrow(), vec![None]);
        assert_eq!(vp.transform().k, 1.0);

        drain(&mut vp, &clock);
        assert_eq!(vp.transform().k, 1.25);

        vp.control(ViewControl::Reset).unwrap();
        drain(&mut vp, &clock);
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
        // Nothing selected the second time round
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_wheel_cancels_tween() {
        let (mut vp, clock, _calls) = viewport();
        vp.control(ViewControl::ZoomIn).unwrap();
        clock.advance(16.0);
        vp.on_frame();

        vp.handle_event(ViewportEvent::Wheel {
            delta_y: -1.0,
            delta_mode: WheelDeltaMode::Line,
            x: 10.0,
            y: 10.0,
        })
        .unwrap();
        assert!(!vp.is_animating());
    }

    #[test]
    fn test_no_projector_renders_empty_frame() {
        let clock = ManualClock::new();
        let mut vp = Viewport::new(RecordingSurface::default(), clock, ViewportConfig::default());
        vp.handle_event(ViewportEvent::Resize {
            width: 200.0,
            height: 100.0,
        })
        .unwrap();
        vp.set_points(vec![poi("a", 50.0, 50.0)]);

        assert!(vp.markers().is_empty());
        assert!(vp.on_frame());
        assert_eq!(vp.surface().after_last_clear().len(), 0);

        // Clicks on nothing still report a (empty) selection
        vp.handle_event(down(50.0, 50.0)).unwrap();
        vp.handle_event(up(50.0, 50.0)).unwrap();
        assert_eq!(vp.selected(), None);
    }

    #[test]
    fn test_center_on_marker() {
        let (mut vp, _clock, _calls) = viewport();
        assert!(vp.center_on("b", 4.0).unwrap());
        let screen = vp.transform().apply(DVec2::new(150.0, 50.0));
        assert_eq!(screen, DVec2::new(100.0, 50.0));
        assert!(!vp.center_on("missing", 4.0).unwrap());
    }

    #[test]
    fn test_fly_to_eases_into_place() {
        let (mut vp, clock, _calls) = viewport();
        assert!(vp.fly_to("a", 2.0).unwrap());
        assert_eq!(vp.transform(), ViewTransform::IDENTITY);
        assert!(vp.is_animating());

        drain(&mut vp, &clock);
        let screen = vp.transform().apply(DVec2::new(50.0, 50.0));
        assert_eq!(screen, DVec2::new(100.0, 50.0));
        assert_eq!(vp.transform().k, 2.0);
    }

    #[test]
    fn test_new_points_clear_hover() {
        let (mut vp, _clock, _calls) = viewport();
        vp.handle_event(mv(50.0, 50.0)).unwrap();
        assert!(vp.hovered().is_some());
        vp.set_points(vec![poi("c", 10.0, 10.0)]);
        assert!(vp.hovered().is_none());
    }

    #[test]
    fn test_center_on_with_inverted_bounds() {
        let clock = ManualClock::new();
        let mut config = ViewportConfig::default();
        config.scale = ScaleBounds { min: 8.0, max: 2.0 };
        let mut vp = Viewport::new(RecordingSurface::default(), clock.clone(), config);
        vp.refit(200.0, 100.0, Some(Box::new(|lon: f64, lat: f64| Some(DVec2::new(lon, lat)))));
        vp.set_points(vec![poi("a", 50.0, 50.0)]);

        assert!(vp.center_on("a", 4.0).unwrap());
        assert_eq!(vp.transform().k, 2.0);
        assert!(vp.fly_to("a", 16.0).unwrap());
        drain(&mut vp, &clock);
        assert_eq!(vp.transform().k, 2.0);
    }

    #[test]
    fn test_refit_projects_once() {
        let (mut vp, _clock, _calls) = viewport();
        let projected = Rc::new(Cell::new(0));
        let counter = projected.clone();
        vp.refit(
            100.0,
            50.0,
            Some(Box::new(move |lon: f64, lat: f64| {
                counter.set(counter.get() + 1);
                Some(DVec2::new(lon / 2.0, lat / 2.0))
            })),
        );
        assert_eq!(projected.get(), vp.points().len());
        assert_eq!(vp.size(), (100.0, 50.0));
        assert_eq!(vp.markers()[1].position(), DVec2::new(75.0, 25.0));

        vp.handle_event(ViewportEvent::Resize {
            width: 300.0,
            height: 150.0,
        })
        .unwrap();
        assert_eq!(projected.get(), vp.points().len());
        assert_eq!(vp.size(), (300.0, 150.0));
        assert!(vp.wants_frame());
    }
}
