use crate::ui;
use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEventKind, MouseEvent};
use ratatui::layout::Rect;
use sakura_map::braille::BrailleSurface;
use sakura_map::config::ViewportConfig;
use sakura_map::data::{filter_spots, Spot, SpotFilters, SpotsData};
use sakura_map::events::{decode_mouse, pixel_size, ViewControl};
use sakura_map::map::{Basemap, FittedMercator, MarkerId, Projector, SystemClock, Viewport};
use std::cell::RefCell;
use std::rc::Rc;

/// Zoom used when opening on, or flying to, a single spot.
const FOCUS_SCALE: f64 = 4.0;

/// Application state
pub struct App {
    pub viewport: Viewport<BrailleSurface, SystemClock>,
    pub data: SpotsData,
    pub basemap: Basemap,
    pub filters: SpotFilters,
    pub should_quit: bool,
    map_area: Rect,
    /// Last selection reported by the viewport.
    reported: Rc<RefCell<Option<MarkerId>>>,
}

impl App {
    pub fn new(map_area: Rect, data: SpotsData, basemap: Basemap, config: ViewportConfig) -> Self {
        let surface = BrailleSurface::new(map_area.width as usize, map_area.height as usize);
        let mut viewport = Viewport::new(surface, SystemClock::new(), config);

        let reported: Rc<RefCell<Option<MarkerId>>> = Rc::default();
        let sink = reported.clone();
        viewport.on_selection_change(move |id| {
            log::info!("selection changed: {}", id.unwrap_or("none"));
            *sink.borrow_mut() = id.map(str::to_string);
        });
        viewport.set_basemap(basemap.clone());

        let mut app = Self {
            viewport,
            data,
            basemap,
            filters: SpotFilters::default(),
            should_quit: false,
            map_area: Rect::default(),
            reported,
        };
        app.apply_filters();
        app.resize(map_area);
        app
    }

    /// Resize the drawing surface and refit the projection to the new area.
    pub fn resize(&mut self, map_area: Rect) {
        if map_area == self.map_area {
            return;
        }
        self.map_area = map_area;
        self.viewport
            .surface_mut()
            .resize(map_area.width as usize, map_area.height as usize);

        let (width, height) = pixel_size(map_area);
        let projector = FittedMercator::fit_size(self.basemap.coordinates(), (width, height));
        if projector.is_none() {
            log::warn!("no projectable basemap at {width}x{height}; drawing empty frames");
        }
        self.viewport
            .refit(width, height, projector.map(|p| Box::new(p) as Box<dyn Projector>));
    }

    /// Dispatch one terminal event. Returns whether the status bar or
    /// frame needs repainting regardless of the viewport.
    pub fn handle_terminal_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.quit(),
                KeyCode::Char('+') | KeyCode::Char('=') => self.control(ViewControl::ZoomIn)?,
                KeyCode::Char('-') | KeyCode::Char('_') => self.control(ViewControl::ZoomOut)?,
                KeyCode::Char('0') | KeyCode::Char('r') => self.control(ViewControl::Reset)?,
                KeyCode::Enter => self.focus_selected()?,
                KeyCode::Char('f') => {
                    self.cycle_collection_filter();
                    return Ok(true);
                }
                KeyCode::Char('p') => {
                    self.cycle_prefecture_filter();
                    return Ok(true);
                }
                _ => {}
            },
            Event::Mouse(mouse) => self.handle_mouse(mouse)?,
            Event::Resize(width, height) => {
                self.resize(ui::map_area(Rect::new(0, 0, width, height)));
                return Ok(true);
            }
            _ => {}
        }
        Ok(false)
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if let Some(event) = decode_mouse(mouse, self.map_area) {
            self.viewport.handle_event(event)?;
        }
        Ok(())
    }

    pub fn control(&mut self, control: ViewControl) -> Result<()> {
        self.viewport.control(control)?;
        Ok(())
    }

    /// Open on a pinned spot: centred, zoomed in and selected.
    pub fn pin(&mut self, id: &str) -> Result<()> {
        if !self.viewport.center_on(id, FOCUS_SCALE)? {
            log::warn!("pinned spot {id} is not on the map");
            return Ok(());
        }
        self.viewport.set_selected(Some(id.to_string()));
        *self.reported.borrow_mut() = Some(id.to_string());
        Ok(())
    }

    /// Ease towards the selected spot.
    pub fn focus_selected(&mut self) -> Result<()> {
        if let Some(id) = self.viewport.selected().map(str::to_string) {
            self.viewport.fly_to(&id, FOCUS_SCALE)?;
        }
        Ok(())
    }

    pub fn cycle_collection_filter(&mut self) {
        self.filters.cycle_collection();
        self.apply_filters();
    }

    pub fn cycle_prefecture_filter(&mut self) {
        self.filters.cycle_prefecture(&self.data.prefectures);
        self.apply_filters();
    }

    fn apply_filters(&mut self) {
        let points = filter_spots(&self.data.spots, &self.filters)
            .into_iter()
            .map(Spot::to_point)
            .collect();
        self.viewport.set_points(points);
        self.viewport.set_selected(None);
        *self.reported.borrow_mut() = None;
        log::debug!("filters {:?}: {} spots", self.filters, self.viewport.points().len());
    }

    /// Advance animations and redraw the map layers if needed. Returns
    /// whether the screen needs repainting.
    pub fn tick(&mut self) -> bool {
        self.viewport.on_frame()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn prefecture_filter_name(&self) -> Option<&str> {
        let id = self.filters.prefecture_id?;
        self.data.prefecture(id).map(|p| p.name_ja.as_str())
    }

    pub fn hovered_name(&self) -> Option<&str> {
        let id = self.viewport.hovered()?;
        self.data.spot(id).map(|s| s.name_ja.as_str())
    }

    /// One-line summary of the selected spot.
    pub fn selection_detail(&self) -> Option<String> {
        let reported = self.reported.borrow();
        let spot = self.data.spot(reported.as_deref()?)?;

        let mut detail = format!("{} ({})", spot.name_ja, spot.prefecture.name_ja);
        if let Some(trees) = spot.trees {
            detail.push_str(&format!(" {trees}本"));
        }
        if !spot.collections.is_empty() {
            let names: Vec<String> = spot.collections.iter().map(|c| c.to_string()).collect();
            detail.push_str(&format!(" [{}]", names.join(", ")));
        }
        Some(detail)
    }
}
