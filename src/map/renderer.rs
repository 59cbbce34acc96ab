use crate::config::ViewportConfig;
use crate::map::markers::{MarkerGroup, ProjectedMarker};
use crate::map::projection::Projector;
use crate::map::transform::ViewTransform;
use glam::DVec2;

/// What a draw call represents; the surface decides how it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ink {
    Label,
    Marker(MarkerGroup),
    MarkerOutline,
    HoverRing,
    SelectionRing,
}

/// Immediate-mode 2D target with a retained static layer underneath.
///
/// The static layer receives projection-space outlines only when they change
/// and is positioned afterwards through `position_static`, the way a vector
/// group is moved by a transform attribute. Everything else is drawn into the
/// dynamic layer, which `clear` wipes.
pub trait DrawSurface {
    fn rebuild_static(&mut self, outlines: &[Vec<DVec2>]);
    fn position_static(&mut self, transform: ViewTransform);

    fn clear(&mut self);
    fn begin_path(&mut self);
    fn move_to(&mut self, p: DVec2);
    fn line_to(&mut self, p: DVec2);
    /// Full circle as its own sub-path.
    fn arc(&mut self, center: DVec2, radius: f64);
    fn fill(&mut self, ink: Ink);
    fn stroke(&mut self, ink: Ink);
    /// Text centred on `at`.
    fn fill_text(&mut self, text: &str, at: DVec2, ink: Ink);
}

/// One polygon-bearing basemap feature in lon/lat.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasemapFeature {
    pub key: String,
    pub label: Option<String>,
    /// Every ring of every polygon, exterior and holes alike.
    pub rings: Vec<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Basemap {
    pub features: Vec<BasemapFeature>,
}

impl Basemap {
    pub fn is_empty(&self) -> bool {
        self.features.iter().all(|f| f.rings.is_empty())
    }

    pub fn coordinates(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.features
            .iter()
            .flat_map(|f| f.rings.iter())
            .flat_map(|ring| ring.iter().copied())
    }
}

/// A feature label anchored in projection space.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLabel {
    pub key: String,
    pub text: String,
    pub anchor: DVec2,
}

/// Everything the dynamic layer depends on for one frame.
pub struct Scene<'a> {
    pub transform: ViewTransform,
    pub size: (f64, f64),
    pub markers: &'a [ProjectedMarker],
    pub hovered: Option<&'a str>,
    pub selected: Option<&'a str>,
}

/// Two-layer renderer. Owns the drawing surface.
pub struct Renderer<S> {
    surface: S,
    outlines: Vec<Vec<DVec2>>,
    labels: Vec<MapLabel>,
    static_dirty: bool,
    ring_padding: f64,
    label_margin: DVec2,
}

impl<S: DrawSurface> Renderer<S> {
    pub fn new(surface: S, config: &ViewportConfig) -> Self {
        let (mx, my) = config.label_cull_margin;
        Self {
            surface,
            outlines: Vec::new(),
            labels: Vec::new(),
            static_dirty: true,
            ring_padding: config.ring_padding_px,
            label_margin: DVec2::new(mx, my),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn labels(&self) -> &[MapLabel] {
        &self.labels
    }

    /// Re-project basemap outlines and label anchors. Call only when the
    /// geometry, the projector or the viewport size changed.
    pub fn set_geometry(&mut self, basemap: &Basemap, projector: Option<&dyn Projector>) {
        self.outlines.clear();
        self.labels.clear();
        self.static_dirty = true;

        let Some(projector) = projector else {
            return;
        };

        for feature in &basemap.features {
            let mut best: Option<(f64, DVec2)> = None;

            for ring in &feature.rings {
                let projected: Vec<DVec2> = ring
                    .iter()
                    .filter_map(|&(lon, lat)| projector.project(lon, lat))
                    .filter(|p| p.is_finite())
                    .collect();
                if projected.len() < 2 {
                    continue;
                }

                if let Some((area, centroid)) = ring_centroid(&projected) {
                    if best.map_or(true, |(a, _)| area > a) {
                        best = Some((area, centroid));
                    }
                }
                self.outlines.push(projected);
            }

            let text = feature.label.as_deref().map(str::trim).unwrap_or_default();
            if text.is_empty() {
                continue;
            }
            if let Some((_, anchor)) = best {
                self.labels.push(MapLabel {
                    key: feature.key.clone(),
                    text: text.to_string(),
                    anchor,
                });
            }
        }

        log::debug!(
            "basemap rebuilt: {} outlines, {} labels",
            self.outlines.len(),
            self.labels.len()
        );
    }

    /// Draw one frame. The static layer is only re-sent when its geometry
    /// changed; otherwise it is just repositioned.
    pub fn render(&mut self, scene: &Scene) {
        if self.static_dirty {
            self.surface.rebuild_static(&self.outlines);
            self.static_dirty = false;
        }
        self.surface.position_static(scene.transform);

        self.surface.clear();
        let (width, height) = scene.size;
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let t = scene.transform;
        self.draw_labels(&t, width, height);

        for group in MarkerGroup::DRAW_ORDER {
            self.draw_group(scene.markers, group, &t, width, height);
        }

        if let Some(hovered) = scene.hovered {
            if scene.selected != Some(hovered) {
                self.draw_ring(scene.markers, hovered, &t, Ink::HoverRing);
            }
        }
        if let Some(selected) = scene.selected {
            self.draw_ring(scene.markers, selected, &t, Ink::SelectionRing);
        }
    }

    fn draw_labels(&mut self, t: &ViewTransform, width: f64, height: f64) {
        let m = self.label_margin;
        for label in &self.labels {
            let p = t.apply(label.anchor);
            if !p.is_finite() || p.x < -m.x || p.x > width + m.x || p.y < -m.y || p.y > height + m.y {
                continue;
            }
            self.surface.fill_text(&label.text, p, Ink::Label);
        }
    }

    fn draw_group(
        &mut self,
        markers: &[ProjectedMarker],
        group: MarkerGroup,
        t: &ViewTransform,
        width: f64,
        height: f64,
    ) {
        let mut issued = 0usize;
        for marker in markers.iter().filter(|m| m.group == group) {
            let c = t.apply(marker.position());
            let r = marker.r;
            if !c.is_finite() || c.x < -r || c.x > width + r || c.y < -r || c.y > height + r {
                continue;
            }
            if issued == 0 {
                self.surface.begin_path();
            }
            self.surface.move_to(DVec2::new(c.x + r, c.y));
            self.surface.arc(c, r);
            issued += 1;
        }

        if issued > 0 {
            self.surface.fill(Ink::Marker(group));
            self.surface.stroke(Ink::MarkerOutline);
        }
    }

    fn draw_ring(&mut self, markers: &[ProjectedMarker], id: &str, t: &ViewTransform, ink: Ink) {
        let Some(marker) = markers.iter().find(|m| m.id == id) else {
            return;
        };
        let c = t.apply(marker.position());
        if !c.is_finite() {
            return;
        }
        self.surface.begin_path();
        self.surface.arc(c, marker.r + self.ring_padding);
        self.surface.stroke(ink);
    }
}

/// Signed-area centroid of a closed ring. Returns absolute area with it;
/// degenerate rings fall back to the vertex mean with zero area.
fn ring_centroid(ring: &[DVec2]) -> Option<(f64, DVec2)> {
    if ring.is_empty() {
        return None;
    }

    let mut area2 = 0.0;
    let mut acc = DVec2::ZERO;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        acc += (*a + b) * cross;
    }

    if area2.abs() < f64::EPSILON {
        let mean = ring.iter().copied().sum::<DVec2>() / ring.len() as f64;
        return Some((0.0, mean));
    }
    Some(((area2 / 2.0).abs(), acc / (3.0 * area2)))
}
