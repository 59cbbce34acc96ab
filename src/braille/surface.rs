use crate::braille::BrailleCanvas;
use crate::map::{draw_disc, draw_polyline, draw_ring, DrawSurface, Ink, ViewTransform};
use glam::DVec2;

/// Text placed on the character grid, anchored at its centre cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub col: i32,
    pub row: i32,
    pub text: String,
    pub ink: Ink,
}

#[derive(Debug, Clone, PartialEq)]
enum SubPath {
    Line(Vec<DVec2>),
    Circle { center: DVec2, radius: f64 },
}

/// Drawing surface backed by Braille canvases: one for the basemap and one
/// per ink on the dynamic layer. One screen pixel is one Braille dot.
pub struct BrailleSurface {
    width: usize,
    height: usize,
    outlines: Vec<Vec<DVec2>>,
    basemap: BrailleCanvas,
    basemap_at: Option<ViewTransform>,
    layers: Vec<(Ink, BrailleCanvas)>,
    texts: Vec<TextItem>,
    path: Vec<SubPath>,
}

impl BrailleSurface {
    /// Surface for a `width` x `height` character area.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            outlines: Vec::new(),
            basemap: BrailleCanvas::new(width, height),
            basemap_at: None,
            layers: Vec::new(),
            texts: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.basemap.resize(width, height);
        self.basemap_at = None;
        self.layers.clear();
        self.texts.clear();
    }

    /// Size in characters.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn basemap(&self) -> &BrailleCanvas {
        &self.basemap
    }

    /// Dynamic layers in first-use order.
    pub fn layers(&self) -> impl Iterator<Item = (Ink, &BrailleCanvas)> + '_ {
        self.layers.iter().map(|(ink, canvas)| (*ink, canvas))
    }

    pub fn texts(&self) -> &[TextItem] {
        &self.texts
    }

    fn layer(&mut self, ink: Ink) -> &mut BrailleCanvas {
        let index = match self.layers.iter().position(|(i, _)| *i == ink) {
            Some(index) => index,
            None => {
                self.layers.push((ink, BrailleCanvas::new(self.width, self.height)));
                self.layers.len() - 1
            }
        };
        &mut self.layers[index].1
    }

    fn paint(&mut self, ink: Ink, filled: bool) {
        let path = std::mem::take(&mut self.path);
        let canvas = self.layer(ink);
        for sub in &path {
            match sub {
                SubPath::Line(points) => draw_polyline(canvas, points),
                SubPath::Circle { center, radius } => {
                    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
                    let r = radius.round() as i32;
                    if filled {
                        draw_disc(canvas, cx, cy, r);
                    } else {
                        draw_ring(canvas, cx, cy, r);
                    }
                }
            }
        }
        self.path = path;
    }
}

impl DrawSurface for BrailleSurface {
    fn rebuild_static(&mut self, outlines: &[Vec<DVec2>]) {
        self.outlines = outlines.to_vec();
        self.basemap_at = None;
    }

    fn position_static(&mut self, transform: ViewTransform) {
        if self.basemap_at == Some(transform) {
            return;
        }
        self.basemap.clear();
        let mut screen = Vec::new();
        for outline in &self.outlines {
            screen.clear();
            screen.extend(outline.iter().map(|&p| transform.apply(p)));
            draw_polyline(&mut self.basemap, &screen);
        }
        self.basemap_at = Some(transform);
    }

    fn clear(&mut self) {
        for (_, canvas) in &mut self.layers {
            canvas.clear();
        }
        self.texts.clear();
        self.path.clear();
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: DVec2) {
        self.path.push(SubPath::Line(vec![p]));
    }

    fn line_to(&mut self, p: DVec2) {
        match self.path.last_mut() {
            Some(SubPath::Line(points)) => points.push(p),
            _ => self.path.push(SubPath::Line(vec![p])),
        }
    }

    fn arc(&mut self, center: DVec2, radius: f64) {
        self.path.push(SubPath::Circle { center, radius });
    }

    fn fill(&mut self, ink: Ink) {
        self.paint(ink, true);
    }

    fn stroke(&mut self, ink: Ink) {
        self.paint(ink, false);
    }

    fn fill_text(&mut self, text: &str, at: DVec2, ink: Ink) {
        self.texts.push(TextItem {
            col: (at.x / 2.0).floor() as i32,
            row: (at.y / 4.0).floor() as i32,
            text: text.to_string(),
            ink,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MarkerGroup;

    #[test]
    fn test_fill_and_stroke_land_on_their_own_layers() {
        let mut surface = BrailleSurface::new(10, 5);
        surface.begin_path();
        surface.move_to(DVec2::new(12.0, 10.0));
        surface.arc(DVec2::new(10.0, 10.0), 2.0);
        surface.fill(Ink::Marker(MarkerGroup::Sakura100));
        surface.stroke(Ink::MarkerOutline);

        let inks: Vec<Ink> = surface.layers().map(|(ink, _)| ink).collect();
        assert_eq!(inks, [Ink::Marker(MarkerGroup::Sakura100), Ink::MarkerOutline]);

        let (_, disc) = surface.layers().next().unwrap();
        assert!(disc.is_set(10, 10));
        let (_, ring) = surface.layers().nth(1).unwrap();
        assert!(!ring.is_set(10, 10));
        assert!(ring.is_set(12, 10));
    }

    #[test]
    fn test_clear_wipes_dynamic_layer_only() {
        let mut surface = BrailleSurface::new(10, 5);
        surface.rebuild_static(&[vec![DVec2::new(0.0, 0.0), DVec2::new(8.0, 0.0)]]);
        surface.position_static(ViewTransform::IDENTITY);
        surface.begin_path();
        surface.arc(DVec2::new(4.0, 4.0), 1.0);
        surface.fill(Ink::HoverRing);
        surface.fill_text("Tokyo", DVec2::new(9.0, 9.0), Ink::Label);

        surface.clear();
        assert!(surface.layers().all(|(_, c)| c.lit_count() == 0));
        assert!(surface.texts().is_empty());
        assert_eq!(surface.basemap().lit_count(), 9);
    }

    #[test]
    fn test_static_layer_follows_transform() {
        let mut surface = BrailleSurface::new(10, 5);
        surface.rebuild_static(&[vec![DVec2::new(0.0, 0.0), DVec2::new(2.0, 0.0)]]);
        surface.position_static(ViewTransform::IDENTITY);
        assert!(surface.basemap().is_set(2, 0));

        surface.position_static(ViewTransform::new(4.0, 8.0, 2.0));
        assert!(!surface.basemap().is_set(2, 0));
        assert!(surface.basemap().is_set(8, 8));
        assert_eq!(surface.basemap().lit_count(), 5);
    }

    #[test]
    fn test_text_anchor_maps_to_cells() {
        let mut surface = BrailleSurface::new(10, 5);
        surface.fill_text("Kyoto", DVec2::new(9.0, 9.0), Ink::Label);
        let item = &surface.texts()[0];
        assert_eq!((item.col, item.row), (4, 2));
    }
}
