use crate::map::projection::Projector;
use glam::DVec2;

pub type MarkerId = String;

/// Draw/priority class of a marker. Later variants draw on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarkerGroup {
    Other,
    WeathernewsTop10,
    Sakura100,
}

impl MarkerGroup {
    /// Lowest priority first.
    pub const DRAW_ORDER: [MarkerGroup; 3] = [
        MarkerGroup::Other,
        MarkerGroup::WeathernewsTop10,
        MarkerGroup::Sakura100,
    ];
}

/// A point of interest as handed to the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub id: MarkerId,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    /// Screen-space radius, unaffected by zoom.
    pub screen_radius: f64,
    pub group: MarkerGroup,
}

/// A point of interest in projection space. Independent of the view
/// transform; rebuilt only when the point set or viewport size changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedMarker {
    pub id: MarkerId,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub group: MarkerGroup,
}

impl ProjectedMarker {
    #[inline(always)]
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Project every point once. Points the projector rejects, or that land on a
/// non-finite coordinate, are dropped so one bad record can't poison a frame.
pub fn project_markers<P>(points: &[PointOfInterest], projector: &P) -> Vec<ProjectedMarker>
where
    P: Projector + ?Sized,
{
    let markers: Vec<ProjectedMarker> = points
        .iter()
        .filter_map(|poi| {
            let p = projector.project(poi.lon, poi.lat)?;
            if !p.is_finite() || !poi.screen_radius.is_finite() {
                return None;
            }
            Some(ProjectedMarker {
                id: poi.id.clone(),
                x: p.x,
                y: p.y,
                r: poi.screen_radius,
                group: poi.group,
            })
        })
        .collect();

    let dropped = points.len() - markers.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} point(s) with no finite projection");
    }
    markers
}
