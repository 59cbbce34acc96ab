use crate::map::markers::ProjectedMarker;
use crate::map::transform::ViewTransform;
use glam::DVec2;

/// Nearest marker whose screen-space disc (radius `r + hit_slop`) contains
/// `point`.
///
/// Radius and slop are screen pixels and are not multiplied by `transform.k`,
/// so a marker stays equally easy to hit at every zoom level. Ties go to the
/// first marker in slice order.
pub fn pick_at<'a>(
    markers: &'a [ProjectedMarker],
    transform: &ViewTransform,
    point: DVec2,
    hit_slop: f64,
) -> Option<&'a ProjectedMarker> {
    let mut best: Option<&ProjectedMarker> = None;
    let mut best_dist2 = f64::INFINITY;

    for marker in markers {
        let screen = transform.apply(marker.position());
        let dist2 = point.distance_squared(screen);
        let reach = marker.r + hit_slop;

        // NaN distances fail both comparisons and are skipped
        if dist2 <= reach * reach && dist2 < best_dist2 {
            best = Some(marker);
            best_dist2 = dist2;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::markers::MarkerGroup;

    fn marker(id: &str, x: f64, y: f64, r: f64) -> ProjectedMarker {
        ProjectedMarker {
            id: id.to_string(),
            x,
            y,
            r,
            group: MarkerGroup::Other,
        }
    }

    #[test]
    fn test_empty_markers() {
        let hit = pick_at(&[], &ViewTransform::IDENTITY, DVec2::new(10.0, 10.0), 2.0);
        assert!(hit.is_none());
    }

    #[test]
    fn test_picks_in_screen_space() {
        let markers = [marker("a", 10.0, 10.0, 4.0)];
        let t = ViewTransform::new(5.0, -3.0, 2.0);

        let hit = pick_at(&markers, &t, DVec2::new(10.0 * 2.0 + 5.0, 10.0 * 2.0 - 3.0), 2.0);
        assert_eq!(hit.map(|m| m.id.as_str()), Some("a"));
    }

    #[test]
    fn test_hit_radius_ignores_zoom() {
        let markers = [marker("a", 0.0, 0.0, 4.0)];
        let t = ViewTransform::new(0.0, 0.0, 4.0);

        assert!(pick_at(&markers, &t, DVec2::new(10.0, 0.0), 0.0).is_none());
        assert!(pick_at(&markers, &t, DVec2::new(4.0, 0.0), 0.0).is_some());
    }

    #[test]
    fn test_closest_wins() {
        let markers = [marker("a", 0.0, 0.0, 10.0), marker("b", 5.0, 0.0, 10.0)];

        let hit = pick_at(&markers, &ViewTransform::IDENTITY, DVec2::new(4.0, 0.0), 2.0);
        assert_eq!(hit.map(|m| m.id.as_str()), Some("b"));
    }

    #[test]
    fn test_slop_extends_reach() {
        let markers = [marker("a", 0.0, 0.0, 4.0)];
        let point = DVec2::new(9.0, 0.0);

        assert!(pick_at(&markers, &ViewTransform::IDENTITY, point, 4.0).is_none());
        assert!(pick_at(&markers, &ViewTransform::IDENTITY, point, 6.0).is_some());
    }
}
