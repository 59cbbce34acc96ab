use glam::DVec2;
use std::f64::consts::PI;

/// Maps (lon, lat) in degrees to projection space. `None` means the point has
/// no image under the projection.
pub trait Projector {
    fn project(&self, lon: f64, lat: f64) -> Option<DVec2>;
}

impl<F> Projector for F
where
    F: Fn(f64, f64) -> Option<DVec2>,
{
    fn project(&self, lon: f64, lat: f64) -> Option<DVec2> {
        self(lon, lat)
    }
}

/// Mercator projection scaled and translated so a set of coordinates fills a
/// viewport, with y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedMercator {
    scale: f64,
    translate: DVec2,
}

impl FittedMercator {
    /// Fit the bounding box of `coords` into `size`, centred, preserving
    /// aspect ratio. Returns `None` when there is nothing finite to fit or the
    /// size is empty.
    pub fn fit_size<I>(coords: I, size: (f64, f64)) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (width, height) = size;
        if width <= 0.0 || height <= 0.0 {
            return None;
        }

        let mut min = DVec2::splat(f64::INFINITY);
        let mut max = DVec2::splat(f64::NEG_INFINITY);
        for (lon, lat) in coords {
            if let Some(p) = raw_mercator(lon, lat) {
                min = min.min(p);
                max = max.max(p);
            }
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }

        let extent = max - min;
        let scale = match (extent.x > 0.0, extent.y > 0.0) {
            (true, true) => (width / extent.x).min(height / extent.y),
            (true, false) => width / extent.x,
            (false, true) => height / extent.y,
            // Single point: any scale works, pick one degree per pixel.
            (false, false) => 180.0 / PI,
        };

        let center = (min + max) * 0.5;
        let translate = DVec2::new(width / 2.0, height / 2.0) - center * scale;
        Some(Self { scale, translate })
    }
}

impl Projector for FittedMercator {
    fn project(&self, lon: f64, lat: f64) -> Option<DVec2> {
        raw_mercator(lon, lat).map(|p| p * self.scale + self.translate)
    }
}

/// Unit-sphere Mercator with y flipped for screen orientation.
#[inline(always)]
fn raw_mercator(lon: f64, lat: f64) -> Option<DVec2> {
    if !lon.is_finite() || !lat.is_finite() || lat.abs() >= 90.0 {
        return None;
    }
    let x = lon.to_radians();
    let lat_rad = lat.to_radians();
    let y = -(lat_rad.tan() + 1.0 / lat_rad.cos()).ln();
    Some(DVec2::new(x, y))
}
