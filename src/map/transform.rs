use crate::config::ScaleBounds;
use glam::DVec2;
use std::borrow::Cow;

/// Errors raised by view-transform math. These mark caller bugs, not runtime
/// conditions, so the engine propagates them instead of recovering.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("invalid transform scale: {scale}")]
    InvalidTransform { scale: f64 },
}

/// Maps projection space to screen space: `screen = content * k + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    #[inline(always)]
    pub fn apply(&self, content: DVec2) -> DVec2 {
        DVec2::new(content.x * self.k + self.x, content.y * self.k + self.y)
    }

    #[inline(always)]
    pub fn invert(&self, screen: DVec2) -> DVec2 {
        DVec2::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    /// Same scale, translated by a screen-space offset.
    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.k)
    }

    fn validate(&self) -> Result<(), ViewportError> {
        if !self.k.is_finite() || self.k <= 0.0 {
            return Err(ViewportError::InvalidTransform { scale: self.k });
        }
        Ok(())
    }
}

/// Rescale `current` to `next_scale` while keeping the content under `origin`
/// pinned to `origin`.
///
/// The scale is clamped into `bounds` first. When the clamped scale equals the
/// current one the input is handed back borrowed, so callers can skip a
/// redundant redraw by matching on `Cow::Borrowed`.
pub fn zoom_at_point<'a>(
    current: &'a ViewTransform,
    next_scale: f64,
    origin: DVec2,
    bounds: ScaleBounds,
) -> Result<Cow<'a, ViewTransform>, ViewportError> {
    current.validate()?;

    let k0 = current.k;
    let k1 = bounds.clamp(next_scale);
    if k1 == k0 {
        return Ok(Cow::Borrowed(current));
    }

    let x = origin.x - ((origin.x - current.x) / k0) * k1;
    let y = origin.y - ((origin.y - current.y) / k0) * k1;
    Ok(Cow::Owned(ViewTransform::new(x, y, k1)))
}

/// Transform that places the projection-space `point` at the viewport center.
pub fn center_at_point(
    point: DVec2,
    scale: f64,
    viewport: (f64, f64),
) -> Result<ViewTransform, ViewportError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(ViewportError::InvalidTransform { scale });
    }

    let (width, height) = viewport;
    Ok(ViewTransform::new(
        width / 2.0 - point.x * scale,
        height / 2.0 - point.y * scale,
        scale,
    ))
}
