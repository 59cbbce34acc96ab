//! Hand-tuned interaction constants and the config struct built from them.
//!
//! All distances are screen pixels (Braille dots in the terminal host) and all
//! times are milliseconds. Speeds are pixels per millisecond.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;

/// Manhattan distance a press must travel before it becomes a pan.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Release speeds below this are treated as jitter and start no momentum.
pub const MOMENTUM_MIN_START_SPEED: f64 = 0.06;
/// Release speeds above this are clamped before the first momentum tick.
pub const MOMENTUM_MAX_START_SPEED: f64 = 4.0;
/// Momentum stops once speed decays below this.
pub const MOMENTUM_MIN_STOP_SPEED: f64 = 0.01;
/// Exponential decay constant per millisecond (half-life of 320ms).
pub const MOMENTUM_FRICTION_PER_MS: f64 = std::f64::consts::LN_2 / 320.0;
/// Upper bound on a single momentum step, so a stalled frame can't fling the map.
pub const MOMENTUM_MAX_DT_MS: f64 = 64.0;

/// Pan samples older than this (relative to the newest) are dropped.
pub const PAN_SAMPLE_WINDOW_MS: f64 = 120.0;
pub const PAN_SAMPLE_MAX: usize = 8;

pub const WHEEL_SENSITIVITY: f64 = 0.002;
/// Line-mode wheel deltas are converted to pixels with this factor.
pub const WHEEL_LINE_HEIGHT_PX: f64 = 16.0;

pub const ZOOM_CONTROL_FACTOR: f64 = 1.25;
pub const TWEEN_DEFAULT_MS: f64 = 180.0;
pub const TWEEN_ZOOM_MS: f64 = 200.0;
pub const TWEEN_RESET_MS: f64 = 220.0;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 16.0;

pub const HOVER_HIT_SLOP_PX: f64 = 6.0;
pub const CLICK_HIT_SLOP_PX: f64 = 4.0;
/// Hover and selection rings sit this far outside the marker edge.
pub const RING_PADDING_PX: f64 = 3.0;

pub const LABEL_CULL_MARGIN_X: f64 = 80.0;
pub const LABEL_CULL_MARGIN_Y: f64 = 40.0;

/// Scale bounds handed to `zoom_at_point`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScaleBounds {
    pub min: f64,
    pub max: f64,
}

impl ScaleBounds {
    /// Clamp `k` into the bounds. Never panics, unlike `f64::clamp`.
    #[inline]
    pub fn clamp(&self, k: f64) -> f64 {
        k.max(self.min).min(self.max)
    }
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            min: MIN_SCALE,
            max: MAX_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    pub min_start_speed: f64,
    pub max_start_speed: f64,
    pub min_stop_speed: f64,
    pub friction_per_ms: f64,
    pub max_dt_ms: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            min_start_speed: MOMENTUM_MIN_START_SPEED,
            max_start_speed: MOMENTUM_MAX_START_SPEED,
            min_stop_speed: MOMENTUM_MIN_STOP_SPEED,
            friction_per_ms: MOMENTUM_FRICTION_PER_MS,
            max_dt_ms: MOMENTUM_MAX_DT_MS,
        }
    }
}

/// Runtime-tunable view of the constants above.
///
/// Every field falls back to its constant, so a config file only needs the
/// keys it wants to change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub scale: ScaleBounds,
    pub drag_threshold_px: f64,
    pub momentum: MomentumConfig,
    pub pan_sample_window_ms: f64,
    pub pan_sample_max: usize,
    pub wheel_sensitivity: f64,
    pub wheel_line_height_px: f64,
    pub zoom_control_factor: f64,
    pub zoom_tween_ms: f64,
    pub reset_tween_ms: f64,
    pub hover_hit_slop_px: f64,
    pub click_hit_slop_px: f64,
    pub ring_padding_px: f64,
    pub label_cull_margin: (f64, f64),
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            scale: ScaleBounds::default(),
            drag_threshold_px: DRAG_THRESHOLD_PX,
            momentum: MomentumConfig::default(),
            pan_sample_window_ms: PAN_SAMPLE_WINDOW_MS,
            pan_sample_max: PAN_SAMPLE_MAX,
            wheel_sensitivity: WHEEL_SENSITIVITY,
            wheel_line_height_px: WHEEL_LINE_HEIGHT_PX,
            zoom_control_factor: ZOOM_CONTROL_FACTOR,
            zoom_tween_ms: TWEEN_ZOOM_MS,
            reset_tween_ms: TWEEN_RESET_MS,
            hover_hit_slop_px: HOVER_HIT_SLOP_PX,
            click_hit_slop_px: CLICK_HIT_SLOP_PX,
            ring_padding_px: RING_PADDING_PX,
            label_cull_margin: (LABEL_CULL_MARGIN_X, LABEL_CULL_MARGIN_Y),
        }
    }
}

impl ViewportConfig {
    /// Load overrides from a JSON file.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let mut bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_slice(&mut bytes).with_context(|| format!("loading config {}", path.display()))
    }

    /// Parse and validate overrides.
    pub fn from_json_slice(bytes: &mut [u8]) -> anyhow::Result<Self> {
        let config: Self = simd_json::serde::from_slice(bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine can't run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let ScaleBounds { min, max } = self.scale;
        if !min.is_finite() || !max.is_finite() {
            bail!("scale bounds must be finite, got [{min}, {max}]");
        }
        if min <= 0.0 {
            bail!("scale.min must be positive, got {min}");
        }
        if min > max {
            bail!("scale.min ({min}) exceeds scale.max ({max})");
        }
        if self.pan_sample_max < 2 {
            bail!("pan_sample_max must be at least 2, got {}", self.pan_sample_max);
        }
        if !(self.zoom_control_factor.is_finite() && self.zoom_control_factor > 0.0) {
            bail!("zoom_control_factor must be positive, got {}", self.zoom_control_factor);
        }
        if !(self.momentum.friction_per_ms.is_finite() && self.momentum.friction_per_ms > 0.0) {
            bail!("momentum.friction_per_ms must be positive, got {}", self.momentum.friction_per_ms);
        }
        Ok(())
    }
}
