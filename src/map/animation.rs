use crate::config::MomentumConfig;
use crate::map::transform::ViewTransform;
use glam::DVec2;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of frame timestamps. The host calls into the viewport once per
/// frame with `now_ms()`; tests swap in `ManualClock` to step time by hand.
pub trait FrameClock {
    /// Milliseconds since an arbitrary fixed epoch.
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Deterministic clock. Clones share the same time, so a test can keep a
/// handle while the viewport owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[inline(always)]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

/// Eased interpolation between two transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    from: ViewTransform,
    to: ViewTransform,
    start_ms: f64,
    duration_ms: f64,
}

impl Tween {
    pub fn target(&self) -> ViewTransform {
        self.to
    }

    /// Returns the transform for `now` and whether the tween has completed.
    fn sample(&self, now: f64) -> (ViewTransform, bool) {
        let t = if self.duration_ms <= 0.0 {
            1.0
        } else {
            ((now - self.start_ms) / self.duration_ms).min(1.0)
        };
        if t >= 1.0 {
            return (self.to, true);
        }

        let e = ease_out_cubic(t);
        let lerp = |a: f64, b: f64| a + (b - a) * e;
        let current = ViewTransform::new(
            lerp(self.from.x, self.to.x),
            lerp(self.from.y, self.to.y),
            lerp(self.from.k, self.to.k),
        );
        (current, false)
    }
}

/// Post-release glide with exponential, frame-rate independent decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    velocity: DVec2,
    last_ms: f64,
    friction_per_ms: f64,
    min_stop_speed: f64,
    max_dt_ms: f64,
}

impl Momentum {
    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    fn step(&mut self, now: f64, transform: &mut ViewTransform) -> bool {
        let dt = (now - self.last_ms).clamp(0.0, self.max_dt_ms);
        self.last_ms = now;

        *transform = transform.translated(self.velocity * dt);
        self.velocity *= (-self.friction_per_ms * dt).exp();

        self.velocity.length() < self.min_stop_speed
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriverRun {
    Tween(Tween),
    Momentum(Momentum),
}

/// Outcome of one frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing was running; the transform is untouched.
    Idle,
    /// The transform moved and another frame is wanted.
    Running,
    /// The transform moved for the last time.
    Finished,
}

/// Owns the single in-flight transform run. Starting a run replaces, never
/// queues behind, the previous one.
#[derive(Debug, Clone, Default)]
pub struct AnimationDriver {
    run: Option<DriverRun>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.run.is_some()
    }

    pub fn current(&self) -> Option<&DriverRun> {
        self.run.as_ref()
    }

    /// Stop whatever is running. Returns whether anything was.
    pub fn cancel(&mut self) -> bool {
        let cancelled = self.run.take();
        if let Some(run) = &cancelled {
            log::debug!("cancelled {}", run_name(run));
        }
        cancelled.is_some()
    }

    pub fn start_tween(&mut self, from: ViewTransform, to: ViewTransform, duration_ms: f64, now: f64) {
        self.cancel();
        self.run = Some(DriverRun::Tween(Tween {
            from,
            to,
            start_ms: now,
            duration_ms: duration_ms.max(0.0),
        }));
    }

    /// Start a glide at `velocity` (px/ms). Speeds under the noise floor start
    /// nothing and return `false`; speeds over the ceiling are scaled down
    /// keeping direction. Any previous run is cancelled either way.
    pub fn start_momentum(&mut self, velocity: DVec2, config: &MomentumConfig, now: f64) -> bool {
        self.cancel();

        let speed = velocity.length();
        if !speed.is_finite() || speed < config.min_start_speed {
            return false;
        }

        let velocity = if speed > config.max_start_speed {
            velocity * (config.max_start_speed / speed)
        } else {
            velocity
        };

        log::debug!("momentum start at {:.3} px/ms", velocity.length());
        self.run = Some(DriverRun::Momentum(Momentum {
            velocity,
            last_ms: now,
            friction_per_ms: config.friction_per_ms,
            min_stop_speed: config.min_stop_speed,
            max_dt_ms: config.max_dt_ms,
        }));
        true
    }

    /// Advance the active run to `now`, writing the result into `transform`.
    pub fn tick(&mut self, now: f64, transform: &mut ViewTransform) -> TickStatus {
        let done = match &mut self.run {
            None => return TickStatus::Idle,
            Some(DriverRun::Tween(tween)) => {
                let (next, done) = tween.sample(now);
                *transform = next;
                done
            }
            Some(DriverRun::Momentum(momentum)) => momentum.step(now, transform),
        };

        if done {
            self.run = None;
            TickStatus::Finished
        } else {
            TickStatus::Running
        }
    }
}

fn run_name(run: &DriverRun) -> &'static str {
    match run {
        DriverRun::Tween(_) => "tween",
        DriverRun::Momentum(_) => "momentum",
    }
}
