//! Time-stepped motion of the slice level
//!
//! Two independent modifiers move the level:
//!
//! - **Glide** moves it at a constant rate while an up/down input is held
//! - **Sweep** moves it from `min` toward `max`, stopping at the far bound
//!
//! Both may be active at once; their contributions add.  Every update goes
//! through [`Bounds::clamp`], so the level never leaves the bounds.
use log::debug;

/// User-configurable range of the slice level
///
/// `min` may be larger than `max`, in which case sweeps run downward.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Starting bound of a sweep
    pub min: f64,
    /// Finishing bound of a sweep
    pub max: f64,
}

impl Bounds {
    /// Builds a new set of bounds
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Sweep direction: the sign of `max - min`, or `+1` if they're equal
    pub fn direction(&self) -> f64 {
        if self.max < self.min { -1.0 } else { 1.0 }
    }

    /// Returns the bounds as an ordered `(low, high)` pair
    pub fn ordered(&self) -> (f64, f64) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    /// Clamps a value into the bounds
    ///
    /// `NaN` is mapped to `min`.
    pub fn clamp(&self, v: f64) -> f64 {
        if v.is_nan() {
            return self.min;
        }
        let (lo, hi) = self.ordered();
        v.clamp(lo, hi)
    }

    /// Checks whether the value is within the bounds (inclusive)
    pub fn contains(&self, v: f64) -> bool {
        let (lo, hi) = self.ordered();
        (lo..=hi).contains(&v)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(-5.0, 5.0)
    }
}

/// Direction of a held-key glide
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Glide {
    /// Moving toward lower levels
    Down,
    /// Not moving
    #[default]
    Idle,
    /// Moving toward higher levels
    Up,
}

impl Glide {
    /// Returns `-1`, `0`, or `+1`
    pub fn sign(&self) -> f64 {
        match self {
            Glide::Down => -1.0,
            Glide::Idle => 0.0,
            Glide::Up => 1.0,
        }
    }
}

/// State of the glide and sweep modifiers
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Animator {
    running: bool,
    direction: f64,
    glide: Glide,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            running: false,
            direction: 1.0,
            glide: Glide::Idle,
        }
    }
}

impl Animator {
    /// Checks whether a sweep is in progress
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns the direction of the current (or most recent) sweep
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Returns the current glide direction
    pub fn glide(&self) -> Glide {
        self.glide
    }

    /// Checks whether either modifier is active
    pub fn is_moving(&self) -> bool {
        self.running || self.glide != Glide::Idle
    }

    /// Begins a sweep, returning the level at which it starts
    pub fn start_sweep(&mut self, bounds: Bounds) -> f64 {
        self.direction = bounds.direction();
        self.running = true;
        debug!(
            "sweeping from {} to {} (direction {})",
            bounds.min, bounds.max, self.direction
        );
        bounds.min
    }

    /// Stops the sweep and any glide, leaving the level untouched
    pub fn pause(&mut self) {
        self.running = false;
        self.glide = Glide::Idle;
    }

    /// Sets the glide direction (use [`Glide::Idle`] on key release)
    pub fn set_glide(&mut self, glide: Glide) {
        self.glide = glide;
    }

    /// Advances by `dt` seconds, returning the new level
    ///
    /// `speed` is in level units per second.  Negative or non-finite time
    /// steps are treated as zero.
    pub fn step(
        &mut self,
        level: f64,
        bounds: Bounds,
        speed: f64,
        dt: f64,
    ) -> f64 {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let mut z = bounds.clamp(level);

        if self.glide != Glide::Idle {
            z = bounds.clamp(z + self.glide.sign() * speed * dt);
        }

        if self.running {
            z = bounds.clamp(z + self.direction * speed * dt);
            let done = if self.direction > 0.0 {
                z >= bounds.max
            } else {
                z <= bounds.max
            };
            if done {
                debug!("sweep finished at {z}");
                self.running = false;
            }
        }
        z
    }
}
