//! Frame delta to effective simulation delta

/// One frame's worth of simulated time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClockTick {
    /// Wall-clock seconds since the previous frame.
    pub raw_delta: f64,
    /// `raw_delta × |time_scale|`, never negative.
    pub effective_delta: f64,
    /// Sign of the time scale: `1.0`, `-1.0`, or `0.0` when nothing should move.
    pub direction: f64,
}

impl ClockTick {
    pub const IDLE: Self = Self {
        raw_delta: 0.0,
        effective_delta: 0.0,
        direction: 0.0,
    };

    /// Whether bodies should do any work for this tick.
    pub fn advances(&self) -> bool {
        self.direction != 0.0 && self.effective_delta > 0.0
    }

    /// Effective delta carrying the direction sign.
    pub fn signed_delta(&self) -> f64 {
        self.effective_delta * self.direction
    }
}

/// Converts a raw frame delta and a signed time scale into a [`ClockTick`].
///
/// Stateless: every body of a frame sees the same tick.
pub struct OrbitalClock;

impl OrbitalClock {
    /// Rejects non-finite or non-positive deltas and zero or non-finite scales by
    /// returning [`ClockTick::IDLE`]; callers skip the update entirely.
    pub fn tick(raw_delta_seconds: f64, time_scale: f64) -> ClockTick {
        if !raw_delta_seconds.is_finite() || raw_delta_seconds <= 0.0 {
            return ClockTick::IDLE;
        }
        if !time_scale.is_finite() || time_scale == 0.0 {
            return ClockTick::IDLE;
        }
        let effective_delta = raw_delta_seconds * time_scale.abs();
        if !effective_delta.is_finite() {
            return ClockTick::IDLE;
        }
        ClockTick {
            raw_delta: raw_delta_seconds,
            effective_delta,
            direction: time_scale.signum(),
        }
    }
}
