//! Simulation time management

use bevy::prelude::*;
use chrono::{DateTime, Duration, Utc};

use crate::orbital::clock::{ClockTick, OrbitalClock};
use crate::visualization::config::VisualizationConfig;

/// Slowest and fastest time scale reachable from the keyboard controls.
pub const MIN_TIME_SCALE: f64 = 1.0;
pub const MAX_TIME_SCALE: f64 = 86_400.0 * 365.25;

/// Simulation time resource
#[derive(Resource)]
pub struct SimulationClock {
    /// Simulated date, for display and logging only.
    pub current_utc: DateTime<Utc>,
    /// Simulated seconds per real second; negative runs time backwards.
    pub time_scale: f64,
    pub paused: bool,
    /// Tick computed for the current frame.
    pub last_tick: ClockTick,
    /// Set once the date hit chrono's range; the orbits keep running.
    pub date_pinned: bool,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            current_utc: Utc::now(),
            time_scale: 86_400.0,
            paused: false,
            last_tick: ClockTick::IDLE,
            date_pinned: false,
        }
    }
}

impl SimulationClock {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            time_scale: config.time_scale,
            ..default()
        }
    }

    /// Scale handed to the scene: zero while paused.
    pub fn effective_scale(&self) -> f64 {
        if self.paused { 0.0 } else { self.time_scale }
    }

    /// Multiply the magnitude of the time scale, keeping its sign.
    pub fn scale_by(&mut self, factor: f64) {
        let magnitude = (self.time_scale.abs() * factor).clamp(MIN_TIME_SCALE, MAX_TIME_SCALE);
        self.time_scale = magnitude.copysign(self.time_scale);
    }

    pub fn reverse(&mut self) {
        self.time_scale = -self.time_scale;
    }

    /// Advance the simulated date by one frame and remember the tick.
    pub fn advance(&mut self, raw_delta_seconds: f64) -> ClockTick {
        let tick = OrbitalClock::tick(raw_delta_seconds, self.effective_scale());
        self.last_tick = tick;
        if !tick.advances() {
            return tick;
        }
        let signed = tick.signed_delta();
        let whole = signed.trunc() as i64;
        let nanos = ((signed - signed.trunc()) * 1_000_000_000.0) as i64;
        let next = Duration::try_seconds(whole)
            .and_then(|step| step.checked_add(&Duration::nanoseconds(nanos)))
            .and_then(|step| self.current_utc.checked_add_signed(step));
        match next {
            Some(date) => {
                self.current_utc = date;
                self.date_pinned = false;
            }
            None => {
                if !self.date_pinned {
                    warn!(
                        "Simulated date left the representable range; holding at {}",
                        self.current_utc
                    );
                }
                self.date_pinned = true;
            }
        }
        tick
    }

    /// Simulated date for status messages.
    pub fn date_label(&self) -> String {
        self.current_utc.format("%Y-%m-%d %H:%M UTC").to_string()
    }
}

/// System to advance simulation UTC by scale
pub fn advance_simulation_clock(time: Res<Time>, mut clock: ResMut<SimulationClock>) {
    clock.advance(time.delta_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_clock_default() {
        let clock = SimulationClock::default();
        assert_eq!(clock.time_scale, 86_400.0);
        assert!(!clock.paused);
        assert!(clock.current_utc.timestamp() > 0);
    }

    #[test]
    fn test_pause_zeroes_effective_scale() {
        let mut clock = SimulationClock {
            paused: true,
            ..default()
        };
        let before = clock.current_utc;
        let tick = clock.advance(1.0);
        assert!(!tick.advances());
        assert_eq!(clock.current_utc, before);
    }

    #[test]
    fn test_reverse_moves_date_backwards() {
        let mut clock = SimulationClock {
            time_scale: -3600.0,
            ..default()
        };
        let before = clock.current_utc;
        clock.advance(2.0);
        assert_eq!(before - clock.current_utc, Duration::hours(2));
    }

    #[test]
    fn test_date_overflow_holds_date_and_keeps_ticking() {
        let start = DateTime::<Utc>::MIN_UTC + Duration::seconds(10);
        let mut clock = SimulationClock {
            current_utc: start,
            time_scale: -MAX_TIME_SCALE,
            ..default()
        };
        let tick = clock.advance(0.25);
        assert!(tick.advances());
        assert_eq!(clock.current_utc, start);
        assert!(clock.date_pinned);

        // turning around leaves the edge again
        clock.reverse();
        clock.advance(0.25);
        assert!(clock.current_utc > start);
        assert!(!clock.date_pinned);
    }

    #[test]
    fn test_date_label_format() {
        let clock = SimulationClock {
            current_utc: DateTime::from_timestamp(0, 0).unwrap(),
            ..default()
        };
        assert_eq!(clock.date_label(), "1970-01-01 00:00 UTC");
    }

    #[test]
    fn test_scale_by_keeps_sign_and_clamps() {
        let mut clock = SimulationClock {
            time_scale: -10.0,
            ..default()
        };
        clock.scale_by(2.0);
        assert_eq!(clock.time_scale, -20.0);
        clock.scale_by(1e-6);
        assert_eq!(clock.time_scale, -MIN_TIME_SCALE);
        clock.reverse();
        clock.scale_by(1e12);
        assert_eq!(clock.time_scale, MAX_TIME_SCALE);
    }
}
