//! Simulated time.
//!
//! Time is kept in whole milliseconds so that fixed steps never drift and a
//! seeded run is bit-for-bit reproducible.

/// Simulated time in milliseconds.
pub type Millis = u64;

/// Default step for every archetype.
pub const DEFAULT_STEP_MS: Millis = 100;

/// Interval between resource regeneration ticks.
pub const REGEN_TICK_MS: Millis = 2_000;

/// Convert seconds to milliseconds, rounding to the nearest millisecond.
///
/// Negative and non-finite inputs become zero.
#[must_use]
pub fn secs_to_ms(secs: f64) -> Millis {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as Millis
    } else {
        0
    }
}

/// Convert milliseconds to seconds.
#[must_use]
pub fn ms_to_secs(ms: Millis) -> f64 {
    ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_round_trip() {
        assert_eq!(secs_to_ms(2.6), 2600);
        assert_eq!(secs_to_ms(1.0 / 3.0), 333);
        assert!((ms_to_secs(1500) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_secs_guarded() {
        assert_eq!(secs_to_ms(-1.0), 0);
        assert_eq!(secs_to_ms(f64::NAN), 0);
    }
}
