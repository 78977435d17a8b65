//! Exponential backoff with jitter between retry attempts.

use std::time::Duration;

use tracing::warn;

use switchboard_core::config::RouterSettings;

/// `delay(a) = min(2^a + U[0,1), max_units)` time-units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Length of one time-unit.
    pub unit: Duration,
    /// Cap, in time-units.
    pub max_units: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_units: 10.0,
        }
    }
}

impl From<&RouterSettings> for BackoffPolicy {
    fn from(settings: &RouterSettings) -> Self {
        let default = Self::default();
        let cap = settings.max_backoff_units;
        let max_units = if cap.is_finite() && cap >= 0.0 {
            cap
        } else {
            warn!(
                "ignoring invalid router.maxBackoffUnits={}, using {}",
                cap, default.max_units
            );
            default.max_units
        };
        Self {
            unit: Duration::from_millis(settings.backoff_unit_ms),
            max_units,
        }
    }
}

impl BackoffPolicy {
    /// Delay before the attempt following zero-based `attempt`, in units.
    pub fn delay_units(&self, attempt: u32) -> f64 {
        self.delay_units_with_jitter(attempt, rand::random::<f64>())
    }

    /// Delay before the attempt following zero-based `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let secs = self.unit.as_secs_f64() * self.delay_units(attempt);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Never negative, whatever the cap.
    fn delay_units_with_jitter(&self, attempt: u32, jitter: f64) -> f64 {
        let exp = attempt.min(63) as i32;
        (2f64.powi(exp) + jitter).min(self.max_units).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_jitter_band() {
        let policy = BackoffPolicy::default();
        for attempt in 0..4u32 {
            let base = 2f64.powi(attempt as i32);
            for _ in 0..200 {
                let d = policy.delay_units(attempt);
                assert!(d >= base && d <= base + 1.0, "attempt {attempt}: {d}");
                assert!(d <= 10.0);
            }
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_units_with_jitter(3, 0.5), 8.5);
        assert_eq!(policy.delay_units_with_jitter(4, 0.0), 10.0);
        assert_eq!(policy.delay_units_with_jitter(u32::MAX, 0.5), 10.0);
    }

    #[test]
    fn test_unit_scales_duration() {
        let policy = BackoffPolicy {
            unit: Duration::from_millis(10),
            max_units: 10.0,
        };
        let d = policy.delay(0);
        assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
    }

    #[test]
    fn test_negative_cap_from_config_falls_back() {
        let settings: RouterSettings =
            serde_json::from_str(r#"{"maxBackoffUnits": -1, "backoffUnitMs": 1}"#).unwrap();
        let policy = BackoffPolicy::from(&settings);
        assert_eq!(policy.max_units, 10.0);
        assert!(policy.delay(0) <= Duration::from_millis(2));
    }

    #[test]
    fn test_delay_never_negative() {
        let policy = BackoffPolicy {
            unit: Duration::from_millis(10),
            max_units: -5.0,
        };
        assert_eq!(policy.delay_units_with_jitter(2, 0.5), 0.0);
        assert_eq!(policy.delay(0), Duration::ZERO);
    }

    #[test]
    fn test_zero_cap_means_no_wait() {
        let settings: RouterSettings = serde_json::from_str(r#"{"maxBackoffUnits": 0}"#).unwrap();
        assert_eq!(BackoffPolicy::from(&settings).delay(3), Duration::ZERO);
    }

    #[test]
    fn test_from_settings() {
        let policy = BackoffPolicy::from(&RouterSettings::default());
        assert_eq!(policy, BackoffPolicy::default());
    }
}
