use serde::Deserialize;

// ─── Unit ratios (nanoseconds per unit) ──────────────────────────

const NANOS: i64 = 1;
const MICROS: i64 = 1_000;
const MILLIS: i64 = 1_000_000;
const SECONDS: i64 = 1_000_000_000;
const MINUTES: i64 = 60 * SECONDS;
const HOURS: i64 = 60 * MINUTES;
const DAYS: i64 = 24 * HOURS;

/// Granularity of the `(value, unit)` pairs accepted by reservoirs and
/// returned by snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// How many nanoseconds one unit of this granularity spans.
    pub const fn nanos_per_unit(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => NANOS,
            TimeUnit::Microseconds => MICROS,
            TimeUnit::Milliseconds => MILLIS,
            TimeUnit::Seconds => SECONDS,
            TimeUnit::Minutes => MINUTES,
            TimeUnit::Hours => HOURS,
            TimeUnit::Days => DAYS,
        }
    }

    /// Saturating conversion of `duration` (in this unit) to nanoseconds.
    pub fn to_nanos(self, duration: i64) -> i64 {
        duration.saturating_mul(self.nanos_per_unit())
    }

    /// Converts `duration`, expressed in `source`, into this unit.
    ///
    /// Coarse to fine saturates, fine to coarse truncates toward zero.
    pub fn convert(self, duration: i64, source: TimeUnit) -> i64 {
        let from = source.nanos_per_unit();
        let to = self.nanos_per_unit();
        if from >= to {
            duration.saturating_mul(from / to)
        } else {
            duration / (to / from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_coarse_to_fine() {
        assert_eq!(TimeUnit::Milliseconds.convert(2, TimeUnit::Seconds), 2_000);
        assert_eq!(TimeUnit::Nanoseconds.convert(1, TimeUnit::Days), DAYS);
    }

    #[test]
    fn converts_fine_to_coarse_truncating() {
        assert_eq!(TimeUnit::Seconds.convert(1_999, TimeUnit::Milliseconds), 1);
        assert_eq!(TimeUnit::Seconds.convert(-1_999, TimeUnit::Milliseconds), -1);
        assert_eq!(TimeUnit::Minutes.convert(59, TimeUnit::Seconds), 0);
    }

    #[test]
    fn to_nanos_saturates() {
        assert_eq!(TimeUnit::Days.to_nanos(i64::MAX), i64::MAX);
        assert_eq!(TimeUnit::Days.to_nanos(i64::MIN), i64::MIN);
        assert_eq!(TimeUnit::Microseconds.to_nanos(7), 7_000);
    }

    #[test]
    fn deserializes_lowercase_names() {
        #[derive(Deserialize)]
        struct Holder {
            unit: TimeUnit,
        }
        let holder: Holder = toml::from_str(r#"unit = "milliseconds""#).unwrap();
        assert_eq!(holder.unit, TimeUnit::Milliseconds);
    }
}
