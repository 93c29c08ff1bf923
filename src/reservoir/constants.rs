//! Fixed tuning parameters shared by every sliding window reservoir.

/// Number of low-order tick bits reserved for samples that share a nanosecond.
pub const COLLISION_BUFFER_POWER: u32 = 8;

/// Samples that can be stored for one and the same nanosecond (256).
pub const COLLISION_BUFFER: i64 = 1 << COLLISION_BUFFER_POWER;

/// A trim pass runs once every this many updates.
pub const TRIM_THRESHOLD: u64 = 256;

/// Key of the measurement maps: a nanosecond with its collision slots
/// appended. Wide enough that every `i64` nanosecond has all its slots.
pub type Tick = i128;

/// First collision slot of a nanosecond timestamp.
pub(crate) fn tick_from_nanos(nanos: i64) -> Tick {
    Tick::from(nanos) << COLLISION_BUFFER_POWER
}

/// Nanosecond a tick belongs to (floor division, so negative ticks round
/// down), clamped to the `i64` range.
pub(crate) fn nanos_from_tick(tick: Tick) -> i64 {
    let nanos = tick >> COLLISION_BUFFER_POWER;
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_slots_share_a_nanosecond() {
        let tick = tick_from_nanos(42);
        assert_eq!(nanos_from_tick(tick + 17), 42);
        assert_eq!(nanos_from_tick(tick + Tick::from(COLLISION_BUFFER) - 1), 42);
        assert_eq!(nanos_from_tick(tick + Tick::from(COLLISION_BUFFER)), 43);
    }

    #[test]
    fn negative_ticks_round_down() {
        let tick = tick_from_nanos(-3);
        assert_eq!(nanos_from_tick(tick + 5), -3);
        assert_eq!(nanos_from_tick(tick - 1), -4);
    }

    #[test]
    fn extreme_nanoseconds_keep_every_slot() {
        let last = tick_from_nanos(i64::MAX) + Tick::from(COLLISION_BUFFER) - 1;
        assert_eq!(nanos_from_tick(last), i64::MAX);
        assert_eq!(nanos_from_tick(tick_from_nanos(i64::MIN)), i64::MIN);
        assert_eq!(nanos_from_tick(tick_from_nanos(i64::MIN) - 1), i64::MIN);
    }
}
