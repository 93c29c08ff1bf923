use std::collections::BTreeMap;
use std::sync::Weak;

use super::constants::Tick;
use super::time_reservoir::TimeReservoir;

/// Eviction policy of a sliding window reservoir.
///
/// The reservoir owns the measurements and decides when to trim; the trimmer
/// only decides what leaves the map.
pub trait SlidingWindowTrimmer<V>: Send + Sync {
    /// Removes every entry with a key strictly below `key`.
    fn trim(&self, measurements: &mut BTreeMap<Tick, V>, key: Tick);

    /// Binds the trimmer to the reservoir it evicts for. Called once, right
    /// after the reservoir is built.
    fn set_time_reservoir(&self, reservoir: Weak<dyn TimeReservoir<V>>);
}

/// Drops the trimmed entries and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSlidingWindowTrimmer;

impl<V> SlidingWindowTrimmer<V> for DefaultSlidingWindowTrimmer {
    fn trim(&self, measurements: &mut BTreeMap<Tick, V>, key: Tick) {
        let retained = measurements.split_off(&key);
        *measurements = retained;
    }

    fn set_time_reservoir(&self, _reservoir: Weak<dyn TimeReservoir<V>>) {}
}
