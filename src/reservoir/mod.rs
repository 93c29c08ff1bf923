//! Sliding time-window reservoirs: bounded in-memory stores of recent
//! measurements and the snapshots that summarise them.

pub mod aggregated;
pub mod clock;
pub mod constants;
pub mod error;
pub mod sliding_window;
pub mod snapshot;
pub mod time_reservoir;
pub mod time_unit;
pub mod trimmer;
pub mod values_snapshot;

pub use aggregated::{AggregatedSlidingWindowTimeReservoir, AggregatedValueObject, AggregatingTrimmer};
pub use clock::{ManualClock, MonotonicClock, TimeSource};
pub use constants::Tick;
pub use error::ReservoirError;
pub use sliding_window::{SlidingWindow, SlidingWindowTimeReservoir};
pub use snapshot::{SnapshotInterval, UniformTimeSimpleSnapshot, UniformTimeSnapshot};
pub use time_reservoir::TimeReservoir;
pub use time_unit::TimeUnit;
pub use trimmer::{DefaultSlidingWindowTrimmer, SlidingWindowTrimmer};
pub use values_snapshot::UniformTimeValuesSnapshot;
