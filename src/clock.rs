use std::time::Instant;

pub const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point on a monotonic timeline, split like a `timespec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    pub const fn from_nanos(ns: u64) -> Self {
        Self {
            secs: ns / NANOS_PER_SEC,
            nanos: (ns % NANOS_PER_SEC) as u32,
        }
    }

    pub const fn as_nanos(&self) -> u64 {
        self.secs * NANOS_PER_SEC + self.nanos as u64
    }
}

/// Nanoseconds from `start` to `end`; 0 if the clock went backwards.
pub fn elapsed_ns(start: Timestamp, end: Timestamp) -> u64 {
    end.as_nanos().saturating_sub(start.as_nanos())
}

pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock (CLOCK_MONOTONIC on Linux), unaffected by wall-clock
/// adjustments. Timestamps are relative to construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let d = self.origin.elapsed();
        Timestamp {
            secs: d.as_secs(),
            nanos: d.subsec_nanos(),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::{Clock, Timestamp};

    /// Replays a fixed list of readings, in nanoseconds.
    pub struct ScriptedClock {
        readings: RefCell<VecDeque<u64>>,
    }

    impl ScriptedClock {
        pub fn new(readings: impl IntoIterator<Item = u64>) -> Self {
            Self {
                readings: RefCell::new(readings.into_iter().collect()),
            }
        }

        pub fn remaining(&self) -> usize {
            self.readings.borrow().len()
        }
    }

    impl Clock for ScriptedClock {
        fn now(&self) -> Timestamp {
            let ns = self
                .readings
                .borrow_mut()
                .pop_front()
                .expect("clock script exhausted");
            Timestamp::from_nanos(ns)
        }
    }
}
