/// Hardware the trusted application measures.
pub trait Peripheral {
    /// Switch state word: bit 0 is SW0, bit 1 is SW1.
    fn read_state(&self) -> u32;
    /// Free-running secure-world cycle counter (PMCCNTR on Arm).
    fn read_cycle_counter(&self) -> u32;
}

/// Placeholder used until the register read moves into a pseudo-TA with
/// MMIO access. Every read returns 0, so all reported cycle deltas are 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubPeripheral;

impl Peripheral for StubPeripheral {
    fn read_state(&self) -> u32 {
        0
    }

    fn read_cycle_counter(&self) -> u32 {
        0
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::Cell;

    use super::Peripheral;

    /// Fixed switch state and a counter that advances `step` on every read.
    #[derive(Debug)]
    pub struct ScriptedPeripheral {
        pub state: u32,
        pub counter: Cell<u32>,
        pub step: u32,
    }

    impl ScriptedPeripheral {
        pub fn new(state: u32, start: u32, step: u32) -> Self {
            Self {
                state,
                counter: Cell::new(start),
                step,
            }
        }
    }

    impl Peripheral for ScriptedPeripheral {
        fn read_state(&self) -> u32 {
            self.state
        }

        fn read_cycle_counter(&self) -> u32 {
            let now = self.counter.get();
            self.counter.set(now.wrapping_add(self.step));
            now
        }
    }
}
