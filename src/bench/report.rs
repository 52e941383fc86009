use std::fmt;

use crate::stats::Summary;

/// Raw switch state word as returned by the trusted application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchState(pub u32);

impl SwitchState {
    pub fn sw0(self) -> u32 {
        self.0 & 1
    }

    pub fn sw1(self) -> u32 {
        (self.0 >> 1) & 1
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x} (SW1={} SW0={})", self.0, self.sw1(), self.sw0())
    }
}

/// Result of one benchmark run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchReport {
    pub iterations: usize,
    /// Normal-world monotonic round trip, ns
    pub roundtrip_ns: Summary,
    /// Secure-world cycles spent in the peripheral read
    pub access_cycles: Summary,
    /// Secure-world cycles from command entry to exit
    pub ta_cycles: Summary,
    /// State returned by the final trial
    pub last_state: SwitchState,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Benchmark Results ({} iterations) ===", self.iterations)?;

        writeln!(f, "\nRound-trip (normal-world monotonic clock, includes world switch):")?;
        write_summary(f, &self.roundtrip_ns, "ns")?;

        writeln!(f, "\nPeripheral read (secure-world cycles, register access only):")?;
        write_summary(f, &self.access_cycles, "cycles")?;

        writeln!(f, "\nTotal TA execution (secure-world cycles, command entry to exit):")?;
        write_summary(f, &self.ta_cycles, "cycles")?;

        // Cycles stay raw: converting needs the secure-world clock rate,
        // which the harness does not know.
        writeln!(f, "\nWorld-switch overhead estimate (round-trip minus TA execution):")?;
        writeln!(
            f,
            "  (compare round-trip ns with TA cycles at the secure-world clock rate)"
        )?;

        writeln!(
            f,
            "\nLast switch state: SW1={} SW0={}",
            self.last_state.sw1(),
            self.last_state.sw0()
        )
    }
}

fn write_summary(f: &mut fmt::Formatter<'_>, s: &Summary, unit: &str) -> fmt::Result {
    writeln!(f, "  avg: {} {}", s.average(), unit)?;
    writeln!(f, "  min: {} {}", s.min, unit)?;
    writeln!(f, "  max: {} {}", s.max, unit)
}
