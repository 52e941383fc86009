use std::collections::TryReserveError;

use log::debug;
use thiserror::Error;

use super::report::{BenchReport, SwitchState};
use crate::clock::{Clock, Timestamp, elapsed_ns};
use crate::proto::command::{Command, Operation};
use crate::proto::status::InvokeError;
use crate::session::{Session, Transport};
use crate::stats::Summary;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("READ failed: {0}")]
    Read(#[source] InvokeError),
    #[error("BENCHMARK failed on trial {trial}: {source}")]
    Invoke {
        trial: usize,
        #[source]
        source: InvokeError,
    },
    #[error("cannot allocate buffers for {iterations} trials")]
    Alloc {
        iterations: usize,
        #[source]
        source: TryReserveError,
    },
}

/// One BENCHMARK invocation as seen from the normal world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationRecord {
    pub start: Timestamp,
    pub end: Timestamp,
    pub state: u32,
    pub access_cycles: u32,
    pub ta_cycles: u32,
}

impl InvocationRecord {
    pub fn roundtrip_ns(&self) -> u64 {
        elapsed_ns(self.start, self.end)
    }
}

/// One READ; no timing.
pub fn single_read<T: Transport>(session: &mut Session<'_, T>) -> Result<SwitchState, BenchError> {
    let mut op = Operation::for_command(Command::Read);
    session
        .invoke(Command::Read, &mut op)
        .map_err(BenchError::Read)?;
    Ok(SwitchState(op.params[0].a))
}

/// Runs `iterations` back-to-back BENCHMARK invocations and reduces them.
/// The first failed invocation aborts the run.
pub fn run_benchmark<T: Transport, C: Clock>(
    session: &mut Session<'_, T>,
    clock: &C,
    iterations: usize,
) -> Result<BenchReport, BenchError> {
    let records = collect_trials(session, clock, iterations)?;
    Ok(summarize(&records))
}

pub fn collect_trials<T: Transport, C: Clock>(
    session: &mut Session<'_, T>,
    clock: &C,
    iterations: usize,
) -> Result<Vec<InvocationRecord>, BenchError> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(iterations)
        .map_err(|source| BenchError::Alloc { iterations, source })?;

    for trial in 0..iterations {
        let mut op = Operation::for_command(Command::Benchmark);

        let start = clock.now();
        let res = session.invoke(Command::Benchmark, &mut op);
        let end = clock.now();

        res.map_err(|source| BenchError::Invoke {
            trial: trial + 1,
            source,
        })?;

        let rec = InvocationRecord {
            start,
            end,
            state: op.params[0].a,
            access_cycles: op.params[0].b,
            ta_cycles: op.params[1].a,
        };
        debug!(
            "trial {}: {} ns, access {} cyc, ta {} cyc",
            trial + 1,
            rec.roundtrip_ns(),
            rec.access_cycles,
            rec.ta_cycles
        );
        records.push(rec);
    }
    Ok(records)
}

pub fn summarize(records: &[InvocationRecord]) -> BenchReport {
    BenchReport {
        iterations: records.len(),
        roundtrip_ns: Summary::from_samples(records.iter().map(InvocationRecord::roundtrip_ns)),
        access_cycles: Summary::from_samples(records.iter().map(|r| r.access_cycles as u64)),
        ta_cycles: Summary::from_samples(records.iter().map(|r| r.ta_cycles as u64)),
        last_state: records
            .last()
            .map(|r| SwitchState(r.state))
            .unwrap_or_default(),
    }
}
