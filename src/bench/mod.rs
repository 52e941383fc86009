//! Normal-world benchmark harness: drives invocations, times them, reduces the results.

pub mod report;
pub mod runner;
