use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use log::{LevelFilter, info};

mod bench;
mod cli;
mod clock;
mod proto;
mod session;
mod stats;
mod ta;
mod world;

use bench::runner;
use clock::MonotonicClock;
use proto::command::TA_UUID;
use session::Context;
use ta::peripheral::StubPeripheral;
use world::LoopbackWorld;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    let iterations = args.iterations();
    let world = LoopbackWorld::new(TA_UUID, StubPeripheral)
        .with_latency(Duration::from_micros(args.latency_us));
    let mut ctx = Context::new(world);
    let mut session = ctx
        .open_session(&TA_UUID)
        .with_context(|| format!("opening session to TA {}", TA_UUID))?;
    info!("session open, iterations={} latency_us={}", iterations, args.latency_us);

    if iterations == 1 {
        let state = runner::single_read(&mut session)?;
        println!("Switch state: {}", state);
    } else {
        println!("Running {} benchmark iterations...", iterations);
        let report = runner::run_benchmark(&mut session, &MonotonicClock::new(), iterations)?;
        print!("{}", report);
    }

    session.close();
    Ok(())
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}
