use clap::Parser;
use log::{debug, error};
use rlcontrol::cli::Options;
use rlcontrol::logging::DisplayLogger;
use rlcontrol::utils::fmt::Clock;
use rlcontrol::RunError;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Options::parse();
    debug!("{:#?}", opts);

    if let Err(err) = run(&opts) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(opts: &Options) -> Result<(), RunError> {
    let config = opts.run_config()?;
    debug!("{:#?}", config);
    let mut logger = DisplayLogger::default();
    let summary = rlcontrol::run(&config, !opts.fresh, &mut logger)?;
    println!(
        "{} after {} episodes ({} steps); elapsed time: {}",
        summary.stop_reason,
        summary.counters.episode,
        summary.counters.step,
        Clock(summary.elapsed)
    );
    Ok(())
}
