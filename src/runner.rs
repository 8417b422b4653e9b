//! Complete training runs: restore, train, save, and plot.
use crate::agents::a3c::train_async;
use crate::agents::Algorithm;
use crate::checkpoint::{Checkpointer, Counters};
use crate::config::RunConfig;
use crate::envs::EnvStructure;
use crate::error::RunError;
use crate::logging::StatsLogger;
use crate::plot::plot_scores;
use crate::simulation::{train_serial, TrainSummary};
use crate::torch::PolicyValueModel;
use crate::Prng;
use log::info;
use rand::SeedableRng;

/// Run a training session described by `config`.
///
/// # Args
/// * `config` - Run configuration.
/// * `resume` - Restore parameters and counters from the run's checkpoint if there is one.
/// * `logger` - Receives per-episode statistics and progress lines.
///
/// The checkpoint is saved and the score plot written when training stops.
pub fn run<L: StatsLogger + Send>(
    config: &RunConfig,
    resume: bool,
    logger: &mut L,
) -> Result<TrainSummary, RunError> {
    config.validate()?;
    let run_name = config.run_name();
    let checkpointer = Checkpointer::new(&config.save_dir, &run_name);
    let train = &config.train;
    let mut env = config.env.build_env(train.max_steps_per_episode, train.seed)?;
    let (observation_size, num_actions) = (env.observation_size(), env.num_actions());
    info!(
        "run {}: {} on {} ({} observations, {} actions)",
        run_name,
        config.agent.algorithm,
        config.env.name(),
        observation_size,
        num_actions
    );

    let restore = |model: &mut PolicyValueModel| {
        if resume {
            checkpointer.restore_or_default(model)
        } else {
            Counters::default()
        }
    };

    let (summary, snapshot) = if config.agent.algorithm == Algorithm::A3c {
        let mut model = config.agent.build_model(observation_size, num_actions);
        let counters = restore(&mut model);
        let result = train_async(
            &config.agent,
            &config.env,
            train,
            &config.a3c,
            model,
            counters,
            logger,
        )?;
        info!(
            "{} workers applied {} updates",
            result.workers.len(),
            result.updates
        );
        (result.summary, result.model.snapshot())
    } else {
        let mut agent = config.agent.build_agent(observation_size, num_actions)?;
        let counters = restore(agent.model_mut());
        let mut rng = Prng::seed_from_u64(train.seed.wrapping_add(1));
        let summary = train_serial(
            agent.as_mut(),
            &mut env,
            &train.stop,
            counters,
            &mut rng,
            logger,
        )?;
        (summary, agent.model().snapshot())
    };
    info!("stopped: {}", summary.stop_reason);

    checkpointer.save(&snapshot, summary.counters)?;
    info!("saved checkpoint {}", checkpointer.dir().display());
    let plot_path = plot_scores(&summary.history, &config.graph_dir, &run_name)?;
    info!("wrote score plot {}", plot_path.display());
    Ok(summary)
}
