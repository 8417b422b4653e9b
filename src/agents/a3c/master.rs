//! Master parameter store
use crate::agents::BuildAgentError;
use crate::checkpoint::Counters;
use crate::logging::StatsLogger;
use crate::simulation::{EpisodeHistory, ProgressTracker, TrainError};
use crate::torch::optimizers::{Adam, AdamConfig, BuildOptimizer, GradientOptimizer};
use crate::torch::{ParameterSnapshot, PolicyValueModel};
use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::thread::{Scope, ScopedJoinHandle};
use log::warn;

/// Summary of a worker episode sent along with its gradients.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct EpisodeReport {
    pub worker: usize,
    /// Number of steps in the episode (the episode score).
    pub steps: u64,
    pub total_reward: f64,
    /// Loss components, if the loss was finite.
    pub loss: Option<LossReport>,
}

/// Scalar actor-critic loss components.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct LossReport {
    pub total: f64,
    pub actor: f64,
    pub critic: f64,
    pub entropy: f64,
}

/// A copy of the master parameters.
#[derive(Debug)]
pub struct MasterSnapshot {
    pub parameters: ParameterSnapshot,
    /// Number of gradient updates applied to the master parameters.
    pub version: u64,
    pub counters: Counters,
}

/// Master state handed back when the store stops.
pub struct MasterState {
    pub model: PolicyValueModel,
    pub counters: Counters,
    pub history: EpisodeHistory,
    /// Number of gradient updates applied.
    pub version: u64,
}

#[derive(Debug)]
enum Message {
    Push {
        gradients: Vec<tch::Tensor>,
    },
    PushPull {
        gradients: Option<Vec<tch::Tensor>>,
        report: EpisodeReport,
        reply: Sender<MasterSnapshot>,
    },
    Pull {
        reply: Sender<MasterSnapshot>,
    },
    Finish,
}

/// Owner of the master model and its optimizer.
///
/// Runs on its own thread and applies messages from workers one at a time in arrival order.
/// Every reply reflects all updates received before the request.
pub struct MasterStore {
    model: PolicyValueModel,
    optimizer: Adam,
    tracker: ProgressTracker,
    version: u64,
}

impl MasterStore {
    /// Create a master store.
    ///
    /// # Args
    /// * `model` - Master model; fresh or restored from a checkpoint.
    /// * `optimizer_config` - Configuration of the master Adam optimizer.
    /// * `counters` - Initial global counters.
    /// * `window` - Number of recent episodes averaged in progress lines.
    pub fn new(
        model: PolicyValueModel,
        optimizer_config: &AdamConfig,
        counters: Counters,
        window: usize,
    ) -> Result<Self, BuildAgentError> {
        let optimizer = optimizer_config.build_optimizer(model.trainable_variables())?;
        Ok(Self {
            model,
            optimizer,
            tracker: ProgressTracker::new(counters, window),
            version: 0,
        })
    }

    /// Start the store on a new scoped thread.
    pub fn spawn<'scope, 'env>(
        self,
        scope: &'scope Scope<'env>,
        logger: &'env mut (dyn StatsLogger + Send),
    ) -> MasterThread<'scope> {
        let (sender, receiver) = channel::unbounded();
        let thread = scope.spawn(move |_| self.run(&receiver, logger));
        MasterThread {
            handle: MasterHandle { sender },
            thread,
        }
    }

    /// Process messages until a finish message or until every handle has been dropped.
    fn run(mut self, receiver: &Receiver<Message>, logger: &mut dyn StatsLogger) -> MasterState {
        for message in receiver.iter() {
            match message {
                Message::Push { gradients } => self.apply(&gradients),
                Message::PushPull {
                    gradients,
                    report,
                    reply,
                } => {
                    if let Some(gradients) = gradients {
                        self.apply(&gradients);
                    }
                    self.record(&report, logger);
                    // The worker may have stopped waiting
                    let _ = reply.send(self.snapshot());
                }
                Message::Pull { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Message::Finish => break,
            }
        }
        logger.flush();
        MasterState {
            model: self.model,
            counters: self.tracker.counters,
            history: self.tracker.history,
            version: self.version,
        }
    }

    fn apply(&mut self, gradients: &[tch::Tensor]) {
        match self.optimizer.apply_gradients(gradients) {
            Ok(()) => self.version += 1,
            Err(err) => warn!("discarding gradients: {}", err),
        }
    }

    fn record(&mut self, report: &EpisodeReport, logger: &mut dyn StatsLogger) {
        if let Some(loss) = report.loss {
            logger.log_scalar("loss", loss.total);
            logger.log_scalar("actor_loss", loss.actor);
            logger.log_scalar("critic_loss", loss.critic);
            logger.log_scalar("entropy", loss.entropy);
        }
        logger.log_scalar("episode_reward", report.total_reward);
        logger.log_progress(&self.tracker.record(report.steps));
        logger.group_end();
    }

    fn snapshot(&self) -> MasterSnapshot {
        MasterSnapshot {
            parameters: self.model.snapshot(),
            version: self.version,
            counters: self.tracker.counters,
        }
    }
}

/// A running master store.
pub struct MasterThread<'scope> {
    handle: MasterHandle,
    thread: ScopedJoinHandle<'scope, MasterState>,
}

impl<'scope> MasterThread<'scope> {
    /// A new handle for communicating with the store.
    pub fn handle(&self) -> MasterHandle {
        self.handle.clone()
    }

    /// Stop the store and return the master state.
    ///
    /// Messages sent before this call are processed first.
    pub fn finish(self) -> Result<MasterState, TrainError> {
        let _ = self.handle.sender.send(Message::Finish);
        drop(self.handle);
        self.thread.join().map_err(|_| TrainError::MasterDisconnected)
    }
}

/// Sends requests to the master store.
#[derive(Debug, Clone)]
pub struct MasterHandle {
    sender: Sender<Message>,
}

impl MasterHandle {
    /// Apply one optimizer step with the given gradients, in model variable order.
    pub fn push(&self, gradients: Vec<tch::Tensor>) -> Result<(), TrainError> {
        self.sender
            .send(Message::Push { gradients })
            .map_err(|_| TrainError::MasterDisconnected)
    }

    /// Apply gradients (if any), record a completed episode, and get the updated parameters.
    pub fn push_pull(
        &self,
        gradients: Option<Vec<tch::Tensor>>,
        report: EpisodeReport,
    ) -> Result<MasterSnapshot, TrainError> {
        let (reply, response) = channel::bounded(1);
        self.sender
            .send(Message::PushPull {
                gradients,
                report,
                reply,
            })
            .map_err(|_| TrainError::MasterDisconnected)?;
        response.recv().map_err(|_| TrainError::MasterDisconnected)
    }

    /// Get the current master parameters.
    pub fn pull(&self) -> Result<MasterSnapshot, TrainError> {
        let (reply, response) = channel::bounded(1);
        self.sender
            .send(Message::Pull { reply })
            .map_err(|_| TrainError::MasterDisconnected)?;
        response.recv().map_err(|_| TrainError::MasterDisconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torch::MlpConfig;
    use rstest::{fixture, rstest};
    use tch::Tensor;

    #[fixture]
    fn model() -> PolicyValueModel {
        tch::manual_seed(0);
        PolicyValueModel::new(
            &MlpConfig {
                hidden_sizes: vec![4, 4],
                ..MlpConfig::default()
            },
            2,
            2,
            true,
        )
    }

    fn gradients(model: &PolicyValueModel, value: f64) -> Vec<Tensor> {
        model
            .trainable_variables()
            .iter()
            .map(|v| v.detach().ones_like() * value)
            .collect()
    }

    fn report(worker: usize, steps: u64) -> EpisodeReport {
        EpisodeReport {
            worker,
            steps,
            ..EpisodeReport::default()
        }
    }

    fn store(model: PolicyValueModel) -> MasterStore {
        MasterStore::new(model, &AdamConfig::default(), Counters::default(), 30).unwrap()
    }

    /// Apply gradients to a copy of `initial` outside of the store.
    fn reference_update(initial: &ParameterSnapshot, grads: &[Vec<Tensor>]) -> ParameterSnapshot {
        let mut reference = model();
        reference.load_snapshot(initial).unwrap();
        let mut optimizer = AdamConfig::default()
            .build_optimizer(reference.trainable_variables())
            .unwrap();
        for g in grads {
            optimizer.apply_gradients(g).unwrap();
        }
        reference.snapshot()
    }

    #[rstest]
    fn pull_returns_current_parameters(model: PolicyValueModel) {
        let initial = model.snapshot();
        let store = store(model);
        let mut logger = ();
        crossbeam::scope(|scope| {
            let master = store.spawn(scope, &mut logger);
            let snapshot = master.handle().pull().unwrap();
            assert!(snapshot.parameters.bit_equal(&initial));
            assert_eq!(snapshot.version, 0);
            let state = master.finish().unwrap();
            assert!(state.model.snapshot().bit_equal(&initial));
        })
        .unwrap();
    }

    #[rstest]
    fn push_pull_applies_in_order(model: PolicyValueModel) {
        let initial = model.snapshot();
        let g1 = gradients(&model, 0.1);
        let g2 = gradients(&model, -0.2);
        let store = store(model);
        let mut logger = ();
        crossbeam::scope(|scope| {
            let master = store.spawn(scope, &mut logger);
            let a = master.handle();
            let b = master.handle();

            let first = a
                .push_pull(Some(g1.iter().map(Tensor::copy).collect()), report(0, 7))
                .unwrap();
            let second = b
                .push_pull(Some(g2.iter().map(Tensor::copy).collect()), report(1, 9))
                .unwrap();
            drop((a, b));

            assert_eq!(first.version, 1);
            assert_eq!(second.version, 2);
            assert_eq!(second.counters, Counters { episode: 2, step: 16 });
            assert!(first
                .parameters
                .bit_equal(&reference_update(&initial, &[g1.iter().map(Tensor::copy).collect()])));

            let state = master.finish().unwrap();
            assert!(state.model.snapshot().bit_equal(&second.parameters));
            assert_eq!(state.history.scores(), &[7.0, 9.0]);
            assert_eq!(state.version, 2);
        })
        .unwrap();
    }

    #[rstest]
    fn push_without_pull(model: PolicyValueModel) {
        let g = gradients(&model, 1.0);
        let store = store(model);
        let mut logger = ();
        crossbeam::scope(|scope| {
            let master = store.spawn(scope, &mut logger);
            master.handle().push(g).unwrap();
            assert_eq!(master.handle().pull().unwrap().version, 1);
            let state = master.finish().unwrap();
            // Pushes do not count as episodes
            assert_eq!(state.counters, Counters::default());
        })
        .unwrap();
    }

    #[rstest]
    fn wrong_gradients_are_discarded(model: PolicyValueModel) {
        let initial = model.snapshot();
        let store = store(model);
        let mut logger = ();
        crossbeam::scope(|scope| {
            let master = store.spawn(scope, &mut logger);
            let snapshot = master
                .handle()
                .push_pull(Some(vec![Tensor::ones(&[3], tch::kind::FLOAT_CPU)]), report(0, 1))
                .unwrap();
            assert_eq!(snapshot.version, 0);
            assert!(snapshot.parameters.bit_equal(&initial));
            master.finish().unwrap();
        })
        .unwrap();
    }

    #[test]
    fn disconnected_store_is_error() {
        let (sender, receiver) = channel::unbounded();
        drop(receiver);
        let handle = MasterHandle { sender };
        assert!(matches!(handle.pull(), Err(TrainError::MasterDisconnected)));
    }
}
