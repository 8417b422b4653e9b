//! Policy and value function approximator
use super::modules::{FeedForwardModule, Mlp, MlpConfig};
use super::snapshot::{ParameterSnapshot, SnapshotError};
use tch::{nn::VarStore, Device, Kind, Tensor};

/// Feed-forward policy network with an optional state-value network.
///
/// The policy (actor) and value (critic) are separate multi-layer perceptrons with the same
/// hidden layer structure. All parameters are owned by a single [`VarStore`] under the
/// `actor` and `critic` prefixes.
pub struct PolicyValueModel {
    vs: VarStore,
    actor: Mlp,
    critic: Option<Mlp>,
    observation_size: usize,
    num_actions: usize,
}

impl PolicyValueModel {
    /// Create a new model with freshly initialized parameters.
    ///
    /// # Args
    /// * `config` - Configuration of both the actor and the critic networks.
    /// * `observation_size` - Number of features in each observation.
    /// * `num_actions` - Number of discrete actions.
    /// * `with_critic` - Whether to create a value network.
    pub fn new(
        config: &MlpConfig,
        observation_size: usize,
        num_actions: usize,
        with_critic: bool,
    ) -> Self {
        let vs = VarStore::new(Device::Cpu);
        let root = vs.root();
        let actor = config.build_module(&(&root / "actor"), observation_size, num_actions);
        let critic = if with_critic {
            Some(config.build_module(&(&root / "critic"), observation_size, 1))
        } else {
            None
        };
        Self {
            vs,
            actor,
            critic,
            observation_size,
            num_actions,
        }
    }

    pub const fn observation_size(&self) -> usize {
        self.observation_size
    }

    pub const fn num_actions(&self) -> usize {
        self.num_actions
    }

    pub const fn has_critic(&self) -> bool {
        self.critic.is_some()
    }

    /// Action probabilities for a batch of states.
    ///
    /// # Args
    /// * `states` - Tensor of shape `[batch, observation_size]`.
    ///
    /// # Returns
    /// Tensor of shape `[batch, num_actions]` with rows summing to one.
    pub fn policy(&self, states: &Tensor) -> Tensor {
        self.actor.forward(states).softmax(-1, Kind::Float)
    }

    /// State value estimates for a batch of states, if the model has a critic.
    ///
    /// # Returns
    /// Tensor of shape `[batch]`.
    pub fn value(&self, states: &Tensor) -> Option<Tensor> {
        self.critic
            .as_ref()
            .map(|critic| critic.forward(states).squeeze_dim(-1))
    }

    /// Action probabilities for a single observation, without gradient tracking.
    pub fn action_probabilities(&self, observation: &[f32]) -> Vec<f64> {
        tch::no_grad(|| {
            let state = Tensor::of_slice(observation).unsqueeze(0);
            let probs = self.policy(&state).squeeze_dim(0);
            (0..self.num_actions as i64)
                .map(|i| probs.double_value(&[i]))
                .collect()
        })
    }

    /// Trainable variables; the actor's followed by the critic's, layer by layer.
    ///
    /// Two models built from the same configuration list their variables in the same order.
    pub fn trainable_variables(&self) -> Vec<Tensor> {
        self.actor
            .trainable_variables()
            .into_iter()
            .chain(
                self.critic
                    .iter()
                    .flat_map(FeedForwardModule::trainable_variables),
            )
            .map(Tensor::shallow_clone)
            .collect()
    }

    /// Named shapes of all parameters.
    pub fn parameter_shapes(&self) -> Vec<(String, Vec<i64>)> {
        let mut shapes: Vec<_> = self
            .vs
            .variables()
            .into_iter()
            .map(|(name, t)| (name, t.size()))
            .collect();
        shapes.sort();
        shapes
    }

    /// Copy the current parameter values.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot::from_named(self.vs.variables())
    }

    /// Overwrite the parameters with the values of a snapshot.
    ///
    /// The snapshot is checked against the model structure before anything is copied,
    /// so on error the parameters are unchanged.
    pub fn load_snapshot(&mut self, snapshot: &ParameterSnapshot) -> Result<(), SnapshotError> {
        let shapes = self.parameter_shapes();
        snapshot.check_compatible(
            shapes
                .iter()
                .map(|(name, shape)| (name.as_str(), shape.clone())),
        )?;
        let variables = self.vs.variables();
        tch::no_grad(|| {
            for (name, source) in snapshot.iter() {
                if let Some(var) = variables.get(name) {
                    var.shallow_clone().copy_(source);
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn model() -> PolicyValueModel {
        tch::manual_seed(0);
        PolicyValueModel::new(&MlpConfig::default(), 4, 2, true)
    }

    #[rstest]
    fn policy_rows_sum_to_one(model: PolicyValueModel) {
        let states = Tensor::randn(&[5, 4], (Kind::Float, Device::Cpu));
        let probs = model.policy(&states);
        assert_eq!(probs.size(), [5, 2]);
        for i in 0..5 {
            let row_sum = probs.double_value(&[i, 0]) + probs.double_value(&[i, 1]);
            assert!((row_sum - 1.0).abs() < 1e-5);
        }
    }

    #[rstest]
    fn value_shape(model: PolicyValueModel) {
        let states = Tensor::randn(&[5, 4], (Kind::Float, Device::Cpu));
        assert_eq!(model.value(&states).unwrap().size(), [5]);
    }

    #[test]
    fn no_critic() {
        let model = PolicyValueModel::new(&MlpConfig::default(), 2, 3, false);
        assert!(!model.has_critic());
        assert!(model.value(&Tensor::zeros(&[1, 2], (Kind::Float, Device::Cpu))).is_none());
        assert_eq!(model.trainable_variables().len(), 6);
    }

    #[rstest]
    fn action_probabilities_deterministic(model: PolicyValueModel) {
        let observation = [0.1, -0.2, 0.03, 0.5];
        let probs = model.action_probabilities(&observation);
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert_eq!(probs, model.action_probabilities(&observation));
    }

    #[rstest]
    fn variables_are_named_by_network(model: PolicyValueModel) {
        let names: Vec<_> = model.parameter_shapes().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), 12);
        assert!(names.contains(&"actor.layer_0.kernel".to_string()));
        assert!(names.contains(&"critic.layer_2.bias".to_string()));
        assert_eq!(model.trainable_variables().len(), 12);
    }

    #[rstest]
    fn snapshot_round_trip(model: PolicyValueModel) {
        let snapshot = model.snapshot();
        let mut other = PolicyValueModel::new(&MlpConfig::default(), 4, 2, true);
        assert!(!other.snapshot().bit_equal(&snapshot));
        other.load_snapshot(&snapshot).unwrap();
        assert!(other.snapshot().bit_equal(&snapshot));
    }

    #[rstest]
    fn incompatible_snapshot_leaves_model_unchanged(model: PolicyValueModel) {
        let mut small = PolicyValueModel::new(
            &MlpConfig {
                hidden_sizes: vec![8],
                ..MlpConfig::default()
            },
            4,
            2,
            true,
        );
        let before = small.snapshot();
        assert!(small.load_snapshot(&model.snapshot()).is_err());
        assert!(small.snapshot().bit_equal(&before));
    }
}
