//! Configuration of DQN agent.
use super::{explorer::DqnExplorer, DqnModelConfig};
use crate::{util::CriticLoss, util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
///
/// `Q` is the configuration of the action-value network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Configuration of the action-value network and its optimizer.
    pub model_config: DqnModelConfig<Q>,

    /// Number of transitions in a batch.
    pub batch_size: usize,

    /// Discount factor.
    pub discount_factor: f64,

    /// Coefficient of the target network update, `1.0` for a hard copy.
    pub tau: f64,

    /// Interval of target network updates, in optimization steps.
    pub target_sync_interval: usize,

    /// Optimization is skipped while the buffer holds fewer transitions.
    pub min_transitions_warmup: usize,

    /// Gradients are clamped into `[-clip_grad, clip_grad]` if given.
    pub clip_grad: Option<f64>,

    /// If `true`, the greedy action of the next state is taken from the policy network.
    pub double_dqn: bool,

    /// Loss between predicted and target action values.
    pub critic_loss: CriticLoss,

    /// Exploration in training mode.
    pub explorer: DqnExplorer,

    /// Device of the networks.
    pub device: Device,

    /// Seed of the action selection.
    pub seed: u64,
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 32,
            discount_factor: 0.99,
            tau: 1.0,
            target_sync_interval: 1000,
            min_transitions_warmup: 0,
            clip_grad: Some(1.0),
            double_dqn: false,
            critic_loss: CriticLoss::SmoothL1,
            explorer: Default::default(),
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the model.
    pub fn model_config(mut self, v: DqnModelConfig<Q>) -> Self {
        self.model_config = v;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the coefficient of target network updates.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Sets the interval of target network updates.
    pub fn target_sync_interval(mut self, v: usize) -> Self {
        self.target_sync_interval = v;
        self
    }

    /// Sets the number of transitions required before optimization starts.
    pub fn min_transitions_warmup(mut self, v: usize) -> Self {
        self.min_transitions_warmup = v;
        self
    }

    /// Sets gradient clamping.
    pub fn clip_grad(mut self, v: Option<f64>) -> Self {
        self.clip_grad = v;
        self
    }

    /// Enables or disables double DQN.
    pub fn double_dqn(mut self, v: bool) -> Self {
        self.double_dqn = v;
        self
    }

    /// Sets the critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: DqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dqn::EpsilonGreedy, mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let model_config = DqnModelConfig::default()
            .q_config(MlpConfig::new(7, vec![64, 64], 6, false))
            .opt_config(OptimizerConfig::Adam { lr: 1e-3 });
        let config = DqnConfig::default()
            .model_config(model_config)
            .batch_size(64)
            .target_sync_interval(100)
            .double_dqn(true)
            .critic_loss(CriticLoss::Mse)
            .explorer(EpsilonGreedy::with_final_step(500));

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");
        config.save(&path)?;
        let config_ = DqnConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
