//! Configuration of PPO agent.
use super::{CategoricalActorConfig, CriticConfig};
use crate::{util::OutDim, Device};
use anyhow::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Ppo`](super::Ppo) agent.
///
/// `P` and `V` are the configurations of the policy and value networks.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PpoConfig<P, V>
where
    P: OutDim,
    V: OutDim,
{
    /// Configuration of the actor.
    pub actor_config: CategoricalActorConfig<P>,

    /// Configuration of the critic.
    pub critic_config: CriticConfig<V>,

    /// Discount factor.
    pub gamma: f32,

    /// Decay of the generalized advantage estimation.
    pub lambda: f32,

    /// Number of updates on the data of an episode.
    pub epochs: usize,

    /// Clipping range of the probability ratio.
    pub eps_clip: f64,

    /// Device of the networks.
    pub device: Device,

    /// Seed of the action sampling.
    pub seed: u64,
}

impl<P, V> Default for PpoConfig<P, V>
where
    P: OutDim,
    V: OutDim,
{
    fn default() -> Self {
        Self {
            actor_config: Default::default(),
            critic_config: Default::default(),
            gamma: 0.98,
            lambda: 0.95,
            epochs: 10,
            eps_clip: 0.2,
            device: Device::Cpu,
            seed: 0,
        }
    }
}

impl<P, V> PpoConfig<P, V>
where
    P: DeserializeOwned + Serialize + OutDim,
    V: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the actor.
    pub fn actor_config(mut self, v: CategoricalActorConfig<P>) -> Self {
        self.actor_config = v;
        self
    }

    /// Sets the configuration of the critic.
    pub fn critic_config(mut self, v: CriticConfig<V>) -> Self {
        self.critic_config = v;
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the decay of the advantage estimation.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Sets the number of updates per episode.
    pub fn epochs(mut self, v: usize) -> Self {
        self.epochs = v;
        self
    }

    /// Sets the clipping range.
    pub fn eps_clip(mut self, v: f64) -> Self {
        self.eps_clip = v;
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

    /// Constructs [`PpoConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PpoConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, opt::OptimizerConfig};
    use tempdir::TempDir;

    #[test]
    fn test_serde_ppo_config() -> Result<()> {
        let config = PpoConfig::default()
            .actor_config(
                CategoricalActorConfig::default()
                    .pi_config(MlpConfig::new(8, vec![128], 5, false)),
            )
            .critic_config(
                CriticConfig::default()
                    .v_config(MlpConfig::new(8, vec![128], 0, false))
                    .opt_config(OptimizerConfig::Adam { lr: 1e-2 }),
            )
            .epochs(4);

        let dir = TempDir::new("ppo_config")?;
        let path = dir.path().join("ppo_config.yaml");
        config.save(&path)?;
        let config_ = PpoConfig::<MlpConfig, MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.critic_config.v_config.unwrap().get_out_dim(), 1);
        Ok(())
    }
}
