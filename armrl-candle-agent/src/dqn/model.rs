use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{clamp_grads, track, OutDim},
    CandleAgentError,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DqnModel`].
pub struct DqnModelConfig<Q>
where
    Q: OutDim,
{
    pub(super) q_config: Option<Q>,
    pub(super) opt_config: OptimizerConfig,
}

impl<Q> Default for DqnModelConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            opt_config: OptimizerConfig::default(),
        }
    }
}

impl<Q> DqnModelConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model, i.e., the number of actions.
    pub fn out_dim(mut self, v: usize) -> Self {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_out_dim(v);
        }
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Constructs [`DqnModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnModelConfig`] to as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value network with its parameters and optimizer.
pub struct DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    varmap: VarMap,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: usize,

    // Action-value function
    q: Q,

    opt: Optimizer,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs [`DqnModel`] with randomly initialized parameters.
    pub fn build(config: DqnModelConfig<Q::Config>, device: &Device) -> Result<Self> {
        let q_config = config
            .q_config
            .ok_or(CandleAgentError::MissingConfig("q_config"))?;
        let out_dim = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Q::build(vb, q_config)?
        };
        let opt = config.opt_config.build(varmap.all_vars())?;

        Ok(Self {
            varmap,
            out_dim,
            q,
            opt,
        })
    }

    /// Constructs a model with the same architecture as `src` and a copy of its parameters.
    pub fn build_copy_of(
        config: DqnModelConfig<Q::Config>,
        device: &Device,
        src: &Self,
    ) -> Result<Self> {
        let model = Self::build(config, device)?;
        track(&model.varmap, &src.varmap, 1.0)?;
        Ok(model)
    }

    /// Outputs the action values given a batch of observations, `[n, out_dim]`.
    pub fn forward(&self, obs: &Tensor) -> Result<Tensor> {
        Ok(self.q.forward(obs)?)
    }

    /// Number of actions.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Updates the parameters to decrease `loss`.
    ///
    /// If `clip_grad` is given, gradients are clamped element-wise into
    /// `[-clip_grad, clip_grad]` before the update.
    pub fn backward_step(&mut self, loss: &Tensor, clip_grad: Option<f64>) -> Result<()> {
        match clip_grad {
            None => self.opt.backward_step(loss),
            Some(clip) => {
                let mut grads = loss.backward()?;
                clamp_grads(&mut grads, &self.varmap.all_vars(), clip)?;
                self.opt.step(&grads)
            }
        }
    }

    /// Parameters of the network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Saves the parameters in a safetensors file.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save dqnmodel to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters from a safetensors file.
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load dqnmodel from {:?}", path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mlp::{Mlp, MlpConfig},
        util::varmap_distance,
    };
    use tempdir::TempDir;

    fn config() -> DqnModelConfig<MlpConfig> {
        DqnModelConfig::default()
            .q_config(MlpConfig::new(3, vec![8], 0, false))
            .out_dim(4)
            .opt_config(OptimizerConfig::Adam { lr: 1e-2 })
    }

    #[test]
    fn test_missing_q_config() {
        let config = DqnModelConfig::<MlpConfig>::default();
        assert!(DqnModel::<Mlp>::build(config, &Device::Cpu).is_err());
    }

    #[test]
    fn test_copy_and_step() -> Result<()> {
        let qnet = DqnModel::<Mlp>::build(config(), &Device::Cpu)?;
        let mut copy = DqnModel::<Mlp>::build_copy_of(config(), &Device::Cpu, &qnet)?;
        assert_eq!(copy.out_dim(), 4);
        assert_eq!(varmap_distance(copy.get_varmap(), qnet.get_varmap())?, 0.0);

        let obs = Tensor::ones((2, 3), DType::F32, &Device::Cpu)?;
        let loss = copy.forward(&obs)?.sqr()?.sum_all()?;
        copy.backward_step(&loss, Some(1.0))?;
        assert!(varmap_distance(copy.get_varmap(), qnet.get_varmap())? > 0.0);
        Ok(())
    }

    #[test]
    fn test_save_load() -> Result<()> {
        let dir = TempDir::new("dqn_model")?;
        let path = dir.path().join("qnet.safetensors");
        let qnet = DqnModel::<Mlp>::build(config(), &Device::Cpu)?;
        qnet.save(&path)?;

        let mut other = DqnModel::<Mlp>::build(config(), &Device::Cpu)?;
        other.load(&path)?;
        assert_eq!(varmap_distance(other.get_varmap(), qnet.get_varmap())?, 0.0);
        Ok(())
    }
}
